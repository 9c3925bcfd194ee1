//! OGC WCS 2.0 responses for WCPS coverages.
//!
//! Supports:
//! - GetCoverage with GML output (grid, rectified grid and multipoint coverages)
//! - GetCapabilities coverage summaries
//! - OWS exception reports

pub mod capabilities;
pub mod config;
pub mod context;
pub mod exceptions;
pub mod executor;
pub mod getcoverage;
pub mod gml;
pub mod request;
pub mod templates;
pub mod tuple_list;

pub use capabilities::{CoverageSummary, WcsCapabilitiesBuilder};
pub use config::ResponseConfig;
pub use context::ResponseContext;
pub use exceptions::{exception_report, exception_response};
pub use executor::{QueryExecutor, QueryResult, StaticQueryExecutor};
pub use getcoverage::{coverage_query, GmlFormatHandler, Response};
pub use gml::{add_coverage_data, GmlAssembler};
pub use request::{GetCoverageRequest, WcsKvpParams, WcsRequest, MIME_GML, MIME_XML};
pub use templates::{BuiltinTemplates, TemplateId, TemplateRenderer};
pub use tuple_list::{csv_to_tuple_list, datatype_interval, sdom_to_bounds};
