//! Coverage metadata model shared by the WCPS compiler and the WCS response
//! assembler: axis extents in CRS and pixel space, subsets, bounding boxes
//! and the common error type.

pub mod axis;
pub mod bbox;
pub mod cell_domain;
pub mod crs;
pub mod domain;
pub mod error;
pub mod metadata;
pub mod source;
pub mod subset;

pub use axis::AxisType;
pub use bbox::BoundingBox;
pub use cell_domain::CellDomainElement;
pub use crs::GRID_CRS;
pub use domain::{DomainElement, DomainElementDef, NumericBounds, TextualBounds};
pub use error::{WcpsError, WcpsResult};
pub use metadata::{CellDomainDef, CoverageMetadata, CoverageMetadataDef, CoverageType, RangeField};
pub use subset::DimensionSubset;
pub use source::{InMemoryMetadataSource, MetadataSource, PointRecord};
