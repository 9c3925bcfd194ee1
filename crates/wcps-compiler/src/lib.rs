//! WCPS compiler: turns WCPS XML expression trees into RasQL query text.
//!
//! Fragments are classified by an ordered list of grammar productions (see
//! [`ast`]); each node reports the schema of the coverage it evaluates to
//! ([`CoverageInfo`]) and compiles to RasQL by concatenating its children's
//! text.

pub mod ast;
pub mod config;
pub mod info;
pub mod request;
pub mod xml;

pub use ast::{Attempt, CoverageExpr, Operand, ParseContext, ParseResult, ScalarExpr};
pub use config::CompilerConfig;
pub use info::{AxisInfo, CoverageInfo};
pub use request::{CompiledQuery, CoverageIterator, ProcessCoveragesRequest, ReturnClause, WcpsCompiler};
pub use xml::XmlElement;
