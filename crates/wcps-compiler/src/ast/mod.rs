//! WCPS expression AST.
//!
//! Every node is built from an [`XmlElement`] by an ordered list of parse
//! attempts. An attempt either matches (`Attempt::Matched`), declines the
//! fragment (`Attempt::NoMatch`) so the next production is tried, or fails
//! with an error, which means the fragment was recognised but is invalid.
//! Errors are never used to move on to the next production.

mod construct;
mod coverage;
mod induced;
mod pair;
mod scalar;
mod set_metadata;
mod subset;
mod switch;

pub use construct::{AxisIterator, ConstantCoverage, ConstructCoverage, ScaleExpr};
pub use coverage::{CoverageExpr, CoverageRef};
pub use induced::{BinaryOp, InducedExpr, UnaryOp};
pub use pair::CoverageExprPair;
pub use scalar::{CondenseOp, ScalarBinaryOp, ScalarExpr, ScalarUnaryOp};
pub use set_metadata::{SetMetadataExpr, SetMetadataKind};
pub use subset::{SubsetExpr, SubsetKind, SubsetSpec};
pub use switch::SwitchExpr;

use std::collections::BTreeMap;

use wcps_common::{MetadataSource, WcpsError, WcpsResult};

use crate::config::CompilerConfig;
use crate::info::CoverageInfo;
use crate::xml::XmlElement;

/// Outcome of trying one grammar production against a fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Matched(T),
    /// The production does not apply; carries the reason for tracing.
    NoMatch(String),
}

impl<T> Attempt<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Attempt<U> {
        match self {
            Attempt::Matched(v) => Attempt::Matched(f(v)),
            Attempt::NoMatch(reason) => Attempt::NoMatch(reason),
        }
    }
}

/// Result of a parse attempt: `Err` means matched but invalid.
pub type ParseResult<T> = Result<Attempt<T>, WcpsError>;

pub(crate) fn no_match<T>(element: &XmlElement, production: &str) -> ParseResult<T> {
    Ok(Attempt::NoMatch(format!(
        "<{}> is not a {}",
        element.name, production
    )))
}

/// Everything a production needs besides the fragment itself.
#[derive(Clone)]
pub struct ParseContext<'a> {
    source: &'a dyn MetadataSource,
    config: &'a CompilerConfig,
    iterators: &'a BTreeMap<String, Vec<String>>,
    variables: Vec<String>,
    depth: usize,
}

impl<'a> ParseContext<'a> {
    pub fn new(
        source: &'a dyn MetadataSource,
        config: &'a CompilerConfig,
        iterators: &'a BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            source,
            config,
            iterators,
            variables: Vec::new(),
            depth: 0,
        }
    }

    pub fn source(&self) -> &'a dyn MetadataSource {
        self.source
    }

    pub fn config(&self) -> &'a CompilerConfig {
        self.config
    }

    /// Coverage names bound to an iterator variable.
    pub fn coverages(&self, iterator: &str) -> WcpsResult<&'a [String]> {
        self.iterators
            .get(iterator)
            .map(|v| v.as_slice())
            .ok_or_else(|| WcpsError::UndefinedIterator(iterator.to_string()))
    }

    pub fn is_variable_defined(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v == name)
    }

    /// Context one level deeper in the expression tree.
    pub fn nested(&self) -> WcpsResult<ParseContext<'a>> {
        if self.depth >= self.config.max_expression_depth {
            return Err(WcpsError::invalid_parameter(
                "expression",
                format!(
                    "expression nesting exceeds {} levels",
                    self.config.max_expression_depth
                ),
            ));
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self.clone()
        })
    }

    /// Context with additional axis-iterator variables in scope.
    pub fn with_variables<I>(&self, names: I) -> ParseContext<'a>
    where
        I: IntoIterator<Item = String>,
    {
        let mut ctx = self.clone();
        ctx.variables.extend(names);
        ctx
    }
}

/// Either side of a binary operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Coverage(CoverageExpr),
    Scalar(ScalarExpr),
}

impl Operand {
    /// Parse a fragment that may be scalar- or coverage-valued, scalar first.
    pub fn parse(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<Operand> {
        if let Attempt::Matched(scalar) = ScalarExpr::try_parse(element, ctx)? {
            return Ok(Operand::Scalar(scalar));
        }
        CoverageExpr::parse(element, ctx).map(Operand::Coverage)
    }

    pub fn to_rasql(&self) -> String {
        match self {
            Operand::Coverage(c) => c.to_rasql(),
            Operand::Scalar(s) => s.to_rasql(),
        }
    }

    pub fn coverage_info(&self) -> Option<&CoverageInfo> {
        match self {
            Operand::Coverage(c) => Some(c.info()),
            Operand::Scalar(_) => None,
        }
    }
}

/// Text content of a bound element: its own text or its first child's text.
pub(crate) fn bound_text(element: &XmlElement) -> &str {
    let own = element.text.trim();
    if !own.is_empty() {
        return own;
    }
    element
        .first_child()
        .map(|c| c.text.trim())
        .unwrap_or_default()
}

/// Parse an integer-valued parameter element.
pub(crate) fn integer_param(parent: &XmlElement, element: &XmlElement) -> WcpsResult<i64> {
    let text = bound_text(element);
    text.parse::<i64>().map_err(|_| {
        WcpsError::invalid_parameter(
            &parent.name,
            format!("<{}> must be an integer, got '{}'", element.name, text),
        )
    })
}
