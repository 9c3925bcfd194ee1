//! Scalar-valued expressions.

use tracing::trace;

use wcps_common::{WcpsError, WcpsResult};

use super::{no_match, Attempt, CoverageExpr, ParseContext, ParseResult};
use crate::xml::XmlElement;

/// Unary scalar operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarUnaryOp {
    Minus,
    Sqrt,
    Abs,
    Not,
}

impl ScalarUnaryOp {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "numericUnaryMinus" => Some(Self::Minus),
            "numericSqrt" => Some(Self::Sqrt),
            "numericAbs" => Some(Self::Abs),
            "booleanNot" => Some(Self::Not),
            _ => None,
        }
    }
}

/// Binary scalar operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarBinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ScalarBinaryOp {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "numericAdd" => Some(Self::Add),
            "numericMinus" => Some(Self::Sub),
            "numericMult" => Some(Self::Mul),
            "numericDiv" => Some(Self::Div),
            "booleanAnd" => Some(Self::And),
            "booleanOr" => Some(Self::Or),
            "booleanXor" => Some(Self::Xor),
            "booleanEqualNumeric" => Some(Self::Eq),
            "booleanNotEqualNumeric" => Some(Self::Ne),
            "booleanLessThan" => Some(Self::Lt),
            "booleanLessOrEqual" => Some(Self::Le),
            "booleanGreaterThan" => Some(Self::Gt),
            "booleanGreaterOrEqual" => Some(Self::Ge),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Condensers reducing a coverage to a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondenseOp {
    Count,
    Add,
    Avg,
    Min,
    Max,
    Some,
    All,
}

impl CondenseOp {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "count" => Some(Self::Count),
            "add" => Some(Self::Add),
            "avg" => Some(Self::Avg),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "some" => Some(Self::Some),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    /// RasQL condenser function name.
    pub fn function(&self) -> &'static str {
        match self {
            Self::Count => "count_cells",
            Self::Add => "add_cells",
            Self::Avg => "avg_cells",
            Self::Min => "min_cells",
            Self::Max => "max_cells",
            Self::Some => "some_cells",
            Self::All => "all_cells",
        }
    }
}

/// A scalar-valued expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    Numeric(String),
    Boolean(bool),
    String(String),
    /// Axis iterator variable of an enclosing construct
    Variable(String),
    Unary {
        op: ScalarUnaryOp,
        operand: Box<ScalarExpr>,
    },
    Binary {
        op: ScalarBinaryOp,
        left: Box<ScalarExpr>,
        right: Box<ScalarExpr>,
    },
    Condense {
        op: CondenseOp,
        coverage: Box<CoverageExpr>,
    },
}

impl ScalarExpr {
    /// Parse a fragment that must be scalar-valued.
    pub fn parse(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<ScalarExpr> {
        match Self::try_parse(element, ctx)? {
            Attempt::Matched(expr) => Ok(expr),
            Attempt::NoMatch(_) => Err(WcpsError::UnrecognizedConstruct {
                node: element.name.clone(),
            }),
        }
    }

    pub fn try_parse(element: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<ScalarExpr> {
        let ctx = &ctx.nested()?;
        let tag = element.name.as_str();
        trace!(node = %tag, "parsing scalar expression");

        let expr = match tag {
            "numericConstant" => {
                let text = element.text.trim();
                if text.parse::<f64>().is_err() {
                    return Err(WcpsError::invalid_parameter(
                        tag,
                        format!("'{}' is not a number", text),
                    ));
                }
                ScalarExpr::Numeric(text.to_string())
            }
            "booleanConstant" => match element.text.trim() {
                "true" => ScalarExpr::Boolean(true),
                "false" => ScalarExpr::Boolean(false),
                other => {
                    return Err(WcpsError::invalid_parameter(
                        tag,
                        format!("'{}' is not a boolean", other),
                    ))
                }
            },
            "stringConstant" => ScalarExpr::String(element.text.clone()),
            "variableRef" => {
                let name = element.text.trim();
                if !ctx.is_variable_defined(name) {
                    return Err(WcpsError::UndefinedIterator(name.to_string()));
                }
                ScalarExpr::Variable(name.to_string())
            }
            _ => {
                if let Some(op) = ScalarUnaryOp::from_tag(tag) {
                    ScalarExpr::Unary {
                        op,
                        operand: Box::new(ScalarExpr::parse(element.only_child()?, ctx)?),
                    }
                } else if let Some(op) = ScalarBinaryOp::from_tag(tag) {
                    let (left, right) = two_children(element)?;
                    ScalarExpr::Binary {
                        op,
                        left: Box::new(ScalarExpr::parse(left, ctx)?),
                        right: Box::new(ScalarExpr::parse(right, ctx)?),
                    }
                } else if let Some(op) = CondenseOp::from_tag(tag) {
                    ScalarExpr::Condense {
                        op,
                        coverage: Box::new(CoverageExpr::parse(element.only_child()?, ctx)?),
                    }
                } else {
                    return no_match(element, "scalar expression");
                }
            }
        };
        Ok(Attempt::Matched(expr))
    }

    pub fn to_rasql(&self) -> String {
        match self {
            ScalarExpr::Numeric(v) => v.clone(),
            ScalarExpr::Boolean(b) => b.to_string(),
            ScalarExpr::String(s) => format!("\"{}\"", s),
            ScalarExpr::Variable(v) => v.clone(),
            ScalarExpr::Unary { op, operand } => match op {
                ScalarUnaryOp::Minus => format!("-({})", operand.to_rasql()),
                ScalarUnaryOp::Sqrt => format!("sqrt({})", operand.to_rasql()),
                ScalarUnaryOp::Abs => format!("abs({})", operand.to_rasql()),
                ScalarUnaryOp::Not => format!("not({})", operand.to_rasql()),
            },
            ScalarExpr::Binary { op, left, right } => {
                format!("({} {} {})", left.to_rasql(), op.as_str(), right.to_rasql())
            }
            ScalarExpr::Condense { op, coverage } => {
                format!("{}({})", op.function(), coverage.to_rasql())
            }
        }
    }
}

/// The two operand children of a binary element.
pub(crate) fn two_children(element: &XmlElement) -> WcpsResult<(&XmlElement, &XmlElement)> {
    match element.children.as_slice() {
        [left, right] => Ok((left, right)),
        other => Err(WcpsError::invalid_parameter(
            &element.name,
            format!("expected two operands, found {}", other.len()),
        )),
    }
}
