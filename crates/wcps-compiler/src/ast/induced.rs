//! Induced (cell-wise) operations.

use wcps_common::{RangeField, WcpsError, WcpsResult};

use super::scalar::two_children;
use super::{
    integer_param, no_match, Attempt, CoverageExpr, CoverageExprPair, ParseContext, ParseResult,
};
use crate::info::CoverageInfo;
use crate::xml::XmlElement;

/// Cell-wise unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Sqrt,
    Abs,
    Exp,
    Log,
    Ln,
    Sin,
    Cos,
    Tan,
    Sinh,
    Cosh,
    Tanh,
    Arcsin,
    Arccos,
    Arctan,
    Not,
    Re,
    Im,
}

impl UnaryOp {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let op = match tag {
            "unaryPlus" => Self::Plus,
            "unaryMinus" => Self::Minus,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "exp" => Self::Exp,
            "log" => Self::Log,
            "ln" => Self::Ln,
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "arcsin" => Self::Arcsin,
            "arccos" => Self::Arccos,
            "arctan" => Self::Arctan,
            "not" => Self::Not,
            "re" => Self::Re,
            "im" => Self::Im,
            _ => return None,
        };
        Some(op)
    }

    /// RasQL function name, or the sign for `+`/`-`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Sqrt => "sqrt",
            Self::Abs => "abs",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Ln => "ln",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Arcsin => "arcsin",
            Self::Arccos => "arccos",
            Self::Arctan => "arctan",
            Self::Not => "not",
            Self::Re => "re",
            Self::Im => "im",
        }
    }
}

/// Cell-wise binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Plus,
    Minus,
    Mult,
    Div,
    And,
    Or,
    Xor,
    Equals,
    NotEqual,
    LessThan,
    GreaterThan,
    LessOrEqual,
    GreaterOrEqual,
    Overlay,
}

impl BinaryOp {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let op = match tag {
            "plus" => Self::Plus,
            "minus" => Self::Minus,
            "mult" => Self::Mult,
            "div" => Self::Div,
            "and" => Self::And,
            "or" => Self::Or,
            "xor" => Self::Xor,
            "equals" => Self::Equals,
            "notEqual" => Self::NotEqual,
            "lessThan" => Self::LessThan,
            "greaterThan" => Self::GreaterThan,
            "lessOrEqual" => Self::LessOrEqual,
            "greaterOrEqual" => Self::GreaterOrEqual,
            "overlay" => Self::Overlay,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Mult => "*",
            Self::Div => "/",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Equals => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessOrEqual => "<=",
            Self::GreaterOrEqual => ">=",
            Self::Overlay => "overlay",
        }
    }

    /// Comparison and logical operators yield boolean cells.
    pub fn is_boolean(&self) -> bool {
        !matches!(
            self,
            Self::Plus | Self::Minus | Self::Mult | Self::Div | Self::Overlay
        )
    }
}

/// An induced operation applied cell by cell.
#[derive(Debug, Clone, PartialEq)]
pub enum InducedExpr {
    Unary {
        op: UnaryOp,
        operand: Box<CoverageExpr>,
    },
    Bit {
        operand: Box<CoverageExpr>,
        index: i64,
        info: CoverageInfo,
    },
    Cast {
        operand: Box<CoverageExpr>,
        target: String,
        info: CoverageInfo,
    },
    FieldSelect {
        operand: Box<CoverageExpr>,
        field: String,
        info: CoverageInfo,
    },
    RangeConstructor {
        components: Vec<(String, CoverageExpr)>,
        info: CoverageInfo,
    },
    Binary {
        op: BinaryOp,
        pair: Box<CoverageExprPair>,
        info: CoverageInfo,
    },
}

impl InducedExpr {
    pub fn try_parse(element: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<InducedExpr> {
        let tag = element.name.as_str();

        if let Some(op) = UnaryOp::from_tag(tag) {
            let operand = CoverageExpr::parse(element.only_child()?, ctx)?;
            return Ok(Attempt::Matched(InducedExpr::Unary {
                op,
                operand: Box::new(operand),
            }));
        }

        if let Some(op) = BinaryOp::from_tag(tag) {
            let (left, right) = two_children(element)?;
            let pair = CoverageExprPair::parse(left, right, ctx)?;
            let mut info = pair.info().clone();
            if op.is_boolean() {
                for field in &mut info.range_fields {
                    field.datatype = "boolean".to_string();
                }
            }
            return Ok(Attempt::Matched(InducedExpr::Binary {
                op,
                pair: Box::new(pair),
                info,
            }));
        }

        let expr = match tag {
            "bit" => {
                let operand = operand_of(element, &["bitIndex"], ctx)?;
                let index_el = element.child("bitIndex").ok_or_else(|| missing(tag, "bitIndex"))?;
                let index = integer_param(element, index_el)?;
                let mut info = operand.info().clone();
                for field in &mut info.range_fields {
                    field.datatype = "boolean".to_string();
                }
                InducedExpr::Bit {
                    operand: Box::new(operand),
                    index,
                    info,
                }
            }
            "cast" => {
                let operand = operand_of(element, &["type"], ctx)?;
                let target = element
                    .child_text("type")
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| missing(tag, "type"))?
                    .to_string();
                let mut info = operand.info().clone();
                for field in &mut info.range_fields {
                    field.datatype = target.clone();
                }
                InducedExpr::Cast {
                    operand: Box::new(operand),
                    target,
                    info,
                }
            }
            "fieldSelect" => {
                let operand = operand_of(element, &["field"], ctx)?;
                let field = element
                    .child("field")
                    .and_then(|f| f.child_text("name").or(Some(f.text.trim())))
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| missing(tag, "field"))?
                    .to_string();
                let mut info = operand.info().clone();
                let selected: Vec<RangeField> = info
                    .range_fields
                    .iter()
                    .filter(|f| f.name == field)
                    .cloned()
                    .collect();
                if selected.is_empty() {
                    return Err(WcpsError::invalid_parameter(
                        "field",
                        format!(
                            "coverage '{}' has no range field '{}'",
                            info.coverage_name, field
                        ),
                    ));
                }
                info.range_fields = selected;
                InducedExpr::FieldSelect {
                    operand: Box::new(operand),
                    field,
                    info,
                }
            }
            "rangeConstructor" => Self::range_constructor(element, ctx)?,
            _ => return no_match(element, "induced operation"),
        };
        Ok(Attempt::Matched(expr))
    }

    fn range_constructor(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<InducedExpr> {
        let mut components = Vec::new();
        for component in element.children_named("component") {
            let field = component
                .child_text("field")
                .filter(|f| !f.is_empty())
                .ok_or_else(|| missing("component", "field"))?
                .to_string();
            let expr = operand_of(component, &["field"], ctx)?;
            components.push((field, expr));
        }

        let Some((_, first)) = components.first() else {
            return Err(WcpsError::invalid_parameter(
                "rangeConstructor",
                "range constructor needs at least one component",
            ));
        };
        let mut info = first.info().clone();
        let mut fields = Vec::with_capacity(components.len());
        for (name, expr) in &components {
            info.ensure_compatible(expr.info(), "range constructor")?;
            let datatype = expr
                .info()
                .range_fields
                .first()
                .map(|f| f.datatype.clone())
                .unwrap_or_default();
            fields.push(RangeField::new(name.clone(), datatype));
        }
        info.range_fields = fields;
        Ok(InducedExpr::RangeConstructor { components, info })
    }

    pub fn info(&self) -> &CoverageInfo {
        match self {
            InducedExpr::Unary { operand, .. } => operand.info(),
            InducedExpr::Bit { info, .. }
            | InducedExpr::Cast { info, .. }
            | InducedExpr::FieldSelect { info, .. }
            | InducedExpr::RangeConstructor { info, .. }
            | InducedExpr::Binary { info, .. } => info,
        }
    }

    pub fn to_rasql(&self) -> String {
        match self {
            InducedExpr::Unary { op, operand } => format!("{}({})", op.as_str(), operand.to_rasql()),
            InducedExpr::Bit { operand, index, .. } => {
                format!("bit({}, {})", operand.to_rasql(), index)
            }
            InducedExpr::Cast {
                operand, target, ..
            } => format!("({})({})", target, operand.to_rasql()),
            InducedExpr::FieldSelect { operand, field, .. } => {
                format!("({}).{}", operand.to_rasql(), field)
            }
            InducedExpr::RangeConstructor { components, .. } => {
                let parts: Vec<String> = components.iter().map(|(_, e)| e.to_rasql()).collect();
                format!("{{ {} }}", parts.join(", "))
            }
            InducedExpr::Binary { op, pair, .. } => format!(
                "({} {} {})",
                pair.first.to_rasql(),
                op.as_str(),
                pair.second.to_rasql()
            ),
        }
    }
}

/// The operand of an element whose other children are named parameters.
fn operand_of(
    element: &XmlElement,
    parameters: &[&str],
    ctx: &ParseContext<'_>,
) -> WcpsResult<CoverageExpr> {
    let operand = element
        .children
        .iter()
        .find(|c| !parameters.contains(&c.name.as_str()))
        .ok_or_else(|| {
            WcpsError::invalid_parameter(&element.name, "missing coverage operand")
        })?;
    CoverageExpr::parse(operand, ctx)
}

fn missing(tag: &str, child: &str) -> WcpsError {
    WcpsError::invalid_parameter(tag, format!("missing <{}> element", child))
}
