//! `switch` expressions: `case when C1 then R1 ... else D end`.

use tracing::debug;

use wcps_common::{WcpsError, WcpsResult};

use super::{CoverageExpr, ParseContext};
use crate::info::CoverageInfo;
use crate::xml::XmlElement;

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchExpr {
    /// (condition, result) pairs in document order
    pub cases: Vec<(CoverageExpr, CoverageExpr)>,
    pub default: Box<CoverageExpr>,
}

impl SwitchExpr {
    /// Parse a `switch` element.
    ///
    /// Its children are `case` elements holding a `condition` and a `result`,
    /// followed by exactly one `default` holding a `result`. Every branch must
    /// be compatible with the schema of the first one.
    pub fn parse(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<SwitchExpr> {
        if element.name != "switch" {
            return Err(unexpected(&element.name));
        }

        let mut cases = Vec::new();
        let mut default: Option<CoverageExpr> = None;

        for child in &element.children {
            match child.name.as_str() {
                "case" if default.is_none() => {
                    let mut condition = None;
                    let mut result = None;
                    for part in &child.children {
                        let slot = match part.name.as_str() {
                            "condition" => &mut condition,
                            "result" => &mut result,
                            other => return Err(unexpected(other)),
                        };
                        if slot.is_some() {
                            return Err(unexpected(&part.name));
                        }
                        *slot = Some(CoverageExpr::parse(part.only_child()?, ctx)?);
                    }
                    match (condition, result) {
                        (Some(c), Some(r)) => cases.push((c, r)),
                        _ => {
                            return Err(WcpsError::invalid_parameter(
                                "case",
                                "a case needs both a condition and a result",
                            ))
                        }
                    }
                }
                "default" if default.is_none() => {
                    let mut result = None;
                    for part in &child.children {
                        if part.name != "result" || result.is_some() {
                            return Err(unexpected(&part.name));
                        }
                        result = Some(CoverageExpr::parse(part.only_child()?, ctx)?);
                    }
                    let result = result.ok_or_else(|| {
                        WcpsError::invalid_parameter("default", "default case has no result")
                    })?;
                    default = Some(result);
                }
                other => return Err(unexpected(other)),
            }
        }

        let default = default.ok_or(WcpsError::MissingSwitchDefault)?;
        let expr = SwitchExpr {
            cases,
            default: Box::new(default),
        };
        expr.check_branches()?;
        debug!(cases = expr.cases.len(), "compiled switch expression");
        Ok(expr)
    }

    fn branches(&self) -> impl Iterator<Item = &CoverageExpr> {
        self.cases
            .iter()
            .flat_map(|(c, r)| [c, r])
            .chain(std::iter::once(self.default.as_ref()))
    }

    fn check_branches(&self) -> WcpsResult<()> {
        let first = self.info();
        for branch in self.branches().skip(1) {
            first.ensure_compatible(branch.info(), "switch branch")?;
        }
        Ok(())
    }

    /// Schema of the first compiled child.
    pub fn info(&self) -> &CoverageInfo {
        match self.cases.first() {
            Some((condition, _)) => condition.info(),
            None => self.default.info(),
        }
    }

    pub fn to_rasql(&self) -> String {
        let mut out = String::from("case ");
        for (condition, result) in &self.cases {
            out.push_str(&format!(
                "when {} then {} ",
                condition.to_rasql(),
                result.to_rasql()
            ));
        }
        out.push_str(&format!("else {} end", self.default.to_rasql()));
        out
    }
}

fn unexpected(node: &str) -> WcpsError {
    WcpsError::UnexpectedNode {
        node: node.to_string(),
    }
}
