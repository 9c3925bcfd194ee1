//! Operand pairs of binary induced operations.

use tracing::trace;

use wcps_common::{WcpsError, WcpsResult};

use super::{Attempt, CoverageExpr, Operand, ParseContext, ScalarExpr};
use crate::info::CoverageInfo;
use crate::xml::XmlElement;

/// Two operands, at least one of them coverage-valued.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageExprPair {
    pub first: Operand,
    pub second: Operand,
    info: CoverageInfo,
}

impl CoverageExprPair {
    /// Parse two sibling fragments.
    ///
    /// Combinations are tried in the order (coverage, scalar), (scalar,
    /// coverage), (coverage, coverage). The schema comes from the
    /// coverage-valued side, the left one when both are coverages.
    pub fn parse(
        left: &XmlElement,
        right: &XmlElement,
        ctx: &ParseContext<'_>,
    ) -> WcpsResult<CoverageExprPair> {
        let left_coverage = CoverageExpr::try_parse(left, ctx)?;

        if let Attempt::Matched(ref first) = left_coverage {
            if let Attempt::Matched(second) = ScalarExpr::try_parse(right, ctx)? {
                return Ok(Self::new(
                    Operand::Coverage(first.clone()),
                    Operand::Scalar(second),
                    first.info().clone(),
                ));
            }
            trace!(left = %left.name, right = %right.name, "not a coverage + scalar pair");
        }

        if let Attempt::Matched(first) = ScalarExpr::try_parse(left, ctx)? {
            return match CoverageExpr::try_parse(right, ctx)? {
                Attempt::Matched(second) => {
                    let info = second.info().clone();
                    Ok(Self::new(
                        Operand::Scalar(first),
                        Operand::Coverage(second),
                        info,
                    ))
                }
                Attempt::NoMatch(_) => Err(pair_error(left, right)),
            };
        }
        trace!(left = %left.name, right = %right.name, "not a scalar + coverage pair");

        if let Attempt::Matched(first) = left_coverage {
            if let Attempt::Matched(second) = CoverageExpr::try_parse(right, ctx)? {
                first
                    .info()
                    .ensure_compatible(second.info(), "binary coverage operation")?;
                let info = first.info().clone();
                return Ok(Self::new(
                    Operand::Coverage(first),
                    Operand::Coverage(second),
                    info,
                ));
            }
        }

        Err(pair_error(left, right))
    }

    fn new(first: Operand, second: Operand, info: CoverageInfo) -> Self {
        Self {
            first,
            second,
            info,
        }
    }

    pub fn info(&self) -> &CoverageInfo {
        &self.info
    }
}

fn pair_error(left: &XmlElement, right: &XmlElement) -> WcpsError {
    WcpsError::UnrecognizedConstruct {
        node: format!("{}, {}", left.name, right.name),
    }
}
