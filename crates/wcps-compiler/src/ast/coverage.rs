//! Coverage expression dispatcher.

use tracing::{debug, trace};

use wcps_common::{WcpsError, WcpsResult};

use super::{
    Attempt, ConstantCoverage, ConstructCoverage, InducedExpr, ParseContext, ParseResult,
    ScaleExpr, SetMetadataExpr, SubsetExpr, SwitchExpr,
};
use crate::info::CoverageInfo;
use crate::xml::XmlElement;

/// A coverage-valued expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CoverageExpr {
    Coverage(CoverageRef),
    Constant(ConstantCoverage),
    Construct(ConstructCoverage),
    Scale(ScaleExpr),
    Switch(SwitchExpr),
    SetMetadata(SetMetadataExpr),
    Induced(InducedExpr),
    Subset(SubsetExpr),
}

type GroupParser = fn(&XmlElement, &ParseContext<'_>) -> ParseResult<CoverageExpr>;

/// Grouped productions, in the order they are tried.
const GROUPS: [(&str, GroupParser); 3] = [
    ("set metadata operation", try_set_metadata),
    ("induced operation", try_induced),
    ("subset operation", try_subset),
];

fn try_set_metadata(e: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<CoverageExpr> {
    SetMetadataExpr::try_parse(e, ctx).map(|a| a.map(CoverageExpr::SetMetadata))
}

fn try_induced(e: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<CoverageExpr> {
    InducedExpr::try_parse(e, ctx).map(|a| a.map(CoverageExpr::Induced))
}

fn try_subset(e: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<CoverageExpr> {
    SubsetExpr::try_parse(e, ctx).map(|a| a.map(CoverageExpr::Subset))
}

impl CoverageExpr {
    /// Parse a fragment that must be coverage-valued.
    pub fn parse(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<CoverageExpr> {
        match Self::try_parse(element, ctx)? {
            Attempt::Matched(expr) => Ok(expr),
            Attempt::NoMatch(_) => Err(WcpsError::UnrecognizedConstruct {
                node: element.name.clone(),
            }),
        }
    }

    /// Try every coverage production against a fragment.
    ///
    /// Tagged productions are decided by the element name alone; the grouped
    /// productions are then tried in order and the first match wins.
    pub fn try_parse(element: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<CoverageExpr> {
        let ctx = &ctx.nested()?;
        trace!(node = %element.name, "parsing coverage expression");

        let tagged = match element.name.as_str() {
            "coverage" => Some(CoverageRef::parse(element, ctx).map(CoverageExpr::Coverage)),
            "const" => Some(ConstantCoverage::parse(element, ctx).map(CoverageExpr::Constant)),
            "construct" => Some(ConstructCoverage::parse(element, ctx).map(CoverageExpr::Construct)),
            "scale" => Some(ScaleExpr::parse(element, ctx).map(CoverageExpr::Scale)),
            "switch" => Some(SwitchExpr::parse(element, ctx).map(CoverageExpr::Switch)),
            "crsTransform" => Some(Err(WcpsError::Unimplemented {
                feature: "crsTransform".to_string(),
            })),
            _ => None,
        };
        if let Some(result) = tagged {
            return result.map(Attempt::Matched);
        }

        for (label, parse) in GROUPS {
            match parse(element, ctx)? {
                Attempt::Matched(expr) => {
                    debug!(node = %element.name, "matched {}", label);
                    return Ok(Attempt::Matched(expr));
                }
                Attempt::NoMatch(reason) => {
                    trace!(node = %element.name, %reason, "failed to match {}", label);
                }
            }
        }

        Ok(Attempt::NoMatch(format!(
            "<{}> is not a coverage expression",
            element.name
        )))
    }

    /// Schema of the coverage this expression evaluates to.
    pub fn info(&self) -> &CoverageInfo {
        match self {
            CoverageExpr::Coverage(c) => &c.info,
            CoverageExpr::Constant(c) => c.info(),
            CoverageExpr::Construct(c) => c.info(),
            CoverageExpr::Scale(s) => s.info(),
            CoverageExpr::Switch(s) => s.info(),
            CoverageExpr::SetMetadata(s) => s.info(),
            CoverageExpr::Induced(i) => i.info(),
            CoverageExpr::Subset(s) => s.info(),
        }
    }

    pub fn to_rasql(&self) -> String {
        match self {
            CoverageExpr::Coverage(c) => c.iterator.clone(),
            CoverageExpr::Constant(c) => c.to_rasql(),
            CoverageExpr::Construct(c) => c.to_rasql(),
            CoverageExpr::Scale(s) => s.to_rasql(),
            CoverageExpr::Switch(s) => s.to_rasql(),
            CoverageExpr::SetMetadata(s) => s.to_rasql(),
            CoverageExpr::Induced(i) => i.to_rasql(),
            CoverageExpr::Subset(s) => s.to_rasql(),
        }
    }
}

/// Reference to the coverages bound to an iterator variable.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageRef {
    pub iterator: String,
    pub info: CoverageInfo,
}

impl CoverageRef {
    /// Resolve `<coverage>var</coverage>`.
    ///
    /// Every coverage bound to the iterator must share one schema shape.
    pub fn parse(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<CoverageRef> {
        let iterator = element.text.trim();
        let names = ctx.coverages(iterator)?;
        let (first, rest) = names
            .split_first()
            .ok_or_else(|| WcpsError::UndefinedIterator(iterator.to_string()))?;

        let info = CoverageInfo::from_metadata(&ctx.source().read(first)?);
        for name in rest {
            let other = CoverageInfo::from_metadata(&ctx.source().read(name)?);
            info.ensure_compatible(&other, &format!("iterator {}", iterator))?;
        }
        debug!(iterator, coverage = %info.coverage_name, "found simple coverage definition");

        Ok(CoverageRef {
            iterator: iterator.to_string(),
            info,
        })
    }
}
