//! Trim, extend and slice operations.

use num_bigint::BigInt;
use tracing::debug;

use wcps_common::{DimensionSubset, WcpsError, WcpsResult};

use super::{bound_text, no_match, Attempt, CoverageExpr, ParseContext, ParseResult};
use crate::info::CoverageInfo;
use crate::xml::XmlElement;

pub(crate) const PARAMETER_TAGS: [&str; 6] = [
    "axis",
    "srsName",
    "crs",
    "lowerBound",
    "upperBound",
    "slicingPosition",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsetKind {
    Trim,
    Extend,
    Slice,
}

impl SubsetKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "trim" => Some(Self::Trim),
            "extend" => Some(Self::Extend),
            "slice" => Some(Self::Slice),
            _ => None,
        }
    }
}

/// One axis of a subset, resolved to pixel bounds of the operand.
#[derive(Debug, Clone, PartialEq)]
pub struct SubsetSpec {
    pub axis: usize,
    pub subset: DimensionSubset,
    pub lo: BigInt,
    pub hi: BigInt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubsetExpr {
    pub kind: SubsetKind,
    pub operand: Box<CoverageExpr>,
    pub specs: Vec<SubsetSpec>,
    info: CoverageInfo,
}

impl SubsetExpr {
    pub fn try_parse(element: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<SubsetExpr> {
        let Some(kind) = SubsetKind::from_tag(&element.name) else {
            return no_match(element, "subset operation");
        };

        let operand_el = element
            .children
            .iter()
            .find(|c| !PARAMETER_TAGS.contains(&c.name.as_str()))
            .ok_or_else(|| {
                WcpsError::invalid_parameter(&element.name, "missing coverage operand")
            })?;
        let operand = CoverageExpr::parse(operand_el, ctx)?;
        let source = operand.info();

        let mut specs: Vec<SubsetSpec> = Vec::new();
        for subset in dimension_subsets(element, kind)? {
            let axis = source.require_axis(subset.dimension())?;
            if specs.iter().any(|s| s.axis == axis) {
                return Err(WcpsError::InvalidAxis {
                    axis: subset.dimension().to_string(),
                    message: "axis is subsetted twice".to_string(),
                });
            }
            let current = &source.axes[axis];
            let (lo, hi) = current
                .domain
                .resolve_subset_on(&subset, &current.native, &current.cell)?;
            if lo > hi {
                return Err(WcpsError::invalid_parameter(
                    subset.dimension(),
                    format!("lower bound {} is above upper bound {}", lo, hi),
                ));
            }
            let within = &lo >= current.cell.lo() && &hi <= current.cell.hi();
            if kind != SubsetKind::Extend && !within {
                return Err(WcpsError::invalid_parameter(
                    subset.dimension(),
                    format!(
                        "[{}:{}] is outside the axis extent [{}:{}]",
                        lo,
                        hi,
                        current.cell.lo(),
                        current.cell.hi()
                    ),
                ));
            }
            specs.push(SubsetSpec {
                axis,
                subset,
                lo,
                hi,
            });
        }
        if specs.is_empty() {
            return Err(WcpsError::invalid_parameter(
                &element.name,
                "subset names no axis",
            ));
        }

        let info = subset_info(source, kind, &specs);
        debug!(
            kind = ?kind,
            axes = ?specs.iter().map(|s| s.subset.dimension()).collect::<Vec<_>>(),
            "resolved subset"
        );

        Ok(Attempt::Matched(SubsetExpr {
            kind,
            operand: Box::new(operand),
            specs,
            info,
        }))
    }

    pub fn info(&self) -> &CoverageInfo {
        &self.info
    }

    fn spec(&self, axis: usize) -> Option<&SubsetSpec> {
        self.specs.iter().find(|s| s.axis == axis)
    }

    pub fn to_rasql(&self) -> String {
        let operand = self.operand.info();
        let intervals: Vec<String> = (0..operand.dimension())
            .map(|i| match (self.kind, self.spec(i)) {
                (SubsetKind::Slice, Some(spec)) => spec.lo.to_string(),
                (_, Some(spec)) => format!("{}:{}", spec.lo, spec.hi),
                (SubsetKind::Extend, None) => {
                    let cell = &operand.axes[i].cell;
                    format!("{}:{}", cell.lo(), cell.hi())
                }
                (_, None) => "*:*".to_string(),
            })
            .collect();

        match self.kind {
            SubsetKind::Extend => format!(
                "extend({}, [{}])",
                self.operand.to_rasql(),
                intervals.join(",")
            ),
            SubsetKind::Trim | SubsetKind::Slice => {
                format!("({})[{}]", self.operand.to_rasql(), intervals.join(","))
            }
        }
    }
}

/// Group the parameter children into one subset per `axis` element.
pub(crate) fn dimension_subsets(element: &XmlElement, kind: SubsetKind) -> WcpsResult<Vec<DimensionSubset>> {
    struct Pending<'e> {
        axis: &'e str,
        crs: Option<&'e str>,
        low: Option<&'e str>,
        high: Option<&'e str>,
    }

    let mut groups: Vec<Pending<'_>> = Vec::new();
    for child in &element.children {
        let name = child.name.as_str();
        if name == "axis" {
            groups.push(Pending {
                axis: child.text.trim(),
                crs: None,
                low: None,
                high: None,
            });
            continue;
        }
        if !PARAMETER_TAGS.contains(&name) {
            continue;
        }
        let current = groups.last_mut().ok_or_else(|| {
            WcpsError::invalid_parameter(&element.name, format!("<{}> before any <axis>", name))
        })?;
        match name {
            "srsName" | "crs" => current.crs = Some(child.text.trim()),
            "lowerBound" => current.low = Some(bound_text(child)),
            "upperBound" => current.high = Some(bound_text(child)),
            "slicingPosition" => {
                current.low = Some(bound_text(child));
                current.high = current.low;
            }
            _ => {}
        }
    }

    groups
        .into_iter()
        .map(|g| {
            let missing = |what: &str| {
                WcpsError::invalid_parameter(g.axis, format!("missing {} for axis", what))
            };
            let subset = match kind {
                SubsetKind::Slice => {
                    let point = g.low.ok_or_else(|| missing("slicingPosition"))?;
                    DimensionSubset::slice(g.axis, point)
                }
                SubsetKind::Trim | SubsetKind::Extend => {
                    let low = g.low.ok_or_else(|| missing("lowerBound"))?;
                    let high = g.high.ok_or_else(|| missing("upperBound"))?;
                    DimensionSubset::trim(g.axis, low, high)
                }
            };
            Ok(match g.crs {
                Some(crs) if !crs.is_empty() => subset.with_crs(crs),
                _ => subset,
            })
        })
        .collect()
}

fn subset_info(source: &CoverageInfo, kind: SubsetKind, specs: &[SubsetSpec]) -> CoverageInfo {
    let mut info = source.clone();
    for spec in specs {
        info.axes[spec.axis]
            .cell
            .apply_resolved(&spec.subset, spec.lo.clone(), spec.hi.clone());
    }
    if kind == SubsetKind::Slice {
        let mut removed: Vec<usize> = specs.iter().map(|s| s.axis).collect();
        removed.sort_unstable_by(|a, b| b.cmp(a));
        for axis in removed {
            info.axes.remove(axis);
        }
    }
    info
}
