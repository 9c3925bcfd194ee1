//! Coverage constructors (`construct`, `const`) and `scale`.

use num_bigint::BigInt;
use tracing::debug;

use wcps_common::{
    AxisType, CellDomainElement, CoverageType, DomainElement, DomainElementDef, RangeField,
    WcpsError, WcpsResult,
};

use super::subset::{dimension_subsets, SubsetKind, PARAMETER_TAGS};
use super::{integer_param, CoverageExpr, Operand, ParseContext};
use crate::info::{AxisInfo, CoverageInfo};
use crate::xml::XmlElement;

/// `axisIterator`: a variable ranging over `[lo:hi]` along a named axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisIterator {
    pub variable: String,
    pub axis: String,
    pub lo: i64,
    pub hi: i64,
}

impl AxisIterator {
    pub fn parse(element: &XmlElement) -> WcpsResult<AxisIterator> {
        let variable = element.required_child_text("iteratorVar")?.to_string();
        let axis = element.required_child_text("axis")?.to_string();
        let lo_el = element
            .child("lowerBound")
            .ok_or_else(|| missing("axisIterator", "lowerBound"))?;
        let hi_el = element
            .child("upperBound")
            .ok_or_else(|| missing("axisIterator", "upperBound"))?;
        let lo = integer_param(element, lo_el)?;
        let hi = integer_param(element, hi_el)?;
        if lo > hi {
            return Err(WcpsError::invalid_parameter(
                &axis,
                format!("iterator bounds [{}:{}] are inverted", lo, hi),
            ));
        }
        Ok(AxisIterator {
            variable,
            axis,
            lo,
            hi,
        })
    }

    pub fn interval(&self) -> String {
        format!("{}:{}", self.lo, self.hi)
    }

    /// Grid axis spanned by this iterator.
    fn axis_info(&self) -> WcpsResult<AxisInfo> {
        let axis_type = AxisType::from_label(&self.axis).unwrap_or(AxisType::Other);
        let def = DomainElementDef {
            name: self.axis.clone(),
            axis_type: axis_type.label().to_string(),
            num_lo: Some(self.lo as f64),
            num_hi: Some(self.hi as f64),
            ..Default::default()
        };
        let mut domain = DomainElement::new(&def, &AxisType::ALL)?;
        let cell = CellDomainElement::new(BigInt::from(self.lo), BigInt::from(self.hi))?;
        domain.set_resolution(cell.count())?;
        Ok(AxisInfo {
            domain,
            native: cell.clone(),
            cell,
        })
    }
}

fn parse_iterators(element: &XmlElement) -> WcpsResult<Vec<AxisIterator>> {
    let iterators: Vec<AxisIterator> = element
        .children_named("axisIterator")
        .map(AxisIterator::parse)
        .collect::<WcpsResult<_>>()?;
    if iterators.is_empty() {
        return Err(missing(&element.name, "axisIterator"));
    }
    Ok(iterators)
}

/// Schema of a coverage created from scratch over the iterator domain.
fn constructed_info(
    name: &str,
    iterators: &[AxisIterator],
    range_fields: Vec<RangeField>,
) -> WcpsResult<CoverageInfo> {
    Ok(CoverageInfo {
        coverage_name: name.to_string(),
        coverage_type: CoverageType::GridCoverage,
        axes: iterators
            .iter()
            .map(AxisIterator::axis_info)
            .collect::<WcpsResult<_>>()?,
        range_fields,
        null_set: Vec::new(),
        interpolation_default: None,
        interpolation_set: Vec::new(),
        bbox: None,
    })
}

/// `construct`: `marray i in [lo:hi], ... values <expr>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructCoverage {
    pub iterators: Vec<AxisIterator>,
    pub body: Box<Operand>,
    info: CoverageInfo,
}

impl ConstructCoverage {
    pub fn parse(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<ConstructCoverage> {
        let name = element.child_text("name").unwrap_or("construct");
        let iterators = parse_iterators(element)?;

        let body_el = element
            .children
            .iter()
            .find(|c| c.name != "name" && c.name != "axisIterator")
            .ok_or_else(|| missing("construct", "value expression"))?;
        let scope = ctx.with_variables(iterators.iter().map(|i| i.variable.clone()));
        let body = Operand::parse(body_el, &scope)?;

        let range_fields = match body.coverage_info() {
            Some(info) => info.range_fields.clone(),
            None => vec![RangeField::new("value", "double")],
        };
        let info = constructed_info(name, &iterators, range_fields)?;
        debug!(coverage = name, axes = iterators.len(), "constructed coverage");

        Ok(ConstructCoverage {
            iterators,
            body: Box::new(body),
            info,
        })
    }

    pub fn info(&self) -> &CoverageInfo {
        &self.info
    }

    pub fn to_rasql(&self) -> String {
        let ranges: Vec<String> = self
            .iterators
            .iter()
            .map(|i| format!("{} in [{}]", i.variable, i.interval()))
            .collect();
        format!("marray {} values {}", ranges.join(", "), self.body.to_rasql())
    }
}

/// `const`: an array literal listing every cell value.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantCoverage {
    pub iterators: Vec<AxisIterator>,
    pub values: Vec<String>,
    info: CoverageInfo,
}

impl ConstantCoverage {
    pub fn parse(element: &XmlElement, _ctx: &ParseContext<'_>) -> WcpsResult<ConstantCoverage> {
        let name = element.child_text("name").unwrap_or("const");
        let iterators = parse_iterators(element)?;
        let values: Vec<String> = element
            .children_named("value")
            .map(|v| v.text.trim().to_string())
            .collect();

        let info = constructed_info(name, &iterators, vec![RangeField::new("value", "double")])?;
        let expected = info.cell_count();
        if BigInt::from(values.len()) != expected {
            return Err(WcpsError::invalid_parameter(
                "const",
                format!(
                    "{} values given for a domain of {} cells",
                    values.len(),
                    expected
                ),
            ));
        }

        Ok(ConstantCoverage {
            iterators,
            values,
            info,
        })
    }

    pub fn info(&self) -> &CoverageInfo {
        &self.info
    }

    pub fn to_rasql(&self) -> String {
        let sdom: Vec<String> = self.iterators.iter().map(|i| i.interval()).collect();
        format!("<[{}] {}>", sdom.join(","), self.values.join(", "))
    }
}

/// `scale`: resample the operand onto new pixel extents.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleExpr {
    pub operand: Box<CoverageExpr>,
    info: CoverageInfo,
}

impl ScaleExpr {
    pub fn parse(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<ScaleExpr> {
        let operand_el = element
            .children
            .iter()
            .find(|c| !PARAMETER_TAGS.contains(&c.name.as_str()) && c.name != "fieldInterpolation")
            .ok_or_else(|| missing("scale", "coverage operand"))?;
        let operand = CoverageExpr::parse(operand_el, ctx)?;

        let mut info = operand.info().clone();
        for subset in dimension_subsets(element, SubsetKind::Trim)? {
            let index = info.require_axis(subset.dimension())?;
            let axis = &mut info.axes[index];
            let (lo, hi) = axis
                .domain
                .resolve_subset_on(&subset, &axis.native, &axis.cell)?;
            if lo > hi {
                return Err(WcpsError::invalid_parameter(
                    subset.dimension(),
                    format!("scale target [{}:{}] is inverted", lo, hi),
                ));
            }
            axis.cell.apply_resolved(&subset, lo, hi);
            axis.native = axis.cell.clone();
            if axis.domain.numeric_bounds().is_some() {
                axis.domain.set_resolution(axis.cell.count())?;
            }
        }

        Ok(ScaleExpr {
            operand: Box::new(operand),
            info,
        })
    }

    pub fn info(&self) -> &CoverageInfo {
        &self.info
    }

    pub fn to_rasql(&self) -> String {
        format!("scale({}, {})", self.operand.to_rasql(), self.info.sdom())
    }
}

fn missing(tag: &str, what: &str) -> WcpsError {
    WcpsError::invalid_parameter(tag, format!("missing {}", what))
}
