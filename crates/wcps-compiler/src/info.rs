//! Coverage schema descriptor carried by every coverage-valued AST node.

use num_bigint::BigInt;

use wcps_common::{
    BoundingBox, CellDomainElement, CoverageMetadata, CoverageType, DomainElement, RangeField,
    WcpsError, WcpsResult,
};

/// One axis of a coverage schema: its CRS extent and its pixel extent.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisInfo {
    pub domain: DomainElement,
    pub cell: CellDomainElement,
    /// Pixel extent whose origin lines up with the lower CRS bound of `domain`.
    pub native: CellDomainElement,
}

impl AxisInfo {
    pub fn name(&self) -> &str {
        self.domain.name()
    }
}

/// Schema of an intermediate or final coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageInfo {
    pub coverage_name: String,
    pub coverage_type: CoverageType,
    pub axes: Vec<AxisInfo>,
    pub range_fields: Vec<RangeField>,
    pub null_set: Vec<String>,
    pub interpolation_default: Option<String>,
    pub interpolation_set: Vec<String>,
    pub bbox: Option<BoundingBox>,
}

impl CoverageInfo {
    pub fn from_metadata(meta: &CoverageMetadata) -> Self {
        let axes = meta
            .domains
            .iter()
            .zip(&meta.cell_domains)
            .map(|(domain, cell)| AxisInfo {
                domain: domain.clone(),
                cell: cell.clone(),
                native: cell.clone(),
            })
            .collect();
        Self {
            coverage_name: meta.coverage_name.clone(),
            coverage_type: meta.coverage_type.clone(),
            axes,
            range_fields: meta.range_fields.clone(),
            null_set: meta.null_set.clone(),
            interpolation_default: meta.interpolation_default.clone(),
            interpolation_set: meta.interpolation_default.iter().cloned().collect(),
            bbox: meta.bbox.clone(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.axes.len()
    }

    pub fn axis_labels(&self) -> Vec<&str> {
        self.axes.iter().map(|a| a.name()).collect()
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.iter().position(|a| a.name() == name)
    }

    /// Index of an axis, or `InvalidAxis` naming it.
    pub fn require_axis(&self, name: &str) -> WcpsResult<usize> {
        self.axis_index(name).ok_or_else(|| WcpsError::InvalidAxis {
            axis: name.to_string(),
            message: format!("coverage '{}' has no such axis", self.coverage_name),
        })
    }

    /// Two schemas are compatible when they have the same number of axes and
    /// the same pixel extent along each of them.
    pub fn is_compatible(&self, other: &CoverageInfo) -> bool {
        self.dimension() == other.dimension()
            && self
                .axes
                .iter()
                .zip(&other.axes)
                .all(|(a, b)| a.cell.lo() == b.cell.lo() && a.cell.hi() == b.cell.hi())
    }

    /// Fail with `IncompatibleCoverages` unless `other` is compatible.
    pub fn ensure_compatible(&self, other: &CoverageInfo, context: &str) -> WcpsResult<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(WcpsError::IncompatibleCoverages(format!(
                "{}: '{}' and '{}' differ in dimensionality or extent",
                context, self.coverage_name, other.coverage_name
            )))
        }
    }

    /// RasQL spatial domain `[lo:hi,...]` over all axes.
    pub fn sdom(&self) -> String {
        let parts: Vec<String> = self
            .axes
            .iter()
            .map(|a| format!("{}:{}", a.cell.lo(), a.cell.hi()))
            .collect();
        format!("[{}]", parts.join(","))
    }

    /// Number of cells of the whole grid, exact for any extent.
    pub fn cell_count(&self) -> BigInt {
        self.axes
            .iter()
            .map(|a| a.cell.hi() - a.cell.lo() + 1u8)
            .product()
    }
}
