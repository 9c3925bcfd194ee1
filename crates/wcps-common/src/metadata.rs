//! Coverage metadata as held by the metadata store.
//!
//! [`CoverageMetadataDef`] is the raw, serde-friendly form (catalog files,
//! database rows); [`CoverageMetadata`] is the validated model owning the
//! domain and cell-domain elements of every axis.

use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::axis::AxisType;
use crate::bbox::BoundingBox;
use crate::cell_domain::CellDomainElement;
use crate::crs::GRID_CRS;
use crate::domain::{DomainElement, DomainElementDef};
use crate::error::{WcpsError, WcpsResult};

/// GML coverage subtype.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CoverageType {
    GridCoverage,
    RectifiedGridCoverage,
    ReferenceableGridCoverage,
    MultiPointCoverage,
    Other(String),
}

impl CoverageType {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "GridCoverage" => CoverageType::GridCoverage,
            "RectifiedGridCoverage" => CoverageType::RectifiedGridCoverage,
            "ReferenceableGridCoverage" => CoverageType::ReferenceableGridCoverage,
            "MultiPointCoverage" => CoverageType::MultiPointCoverage,
            other => CoverageType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CoverageType::GridCoverage => "GridCoverage",
            CoverageType::RectifiedGridCoverage => "RectifiedGridCoverage",
            CoverageType::ReferenceableGridCoverage => "ReferenceableGridCoverage",
            CoverageType::MultiPointCoverage => "MultiPointCoverage",
            CoverageType::Other(label) => label,
        }
    }

    /// Any subtype of the abstract GML grid coverage.
    pub fn is_grid(&self) -> bool {
        matches!(
            self,
            CoverageType::GridCoverage
                | CoverageType::RectifiedGridCoverage
                | CoverageType::ReferenceableGridCoverage
        )
    }
}

impl fmt::Display for CoverageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One field (band) of the coverage range type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RangeField {
    pub name: String,
    /// Base type name as known to the array engine (`char`, `float`, ...)
    pub datatype: String,
    #[serde(default)]
    pub nil_values: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_uom_code")]
    pub uom_code: String,
    /// Explicit allowed interval; derived from the datatype when absent
    #[serde(default)]
    pub allowed_values: Option<(String, String)>,
}

fn default_uom_code() -> String {
    "10^0".to_string()
}

impl RangeField {
    pub fn new(name: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            uom_code: default_uom_code(),
            ..Default::default()
        }
    }
}

/// Pixel extent of one axis in a catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDomainDef {
    pub lo: Option<i64>,
    pub hi: Option<i64>,
}

/// Raw coverage metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageMetadataDef {
    pub coverage_name: String,
    pub coverage_type: String,
    pub domain: Vec<DomainElementDef>,
    pub cell_domain: Vec<CellDomainDef>,
    #[serde(default)]
    pub range_fields: Vec<RangeField>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Free-text metadata embedded verbatim in responses
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub null_set: Vec<String>,
    #[serde(default)]
    pub interpolation_default: Option<String>,
    /// Stored grid offset vectors, one row per axis, if the store has them
    #[serde(default)]
    pub offset_vectors: Option<Vec<Vec<f64>>>,
}

/// Validated coverage metadata.
#[derive(Debug, Clone)]
pub struct CoverageMetadata {
    pub coverage_name: String,
    pub coverage_type: CoverageType,
    pub domains: Vec<DomainElement>,
    pub cell_domains: Vec<CellDomainElement>,
    pub range_fields: Vec<RangeField>,
    pub bbox: Option<BoundingBox>,
    pub title: String,
    pub abstract_text: String,
    pub keywords: Vec<String>,
    pub metadata: Option<String>,
    pub null_set: Vec<String>,
    pub interpolation_default: Option<String>,
    pub offset_vectors: Option<Vec<Vec<f64>>>,
}

impl CoverageMetadata {
    /// Validate a raw definition.
    ///
    /// Each axis needs both a domain and a cell-domain element; numeric axes
    /// get their resolution from the number of cells.
    pub fn from_def(def: &CoverageMetadataDef) -> WcpsResult<Self> {
        let name = def.coverage_name.trim();
        if name.is_empty() {
            return Err(WcpsError::invalid_metadata(
                "<unnamed coverage>",
                "coverage name may not be empty",
            ));
        }
        if def.domain.len() != def.cell_domain.len() {
            return Err(WcpsError::invalid_metadata(
                name,
                format!(
                    "{} domain elements but {} cell domain elements",
                    def.domain.len(),
                    def.cell_domain.len()
                ),
            ));
        }
        if def.domain.is_empty() {
            return Err(WcpsError::invalid_metadata(name, "coverage has no axes"));
        }

        let mut seen = HashSet::new();
        let mut domains = Vec::with_capacity(def.domain.len());
        let mut cell_domains = Vec::with_capacity(def.cell_domain.len());

        for (dom_def, cell_def) in def.domain.iter().zip(&def.cell_domain) {
            let mut dom = DomainElement::new(dom_def, &AxisType::ALL)?;
            if !seen.insert(dom.name().to_string()) {
                return Err(WcpsError::invalid_metadata(
                    dom.name(),
                    format!("axis is defined twice in coverage '{}'", name),
                ));
            }
            let cell = CellDomainElement::from_optional(
                cell_def.lo.map(BigInt::from),
                cell_def.hi.map(BigInt::from),
            )
            .map_err(|_| {
                WcpsError::invalid_metadata(dom.name(), "invalid cell domain bounds")
            })?;

            if dom.numeric_bounds().is_some() {
                dom.set_resolution(cell.count())?;
            }
            domains.push(dom);
            cell_domains.push(cell);
        }

        let coverage = Self {
            coverage_name: name.to_string(),
            coverage_type: CoverageType::from_label(&def.coverage_type),
            domains,
            cell_domains,
            range_fields: def.range_fields.clone(),
            bbox: def.bbox.clone(),
            title: def.title.clone(),
            abstract_text: def.abstract_text.clone(),
            keywords: def.keywords.clone(),
            metadata: def.metadata.clone(),
            null_set: def.null_set.clone(),
            interpolation_default: def.interpolation_default.clone(),
            offset_vectors: def.offset_vectors.clone(),
        };
        debug!(
            coverage = %coverage.coverage_name,
            axes = ?coverage.axis_labels(),
            "loaded coverage metadata"
        );
        Ok(coverage)
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.domains.len()
    }

    pub fn axis_labels(&self) -> Vec<&str> {
        self.domains.iter().map(|d| d.name()).collect()
    }

    pub fn domain_index_by_name(&self, axis: &str) -> Option<usize> {
        self.domains.iter().position(|d| d.name() == axis)
    }

    pub fn domain_by_name(&self, axis: &str) -> Option<&DomainElement> {
        self.domains.iter().find(|d| d.name() == axis)
    }

    /// Distinct external CRSs over all axes, in axis order; grid-only axes
    /// contribute the grid CRS.
    pub fn external_crs_list(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for dom in &self.domains {
            let crs = dom.external_crs().unwrap_or(GRID_CRS).to_string();
            if !out.contains(&crs) {
                out.push(crs);
            }
        }
        out
    }

    /// True when all axes share one external CRS.
    pub fn has_single_crs(&self) -> bool {
        let crss: HashSet<Option<&str>> = self.domains.iter().map(|d| d.external_crs()).collect();
        crss.len() == 1
    }

    /// Fail when stored offset vectors describe a rotated grid.
    pub fn check_axis_aligned(&self) -> WcpsResult<()> {
        let Some(ref vectors) = self.offset_vectors else {
            return Ok(());
        };
        for (i, row) in vectors.iter().enumerate() {
            let off_axis = row
                .iter()
                .enumerate()
                .any(|(j, v)| j != i && *v != 0.0);
            if off_axis {
                return Err(WcpsError::UnsupportedCoverageConfiguration(format!(
                    "coverage '{}' has a rotated grid (offset vector {} is not axis-aligned)",
                    self.coverage_name, i
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<&CoverageMetadataDef> for CoverageMetadata {
    type Error = WcpsError;

    fn try_from(def: &CoverageMetadataDef) -> WcpsResult<Self> {
        CoverageMetadata::from_def(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def() -> CoverageMetadataDef {
        CoverageMetadataDef {
            coverage_name: "rgb".to_string(),
            coverage_type: "RectifiedGridCoverage".to_string(),
            domain: vec![
                DomainElementDef {
                    name: "x".to_string(),
                    axis_type: "x".to_string(),
                    num_lo: Some(0.0),
                    num_hi: Some(100.0),
                    crs_set: vec!["EPSG:4326".to_string()],
                    ..Default::default()
                },
                DomainElementDef {
                    name: "y".to_string(),
                    axis_type: "y".to_string(),
                    num_lo: Some(0.0),
                    num_hi: Some(50.0),
                    crs_set: vec!["EPSG:4326".to_string()],
                    ..Default::default()
                },
            ],
            cell_domain: vec![
                CellDomainDef {
                    lo: Some(0),
                    hi: Some(19),
                },
                CellDomainDef {
                    lo: Some(0),
                    hi: Some(9),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_resolution_from_cell_count() {
        let cov = CoverageMetadata::from_def(&def()).unwrap();
        assert_eq!(cov.domains[0].resolution().to_string(), "5");
        assert_eq!(cov.domains[1].resolution().to_string(), "5");
        assert_eq!(cov.external_crs_list(), vec!["EPSG:4326".to_string()]);
        assert!(cov.has_single_crs());
    }

    #[test]
    fn test_mismatched_axes() {
        let mut d = def();
        d.cell_domain.pop();
        assert!(matches!(
            CoverageMetadata::from_def(&d),
            Err(WcpsError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn test_rotated_grid_detected() {
        let mut d = def();
        d.offset_vectors = Some(vec![vec![5.0, 0.5], vec![0.0, 5.0]]);
        let cov = CoverageMetadata::from_def(&d).unwrap();
        assert!(matches!(
            cov.check_axis_aligned(),
            Err(WcpsError::UnsupportedCoverageConfiguration(_))
        ));
    }
}
