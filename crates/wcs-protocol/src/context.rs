//! Per-request view of a coverage: metadata narrowed by the client subsets.

use num_bigint::BigInt;
use tracing::debug;

use wcps_common::crs::{compound_crs_uri, xml_escape_uri};
use wcps_common::{
    CellDomainElement, CoverageMetadata, CoverageType, DimensionSubset, DomainElement,
    MetadataSource, WcpsError, WcpsResult, GRID_CRS,
};

use crate::request::GetCoverageRequest;

/// Unit label used for axes without a unit of measure.
pub const DEFAULT_UOM: &str = "10^0";

/// Coverage metadata with the request's subsets applied.
///
/// Sliced axes stay in the cell domain list (collapsed to one cell) but are
/// left out of labels, bounds and offsets.
#[derive(Debug, Clone)]
pub struct ResponseContext {
    coverage: CoverageMetadata,
    native_cells: Vec<CellDomainElement>,
    requested_id: String,
}

impl ResponseContext {
    /// Read the requested coverage and apply every subset of the request.
    pub fn new(request: &GetCoverageRequest, source: &dyn MetadataSource) -> WcpsResult<Self> {
        let mut coverage = source.read(&request.coverage_id)?;
        coverage.check_axis_aligned()?;
        let native_cells = coverage.cell_domains.clone();

        for subset in &request.subsets {
            let idx = coverage
                .domain_index_by_name(subset.dimension())
                .ok_or_else(|| WcpsError::InvalidAxis {
                    axis: subset.dimension().to_string(),
                    message: format!("not an axis of coverage '{}'", coverage.coverage_name),
                })?;

            if coverage.coverage_type == CoverageType::MultiPointCoverage {
                coverage.cell_domains[idx].apply_subset(subset)?;
                continue;
            }

            let (lo, hi) = coverage.domains[idx].resolve_subset(subset, &native_cells[idx])?;
            check_within(subset, &lo, &hi, &native_cells[idx])?;
            coverage.cell_domains[idx].apply_resolved(subset, lo, hi);
        }

        debug!(
            coverage = %coverage.coverage_name,
            subsets = request.subsets.len(),
            sdom = %sdom_of(&coverage.cell_domains),
            "prepared response context"
        );

        Ok(Self {
            requested_id: request.coverage_id.clone(),
            coverage,
            native_cells,
        })
    }

    pub fn coverage(&self) -> &CoverageMetadata {
        &self.coverage
    }

    pub fn coverage_id(&self) -> &str {
        &self.coverage.coverage_name
    }

    /// Identifier as written by the client.
    pub fn requested_id(&self) -> &str {
        &self.requested_id
    }

    pub fn coverage_type(&self) -> &CoverageType {
        &self.coverage.coverage_type
    }

    /// Current pixel extents of all axes, sliced ones included.
    pub fn cell_domains(&self) -> &[CellDomainElement] {
        &self.coverage.cell_domains
    }

    fn is_sliced(&self, idx: usize) -> bool {
        self.coverage.cell_domains[idx]
            .subset()
            .is_some_and(DimensionSubset::is_slice)
    }

    /// Axes remaining in the response, with their current cell extent.
    pub fn retained_axes(&self) -> impl Iterator<Item = (&DomainElement, &CellDomainElement)> + '_ {
        (0..self.coverage.dimension())
            .filter(|i| !self.is_sliced(*i))
            .map(|i| (&self.coverage.domains[i], &self.coverage.cell_domains[i]))
    }

    pub fn grid_dimension(&self) -> usize {
        self.retained_axes().count()
    }

    pub fn axis_labels(&self) -> String {
        self.retained_axes()
            .map(|(dom, _)| dom.name())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn uom_labels(&self) -> String {
        self.retained_axes()
            .map(|(dom, _)| dom.uom().unwrap_or(DEFAULT_UOM))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lower grid corner, e.g. `0 0`.
    pub fn low(&self) -> String {
        self.retained_axes()
            .map(|(_, cell)| cell.lo().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Upper grid corner, e.g. `19 9`.
    pub fn high(&self) -> String {
        self.retained_axes()
            .map(|(_, cell)| cell.hi().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Lower corner in CRS coordinates.
    pub fn dom_low(&self) -> String {
        self.domain_corner(false)
    }

    /// Upper corner in CRS coordinates.
    pub fn dom_high(&self) -> String {
        self.domain_corner(true)
    }

    fn domain_corner(&self, upper: bool) -> String {
        let mut parts = Vec::new();
        for i in (0..self.coverage.dimension()).filter(|i| !self.is_sliced(*i)) {
            let dom = &self.coverage.domains[i];
            let cell = &self.coverage.cell_domains[i];
            let native = &self.native_cells[i];

            let value = match dom.numeric_bounds() {
                Some(bounds) if upper => dom
                    .to_coordinate(&(cell.hi() + BigInt::from(1u8)), native)
                    .map_or(bounds.hi, |v| v.min(bounds.hi))
                    .to_string(),
                Some(bounds) => dom
                    .to_coordinate(cell.lo(), native)
                    .map_or(bounds.lo, |v| v.max(bounds.lo))
                    .to_string(),
                None if upper => dom.str_hi().unwrap_or_default().to_string(),
                None => dom.str_lo().unwrap_or_default().to_string(),
            };
            parts.push(value);
        }
        parts.join(" ")
    }

    /// Compound CRS of the retained axes, escaped for XML attributes.
    pub fn srs_name(&self) -> String {
        let mut crss: Vec<&str> = Vec::new();
        for (dom, _) in self.retained_axes() {
            let crs = dom.external_crs().unwrap_or(GRID_CRS);
            if !crss.contains(&crs) {
                crss.push(crs);
            }
        }
        xml_escape_uri(&compound_crs_uri(&crss))
    }

    /// Current extent in array-engine notation, slices as single points.
    pub fn sdom(&self) -> String {
        sdom_of(&self.coverage.cell_domains)
    }
}

fn sdom_of(cells: &[CellDomainElement]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .map(|cell| match cell.subset() {
            Some(subset) if subset.is_slice() => cell.lo().to_string(),
            _ => format!("{}:{}", cell.lo(), cell.hi()),
        })
        .collect();
    format!("[{}]", parts.join(","))
}

fn check_within(
    subset: &DimensionSubset,
    lo: &BigInt,
    hi: &BigInt,
    native: &CellDomainElement,
) -> WcpsResult<()> {
    if lo > hi {
        return Err(WcpsError::invalid_parameter(
            subset.dimension(),
            format!("subset lower bound {} is above upper bound {}", lo, hi),
        ));
    }
    if lo < native.lo() || hi > native.hi() {
        return Err(WcpsError::invalid_parameter(
            subset.dimension(),
            format!("subset {} is outside the coverage extent {}", subset, native),
        ));
    }
    Ok(())
}
