//! Continuous (CRS-space) extent of a coverage axis.
//!
//! A [`DomainElement`] is an immutable value built once per axis from coverage
//! metadata. The only state change after construction is the resolution,
//! which is set once the grid size of the axis is known.

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::axis::AxisType;
use crate::cell_domain::CellDomainElement;
use crate::crs::{is_grid_crs, normalize_crs_set};
use crate::error::{WcpsError, WcpsResult};
use crate::subset::{DimensionSubset, OPEN_BOUND};

/// Raw axis description as read from a metadata store or catalog file.
///
/// Nothing here is validated; [`DomainElement::new`] does that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainElementDef {
    pub name: String,
    #[serde(rename = "type")]
    pub axis_type: String,
    #[serde(default)]
    pub num_lo: Option<f64>,
    #[serde(default)]
    pub num_hi: Option<f64>,
    #[serde(default)]
    pub str_lo: Option<String>,
    #[serde(default)]
    pub str_hi: Option<String>,
    #[serde(default)]
    pub crs_set: Vec<String>,
    #[serde(default)]
    pub uom: Option<String>,
}

/// Numeric lower/upper bound pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericBounds {
    pub lo: f64,
    pub hi: f64,
}

/// Textual lower/upper bound pair (irregular or time axes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextualBounds {
    pub lo: String,
    pub hi: String,
}

/// An axis in CRS coordinates.
#[derive(Debug, Clone)]
pub struct DomainElement {
    name: String,
    axis_type: AxisType,
    numeric: Option<NumericBounds>,
    textual: Option<TextualBounds>,
    crs_set: Vec<String>,
    uom: Option<String>,
    resolution: BigDecimal,
}

impl DomainElement {
    /// Validate `def` and build a domain element.
    ///
    /// The caller's CRS list is never modified: the element owns a new,
    /// normalized list that always contains the grid CRS.
    pub fn new(def: &DomainElementDef, allowed: &[AxisType]) -> WcpsResult<Self> {
        let name = def.name.trim();
        if name.is_empty() {
            return Err(WcpsError::invalid_metadata(
                "<unnamed axis>",
                "domain element name may not be empty",
            ));
        }

        let type_label = def.axis_type.trim();
        if type_label.is_empty() {
            return Err(WcpsError::invalid_metadata(
                name,
                "domain element type may not be empty",
            ));
        }

        let axis_type = AxisType::from_label(type_label)
            .filter(|t| allowed.contains(t))
            .ok_or_else(|| {
                let allowed: Vec<&str> = allowed.iter().map(|t| t.label()).collect();
                WcpsError::invalid_metadata(
                    name,
                    format!(
                        "axis type '{}' is not one of [{}]",
                        type_label,
                        allowed.join(", ")
                    ),
                )
            })?;

        let (numeric, textual) = Self::bounds(name, axis_type, def)?;

        if let Some(b) = numeric {
            if !b.lo.is_finite() || !b.hi.is_finite() {
                return Err(WcpsError::invalid_metadata(
                    name,
                    "numeric bounds must be finite",
                ));
            }
            if b.lo > b.hi {
                return Err(WcpsError::invalid_metadata(
                    name,
                    format!("lower bound {} is larger than upper bound {}", b.lo, b.hi),
                ));
            }
        }

        if axis_type.is_spatial() && numeric.is_none() {
            return Err(WcpsError::invalid_metadata(
                name,
                "spatial axes must have numeric bounds",
            ));
        }
        if axis_type == AxisType::T && numeric.is_none() {
            return Err(WcpsError::invalid_metadata(
                name,
                "time axes must have numeric bounds",
            ));
        }

        if let Some(ref t) = textual {
            Self::check_time_order(name, t)?;
        }

        let element = Self {
            name: name.to_string(),
            axis_type,
            numeric,
            textual,
            crs_set: normalize_crs_set(&def.crs_set),
            uom: def.uom.clone().filter(|u| !u.is_empty()),
            resolution: BigDecimal::from(1),
        };
        trace!(element = %element, "built domain element");
        Ok(element)
    }

    /// Resolve which bound pairs the definition carries.
    ///
    /// Exactly one complete pair is allowed, except on time axes which may
    /// carry both.
    fn bounds(
        name: &str,
        axis_type: AxisType,
        def: &DomainElementDef,
    ) -> WcpsResult<(Option<NumericBounds>, Option<TextualBounds>)> {
        let numeric = match (def.num_lo, def.num_hi) {
            (Some(lo), Some(hi)) => Some(NumericBounds { lo, hi }),
            _ => None,
        };
        let textual = match (&def.str_lo, &def.str_hi) {
            (Some(lo), Some(hi)) => Some(TextualBounds {
                lo: lo.clone(),
                hi: hi.clone(),
            }),
            _ => None,
        };
        let any_numeric = def.num_lo.is_some() || def.num_hi.is_some();
        let any_textual = def.str_lo.is_some() || def.str_hi.is_some();

        if let Some(ref t) = textual {
            if t.lo.is_empty() || t.hi.is_empty() {
                return Err(WcpsError::invalid_metadata(
                    name,
                    "string bounds may not be empty",
                ));
            }
        }

        if numeric.is_some() && !any_textual {
            Ok((numeric, None))
        } else if textual.is_some() && !any_numeric {
            Ok((None, textual))
        } else if axis_type == AxisType::T {
            Ok((numeric, textual))
        } else {
            Err(WcpsError::invalid_metadata(
                name,
                format!(
                    "axis of type '{}' needs either a numeric or a string bound pair",
                    axis_type
                ),
            ))
        }
    }

    /// Textual bounds that both parse as timestamps must be ordered.
    fn check_time_order(name: &str, bounds: &TextualBounds) -> WcpsResult<()> {
        let lo = chrono::DateTime::parse_from_rfc3339(&bounds.lo);
        let hi = chrono::DateTime::parse_from_rfc3339(&bounds.hi);
        if let (Ok(lo), Ok(hi)) = (lo, hi) {
            if lo > hi {
                return Err(WcpsError::invalid_metadata(
                    name,
                    format!("time bound {} is after {}", bounds.lo, bounds.hi),
                ));
            }
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axis_type(&self) -> AxisType {
        self.axis_type
    }

    pub fn numeric_bounds(&self) -> Option<NumericBounds> {
        self.numeric
    }

    pub fn num_lo(&self) -> Option<f64> {
        self.numeric.map(|b| b.lo)
    }

    pub fn num_hi(&self) -> Option<f64> {
        self.numeric.map(|b| b.hi)
    }

    pub fn textual_bounds(&self) -> Option<&TextualBounds> {
        self.textual.as_ref()
    }

    pub fn str_lo(&self) -> Option<&str> {
        self.textual.as_ref().map(|b| b.lo.as_str())
    }

    pub fn str_hi(&self) -> Option<&str> {
        self.textual.as_ref().map(|b| b.hi.as_str())
    }

    /// All CRSs of this axis; always contains the grid CRS.
    pub fn crs_set(&self) -> &[String] {
        &self.crs_set
    }

    /// The first CRS that is not the grid CRS, if any.
    pub fn external_crs(&self) -> Option<&str> {
        self.crs_set
            .iter()
            .map(String::as_str)
            .find(|crs| !is_grid_crs(crs))
    }

    pub fn uom(&self) -> Option<&str> {
        self.uom.as_deref()
    }

    /// Size of one grid cell along this axis, in CRS units.
    pub fn resolution(&self) -> &BigDecimal {
        &self.resolution
    }

    /// The resolution as a float, for coordinate conversion.
    pub fn resolution_f64(&self) -> f64 {
        self.resolution.to_f64().unwrap_or(1.0)
    }

    /// Derive the resolution from the number of grid cells along this axis.
    ///
    /// Uses exact decimal arithmetic at the scale of the extent, rounding up,
    /// so `resolution * grid_dimension >= hi - lo` always holds.
    pub fn set_resolution(&mut self, grid_dimension: u64) -> WcpsResult<()> {
        if grid_dimension == 0 {
            return Err(WcpsError::invalid_metadata(
                &self.name,
                "grid dimension must be positive",
            ));
        }
        let bounds = self.numeric.ok_or_else(|| {
            WcpsError::invalid_metadata(&self.name, "resolution requires numeric bounds")
        })?;

        let extent = exact_decimal(bounds.hi)? - exact_decimal(bounds.lo)?;
        let (digits, scale) = extent.as_bigint_and_exponent();
        let divisor = BigInt::from(grid_dimension);

        let mut quotient = &digits / &divisor;
        if !(&digits % &divisor).is_zero() {
            quotient += BigInt::from(1u8);
        }
        self.resolution = BigDecimal::new(quotient, scale);
        Ok(())
    }

    /// Copy of this element with a replaced CRS set.
    pub fn with_crs_set<I, S>(&self, crs_set: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            crs_set: normalize_crs_set(crs_set),
            ..self.clone()
        }
    }

    /// Convert a CRS coordinate on this axis into a pixel index of `cell`.
    pub fn to_cell_index(&self, value: f64, cell: &CellDomainElement) -> WcpsResult<BigInt> {
        let bounds = self.numeric.ok_or_else(|| {
            WcpsError::invalid_metadata(&self.name, "axis has no numeric bounds")
        })?;
        if value < bounds.lo || value > bounds.hi {
            return Err(WcpsError::invalid_parameter(
                &self.name,
                format!(
                    "coordinate {} is outside the axis extent [{}, {}]",
                    value, bounds.lo, bounds.hi
                ),
            ));
        }
        let resolution = self.resolution_f64();
        if resolution <= 0.0 {
            return Err(WcpsError::invalid_metadata(
                &self.name,
                "axis resolution must be positive",
            ));
        }
        let offset = ((value - bounds.lo) / resolution).floor() as i64;
        let index = cell.lo() + BigInt::from(offset);
        if &index > cell.hi() {
            Ok(cell.hi().clone())
        } else {
            Ok(index)
        }
    }

    /// Convert a pixel index of `cell` into the CRS coordinate of its lower edge.
    pub fn to_coordinate(&self, index: &BigInt, cell: &CellDomainElement) -> Option<f64> {
        let lo = self.num_lo()?;
        let offset = (index - cell.lo()).to_f64()?;
        Some(lo + offset * self.resolution_f64())
    }

    /// Pixel bounds selected by `subset` on this axis.
    ///
    /// Bounds without a CRS or in the grid CRS are pixel indices; bounds in
    /// the axis's external CRS are converted through the resolution. Open
    /// bounds (`*`) keep the current cell bound.
    pub fn resolve_subset(
        &self,
        subset: &DimensionSubset,
        cell: &CellDomainElement,
    ) -> WcpsResult<(BigInt, BigInt)> {
        self.resolve_subset_on(subset, cell, cell)
    }

    /// Like [`resolve_subset`](Self::resolve_subset) for an axis already
    /// narrowed to `current`: CRS coordinates are converted against the
    /// `native` extent, whose origin matches the CRS bounds of this element.
    pub fn resolve_subset_on(
        &self,
        subset: &DimensionSubset,
        native: &CellDomainElement,
        current: &CellDomainElement,
    ) -> WcpsResult<(BigInt, BigInt)> {
        let (low, high) = subset.bounds();
        let in_grid = subset.crs().map_or(true, is_grid_crs);
        if in_grid {
            let lo = pixel_bound(&self.name, low, current.lo())?;
            let hi = pixel_bound(&self.name, high, current.hi())?;
            return Ok((lo, hi));
        }

        let crs = subset.crs().unwrap_or_default();
        if !self.crs_set.iter().any(|c| c == crs) {
            return Err(WcpsError::Unimplemented {
                feature: format!("subsetting axis '{}' in CRS '{}'", self.name, crs),
            });
        }
        let lo = if low == OPEN_BOUND {
            current.lo().clone()
        } else {
            self.to_cell_index(coordinate(&self.name, low)?, native)?
        };
        let hi = if high == OPEN_BOUND {
            current.hi().clone()
        } else {
            self.to_cell_index(coordinate(&self.name, high)?, native)?
        };
        Ok((lo, hi))
    }
}

fn pixel_bound(axis: &str, text: &str, current: &BigInt) -> WcpsResult<BigInt> {
    if text.trim() == OPEN_BOUND {
        return Ok(current.clone());
    }
    BigInt::from_str(text.trim()).map_err(|_| {
        WcpsError::invalid_parameter(axis, format!("'{}' is not a pixel index", text))
    })
}

fn coordinate(axis: &str, text: &str) -> WcpsResult<f64> {
    text.trim().parse::<f64>().map_err(|_| {
        WcpsError::invalid_parameter(axis, format!("'{}' is not a numeric coordinate", text))
    })
}

/// Decimal value of a float, through its shortest round-tripping text.
fn exact_decimal(value: f64) -> WcpsResult<BigDecimal> {
    BigDecimal::from_str(&value.to_string())
        .map_err(|e| WcpsError::Internal(format!("cannot represent {} exactly: {}", value, e)))
}

impl TryFrom<&DomainElementDef> for DomainElement {
    type Error = WcpsError;

    fn try_from(def: &DomainElementDef) -> WcpsResult<Self> {
        DomainElement::new(def, &AxisType::ALL)
    }
}

impl PartialEq for DomainElement {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name || self.axis_type != other.axis_type {
            return false;
        }
        let numeric_equal = match (self.numeric, other.numeric) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        let textual_equal = match (&self.textual, &other.textual) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        numeric_equal || textual_equal
    }
}

impl fmt::Display for DomainElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainElement {{ name: '{}', type: '{}'", self.name, self.axis_type)?;
        if let Some(b) = self.numeric {
            write!(f, ", numLo: '{}', numHi: '{}'", b.lo, b.hi)?;
        }
        if let Some(ref b) = self.textual {
            write!(f, ", strLo: '{}', strHi: '{}'", b.lo, b.hi)?;
        }
        write!(f, ", crsSet: {:?} }}", self.crs_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spatial(name: &str, axis_type: &str, lo: f64, hi: f64) -> DomainElementDef {
        DomainElementDef {
            name: name.to_string(),
            axis_type: axis_type.to_string(),
            num_lo: Some(lo),
            num_hi: Some(hi),
            ..Default::default()
        }
    }

    #[test]
    fn test_resolution_rounds_up() {
        let mut x = DomainElement::try_from(&spatial("x", "x", 0.0, 10.0)).unwrap();
        x.set_resolution(3).unwrap();
        assert_eq!(x.resolution(), &BigDecimal::from(4));

        x.set_resolution(2).unwrap();
        assert_eq!(x.resolution(), &BigDecimal::from(5));
    }

    #[test]
    fn test_resolution_keeps_decimal_scale() {
        let mut x = DomainElement::try_from(&spatial("x", "x", 0.0, 0.5)).unwrap();
        x.set_resolution(3).unwrap();
        assert_eq!(x.resolution().to_string(), "0.2");
    }

    #[test]
    fn test_resolution_zero_dimension() {
        let mut x = DomainElement::try_from(&spatial("x", "x", 0.0, 10.0)).unwrap();
        assert!(matches!(
            x.set_resolution(0),
            Err(WcpsError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn test_equality_compares_other_instance() {
        let a = DomainElement::try_from(&spatial("x", "x", 0.0, 10.0)).unwrap();
        let b = DomainElement::try_from(&spatial("x", "x", 0.0, 20.0)).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_cell_index_conversion() {
        let mut x = DomainElement::try_from(&spatial("x", "x", 0.0, 100.0)).unwrap();
        x.set_resolution(20).unwrap();
        let cell = CellDomainElement::new(BigInt::from(0), BigInt::from(19)).unwrap();

        assert_eq!(x.to_cell_index(0.0, &cell).unwrap(), BigInt::from(0));
        assert_eq!(x.to_cell_index(12.0, &cell).unwrap(), BigInt::from(2));
        assert_eq!(x.to_cell_index(100.0, &cell).unwrap(), BigInt::from(19));
        assert!(x.to_cell_index(101.0, &cell).is_err());
        assert_eq!(x.to_coordinate(&BigInt::from(2), &cell), Some(10.0));
    }

    #[test]
    fn test_resolve_subset_by_crs() {
        let def = DomainElementDef {
            crs_set: vec!["http://www.opengis.net/def/crs/EPSG/0/4326".to_string()],
            ..spatial("x", "x", 0.0, 100.0)
        };
        let mut x = DomainElement::try_from(&def).unwrap();
        x.set_resolution(20).unwrap();
        let cell = CellDomainElement::new(BigInt::from(0), BigInt::from(19)).unwrap();

        let pixel = DimensionSubset::trim("x", "2", "*");
        assert_eq!(
            x.resolve_subset(&pixel, &cell).unwrap(),
            (BigInt::from(2), BigInt::from(19))
        );

        let geo = DimensionSubset::trim("x", "10", "50")
            .with_crs("http://www.opengis.net/def/crs/EPSG/0/4326");
        assert_eq!(
            x.resolve_subset(&geo, &cell).unwrap(),
            (BigInt::from(2), BigInt::from(10))
        );

        let other = DimensionSubset::slice("x", "10").with_crs("http://www.opengis.net/def/crs/EPSG/0/3857");
        assert!(x.resolve_subset(&other, &cell).unwrap_err().is_unimplemented());
    }

    #[test]
    fn test_resolve_subset_on_narrowed_axis() {
        let def = DomainElementDef {
            crs_set: vec!["http://www.opengis.net/def/crs/EPSG/0/4326".to_string()],
            ..spatial("x", "x", 0.0, 100.0)
        };
        let mut x = DomainElement::try_from(&def).unwrap();
        x.set_resolution(20).unwrap();
        let native = CellDomainElement::new(BigInt::from(0), BigInt::from(19)).unwrap();
        let current = CellDomainElement::new(BigInt::from(10), BigInt::from(19)).unwrap();

        let geo = DimensionSubset::trim("x", "50", "60")
            .with_crs("http://www.opengis.net/def/crs/EPSG/0/4326");
        assert_eq!(
            x.resolve_subset_on(&geo, &native, &current).unwrap(),
            (BigInt::from(10), BigInt::from(12))
        );

        let open = DimensionSubset::trim("x", "*", "12");
        assert_eq!(
            x.resolve_subset_on(&open, &native, &current).unwrap(),
            (BigInt::from(10), BigInt::from(12))
        );
    }
}
