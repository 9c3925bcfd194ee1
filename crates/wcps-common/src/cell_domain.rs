//! Discrete (pixel-space) extent of a coverage axis.

use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::fmt;

use crate::error::{WcpsError, WcpsResult};
use crate::subset::{DimensionSubset, OPEN_BOUND};

/// A coverage axis in pixel coordinates.
///
/// Created from the native pixel extent and then narrowed in place by client
/// subsetting. The subset that produced the current bounds is kept for later
/// bound rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellDomainElement {
    lo: BigInt,
    hi: BigInt,
    subset: Option<DimensionSubset>,
}

impl CellDomainElement {
    pub fn new(lo: BigInt, hi: BigInt) -> WcpsResult<Self> {
        if lo > hi {
            return Err(WcpsError::invalid_metadata(
                format!("[{}:{}]", lo, hi),
                "invalid cell domain element: lower bound cannot be larger than upper bound",
            ));
        }
        Ok(Self {
            lo,
            hi,
            subset: None,
        })
    }

    /// Build from possibly absent bounds, as read from a metadata store.
    pub fn from_optional(lo: Option<BigInt>, hi: Option<BigInt>) -> WcpsResult<Self> {
        match (lo, hi) {
            (Some(lo), Some(hi)) => Self::new(lo, hi),
            _ => Err(WcpsError::invalid_metadata(
                "cell domain",
                "invalid cell domain element: bounds may not be null",
            )),
        }
    }

    pub fn lo(&self) -> &BigInt {
        &self.lo
    }

    pub fn hi(&self) -> &BigInt {
        &self.hi
    }

    /// Overwrite the lower bound; callers keep `lo <= hi`.
    pub fn set_lo(&mut self, lo: BigInt) {
        self.lo = lo;
    }

    /// Overwrite the upper bound; callers keep `lo <= hi`.
    pub fn set_hi(&mut self, hi: BigInt) {
        self.hi = hi;
    }

    /// The subset construct that produced the current bounds, if any.
    pub fn subset(&self) -> Option<&DimensionSubset> {
        self.subset.as_ref()
    }

    /// Number of cells along this axis.
    pub fn count(&self) -> u64 {
        (&self.hi - &self.lo + BigInt::from(1u8))
            .to_u64()
            .unwrap_or(u64::MAX)
    }

    /// Narrow to a trim or collapse to a slice given in pixel coordinates.
    ///
    /// Open trim bounds (`*`) keep the current bound.
    pub fn apply_subset(&mut self, subset: &DimensionSubset) -> WcpsResult<()> {
        let (low, high) = subset.bounds();
        let lo = parse_bound(subset.dimension(), low, &self.lo)?;
        let hi = parse_bound(subset.dimension(), high, &self.hi)?;
        if lo > hi {
            return Err(WcpsError::invalid_parameter(
                subset.dimension(),
                format!("subset lower bound {} is above upper bound {}", lo, hi),
            ));
        }
        self.set_lo(lo);
        self.set_hi(hi);
        self.subset = Some(subset.clone());
        Ok(())
    }

    /// Same as [`apply_subset`](Self::apply_subset) with already resolved bounds.
    pub fn apply_resolved(&mut self, subset: &DimensionSubset, lo: BigInt, hi: BigInt) {
        self.set_lo(lo);
        self.set_hi(hi);
        self.subset = Some(subset.clone());
    }
}

fn parse_bound(dimension: &str, value: &str, current: &BigInt) -> WcpsResult<BigInt> {
    let value = value.trim().trim_matches('"');
    if value == OPEN_BOUND {
        return Ok(current.clone());
    }
    value.parse::<BigInt>().map_err(|_| {
        WcpsError::invalid_parameter(
            dimension,
            format!("'{}' is not a valid pixel coordinate", value),
        )
    })
}

impl fmt::Display for CellDomainElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellDomainElement [{}, {}]", self.lo, self.hi)
    }
}
