//! Client subsets (trim / slice) applied to a single coverage axis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Open bound marker accepted in trim intervals.
pub const OPEN_BOUND: &str = "*";

/// A subset of one axis, identified by the axis name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DimensionSubset {
    /// Narrow the axis to `[low, high]`.
    Trim {
        dimension: String,
        #[serde(default)]
        crs: Option<String>,
        low: String,
        high: String,
    },
    /// Collapse the axis to a single coordinate.
    Slice {
        dimension: String,
        #[serde(default)]
        crs: Option<String>,
        point: String,
    },
}

impl DimensionSubset {
    pub fn trim(dimension: impl Into<String>, low: impl Into<String>, high: impl Into<String>) -> Self {
        DimensionSubset::Trim {
            dimension: dimension.into(),
            crs: None,
            low: low.into(),
            high: high.into(),
        }
    }

    pub fn slice(dimension: impl Into<String>, point: impl Into<String>) -> Self {
        DimensionSubset::Slice {
            dimension: dimension.into(),
            crs: None,
            point: point.into(),
        }
    }

    /// Same subset, expressed in `crs`.
    pub fn with_crs(mut self, new_crs: impl Into<String>) -> Self {
        match &mut self {
            DimensionSubset::Trim { crs, .. } | DimensionSubset::Slice { crs, .. } => {
                *crs = Some(new_crs.into())
            }
        }
        self
    }

    /// Name of the subsetted axis.
    pub fn dimension(&self) -> &str {
        match self {
            DimensionSubset::Trim { dimension, .. } | DimensionSubset::Slice { dimension, .. } => {
                dimension
            }
        }
    }

    pub fn crs(&self) -> Option<&str> {
        match self {
            DimensionSubset::Trim { crs, .. } | DimensionSubset::Slice { crs, .. } => crs.as_deref(),
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, DimensionSubset::Slice { .. })
    }

    /// Lower and upper bound strings; a slice has the same point twice.
    pub fn bounds(&self) -> (&str, &str) {
        match self {
            DimensionSubset::Trim { low, high, .. } => (low, high),
            DimensionSubset::Slice { point, .. } => (point, point),
        }
    }
}

impl fmt::Display for DimensionSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionSubset::Trim {
                dimension,
                low,
                high,
                ..
            } => write!(f, "{}({},{})", dimension, low, high),
            DimensionSubset::Slice {
                dimension, point, ..
            } => write!(f, "{}({})", dimension, point),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SubsetParseError {
    #[error("Invalid subset format: {0}. Expected 'axis(low,high)' or 'axis(point)'")]
    InvalidFormat(String),
}

impl FromStr for DimensionSubset {
    type Err = SubsetParseError;

    /// Parse the KVP form `axis(low,high)`, `axis,crs(low,high)` or `axis(point)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let open = s
            .find('(')
            .ok_or_else(|| SubsetParseError::InvalidFormat(s.to_string()))?;
        if !s.ends_with(')') || open == 0 {
            return Err(SubsetParseError::InvalidFormat(s.to_string()));
        }

        let head = &s[..open];
        let (dimension, crs) = match head.split_once(',') {
            Some((dim, crs)) => (dim.trim(), Some(crs.trim().to_string())),
            None => (head.trim(), None),
        };
        let body: Vec<&str> = s[open + 1..s.len() - 1].split(',').map(str::trim).collect();

        let subset = match body.as_slice() {
            [point] if !point.is_empty() => DimensionSubset::Slice {
                dimension: dimension.to_string(),
                crs,
                point: point.to_string(),
            },
            [low, high] if !low.is_empty() && !high.is_empty() => DimensionSubset::Trim {
                dimension: dimension.to_string(),
                crs,
                low: low.to_string(),
                high: high.to_string(),
            },
            _ => return Err(SubsetParseError::InvalidFormat(s.to_string())),
        };
        Ok(subset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trim_and_slice() {
        let trim: DimensionSubset = "x(0,10)".parse().unwrap();
        assert_eq!(trim, DimensionSubset::trim("x", "0", "10"));

        let slice: DimensionSubset = "t(\"2010-01-01\")".parse().unwrap();
        assert!(slice.is_slice());
        assert_eq!(slice.bounds(), ("\"2010-01-01\"", "\"2010-01-01\""));

        let with_crs: DimensionSubset = "Lat,CRS:1(2,5)".parse().unwrap();
        assert_eq!(with_crs.crs(), Some("CRS:1"));
        assert_eq!(with_crs.dimension(), "Lat");
    }

    #[test]
    fn test_parse_invalid() {
        assert!("x".parse::<DimensionSubset>().is_err());
        assert!("x(1,2,3)".parse::<DimensionSubset>().is_err());
        assert!("(1,2)".parse::<DimensionSubset>().is_err());
    }
}
