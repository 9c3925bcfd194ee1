//! Axis type enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a coverage axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    /// Easting / longitude
    X,
    /// Northing / latitude
    Y,
    /// Time
    T,
    /// Any other axis (elevation, band index, ...)
    Other,
}

impl AxisType {
    /// All axis types, in canonical order.
    pub const ALL: [AxisType; 4] = [AxisType::X, AxisType::Y, AxisType::T, AxisType::Other];

    /// Parse the metadata label of an axis type (`x`, `y`, `t`, `other`).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "x" => Some(AxisType::X),
            "y" => Some(AxisType::Y),
            "t" | "time" => Some(AxisType::T),
            "other" => Some(AxisType::Other),
            _ => None,
        }
    }

    /// Metadata label of this axis type.
    pub fn label(&self) -> &'static str {
        match self {
            AxisType::X => "x",
            AxisType::Y => "y",
            AxisType::T => "t",
            AxisType::Other => "other",
        }
    }

    /// Spatial axes must carry numeric bounds.
    pub fn is_spatial(&self) -> bool {
        matches!(self, AxisType::X | AxisType::Y)
    }
}

impl fmt::Display for AxisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis_type() {
        assert_eq!(AxisType::from_label("x"), Some(AxisType::X));
        assert_eq!(AxisType::from_label("Y"), Some(AxisType::Y));
        assert_eq!(AxisType::from_label("time"), Some(AxisType::T));
        assert_eq!(AxisType::from_label("lat"), None);
        assert!(AxisType::X.is_spatial());
        assert!(!AxisType::T.is_spatial());
    }
}
