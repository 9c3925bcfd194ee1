//! N-dimensional bounding box of a coverage in its external CRS.

use serde::{Deserialize, Serialize};

/// Bounding box with one lower/upper coordinate per axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// CRS the corners are expressed in (possibly a compound CRS URI)
    pub crs_name: String,
    pub lower_corner: Vec<f64>,
    pub upper_corner: Vec<f64>,
}

impl BoundingBox {
    /// Create a bounding box, checking that both corners have the same
    /// dimensionality and are ordered.
    pub fn new(
        crs_name: impl Into<String>,
        lower_corner: Vec<f64>,
        upper_corner: Vec<f64>,
    ) -> Result<Self, BboxParseError> {
        if lower_corner.len() != upper_corner.len() || lower_corner.is_empty() {
            return Err(BboxParseError::DimensionMismatch(
                lower_corner.len(),
                upper_corner.len(),
            ));
        }
        if let Some(i) = (0..lower_corner.len()).find(|&i| lower_corner[i] > upper_corner[i]) {
            return Err(BboxParseError::InvertedAxis(i));
        }
        Ok(Self {
            crs_name: crs_name.into(),
            lower_corner,
            upper_corner,
        })
    }

    /// Parse GML corner strings: "minx miny ..." / "maxx maxy ...".
    pub fn from_gml_corners(
        crs_name: impl Into<String>,
        lower: &str,
        upper: &str,
    ) -> Result<Self, BboxParseError> {
        Self::new(crs_name, parse_corner(lower)?, parse_corner(upper)?)
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.lower_corner.len()
    }

    /// Lower corner as a GML position string.
    pub fn lower_corner_string(&self) -> String {
        corner_string(&self.lower_corner)
    }

    /// Upper corner as a GML position string.
    pub fn upper_corner_string(&self) -> String {
        corner_string(&self.upper_corner)
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, point: &[f64]) -> bool {
        point.len() == self.dimension()
            && point
                .iter()
                .enumerate()
                .all(|(i, v)| *v >= self.lower_corner[i] && *v <= self.upper_corner[i])
    }
}

fn parse_corner(s: &str) -> Result<Vec<f64>, BboxParseError> {
    s.split_whitespace()
        .map(|part| {
            part.parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))
        })
        .collect()
}

fn corner_string(corner: &[f64]) -> String {
    corner
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BboxParseError {
    #[error("Corner dimensions differ: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    #[error("Lower corner is above upper corner on axis {0}")]
    InvertedAxis(usize),

    #[error("Invalid number in corner: {0}")]
    InvalidNumber(String),
}
