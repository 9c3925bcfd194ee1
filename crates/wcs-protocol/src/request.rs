//! WCS 2.0 GetCoverage request parameters.

use serde::Deserialize;

use wcps_common::{DimensionSubset, WcpsError, WcpsResult};

/// MIME type of GML coverage responses.
pub const MIME_GML: &str = "application/gml+xml";

/// MIME type of plain XML documents (capabilities, exception reports).
pub const MIME_XML: &str = "application/xml";

/// WCS request types.
#[derive(Debug, Clone)]
pub enum WcsRequest {
    GetCapabilities { version: Option<String> },
    GetCoverage(GetCoverageRequest),
}

/// A parsed GetCoverage request.
#[derive(Debug, Clone, PartialEq)]
pub struct GetCoverageRequest {
    /// Requested coverage identifier
    pub coverage_id: String,

    /// Output format; GML when absent
    pub format: Option<String>,

    /// Client trims and slices, at most one per axis
    pub subsets: Vec<DimensionSubset>,

    /// Multipart (GML + encoded file) response requested
    pub multipart: bool,
}

impl GetCoverageRequest {
    pub fn new(coverage_id: impl Into<String>) -> Self {
        Self {
            coverage_id: coverage_id.into(),
            format: None,
            subsets: Vec::new(),
            multipart: false,
        }
    }

    pub fn with_subset(mut self, subset: DimensionSubset) -> Self {
        self.subsets.push(subset);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// The subset applied to `axis`, if any.
    pub fn subset_for(&self, axis: &str) -> Option<&DimensionSubset> {
        self.subsets.iter().find(|s| s.dimension() == axis)
    }

    /// True when the response is plain GML.
    pub fn wants_gml(&self) -> bool {
        !self.multipart && self.format.as_deref().map_or(true, |f| f == MIME_GML)
    }
}

/// KVP (Key-Value Pair) parameters of a WCS request.
///
/// Repeated `SUBSET` keys are collected by the caller into `subset`.
#[derive(Debug, Default, Deserialize)]
pub struct WcsKvpParams {
    #[serde(rename = "SERVICE")]
    pub service: Option<String>,

    #[serde(rename = "REQUEST")]
    pub request: Option<String>,

    #[serde(rename = "VERSION")]
    pub version: Option<String>,

    #[serde(rename = "COVERAGEID")]
    pub coverage_id: Option<String>,

    #[serde(rename = "FORMAT")]
    pub format: Option<String>,

    #[serde(rename = "MEDIATYPE")]
    pub media_type: Option<String>,

    #[serde(rename = "SUBSET", default)]
    pub subset: Vec<String>,
}

impl WcsKvpParams {
    /// Parse into a typed request.
    pub fn into_request(self) -> WcpsResult<WcsRequest> {
        if !self
            .service
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("WCS"))
        {
            return Err(WcpsError::invalid_parameter("SERVICE", "SERVICE must be WCS"));
        }

        match self.request.as_deref() {
            Some("GetCapabilities") => Ok(WcsRequest::GetCapabilities {
                version: self.version,
            }),
            Some("GetCoverage") => {
                let coverage_id = self
                    .coverage_id
                    .filter(|id| !id.trim().is_empty())
                    .ok_or_else(|| WcpsError::invalid_parameter("COVERAGEID", "missing"))?;

                let mut subsets: Vec<DimensionSubset> = Vec::with_capacity(self.subset.len());
                for raw in &self.subset {
                    let subset: DimensionSubset = raw
                        .parse()
                        .map_err(|e| WcpsError::invalid_parameter("SUBSET", format!("{}", e)))?;
                    if subsets.iter().any(|s| s.dimension() == subset.dimension()) {
                        return Err(WcpsError::InvalidAxis {
                            axis: subset.dimension().to_string(),
                            message: "axis subsetted more than once".to_string(),
                        });
                    }
                    subsets.push(subset);
                }

                let multipart = self
                    .media_type
                    .as_deref()
                    .is_some_and(|m| m.eq_ignore_ascii_case("multipart/related"));

                Ok(WcsRequest::GetCoverage(GetCoverageRequest {
                    coverage_id: coverage_id.trim().to_string(),
                    format: self.format,
                    subsets,
                    multipart,
                }))
            }
            Some(other) => Err(WcpsError::invalid_parameter(
                "REQUEST",
                format!("Unknown request: {}", other),
            )),
            None => Err(WcpsError::invalid_parameter("REQUEST", "missing")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(request: &str) -> WcsKvpParams {
        WcsKvpParams {
            service: Some("WCS".to_string()),
            request: Some(request.to_string()),
            version: Some("2.0.1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_get_coverage_with_subsets() {
        let mut kvp = params("GetCoverage");
        kvp.coverage_id = Some("mean_summer_airtemp".to_string());
        kvp.subset = vec!["x(0,10)".to_string(), "y(5)".to_string()];

        let WcsRequest::GetCoverage(req) = kvp.into_request().unwrap() else {
            panic!("expected GetCoverage");
        };
        assert_eq!(req.coverage_id, "mean_summer_airtemp");
        assert_eq!(req.subsets.len(), 2);
        assert!(req.subset_for("y").unwrap().is_slice());
        assert!(req.wants_gml());
    }

    #[test]
    fn test_duplicate_axis_subset_rejected() {
        let mut kvp = params("GetCoverage");
        kvp.coverage_id = Some("rgb".to_string());
        kvp.subset = vec!["x(0,10)".to_string(), "x(5)".to_string()];
        assert!(matches!(
            kvp.into_request(),
            Err(WcpsError::InvalidAxis { .. })
        ));
    }

    #[test]
    fn test_missing_coverage_id() {
        let err = params("GetCoverage").into_request().unwrap_err();
        assert_eq!(err.locator(), Some("COVERAGEID"));
    }

    #[test]
    fn test_wrong_service() {
        let mut kvp = params("GetCapabilities");
        kvp.service = Some("WMS".to_string());
        assert!(kvp.into_request().is_err());
    }

    #[test]
    fn test_multipart_not_plain_gml() {
        let req = GetCoverageRequest {
            multipart: true,
            ..GetCoverageRequest::new("rgb")
        };
        assert!(!req.wants_gml());
        assert!(!GetCoverageRequest::new("rgb").with_format("image/png").wants_gml());
    }
}
