//! Error types for the WCPS compiler and WCS response assembly.

use thiserror::Error;

/// Result type alias using WcpsError.
pub type WcpsResult<T> = Result<T, WcpsError>;

/// Primary error type for WCPS compilation and coverage responses.
#[derive(Debug, Error)]
pub enum WcpsError {
    // === Metadata Errors ===
    #[error("Invalid metadata for '{locator}': {message}")]
    InvalidMetadata { locator: String, message: String },

    #[error("Unsupported coverage configuration: {0}")]
    UnsupportedCoverageConfiguration(String),

    #[error("Metadata for coverage '{coverage_id}' is not valid")]
    NoApplicableCode { coverage_id: String },

    // === Grammar Errors ===
    #[error("Invalid coverage expression, next node: {node}")]
    UnrecognizedConstruct { node: String },

    #[error("Method not implemented: {feature}")]
    Unimplemented { feature: String },

    #[error("Unexpected node: {node}")]
    UnexpectedNode { node: String },

    #[error("Switch expression is missing its default case")]
    MissingSwitchDefault,

    #[error("Incompatible coverages: {0}")]
    IncompatibleCoverages(String),

    #[error("Unknown axis '{axis}': {message}")]
    InvalidAxis { axis: String, message: String },

    #[error("Iterator '{0}' not defined")]
    UndefinedIterator(String),

    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Response Errors ===
    #[error("Template error: {0}")]
    Template(String),

    #[error("Query execution failed: {0}")]
    QueryExecution(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WcpsError {
    /// Shorthand for an `InvalidMetadata` error located at `locator`.
    pub fn invalid_metadata(locator: impl Into<String>, message: impl Into<String>) -> Self {
        WcpsError::InvalidMetadata {
            locator: locator.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        WcpsError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Get the OGC exception code for this error.
    pub fn exception_code(&self) -> &'static str {
        match self {
            WcpsError::InvalidMetadata { .. } => "InvalidMetadata",
            WcpsError::UnsupportedCoverageConfiguration(_) => "UnsupportedCoverageConfiguration",
            WcpsError::NoApplicableCode { .. } => "NoApplicableCode",
            WcpsError::UnrecognizedConstruct { .. }
            | WcpsError::UnexpectedNode { .. }
            | WcpsError::MissingSwitchDefault
            | WcpsError::InvalidXml(_) => "XmlNotValid",
            WcpsError::Unimplemented { .. } => "OperationNotSupported",
            WcpsError::InvalidAxis { .. } => "InvalidAxisLabel",
            WcpsError::InvalidParameter { .. } | WcpsError::UndefinedIterator(_) => {
                "InvalidParameterValue"
            }
            WcpsError::IncompatibleCoverages(_) => "InvalidRequest",
            WcpsError::Template(_) | WcpsError::QueryExecution(_) | WcpsError::Internal(_) => {
                "NoApplicableCode"
            }
        }
    }

    /// The element the error refers to: axis name, coverage id or node tag.
    pub fn locator(&self) -> Option<&str> {
        match self {
            WcpsError::InvalidMetadata { locator, .. } => Some(locator),
            WcpsError::NoApplicableCode { coverage_id } => Some(coverage_id),
            WcpsError::UnrecognizedConstruct { node } | WcpsError::UnexpectedNode { node } => {
                Some(node)
            }
            WcpsError::Unimplemented { feature } => Some(feature),
            WcpsError::InvalidAxis { axis, .. } => Some(axis),
            WcpsError::UndefinedIterator(name) => Some(name),
            WcpsError::InvalidParameter { param, .. } => Some(param),
            _ => None,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WcpsError::UnrecognizedConstruct { .. }
            | WcpsError::UnexpectedNode { .. }
            | WcpsError::MissingSwitchDefault
            | WcpsError::IncompatibleCoverages(_)
            | WcpsError::InvalidAxis { .. }
            | WcpsError::UndefinedIterator(_)
            | WcpsError::InvalidXml(_)
            | WcpsError::InvalidParameter { .. } => 400,

            WcpsError::NoApplicableCode { .. } => 404,

            WcpsError::Unimplemented { .. } => 501,

            _ => 500,
        }
    }

    /// True for the grammar failure that must never be swallowed by dispatch.
    pub fn is_unimplemented(&self) -> bool {
        matches!(self, WcpsError::Unimplemented { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_names_offending_element() {
        let err = WcpsError::invalid_metadata("x", "lower bound above upper bound");
        assert_eq!(err.locator(), Some("x"));
        assert_eq!(err.exception_code(), "InvalidMetadata");

        let err = WcpsError::NoApplicableCode {
            coverage_id: "rgb".to_string(),
        };
        assert_eq!(err.locator(), Some("rgb"));
        assert_eq!(err.http_status_code(), 404);
    }

    #[test]
    fn test_error_display() {
        let err = WcpsError::UnrecognizedConstruct {
            node: "foo".to_string(),
        };
        assert!(err.to_string().contains("foo"));

        let err = WcpsError::Unimplemented {
            feature: "crsTransform".to_string(),
        };
        assert!(err.is_unimplemented());
        assert_eq!(err.http_status_code(), 501);
    }
}
