//! Configuration for WCS response assembly.

use serde::{Deserialize, Serialize};

/// Configuration for WCS response assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    /// Metadata schema holding multipoint coverage data.
    pub multipoint_schema: String,

    /// Prefix turning a base type name into a datatype URN.
    pub datatype_urn_prefix: String,

    /// Public URL of the service, used in capabilities documents.
    pub service_url: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            multipoint_schema: "ps_multipoint".to_string(),
            datatype_urn_prefix: "urn:ogc:def:dataType:OGC:1.1:".to_string(),
            service_url: "http://localhost:8080/wcs".to_string(),
        }
    }
}

impl ResponseConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("WCS_MULTIPOINT_SCHEMA") {
            config.multipoint_schema = val;
        }

        if let Ok(val) = std::env::var("WCS_DATATYPE_URN_PREFIX") {
            config.datatype_urn_prefix = val;
        }

        if let Ok(val) = std::env::var("WCS_SERVICE_URL") {
            config.service_url = val.trim_end_matches('/').to_string();
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.multipoint_schema.trim().is_empty() {
            return Err("multipoint_schema must not be empty".to_string());
        }

        if !self.service_url.starts_with("http://") && !self.service_url.starts_with("https://") {
            return Err(format!(
                "service_url must be an http(s) URL, got '{}'",
                self.service_url
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ResponseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.multipoint_schema, "ps_multipoint");
    }

    #[test]
    fn test_invalid_service_url() {
        let config = ResponseConfig {
            service_url: "localhost".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
