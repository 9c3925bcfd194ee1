//! Configuration for the WCPS compiler.

use serde::{Deserialize, Serialize};

/// Configuration for the WCPS compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Maximum nesting depth of an expression tree.
    pub max_expression_depth: usize,

    /// Encoding used when an `encode` element names no format.
    pub default_format: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_expression_depth: 256,
            default_format: "csv".to_string(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("WCPS_MAX_EXPRESSION_DEPTH") {
            if let Ok(depth) = val.parse() {
                config.max_expression_depth = depth;
            }
        }

        if let Ok(val) = std::env::var("WCPS_DEFAULT_FORMAT") {
            if !val.trim().is_empty() {
                config.default_format = val.trim().to_lowercase();
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_expression_depth == 0 {
            return Err("max_expression_depth must be > 0".to_string());
        }

        if self.default_format.is_empty() {
            return Err("default_format must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CompilerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_format, "csv");
    }

    #[test]
    fn test_zero_depth_rejected() {
        let config = CompilerConfig {
            max_expression_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
