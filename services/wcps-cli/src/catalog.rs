//! Coverage catalog files.
//!
//! A catalog is a YAML document listing coverage metadata definitions and,
//! for multipoint coverages, their points. `${VAR}` and `${VAR:-default}`
//! are expanded from the environment before parsing.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use wcps_common::{CoverageMetadataDef, InMemoryMetadataSource, PointRecord};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub coverages: Vec<CoverageMetadataDef>,

    /// Points of multipoint coverages, by coverage name
    #[serde(default)]
    pub points: BTreeMap<String, Vec<PointRecord>>,
}

impl Catalog {
    /// Validate every coverage and build an in-memory metadata source.
    pub fn into_source(self) -> Result<InMemoryMetadataSource> {
        let mut source = InMemoryMetadataSource::from_defs(&self.coverages)
            .context("Invalid coverage metadata in catalog")?;
        for (coverage, points) in self.points {
            if !self.coverages.iter().any(|c| c.coverage_name == coverage) {
                bail!("points given for unknown coverage '{}'", coverage);
            }
            source.insert_points(coverage, points);
        }
        Ok(source)
    }
}

/// Load and parse a catalog file with environment variable substitution.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read catalog from {:?}", path.as_ref()))?;

    let expanded = expand_env_vars(&content)?;

    let catalog: Catalog = serde_yaml::from_str(&expanded)
        .with_context(|| format!("Failed to parse catalog YAML from {:?}", path.as_ref()))?;

    info!(
        path = ?path.as_ref(),
        coverages = catalog.coverages.len(),
        "Loaded coverage catalog"
    );
    Ok(catalog)
}

/// Load a catalog file straight into a metadata source.
pub fn load_source<P: AsRef<Path>>(path: P) -> Result<InMemoryMetadataSource> {
    load_catalog(path)?.into_source()
}

fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            bail!("Unclosed variable substitution: ${{{}", after);
        };
        result.push_str(&resolve_var_expr(&after[..end])?);
        rest = &after[end + 1..];
    }
    result.push_str(rest);

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_with_default() {
        let out = expand_env_vars("crs: ${WCPS_CLI_TEST_UNSET_VAR:-EPSG:4326}").unwrap();
        assert_eq!(out, "crs: EPSG:4326");
    }

    #[test]
    fn test_expand_env_vars_missing_required() {
        assert!(expand_env_vars("${WCPS_CLI_TEST_REQUIRED_VAR}").is_err());
    }

    #[test]
    fn test_expand_env_vars_unclosed() {
        assert!(expand_env_vars("name: ${OOPS").is_err());
    }

    #[test]
    fn test_points_for_unknown_coverage() {
        let mut catalog = Catalog::default();
        catalog.points.insert("ghost".to_string(), Vec::new());
        assert!(catalog.into_source().is_err());
    }
}
