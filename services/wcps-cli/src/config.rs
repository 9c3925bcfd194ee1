//! Command line configuration.

use std::path::PathBuf;

use anyhow::{bail, Result};

use wcps_compiler::CompilerConfig;
use wcs_protocol::ResponseConfig;

/// Settings shared by all subcommands.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Coverage catalog (YAML)
    pub catalog_path: PathBuf,

    /// Directory with response template overrides
    pub template_dir: Option<PathBuf>,

    pub compiler: CompilerConfig,
    pub response: ResponseConfig,
}

impl CliConfig {
    /// Build from environment variables; explicit paths win over
    /// `WCPS_CATALOG` and `WCPS_TEMPLATE_DIR`.
    pub fn from_env(catalog: Option<PathBuf>, template_dir: Option<PathBuf>) -> Result<Self> {
        let catalog_path =
            match catalog.or_else(|| std::env::var("WCPS_CATALOG").ok().map(PathBuf::from)) {
                Some(path) => path,
                None => bail!("no catalog given (use --catalog or WCPS_CATALOG)"),
            };
        let template_dir =
            template_dir.or_else(|| std::env::var("WCPS_TEMPLATE_DIR").ok().map(PathBuf::from));

        let config = Self {
            catalog_path,
            template_dir,
            compiler: CompilerConfig::from_env(),
            response: ResponseConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Err(msg) = self.compiler.validate() {
            bail!("invalid compiler configuration: {}", msg);
        }
        if let Err(msg) = self.response.validate() {
            bail!("invalid response configuration: {}", msg);
        }
        if let Some(dir) = &self.template_dir {
            if !dir.is_dir() {
                bail!("template directory {:?} does not exist", dir);
            }
        }
        Ok(())
    }
}
