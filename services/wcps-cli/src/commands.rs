//! Subcommand implementations.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use wcps_common::{DimensionSubset, MetadataSource, WcpsError};
use wcps_compiler::{CompiledQuery, WcpsCompiler};
use wcs_protocol::{
    exception_report, BuiltinTemplates, GetCoverageRequest, GmlFormatHandler, QueryResult,
    Response, StaticQueryExecutor, WcsCapabilitiesBuilder,
};

use crate::config::CliConfig;

/// One compiled query as printed by `compile`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutput {
    pub rasql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub store: bool,
    /// Axis labels of the result coverage; empty for scalar results
    pub axes: Vec<String>,
    /// Array-engine extent of the result coverage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdom: Option<String>,
}

impl From<CompiledQuery> for QueryOutput {
    fn from(query: CompiledQuery) -> Self {
        let axes = query
            .info
            .as_ref()
            .map(|info| info.axis_labels().iter().map(|l| l.to_string()).collect())
            .unwrap_or_default();
        Self {
            sdom: query.info.as_ref().map(|info| info.sdom()),
            rasql: query.rasql,
            format: query.format,
            store: query.store,
            axes,
        }
    }
}

/// Compile a WCPS XML request into RasQL, one query per coverage combination.
pub fn compile(
    source: &dyn MetadataSource,
    config: &CliConfig,
    xml: &str,
) -> Result<Vec<QueryOutput>, WcpsError> {
    let compiler = WcpsCompiler::new(source, config.compiler.clone());
    let queries = compiler.compile(xml)?;
    Ok(queries.into_iter().map(QueryOutput::from).collect())
}

/// Response templates, with overrides from the configured directory.
pub fn templates(config: &CliConfig) -> Result<BuiltinTemplates> {
    let templates = BuiltinTemplates::new();
    match &config.template_dir {
        Some(dir) => templates
            .load_overrides(dir)
            .with_context(|| format!("Failed to load templates from {:?}", dir)),
        None => Ok(templates),
    }
}

/// Parse `axis(low,high)` / `axis(point)` subset arguments.
pub fn parse_subsets(args: &[String]) -> Result<Vec<DimensionSubset>> {
    args.iter()
        .map(|arg| {
            arg.parse::<DimensionSubset>()
                .with_context(|| format!("Invalid subset argument '{}'", arg))
        })
        .collect()
}

/// Answer a GetCoverage request as GML; `data` stands in for the array
/// engine's CSV output.
pub fn get_coverage(
    source: &dyn MetadataSource,
    templates: &BuiltinTemplates,
    config: &CliConfig,
    request: &GetCoverageRequest,
    data: Option<String>,
) -> Result<Response, WcpsError> {
    let executor =
        StaticQueryExecutor::new().with_fallback(QueryResult::csv(data.unwrap_or_default()));
    let handler = GmlFormatHandler::new(source, &executor, templates, &config.response);
    if !handler.can_handle(request) {
        return Err(WcpsError::Unimplemented {
            feature: format!(
                "output format {}",
                request.format.as_deref().unwrap_or("multipart")
            ),
        });
    }

    let response = handler.handle(request)?;
    info!(coverage = %request.coverage_id, mime = %response.mime_type, "GetCoverage done");
    Ok(response)
}

/// Capabilities document listing every catalog coverage.
pub fn capabilities(source: &dyn MetadataSource, config: &CliConfig) -> String {
    WcsCapabilitiesBuilder::from_source(source, &config.response).build()
}

/// Exception report text for a failed request.
pub fn report(templates: &BuiltinTemplates, err: &WcpsError) -> String {
    exception_report(templates, err)
}
