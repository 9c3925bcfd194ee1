//! GetCoverage handling for GML output.

use tracing::{debug, info};

use wcps_common::{CoverageType, MetadataSource, WcpsError, WcpsResult};

use crate::config::ResponseConfig;
use crate::context::ResponseContext;
use crate::executor::QueryExecutor;
use crate::gml::{add_coverage_data, GmlAssembler};
use crate::request::{GetCoverageRequest, MIME_GML};
use crate::templates::{substitute, TemplateId, TemplateRenderer};
use crate::tuple_list::sdom_to_bounds;

/// A response payload: a MIME type plus the XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub mime_type: String,
    pub xml: String,
    /// HTTP status the transport should use
    pub status: u16,
}

impl Response {
    pub fn xml(mime_type: impl Into<String>, xml: String) -> Self {
        Self {
            mime_type: mime_type.into(),
            xml,
            status: 200,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

/// Builds the RasQL query fetching the requested cells as CSV.
pub fn coverage_query(ctx: &ResponseContext) -> String {
    let subsetted = ctx.cell_domains().iter().any(|c| c.subset().is_some());
    if subsetted {
        format!(
            "select csv(c{}) from {} as c",
            ctx.sdom(),
            ctx.coverage_id()
        )
    } else {
        format!("select csv(c) from {} as c", ctx.coverage_id())
    }
}

/// Answers GetCoverage requests with a GML document.
pub struct GmlFormatHandler<'a> {
    source: &'a dyn MetadataSource,
    executor: &'a dyn QueryExecutor,
    templates: &'a dyn TemplateRenderer,
    config: &'a ResponseConfig,
}

impl<'a> GmlFormatHandler<'a> {
    pub fn new(
        source: &'a dyn MetadataSource,
        executor: &'a dyn QueryExecutor,
        templates: &'a dyn TemplateRenderer,
        config: &'a ResponseConfig,
    ) -> Self {
        Self {
            source,
            executor,
            templates,
            config,
        }
    }

    pub fn can_handle(&self, request: &GetCoverageRequest) -> bool {
        request.wants_gml()
    }

    pub fn handle(&self, request: &GetCoverageRequest) -> WcpsResult<Response> {
        let ctx = ResponseContext::new(request, self.source)?;
        let gml = match ctx.coverage_type() {
            CoverageType::MultiPointCoverage => self.handle_multipoint(&ctx)?,
            t if t.is_grid() => self.handle_grid(&ctx)?,
            other => {
                return Err(WcpsError::UnsupportedCoverageConfiguration(format!(
                    "coverage '{}' has subtype {}",
                    ctx.coverage_id(),
                    other
                )))
            }
        };

        info!(
            coverage = ctx.coverage_id(),
            bytes = gml.len(),
            "assembled GML coverage"
        );
        Ok(Response::xml(MIME_GML, gml))
    }

    fn handle_grid(&self, ctx: &ResponseContext) -> WcpsResult<String> {
        let assembler = GmlAssembler::new(self.templates, self.config);
        let gml = assembler.get_gml(ctx, TemplateId::GridCoverage, false)?;

        let rasql = coverage_query(ctx);
        let result = self.executor.execute(&rasql)?;

        let (low, high) = match &result.sdom {
            Some(sdom) => sdom_to_bounds(sdom)?,
            None => (ctx.low(), ctx.high()),
        };
        let axis_labels = ctx.axis_labels();
        let gml = substitute(
            &gml,
            &[
                ("low", low.as_str()),
                ("high", high.as_str()),
                ("axisLabels", axis_labels.as_str()),
            ],
        );
        Ok(add_coverage_data(&gml, result.text()?))
    }

    fn handle_multipoint(&self, ctx: &ResponseContext) -> WcpsResult<String> {
        let assembler = GmlAssembler::new(self.templates, self.config);
        let gml = assembler.get_gml(ctx, TemplateId::MultiPointCoverage, false)?;

        let members = self.source.coverage_data(
            &self.config.multipoint_schema,
            ctx.coverage_id(),
            ctx.requested_id(),
            ctx.cell_domains(),
        )?;

        let low = join_bounds(ctx, true);
        let high = join_bounds(ctx, false);
        debug!(coverage = ctx.coverage_id(), %low, %high, "multipoint bounds");

        Ok(substitute(
            &gml,
            &[
                ("pointMembers", members.as_str()),
                ("low", low.as_str()),
                ("high", high.as_str()),
            ],
        ))
    }
}

fn join_bounds(ctx: &ResponseContext, lower: bool) -> String {
    ctx.cell_domains()
        .iter()
        .map(|cell| (if lower { cell.lo() } else { cell.hi() }).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
