//! GML coverage document assembly.

use quick_xml::escape::{escape, partial_escape};
use tracing::{debug, warn};

use wcps_common::{CoverageType, RangeField, WcpsError, WcpsResult};

use crate::config::ResponseConfig;
use crate::context::ResponseContext;
use crate::templates::{substitute, TemplateId, TemplateRenderer};
use crate::tuple_list::{csv_to_tuple_list, data_block, datatype_interval};

/// Placeholder the range-set data block replaces.
pub const COVERAGE_DATA_KEY: &str = "coverageData";

/// GML element name of the domain set for a grid coverage subtype.
pub fn grid_type(coverage_type: &CoverageType) -> Option<&'static str> {
    match coverage_type {
        CoverageType::GridCoverage => Some("Grid"),
        CoverageType::RectifiedGridCoverage => Some("RectifiedGrid"),
        CoverageType::ReferenceableGridCoverage => Some("ReferenceableGridByVectors"),
        _ => None,
    }
}

/// Builds the pieces of a GML coverage description from a [`ResponseContext`].
pub struct GmlAssembler<'a> {
    templates: &'a dyn TemplateRenderer,
    config: &'a ResponseConfig,
}

impl<'a> GmlAssembler<'a> {
    pub fn new(templates: &'a dyn TemplateRenderer, config: &'a ResponseConfig) -> Self {
        Self { templates, config }
    }

    /// Render the coverage template with everything but the range-set data.
    ///
    /// With `replace_bounds` the grid envelope and axis labels are filled in
    /// too; otherwise `{low}`/`{high}` stay for the caller.
    pub fn get_gml(
        &self,
        ctx: &ResponseContext,
        template: TemplateId,
        replace_bounds: bool,
    ) -> WcpsResult<String> {
        let coverage = ctx.coverage();
        let coverage_type = coverage.coverage_type.label().to_string();
        let grid_type = match template {
            TemplateId::MultiPointCoverage => "MultiPoint",
            _ => grid_type(&coverage.coverage_type).ok_or_else(|| {
                WcpsError::UnsupportedCoverageConfiguration(format!(
                    "coverage '{}' has subtype {}",
                    coverage.coverage_name, coverage_type
                ))
            })?,
        };

        let grid_id = format!("{}-grid", ctx.coverage_id());
        let mp_id = format!("multipoint_{}", grid_id);
        let grid_dimension = ctx.grid_dimension().to_string();
        let descriptions = self.descriptions(ctx);
        let range_fields = self.range_fields(ctx)?;
        let axis_labels = ctx.axis_labels();
        let uom_labels = ctx.uom_labels();
        let srs_name = ctx.srs_name();
        let srs_group = srs_group(ctx);
        let lower_corner = ctx.dom_low();
        let upper_corner = ctx.dom_high();
        let metadata = metadata_block(ctx);
        let additions = self.additions(ctx)?;
        let low = ctx.low();
        let high = ctx.high();

        let mut values: Vec<(&str, &str)> = vec![
            ("descriptions", descriptions.as_str()),
            ("coverageId", ctx.coverage_id()),
            ("coverageType", coverage_type.as_str()),
            ("coverageSubtype", coverage_type.as_str()),
            ("gridId", grid_id.as_str()),
            ("mpId", mp_id.as_str()),
            ("gridDimension", grid_dimension.as_str()),
            ("gridType", grid_type),
            ("uomLabels", uom_labels.as_str()),
            ("rangeFields", range_fields.as_str()),
            ("srsgroup", srs_group.as_str()),
            ("srsName", srs_name.as_str()),
            ("lowerCorner", lower_corner.as_str()),
            ("upperCorner", upper_corner.as_str()),
            ("metadata", metadata.as_str()),
            ("additions", additions.as_str()),
        ];

        if replace_bounds {
            values.push(("low", low.as_str()));
            values.push(("high", high.as_str()));
            values.push(("axisLabels", axis_labels.as_str()));
        } else if template == TemplateId::MultiPointCoverage {
            values.push(("axisLabels", axis_labels.as_str()));
        }

        debug!(
            coverage = ctx.coverage_id(),
            template = %template,
            "rendering coverage description"
        );
        self.templates.render(template, &values)
    }

    /// One field description per range field.
    pub fn range_fields(&self, ctx: &ResponseContext) -> WcpsResult<String> {
        let mut out = String::new();
        for field in &ctx.coverage().range_fields {
            out.push_str(&self.range_field(field)?);
        }
        Ok(out)
    }

    fn range_field(&self, field: &RangeField) -> WcpsResult<String> {
        let datatype = format!("{}{}", self.config.datatype_urn_prefix, field.datatype);
        let nil_values: String = field
            .nil_values
            .iter()
            .map(|v| {
                format!(
                    "              <swe:nilValue reason=\"\">{}</swe:nilValue>\n",
                    partial_escape(v.as_str())
                )
            })
            .collect();
        let allowed_values = field
            .allowed_values
            .clone()
            .or_else(|| datatype_interval(&field.datatype))
            .map(|(lo, hi)| format!("{} {}", lo, hi))
            .unwrap_or_default();
        let description = partial_escape(field.description.as_str()).into_owned();

        self.templates.render(
            TemplateId::RangeField,
            &[
                ("fieldName", field.name.as_str()),
                ("componentName", field.name.as_str()),
                ("datatype", datatype.as_str()),
                ("nilValues", nil_values.as_str()),
                ("fieldDescr", description.as_str()),
                ("allowedValues", allowed_values.as_str()),
                ("code", field.uom_code.as_str()),
            ],
        )
    }

    /// Title, abstract and keywords as OWS elements.
    pub fn descriptions(&self, ctx: &ResponseContext) -> String {
        let coverage = ctx.coverage();
        let mut out = String::new();
        if !coverage.title.is_empty() {
            out.push_str(&format!(
                "  <ows:Title>{}</ows:Title>\n",
                partial_escape(coverage.title.as_str())
            ));
        }
        if !coverage.abstract_text.is_empty() {
            out.push_str(&format!(
                "  <ows:Abstract>{}</ows:Abstract>\n",
                partial_escape(coverage.abstract_text.as_str())
            ));
        }
        if !coverage.keywords.is_empty() {
            out.push_str("  <ows:Keywords>\n");
            for keyword in &coverage.keywords {
                out.push_str(&format!(
                    "    <ows:Keyword>{}</ows:Keyword>\n",
                    partial_escape(keyword.as_str())
                ));
            }
            out.push_str("  </ows:Keywords>\n");
        }
        out
    }

    /// One offset vector row per retained axis: the axis resolution on the
    /// diagonal, zero elsewhere.
    pub fn offset_rows(&self, ctx: &ResponseContext) -> Vec<String> {
        let resolutions: Vec<String> = ctx
            .retained_axes()
            .map(|(dom, _)| dom.resolution().to_string())
            .collect();
        (0..resolutions.len())
            .map(|i| {
                (0..resolutions.len())
                    .map(|j| if i == j { resolutions[i].as_str() } else { "0" })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Origin and offset vectors of a rectified grid; empty for other
    /// subtypes and for rectified grids without a bounding box.
    pub fn additions(&self, ctx: &ResponseContext) -> WcpsResult<String> {
        if *ctx.coverage_type() != CoverageType::RectifiedGridCoverage {
            return Ok(String::new());
        }
        if ctx.coverage().bbox.is_none() {
            warn!(
                coverage = ctx.coverage_id(),
                "rectified grid coverage has no bounding box, omitting origin and offsets"
            );
            return Ok(String::new());
        }

        let srs_name = ctx.srs_name();
        let uom_labels = ctx.uom_labels();
        let point_id = format!("{}-origin", ctx.coverage_id());
        let origin_pos = ctx.dom_low();
        let origin = self.templates.render(
            TemplateId::RectifiedGridOrigin,
            &[
                ("pointId", point_id.as_str()),
                ("srsName", srs_name.as_str()),
                ("originPos", origin_pos.as_str()),
                ("uomLabels", uom_labels.as_str()),
            ],
        )?;

        let mut offsets = Vec::new();
        for row in self.offset_rows(ctx) {
            offsets.push(self.templates.render(
                TemplateId::OffsetVector,
                &[
                    ("srsName", srs_name.as_str()),
                    ("uomLabels", uom_labels.as_str()),
                    ("offsets", row.as_str()),
                ],
            )?);
        }

        Ok(format!("{}\n{}", origin, offsets.join("\n")))
    }
}

/// `srsName`/`srsDimension` attributes taken from the bounding box.
pub fn srs_group(ctx: &ResponseContext) -> String {
    match &ctx.coverage().bbox {
        Some(bbox) => format!(
            " srsName=\"{}\" srsDimension=\"{}\"",
            escape(bbox.crs_name.as_str()),
            bbox.dimension()
        ),
        None => String::new(),
    }
}

fn metadata_block(ctx: &ResponseContext) -> String {
    match &ctx.coverage().metadata {
        Some(text) if !text.trim().is_empty() => {
            format!("  <gmlcov:metadata>{}</gmlcov:metadata>\n", text)
        }
        _ => String::new(),
    }
}

/// Put CSV result data into the range set of a rendered coverage document.
pub fn add_coverage_data(gml: &str, csv: &str) -> String {
    let block = data_block(&csv_to_tuple_list(csv));
    substitute(gml, &[(COVERAGE_DATA_KEY, block.as_str())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::GetCoverageRequest;
    use crate::templates::BuiltinTemplates;
    use test_utils::fixtures::sample_source;
    use wcps_common::DimensionSubset;

    fn context(request: GetCoverageRequest) -> ResponseContext {
        ResponseContext::new(&request, &sample_source()).unwrap()
    }

    #[test]
    fn test_offset_rows_are_diagonal() {
        let templates = BuiltinTemplates::new();
        let config = ResponseConfig::default();
        let assembler = GmlAssembler::new(&templates, &config);
        let ctx = context(GetCoverageRequest::new("mean_summer_airtemp"));

        assert_eq!(assembler.offset_rows(&ctx), vec!["5 0", "0 5"]);
    }

    #[test]
    fn test_offset_rows_skip_sliced_axes() {
        let templates = BuiltinTemplates::new();
        let config = ResponseConfig::default();
        let assembler = GmlAssembler::new(&templates, &config);
        let ctx = context(
            GetCoverageRequest::new("mean_summer_airtemp")
                .with_subset(DimensionSubset::slice("x", "4")),
        );

        assert_eq!(assembler.offset_rows(&ctx), vec!["5"]);
    }

    #[test]
    fn test_additions_contain_origin_and_offsets() {
        let templates = BuiltinTemplates::new();
        let config = ResponseConfig::default();
        let assembler = GmlAssembler::new(&templates, &config);
        let ctx = context(GetCoverageRequest::new("mean_summer_airtemp"));

        let additions = assembler.additions(&ctx).unwrap();
        assert!(additions.contains("gml:id=\"mean_summer_airtemp-origin\""));
        assert!(additions.contains("<gml:pos>0 0</gml:pos>"));
        assert!(additions.contains(">5 0</gml:offsetVector>"));
        assert!(additions.contains(">0 5</gml:offsetVector>"));
    }

    #[test]
    fn test_grid_coverage_has_no_additions() {
        let templates = BuiltinTemplates::new();
        let config = ResponseConfig::default();
        let assembler = GmlAssembler::new(&templates, &config);
        let ctx = context(GetCoverageRequest::new("rgb"));

        assert_eq!(assembler.additions(&ctx).unwrap(), "");
    }

    #[test]
    fn test_range_field_uses_datatype_interval() {
        let templates = BuiltinTemplates::new();
        let config = ResponseConfig::default();
        let assembler = GmlAssembler::new(&templates, &config);
        let ctx = context(GetCoverageRequest::new("rgb"));

        let fields = assembler.range_fields(&ctx).unwrap();
        assert_eq!(fields.matches("<swe:field ").count(), 3);
        assert!(fields.contains("definition=\"urn:ogc:def:dataType:OGC:1.1:char\""));
        assert!(fields.contains("<swe:interval>-128 128</swe:interval>"));
    }

    #[test]
    fn test_descriptions() {
        let templates = BuiltinTemplates::new();
        let config = ResponseConfig::default();
        let assembler = GmlAssembler::new(&templates, &config);
        let ctx = context(GetCoverageRequest::new("mean_summer_airtemp"));

        let text = assembler.descriptions(&ctx);
        assert!(text.starts_with("  <ows:Title>Mean summer air temperature</ows:Title>\n"));
        assert!(text.contains("<ows:Keyword>climate</ows:Keyword>"));
    }

    #[test]
    fn test_add_coverage_data() {
        let gml = "<gml:rangeSet>{coverageData}</gml:rangeSet>";
        assert_eq!(
            add_coverage_data(gml, "{1 2},{3 4}"),
            "<gml:rangeSet><gml:DataBlock><gml:rangeParameters/><gml:tupleList>1 2,3 4</gml:tupleList></gml:DataBlock></gml:rangeSet>"
        );
    }
}
