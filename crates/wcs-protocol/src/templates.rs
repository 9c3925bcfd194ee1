//! Response templates and literal `{key}` substitution.

use std::collections::HashMap;
use std::fmt;

use wcps_common::{WcpsError, WcpsResult};

/// Identifies one response template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    GridCoverage,
    MultiPointCoverage,
    RangeField,
    RectifiedGridOrigin,
    OffsetVector,
    ExceptionReport,
}

impl TemplateId {
    pub const ALL: [TemplateId; 6] = [
        TemplateId::GridCoverage,
        TemplateId::MultiPointCoverage,
        TemplateId::RangeField,
        TemplateId::RectifiedGridOrigin,
        TemplateId::OffsetVector,
        TemplateId::ExceptionReport,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TemplateId::GridCoverage => "GridCoverage",
            TemplateId::MultiPointCoverage => "MultiPointCoverage",
            TemplateId::RangeField => "RangeField",
            TemplateId::RectifiedGridOrigin => "RectifiedGridCoverage",
            TemplateId::OffsetVector => "RectifiedGridCoverageOffsets",
            TemplateId::ExceptionReport => "ExceptionReport",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Produces response text from a template and placeholder values.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: TemplateId, values: &[(&str, &str)]) -> WcpsResult<String>;
}

/// Replace every `{key}` of `template` by its value.
///
/// Placeholders without a value are left in place so a later pass can fill
/// them.
pub fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (key, value) in values {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

/// Built-in templates, optionally overridden per id.
#[derive(Debug, Clone, Default)]
pub struct BuiltinTemplates {
    overrides: HashMap<TemplateId, String>,
}

impl BuiltinTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the built-in text of `id`.
    pub fn with_override(mut self, id: TemplateId, text: impl Into<String>) -> Self {
        self.overrides.insert(id, text.into());
        self
    }

    /// Load overrides from `<dir>/<TemplateName>.xml` files present in `dir`.
    pub fn load_overrides(mut self, dir: &std::path::Path) -> WcpsResult<Self> {
        for id in TemplateId::ALL {
            let path = dir.join(format!("{}.xml", id.name()));
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|e| {
                WcpsError::Template(format!("cannot read {}: {}", path.display(), e))
            })?;
            self.overrides.insert(id, text);
        }
        Ok(self)
    }

    fn text(&self, id: TemplateId) -> &str {
        match self.overrides.get(&id) {
            Some(text) => text,
            None => builtin(id),
        }
    }
}

impl TemplateRenderer for BuiltinTemplates {
    fn render(&self, template: TemplateId, values: &[(&str, &str)]) -> WcpsResult<String> {
        let text = self.text(template);
        if text.trim().is_empty() {
            return Err(WcpsError::Template(format!("template {} is empty", template)));
        }
        Ok(substitute(text, values))
    }
}

fn builtin(id: TemplateId) -> &'static str {
    match id {
        TemplateId::GridCoverage => GRID_COVERAGE,
        TemplateId::MultiPointCoverage => MULTIPOINT_COVERAGE,
        TemplateId::RangeField => RANGE_FIELD,
        TemplateId::RectifiedGridOrigin => RECTIFIED_GRID_ORIGIN,
        TemplateId::OffsetVector => OFFSET_VECTOR,
        TemplateId::ExceptionReport => EXCEPTION_REPORT,
    }
}

const GRID_COVERAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gmlcov:{coverageType} xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:gmlcov="http://www.opengis.net/gmlcov/1.0" xmlns:swe="http://www.opengis.net/swe/2.0" xmlns:ows="http://www.opengis.net/ows/2.0" gml:id="{coverageId}">
{descriptions}  <gml:boundedBy>
    <gml:Envelope srsName="{srsName}" axisLabels="{axisLabels}" uomLabels="{uomLabels}" srsDimension="{gridDimension}">
      <gml:lowerCorner>{lowerCorner}</gml:lowerCorner>
      <gml:upperCorner>{upperCorner}</gml:upperCorner>
    </gml:Envelope>
  </gml:boundedBy>
  <gml:domainSet>
    <gml:{gridType} dimension="{gridDimension}" gml:id="{gridId}">
      <gml:limits>
        <gml:GridEnvelope>
          <gml:low>{low}</gml:low>
          <gml:high>{high}</gml:high>
        </gml:GridEnvelope>
      </gml:limits>
      <gml:axisLabels>{axisLabels}</gml:axisLabels>
{additions}
    </gml:{gridType}>
  </gml:domainSet>
  <gml:rangeSet>
    {coverageData}
  </gml:rangeSet>
  <gmlcov:rangeType>
    <swe:DataRecord>
{rangeFields}    </swe:DataRecord>
  </gmlcov:rangeType>
{metadata}</gmlcov:{coverageType}>
"#;

const MULTIPOINT_COVERAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gmlcov:{coverageSubtype} xmlns:gml="http://www.opengis.net/gml/3.2" xmlns:gmlcov="http://www.opengis.net/gmlcov/1.0" xmlns:swe="http://www.opengis.net/swe/2.0" xmlns:ows="http://www.opengis.net/ows/2.0" gml:id="{coverageId}">
{descriptions}  <gml:boundedBy>
    <gml:Envelope srsName="{srsName}" axisLabels="{axisLabels}" uomLabels="{uomLabels}" srsDimension="{gridDimension}">
      <gml:lowerCorner>{low}</gml:lowerCorner>
      <gml:upperCorner>{high}</gml:upperCorner>
    </gml:Envelope>
  </gml:boundedBy>
  <gml:domainSet>
    <gml:MultiPoint gml:id="{mpId}"{srsgroup}>
      <gml:pointMembers>
{pointMembers}      </gml:pointMembers>
    </gml:MultiPoint>
  </gml:domainSet>
  <gmlcov:rangeType>
    <swe:DataRecord>
{rangeFields}    </swe:DataRecord>
  </gmlcov:rangeType>
{metadata}</gmlcov:{coverageSubtype}>
"#;

const RANGE_FIELD: &str = r#"      <swe:field name="{fieldName}">
        <swe:Quantity definition="{datatype}">
          <swe:label>{componentName}</swe:label>
          <swe:description>{fieldDescr}</swe:description>
          <swe:nilValues>
            <swe:NilValues>
{nilValues}            </swe:NilValues>
          </swe:nilValues>
          <swe:uom code="{code}"/>
          <swe:constraint>
            <swe:AllowedValues>
              <swe:interval>{allowedValues}</swe:interval>
            </swe:AllowedValues>
          </swe:constraint>
        </swe:Quantity>
      </swe:field>
"#;

const RECTIFIED_GRID_ORIGIN: &str = r#"      <gml:origin>
        <gml:Point gml:id="{pointId}" srsName="{srsName}">
          <gml:pos>{originPos}</gml:pos>
        </gml:Point>
      </gml:origin>"#;

const OFFSET_VECTOR: &str =
    r#"      <gml:offsetVector srsName="{srsName}" uomLabels="{uomLabels}">{offsets}</gml:offsetVector>"#;

const EXCEPTION_REPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/2.0" version="2.0.0" xml:lang="en">
  <ows:Exception exceptionCode="{exceptionCode}"{locator}>
    <ows:ExceptionText>{exceptionText}</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_is_literal() {
        let out = substitute("<a>{x}</a><b>{y}</b>", &[("x", "1"), ("y", "{x}")]);
        // values are not re-expanded after the key they belong to
        assert_eq!(out, "<a>1</a><b>{x}</b>");
    }

    #[test]
    fn test_unfilled_placeholders_remain() {
        let out = substitute("{low} {high}", &[("low", "0 0")]);
        assert_eq!(out, "0 0 {high}");
    }

    #[test]
    fn test_override_replaces_builtin() {
        let templates = BuiltinTemplates::new().with_override(TemplateId::RangeField, "[{fieldName}]");
        let out = templates
            .render(TemplateId::RangeField, &[("fieldName", "red")])
            .unwrap();
        assert_eq!(out, "[red]");
    }

    #[test]
    fn test_empty_override_is_an_error() {
        let templates = BuiltinTemplates::new().with_override(TemplateId::OffsetVector, "  ");
        assert!(matches!(
            templates.render(TemplateId::OffsetVector, &[]),
            Err(WcpsError::Template(_))
        ));
    }

    #[test]
    fn test_template_names_round_trip() {
        for id in TemplateId::ALL {
            assert_eq!(TemplateId::from_name(id.name()), Some(id));
        }
    }
}
