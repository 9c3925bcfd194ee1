//! Metadata-changing operations. They compile to their operand's query text
//! and only alter the schema.

use wcps_common::{crs::normalize_crs_set, WcpsError, WcpsResult};

use super::{no_match, Attempt, CoverageExpr, ParseContext, ParseResult};
use crate::info::CoverageInfo;
use crate::xml::XmlElement;

const PARAMETER_TAGS: [&str; 6] = [
    "identifier",
    "null",
    "field",
    "interpolationMethod",
    "srsName",
    "crs",
];

#[derive(Debug, Clone, PartialEq)]
pub enum SetMetadataKind {
    Identifier(String),
    NullSet(Vec<String>),
    InterpolationDefault { field: String, method: String },
    InterpolationSet { field: String, methods: Vec<String> },
    CrsSet(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetMetadataExpr {
    pub kind: SetMetadataKind,
    pub operand: Box<CoverageExpr>,
    info: CoverageInfo,
}

impl SetMetadataExpr {
    pub fn try_parse(element: &XmlElement, ctx: &ParseContext<'_>) -> ParseResult<SetMetadataExpr> {
        let kind = match element.name.as_str() {
            "setIdentifier" => {
                let id = element.required_child_text("identifier")?;
                SetMetadataKind::Identifier(id.to_string())
            }
            "setNullSet" => SetMetadataKind::NullSet(
                element
                    .children_named("null")
                    .map(|n| n.text.trim().to_string())
                    .collect(),
            ),
            "setInterpolationDefault" => SetMetadataKind::InterpolationDefault {
                field: element.required_child_text("field")?.to_string(),
                method: interpolation_methods(element)
                    .into_iter()
                    .next()
                    .ok_or_else(|| missing_method(element))?,
            },
            "setInterpolationSet" => {
                let methods = interpolation_methods(element);
                if methods.is_empty() {
                    return Err(missing_method(element));
                }
                SetMetadataKind::InterpolationSet {
                    field: element.required_child_text("field")?.to_string(),
                    methods,
                }
            }
            "setCrsSet" => SetMetadataKind::CrsSet(
                element
                    .children
                    .iter()
                    .filter(|c| c.name == "srsName" || c.name == "crs")
                    .map(|c| c.text.trim().to_string())
                    .collect(),
            ),
            _ => return no_match(element, "set metadata operation"),
        };

        let operand_el = element
            .children
            .iter()
            .find(|c| !PARAMETER_TAGS.contains(&c.name.as_str()))
            .ok_or_else(|| {
                WcpsError::invalid_parameter(&element.name, "missing coverage operand")
            })?;
        let operand = CoverageExpr::parse(operand_el, ctx)?;
        let info = apply(operand.info(), &kind)?;

        Ok(Attempt::Matched(SetMetadataExpr {
            kind,
            operand: Box::new(operand),
            info,
        }))
    }

    pub fn info(&self) -> &CoverageInfo {
        &self.info
    }

    pub fn to_rasql(&self) -> String {
        self.operand.to_rasql()
    }
}

fn apply(source: &CoverageInfo, kind: &SetMetadataKind) -> WcpsResult<CoverageInfo> {
    let mut info = source.clone();
    match kind {
        SetMetadataKind::Identifier(id) => info.coverage_name = id.clone(),
        SetMetadataKind::NullSet(values) => info.null_set = values.clone(),
        SetMetadataKind::InterpolationDefault { field, method } => {
            require_field(&info, field)?;
            info.interpolation_default = Some(method.clone());
        }
        SetMetadataKind::InterpolationSet { field, methods } => {
            require_field(&info, field)?;
            info.interpolation_set = methods.clone();
        }
        SetMetadataKind::CrsSet(crss) => {
            let normalized = normalize_crs_set(crss);
            for axis in &mut info.axes {
                axis.domain = axis.domain.with_crs_set(&normalized);
            }
        }
    }
    Ok(info)
}

/// `interpolationMethod` children, as `type` or `type:nullResistance`.
fn interpolation_methods(element: &XmlElement) -> Vec<String> {
    element
        .children_named("interpolationMethod")
        .map(|m| {
            let kind = m.child_text("interpolationType").unwrap_or(m.text.trim());
            match m.child_text("nullResistance") {
                Some(resistance) => format!("{}:{}", kind, resistance),
                None => kind.to_string(),
            }
        })
        .collect()
}

fn require_field(info: &CoverageInfo, field: &str) -> WcpsResult<()> {
    if info.range_fields.iter().any(|f| f.name == field) {
        Ok(())
    } else {
        Err(WcpsError::invalid_parameter(
            "field",
            format!(
                "coverage '{}' has no range field '{}'",
                info.coverage_name, field
            ),
        ))
    }
}

fn missing_method(element: &XmlElement) -> WcpsError {
    WcpsError::invalid_parameter(&element.name, "missing <interpolationMethod> element")
}
