//! Common test fixtures: canned coverages and WCPS request builders.

use wcps_common::{
    BoundingBox, CellDomainDef, CoverageMetadataDef, DomainElementDef, InMemoryMetadataSource,
    PointRecord, RangeField,
};

/// Geographic WGS84 CRS URI.
pub const EPSG_4326: &str = "http://www.opengis.net/def/crs/EPSG/0/4326";

fn axis(name: &str, axis_type: &str, lo: f64, hi: f64, crs: Option<&str>) -> DomainElementDef {
    DomainElementDef {
        name: name.to_string(),
        axis_type: axis_type.to_string(),
        num_lo: Some(lo),
        num_hi: Some(hi),
        crs_set: crs.into_iter().map(str::to_string).collect(),
        ..Default::default()
    }
}

fn cells(lo: i64, hi: i64) -> CellDomainDef {
    CellDomainDef {
        lo: Some(lo),
        hi: Some(hi),
    }
}

/// Rectified grid in EPSG:4326: x 0..100 over 20 cells, y 0..50 over 10
/// cells, so both axes have resolution 5.
pub fn airtemp_def(name: &str) -> CoverageMetadataDef {
    CoverageMetadataDef {
        coverage_name: name.to_string(),
        coverage_type: "RectifiedGridCoverage".to_string(),
        domain: vec![
            axis("x", "x", 0.0, 100.0, Some(EPSG_4326)),
            axis("y", "y", 0.0, 50.0, Some(EPSG_4326)),
        ],
        cell_domain: vec![cells(0, 19), cells(0, 9)],
        range_fields: vec![RangeField {
            nil_values: vec!["-9999".to_string()],
            description: "Mean air temperature".to_string(),
            ..RangeField::new("value", "float")
        }],
        bbox: BoundingBox::new(EPSG_4326, vec![0.0, 0.0], vec![100.0, 50.0]).ok(),
        title: "Mean summer air temperature".to_string(),
        abstract_text: "Seasonal mean of 2m air temperature".to_string(),
        keywords: vec!["temperature".to_string(), "climate".to_string()],
        ..Default::default()
    }
}

/// Three-band image in pixel coordinates only.
pub fn rgb_def() -> CoverageMetadataDef {
    CoverageMetadataDef {
        coverage_name: "rgb".to_string(),
        coverage_type: "GridCoverage".to_string(),
        domain: vec![
            axis("x", "x", 0.0, 399.0, None),
            axis("y", "y", 0.0, 343.0, None),
        ],
        cell_domain: vec![cells(0, 399), cells(0, 343)],
        range_fields: vec![
            RangeField::new("red", "char"),
            RangeField::new("green", "char"),
            RangeField::new("blue", "char"),
        ],
        ..Default::default()
    }
}

/// One-dimensional grid that is compatible with nothing else here.
pub fn tiny_def() -> CoverageMetadataDef {
    CoverageMetadataDef {
        coverage_name: "tiny".to_string(),
        coverage_type: "GridCoverage".to_string(),
        domain: vec![axis("x", "x", 0.0, 9.0, None)],
        cell_domain: vec![cells(0, 9)],
        range_fields: vec![RangeField::new("value", "short")],
        ..Default::default()
    }
}

/// Point cloud over x/y 0..100.
pub fn pointcloud_def() -> CoverageMetadataDef {
    CoverageMetadataDef {
        coverage_name: "pointcloud".to_string(),
        coverage_type: "MultiPointCoverage".to_string(),
        domain: vec![
            axis("x", "x", 0.0, 100.0, Some(EPSG_4326)),
            axis("y", "y", 0.0, 100.0, Some(EPSG_4326)),
        ],
        cell_domain: vec![cells(0, 100), cells(0, 100)],
        range_fields: vec![RangeField::new("intensity", "float")],
        ..Default::default()
    }
}

pub fn pointcloud_points() -> Vec<PointRecord> {
    [(10.0, 10.0, "1"), (20.0, 80.0, "2"), (70.0, 30.0, "3")]
        .iter()
        .map(|(x, y, v)| PointRecord {
            position: vec![*x, *y],
            values: vec![v.to_string()],
        })
        .collect()
}

/// Source holding `mean_summer_airtemp`, `mean_winter_airtemp`, `rgb`,
/// `tiny` and `pointcloud`.
pub fn sample_source() -> InMemoryMetadataSource {
    let defs = [
        airtemp_def("mean_summer_airtemp"),
        airtemp_def("mean_winter_airtemp"),
        rgb_def(),
        tiny_def(),
        pointcloud_def(),
    ];
    let mut source = InMemoryMetadataSource::from_defs(&defs)
        .expect("fixture coverages are valid");
    source.insert_points("pointcloud", pointcloud_points());
    source
}

/// Builders for WCPS XML fragments.
pub mod wcps {
    /// `<tag>children</tag>`
    pub fn el(tag: &str, children: &str) -> String {
        format!("<{tag}>{children}</{tag}>")
    }

    pub fn coverage(var: &str) -> String {
        el("coverage", var)
    }

    pub fn number(value: &str) -> String {
        el("numericConstant", value)
    }

    /// Binary element over two operands.
    pub fn binary(tag: &str, left: &str, right: &str) -> String {
        el(tag, &format!("{left}{right}"))
    }

    pub fn trim(operand: &str, axis: &str, lo: &str, hi: &str) -> String {
        el(
            "trim",
            &format!(
                "{operand}<axis>{axis}</axis><lowerBound>{lo}</lowerBound><upperBound>{hi}</upperBound>"
            ),
        )
    }

    pub fn slice(operand: &str, axis: &str, point: &str) -> String {
        el(
            "slice",
            &format!("{operand}<axis>{axis}</axis><slicingPosition>{point}</slicingPosition>"),
        )
    }

    pub fn encode(expr: &str, format: &str) -> String {
        format!("<encode store=\"false\">{expr}<format>{format}</format></encode>")
    }

    /// A full `ProcessCoveragesRequest` document.
    pub fn process_coverages(iterators: &[(&str, &[&str])], ret: &str) -> String {
        process_coverages_where(iterators, None, ret)
    }

    pub fn process_coverages_where(
        iterators: &[(&str, &[&str])],
        condition: Option<&str>,
        ret: &str,
    ) -> String {
        let mut body = String::new();
        for (var, names) in iterators {
            let names: String = names
                .iter()
                .map(|n| el("coverageName", n))
                .collect();
            body.push_str(&el(
                "coverageIterator",
                &format!("<iteratorVar>{var}</iteratorVar>{names}"),
            ));
        }
        if let Some(condition) = condition {
            body.push_str(&el("where", condition));
        }
        body.push_str(&el("return", ret));
        format!(
            "<ProcessCoveragesRequest xmlns=\"http://www.opengis.net/wcps/1.0\">\
             <query><xmlSyntax>{body}</xmlSyntax></query></ProcessCoveragesRequest>"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcps_common::MetadataSource;

    #[test]
    fn test_sample_source_contents() {
        let source = sample_source();
        assert_eq!(source.coverage_ids().len(), 5);
        let air = source.read("mean_summer_airtemp").unwrap();
        assert_eq!(air.domains[0].resolution().to_string(), "5");
        assert_eq!(air.domains[1].resolution().to_string(), "5");
    }

    #[test]
    fn test_request_builder() {
        let xml = wcps::process_coverages(&[("c", &["rgb"])], &wcps::encode(&wcps::coverage("c"), "png"));
        assert!(xml.contains("<iteratorVar>c</iteratorVar><coverageName>rgb</coverageName>"));
        assert!(xml.contains("<format>png</format>"));
    }
}
