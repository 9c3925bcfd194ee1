//! End-to-end GetCoverage tests against the sample coverages.

use test_utils::fixtures::{airtemp_def, sample_source, EPSG_4326};
use wcps_common::{
    DimensionSubset, InMemoryMetadataSource, MetadataSource, WcpsError, WcpsResult,
};
use wcs_protocol::{
    exception_response, BuiltinTemplates, GetCoverageRequest, GmlFormatHandler, QueryResult,
    ResponseConfig, StaticQueryExecutor, WcsCapabilitiesBuilder, MIME_GML,
};

const AIRTEMP_CSV: &str = "{1 2, 3 4},{5 6, 7 8}";

fn handle_with(source: &dyn MetadataSource, request: &GetCoverageRequest) -> WcpsResult<String> {
    let executor = StaticQueryExecutor::new().with_fallback(QueryResult::csv(AIRTEMP_CSV));
    let templates = BuiltinTemplates::new();
    let config = ResponseConfig::default();
    let handler = GmlFormatHandler::new(source, &executor, &templates, &config);
    assert!(handler.can_handle(request));

    let response = handler.handle(request)?;
    assert_eq!(response.mime_type, MIME_GML);
    Ok(response.xml)
}

fn handle(request: &GetCoverageRequest) -> WcpsResult<String> {
    handle_with(&sample_source(), request)
}

// ============================================================================
// Rectified and plain grids
// ============================================================================

#[test]
fn test_rectified_grid_document() {
    let xml = handle(&GetCoverageRequest::new("mean_summer_airtemp")).unwrap();

    assert!(xml.contains("<gmlcov:RectifiedGridCoverage "));
    assert!(xml.contains("gml:id=\"mean_summer_airtemp\""));
    assert!(xml.contains(&format!("<gml:Envelope srsName=\"{}\"", EPSG_4326)));
    assert!(xml.contains("<gml:lowerCorner>0 0</gml:lowerCorner>"));
    assert!(xml.contains("<gml:upperCorner>100 50</gml:upperCorner>"));
    assert!(xml.contains("<gml:RectifiedGrid dimension=\"2\" gml:id=\"mean_summer_airtemp-grid\">"));
    assert!(xml.contains("<gml:low>0 0</gml:low>"));
    assert!(xml.contains("<gml:high>19 9</gml:high>"));
    assert!(xml.contains("<gml:axisLabels>x y</gml:axisLabels>"));
    assert!(xml.contains(">5 0</gml:offsetVector>"));
    assert!(xml.contains(">0 5</gml:offsetVector>"));
    assert!(xml.contains("<gml:tupleList>1 2, 3 4,5 6, 7 8</gml:tupleList>"));
    assert!(xml.contains("<swe:nilValue reason=\"\">-9999</swe:nilValue>"));
    assert!(xml.contains("<ows:Title>Mean summer air temperature</ows:Title>"));
    assert!(!xml.contains('{'), "unfilled placeholder left in:\n{}", xml);
}

#[test]
fn test_grid_coverage_uses_grid_crs() {
    let xml = handle(&GetCoverageRequest::new("rgb")).unwrap();

    assert!(xml.contains("<gmlcov:GridCoverage "));
    assert!(xml.contains("<gml:Grid dimension=\"2\""));
    assert!(xml.contains("srsName=\"CRS:1\""));
    assert!(!xml.contains("<gml:origin>"));
    assert!(!xml.contains('{'));
}

#[test]
fn test_trimmed_in_coverage_crs() {
    let request = GetCoverageRequest::new("mean_summer_airtemp")
        .with_subset(DimensionSubset::trim("x", "10", "30").with_crs(EPSG_4326));
    let xml = handle(&request).unwrap();

    assert!(xml.contains("<gml:low>2 0</gml:low>"));
    assert!(xml.contains("<gml:lowerCorner>10 0</gml:lowerCorner>"));
}

#[test]
fn test_slice_drops_axis() {
    let request = GetCoverageRequest::new("mean_summer_airtemp")
        .with_subset(DimensionSubset::slice("y", "3"));
    let xml = handle(&request).unwrap();

    assert!(xml.contains("<gml:RectifiedGrid dimension=\"1\""));
    assert!(xml.contains("<gml:axisLabels>x</gml:axisLabels>"));
    assert!(!xml.contains(">0 5</gml:offsetVector>"));
}

#[test]
fn test_compound_srs_name_is_escaped() {
    let mut def = airtemp_def("mixed");
    def.domain[1].crs_set = vec!["http://www.opengis.net/def/crs/OGC/0/Index1D".to_string()];
    let source = InMemoryMetadataSource::from_defs(&[def]).unwrap();

    let xml = handle_with(&source, &GetCoverageRequest::new("mixed")).unwrap();
    assert!(xml.contains(
        "srsName=\"http://www.opengis.net/def/crs-compound?1=http://www.opengis.net/def/crs/EPSG/0/4326&amp;2=http://www.opengis.net/def/crs/OGC/0/Index1D\""
    ));
    assert!(!xml.contains("4326&2="));
}

#[test]
fn test_rectified_grid_without_bbox_omits_origin() {
    let mut def = airtemp_def("no_bbox");
    def.bbox = None;
    let source = InMemoryMetadataSource::from_defs(&[def]).unwrap();

    let xml = handle_with(&source, &GetCoverageRequest::new("no_bbox")).unwrap();
    assert!(!xml.contains("<gml:origin>"));
    assert!(!xml.contains("gml:offsetVector"));
    assert!(xml.contains("<gml:tupleList>"));
}

#[test]
fn test_metadata_block() {
    let mut def = airtemp_def("annotated");
    def.metadata = Some("<source>reanalysis</source>".to_string());
    let source = InMemoryMetadataSource::from_defs(&[def]).unwrap();

    let xml = handle_with(&source, &GetCoverageRequest::new("annotated")).unwrap();
    assert!(xml.contains("<gmlcov:metadata><source>reanalysis</source></gmlcov:metadata>"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unsupported_subtype() {
    let mut def = airtemp_def("surface");
    def.coverage_type = "TriangulatedSurfaceCoverage".to_string();
    let source = InMemoryMetadataSource::from_defs(&[def]).unwrap();

    let err = handle_with(&source, &GetCoverageRequest::new("surface")).unwrap_err();
    assert!(matches!(err, WcpsError::UnsupportedCoverageConfiguration(_)));
}

#[test]
fn test_rotated_grid_rejected() {
    let mut def = airtemp_def("rotated");
    def.offset_vectors = Some(vec![vec![5.0, 1.0], vec![0.0, 5.0]]);
    let source = InMemoryMetadataSource::from_defs(&[def]).unwrap();

    let err = handle_with(&source, &GetCoverageRequest::new("rotated")).unwrap_err();
    assert!(matches!(err, WcpsError::UnsupportedCoverageConfiguration(_)));
}

#[test]
fn test_unknown_coverage_report() {
    let err = handle(&GetCoverageRequest::new("does_not_exist")).unwrap_err();
    assert!(matches!(err, WcpsError::NoApplicableCode { .. }));

    let response = exception_response(&BuiltinTemplates::new(), &err);
    assert_eq!(response.status, 404);
    let xml = response.xml;
    assert!(xml.contains("exceptionCode=\"NoApplicableCode\""));
    assert!(xml.contains("locator=\"does_not_exist\""));
}

#[test]
fn test_subset_in_unknown_crs() {
    let request = GetCoverageRequest::new("mean_summer_airtemp").with_subset(
        DimensionSubset::trim("x", "0", "10").with_crs("http://www.opengis.net/def/crs/EPSG/0/3857"),
    );
    let err = handle(&request).unwrap_err();
    assert!(err.is_unimplemented());
}

// ============================================================================
// Multipoint coverages
// ============================================================================

#[test]
fn test_multipoint_all_points() {
    let xml = handle(&GetCoverageRequest::new("pointcloud")).unwrap();

    assert!(xml.contains("<gmlcov:MultiPointCoverage "));
    assert!(xml.contains("<gml:MultiPoint gml:id=\"multipoint_pointcloud-grid\""));
    assert_eq!(xml.matches("<gml:Point ").count(), 3);
    assert!(xml.contains("<gml:lowerCorner>0 0</gml:lowerCorner>"));
    assert!(xml.contains("axisLabels=\"x y\""));
    assert!(!xml.contains('{'));
}

#[test]
fn test_multipoint_trim_selects_points() {
    let request = GetCoverageRequest::new("pointcloud")
        .with_subset(DimensionSubset::trim("x", "0", "50"))
        .with_subset(DimensionSubset::trim("y", "0", "50"));
    let xml = handle(&request).unwrap();

    assert_eq!(xml.matches("<gml:Point ").count(), 1);
    assert!(xml.contains("<gml:pos>10 10</gml:pos>"));
    assert!(xml.contains("<gml:upperCorner>50 50</gml:upperCorner>"));
}

// ============================================================================
// Capabilities
// ============================================================================

#[test]
fn test_capabilities_contents() {
    let source = sample_source();
    let xml = WcsCapabilitiesBuilder::from_source(&source, &ResponseConfig::default()).build();
    for id in source.coverage_ids() {
        assert!(xml.contains(&format!("<wcs:CoverageId>{}</wcs:CoverageId>", id)));
    }
}
