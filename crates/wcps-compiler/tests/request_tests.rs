//! ProcessCoverages request compilation and switch expressions.

use test_utils::{sample_source, wcps};
use wcps_common::{WcpsError, WcpsResult};
use wcps_compiler::{CompiledQuery, CompilerConfig, WcpsCompiler};

const SUMMER: &[&str] = &["mean_summer_airtemp"];

fn compile(iterators: &[(&str, &[&str])], ret: &str) -> WcpsResult<Vec<CompiledQuery>> {
    let source = sample_source();
    let compiler = WcpsCompiler::new(&source, CompilerConfig::default());
    compiler.compile(&wcps::process_coverages(iterators, ret))
}

fn compile_one(ret: &str) -> WcpsResult<String> {
    let mut queries = compile(&[("c", SUMMER)], ret)?;
    assert_eq!(queries.len(), 1);
    Ok(queries.remove(0).rasql)
}

// ============================================================================
// Requests
// ============================================================================

#[test]
fn test_encode_request() {
    let queries = compile(&[("c", SUMMER)], &wcps::encode(&wcps::coverage("c"), "png")).unwrap();
    assert_eq!(queries.len(), 1);
    assert_eq!(
        queries[0].rasql,
        "select encode(c, \"png\") from mean_summer_airtemp as c"
    );
    assert_eq!(queries[0].format.as_deref(), Some("png"));
    assert!(!queries[0].store);
    assert_eq!(
        queries[0].info.as_ref().map(|i| i.coverage_name.as_str()),
        Some("mean_summer_airtemp")
    );
}

#[test]
fn test_csv_encoding() {
    let rasql = compile_one(&wcps::encode(&wcps::coverage("c"), "csv")).unwrap();
    assert_eq!(rasql, "select csv(c) from mean_summer_airtemp as c");
}

#[test]
fn test_encode_extra_parameters() {
    let ret = "<encode store=\"true\"><coverage>c</coverage><format>tiff</format>\
               <extraParameters>nodata=0</extraParameters></encode>";
    let queries = compile(&[("c", SUMMER)], ret).unwrap();
    assert_eq!(
        queries[0].rasql,
        "select encode(c, \"tiff\", \"nodata=0\") from mean_summer_airtemp as c"
    );
    assert!(queries[0].store);
}

#[test]
fn test_missing_format_uses_default() {
    let ret = "<encode><coverage>c</coverage></encode>";
    assert_eq!(
        compile_one(ret).unwrap(),
        "select csv(c) from mean_summer_airtemp as c"
    );
}

#[test]
fn test_scalar_return() {
    let ret = wcps::el("count", &wcps::coverage("c"));
    let queries = compile(&[("c", SUMMER)], &ret).unwrap();
    assert_eq!(
        queries[0].rasql,
        "select count_cells(c) from mean_summer_airtemp as c"
    );
    assert!(queries[0].format.is_none());
    assert!(queries[0].info.is_none());
}

#[test]
fn test_where_clause() {
    let condition = wcps::binary(
        "booleanGreaterThan",
        &wcps::el("avg", &wcps::coverage("c")),
        &wcps::number("0"),
    );
    let xml = wcps::process_coverages_where(
        &[("c", SUMMER)],
        Some(&condition),
        &wcps::encode(&wcps::coverage("c"), "png"),
    );
    let source = sample_source();
    let queries = WcpsCompiler::new(&source, CompilerConfig::default())
        .compile(&xml)
        .unwrap();
    assert_eq!(
        queries[0].rasql,
        "select encode(c, \"png\") from mean_summer_airtemp as c where (avg_cells(c) > 0)"
    );
}

#[test]
fn test_one_query_per_coverage_combination() {
    let queries = compile(
        &[
            ("c", &["mean_summer_airtemp", "mean_winter_airtemp"]),
            ("r", &["rgb"]),
        ],
        &wcps::encode(&wcps::coverage("c"), "png"),
    )
    .unwrap();
    let rasql: Vec<&str> = queries.iter().map(|q| q.rasql.as_str()).collect();
    assert_eq!(
        rasql,
        vec![
            "select encode(c, \"png\") from mean_summer_airtemp as c, rgb as r",
            "select encode(c, \"png\") from mean_winter_airtemp as c, rgb as r",
        ]
    );
}

#[test]
fn test_incompatible_coverages_in_one_iterator() {
    let result = compile(
        &[("c", &["mean_summer_airtemp", "rgb"])],
        &wcps::encode(&wcps::coverage("c"), "png"),
    );
    assert!(matches!(result, Err(WcpsError::IncompatibleCoverages(_))));
}

#[test]
fn test_unknown_coverage() {
    let result = compile(&[("c", &["missing"])], &wcps::encode(&wcps::coverage("c"), "png"));
    match result {
        Err(WcpsError::NoApplicableCode { coverage_id }) => assert_eq!(coverage_id, "missing"),
        other => panic!("expected NoApplicableCode, got {:?}", other),
    }
}

#[test]
fn test_malformed_xml() {
    let source = sample_source();
    let compiler = WcpsCompiler::new(&source, CompilerConfig::default());
    assert!(matches!(
        compiler.compile("<ProcessCoveragesRequest><query>"),
        Err(WcpsError::InvalidXml(_))
    ));
}

#[test]
fn test_request_without_iterators() {
    let source = sample_source();
    let compiler = WcpsCompiler::new(&source, CompilerConfig::default());
    let xml = "<xmlSyntax><return><numericConstant>1</numericConstant></return></xmlSyntax>";
    assert!(matches!(
        compiler.compile(xml),
        Err(WcpsError::InvalidParameter { .. })
    ));
}

// ============================================================================
// Switch
// ============================================================================

fn case(condition: &str, result: &str) -> String {
    wcps::el(
        "case",
        &format!(
            "{}{}",
            wcps::el("condition", condition),
            wcps::el("result", result)
        ),
    )
}

fn default(result: &str) -> String {
    wcps::el("default", &wcps::el("result", result))
}

#[test]
fn test_switch_two_cases_and_default() {
    let below = wcps::binary("lessThan", &wcps::coverage("c"), &wcps::number("0"));
    let above = wcps::binary("greaterThan", &wcps::coverage("c"), &wcps::number("100"));
    let switch = wcps::el(
        "switch",
        &format!(
            "{}{}{}",
            case(&below, &wcps::coverage("c")),
            case(&above, &wcps::binary("mult", &wcps::coverage("c"), &wcps::number("2"))),
            default(&wcps::coverage("c"))
        ),
    );
    let rasql = compile_one(&wcps::encode(&switch, "csv")).unwrap();
    assert_eq!(
        rasql,
        "select csv(case when (c < 0) then c when (c > 100) then (c * 2) else c end) \
         from mean_summer_airtemp as c"
    );
}

#[test]
fn test_switch_missing_default() {
    let below = wcps::binary("lessThan", &wcps::coverage("c"), &wcps::number("0"));
    let switch = wcps::el("switch", &case(&below, &wcps::coverage("c")));
    assert!(matches!(
        compile_one(&wcps::encode(&switch, "csv")),
        Err(WcpsError::MissingSwitchDefault)
    ));
}

#[test]
fn test_switch_condition_outside_case() {
    let switch = wcps::el(
        "switch",
        &format!(
            "{}{}",
            wcps::el("condition", &wcps::coverage("c")),
            default(&wcps::coverage("c"))
        ),
    );
    match compile_one(&wcps::encode(&switch, "csv")) {
        Err(WcpsError::UnexpectedNode { node }) => assert_eq!(node, "condition"),
        other => panic!("expected UnexpectedNode, got {:?}", other),
    }
}

#[test]
fn test_switch_branches_must_be_compatible() {
    let below = wcps::binary("lessThan", &wcps::coverage("c"), &wcps::number("0"));
    let switch = wcps::el(
        "switch",
        &format!(
            "{}{}",
            case(&below, &wcps::coverage("t")),
            default(&wcps::coverage("c"))
        ),
    );
    let result = compile(
        &[("c", SUMMER), ("t", &["tiny"])],
        &wcps::encode(&switch, "csv"),
    );
    assert!(matches!(result, Err(WcpsError::IncompatibleCoverages(_))));
}
