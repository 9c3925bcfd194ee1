//! Tests for DomainElement construction, resolution and copying.

use bigdecimal::BigDecimal;
use wcps_common::{AxisType, DomainElement, DomainElementDef, WcpsError, GRID_CRS};

fn numeric(name: &str, axis_type: &str, lo: f64, hi: f64) -> DomainElementDef {
    DomainElementDef {
        name: name.to_string(),
        axis_type: axis_type.to_string(),
        num_lo: Some(lo),
        num_hi: Some(hi),
        ..Default::default()
    }
}

fn textual(name: &str, axis_type: &str, lo: &str, hi: &str) -> DomainElementDef {
    DomainElementDef {
        name: name.to_string(),
        axis_type: axis_type.to_string(),
        str_lo: Some(lo.to_string()),
        str_hi: Some(hi.to_string()),
        ..Default::default()
    }
}

fn is_invalid_metadata<T: std::fmt::Debug>(result: Result<T, WcpsError>) -> bool {
    matches!(result, Err(WcpsError::InvalidMetadata { .. }))
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_spatial_bounds_round_trip() {
    let cases = [(0.0, 0.0), (-180.0, 180.0), (-0.125, 1e9), (12.345678, 12.345679)];
    for (lo, hi) in cases {
        let dom = DomainElement::try_from(&numeric("x", "x", lo, hi)).unwrap();
        assert_eq!(dom.num_lo(), Some(lo));
        assert_eq!(dom.num_hi(), Some(hi));
        assert_eq!(dom.axis_type(), AxisType::X);
    }
}

#[test]
fn test_inverted_bounds_fail_for_every_axis_type() {
    for axis_type in ["x", "y", "t", "other"] {
        let result = DomainElement::try_from(&numeric("a", axis_type, 10.0, 0.0));
        assert!(is_invalid_metadata(result), "axis type {}", axis_type);
    }
}

#[test]
fn test_empty_name_or_type() {
    assert!(is_invalid_metadata(DomainElement::try_from(&numeric(
        "", "x", 0.0, 1.0
    ))));
    assert!(is_invalid_metadata(DomainElement::try_from(&numeric(
        "x", "", 0.0, 1.0
    ))));
}

#[test]
fn test_type_outside_allowed_set() {
    let def = numeric("t", "t", 0.0, 1.0);
    let result = DomainElement::new(&def, &[AxisType::X, AxisType::Y]);
    match result {
        Err(WcpsError::InvalidMetadata { locator, message }) => {
            assert_eq!(locator, "t");
            assert!(message.contains("x, y"));
        }
        other => panic!("expected InvalidMetadata, got {:?}", other),
    }
    assert!(is_invalid_metadata(DomainElement::try_from(&numeric(
        "z", "elevation", 0.0, 1.0
    ))));
}

#[test]
fn test_spatial_axis_requires_numeric_bounds() {
    let def = textual("x", "x", "a", "b");
    assert!(is_invalid_metadata(DomainElement::try_from(&def)));
}

#[test]
fn test_time_axis_requires_numeric_bounds() {
    let def = textual("ansi", "t", "2010-01-01T00:00:00Z", "2010-12-31T00:00:00Z");
    assert!(is_invalid_metadata(DomainElement::try_from(&def)));
}

#[test]
fn test_time_axis_may_carry_both_pairs() {
    let def = DomainElementDef {
        num_lo: Some(0.0),
        num_hi: Some(364.0),
        ..textual("ansi", "t", "2010-01-01T00:00:00Z", "2010-12-31T00:00:00Z")
    };
    let dom = DomainElement::try_from(&def).unwrap();
    assert_eq!(dom.num_hi(), Some(364.0));
    assert_eq!(dom.str_lo(), Some("2010-01-01T00:00:00Z"));
}

#[test]
fn test_time_axis_textual_order_checked() {
    let def = DomainElementDef {
        num_lo: Some(0.0),
        num_hi: Some(1.0),
        ..textual("ansi", "t", "2011-01-01T00:00:00Z", "2010-01-01T00:00:00Z")
    };
    assert!(is_invalid_metadata(DomainElement::try_from(&def)));
}

#[test]
fn test_other_axis_textual_only() {
    let dom = DomainElement::try_from(&textual("band", "other", "red", "blue")).unwrap();
    assert_eq!(dom.num_lo(), None);
    assert_eq!(dom.str_hi(), Some("blue"));
}

#[test]
fn test_other_axis_with_both_pairs_fails() {
    let def = DomainElementDef {
        num_lo: Some(0.0),
        num_hi: Some(1.0),
        ..textual("band", "other", "red", "blue")
    };
    assert!(is_invalid_metadata(DomainElement::try_from(&def)));
}

#[test]
fn test_half_numeric_pair_fails() {
    let def = DomainElementDef {
        num_hi: None,
        ..numeric("band", "other", 0.0, 1.0)
    };
    assert!(is_invalid_metadata(DomainElement::try_from(&def)));
}

// ============================================================================
// CRS handling
// ============================================================================

#[test]
fn test_crs_set_normalized_without_touching_input() {
    let def = DomainElementDef {
        crs_set: vec!["http://www.opengis.net/def/crs/EPSG/0/4326".to_string()],
        ..numeric("Lat", "y", -90.0, 90.0)
    };
    let dom = DomainElement::try_from(&def).unwrap();

    assert_eq!(def.crs_set.len(), 1);
    assert_eq!(dom.crs_set().len(), 2);
    assert!(dom.crs_set().iter().any(|c| c == GRID_CRS));
    assert_eq!(
        dom.external_crs(),
        Some("http://www.opengis.net/def/crs/EPSG/0/4326")
    );
}

#[test]
fn test_grid_only_axis_has_no_external_crs() {
    let dom = DomainElement::try_from(&numeric("i", "x", 0.0, 10.0)).unwrap();
    assert_eq!(dom.crs_set(), &[GRID_CRS.to_string()]);
    assert_eq!(dom.external_crs(), None);
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_resolution_example() {
    let mut dom = DomainElement::try_from(&numeric("x", "x", 0.0, 10.0)).unwrap();
    dom.set_resolution(3).unwrap();
    assert_eq!(dom.resolution(), &BigDecimal::from(4));
}

#[test]
fn test_resolution_never_underestimates() {
    let extents = [(0.0, 10.0), (-180.0, 180.0), (0.1, 0.7), (-3.25, 17.5)];
    for (lo, hi) in extents {
        let mut previous: Option<BigDecimal> = None;
        for grid_dimension in 1..=50u64 {
            let mut dom = DomainElement::try_from(&numeric("x", "x", lo, hi)).unwrap();
            dom.set_resolution(grid_dimension).unwrap();
            let res = dom.resolution().clone();

            let extent: BigDecimal = hi.to_string().parse::<BigDecimal>().unwrap()
                - lo.to_string().parse::<BigDecimal>().unwrap();
            assert!(
                res.clone() * BigDecimal::from(grid_dimension) >= extent,
                "{}..{} / {}",
                lo,
                hi,
                grid_dimension
            );
            if let Some(prev) = previous {
                assert!(res <= prev, "resolution increased at {}", grid_dimension);
            }
            previous = Some(res);
        }
    }
}

#[test]
fn test_resolution_requires_numeric_bounds() {
    let mut dom = DomainElement::try_from(&textual("band", "other", "a", "b")).unwrap();
    assert!(dom.set_resolution(2).is_err());
}

// ============================================================================
// Copy and equality
// ============================================================================

#[test]
fn test_clone_is_independent() {
    let def = DomainElementDef {
        crs_set: vec!["EPSG:4326".to_string()],
        ..numeric("x", "x", 0.0, 10.0)
    };
    let original = DomainElement::try_from(&def).unwrap();
    let copy = original.with_crs_set(["EPSG:3857"]);

    assert_eq!(original, copy);
    assert_eq!(original.external_crs(), Some("EPSG:4326"));
    assert_eq!(copy.external_crs(), Some("EPSG:3857"));

    let mut resized = original.clone();
    resized.set_resolution(5).unwrap();
    assert_eq!(original.resolution(), &BigDecimal::from(1));
    assert_eq!(resized.resolution(), &BigDecimal::from(2));
}

#[test]
fn test_equality_on_textual_bounds() {
    let a = DomainElement::try_from(&textual("band", "other", "a", "b")).unwrap();
    let b = DomainElement::try_from(&textual("band", "other", "a", "c")).unwrap();
    let c = DomainElement::try_from(&textual("band", "other", "a", "b")).unwrap();
    assert_ne!(a, b);
    assert_eq!(a, c);
}
