//! Conversions between array-engine result text and GML value lists.

use tracing::warn;

use wcps_common::{WcpsError, WcpsResult};

/// Turn CSV-encoded result cells into a GML tuple list.
///
/// Band braces and quotes are dropped; nothing else changes:
/// `{1 2, 3 4},{5 6, 7 8}` becomes `1 2, 3 4,5 6, 7 8`.
pub fn csv_to_tuple_list(csv: &str) -> String {
    csv.chars().filter(|c| !matches!(c, '{' | '}' | '"')).collect()
}

/// Wrap a tuple list in a GML `DataBlock`.
pub fn data_block(tuple_list: &str) -> String {
    format!(
        "<gml:DataBlock><gml:rangeParameters/><gml:tupleList>{}</gml:tupleList></gml:DataBlock>",
        tuple_list
    )
}

/// Lower and upper grid bounds covering every interval list of a spatial
/// domain string such as `[0:9,0:19][2:5,1:30]`.
///
/// Returns per-dimension minimum lows and maximum highs, space separated.
pub fn sdom_to_bounds(sdom: &str) -> WcpsResult<(String, String)> {
    let trimmed = sdom.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return Err(WcpsError::invalid_parameter(
            "sdom",
            format!("'{}' is not a spatial domain", sdom),
        ));
    }

    let mut lows: Vec<f64> = Vec::new();
    let mut highs: Vec<f64> = Vec::new();
    for domain in trimmed[1..trimmed.len() - 1].split("][") {
        for (i, interval) in domain.split(',').enumerate() {
            let Some((lo, hi)) = interval.split_once(':') else {
                return Err(WcpsError::invalid_parameter(
                    "sdom",
                    format!("'{}' is not an interval", interval),
                ));
            };
            if lows.len() <= i {
                lows.push(f64::INFINITY);
                highs.push(f64::NEG_INFINITY);
            }
            match (lo.trim().parse::<f64>(), hi.trim().parse::<f64>()) {
                (Ok(lo), Ok(hi)) => {
                    lows[i] = lows[i].min(lo);
                    highs[i] = highs[i].max(hi);
                }
                _ => warn!(interval, "skipping non-numeric spatial domain interval"),
            }
        }
    }

    Ok((join_numbers(&lows), join_numbers(&highs)))
}

fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Allowed value interval of an array-engine base type.
pub fn datatype_interval(datatype: &str) -> Option<(String, String)> {
    let (lo, hi) = match datatype.trim() {
        "boolean" => ("0".to_string(), "1".to_string()),
        "char" => ("-128".to_string(), "128".to_string()),
        "unsigned char" => ("0".to_string(), "255".to_string()),
        "short" => (i16::MIN.to_string(), i16::MAX.to_string()),
        "unsigned short" => ("0".to_string(), u16::MAX.to_string()),
        "int" => (i32::MIN.to_string(), i32::MAX.to_string()),
        "unsigned int" => ("0".to_string(), u32::MAX.to_string()),
        "long" => (i64::MIN.to_string(), i64::MAX.to_string()),
        "unsigned long" => ("0".to_string(), u64::MAX.to_string()),
        "float" => ((-f32::MAX).to_string(), f32::MAX.to_string()),
        "double" => ((-f64::MAX).to_string(), f64::MAX.to_string()),
        _ => return None,
    };
    Some((lo, hi))
}
