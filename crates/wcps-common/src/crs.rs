//! Coordinate Reference System identifiers and helpers.
//!
//! Every coverage axis carries the internal grid CRS (its own pixel/index
//! space) and optionally one external geographic or projected CRS, given as
//! an OGC resolver URI (e.g. `http://www.opengis.net/def/crs/EPSG/0/4326`).

/// Identifier of the internal grid CRS.
pub const GRID_CRS: &str = "CRS:1";

/// Base URI of the OGC compound CRS resolver.
pub const COMPOUND_CRS_PREFIX: &str = "http://www.opengis.net/def/crs-compound?";

/// Check if a CRS identifier names the internal grid CRS.
pub fn is_grid_crs(crs: &str) -> bool {
    crs.trim().eq_ignore_ascii_case(GRID_CRS)
}

/// Return a new CRS list that contains `crs_set` in order, without duplicates,
/// and always includes the grid CRS.
pub fn normalize_crs_set<I, S>(crs_set: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for crs in crs_set {
        let crs = crs.as_ref().trim();
        if crs.is_empty() || out.iter().any(|c| c == crs) {
            continue;
        }
        out.push(crs.to_string());
    }
    if !out.iter().any(|c| is_grid_crs(c)) {
        out.push(GRID_CRS.to_string());
    }
    out
}

/// Build a compound CRS URI from an ordered list of single CRS URIs.
///
/// A single CRS is returned unchanged. Multiple CRSs become
/// `http://www.opengis.net/def/crs-compound?1=<crs1>&2=<crs2>...`.
/// The result is raw: callers embedding it in XML must escape `&`.
pub fn compound_crs_uri<S: AsRef<str>>(crss: &[S]) -> String {
    match crss {
        [] => GRID_CRS.to_string(),
        [single] => single.as_ref().to_string(),
        many => {
            let parts: Vec<String> = many
                .iter()
                .enumerate()
                .map(|(i, crs)| format!("{}={}", i + 1, crs.as_ref()))
                .collect();
            format!("{}{}", COMPOUND_CRS_PREFIX, parts.join("&"))
        }
    }
}

/// Split a compound CRS URI back into its components.
pub fn split_compound_crs_uri(uri: &str) -> Vec<String> {
    match uri.strip_prefix(COMPOUND_CRS_PREFIX) {
        Some(query) => query
            .split('&')
            .filter_map(|part| part.split_once('=').map(|(_, crs)| crs.to_string()))
            .collect(),
        None => vec![uri.to_string()],
    }
}

/// Escape the characters of a CRS URI that are not allowed in XML attributes.
pub fn xml_escape_uri(uri: &str) -> String {
    uri.replace('&', "&amp;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_grid_crs() {
        let crss = normalize_crs_set(["http://www.opengis.net/def/crs/EPSG/0/4326"]);
        assert_eq!(crss.len(), 2);
        assert_eq!(crss[1], GRID_CRS);

        let crss = normalize_crs_set(Vec::<String>::new());
        assert_eq!(crss, vec![GRID_CRS.to_string()]);
    }

    #[test]
    fn test_normalize_removes_duplicates() {
        let crss = normalize_crs_set(["CRS:1", "EPSG:4326", "EPSG:4326"]);
        assert_eq!(crss, vec!["CRS:1".to_string(), "EPSG:4326".to_string()]);
    }

    #[test]
    fn test_compound_uri() {
        let single = compound_crs_uri(&["EPSG:4326"]);
        assert_eq!(single, "EPSG:4326");

        let compound = compound_crs_uri(&["EPSG:4326", "OGC:AnsiDate"]);
        assert_eq!(
            compound,
            "http://www.opengis.net/def/crs-compound?1=EPSG:4326&2=OGC:AnsiDate"
        );
        assert_eq!(
            split_compound_crs_uri(&compound),
            vec!["EPSG:4326".to_string(), "OGC:AnsiDate".to_string()]
        );
        assert!(xml_escape_uri(&compound).contains("&amp;2="));
    }
}
