//! Metadata source boundary.
//!
//! The persistent metadata store lives outside this workspace; everything
//! here talks to it through [`MetadataSource`]. [`InMemoryMetadataSource`]
//! backs tests and the command line tool.

use std::collections::BTreeMap;

use tracing::debug;

use crate::cell_domain::CellDomainElement;
use crate::crs::xml_escape_uri;
use crate::error::{WcpsError, WcpsResult};
use crate::metadata::{CoverageMetadata, CoverageMetadataDef};

/// Read access to coverage metadata.
pub trait MetadataSource: Send + Sync {
    /// Metadata of one coverage; unknown ids fail with `NoApplicableCode`.
    fn read(&self, coverage_id: &str) -> WcpsResult<CoverageMetadata>;

    /// Ids of all coverages known to the source.
    fn coverage_ids(&self) -> Vec<String>;

    /// Serialized GML point members of a multipoint coverage restricted to
    /// `cell_domains`.
    fn coverage_data(
        &self,
        schema: &str,
        coverage_id: &str,
        requested_id: &str,
        cell_domains: &[CellDomainElement],
    ) -> WcpsResult<String>;
}

/// One point of a multipoint coverage.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PointRecord {
    pub position: Vec<f64>,
    pub values: Vec<String>,
}

/// Metadata source holding validated coverages in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMetadataSource {
    coverages: BTreeMap<String, CoverageMetadata>,
    points: BTreeMap<String, Vec<PointRecord>>,
}

impl InMemoryMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register every definition.
    pub fn from_defs(defs: &[CoverageMetadataDef]) -> WcpsResult<Self> {
        let mut source = Self::new();
        for def in defs {
            source.insert(CoverageMetadata::from_def(def)?);
        }
        Ok(source)
    }

    pub fn insert(&mut self, coverage: CoverageMetadata) {
        self.coverages
            .insert(coverage.coverage_name.clone(), coverage);
    }

    /// Attach point data to a multipoint coverage.
    pub fn insert_points(&mut self, coverage_id: impl Into<String>, points: Vec<PointRecord>) {
        self.points.insert(coverage_id.into(), points);
    }
}

impl MetadataSource for InMemoryMetadataSource {
    fn read(&self, coverage_id: &str) -> WcpsResult<CoverageMetadata> {
        self.coverages
            .get(coverage_id)
            .cloned()
            .ok_or_else(|| WcpsError::NoApplicableCode {
                coverage_id: coverage_id.to_string(),
            })
    }

    fn coverage_ids(&self) -> Vec<String> {
        self.coverages.keys().cloned().collect()
    }

    fn coverage_data(
        &self,
        schema: &str,
        coverage_id: &str,
        requested_id: &str,
        cell_domains: &[CellDomainElement],
    ) -> WcpsResult<String> {
        let coverage = self.read(coverage_id)?;
        let srs_name = xml_escape_uri(&crate::crs::compound_crs_uri(&coverage.external_crs_list()));
        let points = self.points.get(coverage_id).map(Vec::as_slice).unwrap_or(&[]);

        let mut members = String::new();
        let mut matched = 0usize;
        for (i, point) in points.iter().enumerate() {
            if !point_in_cells(&point.position, cell_domains) {
                continue;
            }
            matched += 1;
            let pos = point
                .position
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            members.push_str(&format!(
                "<gml:Point gml:id=\"{}-p{}\" srsName=\"{}\"><gml:pos>{}</gml:pos></gml:Point>\n",
                requested_id, i, srs_name, pos
            ));
        }
        debug!(schema, coverage = coverage_id, points = matched, "selected multipoint members");
        Ok(members)
    }
}

fn point_in_cells(position: &[f64], cell_domains: &[CellDomainElement]) -> bool {
    use num_traits::ToPrimitive;

    position.iter().zip(cell_domains).all(|(v, cell)| {
        match (cell.lo().to_f64(), cell.hi().to_f64()) {
            (Some(lo), Some(hi)) => *v >= lo && *v <= hi,
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::CellDomainDef;
    use crate::DomainElementDef;
    use num_bigint::BigInt;

    fn points_coverage() -> CoverageMetadataDef {
        CoverageMetadataDef {
            coverage_name: "pts".to_string(),
            coverage_type: "MultiPointCoverage".to_string(),
            domain: vec![DomainElementDef {
                name: "x".to_string(),
                axis_type: "x".to_string(),
                num_lo: Some(0.0),
                num_hi: Some(10.0),
                ..Default::default()
            }],
            cell_domain: vec![CellDomainDef {
                lo: Some(0),
                hi: Some(10),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_coverage() {
        let source = InMemoryMetadataSource::new();
        match source.read("nope") {
            Err(WcpsError::NoApplicableCode { coverage_id }) => assert_eq!(coverage_id, "nope"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_point_members_filtered_by_cells() {
        let mut source = InMemoryMetadataSource::from_defs(&[points_coverage()]).unwrap();
        source.insert_points(
            "pts",
            vec![
                PointRecord {
                    position: vec![1.0],
                    values: vec!["7".to_string()],
                },
                PointRecord {
                    position: vec![8.0],
                    values: vec!["9".to_string()],
                },
            ],
        );
        let cells = vec![CellDomainElement::new(BigInt::from(0), BigInt::from(5)).unwrap()];
        let data = source.coverage_data("ps_multipoint", "pts", "pts", &cells).unwrap();
        assert!(data.contains("<gml:pos>1</gml:pos>"));
        assert!(!data.contains("<gml:pos>8</gml:pos>"));
        assert_eq!(source.coverage_ids(), vec!["pts".to_string()]);
    }
}
