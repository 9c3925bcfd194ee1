//! WCS 2.0 GetCapabilities document.

use quick_xml::escape::{escape, partial_escape};
use tracing::warn;

use wcps_common::MetadataSource;

use crate::config::ResponseConfig;

/// One entry of the capabilities `Contents` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageSummary {
    pub coverage_id: String,
    pub coverage_subtype: String,
}

/// Generate a WCS Capabilities XML document.
pub struct WcsCapabilitiesBuilder {
    pub service_title: String,
    pub service_abstract: String,
    pub service_url: String,
    pub formats: Vec<String>,
    pub coverages: Vec<CoverageSummary>,
}

impl WcsCapabilitiesBuilder {
    /// Summaries of every coverage the source knows about.
    ///
    /// Coverages whose metadata fails to load are left out.
    pub fn from_source(source: &dyn MetadataSource, config: &ResponseConfig) -> Self {
        let mut coverages = Vec::new();
        for id in source.coverage_ids() {
            match source.read(&id) {
                Ok(coverage) => coverages.push(CoverageSummary {
                    coverage_id: coverage.coverage_name.clone(),
                    coverage_subtype: coverage.coverage_type.label().to_string(),
                }),
                Err(e) => warn!(coverage = %id, error = %e, "skipping coverage in capabilities"),
            }
        }

        Self {
            service_title: "WCPS".to_string(),
            service_abstract: "Web Coverage Processing Service".to_string(),
            service_url: config.service_url.clone(),
            formats: vec![
                "application/gml+xml".to_string(),
                "text/csv".to_string(),
                "image/tiff".to_string(),
            ],
            coverages,
        }
    }

    pub fn build(&self) -> String {
        let mut xml = String::new();

        xml.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<wcs:Capabilities xmlns:wcs="http://www.opengis.net/wcs/2.0"
    xmlns:ows="http://www.opengis.net/ows/2.0"
    xmlns:xlink="http://www.w3.org/1999/xlink"
    version="2.0.1">
"#,
        );

        xml.push_str(&format!(
            r#"  <ows:ServiceIdentification>
    <ows:Title>{}</ows:Title>
    <ows:Abstract>{}</ows:Abstract>
    <ows:ServiceType>OGC WCS</ows:ServiceType>
    <ows:ServiceTypeVersion>2.0.1</ows:ServiceTypeVersion>
  </ows:ServiceIdentification>
"#,
            partial_escape(self.service_title.as_str()),
            partial_escape(self.service_abstract.as_str())
        ));

        xml.push_str("  <ows:OperationsMetadata>\n");
        for op in ["GetCapabilities", "DescribeCoverage", "GetCoverage", "ProcessCoverages"] {
            xml.push_str(&format!(
                r#"    <ows:Operation name="{}">
      <ows:DCP><ows:HTTP><ows:Get xlink:href="{}?"/><ows:Post xlink:href="{}"/></ows:HTTP></ows:DCP>
    </ows:Operation>
"#,
                op,
                escape(self.service_url.as_str()),
                escape(self.service_url.as_str())
            ));
        }
        xml.push_str("  </ows:OperationsMetadata>\n");

        xml.push_str("  <wcs:ServiceMetadata>\n");
        for format in &self.formats {
            xml.push_str(&format!(
                "    <wcs:formatSupported>{}</wcs:formatSupported>\n",
                partial_escape(format.as_str())
            ));
        }
        xml.push_str("  </wcs:ServiceMetadata>\n");

        xml.push_str("  <wcs:Contents>\n");
        for summary in &self.coverages {
            xml.push_str(&format!(
                r#"    <wcs:CoverageSummary>
      <wcs:CoverageId>{}</wcs:CoverageId>
      <wcs:CoverageSubtype>{}</wcs:CoverageSubtype>
    </wcs:CoverageSummary>
"#,
                partial_escape(summary.coverage_id.as_str()),
                partial_escape(summary.coverage_subtype.as_str())
            ));
        }
        xml.push_str("  </wcs:Contents>\n");

        xml.push_str("</wcs:Capabilities>\n");
        xml
    }
}
