//! OWS exception reports.

use quick_xml::escape::{escape, partial_escape};

use wcps_common::WcpsError;

use crate::getcoverage::Response;
use crate::request::MIME_XML;
use crate::templates::{BuiltinTemplates, TemplateId, TemplateRenderer};

/// Render `err` as an OWS 2.0 `ExceptionReport`.
pub fn exception_report(renderer: &dyn TemplateRenderer, err: &WcpsError) -> String {
    let locator = err
        .locator()
        .map(|l| format!(" locator=\"{}\"", escape(l)))
        .unwrap_or_default();
    let text = partial_escape(&err.to_string()).into_owned();
    let values = [
        ("exceptionCode", err.exception_code()),
        ("locator", locator.as_str()),
        ("exceptionText", text.as_str()),
    ];

    match renderer.render(TemplateId::ExceptionReport, &values) {
        Ok(xml) => xml,
        // fall back to the built-in report
        Err(_) => BuiltinTemplates::new()
            .render(TemplateId::ExceptionReport, &values)
            .unwrap_or(text),
    }
}

/// Exception report response with the error's HTTP status.
pub fn exception_response(renderer: &dyn TemplateRenderer, err: &WcpsError) -> Response {
    Response::xml(MIME_XML, exception_report(renderer, err)).with_status(err.http_status_code())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_carries_code_and_locator() {
        let err = WcpsError::NoApplicableCode {
            coverage_id: "missing".to_string(),
        };
        let xml = exception_report(&BuiltinTemplates::new(), &err);
        assert!(xml.contains("exceptionCode=\"NoApplicableCode\""));
        assert!(xml.contains("locator=\"missing\""));
        assert!(xml.contains("<ows:ExceptionText>Metadata for coverage 'missing' is not valid</ows:ExceptionText>"));
    }

    #[test]
    fn test_report_without_locator() {
        let xml = exception_report(&BuiltinTemplates::new(), &WcpsError::MissingSwitchDefault);
        assert!(xml.contains("exceptionCode=\"XmlNotValid\">"));
        assert!(!xml.contains("locator="));
    }

    #[test]
    fn test_text_is_escaped() {
        let err = WcpsError::UnexpectedNode {
            node: "<foo>".to_string(),
        };
        let xml = exception_report(&BuiltinTemplates::new(), &err);
        assert!(xml.contains("Unexpected node: &lt;foo&gt;"));
    }

    #[test]
    fn test_broken_override_falls_back() {
        let templates = BuiltinTemplates::new().with_override(TemplateId::ExceptionReport, "");
        let response = exception_response(&templates, &WcpsError::MissingSwitchDefault);
        assert_eq!(response.status, 400);
        assert!(response.xml.contains("<ows:ExceptionReport"));
    }
}
