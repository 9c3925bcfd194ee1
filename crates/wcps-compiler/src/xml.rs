//! Owned element tree for WCPS XML fragments.
//!
//! Namespace prefixes are dropped: the grammar matches on local names only.
//! Whitespace-only text between elements is ignored.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use wcps_common::{WcpsError, WcpsResult};

/// One XML element with its children in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    pub text: String,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder helper for tests and programmatic trees.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Builder helper for leaf elements.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> WcpsResult<XmlElement> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    stack.push(element_from_start(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = element_from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| WcpsError::InvalidXml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(xml_error)?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(text.trim());
                    }
                }
                Ok(Event::CData(c)) => {
                    let bytes = c.into_inner();
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(String::from_utf8_lossy(&bytes).trim());
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(xml_error(e)),
            }
        }

        if !stack.is_empty() {
            return Err(WcpsError::InvalidXml(format!(
                "unclosed element <{}>",
                stack.last().map(|e| e.name.as_str()).unwrap_or_default()
            )));
        }
        root.ok_or_else(|| WcpsError::InvalidXml("document has no root element".to_string()))
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child element, if any.
    pub fn first_child(&self) -> Option<&XmlElement> {
        self.children.first()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed text of the named child.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.trim())
    }

    /// Text of the named child, or an error naming this element.
    pub fn required_child_text(&self, name: &str) -> WcpsResult<&str> {
        self.child_text(name).ok_or_else(|| {
            WcpsError::invalid_parameter(&self.name, format!("missing <{}> element", name))
        })
    }

    /// The single child element, failing when there is none.
    pub fn only_child(&self) -> WcpsResult<&XmlElement> {
        self.first_child().ok_or_else(|| {
            WcpsError::invalid_parameter(&self.name, "element has no child expression")
        })
    }
}

fn element_from_start(e: &BytesStart<'_>) -> WcpsResult<XmlElement> {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| WcpsError::InvalidXml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(xml_error)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> WcpsResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(WcpsError::InvalidXml(format!(
            "second root element <{}>",
            element.name
        ))),
    }
}

fn xml_error(e: quick_xml::Error) -> WcpsError {
    WcpsError::InvalidXml(e.to_string())
}
