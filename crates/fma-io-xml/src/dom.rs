//! Minimal element tree built from `quick-xml` events

use fma_io::ImportError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One XML element
///
/// Text is kept verbatim; it is only meaningful on leaf elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) name: String,
    attrs: Vec<(String, String)>,
    pub(crate) children: Vec<Element>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, ImportError> {
        let mut element = Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Self::default()
        };
        for attr in start.attributes() {
            let attr = attr.map_err(|e| ImportError::invalid(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ImportError::invalid(e.to_string()))?
                .into_owned();
            element.attrs.push((key, value));
        }
        Ok(element)
    }

    /// Attribute value
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First child named `name`
    pub(crate) fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Children named `name`
    pub(crate) fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content
    pub(crate) fn text(&self) -> &str {
        &self.text
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<(), ImportError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => return Err(ImportError::invalid("more than one root element")),
        None => *root = Some(element),
    }
    Ok(())
}

/// Parse a document into its root element
///
/// # Errors
///
/// [`ImportError::NotWilling`] when the buffer holds no element,
/// [`ImportError::Invalid`] when it is not well-formed.
pub(crate) fn parse(text: &str) -> Result<Element, ImportError> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ImportError::invalid(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => stack.push(Element::open(&start)?),
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ImportError::invalid("unbalanced end tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| ImportError::invalid(e.to_string()))?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ImportError::invalid(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| ImportError::NotWilling("no XML element found".to_string()))
}
