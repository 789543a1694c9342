//! The two XML formats
//!
//! Both carry the flat registry keys of one item (see
//! [`fma_io_gconf::keys`]). A registry dump lists `entry` elements
//! relative to a base directory; a schema file lists one `schema` per
//! key with the value as its default.
//!
//! ```text
//! <gconfentryfile>                      <gconfschemafile>
//!   <entrylist base="/root/<id>">         <schemalist>
//!     <entry>                               <schema>
//!       <key>label</key>                      <key>/schemas/root/<id>/label</key>
//!       <value><string>..</string></value>    <applyto>/root/<id>/label</applyto>
//!     </entry>                                <type>string</type>
//!                                             <locale name="C"><default>..</default></locale>
//! ```

use crate::dom::Element;
use fma_io::{ExportFormat, ImportError};
use fma_object::DataValue;
use quick_xml::escape::escape;
use std::fmt::{self, Write};

/// Registry dump format id
pub const GCONF_ENTRY: &str = "GConfEntry";

/// Schema format id
pub const GCONF_SCHEMA: &str = "GConfSchemaV2";

const ENTRY_ROOT: &str = "gconfentryfile";
const SCHEMA_ROOT: &str = "gconfschemafile";
const SCHEMA_PREFIX: &str = "/schemas";
const SCHEMA_OWNER: &str = "nautilus-actions";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Formats offered by the exporter
#[must_use]
pub fn formats() -> Vec<ExportFormat> {
    vec![
        ExportFormat::new(
            GCONF_ENTRY,
            "Registry dump",
            "Key/value dump of the item, importable into the registry",
        ),
        ExportFormat::new(
            GCONF_SCHEMA,
            "Registry schema",
            "One schema per key, the item's values as defaults",
        ),
    ]
}

/// Keys and values of one item, keys absolute
pub(crate) type Entries = Vec<(String, DataValue)>;

pub(crate) fn render_entries(dir: &str, entries: &Entries) -> Result<String, fmt::Error> {
    let mut xml = String::new();
    writeln!(xml, "{XML_DECL}")?;
    writeln!(xml, "<{ENTRY_ROOT}>")?;
    writeln!(xml, r#"  <entrylist base="{}">"#, escape(dir))?;
    for (key, value) in entries {
        let relative = key
            .strip_prefix(dir)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(key);
        writeln!(xml, "    <entry>")?;
        writeln!(xml, "      <key>{}</key>", escape(relative))?;
        write_value(&mut xml, value, 6)?;
        writeln!(xml, "    </entry>")?;
    }
    writeln!(xml, "  </entrylist>")?;
    writeln!(xml, "</{ENTRY_ROOT}>")?;
    Ok(xml)
}

fn write_value(xml: &mut String, value: &DataValue, indent: usize) -> fmt::Result {
    let pad = " ".repeat(indent);
    writeln!(xml, "{pad}<value>")?;
    match value {
        DataValue::String(s) => writeln!(xml, "{pad}  <string>{}</string>", escape(s.as_str()))?,
        DataValue::Bool(b) => writeln!(xml, "{pad}  <bool>{b}</bool>")?,
        DataValue::StringList(items) => {
            writeln!(xml, r#"{pad}  <list type="string">"#)?;
            for item in items {
                write_value(xml, &DataValue::String(item.clone()), indent + 4)?;
            }
            writeln!(xml, "{pad}  </list>")?;
        }
    }
    writeln!(xml, "{pad}</value>")
}

pub(crate) fn render_schemas(entries: &Entries) -> Result<String, fmt::Error> {
    let mut xml = String::new();
    writeln!(xml, "{XML_DECL}")?;
    writeln!(xml, "<{SCHEMA_ROOT}>")?;
    writeln!(xml, "  <schemalist>")?;
    for (key, value) in entries {
        let key = escape(key.as_str());
        writeln!(xml, "    <schema>")?;
        writeln!(xml, "      <key>{SCHEMA_PREFIX}{key}</key>")?;
        writeln!(xml, "      <applyto>{key}</applyto>")?;
        writeln!(xml, "      <owner>{SCHEMA_OWNER}</owner>")?;
        match value {
            DataValue::String(_) => writeln!(xml, "      <type>string</type>")?,
            DataValue::Bool(_) => writeln!(xml, "      <type>bool</type>")?,
            DataValue::StringList(_) => {
                writeln!(xml, "      <type>list</type>")?;
                writeln!(xml, "      <list_type>string</list_type>")?;
            }
        }
        writeln!(xml, r#"      <locale name="C">"#)?;
        writeln!(xml, "        <default>{}</default>", escape(default_text(value).as_str()))?;
        writeln!(xml, "      </locale>")?;
        writeln!(xml, "    </schema>")?;
    }
    writeln!(xml, "  </schemalist>")?;
    writeln!(xml, "</{SCHEMA_ROOT}>")?;
    Ok(xml)
}

/// Schema default text: lists as `[a,b]` with `,` `]` `\` escaped
fn default_text(value: &DataValue) -> String {
    match value {
        DataValue::String(s) => s.clone(),
        DataValue::Bool(b) => b.to_string(),
        DataValue::StringList(items) => {
            let escaped: Vec<String> = items
                .iter()
                .map(|item| {
                    item.replace('\\', "\\\\")
                        .replace(',', "\\,")
                        .replace(']', "\\]")
                })
                .collect();
            format!("[{}]", escaped.join(","))
        }
    }
}

fn parse_bool(text: &str) -> Result<bool, ImportError> {
    match text.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ImportError::invalid(format!("'{other}' is not a boolean"))),
    }
}

fn parse_list_default(text: &str) -> Result<Vec<String>, ImportError> {
    let inner = text
        .trim()
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| ImportError::invalid(format!("'{text}' is not a list")))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.extend(chars.next()),
            ',' => items.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    items.push(current);
    Ok(items)
}

fn read_value(value: &Element) -> Result<DataValue, ImportError> {
    let inner = value
        .children
        .first()
        .ok_or_else(|| ImportError::invalid("empty <value>"))?;
    match inner.name.as_str() {
        "string" => Ok(DataValue::String(inner.text().to_string())),
        "bool" => parse_bool(inner.text()).map(DataValue::Bool),
        "list" => inner
            .children_named("value")
            .map(|v| match read_value(v)? {
                DataValue::String(s) => Ok(s),
                other => Err(ImportError::invalid(format!("list item {other} is not a string"))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(DataValue::StringList),
        other => Err(ImportError::invalid(format!("unsupported value type <{other}>"))),
    }
}

/// Entries of a registry dump
pub(crate) fn parse_entries(root: &Element) -> Result<Entries, ImportError> {
    let mut entries = Vec::new();
    for list in root.children_named("entrylist") {
        let base = list
            .attr("base")
            .ok_or_else(|| ImportError::invalid("<entrylist> without base"))?;
        for entry in list.children_named("entry") {
            let key = entry
                .child("key")
                .map(|k| k.text().trim())
                .ok_or_else(|| ImportError::invalid("<entry> without key"))?;
            let Some(value) = entry.child("value") else {
                tracing::debug!(key, "skipping entry without value");
                continue;
            };
            let full = if key.starts_with('/') {
                key.to_string()
            } else {
                format!("{}/{key}", base.trim_end_matches('/'))
            };
            entries.push((full, read_value(value)?));
        }
    }
    Ok(entries)
}

/// Entries of a schema file
pub(crate) fn parse_schemas(root: &Element) -> Result<Entries, ImportError> {
    let mut entries = Vec::new();
    for list in root.children_named("schemalist") {
        for schema in list.children_named("schema") {
            let key = match (schema.child("applyto"), schema.child("key")) {
                (Some(applyto), _) => applyto.text().trim().to_string(),
                (None, Some(key)) => {
                    let key = key.text().trim();
                    key.strip_prefix(SCHEMA_PREFIX).unwrap_or(key).to_string()
                }
                (None, None) => return Err(ImportError::invalid("<schema> without key")),
            };
            let kind = schema.child("type").map_or("string", |t| t.text().trim());
            let default = schema
                .child("locale")
                .and_then(|l| l.child("default"))
                .or_else(|| schema.child("default"))
                .map_or("", Element::text);
            let value = match kind {
                "string" => DataValue::String(default.to_string()),
                "bool" => DataValue::Bool(parse_bool(default)?),
                "list" => DataValue::StringList(parse_list_default(default)?),
                other => {
                    return Err(ImportError::invalid(format!("unsupported schema type '{other}'")));
                }
            };
            entries.push((key, value));
        }
    }
    Ok(entries)
}

/// Entries of a document in either format
///
/// # Errors
///
/// [`ImportError::NotWilling`] for another root element.
pub(crate) fn parse_document(root: &Element) -> Result<Entries, ImportError> {
    match root.name.as_str() {
        ENTRY_ROOT => parse_entries(root),
        SCHEMA_ROOT => parse_schemas(root),
        other => Err(ImportError::NotWilling(format!("unknown root element <{other}>"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse;
    use pretty_assertions::assert_eq;

    fn sample() -> Entries {
        vec![
            ("/r/a/label".to_string(), DataValue::from(" Open <it> & go")),
            ("/r/a/enabled".to_string(), DataValue::Bool(false)),
            (
                "/r/a/p1/basenames".to_string(),
                DataValue::StringList(vec!["a,b".into(), "c]".into(), "d\\".into()]),
            ),
            ("/r/a/p1/schemes".to_string(), DataValue::StringList(vec![])),
        ]
    }

    #[test]
    fn entries_document_parses_back() {
        let xml = render_entries("/r/a", &sample()).unwrap();
        assert!(xml.contains(r#"<entrylist base="/r/a">"#));
        assert!(xml.contains("<key>p1/basenames</key>"));
        let root = parse(&xml).unwrap();
        assert_eq!(parse_document(&root).unwrap(), sample());
    }

    #[test]
    fn schema_document_parses_back() {
        let xml = render_schemas(&sample()).unwrap();
        assert!(xml.contains("<key>/schemas/r/a/label</key>"));
        assert!(xml.contains("<list_type>string</list_type>"));
        let root = parse(&xml).unwrap();
        assert_eq!(parse_document(&root).unwrap(), sample());
    }

    #[test]
    fn list_defaults() {
        assert_eq!(parse_list_default("[]").unwrap(), Vec::<String>::new());
        assert_eq!(parse_list_default("[x,y]").unwrap(), ["x", "y"]);
        assert!(parse_list_default("x,y").is_err());
    }

    #[test]
    fn unknown_root_not_willing() {
        let root = parse("<html><body/></html>").unwrap();
        assert!(matches!(parse_document(&root), Err(ImportError::NotWilling(_))));
    }

    #[test]
    fn formats_offered() {
        let ids: Vec<_> = formats().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, [GCONF_ENTRY, GCONF_SCHEMA]);
    }
}
