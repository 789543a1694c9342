//! Key-file codec
//!
//! The `[Group]` / `key=value` text format of desktop entries. Comments
//! and blank lines survive a parse/print cycle. Lists are `;`-separated
//! with a trailing separator, localized values use `Key[locale]`.

use std::fmt;
use std::str::FromStr;

/// Key-file parse or conversion failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyFileError {
    /// Malformed line
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// Value is not a boolean
    #[error("[{group}] {key}: '{value}' is not a boolean")]
    InvalidBool {
        group: String,
        key: String,
        value: String,
    },
}

impl KeyFileError {
    fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Blank,
    Comment(String),
    Entry { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    name: String,
    lines: Vec<Line>,
}

impl Group {
    fn value(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Parsed key file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFile {
    header: Vec<Line>,
    groups: Vec<Group>,
}

impl KeyFile {
    /// Create empty key file
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse key-file text
    ///
    /// A group appearing twice is merged into its first occurrence.
    ///
    /// # Errors
    ///
    /// [`KeyFileError::Syntax`] for an entry before the first group, a
    /// line that is neither a comment, a group header nor `key=value`,
    /// or an empty key.
    pub fn parse(text: &str) -> Result<Self, KeyFileError> {
        let mut file = Self::new();
        let mut current: Option<usize> = None;

        for (index, raw) in text.lines().enumerate() {
            let number = index + 1;
            let trimmed = raw.trim();
            let line = if trimmed.is_empty() {
                Line::Blank
            } else if trimmed.starts_with('#') {
                Line::Comment(trimmed.to_string())
            } else if let Some(name) = trimmed.strip_prefix('[') {
                let name = name
                    .strip_suffix(']')
                    .ok_or_else(|| KeyFileError::syntax(number, "unterminated group header"))?;
                if name.is_empty() || name.contains(['[', ']']) {
                    return Err(KeyFileError::syntax(number, "invalid group name"));
                }
                current = Some(file.group_index_or_insert(name));
                continue;
            } else {
                let (key, value) = trimmed
                    .split_once('=')
                    .ok_or_else(|| KeyFileError::syntax(number, "expected key=value"))?;
                let key = key.trim_end();
                if key.is_empty() {
                    return Err(KeyFileError::syntax(number, "empty key"));
                }
                if current.is_none() {
                    return Err(KeyFileError::syntax(number, "entry outside of any group"));
                }
                Line::Entry {
                    key: key.to_string(),
                    value: value.trim_start().to_string(),
                }
            };

            match current {
                Some(i) => file.groups[i].lines.push(line),
                None => file.header.push(line),
            }
        }
        Ok(file)
    }

    fn group_index(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name == name)
    }

    fn group_index_or_insert(&mut self, name: &str) -> usize {
        self.group_index(name).unwrap_or_else(|| {
            self.groups.push(Group {
                name: name.to_string(),
                lines: Vec::new(),
            });
            self.groups.len() - 1
        })
    }

    /// Name of the first group
    #[must_use]
    pub fn start_group(&self) -> Option<&str> {
        self.groups.first().map(|g| g.name.as_str())
    }

    /// Group names in file order
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    /// Whether `group` exists
    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.group_index(group).is_some()
    }

    /// Whether `group` has `key`
    #[must_use]
    pub fn has_key(&self, group: &str, key: &str) -> bool {
        self.raw(group, key).is_some()
    }

    /// Unparsed value of a key
    #[must_use]
    pub fn raw(&self, group: &str, key: &str) -> Option<&str> {
        self.group_index(group)
            .and_then(|i| self.groups[i].value(key))
    }

    /// String value, escapes resolved
    #[must_use]
    pub fn get_string(&self, group: &str, key: &str) -> Option<String> {
        self.raw(group, key).map(unescape)
    }

    /// Localized string value
    ///
    /// Tries `key[lang_COUNTRY]`, then `key[lang]`, then `key`.
    #[must_use]
    pub fn get_locale_string(&self, group: &str, key: &str, locale: Option<&str>) -> Option<String> {
        locale
            .into_iter()
            .flat_map(locale_variants)
            .find_map(|variant| self.get_string(group, &format!("{key}[{variant}]")))
            .or_else(|| self.get_string(group, key))
    }

    /// Set a localized string value
    ///
    /// Updates the translation [`KeyFile::get_locale_string`] would
    /// return for `locale`, or adds `key[lang_COUNTRY]`. The untranslated
    /// `key` is only written when missing, or when there is no locale.
    pub fn set_locale_string(&mut self, group: &str, key: &str, locale: Option<&str>, value: &str) {
        let Some(locale) = locale else {
            self.set_string(group, key, value);
            return;
        };
        let variants = locale_variants(locale);
        let target = variants
            .iter()
            .map(|variant| format!("{key}[{variant}]"))
            .find(|localized| self.has_key(group, localized))
            .unwrap_or_else(|| format!("{key}[{}]", variants.first().map_or(locale, String::as_str)));
        self.set_string(group, &target, value);
        if !self.has_key(group, key) {
            self.set_string(group, key, value);
        }
    }

    /// Boolean value
    ///
    /// # Errors
    ///
    /// [`KeyFileError::InvalidBool`] when the value is present but is
    /// not `true`, `false`, `1` or `0`.
    pub fn get_bool(&self, group: &str, key: &str) -> Result<Option<bool>, KeyFileError> {
        match self.raw(group, key) {
            None => Ok(None),
            Some("true" | "1") => Ok(Some(true)),
            Some("false" | "0") => Ok(Some(false)),
            Some(other) => Err(KeyFileError::InvalidBool {
                group: group.to_string(),
                key: key.to_string(),
                value: other.to_string(),
            }),
        }
    }

    /// String list value
    #[must_use]
    pub fn get_list(&self, group: &str, key: &str) -> Option<Vec<String>> {
        self.raw(group, key).map(split_list)
    }

    /// Set a raw value, creating the group and key as needed
    pub fn set_raw(&mut self, group: &str, key: &str, value: impl Into<String>) {
        let value = value.into();
        let index = self.group_index_or_insert(group);
        let lines = &mut self.groups[index].lines;
        for line in lines.iter_mut() {
            if let Line::Entry { key: k, value: v } = line {
                if k == key {
                    *v = value;
                    return;
                }
            }
        }
        lines.push(Line::Entry {
            key: key.to_string(),
            value,
        });
    }

    /// Set a string value
    pub fn set_string(&mut self, group: &str, key: &str, value: &str) {
        self.set_raw(group, key, escape(value, false));
    }

    /// Set a boolean value
    pub fn set_bool(&mut self, group: &str, key: &str, value: bool) {
        self.set_raw(group, key, if value { "true" } else { "false" });
    }

    /// Set a string list value
    pub fn set_list(&mut self, group: &str, key: &str, values: &[String]) {
        let joined: String = values
            .iter()
            .map(|v| format!("{};", escape(v, true)))
            .collect();
        self.set_raw(group, key, joined);
    }

    /// Remove a key; returns whether it existed
    pub fn remove_key(&mut self, group: &str, key: &str) -> bool {
        let Some(index) = self.group_index(group) else {
            return false;
        };
        let lines = &mut self.groups[index].lines;
        let before = lines.len();
        lines.retain(|line| !matches!(line, Line::Entry { key: k, .. } if k == key));
        lines.len() != before
    }

    /// Remove a group; returns whether it existed
    pub fn remove_group(&mut self, group: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.name != group);
        self.groups.len() != before
    }
}

impl FromStr for KeyFile {
    type Err = KeyFileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, line: &Line) -> fmt::Result {
    match line {
        Line::Blank => writeln!(f),
        Line::Comment(text) => writeln!(f, "{text}"),
        Line::Entry { key, value } => writeln!(f, "{key}={value}"),
    }
}

impl fmt::Display for KeyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.header {
            write_line(f, line)?;
        }
        for (i, group) in self.groups.iter().enumerate() {
            let separated = i > 0 && !matches!(self.groups[i - 1].lines.last(), Some(Line::Blank));
            if separated {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", group.name)?;
            for line in &group.lines {
                write_line(f, line)?;
            }
        }
        Ok(())
    }
}

/// `lang_COUNTRY` then `lang`, encoding and modifier dropped
fn locale_variants(locale: &str) -> Vec<String> {
    let locale = locale.split(['.', '@']).next().unwrap_or(locale);
    let mut variants = vec![locale.to_string()];
    if let Some((lang, _)) = locale.split_once('_') {
        variants.push(lang.to_string());
    }
    variants
}

/// Escape a value for storage
fn escape(value: &str, in_list: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        match c {
            ' ' if i == 0 => out.push_str("\\s"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            ';' if in_list => out.push_str("\\;"),
            c => out.push(c),
        }
    }
    out
}

/// Resolve escape sequences; unknown ones are kept as written
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(';') => out.push(';'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split on unescaped `;`, dropping the trailing empty element
fn split_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push('\\');
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ';' => items.push(unescape(&std::mem::take(&mut current))),
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(unescape(&current));
    }
    items
}
