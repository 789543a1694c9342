//! Field storage driven by the registry

use crate::data::{defs_for, find_def, DataDef, DataValue};
use crate::error::{ObjectError, Result};
use crate::kind::ItemKind;
use indexmap::IndexMap;

/// Values of every declared field of one item
///
/// Always holds exactly the fields [`defs_for`] declares for its kind,
/// in declaration order. A new set is seeded with the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    kind: ItemKind,
    values: IndexMap<&'static str, DataValue>,
}

impl FieldSet {
    /// Create a set holding the defaults of `kind`
    #[must_use]
    pub fn new(kind: ItemKind) -> Self {
        let values = defs_for(kind)
            .map(|def| (def.name, def.default_value()))
            .collect();
        Self { kind, values }
    }

    /// Kind the set was built for
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Get a field value
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.values.get(name)
    }

    /// Set a field value after checking it against its definition
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::UnknownField`] if the kind does not declare
    /// the field, or a type error from [`DataDef::check`].
    pub fn set(&mut self, name: &str, value: impl Into<DataValue>) -> Result<()> {
        let def = find_def(self.kind, name).ok_or_else(|| ObjectError::unknown_field(self.kind, name))?;
        let value = value.into();
        def.check(&value)?;
        self.values.insert(def.name, value);
        Ok(())
    }

    /// Set a field known to be declared with the right type
    ///
    /// Silently ignores undeclared names and mismatched values, which
    /// only a programming error can produce.
    pub(crate) fn put(&mut self, name: &str, value: DataValue) {
        if let Err(e) = self.set(name, value) {
            tracing::error!(kind = %self.kind, field = name, error = %e, "internal field update rejected");
        }
    }

    /// String value, empty when absent
    #[must_use]
    pub fn string(&self, name: &str) -> &str {
        self.get(name).and_then(DataValue::as_str).unwrap_or("")
    }

    /// Boolean value, `false` when absent
    #[must_use]
    pub fn boolean(&self, name: &str) -> bool {
        self.get(name).and_then(DataValue::as_bool).unwrap_or(false)
    }

    /// String list value, empty when absent
    #[must_use]
    pub fn list(&self, name: &str) -> &[String] {
        self.get(name).and_then(DataValue::as_list).unwrap_or(&[])
    }

    /// Iterate definitions with their current values, base first
    pub fn iter(&self) -> impl Iterator<Item = (&'static DataDef, &DataValue)> + '_ {
        defs_for(self.kind).filter_map(move |def| self.values.get(def.name).map(|v| (def, v)))
    }

    /// Copy every declared field from `source`
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::KindMismatch`] when kinds differ; the
    /// target is left unchanged.
    pub fn copy_from(&mut self, source: &FieldSet) -> Result<()> {
        if self.kind != source.kind {
            return Err(ObjectError::KindMismatch {
                expected: self.kind,
                actual: source.kind,
            });
        }
        for (def, value) in source.iter() {
            self.values.insert(def.name, value.clone());
        }
        Ok(())
    }

    /// Structural equality over comparable fields
    ///
    /// Sets of different kinds are never equal.
    #[must_use]
    pub fn is_equal(&self, other: &FieldSet) -> bool {
        if self.kind != other.kind {
            return false;
        }
        defs_for(self.kind)
            .filter(|def| def.comparable)
            .all(|def| match (self.values.get(def.name), other.values.get(def.name)) {
                (Some(a), Some(b)) => def.values_equal(a, b),
                (None, None) => true,
                _ => false,
            })
    }

    /// Names of the comparable fields that differ from `other`
    #[must_use]
    pub fn diff(&self, other: &FieldSet) -> Vec<&'static str> {
        defs_for(self.kind)
            .filter(|def| def.comparable)
            .filter(|def| match (self.values.get(def.name), other.values.get(def.name)) {
                (Some(a), Some(b)) => !def.values_equal(a, b),
                (None, None) => false,
                _ => true,
            })
            .map(|def| def.name)
            .collect()
    }

    /// Replace empty condition lists by `["*"]`
    pub fn normalize_filters(&mut self) {
        for def in defs_for(self.kind).filter(|def| def.filter) {
            if let Some(DataValue::StringList(list)) = self.values.get_mut(def.name) {
                list.retain(|s| !s.trim().is_empty());
                if list.is_empty() {
                    list.push("*".to_string());
                }
            }
        }
    }
}
