//! Field marshaling sub-protocol
//!
//! Backends expose one reader or writer per record (a key-file group, a
//! registry directory, an XML element). The drivers here walk the field
//! registry and ask the backend for each value, so a backend only maps
//! a [`DataDef`] to its native key and encoding.
//!
//! Reading never fails on a missing field: the registry default stays in
//! place and a warning is logged for mandatory fields.

use crate::error::ProviderError;
use fma_object::data::{defs_for, names};
use fma_object::{DataDef, DataValue, FieldSet, ItemKind, DEFAULT_PROFILE_LABEL};

/// Version of the marshaling protocol implemented by this crate
pub const FACTORY_PROTOCOL_VERSION: u32 = 1;

/// Per-record source of field values
pub trait FactoryReader {
    /// Protocol version implemented by the backend
    fn version(&self) -> u32 {
        FACTORY_PROTOCOL_VERSION
    }

    /// Called once before any field is read
    ///
    /// # Errors
    ///
    /// An error aborts the record.
    fn read_start(&self, _kind: ItemKind) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Decode one field, or `None` when the record does not carry it
    ///
    /// # Errors
    ///
    /// An error aborts the record.
    fn read_data(&self, kind: ItemKind, def: &DataDef)
        -> Result<Option<DataValue>, ProviderError>;

    /// Called once after every field was read
    ///
    /// # Errors
    ///
    /// An error aborts the record.
    fn read_done(&self, _fields: &mut FieldSet) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Per-record sink of field values
pub trait FactoryWriter {
    /// Protocol version implemented by the backend
    fn version(&self) -> u32 {
        FACTORY_PROTOCOL_VERSION
    }

    /// Called once before any field is written
    ///
    /// # Errors
    ///
    /// An error aborts the write.
    fn write_start(&mut self, _kind: ItemKind) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Encode one field
    ///
    /// # Errors
    ///
    /// An error aborts the write; fields already written stay written.
    fn write_data(
        &mut self,
        kind: ItemKind,
        def: &DataDef,
        value: &DataValue,
    ) -> Result<(), ProviderError>;

    /// Called once after every field was written
    ///
    /// # Errors
    ///
    /// An error fails the write.
    fn write_done(&mut self, _fields: &FieldSet) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Field set a reader starts from
///
/// The registry defaults, plus the default label for profiles.
#[must_use]
pub fn defaults_for(kind: ItemKind) -> FieldSet {
    let mut fields = FieldSet::new(kind);
    if kind == ItemKind::Profile {
        // the label field is declared with the right type
        let _ = fields.set(names::LABEL, DEFAULT_PROFILE_LABEL);
    }
    fields
}

/// Read every declared field of `kind` from `reader`
///
/// Values of the wrong type are ignored with a warning. Condition lists
/// left empty are normalised to "match everything".
///
/// # Errors
///
/// Propagates errors raised by the reader.
pub fn read_fields<R: FactoryReader + ?Sized>(
    reader: &R,
    kind: ItemKind,
) -> Result<FieldSet, ProviderError> {
    if reader.version() > FACTORY_PROTOCOL_VERSION {
        return Err(ProviderError::program(format!(
            "unsupported factory protocol version {}",
            reader.version()
        )));
    }

    reader.read_start(kind)?;
    let mut fields = defaults_for(kind);
    for def in defs_for(kind) {
        match reader.read_data(kind, def)? {
            Some(value) => {
                if let Err(e) = fields.set(def.name, value) {
                    tracing::warn!(%kind, field = def.name, error = %e, "ignoring unreadable value");
                }
            }
            None if def.mandatory => {
                tracing::warn!(%kind, field = def.name, "mandatory field not found, using default");
            }
            None => {}
        }
    }
    fields.normalize_filters();
    reader.read_done(&mut fields)?;
    Ok(fields)
}

/// Write every declared field of `fields` to `writer`
///
/// Stops at the first failing field.
///
/// # Errors
///
/// Propagates errors raised by the writer.
pub fn write_fields<W: FactoryWriter + ?Sized>(
    writer: &mut W,
    fields: &FieldSet,
) -> Result<(), ProviderError> {
    let kind = fields.kind();
    writer.write_start(kind)?;
    for (def, value) in fields.iter() {
        writer.write_data(kind, def, value)?;
    }
    writer.write_done(fields)
}
