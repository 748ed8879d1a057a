//! Parameters whose every mutation goes through a [`Definitions`] schema.
//!
//! [`DefinedParameters`] wraps a [`Parameters`] and a shared, read-only
//! schema. Reads go straight to the inner container (via `Deref`); writes are
//! converted to the declared field types, and keys the schema does not
//! declare are dropped without error.

use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::definitions::Definitions;
use crate::error::ParamsError;
use crate::params::{Parameters, serialize_to_table};
use crate::path::KeyPath;
use crate::value::{Table, Value};

#[derive(Debug, Clone)]
pub struct DefinedParameters {
    definitions: Arc<Definitions>,
    params: Parameters,
}

impl DefinedParameters {
    /// A container holding the schema defaults.
    pub fn new(definitions: Arc<Definitions>) -> Result<Self, ParamsError> {
        Self::from_table(definitions, Table::new())
    }

    /// A container holding `table` projected onto the schema.
    pub fn from_table(definitions: Arc<Definitions>, table: Table) -> Result<Self, ParamsError> {
        Self::with_separator(definitions, table, ".")
    }

    pub fn with_separator(
        definitions: Arc<Definitions>,
        table: Table,
        separator: &str,
    ) -> Result<Self, ParamsError> {
        let mut defined = Self {
            definitions,
            params: Parameters::with_separator(separator),
        };
        defined.replace(table)?;
        Ok(defined)
    }

    /// Restore a container from [`Parameters::to_snapshot`] output. The tree is
    /// taken as stored, without re-applying the schema.
    pub fn from_snapshot(definitions: Arc<Definitions>, snapshot: &str) -> Result<Self, ParamsError> {
        Ok(Self {
            definitions,
            params: Parameters::from_snapshot(snapshot)?,
        })
    }

    pub fn definitions(&self) -> &Arc<Definitions> {
        &self.definitions
    }

    pub fn as_parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn into_parameters(self) -> Parameters {
        self.params
    }

    pub fn has_parameter_for(&self, key: &str) -> bool {
        self.definitions.has(key)
    }

    /// Whether `value` equals the default of field `key`. Undeclared keys
    /// count as default, so callers deciding what to persist skip them.
    pub fn is_default_value(&self, key: &str, value: &Value) -> bool {
        self.definitions
            .is_default_value(key, value)
            .unwrap_or(true)
    }

    /// Convert and store `value` under a top-level field.
    ///
    /// Multi-segment paths fail with [`ParamsError::UnsupportedOperation`].
    /// Undeclared keys are ignored and leave the container unchanged.
    pub fn set<P: KeyPath + ?Sized>(
        &mut self,
        path: &P,
        value: impl Into<Value>,
    ) -> Result<&mut Self, ParamsError> {
        let segments = self.params.codec().split(path);
        let key = match segments.as_slice() {
            [] => return Ok(self),
            [key] => key,
            _ => {
                return Err(ParamsError::UnsupportedOperation(format!(
                    "cannot set '{}': defined parameters only accept top-level keys",
                    self.params.codec().join(&segments)
                )));
            }
        };
        if !self.definitions.has(key) {
            debug!(key = %key, "ignoring undeclared key");
            return Ok(self);
        }
        let value = self.definitions.convert_for(key, value.into())?;
        self.params.set(segments.as_slice(), value);
        Ok(self)
    }

    pub fn remove<P: KeyPath + ?Sized>(&mut self, path: &P) -> &mut Self {
        self.params.remove(path);
        self
    }

    pub fn merge(&mut self, other: &Parameters) -> Result<&mut Self, ParamsError> {
        self.merge_from(other.to_table())
    }

    /// Project `table` onto the schema, then deep-merge the result.
    ///
    /// The projection carries every declared field (absent ones at their
    /// default), so a merge also resets fields the input leaves out.
    /// Undeclared keys already in the container are kept.
    pub fn merge_from(&mut self, table: Table) -> Result<&mut Self, ParamsError> {
        let formatted = self.definitions.format(table)?;
        self.params.merge_from(formatted);
        Ok(self)
    }

    pub fn merge_from_serialize<S: Serialize + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<&mut Self, ParamsError> {
        self.merge_from(serialize_to_table(source)?)
    }

    /// Replace all state with `table` projected onto the schema.
    pub fn replace(&mut self, table: Table) -> Result<&mut Self, ParamsError> {
        let formatted = self.definitions.format(table)?;
        self.params.replace(formatted);
        Ok(self)
    }

    pub fn replace_from<S: Serialize + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<&mut Self, ParamsError> {
        self.replace(serialize_to_table(source)?)
    }

    /// Reset every field to its default.
    pub fn clear(&mut self) -> Result<&mut Self, ParamsError> {
        self.replace(Table::new())
    }

    /// Whether every required field holds a non-null value.
    pub fn valid(&self) -> bool {
        self.definitions.valid(self.params.all())
    }

    pub fn missing_required(&self) -> Vec<&str> {
        self.definitions.missing_required(self.params.all())
    }
}

impl Deref for DefinedParameters {
    type Target = Parameters;

    fn deref(&self) -> &Parameters {
        &self.params
    }
}
