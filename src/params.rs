//! The path-addressable parameter container.
//!
//! [`Parameters`] owns a single [`Table`] and addresses it by key path
//! (`"database.pool_size"` or `["database", "pool_size"]`). Every mutating
//! method returns `&mut Self` so calls chain.
//!
//! Traversal never fails: a missing segment, or a segment that indexes into
//! something other than a table, simply means "not found". Lists are leaves.

use std::collections::btree_map;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ParamsError;
use crate::merge::deep_merge;
use crate::path::{KeyPath, PathCodec};
use crate::value::{Table, Value, table_to_toml};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    tree: Table,
    path: PathCodec,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Table> for Parameters {
    fn from(table: Table) -> Self {
        Self::from_table(table)
    }
}

impl Parameters {
    /// An empty container using `.` as the path separator.
    pub fn new() -> Self {
        Self::with_separator(".")
    }

    /// An empty container using a custom path separator.
    pub fn with_separator(separator: &str) -> Self {
        Self {
            tree: Table::new(),
            path: PathCodec::new(separator),
        }
    }

    pub fn from_table(table: Table) -> Self {
        let mut params = Self::new();
        params.replace(table);
        params
    }

    /// Build a container from any serializable source; structs and maps
    /// become nested tables.
    pub fn from_serialize<S: Serialize + ?Sized>(source: &S) -> Result<Self, ParamsError> {
        let mut params = Self::new();
        params.replace_from(source)?;
        Ok(params)
    }

    pub fn separator(&self) -> &str {
        self.path.separator()
    }

    pub(crate) fn codec(&self) -> &PathCodec {
        &self.path
    }

    /// The whole tree. This is a read view; mutate through the container.
    pub fn all(&self) -> &Table {
        &self.tree
    }

    /// An owned copy of the whole tree.
    pub fn to_table(&self) -> Table {
        self.tree.clone()
    }

    pub fn into_table(self) -> Table {
        self.tree
    }

    /// Look up the value at `path`.
    ///
    /// Returns `Some(&Value::Null)` for an explicit null, `None` when a segment
    /// is missing or the walk hits a non-table.
    pub fn get<P: KeyPath + ?Sized>(&self, path: &P) -> Option<&Value> {
        lookup(&self.tree, &self.path.split(path))
    }

    /// Like [`get`](Self::get), falling back to `default` when nothing is found.
    pub fn get_or<'a, P: KeyPath + ?Sized>(&'a self, path: &P, default: &'a Value) -> &'a Value {
        self.get(path).unwrap_or(default)
    }

    /// True when every segment of `path` is present, even if the value is null.
    /// An empty segment list names the root, which always exists.
    pub fn exists<P: KeyPath + ?Sized>(&self, path: &P) -> bool {
        let segments = self.path.split(path);
        segments.is_empty() || lookup(&self.tree, &segments).is_some()
    }

    /// True when `path` holds a non-null value. Absent and explicit-null keys
    /// are indistinguishable here; use [`exists`](Self::exists) for that.
    pub fn has<P: KeyPath + ?Sized>(&self, path: &P) -> bool {
        self.get(path).is_some_and(|v| !v.is_null())
    }

    /// Assign `value` at `path`, creating intermediate tables as needed.
    ///
    /// An intermediate that holds anything other than a table is replaced by
    /// an empty table. Siblings along the path are left untouched.
    pub fn set<P: KeyPath + ?Sized>(&mut self, path: &P, value: impl Into<Value>) -> &mut Self {
        let segments = self.path.split(path);
        let Some((leaf, parents)) = segments.split_last() else {
            return self;
        };

        let mut current = &mut self.tree;
        for segment in parents {
            let slot = current.entry(segment.clone()).or_default();
            current = ensure_table(slot);
        }
        current.insert(leaf.clone(), value.into());
        self
    }

    /// Delete the value at `path`. Missing paths are a no-op.
    pub fn remove<P: KeyPath + ?Sized>(&mut self, path: &P) -> &mut Self {
        let segments = self.path.split(path);
        let Some((leaf, parents)) = segments.split_last() else {
            return self;
        };

        if let Some(parent) = lookup_table_mut(&mut self.tree, parents) {
            parent.remove(leaf);
        }
        self
    }

    /// Deep-merge another container's tree into this one.
    pub fn merge(&mut self, other: &Parameters) -> &mut Self {
        self.merge_from(other.tree.clone())
    }

    /// Deep-merge `table` into this container. Tables merge key by key;
    /// every other value, lists included, replaces what was there.
    pub fn merge_from(&mut self, table: Table) -> &mut Self {
        trace!(keys = table.len(), "merging parameters");
        let base = std::mem::take(&mut self.tree);
        self.tree = deep_merge(base, table);
        self
    }

    /// Deep-merge a serializable source into this container.
    pub fn merge_from_serialize<S: Serialize + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<&mut Self, ParamsError> {
        let table = serialize_to_table(source)?;
        Ok(self.merge_from(table))
    }

    /// Discard all state and store `table`.
    pub fn replace(&mut self, table: Table) -> &mut Self {
        trace!(keys = table.len(), "replacing parameters");
        self.tree = table;
        self
    }

    /// Discard all state and store the table form of `source`.
    pub fn replace_from<S: Serialize + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<&mut Self, ParamsError> {
        let table = serialize_to_table(source)?;
        Ok(self.replace(table))
    }

    /// The table at `path`, or an empty table when nothing (or null) is
    /// there. Fails with [`ParamsError::InvalidArgument`] on any other value.
    pub fn get_as_table<P: KeyPath + ?Sized>(&self, path: &P) -> Result<Table, ParamsError> {
        let segments = self.path.split(path);
        match lookup(&self.tree, &segments) {
            None | Some(Value::Null) => Ok(Table::new()),
            Some(Value::Table(t)) => Ok(t.clone()),
            Some(other) => Err(ParamsError::InvalidArgument(format!(
                "cannot return parameters for '{}': the value is a {}, not a table",
                self.path.join(&segments),
                other.type_name()
            ))),
        }
    }

    /// A new container holding a copy of the table at `path`, with the same
    /// separator. The empty path yields an empty container.
    pub fn get_as_instance<P: KeyPath + ?Sized>(
        &self,
        path: &P,
    ) -> Result<Parameters, ParamsError> {
        let segments = self.path.split(path);
        if segments.iter().all(String::is_empty) && segments.len() <= 1 {
            return Ok(Self::with_separator(self.separator()));
        }
        Ok(Parameters {
            tree: self.get_as_table(&segments)?,
            path: self.path.clone(),
        })
    }

    /// Top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.tree.keys().map(String::as_str)
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn clear(&mut self) -> &mut Self {
        self.replace(Table::new())
    }

    /// Plain containers have no constraints and are always valid.
    pub fn valid(&self) -> bool {
        true
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.tree.iter()
    }

    /// Leaf values as `(path, value)` pairs in key order, with paths joined
    /// by this container's separator. Empty tables are reported as leaves.
    pub fn flatten(&self) -> Vec<(String, &Value)> {
        let mut out = Vec::new();
        flatten_into(&self.tree, None, self.separator(), &mut out);
        out
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        let object = self
            .tree
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_value()))
            .collect();
        serde_json::Value::Object(object)
    }

    /// JSON export mirroring [`all`](Self::all).
    pub fn to_json(&self) -> Result<String, ParamsError> {
        Ok(serde_json::to_string(&self.to_json_value())?)
    }

    /// TOML export. Null values are dropped.
    pub fn to_toml(&self) -> toml::Table {
        table_to_toml(&self.tree)
    }

    /// Lossless encoding of the tree and separator, restorable with
    /// [`from_snapshot`](Self::from_snapshot).
    pub fn to_snapshot(&self) -> Result<String, ParamsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_snapshot(snapshot: &str) -> Result<Self, ParamsError> {
        Ok(serde_json::from_str(snapshot)?)
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.iter()
    }
}

fn lookup<'a>(tree: &'a Table, segments: &[String]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let mut current = tree.get(first)?;
    for segment in rest {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

fn lookup_table_mut<'a>(tree: &'a mut Table, segments: &[String]) -> Option<&'a mut Table> {
    let mut current = tree;
    for segment in segments {
        current = current.get_mut(segment)?.as_table_mut()?;
    }
    Some(current)
}

fn ensure_table(slot: &mut Value) -> &mut Table {
    if !slot.is_table() {
        *slot = Value::Table(Table::new());
    }
    match slot {
        Value::Table(t) => t,
        _ => unreachable!("slot was just replaced with a table"),
    }
}

fn flatten_into<'a>(
    table: &'a Table,
    prefix: Option<&str>,
    separator: &str,
    out: &mut Vec<(String, &'a Value)>,
) {
    for (key, value) in table {
        let path = match prefix {
            Some(p) => format!("{p}{separator}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Table(t) if !t.is_empty() => {
                flatten_into(t, Some(path.as_str()), separator, out)
            }
            _ => out.push((path, value)),
        }
    }
}

pub(crate) fn serialize_to_table<S: Serialize + ?Sized>(source: &S) -> Result<Table, ParamsError> {
    match Value::from_serialize(source)? {
        Value::Table(t) => Ok(t),
        other => Err(ParamsError::InvalidArgument(format!(
            "expected a struct or map, got a {}",
            other.type_name()
        ))),
    }
}
