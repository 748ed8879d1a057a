//! Nested, path-addressable parameters with an optional typed schema.
//!
//! Paramtree stores settings as a tree of tables addressed by dotted key
//! paths, merges trees recursively, and can constrain them with a schema that
//! turns raw, usually string-typed input (env vars, query strings, CLI
//! arguments) into typed values.
//!
//! ```ignore
//! let mut params = Parameters::new();
//! params.set("database.pool_size", 5).set("host", "localhost");
//! assert_eq!(params.get("database.pool_size"), Some(&Value::Integer(5)));
//! ```
//!
//! # Parameters
//!
//! [`Parameters`] owns one [`Table`]. Paths are strings split on a separator
//! (`.` by default, configurable per container) or pre-split segment lists:
//!
//! - **`get`** walks one segment at a time and gives up the moment a segment
//!   is missing or the walk hits something that is not a table. Lists are
//!   leaves.
//! - **`exists`** is true when every segment is present, even if the value is
//!   null. **`has`** additionally requires a non-null value.
//! - **`set`** creates intermediate tables as needed, replacing any scalar in
//!   the way. Siblings are never touched.
//! - **`remove`** on a missing path does nothing.
//! - **`merge`** is a deep merge: tables combine key by key, every other
//!   value (lists included) is replaced whole.
//! - **`replace`** discards everything and stores the new tree.
//!
//! Mutating methods return `&mut Self`, so calls chain. Containers never share
//! nodes: merges and replaces take ownership of, or copy, their input.
//!
//! # Definitions
//!
//! A [`Definitions`] declares fields in order, each with a [`TypeSpec`], a
//! default and a required flag:
//!
//! ```ignore
//! let mut defs = Definitions::new();
//! defs.add("name", "string", Value::Null, true)
//!     .add("age", "integer", 0, false)
//!     .add("flags", "array:string,boolean", Value::Null, false);
//! ```
//!
//! Type names are parsed once into a [`TypeSpec`]. See the
//! [`definitions`] module for the conversion table. The important rules:
//! null stays null under every type, `"false"` converts to `false` under
//! `boolean`, and unknown type names pass values through.
//!
//! [`Definitions::format`] projects a candidate table onto the schema: every
//! declared field comes out converted (falling back to its default), and
//! undeclared keys are dropped. [`Definitions::valid`] checks that every
//! required field holds a non-null value.
//!
//! # Defined parameters
//!
//! [`DefinedParameters`] pairs a container with a shared `Arc<Definitions>`.
//! Reads work exactly like [`Parameters`]. Writes go through the schema:
//!
//! - `replace` and `merge_from` run their input through `format` first, so
//!   undeclared keys never get in and declared ones are typed.
//! - `set` converts the value for declared top-level keys, silently ignores
//!   undeclared keys, and rejects multi-segment paths.
//! - `valid` reports whether required fields are filled in.
//!
//! A failed conversion fails the whole call before anything is stored.
//!
//! # Input sources
//!
//! [`env_to_table`] turns `PREFIX__SECTION__KEY` environment variables into a
//! nested table of raw strings. With the `url` feature, `query_to_table` does
//! the same for URL query strings. Both are meant to be fed to a
//! [`DefinedParameters`], which types the strings.
//!
//! # Export
//!
//! [`Parameters::all`] is a read view of the tree. `to_json` mirrors it as
//! JSON; `to_toml` writes TOML (dropping nulls, which TOML lacks).
//! `to_snapshot`/`from_snapshot` round-trip the exact state, separator
//! included.
//!
//! # Operations and the clap adapter
//!
//! [`handle`] runs a [`ParamAction`] (`list`, `get`, `set`, `unset`) against
//! any [`ParamStore`] and returns a displayable [`ParamResult`]. With the
//! opt-in `clap` feature, `ParamArgs` gives an application those
//! subcommands with one line of derive.
//!
//! # Error handling
//!
//! All fallible operations return [`ParamsError`]. Traversal misses are never
//! errors; see the [`error`] module for what is.

pub mod definitions;
pub mod error;
pub mod types;

#[cfg(feature = "clap")]
mod cli;
mod defined;
mod env;
pub(crate) mod merge;
mod ops;
mod params;
mod path;
#[cfg(feature = "url")]
mod query;
mod value;

#[cfg(test)]
mod fixtures;

#[cfg(feature = "clap")]
pub use cli::{ParamArgs, ParamSubcommand};
pub use defined::DefinedParameters;
pub use definitions::{Definitions, FieldDescriptor, TypeSpec};
pub use env::env_to_table;
pub use error::ParamsError;
pub use merge::deep_merge;
pub use ops::{ParamResult, ParamStore, get_value, handle, list_values};
pub use params::Parameters;
pub use path::{KeyPath, PathCodec};
#[cfg(feature = "url")]
pub use query::query_to_table;
pub use types::ParamAction;
pub use value::{Number, Table, Value, table_to_toml};
