use crate::params::Parameters;
use crate::value::{Table, Value};

/// Build a `Table` from environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels.
/// Single `_` within a segment is literal (part of the key).
/// Segments are lowercased.
///
/// Values stay raw strings; feed the table to
/// [`DefinedParameters`](crate::DefinedParameters) to type them.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    let mut params = Parameters::with_separator("__");

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        params.set(&rest.to_lowercase(), Value::String(value));
    }

    params.into_table()
}
