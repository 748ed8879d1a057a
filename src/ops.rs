//! Parameter operations: key lookup, listing, set/unset, and result types.
//!
//! Provides the logic behind `list`, `get`, `set` and `unset`, the
//! [`ParamStore`] trait both containers implement, and the `ParamResult` enum
//! that callers use to display results.

use std::fmt;

use crate::defined::DefinedParameters;
use crate::error::ParamsError;
use crate::params::Parameters;
use crate::types::ParamAction;
use crate::value::Value;

/// Result of a parameter operation. Returned to the caller for display.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamResult {
    /// A key's current value.
    KeyValue { key: String, value: String },
    /// Confirmation that a value was stored.
    ValueSet { key: String, value: String },
    /// Confirmation that a value was removed.
    ValueUnset { key: String },
    /// All leaf key-value pairs.
    Listing { entries: Vec<(String, String)> },
}

impl fmt::Display for ParamResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamResult::KeyValue { key, value } => write!(f, "{key} = {value}"),
            ParamResult::ValueSet { key, value } => write!(f, "Set {key} = {value}"),
            ParamResult::ValueUnset { key } => write!(f, "Unset {key}"),
            ParamResult::Listing { entries } => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                Ok(())
            }
        }
    }
}

/// A container that [`handle`] can operate on.
pub trait ParamStore {
    fn parameters(&self) -> &Parameters;

    /// Store a raw string value at `key`.
    fn set_raw(&mut self, key: &str, raw: &str) -> Result<(), ParamsError>;

    fn unset(&mut self, key: &str);
}

impl ParamStore for Parameters {
    fn parameters(&self) -> &Parameters {
        self
    }

    /// Untyped containers guess the type: bool, then integer, then float,
    /// then string.
    fn set_raw(&mut self, key: &str, raw: &str) -> Result<(), ParamsError> {
        self.set(key, parse_raw_value(raw));
        Ok(())
    }

    fn unset(&mut self, key: &str) {
        self.remove(key);
    }
}

impl ParamStore for DefinedParameters {
    fn parameters(&self) -> &Parameters {
        self.as_parameters()
    }

    /// The schema types the value. Unlike [`DefinedParameters::set`], an
    /// undeclared key is an error here so the caller can report it.
    fn set_raw(&mut self, key: &str, raw: &str) -> Result<(), ParamsError> {
        if self.codec().split(key).len() == 1 && !self.has_parameter_for(key) {
            return Err(ParamsError::KeyNotFound(key.into()));
        }
        self.set(key, raw)?;
        Ok(())
    }

    fn unset(&mut self, key: &str) {
        self.remove(key);
    }
}

/// Run `action` against `store`.
pub fn handle<S: ParamStore + ?Sized>(
    store: &mut S,
    action: ParamAction,
) -> Result<ParamResult, ParamsError> {
    match action {
        ParamAction::List => Ok(list_values(store.parameters())),
        ParamAction::Get { key } => get_value(store.parameters(), &key),
        ParamAction::Set { key, value } => {
            store.set_raw(&key, &value)?;
            Ok(ParamResult::ValueSet { key, value })
        }
        ParamAction::Unset { key } => {
            store.unset(&key);
            Ok(ParamResult::ValueUnset { key })
        }
    }
}

/// Get a value by path.
pub fn get_value(params: &Parameters, key: &str) -> Result<ParamResult, ParamsError> {
    let value = params
        .get(key)
        .ok_or_else(|| ParamsError::KeyNotFound(key.into()))?;
    Ok(ParamResult::KeyValue {
        key: key.into(),
        value: format_value(value),
    })
}

/// List all leaf values as flattened key-value pairs.
pub fn list_values(params: &Parameters) -> ParamResult {
    let entries = params
        .flatten()
        .into_iter()
        .map(|(key, value)| (key, format_value(value)))
        .collect();
    ParamResult::Listing { entries }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "<not set>".to_string(),
        other => other.to_string(),
    }
}

/// Parse a raw string value with type heuristics.
/// Tries: bool → integer → float → string.
fn parse_raw_value(s: &str) -> Value {
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    // Only use float if the string actually contains a dot,
    // to avoid "NaN" / "inf" being parsed as float.
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return Value::Float(f);
    }
    Value::String(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{shared_profile, table};
    use crate::value::Table;
    use serde_json::json;

    fn sample() -> Parameters {
        Parameters::from_table(table(json!({
            "host": "localhost",
            "port": 8080,
            "database": {"url": null, "pool_size": 5}
        })))
    }

    #[test]
    fn get_flat_key() {
        let result = get_value(&sample(), "port").unwrap();
        assert_eq!(
            result,
            ParamResult::KeyValue {
                key: "port".into(),
                value: "8080".into()
            }
        );
    }

    #[test]
    fn get_nested_key() {
        match get_value(&sample(), "database.pool_size").unwrap() {
            ParamResult::KeyValue { value, .. } => assert_eq!(value, "5"),
            other => panic!("Expected KeyValue, got {other:?}"),
        }
    }

    #[test]
    fn get_nonexistent_key() {
        let result = get_value(&sample(), "nonexistent");
        assert!(matches!(result, Err(ParamsError::KeyNotFound(_))));
    }

    #[test]
    fn list_values_includes_all_leaves() {
        match list_values(&sample()) {
            ParamResult::Listing { entries } => {
                let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["database.pool_size", "database.url", "host", "port"]);
                let url = entries.iter().find(|(k, _)| k == "database.url").unwrap();
                assert_eq!(url.1, "<not set>");
            }
            other => panic!("Expected Listing, got {other:?}"),
        }
    }

    #[test]
    fn listing_display_format() {
        let result = ParamResult::Listing {
            entries: vec![
                ("host".into(), "localhost".into()),
                ("port".into(), "8080".into()),
            ],
        };
        assert_eq!(format!("{result}"), "host = localhost\nport = 8080");
    }

    #[test]
    fn handle_set_on_plain_parameters_guesses_types() {
        let mut params = Parameters::new();
        handle(&mut params, ParamAction::Set { key: "a.port".into(), value: "3000".into() }).unwrap();
        handle(&mut params, ParamAction::Set { key: "a.debug".into(), value: "TRUE".into() }).unwrap();
        handle(&mut params, ParamAction::Set { key: "a.rate".into(), value: "1.5".into() }).unwrap();
        handle(&mut params, ParamAction::Set { key: "a.name".into(), value: "inf".into() }).unwrap();
        assert_eq!(params.get("a.port"), Some(&Value::Integer(3000)));
        assert_eq!(params.get("a.debug"), Some(&Value::Bool(true)));
        assert_eq!(params.get("a.rate"), Some(&Value::Float(1.5)));
        assert_eq!(params.get("a.name"), Some(&Value::from("inf")));
    }

    #[test]
    fn handle_unset() {
        let mut params = sample();
        let result = handle(&mut params, ParamAction::Unset { key: "database.pool_size".into() })
            .unwrap();
        assert_eq!(result.to_string(), "Unset database.pool_size");
        assert!(!params.exists("database.pool_size"));
    }

    #[test]
    fn handle_set_on_defined_parameters_converts() {
        let mut params = DefinedParameters::new(shared_profile()).unwrap();
        let result = handle(&mut params, ParamAction::Set { key: "age".into(), value: "41".into() })
            .unwrap();
        assert_eq!(result.to_string(), "Set age = 41");
        assert_eq!(params.get("age"), Some(&Value::Integer(41)));
    }

    #[test]
    fn handle_set_undeclared_key_on_defined_parameters_errors() {
        let mut params = DefinedParameters::new(shared_profile()).unwrap();
        let result = handle(&mut params, ParamAction::Set { key: "stray".into(), value: "1".into() });
        assert!(matches!(result, Err(ParamsError::KeyNotFound(k)) if k == "stray"));
    }

    #[test]
    fn handle_set_undeclared_key_without_separator_errors() {
        let mut params =
            DefinedParameters::with_separator(shared_profile(), Table::new(), "").unwrap();
        let result = handle(&mut params, ParamAction::Set { key: "stray".into(), value: "1".into() });
        assert!(matches!(result, Err(ParamsError::KeyNotFound(k)) if k == "stray"));
        assert!(!params.exists("stray"));

        handle(&mut params, ParamAction::Set { key: "age".into(), value: "7".into() }).unwrap();
        assert_eq!(params.get("age"), Some(&Value::Integer(7)));
    }

    #[test]
    fn handle_set_path_on_defined_parameters_is_unsupported() {
        let mut params = DefinedParameters::new(shared_profile()).unwrap();
        let result =
            handle(&mut params, ParamAction::Set { key: "name.first".into(), value: "A".into() });
        assert!(matches!(result, Err(ParamsError::UnsupportedOperation(_))));
    }

    #[test]
    fn handle_get_and_list_on_defined_parameters() {
        let mut params = DefinedParameters::new(shared_profile()).unwrap();
        let got = handle(&mut params, ParamAction::Get { key: "active".into() }).unwrap();
        assert_eq!(got.to_string(), "active = true");
        match handle(&mut params, ParamAction::List).unwrap() {
            ParamResult::Listing { entries } => assert_eq!(entries.len(), 6),
            other => panic!("Expected Listing, got {other:?}"),
        }
    }

    #[test]
    fn raw_value_parsing() {
        assert_eq!(parse_raw_value("42"), Value::Integer(42));
        assert_eq!(parse_raw_value("false"), Value::Bool(false));
        assert_eq!(parse_raw_value("1.5"), Value::Float(1.5));
        assert_eq!(parse_raw_value("hello"), Value::from("hello"));
        assert_eq!(parse_raw_value("NaN"), Value::from("NaN"));
    }
}
