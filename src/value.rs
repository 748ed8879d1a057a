//! The value model stored in a parameter tree.
//!
//! A [`Value`] is a scalar, a date, a list, or a nested [`Table`]. Trees are
//! always built from owned data, so a table can never reference itself or be
//! shared between two containers.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParamsError;

/// A nested mapping from string keys to values.
pub type Table = BTreeMap<String, Value>;

/// A single node of a parameter tree.
///
/// Equality is strict: `Integer(1)` is not equal to `Float(1.0)` or
/// `String("1")`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(#[serde(with = "float_repr")] f64),
    String(String),
    Date(DateTime<Utc>),
    Array(Vec<Value>),
    Table(Table),
}

/// Serde form of [`Value::Float`]. JSON has no literal for non-finite
/// numbers, so those travel as the strings `"inf"`, `"-inf"` and `"nan"`.
mod float_repr {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("nan")
        } else if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "inf" } else { "-inf" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(f) => Ok(f),
            Repr::Text(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"a number, \"inf\", \"-inf\" or \"nan\"",
                )),
            },
        }
    }
}

/// A number recognised in a value, see [`Value::as_number`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// Parse a numeric string. Surrounding whitespace is ignored; `inf` and
    /// `NaN` spellings are not numbers.
    pub fn parse(s: &str) -> Option<Number> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(Number::Int(i));
        }
        if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
            return None;
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => Some(Number::Float(f)),
            _ => None,
        }
    }

    /// Integer part, truncating toward zero and saturating at the `i64` bounds.
    pub fn truncate(self) -> i64 {
        match self {
            Number::Int(i) => i,
            Number::Float(f) => f.trunc() as i64,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
        }
    }

    /// Loose truthiness: null, `false`, zero, `""`, `"0"` and empty
    /// containers are false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !(s.is_empty() || s == "0"),
            Value::Date(_) => true,
            Value::Array(a) => !a.is_empty(),
            Value::Table(t) => !t.is_empty(),
        }
    }

    /// The numeric reading of this value, if it has one. Numeric strings
    /// count; booleans do not.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Integer(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            Value::String(s) => Number::parse(s),
            _ => None,
        }
    }

    /// Deep-cast any serializable value (typically a struct) into a `Value`.
    /// Structs and maps become tables, sequences become arrays.
    pub fn from_serialize<S: Serialize + ?Sized>(source: &S) -> Result<Value, ParamsError> {
        Ok(serde_json::to_value(source)?.into())
    }

    /// Render this value as a table key.
    ///
    /// Integers print in decimal, booleans as `1`/`0`, floats truncate, null
    /// becomes the empty key. Lists and tables cannot be keys.
    pub fn to_key(&self) -> Result<String, ParamsError> {
        match self {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(if *b { "1" } else { "0" }.to_string()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(Number::Float(*f).truncate().to_string()),
            Value::String(s) => Ok(s.clone()),
            Value::Date(d) => Ok(d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Array(_) | Value::Table(_) => Err(ParamsError::invalid_value(
                "<key>",
                format!("a {} cannot be used as a table key", self.type_name()),
            )),
        }
    }

    /// Plain JSON rendering. Dates become RFC 3339 strings; non-finite floats
    /// become `null`.
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => {
                serde_json::Value::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Array(a) => serde_json::Value::Array(a.iter().map(Value::to_json_value).collect()),
            Value::Table(t) => serde_json::Value::Object(
                t.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }

    /// TOML rendering. TOML has no null, so `Null` yields `None` and null
    /// entries inside lists and tables are dropped.
    pub fn to_toml(&self) -> Option<toml::Value> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(toml::Value::Boolean(*b)),
            Value::Integer(i) => Some(toml::Value::Integer(*i)),
            Value::Float(f) => Some(toml::Value::Float(*f)),
            Value::String(s) => Some(toml::Value::String(s.clone())),
            Value::Date(d) => {
                let text = d.to_rfc3339_opts(SecondsFormat::AutoSi, true);
                match text.parse::<toml::value::Datetime>() {
                    Ok(dt) => Some(toml::Value::Datetime(dt)),
                    Err(_) => Some(toml::Value::String(text)),
                }
            }
            Value::Array(a) => Some(toml::Value::Array(
                a.iter().filter_map(Value::to_toml).collect(),
            )),
            Value::Table(t) => Some(toml::Value::Table(table_to_toml(t))),
        }
    }
}

/// Convert a tree to a `toml::Table`, dropping null entries.
pub fn table_to_toml(table: &Table) -> toml::Table {
    table
        .iter()
        .filter_map(|(k, v)| v.to_toml().map(|tv| (k.clone(), tv)))
        .collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Array(_) | Value::Table(_) => write!(f, "{}", self.to_json_value()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::Array(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => {
                Value::Table(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => {
                let text = dt.to_string();
                match DateTime::parse_from_rfc3339(&text) {
                    Ok(d) => Value::Date(d.with_timezone(&Utc)),
                    // Local dates and times carry no offset.
                    Err(_) => Value::String(text),
                }
            }
            toml::Value::Array(a) => Value::Array(a.into_iter().map(Value::from).collect()),
            toml::Value::Table(t) => {
                Value::Table(t.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn truthiness_matches_loose_rules() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from("0").is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(!Value::Table(Table::new()).is_truthy());

        assert!(Value::from("false").is_truthy());
        assert!(Value::from("no").is_truthy());
        assert!(Value::Integer(-1).is_truthy());
        assert!(Value::Array(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn number_parsing() {
        assert_eq!(Number::parse("42"), Some(Number::Int(42)));
        assert_eq!(Number::parse(" -7 "), Some(Number::Int(-7)));
        assert_eq!(Number::parse("1.5"), Some(Number::Float(1.5)));
        assert_eq!(Number::parse("1e3"), Some(Number::Float(1000.0)));
        assert_eq!(Number::parse("abc"), None);
        assert_eq!(Number::parse(""), None);
        assert_eq!(Number::parse("inf"), None);
        assert_eq!(Number::parse("NaN"), None);
        assert_eq!(Number::Float(-2.9).truncate(), -2);
    }

    #[test]
    fn booleans_are_not_numbers() {
        assert_eq!(Value::Bool(true).as_number(), None);
    }

    #[test]
    fn strict_equality() {
        assert_ne!(Value::Integer(1), Value::Float(1.0));
        assert_ne!(Value::Integer(1), Value::from("1"));
        assert_eq!(Value::from("a"), Value::String("a".into()));
    }

    #[test]
    fn from_json_object_becomes_table() {
        let json = serde_json::json!({"a": {"b": [1, 2.5, null, "x"]}, "c": true});
        let value = Value::from(json);
        let a = value.as_table().unwrap()["a"].as_table().unwrap();
        assert_eq!(
            a["b"],
            Value::Array(vec![
                Value::Integer(1),
                Value::Float(2.5),
                Value::Null,
                Value::from("x"),
            ])
        );
        assert_eq!(value.as_table().unwrap()["c"], Value::Bool(true));
    }

    #[test]
    fn from_serialize_deep_casts_structs() {
        #[derive(Serialize)]
        struct Inner {
            url: Option<String>,
            pool_size: u32,
        }
        #[derive(Serialize)]
        struct Outer {
            host: String,
            database: Inner,
        }

        let value = Value::from_serialize(&Outer {
            host: "localhost".into(),
            database: Inner {
                url: None,
                pool_size: 5,
            },
        })
        .unwrap();

        let table = value.as_table().unwrap();
        assert_eq!(table["host"], Value::from("localhost"));
        let db = table["database"].as_table().unwrap();
        assert_eq!(db["url"], Value::Null);
        assert_eq!(db["pool_size"], Value::Integer(5));
    }

    #[test]
    fn from_toml_table() {
        let parsed: toml::Table = toml::from_str(
            r#"
            host = "0.0.0.0"
            since = 2024-01-02T03:04:05Z

            [database]
            pool_size = 20
            "#,
        )
        .unwrap();
        let value = Value::from(toml::Value::Table(parsed));
        let table = value.as_table().unwrap();
        assert_eq!(table["host"], Value::from("0.0.0.0"));
        assert_eq!(
            table["since"],
            Value::Date(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
        );
        assert_eq!(
            table["database"].as_table().unwrap()["pool_size"],
            Value::Integer(20)
        );
    }

    #[test]
    fn to_toml_drops_nulls() {
        let mut table = Table::new();
        table.insert("keep".into(), Value::Integer(1));
        table.insert("drop".into(), Value::Null);
        table.insert(
            "list".into(),
            Value::Array(vec![Value::Integer(1), Value::Null]),
        );
        let toml = table_to_toml(&table);
        assert_eq!(toml["keep"].as_integer(), Some(1));
        assert!(!toml.contains_key("drop"));
        assert_eq!(toml["list"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn key_rendering() {
        assert_eq!(Value::Integer(7).to_key().unwrap(), "7");
        assert_eq!(Value::Bool(true).to_key().unwrap(), "1");
        assert_eq!(Value::Bool(false).to_key().unwrap(), "0");
        assert_eq!(Value::Float(2.7).to_key().unwrap(), "2");
        assert_eq!(Value::Null.to_key().unwrap(), "");
        assert!(matches!(
            Value::Array(vec![]).to_key(),
            Err(ParamsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::Integer(8080).to_string(), "8080");
        assert_eq!(
            Value::from(vec![1i64, 2]).to_string(),
            "[1,2]"
        );
        let date = Utc.with_ymd_and_hms(2020, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(Value::Date(date).to_string(), "2020-05-06T07:08:09Z");
    }

    #[test]
    fn float_serde_spells_out_non_finite_values() {
        assert_eq!(
            serde_json::to_string(&Value::Float(f64::NEG_INFINITY)).unwrap(),
            r#"{"Float":"-inf"}"#
        );
        assert_eq!(serde_json::to_string(&Value::Float(0.5)).unwrap(), r#"{"Float":0.5}"#);
        let restored: Value = serde_json::from_str(r#"{"Float":"inf"}"#).unwrap();
        assert_eq!(restored, Value::Float(f64::INFINITY));
        let restored: Value = serde_json::from_str(r#"{"Float":3}"#).unwrap();
        assert_eq!(restored, Value::Float(3.0));
        assert!(serde_json::from_str::<Value>(r#"{"Float":"huge"}"#).is_err());
        assert!(serde_json::from_str::<Value>(r#"{"Float":null}"#).is_err());
    }
}
