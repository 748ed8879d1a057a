//! Field definitions: the schema that types, defaults and validates
//! parameters.
//!
//! A [`Definitions`] is an ordered list of fields, each with a [`TypeSpec`],
//! a default value and a required flag. It converts raw input (often strings
//! from env vars or query strings) into typed values and projects candidate
//! tables onto the declared fields.
//!
//! # Type names
//!
//! | Name                 | Conversion                                              |
//! |----------------------|---------------------------------------------------------|
//! | `string`             | scalar to string                                        |
//! | `integer`            | number, numeric string, bool or date to integer         |
//! | `boolean`            | `"true"`/`"false"` literally, otherwise truthiness      |
//! | `identifier`         | numeric input to integer, anything else to string       |
//! | `object`             | cast to a table                                         |
//! | `date`               | Unix seconds or a date string to a UTC timestamp        |
//! | `array`              | cast to a list (tables stay tables)                     |
//! | `array:<t>`          | as `array`, converting every element with `<t>`         |
//! | `array:<k>,<v>`      | table with keys converted by `<k>`, values by `<v>`     |
//!
//! Unknown names pass values through unchanged. Null converts to null under
//! every type.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::error::ParamsError;
use crate::value::{Number, Table, Value};

/// A parsed type name. Parsing never fails: unrecognised names become
/// [`TypeSpec::Untyped`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    String,
    Integer,
    Boolean,
    Identifier,
    Object,
    Date,
    /// `array`: cast only, elements untouched.
    Array,
    /// `array:<elem>`: convert every element, keeping keys and positions.
    ArrayOf(Box<TypeSpec>),
    /// `array:<key>,<value>`: rebuild as a table, converting keys and values.
    /// Keys that convert to the same value overwrite each other.
    MapOf(Box<TypeSpec>, Box<TypeSpec>),
    /// Any other name.
    Untyped(String),
}

impl TypeSpec {
    pub fn parse(name: &str) -> TypeSpec {
        if let Some(rest) = strip_array_prefix(name) {
            return match rest.strip_prefix(':') {
                Some(spec) => match spec.split_once(',') {
                    Some((key, value)) => TypeSpec::MapOf(
                        Box::new(TypeSpec::parse(key)),
                        Box::new(TypeSpec::parse(value)),
                    ),
                    None => TypeSpec::ArrayOf(Box::new(TypeSpec::parse(spec))),
                },
                None => TypeSpec::Array,
            };
        }
        match name {
            "string" => TypeSpec::String,
            "integer" => TypeSpec::Integer,
            "boolean" => TypeSpec::Boolean,
            "identifier" => TypeSpec::Identifier,
            "object" => TypeSpec::Object,
            "date" => TypeSpec::Date,
            other => TypeSpec::Untyped(other.to_string()),
        }
    }

    /// Convert `value` to this type.
    ///
    /// Fails with [`ParamsError::InvalidValue`] when the value has no sensible
    /// reading as the target type (a word as an integer, a table as a string,
    /// an unparseable date). The key in the error is a placeholder; callers
    /// that know the field name replace it.
    pub fn convert(&self, value: Value) -> Result<Value, ParamsError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            TypeSpec::Array => Ok(cast_to_array(value)),
            TypeSpec::ArrayOf(elem) => match cast_to_array(value) {
                Value::Table(t) => {
                    let converted = t
                        .into_iter()
                        .map(|(k, v)| elem.convert(v).map(|v| (k, v)))
                        .collect::<Result<Table, _>>()?;
                    Ok(Value::Table(converted))
                }
                Value::Array(items) => {
                    let converted = items
                        .into_iter()
                        .map(|v| elem.convert(v))
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Value::Array(converted))
                }
                other => elem.convert(other),
            },
            TypeSpec::MapOf(key_spec, value_spec) => {
                let mut converted = Table::new();
                for (key, value) in entries(value) {
                    let key = key_spec.convert(key)?.to_key()?;
                    converted.insert(key, value_spec.convert(value)?);
                }
                Ok(Value::Table(converted))
            }
            TypeSpec::Identifier => match value.as_number() {
                Some(n) => Ok(Value::Integer(n.truncate())),
                None => to_string(value),
            },
            TypeSpec::Object => Ok(cast_to_table(value)),
            TypeSpec::String => to_string(value),
            TypeSpec::Integer => to_integer(value),
            TypeSpec::Date => to_date(value),
            TypeSpec::Boolean => Ok(match value {
                Value::String(s) if s == "true" => Value::Bool(true),
                Value::String(s) if s == "false" => Value::Bool(false),
                other => Value::Bool(other.is_truthy()),
            }),
            TypeSpec::Untyped(_) => Ok(value),
        }
    }
}

fn strip_array_prefix(name: &str) -> Option<&str> {
    let prefix = name.get(..5)?;
    if prefix.eq_ignore_ascii_case("array") {
        name.get(5..)
    } else {
        None
    }
}

impl FromStr for TypeSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TypeSpec::parse(s))
    }
}

impl From<&str> for TypeSpec {
    fn from(s: &str) -> Self {
        TypeSpec::parse(s)
    }
}

impl From<String> for TypeSpec {
    fn from(s: String) -> Self {
        TypeSpec::parse(&s)
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::String => write!(f, "string"),
            TypeSpec::Integer => write!(f, "integer"),
            TypeSpec::Boolean => write!(f, "boolean"),
            TypeSpec::Identifier => write!(f, "identifier"),
            TypeSpec::Object => write!(f, "object"),
            TypeSpec::Date => write!(f, "date"),
            TypeSpec::Array => write!(f, "array"),
            TypeSpec::ArrayOf(elem) => write!(f, "array:{elem}"),
            TypeSpec::MapOf(key, value) => write!(f, "array:{key},{value}"),
            TypeSpec::Untyped(name) => write!(f, "{name}"),
        }
    }
}

/// Scalars become a one-element list; lists and tables are kept.
fn cast_to_array(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Table(_) => value,
        scalar => Value::Array(vec![scalar]),
    }
}

/// Lists become tables keyed by position; scalars land under key `0`.
fn cast_to_table(value: Value) -> Value {
    match value {
        Value::Table(_) => value,
        Value::Array(items) => Value::Table(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        scalar => Value::Table(Table::from([("0".to_string(), scalar)])),
    }
}

/// Key/value pairs of a value cast to an array. List positions are integer keys.
fn entries(value: Value) -> Vec<(Value, Value)> {
    match cast_to_array(value) {
        Value::Table(t) => t.into_iter().map(|(k, v)| (Value::String(k), v)).collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Value::Integer(i as i64), v))
            .collect(),
        scalar => vec![(Value::Integer(0), scalar)],
    }
}

fn to_string(value: Value) -> Result<Value, ParamsError> {
    match value {
        Value::String(_) => Ok(value),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Integer(i) => Ok(Value::String(i.to_string())),
        Value::Float(f) => Ok(Value::String(f.to_string())),
        Value::Date(d) => Ok(Value::String(d.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
        other => Err(ParamsError::invalid_value(
            "<value>",
            format!("cannot convert a {} to a string", other.type_name()),
        )),
    }
}

fn to_integer(value: Value) -> Result<Value, ParamsError> {
    match value {
        Value::Integer(_) => Ok(value),
        Value::Float(f) => Ok(Value::Integer(Number::Float(f).truncate())),
        Value::Bool(b) => Ok(Value::Integer(i64::from(b))),
        Value::Date(d) => Ok(Value::Integer(d.timestamp())),
        Value::String(s) => match Number::parse(&s) {
            Some(n) => Ok(Value::Integer(n.truncate())),
            None => Err(ParamsError::invalid_value(
                "<value>",
                format!("expected an integer, got \"{s}\""),
            )),
        },
        other => Err(ParamsError::invalid_value(
            "<value>",
            format!("cannot convert a {} to an integer", other.type_name()),
        )),
    }
}

fn to_date(value: Value) -> Result<Value, ParamsError> {
    if let Value::Date(_) = value {
        return Ok(value);
    }
    let parsed = match &value {
        Value::Integer(secs) => DateTime::from_timestamp(*secs, 0),
        Value::Float(secs) => from_fractional_timestamp(*secs),
        Value::String(s) => match Number::parse(s) {
            Some(Number::Int(secs)) => DateTime::from_timestamp(secs, 0),
            Some(Number::Float(secs)) => from_fractional_timestamp(secs),
            None => parse_date(s),
        },
        _ => None,
    };
    parsed.map(Value::Date).ok_or_else(|| {
        ParamsError::invalid_value("<value>", format!("cannot read {value} as a date"))
    })
}

fn from_fractional_timestamp(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a free-form date string. Strings without an offset are UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Some(Utc::now());
    }
    if let Some(secs) = s.strip_prefix('@') {
        return DateTime::from_timestamp(secs.trim().parse().ok()?, 0);
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = DateTime::parse_from_rfc2822(s) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// The type, default and required flag of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub type_spec: TypeSpec,
    pub default: Value,
    pub required: bool,
}

impl FieldDescriptor {
    pub fn new(type_spec: impl Into<TypeSpec>, default: impl Into<Value>, required: bool) -> Self {
        Self {
            type_spec: type_spec.into(),
            default: default.into(),
            required,
        }
    }
}

/// An ordered set of field descriptors.
///
/// Build it once, then share it (typically behind an `Arc`) between every
/// [`DefinedParameters`](crate::DefinedParameters) that uses it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Definitions {
    fields: Vec<(String, FieldDescriptor)>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Re-declaring a key replaces its descriptor in place.
    ///
    /// ```ignore
    /// let mut defs = Definitions::new();
    /// defs.add("age", "integer", 0, false)
    ///     .add("name", "string", Value::Null, true)
    ///     .add("flags", "array:string,boolean", Value::Null, false);
    /// ```
    pub fn add(
        &mut self,
        key: impl Into<String>,
        type_spec: impl Into<TypeSpec>,
        default: impl Into<Value>,
        required: bool,
    ) -> &mut Self {
        self.add_field(key, FieldDescriptor::new(type_spec, default, required))
    }

    pub fn add_field(&mut self, key: impl Into<String>, field: FieldDescriptor) -> &mut Self {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.fields[i].1 = field,
            None => self.fields.push((key, field)),
        }
        self
    }

    pub fn has(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Result<&FieldDescriptor, ParamsError> {
        self.position(key)
            .map(|i| &self.fields[i].1)
            .ok_or_else(|| ParamsError::FieldNotDefined(key.to_string()))
    }

    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.fields.retain(|(k, _)| k != key);
        self
    }

    /// Field keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// All fields in declaration order.
    pub fn all(&self) -> &[(String, FieldDescriptor)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Convert `value` with the type of field `key`. Values for undeclared
    /// keys pass through unchanged.
    pub fn convert_for(&self, key: &str, value: Value) -> Result<Value, ParamsError> {
        match self.get(key) {
            Ok(field) => convert_field(key, &field.type_spec, value),
            Err(_) => Ok(value),
        }
    }

    pub fn convert_value(&self, type_spec: &TypeSpec, value: Value) -> Result<Value, ParamsError> {
        type_spec.convert(value)
    }

    /// Project `candidate` onto the declared fields.
    ///
    /// Every declared field appears in the result: the candidate's value when
    /// present and non-null, otherwise the field default, converted to the
    /// field type. Undeclared keys are dropped. Either every field converts or
    /// the call fails.
    pub fn format(&self, mut candidate: Table) -> Result<Table, ParamsError> {
        let mut formatted = Table::new();
        for (key, field) in &self.fields {
            let raw = match candidate.remove(key) {
                Some(v) if !v.is_null() => v,
                _ => field.default.clone(),
            };
            formatted.insert(key.clone(), convert_field(key, &field.type_spec, raw)?);
        }
        if !candidate.is_empty() {
            debug!(
                dropped = ?candidate.keys().collect::<Vec<_>>(),
                "dropping undeclared keys"
            );
        }
        Ok(formatted)
    }

    /// Whether `value` is strictly equal (type and value) to the default of
    /// field `key`.
    pub fn is_default_value(&self, key: &str, value: &Value) -> Result<bool, ParamsError> {
        Ok(self.get(key)?.default == *value)
    }

    /// Required fields that `candidate` does not supply, in declaration order.
    /// A null value does not count as supplied.
    pub fn missing_required<'a>(&'a self, candidate: &Table) -> Vec<&'a str> {
        self.fields
            .iter()
            .filter(|(key, field)| {
                field.required && !candidate.get(key).is_some_and(|v| !v.is_null())
            })
            .map(|(key, _)| key.as_str())
            .collect()
    }

    pub fn valid(&self, candidate: &Table) -> bool {
        self.missing_required(candidate).is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|(k, _)| k == key)
    }
}

fn convert_field(key: &str, type_spec: &TypeSpec, value: Value) -> Result<Value, ParamsError> {
    type_spec.convert(value).map_err(|err| match err {
        ParamsError::InvalidValue { reason, .. } => ParamsError::invalid_value(key, reason),
        other => other,
    })
}
