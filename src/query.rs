//! Query-string input: `a.b=1&c=x%20y` into a nested `Table`.

use percent_encoding::percent_decode_str;

use crate::params::Parameters;
use crate::value::{Table, Value};

/// Build a `Table` from a URL query string.
///
/// Keys are split on `separator` into nested tables. Keys and values are
/// percent-decoded and `+` reads as a space. A key without `=` maps to the
/// empty string; when a key repeats, the last pair wins. Values stay raw
/// strings.
pub fn query_to_table(query: &str, separator: &str) -> Table {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut params = Parameters::with_separator(separator);

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode(key);
        if key.is_empty() {
            continue;
        }
        params.set(&key, Value::String(decode(value)));
    }

    params.into_table()
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_pairs() {
        let table = query_to_table("host=localhost&port=8080", ".");
        assert_eq!(table["host"], Value::from("localhost"));
        assert_eq!(table["port"], Value::from("8080"));
    }

    #[test]
    fn dotted_keys_nest() {
        let table = query_to_table("database.url=pg%3A%2F%2Fdb&database.pool=5", ".");
        let db = table["database"].as_table().unwrap();
        assert_eq!(db["url"], Value::from("pg://db"));
        assert_eq!(db["pool"], Value::from("5"));
    }

    #[test]
    fn plus_and_percent_decode_to_spaces() {
        let table = query_to_table("?name=Ada+Lovelace&note=a%20b", ".");
        assert_eq!(table["name"], Value::from("Ada Lovelace"));
        assert_eq!(table["note"], Value::from("a b"));
    }

    #[test]
    fn bare_key_is_empty_string() {
        let table = query_to_table("debug&&=ignored", ".");
        assert_eq!(table["debug"], Value::from(""));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn last_pair_wins() {
        let table = query_to_table("port=1&port=2", ".");
        assert_eq!(table["port"], Value::from("2"));
    }

    #[test]
    fn custom_separator() {
        let table = query_to_table("a/b=1", "/");
        assert_eq!(table["a"].as_table().unwrap()["b"], Value::from("1"));
    }
}
