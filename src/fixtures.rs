#[cfg(test)]
pub mod test {
    use std::sync::Arc;

    use crate::definitions::Definitions;
    use crate::value::{Table, Value};

    /// Build a `Table` from a JSON object literal.
    pub fn table(json: serde_json::Value) -> Table {
        match Value::from(json) {
            Value::Table(t) => t,
            other => panic!("fixture must be a JSON object, got {other:?}"),
        }
    }

    /// A small user-profile schema exercising most field types.
    pub fn profile_definitions() -> Definitions {
        let mut defs = Definitions::new();
        defs.add("name", "string", Value::Null, true)
            .add("age", "integer", 0, false)
            .add("active", "boolean", true, false)
            .add("id", "identifier", Value::Null, false)
            .add("tags", "array:string", Value::Null, false)
            .add("created", "date", Value::Null, false);
        defs
    }

    pub fn shared_profile() -> Arc<Definitions> {
        Arc::new(profile_definitions())
    }

    #[test]
    fn profile_defaults_format_cleanly() {
        let formatted = profile_definitions().format(Table::new()).unwrap();
        assert_eq!(formatted["age"], Value::Integer(0));
        assert_eq!(formatted["active"], Value::Bool(true));
        assert_eq!(formatted["name"], Value::Null);
        assert_eq!(formatted.len(), 6);
    }
}
