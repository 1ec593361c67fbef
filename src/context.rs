//! Render context: the caller-supplied variables

use indexmap::IndexMap;

use crate::value::Value;

/// Rendering context for templates, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    variables: IndexMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            variables: IndexMap::new(),
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.variables.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Build a context from a JSON object. Returns `None` for any other
    /// JSON value.
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(map) = json else {
            return None;
        };
        Some(
            map.iter()
                .map(|(k, v)| (k.clone(), Value::from_json(v)))
                .collect(),
        )
    }

    /// Build a context from any value that serializes to a JSON object
    pub fn from_serialize<T: serde::Serialize>(value: &T) -> Option<Self> {
        serde_json::to_value(value)
            .ok()
            .and_then(|json| Self::from_json(&json))
    }

    pub fn variables(&self) -> &IndexMap<String, Value> {
        &self.variables
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn merge(&mut self, other: &Context) {
        for (k, v) in &other.variables {
            self.variables.insert(k.clone(), v.clone());
        }
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            variables: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;

    #[test]
    fn test_set_and_get() {
        let mut ctx = Context::new();
        ctx.set("title", "Hello");
        ctx.set("draft", false);
        ctx.set("count", 2.0);
        ctx.set("tags", vec!["a", "b"]);
        assert_eq!(ctx.get("title"), Some(&Value::from("Hello")));
        assert_eq!(ctx.get("draft"), Some(&Value::Bool(false)));
        assert_eq!(ctx.len(), 4);
        assert!(ctx.contains("tags"));
        assert!(!ctx.contains("missing"));
    }

    #[test]
    fn test_from_json_requires_object() {
        let ctx = Context::from_json(&json!({"b": 1, "a": 2})).unwrap();
        let keys: Vec<&String> = ctx.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(Context::from_json(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_from_serialize_and_merge() {
        #[derive(Serialize)]
        struct Page {
            title: String,
            views: u32,
        }

        let mut ctx = Context::from_serialize(&Page {
            title: "About".to_string(),
            views: 7,
        })
        .unwrap();
        let mut other = Context::new();
        other.set("views", 8);
        other.set("extra", true);
        ctx.merge(&other);

        assert_eq!(ctx.get("title"), Some(&Value::from("About")));
        assert_eq!(ctx.get("views"), Some(&Value::from(8)));
        assert_eq!(ctx.len(), 3);
    }
}
