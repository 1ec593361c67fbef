//! Host environment: the global registry and the values behind it
//!
//! Templates may reference a fixed allow-list of host globals without the
//! caller binding them. This module owns that allow-list, the reserved words
//! that are never free variables, and the [`HostEnvironment`] seam through
//! which allow-listed names are resolved at render time.

mod builtins;
pub mod date;
pub mod uri;
mod url;

use indexmap::IndexMap;

use crate::value::Value;

pub use builtins::Builtin;
pub(crate) use builtins::format_radix;
pub use self::url::{construct_url, url_property};

/// Identifiers resolved against the host rather than the render context
pub const HOST_GLOBALS: &[&str] = &[
    "Array",
    "Date",
    "Intl",
    "JSON",
    "Math",
    "NaN",
    "Number",
    "Object",
    "URL",
    "document",
    "window",
    "history",
    "innerHeight",
    "innerWidth",
    "localStorage",
    "location",
    "sessionStorage",
    "unescape",
    "encodeURI",
    "encodeURIComponent",
    "decodeURI",
    "decodeURIComponent",
    "escape",
    "process",
    "global",
];

/// Words that can never be free variables of an expression
pub const RESERVED: &[&str] = &[
    "in",
    "if",
    "else",
    "each",
    "for",
    "false",
    "true",
    "function",
    "instanceof",
    "null",
    "undefined",
    "let",
    "new",
    "this",
    "var",
    "while",
    "typeof",
];

pub fn is_host_global(name: &str) -> bool {
    HOST_GLOBALS.contains(&name)
}

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Read access to the host's global namespace.
///
/// Only consulted for names in [`HOST_GLOBALS`]; returning `None` makes the
/// name evaluate to `undefined`.
pub trait HostEnvironment {
    fn global(&self, name: &str) -> Option<Value>;
}

/// Built-in host: `Math`, `JSON`, `Date`, `URL` and friends, plus
/// caller-supplied values for the browser-only names (`location`,
/// `localStorage`, ...), which are otherwise undefined.
#[derive(Debug, Clone, Default)]
pub struct StandardHost {
    values: IndexMap<String, Value>,
}

impl StandardHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supply a value for an allow-listed global. Names outside the
    /// allow-list are rejected because templates could never reach them.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        if !is_host_global(name) {
            tracing::warn!("Ignoring host value for {}: not an allow-listed global", name);
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }

    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }
}

impl HostEnvironment for StandardHost {
    fn global(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        builtin_global(name)
    }
}

/// Value of a built-in global, if the standard host defines one
pub fn builtin_global(name: &str) -> Option<Value> {
    if name == "NaN" {
        return Some(Value::Number(f64::NAN));
    }
    Builtin::from_name(name).map(Value::Builtin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_membership() {
        assert!(is_host_global("Math"));
        assert!(is_host_global("localStorage"));
        assert!(!is_host_global("message"));
        assert!(is_reserved("instanceof"));
        assert!(!is_reserved("Math"));
    }

    #[test]
    fn test_standard_host_builtins() {
        let host = StandardHost::new();
        assert_eq!(host.global("Math"), Some(Value::Builtin(Builtin::Math)));
        assert!(matches!(host.global("NaN"), Some(Value::Number(n)) if n.is_nan()));
        assert_eq!(host.global("location"), None);
    }

    #[test]
    fn test_standard_host_supplied_values() {
        let mut host = StandardHost::new().with_value("location", "https://example.com/");
        assert_eq!(
            host.global("location"),
            Some(Value::from("https://example.com/"))
        );
        assert!(!host.set("message", Value::from("nope")));
        assert_eq!(host.global("message"), None);
    }
}
