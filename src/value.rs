//! Runtime values produced by expression evaluation

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use url::Url;

use crate::host::Builtin;

/// A value in the template context or produced by an expression
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent sentinel: an unbound identifier or a missing property
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(IndexMap<String, Value>),
    /// An instant in time, always handled in UTC
    Date(DateTime<Utc>),
    Url(Url),
    /// A host namespace, constructor or function such as `Math` or `encodeURI`
    Builtin(Builtin),
}

impl Value {
    /// Convert to string for output, following the host language's
    /// stringification rules
    pub fn to_output_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(arr) => arr
                .iter()
                .map(|v| {
                    if v.is_nullish() {
                        String::new()
                    } else {
                        v.to_output_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Date(dt) => dt
                .format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
                .to_string(),
            Value::Url(url) => url.as_str().to_string(),
            Value::Builtin(b) => b.to_output_string(),
        }
    }

    /// Check if the value is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_)
            | Value::Object(_)
            | Value::Date(_)
            | Value::Url(_)
            | Value::Builtin(_) => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Name reported by the `typeof` operator
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Builtin(b) if b.is_callable() => "function",
            Value::Null
            | Value::Array(_)
            | Value::Object(_)
            | Value::Date(_)
            | Value::Url(_)
            | Value::Builtin(_) => "object",
        }
    }

    /// Numeric conversion used by arithmetic and relational operators
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => parse_numeric_string(s),
            Value::Date(dt) => dt.timestamp_millis() as f64,
            Value::Array(_) => parse_numeric_string(&self.to_output_string()),
            Value::Object(_) | Value::Url(_) | Value::Builtin(_) => f64::NAN,
        }
    }

    /// Reduce compound values to a primitive the way `+` and `==` do
    pub fn to_primitive(&self) -> Value {
        match self {
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Url(_) => {
                Value::String(self.to_output_string())
            }
            Value::Builtin(b) => Value::String(b.to_output_string()),
            other => other.clone(),
        }
    }

    /// Read a named property. Missing properties and property reads on
    /// nullish values yield `Undefined`.
    pub fn get_property(&self, key: &str) -> Value {
        match self {
            Value::Object(obj) => obj.get(key).cloned().unwrap_or(Value::Undefined),
            Value::Array(arr) => {
                if key == "length" {
                    return Value::Number(arr.len() as f64);
                }
                key.parse::<usize>()
                    .ok()
                    .and_then(|idx| arr.get(idx).cloned())
                    .unwrap_or(Value::Undefined)
            }
            Value::String(s) => {
                if key == "length" {
                    return Value::Number(s.chars().count() as f64);
                }
                key.parse::<usize>()
                    .ok()
                    .and_then(|idx| s.chars().nth(idx))
                    .map(|c| Value::String(c.to_string()))
                    .unwrap_or(Value::Undefined)
            }
            Value::Url(url) => crate::host::url_property(url, key),
            Value::Builtin(b) => b.property(key),
            _ => Value::Undefined,
        }
    }

    /// Read a computed property (`value[key]`)
    pub fn get_index(&self, key: &Value) -> Value {
        match key {
            Value::Number(n) => self.get_property(&format_number(*n)),
            other => self.get_property(&other.to_output_string()),
        }
    }

    /// `===` semantics. Compound values compare structurally because the
    /// renderer only ever sees copies.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.strict_equals(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.strict_equals(w)))
            }
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Url(a), Value::Url(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }

    /// `==` semantics: nullish values equal each other, primitives are
    /// coerced to numbers when their types differ
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Value::String(_), Value::String(_))
            | (Value::Number(_), Value::Number(_))
            | (Value::Bool(_), Value::Bool(_)) => self.strict_equals(other),
            (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                Value::Number(self.to_number()).loose_equals(&Value::Number(other.to_number()))
            }
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (a, b) if a.is_compound() && b.is_compound() => a.strict_equals(b),
            (a, b) if a.is_compound() => a.to_primitive().loose_equals(b),
            (a, b) if b.is_compound() => a.loose_equals(&b.to_primitive()),
            (a, b) => a.strict_equals(b),
        }
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Url(_) | Value::Builtin(_)
        )
    }

    /// Entries in host enumeration order: integer-like keys ascending, then
    /// the remaining keys in insertion order. Arrays and strings enumerate by
    /// position.
    pub fn entries(&self) -> Option<Vec<(Value, Value)>> {
        match self {
            Value::Array(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (Value::Number(i as f64), v.clone()))
                    .collect(),
            ),
            Value::Object(obj) => Some(
                ordered_keys(obj)
                    .into_iter()
                    .map(|k| (Value::String(k.clone()), obj[k].clone()))
                    .collect(),
            ),
            Value::String(s) => Some(
                s.chars()
                    .enumerate()
                    .map(|(i, c)| (Value::Number(i as f64), Value::String(c.to_string())))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Convert from serde_json::Value
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => Value::Array(arr.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to serde_json::Value. Returns `None` for values that have no
    /// JSON form (`undefined` and functions), which objects omit and arrays
    /// write as `null`.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Undefined => None,
            Value::Builtin(b) if b.is_callable() => None,
            Value::Builtin(_) => Some(serde_json::Value::Object(serde_json::Map::new())),
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::Number(n) => Some(
                json_number(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            ),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Array(arr) => Some(serde_json::Value::Array(
                arr.iter()
                    .map(|v| v.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            )),
            Value::Object(obj) => Some(serde_json::Value::Object(
                obj.iter()
                    .filter_map(|(k, v)| v.to_json().map(|j| (k.clone(), j)))
                    .collect(),
            )),
            Value::Date(dt) => Some(serde_json::Value::String(
                dt.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            Value::Url(url) => Some(serde_json::Value::String(url.as_str().to_string())),
        }
    }
}

/// Format a number the way the host language prints it: the shortest
/// digits that round-trip, in exponent form once the decimal exponent
/// reaches 21 or drops below -6
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. `1.5e300`
    let scientific = format!("{:e}", n.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exponent + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int_part, frac_part) = digits.split_at(point as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat(-point as usize), digits)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, exponent.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, exponent.abs())
        }
    };

    if n < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}

fn json_number(n: f64) -> Option<serde_json::Number> {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Some(serde_json::Number::from(n as i64))
    } else {
        serde_json::Number::from_f64(n)
    }
}

fn parse_numeric_string(s: &str) -> f64 {
    let s = s.trim();
    match s {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                return i64::from_str_radix(hex, 16)
                    .map(|n| n as f64)
                    .unwrap_or(f64::NAN);
            }
            // Rust accepts "inf" and "nan" spellings the host does not
            if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
                return f64::NAN;
            }
            s.parse::<f64>().unwrap_or(f64::NAN)
        }
    }
}

/// Canonical array-index keys ("0", "17", but not "01" or "-1")
fn array_index_key(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|n| *n != u32::MAX)
}

pub(crate) fn ordered_keys(obj: &IndexMap<String, Value>) -> Vec<&String> {
    let mut indexed: Vec<(u32, &String)> = obj
        .keys()
        .filter_map(|k| array_index_key(k).map(|n| (n, k)))
        .collect();
    indexed.sort_by_key(|(n, _)| *n);

    let mut keys: Vec<&String> = indexed.into_iter().map(|(_, k)| k).collect();
    keys.extend(obj.keys().filter(|k| array_index_key(k).is_none()));
    keys
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

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_strings() {
        assert_eq!(Value::Undefined.to_output_string(), "undefined");
        assert_eq!(Value::Null.to_output_string(), "null");
        assert_eq!(Value::Number(3.0).to_output_string(), "3");
        assert_eq!(Value::Number(-0.0).to_output_string(), "0");
        assert_eq!(Value::Number(1.5).to_output_string(), "1.5");
        assert_eq!(Value::Number(f64::NAN).to_output_string(), "NaN");
        assert_eq!(
            Value::from(vec![Value::from(1), Value::Null, Value::from("x")]).to_output_string(),
            "1,,x"
        );
        assert_eq!(
            Value::from_json(&json!({"a": 1})).to_output_string(),
            "[object Object]"
        );
    }

    #[test]
    fn test_number_formatting() {
        let cases = [
            (1e21, "1e+21"),
            (1e-7, "1e-7"),
            (1.5e300, "1.5e+300"),
            (2f64.powi(60), "1152921504606847000"),
            (123456789012345680000.0, "123456789012345680000"),
            (0.000001, "0.000001"),
            (-2.5e-8, "-2.5e-8"),
            (0.1 + 0.2, "0.30000000000000004"),
            (123.456, "123.456"),
            (-42.0, "-42"),
            (f64::MAX, "1.7976931348623157e+308"),
            (5e-324, "5e-324"),
        ];
        for (n, expected) in cases {
            assert_eq!(format_number(n), expected);
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
        assert!(Value::Object(IndexMap::new()).is_truthy());
        assert!(Value::from("0").is_truthy());
    }

    #[test]
    fn test_property_access() {
        let value = Value::from_json(&json!({"name": "p1", "tags": ["a", "b"]}));
        assert_eq!(value.get_property("name"), Value::from("p1"));
        assert_eq!(value.get_property("missing"), Value::Undefined);
        assert_eq!(
            value.get_property("tags").get_property("length"),
            Value::from(2)
        );
        assert_eq!(
            value.get_property("tags").get_index(&Value::from(1)),
            Value::from("b")
        );
        assert_eq!(Value::from("héllo").get_property("length"), Value::from(5));
        assert_eq!(Value::Undefined.get_property("x"), Value::Undefined);
    }

    #[test]
    fn test_equality() {
        assert!(Value::from("abc").strict_equals(&Value::from("abc")));
        assert!(!Value::from(1).strict_equals(&Value::from("1")));
        assert!(Value::from(1).loose_equals(&Value::from("1")));
        assert!(Value::Null.loose_equals(&Value::Undefined));
        assert!(!Value::Null.loose_equals(&Value::from(0)));
        assert!(Value::Bool(true).loose_equals(&Value::from(1)));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_numeric_conversion() {
        assert_eq!(Value::from(" 42 ").to_number(), 42.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert!(Value::from("abc").to_number().is_nan());
        assert!(Value::from("inf").to_number().is_nan());
        assert_eq!(Value::from("0x1f").to_number(), 31.0);
        assert_eq!(Value::Array(vec![]).to_number(), 0.0);
        assert!(Value::Undefined.to_number().is_nan());
    }

    #[test]
    fn test_object_enumeration_order() {
        let value = Value::from_json(&json!({"b": 1, "2": 2, "a": 3, "1": 4, "01": 5}));
        let keys: Vec<String> = value
            .entries()
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.to_output_string())
            .collect();
        assert_eq!(keys, vec!["1", "2", "b", "a", "01"]);
    }

    #[test]
    fn test_json_round_trip_omits_undefined() {
        let mut obj = IndexMap::new();
        obj.insert("a".to_string(), Value::from(1));
        obj.insert("b".to_string(), Value::Undefined);
        let json = Value::Object(obj).to_json().unwrap();
        assert_eq!(json, json!({"a": 1}));
        assert_eq!(Value::Undefined.to_json(), None);
    }
}
