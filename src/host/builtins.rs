//! Built-in host namespaces, constructors and functions

use indexmap::IndexMap;
use serde::Serialize;

use super::{date, uri};
use crate::error::{Result, TemplateError};
use crate::value::{format_number, Value};

/// `new Array(n)` allocates every slot, so lengths are capped well below
/// the host's 2^32 - 1
const MAX_ARRAY_LENGTH: usize = 1 << 20;

/// A built-in global provided by the standard host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Array,
    Date,
    Intl,
    Json,
    Math,
    Number,
    Object,
    Url,
    EncodeUri,
    EncodeUriComponent,
    DecodeUri,
    DecodeUriComponent,
    Escape,
    Unescape,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "Array" => Builtin::Array,
            "Date" => Builtin::Date,
            "Intl" => Builtin::Intl,
            "JSON" => Builtin::Json,
            "Math" => Builtin::Math,
            "Number" => Builtin::Number,
            "Object" => Builtin::Object,
            "URL" => Builtin::Url,
            "encodeURI" => Builtin::EncodeUri,
            "encodeURIComponent" => Builtin::EncodeUriComponent,
            "decodeURI" => Builtin::DecodeUri,
            "decodeURIComponent" => Builtin::DecodeUriComponent,
            "escape" => Builtin::Escape,
            "unescape" => Builtin::Unescape,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Array => "Array",
            Builtin::Date => "Date",
            Builtin::Intl => "Intl",
            Builtin::Json => "JSON",
            Builtin::Math => "Math",
            Builtin::Number => "Number",
            Builtin::Object => "Object",
            Builtin::Url => "URL",
            Builtin::EncodeUri => "encodeURI",
            Builtin::EncodeUriComponent => "encodeURIComponent",
            Builtin::DecodeUri => "decodeURI",
            Builtin::DecodeUriComponent => "decodeURIComponent",
            Builtin::Escape => "escape",
            Builtin::Unescape => "unescape",
        }
    }

    /// Namespaces (`Math`, `JSON`, `Intl`) are plain objects; everything
    /// else can be called
    pub fn is_callable(&self) -> bool {
        !matches!(self, Builtin::Math | Builtin::Json | Builtin::Intl)
    }

    pub fn is_constructor(&self) -> bool {
        matches!(
            self,
            Builtin::Array | Builtin::Date | Builtin::Number | Builtin::Object | Builtin::Url
        )
    }

    pub fn to_output_string(&self) -> String {
        if self.is_callable() {
            format!("function {}() {{ [native code] }}", self.name())
        } else {
            format!("[object {}]", self.name())
        }
    }

    /// Constant properties such as `Math.PI`
    pub fn property(&self, key: &str) -> Value {
        let n = match (self, key) {
            (Builtin::Math, "PI") => std::f64::consts::PI,
            (Builtin::Math, "E") => std::f64::consts::E,
            (Builtin::Math, "LN2") => std::f64::consts::LN_2,
            (Builtin::Math, "LN10") => std::f64::consts::LN_10,
            (Builtin::Math, "SQRT2") => std::f64::consts::SQRT_2,
            (Builtin::Number, "MAX_SAFE_INTEGER") => 9_007_199_254_740_991.0,
            (Builtin::Number, "MIN_SAFE_INTEGER") => -9_007_199_254_740_991.0,
            (Builtin::Number, "EPSILON") => f64::EPSILON,
            (Builtin::Number, "NaN") => f64::NAN,
            (Builtin::Number, "POSITIVE_INFINITY") => f64::INFINITY,
            (Builtin::Number, "NEGATIVE_INFINITY") => f64::NEG_INFINITY,
            (_, "name") if self.is_callable() => return Value::from(self.name()),
            _ => return Value::Undefined,
        };
        Value::Number(n)
    }

    /// Call the builtin as a plain function, e.g. `Number(x)`
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Builtin::Number => Ok(Value::Number(
                args.first().map(Value::to_number).unwrap_or(0.0),
            )),
            Builtin::Date => Ok(Value::String(
                Value::Date(date::now()).to_output_string(),
            )),
            Builtin::Array => self.construct(args),
            Builtin::Object => Ok(match args.first() {
                Some(v @ (Value::Object(_) | Value::Array(_) | Value::Date(_) | Value::Url(_))) => {
                    v.clone()
                }
                _ => Value::Object(IndexMap::new()),
            }),
            Builtin::Url => Err(TemplateError::evaluation(
                "Class constructor URL cannot be invoked without 'new'",
            )),
            Builtin::EncodeUri => Ok(Value::String(uri::encode_uri(&string_arg(args, 0)))),
            Builtin::EncodeUriComponent => Ok(Value::String(uri::encode_uri_component(
                &string_arg(args, 0),
            ))),
            Builtin::DecodeUri => uri::decode_uri(&string_arg(args, 0)).map(Value::String),
            Builtin::DecodeUriComponent => {
                uri::decode_uri_component(&string_arg(args, 0)).map(Value::String)
            }
            Builtin::Escape => Ok(Value::String(uri::escape(&string_arg(args, 0)))),
            Builtin::Unescape => Ok(Value::String(uri::unescape(&string_arg(args, 0)))),
            Builtin::Math | Builtin::Json | Builtin::Intl => Err(TemplateError::evaluation(
                format!("{} is not a function", self.name()),
            )),
        }
    }

    /// `new Builtin(args)`
    pub fn construct(&self, args: &[Value]) -> Result<Value> {
        match self {
            Builtin::Date => date::construct(args).map(Value::Date),
            Builtin::Url => super::construct_url(args).map(Value::Url),
            Builtin::Number => self.call(args),
            Builtin::Object => self.call(args),
            Builtin::Array => match args {
                [Value::Number(n)] => {
                    if n.fract() != 0.0 || *n < 0.0 || *n > MAX_ARRAY_LENGTH as f64 {
                        return Err(TemplateError::evaluation("RangeError: Invalid array length"));
                    }
                    Ok(Value::Array(vec![Value::Undefined; *n as usize]))
                }
                _ => Ok(Value::Array(args.to_vec())),
            },
            _ => Err(TemplateError::evaluation(format!(
                "{} is not a constructor",
                self.name()
            ))),
        }
    }

    /// Static member call, e.g. `Math.max(a, b)` or `Array.isArray(x)`
    pub fn call_static(&self, method: &str, args: &[Value]) -> Result<Value> {
        let result = match self {
            Builtin::Math => math(method, args),
            Builtin::Json => return json(method, args),
            Builtin::Array => match method {
                "isArray" => Some(Value::Bool(matches!(args.first(), Some(Value::Array(_))))),
                "of" => Some(Value::Array(args.to_vec())),
                _ => None,
            },
            Builtin::Object => return object(method, args),
            Builtin::Number => number(method, args),
            Builtin::Date => match method {
                "now" => Some(Value::Number(date::now().timestamp_millis() as f64)),
                "parse" => Some(Value::Number(
                    date::parse(&string_arg(args, 0))
                        .map(|dt| dt.timestamp_millis() as f64)
                        .unwrap_or(f64::NAN),
                )),
                _ => None,
            },
            _ => None,
        };

        result.ok_or_else(|| {
            TemplateError::evaluation(format!("{}.{} is not a function", self.name(), method))
        })
    }

    /// `value instanceof Builtin`
    pub fn instance_of(&self, value: &Value) -> Result<bool> {
        if !self.is_constructor() {
            return Err(TemplateError::evaluation(
                "Right-hand side of 'instanceof' is not callable",
            ));
        }
        Ok(match self {
            Builtin::Array => matches!(value, Value::Array(_)),
            Builtin::Date => matches!(value, Value::Date(_)),
            Builtin::Url => matches!(value, Value::Url(_)),
            Builtin::Object => matches!(
                value,
                Value::Object(_) | Value::Array(_) | Value::Date(_) | Value::Url(_)
            ) || matches!(value, Value::Builtin(b) if b.is_callable()),
            // Primitive numbers are never instances of the wrapper
            _ => false,
        })
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn string_arg(args: &[Value], index: usize) -> String {
    arg(args, index).to_output_string()
}

fn number_arg(args: &[Value], index: usize) -> f64 {
    arg(args, index).to_number()
}

fn math(method: &str, args: &[Value]) -> Option<Value> {
    let x = number_arg(args, 0);
    let n = match method {
        "abs" => x.abs(),
        "ceil" => x.ceil(),
        "floor" => x.floor(),
        "round" => {
            let floor = x.floor();
            if x - floor >= 0.5 {
                floor + 1.0
            } else {
                floor
            }
        }
        "trunc" => x.trunc(),
        "sign" => {
            if x.is_nan() || x == 0.0 {
                x
            } else {
                x.signum()
            }
        }
        "sqrt" => x.sqrt(),
        "cbrt" => x.cbrt(),
        "log" => x.ln(),
        "log10" => x.log10(),
        "log2" => x.log2(),
        "exp" => x.exp(),
        "pow" => x.powf(number_arg(args, 1)),
        "max" => args
            .iter()
            .map(Value::to_number)
            .try_fold(f64::NEG_INFINITY, |acc, n| {
                if n.is_nan() {
                    None
                } else {
                    Some(acc.max(n))
                }
            })
            .unwrap_or(f64::NAN),
        "min" => args
            .iter()
            .map(Value::to_number)
            .try_fold(f64::INFINITY, |acc, n| {
                if n.is_nan() {
                    None
                } else {
                    Some(acc.min(n))
                }
            })
            .unwrap_or(f64::NAN),
        _ => return None,
    };
    Some(Value::Number(n))
}

fn json(method: &str, args: &[Value]) -> Result<Value> {
    match method {
        "stringify" => {
            let Some(json) = arg(args, 0).to_json() else {
                return Ok(Value::Undefined);
            };
            let indent = match arg(args, 2) {
                Value::Number(n) if n >= 1.0 => " ".repeat(n.min(10.0) as usize),
                Value::String(s) => s.chars().take(10).collect(),
                _ => String::new(),
            };
            stringify(&json, &indent).map(Value::String)
        }
        "parse" => {
            let text = string_arg(args, 0);
            serde_json::from_str::<serde_json::Value>(&text)
                .map(|json| Value::from_json(&json))
                .map_err(|e| TemplateError::evaluation(format!("JSON.parse: {}", e)))
        }
        _ => Err(TemplateError::evaluation(format!(
            "JSON.{} is not a function",
            method
        ))),
    }
}

fn stringify(json: &serde_json::Value, indent: &str) -> Result<String> {
    if indent.is_empty() {
        return serde_json::to_string(json)
            .map_err(|e| TemplateError::evaluation(format!("JSON.stringify: {}", e)));
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    json.serialize(&mut ser)
        .map_err(|e| TemplateError::evaluation(format!("JSON.stringify: {}", e)))?;
    String::from_utf8(buf).map_err(|e| TemplateError::evaluation(format!("JSON.stringify: {}", e)))
}

fn object(method: &str, args: &[Value]) -> Result<Value> {
    let target = arg(args, 0);
    if target.is_nullish() && matches!(method, "keys" | "values" | "entries") {
        return Err(TemplateError::evaluation(
            "Cannot convert undefined or null to object",
        ));
    }

    let entries = target.entries().unwrap_or_default();
    let result = match method {
        "keys" => Value::Array(
            entries
                .into_iter()
                .map(|(k, _)| Value::String(k.to_output_string()))
                .collect(),
        ),
        "values" => Value::Array(entries.into_iter().map(|(_, v)| v).collect()),
        "entries" => Value::Array(
            entries
                .into_iter()
                .map(|(k, v)| Value::Array(vec![Value::String(k.to_output_string()), v]))
                .collect(),
        ),
        _ => {
            return Err(TemplateError::evaluation(format!(
                "Object.{} is not a function",
                method
            )))
        }
    };
    Ok(result)
}

fn number(method: &str, args: &[Value]) -> Option<Value> {
    let value = arg(args, 0);
    let result = match method {
        "isInteger" => {
            Value::Bool(matches!(value, Value::Number(n) if n.is_finite() && n.fract() == 0.0))
        }
        "isSafeInteger" => Value::Bool(matches!(
            value,
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0
        )),
        "isFinite" => Value::Bool(matches!(value, Value::Number(n) if n.is_finite())),
        "isNaN" => Value::Bool(matches!(value, Value::Number(n) if n.is_nan())),
        "parseFloat" => Value::Number(parse_float(&value.to_output_string())),
        "parseInt" => {
            let radix = match arg(args, 1) {
                Value::Undefined => 10,
                other => other.to_number() as u32,
            };
            Value::Number(parse_int(&value.to_output_string(), radix))
        }
        _ => return None,
    };
    Some(result)
}

/// Leading-prefix float parse: `"3.5px"` is 3.5, `"px"` is NaN
pub(crate) fn parse_float(s: &str) -> f64 {
    let s = s.trim_start();
    if s.starts_with("Infinity") || s.starts_with("+Infinity") {
        return f64::INFINITY;
    }
    if s.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }

    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = s.as_bytes();
    while end < bytes.len() {
        let b = bytes[end];
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'+' | b'-' if end == 0 || matches!(bytes[end - 1], b'e' | b'E') => {}
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => seen_exp = true,
            _ => break,
        }
        end += 1;
    }

    // Back off a dangling exponent or sign ("1e", "2e+")
    let mut candidate = &s[..end];
    while !candidate.is_empty() {
        if let Ok(n) = candidate.parse::<f64>() {
            return n;
        }
        candidate = &candidate[..candidate.len() - 1];
    }
    f64::NAN
}

/// Leading-prefix integer parse with an optional radix
pub(crate) fn parse_int(s: &str, radix: u32) -> f64 {
    let s = s.trim_start();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (radix, s) = match radix {
        0 | 16 => match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(rest) => (16, rest),
            None => (if radix == 0 { 10 } else { radix }, s),
        },
        r if (2..=36).contains(&r) => (r, s),
        _ => return f64::NAN,
    };

    let mut result = 0.0;
    let mut any = false;
    for c in s.chars() {
        match c.to_digit(radix) {
            Some(d) => {
                result = result * radix as f64 + d as f64;
                any = true;
            }
            None => break,
        }
    }

    if !any {
        f64::NAN
    } else if negative {
        -result
    } else {
        result
    }
}

/// Radix formatting for `Number.prototype.toString(radix)`
pub(crate) fn format_radix(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
        return format_number(n);
    }
    let negative = n < 0.0;
    let mut value = n.abs() as u64;
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let d = (value % radix as u64) as u32;
        digits.push(std::char::from_digit(d, radix).unwrap_or('0'));
        value /= radix as u64;
    }
    if negative {
        digits.push('-');
    }
    digits.iter().rev().collect()
}
