//! Methods callable on values: `message.indexOf('x')`, `items.join(', ')`,
//! `price.toFixed(2)` and so on.
//!
//! String indices count characters, not UTF-16 units.

use indexmap::IndexMap;

use crate::error::{Result, TemplateError};
use crate::host::{date, format_radix};
use crate::value::{format_number, Value};

/// Invoke `name` on `receiver`. Returns `Ok(None)` when the receiver has no
/// such method.
pub fn call_method(receiver: &Value, name: &str, args: &[Value]) -> Result<Option<Value>> {
    match receiver {
        Value::Undefined | Value::Null => Err(TemplateError::evaluation(format!(
            "Cannot read properties of {} (reading '{}')",
            receiver.to_output_string(),
            name
        ))),
        Value::Builtin(b) => b.call_static(name, args).map(Some),
        Value::String(s) => string_method(s, name, args),
        Value::Array(items) => Ok(array_method(items, name, args)),
        Value::Number(n) => number_method(*n, name, args),
        Value::Bool(b) => Ok(match name {
            "toString" => Some(Value::String(b.to_string())),
            "valueOf" => Some(Value::Bool(*b)),
            _ => None,
        }),
        Value::Date(dt) => Ok(date::call_method(dt, name, args)),
        Value::Url(url) => Ok(match name {
            "toString" | "toJSON" => Some(Value::String(url.as_str().to_string())),
            _ => None,
        }),
        Value::Object(obj) => Ok(object_method(obj, receiver, name, args)),
    }
}

/// Longest string a method may build, in characters
const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

fn invalid_string_length() -> TemplateError {
    TemplateError::evaluation("RangeError: Invalid string length")
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

/// Integer conversion for index arguments: NaN is 0, fractions truncate
fn integer_arg(args: &[Value], index: usize, default: f64) -> f64 {
    match args.get(index) {
        None | Some(Value::Undefined) => default,
        Some(v) => {
            let n = v.to_number();
            if n.is_nan() {
                0.0
            } else {
                n.trunc()
            }
        }
    }
}

/// Resolve a possibly negative index against `len`, clamped to `0..=len`
fn relative_index(n: f64, len: usize) -> usize {
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn clamp_index(n: f64, len: usize) -> usize {
    n.max(0.0).min(len as f64) as usize
}

/// Position of `needle` in `haystack` at or after `from`
fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Last position of `needle` in `haystack` at or before `from`
fn rfind_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    let last = (haystack.len() - needle.len()).min(from);
    (0..=last)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

fn position(found: Option<usize>) -> Value {
    Value::Number(found.map(|i| i as f64).unwrap_or(-1.0))
}

fn string_method(s: &str, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let text = |index: usize| arg(args, index).to_output_string();
    let slice = |start: usize, end: usize| -> Value {
        if start >= end {
            Value::String(String::new())
        } else {
            Value::String(chars[start..end].iter().collect())
        }
    };

    let value = match name {
        "indexOf" => {
            let needle: Vec<char> = text(0).chars().collect();
            let from = clamp_index(integer_arg(args, 1, 0.0), len);
            position(find_chars(&chars, &needle, from))
        }
        "lastIndexOf" => {
            let needle: Vec<char> = text(0).chars().collect();
            let from = clamp_index(integer_arg(args, 1, f64::INFINITY), len);
            position(rfind_chars(&chars, &needle, from))
        }
        "includes" => {
            let needle: Vec<char> = text(0).chars().collect();
            let from = clamp_index(integer_arg(args, 1, 0.0), len);
            Value::Bool(find_chars(&chars, &needle, from).is_some())
        }
        "startsWith" => {
            let needle: Vec<char> = text(0).chars().collect();
            let from = clamp_index(integer_arg(args, 1, 0.0), len);
            Value::Bool(chars[from..].starts_with(&needle))
        }
        "endsWith" => {
            let needle: Vec<char> = text(0).chars().collect();
            let end = clamp_index(integer_arg(args, 1, len as f64), len);
            Value::Bool(chars[..end].ends_with(&needle))
        }
        "toUpperCase" | "toLocaleUpperCase" => Value::String(s.to_uppercase()),
        "toLowerCase" | "toLocaleLowerCase" => Value::String(s.to_lowercase()),
        "trim" => Value::String(s.trim().to_string()),
        "trimStart" | "trimLeft" => Value::String(s.trim_start().to_string()),
        "trimEnd" | "trimRight" => Value::String(s.trim_end().to_string()),
        "substring" => {
            let a = clamp_index(integer_arg(args, 0, 0.0), len);
            let b = clamp_index(integer_arg(args, 1, len as f64), len);
            slice(a.min(b), a.max(b))
        }
        "slice" => {
            let start = relative_index(integer_arg(args, 0, 0.0), len);
            let end = relative_index(integer_arg(args, 1, len as f64), len);
            slice(start, end)
        }
        "substr" => {
            let start = relative_index(integer_arg(args, 0, 0.0), len);
            let count = integer_arg(args, 1, len as f64).max(0.0);
            let end = (start as f64 + count).min(len as f64) as usize;
            slice(start, end)
        }
        "charAt" => {
            let i = integer_arg(args, 0, 0.0);
            if i < 0.0 || i >= len as f64 {
                Value::String(String::new())
            } else {
                Value::String(chars[i as usize].to_string())
            }
        }
        "charCodeAt" | "codePointAt" => {
            let i = integer_arg(args, 0, 0.0);
            if i < 0.0 || i >= len as f64 {
                if name == "charCodeAt" {
                    Value::Number(f64::NAN)
                } else {
                    Value::Undefined
                }
            } else {
                Value::Number(chars[i as usize] as u32 as f64)
            }
        }
        "at" => {
            let i = integer_arg(args, 0, 0.0);
            let i = if i < 0.0 { len as f64 + i } else { i };
            if i < 0.0 || i >= len as f64 {
                Value::Undefined
            } else {
                Value::String(chars[i as usize].to_string())
            }
        }
        "split" => split(s, args),
        "replace" => {
            let pattern = text(0);
            let replacement = text(1);
            Value::String(s.replacen(&pattern, &replacement, 1))
        }
        "replaceAll" => {
            let pattern = text(0);
            let replacement = text(1);
            if pattern.is_empty() {
                let mut out = replacement.clone();
                for c in s.chars() {
                    out.push(c);
                    out.push_str(&replacement);
                }
                Value::String(out)
            } else {
                Value::String(s.replace(&pattern, &replacement))
            }
        }
        "repeat" => {
            let count = integer_arg(args, 0, 0.0);
            if count < 0.0 || !count.is_finite() {
                return Err(TemplateError::evaluation(format!(
                    "RangeError: Invalid count value: {}",
                    format_number(count)
                )));
            }
            if !chars.is_empty() && count * len as f64 > MAX_STRING_LENGTH as f64 {
                return Err(invalid_string_length());
            }
            if chars.is_empty() {
                Value::String(String::new())
            } else {
                Value::String(s.repeat(count as usize))
            }
        }
        "padStart" | "padEnd" => {
            let target = integer_arg(args, 0, 0.0);
            let filler = match arg(args, 1) {
                Value::Undefined => " ".to_string(),
                other => other.to_output_string(),
            };
            if target <= len as f64 || filler.is_empty() {
                Value::String(s.to_string())
            } else if target > MAX_STRING_LENGTH as f64 {
                return Err(invalid_string_length());
            } else {
                let pad: String = filler.chars().cycle().take(target as usize - len).collect();
                if name == "padStart" {
                    Value::String(format!("{}{}", pad, s))
                } else {
                    Value::String(format!("{}{}", s, pad))
                }
            }
        }
        "concat" => {
            let mut out = s.to_string();
            for a in args {
                out.push_str(&a.to_output_string());
            }
            Value::String(out)
        }
        "localeCompare" => {
            let other = text(0);
            Value::Number(match s.cmp(other.as_str()) {
                std::cmp::Ordering::Less => -1.0,
                std::cmp::Ordering::Equal => 0.0,
                std::cmp::Ordering::Greater => 1.0,
            })
        }
        "toString" | "valueOf" => Value::String(s.to_string()),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn split(s: &str, args: &[Value]) -> Value {
    let limit = match arg(args, 1) {
        Value::Undefined => usize::MAX,
        other => other.to_number().max(0.0) as usize,
    };
    let parts: Vec<Value> = match arg(args, 0) {
        Value::Undefined => vec![Value::String(s.to_string())],
        separator => {
            let separator = separator.to_output_string();
            if separator.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(separator.as_str())
                    .map(|part| Value::String(part.to_string()))
                    .collect()
            }
        }
    };
    Value::Array(parts.into_iter().take(limit).collect())
}

fn array_method(items: &[Value], name: &str, args: &[Value]) -> Option<Value> {
    let len = items.len();
    let value = match name {
        "indexOf" => {
            let target = arg(args, 0);
            let from = relative_index(integer_arg(args, 1, 0.0), len);
            position(
                items
                    .iter()
                    .enumerate()
                    .skip(from)
                    .find(|(_, v)| v.strict_equals(&target))
                    .map(|(i, _)| i),
            )
        }
        "lastIndexOf" => {
            let target = arg(args, 0);
            position(items.iter().rposition(|v| v.strict_equals(&target)))
        }
        "includes" => {
            let target = arg(args, 0);
            let nan = matches!(target, Value::Number(n) if n.is_nan());
            Value::Bool(items.iter().any(|v| {
                v.strict_equals(&target) || (nan && matches!(v, Value::Number(n) if n.is_nan()))
            }))
        }
        "join" => {
            let separator = match arg(args, 0) {
                Value::Undefined => ",".to_string(),
                other => other.to_output_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(|v| {
                        if v.is_nullish() {
                            String::new()
                        } else {
                            v.to_output_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(&separator),
            )
        }
        "slice" => {
            let start = relative_index(integer_arg(args, 0, 0.0), len);
            let end = relative_index(integer_arg(args, 1, len as f64), len);
            Value::Array(if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            })
        }
        "concat" => {
            let mut out = items.to_vec();
            for a in args {
                match a {
                    Value::Array(more) => out.extend(more.iter().cloned()),
                    other => out.push(other.clone()),
                }
            }
            Value::Array(out)
        }
        "reverse" | "toReversed" => Value::Array(items.iter().rev().cloned().collect()),
        "at" => {
            let i = integer_arg(args, 0, 0.0);
            let i = if i < 0.0 { len as f64 + i } else { i };
            if i < 0.0 || i >= len as f64 {
                Value::Undefined
            } else {
                items[i as usize].clone()
            }
        }
        "toString" => Value::String(Value::Array(items.to_vec()).to_output_string()),
        "valueOf" => Value::Array(items.to_vec()),
        _ => return None,
    };
    Some(value)
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Result<Option<Value>> {
    let value = match name {
        "toFixed" => {
            let digits = integer_arg(args, 0, 0.0);
            if !(0.0..=100.0).contains(&digits) {
                return Err(TemplateError::evaluation(
                    "RangeError: toFixed() digits argument must be between 0 and 100",
                ));
            }
            if !n.is_finite() || n.abs() >= 1e21 {
                Value::String(format_number(n))
            } else {
                Value::String(to_fixed(n, digits as usize))
            }
        }
        "toString" => {
            let radix = integer_arg(args, 0, 10.0);
            if !(2.0..=36.0).contains(&radix) {
                return Err(TemplateError::evaluation(
                    "RangeError: toString() radix must be between 2 and 36",
                ));
            }
            Value::String(format_radix(n, radix as u32))
        }
        "toLocaleString" => Value::String(locale_number(n)),
        "valueOf" => Value::Number(n),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Fixed-point digits of `n`, with ties in the exact binary value rounding
/// away from zero: `(2.5).toFixed(0)` is `3`, `(1.005).toFixed(2)` is `1.00`
fn to_fixed(n: f64, digits: usize) -> String {
    // 1074 fraction digits represent every finite f64 exactly
    let exact = format!("{:.1074}", n.abs());
    let (int_part, frac_part) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().chain(std::iter::repeat(b'0')).take(digits))
        .collect();

    if frac_part.as_bytes().get(digits).map_or(false, |&d| d >= b'5') {
        let mut carry = true;
        for d in kept.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let kept: String = kept.into_iter().map(char::from).collect();
    let (int_digits, frac_digits) = kept.split_at(kept.len() - digits);
    let sign = if n < 0.0 { "-" } else { "" };
    if digits == 0 {
        format!("{}{}", sign, int_digits)
    } else {
        format!("{}{}.{}", sign, int_digits, frac_digits)
    }
}

/// en-US grouping with at most three fraction digits: `1234567.891` is
/// `1,234,567.891`
fn locale_number(n: f64) -> String {
    if !n.is_finite() {
        return format_number(n);
    }
    let fixed = format!("{:.3}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if n < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        "-"
    } else {
        ""
    };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

fn object_method(
    obj: &IndexMap<String, Value>,
    receiver: &Value,
    name: &str,
    args: &[Value],
) -> Option<Value> {
    let value = match name {
        "hasOwnProperty" => Value::Bool(obj.contains_key(&arg(args, 0).to_output_string())),
        "toString" => Value::String(receiver.to_output_string()),
        "valueOf" => receiver.clone(),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(receiver: impl Into<Value>, name: &str, args: &[Value]) -> Value {
        call_method(&receiver.into(), name, args).unwrap().unwrap()
    }

    #[test]
    fn test_string_search() {
        assert_eq!(call("Hello World", "indexOf", &[Value::from("Hello")]), Value::from(0));
        assert_eq!(call("Hello World", "indexOf", &[Value::from("hello")]), Value::from(-1));
        assert_eq!(call("aXbXc", "lastIndexOf", &[Value::from("X")]), Value::from(3));
        assert_eq!(call("héllo", "indexOf", &[Value::from("l")]), Value::from(2));
        assert_eq!(call("abc", "includes", &[Value::from("bc")]), Value::Bool(true));
        assert_eq!(call("abc", "startsWith", &[Value::from("ab")]), Value::Bool(true));
        assert_eq!(call("abc", "endsWith", &[Value::from("ab")]), Value::Bool(false));
    }

    #[test]
    fn test_string_slicing() {
        assert_eq!(call("template", "slice", &[Value::from(-4)]), Value::from("late"));
        assert_eq!(
            call("template", "substring", &[Value::from(4), Value::from(0)]),
            Value::from("temp")
        );
        assert_eq!(
            call("template", "substr", &[Value::from(1), Value::from(3)]),
            Value::from("emp")
        );
        assert_eq!(call("abc", "charAt", &[Value::from(5)]), Value::from(""));
        assert_eq!(call("abc", "at", &[Value::from(-1)]), Value::from("c"));
    }

    #[test]
    fn test_string_transforms() {
        assert_eq!(
            call("a,b,,c", "split", &[Value::from(",")]),
            Value::from(vec!["a", "b", "", "c"])
        );
        assert_eq!(call("abc", "split", &[Value::from("")]), Value::from(vec!["a", "b", "c"]));
        assert_eq!(
            call("a-b-c", "replace", &[Value::from("-"), Value::from("+")]),
            Value::from("a+b-c")
        );
        assert_eq!(
            call("a-b-c", "replaceAll", &[Value::from("-"), Value::from("+")]),
            Value::from("a+b+c")
        );
        assert_eq!(
            call("7", "padStart", &[Value::from(3), Value::from("0")]),
            Value::from("007")
        );
        assert!(call_method(&Value::from("x"), "repeat", &[Value::from(-1)]).is_err());
    }

    #[test]
    fn test_string_length_limits() {
        assert_eq!(call("ab", "repeat", &[Value::from(3)]), Value::from("ababab"));
        assert_eq!(call("", "repeat", &[Value::Number(1e19)]), Value::from(""));
        for (method, args) in [
            ("repeat", vec![Value::Number(1e19)]),
            ("repeat", vec![Value::Number(MAX_STRING_LENGTH as f64)]),
            ("padStart", vec![Value::Number(1e19)]),
            ("padEnd", vec![Value::Number(1e19), Value::from("-")]),
        ] {
            assert!(
                matches!(
                    call_method(&Value::from("ab"), method, &args),
                    Err(TemplateError::Evaluation(msg)) if msg == "RangeError: Invalid string length"
                ),
                "{} should fail",
                method
            );
        }
    }

    #[test]
    fn test_array_methods() {
        let items = Value::from(vec![1, 2, 3]);
        assert_eq!(call(items.clone(), "indexOf", &[Value::from(2)]), Value::from(1));
        assert_eq!(call(items.clone(), "indexOf", &[Value::from("2")]), Value::from(-1));
        assert_eq!(call(items.clone(), "join", &[Value::from(" | ")]), Value::from("1 | 2 | 3"));
        assert_eq!(call(items.clone(), "reverse", &[]), Value::from(vec![3, 2, 1]));
        assert_eq!(
            call(items.clone(), "concat", &[Value::from(vec![4]), Value::from(5)]),
            Value::from(vec![1, 2, 3, 4, 5])
        );
        assert_eq!(call(items, "slice", &[Value::from(1)]), Value::from(vec![2, 3]));
    }

    #[test]
    fn test_number_methods() {
        assert_eq!(call(3.14159, "toFixed", &[Value::from(2)]), Value::from("3.14"));
        assert_eq!(call(255.0, "toString", &[Value::from(16)]), Value::from("ff"));
        assert_eq!(call(1234567.891, "toLocaleString", &[]), Value::from("1,234,567.891"));
        assert_eq!(call(-1000.0, "toLocaleString", &[]), Value::from("-1,000"));
        assert!(call_method(&Value::from(1), "toFixed", &[Value::from(101)]).is_err());
    }

    #[test]
    fn test_to_fixed_rounding() {
        assert_eq!(call(2.5, "toFixed", &[Value::from(0)]), Value::from("3"));
        assert_eq!(call(0.125, "toFixed", &[Value::from(2)]), Value::from("0.13"));
        assert_eq!(call(1.005, "toFixed", &[Value::from(2)]), Value::from("1.00"));
        assert_eq!(call(9.995, "toFixed", &[Value::from(1)]), Value::from("10.0"));
        assert_eq!(call(99.5, "toFixed", &[]), Value::from("100"));
        assert_eq!(call(-1.5, "toFixed", &[Value::from(0)]), Value::from("-2"));
        assert_eq!(call(0.5, "toFixed", &[Value::from(3)]), Value::from("0.500"));
        assert_eq!(call(1e21, "toFixed", &[Value::from(2)]), Value::from("1e+21"));
    }

    #[test]
    fn test_missing_methods() {
        assert_eq!(call_method(&Value::from("x"), "nope", &[]).unwrap(), None);
        assert!(call_method(&Value::Undefined, "indexOf", &[]).is_err());
        assert!(call_method(&Value::Null, "toString", &[]).is_err());
    }
}
