//! Expression evaluation against an [`Environment`]

use std::cmp::Ordering;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::methods::call_method;
use crate::error::{Result, TemplateError};
use crate::scope::Environment;
use crate::value::Value;

/// Evaluate `expr`. Reading through `undefined` or `null` yields
/// `undefined`; calling something that is not a function is an error.
pub fn evaluate(expr: &Expr, env: &Environment<'_>) -> Result<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => Ok(env.lookup(name)),
        Expr::LoopIndex => Ok(env.loop_index()),
        Expr::This => Ok(Value::Undefined),
        Expr::Array(items) => items
            .iter()
            .map(|item| evaluate(item, env))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Expr::Member { object, property } => Ok(evaluate(object, env)?.get_property(property)),
        Expr::Index { object, index } => {
            let object = evaluate(object, env)?;
            let index = evaluate(index, env)?;
            Ok(object.get_index(&index))
        }
        Expr::Call { callee, args } => evaluate_call(expr, callee, args, env),
        Expr::New { constructor, args } => {
            let target = evaluate(constructor, env)?;
            let args = evaluate_args(args, env)?;
            match target {
                Value::Builtin(b) if b.is_constructor() => b.construct(&args),
                _ => Err(TemplateError::evaluation(format!(
                    "{} is not a constructor",
                    constructor
                ))),
            }
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, env)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
                UnaryOp::TypeOf => Value::from(value.type_name()),
            })
        }
        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, env),
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if evaluate(test, env)?.is_truthy() {
                evaluate(consequent, env)
            } else {
                evaluate(alternate, env)
            }
        }
    }
}

fn evaluate_args(args: &[Expr], env: &Environment<'_>) -> Result<Vec<Value>> {
    args.iter().map(|arg| evaluate(arg, env)).collect()
}

fn evaluate_call(
    expr: &Expr,
    callee: &Expr,
    args: &[Expr],
    env: &Environment<'_>,
) -> Result<Value> {
    let (receiver, method) = match callee {
        Expr::Member { object, property } => (evaluate(object, env)?, property.clone()),
        Expr::Index { object, index } => {
            let receiver = evaluate(object, env)?;
            let key = evaluate(index, env)?.to_output_string();
            (receiver, key)
        }
        _ => {
            let function = evaluate(callee, env)?;
            let args = evaluate_args(args, env)?;
            return match function {
                Value::Builtin(b) if b.is_callable() => b.call(&args),
                _ => Err(TemplateError::evaluation(format!(
                    "{} is not a function",
                    callee
                ))),
            };
        }
    };

    let args = evaluate_args(args, env)?;
    match call_method(&receiver, &method, &args) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(TemplateError::evaluation(format!(
            "{} is not a function",
            callee
        ))),
        Err(e) => {
            tracing::debug!("Call failed in {}: {}", expr, e);
            Err(e)
        }
    }
}

fn evaluate_binary(op: BinaryOp, left: &Expr, right: &Expr, env: &Environment<'_>) -> Result<Value> {
    let lhs = evaluate(left, env)?;

    // Short-circuit operators yield an operand, not a boolean
    match op {
        BinaryOp::Or if lhs.is_truthy() => return Ok(lhs),
        BinaryOp::And if !lhs.is_truthy() => return Ok(lhs),
        _ => {}
    }

    let rhs = evaluate(right, env)?;
    let value = match op {
        BinaryOp::StrictEq => Value::Bool(lhs.strict_equals(&rhs)),
        BinaryOp::StrictNe => Value::Bool(!lhs.strict_equals(&rhs)),
        BinaryOp::LooseEq => Value::Bool(lhs.loose_equals(&rhs)),
        BinaryOp::LooseNe => Value::Bool(!lhs.loose_equals(&rhs)),
        BinaryOp::Lt => Value::Bool(compare(&lhs, &rhs) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(&lhs, &rhs),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(&lhs, &rhs) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(&lhs, &rhs),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::InstanceOf => match &rhs {
            Value::Builtin(b) => Value::Bool(b.instance_of(&lhs)?),
            _ => {
                return Err(TemplateError::evaluation(format!(
                    "Right-hand side of 'instanceof' is not callable: {}",
                    right
                )))
            }
        },
        BinaryOp::In => {
            let key = lhs.to_output_string();
            match &rhs {
                Value::Object(obj) => Value::Bool(obj.contains_key(&key)),
                Value::Array(items) => Value::Bool(
                    key == "length"
                        || key.parse::<usize>().is_ok_and(|i| i < items.len()),
                ),
                _ => {
                    return Err(TemplateError::evaluation(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        key, right
                    )))
                }
            }
        }
        BinaryOp::Add => add(&lhs, &rhs),
        BinaryOp::Sub => Value::Number(lhs.to_number() - rhs.to_number()),
        BinaryOp::Mul => Value::Number(lhs.to_number() * rhs.to_number()),
        BinaryOp::Div => Value::Number(lhs.to_number() / rhs.to_number()),
        BinaryOp::Rem => Value::Number(lhs.to_number() % rhs.to_number()),
        BinaryOp::Or | BinaryOp::And => rhs,
    };
    Ok(value)
}

/// `+`: string concatenation if either primitive is a string, else numeric
fn add(lhs: &Value, rhs: &Value) -> Value {
    let (a, b) = (lhs.to_primitive(), rhs.to_primitive());
    if matches!(a, Value::String(_)) || matches!(b, Value::String(_)) {
        Value::String(format!("{}{}", a.to_output_string(), b.to_output_string()))
    } else {
        Value::Number(a.to_number() + b.to_number())
    }
}

/// Relational comparison: strings compare lexicographically, everything
/// else numerically. `None` when either side is NaN.
fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs.to_primitive(), rhs.to_primitive()) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(&b)),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::expr::parse;
    use crate::host::StandardHost;
    use serde_json::json;

    fn eval_with(source: &str, context: &Context) -> Result<Value> {
        let host = StandardHost::new();
        let env = Environment::new(&host).with_context(Some(context), context.variables().keys());
        evaluate(&parse(source)?, &env)
    }

    fn eval(source: &str) -> Value {
        let context = Context::from_json(&json!({
            "message": "Hello World",
            "count": 3,
            "items": [1, 2, 3],
            "user": {"name": "Ada", "tags": ["x"]},
            "empty": ""
        }))
        .unwrap();
        eval_with(source, &context).unwrap()
    }

    #[test]
    fn test_eval_basic() {
        assert_eq!(eval("message"), Value::from("Hello World"));
        assert_eq!(eval("user.name"), Value::from("Ada"));
        assert_eq!(eval("user['name']"), Value::from("Ada"));
        assert_eq!(eval("items[1]"), Value::from(2));
        assert_eq!(eval("items.length"), Value::from(3));
        assert_eq!(eval("nothing"), Value::Undefined);
        assert_eq!(eval("nothing.deeper.still"), Value::Undefined);
    }

    #[test]
    fn test_eval_operators() {
        assert_eq!(eval("message.indexOf('Hello') > -1"), Value::Bool(true));
        assert_eq!(eval("message.indexOf('Bye') > -1"), Value::Bool(false));
        assert_eq!(eval("count * 2 + 1"), Value::from(7));
        assert_eq!(eval("'n=' + count"), Value::from("n=3"));
        assert_eq!(eval("count + 1 + 'x'"), Value::from("4x"));
        assert_eq!(eval("count == '3'"), Value::Bool(true));
        assert_eq!(eval("count === '3'"), Value::Bool(false));
        assert_eq!(eval("empty || 'fallback'"), Value::from("fallback"));
        assert_eq!(eval("count && user.name"), Value::from("Ada"));
        assert_eq!(eval("!empty"), Value::Bool(true));
        assert_eq!(eval("count > 2 ? 'many' : 'few'"), Value::from("many"));
        assert_eq!(eval("typeof message"), Value::from("string"));
        assert_eq!(eval("typeof nothing"), Value::from("undefined"));
        assert_eq!(eval("'b' > 'a'"), Value::Bool(true));
        assert_eq!(eval("'name' in user"), Value::Bool(true));
        assert_eq!(eval("7 % 4"), Value::from(3));
    }

    #[test]
    fn test_eval_host_globals() {
        assert_eq!(eval("Array.isArray(items)"), Value::Bool(true));
        assert_eq!(eval("items instanceof Array"), Value::Bool(true));
        assert_eq!(eval("message instanceof Array"), Value::Bool(false));
        assert_eq!(eval("Math.max(count, 10)"), Value::from(10));
        assert_eq!(eval("JSON.stringify(user.tags)"), Value::from(r#"["x"]"#));
        assert_eq!(eval("encodeURIComponent('a b')"), Value::from("a%20b"));
        assert_eq!(eval("Number('42') + 1"), Value::from(43));
        assert_eq!(eval("new URL('https://example.com/x').pathname"), Value::from("/x"));
        assert!(matches!(
            eval("new Date().toLocaleDateString()"),
            Value::String(s) if s.split('/').count() == 3
        ));
        assert_eq!(eval("typeof Math"), Value::from("object"));
        assert_eq!(eval("typeof encodeURI"), Value::from("function"));
    }

    #[test]
    fn test_eval_errors() {
        let context = Context::new();
        assert!(eval_with("nothing.indexOf('x')", &context).is_err());
        assert!(eval_with("nothing()", &context).is_err());
        assert!(eval_with("'abc'.nope()", &context).is_err());
        assert!(eval_with("new Math()", &context).is_err());
        assert!(eval_with("1 instanceof 2", &context).is_err());
        assert!(eval_with("'a' in 'abc'", &context).is_err());
        assert!(eval_with("URL('https://example.com')", &context).is_err());
    }
}
