//! Variable resolution during a render.
//!
//! An identifier resolves, in order, against: the loop variables of the
//! enclosing `each` blocks (innermost first), the template's declared
//! globals, the host environment for allow-listed names, and finally the
//! caller's context. Anything else is `undefined`.

use indexmap::IndexMap;

use crate::context::Context;
use crate::host::{is_host_global, HostEnvironment};
use crate::value::Value;

/// One active `each` iteration
#[derive(Debug)]
struct Frame<'a> {
    name: &'a str,
    value: Value,
    index: Value,
}

pub struct Environment<'a> {
    host: &'a dyn HostEnvironment,
    context: IndexMap<&'a str, &'a Value>,
    declared: IndexMap<&'a str, Value>,
    frames: Vec<Frame<'a>>,
}

impl<'a> Environment<'a> {
    pub fn new(host: &'a dyn HostEnvironment) -> Self {
        Self {
            host,
            context: IndexMap::new(),
            declared: IndexMap::new(),
            frames: Vec::new(),
        }
    }

    /// Bind the required names from the caller's context. Names the
    /// context does not supply stay unbound and read as `undefined`.
    pub fn with_context(
        mut self,
        context: Option<&'a Context>,
        required: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        let Some(context) = context else {
            return self;
        };
        for name in required {
            if is_host_global(name) {
                tracing::debug!("Context variable {} is shadowed by the host global", name);
                continue;
            }
            if let Some(value) = context.get(name) {
                self.context.insert(name.as_str(), value);
            }
        }
        self
    }

    /// Bind each declared global to its supplied value, or `undefined` when
    /// the caller did not supply one
    pub fn with_declared(
        mut self,
        names: impl IntoIterator<Item = &'a String>,
        supplied: Option<&'a Context>,
    ) -> Self {
        for name in names {
            let value = supplied
                .and_then(|g| g.get(name))
                .cloned()
                .unwrap_or(Value::Undefined);
            self.declared.insert(name.as_str(), value);
        }
        self
    }

    pub fn lookup(&self, name: &str) -> Value {
        if let Some(frame) = self.frames.iter().rev().find(|f| f.name == name) {
            return frame.value.clone();
        }
        if let Some(value) = self.declared.get(name) {
            return value.clone();
        }
        if is_host_global(name) {
            return self.host.global(name).unwrap_or(Value::Undefined);
        }
        self.context
            .get(name)
            .map(|v| (*v).clone())
            .unwrap_or(Value::Undefined)
    }

    /// `@index` of the innermost loop
    pub fn loop_index(&self) -> Value {
        self.frames
            .last()
            .map(|f| f.index.clone())
            .unwrap_or(Value::Undefined)
    }

    pub fn push_frame(&mut self, name: &'a str, value: Value, index: Value) {
        self.frames.push(Frame { name, value, index });
    }

    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}
