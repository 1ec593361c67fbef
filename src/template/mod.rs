//! Compiled templates.
//!
//! Compilation normalizes line breaks away, extracts the `@globals`
//! directive, scans and parses the directive tree, parses every embedded
//! expression and resolves which identifiers the caller has to bind. The
//! resulting [`Template`] is immutable and can be rendered any number of
//! times, from any number of threads.

mod ast;
mod lexer;
mod parser;

use indexmap::IndexSet;

use crate::context::Context;
use crate::error::Result;
use crate::host::{HostEnvironment, StandardHost};
use crate::render::Renderer;
use crate::resolver::resolve;
use crate::scope::Environment;

pub use ast::{Node, Source};

/// A compiled template
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<Node>,
    required: IndexSet<String>,
    declared: IndexSet<String>,
    source: String,
}

/// Normalize, scan and parse `source` into nodes plus the declared globals
pub(crate) fn compile_nodes(source: &str) -> Result<(Vec<Node>, Vec<String>)> {
    let normalized = lexer::normalize(source);
    let scanned = lexer::Lexer::scan(&normalized)?;
    let nodes = parser::Parser::new(scanned.tokens).parse()?;
    Ok((nodes, scanned.globals))
}

impl Template {
    /// Compile a template string
    pub fn compile(source: &str) -> Result<Self> {
        let (nodes, globals) = compile_nodes(source)?;
        let resolution = resolve(&nodes, globals.iter().map(String::as_str));
        tracing::debug!(
            "Compiled template: {} nodes, required {:?}, declared {:?}",
            nodes.len(),
            resolution.required,
            resolution.declared_globals
        );

        Ok(Self {
            nodes,
            required: resolution.required,
            declared: resolution.declared_globals,
            source: source.to_string(),
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Identifiers that are bound from the render context
    pub fn required_variables(&self) -> &IndexSet<String> {
        &self.required
    }

    /// Identifiers declared with `{{@globals ...}}`
    pub fn declared_globals(&self) -> &IndexSet<String> {
        &self.declared
    }

    /// The template text as given to [`Template::compile`]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with the standard host and no declared-global values
    pub fn render(&self, context: Option<&Context>) -> Result<String> {
        self.render_with_host(&StandardHost::new(), context, &Context::new())
    }

    /// Render, taking declared globals from `globals`
    pub fn render_with_globals(&self, context: Option<&Context>, globals: &Context) -> Result<String> {
        self.render_with_host(&StandardHost::new(), context, globals)
    }

    /// Render against a custom host environment
    pub fn render_with_host(
        &self,
        host: &dyn HostEnvironment,
        context: Option<&Context>,
        globals: &Context,
    ) -> Result<String> {
        tracing::trace!("Rendering template with {} required variables", self.required.len());
        for name in &self.declared {
            if !globals.contains(name) {
                tracing::debug!("Declared global {} has no value; it renders as undefined", name);
            }
        }

        let env = Environment::new(host)
            .with_context(context, &self.required)
            .with_declared(&self.declared, Some(globals));
        Renderer::new(env).render(&self.nodes)
    }
}
