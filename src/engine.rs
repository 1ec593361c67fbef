//! Named template registry

use std::collections::HashMap;

use crate::context::Context;
use crate::error::{Result, TemplateError};
use crate::host::{HostEnvironment, StandardHost};
use crate::template::Template;

/// Compile-once, render-many registry of named templates
#[derive(Debug, Clone, Default)]
pub struct Minibars {
    templates: HashMap<String, Template>,
    host: StandardHost,
}

impl Minibars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `host` for every render, e.g. to supply `location`
    pub fn with_host(mut self, host: StandardHost) -> Self {
        self.host = host;
        self
    }

    /// Register a template with a name, replacing any previous one
    pub fn register(&mut self, name: &str, source: &str) -> Result<()> {
        let template = Template::compile(source)?;
        if self.templates.insert(name.to_string(), template).is_some() {
            tracing::debug!("Replaced template {}", name);
        }
        Ok(())
    }

    /// Get a registered template
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Render a registered template
    pub fn render(&self, name: &str, context: Option<&Context>) -> Result<String> {
        self.render_with_globals(name, context, &Context::new())
    }

    /// Render a registered template with declared-global values
    pub fn render_with_globals(
        &self,
        name: &str,
        context: Option<&Context>,
        globals: &Context,
    ) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| TemplateError::TemplateNotFound(name.to_string()))?;
        let host: &dyn HostEnvironment = &self.host;
        template.render_with_host(host, context, globals)
    }
}
