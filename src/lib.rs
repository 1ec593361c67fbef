//! minibars: a tiny logic-light HTML template compiler
//!
//! Templates interpolate escaped expressions with `{{expr}}`, branch with
//! `{{#if cond}}...{{else}}...{{/if}}`, loop with
//! `{{#each item in items}}...{{/each}}` (where `{{@index}}` is the current
//! position or key), and may declare extra globals once with
//! `{{@globals a, b}}`. Expressions are a read-only subset of JavaScript.
//!
//! ```
//! let template = minibars::compile("<p>{{ message.toUpperCase() }}</p>").unwrap();
//! let mut ctx = minibars::Context::new();
//! ctx.set("message", "hi <you>");
//! assert_eq!(template.render(Some(&ctx)).unwrap(), "<p>HI &lt;YOU&gt;</p>");
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod expr;
pub mod host;
pub mod render;
pub mod resolver;
pub mod scope;
pub mod template;
pub mod value;

pub use context::Context;
pub use engine::Minibars;
pub use error::{Result, TemplateError};
pub use host::{HostEnvironment, StandardHost};
pub use render::escape_html;
pub use template::Template;
pub use value::Value;

/// Compile a template string
pub fn compile(source: &str) -> Result<Template> {
    Template::compile(source)
}
