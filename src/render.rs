//! Renderer - node tree to output

use crate::error::Result;
use crate::expr::evaluate;
use crate::scope::Environment;
use crate::template::Node;
use crate::value::Value;

pub struct Renderer<'a> {
    env: Environment<'a>,
}

impl<'a> Renderer<'a> {
    pub fn new(env: Environment<'a>) -> Self {
        Self { env }
    }

    /// Render nodes to a string
    pub fn render(&mut self, nodes: &'a [Node]) -> Result<String> {
        let mut output = String::new();
        for node in nodes {
            self.render_node(node, &mut output)?;
        }
        Ok(output)
    }

    fn render_nodes(&mut self, nodes: &'a [Node], output: &mut String) -> Result<()> {
        for node in nodes {
            self.render_node(node, output)?;
        }
        Ok(())
    }

    fn render_node(&mut self, node: &'a Node, output: &mut String) -> Result<()> {
        match node {
            Node::Text(text) => {
                output.push_str(text);
            }

            Node::Expression { source, escape } => {
                let value = evaluate(&source.expr, &self.env)?;
                let text = value.to_output_string();
                if *escape {
                    output.push_str(&escape_html(&text));
                } else {
                    output.push_str(&text);
                }
            }

            Node::Index => {
                let index = self.env.loop_index();
                output.push_str(&escape_html(&index.to_output_string()));
            }

            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if evaluate(&condition.expr, &self.env)?.is_truthy() {
                    self.render_nodes(then_branch, output)?;
                } else if let Some(else_nodes) = else_branch {
                    self.render_nodes(else_nodes, output)?;
                }
            }

            Node::Each {
                loop_var,
                collection,
                body,
            } => {
                let value = evaluate(&collection.expr, &self.env)?;
                let Some(entries) = iteration_entries(&value) else {
                    tracing::debug!(
                        "Skipping each over {}: {} is not iterable",
                        collection.text,
                        value.type_name()
                    );
                    return Ok(());
                };

                for (index, item) in entries {
                    self.env.push_frame(loop_var, item, index);
                    let result = self.render_nodes(body, output);
                    self.env.pop_frame();
                    result?;
                }
            }
        }

        Ok(())
    }
}

/// Entries an `each` iterates: positions for arrays and strings, keys for
/// plain objects. Dates, URLs and builtins are not iterated.
fn iteration_entries(value: &Value) -> Option<Vec<(Value, Value)>> {
    match value {
        Value::Array(_) | Value::Object(_) | Value::String(_) => value.entries(),
        _ => None,
    }
}

/// HTML-escape a string: `& < > " ' ` =`
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            c => out.push(c),
        }
    }
    out
}
