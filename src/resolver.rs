//! Variable resolver: which free identifiers of a template must come from
//! the caller's context

use indexmap::IndexSet;

use crate::host::{is_host_global, is_reserved};
use crate::template::{Node, Source};

/// Binding requirements of a compiled template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Names to bind from the render context, in first-use order
    pub required: IndexSet<String>,
    /// Names declared through `{{@globals ...}}`
    pub declared_globals: IndexSet<String>,
}

/// Classify every free identifier of `nodes`
pub fn resolve<'a>(nodes: &[Node], declared: impl IntoIterator<Item = &'a str>) -> Resolution {
    let mut resolution = Resolution {
        required: IndexSet::new(),
        declared_globals: declared.into_iter().map(str::to_string).collect(),
    };
    let mut bound = Vec::new();
    collect(nodes, &mut bound, &mut resolution);
    resolution
}

fn collect<'a>(nodes: &'a [Node], bound: &mut Vec<&'a str>, resolution: &mut Resolution) {
    for node in nodes {
        match node {
            Node::Text(_) | Node::Index => {}
            Node::Expression { source, .. } => classify(source, bound, resolution),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                classify(condition, bound, resolution);
                collect(then_branch, bound, resolution);
                if let Some(else_branch) = else_branch {
                    collect(else_branch, bound, resolution);
                }
            }
            Node::Each {
                loop_var,
                collection,
                body,
            } => {
                classify(collection, bound, resolution);
                bound.push(loop_var);
                collect(body, bound, resolution);
                bound.pop();
            }
        }
    }
}

fn classify(source: &Source, bound: &[&str], resolution: &mut Resolution) {
    for name in source.expr.identifiers() {
        if is_free(name, bound, resolution) {
            resolution.required.insert(name.to_string());
        }
    }
}

fn is_free(name: &str, bound: &[&str], resolution: &Resolution) -> bool {
    !(is_reserved(name)
        || is_host_global(name)
        || resolution.declared_globals.contains(name)
        || bound.contains(&name))
}
