//! Template node tree

use crate::expr::Expr;

/// An expression kept alongside the text it was parsed from
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub text: String,
    pub expr: Expr,
}

/// AST node types
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Raw text to output
    Text(String),
    /// `{{expr}}`; `escape` is always set since there is no raw output tag
    Expression { source: Source, escape: bool },
    /// `{{#if cond}} ... {{else}} ... {{/if}}`
    If {
        condition: Source,
        then_branch: Vec<Node>,
        else_branch: Option<Vec<Node>>,
    },
    /// `{{#each loop_var in collection}} ... {{/each}}`
    Each {
        loop_var: String,
        collection: Source,
        body: Vec<Node>,
    },
    /// `{{@index}}`
    Index,
}
