//! Parser - tokens to node tree.
//!
//! Blocks are parsed by recursive descent: every `#if`/`#each` parses its
//! own body up to the next structural marker, so the innermost block always
//! claims the nearest close tag.

use super::ast::{Node, Source};
use super::lexer::{Tag, Token};
use crate::error::{Result, TemplateError};
use crate::expr::{self, Expr};
use crate::value::Value;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

/// Where a node sequence stopped
enum Stop {
    End,
    Else(usize),
    IfClose(usize),
    EachClose(usize),
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<Vec<Node>> {
        let (nodes, stop) = self.parse_nodes()?;
        match stop {
            Stop::End => Ok(nodes),
            Stop::Else(pos) => Err(TemplateError::syntax(pos, "{{else}} outside of {{#if}}")),
            Stop::IfClose(pos) => Err(TemplateError::syntax(pos, "{{/if}} without matching {{#if}}")),
            Stop::EachClose(pos) => Err(TemplateError::syntax(
                pos,
                "{{/each}} without matching {{#each}}",
            )),
        }
    }

    /// Parse nodes until a structural marker or the end of input. The
    /// marker is consumed and reported to the caller.
    fn parse_nodes(&mut self) -> Result<(Vec<Node>, Stop)> {
        let mut nodes = Vec::new();

        while self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;

            let (tag, pos) = match token {
                Token::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Token::Tag { tag, pos } => (tag, pos),
            };

            match tag {
                Tag::Else => return Ok((nodes, Stop::Else(pos))),
                Tag::IfClose => return Ok((nodes, Stop::IfClose(pos))),
                Tag::EachClose => return Ok((nodes, Stop::EachClose(pos))),
                Tag::Index => nodes.push(Node::Index),
                Tag::Expression { source, pos } => {
                    nodes.push(Node::Expression {
                        source: parse_interpolation(source, pos)?,
                        escape: true,
                    });
                }
                Tag::IfOpen {
                    condition,
                    pos: condition_pos,
                } => {
                    let condition = parse_source(condition, condition_pos)?;
                    nodes.push(self.parse_if(condition, pos)?);
                }
                Tag::EachOpen {
                    loop_var,
                    collection,
                    pos: collection_pos,
                } => {
                    let collection = parse_source(collection, collection_pos)?;
                    let (body, stop) = self.parse_nodes()?;
                    match stop {
                        Stop::EachClose(_) => {}
                        Stop::End => {
                            return Err(TemplateError::syntax(pos, "Unclosed {{#each}}"))
                        }
                        Stop::Else(at) => {
                            return Err(TemplateError::syntax(
                                at,
                                "{{else}} directly inside {{#each}}",
                            ))
                        }
                        Stop::IfClose(at) => {
                            return Err(TemplateError::syntax(
                                at,
                                "Expected {{/each}} but found {{/if}}",
                            ))
                        }
                    }
                    nodes.push(Node::Each {
                        loop_var,
                        collection,
                        body,
                    });
                }
            }
        }

        Ok((nodes, Stop::End))
    }

    fn parse_if(&mut self, condition: Source, open_pos: usize) -> Result<Node> {
        let (then_branch, stop) = self.parse_nodes()?;
        let else_branch = match stop {
            Stop::IfClose(_) => None,
            Stop::Else(_) => {
                let (else_nodes, stop) = self.parse_nodes()?;
                match stop {
                    Stop::IfClose(_) => {}
                    Stop::End => return Err(TemplateError::syntax(open_pos, "Unclosed {{#if}}")),
                    Stop::Else(at) => {
                        return Err(TemplateError::syntax(at, "Duplicate {{else}} in {{#if}}"))
                    }
                    Stop::EachClose(at) => {
                        return Err(TemplateError::syntax(
                            at,
                            "Expected {{/if}} but found {{/each}}",
                        ))
                    }
                }
                Some(else_nodes)
            }
            Stop::End => return Err(TemplateError::syntax(open_pos, "Unclosed {{#if}}")),
            Stop::EachClose(at) => {
                return Err(TemplateError::syntax(
                    at,
                    "Expected {{/if}} but found {{/each}}",
                ))
            }
        };

        Ok(Node::If {
            condition,
            then_branch,
            else_branch,
        })
    }
}

/// Parse an expression, reporting errors relative to the template
fn parse_source(text: String, pos: usize) -> Result<Source> {
    let expr = expr::parse(&text).map_err(|e| e.offset_by(pos))?;
    Ok(Source { text, expr })
}

/// An empty `{{}}` interpolates `undefined`
fn parse_interpolation(text: String, pos: usize) -> Result<Source> {
    if text.is_empty() {
        return Ok(Source {
            text,
            expr: Expr::Literal(Value::Undefined),
        });
    }
    parse_source(text, pos)
}
