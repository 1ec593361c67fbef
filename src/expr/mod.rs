//! The embedded expression language.
//!
//! A restricted subset of JavaScript expressions: literals, identifiers,
//! member and index access, calls, `new`, unary and binary operators and the
//! conditional operator. Statements, assignment, function literals and
//! object literals are rejected at parse time.

pub mod ast;
mod eval;
mod lexer;
mod methods;
mod parser;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::evaluate;
pub use lexer::is_identifier;
pub use parser::parse;
