//! Expression syntax tree

use std::fmt;

use crate::value::{format_number, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    TypeOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Le,
    Gt,
    Ge,
    InstanceOf,
    In,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::LooseEq => "==",
            BinaryOp::LooseNe => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::InstanceOf => "instanceof",
            BinaryOp::In => "in",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    /// `@index`
    LoopIndex,
    This,
    Array(Vec<Expr>),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    New {
        constructor: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

impl Expr {
    /// Free identifiers in evaluation order, duplicates included. Property
    /// names after `.` are not identifiers.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Ident(name) => names.push(name),
            Expr::Literal(_) | Expr::LoopIndex | Expr::This => {}
            Expr::Array(items) => items.iter().for_each(|e| e.collect_identifiers(names)),
            Expr::Member { object, .. } => object.collect_identifiers(names),
            Expr::Index { object, index } => {
                object.collect_identifiers(names);
                index.collect_identifiers(names);
            }
            Expr::Call { callee, args } => {
                callee.collect_identifiers(names);
                args.iter().for_each(|e| e.collect_identifiers(names));
            }
            Expr::New { constructor, args } => {
                constructor.collect_identifiers(names);
                args.iter().for_each(|e| e.collect_identifiers(names));
            }
            Expr::Unary { operand, .. } => operand.collect_identifiers(names),
            Expr::Binary { left, right, .. } => {
                left.collect_identifiers(names);
                right.collect_identifiers(names);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.collect_identifiers(names);
                consequent.collect_identifiers(names);
                alternate.collect_identifiers(names);
            }
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::String(s)) => write!(f, "{:?}", s),
            Expr::Literal(Value::Number(n)) => write!(f, "{}", format_number(*n)),
            Expr::Literal(v) => write!(f, "{}", v.to_output_string()),
            Expr::Ident(name) => write!(f, "{}", name),
            Expr::LoopIndex => write!(f, "@index"),
            Expr::This => write!(f, "this"),
            Expr::Array(items) => {
                write!(f, "[")?;
                write_args(f, items)?;
                write!(f, "]")
            }
            Expr::Member { object, property } => write!(f, "{}.{}", object, property),
            Expr::Index { object, index } => write!(f, "{}[{}]", object, index),
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::New { constructor, args } => {
                write!(f, "new {}(", constructor)?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!{}", operand),
                UnaryOp::Neg => write!(f, "-{}", operand),
                UnaryOp::Plus => write!(f, "+{}", operand),
                UnaryOp::TypeOf => write!(f, "typeof {}", operand),
            },
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => write!(f, "({} ? {} : {})", test, consequent, alternate),
        }
    }
}
