use crate::number::Number;
use crate::symbol::Symbol;
use std::rc::Rc;

pub type Ref<T> = Rc<T>;

/// Node of the syntax tree after all derived forms have been lowered.
#[derive(Debug, Clone)]
pub enum Expression {
    Number(Number),
    Bool(bool),
    Char(char),
    String(String),

    /// A quoted symbol; evaluates to itself.
    Symbol(Symbol),
    /// Quoted list datum. `tail` is set for dotted data such as `'(1 . 2)`.
    QuotedList {
        elements: Vec<Expression>,
        tail: Option<Box<Expression>>,
    },

    VariableReference(Symbol),
    Lambda(Ref<Lambda>),
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Option<Box<Expression>>,
    },
    Definition {
        name: Symbol,
        expr: Box<Expression>,
    },
    Assignment {
        name: Symbol,
        expr: Box<Expression>,
    },

    /// Placeholder value of `letrec` variables before their initialization.
    Unassigned,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormalParameters {
    Fixed(Vec<Symbol>),
    Rest(Symbol),
}

impl FormalParameters {
    pub fn none() -> Self {
        FormalParameters::Fixed(vec![])
    }

    pub fn names(&self) -> &[Symbol] {
        match self {
            FormalParameters::Fixed(names) => names,
            FormalParameters::Rest(name) => std::slice::from_ref(name),
        }
    }
}

#[derive(Debug)]
pub struct Lambda {
    pub formals: FormalParameters,
    pub body: Vec<Expression>,
}

impl Expression {
    pub fn var(name: impl Into<Symbol>) -> Self {
        Expression::VariableReference(name.into())
    }

    pub fn lambda(formals: FormalParameters, body: Vec<Expression>) -> Self {
        Expression::Lambda(Ref::new(Lambda { formals, body }))
    }

    pub fn call(callee: Expression, args: Vec<Expression>) -> Self {
        Expression::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn conditional(test: Expression, consequent: Expression, alternate: Expression) -> Self {
        Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Some(Box::new(alternate)),
        }
    }

    pub fn assignment(name: Symbol, expr: Expression) -> Self {
        Expression::Assignment {
            name,
            expr: Box::new(expr),
        }
    }

    pub fn definition(name: Symbol, expr: Expression) -> Self {
        Expression::Definition {
            name,
            expr: Box::new(expr),
        }
    }

    pub fn is_definition(&self) -> bool {
        match self {
            Expression::Definition { .. } => true,
            _ => false,
        }
    }
}

fn write_seq(f: &mut std::fmt::Formatter, items: &[Expression]) -> std::fmt::Result {
    for item in items {
        write!(f, " {}", item)?;
    }
    Ok(())
}

fn write_datum(f: &mut std::fmt::Formatter, datum: &Expression) -> std::fmt::Result {
    match datum {
        Expression::Symbol(s) => write!(f, "{}", s),
        Expression::QuotedList { elements, tail } => {
            write!(f, "(")?;
            for (i, x) in elements.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write_datum(f, x)?;
            }
            if let Some(tail) = tail {
                write!(f, " . ")?;
                write_datum(f, tail)?;
            }
            write!(f, ")")
        }
        other => write!(f, "{}", other),
    }
}

/// Writes the node back as (desugared) Scheme source.
impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use Expression::*;
        match self {
            Number(n) => write!(f, "{}", n),
            Bool(true) => write!(f, "#t"),
            Bool(false) => write!(f, "#f"),
            Char(' ') => write!(f, "#\\space"),
            Char('\n') => write!(f, "#\\newline"),
            Char(c) => write!(f, "#\\{}", c),
            String(s) => write!(f, "\"{}\"", s),
            Symbol(_) | QuotedList { .. } => {
                write!(f, "'")?;
                write_datum(f, self)
            }
            VariableReference(s) => write!(f, "{}", s),
            Lambda(lambda) => {
                write!(f, "(lambda ")?;
                match &lambda.formals {
                    FormalParameters::Rest(name) => write!(f, "{}", name)?,
                    FormalParameters::Fixed(names) => {
                        let names: Vec<_> = names.iter().map(|n| n.name()).collect();
                        write!(f, "({})", names.join(" "))?
                    }
                }
                write_seq(f, &lambda.body)?;
                write!(f, ")")
            }
            Call { callee, args } => {
                write!(f, "({}", callee)?;
                write_seq(f, args)?;
                write!(f, ")")
            }
            Conditional {
                test,
                consequent,
                alternate,
            } => {
                write!(f, "(if {} {}", test, consequent)?;
                if let Some(alt) = alternate {
                    write!(f, " {}", alt)?;
                }
                write!(f, ")")
            }
            Definition { name, expr } => write!(f, "(define {} {})", name, expr),
            Assignment { name, expr } => write!(f, "(set! {} {})", name, expr),
            Unassigned => write!(f, "#<unassigned>"),
        }
    }
}

/// The toplevel forms of one program text, in source order.
#[derive(Debug, Default)]
pub struct SyntaxTree {
    pub nodes: Vec<Expression>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        SyntaxTree { nodes: vec![] }
    }

    pub fn add(&mut self, node: Expression) {
        self.nodes.push(node);
    }
}
