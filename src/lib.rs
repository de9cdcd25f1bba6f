//! A small interpreter for a subset of Scheme.
//!
//! Source text goes through three stages: the lexer produces tokens, the
//! parser builds a syntax tree in which every derived form is already
//! rewritten to primitive syntax, and the interpreter evaluates the tree.
//!
//! ```
//! use minischeme::{scan_evaluate, Interpreter};
//!
//! let mut interp = Interpreter::new();
//! let value = scan_evaluate("(define (sq x) (* x x)) (sq 12)", &mut interp).unwrap();
//! assert_eq!("144", value.to_string());
//! ```

pub mod ast;
pub mod builtins;
pub mod completer;
pub mod environment;
pub mod errors;
pub mod interpreter;
pub mod io;
pub mod lexer;
pub mod number;
pub mod parser;
pub mod symbol;
pub mod syntax;
pub mod token;
pub mod value;

#[cfg(test)]
mod tests;

pub use crate::errors::{Error, ErrorKind, Result};
pub use crate::interpreter::Interpreter;
pub use crate::value::Value;

/// Scan, parse and evaluate `text` in the toplevel environment of `interp`.
/// Returns the value of the last form.
///
/// Lexical errors prevent parsing and syntax errors prevent evaluation, so
/// nothing of the text runs unless all of it is well formed.
pub fn scan_evaluate(text: &str, interp: &mut Interpreter) -> Result<Value> {
    let tokens = lexer::scan(text)?;
    let tree = parser::parse(tokens)?;
    interp.interpret(&tree)
}
