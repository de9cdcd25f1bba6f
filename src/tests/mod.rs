mod builtins;
mod definitions;
mod lambdas;
mod quotes;
mod tail_calls;

use crate::{scan_evaluate, Interpreter};

/// Evaluate `src` in a fresh interpreter. Returns the printed value of the
/// last form, or the error text.
fn run(src: &str) -> String {
    run_in(&mut Interpreter::new(), src)
}

/// Evaluate `src` in the toplevel environment of `interp`.
fn run_in(interp: &mut Interpreter, src: &str) -> String {
    match scan_evaluate(src, interp) {
        Ok(value) => value.to_string(),
        Err(e) => e.to_string(),
    }
}
