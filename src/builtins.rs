//! Primitive procedures of the base environment.

use crate::ast::Ref;
use crate::environment::EnvRef;
use crate::errors::*;
use crate::interpreter::Interpreter;
use crate::number::Number;
use crate::parser::{datum_to_tokens, parse};
use crate::value::{Arity, Procedure, Promise, Value};
use std::cmp::Ordering;
use std::io::Write;

/// A fresh environment holding every primitive procedure.
pub fn default_env() -> EnvRef {
    let env = EnvRef::root();

    // numbers

    register(&env, "+", Arity::Variadic, |_, args| {
        fold(args, Number::Integer(0), Number::add)
    });
    register(&env, "*", Arity::Variadic, |_, args| {
        fold(args, Number::Integer(1), Number::mul)
    });
    register(&env, "-", Arity::Variadic, |_, args| {
        unifold("-", args, Number::Integer(0), Number::sub)
    });
    register(&env, "/", Arity::Variadic, |_, args| {
        unifold("/", args, Number::Integer(1), Number::div)
    });

    register(&env, "=", Arity::Variadic, |_, args| compare("=", args, |a, b| a == b));
    register(&env, "<", Arity::Variadic, |_, args| compare("<", args, |a, b| a < b));
    register(&env, ">", Arity::Variadic, |_, args| compare(">", args, |a, b| a > b));
    register(&env, "<=", Arity::Variadic, |_, args| compare("<=", args, |a, b| a <= b));
    register(&env, ">=", Arity::Variadic, |_, args| compare(">=", args, |a, b| a >= b));

    register(&env, "abs", Arity::Fixed(1), |_, args| {
        unary(args)?.as_number()?.abs().map(Value::from)
    });
    register(&env, "min", Arity::Variadic, |_, args| {
        extreme("min", args, |a, b| a < b)
    });
    register(&env, "max", Arity::Variadic, |_, args| {
        extreme("max", args, |a, b| a > b)
    });
    register(&env, "remainder", Arity::Fixed(2), |_, args| {
        let (a, b) = binary(args)?;
        a.as_number()?.remainder(b.as_number()?).map(Value::from)
    });
    register(&env, "quotient", Arity::Fixed(2), |_, args| {
        let (a, b) = binary(args)?;
        a.as_number()?.quotient(b.as_number()?).map(Value::from)
    });

    register(&env, "number?", Arity::Fixed(1), |_, args| {
        Ok(matches!(unary(args)?, Value::Number(_)).into())
    });
    register(&env, "integer?", Arity::Fixed(1), |_, args| {
        Ok(match unary(args)? {
            Value::Number(Number::Integer(_)) => true,
            Value::Number(Number::Float(f)) => f.is_finite() && f.trunc() == *f,
            _ => false,
        }
        .into())
    });
    register(&env, "zero?", Arity::Fixed(1), |_, args| {
        Ok(unary(args)?.as_number()?.is_zero().into())
    });
    register(&env, "positive?", Arity::Fixed(1), |_, args| {
        Ok((unary(args)?.as_number()?.signum() == Ordering::Greater).into())
    });
    register(&env, "negative?", Arity::Fixed(1), |_, args| {
        Ok((unary(args)?.as_number()?.signum() == Ordering::Less).into())
    });

    // booleans

    register(&env, "not", Arity::Fixed(1), |_, args| {
        Ok((!unary(args)?.is_true()).into())
    });
    register(&env, "boolean?", Arity::Fixed(1), |_, args| {
        Ok(matches!(unary(args)?, Value::Bool(_)).into())
    });

    // equivalence

    register(&env, "eq?", Arity::Fixed(2), |_, args| {
        let (a, b) = binary(args)?;
        Ok(a.is_eq(b).into())
    });
    register(&env, "eqv?", Arity::Fixed(2), |_, args| {
        let (a, b) = binary(args)?;
        Ok(a.is_eqv(b).into())
    });
    register(&env, "equal?", Arity::Fixed(2), |_, args| {
        let (a, b) = binary(args)?;
        Ok(a.is_equal(b).into())
    });

    // pairs and lists

    register(&env, "cons", Arity::Fixed(2), |_, args| {
        let (car, cdr) = binary(args)?;
        Ok(Value::cons(car.clone(), cdr.clone()))
    });
    register(&env, "car", Arity::Fixed(1), |_, args| unary(args)?.car());
    register(&env, "cdr", Arity::Fixed(1), |_, args| unary(args)?.cdr());
    register(&env, "set-car!", Arity::Fixed(2), |_, args| {
        let (pair, value) = binary(args)?;
        pair.as_pair()?.set_car(value.clone());
        Ok(Value::Unspecified)
    });
    register(&env, "set-cdr!", Arity::Fixed(2), |_, args| {
        let (pair, value) = binary(args)?;
        pair.as_pair()?.set_cdr(value.clone());
        Ok(Value::Unspecified)
    });
    register_cxr_family(&env);

    register(&env, "pair?", Arity::Fixed(1), |_, args| {
        Ok(unary(args)?.is_pair().into())
    });
    register(&env, "null?", Arity::Fixed(1), |_, args| {
        Ok(unary(args)?.is_nil().into())
    });
    register(&env, "list?", Arity::Fixed(1), |_, args| {
        Ok(unary(args)?.is_list().into())
    });
    register(&env, "length", Arity::Fixed(1), |_, args| {
        let items = unary(args)?.list_to_vec()?;
        Ok(Value::from(items.len() as i64))
    });
    register(&env, "list", Arity::Variadic, |_, args| Ok(unary(args)?.clone()));
    register(&env, "append", Arity::Variadic, |_, args| {
        let mut lists = rest(args)?;
        let last = lists.pop().ok_or_else(|| too_few("append", 1))?;
        let mut items = vec![];
        for list in &lists {
            items.extend(list.list_to_vec()?);
        }
        Ok(Value::list_with_tail(items, last))
    });

    // control

    register(&env, "procedure?", Arity::Fixed(1), |_, args| {
        Ok(unary(args)?.is_procedure().into())
    });
    register(&env, "apply", Arity::Variadic, |interp, args| {
        let mut args = rest(args)?;
        if args.len() < 2 {
            return Err(too_few("apply", 2));
        }
        let spread = args.pop().unwrap_or(Value::Nil).list_to_vec()?;
        let f = args.remove(0);
        args.extend(spread);
        interp.apply(&f, args)
    });
    register(&env, "map", Arity::Variadic, |interp, args| {
        map_lists(interp, "map", args).map(Value::list)
    });
    register(&env, "for-each", Arity::Variadic, |interp, args| {
        map_lists(interp, "for-each", args)?;
        Ok(Value::Unspecified)
    });
    register(&env, "eval", Arity::Variadic, eval);
    register(&env, "scheme-report-environment", Arity::Fixed(1), |_, _| {
        Ok(Value::Environment(default_env()))
    });
    register(&env, "null-environment", Arity::Fixed(1), |_, _| {
        Ok(Value::Environment(null_env()))
    });

    // promises and streams

    register(&env, "make-promise", Arity::Fixed(1), |_, args| {
        let thunk = unary(args)?;
        thunk.as_procedure()?;
        Ok(Value::Promise(Ref::new(Promise::new(thunk.clone()))))
    });
    register(&env, "force", Arity::Fixed(1), |interp, args| {
        interp.force(unary(args)?)
    });
    register(&env, "stream-car", Arity::Fixed(1), |_, args| unary(args)?.car());
    register(&env, "stream-cdr", Arity::Fixed(1), |interp, args| {
        let tail = unary(args)?.cdr()?;
        interp.force(&tail)
    });

    // other

    register(&env, "symbol?", Arity::Fixed(1), |_, args| {
        Ok(matches!(unary(args)?, Value::Symbol(_)).into())
    });
    register(&env, "string?", Arity::Fixed(1), |_, args| {
        Ok(matches!(unary(args)?, Value::String(_)).into())
    });
    register(&env, "char?", Arity::Fixed(1), |_, args| {
        Ok(matches!(unary(args)?, Value::Char(_)).into())
    });
    register(&env, "display", Arity::Fixed(1), |_, args| {
        let text = match unary(args)? {
            Value::String(s) => s.borrow().clone(),
            Value::Char(c) => c.to_string(),
            other => other.to_string(),
        };
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(Value::Unspecified)
    });
    register(&env, "newline", Arity::Fixed(0), |_, _| {
        let mut stdout = std::io::stdout();
        writeln!(stdout)?;
        stdout.flush()?;
        Ok(Value::Unspecified)
    });

    env
}

/// An environment without any bindings.
pub fn null_env() -> EnvRef {
    EnvRef::root()
}

fn register<F>(env: &EnvRef, name: &'static str, arity: Arity, func: F)
where
    F: Fn(&mut Interpreter, &[Value]) -> Result<Value> + 'static,
{
    env.define(name, Procedure::builtin(name, arity, func).into());
}

#[rustfmt::skip]
const CXR_NAMES: [&str; 28] = [
    "caar", "cadr", "cdar", "cddr",
    "caaar", "caadr", "cadar", "caddr", "cdaar", "cdadr", "cddar", "cdddr",
    "caaaar", "caaadr", "caadar", "caaddr", "cadaar", "cadadr", "caddar", "cadddr",
    "cdaaar", "cdaadr", "cdadar", "cdaddr", "cddaar", "cddadr", "cdddar", "cddddr",
];

/// `caar` through `cddddr`. The letters between `c` and `r` are applied
/// from right to left.
fn register_cxr_family(env: &EnvRef) {
    for &name in CXR_NAMES.iter() {
        let path = &name[1..name.len() - 1];
        register(env, name, Arity::Fixed(1), move |_, args| {
            path.chars()
                .rev()
                .try_fold(unary(args)?.clone(), |x, op| match op {
                    'a' => x.car(),
                    _ => x.cdr(),
                })
        });
    }
}

fn unary(args: &[Value]) -> Result<&Value> {
    match args {
        [x] => Ok(x),
        _ => Err(arity_mismatch(1, args)),
    }
}

fn binary(args: &[Value]) -> Result<(&Value, &Value)> {
    match args {
        [a, b] => Ok((a, b)),
        _ => Err(arity_mismatch(2, args)),
    }
}

/// Arguments of a variadic primitive, which arrive as one list.
fn rest(args: &[Value]) -> Result<Vec<Value>> {
    unary(args)?.list_to_vec()
}

fn arity_mismatch(expected: usize, args: &[Value]) -> Error {
    ErrorKind::ArityMismatch {
        expected,
        given: args.len(),
    }
    .into()
}

fn too_few(name: &str, min: usize) -> Error {
    ErrorKind::TooFewArguments {
        name: name.to_string(),
        min,
    }
    .into()
}

fn numbers(args: &[Value]) -> Result<Vec<Number>> {
    rest(args)?.iter().map(Value::as_number).collect()
}

fn fold(args: &[Value], init: Number, op: fn(Number, Number) -> Result<Number>) -> Result<Value> {
    numbers(args)?
        .into_iter()
        .try_fold(init, op)
        .map(Value::from)
}

/// Like `fold`, but a single argument is combined with `identity` instead,
/// so `(- x)` negates and `(/ x)` inverts.
fn unifold(
    name: &str,
    args: &[Value],
    identity: Number,
    op: fn(Number, Number) -> Result<Number>,
) -> Result<Value> {
    let numbers = numbers(args)?;
    match numbers.split_first() {
        None => Err(too_few(name, 1)),
        Some((&first, [])) => op(identity, first).map(Value::from),
        Some((&first, rest)) => rest
            .iter()
            .try_fold(first, |acc, &x| op(acc, x))
            .map(Value::from),
    }
}

/// True if `holds` for every two neighbouring arguments.
fn compare(name: &str, args: &[Value], holds: fn(&Number, &Number) -> bool) -> Result<Value> {
    let numbers = numbers(args)?;
    if numbers.is_empty() {
        return Err(too_few(name, 1));
    }
    Ok(numbers.windows(2).all(|w| holds(&w[0], &w[1])).into())
}

/// `min` and `max`. The result is a float if any argument is.
fn extreme(name: &str, args: &[Value], better: fn(Number, Number) -> bool) -> Result<Value> {
    let numbers = numbers(args)?;
    let (&first, rest) = numbers.split_first().ok_or_else(|| too_few(name, 1))?;

    let mut best = first;
    let mut inexact = !first.is_integer();
    for &x in rest {
        inexact |= !x.is_integer();
        if better(x, best) {
            best = x;
        }
    }

    if inexact {
        Ok(Value::from(best.to_float()))
    } else {
        Ok(Value::from(best))
    }
}

/// Apply the first argument elementwise to the lists that follow, stopping
/// at the end of the shortest list.
fn map_lists(interp: &mut Interpreter, name: &str, args: &[Value]) -> Result<Vec<Value>> {
    let args = rest(args)?;
    let (f, lists) = match args.split_first() {
        Some((f, lists)) if !lists.is_empty() => (f, lists),
        _ => return Err(too_few(name, 2)),
    };
    let lists = lists
        .iter()
        .map(Value::list_to_vec)
        .collect::<Result<Vec<_>>>()?;
    let n = lists.iter().map(Vec::len).min().unwrap_or(0);

    (0..n)
        .map(|i| interp.apply(f, lists.iter().map(|list| list[i].clone()).collect()))
        .collect()
}

/// `(eval datum [environment])`. The datum is read back through the parser
/// so derived forms are available to it.
fn eval(interp: &mut Interpreter, args: &[Value]) -> Result<Value> {
    let args = rest(args)?;
    let (datum, env) = match args.as_slice() {
        [datum] => (datum, interp.global_env().clone()),
        [datum, Value::Environment(env)] => (datum, env.clone()),
        [_, other] => return Err(other.type_error()),
        [] => return Err(too_few("eval", 1)),
        _ => return Err(arity_mismatch(2, &args)),
    };

    let mut tokens = vec![];
    datum_to_tokens(datum, &mut tokens)?;
    let tree = parse(tokens)?;
    interp.interpret_in(&tree, &env)
}
