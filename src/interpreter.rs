use crate::ast::{Expression, SyntaxTree};
use crate::builtins::default_env;
use crate::environment::EnvRef;
use crate::errors::*;
use crate::value::{Closure, Procedure, Value};
use log::{debug, trace};

/// Depth limit of `Interpreter::new`. Every nested application uses host
/// stack, and this limit is reached before an 8 MiB stack runs out, also in
/// unoptimized builds. Raise it with `with_max_depth` only on a thread with a
/// correspondingly larger stack.
pub const DEFAULT_MAX_DEPTH: usize = 500;

/// Outcome of evaluating an expression. Calls in tail position are not
/// performed but handed back as `TailCall`, to be run by the trampoline of
/// the nearest non-tail evaluation.
pub enum Return {
    Value(Value),
    TailCall(Procedure, Vec<Value>),
}

pub struct Interpreter {
    global: EnvRef,
    depth: usize,
    max_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    /// An interpreter whose toplevel is a fresh base environment.
    pub fn new() -> Self {
        Interpreter::with_env(default_env())
    }

    pub fn with_env(global: EnvRef) -> Self {
        Interpreter {
            global,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Limit the nesting of non-tail procedure applications. Tail calls do
    /// not count against the limit. Each level needs a few KiB of host stack.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn global_env(&self) -> &EnvRef {
        &self.global
    }

    /// Evaluate the toplevel forms in order and return the value of the last.
    /// The first runtime error stops the evaluation.
    pub fn interpret(&mut self, tree: &SyntaxTree) -> Result<Value> {
        let global = self.global.clone();
        self.interpret_in(tree, &global)
    }

    pub fn interpret_in(&mut self, tree: &SyntaxTree, env: &EnvRef) -> Result<Value> {
        let mut result = Value::Unspecified;
        for node in &tree.nodes {
            result = self.eval_value(node, env).map_err(|e| {
                debug!("runtime error: {}", e);
                e
            })?;
        }
        Ok(result)
    }

    /// Apply a procedure value to arguments and run it to completion.
    pub fn apply(&mut self, f: &Value, args: Vec<Value>) -> Result<Value> {
        let procedure = match f {
            Value::Procedure(p) => p.clone(),
            other => return Err(ErrorKind::NotAProcedure(other.to_string()).into()),
        };
        let args = procedure.prepare_args(args)?;
        let ret = self.apply_now(&procedure, args)?;
        self.trampoline(ret)
    }

    /// Force a promise. Values that are not promises are returned as they are.
    pub fn force(&mut self, value: &Value) -> Result<Value> {
        match value {
            Value::Promise(promise) => {
                if let Some(value) = promise.value() {
                    return Ok(value);
                }
                let value = self.apply(promise.thunk(), vec![])?;
                Ok(promise.resolve(value))
            }
            other => Ok(other.clone()),
        }
    }

    /// Non-tail evaluation point: deferred tail calls end here.
    fn eval_value(&mut self, expr: &Expression, env: &EnvRef) -> Result<Value> {
        let ret = self.eval(expr, env, false)?;
        self.trampoline(ret)
    }

    fn trampoline(&mut self, mut ret: Return) -> Result<Value> {
        loop {
            match ret {
                Return::Value(value) => return Ok(value),
                Return::TailCall(procedure, args) => {
                    trace!("trampoline: {} with {} argument(s)", procedure, args.len());
                    ret = self.apply_now(&procedure, args)?;
                }
            }
        }
    }

    fn eval(&mut self, expr: &Expression, env: &EnvRef, tail: bool) -> Result<Return> {
        let value = match expr {
            Expression::Number(n) => Value::Number(*n),
            Expression::Bool(b) => Value::Bool(*b),
            Expression::Char(c) => Value::Char(*c),
            Expression::String(s) => Value::string(s.as_str()),
            Expression::Symbol(s) => Value::Symbol(*s),
            Expression::QuotedList {
                elements,
                tail: dotted,
            } => {
                let items = elements
                    .iter()
                    .map(|x| self.eval_value(x, env))
                    .collect::<Result<_>>()?;
                let last_cdr = match dotted {
                    Some(datum) => self.eval_value(datum, env)?,
                    None => Value::Nil,
                };
                Value::list_with_tail(items, last_cdr)
            }
            Expression::VariableReference(name) => match env.lookup(name) {
                None => return Err(ErrorKind::Unbound(*name).into()),
                Some(Value::Unassigned) => return Err(ErrorKind::Unassigned(*name).into()),
                Some(value) => value,
            },
            Expression::Lambda(lambda) => Procedure::closure(lambda.clone(), env.clone()).into(),
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => {
                return if self.eval_value(test, env)?.is_true() {
                    self.eval(consequent, env, tail)
                } else if let Some(alternate) = alternate {
                    self.eval(alternate, env, tail)
                } else {
                    Ok(Return::Value(Value::Nil))
                };
            }
            Expression::Definition { name, expr } => {
                let value = self.eval_value(expr, env)?;
                env.define(*name, value);
                Value::Unspecified
            }
            Expression::Assignment { name, expr } => {
                if env.lookup(name).is_none() {
                    return Err(ErrorKind::NotBound(*name).into());
                }
                let value = self.eval_value(expr, env)?;
                env.set(name, value)
                    .ok_or_else(|| Error::from(ErrorKind::NotBound(*name)))?;
                Value::Unspecified
            }
            Expression::Call { callee, args } => {
                let procedure = match self.eval_value(callee, env)? {
                    Value::Procedure(p) => p,
                    other => return Err(ErrorKind::NotAProcedure(other.to_string()).into()),
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval_value(arg, env))
                    .collect::<Result<Vec<_>>>()?;
                return self.apply_procedure(procedure, args, tail);
            }
            Expression::Unassigned => Value::Unassigned,
        };
        Ok(Return::Value(value))
    }

    /// Arity is checked on every application. A user defined procedure called
    /// in tail position is deferred, everything else runs now.
    fn apply_procedure(&mut self, procedure: Procedure, args: Vec<Value>, tail: bool) -> Result<Return> {
        let args = procedure.prepare_args(args)?;
        match procedure {
            Procedure::Lambda(_) if tail => {
                trace!("deferring tail call to {}", procedure);
                Ok(Return::TailCall(procedure, args))
            }
            _ => self.apply_now(&procedure, args),
        }
    }

    /// Run a procedure on already prepared arguments. For user defined
    /// procedures the last body expression is evaluated in tail position,
    /// so the result may be a deferred call.
    fn apply_now(&mut self, procedure: &Procedure, args: Vec<Value>) -> Result<Return> {
        match procedure {
            Procedure::Builtin(builtin) => (builtin.func)(self, &args).map(Return::Value),
            Procedure::Lambda(closure) => {
                if self.depth >= self.max_depth {
                    return Err(ErrorKind::RecursionDepthExceeded(self.max_depth).into());
                }
                self.depth += 1;
                let result = self.run_body(closure, args);
                self.depth -= 1;
                result
            }
        }
    }

    fn run_body(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Return> {
        let env = closure.env.child();
        {
            let mut frame = env.borrow_mut();
            for (name, arg) in closure.lambda.formals.names().iter().zip(args) {
                frame.insert(*name, arg);
            }
        }

        match closure.lambda.body.split_last() {
            None => Ok(Return::Value(Value::Unspecified)),
            Some((last, init)) => {
                for expr in init {
                    self.eval_value(expr, &env)?;
                }
                self.eval(last, &env, true)
            }
        }
    }
}
