use crate::ast::{FormalParameters, Lambda, Ref};
use crate::environment::EnvRef;
use crate::errors::*;
use crate::interpreter::Interpreter;
use crate::number::Number;
use crate::symbol::Symbol;
use std::cell::RefCell;

/// Runtime values.
#[derive(Clone)]
pub enum Value {
    Number(Number),
    Bool(bool),
    Char(char),
    String(Ref<RefCell<String>>),
    Symbol(Symbol),
    Pair(Ref<Pair>),
    Nil,
    Procedure(Procedure),
    Promise(Ref<Promise>),
    Environment(EnvRef),

    /// Value of a `letrec` variable before initialization. Reading it is an error.
    Unassigned,
    /// Result of forms evaluated for their effect, like `define`.
    Unspecified,
}

pub struct Pair {
    car: RefCell<Value>,
    cdr: RefCell<Value>,
}

impl Pair {
    pub fn car(&self) -> Value {
        self.car.borrow().clone()
    }

    pub fn cdr(&self) -> Value {
        self.cdr.borrow().clone()
    }

    pub fn set_car(&self, value: Value) {
        *self.car.borrow_mut() = value;
    }

    pub fn set_cdr(&self, value: Value) {
        *self.cdr.borrow_mut() = value;
    }
}

impl Drop for Pair {
    /// Unlink the cdr chain in a loop so long lists do not free themselves
    /// recursively. Stops at the first pair that is shared.
    fn drop(&mut self) {
        let mut next = std::mem::replace(self.cdr.get_mut(), Value::Nil);
        while let Value::Pair(pair) = next {
            match Ref::try_unwrap(pair) {
                Ok(mut pair) => next = std::mem::replace(pair.cdr.get_mut(), Value::Nil),
                Err(_) => break,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Fixed(usize),
    /// Arguments arrive as a single proper list.
    Variadic,
}

pub type BuiltinFn = dyn Fn(&mut Interpreter, &[Value]) -> Result<Value>;

pub struct Builtin {
    pub name: &'static str,
    pub arity: Arity,
    pub func: Box<BuiltinFn>,
}

/// A lambda together with the environment it was created in.
pub struct Closure {
    pub lambda: Ref<Lambda>,
    pub env: EnvRef,
}

#[derive(Clone)]
pub enum Procedure {
    Builtin(Ref<Builtin>),
    Lambda(Ref<Closure>),
}

impl Procedure {
    pub fn builtin<F>(name: &'static str, arity: Arity, func: F) -> Self
    where
        F: Fn(&mut Interpreter, &[Value]) -> Result<Value> + 'static,
    {
        Procedure::Builtin(Ref::new(Builtin {
            name,
            arity,
            func: Box::new(func),
        }))
    }

    pub fn closure(lambda: Ref<Lambda>, env: EnvRef) -> Self {
        Procedure::Lambda(Ref::new(Closure { lambda, env }))
    }

    pub fn arity(&self) -> Arity {
        match self {
            Procedure::Builtin(b) => b.arity,
            Procedure::Lambda(c) => match &c.lambda.formals {
                FormalParameters::Fixed(names) => Arity::Fixed(names.len()),
                FormalParameters::Rest(_) => Arity::Variadic,
            },
        }
    }

    /// Bring the arguments into the shape the procedure expects: checked
    /// positional arguments, or a single list for variadic procedures.
    pub fn prepare_args(&self, args: Vec<Value>) -> Result<Vec<Value>> {
        match self.arity() {
            Arity::Variadic => Ok(vec![Value::list(args)]),
            Arity::Fixed(n) if n == args.len() => Ok(args),
            Arity::Fixed(n) => Err(ErrorKind::ArityMismatch {
                expected: n,
                given: args.len(),
            }
            .into()),
        }
    }

    pub fn ptr_eq(&self, other: &Procedure) -> bool {
        match (self, other) {
            (Procedure::Builtin(a), Procedure::Builtin(b)) => Ref::ptr_eq(a, b),
            (Procedure::Lambda(a), Procedure::Lambda(b)) => Ref::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Delayed computation; the thunk runs at most once.
pub struct Promise {
    thunk: Value,
    value: RefCell<Option<Value>>,
}

impl Promise {
    pub fn new(thunk: Value) -> Self {
        Promise {
            thunk,
            value: RefCell::new(None),
        }
    }

    pub fn thunk(&self) -> &Value {
        &self.thunk
    }

    pub fn value(&self) -> Option<Value> {
        self.value.borrow().clone()
    }

    /// Memoize `value` unless the thunk forced this promise itself and a
    /// value was stored in the meantime. Returns the memoized value.
    pub fn resolve(&self, value: Value) -> Value {
        self.value.borrow_mut().get_or_insert(value).clone()
    }
}

impl Value {
    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Ref::new(Pair {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
        }))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::list_with_tail(items, Value::Nil)
    }

    pub fn list_with_tail(items: Vec<Value>, tail: Value) -> Value {
        items
            .into_iter()
            .rev()
            .fold(tail, |cdr, car| Value::cons(car, cdr))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(Ref::new(RefCell::new(s.into())))
    }

    pub fn symbol(name: &str) -> Value {
        Value::Symbol(Symbol::new(name))
    }

    /// Everything except `#f` counts as true.
    pub fn is_true(&self) -> bool {
        match self {
            Value::Bool(false) => false,
            _ => true,
        }
    }

    pub fn is_pair(&self) -> bool {
        match self {
            Value::Pair(_) => true,
            _ => false,
        }
    }

    pub fn is_nil(&self) -> bool {
        match self {
            Value::Nil => true,
            _ => false,
        }
    }

    pub fn is_procedure(&self) -> bool {
        match self {
            Value::Procedure(_) => true,
            _ => false,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        match self {
            Value::Unspecified => true,
            _ => false,
        }
    }

    /// True if the cdr chain ends in the empty list. Circular chains are not lists.
    pub fn is_list(&self) -> bool {
        let mut slow = self.clone();
        let mut fast = self.clone();
        loop {
            for _ in 0..2 {
                fast = match fast {
                    Value::Nil => return true,
                    Value::Pair(p) => p.cdr(),
                    _ => return false,
                };
            }
            slow = match slow {
                Value::Pair(p) => p.cdr(),
                other => other,
            };
            if let (Value::Pair(a), Value::Pair(b)) = (&slow, &fast) {
                if Ref::ptr_eq(a, b) {
                    return false;
                }
            }
        }
    }

    /// Elements of a proper list.
    pub fn list_to_vec(&self) -> Result<Vec<Value>> {
        if !self.is_list() {
            return Err(self.type_error());
        }
        let mut items = vec![];
        let mut cursor = self.clone();
        while let Value::Pair(p) = cursor {
            items.push(p.car());
            cursor = p.cdr();
        }
        Ok(items)
    }

    pub fn type_error(&self) -> Error {
        ErrorKind::TypeError(self.to_string()).into()
    }

    pub fn as_number(&self) -> Result<Number> {
        match self {
            Value::Number(n) => Ok(*n),
            _ => Err(self.type_error()),
        }
    }

    pub fn as_pair(&self) -> Result<&Ref<Pair>> {
        match self {
            Value::Pair(p) => Ok(p),
            _ => Err(self.type_error()),
        }
    }

    pub fn as_procedure(&self) -> Result<&Procedure> {
        match self {
            Value::Procedure(p) => Ok(p),
            _ => Err(self.type_error()),
        }
    }

    pub fn car(&self) -> Result<Value> {
        self.as_pair().map(|p| p.car())
    }

    pub fn cdr(&self) -> Result<Value> {
        self.as_pair().map(|p| p.cdr())
    }

    /// `eqv?`: value equality for numbers, characters, booleans and symbols,
    /// identity for everything that is allocated.
    pub fn is_eqv(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.eqv(*b),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::String(a), Value::String(b)) => Ref::ptr_eq(a, b),
            (Value::Pair(a), Value::Pair(b)) => Ref::ptr_eq(a, b),
            (Value::Procedure(a), Value::Procedure(b)) => a.ptr_eq(b),
            (Value::Promise(a), Value::Promise(b)) => Ref::ptr_eq(a, b),
            (Value::Environment(a), Value::Environment(b)) => a.ptr_eq(b),
            (Value::Unspecified, Value::Unspecified) => true,
            _ => false,
        }
    }

    pub fn is_eq(&self, other: &Value) -> bool {
        self.is_eqv(other)
    }

    /// `equal?`: structural comparison of strings and pairs.
    pub fn is_equal(&self, other: &Value) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        loop {
            let (next_a, next_b) = match (&a, &b) {
                (Value::String(x), Value::String(y)) => return *x.borrow() == *y.borrow(),
                (Value::Pair(x), Value::Pair(y)) => {
                    if Ref::ptr_eq(x, y) {
                        return true;
                    }
                    if !x.car().is_equal(&y.car()) {
                        return false;
                    }
                    (x.cdr(), y.cdr())
                }
                _ => return a.is_eqv(&b),
            };
            a = next_a;
            b = next_b;
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Number(Number::Integer(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Number(Number::Float(f))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Procedure> for Value {
    fn from(p: Procedure) -> Self {
        Value::Procedure(p)
    }
}

impl std::fmt::Display for Procedure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Procedure::Builtin(b) => write!(f, "#<builtin {}>", b.name),
            Procedure::Lambda(_) => write!(f, "#<procedure>"),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(true) => write!(f, "#t"),
            Value::Bool(false) => write!(f, "#f"),
            Value::Char(c) if c.is_whitespace() => write!(f, "{}", c),
            Value::Char(c) => write!(f, "\\#{}", c),
            Value::String(s) => write!(f, "\"{}\"", s.borrow()),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Nil => write!(f, "()"),
            Value::Pair(p) if self.is_list() => {
                write!(f, "(")?;
                write!(f, " {}", p.car())?;
                let mut cursor = p.cdr();
                while let Value::Pair(p) = cursor {
                    write!(f, " {}", p.car())?;
                    cursor = p.cdr();
                }
                write!(f, " )")
            }
            Value::Pair(p) => {
                // improper or circular: nest every pair, stop when the chain repeats
                let mut seen: Vec<Ref<Pair>> = vec![];
                let mut cursor = Value::Pair(p.clone());
                loop {
                    match cursor {
                        Value::Pair(p) => {
                            if seen.iter().any(|q| Ref::ptr_eq(q, &p)) {
                                write!(f, "...")?;
                                break;
                            }
                            write!(f, "( {} . ", p.car())?;
                            cursor = p.cdr();
                            seen.push(p);
                        }
                        tail => {
                            write!(f, "{}", tail)?;
                            break;
                        }
                    }
                }
                for _ in 0..seen.len() {
                    write!(f, " )")?;
                }
                Ok(())
            }
            Value::Procedure(p) => write!(f, "{}", p),
            Value::Promise(_) => write!(f, "#<promise>"),
            Value::Environment(_) => write!(f, "#<environment>"),
            Value::Unassigned => write!(f, "#<unassigned>"),
            Value::Unspecified => write!(f, "#<unspecified>"),
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}
