//! Derived expressions.
//!
//! Every function here rewrites one derived form into primitive syntax
//! (lambda, call, conditional, assignment). They are pure and never fail;
//! the parser has already checked the shape of the form.
//!
//! Temporaries are named with a leading `#`, which no identifier read by the
//! lexer can start with, so they never capture user variables.

use crate::ast::{Expression, FormalParameters};
use crate::symbol::Symbol;

pub type Binding = (Symbol, Expression);

/// One `cond` clause. A clause without test is the `else` clause.
#[derive(Debug, Clone)]
pub struct CondClause {
    pub test: Option<Expression>,
    pub sequence: Vec<Expression>,
}

impl CondClause {
    pub fn new(test: Expression, sequence: Vec<Expression>) -> Self {
        CondClause {
            test: Some(test),
            sequence,
        }
    }

    pub fn otherwise(sequence: Vec<Expression>) -> Self {
        CondClause {
            test: None,
            sequence,
        }
    }

    pub fn is_else(&self) -> bool {
        self.test.is_none()
    }
}

/// One `case` clause. `data` is `None` for the `else` clause.
#[derive(Debug, Clone)]
pub struct CaseClause {
    pub data: Option<Vec<Expression>>,
    pub sequence: Vec<Expression>,
}

/// `(begin e ...)` => `((lambda () e ...))`
pub fn make_begin(sequence: Vec<Expression>) -> Expression {
    Expression::call(Expression::lambda(FormalParameters::none(), sequence), vec![])
}

/// Fold the clauses from last to first into nested conditionals.
/// Without a matching clause the value is `#f`.
pub fn make_cond(clauses: Vec<CondClause>) -> Expression {
    let mut expression = Expression::Bool(false);

    for clause in clauses.into_iter().rev() {
        expression = match clause.test {
            None => make_begin(clause.sequence),
            Some(test) if clause.sequence.is_empty() => {
                let tmp = Symbol::new("#cond-tmp");
                make_let(
                    vec![(tmp, test)],
                    vec![Expression::conditional(
                        Expression::var(tmp),
                        Expression::var(tmp),
                        expression,
                    )],
                )
            }
            Some(test) => Expression::conditional(test, make_begin(clause.sequence), expression),
        };
    }

    expression
}

/// `(let ((v init) ...) body ...)` => `((lambda (v ...) body ...) init ...)`
pub fn make_let(bindings: Vec<Binding>, body: Vec<Expression>) -> Expression {
    let (names, inits): (Vec<_>, Vec<_>) = bindings.into_iter().unzip();
    Expression::call(
        Expression::lambda(FormalParameters::Fixed(names), body),
        inits,
    )
}

/// `(let name ((v init) ...) body ...)` =>
/// `((letrec ((name (lambda (v ...) body ...))) name) init ...)`
pub fn make_named_let(name: Symbol, bindings: Vec<Binding>, body: Vec<Expression>) -> Expression {
    let (names, inits): (Vec<_>, Vec<_>) = bindings.into_iter().unzip();
    let procedure = Expression::lambda(FormalParameters::Fixed(names), body);
    let letrec = make_letrec(vec![(name, procedure)], vec![Expression::var(name)]);
    Expression::call(letrec, inits)
}

pub fn make_letstar(bindings: Vec<Binding>, body: Vec<Expression>) -> Expression {
    let mut bindings = bindings.into_iter().rev();
    let mut expression = match bindings.next() {
        None => return make_let(vec![], body),
        Some(innermost) => make_let(vec![innermost], body),
    };
    for binding in bindings {
        expression = make_let(vec![binding], vec![expression]);
    }
    expression
}

/// ```text
/// (letrec ((v init) ...) body ...)
/// =>
/// (let ((v <unassigned>) ...)
///   (let ((tmp init) ...)
///     (set! v tmp) ...
///     body ...))
/// ```
pub fn make_letrec(bindings: Vec<Binding>, body: Vec<Expression>) -> Expression {
    if bindings.is_empty() {
        return make_let(vec![], body);
    }

    let mut outer = Vec::with_capacity(bindings.len());
    let mut inner = Vec::with_capacity(bindings.len());
    let mut sequence = Vec::with_capacity(bindings.len() + body.len());

    for (i, (name, init)) in bindings.into_iter().enumerate() {
        let tmp = Symbol::new(format!("#letrec-{}", i));
        outer.push((name, Expression::Unassigned));
        inner.push((tmp, init));
        sequence.push(Expression::assignment(name, Expression::var(tmp)));
    }
    sequence.extend(body);

    make_let(outer, vec![make_let(inner, sequence)])
}

/// Lower the leading internal definitions of a body into one `letrec`.
pub fn make_body(body: Vec<Expression>) -> Vec<Expression> {
    let n_definitions = body.iter().take_while(|x| x.is_definition()).count();
    if n_definitions == 0 {
        return body;
    }

    let mut body = body.into_iter();
    let bindings = body
        .by_ref()
        .take(n_definitions)
        .filter_map(|definition| match definition {
            Expression::Definition { name, expr } => Some((name, *expr)),
            _ => None,
        })
        .collect();

    vec![make_letrec(bindings, body.collect())]
}

pub fn make_and(tests: Vec<Expression>) -> Expression {
    fold_with_temporary(tests, Expression::Bool(true), "#and-tmp", |tmp, rest| {
        (rest, Expression::var(tmp))
    })
}

pub fn make_or(tests: Vec<Expression>) -> Expression {
    fold_with_temporary(tests, Expression::Bool(false), "#or-tmp", |tmp, rest| {
        (Expression::var(tmp), rest)
    })
}

/// Right fold shared by `and` and `or`. All but the last test are bound to a
/// temporary so they are evaluated once; `branches` picks consequent and
/// alternate from the temporary and the rest of the fold. The last test
/// stays in tail position.
fn fold_with_temporary(
    tests: Vec<Expression>,
    empty: Expression,
    tmp_name: &str,
    branches: impl Fn(Symbol, Expression) -> (Expression, Expression),
) -> Expression {
    let tmp = Symbol::new(tmp_name);
    let mut tests = tests.into_iter().rev();
    let mut expression = match tests.next() {
        None => return empty,
        Some(last) => last,
    };

    for test in tests {
        let (consequent, alternate) = branches(tmp, expression);
        expression = make_let(
            vec![(tmp, test)],
            vec![Expression::conditional(
                Expression::var(tmp),
                consequent,
                alternate,
            )],
        );
    }
    expression
}

/// `(delay e)` => `(make-promise (lambda () e))`
pub fn make_delay(expr: Expression) -> Expression {
    Expression::call(
        Expression::var("make-promise"),
        vec![Expression::lambda(FormalParameters::none(), vec![expr])],
    )
}

/// `(cons-stream a b)` => `(cons a (delay b))`
pub fn make_cons_stream(head: Expression, tail: Expression) -> Expression {
    Expression::call(Expression::var("cons"), vec![head, make_delay(tail)])
}

/// `case` becomes a `cond` over a temporary holding the key, each clause
/// testing `(or (eqv? tmp 'd) ...)`.
pub fn make_case(key: Expression, clauses: Vec<CaseClause>) -> Expression {
    let tmp = Symbol::new("#case-key");
    let clauses = clauses
        .into_iter()
        .map(|clause| match clause.data {
            None => CondClause::otherwise(clause.sequence),
            Some(data) => {
                let tests = data
                    .into_iter()
                    .map(|datum| {
                        Expression::call(Expression::var("eqv?"), vec![Expression::var(tmp), datum])
                    })
                    .collect();
                CondClause::new(make_or(tests), clause.sequence)
            }
        })
        .collect();
    make_let(vec![(tmp, key)], vec![make_cond(clauses)])
}

#[cfg(test)]
mod test {
    use super::*;

    fn var(name: &str) -> Expression {
        Expression::var(name)
    }

    fn int(i: i64) -> Expression {
        Expression::Number(i.into())
    }

    #[test]
    fn begin() {
        assert_eq!("((lambda () 1 2))", make_begin(vec![int(1), int(2)]).to_string());
    }

    #[test]
    fn let_is_a_lambda_call() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let expr = make_let(vec![(x, int(1)), (y, int(2))], vec![var("y"), var("x")]);
        assert_eq!("((lambda (x y) y x) 1 2)", expr.to_string());
    }

    #[test]
    fn let_star_nests() {
        let x = Symbol::new("x");
        let y = Symbol::new("y");
        let expr = make_letstar(vec![(x, int(1)), (y, var("x"))], vec![var("y")]);
        assert_eq!("((lambda (x) ((lambda (y) y) x)) 1)", expr.to_string());
        assert_eq!("((lambda () 3))", make_letstar(vec![], vec![int(3)]).to_string());
    }

    #[test]
    fn letrec_assigns_through_temporaries() {
        let x = Symbol::new("x");
        let expr = make_letrec(vec![(x, int(2))], vec![var("x")]);
        assert_eq!(
            "((lambda (x) ((lambda (#letrec-0) (set! x #letrec-0) x) 2)) #<unassigned>)",
            expr.to_string()
        );
    }

    #[test]
    fn named_let() {
        let f = Symbol::new("f");
        let n = Symbol::new("n");
        let expr = make_named_let(f, vec![(n, int(3))], vec![var("n")]);
        assert_eq!(
            "(((lambda (f) ((lambda (#letrec-0) (set! f #letrec-0) f) (lambda (n) n))) #<unassigned>) 3)",
            expr.to_string()
        );
    }

    #[test]
    fn internal_definitions() {
        let a = Symbol::new("a");
        let body = make_body(vec![Expression::definition(a, int(1)), var("a")]);
        assert_eq!(1, body.len());
        assert_eq!(
            "((lambda (a) ((lambda (#letrec-0) (set! a #letrec-0) a) 1)) #<unassigned>)",
            body[0].to_string()
        );

        let plain = make_body(vec![int(1), int(2)]);
        assert_eq!(2, plain.len());
    }

    #[test]
    fn and_or() {
        assert_eq!("#t", make_and(vec![]).to_string());
        assert_eq!("#f", make_or(vec![]).to_string());
        assert_eq!("a", make_and(vec![var("a")]).to_string());
        assert_eq!(
            "((lambda (#and-tmp) (if #and-tmp b #and-tmp)) a)",
            make_and(vec![var("a"), var("b")]).to_string()
        );
        assert_eq!(
            "((lambda (#or-tmp) (if #or-tmp #or-tmp ((lambda (#or-tmp) (if #or-tmp #or-tmp c)) b))) a)",
            make_or(vec![var("a"), var("b"), var("c")]).to_string()
        );
    }

    #[test]
    fn cond() {
        let expr = make_cond(vec![
            CondClause::new(var("a"), vec![int(1)]),
            CondClause::otherwise(vec![int(2)]),
        ]);
        assert_eq!("(if a ((lambda () 1)) ((lambda () 2)))", expr.to_string());

        let expr = make_cond(vec![CondClause::new(var("a"), vec![int(1)])]);
        assert_eq!("(if a ((lambda () 1)) #f)", expr.to_string());
    }

    #[test]
    fn cond_clause_without_sequence_yields_test() {
        let expr = make_cond(vec![CondClause::new(var("a"), vec![])]);
        assert_eq!(
            "((lambda (#cond-tmp) (if #cond-tmp #cond-tmp #f)) a)",
            expr.to_string()
        );
    }

    #[test]
    fn delay_and_streams() {
        assert_eq!("(make-promise (lambda () x))", make_delay(var("x")).to_string());
        assert_eq!(
            "(cons 1 (make-promise (lambda () 2)))",
            make_cons_stream(int(1), int(2)).to_string()
        );
    }

    #[test]
    fn case() {
        let expr = make_case(
            var("k"),
            vec![
                CaseClause {
                    data: Some(vec![Expression::Symbol(Symbol::new("a"))]),
                    sequence: vec![int(1)],
                },
                CaseClause {
                    data: None,
                    sequence: vec![int(2)],
                },
            ],
        );
        assert_eq!(
            "((lambda (#case-key) (if (eqv? #case-key 'a) ((lambda () 1)) ((lambda () 2)))) k)",
            expr.to_string()
        );
    }
}
