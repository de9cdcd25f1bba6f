use super::{run, run_in};
use crate::Interpreter;

#[test]
fn toplevel_define() {
    assert_eq!("5", run("(define x 5) x"));
    assert_eq!("#<unspecified>", run("(define x 5)"));
    assert_eq!("7", run("(define x 5) (define x 7) x"));
}

#[test]
fn procedure_define() {
    assert_eq!("3", run("(define (f a b) (+ a b)) (f 1 2)"));
    assert_eq!("( 1 2 )", run("(define (f . rest) rest) (f 1 2)"));
    assert_eq!("()", run("(define (f . rest) rest) (f)"));
}

#[test]
fn assignment() {
    assert_eq!("2", run("(define x 1) (set! x 2) x"));
    assert_eq!("#<unspecified>", run("(define x 1) (set! x 2)"));
    assert_eq!("variable y not bound", run("(set! y 1)"));
}

#[test]
fn assignment_reaches_enclosing_frame() {
    assert_eq!(
        "11",
        run("(define total 1)
             (define (add! n) (set! total (+ total n)))
             (add! 4)
             (add! 6)
             total")
    );
}

#[test]
fn internal_definitions() {
    assert_eq!(
        "3",
        run("(define (f)
               (define a 1)
               (define b 2)
               (+ a b))
             (f)")
    );
}

#[test]
fn internal_definitions_are_mutually_recursive() {
    assert_eq!(
        "#t",
        run("(define (f n)
               (define (ev? n) (if (= n 0) #t (od? (- n 1))))
               (define (od? n) (if (= n 0) #f (ev? (- n 1))))
               (ev? n))
             (f 10)")
    );
}

#[test]
fn internal_definition_reading_a_sibling_too_early() {
    assert_eq!(
        "variable a Unassigned",
        run("(define (f)
               (define a 1)
               (define b (+ a 1))
               b)
             (f)")
    );
}

#[test]
fn internal_definitions_stay_local() {
    assert_eq!(
        "variable a not found",
        run("(define (f) (define a 1) a) (f) a")
    );
}

#[test]
fn definitions_persist_between_evaluations() {
    let mut interp = Interpreter::new();
    assert_eq!("#<unspecified>", run_in(&mut interp, "(define (sq x) (* x x))"));
    assert_eq!("49", run_in(&mut interp, "(sq 7)"));
}
