use super::run;

#[test]
fn application() {
    assert_eq!("3", run("((lambda (x y) (+ x y)) 1 2)"));
    assert_eq!("#<procedure>", run("(lambda (x) x)"));
    assert_eq!("#<builtin car>", run("car"));
}

#[test]
fn body_is_a_sequence() {
    assert_eq!("3", run("((lambda () 1 2 3))"));
}

#[test]
fn closures_capture_their_environment() {
    assert_eq!("7", run("(define (adder n) (lambda (x) (+ x n))) ((adder 3) 4)"));
    assert_eq!(
        "( 1 2 1 )",
        run("(define (make-counter)
               (let ((n 0))
                 (lambda () (set! n (+ n 1)) n)))
             (define a (make-counter))
             (define b (make-counter))
             (list (a) (a) (b))")
    );
}

#[test]
fn parameters_shadow_globals() {
    assert_eq!("( 2 1 )", run("(define x 1) (list ((lambda (x) x) 2) x)"));
}

#[test]
fn rest_parameter() {
    assert_eq!("( 1 2 3 )", run("((lambda args args) 1 2 3)"));
    assert_eq!("()", run("((lambda args args))"));
}

#[test]
fn arity_is_checked() {
    assert_eq!("procedure expects 1 argument, 0 given", run("((lambda (x) x))"));
    assert_eq!("procedure expects 2 arguments, 1 given", run("((lambda (x y) x) 1)"));
    assert_eq!("procedure expects 0 arguments, 1 given", run("((lambda () 1) 2)"));
    assert_eq!("procedure expects 2 arguments, 3 given", run("(cons 1 2 3)"));
}

#[test]
fn arguments_evaluate_left_to_right() {
    assert_eq!(
        "( 1 2 )",
        run("(define n 0)
             (define (next!) (set! n (+ n 1)) n)
             (list (next!) (next!))")
    );
}

#[test]
fn higher_order() {
    assert_eq!(
        "( 2 4 6 )",
        run("(define (compose f g) (lambda (x) (f (g x))))
             (map (compose (lambda (x) (* x 2)) car) '((1) (2) (3)))")
    );
}
