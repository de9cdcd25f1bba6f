use super::run;

#[test]
fn arithmetic_folds_left_to_right() {
    assert_eq!("22.0", run("(+ 1 2 (- 3) (* 4 5) (/ 6 3 1))"));
    assert_eq!("-4", run("(- 10 9 5)"));
    assert_eq!("0.5", run("(/ 2)"));
    assert_eq!("1", run("(remainder 7 2)"));
    assert_eq!("-1", run("(remainder -7 2)"));
    assert_eq!("3", run("(quotient 7 2)"));
    assert_eq!("5", run("(abs -5)"));
    assert_eq!("2.0", run("(max 1 2.0)"));
    assert_eq!("1", run("(min 3 1 2)"));
}

#[test]
fn factorial() {
    assert_eq!(
        "720",
        run("(define (fact n) (if (> n 0) (* n (fact (- n 1))) 1)) (fact 6)")
    );
}

#[test]
fn numeric_predicates() {
    assert_eq!("#t", run("(number? 1.5)"));
    assert_eq!("#f", run("(number? 'a)"));
    assert_eq!("#t", run("(integer? 2.0)"));
    assert_eq!("#f", run("(integer? 2.5)"));
    assert_eq!("#t", run("(zero? 0.0)"));
    assert_eq!("#t", run("(positive? 3)"));
    assert_eq!("#t", run("(negative? -0.5)"));
    assert_eq!("#t", run("(<= 1 1 2)"));
    assert_eq!("#f", run("(> 3 2 2)"));
}

#[test]
fn append_preserves_improper_tail() {
    assert_eq!(
        "( 1 . ( 2 . ( 3 . ( 4 . ( 5 . ( 6 . 7 ) ) ) ) ) )",
        run("(append (list 1 2 3) (list 4 5) (cons 6 7))")
    );
    assert_eq!("( 1 2 3 )", run("(append '(1) '() '(2 3))"));
}

#[test]
fn pairs_and_lists() {
    assert_eq!("( 1 . 2 )", run("(cons 1 2)"));
    assert_eq!("( 9 2 )", run("(define p (list 1 2)) (set-car! p 9) p"));
    assert_eq!("( 1 . 3 )", run("(define p (list 1 2)) (set-cdr! p 3) p"));
    assert_eq!("3", run("(caddr '(1 2 3))"));
    assert_eq!("3", run("(length '(a b c))"));
    assert_eq!("#t", run("(list? '(1 2))"));
    assert_eq!("#f", run("(list? '(1 . 2))"));
    assert_eq!("#t", run("(null? '())"));
    assert_eq!("#f", run("(pair? '())"));
}

#[test]
fn long_lists_are_freed() {
    assert_eq!(
        "1000000",
        run("(define (build n acc) (if (= n 0) acc (build (- n 1) (cons n acc))))
             (length (build 1000000 '()))")
    );
}

#[test]
fn circular_lists_are_not_lists() {
    assert_eq!(
        "#f",
        run("(define c (list 1 2)) (set-cdr! (cdr c) c) (list? c)")
    );
}

#[test]
fn map_and_for_each() {
    assert_eq!("( 11 22 )", run("(map + '(1 2) '(10 20 30))"));
    assert_eq!("( 1 4 9 )", run("(map (lambda (x) (* x x)) '(1 2 3))"));
    assert_eq!(
        "6",
        run("(define sum 0)
             (for-each (lambda (x) (set! sum (+ sum x))) '(1 2 3))
             sum")
    );
    assert_eq!("map requires at least 2 arguments", run("(map car)"));
}

#[test]
fn apply_spreads_last_argument() {
    assert_eq!("10", run("(apply + 1 2 '(3 4))"));
    assert_eq!("0", run("(apply + '())"));
    assert_eq!("min requires at least 1 argument", run("(apply min '())"));
    assert_eq!("apply requires at least 2 arguments", run("(apply +)"));
}

#[test]
fn eval_reads_data_as_code() {
    assert_eq!("3", run("(eval '(+ 1 2))"));
    assert_eq!("4", run("(eval '(let ((x 2)) (* x x)) (scheme-report-environment 5))"));
    assert_eq!("5", run("(eval '(define y 5)) y"));
    assert_eq!("variable car not found", run("(eval 'car (null-environment 5))"));
}

#[test]
fn type_predicates() {
    assert_eq!("#t", run("(procedure? car)"));
    assert_eq!("#t", run("(procedure? (lambda () 1))"));
    assert_eq!("#f", run("(procedure? 'car)"));
    assert_eq!("#t", run("(symbol? 'a)"));
    assert_eq!("#t", run("(string? \"a\")"));
    assert_eq!("#t", run("(char? #\\a)"));
    assert_eq!("#t", run("(boolean? #f)"));
    assert_eq!("#t", run("(not #f)"));
    assert_eq!("#f", run("(not 0)"));
}

#[test]
fn output_is_unspecified() {
    assert_eq!("#<unspecified>", run("(newline)"));
    assert_eq!("#<unspecified>", run("(display \"\")"));
}
