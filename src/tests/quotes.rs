use super::run;

#[test]
fn quoted_atoms() {
    assert_eq!("a", run("'a"));
    assert_eq!("a", run("(quote a)"));
    assert_eq!("42", run("'42"));
    assert_eq!("#t", run("'#t"));
    assert_eq!("\"s\"", run("'\"s\""));
}

#[test]
fn quoted_lists() {
    assert_eq!("()", run("'()"));
    assert_eq!("( 1 2 3 )", run("'(1 2 3)"));
    assert_eq!("( a ( b c ) )", run("'(a (b c))"));
    assert_eq!("( quote a )", run("''a"));
}

#[test]
fn quoted_improper_lists() {
    assert_eq!("( 1 . 2 )", run("'(1 . 2)"));
    assert_eq!("( 1 . ( 2 . 3 ) )", run("'(1 2 . 3)"));
    assert_eq!("( 1 2 )", run("'(1 . (2))"));
}

#[test]
fn keywords_are_symbols_in_data() {
    assert_eq!("( define if else )", run("'(define if else)"));
    assert_eq!("#t", run("(symbol? (car '(lambda)))"));
}

#[test]
fn quoted_data_is_not_evaluated() {
    assert_eq!("( + 1 2 )", run("'(+ 1 2)"));
    assert_eq!("x", run("(car '(x y))"));
}
