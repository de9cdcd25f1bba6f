use super::{run, run_in};
use crate::Interpreter;

const COUNT: &str = "
    (define (count n i)
      (cond ((<= n 0) i)
            (else (count (- n 1) (+ i 1)))))";

const COUNT_NON_TAIL: &str = "
    (define (count n)
      (if (<= n 0)
          0
          (+ 1 (count (- n 1)))))";

#[test]
fn tail_recursion_ignores_depth_limit() {
    let mut interp = Interpreter::new().with_max_depth(10);
    run_in(&mut interp, COUNT);
    assert_eq!("100", run_in(&mut interp, "(count 100 0)"));
}

#[test]
fn non_tail_recursion_hits_depth_limit() {
    let mut interp = Interpreter::new().with_max_depth(10);
    run_in(&mut interp, COUNT_NON_TAIL);
    assert_eq!(
        "maximum recursion depth (10) exceeded",
        run_in(&mut interp, "(count 100)")
    );
    assert_eq!("5", run_in(&mut interp, "(count 5)"));
}

#[test]
fn non_tail_recursion_within_limit() {
    assert_eq!("50", run(&format!("{} (count 50)", COUNT_NON_TAIL)));
}

#[test]
fn default_limit_fits_an_ordinary_stack() {
    let evaluator = std::thread::Builder::new()
        .stack_size(8 * 1024 * 1024)
        .spawn(|| {
            let mut interp = Interpreter::new();
            let limit = interp.max_depth();
            run_in(&mut interp, COUNT_NON_TAIL);
            (
                limit,
                run_in(&mut interp, &format!("(count {})", limit - 1)),
                run_in(&mut interp, &format!("(count {})", limit + 100)),
            )
        })
        .unwrap();
    let (limit, within, beyond) = evaluator.join().unwrap();
    assert_eq!((limit - 1).to_string(), within);
    assert_eq!(format!("maximum recursion depth ({}) exceeded", limit), beyond);
}

#[test]
fn long_loops_run_in_constant_depth() {
    let mut interp = Interpreter::new().with_max_depth(10);
    run_in(&mut interp, COUNT);
    assert_eq!("20000", run_in(&mut interp, "(count 20000 0)"));
}

#[test]
fn tail_position_inside_derived_forms() {
    let mut interp = Interpreter::new().with_max_depth(10);
    assert_eq!(
        "done",
        run_in(
            &mut interp,
            "(define (f n) (and #t (if (= n 0) 'done (f (- n 1)))))
             (f 1000)"
        )
    );
    assert_eq!(
        "done",
        run_in(
            &mut interp,
            "(define (g n) (let ((m (- n 1))) (or (and (< m 0) 'done) (g m))))
             (g 1000)"
        )
    );
    assert_eq!(
        "1000",
        run_in(
            &mut interp,
            "(let loop ((i 0)) (case i ((1000) i) (else (loop (+ i 1)))))"
        )
    );
}

#[test]
fn mutual_tail_recursion() {
    let mut interp = Interpreter::new().with_max_depth(10);
    assert_eq!(
        "#f",
        run_in(
            &mut interp,
            "(define (ev? n) (if (= n 0) #t (od? (- n 1))))
             (define (od? n) (if (= n 0) #f (ev? (- n 1))))
             (ev? 1001)"
        )
    );
}
