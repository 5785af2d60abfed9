use std::io::Cursor;
use std::thread;

use cairn::{
    run, CairnError, Interpreter, InterpreterBuilder, Machine, ObjRef, StrSource, StreamSource,
    DEFAULT_MAX_EVAL_DEPTH,
};

fn eval_to_string(input: &str) -> String {
    let mut interp = Interpreter::new().unwrap();
    let result = interp
        .eval_str(input)
        .unwrap_or_else(|e| panic!("failed to eval `{input}`: {e}"));
    interp.render(result)
}

fn eval_is_error(input: &str) -> bool {
    let mut interp = Interpreter::new().unwrap();
    let result = interp.eval_str(input).unwrap();
    interp.machine().get(result).unwrap().is_error()
}

#[test]
fn test_numeric_fold() {
    assert_eq!(eval_to_string("(+ 1 2 3)"), "6 ");
    assert_eq!(eval_to_string("(+ 1 2.0)"), "3.000000 ");
    assert_eq!(eval_to_string("(* 2 3 4)"), "24 ");
    assert_eq!(eval_to_string("(- 5)"), "-5 ");
    assert_eq!(eval_to_string("(- 5 2)"), "3 ");
    assert_eq!(eval_to_string("(/ 4)"), "0.250000 ");
    assert_eq!(eval_to_string("(/ 8 2)"), "4 ");
}

#[test]
fn test_arithmetic_contract_violations() {
    assert!(eval_is_error("(+ 1 (quote a))"));
    assert!(eval_is_error("(+ 1 undefined-thing)"));
    assert!(eval_is_error("(/ 1 0)"));
    assert!(eval_is_error("(*)"));
}

#[test]
fn test_quote_vs_eval() {
    assert_eq!(eval_to_string("(quote (+ 1 2))"), "(<+> 1 2 ) ");
    assert_eq!(eval_to_string("(eval (quote (+ 1 2)))"), "3 ");
}

#[test]
fn test_define_is_global() {
    let mut interp = Interpreter::new().unwrap();
    interp.eval_str("(define x 5)").unwrap();

    let m = interp.machine_mut();
    let root = m.root_env();
    let nested = m.new_env(root).unwrap();
    let nested = m.new_env(nested).unwrap();
    let x = m.symbol("x").unwrap();
    let value = cairn_eval::eval(m, x, nested).unwrap();
    assert_eq!(m.get(value).unwrap().as_int(), Some(5));
}

#[test]
fn test_define_result_is_nil() {
    assert_eq!(eval_to_string("(define y 1)"), "() ");
}

#[test]
fn test_unbound_symbol() {
    assert!(eval_is_error("never-bound"));
    assert_eq!(eval_to_string("never-bound"), "*ERROR* ");
}

#[test]
fn test_list_accessors() {
    assert_eq!(eval_to_string("(car (quote (1 2 3)))"), "1 ");
    assert_eq!(eval_to_string("(cdr (quote (1 2 3)))"), "(2 3 ) ");
    assert_eq!(eval_to_string("(cadr (quote (1 2 3)))"), "2 ");
}

#[test]
fn test_list_builders() {
    assert_eq!(eval_to_string("(cons 1 (quote (2)))"), "(1 2 ) ");
    assert_eq!(eval_to_string("(cons 1 2)"), "(1 . 2 ) ");
    assert_eq!(eval_to_string("(list 1 (+ 1 1) \"three\")"), "(1 2 \"three\" ) ");
    assert_eq!(eval_to_string("(list)"), "() ");
    assert_eq!(eval_to_string("(reverse (list 1 2 3))"), "(3 2 1 ) ");
}

#[test]
fn test_closures() {
    let input = "
        (define square (lambda (x) (* x x)))
        (define compose (lambda (f g) (lambda (x) (f (g x)))))
        ((compose square (lambda (x) (+ x 1))) 4)";
    assert_eq!(eval_to_string(input), "25 ");
}

#[test]
fn test_closure_shadowing_leaves_global_alone() {
    let input = "
        (define x 1)
        ((lambda (x) (* x 10)) 7)";
    let mut interp = Interpreter::new().unwrap();
    let r = interp.eval_str(input).unwrap();
    assert_eq!(interp.render(r), "70 ");
    let x = interp.eval_str("x").unwrap();
    assert_eq!(interp.render(x), "1 ");
}

#[test]
fn test_placeholders_render() {
    assert_eq!(eval_to_string("car"), "*BUILTIN_FUNC* ");
    assert_eq!(eval_to_string("quote"), "*BUILTIN_FORM* ");
    assert_eq!(eval_to_string("(lambda (x) x)"), "*CLOSURE* ");
}

#[test]
fn test_strings_and_doubles() {
    assert_eq!(eval_to_string("\"a\\tb\""), "\"a\tb\" ");
    assert_eq!(eval_to_string("(* 1.5 2)"), "3.000000 ");
}

#[test]
fn test_recursion_limit_is_a_fault() {
    let mut interp = InterpreterBuilder::new().max_eval_depth(64).build().unwrap();
    let err = interp
        .eval_str("(define f (lambda (n) (f n))) (f 0)")
        .unwrap_err();
    assert!(matches!(err, CairnError::RecursionLimit { .. }));
    let r = interp.eval_str("(+ 2 2)").unwrap();
    assert_eq!(interp.render(r), "4 ");
}

#[test]
fn test_default_recursion_limit_fits_thread_stack() {
    let handle = thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let mut interp = Interpreter::new().unwrap();
            interp
                .eval_str("(define f (lambda (n) (f (+ n 1)))) (f 0)")
                .unwrap_err()
        })
        .unwrap();
    assert_eq!(
        handle.join().unwrap(),
        CairnError::RecursionLimit {
            depth: DEFAULT_MAX_EVAL_DEPTH
        }
    );
}

#[test]
fn test_deeply_nested_quote_reads_and_renders() {
    let depth = 100_000;
    let input = format!("(quote {}{})", "(".repeat(depth), ")".repeat(depth));
    let text = eval_to_string(&input);
    assert!(text.starts_with("(( ( "));
    assert_eq!(text.matches('(').count(), depth);
    assert_eq!(text.matches(')').count(), depth);
}

#[test]
fn test_structure_nested_by_repeated_define_renders() {
    let mut program = String::from("(define x (quote ()))");
    for _ in 0..100_000 {
        program.push_str(" (define x (list x))");
    }
    let mut interp = Interpreter::new().unwrap();
    interp.eval_str(&program).unwrap();
    let x = interp.eval_str("x").unwrap();
    let text = interp.render(x);
    assert_eq!(text.matches('(').count(), 100_001);
    assert_eq!(text.matches(')').count(), 100_001);
}

#[test]
fn test_without_stdlib() {
    let mut interp = InterpreterBuilder::new().without_stdlib().build().unwrap();
    let r = interp.eval_str("(car (quote (1)))").unwrap();
    assert!(interp.machine().get(r).unwrap().is_error());
    let q = interp.eval_str("(eval (quote (quote z)))").unwrap();
    assert_eq!(interp.render(q), "<z> ");
}

fn double(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    let n = match m.heap.car(args)? {
        Some(arg) => m.get(arg)?.as_int(),
        None => None,
    };
    match n {
        Some(n) => m.int(n * 2),
        None => m.error("double: expected an integer"),
    }
}

#[test]
fn test_register_fn() {
    let mut interp = Interpreter::new().unwrap();
    interp.register_fn("double", double).unwrap();
    let r = interp.eval_str("(double (+ 1 2))").unwrap();
    assert_eq!(interp.render(r), "6 ");
}

#[test]
fn test_user_bindings_exclude_builtins() {
    let mut interp = Interpreter::new().unwrap();
    interp.eval_str("(define b 2) (define a (quote (1)))").unwrap();
    let bindings = interp.user_bindings().unwrap();
    assert_eq!(
        bindings,
        vec![
            ("a".to_string(), "(1 ) ".to_string()),
            ("b".to_string(), "2 ".to_string()),
        ]
    );
}

#[test]
fn test_run_loop_over_stream() {
    let program = "(define sq (lambda (x) (* x x)))\n(sq\n  12)\n(car (quote (a b)))\n";
    let mut interp = Interpreter::new().unwrap();
    let mut source = StreamSource::new(Cursor::new(program));
    let mut out = Vec::new();
    run(&mut interp, &mut source, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "() \n\n144 \n\n<a> \n\n");
}

#[test]
fn test_run_loop_stops_at_fault() {
    let mut interp = Interpreter::new().unwrap();
    let mut source = StrSource::new("1 (+ 2");
    let mut out = Vec::new();
    let err = run(&mut interp, &mut source, &mut out).unwrap_err();
    assert_eq!(err, CairnError::UnexpectedEof { open: 1, close: 0 });
    assert_eq!(String::from_utf8(out).unwrap(), "1 \n\n");
}

#[test]
fn test_run_loop_reports_stray_close() {
    let mut interp = Interpreter::new().unwrap();
    let mut source = StrSource::new(")");
    let mut out = Vec::new();
    assert!(matches!(
        run(&mut interp, &mut source, &mut out),
        Err(CairnError::Reader { .. })
    ));
}

mod props {
    use super::eval_to_string;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn integer_fold_matches_native(a in -10_000i64..10_000, b in -10_000i64..10_000, c in -100i64..100) {
            prop_assert_eq!(eval_to_string(&format!("(+ {a} {b} {c})")), format!("{} ", a + b + c));
            prop_assert_eq!(eval_to_string(&format!("(* {a} {b} {c})")), format!("{} ", a * b * c));
            prop_assert_eq!(eval_to_string(&format!("(- {a} {b} {c})")), format!("{} ", a - b - c));
        }

        #[test]
        fn quoted_integer_lists_survive_reverse_twice(items in prop::collection::vec(-99i64..99, 1..12)) {
            let text: Vec<String> = items.iter().map(i64::to_string).collect();
            let input = format!("(reverse (reverse (quote ({}))))", text.join(" "));
            prop_assert_eq!(eval_to_string(&input), format!("({} ) ", text.join(" ")));
        }
    }
}
