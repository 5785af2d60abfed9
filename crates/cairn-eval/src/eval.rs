use cairn_core::error::reserve_one;
use cairn_core::{Closure, EvalResult, Machine, NativeFn, ObjRef, Object};

/// What the head of a call evaluated to.
enum Callee {
    Form(NativeFn),
    Function(NativeFn),
    Closure(Closure),
    NotCallable(&'static str),
}

impl Callee {
    fn of(obj: &Object) -> Callee {
        match obj {
            Object::BuiltinForm(native) => Callee::Form(*native),
            Object::BuiltinFunction(native) => Callee::Function(*native),
            Object::Closure(closure) => Callee::Closure(*closure),
            other => Callee::NotCallable(other.type_name()),
        }
    }
}

/// Evaluate `expr` with `env` as the active environment.
///
/// Evaluation failures come back as `Error` values; an `Err` is a fault
/// such as exceeding the nesting limit.
pub fn eval(m: &mut Machine, expr: ObjRef, env: ObjRef) -> EvalResult {
    m.enter_eval()?;
    let result = eval_step(m, expr, env);
    m.leave_eval();
    result
}

fn eval_step(m: &mut Machine, expr: ObjRef, env: ObjRef) -> EvalResult {
    match m.get(expr)? {
        Object::Symbol(sym) => {
            let sym = *sym;
            match m.lookup(env, sym)? {
                Some(value) => Ok(value),
                None => {
                    let name = m.symbol_name(sym).to_string();
                    m.error(format!("failed to find {name} in environment"))
                }
            }
        }
        Object::Pair { car, cdr } => {
            let (car, cdr) = (*car, *cdr);
            match car {
                Some(head) => eval_call(m, head, cdr, env),
                None => m.error("cannot call an empty list"),
            }
        }
        // Everything else, closures included, evaluates to itself.
        _ => Ok(expr),
    }
}

fn eval_call(m: &mut Machine, head: ObjRef, rest: Option<ObjRef>, env: ObjRef) -> EvalResult {
    let callee = eval(m, head, env)?;
    let args = match rest {
        Some(args) => args,
        None => m.nil()?,
    };
    match Callee::of(m.get(callee)?) {
        Callee::Form(native) => (native.func)(m, args, env),
        Callee::Function(native) => {
            let args = eval_args(m, args, env)?;
            (native.func)(m, args, env)
        }
        Callee::Closure(closure) => {
            let args = eval_args(m, args, env)?;
            apply_closure(m, closure, args)
        }
        Callee::NotCallable(type_name) => m.error(format!("{type_name} is not executable")),
    }
}

/// Evaluate each element of `args` in order into a fresh list.
pub fn eval_args(m: &mut Machine, args: ObjRef, env: ObjRef) -> EvalResult {
    let mut values = Vec::new();
    let mut cursor = Some(args);
    while let Some(cell) = cursor {
        let Some((item, rest)) = m.heap.uncons(cell)? else {
            break;
        };
        let value = eval(m, item, env)?;
        reserve_one(&mut values, "argument list")?;
        values.push(value);
        cursor = rest;
    }
    m.list(&values)
}

/// Call `closure` with an already-evaluated argument list.
///
/// Parameters bind pairwise in a new frame over the captured environment;
/// surplus parameters stay unbound and surplus arguments are dropped.
pub fn apply_closure(m: &mut Machine, closure: Closure, args: ObjRef) -> EvalResult {
    let frame = m.new_env(closure.env)?;
    let mut params = Some(closure.params);
    let mut values = Some(args);
    while let (Some(p), Some(v)) = (params, values) {
        let (Some((param, next_param)), Some((value, next_value))) =
            (m.heap.uncons(p)?, m.heap.uncons(v)?)
        else {
            break;
        };
        if let Some(sym) = m.get(param)?.as_symbol() {
            m.bind(frame, sym, value)?;
        }
        params = next_param;
        values = next_value;
    }
    tracing::trace!(
        bound = m.heap.env(frame)?.len(),
        depth = m.eval_depth(),
        "apply closure"
    );
    eval(m, closure.body, frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_reader::read_str;

    fn setup() -> Machine {
        let mut m = Machine::new().unwrap();
        crate::special_forms::register(&mut m).unwrap();
        cairn_stdlib::register_stdlib(&mut m).unwrap();
        m
    }

    fn run(m: &mut Machine, input: &str) -> ObjRef {
        let root = m.root_env();
        let mut result = m.nil().unwrap();
        for expr in read_str(m, input).unwrap() {
            result = eval(m, expr, root).unwrap();
        }
        result
    }

    fn render(input: &str) -> String {
        let mut m = setup();
        let r = run(&mut m, input);
        m.render(r)
    }

    #[test]
    fn test_self_evaluating() {
        assert_eq!(render("42"), "42 ");
        assert_eq!(render("2.5"), "2.500000 ");
        assert_eq!(render("\"hi\""), "\"hi\" ");
    }

    #[test]
    fn test_builtin_objects_evaluate_to_themselves() {
        let mut m = setup();
        let car = run(&mut m, "car");
        let root = m.root_env();
        assert_eq!(eval(&mut m, car, root).unwrap(), car);
        assert_eq!(eval(&mut m, root, root).unwrap(), root);
    }

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(render("(define x 5) x"), "5 ");
    }

    #[test]
    fn test_unbound_symbol_is_error_value() {
        let mut m = setup();
        let r = run(&mut m, "nope");
        assert!(m.get(r).unwrap().is_error());
    }

    #[test]
    fn test_call_on_nil_is_error() {
        let mut m = setup();
        let r = run(&mut m, "()");
        assert!(m.get(r).unwrap().is_error());
    }

    #[test]
    fn test_non_callable_head() {
        for input in ["(1 2)", "(\"f\" 1)", "((quote x) 1)", "((quote (1)) 2)"] {
            let mut m = setup();
            let r = run(&mut m, input);
            assert!(m.get(r).unwrap().is_error(), "{input}");
        }
    }

    #[test]
    fn test_function_args_are_evaluated() {
        assert_eq!(render("(+ (* 2 3) (- 10 4))"), "12 ");
    }

    #[test]
    fn test_form_args_are_not_evaluated() {
        assert_eq!(render("(quote (+ 1 2))"), "(<+> 1 2 ) ");
    }

    #[test]
    fn test_eval_args_preserves_order() {
        let mut m = setup();
        let args = read_str(&mut m, "((+ 1 1) 3 (quote a))").unwrap()[0];
        let root = m.root_env();
        let values = eval_args(&mut m, args, root).unwrap();
        assert_eq!(m.render(values), "(2 3 <a> ) ");
    }

    #[test]
    fn test_eval_args_of_nil_is_nil() {
        let mut m = setup();
        let nil = m.nil().unwrap();
        let root = m.root_env();
        let values = eval_args(&mut m, nil, root).unwrap();
        assert!(m.get(values).unwrap().is_nil());
    }

    #[test]
    fn test_closure_call() {
        assert_eq!(render("((lambda (x y) (+ x y)) 3 4)"), "7 ");
    }

    #[test]
    fn test_closure_params_advance_independently() {
        assert_eq!(render("((lambda (a b c) (list a b c)) 1 2 3)"), "(1 2 3 ) ");
    }

    #[test]
    fn test_closure_arity_is_lenient() {
        assert_eq!(render("((lambda (a) a) 1 2 3)"), "1 ");
        let mut m = setup();
        let r = run(&mut m, "((lambda (a b) b) 1)");
        assert!(m.get(r).unwrap().is_error());
    }

    #[test]
    fn test_closure_is_lexically_scoped() {
        let input = "
            (define make-adder (lambda (n) (lambda (x) (+ x n))))
            (define add5 (make-adder 5))
            (define n 100)
            (add5 1)";
        assert_eq!(render(input), "6 ");
    }

    #[test]
    fn test_closure_frame_does_not_leak() {
        let mut m = setup();
        run(&mut m, "((lambda (secret) secret) 1)");
        let r = run(&mut m, "secret");
        assert!(m.get(r).unwrap().is_error());
    }

    #[test]
    fn test_apply_closure_directly() {
        let mut m = setup();
        let f = run(&mut m, "(lambda (x) (* x x))");
        let closure = match m.get(f).unwrap() {
            Object::Closure(c) => *c,
            other => panic!("expected closure, got {other:?}"),
        };
        let nine = m.int(9).unwrap();
        let args = m.list(&[nine]).unwrap();
        let r = apply_closure(&mut m, closure, args).unwrap();
        assert_eq!(m.render(r), "81 ");
    }

    #[test]
    fn test_depth_restored_after_evaluation() {
        let mut m = setup();
        run(&mut m, "(+ 1 (* 2 (- 3 (car (quote (4))))))");
        assert_eq!(m.eval_depth(), 0);
    }

    #[test]
    fn test_recursion_limit_is_fault() {
        let mut m = Machine::with_max_eval_depth(64).unwrap();
        crate::special_forms::register(&mut m).unwrap();
        cairn_stdlib::register_stdlib(&mut m).unwrap();
        let root = m.root_env();
        let exprs = read_str(&mut m, "(define f (lambda (x) (f x))) (f 1)").unwrap();
        eval(&mut m, exprs[0], root).unwrap();
        assert!(matches!(
            eval(&mut m, exprs[1], root),
            Err(cairn_core::CairnError::RecursionLimit { .. })
        ));
        assert_eq!(m.eval_depth(), 0);
    }
}
