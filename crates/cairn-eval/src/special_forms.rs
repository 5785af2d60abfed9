use cairn_core::{CairnError, EvalResult, Machine, ObjRef, Object};

use crate::eval;

/// Names bound to builtin forms, which receive their arguments unevaluated.
pub const SPECIAL_FORM_NAMES: &[&str] = &["quote", "define", "lambda"];

/// Split a list of exactly `N` elements.
fn exact_args<const N: usize>(m: &Machine, args: ObjRef) -> Result<Option<[ObjRef; N]>, CairnError> {
    let mut out = [args; N];
    let mut cursor = Some(args);
    for slot in out.iter_mut() {
        let Some((item, rest)) = cursor.map(|c| m.heap.uncons(c)).transpose()?.flatten() else {
            return Ok(None);
        };
        *slot = item;
        cursor = rest;
    }
    match cursor {
        Some(tail) if !m.heap.is_nil(tail)? => Ok(None),
        _ => Ok(Some(out)),
    }
}

fn eval_quote(m: &mut Machine, args: ObjRef, _env: ObjRef) -> EvalResult {
    match m.heap.car(args)? {
        Some(datum) => Ok(datum),
        None => m.error("quote: expected an argument"),
    }
}

/// `(define name expr)`: evaluate `expr` in the active environment and bind
/// the result in the root environment.
fn eval_define(m: &mut Machine, args: ObjRef, env: ObjRef) -> EvalResult {
    let Some([key, value_expr]) = exact_args::<2>(m, args)? else {
        return m.error("define: expected (define symbol expr)");
    };
    let Some(name) = m.get(key)?.as_symbol() else {
        let type_name = m.get(key)?.type_name();
        return m.error(format!("define: key must be a symbol, got {type_name}"));
    };
    let value = eval::eval(m, value_expr, env)?;
    let root = m.root_env();
    m.bind(root, name, value)?;
    tracing::debug!(name = m.symbol_name(name), "define");
    m.nil()
}

/// Ok(false) if `params` is not a proper list of symbols.
fn valid_params(m: &Machine, params: ObjRef) -> Result<bool, CairnError> {
    let mut cursor = params;
    loop {
        match m.get(cursor)?.as_pair() {
            Some((None, None)) => return Ok(true),
            Some((Some(param), Some(rest))) => {
                if m.get(param)?.as_symbol().is_none() {
                    return Ok(false);
                }
                cursor = rest;
            }
            _ => return Ok(false),
        }
    }
}

/// `(lambda (params...) body)`: a closure over the active environment.
fn eval_lambda(m: &mut Machine, args: ObjRef, env: ObjRef) -> EvalResult {
    let Some([params, body]) = exact_args::<2>(m, args)? else {
        return m.error("lambda: expected (lambda (params...) body)");
    };
    if !valid_params(m, params)? {
        return m.error("lambda: parameters must be a list of symbols");
    }
    m.closure(params, body, env)
}

/// `(eval x)`: evaluate an already-evaluated value once more.
fn eval_eval(m: &mut Machine, args: ObjRef, env: ObjRef) -> EvalResult {
    match m.heap.car(args)? {
        Some(expr) => eval::eval(m, expr, env),
        None => m.error("eval: expected an argument"),
    }
}

/// Bind the evaluator-level builtins: the forms and the `eval` function.
pub fn register(m: &mut Machine) -> Result<(), CairnError> {
    m.register_form("quote", eval_quote)?;
    m.register_form("define", eval_define)?;
    m.register_form("lambda", eval_lambda)?;
    m.register_fn("eval", eval_eval)?;
    Ok(())
}

/// True if `obj` is one of the builtin callables.
pub fn is_builtin(obj: &Object) -> bool {
    matches!(obj, Object::BuiltinForm(_) | Object::BuiltinFunction(_))
}
