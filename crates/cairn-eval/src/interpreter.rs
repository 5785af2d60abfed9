use cairn_core::{CairnError, EvalResult, Machine, ObjRef};
use cairn_reader::{read, read_str, Token};

use crate::{eval, special_forms};

/// A machine with the evaluator builtins bound in its root environment.
///
/// Top-level expressions evaluate with the root environment active, so
/// definitions persist across calls.
#[derive(Debug)]
pub struct Interpreter {
    pub machine: Machine,
}

impl Interpreter {
    /// Wrap `machine`, binding the builtin forms and, if `stdlib` is set,
    /// the builtin functions.
    pub fn from_machine(mut machine: Machine, stdlib: bool) -> Result<Self, CairnError> {
        special_forms::register(&mut machine)?;
        if stdlib {
            cairn_stdlib::register_stdlib(&mut machine)?;
        }
        Ok(Interpreter { machine })
    }

    pub fn new() -> Result<Self, CairnError> {
        Self::from_machine(Machine::new()?, true)
    }

    pub fn eval(&mut self, expr: ObjRef) -> EvalResult {
        let root = self.machine.root_env();
        let result = eval::eval(&mut self.machine, expr, root);
        if result.is_err() {
            self.machine.reset_eval_depth();
        }
        result
    }

    /// Parse and evaluate one expression's tokens.
    pub fn eval_tokens(&mut self, tokens: &[Token]) -> EvalResult {
        let expr = read(&mut self.machine, tokens)?;
        self.eval(expr)
    }

    /// Parse and evaluate every expression in `input`, returning the last
    /// result, or nil if there was none.
    pub fn eval_str(&mut self, input: &str) -> EvalResult {
        let exprs = read_str(&mut self.machine, input)?;
        let mut result = None;
        for expr in exprs {
            result = Some(self.eval(expr)?);
        }
        match result {
            Some(r) => Ok(r),
            None => self.machine.nil(),
        }
    }

    pub fn render(&self, obj: ObjRef) -> String {
        self.machine.render(obj)
    }
}
