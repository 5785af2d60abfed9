//! Cairn: a small expression-oriented Lisp.
//!
//! This module provides the embedding API for the cairn interpreter.
//!
//! # Quick Start
//!
//! ```no_run
//! use cairn::InterpreterBuilder;
//!
//! let mut interp = InterpreterBuilder::new().build().unwrap();
//! let result = interp.eval_str("(+ 1 2)").unwrap();
//! assert_eq!(interp.render(result), "3 ");
//! ```

use std::io::Write;

mod line_editor;

pub use cairn_core::{
    CairnError, Machine, NativeFnInner, ObjRef, Object, Rendered, DEFAULT_MAX_EVAL_DEPTH,
};
pub use cairn_reader::{read_expression, CharSource, StrSource, StreamSource, Token};
pub use line_editor::{default_history_path, LineEditorSource};

pub type Result<T> = std::result::Result<T, CairnError>;

/// Result of evaluating a cairn expression.
pub type EvalResult = Result<ObjRef>;

/// Builder for configuring and constructing an [`Interpreter`].
///
/// By default the builtin functions are enabled.
#[derive(Debug, Clone)]
pub struct InterpreterBuilder {
    stdlib: bool,
    max_eval_depth: usize,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self {
            stdlib: true,
            max_eval_depth: DEFAULT_MAX_EVAL_DEPTH,
        }
    }

    /// Enable or disable the builtin functions (default: `true`).
    ///
    /// `quote`, `define`, `lambda` and `eval` are always available.
    pub fn with_stdlib(mut self, enable: bool) -> Self {
        self.stdlib = enable;
        self
    }

    pub fn without_stdlib(self) -> Self {
        self.with_stdlib(false)
    }

    /// Maximum nesting of evaluation before a
    /// [`CairnError::RecursionLimit`] fault.
    pub fn max_eval_depth(mut self, depth: usize) -> Self {
        self.max_eval_depth = depth;
        self
    }

    pub fn build(self) -> Result<Interpreter> {
        let machine = Machine::with_max_eval_depth(self.max_eval_depth)?;
        let inner = cairn_eval::Interpreter::from_machine(machine, self.stdlib)?;
        Ok(Interpreter { inner })
    }
}

/// A cairn interpreter instance.
///
/// Use [`InterpreterBuilder`] for fine-grained control, or call
/// [`Interpreter::new`] for a default interpreter.
#[derive(Debug)]
pub struct Interpreter {
    inner: cairn_eval::Interpreter,
}

impl Interpreter {
    pub fn new() -> Result<Self> {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Evaluate an already-parsed expression in the root environment.
    ///
    /// Definitions persist across calls.
    pub fn eval(&mut self, expr: ObjRef) -> EvalResult {
        self.inner.eval(expr)
    }

    /// Parse and evaluate a string containing zero or more expressions.
    pub fn eval_str(&mut self, input: &str) -> EvalResult {
        self.inner.eval_str(input)
    }

    pub fn eval_tokens(&mut self, tokens: &[Token]) -> EvalResult {
        self.inner.eval_tokens(tokens)
    }

    pub fn render(&self, obj: ObjRef) -> String {
        self.inner.render(obj)
    }

    pub fn display(&self, obj: ObjRef) -> Rendered<'_> {
        self.inner.machine.display(obj)
    }

    /// Bind a native function; it receives the evaluated argument list.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cairn::{CairnError, Interpreter, Machine, ObjRef};
    ///
    /// fn first(m: &mut Machine, args: ObjRef, _env: ObjRef) -> Result<ObjRef, CairnError> {
    ///     match m.heap.car(args)? {
    ///         Some(arg) => Ok(arg),
    ///         None => m.error("first: expected an argument"),
    ///     }
    /// }
    ///
    /// let mut interp = Interpreter::new().unwrap();
    /// interp.register_fn("first", first).unwrap();
    /// ```
    pub fn register_fn(&mut self, name: &'static str, f: NativeFnInner) -> Result<()> {
        self.inner.machine.register_fn(name, f)
    }

    /// Bind a native form; it receives its arguments unevaluated.
    pub fn register_form(&mut self, name: &'static str, f: NativeFnInner) -> Result<()> {
        self.inner.machine.register_form(name, f)
    }

    /// Root bindings that are not builtins, as `(name, rendered value)`,
    /// sorted by name.
    pub fn user_bindings(&self) -> Result<Vec<(String, String)>> {
        let machine = &self.inner.machine;
        let root = machine.heap.env(machine.root_env())?;
        let mut out = Vec::new();
        for &(name, value) in root.bindings() {
            if cairn_eval::is_builtin(machine.get(value)?) {
                continue;
            }
            out.push((
                machine.symbol_name(name).to_string(),
                machine.render(value),
            ));
        }
        out.sort();
        Ok(out)
    }

    pub fn machine(&self) -> &Machine {
        &self.inner.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.inner.machine
    }
}

/// The top-level loop: frame one expression at a time from `source`,
/// evaluate it and write its rendering to `out`, until the source ends.
///
/// Stops at the first fault.
pub fn run<S, W>(interp: &mut Interpreter, source: &mut S, out: &mut W) -> Result<()>
where
    S: CharSource + ?Sized,
    W: Write + ?Sized,
{
    loop {
        let tokens = read_expression(source)?;
        if tokens.is_empty() {
            return Ok(());
        }
        let result = interp.eval_tokens(&tokens)?;
        write!(out, "{}\n\n", interp.display(result))?;
    }
}
