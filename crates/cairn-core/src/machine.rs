use std::fmt;

use crate::env::Env;
use crate::error::CairnError;
use crate::symbol::{Symbol, SymbolTable};
use crate::value::{Closure, Heap, NativeFn, NativeFnInner, ObjRef, Object};

/// Default nesting limit. Fits the 2 MiB stack of a spawned thread in an
/// unoptimized build; callers on larger stacks can raise it.
pub const DEFAULT_MAX_EVAL_DEPTH: usize = 256;

/// Process-wide interpreter state: the object arena, the symbol table and the
/// root environment.
///
/// The environment active during an evaluation is not stored here; callers
/// pass it explicitly.
pub struct Machine {
    pub heap: Heap,
    pub symbols: SymbolTable,
    root_env: ObjRef,
    eval_depth: usize,
    max_eval_depth: usize,
}

impl Machine {
    pub fn new() -> Result<Self, CairnError> {
        Self::with_max_eval_depth(DEFAULT_MAX_EVAL_DEPTH)
    }

    pub fn with_max_eval_depth(max_eval_depth: usize) -> Result<Self, CairnError> {
        let mut heap = Heap::new();
        let root_env = heap.alloc(Object::Environment(Env::new()))?;
        tracing::debug!(max_eval_depth, "machine created");
        Ok(Machine {
            heap,
            symbols: SymbolTable::new(),
            root_env,
            eval_depth: 0,
            max_eval_depth,
        })
    }

    pub fn root_env(&self) -> ObjRef {
        self.root_env
    }

    pub fn max_eval_depth(&self) -> usize {
        self.max_eval_depth
    }

    pub fn eval_depth(&self) -> usize {
        self.eval_depth
    }

    /// Record entry into one more level of nested evaluation.
    ///
    /// Every successful call must be paired with [`Machine::leave_eval`].
    pub fn enter_eval(&mut self) -> Result<(), CairnError> {
        if self.eval_depth >= self.max_eval_depth {
            return Err(CairnError::RecursionLimit {
                depth: self.eval_depth,
            });
        }
        self.eval_depth += 1;
        Ok(())
    }

    pub fn leave_eval(&mut self) {
        self.eval_depth = self.eval_depth.saturating_sub(1);
    }

    /// Forget any nesting left over from an aborted evaluation.
    pub fn reset_eval_depth(&mut self) {
        self.eval_depth = 0;
    }

    // --- Object construction ---

    pub fn alloc(&mut self, obj: Object) -> Result<ObjRef, CairnError> {
        self.heap.alloc(obj)
    }

    pub fn get(&self, r: ObjRef) -> Result<&Object, CairnError> {
        self.heap.get(r)
    }

    pub fn nil(&mut self) -> Result<ObjRef, CairnError> {
        self.heap.alloc(Object::nil())
    }

    pub fn int(&mut self, n: i64) -> Result<ObjRef, CairnError> {
        self.heap.alloc(Object::Integer(n))
    }

    pub fn double(&mut self, d: f64) -> Result<ObjRef, CairnError> {
        self.heap.alloc(Object::Double(d))
    }

    pub fn string(&mut self, s: impl Into<String>) -> Result<ObjRef, CairnError> {
        self.heap.alloc(Object::String(s.into()))
    }

    pub fn intern(&mut self, name: &str) -> Result<Symbol, CairnError> {
        self.symbols.intern(name)
    }

    /// A symbol object for `name`, interning it if needed.
    pub fn symbol(&mut self, name: &str) -> Result<ObjRef, CairnError> {
        let sym = self.symbols.intern(name)?;
        self.heap.alloc(Object::Symbol(sym))
    }

    pub fn symbol_name(&self, sym: Symbol) -> &str {
        self.symbols.resolve(sym)
    }

    pub fn cons(&mut self, car: ObjRef, cdr: ObjRef) -> Result<ObjRef, CairnError> {
        self.heap.alloc(Object::Pair {
            car: Some(car),
            cdr: Some(cdr),
        })
    }

    pub fn list(&mut self, items: &[ObjRef]) -> Result<ObjRef, CairnError> {
        self.heap.list(items)
    }

    pub fn closure(
        &mut self,
        params: ObjRef,
        body: ObjRef,
        env: ObjRef,
    ) -> Result<ObjRef, CairnError> {
        self.heap
            .alloc(Object::Closure(Closure { params, body, env }))
    }

    /// A fresh environment frame whose parent is `parent`.
    pub fn new_env(&mut self, parent: ObjRef) -> Result<ObjRef, CairnError> {
        self.heap.alloc(Object::Environment(Env::with_parent(parent)))
    }

    /// Produce an `Error` value, reporting `message` on the diagnostic channel.
    pub fn error(&mut self, message: impl fmt::Display) -> Result<ObjRef, CairnError> {
        tracing::warn!("{message}");
        self.heap.alloc(Object::Error)
    }

    // --- Environments ---

    pub fn lookup(&self, env: ObjRef, name: Symbol) -> Result<Option<ObjRef>, CairnError> {
        self.heap.lookup(env, name)
    }

    pub fn bind(&mut self, env: ObjRef, name: Symbol, value: ObjRef) -> Result<(), CairnError> {
        self.heap.bind(env, name, value)
    }

    /// Bind `name` in the root environment regardless of the active scope.
    pub fn define_global(&mut self, name: &str, value: ObjRef) -> Result<(), CairnError> {
        let sym = self.symbols.intern(name)?;
        self.heap.bind(self.root_env, sym, value)
    }

    pub fn register_form(&mut self, name: &'static str, f: NativeFnInner) -> Result<(), CairnError> {
        let form = self
            .heap
            .alloc(Object::BuiltinForm(NativeFn::new(name, f)))?;
        self.define_global(name, form)
    }

    pub fn register_fn(&mut self, name: &'static str, f: NativeFnInner) -> Result<(), CairnError> {
        let func = self
            .heap
            .alloc(Object::BuiltinFunction(NativeFn::new(name, f)))?;
        self.define_global(name, func)
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("objects", &self.heap.len())
            .field("symbols", &self.symbols.len())
            .field("eval_depth", &self.eval_depth)
            .finish()
    }
}
