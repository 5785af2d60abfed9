use crate::error::{reserve_one, CairnError};
use crate::symbol::Symbol;
use crate::value::{Heap, ObjRef};

/// A single binding frame.
///
/// Bindings keep insertion order and are searched linearly. The parent link
/// refers to another `Object::Environment` in the same heap.
#[derive(Debug, Clone, Default)]
pub struct Env {
    bindings: Vec<(Symbol, ObjRef)>,
    pub parent: Option<ObjRef>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: ObjRef) -> Self {
        Env {
            bindings: Vec::new(),
            parent: Some(parent),
        }
    }

    /// Look up a binding in this frame only.
    pub fn get_local(&self, name: Symbol) -> Option<ObjRef> {
        self.bindings
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// Bind `name` in this frame, overwriting an existing local binding.
    ///
    /// Never touches the parent chain: a binding of the same name in an
    /// enclosing frame is shadowed, not modified.
    pub fn set(&mut self, name: Symbol, value: ObjRef) -> Result<(), CairnError> {
        if let Some(entry) = self.bindings.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
            return Ok(());
        }
        reserve_one(&mut self.bindings, "binding table")?;
        self.bindings.push((name, value));
        Ok(())
    }

    pub fn bindings(&self) -> &[(Symbol, ObjRef)] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Heap {
    /// Resolve `name` starting at `env` and walking outward through parents.
    pub fn lookup(&self, env: ObjRef, name: Symbol) -> Result<Option<ObjRef>, CairnError> {
        let mut frame = Some(env);
        while let Some(current) = frame {
            let env = self.env(current)?;
            if let Some(value) = env.get_local(name) {
                return Ok(Some(value));
            }
            frame = env.parent;
        }
        Ok(None)
    }

    /// Bind `name` locally in `env`.
    pub fn bind(&mut self, env: ObjRef, name: Symbol, value: ObjRef) -> Result<(), CairnError> {
        self.env_mut(env)?.set(name, value)
    }
}
