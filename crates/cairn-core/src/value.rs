use std::fmt;

use crate::env::Env;
use crate::error::{reserve_one, CairnError};
use crate::machine::Machine;
use crate::symbol::Symbol;

/// Stable handle to an object living in a [`Heap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef(u32);

impl ObjRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Signature shared by builtin forms and builtin functions.
///
/// Arguments arrive as a list object; the third parameter is the environment
/// active at the call site.
pub type NativeFnInner = fn(&mut Machine, ObjRef, ObjRef) -> Result<ObjRef, CairnError>;

/// A native operation callable from cairn code.
#[derive(Clone, Copy)]
pub struct NativeFn {
    pub name: &'static str,
    pub func: NativeFnInner,
}

impl NativeFn {
    pub fn new(name: &'static str, func: NativeFnInner) -> Self {
        Self { name, func }
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native-fn {}>", self.name)
    }
}

/// A user-defined callable capturing its definition-time environment.
#[derive(Debug, Clone, Copy)]
pub struct Closure {
    /// List of parameter symbols.
    pub params: ObjRef,
    pub body: ObjRef,
    pub env: ObjRef,
}

/// Every runtime value.
#[derive(Debug, Clone)]
pub enum Object {
    Symbol(Symbol),
    String(String),
    Integer(i64),
    Double(f64),
    /// A `Pair` with both fields absent is nil, the empty list.
    Pair {
        car: Option<ObjRef>,
        cdr: Option<ObjRef>,
    },
    Environment(Env),
    Error,
    BuiltinForm(NativeFn),
    BuiltinFunction(NativeFn),
    Closure(Closure),
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Symbol(_) => "symbol",
            Object::String(_) => "string",
            Object::Integer(_) => "integer",
            Object::Double(_) => "double",
            Object::Pair { .. } if self.is_nil() => "nil",
            Object::Pair { .. } => "pair",
            Object::Environment(_) => "environment",
            Object::Error => "error",
            Object::BuiltinForm(_) => "builtin-form",
            Object::BuiltinFunction(_) => "builtin-function",
            Object::Closure(_) => "closure",
        }
    }

    pub const fn nil() -> Self {
        Object::Pair {
            car: None,
            cdr: None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(
            self,
            Object::Pair {
                car: None,
                cdr: None
            }
        )
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Object::Pair { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error)
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Object::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Object::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Object::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_env(&self) -> Option<&Env> {
        match self {
            Object::Environment(env) => Some(env),
            _ => None,
        }
    }

    /// `(car, cdr)` fields when this is a pair.
    pub fn as_pair(&self) -> Option<(Option<ObjRef>, Option<ObjRef>)> {
        match self {
            Object::Pair { car, cdr } => Some((*car, *cdr)),
            _ => None,
        }
    }
}

/// Arena holding every object created during a session.
///
/// Objects are never reclaimed; a handle stays valid for the lifetime of the
/// heap that produced it.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, obj: Object) -> Result<ObjRef, CairnError> {
        let index =
            u32::try_from(self.objects.len()).map_err(|_| CairnError::out_of_memory("heap"))?;
        reserve_one(&mut self.objects, "heap")?;
        self.objects.push(obj);
        Ok(ObjRef(index))
    }

    pub fn get(&self, r: ObjRef) -> Result<&Object, CairnError> {
        self.objects
            .get(r.index())
            .ok_or(CairnError::invalid_handle(r.0, "object"))
    }

    pub fn get_mut(&mut self, r: ObjRef) -> Result<&mut Object, CairnError> {
        self.objects
            .get_mut(r.index())
            .ok_or(CairnError::invalid_handle(r.0, "object"))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn env(&self, r: ObjRef) -> Result<&Env, CairnError> {
        self.get(r)?
            .as_env()
            .ok_or(CairnError::invalid_handle(r.0, "environment"))
    }

    pub fn env_mut(&mut self, r: ObjRef) -> Result<&mut Env, CairnError> {
        match self.get_mut(r)? {
            Object::Environment(env) => Ok(env),
            _ => Err(CairnError::invalid_handle(r.0, "environment")),
        }
    }

    pub fn is_nil(&self, r: ObjRef) -> Result<bool, CairnError> {
        Ok(self.get(r)?.is_nil())
    }

    pub fn car(&self, r: ObjRef) -> Result<Option<ObjRef>, CairnError> {
        Ok(self.get(r)?.as_pair().and_then(|(car, _)| car))
    }

    pub fn cdr(&self, r: ObjRef) -> Result<Option<ObjRef>, CairnError> {
        Ok(self.get(r)?.as_pair().and_then(|(_, cdr)| cdr))
    }

    pub fn cadr(&self, r: ObjRef) -> Result<Option<ObjRef>, CairnError> {
        match self.cdr(r)? {
            Some(rest) => self.car(rest),
            None => Ok(None),
        }
    }

    /// Split a list cell into its element and the rest of the list.
    ///
    /// Returns `None` at nil, at a non-pair tail, and at a pair whose `car`
    /// is absent; all three end a list walk.
    pub fn uncons(&self, r: ObjRef) -> Result<Option<(ObjRef, Option<ObjRef>)>, CairnError> {
        match self.get(r)?.as_pair() {
            Some((Some(car), cdr)) => Ok(Some((car, cdr))),
            _ => Ok(None),
        }
    }

    /// Collect the elements of a proper list.
    pub fn list_items(&self, list: ObjRef) -> Result<Vec<ObjRef>, CairnError> {
        let mut items = Vec::new();
        let mut cursor = Some(list);
        while let Some(cell) = cursor {
            let Some((item, rest)) = self.uncons(cell)? else {
                break;
            };
            reserve_one(&mut items, "list buffer")?;
            items.push(item);
            cursor = rest;
        }
        Ok(items)
    }

    /// Build a nil-terminated list from `items`, preserving their order.
    pub fn list(&mut self, items: &[ObjRef]) -> Result<ObjRef, CairnError> {
        let mut tail = self.alloc(Object::nil())?;
        for &item in items.iter().rev() {
            tail = self.alloc(Object::Pair {
                car: Some(item),
                cdr: Some(tail),
            })?;
        }
        Ok(tail)
    }

    /// A fresh list with the elements of `list` in reverse order.
    ///
    /// Non-pair input is returned unchanged.
    pub fn reverse_list(&mut self, list: ObjRef) -> Result<ObjRef, CairnError> {
        if !self.get(list)?.is_pair() {
            return Ok(list);
        }
        let mut out = self.alloc(Object::nil())?;
        for item in self.list_items(list)? {
            out = self.alloc(Object::Pair {
                car: Some(item),
                cdr: Some(out),
            })?;
        }
        Ok(out)
    }
}
