use std::fmt;

use lasso::{Key, Rodeo, Spur};

use crate::error::CairnError;

/// An interned symbol name.
///
/// Symbols compare by identity: two symbols are equal exactly when their
/// text was equal at interning time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(Spur);

impl Symbol {
    /// The position at which this name was first interned.
    pub fn id(self) -> usize {
        self.0.into_usize()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id())
    }
}

/// Append-only table mapping symbol text to stable ids.
#[derive(Debug, Default)]
pub struct SymbolTable {
    names: Rodeo,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, name: &str) -> Result<Symbol, CairnError> {
        self.names
            .try_get_or_intern(name)
            .map(Symbol)
            .map_err(|_| CairnError::out_of_memory("symbol table"))
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.names.get(name).map(Symbol)
    }

    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.names.resolve(&symbol.0)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All interned names in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.names.iter().map(|(spur, name)| (Symbol(spur), name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_intern_same_text_same_id() {
        let mut table = SymbolTable::new();
        let a = table.intern("define").unwrap();
        let b = table.intern("define").unwrap();
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_ids_follow_first_seen_order() {
        let mut table = SymbolTable::new();
        let quote = table.intern("quote").unwrap();
        let car = table.intern("car").unwrap();
        let again = table.intern("quote").unwrap();
        assert_eq!(quote.id(), 0);
        assert_eq!(car.id(), 1);
        assert_eq!(again.id(), 0);
    }

    #[test]
    fn test_resolve_round_trips() {
        let mut table = SymbolTable::new();
        let sym = table.intern("cadr").unwrap();
        assert_eq!(table.resolve(sym), "cadr");
    }

    #[test]
    fn test_get_does_not_intern() {
        let mut table = SymbolTable::new();
        assert!(table.get("x").is_none());
        assert!(table.is_empty());
        let x = table.intern("x").unwrap();
        assert_eq!(table.get("x"), Some(x));
    }

    #[test]
    fn test_iter_in_order() {
        let mut table = SymbolTable::new();
        for name in ["+", "-", "*", "/"] {
            table.intern(name).unwrap();
        }
        let names: Vec<&str> = table.iter().map(|(_, name)| name).collect();
        assert_eq!(names, vec!["+", "-", "*", "/"]);
    }

    proptest! {
        #[test]
        fn interning_is_idempotent(names in prop::collection::vec("[a-z+*/-]{1,6}", 1..20)) {
            let mut table = SymbolTable::new();
            let first: Vec<Symbol> = names.iter().map(|n| table.intern(n).unwrap()).collect();
            let second: Vec<Symbol> = names.iter().map(|n| table.intern(n).unwrap()).collect();
            prop_assert_eq!(&first, &second);
            for (i, a) in names.iter().enumerate() {
                for (j, b) in names.iter().enumerate() {
                    prop_assert_eq!(a == b, first[i] == first[j]);
                }
            }
        }
    }
}
