use std::collections::BTreeMap;

use crate::{BbKey, EventId};

/// Interned name: a small dense index into an [`Interner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Named relation between two agents (waypoint chains, "closest visible X", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationId(pub Symbol);

/// Name table shared by blackboard keys, events, relations and state machine names.
///
/// Ids are handed out densely in first-seen order and never reused, so an interner must outlive
/// every key minted from it. Hosts own the interner and pass it to whatever needs to mint or
/// resolve names; nothing in the workspace keeps a global table.
#[derive(Debug, Default, Clone)]
pub struct Interner {
    by_name: BTreeMap<Box<str>, Symbol>,
    names: Vec<Box<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(symbol) = self.by_name.get(name) {
            return *symbol;
        }

        let index = u32::try_from(self.names.len()).expect("interner exhausted u32 ids");
        let symbol = Symbol(index);
        self.names.push(name.into());
        self.by_name.insert(name.into(), symbol);
        symbol
    }

    /// Look up a name without interning it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.by_name.get(name).copied()
    }

    pub fn resolve(&self, symbol: Symbol) -> Option<&str> {
        self.names.get(symbol.index()).map(|n| &**n)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Mint a typed blackboard key. The value type is checked where the key is used.
    pub fn key<T: 'static>(&mut self, name: &str) -> BbKey<T> {
        BbKey::new(self.intern(name))
    }

    pub fn event(&mut self, name: &str) -> EventId {
        EventId(self.intern(name))
    }

    pub fn relation(&mut self, name: &str) -> RelationId {
        RelationId(self.intern(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable_and_dense() {
        let mut names = Interner::new();
        let a = names.intern("enemy");
        let b = names.intern("next_wp");
        assert_eq!(names.intern("enemy"), a);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(names.resolve(b), Some("next_wp"));
        assert_eq!(names.get("missing"), None);
        assert_eq!(names.len(), 2);
    }
}
