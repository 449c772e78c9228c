use std::marker::PhantomData;

use crate::{AgentId, IVec2, Interner, Symbol};

/// Typed handle to a named blackboard slot.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    id: Symbol,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(id: Symbol) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    pub fn symbol(self) -> Symbol {
        self.id
    }
}

/// Sparse storage for one value type, indexed by interned name.
#[derive(Debug, Clone)]
pub struct BbPool<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for BbPool<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T: Copy> BbPool<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn get(&self, id: Symbol) -> Option<T> {
        self.slots.get(id.index()).copied().flatten()
    }

    pub fn set(&mut self, id: Symbol, value: T) {
        let idx = id.index();
        if idx >= self.slots.len() {
            self.slots.resize(idx + 1, None);
        }
        self.slots[idx] = Some(value);
    }

    pub fn unset(&mut self, id: Symbol) -> Option<T> {
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    /// Number of slots currently holding a value.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self) {
        self.slots.clear();
    }
}

/// Value types a [`Blackboard`] can hold.
///
/// The set is closed: floats, integers, agent references and grid vectors. Each type lives in its
/// own pool, so the same name can hold one value of every type independently.
pub trait BbValue<A>: Copy + 'static {
    fn pool(blackboard: &Blackboard<A>) -> &BbPool<Self>;
    fn pool_mut(blackboard: &mut Blackboard<A>) -> &mut BbPool<Self>;
}

macro_rules! impl_bb_value {
    ($ty:ty, $field:ident) => {
        impl<A: AgentId> BbValue<A> for $ty {
            fn pool(blackboard: &Blackboard<A>) -> &BbPool<Self> {
                &blackboard.$field
            }

            fn pool_mut(blackboard: &mut Blackboard<A>) -> &mut BbPool<Self> {
                &mut blackboard.$field
            }
        }
    };
}

impl_bb_value!(f32, floats);
impl_bb_value!(i32, ints);
impl_bb_value!(IVec2, vectors);

impl<A: AgentId> BbValue<A> for A {
    fn pool(blackboard: &Blackboard<A>) -> &BbPool<Self> {
        &blackboard.agents
    }

    fn pool_mut(blackboard: &mut Blackboard<A>) -> &mut BbPool<Self> {
        &mut blackboard.agents
    }
}

/// Per-agent typed key/value store used to pass data between tree nodes across turns.
///
/// Reading a key that was never set (or was unset) yields `None`; there is no default value.
#[derive(Debug, Clone)]
pub struct Blackboard<A> {
    floats: BbPool<f32>,
    ints: BbPool<i32>,
    agents: BbPool<A>,
    vectors: BbPool<IVec2>,
}

impl<A> Default for Blackboard<A> {
    fn default() -> Self {
        Self {
            floats: BbPool::default(),
            ints: BbPool::default(),
            agents: BbPool::default(),
            vectors: BbPool::default(),
        }
    }
}

impl<A: AgentId> Blackboard<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-size every pool for the names interned so far.
    pub fn for_interner(names: &Interner) -> Self {
        let capacity = names.len();
        Self {
            floats: BbPool::with_capacity(capacity),
            ints: BbPool::with_capacity(capacity),
            agents: BbPool::with_capacity(capacity),
            vectors: BbPool::with_capacity(capacity),
        }
    }

    pub fn get<T: BbValue<A>>(&self, key: BbKey<T>) -> Option<T> {
        T::pool(self).get(key.symbol())
    }

    pub fn set<T: BbValue<A>>(&mut self, key: BbKey<T>, value: T) {
        T::pool_mut(self).set(key.symbol(), value);
    }

    pub fn unset<T: BbValue<A>>(&mut self, key: BbKey<T>) -> Option<T> {
        T::pool_mut(self).unset(key.symbol())
    }

    pub fn contains<T: BbValue<A>>(&self, key: BbKey<T>) -> bool {
        self.get(key).is_some()
    }

    pub fn clear(&mut self) {
        self.floats.clear();
        self.ints.clear();
        self.agents.clear();
        self.vectors.clear();
    }
}
