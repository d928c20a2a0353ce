use std::fmt;
use std::num::NonZeroU32;

use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;

/// Identity of an interned string. Ids are small, non-zero, and stable for
/// the lifetime of the pool that issued them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstantId(NonZeroU32);

impl ConstantId {
    pub fn get(self) -> u32 {
        self.0.get()
    }

    fn from_index(index: usize) -> ConstantId {
        // index + 1 never wraps: the pool can't hold u32::MAX entries.
        ConstantId(NonZeroU32::new(index as u32 + 1).unwrap())
    }

    fn index(self) -> usize {
        self.0.get() as usize - 1
    }
}

impl fmt::Debug for ConstantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstantId({})", self.0)
    }
}

/// Deduplicating string table.
///
/// The parser interns every identifier, symbol and type-variable name it
/// touches; equal strings share one id and one owned copy. Ids index the
/// insertion order, so `resolve` is a plain array lookup and ids issued
/// before a growth stay valid after it.
#[derive(Debug, Default)]
pub struct ConstantPool {
    set: IndexSet<Box<[u8]>, FxBuildHasher>,
}

impl ConstantPool {
    pub fn new() -> Self {
        ConstantPool::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ConstantPool {
            set: IndexSet::with_capacity_and_hasher(capacity, FxBuildHasher),
        }
    }

    /// Id of `bytes` if it has been interned, without interning it.
    pub fn find(&self, bytes: &[u8]) -> Option<ConstantId> {
        self.set.get_index_of(bytes).map(ConstantId::from_index)
    }

    /// Intern a copy of `bytes`. Returns the existing id when the string is
    /// already present.
    pub fn intern(&mut self, bytes: &[u8]) -> ConstantId {
        if let Some(index) = self.set.get_index_of(bytes) {
            return ConstantId::from_index(index);
        }
        let (index, _) = self.set.insert_full(bytes.to_vec().into_boxed_slice());
        ConstantId::from_index(index)
    }

    /// Intern an owned string without copying it, unless an equal string is
    /// already present (in which case the argument is dropped).
    pub fn intern_owned(&mut self, bytes: Vec<u8>) -> ConstantId {
        if let Some(index) = self.set.get_index_of(bytes.as_slice()) {
            return ConstantId::from_index(index);
        }
        let (index, _) = self.set.insert_full(bytes.into_boxed_slice());
        ConstantId::from_index(index)
    }

    /// The bytes an id was issued for.
    ///
    /// # Panics
    ///
    /// Panics when `id` was not issued by this pool. Mixing ids across pools
    /// is a programming error.
    pub fn resolve(&self, id: ConstantId) -> &[u8] {
        self.set
            .get_index(id.index())
            .expect("ConstantId issued by a different pool")
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_and_deduplicated() {
        let mut pool = ConstantPool::new();
        let a = pool.intern(b"Array");
        let b = pool.intern(b"String");
        assert_ne!(a, b);
        assert_eq!(pool.intern(b"Array"), a);
        assert_eq!(pool.find(b"Array"), Some(a));
        assert_eq!(pool.find(b"Integer"), None);
        assert_eq!(pool.resolve(a), b"Array");
        assert_eq!(pool.resolve(b), b"String");
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn ids_survive_growth() {
        let mut pool = ConstantPool::with_capacity(2);
        let ids: Vec<_> = (0..100)
            .map(|i| pool.intern(format!("name_{i}").as_bytes()))
            .collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(pool.resolve(*id), format!("name_{i}").as_bytes());
            assert_eq!(pool.find(format!("name_{i}").as_bytes()), Some(*id));
        }
    }

    #[test]
    fn owned_insert_reuses_existing() {
        let mut pool = ConstantPool::new();
        let a = pool.intern(b"foo");
        let b = pool.intern_owned(b"foo".to_vec());
        assert_eq!(a, b);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn id_range_invariant() {
        let mut pool = ConstantPool::new();
        for i in 0..10 {
            let id = pool.intern(format!("c{i}").as_bytes());
            assert!(1 <= id.get() && id.get() as usize <= pool.len());
        }
    }
}
