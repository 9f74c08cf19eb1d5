//! Constant pool for compiled units.
//!
//! Holds literal values and the type/function/binding hashes referenced by
//! instructions. Identical constants are stored once.

use ember_core::TypeHash;
use rustc_hash::FxHashMap;

/// Values stored in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// `int` literal.
    Int(i32),
    /// `long` literal.
    Long(i64),
    /// `double` literal.
    Double(f64),
    /// String literal.
    StringData(String),
    /// Function, binding, or type identity.
    TypeHash(TypeHash),
}

/// Unit-level constant pool with deduplication.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    index: FxHashMap<ConstantKey, u32>,
}

/// Hashable form of [`Constant`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Int(i32),
    Long(i64),
    Double(u64), // bit pattern
    StringData(String),
    TypeHash(TypeHash),
}

impl ConstantPool {
    /// Create a new empty constant pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get existing constant, returns index.
    pub fn add(&mut self, constant: Constant) -> u32 {
        let key = Self::to_key(&constant);

        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }

        let idx = self.constants.len() as u32;
        self.constants.push(constant);
        self.index.insert(key, idx);
        idx
    }

    /// Add a type hash.
    pub fn add_type_hash(&mut self, hash: TypeHash) -> u32 {
        self.add(Constant::TypeHash(hash))
    }

    /// Get constant by index.
    pub fn get(&self, index: u32) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// Get a constant that must be a hash.
    pub fn get_hash(&self, index: u32) -> Option<TypeHash> {
        match self.get(index)? {
            Constant::TypeHash(hash) => Some(*hash),
            _ => None,
        }
    }

    /// Number of constants.
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    /// Check if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    fn to_key(constant: &Constant) -> ConstantKey {
        match constant {
            Constant::Int(v) => ConstantKey::Int(*v),
            Constant::Long(v) => ConstantKey::Long(*v),
            Constant::Double(v) => ConstantKey::Double(v.to_bits()),
            Constant::StringData(s) => ConstantKey::StringData(s.clone()),
            Constant::TypeHash(h) => ConstantKey::TypeHash(*h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplication() {
        let mut pool = ConstantPool::new();
        let a = pool.add(Constant::Int(100));
        let b = pool.add(Constant::Int(200));
        let c = pool.add(Constant::Int(100));

        assert_eq!((a, b, c), (0, 1, 0));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn int_and_long_are_distinct() {
        let mut pool = ConstantPool::new();
        let a = pool.add(Constant::Int(1));
        let b = pool.add(Constant::Long(1));
        assert_ne!(a, b);
    }

    #[test]
    fn doubles_dedupe_by_bits() {
        let mut pool = ConstantPool::new();
        assert_eq!(pool.add(Constant::Double(1.5)), pool.add(Constant::Double(1.5)));
        assert_ne!(pool.add(Constant::Double(0.0)), pool.add(Constant::Double(-0.0)));
    }

    #[test]
    fn hash_lookup() {
        let mut pool = ConstantPool::new();
        let hash = TypeHash::from_name("Logger");
        let idx = pool.add_type_hash(hash);
        let text = pool.add(Constant::StringData("hi".into()));

        assert_eq!(pool.get_hash(idx), Some(hash));
        assert_eq!(pool.get_hash(text), None);
        assert_eq!(pool.get(99), None);
    }
}
