//! Deterministic symbol keys.
//!
//! Every bound function and every concrete type is identified by a
//! [`TypeHash`] computed from its mangled name, so the same signature always
//! lands on the same key no matter which file or instantiation produced it.

use std::fmt;

use xxhash_rust::xxh64::xxh64;

mod hash_constants {
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;
}

/// A 64-bit hash of a mangled name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash of a concrete type's full name, e.g. `List[Int]`.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a function's mangled name, e.g. `Add__(Int, Int)`.
    #[inline]
    pub fn from_function(unique_name: &str) -> Self {
        TypeHash(hash_constants::FUNCTION ^ xxh64(unique_name.as_bytes(), 0))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash(0x{:016x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}
