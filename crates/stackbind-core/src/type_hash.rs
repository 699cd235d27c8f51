//! Deterministic identities for bound classes and callables.
//!
//! A [`TypeHash`] is a 64-bit XXHash64 digest of a qualified name, mixed with
//! a domain constant so that a class `Point` and a function `Point` never
//! collide. Identities are stable across runs and do not depend on
//! registration order, which makes them suitable as keys in logs and
//! benchmarks.
//!
//! ```
//! use stackbind_core::TypeHash;
//!
//! let a = TypeHash::from_qualified(Some("geo"), "Point");
//! let b = TypeHash::from_qualified(Some("geo"), "Point");
//! assert_eq!(a, b);
//! assert_ne!(a, TypeHash::from_name("Point"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for path components
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for class hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for free function hashes
    pub const FUNCTION: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for instance method hashes
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for class-scoped (static) function hashes
    pub const STATIC: u64 = 0x3e9f5d2a8c7b1403;

    /// Domain marker for constructor hashes
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for the finalizer hook
    pub const FINALIZER: u64 = 0x1a095090689d4647;
}

/// A deterministic 64-bit hash identifying a class or a bound callable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a class hash from an already qualified name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Create a class hash from an optional namespace and a local name.
    ///
    /// `from_qualified(None, n)` equals `from_name(n)`.
    #[inline]
    pub fn from_qualified(namespace: Option<&str>, name: &str) -> Self {
        match namespace {
            Some(ns) => TypeHash(
                hash_constants::TYPE
                    ^ xxh64(ns.as_bytes(), 0)
                        .wrapping_mul(hash_constants::SEP)
                        .wrapping_add(xxh64(name.as_bytes(), 0)),
            ),
            None => Self::from_name(name),
        }
    }

    /// Create a free function hash from its qualified name.
    #[inline]
    pub fn from_function(name: &str) -> Self {
        TypeHash(hash_constants::FUNCTION ^ xxh64(name.as_bytes(), 0))
    }

    /// Create an instance method hash. Methods are distinguished from free
    /// functions by incorporating the owner class.
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str) -> Self {
        Self::member(hash_constants::METHOD, owner, name)
    }

    /// Create a class-scoped function hash.
    #[inline]
    pub fn from_static(owner: TypeHash, name: &str) -> Self {
        Self::member(hash_constants::STATIC, owner, name)
    }

    /// Create a constructor hash. Constructors are named, so a class may
    /// carry several.
    #[inline]
    pub fn from_constructor(owner: TypeHash, name: &str) -> Self {
        Self::member(hash_constants::CONSTRUCTOR, owner, name)
    }

    /// Hash of the finalizer hook attached to a class.
    #[inline]
    pub fn finalizer_of(owner: TypeHash) -> Self {
        TypeHash(hash_constants::FINALIZER ^ owner.0.wrapping_mul(hash_constants::SEP))
    }

    fn member(domain: u64, owner: TypeHash, name: &str) -> Self {
        // wrapping_mul keeps (owner, name) from commuting with (name, owner)
        TypeHash(
            domain
                ^ owner
                    .0
                    .wrapping_mul(hash_constants::SEP)
                    .wrapping_add(xxh64(name.as_bytes(), 0)),
        )
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
