//! Short code allocation
//!
//! Combines a code source (random sampling or the keyed hash) with a bounded
//! collision check against an existing key set. Allocation never inserts
//! anything: callers must reserve the returned code in the same write
//! transaction that performed the check.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::BuildHasher;

use crate::error::CodeError;
use crate::generator::generate_code;
use crate::hash::KeyedHasher;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

/// A set of codes already in use.
pub trait CodeSet {
    fn contains_code(&self, code: &str) -> Result<bool, CodeError>;
}

impl<V, S: BuildHasher> CodeSet for HashMap<String, V, S> {
    fn contains_code(&self, code: &str) -> Result<bool, CodeError> {
        Ok(self.contains_key(code))
    }
}

impl<S: BuildHasher> CodeSet for HashSet<String, S> {
    fn contains_code(&self, code: &str) -> Result<bool, CodeError> {
        Ok(self.contains(code))
    }
}

impl<V> CodeSet for BTreeMap<String, V> {
    fn contains_code(&self, code: &str) -> Result<bool, CodeError> {
        Ok(self.contains_key(code))
    }
}

/// Where candidate codes come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSource<'a> {
    /// Uniform random codes of the given length.
    Random { length: usize },
    /// Keyed hash of `input`. Collisions re-key the input as `input#1`,
    /// `input#2`, ...
    Hash { input: &'a str },
}

/// How the application derives codes for new records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStrategy {
    Random { length: usize },
    /// Hash the record's natural input (email for users, target for URLs)
    Hash,
}

impl CodeStrategy {
    pub fn source<'a>(&self, input: &'a str) -> CodeSource<'a> {
        match *self {
            CodeStrategy::Random { length } => CodeSource::Random { length },
            CodeStrategy::Hash => CodeSource::Hash { input },
        }
    }
}

/// Calls `generator` until it yields a code absent from `store`.
///
/// Gives up with [`CodeError::Exhausted`] after `max_attempts` candidates.
pub fn allocate_unique_code<S, G>(
    store: &S,
    mut generator: G,
    max_attempts: u32,
) -> Result<String, CodeError>
where
    S: CodeSet + ?Sized,
    G: FnMut() -> String,
{
    for _ in 0..max_attempts {
        let candidate = generator();
        if !store.contains_code(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(CodeError::Exhausted {
        attempts: max_attempts,
    })
}

/// Allocates codes from either source against any [`CodeSet`].
#[derive(Debug, Clone)]
pub struct CodeAllocator {
    hasher: KeyedHasher,
    max_attempts: u32,
}

impl CodeAllocator {
    pub fn new(hasher: KeyedHasher, max_attempts: u32) -> Self {
        Self {
            hasher,
            max_attempts,
        }
    }

    pub fn hasher(&self) -> &KeyedHasher {
        &self.hasher
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn allocate_code<S: CodeSet + ?Sized>(
        &self,
        store: &S,
        source: CodeSource<'_>,
    ) -> Result<String, CodeError> {
        match source {
            CodeSource::Random { length } => {
                if length == 0 {
                    return Err(CodeError::InvalidLength(length));
                }
                allocate_unique_code(store, || generate_code(length), self.max_attempts)
            }
            CodeSource::Hash { input } => {
                let mut attempt = 0u32;
                allocate_unique_code(
                    store,
                    || {
                        let code = if attempt == 0 {
                            self.hasher.hash_to_code(input)
                        } else {
                            self.hasher.hash_to_code(&format!("{input}#{attempt}"))
                        };
                        attempt += 1;
                        code
                    },
                    self.max_attempts,
                )
            }
        }
    }
}
