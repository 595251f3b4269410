//! Deterministic keyed polynomial hash
//!
//! [`KeyedHasher`] maps any string to a fixed-length base-36 code. The key
//! schedule is computed once by [`KeyedHasher::new`] and never changes, so the
//! same input always produces the same code, across restarts included.
//!
//! The hash is NOT cryptographic. It only exists to derive short,
//! reproducible, roughly uniform codes (e.g. a user id from an email).

use crate::error::CodeError;
use crate::generator::ALPHABET;

/// Starting value for the key schedule. 5 is a primitive root modulo every
/// power of 3, so repeated squaring cycles through a long orbit.
const SEED: u128 = 5;

/// Keys must exceed this value after reduction.
const LARGE_KEY_THRESHOLD: u128 = 1 << 24;

/// Upper bound on squarings while searching for keys.
const MAX_SQUARINGS: usize = 1 << 20;

pub const MIN_HASH_LENGTH: usize = 5;
pub const MAX_HASH_LENGTH: usize = 12;

pub const DEFAULT_HASH_LENGTH: usize = 8;
pub const DEFAULT_KEY_COUNT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedHasher {
    length: usize,
    modulus: u128,
    keys: Vec<u128>,
}

impl KeyedHasher {
    /// Builds the key schedule for codes of `length` characters.
    ///
    /// # Errors
    ///
    /// - [`CodeError::InvalidLength`] when `length` is outside `5..=12`
    /// - [`CodeError::InvalidKeyCount`] when `key_count` is 0
    /// - [`CodeError::KeySchedule`] when the bounded search cannot find
    ///   `key_count` keys
    pub fn new(length: usize, key_count: usize) -> Result<Self, CodeError> {
        if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&length) {
            return Err(CodeError::InvalidLength(length));
        }
        if key_count == 0 {
            return Err(CodeError::InvalidKeyCount);
        }

        let modulus = 36u128.pow(length as u32);
        let mut keys = Vec::with_capacity(key_count);
        let mut candidate = SEED % modulus;

        for _ in 0..MAX_SQUARINGS {
            candidate = candidate * candidate % modulus;
            if candidate > LARGE_KEY_THRESHOLD && is_probable_prime(candidate) {
                keys.push(candidate);
                if keys.len() == key_count {
                    return Ok(Self {
                        length,
                        modulus,
                        keys,
                    });
                }
            }
        }

        Err(CodeError::KeySchedule {
            wanted: key_count,
            found: keys.len(),
        })
    }

    /// Key schedule with the default length (8) and key count (200).
    pub fn standard() -> Result<Self, CodeError> {
        Self::new(DEFAULT_HASH_LENGTH, DEFAULT_KEY_COUNT)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn modulus(&self) -> u128 {
        self.modulus
    }

    pub fn keys(&self) -> &[u128] {
        &self.keys
    }

    /// Hashes `input` to a code of exactly [`length`](Self::length) characters.
    ///
    /// Inputs longer than the key schedule wrap around to the first key.
    pub fn hash_to_code(&self, input: &str) -> String {
        let m = self.modulus;
        let mut acc: u128 = 0;

        for (i, ch) in input.chars().enumerate() {
            let key = self.keys[i % self.keys.len()];
            acc = (acc + u128::from(ch) * key % m) % m;
            acc = acc * acc % m;
        }

        to_base36(acc, self.length)
    }
}

/// Renders `value` in base 36, left-padded with `0` to `width` digits.
fn to_base36(mut value: u128, width: usize) -> String {
    let mut digits = vec![b'0'; width];
    for slot in digits.iter_mut().rev() {
        *slot = ALPHABET[(value % 36) as usize];
        value /= 36;
    }
    digits.into_iter().map(char::from).collect()
}

/// Base-2 Fermat test. Composites slipping through are accepted; the keys
/// only need to look prime, not be prime.
fn is_probable_prime(n: u128) -> bool {
    if n < 2 {
        return false;
    }
    for p in [2u128, 3, 5, 7, 11, 13] {
        if n == p {
            return true;
        }
        if n % p == 0 {
            return false;
        }
    }
    mod_pow(2, n - 1, n) == 1
}

fn mod_pow(mut base: u128, mut exp: u128, modulus: u128) -> u128 {
    let mut result = 1 % modulus;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % modulus;
        }
        base = base * base % modulus;
        exp >>= 1;
    }
    result
}
