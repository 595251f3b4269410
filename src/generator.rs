//! Random short code generation
//!
//! Codes are drawn uniformly from a 36-symbol alphabet (`0-9a-z`). The
//! generator is not cryptographically secure and makes no uniqueness promise;
//! see [`crate::allocator`] for collision handling.

use rand::Rng;

/// Symbols a short code may contain, in base-36 digit order.
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a random code of exactly `length` characters using the
/// thread-local RNG.
///
/// A `length` of zero yields the empty string. Callers that need a usable
/// code go through [`crate::allocator::CodeAllocator`], which rejects it.
///
/// # Example
///
/// ```
/// # use tinyapp::generator::generate_code;
/// let code = generate_code(8);
/// assert_eq!(code.len(), 8);
/// ```
pub fn generate_code(length: usize) -> String {
    generate_code_with(&mut rand::rng(), length)
}

/// Same as [`generate_code`] but draws from the supplied RNG.
pub fn generate_code_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Returns true when `c` belongs to [`ALPHABET`].
pub fn is_code_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_is_36_unique_symbols() {
        let unique: HashSet<_> = ALPHABET.iter().collect();
        assert_eq!(unique.len(), 36);
        assert!(ALPHABET.iter().all(|&b| is_code_char(b as char)));
    }

    #[test]
    fn test_generate_code_length_and_alphabet() {
        for length in 1..=16 {
            let code = generate_code(length);
            assert_eq!(code.chars().count(), length);
            assert!(code.chars().all(is_code_char), "bad code {code}");
        }
    }

    #[test]
    fn test_generate_code_zero_length_is_empty() {
        assert_eq!(generate_code(0), "");
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = generate_code_with(&mut StdRng::seed_from_u64(42), 8);
        let b = generate_code_with(&mut StdRng::seed_from_u64(42), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_generation_covers_the_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<char> = generate_code_with(&mut rng, 5000).chars().collect();
        assert_eq!(seen.len(), 36);
    }
}
