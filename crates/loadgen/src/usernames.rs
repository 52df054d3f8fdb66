//! Deterministic username generation.
//!
//! Usernames are `user_{(seed + n * stride) mod modulus}` for n = 0, 1, 2...
//! Growing the number of simulated users walks the same identifier space in
//! the same order, so a rerun with the same seed and stride registers (or
//! logs back into) the same accounts.
//!
//! The sequence is NOT collision-free. Once `n` reaches
//! `modulus / gcd(stride, modulus)` it starts over, and when the stride
//! shares a factor with the modulus that happens well before `modulus`
//! names have been issued. Personas tolerate this: a repeated name makes
//! register fail and the login fallback takes over.
//!
//! One generator is shared by every actor of a run. [`SharedUsernames`]
//! serializes access behind a mutex so concurrent actors each receive a
//! distinct position in the sequence.

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;

/// Primes a stride is drawn from when none is configured.
pub const STRIDE_PRIMES: [u64; 25] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97,
];

/// Counter-based username sequence.
#[derive(Debug, Clone)]
pub struct UsernameGenerator {
    seed: u64,
    stride: u64,
    modulus: u64,
    /// Number of usernames handed out so far.
    issued: u64,
}

impl UsernameGenerator {
    /// Create a generator with a fixed seed and stride.
    pub fn new(modulus: u64, seed: u64, stride: u64) -> Result<Self, UsernameError> {
        if modulus == 0 {
            return Err(UsernameError::ZeroModulus);
        }
        if stride == 0 {
            return Err(UsernameError::ZeroStride);
        }
        Ok(Self {
            seed,
            stride,
            modulus,
            issued: 0,
        })
    }

    /// Create a generator, drawing whichever of seed and stride is missing.
    ///
    /// A missing seed is uniform in `0..=modulus`; a missing stride is picked
    /// from [`STRIDE_PRIMES`].
    pub fn with_optional<R: Rng + ?Sized>(
        modulus: u64,
        seed: Option<u64>,
        stride: Option<u64>,
        rng: &mut R,
    ) -> Result<Self, UsernameError> {
        let seed = seed.unwrap_or_else(|| rng.gen_range(0..=modulus));
        let stride = match stride {
            Some(stride) => stride,
            None => *STRIDE_PRIMES.choose(rng).unwrap_or(&STRIDE_PRIMES[0]),
        };
        Self::new(modulus, seed, stride)
    }

    /// Produce the next username in the sequence.
    pub fn next_username(&mut self) -> String {
        let index = self.issued;
        self.issued += 1;
        self.username_at(index)
    }

    /// Username at position `index`, independent of how many were issued.
    pub fn username_at(&self, index: u64) -> String {
        let value = (self.seed as u128 + index as u128 * self.stride as u128) % self.modulus as u128;
        format!("user_{}", value)
    }

    /// How many names are issued before the sequence repeats.
    pub fn period(&self) -> u64 {
        self.modulus / gcd(self.stride % self.modulus, self.modulus)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }
}

impl Iterator for UsernameGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        Some(self.next_username())
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// A [`UsernameGenerator`] shared by concurrently running actors.
#[derive(Debug)]
pub struct SharedUsernames {
    inner: Mutex<UsernameGenerator>,
}

impl SharedUsernames {
    pub fn new(generator: UsernameGenerator) -> Self {
        Self {
            inner: Mutex::new(generator),
        }
    }

    /// Claim the next username. The lock is held only for the counter bump.
    pub fn next_username(&self) -> String {
        self.inner.lock().next_username()
    }

    /// Snapshot of the generator state.
    pub fn snapshot(&self) -> UsernameGenerator {
        self.inner.lock().clone()
    }
}

/// Errors constructing a username generator.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username space must contain at least one name")]
    ZeroModulus,
    #[error("Username stride must be non-zero")]
    ZeroStride,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_fixed_seed_and_stride_sequence() {
        let generator = UsernameGenerator::new(10_000, 0, 7).unwrap();
        let names: Vec<String> = generator.take(4).collect();
        assert_eq!(names, vec!["user_0", "user_7", "user_14", "user_21"]);
    }

    #[test]
    fn test_sequence_is_reproducible() {
        let a: Vec<String> = UsernameGenerator::new(10_000, 1234, 31)
            .unwrap()
            .take(500)
            .collect();
        let b: Vec<String> = UsernameGenerator::new(10_000, 1234, 31)
            .unwrap()
            .take(500)
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_wraps_modulo_space() {
        let mut generator = UsernameGenerator::new(10, 8, 3).unwrap();
        assert_eq!(generator.next_username(), "user_8");
        assert_eq!(generator.next_username(), "user_1");
        assert_eq!(generator.next_username(), "user_4");
        assert_eq!(generator.issued(), 3);
    }

    #[test]
    fn test_repeats_early_when_stride_shares_factor() {
        // gcd(2, 10) = 2, so only five distinct names exist.
        let generator = UsernameGenerator::new(10, 0, 2).unwrap();
        assert_eq!(generator.period(), 5);
        assert_eq!(generator.username_at(0), generator.username_at(5));

        let distinct: HashSet<String> = generator.take(10).collect();
        assert_eq!(distinct.len(), 5);
    }

    #[test]
    fn test_coprime_stride_covers_space() {
        let generator = UsernameGenerator::new(100, 17, 7).unwrap();
        assert_eq!(generator.period(), 100);
        let distinct: HashSet<String> = generator.take(100).collect();
        assert_eq!(distinct.len(), 100);
    }

    #[test]
    fn test_rejects_empty_space() {
        assert_eq!(
            UsernameGenerator::new(0, 1, 3).unwrap_err(),
            UsernameError::ZeroModulus
        );
        assert_eq!(
            UsernameGenerator::new(10, 1, 0).unwrap_err(),
            UsernameError::ZeroStride
        );
    }

    #[test]
    fn test_missing_parts_are_drawn() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let generator = UsernameGenerator::with_optional(10_000, None, None, &mut rng).unwrap();
        assert!(generator.seed() <= 10_000);
        assert!(STRIDE_PRIMES.contains(&generator.stride()));

        // Explicit zero seed is honoured, not treated as missing.
        let generator = UsernameGenerator::with_optional(10_000, Some(0), Some(7), &mut rng).unwrap();
        assert_eq!(generator.seed(), 0);
        assert_eq!(generator.stride(), 7);
    }

    #[test]
    fn test_shared_generator_hands_out_distinct_positions() {
        let shared = Arc::new(SharedUsernames::new(
            UsernameGenerator::new(1_000_000, 0, 1).unwrap(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    (0..100).map(|_| shared.next_username()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for name in handle.join().unwrap() {
                assert!(all.insert(name), "position handed out twice");
            }
        }
        assert_eq!(all.len(), 800);
        assert_eq!(shared.snapshot().issued(), 800);
    }
}
