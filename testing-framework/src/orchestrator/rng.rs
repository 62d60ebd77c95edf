// File: testing-framework/src/orchestrator/rng.rs
//
// Seeded RNG
//
// Every source of randomness in the simulated chain (block timestamp jitter,
// and with it the outcome of `randomFail`) draws from one TestRng. Printing
// the seed is enough to replay a run exactly.

use parking_lot::Mutex;
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::distributions::{Distribution, Standard};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Environment variable carrying a replay seed (`0x`-prefixed hex or decimal)
pub const SEED_ENV_VAR: &str = "WHY_TEST_SEED";

/// Deterministic, shareable random number generator
///
/// Interior mutability lets a single `&TestRng` be shared by the chain and
/// the test body without threading `&mut` everywhere.
///
/// # Examples
///
/// ```rust
/// use why_testing_framework::orchestrator::TestRng;
///
/// let a = TestRng::with_seed(7);
/// let b = TestRng::with_seed(7);
/// assert_eq!(a.gen::<u64>(), b.gen::<u64>());
/// ```
pub struct TestRng {
    seed: u64,
    inner: Mutex<StdRng>,
}

impl TestRng {
    /// Create an RNG from an explicit seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            inner: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seed from `WHY_TEST_SEED` if set and valid, otherwise pick one at random
    ///
    /// The chosen seed is always logged so a failing run can be replayed.
    pub fn new_from_env_or_random() -> Self {
        let seed = seed_from_env().unwrap_or_else(random_seed);
        log::info!("TestRng seed: 0x{:016x}", seed);
        log::info!("   Replay: {}=0x{:016x} cargo test ...", SEED_ENV_VAR, seed);
        Self::with_seed(seed)
    }

    /// Seed from `WHY_TEST_SEED` if set and valid, otherwise `default_seed`
    ///
    /// For tests that pin a seed but still honour a replay request.
    pub fn new_from_env_or(default_seed: u64) -> Self {
        let seed = seed_from_env().unwrap_or(default_seed);
        log::info!("TestRng seed: 0x{:016x}", seed);
        Self::with_seed(seed)
    }

    /// The seed this RNG was created from
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draw a value from the standard distribution
    pub fn gen<T>(&self) -> T
    where
        Standard: Distribution<T>,
    {
        self.inner.lock().gen()
    }

    /// Draw a value uniformly from `range`
    pub fn gen_range<T, R>(&self, range: R) -> T
    where
        T: SampleUniform,
        R: SampleRange<T>,
    {
        self.inner.lock().gen_range(range)
    }

    /// Fill `dest` with random bytes
    pub fn fill_bytes(&self, dest: &mut [u8]) {
        self.inner.lock().fill_bytes(dest)
    }
}

/// Parse a seed written as `0x...` hex or plain decimal
pub fn parse_seed(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn seed_from_env() -> Option<u64> {
    let raw = std::env::var(SEED_ENV_VAR).ok()?;
    let seed = parse_seed(&raw);
    if seed.is_none() {
        log::warn!("Ignoring unparsable {}={:?}", SEED_ENV_VAR, raw);
    }
    seed
}

fn random_seed() -> u64 {
    // Zero is reserved so that a printed seed is never mistaken for "unset"
    loop {
        let seed = rand::thread_rng().gen::<u64>();
        if seed != 0 {
            return seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let a = TestRng::with_seed(42);
        let b = TestRng::with_seed(42);
        let xs: Vec<u64> = (0..16).map(|_| a.gen()).collect();
        let ys: Vec<u64> = (0..16).map(|_| b.gen()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_gen_range_bounds() {
        let rng = TestRng::with_seed(1);
        for _ in 0..1000 {
            let v: u64 = rng.gen_range(0..=1);
            assert!(v <= 1);
        }
    }

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("0xdeadbeef"), Some(0xdead_beef));
        assert_eq!(parse_seed(" 1234 "), Some(1234));
        assert_eq!(parse_seed("0Xff"), Some(255));
        assert_eq!(parse_seed("nope"), None);
    }

    #[test]
    fn test_random_seed_nonzero() {
        assert_ne!(TestRng::new_from_env_or_random().seed(), 0);
    }
}
