//! Block, span and mark key generation
//!
//! Keys only need to be unique; nothing may rely on their order or format.

use rand::Rng;
use rand::distr::Alphanumeric;
use std::sync::atomic::{AtomicU64, Ordering};

/// Length of the random part of a key
const SALT_LEN: usize = 5;

/// Process-wide counter behind [`GlobalKeys`]
static GLOBAL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Source of `_key` values for generated blocks, spans and mark definitions
pub trait KeySource {
    fn next_key(&mut self) -> String;
}

impl<F: FnMut() -> String> KeySource for F {
    fn next_key(&mut self) -> String {
        self()
    }
}

/// Keys from a process-wide counter plus a random salt.
///
/// Every conversion that uses this source shares one counter, so keys from
/// separate calls do not collide.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalKeys;

impl KeySource for GlobalKeys {
    fn next_key(&mut self) -> String {
        let n = GLOBAL_COUNTER.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", base36(n), salt())
    }
}

/// Reset the process-wide counter used by [`GlobalKeys`].
///
/// Keys generated after a reset stay distinct from earlier ones only through
/// their salt.
pub fn reset_key_counter() {
    GLOBAL_COUNTER.store(0, Ordering::Relaxed);
}

/// Keys from a counter owned by this generator plus a random salt.
///
/// Constructing a new generator is the isolated equivalent of
/// [`reset_key_counter`].
#[derive(Debug, Clone, Default)]
pub struct KeyGenerator {
    counter: u64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeySource for KeyGenerator {
    fn next_key(&mut self) -> String {
        let n = self.counter;
        self.counter += 1;
        format!("{}{}", base36(n), salt())
    }
}

/// Deterministic keys (`prefix` followed by a counter), for tests and
/// reproducible output
#[derive(Debug, Clone)]
pub struct SequentialKeys {
    prefix: String,
    counter: u64,
}

impl SequentialKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }
}

impl Default for SequentialKeys {
    fn default() -> Self {
        Self::new("k")
    }
}

impl KeySource for SequentialKeys {
    fn next_key(&mut self) -> String {
        let key = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        key
    }
}

fn salt() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
