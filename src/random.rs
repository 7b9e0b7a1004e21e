//! Pluggable randomness
//!
//! Every simulation draw goes through [`RandomSource::next_f32`]. The default
//! source is a seeded PCG; the pooled source drains externally fetched
//! entropy first and falls back to PCG whenever the pool is empty.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::EntropyError;

/// Entropy pool capacity (one full service response)
pub const POOL_CAPACITY: usize = 100;
/// Refill is requested once the pool drops below this many values
pub const POOL_LOW_WATER: usize = 10;
/// How often the producer checks the pool
pub const REFILL_INTERVAL_MS: f64 = 5000.0;
/// Quantum random number service endpoint
pub const QRNG_URL: &str = "https://qrng.anu.edu.au/API/jsonI.php?length=100&type=uint8";

/// Largest f32 strictly below 1.0
const MAX_UNIT: f32 = 1.0 - f32::EPSILON / 2.0;

/// Which backend feeds the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RandomSourceKind {
    #[default]
    Default,
    External,
}

/// Uniform random numbers for the simulation
pub trait RandomSource {
    /// Uniform draw in [0, 1)
    fn next_f32(&mut self) -> f32;

    /// Switch backend; sources with a single backend ignore this
    fn set_kind(&mut self, _kind: RandomSourceKind) {}

    /// Uniform draw in [-0.5, 0.5)
    fn centered(&mut self) -> f32 {
        self.next_f32() - 0.5
    }

    /// Uniform index in 0..len
    fn index(&mut self, len: usize) -> usize {
        ((self.next_f32() * len as f32) as usize).min(len.saturating_sub(1))
    }
}

/// Seeded PCG source
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: Pcg32,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededSource {
    fn next_f32(&mut self) -> f32 {
        self.rng.random::<f32>()
    }
}

/// Bounded queue of externally sourced uniform values
#[derive(Debug, Default)]
pub struct EntropyPool {
    values: VecDeque<f32>,
    fetching: bool,
}

/// Pool handle shared between the source and its producer
pub type SharedPool = Rc<RefCell<EntropyPool>>;

impl EntropyPool {
    pub fn new() -> Self {
        Self {
            values: VecDeque::with_capacity(POOL_CAPACITY),
            fetching: false,
        }
    }

    pub fn shared() -> SharedPool {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Append values, dropping whatever does not fit
    pub fn push_batch(&mut self, batch: impl IntoIterator<Item = f32>) {
        let room = POOL_CAPACITY.saturating_sub(self.values.len());
        self.values.extend(batch.into_iter().take(room));
    }

    pub fn pop(&mut self) -> Option<f32> {
        self.values.pop_front()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when the producer should start a fetch
    pub fn needs_refill(&self) -> bool {
        self.values.len() < POOL_LOW_WATER && !self.fetching
    }

    pub fn begin_fetch(&mut self) {
        self.fetching = true;
    }

    /// Finish a fetch, storing the batch on success
    pub fn end_fetch(&mut self, result: Result<Vec<f32>, EntropyError>) {
        self.fetching = false;
        match result {
            Ok(batch) => {
                log::debug!("Entropy pool refilled with {} values", batch.len());
                self.push_batch(batch);
            }
            Err(e) => log::error!("Error fetching quantum randomness: {}", e),
        }
    }
}

/// Source that prefers the external pool when enabled
#[derive(Debug)]
pub struct PooledSource {
    kind: RandomSourceKind,
    fallback: Pcg32,
    pool: SharedPool,
    starved: bool,
}

impl PooledSource {
    pub fn new(seed: u64, kind: RandomSourceKind, pool: SharedPool) -> Self {
        Self {
            kind,
            fallback: Pcg32::seed_from_u64(seed),
            pool,
            starved: false,
        }
    }
}

impl RandomSource for PooledSource {
    fn next_f32(&mut self) -> f32 {
        if self.kind == RandomSourceKind::External {
            if let Some(v) = self.pool.borrow_mut().pop() {
                self.starved = false;
                return v;
            }
            if !self.starved {
                log::warn!("Entropy pool empty, falling back to PCG");
                self.starved = true;
            }
        }
        self.fallback.random::<f32>()
    }

    fn set_kind(&mut self, kind: RandomSourceKind) {
        if kind != self.kind {
            log::info!("Random source: {:?}", kind);
        }
        self.kind = kind;
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f32>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Every draw returns `value`
    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for ScriptedSource {
    fn next_f32(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

#[derive(Deserialize)]
struct QrngResponse {
    success: bool,
    #[serde(default)]
    data: Vec<u8>,
}

/// Parse a QRNG service response into uniform values
pub fn parse_qrng_response(body: &str) -> Result<Vec<f32>, EntropyError> {
    let response: QrngResponse = serde_json::from_str(body)?;
    if !response.success {
        return Err(EntropyError::Rejected);
    }
    if response.data.is_empty() {
        return Err(EntropyError::Empty);
    }
    Ok(response
        .data
        .into_iter()
        .map(|n| (n as f32 / 255.0).min(MAX_UNIT))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_source_range_and_determinism() {
        let mut a = SeededSource::new(7);
        let mut b = SeededSource::new(7);
        for _ in 0..1000 {
            let x = a.next_f32();
            assert!((0.0..1.0).contains(&x));
            assert_eq!(x, b.next_f32());
        }
    }

    #[test]
    fn test_pooled_source_drains_pool_first() {
        let pool = EntropyPool::shared();
        pool.borrow_mut().push_batch([0.25, 0.75]);
        let mut source = PooledSource::new(1, RandomSourceKind::External, pool.clone());

        assert_eq!(source.next_f32(), 0.25);
        assert_eq!(source.next_f32(), 0.75);
        let fallback = source.next_f32();
        assert!((0.0..1.0).contains(&fallback));
        assert!(pool.borrow().is_empty());
    }

    #[test]
    fn test_pooled_source_ignores_pool_when_default() {
        let pool = EntropyPool::shared();
        pool.borrow_mut().push_batch([0.5]);
        let mut source = PooledSource::new(1, RandomSourceKind::Default, pool.clone());
        source.next_f32();
        assert_eq!(pool.borrow().len(), 1);

        source.set_kind(RandomSourceKind::External);
        assert_eq!(source.next_f32(), 0.5);
    }

    #[test]
    fn test_pool_capacity_and_refill_flag() {
        let mut pool = EntropyPool::new();
        assert!(pool.needs_refill());
        pool.begin_fetch();
        assert!(!pool.needs_refill());
        pool.end_fetch(Ok(vec![0.1; POOL_CAPACITY + 50]));
        assert_eq!(pool.len(), POOL_CAPACITY);
        assert!(!pool.needs_refill());
    }

    #[test]
    fn test_failed_fetch_clears_in_flight_flag() {
        let mut pool = EntropyPool::new();
        pool.begin_fetch();
        pool.end_fetch(Err(EntropyError::Network("offline".into())));
        assert!(pool.is_empty());
        assert!(pool.needs_refill());
    }

    #[test]
    fn test_parse_qrng_response() {
        let body = r#"{"type":"uint8","length":3,"data":[0,51,255],"success":true}"#;
        let values = parse_qrng_response(body).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 0.2).abs() < 1e-6);
        assert!(values[2] < 1.0);

        assert!(matches!(
            parse_qrng_response(r#"{"success":false}"#),
            Err(EntropyError::Rejected)
        ));
        assert!(matches!(
            parse_qrng_response(r#"{"success":true,"data":[]}"#),
            Err(EntropyError::Empty)
        ));
        assert!(matches!(
            parse_qrng_response("<html>"),
            Err(EntropyError::Parse(_))
        ));
    }

    #[test]
    fn test_index_stays_in_bounds() {
        let mut source = ScriptedSource::new(vec![0.0, 0.5, MAX_UNIT]);
        assert_eq!(source.index(5), 0);
        assert_eq!(source.index(5), 2);
        assert_eq!(source.index(5), 4);
    }
}
