//! Deterministic per-job seeds.
//!
//! A master seed is expanded into one sub-seed per `(job, position)` via
//! BLAKE3, independently of scheduling order, so stochastic parties behave
//! identically in streaming and batch runs and regardless of thread count.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::NegotiationJob;

/// Derive the seed for the party at `position` in `job`.
pub fn job_seed(master_seed: u64, job: &NegotiationJob, position: usize) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master_seed.to_le_bytes());
    hasher.update(job.scenario.as_bytes());
    hasher.update(&[0]);
    hasher.update(job.competitor.as_bytes());
    hasher.update(&[0]);
    hasher.update(job.opponent.as_bytes());
    hasher.update(&(job.repetition as u64).to_le_bytes());
    hasher.update(&[job.rotated as u8, position as u8]);
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

pub fn rng_from_seed(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
