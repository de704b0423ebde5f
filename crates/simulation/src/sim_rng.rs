//! Deterministic park RNG.
//!
//! Breakdown countdowns and every other random draw go through `ResMut<SimRng>`
//! so a seed and a save file fully determine a run.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const DEFAULT_SEED: u64 = 42;

/// Full `ChaCha8Rng` state, so a loaded park continues the same sequence.
#[derive(Encode, Decode)]
struct RngState {
    seed: [u8; 32],
    word_pos: u128,
    stream: u64,
}

impl From<&ChaCha8Rng> for RngState {
    fn from(rng: &ChaCha8Rng) -> Self {
        Self {
            seed: rng.get_seed(),
            word_pos: rng.get_word_pos(),
            stream: rng.get_stream(),
        }
    }
}

impl RngState {
    fn restore(&self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::from_seed(self.seed);
        rng.set_stream(self.stream);
        rng.set_word_pos(self.word_pos);
        rng
    }
}

#[derive(Resource)]
pub struct SimRng(pub ChaCha8Rng);

impl Default for SimRng {
    fn default() -> Self {
        Self::from_seed_u64(DEFAULT_SEED)
    }
}

impl SimRng {
    pub fn from_seed_u64(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    /// Draw from an exponential distribution with the given mean, truncated
    /// to whole days.
    pub fn exponential(&mut self, mean: u32) -> i32 {
        // Open interval: ln(0) is not finite.
        let u: f64 = self.0.gen_range(f64::EPSILON..1.0);
        (-f64::from(mean) * u.ln()) as i32
    }
}

impl crate::Saveable for SimRng {
    const SAVE_KEY: &'static str = "sim_rng";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        Some(bitcode::encode(&RngState::from(&self.0)))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        crate::decode_or_warn::<RngState>(Self::SAVE_KEY, bytes)
            .map(|state| Self(state.restore()))
            .unwrap_or_default()
    }
}

pub struct SimRngPlugin;

impl Plugin for SimRngPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimRng>();
        app.init_resource::<crate::SaveableRegistry>();
        app.world_mut()
            .resource_mut::<crate::SaveableRegistry>()
            .register::<SimRng>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Saveable;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SimRng::from_seed_u64(12345);
        let mut b = SimRng::from_seed_u64(12345);
        let vals_a: Vec<i32> = (0..20).map(|_| a.exponential(100)).collect();
        let vals_b: Vec<i32> = (0..20).map(|_| b.exponential(100)).collect();
        assert_eq!(vals_a, vals_b);
    }

    #[test]
    fn test_exponential_mean_is_close() {
        let mut rng = SimRng::from_seed_u64(7);
        let n = 20_000;
        let sum: i64 = (0..n).map(|_| i64::from(rng.exponential(180))).sum();
        let mean = sum as f64 / n as f64;
        // Truncation towards zero lowers the mean by about half a day.
        assert!((170.0..190.0).contains(&mean), "mean {mean}");
    }

    #[test]
    fn test_exponential_is_never_negative() {
        let mut rng = SimRng::from_seed_u64(3);
        assert!((0..5_000).all(|_| rng.exponential(30) >= 0));
        assert_eq!(rng.exponential(0), 0);
    }

    #[test]
    fn test_save_load_continues_sequence() {
        let mut rng = SimRng::from_seed_u64(999);
        for _ in 0..100 {
            rng.0.gen::<f64>();
        }
        let bytes = rng.save_to_bytes().expect("rng always saves");
        let mut restored = SimRng::load_from_bytes(&bytes);

        let orig: Vec<i32> = (0..50).map(|_| rng.exponential(50)).collect();
        let rest: Vec<i32> = (0..50).map(|_| restored.exponential(50)).collect();
        assert_eq!(orig, rest);
    }

    #[test]
    fn test_garbage_falls_back_to_default() {
        let mut loaded = SimRng::load_from_bytes(&[1, 2, 3]);
        let mut fresh = SimRng::default();
        assert_eq!(loaded.exponential(10), fresh.exponential(10));
    }
}
