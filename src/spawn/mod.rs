// src/spawn/mod.rs
//! Segment content: collectibles and hazards, each pooled and tracked in one active list.

use rand::Rng;

use crate::level::core::SegmentInstance;

pub mod collectibles;
pub mod hazards;
pub mod patterns;

pub use collectibles::{CollectibleSpawner, CollectibleTable, Pickup, PickupEffect};
pub use hazards::HazardSpawners;

/// What the level generator drives on every spawner it owns content through.
pub trait ContentSpawner: Send + Sync {
    /// Populate the declared spawn points of a freshly placed segment.
    fn spawn_for_segment(&mut self, segment: &SegmentInstance, difficulty_bias: f32);
    /// Return everything whose track position is behind `coord` to the pools.
    fn despawn_before(&mut self, coord: f32);
    /// Return everything, unconditionally.
    fn despawn_all(&mut self);
}

/// One spawn roll. `random()` is in `[0, 1)`, so a chance of 0 never passes
/// and a chance of 1 always does.
#[inline]
pub fn roll_spawn(rng: &mut impl Rng, always_spawn: bool, spawn_chance: f32) -> bool {
    always_spawn || rng.random::<f32>() < spawn_chance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn zero_chance_never_spawns_and_one_always_does() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..10_000 {
            assert!(!roll_spawn(&mut rng, false, 0.0));
            assert!(roll_spawn(&mut rng, false, 1.0));
        }
        assert!(roll_spawn(&mut rng, true, 0.0));
    }
}
