// src/level/config.rs
use bevy::prelude::*;

/// Streaming window + pooling knobs for the level generator.
#[derive(Resource, Clone, Debug)]
pub struct StreamingConfig {
    /// Segments must exist up to `reference + view_distance`.
    pub view_distance: f32,
    /// Segments ending before `reference - despawn_distance` are evicted.
    pub despawn_distance: f32,
    /// Segments laid down by `initialize` / `reset`.
    pub initial_segment_count: usize,
    /// Spawn-phase iteration cap per tick (guards near-zero-length templates).
    pub max_spawns_per_tick: usize,
    /// Default pre-warm per segment template pool.
    pub segment_prewarm: usize,
    /// Pre-warm per hazard archetype pool, applied on first reference.
    pub hazard_prewarm: usize,
    pub reveal: RevealConfig,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            view_distance: 150.0,
            despawn_distance: 30.0,
            initial_segment_count: 5,
            max_spawns_per_tick: 50,
            segment_prewarm: 2,
            hazard_prewarm: 3,
            reveal: RevealConfig::default(),
        }
    }
}

/// Timing of the entrance animation. Only the initial window is staggered.
#[derive(Clone, Copy, Debug)]
pub struct RevealConfig {
    pub base_delay: f32,
    pub stagger: f32,
    pub duration: f32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self { base_delay: 0.15, stagger: 0.08, duration: 0.4 }
    }
}

impl RevealConfig {
    /// Delay for the `index`-th segment of the initial window.
    #[inline]
    pub fn initial_delay(&self, index: usize) -> f32 {
        index as f32 * self.stagger + self.base_delay
    }
}
