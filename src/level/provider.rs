// src/level/provider.rs
//! Template selection seam. The generator only asks "what comes next?";
//! biome/difficulty policy lives behind `TemplateProvider`.

use std::sync::Arc;

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::catalog::SegmentCatalog;
use super::core::{SegmentTemplate, TemplateId};

/// Chooses the next template for the streamer.
pub trait TemplateProvider: Send + Sync + 'static {
    /// Next template to place after `last`; `None` means "nothing right now",
    /// and the generator retries on a later tick.
    fn next_segment(&mut self, last: Option<TemplateId>) -> Option<(TemplateId, Arc<SegmentTemplate>)>;

    /// Bias handed to spawners for content density. 1.0 = baseline.
    fn current_difficulty_multiplier(&self) -> f32 {
        1.0
    }

    /// Forget run progress (called on restart).
    fn reset(&mut self) {}
}

/// Boxed provider as a resource, so the policy can be swapped at the composition root.
#[derive(Resource)]
pub struct ActiveProvider(pub Box<dyn TemplateProvider>);

/// How the difficulty multiplier grows with placed segments.
#[derive(Clone, Copy, Debug)]
pub struct DifficultyRamp {
    pub start: f32,
    pub per_segment: f32,
    pub max: f32,
}

impl Default for DifficultyRamp {
    fn default() -> Self {
        Self { start: 1.0, per_segment: 0.02, max: 3.0 }
    }
}

impl DifficultyRamp {
    pub fn multiplier(&self, served: u32) -> f32 {
        (self.start + served as f32 * self.per_segment).min(self.max)
    }

    /// Multiplier mapped onto `[0, 1]`, comparable to `difficulty_weight`.
    pub fn normalized(&self, served: u32) -> f32 {
        let span = self.max - self.start;
        if span <= 0.0 {
            return 1.0;
        }
        ((self.multiplier(served) - self.start) / span).clamp(0.0, 1.0)
    }
}

/// Seeded weighted pick over a catalog. Templates whose `difficulty_weight`
/// sits near the current difficulty are favoured; `allow_consecutive: false`
/// templates never follow themselves.
pub struct CatalogProvider {
    templates: Vec<(TemplateId, Arc<SegmentTemplate>)>,
    ramp: DifficultyRamp,
    seed: u64,
    rng: ChaCha8Rng,
    served: u32,
}

/// Floor so every eligible template keeps some chance.
const MIN_PICK_WEIGHT: f32 = 0.05;

impl CatalogProvider {
    pub fn new(catalog: &SegmentCatalog, seed: u64) -> Self {
        let templates = catalog.iter().map(|(id, t)| (id, Arc::clone(t))).collect();
        Self {
            templates,
            ramp: DifficultyRamp::default(),
            seed,
            rng: Self::rng_for(seed),
            served: 0,
        }
    }

    pub fn with_ramp(mut self, ramp: DifficultyRamp) -> Self {
        self.ramp = ramp;
        self
    }

    #[inline]
    fn rng_for(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed ^ 0x5E6D_E17A_0C0F_FEE5u64)
    }

    pub fn served(&self) -> u32 {
        self.served
    }

    fn pick_weight(&self, template: &SegmentTemplate) -> f32 {
        let target = self.ramp.normalized(self.served);
        (1.0 - (template.difficulty_weight - target).abs()).max(MIN_PICK_WEIGHT)
    }
}

impl TemplateProvider for CatalogProvider {
    fn next_segment(&mut self, last: Option<TemplateId>) -> Option<(TemplateId, Arc<SegmentTemplate>)> {
        let candidates: Vec<(usize, f32)> = self
            .templates
            .iter()
            .enumerate()
            .filter(|(_, (id, t))| t.allow_consecutive || Some(*id) != last)
            .map(|(i, (_, t))| (i, self.pick_weight(t)))
            .collect();

        let total: f32 = candidates.iter().map(|(_, w)| w).sum();
        if candidates.is_empty() || total <= 0.0 {
            return None;
        }

        let mut roll = self.rng.random_range(0.0..total);
        let mut chosen = candidates[candidates.len() - 1].0;
        for (i, w) in &candidates {
            if roll < *w {
                chosen = *i;
                break;
            }
            roll -= w;
        }

        self.served += 1;
        let (id, template) = &self.templates[chosen];
        Some((*id, Arc::clone(template)))
    }

    fn current_difficulty_multiplier(&self) -> f32 {
        self.ramp.multiplier(self.served)
    }

    fn reset(&mut self) {
        self.served = 0;
        self.rng = Self::rng_for(self.seed);
    }
}
