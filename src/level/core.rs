// src/level/core.rs
//! Core types for segment streaming: templates, spawn points, placed instances.
//! Keep this file dependency-light; the generator, spawners and catalog all build on it.

use std::sync::Arc;

use bevy::prelude::*; // Vec3
use serde::{Deserialize, Serialize};

use super::reveal::RevealHandle;

// ---------- Axes & ids ----------

/// Travel direction. Track coordinates are measured along this axis.
pub const FORWARD: Vec3 = Vec3::Z;
/// World up.
pub const UP: Vec3 = Vec3::Y;
/// Sideways, to the runner's right.
pub const LATERAL: Vec3 = Vec3::X;

/// Index of a template in the catalog (stable during a session).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

// ---------- Collectible spawn points ----------

/// What a collectible spawn point produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectibleKind {
    Coin,
    SpeedBoost,
    Magnet,
    Multiplier,
    /// A patterned run of coins; see [`GroupParams`].
    CoinGroup,
}

impl CollectibleKind {
    /// The generic kind every other kind falls back to.
    pub const BASE: Self = Self::Coin;

    pub const fn is_group(self) -> bool {
        matches!(self, Self::CoinGroup)
    }

    /// Pool a spawn point of this kind draws from. Groups are made of base coins.
    pub const fn pool_kind(self) -> Self {
        if self.is_group() { Self::BASE } else { self }
    }
}

/// Shape a coin group is laid out in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupPattern {
    Line,
    Arc,
    Zigzag,
    Jump,
    Vertical,
}

/// Layout of a `CoinGroup` point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupParams {
    pub count: u32,
    /// Meters between neighbours (pattern-dependent meaning, see `spawn::patterns`).
    pub spacing: f32,
    pub pattern: GroupPattern,
}

impl Default for GroupParams {
    fn default() -> Self {
        Self { count: 5, spacing: 2.0, pattern: GroupPattern::Line }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectibleSpawnPoint {
    /// Offset from the segment origin.
    pub anchor_offset: Vec3,
    pub kind: CollectibleKind,
    #[serde(default)]
    pub always_spawn: bool,
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: f32,
    /// Only read when `kind` is a group.
    #[serde(default)]
    pub group: GroupParams,
}

impl CollectibleSpawnPoint {
    pub fn new(kind: CollectibleKind, anchor_offset: Vec3) -> Self {
        Self {
            anchor_offset,
            kind,
            always_spawn: false,
            spawn_chance: default_spawn_chance(),
            group: GroupParams::default(),
        }
    }

    pub fn always(mut self) -> Self {
        self.always_spawn = true;
        self
    }

    pub fn with_chance(mut self, chance: f32) -> Self {
        self.spawn_chance = chance;
        self
    }

    pub fn with_group(mut self, count: u32, spacing: f32, pattern: GroupPattern) -> Self {
        self.group = GroupParams { count, spacing, pattern };
        self
    }
}

// ---------- Hazard spawn points (enemies, obstacles) ----------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HazardSpawnPoint {
    pub anchor_offset: Vec3,
    /// Archetype name; one pool per archetype.
    pub archetype: String,
    #[serde(default)]
    pub always_spawn: bool,
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: f32,
    /// Skip this point while the difficulty bias is below this.
    #[serde(default)]
    pub min_difficulty: f32,
}

impl HazardSpawnPoint {
    pub fn new(archetype: impl Into<String>, anchor_offset: Vec3) -> Self {
        Self {
            anchor_offset,
            archetype: archetype.into(),
            always_spawn: false,
            spawn_chance: default_spawn_chance(),
            min_difficulty: 0.0,
        }
    }

    pub fn always(mut self) -> Self {
        self.always_spawn = true;
        self
    }

    pub fn with_chance(mut self, chance: f32) -> Self {
        self.spawn_chance = chance;
        self
    }
}

fn default_spawn_chance() -> f32 {
    0.5
}

// ---------- Segment template (data form) ----------

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentTemplate {
    /// Unique human-readable name (used for lookup).
    pub name: String,

    /// Extent along the travel axis, in meters.
    pub length: f32,

    /// 0 = easy filler, 1 = hardest content.
    #[serde(default = "default_difficulty_weight")]
    pub difficulty_weight: f32,

    /// May this template follow itself?
    #[serde(default = "default_true")]
    pub allow_consecutive: bool,

    /// When false, evicted instances are dropped instead of pooled.
    #[serde(default = "default_true")]
    pub pooled: bool,

    /// Per-template pre-warm override; `None` uses the streaming config.
    #[serde(default)]
    pub prewarm: Option<usize>,

    #[serde(default)]
    pub collectibles: Vec<CollectibleSpawnPoint>,
    #[serde(default)]
    pub enemies: Vec<HazardSpawnPoint>,
    #[serde(default)]
    pub obstacles: Vec<HazardSpawnPoint>,
}

fn default_difficulty_weight() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}

impl SegmentTemplate {
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        Self {
            name: name.into(),
            length,
            difficulty_weight: default_difficulty_weight(),
            allow_consecutive: true,
            pooled: true,
            prewarm: None,
            collectibles: Vec::new(),
            enemies: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    pub fn with_difficulty(mut self, weight: f32) -> Self {
        self.difficulty_weight = weight;
        self
    }

    pub fn no_repeat(mut self) -> Self {
        self.allow_consecutive = false;
        self
    }

    pub fn unpooled(mut self) -> Self {
        self.pooled = false;
        self
    }

    pub fn with_collectible(mut self, point: CollectibleSpawnPoint) -> Self {
        self.collectibles.push(point);
        self
    }

    pub fn with_enemy(mut self, point: HazardSpawnPoint) -> Self {
        self.enemies.push(point);
        self
    }

    pub fn with_obstacle(mut self, point: HazardSpawnPoint) -> Self {
        self.obstacles.push(point);
        self
    }
}

// ---------- Placed segment ----------

/// One placed (or pooled) copy of a template.
///
/// Canonical pose while pooled: `start == 0`, origin at zero, inactive, no reveal.
#[derive(Debug)]
pub struct SegmentInstance {
    serial: u64,
    template_id: TemplateId,
    template: Arc<SegmentTemplate>,
    start: f32,
    origin: Vec3,
    active: bool,
    reveal: Option<RevealHandle>,
}

impl SegmentInstance {
    pub fn new(serial: u64, template_id: TemplateId, template: Arc<SegmentTemplate>) -> Self {
        Self {
            serial,
            template_id,
            template,
            start: 0.0,
            origin: Vec3::ZERO,
            active: false,
            reveal: None,
        }
    }

    /// Identity of this instance within its pool.
    pub fn serial(&self) -> u64 { self.serial }
    pub fn template_id(&self) -> TemplateId { self.template_id }
    pub fn template(&self) -> &SegmentTemplate { &self.template }
    pub fn length(&self) -> f32 { self.template.length }
    pub fn start(&self) -> f32 { self.start }
    pub fn end(&self) -> f32 { self.start + self.template.length }
    pub fn origin(&self) -> Vec3 { self.origin }
    pub fn is_active(&self) -> bool { self.active }
    pub fn reveal(&self) -> Option<RevealHandle> { self.reveal }

    /// Put the instance on the track with its near edge at `start`.
    pub fn place(&mut self, start: f32) {
        self.start = start;
        self.origin = FORWARD * start;
        self.active = true;
    }

    /// World position of a template-local offset.
    #[inline]
    pub fn world_point(&self, offset: Vec3) -> Vec3 {
        self.origin + offset
    }

    /// Half-open `[start, end)` test on the track axis.
    pub fn contains(&self, coord: f32) -> bool {
        coord >= self.start && coord < self.end()
    }

    pub fn attach_reveal(&mut self, handle: RevealHandle) {
        self.reveal = Some(handle);
    }

    pub fn take_reveal(&mut self) -> Option<RevealHandle> {
        self.reveal.take()
    }

    /// Back to canonical pose. The reveal must already have been cancelled.
    pub fn reset(&mut self) {
        self.start = 0.0;
        self.origin = Vec3::ZERO;
        self.active = false;
        self.reveal = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_and_reset_round_trip() {
        let template = Arc::new(SegmentTemplate::new("flat", 30.0));
        let mut seg = SegmentInstance::new(7, TemplateId(2), template);
        seg.place(60.0);

        assert!(seg.is_active());
        assert_eq!(seg.end(), 90.0);
        assert_eq!(seg.origin(), Vec3::new(0.0, 0.0, 60.0));
        assert!(seg.contains(60.0));
        assert!(!seg.contains(90.0));
        assert_eq!(seg.world_point(Vec3::new(1.0, 0.0, 2.0)), Vec3::new(1.0, 0.0, 62.0));

        seg.reset();
        assert!(!seg.is_active());
        assert_eq!(seg.start(), 0.0);
        assert_eq!(seg.origin(), Vec3::ZERO);
        assert_eq!(seg.reveal(), None);
        assert_eq!(seg.serial(), 7);
    }

    #[test]
    fn groups_draw_from_the_base_pool() {
        assert_eq!(CollectibleKind::CoinGroup.pool_kind(), CollectibleKind::Coin);
        assert_eq!(CollectibleKind::Magnet.pool_kind(), CollectibleKind::Magnet);
        assert!(!CollectibleKind::Coin.is_group());
    }
}
