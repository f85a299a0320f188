// src/spawn/collectibles.rs
//! Pooled collectibles: placement into segment spawn points, one global active
//! list, range queries, positional eviction and the contact (pickup) step.

use std::collections::HashMap;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::patterns::group_positions;
use super::{roll_spawn, ContentSpawner};
use crate::level::core::{CollectibleKind, CollectibleSpawnPoint, SegmentInstance};
use crate::level::pool::{Pool, Retention};

// ---------- Kind → effect table ----------

/// What picking something up does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PickupEffect {
    /// Plain score; the amount is the collectible's `value`.
    Score,
    SpeedBoost { bonus: f32, duration: f32 },
    Magnet { radius: f32, duration: f32 },
    Multiplier { factor: f32, duration: f32 },
}

#[derive(Clone, Copy, Debug)]
pub struct CollectibleSpec {
    pub value: u32,
    /// Pool pre-warm for this kind.
    pub prewarm: usize,
    pub effect: PickupEffect,
}

/// `kind → spec` dispatch. Kinds missing here have no pool of their own and
/// fall back to the base kind.
#[derive(Resource, Clone, Debug)]
pub struct CollectibleTable {
    specs: HashMap<CollectibleKind, CollectibleSpec>,
}

impl Default for CollectibleTable {
    fn default() -> Self {
        let specs = HashMap::from([
            (CollectibleKind::Coin, CollectibleSpec { value: 1, prewarm: 64, effect: PickupEffect::Score }),
            (
                CollectibleKind::SpeedBoost,
                CollectibleSpec {
                    value: 0,
                    prewarm: 4,
                    effect: PickupEffect::SpeedBoost { bonus: 6.0, duration: 3.0 },
                },
            ),
            (
                CollectibleKind::Magnet,
                CollectibleSpec {
                    value: 0,
                    prewarm: 4,
                    effect: PickupEffect::Magnet { radius: 8.0, duration: 6.0 },
                },
            ),
            (
                CollectibleKind::Multiplier,
                CollectibleSpec {
                    value: 0,
                    prewarm: 4,
                    effect: PickupEffect::Multiplier { factor: 2.0, duration: 8.0 },
                },
            ),
        ]);
        Self { specs }
    }
}

impl CollectibleTable {
    pub fn empty() -> Self {
        Self { specs: HashMap::new() }
    }

    pub fn with(mut self, kind: CollectibleKind, spec: CollectibleSpec) -> Self {
        self.specs.insert(kind, spec);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (CollectibleKind, &CollectibleSpec)> + '_ {
        self.specs.iter().map(|(k, s)| (*k, s))
    }
}

// ---------- Pooled entity ----------

/// One collectible. Every kind shares this type; `kind` + `effect` say what it is.
#[derive(Clone, Debug)]
pub struct Collectible {
    serial: u64,
    kind: CollectibleKind,
    value: u32,
    effect: PickupEffect,
    collected: bool,
    position: Vec3,
    /// Seconds since placement.
    age: f32,
}

impl Collectible {
    pub fn new(serial: u64, kind: CollectibleKind, spec: &CollectibleSpec) -> Self {
        Self {
            serial,
            kind,
            value: spec.value,
            effect: spec.effect,
            collected: false,
            position: Vec3::ZERO,
            age: 0.0,
        }
    }

    pub fn serial(&self) -> u64 { self.serial }
    pub fn kind(&self) -> CollectibleKind { self.kind }
    pub fn is_collected(&self) -> bool { self.collected }
    pub fn position(&self) -> Vec3 { self.position }
    pub fn age(&self) -> f32 { self.age }

    /// Canonical pooled state.
    pub fn reset(&mut self) {
        self.collected = false;
        self.position = Vec3::ZERO;
        self.age = 0.0;
    }
}

/// Emitted by the contact step for every collectible touched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pickup {
    pub serial: u64,
    pub kind: CollectibleKind,
    pub value: u32,
    pub effect: PickupEffect,
    pub position: Vec3,
}

// ---------- Spawner ----------

#[derive(Resource)]
pub struct CollectibleSpawner {
    pools: Pool<CollectibleKind, Collectible>,
    active: Vec<Collectible>,
    rng: ChaCha8Rng,
}

impl CollectibleSpawner {
    /// Pools are pre-warmed eagerly for every kind in `table`.
    pub fn new(table: &CollectibleTable, seed: u64) -> Self {
        let mut pools = Pool::new("Collectibles");
        for (kind, spec) in table.iter() {
            let spec = *spec;
            pools.register(kind, Retention::Recycle { prewarm: spec.prewarm }, move |serial| {
                Collectible::new(serial, kind, &spec)
            });
        }
        Self {
            pools,
            active: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed ^ 0xC01D_C0DE_5EED_0001u64),
        }
    }

    /// Populate every collectible spawn point of `segment`. Returns how many were placed.
    pub fn populate(&mut self, segment: &SegmentInstance) -> usize {
        let mut placed = 0;
        for point in &segment.template().collectibles {
            if !roll_spawn(&mut self.rng, point.always_spawn, point.spawn_chance) {
                continue;
            }
            placed += self.spawn_point(segment, point);
        }
        placed
    }

    fn spawn_point(&mut self, segment: &SegmentInstance, point: &CollectibleSpawnPoint) -> usize {
        let anchor = segment.world_point(point.anchor_offset);

        if point.kind.is_group() {
            let mut placed = 0;
            for position in group_positions(anchor, &point.group) {
                let Some(item) = self.pools.acquire(&point.kind.pool_kind()) else {
                    debug!("Collectibles: no pool for group coins in '{}'", segment.template().name);
                    break;
                };
                self.place(item, position);
                placed += 1;
            }
            return placed;
        }

        match self.acquire_kind(point.kind) {
            Some(item) => {
                self.place(item, anchor);
                1
            }
            None => {
                debug!(
                    "Collectibles: no pool for {:?} (nor fallback) in '{}', skipping",
                    point.kind,
                    segment.template().name
                );
                0
            }
        }
    }

    /// Own pool first, then the base kind's pool.
    fn acquire_kind(&mut self, kind: CollectibleKind) -> Option<Collectible> {
        self.pools.acquire(&kind).or_else(|| {
            if kind == CollectibleKind::BASE {
                None
            } else {
                self.pools.acquire(&CollectibleKind::BASE)
            }
        })
    }

    fn place(&mut self, mut item: Collectible, position: Vec3) {
        item.position = position;
        self.active.push(item);
    }

    fn release(&mut self, mut item: Collectible) {
        item.reset();
        let kind = item.kind;
        self.pools.release(&kind, item);
    }

    /// Return every collectible behind `coord` (track axis). Returns the count.
    pub fn release_before(&mut self, coord: f32) -> usize {
        let mut released = 0;
        for i in (0..self.active.len()).rev() {
            if self.active[i].position.z < coord {
                let item = self.active.remove(i);
                self.release(item);
                released += 1;
            }
        }
        released
    }

    pub fn release_all(&mut self) -> usize {
        let drained: Vec<Collectible> = self.active.drain(..).collect();
        let n = drained.len();
        for item in drained {
            self.release(item);
        }
        n
    }

    /// Process teardown: drop the active list and every pool.
    pub fn teardown(&mut self) {
        self.active.clear();
        self.pools.clear();
    }

    /// Non-collected instances within `radius` of `position`. Linear scan; the
    /// active list is bounded by the streaming window.
    pub fn query_in_range(&self, position: Vec3, radius: f32) -> Vec<&Collectible> {
        let r2 = radius * radius;
        self.active
            .iter()
            .filter(|c| !c.collected && c.position.distance_squared(position) <= r2)
            .collect()
    }

    /// Contact step: mark everything within `radius` collected and report it.
    /// Collected items stay in the active list (hidden) until they fall behind.
    pub fn contacts(&mut self, position: Vec3, radius: f32) -> Vec<Pickup> {
        let r2 = radius * radius;
        self.active
            .iter_mut()
            .filter(|c| !c.collected && c.position.distance_squared(position) <= r2)
            .map(|c| {
                c.collected = true;
                Pickup {
                    serial: c.serial,
                    kind: c.kind,
                    value: c.value,
                    effect: c.effect,
                    position: c.position,
                }
            })
            .collect()
    }

    /// Magnet: pull uncollected base coins within `radius` toward `target`.
    pub fn attract(&mut self, target: Vec3, radius: f32, speed: f32, dt: f32) {
        let r2 = radius * radius;
        let step = speed * dt;
        for c in self.active.iter_mut() {
            if c.collected || c.kind != CollectibleKind::BASE {
                continue;
            }
            let to = target - c.position;
            let d2 = to.length_squared();
            if d2 > r2 {
                continue;
            }
            if d2 <= step * step {
                c.position = target;
            } else {
                c.position += to.normalize_or_zero() * step;
            }
        }
    }

    pub fn tick_age(&mut self, dt: f32) {
        for c in self.active.iter_mut() {
            c.age += dt;
        }
    }

    pub fn active(&self) -> &[Collectible] {
        &self.active
    }

    pub fn pools(&self) -> &Pool<CollectibleKind, Collectible> {
        &self.pools
    }
}

impl ContentSpawner for CollectibleSpawner {
    fn spawn_for_segment(&mut self, segment: &SegmentInstance, _difficulty_bias: f32) {
        self.populate(segment);
    }

    fn despawn_before(&mut self, coord: f32) {
        self.release_before(coord);
    }

    fn despawn_all(&mut self) {
        self.release_all();
    }
}
