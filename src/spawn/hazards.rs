// src/spawn/hazards.rs
//! Enemies and obstacles. Both are "archetype at an anchor" with a difficulty
//! gate; one spawner per class, pools keyed by archetype name.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{roll_spawn, ContentSpawner};
use crate::level::core::{HazardSpawnPoint, SegmentInstance, SegmentTemplate};
use crate::level::pool::{Pool, Retention};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HazardClass {
    Enemy,
    Obstacle,
}

impl HazardClass {
    /// The template's spawn points for this class.
    pub fn points(self, template: &SegmentTemplate) -> &[HazardSpawnPoint] {
        match self {
            HazardClass::Enemy => &template.enemies,
            HazardClass::Obstacle => &template.obstacles,
        }
    }

    fn label(self) -> &'static str {
        match self {
            HazardClass::Enemy => "Enemies",
            HazardClass::Obstacle => "Obstacles",
        }
    }

    fn seed_mix(self) -> u64 {
        match self {
            HazardClass::Enemy => 0xE7E7_1E55_0000_0002,
            HazardClass::Obstacle => 0x0B57_AC1E_0000_0003,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Hazard {
    serial: u64,
    archetype: String,
    position: Vec3,
    /// Cleared once the runner has been hit by it.
    armed: bool,
}

impl Hazard {
    fn new(serial: u64, archetype: String) -> Self {
        Self { serial, archetype, position: Vec3::ZERO, armed: false }
    }

    pub fn position(&self) -> Vec3 { self.position }
    pub fn is_armed(&self) -> bool { self.armed }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.armed = false;
    }
}

pub struct HazardSpawner {
    class: HazardClass,
    prewarm: usize,
    pools: Pool<String, Hazard>,
    active: Vec<Hazard>,
    rng: ChaCha8Rng,
}

impl HazardSpawner {
    /// Archetype pools are registered on first reference, each pre-warmed with `prewarm`.
    pub fn new(class: HazardClass, prewarm: usize, seed: u64) -> Self {
        Self {
            class,
            prewarm,
            pools: Pool::new(class.label()),
            active: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed ^ class.seed_mix()),
        }
    }

    /// Populate this class's spawn points. Points with `min_difficulty` above
    /// `bias` are skipped; the rest roll with `min(1, chance * bias)`.
    pub fn populate(&mut self, segment: &SegmentInstance, bias: f32) -> usize {
        let mut placed = 0;
        for point in self.class.points(segment.template()) {
            if bias < point.min_difficulty {
                continue;
            }
            let chance = (point.spawn_chance * bias).min(1.0);
            if !roll_spawn(&mut self.rng, point.always_spawn, chance) {
                continue;
            }

            let prewarm = self.prewarm;
            let mut hazard = self.pools.acquire_or_register(
                &point.archetype,
                Retention::Recycle { prewarm },
                || {
                    let archetype = point.archetype.clone();
                    move |serial| Hazard::new(serial, archetype.clone())
                },
            );
            hazard.position = segment.world_point(point.anchor_offset);
            hazard.armed = true;
            self.active.push(hazard);
            placed += 1;
        }
        placed
    }

    fn release(&mut self, mut hazard: Hazard) {
        hazard.reset();
        let key = hazard.archetype.clone();
        self.pools.release(&key, hazard);
    }

    pub fn release_before(&mut self, coord: f32) -> usize {
        let mut released = 0;
        for i in (0..self.active.len()).rev() {
            if self.active[i].position.z < coord {
                let hazard = self.active.remove(i);
                self.release(hazard);
                released += 1;
            }
        }
        released
    }

    pub fn release_all(&mut self) -> usize {
        let drained: Vec<Hazard> = self.active.drain(..).collect();
        let n = drained.len();
        for hazard in drained {
            self.release(hazard);
        }
        n
    }

    /// Armed hazards within `radius` of `position`; they are disarmed so a
    /// single hit is only reported once.
    pub fn hits(&mut self, position: Vec3, radius: f32) -> Vec<(u64, String)> {
        let r2 = radius * radius;
        self.active
            .iter_mut()
            .filter(|h| h.armed && h.position.distance_squared(position) <= r2)
            .map(|h| {
                h.disarm();
                (h.serial, h.archetype.clone())
            })
            .collect()
    }

    /// Process teardown: drop the active list and every archetype pool.
    pub fn teardown(&mut self) {
        self.active.clear();
        self.pools.clear();
    }

    pub fn active(&self) -> &[Hazard] {
        &self.active
    }

    pub fn pools(&self) -> &Pool<String, Hazard> {
        &self.pools
    }
}

impl ContentSpawner for HazardSpawner {
    fn spawn_for_segment(&mut self, segment: &SegmentInstance, difficulty_bias: f32) {
        self.populate(segment, difficulty_bias);
    }

    fn despawn_before(&mut self, coord: f32) {
        self.release_before(coord);
    }

    fn despawn_all(&mut self) {
        self.release_all();
    }
}

/// Both hazard spawners, as one resource.
#[derive(Resource)]
pub struct HazardSpawners {
    pub enemies: HazardSpawner,
    pub obstacles: HazardSpawner,
}

impl HazardSpawners {
    pub fn new(prewarm: usize, seed: u64) -> Self {
        Self {
            enemies: HazardSpawner::new(HazardClass::Enemy, prewarm, seed),
            obstacles: HazardSpawner::new(HazardClass::Obstacle, prewarm, seed),
        }
    }

    pub fn active_count(&self) -> usize {
        self.enemies.active().len() + self.obstacles.active().len()
    }

    pub fn teardown(&mut self) {
        self.enemies.teardown();
        self.obstacles.teardown();
    }
}
