// src/level/generator.rs
//! The streaming orchestrator.
//!
//! Keeps a contiguous run of segments alive around a moving reference point:
//! appends at the tail while the window needs more track, evicts from the head
//! once a segment falls fully behind. Active segments are tail-insert /
//! head-evict only, so the list stays sorted and eviction only looks at the head.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bevy::prelude::*;

use super::config::StreamingConfig;
use super::core::{SegmentInstance, SegmentTemplate, TemplateId};
use super::pool::{Pool, Retention};
use super::provider::TemplateProvider;
use super::reveal::RevealScheduler;
use crate::spawn::ContentSpawner;

/// Running counters, mostly for logs and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    pub spawned: u64,
    pub evicted: u64,
    pub provider_misses: u64,
    pub cap_hits: u64,
    pub resets: u64,
}

#[derive(Resource)]
pub struct LevelGenerator {
    config: StreamingConfig,
    pool: Pool<TemplateId, SegmentInstance>,
    active: VecDeque<SegmentInstance>,
    next_spawn_coord: f32,
    last_template: Option<TemplateId>,
    reveals: RevealScheduler,
    stats: StreamingStats,
    /// Set while the provider keeps answering `None`, so we warn once per streak.
    provider_dry: bool,
}

impl LevelGenerator {
    pub fn new(config: StreamingConfig) -> Self {
        let reveals = RevealScheduler::new(config.reveal.duration);
        Self {
            config,
            pool: Pool::new("Segments"),
            active: VecDeque::new(),
            next_spawn_coord: 0.0,
            last_template: None,
            reveals,
            stats: StreamingStats::default(),
            provider_dry: false,
        }
    }

    // ---------- Public contract ----------

    /// Lay down the initial window back-to-back from coordinate 0.
    pub fn initialize(
        &mut self,
        provider: &mut dyn TemplateProvider,
        spawners: &mut [&mut dyn ContentSpawner],
    ) {
        self.populate_initial(0.0, provider, spawners);
    }

    /// Per-frame window maintenance around `reference` (track coordinate).
    pub fn tick(
        &mut self,
        reference: f32,
        provider: &mut dyn TemplateProvider,
        spawners: &mut [&mut dyn ContentSpawner],
    ) {
        let ahead = reference + self.config.view_distance;
        let behind = reference - self.config.despawn_distance;

        // Spawn phase (bounded).
        let cap = self.config.max_spawns_per_tick;
        let mut iterations = 0;
        while self.next_spawn_coord < ahead && iterations < cap {
            iterations += 1;
            if !self.spawn_next(provider, spawners, 0.0) {
                break;
            }
        }
        if iterations >= cap && self.next_spawn_coord < ahead {
            self.stats.cap_hits += 1;
            warn!(
                "Level: spawn cap ({}) hit at {:.1} with window edge at {:.1}; resuming next tick",
                cap, self.next_spawn_coord, ahead
            );
        }

        // Evict phase: head only.
        while self.active.front().is_some_and(|s| s.end() < behind) {
            if let Some(segment) = self.active.pop_front() {
                self.evict(segment);
            }
        }

        // Content can outlive its segment (e.g. a coin pulled by a magnet).
        for spawner in spawners.iter_mut() {
            spawner.despawn_before(behind);
        }
    }

    /// Flush everything and rebuild the initial window at `start`. Never partial.
    pub fn reset(
        &mut self,
        start: f32,
        provider: &mut dyn TemplateProvider,
        spawners: &mut [&mut dyn ContentSpawner],
    ) {
        let flushed = self.active.len();
        while let Some(segment) = self.active.pop_front() {
            self.evict(segment);
        }
        for spawner in spawners.iter_mut() {
            spawner.despawn_all();
        }
        self.reveals.clear();
        self.last_template = None;
        self.provider_dry = false;
        provider.reset();
        self.stats.resets += 1;

        info!("Level: reset at {:.1} (flushed {} segments)", start, flushed);
        self.populate_initial(start, provider, spawners);
    }

    /// Process teardown: drop every segment and every pooled instance.
    /// Unlike `reset`, nothing is rebuilt and pool keys are forgotten.
    pub fn teardown(&mut self) {
        let live = self.active.len();
        self.active.clear();
        self.reveals.clear();
        self.pool.clear();
        self.next_spawn_coord = 0.0;
        self.last_template = None;
        info!("Level: torn down ({} live segments dropped)", live);
    }

    /// Advance reveal animations; purely cosmetic.
    pub fn advance_reveals(&mut self, dt: Duration) -> usize {
        self.reveals.advance(dt)
    }

    // ---------- Queries ----------

    pub fn active_segments(&self) -> &VecDeque<SegmentInstance> {
        &self.active
    }

    pub fn next_spawn_coord(&self) -> f32 {
        self.next_spawn_coord
    }

    /// The active segment covering `coord`, if any.
    pub fn segment_at(&self, coord: f32) -> Option<&SegmentInstance> {
        let ix = self.active.partition_point(|s| s.end() <= coord);
        self.active.get(ix).filter(|s| s.contains(coord))
    }

    pub fn stats(&self) -> StreamingStats {
        self.stats
    }

    pub fn reveals(&self) -> &RevealScheduler {
        &self.reveals
    }

    pub fn pool(&self) -> &Pool<TemplateId, SegmentInstance> {
        &self.pool
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    // ---------- Internals ----------

    fn populate_initial(
        &mut self,
        start: f32,
        provider: &mut dyn TemplateProvider,
        spawners: &mut [&mut dyn ContentSpawner],
    ) {
        self.next_spawn_coord = start;
        let reveal = self.config.reveal;
        let mut placed = 0;
        for index in 0..self.config.initial_segment_count {
            if !self.spawn_next(provider, spawners, reveal.initial_delay(index)) {
                break;
            }
            placed += 1;
        }
        info!(
            "Level: initial window [{:.1}, {:.1}) with {} segments",
            start, self.next_spawn_coord, placed
        );
    }

    /// Place one segment at the tail. False when the provider had nothing.
    fn spawn_next(
        &mut self,
        provider: &mut dyn TemplateProvider,
        spawners: &mut [&mut dyn ContentSpawner],
        reveal_delay: f32,
    ) -> bool {
        let Some((id, template)) = provider.next_segment(self.last_template) else {
            self.stats.provider_misses += 1;
            if !self.provider_dry {
                self.provider_dry = true;
                warn!(
                    "Level: no template available at {:.1}; retrying next tick",
                    self.next_spawn_coord
                );
            }
            return false;
        };
        self.provider_dry = false;

        let mut segment = self.acquire_segment(id, &template);
        segment.place(self.next_spawn_coord);

        let bias = provider.current_difficulty_multiplier();
        for spawner in spawners.iter_mut() {
            spawner.spawn_for_segment(&segment, bias);
        }

        segment.attach_reveal(self.reveals.schedule(reveal_delay));

        debug!(
            "Level: placed '{}' #{} at [{:.1}, {:.1}) bias {:.2}",
            template.name,
            segment.serial(),
            segment.start(),
            segment.end(),
            bias
        );

        self.next_spawn_coord += segment.length();
        self.last_template = Some(id);
        self.active.push_back(segment);
        self.stats.spawned += 1;
        true
    }

    fn acquire_segment(&mut self, id: TemplateId, template: &Arc<SegmentTemplate>) -> SegmentInstance {
        let retention = if template.pooled {
            Retention::Recycle { prewarm: template.prewarm.unwrap_or(self.config.segment_prewarm) }
        } else {
            Retention::Discard
        };
        self.pool.acquire_or_register(&id, retention, || {
            let shared = Arc::clone(template);
            move |serial| SegmentInstance::new(serial, id, Arc::clone(&shared))
        })
    }

    fn evict(&mut self, mut segment: SegmentInstance) {
        if let Some(handle) = segment.take_reveal() {
            self.reveals.cancel(handle);
        }
        debug!(
            "Level: evicting '{}' #{} [{:.1}, {:.1})",
            segment.template().name,
            segment.serial(),
            segment.start(),
            segment.end()
        );
        let id = segment.template_id();
        segment.reset();
        self.pool.release(&id, segment);
        self.stats.evicted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::core::{CollectibleKind, CollectibleSpawnPoint};
    use crate::spawn::{CollectibleSpawner, CollectibleTable};

    /// Hands out the same template forever (or nothing while `dry`).
    struct Fixed {
        template: Arc<SegmentTemplate>,
        dry: bool,
        calls: u32,
        resets: u32,
    }

    impl Fixed {
        fn new(length: f32) -> Self {
            Self {
                template: Arc::new(SegmentTemplate::new("fixed", length)),
                dry: false,
                calls: 0,
                resets: 0,
            }
        }
    }

    impl TemplateProvider for Fixed {
        fn next_segment(&mut self, _last: Option<TemplateId>) -> Option<(TemplateId, Arc<SegmentTemplate>)> {
            self.calls += 1;
            if self.dry {
                return None;
            }
            Some((TemplateId(0), Arc::clone(&self.template)))
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    /// Records what the generator asks of it.
    #[derive(Default)]
    struct Recorder {
        spawned: Vec<(f32, f32)>,
        despawn_before: Vec<f32>,
        despawn_all: u32,
    }

    impl ContentSpawner for Recorder {
        fn spawn_for_segment(&mut self, segment: &SegmentInstance, bias: f32) {
            self.spawned.push((segment.start(), bias));
        }
        fn despawn_before(&mut self, coord: f32) {
            self.despawn_before.push(coord);
        }
        fn despawn_all(&mut self) {
            self.despawn_all += 1;
        }
    }

    fn config(initial: usize, view: f32, despawn: f32) -> StreamingConfig {
        StreamingConfig {
            view_distance: view,
            despawn_distance: despawn,
            initial_segment_count: initial,
            ..Default::default()
        }
    }

    fn spans(generator: &LevelGenerator) -> Vec<(f32, f32)> {
        generator.active_segments().iter().map(|s| (s.start(), s.end())).collect()
    }

    fn assert_tiled(generator: &LevelGenerator) {
        let segs = generator.active_segments();
        for pair in segs.iter().collect::<Vec<_>>().windows(2) {
            assert!(pair[0].start() < pair[1].start(), "not strictly increasing");
            assert_eq!(pair[0].end(), pair[1].start(), "gap or overlap");
        }
        if let Some(last) = segs.back() {
            assert_eq!(last.end(), generator.next_spawn_coord());
        }
    }

    #[test]
    fn initialize_lays_five_segments_from_zero() {
        let mut generator = LevelGenerator::new(config(5, 100.0, 30.0));
        let mut provider = Fixed::new(30.0);
        let mut rec = Recorder::default();

        generator.initialize(&mut provider, &mut [&mut rec]);

        assert_eq!(
            spans(&generator),
            vec![(0.0, 30.0), (30.0, 60.0), (60.0, 90.0), (90.0, 120.0), (120.0, 150.0)]
        );
        assert_eq!(generator.next_spawn_coord(), 150.0);
        assert_eq!(rec.spawned.len(), 5);
        assert!(generator.active_segments().iter().all(|s| s.is_active()));
    }

    #[test]
    fn tick_evicts_everything_ending_behind_the_threshold() {
        let mut generator = LevelGenerator::new(config(5, 100.0, 30.0));
        let mut provider = Fixed::new(30.0);
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);

        generator.tick(200.0, &mut provider, &mut [&mut rec]);

        // behind = 170: [0,30) .. [120,150) are gone, [150,180) survives.
        assert!(generator.active_segments().iter().all(|s| s.end() >= 170.0));
        assert_eq!(generator.active_segments().front().map(|s| s.start()), Some(150.0));
        // ahead = 300
        assert!(generator.next_spawn_coord() >= 300.0);
        assert_eq!(rec.despawn_before, vec![170.0]);
        assert_eq!(generator.stats().evicted, 5);
        assert_tiled(&generator);
    }

    #[test]
    fn segment_ending_exactly_at_threshold_survives() {
        let mut generator = LevelGenerator::new(config(3, 10.0, 10.0));
        let mut provider = Fixed::new(10.0);
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);

        // behind = 10: [0,10) ends exactly at the threshold and stays.
        generator.tick(20.0, &mut provider, &mut [&mut rec]);
        assert_eq!(generator.active_segments().front().map(|s| s.start()), Some(0.0));

        generator.tick(20.5, &mut provider, &mut [&mut rec]);
        assert_eq!(generator.active_segments().front().map(|s| s.start()), Some(10.0));
    }

    #[test]
    fn tiling_holds_over_a_long_run_with_mixed_lengths() {
        let catalog = crate::level::catalog::SegmentCatalog::builtin();
        let mut provider = crate::level::provider::CatalogProvider::new(&catalog, 11);
        let mut generator = LevelGenerator::new(config(5, 120.0, 25.0));
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);

        let mut z = 0.0;
        for _ in 0..2_000 {
            z += 1.7;
            generator.tick(z, &mut provider, &mut [&mut rec]);
            assert_tiled(&generator);
            assert!(generator.next_spawn_coord() >= z + 120.0);
            if let Some(head) = generator.active_segments().front() {
                assert!(head.end() >= z - 25.0);
            }
        }
        assert!(generator.segment_at(z).is_some());
    }

    #[test]
    fn null_template_aborts_spawn_phase_and_retries() {
        let mut generator = LevelGenerator::new(config(2, 50.0, 10.0));
        let mut provider = Fixed::new(10.0);
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);
        assert_eq!(generator.next_spawn_coord(), 20.0);

        provider.dry = true;
        let before = provider.calls;
        generator.tick(0.0, &mut provider, &mut [&mut rec]);
        assert_eq!(provider.calls - before, 1, "one attempt, then the phase stops");
        assert_eq!(generator.next_spawn_coord(), 20.0);
        assert_eq!(generator.stats().provider_misses, 1);

        provider.dry = false;
        generator.tick(0.0, &mut provider, &mut [&mut rec]);
        assert_eq!(generator.next_spawn_coord(), 50.0);
        assert_tiled(&generator);
    }

    #[test]
    fn zero_length_template_is_bounded_by_the_cap() {
        let mut cfg = config(0, 50.0, 10.0);
        cfg.max_spawns_per_tick = 50;
        let mut generator = LevelGenerator::new(cfg);
        let mut provider = Fixed::new(0.0);
        let mut rec = Recorder::default();

        generator.tick(0.0, &mut provider, &mut [&mut rec]);
        assert_eq!(provider.calls, 50);
        assert_eq!(generator.active_segments().len(), 50);
        assert_eq!(generator.stats().cap_hits, 1);

        generator.tick(0.0, &mut provider, &mut [&mut rec]);
        assert_eq!(provider.calls, 100);
    }

    #[test]
    fn evicted_segments_are_reused_from_the_pool() {
        let mut cfg = config(4, 20.0, 5.0);
        cfg.segment_prewarm = 0;
        let mut generator = LevelGenerator::new(cfg);
        let mut provider = Fixed::new(10.0);
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);
        assert_eq!(generator.pool().created_count(&TemplateId(0)), 4);

        let first_serial = generator.active_segments()[0].serial();
        // behind = 15 evicts [0,10); ahead = 40 needs nothing new.
        generator.tick(20.0, &mut provider, &mut [&mut rec]);
        assert_eq!(generator.pool().free_count(&TemplateId(0)), 1);

        // Needing one more segment pulls the evicted one back out.
        generator.tick(21.0, &mut provider, &mut [&mut rec]);
        let tail = generator.active_segments().back().unwrap();
        assert_eq!(tail.serial(), first_serial);
        assert_eq!(tail.start(), 40.0);
        assert!(tail.is_active());
        assert_eq!(generator.pool().created_count(&TemplateId(0)), 4);
    }

    #[test]
    fn unpooled_templates_are_dropped_on_evict() {
        let mut generator = LevelGenerator::new(config(2, 10.0, 0.0));
        let mut provider = Fixed::new(10.0);
        provider.template = Arc::new(SegmentTemplate::new("oneshot", 10.0).unpooled());
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);

        generator.tick(15.0, &mut provider, &mut [&mut rec]);
        assert_eq!(generator.stats().evicted, 1);
        assert_eq!(generator.pool().free_count(&TemplateId(0)), 0);
    }

    #[test]
    fn initial_window_is_staggered_and_steady_state_is_not() {
        let mut generator = LevelGenerator::new(config(3, 30.0, 10.0));
        let mut provider = Fixed::new(10.0);
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);

        let reveal = generator.config().reveal;
        let delays: Vec<f32> = generator
            .active_segments()
            .iter()
            .filter_map(|s| s.reveal())
            .map(|h| generator.reveals().remaining_delay(h))
            .collect();
        assert_eq!(delays.len(), 3);
        for (i, d) in delays.iter().enumerate() {
            assert!((d - reveal.initial_delay(i)).abs() < 1e-4, "delay {i}: {d}");
        }

        generator.tick(5.0, &mut provider, &mut [&mut rec]);
        let tail = generator.active_segments().back().unwrap();
        let handle = tail.reveal().unwrap();
        assert_eq!(generator.reveals().remaining_delay(handle), 0.0);
        assert!(generator.reveals().is_in_flight(handle));
    }

    #[test]
    fn eviction_cancels_in_flight_reveals() {
        let mut generator = LevelGenerator::new(config(3, 10.0, 0.0));
        let mut provider = Fixed::new(10.0);
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);
        let head = generator.active_segments()[0].reveal().unwrap();
        assert!(generator.reveals().is_in_flight(head));

        generator.tick(11.0, &mut provider, &mut [&mut rec]);
        assert!(!generator.reveals().is_in_flight(head));
    }

    #[test]
    fn reset_flushes_and_regenerates_at_start() {
        let mut generator = LevelGenerator::new(config(3, 40.0, 10.0));
        let mut provider = Fixed::new(20.0);
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);
        for z in [10.0, 50.0, 90.0] {
            generator.tick(z, &mut provider, &mut [&mut rec]);
        }

        generator.reset(500.0, &mut provider, &mut [&mut rec]);

        assert_eq!(spans(&generator), vec![(500.0, 520.0), (520.0, 540.0), (540.0, 560.0)]);
        assert_eq!(generator.next_spawn_coord(), 560.0);
        assert_eq!(rec.despawn_all, 1);
        assert_eq!(provider.resets, 1);
        assert_eq!(generator.reveals().in_flight(), 3);
        assert_eq!(generator.stats().resets, 1);
        assert!(generator.segment_at(510.0).is_some());
        assert!(generator.segment_at(100.0).is_none());
    }

    #[test]
    fn spawners_receive_the_difficulty_bias() {
        struct Biased(Fixed);
        impl TemplateProvider for Biased {
            fn next_segment(&mut self, last: Option<TemplateId>) -> Option<(TemplateId, Arc<SegmentTemplate>)> {
                self.0.next_segment(last)
            }
            fn current_difficulty_multiplier(&self) -> f32 {
                1.75
            }
        }

        let mut generator = LevelGenerator::new(config(2, 10.0, 10.0));
        let mut provider = Biased(Fixed::new(10.0));
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);
        assert_eq!(rec.spawned, vec![(0.0, 1.75), (10.0, 1.75)]);
    }

    #[test]
    fn collectibles_follow_segments_out_of_the_window() {
        let mut generator = LevelGenerator::new(config(3, 10.0, 5.0));
        let mut provider = Fixed::new(10.0);
        provider.template = Arc::new(SegmentTemplate::new("coins", 10.0).with_collectible(
            CollectibleSpawnPoint::new(CollectibleKind::Coin, Vec3::new(0.0, 0.5, 5.0)).always(),
        ));
        let mut coins = CollectibleSpawner::new(&CollectibleTable::default(), 5);
        generator.initialize(&mut provider, &mut [&mut coins]);
        assert_eq!(coins.active().len(), 3);

        // behind = 12: the coin at z=5 goes, the one at z=15 stays; ahead = 27 needs nothing new.
        generator.tick(17.0, &mut provider, &mut [&mut coins]);
        assert!(coins.active().iter().all(|c| c.position().z >= 12.0));
        assert_eq!(coins.active().len(), 2);
    }

    #[test]
    fn teardown_empties_the_window_and_forgets_pools() {
        let mut generator = LevelGenerator::new(config(3, 10.0, 5.0));
        let mut provider = Fixed::new(10.0);
        let mut rec = Recorder::default();
        generator.initialize(&mut provider, &mut [&mut rec]);
        assert!(generator.pool().is_registered(&TemplateId(0)));
        assert_eq!(generator.reveals().in_flight(), 3);

        generator.teardown();

        assert!(generator.active_segments().is_empty());
        assert_eq!(generator.reveals().in_flight(), 0);
        assert!(!generator.pool().is_registered(&TemplateId(0)));
        assert_eq!(generator.next_spawn_coord(), 0.0);
    }
}
