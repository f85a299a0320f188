// src/runner/systems.rs

use bevy::prelude::*;

use crate::level::core::{CollectibleKind, FORWARD};
use crate::level::{RestartRun, StreamFocus};
use crate::runner::components::{ActiveEffects, CollectibleCollected, HazardHit, RunScore, Runner};
use crate::setup::{MainCamera, CAMERA_OFFSET};
use crate::spawn::{CollectibleSpawner, HazardSpawners};

/// Runner's resting height above the track.
pub const RUNNER_HEIGHT: f32 = 0.5;
/// Magnet pull, units per second.
pub const MAGNET_PULL_SPEED: f32 = 20.0;

/// Spawns the runner capsule at the track origin. It is the stream focus.
pub fn spawn_runner(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mesh = meshes.add(Capsule3d::new(0.4, 0.8));
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb_u8(124, 144, 255),
        ..default()
    });

    commands.spawn((
        Mesh3d(mesh),
        MeshMaterial3d(material),
        Transform::from_translation(Vec3::Y * RUNNER_HEIGHT),
        Runner::default(),
        StreamFocus,
    ));
}

/// Moves the runner forward along the track at its current speed.
pub fn advance_runner(
    time: Res<Time>,
    effects: Res<ActiveEffects>,
    mut score: ResMut<RunScore>,
    mut query: Query<(&mut Transform, &mut Runner)>,
) {
    let dt = time.delta_secs();
    for (mut tf, mut runner) in query.iter_mut() {
        runner.speed = runner.base_speed + effects.speed_bonus();
        tf.translation += FORWARD * (runner.speed * dt);
        score.distance = score.distance.max(tf.translation.dot(FORWARD));
    }
}

/// Contact step: everything inside the pickup radius is collected.
pub fn collect_pickups(
    mut collectibles: ResMut<CollectibleSpawner>,
    query: Query<(&Transform, &Runner)>,
    mut collected: EventWriter<CollectibleCollected>,
) {
    for (tf, runner) in query.iter() {
        for pickup in collectibles.contacts(tf.translation, runner.pickup_radius) {
            trace!("Runner: picked up {:?} #{}", pickup.kind, pickup.serial);
            collected.write(CollectibleCollected(pickup));
        }
    }
}

pub fn detect_hits(
    mut hazards: ResMut<HazardSpawners>,
    query: Query<(&Transform, &Runner)>,
    mut hits: EventWriter<HazardHit>,
) {
    let HazardSpawners { enemies, obstacles } = &mut *hazards;
    for (tf, runner) in query.iter() {
        let pos = tf.translation;
        let touched = enemies
            .hits(pos, runner.hit_radius)
            .into_iter()
            .chain(obstacles.hits(pos, runner.hit_radius));
        for (serial, archetype) in touched {
            debug!("Runner: hit '{}' #{} at {:.1}", archetype, serial, pos.z);
            hits.write(HazardHit { archetype, position: pos });
        }
    }
}

/// Score and effects from this frame's pickups and hits.
pub fn apply_pickups(
    mut collected: EventReader<CollectibleCollected>,
    mut hits: EventReader<HazardHit>,
    mut score: ResMut<RunScore>,
    mut effects: ResMut<ActiveEffects>,
) {
    for CollectibleCollected(pickup) in collected.read() {
        if pickup.kind == CollectibleKind::Coin {
            score.coins += 1;
        }
        score.score += (pickup.value as f32 * effects.score_factor()).round() as u64;
        effects.apply(pickup.effect);
    }
    for hit in hits.read() {
        score.hits += 1;
        info!(
            "Runner: hit by '{}' at z={:.1} (total {})",
            hit.archetype, hit.position.z, score.hits
        );
    }
}

pub fn tick_effects(time: Res<Time>, mut effects: ResMut<ActiveEffects>) {
    effects.tick(time.delta());
}

/// Magnet: pull nearby coins toward the runner while the effect lasts.
pub fn attract_coins(
    time: Res<Time>,
    effects: Res<ActiveEffects>,
    mut collectibles: ResMut<CollectibleSpawner>,
    query: Query<&Transform, With<Runner>>,
) {
    let Some(radius) = effects.magnet_radius() else {
        return;
    };
    let dt = time.delta_secs();
    for tf in query.iter() {
        collectibles.attract(tf.translation, radius, MAGNET_PULL_SPEED, dt);
    }
}

/// Back to the restart point with a clean score and no effects.
pub fn reset_runner_on_restart(
    mut restarts: EventReader<RestartRun>,
    mut score: ResMut<RunScore>,
    mut effects: ResMut<ActiveEffects>,
    mut query: Query<(&mut Transform, &mut Runner)>,
) {
    let Some(restart) = restarts.read().last().copied() else {
        return;
    };
    for (mut tf, mut runner) in query.iter_mut() {
        tf.translation = FORWARD * restart.start + Vec3::Y * RUNNER_HEIGHT;
        runner.speed = runner.base_speed;
    }
    *score = RunScore { distance: restart.start, ..default() };
    effects.clear();
}

/// Keeps the camera trailing the runner.
pub fn follow_camera(
    runner: Query<&Transform, (With<Runner>, Without<MainCamera>)>,
    mut camera: Query<&mut Transform, With<MainCamera>>,
) {
    let (Ok(target), Ok(mut cam)) = (runner.single(), camera.single_mut()) else {
        return;
    };
    cam.translation = target.translation + CAMERA_OFFSET;
    cam.look_at(target.translation + FORWARD * 10.0, Vec3::Y);
}
