//! Gizmo overlay for the streaming window. Off by default; F3 toggles it.

use bevy::ecs::schedule::common_conditions::resource_exists;
use bevy::prelude::*;

use super::core::{FORWARD, LATERAL, UP};
use super::generator::LevelGenerator;
use crate::spawn::{CollectibleSpawner, HazardSpawners};

/// Half-width of the drawn track.
const TRACK_HALF_WIDTH: f32 = 4.0;
const MARKER: f32 = 0.3;
const BOB_HEIGHT: f32 = 0.15;
const BOB_RATE: f32 = 3.0;

/// Vertical offset for a coin marker that has been out for `age` seconds.
fn bob(age: f32) -> f32 {
    (age * BOB_RATE).sin() * BOB_HEIGHT
}

#[derive(Resource, Default)]
pub struct StreamingDebug {
    pub enabled: bool,
}

pub struct StreamingDebugPlugin;

impl Plugin for StreamingDebugPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StreamingDebug>().add_systems(
            Update,
            (draw_segment_bounds, draw_content)
                .run_if(|debug: Res<StreamingDebug>| debug.enabled)
                .run_if(resource_exists::<LevelGenerator>),
        );
    }
}

fn draw_segment_bounds(mut gizmos: Gizmos, generator: Res<LevelGenerator>) {
    for segment in generator.active_segments() {
        let near = FORWARD * segment.start();
        let far = FORWARD * segment.end();
        let revealed = segment
            .reveal()
            .map_or(1.0, |h| generator.reveals().progress(h));
        let color = Color::srgb(0.2, 0.4 + 0.6 * revealed, 0.3);

        gizmos.line(near - LATERAL * TRACK_HALF_WIDTH, near + LATERAL * TRACK_HALF_WIDTH, color);
        gizmos.line(near - LATERAL * TRACK_HALF_WIDTH, far - LATERAL * TRACK_HALF_WIDTH, color);
        gizmos.line(near + LATERAL * TRACK_HALF_WIDTH, far + LATERAL * TRACK_HALF_WIDTH, color);
    }

    // Next spawn edge.
    let edge = FORWARD * generator.next_spawn_coord();
    gizmos.line(
        edge - LATERAL * TRACK_HALF_WIDTH,
        edge + LATERAL * TRACK_HALF_WIDTH + UP,
        Color::srgb(1.0, 0.8, 0.1),
    );
}

fn draw_content(
    mut gizmos: Gizmos,
    collectibles: Option<Res<CollectibleSpawner>>,
    hazards: Option<Res<HazardSpawners>>,
) {
    if let Some(collectibles) = collectibles {
        for c in collectibles.active().iter().filter(|c| !c.is_collected()) {
            let p = c.position() + UP * bob(c.age());
            gizmos.line(p - UP * MARKER, p + UP * MARKER, Color::srgb(1.0, 0.85, 0.0));
            gizmos.line(p - LATERAL * MARKER, p + LATERAL * MARKER, Color::srgb(1.0, 0.85, 0.0));
        }
    }

    if let Some(hazards) = hazards {
        let all = hazards.enemies.active().iter().chain(hazards.obstacles.active());
        for h in all.filter(|h| h.is_armed()) {
            let p = h.position();
            gizmos.line(p, p + UP * 1.5, Color::srgb(0.9, 0.1, 0.1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_markers_sit_on_their_anchor_and_older_ones_move() {
        assert_eq!(bob(0.0), 0.0);
        assert!(bob(0.5).abs() > 0.0);
        assert!((-BOB_HEIGHT..=BOB_HEIGHT).contains(&bob(12.3)));
    }
}
