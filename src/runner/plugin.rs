use bevy::prelude::*;

use crate::level::LevelSet;
use crate::runner::components::{ActiveEffects, CollectibleCollected, HazardHit, RunScore};
use crate::runner::systems::{
    advance_runner, apply_pickups, attract_coins, collect_pickups, detect_hits, follow_camera,
    reset_runner_on_restart, spawn_runner, tick_effects,
};
use crate::state::GameState;

pub struct RunnerPlugin;

impl Plugin for RunnerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RunScore>()
            .init_resource::<ActiveEffects>()
            .add_event::<CollectibleCollected>()
            .add_event::<HazardHit>()
            .add_systems(Startup, spawn_runner)
            // Restarts share the level's set so the runner is back at the
            // start before the window is rebuilt around it.
            .add_systems(Update, reset_runner_on_restart.in_set(LevelSet::Restart))
            .add_systems(
                Update,
                advance_runner
                    .after(LevelSet::Restart)
                    .before(LevelSet::Stream)
                    .run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                (attract_coins, collect_pickups, detect_hits, apply_pickups, tick_effects)
                    .chain()
                    .after(LevelSet::Stream)
                    .run_if(in_state(GameState::Running)),
            )
            .add_systems(Update, follow_camera.after(advance_runner));
    }
}
