use bevy::prelude::*;

mod setup;
mod input;
mod actions;
mod state;
mod level;
mod runner;
mod spawn;

// re-export the bits we actually need in main
use actions::ActionState;
use input::{input_mapping_system, pause_toggle_system, request_restart, toggle_debug_view};
use level::{LevelPlugin, StreamingDebugPlugin};
use runner::RunnerPlugin;
use state::GameState;

fn main() {
    App::new()
        // core engine plugins
        .add_plugins(DefaultPlugins)
        // domain plugins
        .add_plugins(LevelPlugin)          // catalog, pools, streaming window
        .add_plugins(RunnerPlugin)         // the runner that drives the window
        .add_plugins(StreamingDebugPlugin) // F3 gizmo overlay
        // init resources & game-state
        .init_resource::<ActionState>()
        .init_state::<GameState>()
        // camera + light
        .add_systems(Startup, setup::setup)
        // input each frame, whatever the state
        .add_systems(
            Update,
            (
                input_mapping_system,
                (pause_toggle_system, request_restart, toggle_debug_view).after(input_mapping_system),
            ),
        )
        .run();
}
