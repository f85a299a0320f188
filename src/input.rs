use bevy::input::{keyboard::KeyCode, ButtonInput};
use bevy::prelude::*;

use crate::actions::{ActionState, PlayerAction};
use crate::level::debug::StreamingDebug;
use crate::level::plugin::RestartRun;
use crate::state::GameState;

pub fn input_mapping_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut action_state: ResMut<ActionState>,
) {
    action_state.set(PlayerAction::Pause, keys.just_pressed(KeyCode::Escape));
    action_state.set(PlayerAction::Restart, keys.just_pressed(KeyCode::KeyR));
    action_state.set(PlayerAction::ToggleDebug, keys.just_pressed(KeyCode::F3));
}

pub fn pause_toggle_system(
    action_state: Res<ActionState>,
    mut next_state: ResMut<NextState<GameState>>,
    current_state: Res<State<GameState>>,
) {
    if action_state.triggered(PlayerAction::Pause) {
        if current_state.get() == &GameState::Running {
            next_state.set(GameState::Paused);
            info!("Paused game");
        } else if current_state.get() == &GameState::Paused {
            next_state.set(GameState::Running);
            info!("Resumed game");
        }
    }
}

/// R restarts the run from the origin; a paused game resumes.
pub fn request_restart(
    action_state: Res<ActionState>,
    current_state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut restarts: EventWriter<RestartRun>,
) {
    if !action_state.triggered(PlayerAction::Restart) {
        return;
    }
    match current_state.get() {
        GameState::Loading => return,
        GameState::Paused => next_state.set(GameState::Running),
        GameState::Running => {}
    }
    restarts.write(RestartRun { start: 0.0 });
    info!("Restart requested");
}

pub fn toggle_debug_view(action_state: Res<ActionState>, mut view: ResMut<StreamingDebug>) {
    if action_state.triggered(PlayerAction::ToggleDebug) {
        view.enabled = !view.enabled;
        let shown = if view.enabled { "on" } else { "off" };
        info!("Streaming debug view {}", shown);
    }
}
