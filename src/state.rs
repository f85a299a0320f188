use bevy::prelude::*;

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Waiting for the segment catalog.
    #[default]
    Loading,
    Running,
    Paused,
}
