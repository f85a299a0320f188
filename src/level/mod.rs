// src/level/mod.rs
//! Segment streaming: catalog, pools, template selection and the generator
//! that keeps a contiguous window of track alive around the runner.

pub mod catalog;
pub mod config;
pub mod core;
pub mod debug;
pub mod generator;
pub mod plugin;
pub mod pool;
pub mod provider;
pub mod reveal;

pub use self::debug::StreamingDebugPlugin;
pub use self::plugin::{LevelPlugin, LevelSet, RestartRun, StreamFocus};
