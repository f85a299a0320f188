// src/level/reveal.rs
//! Cosmetic reveal animations as independently timed, cancellable tasks.
//! Nothing in gameplay waits on these; a segment is live the moment it is placed.

use std::collections::HashMap;
use std::time::Duration;

use bevy::prelude::*; // Timer, TimerMode

/// Ticket for one scheduled reveal. Never reused, so a cancelled or finished
/// handle can't reach an instance that has since been recycled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RevealHandle(u64);

#[derive(Debug)]
enum RevealPhase {
    Waiting(Timer),
    Playing(Timer),
}

pub struct RevealScheduler {
    tasks: HashMap<RevealHandle, RevealPhase>,
    next: u64,
    duration: f32,
}

impl RevealScheduler {
    /// `duration`: seconds the animation plays once its delay has elapsed.
    pub fn new(duration: f32) -> Self {
        Self { tasks: HashMap::new(), next: 0, duration: duration.max(0.0) }
    }

    fn play_timer(&self) -> Timer {
        Timer::from_seconds(self.duration, TimerMode::Once)
    }

    /// Fire-and-forget: start a reveal after `delay` seconds.
    pub fn schedule(&mut self, delay: f32) -> RevealHandle {
        let handle = RevealHandle(self.next);
        self.next += 1;
        let phase = if delay > 0.0 {
            RevealPhase::Waiting(Timer::from_seconds(delay, TimerMode::Once))
        } else {
            RevealPhase::Playing(self.play_timer())
        };
        self.tasks.insert(handle, phase);
        handle
    }

    /// Kill an in-flight reveal; the target snaps to its final pose.
    /// Returns false when the task had already finished or was unknown.
    pub fn cancel(&mut self, handle: RevealHandle) -> bool {
        self.tasks.remove(&handle).is_some()
    }

    /// Advance every task by `dt`. Returns how many finished this call.
    /// Time left over once a delay runs out goes to the animation in the same call.
    pub fn advance(&mut self, dt: Duration) -> usize {
        let play = self.play_timer();
        let mut finished = Vec::new();

        for (handle, phase) in self.tasks.iter_mut() {
            let mut dt = dt;
            if let RevealPhase::Waiting(t) = phase {
                let remaining = t.remaining();
                if dt < remaining {
                    t.tick(dt);
                    continue;
                }
                dt -= remaining;
                *phase = RevealPhase::Playing(play.clone());
            }
            if let RevealPhase::Playing(t) = phase {
                if t.tick(dt).finished() {
                    finished.push(*handle);
                }
            }
        }

        for handle in &finished {
            self.tasks.remove(handle);
        }
        finished.len()
    }

    /// Animation progress in `[0, 1]`. Waiting → 0; finished or unknown → 1.
    pub fn progress(&self, handle: RevealHandle) -> f32 {
        match self.tasks.get(&handle) {
            Some(RevealPhase::Waiting(_)) => 0.0,
            Some(RevealPhase::Playing(t)) => t.fraction(),
            None => 1.0,
        }
    }

    /// Seconds left before the animation starts playing (0 once playing or done).
    pub fn remaining_delay(&self, handle: RevealHandle) -> f32 {
        match self.tasks.get(&handle) {
            Some(RevealPhase::Waiting(t)) => t.remaining_secs(),
            _ => 0.0,
        }
    }

    pub fn is_in_flight(&self, handle: RevealHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
