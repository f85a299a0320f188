use std::time::Duration;

use bevy::prelude::*;

use crate::spawn::{Pickup, PickupEffect};

#[derive(Component, Clone, Debug)]
pub struct Runner {
    /// Track speed without boosts, units per second.
    pub base_speed: f32,
    /// Current track speed; base plus any active boost.
    pub speed: f32,
    /// Contact radius for collectibles.
    pub pickup_radius: f32,
    /// Contact radius for enemies and obstacles.
    pub hit_radius: f32,
}

impl Default for Runner {
    fn default() -> Self {
        Self { base_speed: 14.0, speed: 14.0, pickup_radius: 1.2, hit_radius: 0.8 }
    }
}

#[derive(Resource, Default, Debug, Clone, PartialEq)]
pub struct RunScore {
    pub score: u64,
    pub coins: u32,
    pub hits: u32,
    /// Furthest track coordinate reached this run.
    pub distance: f32,
}

#[derive(Event, Clone, Copy, Debug)]
pub struct CollectibleCollected(pub Pickup);

#[derive(Event, Clone, Debug)]
pub struct HazardHit {
    pub archetype: String,
    pub position: Vec3,
}

/// A magnitude that lasts until its timer runs out.
#[derive(Clone, Debug)]
pub struct TimedEffect {
    pub value: f32,
    pub timer: Timer,
}

impl TimedEffect {
    fn new(value: f32, seconds: f32) -> Self {
        Self { value, timer: Timer::from_seconds(seconds, TimerMode::Once) }
    }
}

/// Pickup effects currently running. Picking up the same kind again
/// replaces the running one and restarts its timer.
#[derive(Resource, Default, Clone, Debug)]
pub struct ActiveEffects {
    pub speed_boost: Option<TimedEffect>,
    pub magnet: Option<TimedEffect>,
    pub multiplier: Option<TimedEffect>,
}

impl ActiveEffects {
    pub fn apply(&mut self, effect: PickupEffect) {
        match effect {
            PickupEffect::Score => {}
            PickupEffect::SpeedBoost { bonus, duration } => {
                self.speed_boost = Some(TimedEffect::new(bonus, duration));
            }
            PickupEffect::Magnet { radius, duration } => {
                self.magnet = Some(TimedEffect::new(radius, duration));
            }
            PickupEffect::Multiplier { factor, duration } => {
                self.multiplier = Some(TimedEffect::new(factor, duration));
            }
        }
    }

    /// Advance every timer and drop the effects that ran out.
    pub fn tick(&mut self, dt: Duration) {
        for slot in [&mut self.speed_boost, &mut self.magnet, &mut self.multiplier] {
            if let Some(effect) = slot {
                effect.timer.tick(dt);
                if effect.timer.finished() {
                    *slot = None;
                }
            }
        }
    }

    pub fn speed_bonus(&self) -> f32 {
        self.speed_boost.as_ref().map_or(0.0, |e| e.value)
    }

    pub fn magnet_radius(&self) -> Option<f32> {
        self.magnet.as_ref().map(|e| e.value)
    }

    pub fn score_factor(&self) -> f32 {
        self.multiplier.as_ref().map_or(1.0, |e| e.value)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_expire_after_their_duration() {
        let mut effects = ActiveEffects::default();
        effects.apply(PickupEffect::SpeedBoost { bonus: 6.0, duration: 3.0 });
        effects.apply(PickupEffect::Multiplier { factor: 2.0, duration: 1.0 });
        assert_eq!(effects.speed_bonus(), 6.0);
        assert_eq!(effects.score_factor(), 2.0);

        effects.tick(Duration::from_secs_f32(1.5));
        assert_eq!(effects.speed_bonus(), 6.0);
        assert_eq!(effects.score_factor(), 1.0);

        effects.tick(Duration::from_secs(2));
        assert_eq!(effects.speed_bonus(), 0.0);
        assert!(effects.magnet_radius().is_none());
    }

    #[test]
    fn repeat_pickup_restarts_the_timer() {
        let mut effects = ActiveEffects::default();
        effects.apply(PickupEffect::Magnet { radius: 8.0, duration: 2.0 });
        effects.tick(Duration::from_secs_f32(1.5));
        effects.apply(PickupEffect::Magnet { radius: 10.0, duration: 2.0 });
        effects.tick(Duration::from_secs_f32(1.5));
        assert_eq!(effects.magnet_radius(), Some(10.0));
    }

    #[test]
    fn score_pickups_leave_effects_alone() {
        let mut effects = ActiveEffects::default();
        effects.apply(PickupEffect::Score);
        assert_eq!(effects.speed_bonus(), 0.0);
        assert_eq!(effects.score_factor(), 1.0);
        assert!(effects.magnet_radius().is_none());
    }
}
