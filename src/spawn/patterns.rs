// src/spawn/patterns.rs
//! Coin-group layouts. Offsets are relative to the spawn point's anchor,
//! in segment space (forward = +Z, up = +Y, lateral = +X).

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::level::core::{GroupParams, GroupPattern, FORWARD, LATERAL, UP};

/// Total arc span, centered on the forward axis.
const ARC_SPAN_DEG: f32 = 120.0;
/// Sideways amplitude of a zigzag.
const ZIGZAG_LATERAL: f32 = 1.5;
/// Peak height of a jump arc.
const JUMP_HEIGHT: f32 = 2.0;

/// Offsets for `count` coins laid out as `pattern`.
///
/// Arc and jump spread over `count - 1` intervals; a one-coin group of either
/// is a single coin at the anchor.
pub fn group_offsets(pattern: GroupPattern, count: u32, spacing: f32) -> Vec<Vec3> {
    if count == 1 && matches!(pattern, GroupPattern::Arc | GroupPattern::Jump) {
        return vec![Vec3::ZERO];
    }

    let last = count.saturating_sub(1) as f32;
    (0..count)
        .map(|i| {
            let i = i as f32;
            match pattern {
                GroupPattern::Line => FORWARD * (i * spacing),
                GroupPattern::Arc => {
                    let angle = (-ARC_SPAN_DEG / 2.0 + i * (ARC_SPAN_DEG / last)).to_radians();
                    LATERAL * (angle.sin() * spacing * 2.0) + FORWARD * (angle.cos() * spacing)
                }
                GroupPattern::Zigzag => {
                    let side = if (i as u32) % 2 == 0 { 1.0 } else { -1.0 };
                    LATERAL * (side * ZIGZAG_LATERAL) + FORWARD * (i * spacing)
                }
                GroupPattern::Jump => {
                    UP * ((i / last * PI).sin() * JUMP_HEIGHT) + FORWARD * (i * spacing)
                }
                GroupPattern::Vertical => UP * (i * spacing * 0.5),
            }
        })
        .collect()
}

/// Absolute positions of a group anchored at `anchor`.
pub fn group_positions(anchor: Vec3, params: &GroupParams) -> Vec<Vec3> {
    group_offsets(params.pattern, params.count, params.spacing)
        .into_iter()
        .map(|o| anchor + o)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-5)
    }

    #[test]
    fn line_steps_forward() {
        let o = group_offsets(GroupPattern::Line, 4, 2.5);
        assert_eq!(o, vec![Vec3::ZERO, Vec3::Z * 2.5, Vec3::Z * 5.0, Vec3::Z * 7.5]);
    }

    #[test]
    fn arc_spans_120_degrees_symmetrically() {
        let o = group_offsets(GroupPattern::Arc, 3, 2.0);
        let s60 = 60f32.to_radians().sin();
        let c60 = 60f32.to_radians().cos();
        assert!(close(o[0], Vec3::new(-s60 * 4.0, 0.0, c60 * 2.0)));
        assert!(close(o[1], Vec3::new(0.0, 0.0, 2.0)));
        assert!(close(o[2], Vec3::new(s60 * 4.0, 0.0, c60 * 2.0)));
    }

    #[test]
    fn zigzag_alternates_sides() {
        let o = group_offsets(GroupPattern::Zigzag, 4, 1.0);
        let xs: Vec<f32> = o.iter().map(|v| v.x).collect();
        assert_eq!(xs, vec![1.5, -1.5, 1.5, -1.5]);
        assert_eq!(o[3].z, 3.0);
    }

    #[test]
    fn jump_peaks_in_the_middle_and_lands() {
        let o = group_offsets(GroupPattern::Jump, 5, 1.0);
        assert!(o[0].y.abs() < 1e-6);
        assert!((o[2].y - 2.0).abs() < 1e-5);
        assert!(o[4].y.abs() < 1e-5);
        assert_eq!(o[4].z, 4.0);
    }

    #[test]
    fn vertical_stacks_at_half_spacing() {
        let o = group_offsets(GroupPattern::Vertical, 3, 2.0);
        assert_eq!(o, vec![Vec3::ZERO, Vec3::Y, Vec3::Y * 2.0]);
    }

    #[test]
    fn single_coin_arc_and_jump_sit_on_the_anchor() {
        assert_eq!(group_offsets(GroupPattern::Arc, 1, 3.0), vec![Vec3::ZERO]);
        assert_eq!(group_offsets(GroupPattern::Jump, 1, 3.0), vec![Vec3::ZERO]);
        assert!(group_offsets(GroupPattern::Line, 0, 3.0).is_empty());
    }

    #[test]
    fn layouts_are_deterministic() {
        let params = GroupParams { count: 9, spacing: 1.3, pattern: GroupPattern::Arc };
        let anchor = Vec3::new(0.5, 1.0, 40.0);
        assert_eq!(group_positions(anchor, &params), group_positions(anchor, &params));
        assert_eq!(group_positions(anchor, &params)[4], anchor + Vec3::Z * 1.3);
    }
}
