//! View orientation inside a panorama and the pointer drag mapping onto it.
//! Yaw spins around the vertical axis and wraps; pitch tilts toward the
//! poles and is clamped so the image never flips over.

use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::config::RotationAxes;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rotation {
    /// Degrees in [0, 360).
    pub yaw: f32,
    /// Degrees in [-limit, limit].
    pub pitch: f32,
}

impl Rotation {
    pub const ORIGIN: Rotation = Rotation {
        yaw: 0.0,
        pitch: 0.0,
    };

    pub fn new(yaw: f32, pitch: f32, pitch_limit: f32) -> Self {
        Self {
            yaw: wrap_degrees(yaw),
            pitch: pitch.clamp(-pitch_limit, pitch_limit),
        }
    }

    pub fn is_origin(&self) -> bool {
        *self == Self::ORIGIN
    }

    pub fn rotate_yaw(&mut self, degrees: f32) {
        self.yaw = wrap_degrees(self.yaw + degrees);
    }

    pub fn tilt(&mut self, degrees: f32, pitch_limit: f32) {
        self.pitch = (self.pitch + degrees).clamp(-pitch_limit, pitch_limit);
    }

    /// Unit look vector in a right-handed, Y-up basis where yaw 0 faces -Z.
    pub fn view_direction(&self) -> Vec3 {
        let quat = Quat::from_rotation_y(-self.yaw.to_radians())
            * Quat::from_rotation_x(-self.pitch.to_radians());
        quat * Vec3::NEG_Z
    }
}

pub fn wrap_degrees(value: f32) -> f32 {
    let wrapped = value.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerSource {
    #[default]
    Mouse,
    Touch,
}

/// Incremental drag tracking: each move is measured from the previously
/// recorded position, so the mapping stays linear in total displacement.
#[derive(Debug, Clone, PartialEq)]
pub struct DragTracker {
    source: PointerSource,
    last: (f32, f32),
}

impl DragTracker {
    pub fn begin(x: f32, y: f32, source: PointerSource) -> Self {
        Self {
            source,
            last: (x, y),
        }
    }

    pub fn source(&self) -> PointerSource {
        self.source
    }

    /// Records the new pointer position and returns the travel since the
    /// previous one.
    pub fn advance(&mut self, x: f32, y: f32) -> (f32, f32) {
        let delta = (x - self.last.0, y - self.last.1);
        self.last = (x, y);
        delta
    }
}

/// Fixed mapping from pointer travel to rotation change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragMapping {
    pub mouse_sensitivity: f32,
    pub touch_sensitivity: f32,
    pub pitch_limit: f32,
    pub axes: RotationAxes,
}

impl DragMapping {
    pub fn sensitivity(&self, source: PointerSource) -> f32 {
        match source {
            PointerSource::Mouse => self.mouse_sensitivity,
            PointerSource::Touch => self.touch_sensitivity,
        }
    }

    pub fn apply(&self, rotation: &mut Rotation, source: PointerSource, dx: f32, dy: f32) {
        let sensitivity = self.sensitivity(source);
        rotation.rotate_yaw(dx * sensitivity);
        if self.axes == RotationAxes::YawPitch {
            rotation.tilt(dy * sensitivity, self.pitch_limit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn mapping(axes: RotationAxes) -> DragMapping {
        DragMapping {
            mouse_sensitivity: 0.5,
            touch_sensitivity: 0.3,
            pitch_limit: 90.0,
            axes,
        }
    }

    #[test]
    fn yaw_wraps_in_both_directions() {
        let mut rotation = Rotation::ORIGIN;
        rotation.rotate_yaw(-10.0);
        assert!((rotation.yaw - 350.0).abs() < EPSILON);
        rotation.rotate_yaw(730.0);
        assert!((rotation.yaw - 0.0).abs() < EPSILON);
        assert_eq!(wrap_degrees(-1e-9), 0.0);
    }

    #[test]
    fn horizontal_drag_leaves_pitch_alone() {
        let mapping = mapping(RotationAxes::YawPitch);
        let mut rotation = Rotation::ORIGIN;
        let mut tracker = DragTracker::begin(100.0, 200.0, PointerSource::Mouse);
        let mut previous_yaw = rotation.yaw;
        for step in 1..=10 {
            let (dx, dy) = tracker.advance(100.0 + step as f32 * 20.0, 200.0);
            mapping.apply(&mut rotation, tracker.source(), dx, dy);
            assert!(rotation.yaw > previous_yaw);
            previous_yaw = rotation.yaw;
        }
        assert_eq!(rotation.pitch, 0.0);
        assert!((rotation.yaw - 100.0).abs() < EPSILON);
    }

    #[test]
    fn pitch_never_leaves_limits() {
        let mapping = mapping(RotationAxes::YawPitch);
        let mut rotation = Rotation::ORIGIN;
        mapping.apply(&mut rotation, PointerSource::Mouse, 0.0, 1_000.0);
        assert_eq!(rotation.pitch, 90.0);
        mapping.apply(&mut rotation, PointerSource::Touch, 0.0, -5_000.0);
        assert_eq!(rotation.pitch, -90.0);
    }

    #[test]
    fn yaw_only_ignores_vertical_motion() {
        let mapping = mapping(RotationAxes::YawOnly);
        let mut rotation = Rotation::ORIGIN;
        mapping.apply(&mut rotation, PointerSource::Mouse, 10.0, 80.0);
        assert_eq!(rotation.pitch, 0.0);
        assert!((rotation.yaw - 5.0).abs() < EPSILON);
    }

    #[test]
    fn touch_uses_its_own_sensitivity() {
        let mapping = mapping(RotationAxes::YawPitch);
        let mut rotation = Rotation::ORIGIN;
        mapping.apply(&mut rotation, PointerSource::Touch, 10.0, 0.0);
        assert!((rotation.yaw - 3.0).abs() < EPSILON);
    }

    #[test]
    fn tracker_measures_from_last_position() {
        let mut tracker = DragTracker::begin(0.0, 0.0, PointerSource::Touch);
        assert_eq!(tracker.advance(5.0, 2.0), (5.0, 2.0));
        assert_eq!(tracker.advance(8.0, 2.0), (3.0, 0.0));
        assert_eq!(tracker.source(), PointerSource::Touch);
    }

    #[test]
    fn origin_looks_down_negative_z() {
        let direction = Rotation::ORIGIN.view_direction();
        assert!((direction - Vec3::NEG_Z).length() < EPSILON);

        let right = Rotation::new(90.0, 0.0, 90.0).view_direction();
        assert!((right - Vec3::X).length() < EPSILON, "{right:?}");
    }
}
