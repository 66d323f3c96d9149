//! Transient view and editor state
//!
//! Camera, selection pivot, active tool and active material. None of it is
//! part of the document, but it has its own undo history and rides along
//! with selection and document-list records that change it.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ORBIT_PITCH, MIN_ORBIT_DISTANCE, ORBIT_RADIANS_PER_UNIT};
use crate::tools::ToolKind;

/// Orbit camera around a target point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitCamera {
    /// Point the camera orbits around
    pub target: Vec3,
    /// Horizontal angle (yaw) in radians
    pub yaw: f32,
    /// Vertical angle (pitch) in radians
    pub pitch: f32,
    /// Distance from target
    pub distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        // Looking at the origin from (5, 5, 5)
        Self {
            target: Vec3::ZERO,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: 0.615,
            distance: 8.66,
        }
    }
}

impl OrbitCamera {
    /// Camera position in world space
    pub fn eye(&self) -> Vec3 {
        // Pitch is measured from the horizontal plane, yaw around +Y
        let horizontal = self.distance * self.pitch.cos();
        self.target
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.distance * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    /// Rotate by a screen-space pointer delta
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * ORBIT_RADIANS_PER_UNIT;
        self.pitch =
            (self.pitch - dy * ORBIT_RADIANS_PER_UNIT).clamp(-MAX_ORBIT_PITCH, MAX_ORBIT_PITCH);
    }

    /// Scale the distance (factor < 1 zooms in)
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.distance = (self.distance * factor).max(MIN_ORBIT_DISTANCE);
        }
    }

    /// Move target and eye together
    pub fn pan(&mut self, offset: Vec3) {
        self.target += offset;
    }
}

/// Everything a view record captures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub camera: OrbitCamera,
    /// Transform pivot, usually the centroid of the selection
    pub pivot: Vec3,
    pub active_tool: ToolKind,
    pub active_material: u32,
}

impl ViewState {
    /// Point the pivot at the centroid of `points`; returns false if empty
    pub fn set_pivot_to_centroid(&mut self, points: impl IntoIterator<Item = Vec3>) -> bool {
        let mut sum = Vec3::ZERO;
        let mut count = 0usize;
        for point in points {
            sum += point;
            count += 1;
        }
        if count == 0 {
            return false;
        }
        self.pivot = sum / count as f32;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_eye() {
        let eye = OrbitCamera::default().eye();
        assert!((eye - Vec3::splat(5.0)).length() < 0.05);
    }

    #[test]
    fn test_orbit_clamps_pitch() {
        let mut camera = OrbitCamera::default();
        camera.orbit(0.0, -10_000.0);
        assert_eq!(camera.pitch, MAX_ORBIT_PITCH);
        camera.orbit(0.0, 10_000.0);
        assert_eq!(camera.pitch, -MAX_ORBIT_PITCH);
    }

    #[test]
    fn test_zoom_limits() {
        let mut camera = OrbitCamera::default();
        camera.zoom(0.0);
        assert_eq!(camera.distance, OrbitCamera::default().distance);
        camera.zoom(1e-9);
        assert_eq!(camera.distance, MIN_ORBIT_DISTANCE);
    }

    #[test]
    fn test_pivot_to_centroid() {
        let mut view = ViewState::default();
        assert!(!view.set_pivot_to_centroid(Vec::<Vec3>::new()));
        assert!(view.set_pivot_to_centroid([Vec3::ZERO, Vec3::new(2.0, 0.0, 4.0)]));
        assert_eq!(view.pivot, Vec3::new(1.0, 0.0, 2.0));
    }
}
