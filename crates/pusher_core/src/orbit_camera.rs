//! Orbit camera for looking at the tray.
//!
//! - Right mouse drag: rotate camera (azimuth and elevation)
//! - Scroll wheel: zoom in/out
//!
//! The left button is left free for dropping coins.

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use std::f32::consts::FRAC_PI_2;

/// Orbit state of a camera circling a target point.
#[derive(Component)]
pub struct OrbitCamera {
    /// Point the camera orbits around
    pub target: Vec3,
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle (radians)
    pub azimuth: f32,
    /// Vertical angle (radians), kept above the tray plane
    pub elevation: f32,
    /// Mouse sensitivity for rotation
    pub sensitivity: f32,
    /// Zoom step per scroll unit (m)
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 0.5,
            azimuth: 0.0,
            elevation: 0.6,
            sensitivity: 0.005,
            zoom_sensitivity: 0.02,
            min_distance: 0.1,
            max_distance: 1.0,
        }
    }
}

impl OrbitCamera {
    /// Highest elevation, just short of straight down.
    pub const MAX_ELEVATION: f32 = FRAC_PI_2 - 0.01;

    /// Orbit camera placed at `position`, looking at `target`.
    pub fn from_position(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let distance = offset.length();
        let elevation = if distance > 0.0 {
            (offset.y / distance).clamp(-1.0, 1.0).asin()
        } else {
            0.0
        };
        Self {
            target,
            distance,
            azimuth: offset.x.atan2(offset.z),
            elevation: elevation.clamp(0.0, Self::MAX_ELEVATION),
            ..default()
        }
    }

    /// Calculate the camera position based on current orbit parameters.
    pub fn calculate_position(&self) -> Vec3 {
        let x = self.distance * self.elevation.cos() * self.azimuth.sin();
        let y = self.distance * self.elevation.sin();
        let z = self.distance * self.elevation.cos() * self.azimuth.cos();
        self.target + Vec3::new(x, y, z)
    }

    fn rotate(&mut self, delta: Vec2) {
        self.azimuth -= delta.x * self.sensitivity;
        self.elevation =
            (self.elevation + delta.y * self.sensitivity).clamp(0.0, Self::MAX_ELEVATION);
    }

    fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance - scroll * self.zoom_sensitivity)
            .clamp(self.min_distance, self.max_distance);
    }
}

/// System set for camera updates; runs after the simulation frame.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct CameraSystems;

/// System that updates orbit camera based on mouse input.
pub fn orbit_camera_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    mut query: Query<(&mut OrbitCamera, &mut Transform)>,
) {
    for (mut orbit, mut transform) in query.iter_mut() {
        if mouse_button.pressed(MouseButton::Right) {
            orbit.rotate(mouse_motion.delta);
        }

        let scroll = mouse_scroll.delta.y;
        if scroll != 0.0 {
            orbit.zoom(scroll);
        }

        transform.translation = orbit.calculate_position();
        transform.look_at(orbit.target, Vec3::Y);
    }
}

/// Plugin that adds orbit camera functionality.
pub struct OrbitCameraPlugin;

impl Plugin for OrbitCameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, orbit_camera_system.in_set(CameraSystems));
    }
}

/// Bundle for spawning an orbit camera.
#[derive(Bundle)]
pub struct OrbitCameraBundle {
    pub camera: Camera3d,
    pub projection: Projection,
    pub orbit: OrbitCamera,
    pub transform: Transform,
}

impl OrbitCameraBundle {
    /// Camera at `position` looking at `target`, with a near plane close
    /// enough for centimetre-sized coins.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let orbit = OrbitCamera::from_position(position, target);
        let position = orbit.calculate_position();
        Self {
            camera: Camera3d::default(),
            projection: Projection::Perspective(PerspectiveProjection {
                near: 0.01,
                ..default()
            }),
            orbit,
            transform: Transform::from_translation(position).looking_at(target, Vec3::Y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_position_round_trips() {
        let position = Vec3::new(0.3, 0.3, 0.3);
        let orbit = OrbitCamera::from_position(position, Vec3::ZERO);
        assert!(orbit.calculate_position().abs_diff_eq(position, 1e-5));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut orbit = OrbitCamera::default();
        orbit.zoom(1000.0);
        assert_eq!(orbit.distance, orbit.min_distance);
        orbit.zoom(-1000.0);
        assert_eq!(orbit.distance, orbit.max_distance);
    }

    #[test]
    fn test_camera_stays_above_tray() {
        let mut orbit = OrbitCamera::default();
        orbit.rotate(Vec2::new(0.0, -10_000.0));
        assert_eq!(orbit.elevation, 0.0);
        orbit.rotate(Vec2::new(0.0, 10_000.0));
        assert_eq!(orbit.elevation, OrbitCamera::MAX_ELEVATION);
    }
}
