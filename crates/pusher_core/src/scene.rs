//! Camera and lighting around the tray.

use bevy::prelude::*;

use crate::orbit_camera::OrbitCameraBundle;

/// Where the camera starts and what it looks at.
#[derive(Resource, Debug, Clone, Copy)]
pub struct SceneConfig {
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    pub light_position: Vec3,
    pub light_illuminance: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera_position: Vec3::new(0.3, 0.3, 0.3),
            camera_target: Vec3::ZERO,
            light_position: Vec3::new(0.2, 0.5, 0.1),
            light_illuminance: 8000.0,
        }
    }
}

/// Spawn the orbit camera and a shadow-casting sun.
pub fn setup_scene(mut commands: Commands, config: Res<SceneConfig>) {
    commands.spawn(OrbitCameraBundle::looking_at(
        config.camera_position,
        config.camera_target,
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: config.light_illuminance,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_translation(config.light_position).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 200.0,
        ..default()
    });

    info!(
        "Scene ready, camera at {:?} looking at {:?}",
        config.camera_position, config.camera_target
    );
}
