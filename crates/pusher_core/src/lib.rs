//! Presentation pieces shared by the coin pusher app:
//! - Orbit camera controller
//! - Scene lighting

use bevy::prelude::*;

pub mod orbit_camera;
pub mod scene;

pub use orbit_camera::{CameraSystems, OrbitCamera, OrbitCameraBundle, OrbitCameraPlugin};
pub use scene::{setup_scene, SceneConfig};

/// Camera, lights and orbit controls.
#[derive(Default)]
pub struct CorePlugin {
    pub scene: SceneConfig,
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.scene)
            .add_plugins(OrbitCameraPlugin)
            .add_systems(Startup, setup_scene);
    }
}
