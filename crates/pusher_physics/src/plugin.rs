//! Bevy binding for the simulation controller.
//!
//! Proxies are ECS entities with a mesh, a material, a `Transform` and a
//! `Visibility`. [`ProxyWriter`] is the system parameter that implements
//! [`RenderSink`] on top of `Commands` and a proxy query.

use std::path::PathBuf;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::coin::{CoinMaterial, CoinType, COIN_TYPES};
use crate::command::PusherCommand;
use crate::config::PusherConfig;
use crate::controller::SimulationController;
use crate::fixtures::FixtureKind;
use crate::sink::{Pose, RenderSink};

pub struct PusherPlugin {
    /// JSON config to load; defaults are used when it does not exist
    pub config_path: PathBuf,
}

impl Default for PusherPlugin {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(PusherConfig::path_from_env()),
        }
    }
}

impl Plugin for PusherPlugin {
    fn build(&self, app: &mut App) {
        let config = PusherConfig::load_or_default(&self.config_path);
        app.insert_resource(config)
            .init_resource::<PointerCapture>()
            .init_resource::<CoinAssets>()
            .add_message::<PusherCommand>()
            .add_systems(Startup, setup_simulation)
            .add_systems(
                Update,
                (update_spawn_gate, apply_commands, run_frame)
                    .chain()
                    .in_set(PusherSystems::Frame)
                    .run_if(resource_exists::<Simulation>),
            )
            .add_systems(Last, release_on_exit.run_if(resource_exists::<Simulation>));
    }
}

/// System set containing input handling and the per-frame step.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum PusherSystems {
    Frame,
}

/// The running simulation. Absent before startup and after a failure.
#[derive(Resource)]
pub struct Simulation(pub SimulationController<Entity>);

/// Set by the UI layer while it owns the pointer, so clicks on widgets do
/// not drop coins.
#[derive(Resource, Default)]
pub struct PointerCapture {
    pub ui_wants_pointer: bool,
}

/// Marker for entities that mirror a simulated body.
#[derive(Component)]
pub struct SimProxy;

/// Mesh and material per coin type, created on first use.
#[derive(Resource, Default)]
pub struct CoinAssets {
    coins: Vec<Option<(Handle<Mesh>, Handle<StandardMaterial>)>>,
}

impl CoinAssets {
    fn get_or_create(
        &mut self,
        index: usize,
        coin: &CoinType,
        meshes: &mut Assets<Mesh>,
        materials: &mut Assets<StandardMaterial>,
    ) -> (Handle<Mesh>, Handle<StandardMaterial>) {
        if self.coins.len() <= index {
            self.coins.resize(index + 1, None);
        }
        self.coins[index]
            .get_or_insert_with(|| {
                let mesh = meshes.add(Cylinder::new(coin.radius(), coin.thickness));
                let material = materials.add(StandardMaterial {
                    base_color: coin_color(coin.material),
                    metallic: 0.8,
                    perceptual_roughness: 0.35,
                    ..default()
                });
                (mesh, material)
            })
            .clone()
    }
}

/// Display colour of a coin material.
pub fn coin_color(material: CoinMaterial) -> Color {
    match material {
        CoinMaterial::Aluminum | CoinMaterial::Silver => Color::srgb_u8(0xC0, 0xC0, 0xC0),
        CoinMaterial::Brass => Color::srgb_u8(0xDA, 0xA5, 0x20),
        CoinMaterial::Copper => Color::srgb_u8(0xB8, 0x73, 0x33),
    }
}

fn fixture_color(kind: FixtureKind) -> Color {
    match kind {
        FixtureKind::Tray => Color::srgb_u8(0x00, 0xAA, 0x00),
        FixtureKind::Wall(_) => Color::srgb_u8(0x80, 0x80, 0x80),
    }
}

fn pose_transform(pose: Pose) -> Transform {
    Transform::from_translation(pose.translation).with_rotation(pose.rotation)
}

/// ECS implementation of [`RenderSink`].
#[derive(SystemParam)]
pub struct ProxyWriter<'w, 's> {
    commands: Commands<'w, 's>,
    proxies: Query<'w, 's, (&'static mut Transform, &'static mut Visibility), With<SimProxy>>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    coin_assets: ResMut<'w, CoinAssets>,
}

impl RenderSink for ProxyWriter<'_, '_> {
    type Proxy = Entity;

    fn attach_fixture(&mut self, kind: FixtureKind, half_extents: Vec3, pose: Pose) -> Entity {
        let size = half_extents * 2.0;
        let mesh = self.meshes.add(Cuboid::new(size.x, size.y, size.z));
        let material = self.materials.add(fixture_color(kind));
        self.commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                pose_transform(pose),
                Visibility::Visible,
                SimProxy,
            ))
            .id()
    }

    fn attach_coin(&mut self, coin_type: usize, coin: &CoinType, pose: Pose) -> Entity {
        let (mesh, material) = self.coin_assets.get_or_create(
            coin_type,
            coin,
            &mut self.meshes,
            &mut self.materials,
        );
        self.commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material),
                pose_transform(pose),
                Visibility::Visible,
                SimProxy,
            ))
            .id()
    }

    fn set_pose(&mut self, proxy: Entity, pose: Pose) {
        if let Ok((mut transform, _)) = self.proxies.get_mut(proxy) {
            transform.translation = pose.translation;
            transform.rotation = pose.rotation;
        } else if let Ok(mut entity) = self.commands.get_entity(proxy) {
            // Spawned by this system run and still queued
            entity.try_insert(pose_transform(pose));
        }
    }

    fn set_visible(&mut self, proxy: Entity, visible: bool) {
        let value = if visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        if let Ok((_, mut visibility)) = self.proxies.get_mut(proxy) {
            *visibility = value;
        } else if let Ok(mut entity) = self.commands.get_entity(proxy) {
            entity.try_insert(value);
        }
    }

    fn detach(&mut self, proxy: Entity) {
        self.commands.entity(proxy).despawn();
    }
}

fn setup_simulation(
    config: Res<PusherConfig>,
    mut writer: ProxyWriter,
    mut exit: MessageWriter<AppExit>,
) {
    // Warm the coin asset cache so the first spawn does not hitch
    for (index, coin) in COIN_TYPES.iter().enumerate() {
        let w = &mut writer;
        w.coin_assets
            .get_or_create(index, coin, &mut w.meshes, &mut w.materials);
    }

    match SimulationController::new(&config, &mut writer) {
        Ok(controller) => {
            writer.commands.insert_resource(Simulation(controller));
        }
        Err(e) => {
            error!("Failed to start simulation: {}", e);
            exit.write(AppExit::error());
        }
    }
}

/// The spawn gate is open while the left button is held over the window and
/// the UI does not own the pointer.
fn update_spawn_gate(
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    capture: Res<PointerCapture>,
    mut sim: ResMut<Simulation>,
) {
    let over_window = windows
        .single()
        .map(|window| window.cursor_position().is_some())
        .unwrap_or(false);
    let open = mouse_button.pressed(MouseButton::Left) && over_window && !capture.ui_wants_pointer;
    if open != sim.0.is_spawn_gate_open() {
        sim.0.set_spawn_gate(open);
    }
}

fn apply_commands(
    mut reader: MessageReader<PusherCommand>,
    mut sim: ResMut<Simulation>,
    mut writer: ProxyWriter,
) {
    for command in reader.read() {
        debug!("Applying {:?}", command);
        sim.0.apply(*command, &mut writer);
    }
}

fn run_frame(
    time: Res<Time>,
    mut sim: ResMut<Simulation>,
    mut writer: ProxyWriter,
    mut exit: MessageWriter<AppExit>,
) {
    if let Err(e) = sim.0.frame(time.elapsed(), time.delta_secs(), &mut writer) {
        // Stop scheduling frames instead of rendering a stale world
        error!("Simulation halted: {}", e);
        sim.0.shutdown(&mut writer);
        writer.commands.remove_resource::<Simulation>();
        exit.write(AppExit::error());
    }
}

/// Release every body and proxy once the app is asked to exit.
fn release_on_exit(
    mut exits: MessageReader<AppExit>,
    mut sim: ResMut<Simulation>,
    mut writer: ProxyWriter,
) {
    if exits.read().next().is_none() {
        return;
    }
    sim.0.shutdown(&mut writer);
    writer.commands.remove_resource::<Simulation>();
}
