//! Static fixtures: the tray and its four walls.
//!
//! All fixtures are fixed rapier bodies sharing the world frame. The tray sits
//! at the origin; each wall is flush against one tray edge, pushed outward by
//! half its own thickness. Fixtures live for the whole session. They can be
//! re-posed (tray tilt) or disabled (wall toggle), but never destroyed.

use std::str::FromStr;

use bevy::log::debug;
use bevy::math::{Quat, Vec3};
use rapier3d::prelude::{ColliderBuilder, ColliderHandle, RigidBodyHandle};

use crate::config::TrayConfig;
use crate::error::ParseWallError;
use crate::sink::{Pose, RenderSink};
use crate::world::PhysicsWorld;

/// One side of the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallSide {
    /// -z edge
    Front,
    /// +z edge
    Back,
    /// -x edge
    Left,
    /// +x edge
    Right,
}

impl WallSide {
    pub const ALL: [WallSide; 4] = [
        WallSide::Front,
        WallSide::Back,
        WallSide::Left,
        WallSide::Right,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WallSide::Front => "front",
            WallSide::Back => "back",
            WallSide::Left => "left",
            WallSide::Right => "right",
        }
    }
}

impl std::fmt::Display for WallSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WallSide {
    type Err = ParseWallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(WallSide::Front),
            "back" => Ok(WallSide::Back),
            "left" => Ok(WallSide::Left),
            "right" => Ok(WallSide::Right),
            _ => Err(ParseWallError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureKind {
    Tray,
    Wall(WallSide),
}

/// A fixed box body with its collider and proxy.
#[derive(Debug, Clone, Copy)]
pub struct RigidFixture<P> {
    pub kind: FixtureKind,
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
    pub half_extents: Vec3,
    pub translation: Vec3,
    rotation: Quat,
    enabled: bool,
    pub proxy: P,
}

impl<P: Copy> RigidFixture<P> {
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.translation, self.rotation)
    }

    /// Whether the fixture generates contacts. Its proxy is visible exactly
    /// when this is true.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable collisions and show or hide the proxy in one step.
    pub fn set_enabled<S>(&mut self, enabled: bool, world: &mut PhysicsWorld, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        self.enabled = enabled;
        world.set_collider_enabled(self.collider, enabled);
        sink.set_visible(self.proxy, enabled);
    }

    /// Re-pose the fixed body and mirror the rotation onto its proxy.
    pub fn set_rotation<S>(&mut self, rotation: Quat, world: &mut PhysicsWorld, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        self.rotation = rotation;
        world.set_rotation(self.body, rotation);
        sink.set_pose(self.proxy, self.pose());
    }
}

/// The four walls, addressable by side.
#[derive(Debug, Clone, Copy)]
pub struct Walls<P> {
    pub front: RigidFixture<P>,
    pub back: RigidFixture<P>,
    pub left: RigidFixture<P>,
    pub right: RigidFixture<P>,
}

impl<P> Walls<P> {
    pub fn get(&self, side: WallSide) -> &RigidFixture<P> {
        match side {
            WallSide::Front => &self.front,
            WallSide::Back => &self.back,
            WallSide::Left => &self.left,
            WallSide::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: WallSide) -> &mut RigidFixture<P> {
        match side {
            WallSide::Front => &mut self.front,
            WallSide::Back => &mut self.back,
            WallSide::Left => &mut self.left,
            WallSide::Right => &mut self.right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RigidFixture<P>> {
        [&self.front, &self.back, &self.left, &self.right].into_iter()
    }
}

/// Tray plus walls.
#[derive(Debug, Clone, Copy)]
pub struct Fixtures<P> {
    pub tray: RigidFixture<P>,
    pub walls: Walls<P>,
}

impl<P: Copy> Fixtures<P> {
    pub fn build<S>(world: &mut PhysicsWorld, tray: &TrayConfig, sink: &mut S) -> Self
    where
        S: RenderSink<Proxy = P>,
    {
        Self {
            tray: build_tray(world, tray, sink),
            walls: build_walls(world, tray, sink),
        }
    }
}

/// Half extents and centre of each wall for a given tray.
pub fn wall_layout(tray: &TrayConfig) -> [(WallSide, Vec3, Vec3); 4] {
    let t = tray.wall_thickness;
    let y = tray.wall_height / 2.0;
    let along_x = Vec3::new(tray.width, tray.wall_height, t) / 2.0;
    let along_z = Vec3::new(t, tray.wall_height, tray.depth) / 2.0;

    [
        (WallSide::Front, along_x, Vec3::new(0.0, y, -tray.depth / 2.0 - t / 2.0)),
        (WallSide::Back, along_x, Vec3::new(0.0, y, tray.depth / 2.0 + t / 2.0)),
        (WallSide::Left, along_z, Vec3::new(-tray.width / 2.0 - t / 2.0, y, 0.0)),
        (WallSide::Right, along_z, Vec3::new(tray.width / 2.0 + t / 2.0, y, 0.0)),
    ]
}

/// Build the tray base at the origin.
pub fn build_tray<S: RenderSink>(
    world: &mut PhysicsWorld,
    tray: &TrayConfig,
    sink: &mut S,
) -> RigidFixture<S::Proxy> {
    let half_extents = Vec3::new(tray.width, tray.height, tray.depth) / 2.0;
    build_fixture(
        world,
        sink,
        FixtureKind::Tray,
        half_extents,
        Vec3::ZERO,
        tray.contact_skin,
    )
}

/// Build the four walls around the tray.
pub fn build_walls<S: RenderSink>(
    world: &mut PhysicsWorld,
    tray: &TrayConfig,
    sink: &mut S,
) -> Walls<S::Proxy> {
    let [front, back, left, right] = wall_layout(tray).map(|(side, half_extents, translation)| {
        build_fixture(
            world,
            sink,
            FixtureKind::Wall(side),
            half_extents,
            translation,
            tray.contact_skin,
        )
    });
    Walls {
        front,
        back,
        left,
        right,
    }
}

fn build_fixture<S: RenderSink>(
    world: &mut PhysicsWorld,
    sink: &mut S,
    kind: FixtureKind,
    half_extents: Vec3,
    translation: Vec3,
    contact_skin: f32,
) -> RigidFixture<S::Proxy> {
    let pose = Pose::from_translation(translation);
    let body = world.create_fixed_body(pose);
    let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        .contact_skin(contact_skin)
        .build();
    let collider = world.create_collider(collider, body);
    let proxy = sink.attach_fixture(kind, half_extents, pose);
    debug!("Built {:?} fixture at {:?}", kind, translation);

    RigidFixture {
        kind,
        body,
        collider,
        half_extents,
        translation,
        rotation: Quat::IDENTITY,
        enabled: true,
        proxy,
    }
}
