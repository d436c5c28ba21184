//! The render side of every simulated body.
//!
//! The controller never draws anything itself. Each fixture and coin owns a
//! proxy handed out by a [`RenderSink`]; the controller pushes poses and
//! visibility into it and detaches the proxy when the body goes away.

use std::collections::HashMap;

use bevy::math::{Quat, Vec3};

use crate::coin::CoinType;
use crate::fixtures::FixtureKind;

/// World-space position and orientation of a body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::IDENTITY)
    }
}

/// Receiver of renderable proxies.
pub trait RenderSink {
    type Proxy: Copy + Eq + std::fmt::Debug;

    /// Create a visible box proxy for a tray or wall.
    fn attach_fixture(&mut self, kind: FixtureKind, half_extents: Vec3, pose: Pose)
        -> Self::Proxy;

    /// Create a visible cylinder proxy for a coin. `coin_type` is the index
    /// of `coin` in the coin table.
    fn attach_coin(&mut self, coin_type: usize, coin: &CoinType, pose: Pose) -> Self::Proxy;

    fn set_pose(&mut self, proxy: Self::Proxy, pose: Pose);

    fn set_visible(&mut self, proxy: Self::Proxy, visible: bool);

    /// Remove a proxy from the scene.
    fn detach(&mut self, proxy: Self::Proxy);
}

/// What a headless proxy stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProxyKind {
    Fixture(FixtureKind),
    Coin(usize),
}

/// State of one proxy held by [`HeadlessSink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessProxy {
    pub kind: ProxyKind,
    pub pose: Pose,
    pub visible: bool,
}

/// A sink that keeps proxies in memory. Used to run the simulation without
/// a window and to observe what a renderer would have been told.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    next_id: u32,
    proxies: HashMap<u32, HeadlessProxy>,
    detached: usize,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, proxy: u32) -> Option<&HeadlessProxy> {
        self.proxies.get(&proxy)
    }

    pub fn is_attached(&self, proxy: u32) -> bool {
        self.proxies.contains_key(&proxy)
    }

    pub fn is_visible(&self, proxy: u32) -> Option<bool> {
        self.proxies.get(&proxy).map(|p| p.visible)
    }

    pub fn pose(&self, proxy: u32) -> Option<Pose> {
        self.proxies.get(&proxy).map(|p| p.pose)
    }

    /// Number of attached coin proxies.
    pub fn coin_count(&self) -> usize {
        self.proxies
            .values()
            .filter(|p| matches!(p.kind, ProxyKind::Coin(_)))
            .count()
    }

    /// Number of attached fixture proxies.
    pub fn fixture_count(&self) -> usize {
        self.proxies.len() - self.coin_count()
    }

    /// Total number of detach calls that removed a proxy.
    pub fn detached_count(&self) -> usize {
        self.detached
    }

    fn attach(&mut self, kind: ProxyKind, pose: Pose) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.proxies.insert(
            id,
            HeadlessProxy {
                kind,
                pose,
                visible: true,
            },
        );
        id
    }
}

impl RenderSink for HeadlessSink {
    type Proxy = u32;

    fn attach_fixture(&mut self, kind: FixtureKind, _half_extents: Vec3, pose: Pose) -> u32 {
        self.attach(ProxyKind::Fixture(kind), pose)
    }

    fn attach_coin(&mut self, coin_type: usize, _coin: &CoinType, pose: Pose) -> u32 {
        self.attach(ProxyKind::Coin(coin_type), pose)
    }

    fn set_pose(&mut self, proxy: u32, pose: Pose) {
        if let Some(p) = self.proxies.get_mut(&proxy) {
            p.pose = pose;
        }
    }

    fn set_visible(&mut self, proxy: u32, visible: bool) {
        if let Some(p) = self.proxies.get_mut(&proxy) {
            p.visible = visible;
        }
    }

    fn detach(&mut self, proxy: u32) {
        if self.proxies.remove(&proxy).is_some() {
            self.detached += 1;
        }
    }
}
