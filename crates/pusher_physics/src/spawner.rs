//! Rate-limited coin spawning.
//!
//! The spawner decides *whether* a coin may appear and *what* it looks like;
//! the controller turns the resulting [`SpawnPlan`] into a rigid body, a
//! collider and a proxy.

use std::f32::consts::TAU;
use std::time::Duration;

use bevy::math::{Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::coin::COIN_TYPES;
use crate::config::{CoinConfig, TrayConfig};
use crate::params::SimulationParameters;

/// Where and how a new coin enters the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPlan {
    /// Index into the coin table
    pub coin_type: usize,
    pub translation: Vec3,
    pub rotation: Quat,
}

pub struct Spawner {
    rng: StdRng,
    gate_open: bool,
    last_spawn: Option<Duration>,
}

impl Spawner {
    pub fn new(rng: StdRng) -> Self {
        Self {
            rng,
            gate_open: false,
            last_spawn: None,
        }
    }

    /// Deterministic spawner for reproducible runs.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn set_gate(&mut self, open: bool) {
        self.gate_open = open;
    }

    pub fn is_gate_open(&self) -> bool {
        self.gate_open
    }

    /// Time of the last successful spawn.
    pub fn last_spawn(&self) -> Option<Duration> {
        self.last_spawn
    }

    /// Whether every spawn precondition holds at `now`. The first spawn of
    /// a session is never held back by the interval.
    pub fn is_ready(&self, now: Duration, params: &SimulationParameters, population: usize) -> bool {
        if !self.gate_open || params.cap_reached(population) {
            return false;
        }
        match self.last_spawn {
            Some(last) => now.saturating_sub(last) >= params.spawn_interval(),
            None => true,
        }
    }

    /// Plan a new coin if allowed. Records `now` as the last spawn time on
    /// success; has no effect otherwise.
    pub fn try_spawn(
        &mut self,
        now: Duration,
        params: &SimulationParameters,
        population: usize,
        tray: &TrayConfig,
        coins: &CoinConfig,
    ) -> Option<SpawnPlan> {
        if !self.is_ready(now, params, population) {
            return None;
        }
        self.last_spawn = Some(now);
        Some(self.plan(tray, coins))
    }

    fn plan(&mut self, tray: &TrayConfig, coins: &CoinConfig) -> SpawnPlan {
        let coin_type = self.rng.gen_range(0..COIN_TYPES.len());

        let x = (self.rng.gen::<f32>() - 0.5) * tray.width * coins.spawn_area_fraction;
        let z = (self.rng.gen::<f32>() - 0.5) * tray.depth * coins.spawn_area_fraction;

        // Random spin about the vertical plus a small tilt of the coin's axis,
        // so no two coins land identically
        let spin = self.rng.gen_range(0.0..TAU);
        let max_tilt = coins.max_spawn_tilt_degrees.max(0.0).to_radians();
        let tilt = self.rng.gen_range(0.0..=max_tilt);

        SpawnPlan {
            coin_type,
            translation: Vec3::new(x, coins.drop_height, z),
            rotation: Quat::from_rotation_y(spin) * Quat::from_rotation_x(tilt),
        }
    }
}
