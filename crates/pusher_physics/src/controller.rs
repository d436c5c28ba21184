//! Simulation lifecycle controller.
//!
//! One [`SimulationController`] owns the physics world, the fixtures, the coin
//! registry, the spawner and the live parameters. Each render frame calls
//! [`SimulationController::frame`] once, which:
//!
//! 1. steps the physics world (substepped at the maximum timestep)
//! 2. spawns a coin if the gate is open and the interval has elapsed
//! 3. copies every coin's simulated pose onto its proxy
//! 4. evicts coins that fell below the exit height
//!
//! Everything takes `&mut self`, so a frame can never be re-entered while it
//! is running.

use std::time::Duration;

use bevy::log::{debug, error, info, warn};
use rapier3d::prelude::ColliderBuilder;

use crate::coin::{coin_type, COIN_TYPES};
use crate::command::PusherCommand;
use crate::config::{CoinConfig, PusherConfig, TrayConfig};
use crate::error::{SimError, SimResult};
use crate::fixtures::{Fixtures, WallSide};
use crate::params::{ParameterChange, SimulationParameters};
use crate::registry::{BodyRegistry, CoinBody, CoinHandle};
use crate::sink::{Pose, RenderSink};
use crate::spawner::{SpawnPlan, Spawner};
use crate::world::PhysicsWorld;

/// What happened during one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Physics substeps taken
    pub substeps: u32,
    pub spawned: Option<CoinHandle>,
    /// Coins removed for falling off the tray
    pub evicted: usize,
    /// Registry entries dropped because their body was missing
    pub orphans: usize,
}

pub struct SimulationController<P> {
    world: PhysicsWorld,
    fixtures: Fixtures<P>,
    registry: BodyRegistry<P>,
    spawner: Spawner,
    params: SimulationParameters,
    defaults: SimulationParameters,
    tray: TrayConfig,
    coins: CoinConfig,
    halted: bool,
    released: bool,
}

impl<P: Copy + Eq + std::fmt::Debug> SimulationController<P> {
    /// Create the world and fixtures from `config`. The spawner is seeded
    /// from `config.seed` when present.
    pub fn new<S>(config: &PusherConfig, sink: &mut S) -> SimResult<Self>
    where
        S: RenderSink<Proxy = P>,
    {
        let spawner = match config.seed {
            Some(seed) => Spawner::from_seed(seed),
            None => Spawner::from_entropy(),
        };
        Self::with_spawner(config, spawner, sink)
    }

    /// Like [`SimulationController::new`] with an explicit spawner.
    pub fn with_spawner<S>(config: &PusherConfig, spawner: Spawner, sink: &mut S) -> SimResult<Self>
    where
        S: RenderSink<Proxy = P>,
    {
        validate_tray(&config.tray)?;
        validate_coins(&config.coins)?;
        let mut world = PhysicsWorld::new(&config.world)?;
        let fixtures = Fixtures::build(&mut world, &config.tray, sink);

        let params = config.parameters.sanitized();
        if params != config.parameters {
            warn!(
                "Configured parameters {:?} coerced to {:?}",
                config.parameters, params
            );
        }

        let mut controller = Self {
            world,
            fixtures,
            registry: BodyRegistry::new(),
            spawner,
            defaults: params.clone(),
            params,
            tray: config.tray.clone(),
            coins: config.coins.clone(),
            halted: false,
            released: false,
        };

        // Configured tilt applies from the first frame
        let tilt = controller.params.tilt_degrees;
        if tilt != 0.0 {
            controller.set_tilt_degrees(tilt, sink);
        }

        info!(
            "Simulation ready: tray {}x{}m, {} coin types",
            config.tray.width,
            config.tray.depth,
            COIN_TYPES.len()
        );
        Ok(controller)
    }

    /// Run one frame of `elapsed` seconds ending at session time `now`.
    ///
    /// A step failure halts the controller: this frame and every later one
    /// return an error and nothing else happens.
    pub fn frame<S>(&mut self, now: Duration, elapsed: f32, sink: &mut S) -> SimResult<FrameReport>
    where
        S: RenderSink<Proxy = P>,
    {
        if self.halted {
            return Err(SimError::Halted);
        }

        let substeps = match self.world.step(elapsed) {
            Ok(substeps) => substeps,
            Err(e) => {
                self.halted = true;
                return Err(e);
            }
        };

        let spawned = self.try_spawn(now, sink);
        let orphans = self.sync_proxies(sink);
        let evicted = self.evict_fallen(sink);

        Ok(FrameReport {
            substeps,
            spawned,
            evicted,
            orphans,
        })
    }

    /// Spawn one coin if the gate is open, the interval has elapsed and the
    /// cap allows it.
    pub fn try_spawn<S>(&mut self, now: Duration, sink: &mut S) -> Option<CoinHandle>
    where
        S: RenderSink<Proxy = P>,
    {
        let plan = self.spawner.try_spawn(
            now,
            &self.params,
            self.registry.len(),
            &self.tray,
            &self.coins,
        )?;
        Some(self.materialize(plan, now, sink))
    }

    fn materialize<S>(&mut self, plan: SpawnPlan, now: Duration, sink: &mut S) -> CoinHandle
    where
        S: RenderSink<Proxy = P>,
    {
        let coin = coin_type(plan.coin_type).copied().unwrap_or(COIN_TYPES[0]);
        let pose = Pose::new(plan.translation, plan.rotation);

        let body = self.world.create_dynamic_body(
            pose,
            self.coins.linear_damping,
            self.coins.angular_damping,
        );
        let collider = ColliderBuilder::cylinder(coin.half_thickness(), coin.radius())
            .friction(self.params.friction)
            .restitution(self.params.restitution)
            .mass(self.params.coin_mass(&coin))
            .contact_skin(self.coins.contact_skin)
            .build();
        let collider = self.world.create_collider(collider, body);
        let proxy = sink.attach_coin(plan.coin_type, &coin, pose);

        let handle = self.registry.add(CoinBody {
            body,
            collider,
            coin_type: plan.coin_type,
            spawned_at: now,
            proxy,
        });
        debug!(
            "Spawned {} {} coin, population {}",
            handle,
            coin.material.name(),
            self.registry.len()
        );
        handle
    }

    /// Copy simulated poses onto proxies. Entries whose body vanished from
    /// the world are dropped. Returns how many were dropped.
    pub fn sync_proxies<S>(&mut self, sink: &mut S) -> usize
    where
        S: RenderSink<Proxy = P>,
    {
        let mut orphans = Vec::new();
        for (handle, coin) in self.registry.iter() {
            match self.world.pose(coin.body) {
                Some(pose) => sink.set_pose(coin.proxy, pose),
                None => orphans.push(handle),
            }
        }

        for handle in &orphans {
            error!("Coin {} has no rigid body, dropping it", handle);
            self.registry.remove(*handle, &mut self.world, sink);
        }
        orphans.len()
    }

    /// Remove coins below the exit height. Returns how many were removed.
    pub fn evict_fallen<S>(&mut self, sink: &mut S) -> usize
    where
        S: RenderSink<Proxy = P>,
    {
        let exit_height = self.coins.exit_height;
        let fallen: Vec<CoinHandle> = self
            .registry
            .iter()
            .filter(|(_, coin)| {
                self.world
                    .pose(coin.body)
                    .is_some_and(|pose| pose.translation.y < exit_height)
            })
            .map(|(handle, _)| handle)
            .collect();

        for handle in &fallen {
            self.registry.remove(*handle, &mut self.world, sink);
        }
        if !fallen.is_empty() {
            debug!(
                "Evicted {} coins, population {}",
                fallen.len(),
                self.registry.len()
            );
        }
        fallen.len()
    }

    /// Remove every coin. Returns how many were removed.
    pub fn reset_coins<S>(&mut self, sink: &mut S) -> usize
    where
        S: RenderSink<Proxy = P>,
    {
        let removed = self.registry.remove_all(&mut self.world, sink);
        if removed > 0 {
            info!("Removed {} coins", removed);
        }
        removed
    }

    /// Restore the configured mass, friction and restitution.
    pub fn reset_parameters(&mut self) {
        self.params.mass = self.defaults.mass;
        self.params.friction = self.defaults.friction;
        self.params.restitution = self.defaults.restitution;
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.params.set_mass(mass);
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.params.set_friction(friction);
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.params.set_restitution(restitution);
    }

    /// 0 means unlimited; negative values are treated as 0.
    pub fn set_spawn_cap(&mut self, cap: i64) {
        self.params.set_spawn_cap(cap);
    }

    pub fn set_spawn_interval(&mut self, interval: Duration) {
        self.params.set_spawn_interval(interval);
    }

    /// Tilt the tray about the x axis. Walls stay where they are.
    pub fn set_tilt_degrees<S>(&mut self, degrees: f32, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        self.params.set_tilt_degrees(degrees);
        let rotation = self.params.tilt_rotation();
        self.fixtures
            .tray
            .set_rotation(rotation, &mut self.world, sink);
    }

    pub fn set_wall_enabled<S>(&mut self, side: WallSide, enabled: bool, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        self.fixtures
            .walls
            .get_mut(side)
            .set_enabled(enabled, &mut self.world, sink);
    }

    pub fn toggle_wall<S>(&mut self, side: WallSide, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        let enabled = !self.fixtures.walls.get(side).is_enabled();
        self.set_wall_enabled(side, enabled, sink);
    }

    /// Set all walls to the opposite of the front wall's current state.
    pub fn toggle_walls<S>(&mut self, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        let enabled = !self.fixtures.walls.front.is_enabled();
        for side in WallSide::ALL {
            self.set_wall_enabled(side, enabled, sink);
        }
    }

    pub fn apply_parameter<S>(&mut self, change: ParameterChange, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        match change {
            ParameterChange::Mass(v) => self.set_mass(v),
            ParameterChange::Friction(v) => self.set_friction(v),
            ParameterChange::Restitution(v) => self.set_restitution(v),
            ParameterChange::TiltDegrees(v) => self.set_tilt_degrees(v, sink),
            ParameterChange::SpawnCap(v) => self.set_spawn_cap(i64::from(v)),
            ParameterChange::SpawnInterval(v) => self.set_spawn_interval(v),
        }
    }

    pub fn apply<S>(&mut self, command: PusherCommand, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        match command {
            PusherCommand::SetParameter(change) => self.apply_parameter(change, sink),
            PusherCommand::ResetCoins => {
                self.reset_coins(sink);
            }
            PusherCommand::ResetParameters => self.reset_parameters(),
            PusherCommand::ToggleWalls => self.toggle_walls(sink),
            PusherCommand::ToggleWall(side) => self.toggle_wall(side, sink),
        }
    }

    pub fn set_spawn_gate(&mut self, open: bool) {
        self.spawner.set_gate(open);
    }

    pub fn is_spawn_gate_open(&self) -> bool {
        self.spawner.is_gate_open()
    }

    /// Number of live coins.
    pub fn population(&self) -> usize {
        self.registry.len()
    }

    pub fn parameters(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn fixtures(&self) -> &Fixtures<P> {
        &self.fixtures
    }

    pub fn registry(&self) -> &BodyRegistry<P> {
        &self.registry
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    /// Direct world access, for tools and tests that need to move bodies.
    pub fn world_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.world
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Remove every coin and fixture proxy. The controller is halted
    /// afterwards and only good for dropping.
    pub fn shutdown<S>(&mut self, sink: &mut S)
    where
        S: RenderSink<Proxy = P>,
    {
        if self.released {
            return;
        }
        self.released = true;
        self.halted = true;
        let coins = self.registry.remove_all(&mut self.world, sink);
        sink.detach(self.fixtures.tray.proxy);
        for wall in self.fixtures.walls.iter() {
            sink.detach(wall.proxy);
        }
        info!("Simulation shut down, released {} coins", coins);
    }
}

fn validate_tray(tray: &TrayConfig) -> SimResult<()> {
    let dims = [
        tray.width,
        tray.height,
        tray.depth,
        tray.wall_height,
        tray.wall_thickness,
    ];
    if dims.iter().all(|d| d.is_finite() && *d > 0.0) {
        Ok(())
    } else {
        warn!("Rejecting tray dimensions {:?}", dims);
        Err(SimError::InvalidWorld(format!(
            "tray dimensions {:?} must be positive",
            dims
        )))
    }
}

fn validate_coins(coins: &CoinConfig) -> SimResult<()> {
    let finite = [
        coins.drop_height,
        coins.spawn_area_fraction,
        coins.exit_height,
        coins.linear_damping,
        coins.angular_damping,
        coins.contact_skin,
        coins.max_spawn_tilt_degrees,
    ]
    .iter()
    .all(|v| v.is_finite());
    let in_range = (0.0..=1.0).contains(&coins.spawn_area_fraction)
        && coins.linear_damping >= 0.0
        && coins.angular_damping >= 0.0
        && coins.contact_skin >= 0.0
        && coins.exit_height < coins.drop_height;
    if finite && in_range {
        Ok(())
    } else {
        warn!("Rejecting coin settings {:?}", coins);
        Err(SimError::InvalidWorld(format!(
            "coin settings {:?} are out of range",
            coins
        )))
    }
}
