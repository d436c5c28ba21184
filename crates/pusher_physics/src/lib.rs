//! Simulation core for the coin pusher.
//!
//! Coins are rapier rigid bodies paired one-to-one with render proxies. The
//! [`SimulationController`] creates and destroys both halves together, steps
//! the world once per frame and applies live parameter changes. The bevy
//! [`PusherPlugin`] drives it from the app's frame loop.

pub mod coin;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod fixtures;
pub mod params;
pub mod plugin;
pub mod registry;
pub mod sink;
pub mod spawner;
pub mod world;

pub use coin::{coin_type, CoinMaterial, CoinType, COIN_TYPES};
pub use command::PusherCommand;
pub use config::{CoinConfig, PusherConfig, TrayConfig, WorldConfig};
pub use controller::{FrameReport, SimulationController};
pub use error::{ConfigError, ParseWallError, SimError, SimResult};
pub use fixtures::{FixtureKind, Fixtures, RigidFixture, WallSide, Walls};
pub use params::{
    parse_scalar, parse_spawn_cap, tilt_rotation, ParameterChange, SimulationParameters,
};
pub use plugin::{PointerCapture, ProxyWriter, PusherPlugin, PusherSystems, SimProxy, Simulation};
pub use registry::{BodyRegistry, CoinBody, CoinHandle};
pub use sink::{HeadlessProxy, HeadlessSink, Pose, ProxyKind, RenderSink};
pub use spawner::{SpawnPlan, Spawner};
pub use world::PhysicsWorld;
