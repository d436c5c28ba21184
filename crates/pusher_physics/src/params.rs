//! Live-tunable simulation parameters.
//!
//! Mass, friction and restitution are read when a coin is spawned and baked
//! into its collider; changing them never touches coins that already exist.
//! Tilt is the exception and re-poses the tray as soon as it changes (see
//! `SimulationController::set_tilt_degrees`).

use std::time::Duration;

use bevy::math::Quat;
use serde::{Deserialize, Serialize};

use crate::coin::CoinType;

/// Default mass parameter. Coins keep their table mass at this value.
pub const DEFAULT_MASS: f32 = 4.0;
pub const DEFAULT_FRICTION: f32 = 0.9;
pub const DEFAULT_RESTITUTION: f32 = 0.0;
/// Minimum time between two spawns while the gate is held open (ms)
pub const DEFAULT_SPAWN_INTERVAL_MS: u64 = 50;

/// Parameter values applied to the running simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Mass scale, relative to [`DEFAULT_MASS`]
    pub mass: f32,
    /// Coulomb friction coefficient of new coins
    pub friction: f32,
    /// Restitution coefficient of new coins
    pub restitution: f32,
    /// Tray tilt about the x axis (degrees)
    pub tilt_degrees: f32,
    /// Maximum number of live coins, 0 for unlimited
    pub spawn_cap: u32,
    /// Minimum time between spawns (ms)
    pub spawn_interval_ms: u64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            mass: DEFAULT_MASS,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
            tilt_degrees: 0.0,
            spawn_cap: 0,
            spawn_interval_ms: DEFAULT_SPAWN_INTERVAL_MS,
        }
    }
}

impl SimulationParameters {
    pub fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = if mass.is_finite() && mass > 0.0 {
            mass
        } else {
            DEFAULT_MASS
        };
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.friction = coerce_coefficient(friction, DEFAULT_FRICTION);
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = coerce_coefficient(restitution, DEFAULT_RESTITUTION);
    }

    /// Negative caps are treated as unlimited.
    pub fn set_spawn_cap(&mut self, cap: i64) {
        self.spawn_cap = u32::try_from(cap.max(0)).unwrap_or(u32::MAX);
    }

    pub fn set_spawn_interval(&mut self, interval: Duration) {
        self.spawn_interval_ms = interval.as_millis().min(u64::MAX as u128) as u64;
    }

    /// Non-finite angles fall back to a level tray.
    pub fn set_tilt_degrees(&mut self, degrees: f32) {
        self.tilt_degrees = if degrees.is_finite() { degrees } else { 0.0 };
    }

    /// Copy with every value passed through its setter, for values that
    /// did not come through the setters (config files).
    pub fn sanitized(&self) -> Self {
        let mut params = self.clone();
        params.set_mass(self.mass);
        params.set_friction(self.friction);
        params.set_restitution(self.restitution);
        params.set_tilt_degrees(self.tilt_degrees);
        params
    }

    /// Whether a population of `population` coins blocks further spawns.
    pub fn cap_reached(&self, population: usize) -> bool {
        self.spawn_cap > 0 && population >= self.spawn_cap as usize
    }

    /// Collider mass for a new coin of the given type.
    pub fn coin_mass(&self, coin: &CoinType) -> f32 {
        coin.mass * self.mass / DEFAULT_MASS
    }

    /// Tray orientation for the current tilt.
    pub fn tilt_rotation(&self) -> Quat {
        tilt_rotation(self.tilt_degrees)
    }
}

fn coerce_coefficient(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        default
    }
}

/// Rotation about the x axis built from the half-angle sine and cosine.
pub fn tilt_rotation(degrees: f32) -> Quat {
    let half = degrees.to_radians() * 0.5;
    Quat::from_xyzw(half.sin(), 0.0, 0.0, half.cos())
}

/// A single parameter update coming from the input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterChange {
    Mass(f32),
    Friction(f32),
    Restitution(f32),
    TiltDegrees(f32),
    SpawnCap(u32),
    SpawnInterval(Duration),
}

impl ParameterChange {
    /// Build a change from a named text field. Returns `None` for unknown
    /// fields; unparsable values are coerced rather than rejected.
    pub fn from_text(field: &str, text: &str) -> Option<Self> {
        let change = match field {
            "mass" => ParameterChange::Mass(parse_scalar(text, DEFAULT_MASS)),
            "friction" => ParameterChange::Friction(parse_scalar(text, DEFAULT_FRICTION)),
            "restitution" => {
                ParameterChange::Restitution(parse_scalar(text, DEFAULT_RESTITUTION))
            }
            "tilt" => ParameterChange::TiltDegrees(parse_scalar(text, 0.0)),
            "cap" | "limit" => ParameterChange::SpawnCap(parse_spawn_cap(text)),
            _ => return None,
        };
        Some(change)
    }
}

/// Parse a coin limit. Anything that is not a non-negative number means
/// unlimited (0). Fractions are truncated.
pub fn parse_spawn_cap(text: &str) -> u32 {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return u32::try_from(value.max(0)).unwrap_or(u32::MAX);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

/// Parse a scalar, returning `default` for empty, malformed or non-finite input.
pub fn parse_scalar(text: &str, default: f32) -> f32 {
    match text.trim().parse::<f32>() {
        Ok(value) if value.is_finite() => value,
        _ => default,
    }
}
