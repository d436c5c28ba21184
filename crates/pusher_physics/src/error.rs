//! Error types for the coin pusher simulation.
//!
//! Spawn precondition failures are not errors: a closed gate, an interval that
//! has not elapsed or a full population simply produce no coin. Errors are
//! reserved for configuration problems and backend failures.

use rapier3d::prelude::RigidBodyHandle;

/// Errors raised while creating or stepping the simulation.
#[derive(Debug)]
pub enum SimError {
    /// The physics world could not be created from the configuration
    InvalidWorld(String),
    /// Frame time handed to the step loop was negative or not finite
    InvalidFrameTime(f32),
    /// A body ended up with a non-finite position after stepping
    Diverged(RigidBodyHandle),
    /// The controller stopped after an earlier failure
    Halted,
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::InvalidWorld(msg) => write!(f, "Invalid physics world: {}", msg),
            SimError::InvalidFrameTime(dt) => write!(f, "Invalid frame time: {}", dt),
            SimError::Diverged(handle) => {
                write!(f, "Rigid body {:?} has a non-finite position", handle)
            }
            SimError::Halted => write!(f, "Simulation halted after an earlier failure"),
        }
    }
}

impl std::error::Error for SimError {}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors that can occur while loading a configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// JSON deserialization error
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// A wall name that is not one of `front`, `back`, `left` or `right`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWallError(pub String);

impl std::fmt::Display for ParseWallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown wall: {:?}", self.0)
    }
}

impl std::error::Error for ParseWallError {}
