use bevy::prelude::*;

use crate::fixtures::WallSide;
use crate::params::ParameterChange;

/// Discrete user commands and parameter updates for the simulation.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum PusherCommand {
    SetParameter(ParameterChange),
    /// Remove every coin
    ResetCoins,
    /// Restore mass, friction and restitution defaults
    ResetParameters,
    /// Flip all walls to the opposite of the front wall's state
    ToggleWalls,
    ToggleWall(WallSide),
}
