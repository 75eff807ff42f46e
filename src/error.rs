//! Error types

use crate::motion::Wheel;

/// Things that can go wrong in the control core
///
/// A sensing timeout is absorbed by the caller as "nothing detected". An
/// actuation stall is fatal: the robot cannot recover without an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No ultrasonic echo arrived in time
    #[error("no ultrasonic echo within {timeout_ms} ms")]
    SensingTimeout { timeout_ms: u32 },
    /// A wheel stopped producing encoder ticks during the return maneuver
    #[error("{wheel:?} wheel stalled in maneuver phase {phase} after {ticks} ticks")]
    ActuationStall { wheel: Wheel, phase: u8, ticks: u32 },
    /// Configuration values that cannot work together
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl Error {
    /// Whether the robot has to halt on this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ActuationStall { .. } | Error::InvalidConfig(_))
    }
}
