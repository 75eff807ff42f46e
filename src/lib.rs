//! Control core of a line-following delivery rover
//!
//! The rover follows a black line, stops at checkpoints marked by a barrier
//! bar, swings its gate at each stop and finishes with a three-phase return
//! maneuver driven by wheel odometry. Everything here is board independent;
//! the firmware binary provides the ports.
#![cfg_attr(target_os = "none", no_std)]

// must come first so the logging macros are visible everywhere
mod fmt;

pub mod config;
pub mod error;
pub mod mission;
pub mod motion;
pub mod port;
pub mod sensor;

#[cfg(test)]
mod sim;

pub use config::ControlConfig;
pub use error::Error;
