//! Board bring-up: pin assignment and the RP2350 implementations of the ports

pub mod board;
pub mod resources;
pub mod servo;
