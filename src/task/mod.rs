//! Firmware tasks

pub mod encoder;
pub mod navigate;
