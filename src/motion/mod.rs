//! Wheel motion: tick counting, speed regulation and motor output

pub mod control;
pub mod drive;
pub mod encoder;
pub mod pid;
pub mod speed;
pub mod tick_counter;
pub mod wheel;

pub use control::MotionControl;
pub use drive::{duty_percent, DriveActuator, TurnDirection};
pub use encoder::{count_edges, Edge};
pub use pid::{Pid, PidGains};
pub use speed::{SpeedController, SpeedSample};
pub use tick_counter::TickCounter;
pub use wheel::{PerWheel, Wheel, Wheels};
