//! The course: line following, checkpoint stops and the return maneuver

pub mod gate;
pub mod maneuver;
pub mod navigation;
pub mod sequencer;

pub use gate::GateActuator;
pub use maneuver::{ManeuverPhase, PhaseReport, ReturnManeuver};
pub use navigation::{decide, Action, NavigationLoop};
pub use sequencer::{CheckpointAction, CheckpointEvent, SequencerState, StopSequencer, Trigger};

use crate::motion::{PerWheel, TickCounter};
use crate::port::Hardware;

/// Every port the navigation loop takes ownership of
pub struct Board<'a, H: Hardware> {
    pub line_left: H::LineSensor,
    pub line_middle: H::LineSensor,
    pub line_right: H::LineSensor,
    pub barrier_left: H::BarrierSensor,
    pub barrier_right: H::BarrierSensor,
    pub ultrasonic: H::Ultrasonic,
    pub motor_left: H::Motor,
    pub motor_right: H::Motor,
    pub servo: H::Servo,
    pub clock: H::Clock,
    pub delay: H::Delay,
    /// Counters fed by the encoder task
    pub ticks: &'a PerWheel<TickCounter>,
}
