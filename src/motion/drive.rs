//! Motor output
//!
//! Turns signed wheel commands into bridge direction + PWM duty. The sign of a
//! command picks the direction, its magnitude (clamped to 255) is the duty.

use crate::port::{Direction, MotorPort};

use super::{PerWheel, Wheel};

/// Which way an open-loop turn goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnDirection {
    Left,
    Right,
}

/// Convert a signed command to bridge direction and duty
fn command_to_output(command: i16) -> (Direction, u8) {
    let duty = command.unsigned_abs().min(u16::from(u8::MAX)) as u8;
    match command {
        c if c > 0 => (Direction::Forward, duty),
        c if c < 0 => (Direction::Reverse, duty),
        _ => (Direction::Off, 0),
    }
}

/// Duty on the 0..=255 scale as a percentage, for drivers that take one
pub fn duty_percent(duty: u8) -> u8 {
    (u16::from(duty) * 100 / u16::from(u8::MAX)) as u8
}

/// Both wheel motors
pub struct DriveActuator<M: MotorPort> {
    motors: PerWheel<M>,
    turn_outer_duty: u8,
    turn_inner_duty: u8,
}

impl<M: MotorPort> DriveActuator<M> {
    /// Take ownership of the motors and make sure they start stopped
    pub fn new(left: M, right: M, turn_outer_duty: u8, turn_inner_duty: u8) -> Self {
        let mut drive = Self {
            motors: PerWheel::new(left, right),
            turn_outer_duty,
            turn_inner_duty,
        };
        drive.stop_all();
        drive
    }

    /// Apply a signed command in [-255, 255]
    pub fn apply(&mut self, wheel: Wheel, command: i16) {
        let (direction, duty) = command_to_output(command);
        self.motors[wheel].set(direction, duty);
    }

    /// Run a wheel in an explicit direction
    pub fn drive(&mut self, wheel: Wheel, direction: Direction, duty: u8) {
        self.motors[wheel].set(direction, duty);
    }

    /// Zero duty, both direction outputs low
    pub fn stop(&mut self, wheel: Wheel) {
        self.motors[wheel].set(Direction::Off, 0);
    }

    pub fn stop_all(&mut self) {
        self.stop(Wheel::Left);
        self.stop(Wheel::Right);
    }

    /// Open-loop turn: outer wheel forward, inner wheel backward
    pub fn turn(&mut self, direction: TurnDirection) {
        let (outer, inner) = match direction {
            TurnDirection::Right => (Wheel::Left, Wheel::Right),
            TurnDirection::Left => (Wheel::Right, Wheel::Left),
        };
        self.motors[outer].set(Direction::Forward, self.turn_outer_duty);
        self.motors[inner].set(Direction::Reverse, self.turn_inner_duty);
    }

    pub fn motor(&self, wheel: Wheel) -> &M {
        &self.motors[wheel]
    }
}
