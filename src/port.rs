//! Hardware ports
//!
//! The control core never touches peripherals directly. Everything it needs
//! from the board comes through these traits; the firmware implements them on
//! RP2350 peripherals and the tests implement them on a simulated world.
//!
//! Barrier sensors use [`embedded_hal::digital::InputPin`], encoder edges use
//! [`embedded_hal_async::digital::Wait`] and all waiting goes through
//! [`embedded_hal_async::delay::DelayNs`].

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;

use crate::Error;

/// Drive direction of one motor bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Reverse,
    /// Both direction outputs low
    Off,
}

/// Analog reflectance sensor
///
/// Readings are on a 10-bit scale (0..=1023); boards with a wider ADC scale
/// down before returning.
#[allow(async_fn_in_trait)]
pub trait AnalogSensorPort {
    async fn read(&mut self) -> u16;
}

/// Ultrasonic range finder
#[allow(async_fn_in_trait)]
pub trait UltrasonicPort {
    /// Distance to the nearest echo in centimetres
    ///
    /// Gives up after `timeout_ms` without an echo and returns
    /// [`Error::SensingTimeout`].
    async fn measure_distance_cm(&mut self, timeout_ms: u32) -> Result<u16, Error>;
}

/// Monotonic millisecond clock
pub trait MonotonicClock {
    fn now_ms(&self) -> u64;
}

/// H-bridge channel for one motor
pub trait MotorPort {
    fn set(&mut self, direction: Direction, duty: u8);
}

/// Hobby servo
pub trait ServoPort {
    /// Command an angle in degrees, 0..=180
    fn set_angle(&mut self, degrees: u8);
}

/// The set of port types a board provides
pub trait Hardware {
    type LineSensor: AnalogSensorPort;
    type BarrierSensor: InputPin;
    type Ultrasonic: UltrasonicPort;
    type Motor: MotorPort;
    type Servo: ServoPort;
    type Clock: MonotonicClock;
    type Delay: DelayNs;
}
