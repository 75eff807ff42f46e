//! Line, barrier and distance sensing
//!
//! # Line sensors
//! Three reflectance sensors sit side by side under the front of the robot.
//! Each analog reading is thresholded into "sees the line" or not. No
//! filtering: a flicker across the threshold is simply re-read next cycle.
//!
//! # Barrier sensors
//! Two digital sensors, one per side, detect the black bar marking a stop.
//! A crossing counts only when both see it at the same time.
//!
//! # Distance
//! An ultrasonic range finder in front. Measurements are bounded by a timeout;
//! a missing echo means nothing is in range.

use core::fmt;

use embedded_hal::digital::InputPin;

use crate::port::{AnalogSensorPort, Hardware, UltrasonicPort};
use crate::Error;

/// Which line sensors see the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineCode {
    pub left: bool,
    pub middle: bool,
    pub right: bool,
}

impl LineCode {
    pub const fn new(left: bool, middle: bool, right: bool) -> Self {
        Self { left, middle, right }
    }

    /// Only the middle sensor on the line
    pub const CENTERED: Self = Self::new(false, true, false);

    /// Parse a three character code like `"010"`
    pub fn parse(code: &str) -> Option<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != 3 {
            return None;
        }
        let bit = |b: u8| match b {
            b'0' => Some(false),
            b'1' => Some(true),
            _ => None,
        };
        Some(Self::new(bit(bytes[0])?, bit(bytes[1])?, bit(bytes[2])?))
    }

    /// Decimal digits packed left to right, 0,1,1 becomes 11
    pub fn digits(self) -> u16 {
        u16::from(self.left) * 100 + u16::from(self.middle) * 10 + u16::from(self.right)
    }

    pub fn is_centered(self) -> bool {
        self == Self::CENTERED
    }
}

impl fmt::Display for LineCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            u8::from(self.left),
            u8::from(self.middle),
            u8::from(self.right)
        )
    }
}

/// Centimetres to the target for an echo pulse of `pulse_us`
///
/// Half the round trip at 343 m/s, truncated.
pub fn echo_to_cm(pulse_us: u64) -> u16 {
    let cm = (pulse_us / 2).saturating_mul(343) / 10_000;
    cm.min(u64::from(u16::MAX)) as u16
}

/// All sensors the control core reads
pub struct SensorArray<H: Hardware> {
    line_left: H::LineSensor,
    line_middle: H::LineSensor,
    line_right: H::LineSensor,
    barrier_left: H::BarrierSensor,
    barrier_right: H::BarrierSensor,
    ultrasonic: H::Ultrasonic,
    line_threshold: u16,
    ultrasonic_timeout_ms: u32,
}

impl<H: Hardware> SensorArray<H> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        line_left: H::LineSensor,
        line_middle: H::LineSensor,
        line_right: H::LineSensor,
        barrier_left: H::BarrierSensor,
        barrier_right: H::BarrierSensor,
        ultrasonic: H::Ultrasonic,
        line_threshold: u16,
        ultrasonic_timeout_ms: u32,
    ) -> Self {
        Self {
            line_left,
            line_middle,
            line_right,
            barrier_left,
            barrier_right,
            ultrasonic,
            line_threshold,
            ultrasonic_timeout_ms,
        }
    }

    /// Read and threshold the three line sensors
    pub async fn line_code(&mut self) -> LineCode {
        let left = self.line_left.read().await > self.line_threshold;
        let middle = self.line_middle.read().await > self.line_threshold;
        let right = self.line_right.read().await > self.line_threshold;
        LineCode::new(left, middle, right)
    }

    /// Both barrier sensors see a bar
    ///
    /// A pin read error counts as "no bar".
    pub fn barriers_crossed(&mut self) -> bool {
        matches!(self.barrier_left.is_high(), Ok(true)) && matches!(self.barrier_right.is_high(), Ok(true))
    }

    /// Bounded ultrasonic measurement
    pub async fn distance_cm(&mut self) -> Result<u16, Error> {
        self.ultrasonic.measure_distance_cm(self.ultrasonic_timeout_ms).await
    }

    /// Distance if an echo came back, `None` on timeout
    pub async fn detect_distance_cm(&mut self) -> Option<u16> {
        match self.distance_cm().await {
            Ok(distance) => Some(distance),
            Err(e) => {
                debug!("ultrasonic: {}, treating as nothing in range", e);
                None
            }
        }
    }
}
