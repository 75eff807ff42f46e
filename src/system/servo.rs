//! Gate servo over PIO
//!
//! All PWM slices go to the motors, so the servo signal comes from a PIO state
//! machine running the embassy PWM program.

use core::time::Duration;

use checkpoint_rover::port::ServoPort;
use embassy_rp::pio::{Instance, Pio};
use embassy_rp::pio_programs::pwm::{PioPwm, PioPwmProgram};

use super::resources::{GateServoResources, Irqs};

const DEFAULT_MIN_PULSE_WIDTH: u64 = 1000; // uncalibrated, microseconds
const DEFAULT_MAX_PULSE_WIDTH: u64 = 2000; // uncalibrated, microseconds
const DEFAULT_MAX_DEGREE_ROTATION: u64 = 160;
const REFRESH_INTERVAL: u64 = 20000; // The period of each cycle

// SG90 on the gate: 544 us at 0 degrees, 2400 us at 180
const GATE_MIN_PULSE_WIDTH: u64 = 544;
const GATE_MAX_PULSE_WIDTH: u64 = 2400;
const GATE_MAX_DEGREE_ROTATION: u64 = 180;

pub struct ServoBuilder<'d, T: Instance, const SM: usize> {
    pwm: PioPwm<'d, T, SM>,
    period: Duration,
    min_pulse_width: Duration,
    max_pulse_width: Duration,
    max_degree_rotation: u64,
}

impl<'d, T: Instance, const SM: usize> ServoBuilder<'d, T, SM> {
    pub fn new(pwm: PioPwm<'d, T, SM>) -> Self {
        Self {
            pwm,
            period: Duration::from_micros(REFRESH_INTERVAL),
            min_pulse_width: Duration::from_micros(DEFAULT_MIN_PULSE_WIDTH),
            max_pulse_width: Duration::from_micros(DEFAULT_MAX_PULSE_WIDTH),
            max_degree_rotation: DEFAULT_MAX_DEGREE_ROTATION,
        }
    }

    pub fn set_min_pulse_width(mut self, duration: Duration) -> Self {
        self.min_pulse_width = duration;
        self
    }

    pub fn set_max_pulse_width(mut self, duration: Duration) -> Self {
        self.max_pulse_width = duration;
        self
    }

    pub fn set_max_degree_rotation(mut self, degree: u64) -> Self {
        self.max_degree_rotation = degree;
        self
    }

    pub fn build(mut self) -> Servo<'d, T, SM> {
        self.pwm.set_period(self.period);
        Servo {
            pwm: self.pwm,
            min_pulse_width: self.min_pulse_width,
            max_pulse_width: self.max_pulse_width,
            max_degree_rotation: self.max_degree_rotation,
        }
    }
}

pub struct Servo<'d, T: Instance, const SM: usize> {
    pwm: PioPwm<'d, T, SM>,
    min_pulse_width: Duration,
    max_pulse_width: Duration,
    max_degree_rotation: u64,
}

impl<'d, T: Instance, const SM: usize> Servo<'d, T, SM> {
    pub fn start(&mut self) {
        self.pwm.start();
    }

    /// Pulse width for `degree`, linear between the calibrated ends
    fn pulse_for(&self, degree: u64) -> Duration {
        let degree = degree.min(self.max_degree_rotation);
        let min = self.min_pulse_width.as_micros() as u64;
        let span = self.max_pulse_width.as_micros() as u64 - min;
        Duration::from_micros(min + span * degree / self.max_degree_rotation)
    }
}

impl<'d, T: Instance, const SM: usize> ServoPort for Servo<'d, T, SM> {
    fn set_angle(&mut self, degrees: u8) {
        let duration = self.pulse_for(u64::from(degrees));
        self.pwm.write(duration);
    }
}

/// Gate servo on its PIO state machine, started and ready for commands
pub fn gate_servo(r: GateServoResources) -> Servo<'static, embassy_rp::peripherals::PIO0, 0> {
    let Pio { mut common, sm0, .. } = Pio::new(r.pio, Irqs);
    let prg = PioPwmProgram::new(&mut common);
    let pwm_pio = PioPwm::new(&mut common, sm0, r.pin, &prg);
    let mut servo = ServoBuilder::new(pwm_pio)
        .set_max_degree_rotation(GATE_MAX_DEGREE_ROTATION)
        .set_min_pulse_width(Duration::from_micros(GATE_MIN_PULSE_WIDTH))
        .set_max_pulse_width(Duration::from_micros(GATE_MAX_PULSE_WIDTH))
        .build();
    servo.start();
    servo
}
