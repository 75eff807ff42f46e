//! Compiled-in tuning
//!
//! Every threshold, gain and timing the control core uses lives here. The
//! defaults are the values the robot was tuned with on the course.
//!
//! | field | default |
//! |---|---|
//! | `forward_setpoint` | 20 ticks/window |
//! | `pid_gains.right` | Kp 3.5, Ki 9, Kd 0.6 |
//! | `pid_gains.left` | Kp 4.5, Ki 10.9, Kd 0.5 |
//! | `sampling_period_ms` | 10 |
//! | `checkpoint_debounce_ms` | 4000 |
//! | `proximity_near_cm` / `proximity_far_cm` | 11 / 15 |
//! | `return_phase_ticks` | 1560, 2000, 1870 |
//! | `ultrasonic_timeout_ms` | 3 |

use crate::motion::{PerWheel, PidGains};
use crate::Error;

/// Control core configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlConfig {
    /// Target encoder ticks per sampling window while driving
    pub forward_setpoint: f32,
    /// PID gains per wheel; the motors are not matched, hence the asymmetry
    pub pid_gains: PerWheel<PidGains>,
    /// Symmetric clamp applied to every PID output
    pub output_limit: i16,
    /// Length of one speed sampling window
    pub sampling_period_ms: u32,
    /// Minimum time between two barrier checkpoints
    pub checkpoint_debounce_ms: u32,
    /// Proximity band for the first gate stop, exclusive lower bound
    pub proximity_near_cm: u16,
    /// Proximity band for the first gate stop, inclusive upper bound
    pub proximity_far_cm: u16,
    /// Odometer targets for the three return maneuver phases
    pub return_phase_ticks: [u32; 3],
    /// Standstill after every checkpoint action
    pub checkpoint_dwell_ms: u32,
    /// Standstill between return maneuver phases
    pub maneuver_pause_ms: u32,
    /// Gate servo lower bound, degrees
    pub gate_min_angle: u8,
    /// Gate servo upper bound and home position, degrees
    pub gate_max_angle: u8,
    /// Wait after each one-degree gate step
    pub gate_step_delay_ms: u32,
    /// Duty for the outer (forward) wheel of an open-loop turn
    pub turn_outer_duty: u8,
    /// Duty for the inner (reversed) wheel of an open-loop turn
    pub turn_inner_duty: u8,
    /// Line sensor reading above which the sensor sees the line (10-bit scale)
    pub line_threshold: u16,
    /// Give up on an ultrasonic echo after this long; a 15 cm echo returns
    /// in under 1 ms, and the wait must stay well inside one sampling window
    pub ultrasonic_timeout_ms: u32,
    /// Abort the return maneuver if an active wheel makes no progress for this long
    pub stall_timeout_ms: Option<u32>,
    /// Zero the PID state whenever a drive phase starts
    pub reset_pid_on_phase_entry: bool,
    /// Pause between polls of the navigation loop
    pub poll_interval_ms: u32,
}

impl ControlConfig {
    pub const DEFAULT: Self = Self {
        forward_setpoint: 20.0,
        pid_gains: PerWheel::new(PidGains::new(4.5, 10.9, 0.5), PidGains::new(3.5, 9.0, 0.6)),
        output_limit: 255,
        sampling_period_ms: 10,
        checkpoint_debounce_ms: 4000,
        proximity_near_cm: 11,
        proximity_far_cm: 15,
        return_phase_ticks: [1560, 2000, 1870],
        checkpoint_dwell_ms: 5000,
        maneuver_pause_ms: 1000,
        gate_min_angle: 50,
        gate_max_angle: 150,
        gate_step_delay_ms: 15,
        turn_outer_duty: 200,
        turn_inner_duty: 150,
        line_threshold: 500,
        ultrasonic_timeout_ms: 3,
        stall_timeout_ms: Some(1500),
        reset_pid_on_phase_entry: false,
        poll_interval_ms: 1,
    };

    /// Reject values the control core cannot work with
    pub fn validate(&self) -> Result<(), Error> {
        if self.sampling_period_ms == 0 {
            return Err(Error::InvalidConfig("sampling period must be non-zero"));
        }
        if self.ultrasonic_timeout_ms == 0 || self.ultrasonic_timeout_ms.saturating_mul(2) > self.sampling_period_ms {
            return Err(Error::InvalidConfig("echo timeout must be at most half a sampling period"));
        }
        if self.output_limit <= 0 {
            return Err(Error::InvalidConfig("output limit must be positive"));
        }
        if self.proximity_near_cm >= self.proximity_far_cm {
            return Err(Error::InvalidConfig("proximity band is empty"));
        }
        if self.gate_min_angle >= self.gate_max_angle || self.gate_max_angle > 180 {
            return Err(Error::InvalidConfig("gate angles must satisfy min < max <= 180"));
        }
        if !self.forward_setpoint.is_finite() || self.forward_setpoint <= 0.0 {
            return Err(Error::InvalidConfig("forward setpoint must be positive"));
        }
        if self.return_phase_ticks.contains(&0) {
            return Err(Error::InvalidConfig("maneuver phase targets must be non-zero"));
        }
        Ok(())
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
