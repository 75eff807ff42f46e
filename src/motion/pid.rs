//! Discrete PID loop for wheel speed
//!
//! One iteration runs per sampling window, so the time step is a constant
//! window of 1: the integral is the plain sum of errors and the derivative is
//! the plain difference of consecutive errors. The command is truncated
//! toward zero, the way the motor driver was tuned.

/// Tuning constants for one wheel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl PidGains {
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }
}

/// PID state for one wheel
#[derive(Debug, Clone)]
pub struct Pid {
    gains: PidGains,
    /// Symmetric output clamp
    limit: f32,
    integral: f32,
    previous_error: f32,
}

impl Pid {
    pub fn new(gains: PidGains, limit: i16) -> Self {
        Self {
            gains,
            limit: f32::from(limit.unsigned_abs()),
            integral: 0.0,
            previous_error: 0.0,
        }
    }

    /// Forget accumulated integral and error history
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
    }

    /// Run one iteration and return the clamped command
    pub fn update(&mut self, setpoint: f32, measured: f32) -> i16 {
        let error = setpoint - measured;

        self.integral += error;
        // Anti-windup: the integral term alone never exceeds the output range
        if self.gains.ki != 0.0 {
            let bound = self.limit / libm::fabsf(self.gains.ki);
            self.integral = self.integral.clamp(-bound, bound);
        }

        let derivative = error - self.previous_error;
        self.previous_error = error;

        let output = self.gains.kp * error + self.gains.ki * self.integral + self.gains.kd * derivative;
        if output.is_nan() {
            return 0;
        }
        output.clamp(-self.limit, self.limit) as i16
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn previous_error(&self) -> f32 {
        self.previous_error
    }
}
