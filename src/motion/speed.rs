//! Closed-loop wheel speed control
//!
//! Speed is measured as encoder ticks per sampling window. Once a window has
//! elapsed the controller drains the tick counters, feeds each count to that
//! wheel's PID loop and hands back the clamped commands. There is no timer
//! interrupt behind this: the caller polls [`SpeedController::tick`] and the
//! controller decides whether a window has passed. A caller that polls late
//! gets a longer window; the drained count is scaled back to one period
//! before it reaches the PID loop.

use super::{Pid, PidGains, PerWheel, TickCounter, Wheel, Wheels};

/// Result of one sampling window
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpeedSample {
    /// Ticks drained per wheel; zero for wheels not evaluated
    pub measured: PerWheel<u32>,
    /// Length of the window the ticks were counted over
    pub elapsed_ms: u64,
    /// Signed motor command per wheel; `None` for wheels not evaluated
    pub command: PerWheel<Option<i16>>,
}

/// Per-wheel PID speed regulation over drained tick counts
pub struct SpeedController<'a> {
    counters: &'a PerWheel<TickCounter>,
    pid: PerWheel<Pid>,
    setpoint: f32,
    period_ms: u64,
    window_start: Option<u64>,
}

impl<'a> SpeedController<'a> {
    pub fn new(
        counters: &'a PerWheel<TickCounter>,
        gains: PerWheel<PidGains>,
        setpoint: f32,
        output_limit: i16,
        period_ms: u32,
    ) -> Self {
        Self {
            counters,
            pid: gains.map(|_, g| Pid::new(g, output_limit)),
            setpoint,
            period_ms: u64::from(period_ms),
            window_start: None,
        }
    }

    /// Evaluate both wheels if a sampling window has elapsed
    pub fn tick(&mut self, now_ms: u64) -> Option<SpeedSample> {
        self.tick_for(now_ms, Wheels::Both)
    }

    /// Evaluate the selected wheels if a sampling window has elapsed
    ///
    /// Only the selected wheels' counters are drained; the others keep
    /// accumulating.
    pub fn tick_for(&mut self, now_ms: u64, wheels: Wheels) -> Option<SpeedSample> {
        let elapsed_ms = match self.window_start {
            Some(start) => now_ms.saturating_sub(start),
            None => self.period_ms,
        };
        if elapsed_ms < self.period_ms {
            return None;
        }
        self.window_start = Some(now_ms);

        let mut sample = SpeedSample {
            measured: PerWheel::splat(0),
            elapsed_ms,
            command: PerWheel::splat(None),
        };
        let (period, elapsed) = (self.period_ms as f32, elapsed_ms.max(1) as f32);
        for wheel in wheels.iter() {
            let measured = self.counters[wheel].drain();
            sample.measured[wheel] = measured;
            sample.command[wheel] = Some(self.pid[wheel].update(self.setpoint, measured as f32 * period / elapsed));
        }

        trace!(
            "speed window: measured {}/{} command {}/{}",
            sample.measured.left,
            sample.measured.right,
            sample.command.left,
            sample.command.right
        );
        Some(sample)
    }

    /// Discard pending ticks and start a fresh window at `now_ms`
    pub fn begin_window(&mut self, now_ms: u64) {
        for wheel in Wheel::ALL {
            self.counters[wheel].drain();
        }
        self.window_start = Some(now_ms);
    }

    /// Zero both wheels' integral and error history
    pub fn reset_pid(&mut self) {
        self.pid.left.reset();
        self.pid.right.reset();
    }

    pub fn pid(&self, wheel: Wheel) -> &Pid {
        &self.pid[wheel]
    }
}
