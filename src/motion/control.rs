//! Speed regulation wired to the motors, the clock and the delay

use embedded_hal_async::delay::DelayNs;

use crate::port::{Hardware, MonotonicClock};

use super::{DriveActuator, SpeedController, SpeedSample, Wheel, Wheels};

/// Everything a closed-loop drive phase needs
pub struct MotionControl<'a, H: Hardware> {
    pub speed: SpeedController<'a>,
    pub drive: DriveActuator<H::Motor>,
    clock: H::Clock,
    delay: H::Delay,
    reset_pid_on_phase_entry: bool,
}

impl<'a, H: Hardware> MotionControl<'a, H> {
    pub fn new(
        speed: SpeedController<'a>,
        drive: DriveActuator<H::Motor>,
        clock: H::Clock,
        delay: H::Delay,
        reset_pid_on_phase_entry: bool,
    ) -> Self {
        Self {
            speed,
            drive,
            clock,
            delay,
            reset_pid_on_phase_entry,
        }
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn delay_mut(&mut self) -> &mut H::Delay {
        &mut self.delay
    }

    /// Block the control flow for `ms`
    pub async fn pause(&mut self, ms: u32) {
        self.delay.delay_ms(ms).await;
    }

    /// Start a drive phase: optionally forget PID history, then open a fresh
    /// sampling window so ticks from before the phase are not counted
    pub fn enter_phase(&mut self) {
        if self.reset_pid_on_phase_entry {
            self.speed.reset_pid();
        }
        self.restart_window();
    }

    /// Open a fresh sampling window without touching PID state
    pub fn restart_window(&mut self) {
        let now = self.now();
        self.speed.begin_window(now);
    }

    /// One closed-loop forward step on both wheels, if a window has elapsed
    pub fn regulate_forward(&mut self) -> Option<SpeedSample> {
        let now = self.now();
        let sample = self.speed.tick_for(now, Wheels::Both)?;
        for wheel in Wheel::ALL {
            if let Some(command) = sample.command[wheel] {
                self.drive.apply(wheel, command);
            }
        }
        Some(sample)
    }

    pub fn halt(&mut self) {
        self.drive.stop_all();
    }
}
