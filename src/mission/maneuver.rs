//! Return maneuver
//!
//! Three closed-loop phases driven by odometry: both wheels forward, then the
//! left wheel alone in reverse, then the right wheel alone forward. Each phase
//! ends when every active wheel's odometer reaches the phase target; a wheel
//! that arrives early is stopped while the other one finishes. The robot
//! pauses between phases.
//!
//! An active wheel that produces no ticks for the stall timeout aborts the
//! maneuver with [`Error::ActuationStall`].

use crate::motion::{MotionControl, PerWheel, Wheel, Wheels};
use crate::port::{Direction, Hardware};
use crate::{ControlConfig, Error};

/// One odometry-bounded drive phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ManeuverPhase {
    /// 1-based, as reported in errors and logs
    pub number: u8,
    pub wheels: Wheels,
    pub direction: Direction,
    pub target_ticks: u32,
}

/// What a phase achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseReport {
    pub number: u8,
    pub odometer: PerWheel<u32>,
    pub duration_ms: u64,
}

pub struct ReturnManeuver {
    phases: [ManeuverPhase; 3],
    pause_ms: u32,
    poll_interval_ms: u32,
    stall_timeout_ms: Option<u64>,
}

impl ReturnManeuver {
    pub fn new(config: &ControlConfig) -> Self {
        let [forward, reverse_left, forward_right] = config.return_phase_ticks;
        Self {
            phases: [
                ManeuverPhase {
                    number: 1,
                    wheels: Wheels::Both,
                    direction: Direction::Forward,
                    target_ticks: forward,
                },
                ManeuverPhase {
                    number: 2,
                    wheels: Wheels::Left,
                    direction: Direction::Reverse,
                    target_ticks: reverse_left,
                },
                ManeuverPhase {
                    number: 3,
                    wheels: Wheels::Right,
                    direction: Direction::Forward,
                    target_ticks: forward_right,
                },
            ],
            pause_ms: config.maneuver_pause_ms,
            poll_interval_ms: config.poll_interval_ms,
            stall_timeout_ms: config.stall_timeout_ms.map(u64::from),
        }
    }

    pub fn phases(&self) -> &[ManeuverPhase; 3] {
        &self.phases
    }

    /// Drive all three phases, pausing between them
    ///
    /// Motors are stopped on return, whether the maneuver completed or not.
    pub async fn run<H: Hardware>(&self, motion: &mut MotionControl<'_, H>) -> Result<[PhaseReport; 3], Error> {
        info!("return maneuver start");
        let mut reports = [PhaseReport {
            number: 0,
            odometer: PerWheel::splat(0),
            duration_ms: 0,
        }; 3];
        for (i, (report, phase)) in reports.iter_mut().zip(self.phases.iter()).enumerate() {
            if i > 0 {
                motion.pause(self.pause_ms).await;
            }
            let result = self.run_phase(motion, phase).await;
            motion.halt();
            *report = result?;
        }
        info!("return maneuver done");
        Ok(reports)
    }

    async fn run_phase<H: Hardware>(
        &self,
        motion: &mut MotionControl<'_, H>,
        phase: &ManeuverPhase,
    ) -> Result<PhaseReport, Error> {
        debug!(
            "maneuver phase {}: {} {} to {} ticks",
            phase.number, phase.wheels, phase.direction, phase.target_ticks
        );
        motion.halt();
        motion.enter_phase();

        let start = motion.now();
        let mut odometer = PerWheel::splat(0u32);
        let mut last_progress = PerWheel::splat(start);
        let mut arrived = PerWheel::new(
            !phase.wheels.contains(Wheel::Left),
            !phase.wheels.contains(Wheel::Right),
        );

        while let Some(active) = Wheels::from_flags(!arrived.left, !arrived.right) {
            let now = motion.now();
            if let Some(sample) = motion.speed.tick_for(now, active) {
                for wheel in active.iter() {
                    let measured = sample.measured[wheel];
                    odometer[wheel] = odometer[wheel].saturating_add(measured);
                    if measured > 0 {
                        last_progress[wheel] = now;
                    }
                    if odometer[wheel] >= phase.target_ticks {
                        arrived[wheel] = true;
                        motion.drive.stop(wheel);
                        trace!("phase {}: {} wheel arrived at {}", phase.number, wheel, odometer[wheel]);
                        continue;
                    }
                    if let Some(command) = sample.command[wheel] {
                        let command = match phase.direction {
                            Direction::Reverse => -command,
                            _ => command,
                        };
                        motion.drive.apply(wheel, command);
                    }
                }
            }

            if let Some(timeout) = self.stall_timeout_ms {
                for wheel in active.iter().filter(|w| !arrived[*w]) {
                    if now.saturating_sub(last_progress[wheel]) >= timeout {
                        error!("{} wheel stalled in phase {}", wheel, phase.number);
                        return Err(Error::ActuationStall {
                            wheel,
                            phase: phase.number,
                            ticks: odometer[wheel],
                        });
                    }
                }
            }

            motion.pause(self.poll_interval_ms).await;
        }

        Ok(PhaseReport {
            number: phase.number,
            odometer,
            duration_ms: motion.now().saturating_sub(start),
        })
    }
}
