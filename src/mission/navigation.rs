//! Navigation loop
//!
//! Every cycle first gives the stop sequencer a chance to fire (a stop takes
//! the whole cycle), then reads the line sensors and acts on the code:
//!
//! | code | action |
//! |---|---|
//! | 010 | forward under speed control until the code changes |
//! | 001, 011 | turn right |
//! | 100, 110 | turn left |
//! | anything else | nothing, motors keep their last command |

use crate::motion::{DriveActuator, MotionControl, SpeedController, TurnDirection};
use crate::port::Hardware;
use crate::sensor::{LineCode, SensorArray};
use crate::{ControlConfig, Error};

use super::{Board, CheckpointAction, CheckpointEvent, GateActuator, PhaseReport, ReturnManeuver, StopSequencer};

/// What one navigation cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Forward,
    TurnLeft,
    TurnRight,
    Hold,
    Checkpoint(CheckpointEvent),
}

/// Map a line code to the drive action
pub fn decide(code: LineCode) -> Action {
    match (code.left, code.middle, code.right) {
        (false, true, false) => Action::Forward,
        (false, false, true) | (false, true, true) => Action::TurnRight,
        (true, false, false) | (true, true, false) => Action::TurnLeft,
        _ => Action::Hold,
    }
}

pub struct NavigationLoop<'a, H: Hardware> {
    config: ControlConfig,
    sensors: SensorArray<H>,
    motion: MotionControl<'a, H>,
    gate: GateActuator<H::Servo>,
    sequencer: StopSequencer,
    maneuver: ReturnManeuver,
    last_maneuver: Option<[PhaseReport; 3]>,
}

impl<'a, H: Hardware> NavigationLoop<'a, H> {
    /// Assemble the loop from the board's ports
    ///
    /// Motors are stopped and the gate is sent home.
    pub fn new(config: ControlConfig, board: Board<'a, H>) -> Result<Self, Error> {
        config.validate()?;

        let sensors = SensorArray::new(
            board.line_left,
            board.line_middle,
            board.line_right,
            board.barrier_left,
            board.barrier_right,
            board.ultrasonic,
            config.line_threshold,
            config.ultrasonic_timeout_ms,
        );
        let speed = SpeedController::new(
            board.ticks,
            config.pid_gains,
            config.forward_setpoint,
            config.output_limit,
            config.sampling_period_ms,
        );
        let drive = DriveActuator::new(
            board.motor_left,
            board.motor_right,
            config.turn_outer_duty,
            config.turn_inner_duty,
        );
        let motion = MotionControl::new(speed, drive, board.clock, board.delay, config.reset_pid_on_phase_entry);
        let gate = GateActuator::new(
            board.servo,
            config.gate_min_angle,
            config.gate_max_angle,
            config.gate_step_delay_ms,
        );

        Ok(Self {
            sensors,
            motion,
            gate,
            sequencer: StopSequencer::new(&config),
            maneuver: ReturnManeuver::new(&config),
            last_maneuver: None,
            config,
        })
    }

    pub fn sequencer(&self) -> &StopSequencer {
        &self.sequencer
    }

    pub fn gate_angle(&self) -> u8 {
        self.gate.angle()
    }

    /// Reports of the completed return maneuver
    pub fn last_maneuver(&self) -> Option<&[PhaseReport; 3]> {
        self.last_maneuver.as_ref()
    }

    /// Run cycles until a fatal error, which is returned with both motors stopped
    pub async fn run(&mut self) -> Error {
        info!("navigation start");
        loop {
            match self.run_cycle().await {
                Ok(_) => {}
                Err(e) if !e.is_fatal() => warn!("navigation: {}", e),
                Err(e) => {
                    self.motion.halt();
                    error!("navigation halted: {}", e);
                    return e;
                }
            }
        }
    }

    /// One navigation cycle
    pub async fn run_cycle(&mut self) -> Result<Action, Error> {
        if let Some(event) = self.check_stops().await? {
            return Ok(Action::Checkpoint(event));
        }

        let code = self.sensors.line_code().await;
        let action = decide(code);
        trace!("line {} -> {}", code, action);
        match action {
            Action::Forward => self.drive_forward().await?,
            Action::TurnLeft => {
                self.motion.drive.turn(TurnDirection::Left);
                self.motion.pause(self.config.poll_interval_ms).await;
            }
            Action::TurnRight => {
                self.motion.drive.turn(TurnDirection::Right);
                self.motion.pause(self.config.poll_interval_ms).await;
            }
            Action::Hold | Action::Checkpoint(_) => self.motion.pause(self.config.poll_interval_ms).await,
        }
        Ok(action)
    }

    /// Closed-loop forward drive until the line code leaves 010
    async fn drive_forward(&mut self) -> Result<(), Error> {
        self.motion.enter_phase();
        loop {
            if self.check_stops().await?.is_some() {
                self.motion.restart_window();
            }
            if !self.sensors.line_code().await.is_centered() {
                return Ok(());
            }
            self.motion.regulate_forward();
            self.motion.pause(self.config.poll_interval_ms).await;
        }
    }

    /// Fire and carry out a checkpoint stop if one is due
    async fn check_stops(&mut self) -> Result<Option<CheckpointEvent>, Error> {
        if self.sequencer.is_finished() {
            return Ok(None);
        }
        let distance = if self.sequencer.wants_proximity() {
            self.sensors.detect_distance_cm().await
        } else {
            None
        };
        let barriers = self.sensors.barriers_crossed();
        let Some(event) = self.sequencer.evaluate(self.motion.now(), distance, barriers) else {
            return Ok(None);
        };

        info!("checkpoint {}: {}", event.count, event);
        self.motion.halt();
        match event.action {
            CheckpointAction::GateSweep { from, to } => {
                self.gate.sweep(self.motion.delay_mut(), from, to).await;
            }
            CheckpointAction::ReturnManeuver => {
                self.sequencer.begin(&event);
                match self.maneuver.run(&mut self.motion).await {
                    Ok(reports) => self.last_maneuver = Some(reports),
                    Err(e) => {
                        self.motion.halt();
                        self.sequencer.fault();
                        return Err(e);
                    }
                }
            }
        }
        self.motion.pause(self.config.checkpoint_dwell_ms).await;
        self.sequencer.commit(&event, self.motion.now());
        Ok(Some(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{SequencerState, Trigger};
    use crate::motion::{PerWheel, Wheel};
    use crate::port::Direction;
    use crate::sim::{Sim, SimBoard};

    fn code(s: &str) -> LineCode {
        LineCode::parse(s).unwrap()
    }

    fn navigation(sim: &Sim) -> NavigationLoop<'static, SimBoard> {
        NavigationLoop::new(ControlConfig::DEFAULT, sim.board()).unwrap()
    }

    fn dedup(actions: &[Action]) -> Vec<Action> {
        let mut out: Vec<Action> = Vec::new();
        for a in actions {
            if out.last() != Some(a) {
                out.push(*a);
            }
        }
        out
    }

    #[test]
    fn decision_table() {
        let expect = [
            ("010", Action::Forward),
            ("001", Action::TurnRight),
            ("011", Action::TurnRight),
            ("100", Action::TurnLeft),
            ("110", Action::TurnLeft),
            ("000", Action::Hold),
            ("101", Action::Hold),
            ("111", Action::Hold),
        ];
        for (c, action) in expect {
            assert_eq!(decide(code(c)), action, "code {c}");
        }

        let actions: Vec<_> = ["010", "010", "001", "010"].iter().map(|c| decide(code(c))).collect();
        assert_eq!(actions, [Action::Forward, Action::Forward, Action::TurnRight, Action::Forward]);
    }

    #[test]
    fn rejects_invalid_config() {
        let sim = Sim::new();
        let config = ControlConfig {
            sampling_period_ms: 0,
            ..ControlConfig::DEFAULT
        };
        assert!(matches!(
            NavigationLoop::new(config, sim.board()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn follows_the_line() {
        let sim = Sim::new();
        {
            let mut world = sim.world();
            world.distance_cm = Some(100);
            world.line_script = vec![(100, code("001")), (105, code("010")), (300, code("000"))];
        }
        let mut nav = navigation(&sim);

        let mut actions = Vec::new();
        while sim.world().now_ms < 320 {
            actions.push(embassy_futures::block_on(nav.run_cycle()).unwrap());
        }

        assert_eq!(
            dedup(&actions),
            [Action::Forward, Action::TurnRight, Action::Forward, Action::Hold]
        );
        let world = sim.world();
        assert!(world
            .motor_log
            .iter()
            .any(|entry| *entry == (100, Wheel::Left, Direction::Forward, 200)));
        assert!(world
            .motor_log
            .iter()
            .any(|entry| *entry == (100, Wheel::Right, Direction::Reverse, 150)));
        // holding keeps the last forward command
        assert_eq!(world.motors.left.0, Direction::Forward);
        assert_eq!(world.motors.right.0, Direction::Forward);
        assert!(world.delivered.left > 150);
    }

    #[test]
    fn forward_exits_when_line_lost() {
        let sim = Sim::new();
        {
            let mut world = sim.world();
            world.distance_cm = Some(100);
            world.line_script = vec![(50, code("000"))];
        }
        let mut nav = navigation(&sim);

        let action = embassy_futures::block_on(nav.run_cycle()).unwrap();
        assert_eq!(action, Action::Forward);
        assert_eq!(sim.world().now_ms, 50);
    }

    #[test]
    fn proximity_stop_closes_gate_once() {
        let sim = Sim::new();
        {
            let mut world = sim.world();
            world.set_line(code("000"));
            world.distance_cm = Some(13);
        }
        let mut nav = navigation(&sim);
        sim.world().servo_angles.clear();

        let action = embassy_futures::block_on(nav.run_cycle()).unwrap();
        let Action::Checkpoint(event) = action else {
            panic!("expected a checkpoint, got {action:?}");
        };
        assert_eq!(event.trigger, Trigger::Proximity);
        assert_eq!(nav.sequencer().checkpoints(), 1);
        assert_eq!(nav.gate_angle(), 50);
        let expected: Vec<u8> = (50..=150).rev().collect();
        assert_eq!(sim.world().servo_angles, expected);
        assert_eq!(sim.world().now_ms, 101 * 15 + 5000);

        let until = sim.world().now_ms + 5000;
        while sim.world().now_ms < until {
            assert_eq!(embassy_futures::block_on(nav.run_cycle()).unwrap(), Action::Hold);
        }
        assert_eq!(nav.sequencer().checkpoints(), 1);
        assert_eq!(sim.world().distance_reads, 1);
    }

    #[test]
    fn missing_echo_does_not_stop() {
        let sim = Sim::new();
        sim.world().set_line(code("000"));
        let mut nav = navigation(&sim);

        let action = embassy_futures::block_on(nav.run_cycle()).unwrap();
        assert_eq!(action, Action::Hold);
        assert_eq!(nav.sequencer().state(), SequencerState::Idle);
        // timed-out echo plus one poll
        assert_eq!(sim.world().now_ms, 4);
    }

    #[test]
    fn forward_without_echo_keeps_driving_forward() {
        let sim = Sim::new();
        sim.world().line_script = vec![(400, code("000"))];
        let mut nav = navigation(&sim);

        let action = embassy_futures::block_on(nav.run_cycle()).unwrap();
        assert_eq!(action, Action::Forward);

        let world = sim.world();
        assert!(world.distance_reads > 50);
        assert!(world
            .motor_log
            .iter()
            .all(|(_, _, direction, _)| *direction != Direction::Reverse));
        assert_eq!(world.motors.left.0, Direction::Forward);
        assert_eq!(world.motors.right.0, Direction::Forward);
        assert!(world.delivered.left > 300);
    }

    #[test]
    fn stops_mid_drive_and_resumes() {
        let sim = Sim::new();
        {
            let mut world = sim.world();
            world.line_script = vec![(20_000, code("000"))];
            world.distance_windows = vec![(200, 260, 13)];
            // too soon after the gate closed, then debounced
            world.barrier_windows = vec![(8_000, 8_050), (11_000, 11_050)];
        }
        let mut nav = navigation(&sim);

        let action = embassy_futures::block_on(nav.run_cycle()).unwrap();
        assert_eq!(action, Action::Forward);
        assert_eq!(nav.sequencer().checkpoints(), 2);
        assert_eq!(nav.gate_angle(), 150);
        assert!(nav.sequencer().last_checkpoint_ms().unwrap() > 11_000 + 5000);

        let world = sim.world();
        assert!(world
            .motor_log
            .iter()
            .any(|(t, wheel, direction, _)| (200..260).contains(t) && *wheel == Wheel::Left && *direction == Direction::Off));
        assert!(world
            .motor_log
            .iter()
            .any(|(t, _, direction, _)| (7_000..8_000).contains(t) && *direction == Direction::Forward));
        assert_eq!(world.motors.left.0, Direction::Forward);
    }

    /// Drive cycles until the sequencer is done, collecting `(event, commit time)`
    fn run_course(sim: &Sim, nav: &mut NavigationLoop<'static, SimBoard>) -> Result<Vec<(CheckpointEvent, u64)>, Error> {
        let mut events = Vec::new();
        for _ in 0..200_000 {
            if nav.sequencer().is_finished() {
                return Ok(events);
            }
            if let Action::Checkpoint(event) = embassy_futures::block_on(nav.run_cycle())? {
                events.push((event, sim.world().now_ms));
            }
        }
        panic!("course did not finish");
    }

    #[test]
    fn full_course() {
        let sim = Sim::new();
        {
            let mut world = sim.world();
            world.set_line(code("000"));
            world.distance_cm = Some(13);
            world.barriers = (true, true);
        }
        let mut nav = navigation(&sim);

        let events = run_course(&sim, &mut nav).unwrap();

        let actions: Vec<_> = events.iter().map(|(e, _)| e.action).collect();
        assert_eq!(
            actions,
            [
                CheckpointAction::GateSweep { from: 150, to: 50 },
                CheckpointAction::GateSweep { from: 50, to: 150 },
                CheckpointAction::GateSweep { from: 150, to: 50 },
                CheckpointAction::GateSweep { from: 50, to: 150 },
                CheckpointAction::ReturnManeuver,
            ]
        );
        assert_eq!(events[0].0.trigger, Trigger::Proximity);
        assert!(events[1..].iter().all(|(e, _)| e.trigger == Trigger::Barrier));
        for pair in events.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= 4000);
        }

        assert_eq!(nav.sequencer().state(), SequencerState::Done);
        assert_eq!(nav.sequencer().checkpoints(), 5);
        assert_eq!(nav.gate_angle(), 150);
        let reports = nav.last_maneuver().unwrap();
        assert_eq!(
            reports.map(|r| r.odometer),
            [PerWheel::new(1560, 1560), PerWheel::new(2000, 0), PerWheel::new(0, 1870)]
        );

        // bars after the course produce nothing
        for _ in 0..5000 {
            assert_eq!(embassy_futures::block_on(nav.run_cycle()).unwrap(), Action::Hold);
        }
        assert_eq!(nav.sequencer().checkpoints(), 5);
    }

    #[test]
    fn stall_halts_the_robot() {
        let sim = Sim::new();
        {
            let mut world = sim.world();
            world.set_line(code("000"));
            world.distance_cm = Some(13);
            world.barriers = (true, true);
            world.ticks_per_ms = PerWheel::new(0, 1);
        }
        let mut nav = navigation(&sim);

        let err = embassy_futures::block_on(nav.run());

        assert_eq!(
            err,
            Error::ActuationStall {
                wheel: Wheel::Left,
                phase: 1,
                ticks: 0
            }
        );
        assert_eq!(nav.sequencer().state(), SequencerState::Faulted);
        assert_eq!(nav.sequencer().checkpoints(), 4);
        assert_eq!(sim.world().motors, PerWheel::splat((Direction::Off, 0)));
        assert!(nav.last_maneuver().is_none());
    }
}
