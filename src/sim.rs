//! Simulated board for host tests
//!
//! One shared [`World`] holds simulated time, sensor inputs and actuator
//! outputs. Time only moves through [`SimDelay`] (and ultrasonic timeouts);
//! every simulated millisecond each driven wheel produces `ticks_per_ms`
//! encoder edges into the shared tick counters.

use std::cell::{RefCell, RefMut};
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType, InputPin};
use embedded_hal_async::delay::DelayNs;

use crate::mission::{Board, GateActuator};
use crate::motion::{DriveActuator, MotionControl, PerWheel, SpeedController, TickCounter, Wheel};
use crate::port::{AnalogSensorPort, Direction, Hardware, MonotonicClock, MotorPort, ServoPort, UltrasonicPort};
use crate::sensor::{LineCode, SensorArray};
use crate::{ControlConfig, Error};

pub(crate) const ON_LINE: u16 = 800;
pub(crate) const OFF_LINE: u16 = 100;

pub(crate) struct World {
    pub now_ms: u64,
    ns_carry: u32,
    /// Line code until the first scripted change
    pub line: LineCode,
    /// `(from_ms, code)` changes, sorted by time
    pub line_script: Vec<(u64, LineCode)>,
    /// Raw readings overriding the line code
    pub line_readings: Option<[u16; 3]>,
    pub barriers: (bool, bool),
    /// `[from_ms, until_ms)` intervals where both barrier sensors see a bar
    pub barrier_windows: Vec<(u64, u64)>,
    /// `None` is no echo
    pub distance_cm: Option<u16>,
    /// `[from_ms, until_ms)` intervals overriding `distance_cm`
    pub distance_windows: Vec<(u64, u64, u16)>,
    pub distance_reads: u32,
    pub motors: PerWheel<(Direction, u8)>,
    pub motor_log: Vec<(u64, Wheel, Direction, u8)>,
    pub ticks_per_ms: PerWheel<u32>,
    /// Edges produced per wheel since start
    pub delivered: PerWheel<u64>,
    pub servo_angles: Vec<u8>,
    counters: &'static PerWheel<TickCounter>,
}

impl World {
    pub fn set_line(&mut self, code: LineCode) {
        self.line = code;
        self.line_script.clear();
        self.line_readings = None;
    }

    pub fn line_at(&self, now_ms: u64) -> LineCode {
        self.line_script
            .iter()
            .rev()
            .find(|(from, _)| *from <= now_ms)
            .map_or(self.line, |(_, code)| *code)
    }

    fn reading(&self, position: usize) -> u16 {
        if let Some(readings) = self.line_readings {
            return readings[position];
        }
        let code = self.line_at(self.now_ms);
        let on = [code.left, code.middle, code.right][position];
        if on {
            ON_LINE
        } else {
            OFF_LINE
        }
    }

    fn barrier(&self, right: bool) -> bool {
        let now = self.now_ms;
        let side = if right { self.barriers.1 } else { self.barriers.0 };
        side || self.barrier_windows.iter().any(|(from, until)| (*from..*until).contains(&now))
    }

    fn distance(&self) -> Option<u16> {
        let now = self.now_ms;
        self.distance_windows
            .iter()
            .find(|(from, until, _)| (*from..*until).contains(&now))
            .map(|(_, _, d)| *d)
            .or(self.distance_cm)
    }

    pub fn advance_ms(&mut self, ms: u64) {
        for _ in 0..ms {
            self.now_ms += 1;
            for wheel in Wheel::ALL {
                let (direction, duty) = self.motors[wheel];
                if direction == Direction::Off || duty == 0 {
                    continue;
                }
                for _ in 0..self.ticks_per_ms[wheel] {
                    self.counters[wheel].on_edge();
                }
                self.delivered[wheel] += u64::from(self.ticks_per_ms[wheel]);
            }
        }
    }

    fn advance_ns(&mut self, ns: u32) {
        let total = u64::from(self.ns_carry) + u64::from(ns);
        self.ns_carry = (total % 1_000_000) as u32;
        self.advance_ms(total / 1_000_000);
    }
}

type Shared = Rc<RefCell<World>>;

pub(crate) struct SimBoard;

impl Hardware for SimBoard {
    type LineSensor = SimLineSensor;
    type BarrierSensor = SimBarrier;
    type Ultrasonic = SimUltrasonic;
    type Motor = SimMotor;
    type Servo = SimServo;
    type Clock = SimClock;
    type Delay = SimDelay;
}

pub(crate) struct SimLineSensor {
    world: Shared,
    position: usize,
}

impl AnalogSensorPort for SimLineSensor {
    async fn read(&mut self) -> u16 {
        self.world.borrow().reading(self.position)
    }
}

pub(crate) struct SimBarrier {
    world: Shared,
    right: bool,
}

impl ErrorType for SimBarrier {
    type Error = Infallible;
}

impl InputPin for SimBarrier {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.world.borrow().barrier(self.right))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.world.borrow().barrier(self.right))
    }
}

pub(crate) struct SimUltrasonic {
    world: Shared,
}

impl UltrasonicPort for SimUltrasonic {
    async fn measure_distance_cm(&mut self, timeout_ms: u32) -> Result<u16, Error> {
        let mut world = self.world.borrow_mut();
        world.distance_reads += 1;
        match world.distance() {
            Some(distance) => Ok(distance),
            None => {
                world.advance_ms(u64::from(timeout_ms));
                Err(Error::SensingTimeout { timeout_ms })
            }
        }
    }
}

pub(crate) struct SimMotor {
    world: Shared,
    wheel: Wheel,
}

impl MotorPort for SimMotor {
    fn set(&mut self, direction: Direction, duty: u8) {
        let mut world = self.world.borrow_mut();
        let now = world.now_ms;
        world.motors[self.wheel] = (direction, duty);
        world.motor_log.push((now, self.wheel, direction, duty));
    }
}

pub(crate) struct SimServo {
    world: Shared,
}

impl ServoPort for SimServo {
    fn set_angle(&mut self, degrees: u8) {
        self.world.borrow_mut().servo_angles.push(degrees);
    }
}

pub(crate) struct SimClock {
    world: Shared,
}

impl MonotonicClock for SimClock {
    fn now_ms(&self) -> u64 {
        self.world.borrow().now_ms
    }
}

pub(crate) struct SimDelay {
    world: Shared,
}

impl DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.world.borrow_mut().advance_ns(ns);
    }

    async fn delay_us(&mut self, us: u32) {
        self.world.borrow_mut().advance_ns(us.saturating_mul(1_000));
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.world.borrow_mut().advance_ms(u64::from(ms));
    }
}

pub(crate) struct Sim {
    world: Shared,
    counters: &'static PerWheel<TickCounter>,
}

impl Sim {
    /// Robot centered on the line, nothing in range, no bar, one tick per
    /// millisecond on a driven wheel
    pub fn new() -> Self {
        let counters: &'static PerWheel<TickCounter> = Box::leak(Box::new(PerWheel::<TickCounter>::default()));
        let world = World {
            now_ms: 0,
            ns_carry: 0,
            line: LineCode::CENTERED,
            line_script: Vec::new(),
            line_readings: None,
            barriers: (false, false),
            barrier_windows: Vec::new(),
            distance_cm: None,
            distance_windows: Vec::new(),
            distance_reads: 0,
            motors: PerWheel::splat((Direction::Off, 0)),
            motor_log: Vec::new(),
            ticks_per_ms: PerWheel::splat(1),
            delivered: PerWheel::splat(0),
            servo_angles: Vec::new(),
            counters,
        };
        Self {
            world: Rc::new(RefCell::new(world)),
            counters,
        }
    }

    pub fn world(&self) -> RefMut<'_, World> {
        self.world.borrow_mut()
    }

    fn line_sensor(&self, position: usize) -> SimLineSensor {
        SimLineSensor {
            world: self.world.clone(),
            position,
        }
    }

    fn barrier(&self, right: bool) -> SimBarrier {
        SimBarrier {
            world: self.world.clone(),
            right,
        }
    }

    fn motor(&self, wheel: Wheel) -> SimMotor {
        SimMotor {
            world: self.world.clone(),
            wheel,
        }
    }

    pub fn servo(&self) -> SimServo {
        SimServo {
            world: self.world.clone(),
        }
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay {
            world: self.world.clone(),
        }
    }

    pub fn clock(&self) -> SimClock {
        SimClock {
            world: self.world.clone(),
        }
    }

    pub fn sensors(&self) -> SensorArray<SimBoard> {
        let config = ControlConfig::DEFAULT;
        SensorArray::new(
            self.line_sensor(0),
            self.line_sensor(1),
            self.line_sensor(2),
            self.barrier(false),
            self.barrier(true),
            SimUltrasonic {
                world: self.world.clone(),
            },
            config.line_threshold,
            config.ultrasonic_timeout_ms,
        )
    }

    pub fn drive(&self, config: &ControlConfig) -> DriveActuator<SimMotor> {
        DriveActuator::new(
            self.motor(Wheel::Left),
            self.motor(Wheel::Right),
            config.turn_outer_duty,
            config.turn_inner_duty,
        )
    }

    pub fn motion(&self, config: &ControlConfig) -> MotionControl<'static, SimBoard> {
        let speed = SpeedController::new(
            self.counters,
            config.pid_gains,
            config.forward_setpoint,
            config.output_limit,
            config.sampling_period_ms,
        );
        MotionControl::new(
            speed,
            self.drive(config),
            self.clock(),
            self.delay(),
            config.reset_pid_on_phase_entry,
        )
    }

    pub fn gate(&self, config: &ControlConfig) -> GateActuator<SimServo> {
        GateActuator::new(
            self.servo(),
            config.gate_min_angle,
            config.gate_max_angle,
            config.gate_step_delay_ms,
        )
    }

    pub fn board(&self) -> Board<'static, SimBoard> {
        Board {
            line_left: self.line_sensor(0),
            line_middle: self.line_sensor(1),
            line_right: self.line_sensor(2),
            barrier_left: self.barrier(false),
            barrier_right: self.barrier(true),
            ultrasonic: SimUltrasonic {
                world: self.world.clone(),
            },
            motor_left: self.motor(Wheel::Left),
            motor_right: self.motor(Wheel::Right),
            servo: self.servo(),
            clock: self.clock(),
            delay: self.delay(),
            ticks: self.counters,
        }
    }
}
