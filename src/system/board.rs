//! RP2350 implementations of the control core's ports

use checkpoint_rover::mission::Board;
use checkpoint_rover::motion::{duty_percent, PerWheel, TickCounter, Wheel};
use checkpoint_rover::port::{AnalogSensorPort, Direction, Hardware, MonotonicClock, MotorPort, UltrasonicPort};
use checkpoint_rover::sensor::echo_to_cm;
use checkpoint_rover::Error;
use defmt::warn;
use embassy_rp::adc::Channel;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pwm::{self, Pwm};
use embassy_time::{with_timeout, Delay, Duration, Instant, Timer};
use tb6612fng::{DriveCommand, Motor};

use super::resources::{
    get_adc, BarrierSensorResources, GateServoResources, LineSensorResources, MotorDriverResources,
    UltrasonicDistanceSensorResources,
};
use super::servo::{gate_servo, Servo};

/// PWM frequency for the bridge; cheap DC motors run better at lower frequencies
const PWM_FREQ_HZ: u32 = 10_000;

/// The robot's peripherals as port types
pub struct RoverBoard;

impl Hardware for RoverBoard {
    type LineSensor = AdcLineSensor;
    type BarrierSensor = Input<'static>;
    type Ultrasonic = EchoRanger;
    type Motor = BridgeMotor;
    type Servo = Servo<'static, PIO0, 0>;
    type Clock = EmbassyClock;
    type Delay = Delay;
}

/// Reflectance sensor on a shared ADC channel
pub struct AdcLineSensor {
    channel: Channel<'static>,
}

impl AnalogSensorPort for AdcLineSensor {
    async fn read(&mut self) -> u16 {
        let mut adc = get_adc().lock().await;
        let Some(adc) = adc.as_mut() else {
            warn!("ADC not initialized");
            return 0;
        };
        match adc.read(&mut self.channel).await {
            // 12-bit conversion scaled to the 10-bit range the thresholds use
            Ok(raw) => raw >> 2,
            Err(e) => {
                warn!("line sensor read failed: {:?}", e);
                0
            }
        }
    }
}

/// HC-SR04 driven directly from two GPIOs
pub struct EchoRanger {
    trigger: Output<'static>,
    echo: Input<'static>,
}

impl UltrasonicPort for EchoRanger {
    async fn measure_distance_cm(&mut self, timeout_ms: u32) -> Result<u16, Error> {
        self.trigger.set_low();
        Timer::after_micros(2).await;
        self.trigger.set_high();
        Timer::after_micros(10).await;
        self.trigger.set_low();

        let echo = &mut self.echo;
        let pulse = async {
            echo.wait_for_high().await;
            let start = Instant::now();
            echo.wait_for_low().await;
            Instant::now() - start
        };
        let pulse = with_timeout(Duration::from_millis(u64::from(timeout_ms)), pulse)
            .await
            .map_err(|_| Error::SensingTimeout { timeout_ms })?;
        Ok(echo_to_cm(pulse.as_micros()))
    }
}

/// One motor channel of the TB6612FNG
pub struct BridgeMotor {
    wheel: Wheel,
    motor: Motor<Output<'static>, Output<'static>, Pwm<'static>>,
}

impl MotorPort for BridgeMotor {
    fn set(&mut self, direction: Direction, duty: u8) {
        let command = match direction {
            Direction::Forward => DriveCommand::Forward(duty_percent(duty)),
            Direction::Reverse => DriveCommand::Backward(duty_percent(duty)),
            Direction::Off => DriveCommand::Stop,
        };
        if self.motor.drive(command).is_err() {
            warn!("{} motor rejected a drive command", self.wheel);
        }
    }
}

/// Bring-up failures of the board
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum SetupError {
    /// The motor driver could not be put into its stopped state
    Motor(Wheel),
}

pub struct EmbassyClock;

impl MonotonicClock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}

fn motors(r: MotorDriverResources) -> Result<(BridgeMotor, BridgeMotor), SetupError> {
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
    // smallest divider that keeps the period inside the 16-bit counter
    let divider = ((clock_freq_hz / PWM_FREQ_HZ) / 65535 + 1) as u8;
    let period = (clock_freq_hz / (PWM_FREQ_HZ * u32::from(divider))) as u16 - 1;

    let mut config = pwm::Config::default();
    config.divider = divider.into();
    config.top = period;

    let left = Motor::new(
        Output::new(r.left_forward_pin, Level::Low),
        Output::new(r.left_backward_pin, Level::Low),
        Pwm::new_output_a(r.left_slice, r.left_pwm_pin, config.clone()),
    )
    .map_err(|_| SetupError::Motor(Wheel::Left))?;
    let right = Motor::new(
        Output::new(r.right_forward_pin, Level::Low),
        Output::new(r.right_backward_pin, Level::Low),
        Pwm::new_output_a(r.right_slice, r.right_pwm_pin, config),
    )
    .map_err(|_| SetupError::Motor(Wheel::Right))?;

    Ok((
        BridgeMotor {
            wheel: Wheel::Left,
            motor: left,
        },
        BridgeMotor {
            wheel: Wheel::Right,
            motor: right,
        },
    ))
}

/// Wrap the assigned resources into the ports the navigation loop takes
pub fn assemble(
    line: LineSensorResources,
    barriers: BarrierSensorResources,
    ultrasonic: UltrasonicDistanceSensorResources,
    motor_driver: MotorDriverResources,
    servo: GateServoResources,
    ticks: &'static PerWheel<TickCounter>,
) -> Result<Board<'static, RoverBoard>, SetupError> {
    let (motor_left, motor_right) = motors(motor_driver)?;
    Ok(Board {
        line_left: AdcLineSensor {
            channel: Channel::new_pin(line.left_pin, Pull::None),
        },
        line_middle: AdcLineSensor {
            channel: Channel::new_pin(line.middle_pin, Pull::None),
        },
        line_right: AdcLineSensor {
            channel: Channel::new_pin(line.right_pin, Pull::None),
        },
        barrier_left: Input::new(barriers.left_pin, Pull::None),
        barrier_right: Input::new(barriers.right_pin, Pull::None),
        ultrasonic: EchoRanger {
            trigger: Output::new(ultrasonic.trigger_pin, Level::Low),
            echo: Input::new(ultrasonic.echo_pin, Pull::None),
        },
        motor_left,
        motor_right,
        servo: gate_servo(servo),
        clock: EmbassyClock,
        delay: Delay,
        ticks,
    })
}
