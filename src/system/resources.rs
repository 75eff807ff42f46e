//! Hardware Resource Management
//!
//! Hands each part of the firmware the pins and peripherals it owns.
//!
//! # Resource Groups
//! - Line sensors: three analog reflectance sensors on the ADC pins
//! - Barrier sensors: two digital bar detectors
//! - Ultrasonic: HC-SR04 trigger and echo
//! - Motors: two H-bridge channels, direction pins plus one PWM slice each
//! - Encoders: one hall sensor output per wheel
//! - Gate servo: driven by PIO since the PWM slices are taken
//!
//! # Shared Resources
//! The ADC serves all three line sensors and is kept behind a mutex.

use assign_resources::assign_resources;
use embassy_rp::adc::InterruptHandler as AdcInterruptHandler;
use embassy_rp::adc::{Adc, Async as AdcAsync};
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, ADC, PIO0};
use embassy_rp::pio::InterruptHandler as PioInterruptHandler;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

/// Global ADC instance, `None` until [`init_adc`] ran
static ADC: Mutex<CriticalSectionRawMutex, Option<Adc<'static, AdcAsync>>> = Mutex::new(None);

/// Initializes the ADC peripheral.
///
/// Call once from main, before any task that reads a line sensor is spawned.
pub fn init_adc(adc: ADC) {
    let adc = Adc::new(adc, Irqs, embassy_rp::adc::Config::default());
    critical_section::with(|_| {
        if let Ok(mut slot) = ADC.try_lock() {
            *slot = Some(adc);
        }
    });
}

/// Returns a reference to the protected ADC instance.
pub fn get_adc() -> &'static Mutex<CriticalSectionRawMutex, Option<Adc<'static, AdcAsync>>> {
    &ADC
}

assign_resources! {
    /// Reflectance sensors, left to right
    line_sensors: LineSensorResources {
        left_pin: PIN_26,
        middle_pin: PIN_27,
        right_pin: PIN_28,
    },
    /// Bar detectors under both sides of the chassis
    barrier_sensors: BarrierSensorResources {
        left_pin: PIN_10,
        right_pin: PIN_11,
    },
    /// HC-SR04 ultrasonic distance sensor pins
    us_distance_sensor: UltrasonicDistanceSensorResources {
        trigger_pin: PIN_15,
        echo_pin: PIN_14,
    },
    /// Dual H-bridge direction pins and PWM channels
    motor_driver: MotorDriverResources {
        left_slice: PWM_SLICE1,
        left_pwm_pin: PIN_2,
        left_forward_pin: PIN_21,
        left_backward_pin: PIN_20,
        right_slice: PWM_SLICE2,
        right_pwm_pin: PIN_4,
        right_forward_pin: PIN_19,
        right_backward_pin: PIN_18,
    },
    /// Hall encoder outputs
    motor_encoders: MotorEncoderResources {
        left_encoder_pin: PIN_7,
        right_encoder_pin: PIN_9,
    },
    /// Gate servo
    gate_servo: GateServoResources {
        pin: PIN_5,
        pio: PIO0,
    },
}

bind_interrupts!(pub struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});
