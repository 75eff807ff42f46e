//! Robot firmware entry point
//!
//! Initializes the board, starts encoder counting on a high priority
//! executor and runs the navigation task in thread mode.

#![no_std]
#![no_main]

use crate::system::board;
use crate::task::{encoder::encoder, navigate::navigate};
use checkpoint_rover::motion::{PerWheel, TickCounter};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use system::resources::{
    self, AssignedResources, BarrierSensorResources, GateServoResources, LineSensorResources,
    MotorDriverResources, MotorEncoderResources, UltrasonicDistanceSensorResources,
};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Board bring-up
mod system;
/// Task implementations
mod task;

/// Executor for edge counting, preempts the navigation task
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

/// Encoder ticks, written by the encoder task and drained by navigation
static TICKS: PerWheel<TickCounter> = PerWheel::new(TickCounter::new(), TickCounter::new());

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // the line sensors share the ADC, set it up before anything reads it
    resources::init_adc(p.ADC);

    let r = split_resources!(p);

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    // counting has to run before the first speed window is evaluated
    high_spawner.spawn(encoder(r.motor_encoders, &TICKS)).unwrap();

    let board = match board::assemble(
        r.line_sensors,
        r.barrier_sensors,
        r.us_distance_sensor,
        r.motor_driver,
        r.gate_servo,
        &TICKS,
    ) {
        Ok(board) => board,
        Err(e) => {
            defmt::error!("board bring-up failed: {}", e);
            return;
        }
    };
    spawner.spawn(navigate(board)).unwrap();
}
