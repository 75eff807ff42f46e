//! Encoder edge counting
//!
//! Runs on the high priority interrupt executor so edges are counted while
//! the navigation task is busy. The right encoder counts rising edges, the
//! left one falling edges; both land in the shared tick counters.

use checkpoint_rover::motion::{count_edges, Edge, PerWheel, TickCounter};
use defmt::{error, info};
use embassy_futures::join::join;
use embassy_rp::gpio::{Input, Pull};

use crate::system::resources::MotorEncoderResources;

#[embassy_executor::task]
pub async fn encoder(r: MotorEncoderResources, ticks: &'static PerWheel<TickCounter>) {
    let mut left = Input::new(r.left_encoder_pin, Pull::None);
    let mut right = Input::new(r.right_encoder_pin, Pull::None);
    info!("encoder counting started");

    // GPIO waits cannot fail, so this only returns if that ever changes
    let _ = join(
        count_edges(&mut left, Edge::Falling, &ticks.left),
        count_edges(&mut right, Edge::Rising, &ticks.right),
    )
    .await;
    error!("encoder counting stopped");
}
