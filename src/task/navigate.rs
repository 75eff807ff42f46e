//! The navigation task: the whole course, from the first gate to the return

use checkpoint_rover::mission::{Board, NavigationLoop};
use checkpoint_rover::ControlConfig;
use defmt::{error, info};

use crate::system::board::RoverBoard;

#[embassy_executor::task]
pub async fn navigate(board: Board<'static, RoverBoard>) {
    let mut navigation = match NavigationLoop::new(ControlConfig::DEFAULT, board) {
        Ok(navigation) => navigation,
        Err(e) => {
            error!("navigation not started: {}", e);
            return;
        }
    };
    info!("navigation ready");

    let e = navigation.run().await;
    // motors are already stopped, stay put until reset
    error!("robot halted: {}", e);
    core::future::pending::<()>().await;
}
