//! Encoder edge counting
//!
//! Each wheel has a single-channel encoder. An edge task waits on the encoder
//! pin and bumps the wheel's [`TickCounter`] once per edge. In the firmware
//! this runs on the interrupt-priority executor, so it preempts the control
//! loop exactly like the edge interrupt it replaces.

use core::convert::Infallible;

use embedded_hal_async::digital::Wait;

use super::TickCounter;

/// Which encoder transition counts as a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
}

/// Count edges on `pin` into `counter` until the pin reports an error
pub async fn count_edges<P: Wait>(pin: &mut P, edge: Edge, counter: &TickCounter) -> Result<Infallible, P::Error> {
    loop {
        match edge {
            Edge::Rising => pin.wait_for_rising_edge().await?,
            Edge::Falling => pin.wait_for_falling_edge().await?,
        }
        counter.on_edge();
    }
}
