//! Encoder tick counting shared with the edge handlers
//!
//! The edge handlers run at interrupt priority and only ever increment. The
//! speed sampler drains: it reads and zeroes the count inside one critical
//! section, so an edge lands either before the drain (and is returned) or
//! after it (and is kept for the next drain).

use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Edge count for one wheel since the last drain
pub struct TickCounter {
    count: Mutex<CriticalSectionRawMutex, Cell<u32>>,
}

impl TickCounter {
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// Record one encoder edge
    pub fn on_edge(&self) {
        self.count.lock(|count| count.set(count.get().wrapping_add(1)));
    }

    /// Take the count accumulated since the previous drain, leaving zero behind
    pub fn drain(&self) -> u32 {
        self.count.lock(|count| count.replace(0))
    }

    /// Current count without resetting it
    pub fn peek(&self) -> u32 {
        self.count.lock(|count| count.get())
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}
