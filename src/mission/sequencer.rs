//! Checkpoint sequencing
//!
//! The course has five stops. The first is announced by an obstacle placed in
//! front of the robot (the ultrasonic sensor sees it in a narrow band), the
//! other four by a bar under both barrier sensors. Each stop has a fixed
//! action:
//!
//! | count | trigger | action |
//! |---|---|---|
//! | 0 | proximity | close the gate, 150 -> 50 |
//! | 1 | barrier | open the gate, 50 -> 150 |
//! | 2 | barrier | close the gate, 150 -> 50 |
//! | 3 | barrier | open the gate, 50 -> 150 |
//! | 4 | barrier | return maneuver |
//!
//! The sequencer is pure: it decides which stop fires and keeps the count, the
//! navigation loop carries the action out and reports back with
//! [`StopSequencer::commit`].
//!
//! Barrier stops are debounced: a bar seen less than the debounce interval
//! after the previous stop completed is ignored.

use crate::ControlConfig;

/// Where the mission stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerState {
    /// Waiting for the proximity stop
    Idle,
    /// Gate closed at the first stop, waiting for the first bar
    GateOpenPending,
    Checkpoint1,
    Checkpoint2,
    Checkpoint3,
    /// Return maneuver in progress
    ReturnManeuver,
    /// All five stops done, line following continues
    Done,
    /// Return maneuver aborted
    Faulted,
}

/// What announced a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    Proximity,
    Barrier,
}

/// What to do at a stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CheckpointAction {
    GateSweep { from: u8, to: u8 },
    ReturnManeuver,
}

/// A stop that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CheckpointEvent {
    pub trigger: Trigger,
    pub action: CheckpointAction,
    /// Checkpoint count when the stop fired
    pub count: u8,
}

pub struct StopSequencer {
    state: SequencerState,
    checkpoints: u8,
    last_checkpoint_ms: Option<u64>,
    debounce_ms: u64,
    near_cm: u16,
    far_cm: u16,
    gate_min: u8,
    gate_max: u8,
}

impl StopSequencer {
    pub fn new(config: &ControlConfig) -> Self {
        Self {
            state: SequencerState::Idle,
            checkpoints: 0,
            last_checkpoint_ms: None,
            debounce_ms: u64::from(config.checkpoint_debounce_ms),
            near_cm: config.proximity_near_cm,
            far_cm: config.proximity_far_cm,
            gate_min: config.gate_min_angle,
            gate_max: config.gate_max_angle,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    pub fn checkpoints(&self) -> u8 {
        self.checkpoints
    }

    pub fn last_checkpoint_ms(&self) -> Option<u64> {
        self.last_checkpoint_ms
    }

    /// Whether a distance reading can still trigger anything
    pub fn wants_proximity(&self) -> bool {
        self.state == SequencerState::Idle
    }

    /// No more stops will fire
    pub fn is_finished(&self) -> bool {
        matches!(self.state, SequencerState::Done | SequencerState::Faulted)
    }

    fn debounced(&self, now_ms: u64) -> bool {
        match self.last_checkpoint_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.debounce_ms,
        }
    }

    fn in_proximity_band(&self, distance_cm: u16) -> bool {
        distance_cm > self.near_cm && distance_cm <= self.far_cm
    }

    /// Decide whether a stop fires on these readings
    ///
    /// `distance_cm` is `None` when nothing was measured. Does not change any
    /// state; the caller commits the event once its action is done.
    pub fn evaluate(&self, now_ms: u64, distance_cm: Option<u16>, barriers_crossed: bool) -> Option<CheckpointEvent> {
        if self.wants_proximity() {
            return match distance_cm {
                Some(d) if self.in_proximity_band(d) => Some(CheckpointEvent {
                    trigger: Trigger::Proximity,
                    action: CheckpointAction::GateSweep {
                        from: self.gate_max,
                        to: self.gate_min,
                    },
                    count: 0,
                }),
                _ => None,
            };
        }
        if !barriers_crossed || self.is_finished() || !self.debounced(now_ms) {
            return None;
        }
        let (open, close) = (
            CheckpointAction::GateSweep {
                from: self.gate_min,
                to: self.gate_max,
            },
            CheckpointAction::GateSweep {
                from: self.gate_max,
                to: self.gate_min,
            },
        );
        let action = match self.checkpoints {
            1 | 3 => open,
            2 => close,
            4 => CheckpointAction::ReturnManeuver,
            _ => return None,
        };
        Some(CheckpointEvent {
            trigger: Trigger::Barrier,
            action,
            count: self.checkpoints,
        })
    }

    /// Mark a return maneuver as started
    pub fn begin(&mut self, event: &CheckpointEvent) {
        if event.action == CheckpointAction::ReturnManeuver {
            self.state = SequencerState::ReturnManeuver;
        }
    }

    /// Record a completed stop at `now_ms`
    pub fn commit(&mut self, event: &CheckpointEvent, now_ms: u64) {
        if self.is_finished() || event.count != self.checkpoints {
            warn!("stale checkpoint event for count {} ignored", event.count);
            return;
        }
        self.checkpoints += 1;
        self.last_checkpoint_ms = Some(now_ms);
        self.state = match self.checkpoints {
            1 => SequencerState::GateOpenPending,
            2 => SequencerState::Checkpoint1,
            3 => SequencerState::Checkpoint2,
            4 => SequencerState::Checkpoint3,
            _ => SequencerState::Done,
        };
        info!("checkpoint {} done, now {}", self.checkpoints, self.state);
    }

    /// The return maneuver could not complete
    pub fn fault(&mut self) {
        self.state = SequencerState::Faulted;
    }
}
