//! Single-slot hand-off between the capture thread and the renderer
//!
//! The producer overwrites the slot on every frame and the consumer copies
//! out whatever is there. The lock is held only for a plain copy, so a slow
//! or absent reader never stalls the capture loop.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::radar::mapper::{Detection, Position};

/// Latest published detection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PublishedState {
    pub position: Position,
    pub active: bool,
    /// Incremented on every publish; 0 means nothing was published yet
    pub sequence: u64,
}

/// Producer half, the sole writer
pub struct PositionPublisher {
    slot: Arc<Mutex<PublishedState>>,
}

impl PositionPublisher {
    /// Create a publisher whose slot starts at `initial`
    pub fn new(initial: Position) -> Self {
        Self {
            slot: Arc::new(Mutex::new(PublishedState {
                position: initial,
                active: false,
                sequence: 0,
            })),
        }
    }

    /// Overwrite the slot with a new detection
    pub fn publish(&self, detection: Detection) -> u64 {
        let mut slot = self.slot.lock();
        slot.sequence += 1;
        slot.position = detection.position;
        slot.active = detection.active;
        slot.sequence
    }

    /// Read-only handle for a consumer
    pub fn observer(&self) -> PositionObserver {
        PositionObserver {
            slot: self.slot.clone(),
            last_seen: 0,
        }
    }
}

/// Consumer half
#[derive(Clone)]
pub struct PositionObserver {
    slot: Arc<Mutex<PublishedState>>,
    last_seen: u64,
}

impl PositionObserver {
    /// Copy of the most recent state
    pub fn latest(&self) -> PublishedState {
        *self.slot.lock()
    }

    /// The latest state, if anything was published since the previous call
    ///
    /// Intermediate states published between two calls are skipped.
    pub fn poll_changed(&mut self) -> Option<PublishedState> {
        let state = self.latest();
        if state.sequence == self.last_seen {
            return None;
        }
        self.last_seen = state.sequence;
        Some(state)
    }
}
