//! Effect selection shared between control threads and the audio path
//!
//! Control threads call [`SharedEffectState::publish`]; the audio callback
//! calls [`SharedEffectState::try_snapshot`] once per frame and never waits.
//! The selector and its parameter travel together as one value under one
//! lock, so a reader can never see a new effect paired with an old parameter.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::effects::EffectSelector;

pub struct SharedEffectState {
    selector: RwLock<EffectSelector>,
    /// Bumped on every publish
    changes: AtomicU64,
    /// Real-time reads that found the lock held and reused the last snapshot
    contended_reads: AtomicU64,
}

impl SharedEffectState {
    pub fn new(initial: EffectSelector) -> Self {
        Self {
            selector: RwLock::new(initial.clamped()),
            changes: AtomicU64::new(0),
            contended_reads: AtomicU64::new(0),
        }
    }

    /// Replace the selection; last writer wins.
    pub fn publish(&self, selector: EffectSelector) -> EffectSelector {
        let selector = selector.clamped();
        *self.selector.write() = selector;
        self.changes.fetch_add(1, Ordering::Release);
        selector
    }

    /// Blocking read for control threads
    pub fn snapshot(&self) -> EffectSelector {
        *self.selector.read()
    }

    /// Non-blocking read for the audio path.
    ///
    /// Returns `None` only while a writer holds the lock; the caller keeps
    /// using its previous snapshot for that frame.
    pub fn try_snapshot(&self) -> Option<EffectSelector> {
        match self.selector.try_read() {
            Some(guard) => Some(*guard),
            None => {
                self.contended_reads.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Number of publishes so far
    pub fn changes(&self) -> u64 {
        self.changes.load(Ordering::Acquire)
    }

    pub fn contended_reads(&self) -> u64 {
        self.contended_reads.load(Ordering::Relaxed)
    }
}

impl Default for SharedEffectState {
    fn default() -> Self {
        Self::new(EffectSelector::None)
    }
}

/// Thread-safe handle to the shared selection
pub type SharedEffectHandle = Arc<SharedEffectState>;

pub fn create_shared_state() -> SharedEffectHandle {
    Arc::new(SharedEffectState::default())
}
