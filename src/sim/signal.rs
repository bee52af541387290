//! Outward signals from the simulators
//!
//! Each simulator has exactly one completion callback and a queue of sound
//! cues. Cues are fire-and-forget: the host drains them after every tick and
//! nothing in the simulation depends on whether they actually played.

use std::fmt;

/// Sound cues a simulator can ask the host to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Body impulse in the obstacle game
    Jump,
    /// Snake ate a food cell
    FoodEaten,
    /// Either arcade game ended
    GameOver,
    /// A scratch cover was revealed
    CardRevealed,
    /// The winning lottery stage or the final prize card
    Victory,
}

/// Boxed "this attempt has concluded" notification
pub type CompletionCallback = Box<dyn FnMut()>;

/// One-shot completion notifier
///
/// `fire` is idempotent until `rearm` is called, so a simulator can call it on
/// every terminal check without double-notifying the host.
#[derive(Default)]
pub struct Completion {
    callback: Option<CompletionCallback>,
    fired: bool,
}

impl Completion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the host callback, replacing any previous one
    pub fn set(&mut self, callback: CompletionCallback) {
        self.callback = Some(callback);
    }

    /// Notify the host; returns false if this attempt already fired
    pub fn fire(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
        true
    }

    /// Allow the next attempt to fire again (called on restart)
    pub fn rearm(&mut self) {
        self.fired = false;
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("registered", &self.callback.is_some())
            .field("fired", &self.fired)
            .finish()
    }
}

/// Pending sound cues, drained by the host
#[derive(Debug, Clone, Default)]
pub struct CueQueue {
    cues: Vec<SoundCue>,
}

impl CueQueue {
    pub fn push(&mut self, cue: SoundCue) {
        self.cues.push(cue);
    }

    /// Take every queued cue, oldest first
    pub fn drain(&mut self) -> Vec<SoundCue> {
        std::mem::take(&mut self.cues)
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
