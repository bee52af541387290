//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One `advance` per host frame (snake paces itself by timestamp)
//! - Injected RNG only
//! - No rendering or platform dependencies
//!
//! Each simulator reports the end of an attempt through a single completion
//! callback and leaves sound cues in a queue for the host.

pub mod collision;
pub mod flappy;
pub mod scratch;
pub mod signal;
pub mod snake;

pub use collision::{GapBand, circle_hits_band, circle_hits_bounds, disc_coverage};
pub use flappy::{Body, FlappyPhase, FlappySim, Obstacle};
pub use scratch::{CoverMask, InitPoll, Rgba, ScratchCard, SurfaceProbe};
pub use signal::{Completion, CompletionCallback, SoundCue};
pub use snake::{Direction, SnakePhase, SnakeSim};
