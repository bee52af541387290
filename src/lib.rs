//! Birthday Arcade - minigames and scratch cards for a birthday page
//!
//! Core modules:
//! - `sim`: Deterministic simulators (obstacle dodge, grid snake, scratch reveal)
//! - `tuning`: Data-driven game balance
//! - `progress`: Prize gate across games and cards
//! - `lottery`: Three-stage scratch lottery
//! - `renderer`, `audio`: Canvas 2D painting and Web Audio cues (wasm only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod lottery;
pub mod progress;
#[cfg(target_arch = "wasm32")]
pub mod renderer;
pub mod sim;
pub mod tuning;

pub use lottery::{LotteryRound, RoundOutcome};
pub use progress::{GameKind, Progress};
pub use tuning::{Tuning, TuningError};

/// Page layout constants
pub mod consts {
    /// Obstacle canvas is at most this wide
    pub const FLAPPY_MAX_WIDTH: u32 = 360;
    /// Obstacle canvas is at most this tall
    pub const FLAPPY_MAX_HEIGHT: u32 = 500;
    /// Share of the window height the obstacle canvas may use
    pub const FLAPPY_HEIGHT_SHARE: f64 = 0.5;
    /// Snake board edge length in pixels
    pub const SNAKE_BOARD_PX: u32 = 300;
    /// id of the optional `<script type="application/json">` tuning override
    pub const TUNING_ELEMENT_ID: &str = "arcade-tuning";
}

/// Obstacle canvas size for the given container width and window height
///
/// A container that has not been laid out yet (zero width) gets the full
/// width so the canvas always has a touch target.
pub fn flappy_canvas_size(container_width: f64, window_height: f64) -> (u32, u32) {
    use consts::*;
    let width = if container_width > 0.0 {
        container_width.min(FLAPPY_MAX_WIDTH as f64)
    } else {
        FLAPPY_MAX_WIDTH as f64
    };
    let height = (window_height.max(0.0) * FLAPPY_HEIGHT_SHARE).min(FLAPPY_MAX_HEIGHT as f64);
    (width as u32, height as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flappy_canvas_size() {
        assert_eq!(flappy_canvas_size(1024.0, 2000.0), (360, 500));
        assert_eq!(flappy_canvas_size(300.0, 600.0), (300, 300));
        assert_eq!(flappy_canvas_size(-5.0, 0.0), (360, 0));
    }

    #[test]
    fn test_unmeasured_container_keeps_touch_target() {
        let (w, h) = flappy_canvas_size(0.0, 900.0);
        assert_eq!((w, h), (360, 450));
    }
}
