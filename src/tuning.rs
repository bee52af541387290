//! Data-driven game balance
//!
//! Every simulator constant lives in one of these tables. Variants of a
//! minigame differ only in numbers and are the named presets below. Tables
//! are fixed when a simulator is constructed.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Errors raised while loading a tuning override
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("tuning JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

fn invalid(field: &'static str, reason: &'static str) -> TuningError {
    TuningError::Invalid { field, reason }
}

/// Obstacle-dodge constants (units are canvas pixels and frames)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlappyTuning {
    /// Velocity added every frame (positive = down)
    pub gravity: f32,
    /// Velocity set by an impulse (negative = up)
    pub jump_velocity: f32,
    /// Horizontal scroll per frame
    pub obstacle_speed: f32,
    /// Frames between obstacle spawns
    pub spawn_period: u32,
    /// Vertical size of the opening in each obstacle
    pub gap_size: f32,
    /// Minimum obstacle height above and below the gap
    pub min_obstacle: f32,
    /// Obstacle width
    pub obstacle_width: f32,
    /// Horizontal forgiveness on each side of an obstacle
    pub hit_margin: f32,
    /// Obstacles are dropped once `x` is left of `-offscreen_margin`
    pub offscreen_margin: f32,
    /// Body collision radius
    pub body_radius: f32,
    /// Body spawn position
    pub body_start: (f32, f32),
    /// Rotation per unit of velocity (clamped to ±45°)
    pub tilt_factor: f32,
}

impl Default for FlappyTuning {
    fn default() -> Self {
        Self::classic()
    }
}

impl FlappyTuning {
    /// Floaty default feel
    pub fn classic() -> Self {
        Self {
            gravity: 0.4,
            jump_velocity: -7.0,
            obstacle_speed: 2.0,
            spawn_period: 120,
            gap_size: 150.0,
            min_obstacle: 50.0,
            obstacle_width: 52.0,
            hit_margin: 4.0,
            offscreen_margin: 60.0,
            body_radius: 15.0,
            body_start: (50.0, 150.0),
            tilt_factor: 0.1,
        }
    }

    /// Snappier 60fps retune: stronger gravity, faster scroll, wider gap
    pub fn turbo() -> Self {
        Self {
            gravity: 0.5,
            jump_velocity: -8.0,
            obstacle_speed: 3.0,
            spawn_period: 100,
            gap_size: 160.0,
            tilt_factor: 0.12,
            ..Self::classic()
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.gravity > 0.0) {
            return Err(invalid("flappy.gravity", "must be positive"));
        }
        if !(self.jump_velocity < 0.0) {
            return Err(invalid("flappy.jump_velocity", "must be negative (upward)"));
        }
        if !(self.obstacle_speed > 0.0) {
            return Err(invalid("flappy.obstacle_speed", "must be positive"));
        }
        if self.spawn_period == 0 {
            return Err(invalid("flappy.spawn_period", "must be at least one frame"));
        }
        if !(self.gap_size > self.body_radius * 2.0) {
            return Err(invalid("flappy.gap_size", "must fit the body"));
        }
        if !(self.body_radius > 0.0) {
            return Err(invalid("flappy.body_radius", "must be positive"));
        }
        if self.hit_margin * 2.0 >= self.obstacle_width {
            return Err(invalid("flappy.hit_margin", "leaves no solid obstacle"));
        }
        Ok(())
    }
}

/// Grid snake constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnakeTuning {
    /// Cells per side (the board is square)
    pub grid_size: i32,
    /// Minimum milliseconds between movement steps
    pub step_interval_ms: f64,
    /// Initial body, head first
    pub start_segments: Vec<(i32, i32)>,
    /// Initial food cell
    pub start_food: (i32, i32),
}

impl Default for SnakeTuning {
    fn default() -> Self {
        Self {
            grid_size: 20,
            step_interval_ms: 130.0,
            start_segments: vec![(10, 10), (10, 11), (10, 12)],
            start_food: (15, 15),
        }
    }
}

impl SnakeTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.grid_size < 2 {
            return Err(invalid("snake.grid_size", "must be at least 2"));
        }
        if !(self.step_interval_ms > 0.0) {
            return Err(invalid("snake.step_interval_ms", "must be positive"));
        }
        if self.start_segments.is_empty() {
            return Err(invalid("snake.start_segments", "needs a head"));
        }
        let on_grid = |&(x, y): &(i32, i32)| {
            (0..self.grid_size).contains(&x) && (0..self.grid_size).contains(&y)
        };
        if !self.start_segments.iter().all(on_grid) {
            return Err(invalid("snake.start_segments", "must be on the grid"));
        }
        for (i, a) in self.start_segments.iter().enumerate() {
            if self.start_segments[i + 1..].contains(a) {
                return Err(invalid("snake.start_segments", "cells must be distinct"));
            }
        }
        if !on_grid(&self.start_food) || self.start_segments.contains(&self.start_food) {
            return Err(invalid("snake.start_food", "must be a free cell on the grid"));
        }
        Ok(())
    }
}

/// Scratch-off cover constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchTuning {
    /// Erase brush radius in pixels
    pub brush_radius: f32,
    /// Erased fraction that triggers the reveal (strictly greater than)
    pub reveal_threshold: f32,
    /// Only every n-th pixel is sampled
    pub sample_stride: usize,
    /// A sampled pixel counts as erased below this alpha
    pub erased_alpha: u8,
    /// Layout probes before the cover is abandoned
    pub init_attempts: u32,
    /// Delay between layout probes
    pub init_retry_ms: u32,
    /// Delay before the first layout probe
    pub init_delay_ms: u32,
}

impl Default for ScratchTuning {
    fn default() -> Self {
        Self::card()
    }
}

impl ScratchTuning {
    /// Large prize card on the main page
    pub fn card() -> Self {
        Self {
            brush_radius: 25.0,
            reveal_threshold: 0.35,
            sample_stride: 16,
            erased_alpha: 128,
            init_attempts: 20,
            init_retry_ms: 100,
            init_delay_ms: 50,
        }
    }

    /// Small lottery tile: same threshold, finer brush
    pub fn tile() -> Self {
        Self {
            brush_radius: 20.0,
            ..Self::card()
        }
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if !(self.brush_radius > 0.0) {
            return Err(invalid("scratch.brush_radius", "must be positive"));
        }
        if !(0.0..1.0).contains(&self.reveal_threshold) {
            return Err(invalid("scratch.reveal_threshold", "must be in [0, 1)"));
        }
        if self.sample_stride == 0 {
            return Err(invalid("scratch.sample_stride", "must be at least 1"));
        }
        if self.erased_alpha == 0 {
            return Err(invalid("scratch.erased_alpha", "nothing could count as erased"));
        }
        Ok(())
    }
}

/// Full constants table for every simulator on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub flappy: FlappyTuning,
    pub snake: SnakeTuning,
    /// Prize cards on the main page
    pub scratch: ScratchTuning,
    /// Lottery tiles; fields missing from an override keep the `tile()` values
    #[serde(default = "ScratchTuning::tile", deserialize_with = "tile_override")]
    pub lottery_tile: ScratchTuning,
}

/// Merge a partial tile table over `ScratchTuning::tile()`
fn tile_override<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ScratchTuning, D::Error> {
    use serde::de::Error;
    let overrides = Map::<String, Value>::deserialize(deserializer)?;
    let mut merged = serde_json::to_value(ScratchTuning::tile()).map_err(D::Error::custom)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(overrides);
    }
    serde_json::from_value(merged).map_err(D::Error::custom)
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            flappy: FlappyTuning::default(),
            snake: SnakeTuning::default(),
            scratch: ScratchTuning::card(),
            lottery_tile: ScratchTuning::tile(),
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        self.flappy.validate()?;
        self.snake.validate()?;
        self.scratch.validate()?;
        self.lottery_tile.validate()
    }

    /// Parse an override, falling back to defaults on any error
    pub fn from_json_or_default(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Ignoring tuning override: {}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
        assert!(FlappyTuning::turbo().validate().is_ok());
        assert!(ScratchTuning::tile().validate().is_ok());
    }

    #[test]
    fn test_classic_physics_constants() {
        let t = FlappyTuning::classic();
        assert!((t.gravity - 0.4).abs() < f32::EPSILON);
        assert!((t.jump_velocity - (-7.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "flappy": { "gravity": 0.5 } }"#).unwrap();
        assert!((tuning.flappy.gravity - 0.5).abs() < f32::EPSILON);
        assert!((tuning.flappy.jump_velocity - (-7.0)).abs() < f32::EPSILON);
        assert_eq!(tuning.snake, SnakeTuning::default());
    }

    #[test]
    fn test_lottery_tile_override() {
        let tuning =
            Tuning::from_json(r#"{ "lottery_tile": { "reveal_threshold": 0.45 } }"#).unwrap();
        assert!((tuning.lottery_tile.reveal_threshold - 0.45).abs() < f32::EPSILON);
        // Fields absent from the override keep the tile values
        assert!((tuning.lottery_tile.brush_radius - 20.0).abs() < f32::EPSILON);
        assert_eq!(tuning.lottery_tile.sample_stride, ScratchTuning::tile().sample_stride);
        assert_eq!(tuning.scratch, ScratchTuning::card());
    }

    #[test]
    fn test_empty_lottery_tile_override_is_tile_preset() {
        let tuning = Tuning::from_json(r#"{ "lottery_tile": {} }"#).unwrap();
        assert_eq!(tuning.lottery_tile, ScratchTuning::tile());
        let err = Tuning::from_json(r#"{ "lottery_tile": { "brush_radius": "wide" } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Tuning::from_json(r#"{ "flappy": { "jump_velocity": 3.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "flappy.jump_velocity",
                ..
            }
        ));

        let err = Tuning::from_json(r#"{ "snake": { "start_food": [10, 11] } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "snake.start_food", .. }));

        let err =
            Tuning::from_json(r#"{ "scratch": { "reveal_threshold": 1.5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "scratch.reveal_threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_fallback_to_default() {
        let tuning = Tuning::from_json_or_default(r#"{ "snake": { "grid_size": 1 } }"#);
        assert_eq!(tuning, Tuning::default());
    }
}
