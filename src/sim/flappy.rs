//! Obstacle-dodge simulator
//!
//! A single body falls under gravity; an impulse kicks it upward. Obstacles
//! with a fixed-size opening scroll in from the right every `spawn_period`
//! frames. Touching the top or bottom of the viewport, or an obstacle outside
//! its opening, ends the attempt.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::f32::consts::FRAC_PI_4;

use super::collision::{GapBand, circle_hits_band, circle_hits_bounds};
use super::signal::{Completion, CompletionCallback, CueQueue, SoundCue};
use crate::tuning::FlappyTuning;

/// Simulator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlappyPhase {
    /// Constructed, waiting for the first start
    Idle,
    /// Advancing every frame
    Running,
    /// Frozen until the next start
    GameOver,
}

/// The player's body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    /// Vertical velocity (positive = down)
    pub velocity: f32,
    /// Tilt in radians, derived from velocity
    pub rotation: f32,
}

impl Body {
    fn at(start: (f32, f32)) -> Self {
        Self {
            pos: Vec2::new(start.0, start.1),
            velocity: 0.0,
            rotation: 0.0,
        }
    }
}

/// An obstacle pair (upper and lower part) with an opening between them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Left edge
    pub x: f32,
    /// Height of the upper part, i.e. where the opening starts
    pub gap_top: f32,
    /// Whether the body has cleared this obstacle (for scoring)
    pub passed: bool,
}

/// Obstacle-dodge game state
pub struct FlappySim<R = Pcg32> {
    tuning: FlappyTuning,
    width: f32,
    height: f32,
    phase: FlappyPhase,
    body: Body,
    /// Spawn order, which is also left-to-right order
    obstacles: Vec<Obstacle>,
    score: u32,
    /// Frames advanced since start
    frame: u32,
    rng: R,
    completion: Completion,
    cues: CueQueue,
}

impl FlappySim<Pcg32> {
    /// Create a simulator with a seeded PCG generator
    pub fn with_seed(tuning: FlappyTuning, width: f32, height: f32, seed: u64) -> Self {
        Self::new(tuning, width, height, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> FlappySim<R> {
    pub fn new(tuning: FlappyTuning, width: f32, height: f32, rng: R) -> Self {
        let body = Body::at(tuning.body_start);
        Self {
            tuning,
            width,
            height,
            phase: FlappyPhase::Idle,
            body,
            obstacles: Vec::new(),
            score: 0,
            frame: 0,
            rng,
            completion: Completion::new(),
            cues: CueQueue::default(),
        }
    }

    /// Register the completion callback
    pub fn set_on_complete(&mut self, callback: CompletionCallback) {
        self.completion.set(callback);
    }

    /// Reset everything and begin a new attempt
    pub fn start(&mut self) {
        self.body = Body::at(self.tuning.body_start);
        self.obstacles.clear();
        self.score = 0;
        self.frame = 0;
        self.cues.clear();
        self.completion.rearm();
        self.phase = FlappyPhase::Running;
        log::info!("Obstacle run started ({}x{})", self.width, self.height);
    }

    /// Kick the body upward; ignored unless running
    pub fn apply_impulse(&mut self) {
        if self.phase != FlappyPhase::Running {
            log::debug!("Impulse ignored in {:?}", self.phase);
            return;
        }
        self.body.velocity = self.tuning.jump_velocity;
        self.cues.push(SoundCue::Jump);
    }

    /// Advance one frame
    pub fn advance(&mut self) {
        if self.phase != FlappyPhase::Running {
            return;
        }

        // Integrate
        self.body.velocity += self.tuning.gravity;
        self.body.pos.y += self.body.velocity;
        self.body.rotation = (self.body.velocity * self.tuning.tilt_factor).clamp(-FRAC_PI_4, FRAC_PI_4);

        if self.frame % self.tuning.spawn_period == 0 {
            self.spawn_obstacle();
        }

        // Scroll, dropping the leftmost once it is fully off-screen
        for obstacle in &mut self.obstacles {
            obstacle.x -= self.tuning.obstacle_speed;
        }
        if self
            .obstacles
            .first()
            .is_some_and(|o| o.x < -self.tuning.offscreen_margin)
        {
            self.obstacles.remove(0);
        }

        let hit = circle_hits_bounds(self.body.pos, self.tuning.body_radius, self.height)
            || self
                .obstacles
                .iter()
                .any(|o| circle_hits_band(self.body.pos, self.tuning.body_radius, &self.band(o)));

        // Scoring is independent of the collision result
        let body_x = self.body.pos.x;
        let width = self.tuning.obstacle_width;
        for obstacle in &mut self.obstacles {
            if !obstacle.passed && body_x > obstacle.x + width {
                obstacle.passed = true;
                self.score += 1;
            }
        }

        if hit {
            self.game_over();
            return;
        }

        self.frame += 1;
    }

    /// Update the viewport after a host resize
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    fn spawn_obstacle(&mut self) {
        let min = self.tuning.min_obstacle.floor() as i32;
        let max = (self.height - self.tuning.gap_size - self.tuning.min_obstacle).floor() as i32;
        let gap_top = if max > min {
            self.rng.random_range(min..=max)
        } else {
            min
        };
        log::debug!("Obstacle spawned at frame {} (gap_top {})", self.frame, gap_top);
        self.obstacles.push(Obstacle {
            x: self.width,
            gap_top: gap_top as f32,
            passed: false,
        });
    }

    fn band(&self, obstacle: &Obstacle) -> GapBand {
        GapBand {
            left: obstacle.x + self.tuning.hit_margin,
            right: obstacle.x + self.tuning.obstacle_width - self.tuning.hit_margin,
            gap_top: obstacle.gap_top,
            gap_bottom: obstacle.gap_top + self.tuning.gap_size,
        }
    }

    fn game_over(&mut self) {
        self.phase = FlappyPhase::GameOver;
        self.cues.push(SoundCue::GameOver);
        log::info!("Obstacle run over, score {}", self.score);
        self.completion.fire();
    }

    pub fn phase(&self) -> FlappyPhase {
        self.phase
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn tuning(&self) -> &FlappyTuning {
        &self.tuning
    }

    /// Take the sound cues queued since the last drain
    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        self.cues.drain()
    }

    #[cfg(test)]
    pub(crate) fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    #[cfg(test)]
    pub(crate) fn obstacles_mut(&mut self) -> &mut Vec<Obstacle> {
        &mut self.obstacles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const W: f32 = 360.0;
    const H: f32 = 500.0;

    fn running() -> FlappySim {
        let mut sim = FlappySim::with_seed(FlappyTuning::classic(), W, H, 7);
        sim.start();
        sim
    }

    fn counted(sim: &mut FlappySim) -> Rc<Cell<u32>> {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        sim.set_on_complete(Box::new(move || counter.set(counter.get() + 1)));
        calls
    }

    #[test]
    fn test_idle_until_started() {
        let mut sim = FlappySim::with_seed(FlappyTuning::classic(), W, H, 1);
        assert_eq!(sim.phase(), FlappyPhase::Idle);
        sim.apply_impulse();
        sim.advance();
        assert_eq!(sim.body().velocity, 0.0);
        assert_eq!(sim.frame(), 0);
        assert!(sim.drain_cues().is_empty());
    }

    #[test]
    fn test_gravity_from_rest() {
        let mut sim = running();
        sim.advance();
        assert!((sim.body().velocity - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_impulse_then_advance() {
        let mut sim = running();
        sim.apply_impulse();
        sim.advance();
        assert!((sim.body().velocity - (-6.6)).abs() < 1e-5);
        assert_eq!(sim.drain_cues(), vec![SoundCue::Jump]);
    }

    #[test]
    fn test_impulse_overrides_velocity() {
        let mut sim = running();
        sim.body_mut().velocity = 12.0;
        sim.apply_impulse();
        assert!((sim.body().velocity - (-7.0)).abs() < 1e-6);
    }

    #[test]
    fn test_free_fall_scenario() {
        let mut sim = running();
        let mut last_y = sim.body().pos.y;
        for k in 1..=10 {
            sim.advance();
            assert_eq!(sim.phase(), FlappyPhase::Running);
            assert!(sim.body().pos.y > last_y);
            assert!((sim.body().velocity - k as f32 * 0.4).abs() < 1e-4);
            last_y = sim.body().pos.y;
        }
    }

    #[test]
    fn test_rotation_clamped() {
        let mut sim = running();
        sim.body_mut().velocity = 30.0;
        sim.body_mut().pos.y = 200.0;
        sim.advance();
        assert!((sim.body().rotation - FRAC_PI_4).abs() < 1e-6);

        sim.start();
        sim.apply_impulse();
        sim.advance();
        // -6.6 * 0.1 = -0.66, inside the clamp
        assert!((sim.body().rotation - (-0.66)).abs() < 1e-5);
    }

    #[test]
    fn test_first_frame_spawns_obstacle() {
        let mut sim = running();
        sim.advance();
        assert_eq!(sim.obstacles().len(), 1);
        let o = sim.obstacles()[0];
        assert!((o.x - (W - 2.0)).abs() < 1e-6);
        assert!(o.gap_top >= 50.0 && o.gap_top <= H - 150.0 - 50.0);
        assert!(!o.passed);
    }

    #[test]
    fn test_spawn_positions_follow_rng() {
        let mut a = FlappySim::with_seed(FlappyTuning::classic(), W, H, 42);
        let mut b = FlappySim::with_seed(FlappyTuning::classic(), W, H, 42);
        a.start();
        b.start();
        a.advance();
        b.advance();

        let mut expected = Pcg32::seed_from_u64(42);
        let gap_top = expected.random_range(50..=300) as f32;
        assert_eq!(a.obstacles()[0].gap_top, gap_top);
        assert_eq!(a.obstacles(), b.obstacles());
    }

    #[test]
    fn test_short_viewport_clamps_gap() {
        let mut sim = FlappySim::with_seed(FlappyTuning::classic(), W, 200.0, 3);
        sim.start();
        sim.advance();
        assert_eq!(sim.obstacles()[0].gap_top, 50.0);
    }

    #[test]
    fn test_spawn_period() {
        let mut sim = running();
        // Keep the body hovering mid-screen
        for _ in 0..=120 {
            sim.body_mut().pos.y = 250.0;
            sim.body_mut().velocity = 0.0;
            sim.obstacles_mut().iter_mut().for_each(|o| o.gap_top = 175.0);
            sim.advance();
        }
        assert_eq!(sim.phase(), FlappyPhase::Running);
        assert_eq!(sim.obstacles().len(), 2);
    }

    #[test]
    fn test_offscreen_obstacle_dropped() {
        let mut sim = running();
        sim.advance();
        sim.obstacles_mut()[0].x = -59.0;
        sim.obstacles_mut()[0].passed = true;
        sim.body_mut().pos.y = 250.0;
        sim.body_mut().velocity = 0.0;
        sim.advance();
        assert!(sim.obstacles().is_empty());
    }

    #[test]
    fn test_floor_collision() {
        let mut sim = running();
        let calls = counted(&mut sim);
        sim.body_mut().pos.y = H - 15.0 - 0.2;
        sim.advance();
        assert_eq!(sim.phase(), FlappyPhase::GameOver);
        assert_eq!(calls.get(), 1);
        assert_eq!(sim.drain_cues(), vec![SoundCue::GameOver]);
    }

    #[test]
    fn test_ceiling_collision() {
        let mut sim = running();
        sim.body_mut().pos.y = 20.0;
        sim.apply_impulse();
        sim.advance();
        assert_eq!(sim.phase(), FlappyPhase::GameOver);
    }

    #[test]
    fn test_obstacle_collision_outside_gap() {
        let mut sim = running();
        sim.body_mut().pos.y = 100.0;
        sim.obstacles_mut().push(Obstacle {
            x: 40.0,
            gap_top: 250.0,
            passed: false,
        });
        sim.advance();
        assert_eq!(sim.phase(), FlappyPhase::GameOver);
    }

    #[test]
    fn test_no_collision_inside_gap() {
        let mut sim = running();
        sim.body_mut().pos.y = 200.0;
        sim.obstacles_mut().push(Obstacle {
            x: 40.0,
            gap_top: 120.0,
            passed: false,
        });
        sim.advance();
        assert_eq!(sim.phase(), FlappyPhase::Running);
    }

    #[test]
    fn test_score_counted_once() {
        let mut sim = running();
        sim.obstacles_mut().push(Obstacle {
            x: -5.0,
            gap_top: 200.0,
            passed: false,
        });
        sim.body_mut().pos.y = 250.0;
        sim.advance();
        assert_eq!(sim.score(), 1);
        sim.body_mut().pos.y = 250.0;
        sim.body_mut().velocity = 0.0;
        sim.advance();
        assert_eq!(sim.phase(), FlappyPhase::Running);
        assert_eq!(sim.score(), 1);
    }

    #[test]
    fn test_score_counted_on_terminal_tick() {
        let mut sim = running();
        sim.obstacles_mut().push(Obstacle {
            x: -5.0,
            gap_top: 100.0,
            passed: false,
        });
        sim.body_mut().pos.y = H;
        sim.advance();
        assert_eq!(sim.phase(), FlappyPhase::GameOver);
        assert_eq!(sim.score(), 1);
    }

    #[test]
    fn test_frozen_after_game_over() {
        let mut sim = running();
        let calls = counted(&mut sim);
        sim.body_mut().pos.y = H;
        sim.advance();
        let body = *sim.body();
        sim.advance();
        sim.apply_impulse();
        assert_eq!(*sim.body(), body);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_restart_resets_state() {
        let mut sim = running();
        let calls = counted(&mut sim);
        sim.advance();
        sim.body_mut().pos.y = H;
        sim.advance();
        assert_eq!(calls.get(), 1);

        sim.start();
        assert_eq!(sim.phase(), FlappyPhase::Running);
        assert_eq!(sim.score(), 0);
        assert_eq!(sim.frame(), 0);
        assert!(sim.obstacles().is_empty());
        assert_eq!(sim.body().pos, Vec2::new(50.0, 150.0));

        sim.body_mut().pos.y = H;
        sim.advance();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_turbo_preset() {
        let mut sim = FlappySim::with_seed(FlappyTuning::turbo(), W, H, 9);
        sim.start();
        sim.apply_impulse();
        sim.advance();
        assert!((sim.body().velocity - (-7.5)).abs() < 1e-5);
        assert!((sim.obstacles()[0].x - (W - 3.0)).abs() < 1e-6);
    }
}
