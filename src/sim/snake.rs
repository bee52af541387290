//! Grid snake simulator
//!
//! The snake moves one cell per step on a square grid. Steps are paced by
//! host timestamps rather than by frame count, so the loop can run at the
//! display's refresh rate while movement stays at a fixed cadence.

use glam::IVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::collections::VecDeque;

use super::signal::{Completion, CompletionCallback, CueQueue, SoundCue};
use crate::tuning::SnakeTuning;

/// One of the four grid directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Unit cell offset (y grows downward)
    pub fn delta(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnakePhase {
    Idle,
    Running,
    GameOver,
}

/// Grid snake game state
pub struct SnakeSim<R = Pcg32> {
    tuning: SnakeTuning,
    phase: SnakePhase,
    /// Head first
    segments: VecDeque<IVec2>,
    direction: Direction,
    pending_direction: Direction,
    food: IVec2,
    score: u32,
    /// Timestamp of the last executed step
    last_step_ms: Option<f64>,
    rng: R,
    completion: Completion,
    cues: CueQueue,
}

impl SnakeSim<Pcg32> {
    pub fn with_seed(tuning: SnakeTuning, seed: u64) -> Self {
        Self::new(tuning, Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> SnakeSim<R> {
    pub fn new(tuning: SnakeTuning, rng: R) -> Self {
        let mut sim = Self {
            tuning,
            phase: SnakePhase::Idle,
            segments: VecDeque::new(),
            direction: Direction::Up,
            pending_direction: Direction::Up,
            food: IVec2::ZERO,
            score: 0,
            last_step_ms: None,
            rng,
            completion: Completion::new(),
            cues: CueQueue::default(),
        };
        sim.reset_board();
        sim
    }

    pub fn set_on_complete(&mut self, callback: CompletionCallback) {
        self.completion.set(callback);
    }

    fn reset_board(&mut self) {
        self.segments = self
            .tuning
            .start_segments
            .iter()
            .map(|&(x, y)| IVec2::new(x, y))
            .collect();
        self.food = IVec2::new(self.tuning.start_food.0, self.tuning.start_food.1);
        self.direction = Direction::Up;
        self.pending_direction = Direction::Up;
        self.score = 0;
        self.last_step_ms = None;
    }

    /// Reset the board and begin a new attempt
    pub fn start(&mut self) {
        self.reset_board();
        self.cues.clear();
        self.completion.rearm();
        self.phase = SnakePhase::Running;
        log::info!("Snake started on a {0}x{0} grid", self.tuning.grid_size);
    }

    /// Queue a turn for the next step; a direct reversal is ignored
    pub fn set_pending_direction(&mut self, direction: Direction) {
        if self.phase != SnakePhase::Running {
            return;
        }
        if direction == self.direction.opposite() {
            log::debug!("Rejected reversal to {:?}", direction);
            return;
        }
        self.pending_direction = direction;
    }

    /// Run a step if the step interval has elapsed since the last one
    ///
    /// Returns whether a step ran.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        if self.phase != SnakePhase::Running {
            return false;
        }
        let due = match self.last_step_ms {
            None => true,
            Some(last) => now_ms - last >= self.tuning.step_interval_ms,
        };
        if !due {
            return false;
        }
        self.last_step_ms = Some(now_ms);
        self.step();
        true
    }

    /// One logical movement step, regardless of timing
    pub fn step(&mut self) {
        if self.phase != SnakePhase::Running {
            return;
        }

        self.direction = self.pending_direction;
        let Some(&head) = self.segments.front() else {
            return;
        };
        let new_head = head + self.direction.delta();

        if !self.on_grid(new_head) || self.segments.contains(&new_head) {
            self.game_over();
            return;
        }

        self.segments.push_front(new_head);

        if new_head == self.food {
            self.score += 1;
            self.cues.push(SoundCue::FoodEaten);
            self.respawn_food();
        } else {
            self.segments.pop_back();
        }
    }

    fn on_grid(&self, cell: IVec2) -> bool {
        let size = self.tuning.grid_size;
        (0..size).contains(&cell.x) && (0..size).contains(&cell.y)
    }

    fn respawn_food(&mut self) {
        let size = self.tuning.grid_size;
        if self.segments.len() >= (size * size) as usize {
            log::info!("Board is full, no food placed");
            return;
        }
        loop {
            let cell = IVec2::new(self.rng.random_range(0..size), self.rng.random_range(0..size));
            if !self.segments.contains(&cell) {
                self.food = cell;
                return;
            }
        }
    }

    fn game_over(&mut self) {
        self.phase = SnakePhase::GameOver;
        self.cues.push(SoundCue::GameOver);
        log::info!("Snake over, score {}", self.score);
        self.completion.fire();
    }

    pub fn phase(&self) -> SnakePhase {
        self.phase
    }

    pub fn segments(&self) -> &VecDeque<IVec2> {
        &self.segments
    }

    pub fn head(&self) -> Option<IVec2> {
        self.segments.front().copied()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending_direction
    }

    pub fn food(&self) -> IVec2 {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn grid_size(&self) -> i32 {
        self.tuning.grid_size
    }

    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        self.cues.drain()
    }

    #[cfg(test)]
    pub(crate) fn set_food(&mut self, cell: IVec2) {
        self.food = cell;
    }

    #[cfg(test)]
    pub(crate) fn set_segments(&mut self, cells: &[(i32, i32)]) {
        self.segments = cells.iter().map(|&(x, y)| IVec2::new(x, y)).collect();
    }
}
