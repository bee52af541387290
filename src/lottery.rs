//! Three-stage scratch lottery
//!
//! Every stage is a board of six scratch tiles. The first two stages are
//! rigged near misses; only the last one holds three matching prize symbols.
//! The round ends once every tile has been scratched or the player asks to
//! reveal everything at once.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::signal::{Completion, CompletionCallback, CueQueue, SoundCue};

/// Tiles on one lottery board
pub const TILES_PER_ROUND: usize = 6;

/// Symbols printed under the tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Skull,
    Frown,
    Zap,
    Heart,
    Clover,
    Gamepad,
    Gem,
    Voucher,
}

impl Symbol {
    pub fn glyph(self) -> &'static str {
        match self {
            Symbol::Skull => "💀",
            Symbol::Frown => "🙁",
            Symbol::Zap => "⚡",
            Symbol::Heart => "❤️",
            Symbol::Clover => "🍀",
            Symbol::Gamepad => "🎮",
            Symbol::Gem => "💎",
            Symbol::Voucher => "🎟️",
        }
    }
}

/// Static description of one lottery stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub title: &'static str,
    pub instruction: &'static str,
    pub symbols: [Symbol; TILES_PER_ROUND],
    pub result_message: &'static str,
    pub button_text: &'static str,
    pub is_win: bool,
}

pub const STAGES: [Stage; 3] = [
    Stage {
        title: "Card 1: Warm-up",
        instruction: "Find 3 matching symbols to win.",
        symbols: [
            Symbol::Skull,
            Symbol::Frown,
            Symbol::Zap,
            Symbol::Heart,
            Symbol::Clover,
            Symbol::Gamepad,
        ],
        result_message: "Oops... nothing matches. Try the next one!",
        button_text: "Try card 2",
        is_win: false,
    },
    Stage {
        title: "Card 2: Hope",
        instruction: "Find 3 diamonds!",
        symbols: [
            Symbol::Gem,
            Symbol::Gem,
            Symbol::Skull,
            Symbol::Frown,
            Symbol::Zap,
            Symbol::Heart,
        ],
        result_message: "So close!! One more card, this one is it.",
        button_text: "Last try (bonus)",
        is_win: false,
    },
    Stage {
        title: "Final card: The voucher",
        instruction: "Find 3 vouchers",
        symbols: [
            Symbol::Voucher,
            Symbol::Voucher,
            Symbol::Voucher,
            Symbol::Heart,
            Symbol::Zap,
            Symbol::Clover,
        ],
        result_message: "YOU WON!!!",
        button_text: "Claim prize",
        is_win: true,
    },
];

/// How a completed round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Win,
    NearMiss,
}

/// Lottery session state
pub struct LotteryRound<R = Pcg32> {
    stage_index: usize,
    /// Current stage's symbols in board order
    layout: [Symbol; TILES_PER_ROUND],
    scratched: usize,
    complete: bool,
    /// Set by `scratch_all`; the host force-reveals every tile
    reveal_all: bool,
    rng: R,
    on_win: Completion,
    cues: CueQueue,
}

impl LotteryRound<Pcg32> {
    pub fn with_seed(seed: u64) -> Self {
        Self::new(Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> LotteryRound<R> {
    /// Start at the first stage with a shuffled board
    pub fn new(rng: R) -> Self {
        let mut round = Self {
            stage_index: 0,
            layout: STAGES[0].symbols,
            scratched: 0,
            complete: false,
            reveal_all: false,
            rng,
            on_win: Completion::new(),
            cues: CueQueue::default(),
        };
        round.reset_board();
        round
    }

    /// Called once when the winning stage completes
    pub fn set_on_win(&mut self, callback: CompletionCallback) {
        self.on_win.set(callback);
    }

    fn reset_board(&mut self) {
        self.layout = self.stage().symbols;
        self.layout.shuffle(&mut self.rng);
        self.scratched = 0;
        self.complete = false;
        self.reveal_all = false;
    }

    /// One tile crossed its reveal threshold
    ///
    /// Returns the outcome on the call that completes the round.
    pub fn tile_scratched(&mut self) -> Option<RoundOutcome> {
        if self.complete {
            return None;
        }
        self.scratched += 1;
        if self.scratched >= TILES_PER_ROUND {
            Some(self.complete_round())
        } else {
            None
        }
    }

    /// Reveal every tile at once
    pub fn scratch_all(&mut self) -> Option<RoundOutcome> {
        if self.complete {
            return None;
        }
        self.reveal_all = true;
        Some(self.complete_round())
    }

    fn complete_round(&mut self) -> RoundOutcome {
        self.complete = true;
        let stage = self.stage();
        log::info!("Lottery stage {} complete", self.stage_index + 1);
        if stage.is_win {
            self.cues.push(SoundCue::Victory);
            self.on_win.fire();
            RoundOutcome::Win
        } else {
            self.cues.push(SoundCue::CardRevealed);
            RoundOutcome::NearMiss
        }
    }

    /// Move to the next stage after a losing round; returns whether it moved
    pub fn next_stage(&mut self) -> bool {
        if !self.complete || self.stage().is_win || self.stage_index + 1 >= STAGES.len() {
            log::debug!("Next stage unavailable");
            return false;
        }
        self.stage_index += 1;
        self.reset_board();
        true
    }

    /// Size of the largest group of identical symbols on the board
    pub fn matching_count(&self) -> usize {
        self.layout
            .iter()
            .map(|s| self.layout.iter().filter(|other| *other == s).count())
            .max()
            .unwrap_or(0)
    }

    pub fn stage(&self) -> &'static Stage {
        &STAGES[self.stage_index]
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    pub fn layout(&self) -> &[Symbol; TILES_PER_ROUND] {
        &self.layout
    }

    pub fn scratched(&self) -> usize {
        self.scratched
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn reveal_all_requested(&self) -> bool {
        self.reveal_all
    }

    pub fn drain_cues(&mut self) -> Vec<SoundCue> {
        self.cues.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn sorted(symbols: &[Symbol]) -> Vec<String> {
        let mut names: Vec<String> = symbols.iter().map(|s| format!("{:?}", s)).collect();
        names.sort();
        names
    }

    #[test]
    fn test_layout_is_permutation_of_stage() {
        let round = LotteryRound::with_seed(3);
        assert_eq!(sorted(round.layout()), sorted(&STAGES[0].symbols));
        assert_eq!(round.matching_count(), 1);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let a = LotteryRound::with_seed(99);
        let b = LotteryRound::with_seed(99);
        assert_eq!(a.layout(), b.layout());
    }

    #[test]
    fn test_round_completes_on_sixth_tile() {
        let mut round = LotteryRound::with_seed(1);
        for _ in 0..5 {
            assert_eq!(round.tile_scratched(), None);
        }
        assert_eq!(round.tile_scratched(), Some(RoundOutcome::NearMiss));
        assert!(round.is_complete());
        assert_eq!(round.tile_scratched(), None);
        assert_eq!(round.scratched(), 6);
    }

    #[test]
    fn test_next_stage_requires_completion() {
        let mut round = LotteryRound::with_seed(1);
        assert!(!round.next_stage());
        round.scratch_all();
        assert!(round.reveal_all_requested());
        assert!(round.next_stage());
        assert_eq!(round.stage_index(), 1);
        assert_eq!(round.scratched(), 0);
        assert!(!round.is_complete());
        assert!(!round.reveal_all_requested());
        assert_eq!(round.matching_count(), 2);
    }

    #[test]
    fn test_final_stage_wins_once() {
        let mut round = LotteryRound::with_seed(8);
        let wins = Rc::new(Cell::new(0));
        let counter = wins.clone();
        round.set_on_win(Box::new(move || counter.set(counter.get() + 1)));

        assert_eq!(round.scratch_all(), Some(RoundOutcome::NearMiss));
        assert!(round.next_stage());
        assert_eq!(round.scratch_all(), Some(RoundOutcome::NearMiss));
        assert!(round.next_stage());
        assert_eq!(round.matching_count(), 3);

        for _ in 0..5 {
            round.tile_scratched();
        }
        assert_eq!(round.tile_scratched(), Some(RoundOutcome::Win));
        assert_eq!(round.scratch_all(), None);
        assert!(!round.next_stage());
        assert_eq!(wins.get(), 1);
        assert_eq!(
            round.drain_cues(),
            vec![SoundCue::CardRevealed, SoundCue::CardRevealed, SoundCue::Victory]
        );
    }
}
