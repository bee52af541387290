//! Prize gate
//!
//! The final prize card stays locked until both arcade games have been
//! attempted and the first two prize cards have been scratched. Nothing here
//! survives a page reload.

/// The two arcade games
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    Snake,
    Flappy,
}

impl GameKind {
    pub fn name(self) -> &'static str {
        match self {
            GameKind::Snake => "Snake",
            GameKind::Flappy => "Flappy",
        }
    }
}

/// Number of prize cards on the page; the last one is the gated prize
pub const PRIZE_CARDS: usize = 3;

/// Something still missing before the final card unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    PlayGame(GameKind),
    RevealCard(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Progress {
    played_snake: bool,
    played_flappy: bool,
    cards: [bool; PRIZE_CARDS],
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a game reached game over at least once
    pub fn mark_game_played(&mut self, game: GameKind) {
        let flag = match game {
            GameKind::Snake => &mut self.played_snake,
            GameKind::Flappy => &mut self.played_flappy,
        };
        if !*flag {
            log::info!("{} played for the first time", game.name());
        }
        *flag = true;
    }

    /// Record a revealed prize card; out-of-range indices are ignored
    pub fn mark_card_revealed(&mut self, index: usize) {
        match self.cards.get_mut(index) {
            Some(card) => *card = true,
            None => log::debug!("No prize card {}", index),
        }
    }

    pub fn game_played(&self, game: GameKind) -> bool {
        match game {
            GameKind::Snake => self.played_snake,
            GameKind::Flappy => self.played_flappy,
        }
    }

    pub fn card_revealed(&self, index: usize) -> bool {
        self.cards.get(index).copied().unwrap_or(false)
    }

    pub fn all_games_played(&self) -> bool {
        self.played_snake && self.played_flappy
    }

    /// Both games attempted and the first two cards scratched
    pub fn can_scratch_final(&self) -> bool {
        self.all_games_played() && self.cards[0] && self.cards[1]
    }

    pub fn final_card_locked(&self) -> bool {
        !self.can_scratch_final()
    }

    /// What is still missing, games first
    pub fn remaining_requirements(&self) -> Vec<Requirement> {
        let mut missing = Vec::new();
        for game in [GameKind::Snake, GameKind::Flappy] {
            if !self.game_played(game) {
                missing.push(Requirement::PlayGame(game));
            }
        }
        for index in 0..PRIZE_CARDS - 1 {
            if !self.cards[index] {
                missing.push(Requirement::RevealCard(index));
            }
        }
        missing
    }
}
