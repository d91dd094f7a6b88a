//! Scoring pipeline.
//!
//! A [`ScoringEngine`] runs its [`ScoringRule`]s in order over the words a
//! move formed. Each rule adds word scores or named bonuses to a
//! [`MoveScore`]; totals are summed once all rules have run.

use crate::board::{Board, Word};
use crate::player::{GamePlayer, UserId};
use crate::tile::PlacedTile;
use serde::{Deserialize, Serialize};

/// Flat bonus for placing a full rack in one move
pub const BINGO_BONUS: u32 = 50;

/// Rack size a bingo requires
pub const BINGO_TILES: usize = 7;

/// Bonus for emptying the rack while the bag is already empty
pub const END_GAME_BONUS: u32 = 25;

/// Score of one formed word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordScore {
    pub word: String,
    pub score: u32,
}

/// A named bonus awarded to a move
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bonus {
    pub name: String,
    pub points: u32,
}

/// Breakdown of a move's score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveScore {
    pub words: Vec<WordScore>,
    pub bonuses: Vec<Bonus>,
    pub word_total: u32,
    pub bonus_total: u32,
    pub total: u32,
}

impl MoveScore {
    pub fn add_word(&mut self, word: impl Into<String>, score: u32) {
        self.words.push(WordScore {
            word: word.into(),
            score,
        });
    }

    pub fn add_bonus(&mut self, name: impl Into<String>, points: u32) {
        self.bonuses.push(Bonus {
            name: name.into(),
            points,
        });
    }

    /// Recompute the totals from the breakdown
    fn sum(&mut self) {
        self.word_total = self.words.iter().map(|w| w.score).sum();
        self.bonus_total = self.bonuses.iter().map(|b| b.points).sum();
        self.total = self.word_total + self.bonus_total;
    }
}

/// Everything a scoring rule may look at
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    /// Words formed by the move, main word first
    pub words: &'a [Word],
    pub placed: &'a [PlacedTile],
    /// Board after the move
    pub board: &'a Board,
    /// The mover's rack is empty after refilling and the bag is empty
    pub rack_emptied_with_empty_bag: bool,
}

pub trait ScoringRule: Send + Sync {
    fn identifier(&self) -> &'static str;

    fn apply(&self, ctx: &ScoringContext<'_>, score: &mut MoveScore);
}

/// Ordered set of scoring rules
pub struct ScoringEngine {
    rules: Vec<Box<dyn ScoringRule>>,
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Letter scores plus the bingo, length and end-game bonuses
    pub fn standard() -> Self {
        Self::new()
            .with_rule(LetterScoreRule)
            .with_rule(BingoBonusRule)
            .with_rule(WordLengthBonusRule)
            .with_rule(EndGameBonusRule)
    }

    pub fn with_rule<R: ScoringRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn identifiers(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.identifier()).collect()
    }

    pub fn score(&self, ctx: &ScoringContext<'_>) -> MoveScore {
        let mut score = MoveScore::default();
        for rule in &self.rules {
            rule.apply(ctx, &mut score);
        }
        score.sum();
        score
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::standard()
    }
}

/// Letter points times letter multipliers, times the word multipliers.
///
/// Every cell of the word counts, including tiles placed on earlier turns.
pub struct LetterScoreRule;

impl LetterScoreRule {
    pub fn word_score(board: &Board, word: &Word) -> u32 {
        let mut letters = 0;
        let mut multiplier = 1;
        for tile in &word.tiles {
            let square = board.square_type(tile.x, tile.y);
            letters += tile.points() * square.letter_multiplier();
            multiplier *= square.word_multiplier();
        }
        letters * multiplier
    }
}

impl ScoringRule for LetterScoreRule {
    fn identifier(&self) -> &'static str {
        "letter_score"
    }

    fn apply(&self, ctx: &ScoringContext<'_>, score: &mut MoveScore) {
        for word in ctx.words {
            score.add_word(word.text.clone(), Self::word_score(ctx.board, word));
        }
    }
}

pub struct BingoBonusRule;

impl ScoringRule for BingoBonusRule {
    fn identifier(&self) -> &'static str {
        "bingo"
    }

    fn apply(&self, ctx: &ScoringContext<'_>, score: &mut MoveScore) {
        if ctx.placed.len() == BINGO_TILES {
            score.add_bonus("bingo", BINGO_BONUS);
        }
    }
}

/// Bonus keyed by the number of tiles placed
pub struct WordLengthBonusRule;

impl WordLengthBonusRule {
    pub fn bonus_for(tiles_placed: usize) -> u32 {
        match tiles_placed {
            2 => 3,
            3 => 6,
            4 => 12,
            5 => 25,
            6 => 50,
            7 => 100,
            _ => 0,
        }
    }
}

impl ScoringRule for WordLengthBonusRule {
    fn identifier(&self) -> &'static str {
        "word_length"
    }

    fn apply(&self, ctx: &ScoringContext<'_>, score: &mut MoveScore) {
        let bonus = Self::bonus_for(ctx.placed.len());
        if bonus > 0 {
            score.add_bonus("word_length", bonus);
        }
    }
}

pub struct EndGameBonusRule;

impl ScoringRule for EndGameBonusRule {
    fn identifier(&self) -> &'static str {
        "end_game"
    }

    fn apply(&self, ctx: &ScoringContext<'_>, score: &mut MoveScore) {
        if ctx.rack_emptied_with_empty_bag {
            score.add_bonus("end_game", END_GAME_BONUS);
        }
    }
}

/// Subtract each player's remaining rack points from their score, floored at 0.
///
/// `exempt` (the player who went out) keeps their score. Returns the
/// deduction applied to each player.
pub fn end_game_penalty(players: &mut [GamePlayer], exempt: Option<UserId>) -> Vec<(UserId, u32)> {
    players
        .iter_mut()
        .filter(|p| Some(p.user_id) != exempt)
        .map(|p| {
            let penalty = p.rack_points();
            p.score = p.score.saturating_sub(penalty);
            (p.user_id, penalty)
        })
        .collect()
}
