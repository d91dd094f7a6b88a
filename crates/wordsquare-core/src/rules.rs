//! Turn validation pipeline.
//!
//! A [`RuleEngine`] holds an ordered list of [`Rule`]s. Each rule looks at
//! the proposed placement against the board as it was before the move and
//! either passes or fails with a message. The first failing rule rejects
//! the move.

use crate::board::{Board, BOARD_SIZE, CENTER};
use crate::dictionary::Dictionary;
use crate::player::match_tiles;
use crate::tile::{PlacedTile, Tile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Which rules a validation pass runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationMode {
    /// Every enabled rule
    Full,
    /// Placement rules only; rack and dictionary checks are skipped
    Preview,
}

/// How a failed rule should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// The placement breaks a game rule
    Placement,
    /// The placement uses tiles the player does not hold
    Integrity,
}

/// Outcome of one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub passed: bool,
    pub message: Option<String>,
}

impl RuleResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
        }
    }
}

/// The first rule a placement failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuleViolation {
    pub rule: &'static str,
    pub kind: ViolationKind,
    pub message: String,
}

/// Everything a rule may look at
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    /// Board before the move
    pub board: &'a Board,
    pub placed: &'a [PlacedTile],
    /// Rack of the acting player
    pub rack: &'a [Tile],
    pub language: &'a str,
}

/// A single, independent validation rule
pub trait Rule: Send + Sync {
    /// Stable machine-readable identifier
    fn identifier(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// How a failure of this rule is classified
    fn kind(&self) -> ViolationKind {
        ViolationKind::Placement
    }

    /// Whether preview validation leaves this rule out
    fn skipped_in_preview(&self) -> bool {
        false
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult;
}

struct RegisteredRule {
    rule: Box<dyn Rule>,
    enabled: bool,
}

/// Ordered set of validation rules
pub struct RuleEngine {
    rules: Vec<RegisteredRule>,
}

impl RuleEngine {
    /// Engine with no rules
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// The full placement rule set in its fixed order
    pub fn standard(dictionary: Arc<dyn Dictionary>) -> Self {
        Self::new()
            .with_rule(BoardBoundsRule)
            .with_rule(CellAvailabilityRule)
            .with_rule(ConnectionRule)
            .with_rule(FirstMoveCenterRule)
            .with_rule(LinePlacementRule)
            .with_rule(NoGapsRule)
            .with_rule(TilesInRackRule)
            .with_rule(WordValidationRule::new(dictionary))
    }

    /// Append a rule at the end of the pipeline
    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(RegisteredRule {
            rule: Box::new(rule),
            enabled: true,
        });
        self
    }

    /// Enable or disable a rule by identifier. Returns false if no such rule.
    pub fn set_enabled(&mut self, identifier: &str, enabled: bool) -> bool {
        match self
            .rules
            .iter_mut()
            .find(|r| r.rule.identifier() == identifier)
        {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Identifiers of all registered rules, in order
    pub fn identifiers(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.rule.identifier()).collect()
    }

    /// Run the pipeline, stopping at the first failure
    pub fn validate(&self, ctx: &MoveContext<'_>, mode: ValidationMode) -> Result<(), RuleViolation> {
        for entry in &self.rules {
            if !entry.enabled {
                continue;
            }
            if mode == ValidationMode::Preview && entry.rule.skipped_in_preview() {
                continue;
            }

            let result = entry.rule.validate(ctx);
            if !result.passed {
                let message = result
                    .message
                    .unwrap_or_else(|| format!("{} failed.", entry.rule.name()));
                tracing::debug!(rule = entry.rule.identifier(), %message, "Placement rejected");
                return Err(RuleViolation {
                    rule: entry.rule.identifier(),
                    kind: entry.rule.kind(),
                    message,
                });
            }
        }
        Ok(())
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Placement axis shared by every placed tile, if there is one
fn shared_axis(placed: &[PlacedTile]) -> Option<Axis> {
    let first = placed.first()?;
    if placed.iter().all(|t| t.y == first.y) {
        Some(Axis::Row(first.y))
    } else if placed.iter().all(|t| t.x == first.x) {
        Some(Axis::Column(first.x))
    } else {
        None
    }
}

enum Axis {
    Row(usize),
    Column(usize),
}

// ==================== Placement rules ====================

/// Every placed tile lies on the board
pub struct BoardBoundsRule;

impl Rule for BoardBoundsRule {
    fn identifier(&self) -> &'static str {
        "board_bounds"
    }

    fn name(&self) -> &'static str {
        "Board bounds"
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult {
        if ctx.placed.iter().all(|t| Board::is_within_bounds(t.x, t.y)) {
            RuleResult::pass()
        } else {
            RuleResult::fail(format!(
                "Tiles must be placed within the {}x{} board.",
                BOARD_SIZE, BOARD_SIZE
            ))
        }
    }
}

/// No placed tile lands on an occupied cell, or on another placed tile
pub struct CellAvailabilityRule;

impl Rule for CellAvailabilityRule {
    fn identifier(&self) -> &'static str {
        "cell_availability"
    }

    fn name(&self) -> &'static str {
        "Cell availability"
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult {
        let mut seen = HashSet::new();
        for tile in ctx.placed {
            if ctx.board.get(tile.x, tile.y).is_some() || !seen.insert((tile.x, tile.y)) {
                return RuleResult::fail("Tiles cannot be placed on occupied squares.");
            }
        }
        RuleResult::pass()
    }
}

/// On a non-empty board, some placed tile touches an existing tile orthogonally
pub struct ConnectionRule;

impl Rule for ConnectionRule {
    fn identifier(&self) -> &'static str {
        "connection"
    }

    fn name(&self) -> &'static str {
        "Connection"
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult {
        if ctx.board.is_empty()
            || ctx
                .placed
                .iter()
                .any(|t| ctx.board.has_orthogonal_neighbor(t.x, t.y))
        {
            RuleResult::pass()
        } else {
            RuleResult::fail("Tiles must connect to existing tiles on the board.")
        }
    }
}

/// The opening move covers the center cell
pub struct FirstMoveCenterRule;

impl Rule for FirstMoveCenterRule {
    fn identifier(&self) -> &'static str {
        "first_move_center"
    }

    fn name(&self) -> &'static str {
        "First move covers center"
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult {
        if !ctx.board.is_empty() || ctx.placed.iter().any(|t| t.x == CENTER && t.y == CENTER) {
            RuleResult::pass()
        } else {
            RuleResult::fail("The first word must cover the center square.")
        }
    }
}

/// All placed tiles share one row or one column
pub struct LinePlacementRule;

impl Rule for LinePlacementRule {
    fn identifier(&self) -> &'static str {
        "line_placement"
    }

    fn name(&self) -> &'static str {
        "Single line"
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult {
        if ctx.placed.len() <= 1 || shared_axis(ctx.placed).is_some() {
            RuleResult::pass()
        } else {
            RuleResult::fail("Tiles must be placed in a single row or column.")
        }
    }
}

/// Every cell between the outermost placed tiles is filled
pub struct NoGapsRule;

impl Rule for NoGapsRule {
    fn identifier(&self) -> &'static str {
        "no_gaps"
    }

    fn name(&self) -> &'static str {
        "No gaps"
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult {
        if ctx.placed.len() <= 1 {
            return RuleResult::pass();
        }
        let Some(axis) = shared_axis(ctx.placed) else {
            return RuleResult::pass();
        };

        let placed: HashSet<(usize, usize)> = ctx.placed.iter().map(|t| (t.x, t.y)).collect();
        let filled = |x: usize, y: usize| placed.contains(&(x, y)) || ctx.board.get(x, y).is_some();

        let gap_free = match axis {
            Axis::Row(y) => {
                let min = ctx.placed.iter().map(|t| t.x).min().unwrap_or(0);
                let max = ctx.placed.iter().map(|t| t.x).max().unwrap_or(0);
                (min..=max).all(|x| filled(x, y))
            }
            Axis::Column(x) => {
                let min = ctx.placed.iter().map(|t| t.y).min().unwrap_or(0);
                let max = ctx.placed.iter().map(|t| t.y).max().unwrap_or(0);
                (min..=max).all(|y| filled(x, y))
            }
        };

        if gap_free {
            RuleResult::pass()
        } else {
            RuleResult::fail("There are gaps between the placed tiles.")
        }
    }
}

// ==================== Commit-only rules ====================

/// Every placed tile comes from the rack, no physical tile used twice
pub struct TilesInRackRule;

impl Rule for TilesInRackRule {
    fn identifier(&self) -> &'static str {
        "tiles_in_rack"
    }

    fn name(&self) -> &'static str {
        "Tiles in rack"
    }

    fn kind(&self) -> ViolationKind {
        ViolationKind::Integrity
    }

    fn skipped_in_preview(&self) -> bool {
        true
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult {
        match match_tiles(ctx.rack, ctx.placed.iter().map(|p| p.tile)) {
            Some(_) => RuleResult::pass(),
            None => RuleResult::fail("You do not have those tiles in your rack."),
        }
    }
}

/// Every formed word is in the dictionary
pub struct WordValidationRule {
    dictionary: Arc<dyn Dictionary>,
}

impl WordValidationRule {
    pub fn new(dictionary: Arc<dyn Dictionary>) -> Self {
        Self { dictionary }
    }
}

impl Rule for WordValidationRule {
    fn identifier(&self) -> &'static str {
        "word_validation"
    }

    fn name(&self) -> &'static str {
        "Word validation"
    }

    fn skipped_in_preview(&self) -> bool {
        true
    }

    fn validate(&self, ctx: &MoveContext<'_>) -> RuleResult {
        let Ok(next) = ctx.board.place_tiles(ctx.placed) else {
            return RuleResult::fail("No valid words formed.");
        };
        let words = next.find_formed_words(ctx.placed);
        if words.is_empty() {
            return RuleResult::fail("No valid words formed.");
        }

        for word in &words {
            let text = word.text.to_uppercase();
            match self.dictionary.is_valid_word(&text, ctx.language) {
                Ok(true) => {}
                Ok(false) => return RuleResult::fail(format!("Invalid word: {}", text)),
                Err(e) => {
                    tracing::warn!(word = %text, language = ctx.language, "Dictionary lookup failed: {}", e);
                    return RuleResult::fail(format!("Invalid word: {}", text));
                }
            }
        }
        RuleResult::pass()
    }
}
