//! Turn and game orchestration.
//!
//! `GameEngine` owns the rule and scoring pipelines and drives every game
//! transition: creation, joining, the four player actions, turn timeouts
//! and the two-stage end of the game. Every entry point checks all of its
//! preconditions before touching the game, so a rejected action leaves the
//! game exactly as it was.

use crate::actions::{GameAction, GameEvent, Move, MoveKind};
use crate::bag::TileBag;
use crate::board::Board;
use crate::config::GameSettings;
use crate::dictionary::Dictionary;
use crate::game::{Game, GameError, GameStatus};
use crate::player::{GamePlayer, UserId};
use crate::rules::{MoveContext, RuleEngine, ValidationMode};
use crate::scoring::{end_game_penalty, MoveScore, ScoringContext, ScoringEngine};
use crate::template::BoardTemplate;
use crate::tile::{PlacedTile, Tile, TileDistribution};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Result of end-game detection for one resolved turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndCheck {
    Continue,
    /// The mover went out; the others get one more turn
    FinalTurnOwed,
    Finish,
}

pub struct GameEngine {
    rules: RuleEngine,
    scoring: ScoringEngine,
    settings: GameSettings,
}

impl GameEngine {
    pub fn new(rules: RuleEngine, scoring: ScoringEngine, settings: GameSettings) -> Self {
        Self {
            rules,
            scoring,
            settings,
        }
    }

    /// Engine with the standard rule and scoring pipelines
    pub fn standard(dictionary: Arc<dyn Dictionary>, settings: GameSettings) -> Self {
        Self::new(RuleEngine::standard(dictionary), ScoringEngine::standard(), settings)
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn rules_mut(&mut self) -> &mut RuleEngine {
        &mut self.rules
    }

    /// Create a pending game with `creator` as its only participant
    pub fn create_game<R: Rng + ?Sized>(
        &self,
        creator: UserId,
        language: &str,
        template: Option<BoardTemplate>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Game, GameError> {
        let dist = TileDistribution::for_language(language)
            .ok_or_else(|| GameError::UnsupportedLanguage(language.to_string()))?;

        let mut game = Game {
            id: Uuid::new_v4(),
            language: dist.language.to_string(),
            status: GameStatus::Pending,
            board: Board::with_template(template),
            bag: TileBag::from_distribution(&dist, rng),
            players: vec![GamePlayer::new(creator, 0, self.settings.free_swap_enabled)],
            current_turn: None,
            consecutive_passes: 0,
            winner_id: None,
            turn_expires_at: None,
            expiry_reminder_sent: false,
            final_turn_owed_by: None,
            moves: Vec::new(),
            created_at: now,
            started_at: None,
            finished_at: None,
        };
        self.refill_rack(&mut game, creator, rng);

        info!(game_id = %game.id, %creator, language = %game.language, "Game created");
        Ok(game)
    }

    /// Add a participant. Starts the game once it is full.
    pub fn join<R: Rng + ?Sized>(
        &self,
        game: &mut Game,
        user: UserId,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Vec<GameEvent>, GameError> {
        if game.is_participant(user) {
            return Err(GameError::AlreadyJoined);
        }
        if game.status != GameStatus::Pending {
            return Err(GameError::invalid_state(game.status, "join"));
        }
        if game.players.len() >= self.settings.player_count {
            return Err(GameError::GameFull);
        }

        let turn_order = game.players.len() as u8;
        game.players
            .push(GamePlayer::new(user, turn_order, self.settings.free_swap_enabled));

        let mut events = vec![GameEvent::PlayerJoined { user }];
        events.extend(self.refill_rack(game, user, rng));

        if game.players.len() == self.settings.player_count {
            events.extend(self.start(game, rng, now));
        }
        Ok(events)
    }

    /// Pick the first player at random and open the first turn
    fn start<R: Rng + ?Sized>(&self, game: &mut Game, rng: &mut R, now: DateTime<Utc>) -> Vec<GameEvent> {
        let count = game.players.len();
        let first = rng.gen_range(0..count);
        for (i, player) in game.players.iter_mut().enumerate() {
            player.turn_order = ((i + count - first) % count) as u8;
        }

        let first_player = game.players[first].user_id;
        let expires = now + self.settings.turn_duration();
        game.status = GameStatus::Active;
        game.current_turn = Some(first_player);
        game.turn_expires_at = Some(expires);
        game.expiry_reminder_sent = false;
        game.started_at = Some(now);

        info!(game_id = %game.id, %first_player, "Game started");
        vec![GameEvent::GameStarted {
            first_player,
            turn_expires_at: expires,
        }]
    }

    /// Apply a player action.
    ///
    /// Resign may be sent by any participant; every other action requires
    /// the turn.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        game: &mut Game,
        user: UserId,
        action: GameAction,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Vec<GameEvent>, GameError> {
        if !game.is_participant(user) {
            return Err(GameError::NotParticipant);
        }
        if game.status != GameStatus::Active {
            return Err(GameError::invalid_state(game.status, action.name()));
        }
        if action != GameAction::Resign && game.current_turn != Some(user) {
            return Err(GameError::NotYourTurn);
        }

        match action {
            GameAction::Play(tiles) => self.play(game, user, tiles, rng, now),
            GameAction::Pass => Ok(self.pass(game, user, false, now)),
            GameAction::Swap(tiles) => self.swap(game, user, tiles, rng, now),
            GameAction::Resign => Ok(self.resign(game, user, now)),
        }
    }

    /// Force a pass for the current player once their turn has expired
    pub fn timeout(&self, game: &mut Game, now: DateTime<Utc>) -> Result<Vec<GameEvent>, GameError> {
        if game.status != GameStatus::Active {
            return Err(GameError::invalid_state(game.status, "time out"));
        }
        let (Some(user), Some(expires)) = (game.current_turn, game.turn_expires_at) else {
            return Err(GameError::invalid_state(game.status, "time out"));
        };
        if now < expires {
            return Err(GameError::TurnNotExpired);
        }

        info!(game_id = %game.id, %user, "Turn expired, passing");
        Ok(self.pass(game, user, true, now))
    }

    /// Score a speculative placement without changing the game.
    ///
    /// Runs only the placement rules: the rack and the dictionary are not
    /// consulted, and the caller need not hold the turn.
    pub fn preview(&self, game: &Game, user: UserId, tiles: &[PlacedTile]) -> Result<MoveScore, GameError> {
        let player = game.player(user).ok_or(GameError::NotParticipant)?;
        if game.status != GameStatus::Active {
            return Err(GameError::invalid_state(game.status, "preview"));
        }
        if tiles.is_empty() {
            return Err(no_tiles_placed());
        }

        let ctx = MoveContext {
            board: &game.board,
            placed: tiles,
            rack: &player.rack,
            language: &game.language,
        };
        self.rules.validate(&ctx, ValidationMode::Preview)?;

        let board = game.board.place_tiles(tiles)?;
        let words = board.find_formed_words(tiles);
        Ok(self.scoring.score(&ScoringContext {
            words: &words,
            placed: tiles,
            board: &board,
            rack_emptied_with_empty_bag: false,
        }))
    }

    /// The turn holder, if their turn ends within `lead` and nobody has
    /// reminded them yet
    pub fn due_reminder(&self, game: &Game, now: DateTime<Utc>, lead: Duration) -> Option<UserId> {
        if !game.is_active() || game.expiry_reminder_sent {
            return None;
        }
        let expires = game.turn_expires_at?;
        if now < expires && expires - now <= lead {
            game.current_turn
        } else {
            None
        }
    }

    pub fn mark_reminder_sent(&self, game: &mut Game) {
        game.expiry_reminder_sent = true;
    }

    // ==================== Actions ====================

    fn play<R: Rng + ?Sized>(
        &self,
        game: &mut Game,
        user: UserId,
        tiles: Vec<PlacedTile>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Vec<GameEvent>, GameError> {
        if tiles.is_empty() {
            return Err(no_tiles_placed());
        }
        let player = game.player(user).ok_or(GameError::NotParticipant)?;

        let ctx = MoveContext {
            board: &game.board,
            placed: &tiles,
            rack: &player.rack,
            language: &game.language,
        };
        self.rules.validate(&ctx, ValidationMode::Full)?;

        let indices = player.match_placed(&tiles).ok_or_else(|| GameError::TileNotInRack {
            message: "You do not have those tiles in your rack.".to_string(),
        })?;
        let board = game.board.place_tiles(&tiles)?;
        let words = board.find_formed_words(&tiles);

        // Validated; commit
        game.board = board;
        if let Some(player) = game.player_mut(user) {
            player.take_from_rack(&indices);
        }
        let mut events = self.refill_rack(game, user, rng);

        let went_out = game.player(user).map_or(false, GamePlayer::rack_is_empty) && game.bag.is_empty();
        let score = self.scoring.score(&ScoringContext {
            words: &words,
            placed: &tiles,
            board: &game.board,
            rack_emptied_with_empty_bag: went_out,
        });
        if let Some(player) = game.player_mut(user) {
            player.score += score.total;
        }
        game.consecutive_passes = 0;

        let texts: Vec<String> = words.into_iter().map(|w| w.text).collect();
        debug!(game_id = %game.id, %user, words = ?texts, score = score.total, "Tiles placed");
        events.push(GameEvent::TilesPlaced {
            user,
            words: texts.clone(),
            score: score.total,
        });
        game.moves.push(Move {
            user_id: user,
            kind: MoveKind::Play {
                tiles,
                words: texts,
                score,
            },
            created_at: now,
        });

        events.extend(self.resolve_turn(game, user, now));
        Ok(events)
    }

    fn pass(&self, game: &mut Game, user: UserId, timed_out: bool, now: DateTime<Utc>) -> Vec<GameEvent> {
        game.consecutive_passes += 1;
        game.moves.push(Move {
            user_id: user,
            kind: MoveKind::Pass { timed_out },
            created_at: now,
        });

        let mut events = vec![GameEvent::TurnPassed { user, timed_out }];
        events.extend(self.resolve_turn(game, user, now));
        events
    }

    fn swap<R: Rng + ?Sized>(
        &self,
        game: &mut Game,
        user: UserId,
        tiles: Vec<Tile>,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Vec<GameEvent>, GameError> {
        if tiles.is_empty() {
            return Err(GameError::Validation {
                rule: "swap_selection".to_string(),
                message: "Select at least one tile to swap.".to_string(),
            });
        }
        if game.bag.len() < self.settings.min_bag_for_swap {
            return Err(GameError::InsufficientTiles {
                available: game.bag.len(),
            });
        }
        let player = game.player(user).ok_or(GameError::NotParticipant)?;
        let indices = player.match_tiles(&tiles).ok_or_else(|| GameError::TileNotInRack {
            message: "You can only swap tiles from your own rack.".to_string(),
        })?;

        let count = indices.len();
        let free = self.settings.free_swap_enabled && player.has_free_swap;

        let mut events = Vec::new();
        let Some(player) = game.players.iter_mut().find(|p| p.user_id == user) else {
            return Err(GameError::NotParticipant);
        };
        let returned = player.take_from_rack(&indices);
        let mut drawn = game.bag.draw(count);
        if award_blank(&mut game.bag, player, &mut drawn, self.settings.blank_probability(), rng) {
            debug!(game_id = %game.id, %user, "Blank awarded on swap");
            events.push(GameEvent::BlankAwarded { user });
        }
        player.rack.extend(drawn);
        if free {
            player.has_free_swap = false;
        }
        game.bag.return_tiles(returned, rng);
        game.consecutive_passes = 0;

        game.moves.push(Move {
            user_id: user,
            kind: MoveKind::Swap { count, free },
            created_at: now,
        });
        events.push(GameEvent::TilesSwapped { user, count, free });

        if !free {
            events.extend(self.switch_turn(game, user, now));
        }
        Ok(events)
    }

    fn resign(&self, game: &mut Game, user: UserId, now: DateTime<Utc>) -> Vec<GameEvent> {
        let winner = game.opponent_of(user);
        game.status = GameStatus::Finished;
        game.winner_id = winner;
        game.current_turn = None;
        game.turn_expires_at = None;
        game.finished_at = Some(now);
        game.moves.push(Move {
            user_id: user,
            kind: MoveKind::Resign,
            created_at: now,
        });

        info!(game_id = %game.id, %user, "Player resigned");
        vec![
            GameEvent::PlayerResigned { user },
            GameEvent::GameFinished {
                winner,
                scores: game.scores(),
            },
        ]
    }

    // ==================== Turn bookkeeping ====================

    /// Draw `user` back up to a full rack, applying the blank fairness rule
    fn refill_rack<R: Rng + ?Sized>(&self, game: &mut Game, user: UserId, rng: &mut R) -> Vec<GameEvent> {
        let Some(player) = game.players.iter_mut().find(|p| p.user_id == user) else {
            return Vec::new();
        };
        let need = self.settings.rack_size.saturating_sub(player.rack.len());
        let mut drawn = game.bag.draw(need);

        let mut events = Vec::new();
        if award_blank(&mut game.bag, player, &mut drawn, self.settings.blank_probability(), rng) {
            debug!(game_id = %game.id, %user, "Blank awarded");
            events.push(GameEvent::BlankAwarded { user });
        }
        player.rack.extend(drawn);
        events
    }

    /// End-game detection after `mover` resolved their turn
    fn check_end_game(&self, game: &Game, mover: UserId) -> EndCheck {
        if game.consecutive_passes as usize >= self.settings.player_count {
            return EndCheck::Finish;
        }
        match game.final_turn_owed_by {
            Some(finisher) if finisher != mover => EndCheck::Finish,
            Some(_) => EndCheck::Continue,
            None => {
                let went_out = game.player(mover).map_or(false, GamePlayer::rack_is_empty);
                if went_out && game.bag.is_empty() {
                    EndCheck::FinalTurnOwed
                } else {
                    EndCheck::Continue
                }
            }
        }
    }

    /// Run end-game detection, then hand the turn on unless the game ended
    fn resolve_turn(&self, game: &mut Game, mover: UserId, now: DateTime<Utc>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match self.check_end_game(game, mover) {
            EndCheck::Finish => return self.finalize(game, now),
            EndCheck::FinalTurnOwed => {
                game.final_turn_owed_by = Some(mover);
                if let Some(owed_to) = game.next_in_rotation(mover) {
                    info!(game_id = %game.id, finisher = %mover, "Rack emptied on an empty bag");
                    events.push(GameEvent::FinalTurnOwed {
                        finisher: mover,
                        owed_to,
                    });
                }
            }
            EndCheck::Continue => {}
        }

        events.extend(self.switch_turn(game, mover, now));
        if self.check_end_game(game, mover) == EndCheck::Finish {
            events.extend(self.finalize(game, now));
        }
        events
    }

    fn switch_turn(&self, game: &mut Game, from: UserId, now: DateTime<Utc>) -> Vec<GameEvent> {
        let Some(to) = game.next_in_rotation(from) else {
            return Vec::new();
        };
        let expires = now + self.settings.turn_duration();
        game.current_turn = Some(to);
        game.turn_expires_at = Some(expires);
        game.expiry_reminder_sent = false;

        vec![GameEvent::TurnSwitched {
            from,
            to,
            turn_expires_at: expires,
        }]
    }

    /// Apply end-game penalties, decide the winner and close the game
    fn finalize(&self, game: &mut Game, now: DateTime<Utc>) -> Vec<GameEvent> {
        for (user, penalty) in end_game_penalty(&mut game.players, game.final_turn_owed_by) {
            if penalty > 0 {
                debug!(game_id = %game.id, %user, penalty, "End game penalty");
            }
        }

        let top = game.players.iter().map(|p| p.score).max().unwrap_or(0);
        let mut leaders = game.players.iter().filter(|p| p.score == top);
        let winner = match (leaders.next(), leaders.next()) {
            (Some(leader), None) => Some(leader.user_id),
            _ => None,
        };

        game.status = GameStatus::Finished;
        game.winner_id = winner;
        game.current_turn = None;
        game.turn_expires_at = None;
        game.finished_at = Some(now);

        info!(game_id = %game.id, winner = ?winner, "Game finished");
        vec![GameEvent::GameFinished {
            winner,
            scores: game.scores(),
        }]
    }
}

fn no_tiles_placed() -> GameError {
    GameError::Validation {
        rule: "tiles_placed".to_string(),
        message: "No tiles placed.".to_string(),
    }
}

/// Blank fairness: a player who has not had a blank swaps one freshly drawn
/// tile for one, either by chance or once the bag has run dry.
fn award_blank<R: Rng + ?Sized>(
    bag: &mut TileBag,
    player: &mut GamePlayer,
    drawn: &mut Vec<Tile>,
    chance: f64,
    rng: &mut R,
) -> bool {
    if player.has_received_blank || drawn.is_empty() {
        return false;
    }
    if !(bag.is_empty() || rng.gen_bool(chance)) {
        return false;
    }
    if !bag.swap_one_for_blank(drawn, rng) {
        return false;
    }
    player.has_received_blank = true;
    true
}
