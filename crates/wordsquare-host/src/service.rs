//! Game service: the single entry point for state changes.
//!
//! Every change to a game runs under that game's lock: load, apply to the
//! loaded copy, save against the loaded version, release. Notifications
//! and play statistics go out only after the save succeeded.

use crate::notify::{Notification, NotificationKind, Notifier};
use crate::store::{GameRepository, StoreError};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;
use wordsquare_core::{
    BoardTemplate, Dictionary, Game, GameAction, GameEngine, GameError, GameEvent, GameSettings,
    MoveScore, PlacedTile, TemplateRows, UserId,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct GameService {
    repo: Arc<dyn GameRepository>,
    notifier: Arc<dyn Notifier>,
    dictionary: Arc<dyn Dictionary>,
    engine: GameEngine,
    default_language: String,
    /// One write lock per game
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
    rng: std::sync::Mutex<StdRng>,
}

impl GameService {
    pub fn new(
        repo: Arc<dyn GameRepository>,
        notifier: Arc<dyn Notifier>,
        dictionary: Arc<dyn Dictionary>,
        settings: GameSettings,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            engine: GameEngine::standard(dictionary.clone(), settings),
            repo,
            notifier,
            dictionary,
            default_language: default_language.into(),
            locks: DashMap::new(),
            rng: std::sync::Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the random source, for reproducible games
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = std::sync::Mutex::new(rng);
        self
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// Create and store a pending game
    pub fn create_game(
        &self,
        creator: UserId,
        language: Option<&str>,
        template: Option<TemplateRows>,
    ) -> Result<Game, ServiceError> {
        let template = template.map(BoardTemplate::new).transpose().map_err(GameError::from)?;
        let language = language.unwrap_or(self.default_language.as_str());

        let game = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            self.engine
                .create_game(creator, language, template, &mut *rng, Utc::now())?
        };
        self.repo.save(&game, 0)?;
        Ok(game)
    }

    pub fn game(&self, game_id: Uuid) -> Result<Game, ServiceError> {
        Ok(self.repo.load(game_id)?.game)
    }

    pub fn list_active(&self) -> Vec<Uuid> {
        self.repo.list_active()
    }

    pub async fn join(&self, game_id: Uuid, user: UserId) -> Result<Vec<GameEvent>, ServiceError> {
        let now = Utc::now();
        self.mutate(game_id, |engine, game, rng| engine.join(game, user, rng, now))
            .await
    }

    /// Apply a player action
    pub async fn act(
        &self,
        game_id: Uuid,
        user: UserId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, ServiceError> {
        let now = Utc::now();
        self.mutate(game_id, |engine, game, rng| engine.apply(game, user, action, rng, now))
            .await
    }

    /// Score a placement without committing it
    pub fn preview(&self, game_id: Uuid, user: UserId, tiles: &[PlacedTile]) -> Result<MoveScore, ServiceError> {
        let game = self.game(game_id)?;
        Ok(self.engine.preview(&game, user, tiles)?)
    }

    /// Auto-pass an expired turn, serialized with player moves
    pub async fn expire_turn(&self, game_id: Uuid, now: DateTime<Utc>) -> Result<Vec<GameEvent>, ServiceError> {
        self.mutate(game_id, |engine, game, _| engine.timeout(game, now))
            .await
    }

    /// Remind the turn holder if their turn ends within `lead`.
    /// Returns whether a reminder went out.
    pub async fn send_reminder(
        &self,
        game_id: Uuid,
        now: DateTime<Utc>,
        lead: Duration,
    ) -> Result<bool, ServiceError> {
        let lock = self.lock_for(game_id);
        let due = {
            let _guard = lock.lock().await;
            self.mark_reminder(game_id, now, lead)
        };
        drop(lock);
        self.release_lock(game_id);

        let Some((user, expires_at)) = due? else {
            return Ok(false);
        };
        debug!(%game_id, %user, "Sending turn reminder");
        self.notifier.notify(
            user,
            Notification {
                game_id,
                kind: NotificationKind::TurnEndingSoon { expires_at },
            },
        );
        Ok(true)
    }

    fn lock_for(&self, game_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(game_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Drop the game's lock once no caller holds or awaits it
    fn release_lock(&self, game_id: Uuid) {
        self.locks.remove_if(&game_id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Load, change and save one game under its lock, then notify
    async fn mutate<F>(&self, game_id: Uuid, change: F) -> Result<Vec<GameEvent>, ServiceError>
    where
        F: FnOnce(&GameEngine, &mut Game, &mut StdRng) -> Result<Vec<GameEvent>, GameError>,
    {
        let lock = self.lock_for(game_id);
        let committed = {
            let _guard = lock.lock().await;
            self.commit(game_id, change)
        };
        drop(lock);
        self.release_lock(game_id);
        let (game, events) = committed?;

        if game.is_finished() {
            info!(%game_id, winner = ?game.winner_id, "Game closed");
        }
        self.dispatch(&game, &events);
        Ok(events)
    }

    /// Load, change and save; the caller holds the game's lock
    fn commit<F>(&self, game_id: Uuid, change: F) -> Result<(Game, Vec<GameEvent>), ServiceError>
    where
        F: FnOnce(&GameEngine, &mut Game, &mut StdRng) -> Result<Vec<GameEvent>, GameError>,
    {
        let stored = self.repo.load(game_id)?;
        let mut game = stored.game;
        let events = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            change(&self.engine, &mut game, &mut *rng)?
        };
        self.repo.save(&game, stored.version)?;
        Ok((game, events))
    }

    /// Flag a due reminder as sent; the caller holds the game's lock
    fn mark_reminder(
        &self,
        game_id: Uuid,
        now: DateTime<Utc>,
        lead: Duration,
    ) -> Result<Option<(UserId, DateTime<Utc>)>, ServiceError> {
        let stored = self.repo.load(game_id)?;
        let mut game = stored.game;
        match (self.engine.due_reminder(&game, now, lead), game.turn_expires_at) {
            (Some(user), Some(expires_at)) => {
                self.engine.mark_reminder_sent(&mut game);
                self.repo.save(&game, stored.version)?;
                Ok(Some((user, expires_at)))
            }
            _ => Ok(None),
        }
    }

    /// Fan committed events out to every participant
    fn dispatch(&self, game: &Game, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::TilesPlaced { words, .. } = event {
                self.dictionary.record_plays(words, &game.language);
            }
            for player in &game.players {
                self.notifier.notify(
                    player.user_id,
                    Notification {
                        game_id: game.id,
                        kind: NotificationKind::Event(event.clone()),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelNotifier;
    use crate::store::InMemoryRepository;
    use wordsquare_core::{GameStatus, Tile, WordList};

    struct Harness {
        service: Arc<GameService>,
        notifier: Arc<ChannelNotifier>,
        words: Arc<WordList>,
    }

    fn harness() -> Harness {
        let notifier = Arc::new(ChannelNotifier::new());
        let words = Arc::new(WordList::from_words("en", ["AT", "TA", "TO"]));
        let settings = GameSettings {
            blank_chance: 0.0,
            ..GameSettings::default()
        };
        let service = GameService::new(
            Arc::new(InMemoryRepository::new()),
            notifier.clone(),
            words.clone(),
            settings,
            "en",
        )
        .with_rng(StdRng::seed_from_u64(99));
        Harness {
            service: Arc::new(service),
            notifier,
            words,
        }
    }

    async fn started(service: &GameService) -> Game {
        let game = service.create_game(Uuid::new_v4(), None, None).unwrap();
        service.join(game.id, Uuid::new_v4()).await.unwrap();
        service.game(game.id).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_join() {
        let h = harness();
        let game = h.service.create_game(Uuid::new_v4(), None, None).unwrap();
        assert_eq!(game.language, "en");
        assert_eq!(h.service.game(game.id).unwrap().status, GameStatus::Pending);

        let events = h.service.join(game.id, Uuid::new_v4()).await.unwrap();
        assert!(matches!(events.last(), Some(GameEvent::GameStarted { .. })));
        assert_eq!(h.service.list_active(), vec![game.id]);
    }

    #[tokio::test]
    async fn test_locks_released_after_each_change() {
        let h = harness();
        let creator = Uuid::new_v4();
        let pending = h.service.create_game(creator, None, None).unwrap();

        let err = h.service.join(pending.id, creator).await.unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::AlreadyJoined)));
        assert!(h.service.locks.is_empty());

        let game = started(&h.service).await;
        let holder = game.current_turn.unwrap();
        h.service.act(game.id, holder, GameAction::Pass).await.unwrap();
        h.service
            .send_reminder(game.id, Utc::now(), Duration::hours(1))
            .await
            .unwrap();
        assert!(h.service.locks.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_template_rejected() {
        let h = harness();
        let rows = vec![vec![None; 15]; 14];
        let err = h
            .service
            .create_game(Uuid::new_v4(), None, Some(rows))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::InvalidTemplate(_))));
    }

    #[tokio::test]
    async fn test_rejected_action_is_not_saved() {
        let h = harness();
        let game = started(&h.service).await;
        let waiting = game.opponent_of(game.current_turn.unwrap()).unwrap();

        let err = h.service.act(game.id, waiting, GameAction::Pass).await.unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::NotYourTurn)));
        assert_eq!(h.service.game(game.id).unwrap(), game);
    }

    #[tokio::test]
    async fn test_events_reach_both_players() {
        let h = harness();
        let game = started(&h.service).await;
        let holder = game.current_turn.unwrap();
        let waiting = game.opponent_of(holder).unwrap();
        let mut holder_rx = h.notifier.subscribe(holder);
        let mut waiting_rx = h.notifier.subscribe(waiting);

        h.service.act(game.id, holder, GameAction::Pass).await.unwrap();

        let expected = NotificationKind::Event(GameEvent::TurnPassed {
            user: holder,
            timed_out: false,
        });
        assert_eq!(holder_rx.recv().await.unwrap().kind, expected);
        assert_eq!(waiting_rx.recv().await.unwrap().kind, expected);
    }

    #[tokio::test]
    async fn test_concurrent_moves_apply_once() {
        let h = harness();
        let game = started(&h.service).await;
        let holder = game.current_turn.unwrap();

        let a = {
            let service = h.service.clone();
            tokio::spawn(async move { service.act(game.id, holder, GameAction::Pass).await })
        };
        let b = {
            let service = h.service.clone();
            tokio::spawn(async move { service.act(game.id, holder, GameAction::Pass).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let stored = h.service.game(game.id).unwrap();
        assert_eq!(stored.moves.len(), 1);
        assert_eq!(stored.consecutive_passes, 1);
    }

    #[tokio::test]
    async fn test_play_records_word_statistics() {
        let h = harness();
        let game = started(&h.service).await;
        let holder = game.current_turn.unwrap();

        // Give the holder the tiles for AT through the stored game
        let repo_game = {
            let mut g = h.service.game(game.id).unwrap();
            if let Some(p) = g.players.iter_mut().find(|p| p.user_id == holder) {
                p.rack[0] = Tile::new('A', 1);
                p.rack[1] = Tile::new('T', 1);
            }
            g
        };
        h.service.repo.save(&repo_game, 2).unwrap();

        let tiles = vec![
            PlacedTile::new(Tile::new('A', 1), 7, 7),
            PlacedTile::new(Tile::new('T', 1), 8, 7),
        ];
        h.service.act(game.id, holder, GameAction::Play(tiles)).await.unwrap();
        assert_eq!(h.words.play_count("AT", "en"), 1);
    }

    #[tokio::test]
    async fn test_expire_turn_respects_the_clock() {
        let h = harness();
        let game = started(&h.service).await;
        let expires = game.turn_expires_at.unwrap();

        let err = h
            .service
            .expire_turn(game.id, expires - Duration::minutes(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Game(GameError::TurnNotExpired)));

        let events = h.service.expire_turn(game.id, expires).await.unwrap();
        assert!(matches!(events[0], GameEvent::TurnPassed { timed_out: true, .. }));
    }

    #[tokio::test]
    async fn test_reminder_sent_once() {
        let h = harness();
        let game = started(&h.service).await;
        let holder = game.current_turn.unwrap();
        let mut rx = h.notifier.subscribe(holder);
        let soon = game.turn_expires_at.unwrap() - Duration::minutes(10);

        assert!(h.service.send_reminder(game.id, soon, Duration::hours(1)).await.unwrap());
        assert!(!h.service.send_reminder(game.id, soon, Duration::hours(1)).await.unwrap());
        assert!(matches!(
            rx.recv().await.unwrap().kind,
            NotificationKind::TurnEndingSoon { .. }
        ));
    }
}
