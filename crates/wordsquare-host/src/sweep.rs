//! Periodic turn-timeout and reminder sweep.

use crate::service::{GameService, ServiceError};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wordsquare_core::GameError;

/// Outcome of one pass over the active games
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub reminded: usize,
    pub failed: usize,
}

/// Sweep forever, once per `interval`
pub async fn run_sweep(service: Arc<GameService>, interval: std::time::Duration, reminder_lead: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let report = sweep_once(&service, Utc::now(), reminder_lead).await;
        if report != SweepReport::default() {
            info!(
                expired = report.expired,
                reminded = report.reminded,
                failed = report.failed,
                "Sweep finished"
            );
        }
    }
}

/// Auto-pass every expired turn and remind every turn holder whose time is
/// nearly up. One game failing does not stop the sweep.
pub async fn sweep_once(service: &GameService, now: DateTime<Utc>, reminder_lead: Duration) -> SweepReport {
    let mut report = SweepReport::default();

    for game_id in service.list_active() {
        let expired = match service.game(game_id) {
            Ok(game) => game.turn_expires_at.map_or(false, |at| at <= now),
            Err(e) => {
                warn!(%game_id, "Sweep could not load game: {}", e);
                report.failed += 1;
                continue;
            }
        };

        if expired {
            match service.expire_turn(game_id, now).await {
                Ok(_) => {
                    info!(%game_id, "Auto-passed expired turn");
                    report.expired += 1;
                }
                // A move landed between the check and the lock
                Err(ServiceError::Game(GameError::TurnNotExpired | GameError::InvalidState { .. })) => {
                    debug!(%game_id, "Turn already resolved");
                }
                Err(e) => {
                    warn!(%game_id, "Auto-pass failed: {}", e);
                    report.failed += 1;
                }
            }
            continue;
        }

        match service.send_reminder(game_id, now, reminder_lead).await {
            Ok(true) => {
                info!(%game_id, "Sent turn reminder");
                report.reminded += 1;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(%game_id, "Reminder failed: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{ChannelNotifier, NotificationKind};
    use crate::store::InMemoryRepository;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;
    use wordsquare_core::{GameEvent, GameSettings, WordList};

    fn service(notifier: Arc<ChannelNotifier>) -> GameService {
        GameService::new(
            Arc::new(InMemoryRepository::new()),
            notifier,
            Arc::new(WordList::empty()),
            GameSettings::default(),
            "en",
        )
        .with_rng(StdRng::seed_from_u64(4))
    }

    async fn started(service: &GameService) -> Uuid {
        let game = service.create_game(Uuid::new_v4(), None, None).unwrap();
        service.join(game.id, Uuid::new_v4()).await.unwrap();
        game.id
    }

    #[tokio::test]
    async fn test_sweep_auto_passes_expired_turns() {
        let service = service(Arc::new(ChannelNotifier::new()));
        let id = started(&service).await;
        let game = service.game(id).unwrap();
        let holder = game.current_turn.unwrap();
        let later = game.turn_expires_at.unwrap() + Duration::seconds(1);

        let report = sweep_once(&service, later, Duration::hours(1)).await;

        assert_eq!(report, SweepReport { expired: 1, reminded: 0, failed: 0 });
        let game = service.game(id).unwrap();
        assert_eq!(game.consecutive_passes, 1);
        assert_ne!(game.current_turn, Some(holder));
    }

    #[tokio::test]
    async fn test_sweep_reminds_before_expiry() {
        let notifier = Arc::new(ChannelNotifier::new());
        let service = service(notifier.clone());
        let id = started(&service).await;
        let game = service.game(id).unwrap();
        let mut rx = notifier.subscribe(game.current_turn.unwrap());
        let soon = game.turn_expires_at.unwrap() - Duration::minutes(30);

        let first = sweep_once(&service, soon, Duration::hours(1)).await;
        let second = sweep_once(&service, soon, Duration::hours(1)).await;

        assert_eq!(first.reminded, 1);
        assert_eq!(second.reminded, 0);
        assert!(matches!(
            rx.recv().await.unwrap().kind,
            NotificationKind::TurnEndingSoon { .. }
        ));
    }

    #[tokio::test]
    async fn test_second_timeout_finishes_game() {
        let notifier = Arc::new(ChannelNotifier::new());
        let service = service(notifier.clone());
        let id = started(&service).await;
        let game = service.game(id).unwrap();
        let mut rx = notifier.subscribe(game.players[0].user_id);

        let first = game.turn_expires_at.unwrap();
        sweep_once(&service, first, Duration::hours(1)).await;
        let second = service.game(id).unwrap().turn_expires_at.unwrap();
        sweep_once(&service, second, Duration::hours(1)).await;

        assert!(service.game(id).unwrap().is_finished());
        assert!(service.list_active().is_empty());

        let mut finished = false;
        while let Ok(notification) = rx.try_recv() {
            if let NotificationKind::Event(GameEvent::GameFinished { .. }) = notification.kind {
                finished = true;
            }
        }
        assert!(finished);
    }
}
