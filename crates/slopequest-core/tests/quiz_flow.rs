//! # Quiz Flow Tests
//!
//! End-to-end play through `GameSession` with in-memory stores.
//!
//! ## Groups
//! - Answering: rewards, retries, reveals, input errors
//! - Levels: rollover, one-time level-up notice
//! - Shop: buying, selecting, insufficient funds
//! - Lifecycle: new game, telemetry

use slopequest_core::{
    AnswerOutcome, GameConfig, GameSession, GridPoint, MemoryRemoteStore, MemoryStore,
    OfflineRemoteStore, QuestionPhase, QuizError, RecordingSink, ShopOutcome,
};
use std::sync::Arc;

fn p(x: i32, y: i32) -> GridPoint {
    GridPoint::new(x, y)
}

fn session_with(config: GameConfig) -> (GameSession, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let session = GameSession::start(
        Box::new(MemoryStore::new()),
        Arc::new(OfflineRemoteStore),
        sink.clone(),
        config,
    )
    .expect("start");
    (session, sink)
}

fn session() -> (GameSession, Arc<RecordingSink>) {
    session_with(GameConfig::default())
}

/// Answer the current question correctly with a slope-1 line.
fn answer_correctly(session: &mut GameSession) -> AnswerOutcome {
    session.select_points(p(0, 0), p(1, 1)).expect("points");
    session.submit_answer("1").expect("answer")
}

// =============================================================================
// ANSWERING
// =============================================================================

mod answering {
    use super::*;

    #[test]
    fn level_one_whole_slope_is_rewarded() {
        let (mut session, _) = session();
        session.select_points(p(0, 0), p(4, 8)).expect("points");

        let outcome = session.submit_answer("2").expect("answer");

        assert!(outcome.is_correct());
        assert_eq!(session.state().score(), 10);
        assert_eq!(session.state().coins(), 10);
        assert_eq!(session.state().correct_answers(), 1);
    }

    #[test]
    fn level_two_accepts_two_decimals() {
        let config = GameConfig {
            questions_per_level: 1,
            ..GameConfig::default()
        };
        let (mut session, _) = session_with(config);
        answer_correctly(&mut session);
        assert_eq!(session.state().current_level(), 2);

        session.select_points(p(0, 0), p(3, 7)).expect("points");
        let outcome = session.submit_answer("2.33").expect("answer");

        assert_eq!(
            outcome,
            AnswerOutcome::Correct {
                reward: 20,
                advance: slopequest_core::AdvanceOutcome {
                    level: 3,
                    question: 0,
                    completed_level: Some(2),
                    level_up_notice: false,
                },
            }
        );
        assert_eq!(session.state().score(), 30);
    }

    #[test]
    fn three_misses_reveal_the_answer() {
        let (mut session, _) = session();
        session.select_points(p(0, 0), p(4, 8)).expect("points");

        assert!(matches!(
            session.submit_answer("3"),
            Ok(AnswerOutcome::Retry {
                attempts_remaining: 2
            })
        ));
        assert!(matches!(
            session.submit_answer("4"),
            Ok(AnswerOutcome::Retry {
                attempts_remaining: 1
            })
        ));
        let outcome = session.submit_answer("5").expect("answer");

        assert!(matches!(outcome, AnswerOutcome::Revealed { canonical, .. } if canonical == 2.0));
        assert_eq!(session.state().wrong_answers(), 1);
        assert_eq!(session.state().current_question(), 1);
        assert_eq!(session.phase(), QuestionPhase::AwaitingPoints);
    }

    #[test]
    fn vertical_line_keeps_the_attempt() {
        let (mut session, sink) = session();
        session.select_points(p(3, 0), p(3, 9)).expect("points");

        assert_eq!(session.submit_answer("1"), Err(QuizError::VerticalSlope));
        assert_eq!(session.phase(), QuestionPhase::AwaitingAnswer);
        assert_eq!(session.attempt().attempts_remaining(), 3);
        assert_eq!(sink.names(), vec!["game_session_start"]);
    }

    #[test]
    fn decimal_on_level_one_is_not_an_attempt() {
        let (mut session, _) = session();
        session.select_points(p(0, 0), p(4, 8)).expect("points");

        let err = session.submit_answer("2.0").expect_err("decimal");

        assert_eq!(err, QuizError::DecimalNotAllowed);
        assert!(err.is_user_input());
        assert_eq!(session.attempt().attempts_remaining(), 3);
    }

    #[test]
    fn points_can_be_placed_one_by_one() {
        let (mut session, _) = session();
        assert_eq!(
            session.submit_answer("1"),
            Err(QuizError::PointsIncomplete)
        );
        assert_eq!(
            session.place_point(p(0, 0)),
            Ok(QuestionPhase::AwaitingPoints)
        );
        assert_eq!(
            session.place_point(p(2, 2)),
            Ok(QuestionPhase::AwaitingAnswer)
        );
        session.clear_points();
        assert_eq!(session.phase(), QuestionPhase::AwaitingPoints);
    }
}

// =============================================================================
// LEVELS
// =============================================================================

mod levels {
    use super::*;

    #[test]
    fn ten_questions_complete_a_level() {
        let (mut session, sink) = session();

        for _ in 0..10 {
            answer_correctly(&mut session);
        }

        assert_eq!(session.state().current_level(), 2);
        assert_eq!(session.state().current_question(), 0);
        let names = sink.names();
        assert_eq!(names.iter().filter(|n| **n == "question_answered").count(), 10);
        assert_eq!(&names[names.len() - 2..], ["level_complete", "level_start"]);
    }

    #[test]
    fn level_up_notice_fires_once() {
        let config = GameConfig {
            questions_per_level: 1,
            ..GameConfig::default()
        };
        let (mut session, _) = session_with(config);

        answer_correctly(&mut session);
        assert!(session.take_level_notice());
        assert!(!session.take_level_notice());
        assert!(session.state().level_up_notice_shown());

        answer_correctly(&mut session);
        assert_eq!(session.state().current_level(), 3);
        assert!(!session.take_level_notice());
    }
}

// =============================================================================
// SHOP
// =============================================================================

mod shop {
    use super::*;

    #[test]
    fn earn_then_buy() {
        let (mut session, _) = session();
        answer_correctly(&mut session);

        let outcome = session.buy_or_select(1).expect("shop");

        assert_eq!(
            outcome,
            ShopOutcome::Purchased {
                item: 1,
                coins_left: 0
            }
        );
        assert_eq!(session.state().selected_item(), 1);
    }

    #[test]
    fn insufficient_funds_change_nothing() {
        let (mut session, _) = session();
        assert!(!session.spend_coins(10));

        let outcome = session.buy_or_select(3).expect("shop");

        assert_eq!(
            outcome,
            ShopOutcome::InsufficientFunds {
                needed: 10,
                available: 0
            }
        );
        assert!(!session.state().owns(3));
        assert_eq!(session.state().coins(), 0);
    }

    #[test]
    fn unknown_item_is_rejected() {
        let (mut session, _) = session();
        assert_eq!(session.buy_or_select(9), Err(QuizError::UnknownItem(9)));
        assert_eq!(session.select_item(2), Err(QuizError::ItemNotOwned(2)));
    }

    #[test]
    fn colored_points_cost_the_item_price() {
        let (mut session, _) = session();
        answer_correctly(&mut session);
        answer_correctly(&mut session);

        assert_eq!(
            session.purchase_colored_variant(),
            ShopOutcome::ColoredUnlocked { coins_left: 10 }
        );
        assert_eq!(session.purchase_colored_variant(), ShopOutcome::AlreadyOwned);
        assert!(session.state().colored_variant_purchased());
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

mod lifecycle {
    use super::*;

    #[test]
    fn new_game_keeps_identity_and_settings() {
        let (mut session, _) = session();
        session.name_player("ada").expect("name");
        session.set_audio_volume(0.25);
        for _ in 0..3 {
            answer_correctly(&mut session);
        }
        session.buy_or_select(2).expect("shop");

        session.new_game();

        let state = session.state();
        assert_eq!(state.player_id(), "ada");
        assert_eq!(state.settings().audio_volume, 0.25);
        assert_eq!(state.current_level(), 1);
        assert_eq!(state.current_question(), 0);
        assert_eq!(state.score(), 0);
        assert_eq!(state.coins(), 0);
        assert_eq!(state.correct_answers(), 0);
        assert_eq!(state.selected_item(), 0);
        assert!(!state.owns(2));
        assert!(!state.level_up_notice_shown());
        assert!(session.take_fresh_start());
        assert!(!session.take_fresh_start());
    }

    #[test]
    fn session_end_reports_total_score() {
        let (mut session, sink) = session();
        answer_correctly(&mut session);
        session.end();

        let last = sink.events().last().cloned().expect("event");
        assert_eq!(last.name(), "game_session_end");
        assert_eq!(
            last.attributes().get("totalScore"),
            Some(&slopequest_core::EventValue::Int(10))
        );
    }

    #[test]
    fn progress_survives_restart() {
        let local = MemoryStore::new();
        let remote = MemoryRemoteStore::new("acct");
        {
            let mut session = GameSession::start(
                Box::new(local.clone()),
                Arc::new(remote.clone()),
                Arc::new(RecordingSink::new()),
                GameConfig::default(),
            )
            .expect("start");
            session.name_player("ada").expect("name");
            answer_correctly(&mut session);
        }

        let session = GameSession::start(
            Box::new(local),
            Arc::new(remote),
            Arc::new(RecordingSink::new()),
            GameConfig::default(),
        )
        .expect("restart");

        assert_eq!(session.state().player_id(), "ada");
        assert_eq!(session.state().score(), 10);
        assert_eq!(session.state().coins(), 10);
        assert_eq!(session.state().current_question(), 1);
    }
}
