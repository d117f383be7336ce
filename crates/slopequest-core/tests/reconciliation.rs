//! # Reconciliation Tests
//!
//! Local cache and remote store working together across sessions:
//! merge precedence, legacy migration, degraded modes and the on-disk store.

use slopequest_core::remote::fields;
use slopequest_core::storage::legacy_keys;
use slopequest_core::{
    GameConfig, GameSession, GridPoint, KeyValueStore, MemoryRemoteStore, MemoryStore,
    OfflineRemoteStore, ProfileCache, ProfileSource, RecordingSink, RedbStore, RemoteDocument,
    RemoteValue,
};
use std::sync::Arc;

fn start(local: &MemoryStore, remote: &MemoryRemoteStore) -> GameSession {
    GameSession::start(
        Box::new(local.clone()),
        Arc::new(remote.clone()),
        Arc::new(RecordingSink::new()),
        GameConfig::default(),
    )
    .expect("start")
}

fn answer_correctly(session: &mut GameSession) {
    session
        .select_points(GridPoint::new(0, 0), GridPoint::new(1, 1))
        .expect("points");
    session.submit_answer("1").expect("answer");
}

#[test]
fn fresh_device_adopts_remote_profile() {
    let remote = MemoryRemoteStore::new("acct");
    let mut doc = RemoteDocument::new();
    doc.insert(fields::NICKNAME, RemoteValue::Text("ada".to_string()));
    doc.insert(fields::CURRENT_LEVEL, RemoteValue::Int(4));
    doc.insert(fields::CORRECT_ANSWERS, RemoteValue::Int(31));
    doc.insert(fields::WRONG_ANSWERS, RemoteValue::Int(9));
    doc.insert(fields::SCORE, RemoteValue::Int(520));
    remote.put_document(doc);

    let local = MemoryStore::new();
    let session = start(&local, &remote);

    let state = session.state();
    assert!(session.is_online());
    assert_eq!(state.player_id(), "ada");
    assert_eq!(state.current_level(), 4);
    assert_eq!(state.correct_answers(), 31);
    assert_eq!(state.wrong_answers(), 9);
    assert_eq!(state.score(), 520);
    // Coins are not tracked remotely.
    assert_eq!(state.coins(), 0);

    let (cached, _) = ProfileCache::load(&local, 10, 4).expect("load");
    assert_eq!(cached.score(), 520);
}

#[test]
fn every_resolution_reaches_the_remote() {
    let local = MemoryStore::new();
    let remote = MemoryRemoteStore::new("acct");
    let mut session = start(&local, &remote);
    session.name_player("ada").expect("name");

    for _ in 0..5 {
        answer_correctly(&mut session);
    }
    session.flush_remote();

    let doc = remote.document().expect("document");
    assert_eq!(doc.get_text(fields::NICKNAME).as_deref(), Some("ada"));
    assert_eq!(doc.get_int(fields::SCORE), Some(50));
    assert_eq!(doc.get_int(fields::CORRECT_ANSWERS), Some(5));

    let stats = session.remote_stats().expect("stats");
    assert_eq!(stats.submitted, 6);
    assert_eq!(stats.failed, 0);
}

#[test]
fn remote_outage_keeps_local_progress() {
    let local = MemoryStore::new();
    let remote = MemoryRemoteStore::new("acct");
    let mut session = start(&local, &remote);

    remote.set_available(false);
    answer_correctly(&mut session);
    session.flush_remote();

    assert_eq!(session.state().score(), 10);
    assert!(remote.document().is_none());
    let (cached, _) = ProfileCache::load(&local, 10, 4).expect("load");
    assert_eq!(cached.score(), 10);

    // The next mutation sends a full snapshot again.
    remote.set_available(true);
    answer_correctly(&mut session);
    session.flush_remote();
    assert_eq!(
        remote.document().and_then(|d| d.get_int(fields::SCORE)),
        Some(20)
    );
}

#[test]
fn outage_at_sign_in_recovers_on_next_mutation() {
    let local = MemoryStore::new();
    let remote = MemoryRemoteStore::new("acct");
    remote.set_available(false);

    let mut session = start(&local, &remote);
    assert!(!session.is_online());

    remote.set_available(true);
    session.name_player("ada").expect("name");
    session
        .select_points(GridPoint::new(0, 0), GridPoint::new(4, 8))
        .expect("points");
    session.submit_answer("2").expect("answer");
    session.flush_remote();

    assert!(session.is_online());
    let doc = remote.document().expect("remote write after recovery");
    assert_eq!(doc.get_text(fields::NICKNAME).as_deref(), Some("ada"));
    assert_eq!(doc.get_int(fields::SCORE), Some(10));
}

#[test]
fn sign_in_failure_plays_local_only() {
    let local = MemoryStore::new();
    let remote = MemoryRemoteStore::new("acct");
    remote.set_sign_in_fails(true);

    let mut session = start(&local, &remote);
    remote.set_sign_in_fails(false);
    answer_correctly(&mut session);
    session.end();

    assert!(!session.is_online());
    assert!(session.remote_stats().is_none());
    assert!(remote.saved_documents().is_empty());
    assert_eq!(
        ProfileCache::load(&local, 10, 4).expect("load").0.score(),
        10
    );
}

#[test]
fn legacy_keys_are_migrated_once() {
    let mut local = MemoryStore::new();
    local.set_string(legacy_keys::PLAYER_ID, "ada").expect("set");
    local.set_int(legacy_keys::CURRENT_LEVEL, 2).expect("set");
    local.set_int(legacy_keys::COINS, 40).expect("set");
    local.set_int(&legacy_keys::purchased(3), 1).expect("set");
    local.set_int(legacy_keys::SELECTED_ITEM, 3).expect("set");
    local.save().expect("save");

    let session = GameSession::start(
        Box::new(local.clone()),
        Arc::new(OfflineRemoteStore),
        Arc::new(RecordingSink::new()),
        GameConfig::default(),
    )
    .expect("start");

    assert_eq!(session.state().player_id(), "ada");
    assert_eq!(session.state().coins(), 40);
    assert_eq!(session.state().selected_item(), 3);

    let (_, source) = ProfileCache::load(&local, 10, 4).expect("load");
    assert_eq!(source, ProfileSource::Record);
    assert!(!ProfileCache::has_legacy_layout(&local).expect("check"));
}

#[test]
fn new_game_wipes_local_but_keeps_name() {
    let local = MemoryStore::new();
    local.clone().set_string("stray.key", "x").expect("set");
    let remote = MemoryRemoteStore::new("acct");
    let mut session = start(&local, &remote);
    session.name_player("ada").expect("name");
    answer_correctly(&mut session);

    session.new_game();
    session.flush_remote();

    assert!(!local.contains("stray.key").expect("contains"));
    let (cached, _) = ProfileCache::load(&local, 10, 4).expect("load");
    assert_eq!(cached.player_id(), "ada");
    assert_eq!(cached.score(), 0);
    assert_eq!(
        remote.document().and_then(|d| d.get_int(fields::SCORE)),
        Some(0)
    );
}

#[test]
fn redb_store_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("profile.redb");

    {
        let store = RedbStore::open(&path).expect("open");
        let mut session = GameSession::start(
            Box::new(store),
            Arc::new(OfflineRemoteStore),
            Arc::new(RecordingSink::new()),
            GameConfig::default(),
        )
        .expect("start");
        session.name_player("ada").expect("name");
        answer_correctly(&mut session);
    }

    let store = RedbStore::open(&path).expect("reopen");
    let session = GameSession::start(
        Box::new(store),
        Arc::new(OfflineRemoteStore),
        Arc::new(RecordingSink::new()),
        GameConfig::default(),
    )
    .expect("restart");

    assert_eq!(session.state().player_id(), "ada");
    assert_eq!(session.state().score(), 10);
}
