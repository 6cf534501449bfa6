//! Tick driver behaviour: handoff draining, keep-alive scheduling with its
//! exact boundaries, shutdown, and the lookup helpers.
//!
//! These tests drive `tick` directly from the test thread, the same way the
//! simulation thread calls it in production.

mod common;

use std::sync::Arc;

use azalea_protocol::packets::config::ClientboundConfigPacket;
use basalt_server::net::connection::{Connection, ServerPacket};
use basalt_server::{ConnectionError, EventBus, ServerConfig};

use common::{manager_with, profile, TestConnection};

const DELAY_MS: u64 = 10;
const KICK_MS: u64 = 30;
const DELAY_NS: u64 = DELAY_MS * 1_000_000;
const KICK_NS: u64 = KICK_MS * 1_000_000;

fn tick_config() -> ServerConfig {
    ServerConfig {
        keep_alive_delay_ms: DELAY_MS,
        keep_alive_kick_ms: KICK_MS,
        ..Default::default()
    }
}

/// Register a player and push it through the handoff queue at t=0.
fn admit(
    manager: &Arc<basalt_server::ConnectionManager>,
    id: u64,
    name: &str,
) -> (Arc<TestConnection>, Arc<basalt_server::Player>) {
    let conn = TestConnection::new(id);
    let player = manager
        .create_player(conn.clone(), profile(name))
        .expect("player registered");
    manager.transition_config_to_play(Arc::clone(&player));
    manager.tick(0);
    (conn, player)
}

// ---------------------------------------------------------------------------
// Handoff
// ---------------------------------------------------------------------------

#[test]
fn handoff_moves_player_into_play_state() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let (_conn, player) = admit(&manager, 1, "Nova");

    assert_eq!(manager.get_online_player_count(), 1);
    assert!(manager.get_config_players().is_empty());
    assert!(player.did_answer_keep_alive());
}

#[test]
fn handoff_skips_players_that_disconnected_while_queued() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let conn = TestConnection::new(1);
    let player = manager
        .create_player(conn.clone(), profile("Nova"))
        .expect("player registered");

    manager.transition_config_to_play(Arc::clone(&player));
    conn.disconnect();
    manager.tick(0);

    assert_eq!(manager.get_online_player_count(), 0);
}

#[test]
fn handoff_forgives_unanswered_configuration_keep_alives() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let conn = TestConnection::new(1);
    let player = manager
        .create_player(conn.clone(), profile("Nova"))
        .expect("player registered");
    player.refresh_answered_keep_alive(false);

    manager.transition_config_to_play(Arc::clone(&player));
    manager.tick(0);

    assert!(player.did_answer_keep_alive());
}

// ---------------------------------------------------------------------------
// Keep-alive boundaries
// ---------------------------------------------------------------------------

#[test]
fn keep_alive_boundaries_are_exact() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let (conn, player) = admit(&manager, 1, "Nova");

    // age == delay: strictly-greater check means nothing is sent yet.
    manager.tick(DELAY_NS);
    assert_eq!(conn.keep_alive_count(), 0);

    // One nanosecond later the ping goes out and the answer flag drops.
    manager.tick(DELAY_NS + 1);
    assert_eq!(conn.keep_alive_count(), 1);
    assert!(!player.did_answer_keep_alive());
    let sent_at = DELAY_NS + 1;

    // Unanswered but not yet silent for KEEP_ALIVE_KICK: nothing happens.
    manager.tick(sent_at + KICK_NS - 1);
    assert_eq!(conn.keep_alive_count(), 1);
    assert!(conn.kicks().is_empty());

    // age == kick is inclusive: the client is kicked with Timeout.
    manager.tick(sent_at + KICK_NS);
    assert_eq!(conn.kicks(), vec!["Timeout".to_string()]);
}

#[test]
fn answered_keep_alive_schedules_the_next_ping() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let (conn, player) = admit(&manager, 1, "Nova");

    manager.tick(DELAY_NS + 1);
    assert_eq!(conn.keep_alive_count(), 1);

    // The client echoes the ping; the next one is due a full delay later.
    player.refresh_answered_keep_alive(true);
    let second_due = DELAY_NS + 1 + DELAY_NS;
    manager.tick(second_due);
    assert_eq!(conn.keep_alive_count(), 1);
    manager.tick(second_due + 1);
    assert_eq!(conn.keep_alive_count(), 2);
    assert!(conn.kicks().is_empty());
}

#[test]
fn configuration_phase_players_get_config_keep_alives() {
    // A spawn-less configuration pass leaves the player in the keep-alive
    // set with its phase still CONFIG.
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let conn = TestConnection::new(1);
    let player = manager
        .create_player(conn.clone(), profile("Nova"))
        .expect("player registered");

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
        .block_on(manager.do_configuration(&player, true));
    assert!(matches!(result, Err(ConnectionError::SpawnMissing)));

    manager.tick(DELAY_NS + 1);
    assert!(conn
        .sent_packets()
        .iter()
        .any(|p| matches!(p, ServerPacket::Config(ClientboundConfigPacket::KeepAlive(_)))));
}

// ---------------------------------------------------------------------------
// Registry bookkeeping
// ---------------------------------------------------------------------------

#[test]
fn remove_player_is_idempotent_and_restores_empty_state() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let (conn, _player) = admit(&manager, 1, "Nova");
    assert_eq!(manager.get_online_player_count(), 1);

    manager.remove_player(conn.as_ref());
    manager.remove_player(conn.as_ref());

    assert!(manager.get_player(conn.as_ref()).is_none());
    assert_eq!(manager.get_online_player_count(), 0);
    assert!(manager.get_config_players().is_empty());
}

#[test]
fn duplicate_connection_registration_is_rejected() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let conn = TestConnection::new(1);
    manager
        .create_player(conn.clone(), profile("Nova"))
        .expect("first registration");

    let second = manager.create_player(conn.clone(), profile("Nova"));
    assert!(matches!(second, Err(ConnectionError::AlreadyRegistered)));
}

#[test]
fn shutdown_kicks_every_phase_and_rejects_new_players() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let (play_conn, _player) = admit(&manager, 1, "Nova");

    // A second player parked in the configuration state.
    let config_conn = TestConnection::new(2);
    let config_player = manager
        .create_player(config_conn.clone(), profile("Vesper"))
        .expect("player registered");
    manager.transition_play_to_config(&config_player);
    assert_eq!(manager.get_config_players().len(), 1);

    manager.shutdown();

    assert_eq!(play_conn.kicks(), vec!["Server shutting down".to_string()]);
    assert_eq!(config_conn.kicks(), vec!["Server shutting down".to_string()]);
    assert_eq!(manager.get_online_player_count(), 0);
    assert!(manager.get_config_players().is_empty());
    assert!(manager.get_player(play_conn.as_ref()).is_none());

    let late = manager.create_player(TestConnection::new(3), profile("Late"));
    assert!(matches!(late, Err(ConnectionError::ShutDown)));
}

#[test]
fn configuration_players_have_their_packet_queues_pumped() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let conn = TestConnection::new(1);
    let player = manager
        .create_player(conn.clone(), profile("Nova"))
        .expect("player registered");
    manager.transition_play_to_config(&player);

    manager.tick(0);
    manager.tick(1);

    assert_eq!(conn.interpreted_queues(), 2);
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

#[test]
fn username_lookups_are_case_insensitive_and_fuzzy() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let (_c1, alice) = admit(&manager, 1, "Alice");
    let (_c2, _alicia) = admit(&manager, 2, "Alicia");
    let (_c3, bob) = admit(&manager, 3, "Bob");

    let exact = manager
        .get_online_player_by_username("ALICE")
        .expect("exact match");
    assert_eq!(exact.username(), "Alice");

    // "alic" matches nobody exactly; Jaro-Winkler prefers Alice over Alicia.
    assert!(manager.get_online_player_by_username("alic").is_none());
    let fuzzy = manager.find_online_player("alic").expect("fuzzy match");
    assert_eq!(fuzzy.username(), "Alice");

    // Exact matches always win over similarity.
    let bob_match = manager.find_online_player("bob").expect("exact bob");
    assert_eq!(bob_match.username(), "Bob");
    assert_eq!(bob_match.uuid(), bob.uuid());

    assert!(manager.find_online_player("qqqq").is_none());

    let by_uuid = manager
        .get_online_player_by_uuid(alice.uuid())
        .expect("uuid lookup");
    assert_eq!(by_uuid.username(), "Alice");
}

#[test]
fn lookups_ignore_configuration_players() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let conn = TestConnection::new(1);
    let player = manager
        .create_player(conn.clone(), profile("Nova"))
        .expect("player registered");
    manager.transition_play_to_config(&player);

    assert!(manager.get_online_player_by_username("Nova").is_none());
    assert!(manager.find_online_player("Nova").is_none());
    assert!(manager.get_online_player_by_uuid(player.uuid()).is_none());
}

// ---------------------------------------------------------------------------
// Tag cache
// ---------------------------------------------------------------------------

#[test]
fn registry_tags_survive_invalidation() {
    let manager = manager_with(tick_config(), Arc::new(EventBus::new()));
    let conn = TestConnection::new(1);
    let player = manager
        .create_player(conn.clone(), profile("Nova"))
        .expect("player registered");

    manager.send_registry_tags(&player);
    manager.invalidate_tags();
    manager.invalidate_tags();
    manager.send_registry_tags(&player);

    let tag_packets = conn
        .config_packets()
        .iter()
        .filter(|p| matches!(p, ClientboundConfigPacket::UpdateTags(_)))
        .count();
    assert_eq!(tag_packets, 2);
}
