//! Connected-client lifecycle: login -> configuration -> play.
//!
//! The manager owns every client from login completion until disconnect. Two
//! contexts touch it: per-connection I/O tasks run the login transition and
//! the configuration routine, and the simulation thread runs [`tick`] once
//! per world tick to admit configured players, schedule keep-alives, and
//! pump configuration-phase packets.
//!
//! Design contract with the simulation thread:
//!   * The config/play/keep-alive sets are read through snapshots -- set
//!     mutation never blocks a tick mid-iteration.
//!   * The handoff queue is a non-blocking MPSC drain.
//!   * The tick never awaits (the spawn future is only joined inline in test
//!     harnesses).
//!
//! [`tick`]: ConnectionManager::tick

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use azalea_auth::game_profile::GameProfile;
use azalea_buf::AzaleaWrite;
use azalea_chat::FormattedText;
use azalea_protocol::common::tags::TagMap;
use azalea_protocol::packets::config::s_select_known_packs::KnownPack;
use azalea_protocol::packets::config::{
    ClientboundConfigPacket, ClientboundCustomPayload, ClientboundFinishConfiguration,
    ClientboundKeepAlive as ConfigKeepAlive, ClientboundResetChat,
    ClientboundUpdateEnabledFeatures, ClientboundUpdateTags,
};
use azalea_protocol::packets::game::{
    ClientboundKeepAlive as GameKeepAlive, ClientboundStartConfiguration,
};
use azalea_protocol::packets::login::ClientboundLoginFinished;
use azalea_protocol::packets::Packet;
use azalea_registry::identifier::Identifier;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::ConnectionError;
use crate::events::{ConfigurationEvent, EventBus, PreLoginEvent};
use crate::net::cache::CachedPacket;
use crate::net::connection::{Connection, ServerPacket};
use crate::player::{default_provider, PendingOptions, Phase, Player, PlayerProvider};
use crate::registries::{Registries, DATA_REGISTRIES, TAG_REGISTRIES};
use crate::text;

fn timeout_reason() -> FormattedText {
    FormattedText::from("Timeout")
}

fn shutdown_reason() -> FormattedText {
    FormattedText::from("Server shutting down")
}

fn invalid_proxy_response() -> FormattedText {
    FormattedText::from("Invalid proxy response!")
}

/// The built-in core data pack every vanilla client already has locally.
pub fn core_pack() -> KnownPack {
    KnownPack {
        namespace: "minecraft".into(),
        id: "core".into(),
        version: azalea_protocol::packets::VERSION_NAME.into(),
    }
}

/// The `minecraft:brand` plugin message identifying this implementation.
fn brand_packet(brand: &str) -> ClientboundConfigPacket {
    let mut payload = Vec::new();
    brand
        .to_string()
        .azalea_write(&mut payload)
        .expect("write to Vec cannot fail");
    ClientboundCustomPayload {
        identifier: Identifier::new("minecraft:brand"),
        data: payload.into(),
    }
    .into_variant()
}

fn keep_alive_packet(phase: Phase, id: u64) -> ServerPacket {
    match phase {
        Phase::Play => ServerPacket::Game(GameKeepAlive { id }.into_variant()),
        _ => ServerPacket::Config(ConfigKeepAlive { id }.into_variant()),
    }
}

type PlayerSet = RwLock<IndexMap<u64, Arc<Player>>>;

/// Manages the connected clients.
pub struct ConnectionManager {
    config: ServerConfig,
    events: Arc<EventBus>,
    registries: Arc<Registries>,
    cached_tags_packet: CachedPacket,

    // All players once their Player object has been instantiated, keyed by
    // connection id.
    connection_players: DashMap<u64, Arc<Player>>,
    // Players that finished configuration and wait for the next tick to be
    // spawned into the world.
    waiting_players_tx: mpsc::UnboundedSender<Arc<Player>>,
    waiting_players_rx: Mutex<mpsc::UnboundedReceiver<Arc<Player>>>,
    // Players in the configuration state.
    configuration_players: PlayerSet,
    // Players in the play state.
    play_players: PlayerSet,
    // Players due keep-alive ticks. Not simply config + play: between sending
    // finish-configuration and receiving the client's configuration-end the
    // protocol has no keep-alive, so that window is excluded.
    keep_alive_players: PlayerSet,

    player_provider: RwLock<PlayerProvider>,
    // Serialises removal with shutdown.
    removal_lock: Mutex<()>,
    shut_down: AtomicBool,
}

impl ConnectionManager {
    pub fn new(config: ServerConfig, events: Arc<EventBus>, registries: Arc<Registries>) -> Self {
        let (waiting_players_tx, waiting_players_rx) = mpsc::unbounded_channel();
        let tag_source = Arc::clone(&registries);
        let cached_tags_packet = CachedPacket::new(move || create_tags_packet(&tag_source));
        Self {
            config,
            events,
            registries,
            cached_tags_packet,
            connection_players: DashMap::new(),
            waiting_players_tx,
            waiting_players_rx: Mutex::new(waiting_players_rx),
            configuration_players: RwLock::new(IndexMap::new()),
            play_players: RwLock::new(IndexMap::new()),
            keep_alive_players: RwLock::new(IndexMap::new()),
            player_provider: RwLock::new(default_provider()),
            removal_lock: Mutex::new(()),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    // ── Player registry ─────────────────────────────────────────────────

    /// Instantiate a player for `connection` through the current provider
    /// and register it.
    pub fn create_player(
        &self,
        connection: Arc<dyn Connection>,
        game_profile: GameProfile,
    ) -> Result<Arc<Player>, ConnectionError> {
        if self.shut_down.load(Ordering::Relaxed) {
            return Err(ConnectionError::ShutDown);
        }
        let provider = Arc::clone(&*self.player_provider.read().expect("player provider poisoned"));
        let player = provider(Arc::clone(&connection), game_profile);
        match self.connection_players.entry(connection.id()) {
            Entry::Occupied(_) => Err(ConnectionError::AlreadyRegistered),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&player));
                Ok(player)
            }
        }
    }

    /// Replace the player factory; `None` restores the default.
    pub fn set_player_provider(&self, provider: Option<PlayerProvider>) {
        *self.player_provider.write().expect("player provider poisoned") =
            provider.unwrap_or_else(default_provider);
    }

    /// Remove a player from the registry and every membership set. Called on
    /// disconnection; idempotent.
    pub fn remove_player(&self, connection: &dyn Connection) {
        let _guard = self.removal_lock.lock().expect("removal lock poisoned");
        let Some((id, player)) = self.connection_players.remove(&connection.id()) else {
            return;
        };
        tracing::debug!("Removing player {}", player.username());
        self.configuration_players
            .write()
            .expect("player set poisoned")
            .shift_remove(&id);
        self.play_players
            .write()
            .expect("player set poisoned")
            .shift_remove(&id);
        self.keep_alive_players
            .write()
            .expect("player set poisoned")
            .shift_remove(&id);
    }

    /// Kick every connected client and clear the registry. Subsequent
    /// `create_player` calls are rejected.
    pub fn shutdown(&self) {
        let _guard = self.removal_lock.lock().expect("removal lock poisoned");
        self.shut_down.store(true, Ordering::Relaxed);
        for entry in self.connection_players.iter() {
            entry.value().kick(shutdown_reason());
        }
        self.configuration_players
            .write()
            .expect("player set poisoned")
            .clear();
        self.play_players
            .write()
            .expect("player set poisoned")
            .clear();
        self.keep_alive_players
            .write()
            .expect("player set poisoned")
            .clear();
        self.connection_players.clear();
    }

    // ── Lookups ─────────────────────────────────────────────────────────

    /// The player linked to a connection, in whatever phase.
    pub fn get_player(&self, connection: &dyn Connection) -> Option<Arc<Player>> {
        self.connection_players
            .get(&connection.id())
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Number of players in the play state (configuration players excluded).
    pub fn get_online_player_count(&self) -> usize {
        self.play_players.read().expect("player set poisoned").len()
    }

    /// Snapshot of the players currently in the play state.
    pub fn get_online_players(&self) -> Vec<Arc<Player>> {
        snapshot(&self.play_players)
    }

    /// Snapshot of the players currently in the configuration state.
    pub fn get_config_players(&self) -> Vec<Arc<Player>> {
        snapshot(&self.configuration_players)
    }

    /// First playing player whose username matches case-insensitively.
    pub fn get_online_player_by_username(&self, username: &str) -> Option<Arc<Player>> {
        self.get_online_players()
            .into_iter()
            .find(|player| player.username().eq_ignore_ascii_case(username))
    }

    /// First playing player with this UUID.
    pub fn get_online_player_by_uuid(&self, uuid: Uuid) -> Option<Arc<Player>> {
        self.get_online_players()
            .into_iter()
            .find(|player| player.uuid() == uuid)
    }

    /// Closest playing player for a possibly partial username: an exact
    /// case-insensitive match wins, otherwise the highest Jaro-Winkler
    /// similarity above zero, ties broken by join order.
    pub fn find_online_player(&self, username: &str) -> Option<Arc<Player>> {
        if let Some(exact) = self.get_online_player_by_username(username) {
            return Some(exact);
        }
        let query = username.to_lowercase();
        let mut best: Option<(f64, Arc<Player>)> = None;
        for player in self.get_online_players() {
            let score = text::jaro_winkler(&query, &player.username().to_lowercase());
            if score > 0.0 && best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((score, player));
            }
        }
        best.map(|(_, player)| player)
    }

    // ── Tags ────────────────────────────────────────────────────────────

    /// Send the cached tag registry broadcast to one player.
    pub fn send_registry_tags(&self, player: &Player) {
        player.send((*self.cached_tags_packet.get()).clone());
    }

    /// Drop the cached tag packet; the next send rebuilds it from the
    /// registries. Invalidation flows one way -- registries never reach back
    /// into the manager.
    pub fn invalidate_tags(&self) {
        self.cached_tags_packet.invalidate();
    }

    // ── Phase transitions ───────────────────────────────────────────────

    /// Finish the login phase: compression, the pre-login event, the login
    /// plugin message barrier, then `LoginSuccess`.
    ///
    /// Returns the profile the player will assume (handlers may have
    /// rewritten it). Runs on the connection's I/O task.
    pub async fn transition_login_to_config(
        &self,
        connection: Arc<dyn Connection>,
        game_profile: GameProfile,
    ) -> Result<GameProfile, ConnectionError> {
        if self.config.compression_threshold > 0 {
            connection.start_compression();
        }

        let plugin_messages = connection.login_plugin_messages();
        let mut event = PreLoginEvent::new(
            Arc::clone(&connection),
            game_profile,
            Arc::clone(&plugin_messages),
        );
        self.events.dispatch_pre_login(&mut event);
        if !connection.is_online() {
            // Kicked during the event.
            return Ok(event.profile);
        }
        let game_profile = event.profile;

        if plugin_messages
            .await_replies(self.config.login_plugin_message_timeout())
            .await
            .is_err()
        {
            connection.kick(invalid_proxy_response());
            return Err(ConnectionError::LoginPluginReplyFailed);
        }

        connection.send(ServerPacket::Login(
            ClientboundLoginFinished {
                game_profile: game_profile.clone(),
            }
            .into_variant(),
        ));
        Ok(game_profile)
    }

    /// Send a playing client back to the configuration phase.
    pub fn transition_play_to_config(&self, player: &Arc<Player>) {
        player.send(ServerPacket::Game(
            ClientboundStartConfiguration {}.into_variant(),
        ));
        let id = player.connection().id();
        self.play_players
            .write()
            .expect("player set poisoned")
            .shift_remove(&id);
        self.configuration_players
            .write()
            .expect("player set poisoned")
            .insert(id, Arc::clone(player));
        player.set_phase(Phase::Config);
    }

    /// Drive a player through the configuration phase up to
    /// finish-configuration. Runs on the connection's I/O task; suspends on
    /// the known-packs reply and the resource pack future.
    pub async fn do_configuration(
        &self,
        player: &Arc<Player>,
        is_first_config: bool,
    ) -> Result<(), ConnectionError> {
        let id = player.connection().id();
        if is_first_config {
            self.configuration_players
                .write()
                .expect("player set poisoned")
                .insert(id, Arc::clone(player));
            self.keep_alive_players
                .write()
                .expect("player set poisoned")
                .insert(id, Arc::clone(player));
            player.set_phase(Phase::Config);
        }

        player.send(ServerPacket::Config(brand_packet(&self.config.brand_name)));
        // Request known packs immediately, but only wait for the response
        // when it is actually needed (before sending registry data).
        let known_packs = player.connection().request_known_packs(vec![core_pack()]);

        let mut event = ConfigurationEvent::new(Arc::clone(player), is_first_config);
        self.events.dispatch_configuration(&mut event);
        if !player.is_online() {
            // Kicked during the event.
            return Ok(());
        }

        let features: Vec<Identifier> = event
            .feature_flags
            .iter()
            .map(|flag| Identifier::new(flag))
            .collect();
        player.send(ServerPacket::Config(
            ClientboundUpdateEnabledFeatures { features }.into_variant(),
        ));

        let Some(spawn_target) = event.spawn_target.clone() else {
            return Err(ConnectionError::SpawnMissing);
        };

        if event.clear_chat {
            player.send(ServerPacket::Config(ClientboundResetChat {}.into_variant()));
        }

        if event.send_registry_data {
            let known_packs = match tokio::time::timeout(
                self.config.known_packs_response_timeout(),
                known_packs,
            )
            .await
            {
                Ok(Ok(packs)) => packs,
                Ok(Err(recv_error)) => {
                    return Err(ConnectionError::KnownPacksFailed(recv_error.to_string()));
                }
                Err(_elapsed) => {
                    tracing::warn!(
                        "Player {} failed to respond to known packs query",
                        player.username()
                    );
                    player.connection().disconnect();
                    return Ok(());
                }
            };
            let core = core_pack();
            let exclude_vanilla = known_packs.iter().any(|pack| {
                pack.namespace == core.namespace
                    && pack.id == core.id
                    && pack.version == core.version
            });

            for kind in DATA_REGISTRIES {
                player.send(ServerPacket::Config(
                    self.registries
                        .registry(kind)
                        .registry_data_packet(exclude_vanilla),
                ));
            }
            self.send_registry_tags(player);
        }

        // Wait for pending resource packs if any. The resource pack subsystem
        // owns its own deadlines; a dropped sender counts as resolved.
        if let Some(resource_packs) = player.take_resource_pack_future() {
            let _ = resource_packs.await;
        }

        // Quiet interval: no keep-alives between finish-configuration and the
        // client's configuration-end.
        self.keep_alive_players
            .write()
            .expect("player set poisoned")
            .shift_remove(&id);
        player.set_pending_options(PendingOptions {
            instance: spawn_target,
            hardcore: event.hardcore,
        });
        player.send(ServerPacket::Config(
            ClientboundFinishConfiguration {}.into_variant(),
        ));
        Ok(())
    }

    /// Queue a configured player for the next tick's world admission.
    pub fn transition_config_to_play(&self, player: Arc<Player>) {
        // The receiver only closes on drop, i.e. never while the manager lives.
        let _ = self.waiting_players_tx.send(player);
    }

    // ── Tick ────────────────────────────────────────────────────────────

    /// One simulation tick: admit waiting players, run the keep-alive
    /// schedule, and pump configuration-phase packet queues.
    ///
    /// `tick_start` is monotonic nanoseconds and is forwarded as the
    /// keep-alive id.
    pub fn tick(&self, tick_start: u64) {
        self.update_waiting_players();
        self.handle_keep_alive(tick_start);
        for player in snapshot(&self.configuration_players) {
            player.interpret_packet_queue();
        }
    }

    /// Drain the handoff queue into the play state.
    fn update_waiting_players(&self) {
        let mut waiting = self
            .waiting_players_rx
            .lock()
            .expect("waiting queue poisoned");
        while let Ok(player) = waiting.try_recv() {
            if !player.is_online() {
                // Disconnected while queued to join.
                continue;
            }
            let id = player.connection().id();
            self.configuration_players
                .write()
                .expect("player set poisoned")
                .shift_remove(&id);
            self.play_players
                .write()
                .expect("player set poisoned")
                .insert(id, Arc::clone(&player));
            self.keep_alive_players
                .write()
                .expect("player set poisoned")
                .insert(id, Arc::clone(&player));

            // Some clients never answer keep-alives during configuration;
            // entering play with a stale flag would suppress every further
            // ping and end in a timeout kick.
            player.refresh_answered_keep_alive(true);
            player.set_phase(Phase::Play);

            if let Some(spawn) = player.begin_world_entry() {
                // Needed to observe the exact moment the player spawns.
                if self.config.inside_test {
                    let _ = spawn.blocking_recv();
                }
            }
        }
    }

    /// Send due keep-alives and kick silent clients.
    fn handle_keep_alive(&self, tick_start: u64) {
        let delay = self.config.keep_alive_delay_nanos();
        let kick = self.config.keep_alive_kick_nanos();
        for player in snapshot(&self.keep_alive_players) {
            let age = tick_start.saturating_sub(player.last_keep_alive());
            if age > delay && player.did_answer_keep_alive() {
                player.refresh_keep_alive(tick_start);
                player.send(keep_alive_packet(player.phase(), tick_start));
            } else if age >= kick {
                player.kick(timeout_reason());
            }
        }
    }
}

fn snapshot(set: &PlayerSet) -> Vec<Arc<Player>> {
    set.read()
        .expect("player set poisoned")
        .values()
        .cloned()
        .collect()
}

/// Concatenate the tag registries consumed by the vanilla client into one
/// broadcast packet. Registries unused by the client are not included.
fn create_tags_packet(registries: &Registries) -> ServerPacket {
    let mut tags = IndexMap::new();
    for kind in TAG_REGISTRIES {
        let (id, entries) = registries.registry(kind).tag_registry();
        tags.insert(id, entries);
    }
    ServerPacket::Config(ClientboundUpdateTags { tags: TagMap(tags) }.into_variant())
}
