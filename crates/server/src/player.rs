//! The server-side view of a connected client.
//!
//! A [`Player`] is created on the connection's I/O task once login completes
//! and is shared behind `Arc` between that task, the simulation tick, and any
//! code holding a lookup result. All mutable state is interior and safe to
//! touch from either context.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use azalea_auth::game_profile::GameProfile;
use azalea_chat::FormattedText;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::net::connection::{Connection, ServerPacket};

/// Protocol subset a player is currently speaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    Login = 0,
    Config = 1,
    Play = 2,
}

impl Phase {
    fn from_u8(raw: u8) -> Phase {
        match raw {
            0 => Phase::Login,
            1 => Phase::Config,
            _ => Phase::Play,
        }
    }
}

/// A world a player can be spawned into. Implemented by the instance
/// simulator; the lifecycle core only initiates entry and (in tests) waits
/// for the returned receiver.
pub trait Instance: Send + Sync {
    /// Begin adding the player to this instance. The receiver resolves once
    /// the player is fully placed in the world.
    fn spawn_player(&self, player: &Arc<Player>) -> oneshot::Receiver<()>;
}

/// Options captured at the end of configuration, consumed at play entry.
pub struct PendingOptions {
    pub instance: Arc<dyn Instance>,
    pub hardcore: bool,
}

/// Factory for player objects, replaceable via
/// `ConnectionManager::set_player_provider`.
pub type PlayerProvider = Arc<dyn Fn(Arc<dyn Connection>, GameProfile) -> Arc<Player> + Send + Sync>;

pub(crate) fn default_provider() -> PlayerProvider {
    Arc::new(|connection, profile| Arc::new(Player::new(connection, profile)))
}

pub struct Player {
    connection: Arc<dyn Connection>,
    // Mutable up to the end of the login transition, stable afterwards.
    profile: RwLock<GameProfile>,
    phase: AtomicU8,
    /// Monotonic nanoseconds of the last outgoing keep-alive.
    last_keep_alive: AtomicU64,
    /// True iff the client answered the most recent keep-alive.
    answered_keep_alive: AtomicBool,
    pending_resource_pack: Mutex<Option<oneshot::Receiver<()>>>,
    pending_options: Mutex<Option<PendingOptions>>,
    hardcore: AtomicBool,
}

impl Player {
    pub fn new(connection: Arc<dyn Connection>, profile: GameProfile) -> Self {
        Self {
            connection,
            profile: RwLock::new(profile),
            phase: AtomicU8::new(Phase::Login as u8),
            last_keep_alive: AtomicU64::new(0),
            answered_keep_alive: AtomicBool::new(true),
            pending_resource_pack: Mutex::new(None),
            pending_options: Mutex::new(None),
            hardcore: AtomicBool::new(false),
        }
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn profile(&self) -> GameProfile {
        self.profile.read().expect("profile poisoned").clone()
    }

    pub fn username(&self) -> String {
        self.profile.read().expect("profile poisoned").name.clone()
    }

    pub fn uuid(&self) -> Uuid {
        self.profile.read().expect("profile poisoned").uuid
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Relaxed))
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.phase.store(phase as u8, Ordering::Relaxed);
    }

    pub fn is_online(&self) -> bool {
        self.connection.is_online()
    }

    pub fn send(&self, packet: ServerPacket) {
        self.connection.send(packet);
    }

    pub fn kick(&self, reason: FormattedText) {
        self.connection.kick(reason);
    }

    // ── Keep-alive bookkeeping ──────────────────────────────────────────

    pub fn last_keep_alive(&self) -> u64 {
        self.last_keep_alive.load(Ordering::Relaxed)
    }

    /// Record an outgoing keep-alive: stamp the send time and clear the
    /// answered flag until the client echoes it back.
    pub(crate) fn refresh_keep_alive(&self, tick_start: u64) {
        self.last_keep_alive.store(tick_start, Ordering::Relaxed);
        self.answered_keep_alive.store(false, Ordering::Relaxed);
    }

    pub fn did_answer_keep_alive(&self) -> bool {
        self.answered_keep_alive.load(Ordering::Relaxed)
    }

    /// Called by the packet listener when the client echoes a keep-alive,
    /// and by the tick driver when a player enters the play state.
    pub fn refresh_answered_keep_alive(&self, answered: bool) {
        self.answered_keep_alive.store(answered, Ordering::Relaxed);
    }

    // ── Configuration hand-off state ────────────────────────────────────

    /// Register a receiver resolving once all issued resource packs have
    /// been accepted or declined. The configuration routine waits on it
    /// before finishing; the resource pack subsystem owns the deadline.
    pub fn set_resource_pack_future(&self, receiver: oneshot::Receiver<()>) {
        *self
            .pending_resource_pack
            .lock()
            .expect("resource pack slot poisoned") = Some(receiver);
    }

    pub(crate) fn take_resource_pack_future(&self) -> Option<oneshot::Receiver<()>> {
        self.pending_resource_pack
            .lock()
            .expect("resource pack slot poisoned")
            .take()
    }

    pub(crate) fn set_pending_options(&self, options: PendingOptions) {
        *self.pending_options.lock().expect("pending options poisoned") = Some(options);
    }

    /// Consume the pending options and start spawning into the chosen
    /// instance. `None` when no configuration pass stored options.
    pub(crate) fn begin_world_entry(self: &Arc<Self>) -> Option<oneshot::Receiver<()>> {
        let options = self
            .pending_options
            .lock()
            .expect("pending options poisoned")
            .take()?;
        self.hardcore.store(options.hardcore, Ordering::Relaxed);
        Some(options.instance.spawn_player(self))
    }

    pub fn is_hardcore(&self) -> bool {
        self.hardcore.load(Ordering::Relaxed)
    }

    /// Feed queued serverbound packets to the configuration handler. Runs on
    /// the simulation thread for players in the configuration phase.
    pub fn interpret_packet_queue(&self) {
        self.connection.interpret_packet_queue();
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("username", &self.username())
            .field("uuid", &self.uuid())
            .field("phase", &self.phase())
            .finish()
    }
}
