//! The transport seam: what the lifecycle core needs from a client socket.
//!
//! The real implementation lives with the socket listener and framing layer;
//! tests substitute an in-memory double. Everything here is phase-aware but
//! encoding-agnostic -- packets are handed over as structured values and the
//! transport worries about framing, compression, and encryption.

use std::sync::Arc;

use azalea_chat::FormattedText;
use azalea_protocol::packets::config::s_select_known_packs::KnownPack;
use azalea_protocol::packets::config::ClientboundConfigPacket;
use azalea_protocol::packets::game::ClientboundGamePacket;
use azalea_protocol::packets::login::ClientboundLoginPacket;
use tokio::sync::oneshot;

use crate::net::plugin::LoginPluginProcessor;

/// A clientbound packet tagged with the protocol phase it belongs to.
#[derive(Debug, Clone)]
pub enum ServerPacket {
    Login(ClientboundLoginPacket),
    Config(ClientboundConfigPacket),
    Game(ClientboundGamePacket),
}

/// One connected client socket.
///
/// Implementations must be safe to share across the connection's I/O task
/// and the simulation thread. `send` after the connection dropped is a no-op;
/// the lifecycle core checks `is_online` at its own decision points and
/// tolerates races in between.
pub trait Connection: Send + Sync {
    /// Stable identifier, unique per accepted socket for the lifetime of the
    /// process.
    fn id(&self) -> u64;

    fn send(&self, packet: ServerPacket);

    /// Send a disconnect packet carrying `reason`, then close.
    fn kick(&self, reason: FormattedText);

    fn is_online(&self) -> bool;

    /// Close without a reason packet.
    fn disconnect(&self);

    /// Enable packet compression on the underlying stream.
    fn start_compression(&self);

    /// Send a known-packs query and return the receiver for the client's
    /// selection. The sender side must stay alive until the client answers
    /// or the connection dies.
    fn request_known_packs(&self, packs: Vec<KnownPack>) -> oneshot::Receiver<Vec<KnownPack>>;

    /// The processor tracking this connection's login plugin message
    /// round-trips.
    fn login_plugin_messages(&self) -> Arc<LoginPluginProcessor>;

    /// Drain queued serverbound packets into the configuration handler.
    /// Invoked from the simulation tick while the client is configuring.
    fn interpret_packet_queue(&self);
}
