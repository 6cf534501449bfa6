//! Login plugin message round-trips.
//!
//! Proxies and velocity-style forwarders negotiate with the client during
//! login via custom query packets. Each request allocates a message id and a
//! reply slot; the login transition blocks on [`await_replies`] so every
//! round-trip finishes before `LoginSuccess` goes out.
//!
//! [`await_replies`]: LoginPluginProcessor::await_replies

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use azalea_protocol::packets::login::ClientboundCustomQuery;
use azalea_protocol::packets::Packet;
use azalea_registry::identifier::Identifier;
use tokio::sync::{oneshot, watch};
use tokio::time::error::Elapsed;

use crate::net::connection::{Connection, ServerPacket};

/// Tracks pending login plugin message replies for one connection.
pub struct LoginPluginProcessor {
    next_message_id: AtomicI32,
    pending: Mutex<HashMap<i32, oneshot::Sender<Option<Vec<u8>>>>>,
    // Outstanding-reply count; `await_replies` watches it hit zero. A watch
    // channel cannot miss the final decrement the way a bare notify can.
    outstanding: watch::Sender<usize>,
}

impl LoginPluginProcessor {
    pub fn new() -> Self {
        let (outstanding, _) = watch::channel(0);
        Self {
            next_message_id: AtomicI32::new(0),
            pending: Mutex::new(HashMap::new()),
            outstanding,
        }
    }

    /// Send a login plugin request on `channel` and reserve a reply slot.
    ///
    /// The receiver resolves with the client's payload, or `None` when the
    /// client reports the channel as unhandled.
    pub fn request(
        &self,
        connection: &dyn Connection,
        channel: &str,
        payload: Vec<u8>,
    ) -> oneshot::Receiver<Option<Vec<u8>>> {
        let message_id = self.next_message_id.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().expect("pending replies poisoned");
            pending.insert(message_id, reply_tx);
            self.outstanding.send_replace(pending.len());
        }
        connection.send(ServerPacket::Login(
            ClientboundCustomQuery {
                transaction_id: message_id as u32,
                identifier: Identifier::new(channel),
                data: payload.into(),
            }
            .into_variant(),
        ));
        reply_rx
    }

    /// Resolve a reply from the client. Returns false for unknown ids
    /// (stale or never issued), which callers should treat as a protocol
    /// violation.
    pub fn handle_reply(&self, message_id: i32, payload: Option<Vec<u8>>) -> bool {
        let sender = {
            let mut pending = self.pending.lock().expect("pending replies poisoned");
            let sender = pending.remove(&message_id);
            self.outstanding.send_replace(pending.len());
            sender
        };
        match sender {
            Some(reply_tx) => {
                // The requester may have dropped its receiver; the reply
                // still counts as delivered.
                let _ = reply_tx.send(payload);
                true
            }
            None => false,
        }
    }

    /// Number of requests still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("pending replies poisoned").len()
    }

    /// Wait until every issued request has been answered, up to `deadline`.
    pub async fn await_replies(&self, deadline: Duration) -> Result<(), Elapsed> {
        let mut outstanding = self.outstanding.subscribe();
        tokio::time::timeout(deadline, async move {
            let _ = outstanding.wait_for(|count| *count == 0).await;
        })
        .await
    }
}

impl Default for LoginPluginProcessor {
    fn default() -> Self {
        Self::new()
    }
}
