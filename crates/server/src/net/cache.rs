//! A lazily built, invalidatable packet cell.
//!
//! Wraps a packet that is expensive to assemble and shared by every client
//! (the tag registry broadcast). The packet is built on first read, handed
//! out behind `Arc`, and rebuilt only after an explicit invalidation.

use std::sync::{Arc, RwLock};

use crate::net::connection::ServerPacket;

pub struct CachedPacket {
    build: Box<dyn Fn() -> ServerPacket + Send + Sync>,
    cell: RwLock<Option<Arc<ServerPacket>>>,
}

impl CachedPacket {
    pub fn new(build: impl Fn() -> ServerPacket + Send + Sync + 'static) -> Self {
        Self {
            build: Box::new(build),
            cell: RwLock::new(None),
        }
    }

    /// The memoised packet, building it if no value is cached.
    ///
    /// Concurrent readers observe either the previous value or the freshly
    /// built one, never a partial packet. Builds must be idempotent.
    pub fn get(&self) -> Arc<ServerPacket> {
        if let Some(packet) = self.cell.read().expect("packet cell poisoned").as_ref() {
            return Arc::clone(packet);
        }
        let mut slot = self.cell.write().expect("packet cell poisoned");
        // A racing reader may have built the value while we waited.
        if let Some(packet) = slot.as_ref() {
            return Arc::clone(packet);
        }
        let packet = Arc::new((self.build)());
        *slot = Some(Arc::clone(&packet));
        packet
    }

    /// Discard the memoised value; the next [`get`](Self::get) rebuilds.
    pub fn invalidate(&self) {
        *self.cell.write().expect("packet cell poisoned") = None;
    }
}
