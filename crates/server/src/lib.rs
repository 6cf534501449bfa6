//! Basalt -- connection lifecycle core of a voxel-world multiplayer server.
//!
//! This crate owns every client from the moment login completes until
//! disconnect: the login -> configuration -> play state machine, the
//! asynchronous configuration negotiation (known packs, registry data, tags,
//! resource packs), the tick-driven handoff into the world, and the
//! keep-alive schedule with kick-on-silence.
//!
//! The raw socket transport, packet framing, world simulation, and registry
//! data sources are external collaborators consumed through the narrow
//! interfaces in [`net::connection`], [`player`], [`events`], and
//! [`registries`].

pub mod config;
pub mod error;
pub mod events;
pub mod net;
pub mod player;
pub mod registries;
pub mod text;

pub use config::ServerConfig;
pub use error::ConnectionError;
pub use events::EventBus;
pub use net::manager::ConnectionManager;
pub use player::{Phase, Player};
