use thiserror::Error;

/// Errors surfaced by the connection lifecycle core.
///
/// Transient client faults (timeouts) kick or disconnect the offending
/// connection before the error is returned; the per-connection task is
/// expected to stop on any `Err`. Nothing here is retried.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// A player object is already registered for this connection.
    #[error("a player is already registered for this connection")]
    AlreadyRegistered,

    /// The manager has been shut down and accepts no new players.
    #[error("connection manager is shut down")]
    ShutDown,

    /// The configuration handler finished without choosing a spawn instance.
    #[error("no spawning instance was set during the configuration event")]
    SpawnMissing,

    /// Outstanding login plugin messages were not answered before the
    /// deadline. The connection has already been kicked.
    #[error("timed out waiting for login plugin message replies")]
    LoginPluginReplyFailed,

    /// The known-packs exchange failed on the transport side (the reply
    /// channel was dropped without an answer).
    #[error("known packs request failed: {0}")]
    KnownPacksFailed(String),
}
