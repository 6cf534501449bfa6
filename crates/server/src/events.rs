//! Lifecycle events and the handler bus that dispatches them.
//!
//! Events are in-out records: handlers run synchronously on the dispatching
//! task and mutate the event in place; the connection manager reads the
//! post-dispatch state. Handlers registered later observe earlier handlers'
//! mutations.

use std::sync::{Arc, RwLock};

use azalea_auth::game_profile::GameProfile;

use crate::net::connection::Connection;
use crate::net::plugin::LoginPluginProcessor;
use crate::player::{Instance, Player};

/// Feature flag every vanilla client expects to be enabled.
pub const VANILLA_FEATURE: &str = "minecraft:vanilla";

/// Fired after the login handshake completes, before `LoginSuccess` is sent.
///
/// Handlers may rewrite the profile (uuid and username included) and start
/// login plugin message round-trips through [`PreLoginEvent::plugin_messages`];
/// the manager waits for all replies before finishing the transition.
pub struct PreLoginEvent {
    connection: Arc<dyn Connection>,
    /// Identity the player will assume. Mutable until the event returns.
    pub profile: GameProfile,
    plugin_messages: Arc<LoginPluginProcessor>,
}

impl PreLoginEvent {
    pub(crate) fn new(
        connection: Arc<dyn Connection>,
        profile: GameProfile,
        plugin_messages: Arc<LoginPluginProcessor>,
    ) -> Self {
        Self {
            connection,
            profile,
            plugin_messages,
        }
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    pub fn plugin_messages(&self) -> &Arc<LoginPluginProcessor> {
        &self.plugin_messages
    }
}

/// Fired while a player sits in the configuration phase.
///
/// The handler decides where the player spawns; leaving [`spawn_target`]
/// unset fails the configuration routine.
///
/// [`spawn_target`]: ConfigurationEvent::spawn_target
pub struct ConfigurationEvent {
    player: Arc<Player>,
    is_first_config: bool,
    /// Feature flags sent to the client, in insertion order.
    pub feature_flags: Vec<String>,
    /// Ask the client to reset its chat history.
    pub clear_chat: bool,
    /// Send registry data and tags. Disable only when the client already
    /// holds them from a previous configuration pass.
    pub send_registry_data: bool,
    /// Instance the player spawns into once configuration finishes.
    pub spawn_target: Option<Arc<dyn Instance>>,
    pub hardcore: bool,
}

impl ConfigurationEvent {
    pub(crate) fn new(player: Arc<Player>, is_first_config: bool) -> Self {
        Self {
            player,
            is_first_config,
            feature_flags: vec![VANILLA_FEATURE.to_string()],
            clear_chat: false,
            send_registry_data: true,
            spawn_target: None,
            hardcore: false,
        }
    }

    pub fn player(&self) -> &Arc<Player> {
        &self.player
    }

    /// True on initial login, false when a playing client was sent back to
    /// configuration.
    pub fn is_first_config(&self) -> bool {
        self.is_first_config
    }
}

type Handler<E> = Arc<dyn Fn(&mut E) + Send + Sync>;

/// Handler lists for the two lifecycle events.
///
/// Dispatch snapshots the handler list before running it, so handlers may
/// register further handlers without deadlocking.
#[derive(Default)]
pub struct EventBus {
    pre_login: RwLock<Vec<Handler<PreLoginEvent>>>,
    configuration: RwLock<Vec<Handler<ConfigurationEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pre_login(&self, handler: impl Fn(&mut PreLoginEvent) + Send + Sync + 'static) {
        self.pre_login
            .write()
            .expect("event bus poisoned")
            .push(Arc::new(handler));
    }

    pub fn on_configuration(
        &self,
        handler: impl Fn(&mut ConfigurationEvent) + Send + Sync + 'static,
    ) {
        self.configuration
            .write()
            .expect("event bus poisoned")
            .push(Arc::new(handler));
    }

    pub(crate) fn dispatch_pre_login(&self, event: &mut PreLoginEvent) {
        let handlers: Vec<_> = self
            .pre_login
            .read()
            .expect("event bus poisoned")
            .iter()
            .cloned()
            .collect();
        for handler in handlers {
            handler(event);
        }
    }

    pub(crate) fn dispatch_configuration(&self, event: &mut ConfigurationEvent) {
        let handlers: Vec<_> = self
            .configuration
            .read()
            .expect("event bus poisoned")
            .iter()
            .cloned()
            .collect();
        for handler in handlers {
            handler(event);
        }
    }
}
