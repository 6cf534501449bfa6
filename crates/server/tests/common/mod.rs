//! In-memory doubles for the transport and instance seams.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use azalea_auth::game_profile::GameProfile;
use azalea_chat::FormattedText;
use azalea_protocol::packets::config::s_select_known_packs::KnownPack;
use azalea_protocol::packets::config::ClientboundConfigPacket;
use azalea_protocol::packets::game::ClientboundGamePacket;
use azalea_protocol::packets::login::ClientboundLoginPacket;
use basalt_server::net::connection::{Connection, ServerPacket};
use basalt_server::net::manager::core_pack;
use basalt_server::net::plugin::LoginPluginProcessor;
use basalt_server::player::{Instance, Player};
use basalt_server::registries::Registries;
use basalt_server::{ConnectionManager, EventBus, ServerConfig};
use tokio::sync::oneshot;
use uuid::Uuid;

/// How the fake transport answers a known-packs request.
pub enum KnownPacksReply {
    /// Respond immediately with this pack list.
    Immediate(Vec<KnownPack>),
    /// Never respond; the sender is parked so the receiver stays open.
    Silent,
    /// Drop the reply sender without answering, closing the channel.
    Dropped,
}

pub struct TestConnection {
    id: u64,
    online: AtomicBool,
    disconnected: AtomicBool,
    compression_started: AtomicBool,
    sent: Mutex<Vec<ServerPacket>>,
    kicks: Mutex<Vec<String>>,
    known_packs_requests: Mutex<Vec<Vec<KnownPack>>>,
    known_packs_reply: Mutex<KnownPacksReply>,
    parked_known_packs: Mutex<Vec<oneshot::Sender<Vec<KnownPack>>>>,
    plugin_messages: Arc<LoginPluginProcessor>,
    interpreted_queues: AtomicU64,
}

impl TestConnection {
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            online: AtomicBool::new(true),
            disconnected: AtomicBool::new(false),
            compression_started: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            kicks: Mutex::new(Vec::new()),
            known_packs_requests: Mutex::new(Vec::new()),
            known_packs_reply: Mutex::new(KnownPacksReply::Immediate(vec![core_pack()])),
            parked_known_packs: Mutex::new(Vec::new()),
            plugin_messages: Arc::new(LoginPluginProcessor::new()),
            interpreted_queues: AtomicU64::new(0),
        })
    }

    pub fn set_known_packs_reply(&self, reply: KnownPacksReply) {
        *self.known_packs_reply.lock().unwrap() = reply;
    }

    pub fn sent_packets(&self) -> Vec<ServerPacket> {
        self.sent.lock().unwrap().clone()
    }

    pub fn kicks(&self) -> Vec<String> {
        self.kicks.lock().unwrap().clone()
    }

    pub fn was_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub fn compression_started(&self) -> bool {
        self.compression_started.load(Ordering::SeqCst)
    }

    pub fn known_packs_requests(&self) -> Vec<Vec<KnownPack>> {
        self.known_packs_requests.lock().unwrap().clone()
    }

    pub fn interpreted_queues(&self) -> u64 {
        self.interpreted_queues.load(Ordering::SeqCst)
    }

    pub fn config_packets(&self) -> Vec<ClientboundConfigPacket> {
        self.sent_packets()
            .into_iter()
            .filter_map(|packet| match packet {
                ServerPacket::Config(config) => Some(config),
                _ => None,
            })
            .collect()
    }

    pub fn login_packets(&self) -> Vec<ClientboundLoginPacket> {
        self.sent_packets()
            .into_iter()
            .filter_map(|packet| match packet {
                ServerPacket::Login(login) => Some(login),
                _ => None,
            })
            .collect()
    }

    pub fn game_packets(&self) -> Vec<ClientboundGamePacket> {
        self.sent_packets()
            .into_iter()
            .filter_map(|packet| match packet {
                ServerPacket::Game(game) => Some(game),
                _ => None,
            })
            .collect()
    }

    pub fn keep_alive_count(&self) -> usize {
        self.sent_packets()
            .iter()
            .filter(|packet| {
                matches!(
                    packet,
                    ServerPacket::Game(ClientboundGamePacket::KeepAlive(_))
                        | ServerPacket::Config(ClientboundConfigPacket::KeepAlive(_))
                )
            })
            .count()
    }
}

impl Connection for TestConnection {
    fn id(&self) -> u64 {
        self.id
    }

    fn send(&self, packet: ServerPacket) {
        self.sent.lock().unwrap().push(packet);
    }

    fn kick(&self, reason: FormattedText) {
        self.kicks.lock().unwrap().push(reason.to_string());
        self.online.store(false, Ordering::SeqCst);
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        self.online.store(false, Ordering::SeqCst);
        self.disconnected.store(true, Ordering::SeqCst);
    }

    fn start_compression(&self) {
        self.compression_started.store(true, Ordering::SeqCst);
    }

    fn request_known_packs(&self, packs: Vec<KnownPack>) -> oneshot::Receiver<Vec<KnownPack>> {
        self.known_packs_requests.lock().unwrap().push(packs);
        let (reply_tx, reply_rx) = oneshot::channel();
        match &*self.known_packs_reply.lock().unwrap() {
            KnownPacksReply::Immediate(packs) => {
                let _ = reply_tx.send(packs.clone());
            }
            KnownPacksReply::Silent => {
                self.parked_known_packs.lock().unwrap().push(reply_tx);
            }
            KnownPacksReply::Dropped => drop(reply_tx),
        }
        reply_rx
    }

    fn login_plugin_messages(&self) -> Arc<LoginPluginProcessor> {
        Arc::clone(&self.plugin_messages)
    }

    fn interpret_packet_queue(&self) {
        self.interpreted_queues.fetch_add(1, Ordering::SeqCst);
    }
}

/// An instance double whose spawn future resolves immediately.
#[derive(Default)]
pub struct TestInstance {
    spawned: Mutex<Vec<String>>,
}

impl TestInstance {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spawned(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }
}

impl Instance for TestInstance {
    fn spawn_player(&self, player: &Arc<Player>) -> oneshot::Receiver<()> {
        self.spawned.lock().unwrap().push(player.username());
        let (done_tx, done_rx) = oneshot::channel();
        let _ = done_tx.send(());
        done_rx
    }
}

pub fn profile(name: &str) -> GameProfile {
    GameProfile {
        uuid: Uuid::new_v3(&Uuid::NAMESPACE_URL, name.as_bytes()),
        name: name.into(),
        properties: Default::default(),
    }
}

pub fn manager_with(config: ServerConfig, events: Arc<EventBus>) -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::new(
        config,
        events,
        Arc::new(Registries::vanilla()),
    ))
}

/// Run one tick off the async context, the way the simulation thread does.
pub async fn run_tick(manager: &Arc<ConnectionManager>, tick_start: u64) {
    let manager = Arc::clone(manager);
    tokio::task::spawn_blocking(move || manager.tick(tick_start))
        .await
        .expect("tick panicked");
}
