//! Server network layer handling UDP communications and game loop coordination

use crate::authority::AuthorityServer;
use crate::channel::{NetworkChannel, UdpChannel};
use crate::client_manager::ClientManager;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{
    CoreError, GameConfig, MovementIntent, Node, Packet, PlayerId, Vec2, MAX_PACKET_SIZE,
    PROTOCOL_VERSION,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: PlayerId },
}

/// Messages sent from the game loop to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
}

/// Main server coordinating networking and the authoritative simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    authority: AuthorityServer<UdpChannel>,
    tick_duration: Duration,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_rx: Option<mpsc::UnboundedReceiver<GameMessage>>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
        config: GameConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        // A join snapshot must reach the client in one datagram
        let largest = Packet::largest_snapshot_size(max_clients, config.max_pool_capacity)?;
        if largest > MAX_PACKET_SIZE as u64 {
            return Err(CoreError::PacketTooLarge {
                size: largest,
                limit: MAX_PACKET_SIZE,
            }
            .into());
        }

        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            authority: AuthorityServer::new(config, UdpChannel::new(game_tx)),
            tick_duration,
            server_tx,
            server_rx,
            game_rx: Some(game_rx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_PACKET_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that drains the outgoing packet queue onto the socket
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let Some(mut game_rx) = self.game_rx.take() else {
            return;
        };

        tokio::spawn(async move {
            while let Some(GameMessage::SendPacket { packet, addr }) = game_rx.recv().await {
                if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                    error!("Failed to send packet to {}: {}", addr, e);
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    /// Destroys the player of a client that is already gone from the registry.
    fn drop_player(&mut self, client_id: PlayerId) {
        if let Err(e) = self.authority.leave(client_id) {
            debug!("Player {} already removed: {}", client_id, e);
        }
        self.authority.channel_mut().remove_route(client_id);
    }

    /// Removes registry entries for sessions the authority has terminated.
    async fn release_terminated(&mut self) {
        let terminated = self.authority.channel_mut().take_terminated();
        if terminated.is_empty() {
            return;
        }
        let mut clients = self.clients.write().await;
        for client_id in terminated {
            clients.remove_client(&client_id);
        }
    }

    async fn sender_id(&self, addr: SocketAddr) -> Option<PlayerId> {
        let mut clients = self.clients.write().await;
        let client_id = clients.find_client_by_addr(addr)?;
        clients.touch(client_id);
        Some(client_id)
    }

    /// Processes one incoming packet
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if client_version != PROTOCOL_VERSION {
                    self.authority.channel().send_to_addr(
                        &Packet::Disconnected {
                            reason: "Protocol version mismatch".to_string(),
                        },
                        addr,
                    );
                    return;
                }

                // Replace an existing session from the same address
                let existing_client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };
                if let Some(existing_id) = existing_client_id {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    self.clients.write().await.remove_client(&existing_id);
                    self.drop_player(existing_id);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                match client_id {
                    Some(client_id) => {
                        self.authority.channel_mut().add_route(client_id, addr);
                        if let Err(e) = self
                            .authority
                            .channel_mut()
                            .send_to(&[client_id], &Packet::Connected { client_id })
                        {
                            error!("Failed to acknowledge client {}: {}", client_id, e);
                        }
                        if let Err(e) = self.authority.join(client_id) {
                            error!("Player {} could not join: {}", client_id, e);
                        }
                    }
                    None => {
                        self.authority.channel().send_to_addr(
                            &Packet::Disconnected {
                                reason: "Server full".to_string(),
                            },
                            addr,
                        );
                    }
                }
            }

            Packet::MovementIntent { sequence, target } => {
                if let Some(client_id) = self.sender_id(addr).await {
                    let intent = MovementIntent {
                        sequence,
                        target: Vec2::from_xyz(target),
                    };
                    self.clients.write().await.add_intent(client_id, intent);
                }
            }

            Packet::CollisionReport { player_a, player_b } => {
                if let Some(client_id) = self.sender_id(addr).await {
                    self.authority.handle_collision_report(
                        Node::Participant(client_id),
                        player_a,
                        player_b,
                    );
                }
            }

            Packet::TailCollisionReport {
                tail_owner_id,
                collider_head_id,
            } => {
                if let Some(client_id) = self.sender_id(addr).await {
                    self.authority.handle_tail_collision_report(
                        Node::Participant(client_id),
                        tail_owner_id,
                        collider_head_id,
                    );
                }
            }

            Packet::Disconnect => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(client_id) = client_id {
                    self.clients.write().await.remove_client(&client_id);
                    self.drop_player(client_id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }

        self.release_terminated().await;
    }

    /// Hands buffered intents to the authority and advances the simulation
    async fn run_tick(&mut self, dt: f32) {
        let intents = self.clients.write().await.drain_intents();
        for (client_id, intent) in intents {
            if let Err(e) =
                self.authority
                    .submit_movement_intent(Node::Participant(client_id), client_id, intent)
            {
                debug!("Intent from client {} dropped: {}", client_id, e);
            }
        }

        self.authority.tick(dt);
        self.release_terminated().await;
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let food = self.authority.start_session();
        info!("Session started with {} food", food);

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut spawn_interval = interval(self.authority.spawn_interval());
        spawn_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; cycles start one interval in.
        spawn_interval.tick().await;
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            let was_spawning = self.authority.spawner_running();
                            self.handle_packet(packet, addr).await;
                            if !was_spawning && self.authority.spawner_running() {
                                // cycles missed while stopped are dropped, not replayed
                                spawn_interval.reset();
                            }
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            self.drop_player(client_id);
                            self.release_terminated().await;
                        },
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.run_tick(dt).await;

                    if self.authority.tick_count() % 300 == 0 && self.authority.connected_count() > 0 {
                        debug!(
                            "Tick {}: {} players, {} food",
                            self.authority.tick_count(),
                            self.authority.connected_count(),
                            self.authority.pool().active().count()
                        );
                    }
                },

                _ = spawn_interval.tick(), if self.authority.spawner_running() => {
                    self.authority.run_spawn_cycle();
                },
            }
        }

        Ok(())
    }
}
