use crate::game::{ClientEvent, ClientWorld};
use crate::input::IntentGenerator;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{GameConfig, Packet, PlayerId, MAX_PACKET_SIZE, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep};

/// Why a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEnd {
    GameOver,
    Disconnected(String),
    TimeUp,
}

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    client_id: Option<PlayerId>,
    connected: bool,

    world: ClientWorld,
    intents: IntentGenerator,

    fake_ping_ms: u64,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        fake_ping_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;
        let config = GameConfig::default();

        Ok(Client {
            socket,
            server_addr,
            client_id: None,
            connected: false,
            intents: IntentGenerator::new(config.arena),
            world: ClientWorld::new(config),
            fake_ping_ms,
        })
    }

    pub fn world(&self) -> &ClientWorld {
        &self.world
    }

    pub fn client_id(&self) -> Option<PlayerId> {
        self.client_id
    }

    async fn connect(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server...");

        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
        };
        self.send_packet(&packet).await?;

        Ok(())
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        if self.fake_ping_ms > 0 {
            sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
        }

        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn handle_packet(&mut self, packet: Packet) -> Option<SessionEnd> {
        match self.world.apply_packet(packet)? {
            ClientEvent::Connected(client_id) => {
                info!("Connected! Client ID: {}", client_id);
                self.client_id = Some(client_id);
                self.connected = true;
                None
            }
            ClientEvent::OwnLengthChanged(length) => {
                debug!("Own length changed to {}", length);
                None
            }
            ClientEvent::PlayerRemoved(id) => {
                debug!("Player {} left the arena", id);
                None
            }
            ClientEvent::AtePlayer => None,
            ClientEvent::GameOver => {
                self.connected = false;
                Some(SessionEnd::GameOver)
            }
            ClientEvent::Disconnected(reason) => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.client_id = None;
                Some(SessionEnd::Disconnected(reason))
            }
        }
    }

    async fn send_intent(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.connected {
            return Ok(());
        }
        let Some(head) = self.world.local_player().map(|p| p.position()) else {
            return Ok(());
        };

        let intent = self.intents.next_intent(head);
        let packet = Packet::MovementIntent {
            sequence: intent.sequence,
            target: intent.target.to_xyz(),
        };
        self.send_packet(&packet).await
    }

    /// Plays until the server ends the session or `duration` elapses.
    pub async fn run(
        &mut self,
        duration: Option<Duration>,
    ) -> Result<SessionEnd, Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut input_interval = interval(Duration::from_millis(33));
        let mut physics_interval = interval(Duration::from_millis(16));
        let started = Instant::now();
        let mut last_update = Instant::now();

        let mut buffer = [0u8; MAX_PACKET_SIZE];

        let end = loop {
            if duration.is_some_and(|limit| started.elapsed() >= limit) {
                break SessionEnd::TimeUp;
            }

            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if self.fake_ping_ms > 0 {
                                sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
                            }

                            match deserialize::<Packet>(&buffer[0..len]) {
                                Ok(packet) => {
                                    if let Some(end) = self.handle_packet(packet) {
                                        break end;
                                    }
                                }
                                Err(e) => warn!("Failed to deserialize packet: {}", e),
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                _ = input_interval.tick() => {
                    if let Err(e) = self.send_intent().await {
                        error!("Error sending intent: {}", e);
                    }
                },

                _ = physics_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_update).as_secs_f32();
                    last_update = now;

                    self.world.update(dt);
                    if let Some(report) = self.world.detect_collisions() {
                        debug!("Reporting contact: {:?}", report);
                        if let Err(e) = self.send_packet(&report).await {
                            error!("Error sending collision report: {}", e);
                        }
                    }
                },
            }
        };

        if self.connected {
            if let Err(e) = self.send_packet(&Packet::Disconnect).await {
                debug!("Disconnect not sent: {}", e);
            }
            self.connected = false;
        }

        info!("Session ended: {:?}", end);
        Ok(end)
    }
}
