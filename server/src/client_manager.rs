//! Connection registry and movement-intent queuing for the arena server
//!
//! This module tracks which network addresses are participants and buffers
//! their movement intents until the next tick:
//! - Connection lifecycle (connect, disconnect, timeout)
//! - Per-client intent buffering in sequence order
//! - Capacity enforcement
//!
//! Game state is not stored here; the authority owns players. A client id
//! handed out here is the id of the player the authority creates for it.

use log::info;
use shared::{MovementIntent, PlayerId};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Silence after which a client is considered gone
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected participant and its buffered intents
#[derive(Debug)]
pub struct Client {
    /// Identifier assigned by the server, shared with the player entity
    pub id: PlayerId,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Last time we received any packet from this client
    pub last_seen: Instant,
    /// Highest intent sequence already handed to the authority
    pub last_processed_intent: u32,
    /// Intents received since the last tick
    pub pending_intents: Vec<MovementIntent>,
}

impl Client {
    pub fn new(id: PlayerId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
            last_processed_intent: 0,
            pending_intents: Vec::new(),
        }
    }

    /// Buffers an intent, keeping the queue sorted by sequence so packets that
    /// arrive out of order are still handed over in order.
    pub fn add_intent(&mut self, intent: MovementIntent) {
        self.last_seen = Instant::now();
        self.pending_intents.push(intent);
        self.pending_intents.sort_by_key(|i| i.sequence);
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// All connected clients, bounded by `max_clients`
pub struct ClientManager {
    clients: HashMap<PlayerId, Client>,
    next_client_id: PlayerId,
    max_clients: usize,
}

impl ClientManager {
    /// Client ids start from 1 and are never reused within a session.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Registers a new connection. Returns `None` when the server is full.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<PlayerId> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, Client::new(client_id, addr));

        Some(client_id)
    }

    /// Returns true if the client was found and removed.
    pub fn remove_client(&mut self, client_id: &PlayerId) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<PlayerId> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Marks the client as alive without queuing anything.
    pub fn touch(&mut self, client_id: PlayerId) {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.last_seen = Instant::now();
        }
    }

    /// Returns false if the client id is unknown.
    pub fn add_intent(&mut self, client_id: PlayerId, intent: MovementIntent) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.add_intent(intent);
            true
        } else {
            false
        }
    }

    /// Takes every buffered intent newer than the last one handed over,
    /// ordered by client id and then by sequence.
    pub fn drain_intents(&mut self) -> Vec<(PlayerId, MovementIntent)> {
        let mut ids: Vec<PlayerId> = self.clients.keys().copied().collect();
        ids.sort_unstable();

        let mut drained = Vec::new();
        for id in ids {
            let Some(client) = self.clients.get_mut(&id) else {
                continue;
            };
            for intent in client.pending_intents.drain(..) {
                if intent.sequence > client.last_processed_intent {
                    client.last_processed_intent = intent.sequence;
                    drained.push((id, intent));
                }
            }
        }
        drained
    }

    /// Removes clients silent for longer than [`CLIENT_TIMEOUT`] and returns
    /// their ids so the authority can destroy their players.
    pub fn check_timeouts(&mut self) -> Vec<PlayerId> {
        let timed_out: Vec<PlayerId> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(CLIENT_TIMEOUT))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Vec2;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn intent(sequence: u32) -> MovementIntent {
        MovementIntent {
            sequence,
            target: Vec2::new(sequence as f32, 0.0),
        }
    }

    #[test]
    fn test_client_creation() {
        let addr = test_addr();
        let client = Client::new(1, addr);

        assert_eq!(client.id, 1);
        assert_eq!(client.addr, addr);
        assert_eq!(client.last_processed_intent, 0);
        assert!(client.pending_intents.is_empty());
    }

    #[test]
    fn test_client_orders_intents() {
        let mut client = Client::new(1, test_addr());
        client.add_intent(intent(2));
        client.add_intent(intent(1));

        assert_eq!(client.pending_intents[0].sequence, 1);
        assert_eq!(client.pending_intents[1].sequence, 2);
    }

    #[test]
    fn test_client_timeout() {
        let mut client = Client::new(1, test_addr());
        assert!(!client.is_timed_out(Duration::from_secs(1)));

        client.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(client.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_add_clients_until_full() {
        let mut manager = ClientManager::new(1);

        assert_eq!(manager.add_client(test_addr()), Some(1));
        assert_eq!(manager.add_client(test_addr2()), None);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_ids_not_reused() {
        let mut manager = ClientManager::new(2);
        let first = manager.add_client(test_addr()).unwrap();
        manager.remove_client(&first);

        assert_eq!(manager.add_client(test_addr()), Some(2));
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new(2);
        let client_id = manager.add_client(test_addr()).unwrap();

        assert!(manager.remove_client(&client_id));
        assert!(!manager.remove_client(&client_id));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_find_client_by_addr() {
        let mut manager = ClientManager::new(2);
        let client_id1 = manager.add_client(test_addr()).unwrap();
        manager.add_client(test_addr2()).unwrap();

        assert_eq!(manager.find_client_by_addr(test_addr()), Some(client_id1));
        let unknown: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(manager.find_client_by_addr(unknown), None);
    }

    #[test]
    fn test_add_intent_to_unknown_client() {
        let mut manager = ClientManager::new(2);
        assert!(!manager.add_intent(999, intent(1)));
    }

    #[test]
    fn test_drain_intents_skips_stale() {
        let mut manager = ClientManager::new(2);
        let id1 = manager.add_client(test_addr()).unwrap();
        let id2 = manager.add_client(test_addr2()).unwrap();

        manager.add_intent(id1, intent(3));
        manager.add_intent(id2, intent(1));
        manager.add_intent(id1, intent(2));

        let drained = manager.drain_intents();
        let order: Vec<(PlayerId, u32)> = drained.iter().map(|(id, i)| (*id, i.sequence)).collect();
        assert_eq!(order, vec![(id1, 2), (id1, 3), (id2, 1)]);

        manager.add_intent(id1, intent(1));
        assert!(manager.drain_intents().is_empty());
    }

    #[test]
    fn test_check_timeouts_removes_silent_clients() {
        let mut manager = ClientManager::new(2);
        let id1 = manager.add_client(test_addr()).unwrap();
        let id2 = manager.add_client(test_addr2()).unwrap();

        if let Some(client) = manager.clients.get_mut(&id1) {
            client.last_seen = Instant::now() - Duration::from_secs(10);
        }

        assert_eq!(manager.check_timeouts(), vec![id1]);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.find_client_by_addr(test_addr2()), Some(id2));
    }
}
