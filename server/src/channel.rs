//! Delivery of server messages to participants.
//!
//! [`NetworkChannel`] is the seam between the authority and the transport. It
//! offers targeted sends and broadcasts; the replicated-scalar half of the
//! contract lives in [`shared::Replicated`], whose changes the authority pushes
//! through this channel.

use crate::network::GameMessage;
use log::{debug, error};
use shared::{CoreError, Packet, PlayerId};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use tokio::sync::mpsc;

pub trait NetworkChannel {
    /// Delivers `packet` to each listed recipient. Recipients that are still
    /// reachable get the packet even when another one is gone; the first
    /// unreachable recipient is reported as `DisconnectedRecipient`.
    fn send_to(&mut self, recipients: &[PlayerId], packet: &Packet) -> Result<(), CoreError>;

    /// Delivers `packet` to every connected participant.
    fn broadcast(&mut self, packet: &Packet);

    /// Ends the session of `id`. Later sends to it fail.
    fn terminate(&mut self, id: PlayerId);
}

/// Routes packets to participants over the server's UDP socket.
///
/// Packets are queued to the sender task; the channel itself never blocks.
pub struct UdpChannel {
    routes: HashMap<PlayerId, SocketAddr>,
    outbound: mpsc::UnboundedSender<GameMessage>,
    terminated: Vec<PlayerId>,
}

impl UdpChannel {
    pub fn new(outbound: mpsc::UnboundedSender<GameMessage>) -> Self {
        Self {
            routes: HashMap::new(),
            outbound,
            terminated: Vec::new(),
        }
    }

    pub fn add_route(&mut self, id: PlayerId, addr: SocketAddr) {
        self.routes.insert(id, addr);
    }

    pub fn remove_route(&mut self, id: PlayerId) -> Option<SocketAddr> {
        self.routes.remove(&id)
    }

    pub fn route(&self, id: PlayerId) -> Option<SocketAddr> {
        self.routes.get(&id).copied()
    }

    /// Sessions terminated since the last call.
    pub fn take_terminated(&mut self) -> Vec<PlayerId> {
        std::mem::take(&mut self.terminated)
    }

    /// Sends to an address that has no player behind it, e.g. a refused connect.
    pub fn send_to_addr(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.outbound.send(GameMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }
}

impl NetworkChannel for UdpChannel {
    fn send_to(&mut self, recipients: &[PlayerId], packet: &Packet) -> Result<(), CoreError> {
        let mut missing = None;
        for id in recipients {
            match self.routes.get(id) {
                Some(addr) => self.send_to_addr(packet, *addr),
                None => {
                    missing.get_or_insert(*id);
                }
            }
        }
        match missing {
            Some(id) => Err(CoreError::DisconnectedRecipient { id }),
            None => Ok(()),
        }
    }

    fn broadcast(&mut self, packet: &Packet) {
        for addr in self.routes.values() {
            self.send_to_addr(packet, *addr);
        }
    }

    fn terminate(&mut self, id: PlayerId) {
        if let Some(addr) = self.routes.remove(&id) {
            debug!("Route for player {} at {} closed", id, addr);
        }
        self.terminated.push(id);
    }
}

/// In-memory channel that keeps every delivered packet per recipient.
#[derive(Debug, Default)]
pub struct RecordingChannel {
    connected: HashSet<PlayerId>,
    inboxes: HashMap<PlayerId, Vec<Packet>>,
    broadcasts: Vec<Packet>,
    terminated: Vec<PlayerId>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, id: PlayerId) {
        self.connected.insert(id);
    }

    pub fn is_connected(&self, id: PlayerId) -> bool {
        self.connected.contains(&id)
    }

    /// Takes everything delivered to `id` so far, broadcasts included.
    pub fn drain_for(&mut self, id: PlayerId) -> Vec<Packet> {
        self.inboxes.remove(&id).unwrap_or_default()
    }

    pub fn broadcasts(&self) -> &[Packet] {
        &self.broadcasts
    }

    pub fn terminated(&self) -> &[PlayerId] {
        &self.terminated
    }
}

impl NetworkChannel for RecordingChannel {
    fn send_to(&mut self, recipients: &[PlayerId], packet: &Packet) -> Result<(), CoreError> {
        let mut missing = None;
        for id in recipients {
            if self.connected.contains(id) {
                self.inboxes.entry(*id).or_default().push(packet.clone());
            } else {
                missing.get_or_insert(*id);
            }
        }
        match missing {
            Some(id) => Err(CoreError::DisconnectedRecipient { id }),
            None => Ok(()),
        }
    }

    fn broadcast(&mut self, packet: &Packet) {
        for id in &self.connected {
            self.inboxes.entry(*id).or_default().push(packet.clone());
        }
        self.broadcasts.push(packet.clone());
    }

    fn terminate(&mut self, id: PlayerId) {
        self.connected.remove(&id);
        self.terminated.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[test]
    fn test_recording_targeted_send() {
        let mut channel = RecordingChannel::new();
        channel.connect(1);
        channel.connect(2);

        channel.send_to(&[1], &Packet::AtePlayerNotice).unwrap();

        assert_eq!(channel.drain_for(1), vec![Packet::AtePlayerNotice]);
        assert!(channel.drain_for(2).is_empty());
    }

    #[test]
    fn test_recording_send_to_departed_recipient() {
        let mut channel = RecordingChannel::new();
        channel.connect(1);
        channel.connect(2);
        channel.terminate(2);

        let result = channel.send_to(&[2, 1], &Packet::GameOverNotice);

        assert_eq!(result, Err(CoreError::DisconnectedRecipient { id: 2 }));
        assert_eq!(channel.drain_for(1), vec![Packet::GameOverNotice]);
        assert_eq!(channel.terminated(), &[2]);
    }

    #[test]
    fn test_recording_broadcast_reaches_everyone_connected() {
        let mut channel = RecordingChannel::new();
        channel.connect(1);
        channel.connect(2);

        channel.broadcast(&Packet::PlayerDespawned { id: 9 });

        assert_eq!(channel.drain_for(1).len(), 1);
        assert_eq!(channel.drain_for(2).len(), 1);
        assert_eq!(channel.broadcasts().len(), 1);
    }

    #[test]
    fn test_udp_channel_queues_per_route() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut channel = UdpChannel::new(tx);
        channel.add_route(1, test_addr(9001));
        channel.add_route(2, test_addr(9002));

        channel.send_to(&[2], &Packet::AtePlayerNotice).unwrap();

        match rx.try_recv() {
            Ok(GameMessage::SendPacket { packet, addr }) => {
                assert_eq!(packet, Packet::AtePlayerNotice);
                assert_eq!(addr, test_addr(9002));
            }
            other => panic!("Unexpected message: {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_udp_channel_broadcast_and_terminate() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut channel = UdpChannel::new(tx);
        channel.add_route(1, test_addr(9001));
        channel.add_route(2, test_addr(9002));

        channel.terminate(1);
        channel.broadcast(&Packet::PlayerDespawned { id: 1 });

        let mut sent = Vec::new();
        while let Ok(GameMessage::SendPacket { addr, .. }) = rx.try_recv() {
            sent.push(addr);
        }
        assert_eq!(sent, vec![test_addr(9002)]);
        assert_eq!(channel.take_terminated(), vec![1]);
        assert!(channel.take_terminated().is_empty());
        assert_eq!(
            channel.send_to(&[1], &Packet::GameOverNotice),
            Err(CoreError::DisconnectedRecipient { id: 1 })
        );
    }
}
