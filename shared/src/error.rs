use thiserror::Error;

use crate::replication::Node;
use crate::{ConsumableKind, EntityId, PlayerId};

/// Anomalies the simulation core detects. None of them is fatal: callers log
/// and keep the game running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A node other than the owner tried to write canonical state
    #[error("{writer:?} has no authority to mutate {target}")]
    AuthorityViolation { writer: Node, target: &'static str },

    /// Spawn attempted while the pool for this kind is full
    #[error("pool for {kind:?} is at capacity ({capacity})")]
    CapacityExceeded {
        kind: ConsumableKind,
        capacity: usize,
    },

    /// A collision report carried a length that no longer matches canonical state
    #[error("player {id} reported length {reported}, canonical length is {canonical}")]
    StaleCollisionData {
        id: PlayerId,
        reported: u16,
        canonical: u16,
    },

    /// A targeted notice was addressed to a participant that is gone
    #[error("recipient {id} is no longer connected")]
    DisconnectedRecipient { id: PlayerId },

    #[error("no live player with id {id}")]
    UnknownPlayer { id: PlayerId },

    #[error("no pooled entity with id {id}")]
    UnknownEntity { id: EntityId },

    /// A packet the configured session can produce would not fit the receive buffer
    #[error("largest packet is {size} bytes, receive buffer holds {limit}")]
    PacketTooLarge { size: u64, limit: usize },

    #[error("player {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: PlayerId,
        from: &'static str,
        to: &'static str,
    },
}
