use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod growth;
pub mod math;
pub mod overlap;
pub mod replication;

pub use config::{ArenaBounds, GameConfig, SpawnResumePolicy};
pub use error::CoreError;
pub use growth::{FollowTarget, GrowthChain, Segment};
pub use math::{move_towards, Vec2};
pub use replication::{Change, Node, Replicated};

pub const PROTOCOL_VERSION: u32 = 1;

/// Receive buffer size on every node. No datagram may be larger.
pub const MAX_PACKET_SIZE: usize = 8192;

pub const ARENA_MIN_X: f32 = -7.0;
pub const ARENA_MAX_X: f32 = 7.0;
pub const ARENA_MIN_Y: f32 = -5.0;
pub const ARENA_MAX_Y: f32 = 5.0;

pub const MAX_POOL_CAPACITY: usize = 50;
pub const INITIAL_SPAWN_BATCH: usize = 30;
pub const SPAWN_INTERVAL_SECS: f32 = 2.0;
pub const COLLISION_COOLDOWN_SECS: f32 = 0.5;
pub const PLAYER_SPEED: f32 = 3.0;

pub const HEAD_RADIUS: f32 = 0.25;
pub const SEGMENT_RADIUS: f32 = 0.2;
pub const EAT_RADIUS: f32 = 0.35;
pub const SEGMENT_SPACING: f32 = 0.3;
/// Segments may close gaps this many times faster than a head moves, so a
/// trail never falls behind its owner.
pub const SEGMENT_CATCH_UP_FACTOR: f32 = 2.0;
pub const STARTING_LENGTH: u16 = 1;

/// Stable identifier of a participant's connection, shared by its player.
pub type PlayerId = u64;
/// Identifier of a pooled consumable entity.
pub type EntityId = u32;

/// Type tag of a pooled consumable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumableKind {
    Food,
}

/// Canonical head pose. Orientation is a unit vector in the arena plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub orientation: Vec2,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            orientation: Vec2::UP,
        }
    }
}

/// Identity plus length of one participant in a collision report.
///
/// Wire layout is `id: u64` then `length: u16`, 10 bytes with bincode's
/// fixed-width encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    pub id: PlayerId,
    pub length: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub position: Vec2,
    pub orientation: Vec2,
    pub transform_revision: u32,
    pub length: u16,
    pub length_revision: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodState {
    pub id: EntityId,
    pub kind: ConsumableKind,
    pub position: Vec2,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // participant -> server
    Connect {
        client_version: u32,
    },
    MovementIntent {
        sequence: u32,
        target: (f32, f32, f32),
    },
    CollisionReport {
        player_a: PlayerData,
        player_b: PlayerData,
    },
    TailCollisionReport {
        tail_owner_id: PlayerId,
        collider_head_id: PlayerId,
    },
    Disconnect,

    // server -> participants
    Connected {
        client_id: PlayerId,
    },
    Snapshot {
        players: Vec<PlayerState>,
        food: Vec<FoodState>,
    },
    ReplicatedTransform {
        id: PlayerId,
        revision: u32,
        position: Vec2,
        orientation: Vec2,
    },
    ReplicatedLength {
        id: PlayerId,
        revision: u32,
        length: u16,
    },
    PlayerDespawned {
        id: PlayerId,
    },
    FoodSpawned {
        id: EntityId,
        kind: ConsumableKind,
        position: Vec2,
    },
    FoodConsumed {
        id: EntityId,
    },
    AtePlayerNotice,
    GameOverNotice,
    Disconnected {
        reason: String,
    },
}

impl Packet {
    /// Encoded size of a join snapshot holding `players` players and `food`
    /// food entities. Field widths are fixed, so this is the upper bound for
    /// any snapshot of that population.
    pub fn largest_snapshot_size(players: usize, food: usize) -> bincode::Result<u64> {
        let player = PlayerState {
            id: 0,
            position: Vec2::ZERO,
            orientation: Vec2::UP,
            transform_revision: 0,
            length: STARTING_LENGTH,
            length_revision: 0,
        };
        let food_state = FoodState {
            id: 0,
            kind: ConsumableKind::Food,
            position: Vec2::ZERO,
        };
        bincode::serialized_size(&Packet::Snapshot {
            players: vec![player; players],
            food: vec![food_state; food],
        })
    }
}

/// A movement intent after it left the wire, ready to be applied at tick time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementIntent {
    pub sequence: u32,
    pub target: Vec2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_data_is_ten_bytes() {
        let data = PlayerData {
            id: 0x0102_0304_0506_0708,
            length: 0x0A0B,
        };
        let bytes = bincode::serialize(&data).unwrap();

        assert_eq!(bytes.len(), 10);
        assert_eq!(&bytes[..8], &0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(&bytes[8..], &0x0A0Bu16.to_le_bytes());
    }

    #[test]
    fn test_packet_serialization_movement_intent() {
        let packet = Packet::MovementIntent {
            sequence: 12,
            target: (1.5, -2.0, 0.0),
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::MovementIntent { sequence, target } => {
                assert_eq!(sequence, 12);
                assert_eq!(target, (1.5, -2.0, 0.0));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_collision_report() {
        let packet = Packet::CollisionReport {
            player_a: PlayerData { id: 1, length: 3 },
            player_b: PlayerData { id: 2, length: 5 },
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        assert_eq!(deserialized, packet);
    }

    #[test]
    fn test_packet_serialization_snapshot() {
        let packet = Packet::Snapshot {
            players: vec![PlayerState {
                id: 4,
                position: Vec2::new(1.0, 2.0),
                orientation: Vec2::UP,
                transform_revision: 3,
                length: 7,
                length_revision: 6,
            }],
            food: vec![FoodState {
                id: 11,
                kind: ConsumableKind::Food,
                position: Vec2::new(-3.0, 4.0),
            }],
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Snapshot { players, food } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].length, 7);
                assert_eq!(food[0].id, 11);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_largest_snapshot_size_matches_encoding() {
        let size = Packet::largest_snapshot_size(16, 100).unwrap();
        let packet = Packet::Snapshot {
            players: (0..16)
                .map(|id| PlayerState {
                    id,
                    position: Vec2::new(6.5, -4.5),
                    orientation: Vec2::new(1.0, 0.0),
                    transform_revision: u32::MAX,
                    length: u16::MAX,
                    length_revision: u32::MAX,
                })
                .collect(),
            food: (0..100)
                .map(|id| FoodState {
                    id,
                    kind: ConsumableKind::Food,
                    position: Vec2::new(-6.0, 4.0),
                })
                .collect(),
        };

        assert_eq!(size, bincode::serialize(&packet).unwrap().len() as u64);
        // tag + two length prefixes, 34 bytes per player, 16 per food
        assert_eq!(size, 2164);
        assert!(size <= MAX_PACKET_SIZE as u64);
    }

    #[test]
    fn test_notices_carry_no_payload() {
        let ate = bincode::serialize(&Packet::AtePlayerNotice).unwrap();
        let over = bincode::serialize(&Packet::GameOverNotice).unwrap();
        assert_eq!(ate.len(), 4);
        assert_eq!(over.len(), 4);
        assert_ne!(ate, over);
    }
}
