//! Collision outcome decisions.
//!
//! The resolver is a pure function of the event it is given. The authority
//! fills events with canonical lengths and applies the side effects.

use shared::{PlayerData, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionEvent {
    /// Leading elements of two players touched.
    HeadToHead { a: PlayerData, b: PlayerData },
    /// `collider_head` struck a segment owned by `tail_owner`.
    HeadToTail {
        tail_owner: PlayerId,
        collider_head: PlayerId,
    },
}

impl CollisionEvent {
    /// The two participants, in report order.
    pub fn participants(&self) -> (PlayerId, PlayerId) {
        match *self {
            CollisionEvent::HeadToHead { a, b } => (a.id, b.id),
            CollisionEvent::HeadToTail {
                tail_owner,
                collider_head,
            } => (tail_owner, collider_head),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionOutcome {
    pub winner: PlayerId,
    pub loser: PlayerId,
}

pub struct CollisionResolver;

impl CollisionResolver {
    /// Decides the winner of a collision.
    ///
    /// Head-to-head: the strictly longer player wins; on equal lengths `b`
    /// wins. Head-to-tail: the tail owner always wins.
    pub fn resolve(event: &CollisionEvent) -> CollisionOutcome {
        match *event {
            CollisionEvent::HeadToHead { a, b } => {
                if a.length > b.length {
                    CollisionOutcome {
                        winner: a.id,
                        loser: b.id,
                    }
                } else {
                    CollisionOutcome {
                        winner: b.id,
                        loser: a.id,
                    }
                }
            }
            CollisionEvent::HeadToTail {
                tail_owner,
                collider_head,
            } => CollisionOutcome {
                winner: tail_owner,
                loser: collider_head,
            },
        }
    }
}

/// Per-player window during which further collisions are ignored, absorbing
/// the repeated overlap events two shapes produce while they stay in contact.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionCooldown {
    rearm_at: Option<f64>,
}

impl CollisionCooldown {
    pub fn is_armed(&self, now: f64) -> bool {
        self.rearm_at.map_or(true, |at| now >= at)
    }

    pub fn disarm(&mut self, now: f64, window: f32) {
        self.rearm_at = Some(now + f64::from(window));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head_to_head(len_a: u16, len_b: u16) -> CollisionEvent {
        CollisionEvent::HeadToHead {
            a: PlayerData {
                id: 1,
                length: len_a,
            },
            b: PlayerData {
                id: 2,
                length: len_b,
            },
        }
    }

    #[test]
    fn test_longer_player_wins() {
        for len_b in 1..40u16 {
            for len_a in (len_b + 1)..=(len_b + 5) {
                let outcome = CollisionResolver::resolve(&head_to_head(len_a, len_b));
                assert_eq!(outcome.winner, 1);
                assert_eq!(outcome.loser, 2);
            }
        }
    }

    #[test]
    fn test_shorter_first_participant_loses() {
        let outcome = CollisionResolver::resolve(&head_to_head(3, 5));
        assert_eq!(
            outcome,
            CollisionOutcome {
                winner: 2,
                loser: 1
            }
        );
    }

    #[test]
    fn test_equal_lengths_favor_second_participant() {
        for len in [1u16, 2, 7, u16::MAX] {
            let outcome = CollisionResolver::resolve(&head_to_head(len, len));
            assert_eq!(outcome.winner, 2);
            assert_eq!(outcome.loser, 1);
        }
    }

    #[test]
    fn test_tail_owner_always_wins() {
        let event = CollisionEvent::HeadToTail {
            tail_owner: 10,
            collider_head: 20,
        };
        let outcome = CollisionResolver::resolve(&event);
        assert_eq!(outcome.winner, 10);
        assert_eq!(outcome.loser, 20);
    }

    #[test]
    fn test_participants_order() {
        assert_eq!(head_to_head(1, 1).participants(), (1, 2));
        let tail = CollisionEvent::HeadToTail {
            tail_owner: 5,
            collider_head: 6,
        };
        assert_eq!(tail.participants(), (5, 6));
    }

    #[test]
    fn test_cooldown_window() {
        let mut cooldown = CollisionCooldown::default();
        assert!(cooldown.is_armed(0.0));

        cooldown.disarm(1.0, 0.5);
        assert!(!cooldown.is_armed(1.0));
        assert!(!cooldown.is_armed(1.49));
        assert!(cooldown.is_armed(1.5));
    }
}
