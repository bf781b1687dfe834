//! Narrow overlap checks between heads, segments and food.
//!
//! A participant uses these to notice contacts locally; what the contact means
//! is decided by the server.

use crate::growth::GrowthChain;
use crate::math::Vec2;
use crate::{PlayerId, HEAD_RADIUS, SEGMENT_RADIUS};

/// A contact noticed by the owner of `head`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    HeadToHead { other: PlayerId },
    HeadToTail { tail_owner: PlayerId },
}

pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    a.distance(&b) < radius_a + radius_b
}

pub fn heads_overlap(a: Vec2, b: Vec2) -> bool {
    circles_overlap(a, HEAD_RADIUS, b, HEAD_RADIUS)
}

/// Whether `head` strikes any segment of `chain`. A player's own segments are
/// never struck by its own head.
pub fn head_hits_chain(head_owner: PlayerId, head: Vec2, chain: &GrowthChain) -> bool {
    if !chain.collides_with_head_of(head_owner) {
        return false;
    }
    chain
        .segments()
        .iter()
        .any(|segment| circles_overlap(head, HEAD_RADIUS, segment.position, SEGMENT_RADIUS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heads_overlap() {
        assert!(heads_overlap(Vec2::ZERO, Vec2::new(0.3, 0.0)));
        assert!(!heads_overlap(Vec2::ZERO, Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn test_exact_touch_is_not_overlap() {
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0));
    }

    #[test]
    fn test_head_hits_other_chain() {
        let mut chain = GrowthChain::new(1, 0.3);
        chain.sync_to_length(Vec2::new(1.0, 1.0), 3);

        assert!(head_hits_chain(2, Vec2::new(1.1, 1.0), &chain));
        assert!(!head_hits_chain(2, Vec2::new(4.0, 4.0), &chain));
    }

    #[test]
    fn test_head_ignores_own_chain() {
        let mut chain = GrowthChain::new(1, 0.3);
        chain.sync_to_length(Vec2::ZERO, 3);

        assert!(!head_hits_chain(1, Vec2::ZERO, &chain));
    }
}
