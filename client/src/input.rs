//! Movement intent generation with sequencing.
//!
//! There is no keyboard or mouse here: a headless participant wanders the arena
//! by picking a random point and heading for it until it gets close, then
//! picking another.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{ArenaBounds, MovementIntent, Vec2};

/// Distance at which the current target counts as reached
const ARRIVAL_RADIUS: f32 = 0.2;

pub struct IntentGenerator {
    next_sequence: u32,
    target: Option<Vec2>,
    arena: ArenaBounds,
    rng: StdRng,
}

impl IntentGenerator {
    pub fn new(arena: ArenaBounds) -> Self {
        Self::with_rng(arena, StdRng::from_entropy())
    }

    pub fn with_seed(arena: ArenaBounds, seed: u64) -> Self {
        Self::with_rng(arena, StdRng::seed_from_u64(seed))
    }

    fn with_rng(arena: ArenaBounds, rng: StdRng) -> Self {
        Self {
            next_sequence: 1,
            target: None,
            arena,
            rng,
        }
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    fn pick_target(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.gen_range(self.arena.min_x..=self.arena.max_x),
            self.rng.gen_range(self.arena.min_y..=self.arena.max_y),
        )
    }

    /// Produces the next intent for a head currently at `head`. Every intent
    /// gets a fresh sequence number, also when the target is unchanged.
    pub fn next_intent(&mut self, head: Vec2) -> MovementIntent {
        let target = match self.target {
            Some(target) if target.distance(&head) > ARRIVAL_RADIUS => target,
            _ => self.pick_target(),
        };
        self.target = Some(target);

        let intent = MovementIntent {
            sequence: self.next_sequence,
            target,
        };
        self.next_sequence = self.next_sequence.wrapping_add(1);
        intent
    }
}
