//! Trailing segments that follow a player's head.
//!
//! Every node keeps its own chain per player and drives it only from the
//! replicated length, so the chain always holds `length - 1` segments.

use crate::math::{move_towards, Vec2};
use crate::PlayerId;

/// What a segment chases. Segments only ever point at the head or at an
/// earlier segment, so following targets always terminates at the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowTarget {
    Head,
    Segment(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub position: Vec2,
    pub follow: FollowTarget,
    /// Cosmetic draw order, more negative is further back.
    pub render_depth: i32,
    /// The owner's head collider never reports overlaps with this segment.
    pub ignores_owner_collider: bool,
}

#[derive(Debug, Clone)]
pub struct GrowthChain {
    owner: PlayerId,
    segments: Vec<Segment>,
    spacing: f32,
}

impl GrowthChain {
    pub fn new(owner: PlayerId, spacing: f32) -> Self {
        Self {
            owner,
            segments: Vec::new(),
            spacing,
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Appends one segment at the head's current position, following the
    /// previous last segment (or the head when the chain is empty).
    pub fn on_length_increased(&mut self, head: Vec2, length: u16) {
        let follow = match self.segments.len() {
            0 => FollowTarget::Head,
            n => FollowTarget::Segment(n - 1),
        };
        self.segments.push(Segment {
            position: head,
            follow,
            render_depth: -i32::from(length),
            ignores_owner_collider: true,
        });
    }

    /// Reacts to an observed length by appending one segment per missing unit.
    /// Returns how many segments were added.
    ///
    /// Length only grows while a player is alive, so the chain never shrinks here.
    pub fn sync_to_length(&mut self, head: Vec2, length: u16) -> usize {
        let wanted = usize::from(length.saturating_sub(1));
        let mut added = 0;
        while self.segments.len() < wanted {
            let step_length = (self.segments.len() + 2) as u16;
            self.on_length_increased(head, step_length);
            added += 1;
        }
        added
    }

    /// Where the segment at `index` is heading this tick.
    pub fn target_position(&self, index: usize, head: Vec2) -> Vec2 {
        match self.segments[index].follow {
            FollowTarget::Head => head,
            FollowTarget::Segment(previous) => self.segments[previous].position,
        }
    }

    /// Moves every segment toward its follow target, keeping `spacing` between
    /// neighbours. A `max_step` of `f32::INFINITY` snaps segments into place.
    pub fn follow(&mut self, head: Vec2, max_step: f32) {
        for index in 0..self.segments.len() {
            let target = self.target_position(index, head);
            let segment = &mut self.segments[index];
            let gap = segment.position.distance(&target);
            if gap > self.spacing {
                let step = (gap - self.spacing).min(max_step);
                segment.position = move_towards(segment.position, target, step);
            }
        }
    }

    /// Number of follow hops from the segment at `index` to the head, or `None`
    /// if the references are broken or cyclic.
    pub fn steps_to_head(&self, index: usize) -> Option<usize> {
        let mut current = index;
        let mut steps = 0;
        loop {
            let segment = self.segments.get(current)?;
            steps += 1;
            if steps > self.segments.len() {
                return None;
            }
            match segment.follow {
                FollowTarget::Head => return Some(steps),
                FollowTarget::Segment(previous) => current = previous,
            }
        }
    }

    /// Whether a head belonging to `head_owner` can collide with this chain.
    pub fn collides_with_head_of(&self, head_owner: PlayerId) -> bool {
        head_owner != self.owner
    }

    /// Removes every segment. Returns how many were removed.
    pub fn teardown(&mut self) -> usize {
        let removed = self.segments.len();
        self.segments.clear();
        removed
    }
}
