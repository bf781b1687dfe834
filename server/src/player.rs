use log::debug;
use shared::{
    move_towards, Change, CoreError, GameConfig, GrowthChain, MovementIntent, Node, PlayerId,
    PlayerState, Replicated, Transform, Vec2, SEGMENT_CATCH_UP_FACTOR, STARTING_LENGTH,
};

use crate::collision::CollisionCooldown;

/// Where a player is in its life on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Joining,
    Active,
    Disconnecting,
    Destroyed,
}

impl Lifecycle {
    pub fn name(&self) -> &'static str {
        match self {
            Lifecycle::Joining => "Joining",
            Lifecycle::Active => "Active",
            Lifecycle::Disconnecting => "Disconnecting",
            Lifecycle::Destroyed => "Destroyed",
        }
    }
}

/// Canonical state of one connected participant.
#[derive(Debug)]
pub struct PlayerEntity {
    id: PlayerId,
    state: Lifecycle,
    transform: Replicated<Transform>,
    length: Replicated<u16>,
    chain: GrowthChain,
    speed: f32,
    target: Option<Vec2>,
    last_intent_sequence: u32,
    cooldown: CollisionCooldown,
}

impl PlayerEntity {
    pub fn new(id: PlayerId, config: &GameConfig) -> Self {
        Self {
            id,
            state: Lifecycle::Joining,
            transform: Replicated::new(Node::Server, "transform", Transform::default()),
            length: Replicated::new(Node::Server, "length", STARTING_LENGTH),
            chain: GrowthChain::new(id, config.segment_spacing),
            speed: config.player_speed,
            target: None,
            last_intent_sequence: 0,
            cooldown: CollisionCooldown::default(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == Lifecycle::Active
    }

    pub fn transform(&self) -> Transform {
        self.transform.get()
    }

    pub fn position(&self) -> Vec2 {
        self.transform.get().position
    }

    pub fn orientation(&self) -> Vec2 {
        self.transform.get().orientation
    }

    pub fn transform_revision(&self) -> u32 {
        self.transform.revision()
    }

    pub fn length(&self) -> u16 {
        self.length.get()
    }

    pub fn length_revision(&self) -> u32 {
        self.length.revision()
    }

    pub fn chain(&self) -> &GrowthChain {
        &self.chain
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    pub fn collision_armed(&self, now: f64) -> bool {
        self.cooldown.is_armed(now)
    }

    pub(crate) fn disarm_collisions(&mut self, now: f64, window: f32) {
        self.cooldown.disarm(now, window);
    }

    fn transition(&mut self, allowed: &[Lifecycle], to: Lifecycle) -> Result<(), CoreError> {
        if !allowed.contains(&self.state) {
            return Err(CoreError::InvalidTransition {
                id: self.id,
                from: self.state.name(),
                to: to.name(),
            });
        }
        debug!("Player {} {} -> {}", self.id, self.state.name(), to.name());
        self.state = to;
        Ok(())
    }

    /// Joining -> Active, once the participant has been told about the world.
    pub fn activate(&mut self) -> Result<(), CoreError> {
        self.transition(&[Lifecycle::Joining], Lifecycle::Active)
    }

    /// Joining/Active -> Disconnecting. Tears the whole chain down in the same
    /// step and returns how many segments were removed.
    pub fn begin_teardown(&mut self) -> Result<usize, CoreError> {
        self.transition(
            &[Lifecycle::Joining, Lifecycle::Active],
            Lifecycle::Disconnecting,
        )?;
        self.target = None;
        Ok(self.chain.teardown())
    }

    /// Disconnecting -> Destroyed.
    pub fn finish_teardown(&mut self) -> Result<(), CoreError> {
        self.transition(&[Lifecycle::Disconnecting], Lifecycle::Destroyed)
    }

    /// Directly overwrites the canonical transform. Only the server may do this.
    pub fn set_transform(
        &mut self,
        writer: Node,
        transform: Transform,
    ) -> Result<Option<Change<Transform>>, CoreError> {
        self.transform.set(writer, transform)
    }

    /// Records a movement intent. Intents older than the newest one seen are
    /// dropped; returns whether this one was kept.
    pub fn queue_intent(&mut self, intent: MovementIntent) -> bool {
        if intent.sequence <= self.last_intent_sequence && self.target.is_some() {
            return false;
        }
        self.last_intent_sequence = intent.sequence;
        self.target = Some(intent.target);
        true
    }

    /// Advances the head toward its target by `speed * dt` without overshoot and
    /// faces it toward the target. The out-of-plane axis stays zero.
    pub fn integrate(&mut self, dt: f32) -> Result<Option<Change<Transform>>, CoreError> {
        let Some(target) = self.target else {
            return Ok(None);
        };
        let current = self.transform.get();
        let position = move_towards(current.position, target, self.speed * dt);
        let orientation = if target != position {
            target.sub(&position).normalize()
        } else {
            current.orientation
        };
        self.transform.set(
            Node::Server,
            Transform {
                position,
                orientation,
            },
        )
    }

    /// Moves trailing segments after the head.
    pub fn follow_chain(&mut self, dt: f32) {
        let head = self.position();
        self.chain.follow(head, self.speed * dt * SEGMENT_CATCH_UP_FACTOR);
    }

    /// Adds one unit of length on behalf of `writer` and runs the chain reaction
    /// every node runs for an observed length change.
    pub fn grow(&mut self, writer: Node) -> Result<Option<Change<u16>>, CoreError> {
        let next = self.length.get().saturating_add(1);
        let change = self.length.set(writer, next)?;
        if let Some(change) = change {
            self.chain.sync_to_length(self.position(), change.current);
        }
        Ok(change)
    }

    pub fn snapshot(&self) -> PlayerState {
        let transform = self.transform.get();
        PlayerState {
            id: self.id,
            position: transform.position,
            orientation: transform.orientation,
            transform_revision: self.transform.revision(),
            length: self.length.get(),
            length_revision: self.length.revision(),
        }
    }
}
