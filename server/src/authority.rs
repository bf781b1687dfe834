//! The single writer of canonical game state.
//!
//! `AuthorityServer` owns every player's transform and length, the food pool
//! and the spawner. Everything that mutates them funnels through `&mut self`, so
//! one tick never races another. Each mutation is pushed to participants as a
//! revisioned diff through the [`NetworkChannel`].

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    ConsumableKind, CoreError, GameConfig, MovementIntent, Node, Packet, PlayerData, PlayerId,
    Transform, Vec2,
};
use std::collections::HashMap;
use std::time::Duration;

use crate::channel::NetworkChannel;
use crate::collision::{CollisionEvent, CollisionOutcome, CollisionResolver};
use crate::player::PlayerEntity;
use crate::pool::EntityPool;
use crate::spawner::{random_position, CycleOutcome, Spawner};

pub struct AuthorityServer<C: NetworkChannel> {
    config: GameConfig,
    channel: C,
    players: HashMap<PlayerId, PlayerEntity>,
    pool: EntityPool,
    spawner: Spawner,
    rng: StdRng,
    clock: f64,
    tick: u64,
}

impl<C: NetworkChannel> AuthorityServer<C> {
    pub fn new(config: GameConfig, channel: C) -> Self {
        Self::with_rng(config, channel, StdRng::from_entropy())
    }

    /// Same as `new` but with reproducible spawn positions.
    pub fn with_seed(config: GameConfig, channel: C, seed: u64) -> Self {
        Self::with_rng(config, channel, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, channel: C, rng: StdRng) -> Self {
        let mut pool = EntityPool::new();
        pool.register(ConsumableKind::Food, config.max_pool_capacity);
        let spawner = Spawner::new(ConsumableKind::Food, &config);
        Self {
            config,
            channel,
            players: HashMap::new(),
            pool,
            spawner,
            rng,
            clock: 0.0,
            tick: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerEntity> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerEntity> {
        self.players.values()
    }

    /// Seconds of simulated time since the session started.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn connected_count(&self) -> usize {
        self.players.len()
    }

    pub fn spawner_running(&self) -> bool {
        self.spawner.is_running()
    }

    pub fn spawn_interval(&self) -> Duration {
        Duration::from_secs_f32(self.config.spawn_interval_secs)
    }

    fn sorted_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self.players.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Pre-populates the arena and starts the periodic spawner.
    pub fn start_session(&mut self) -> usize {
        let spawned = self.spawner.start(&mut self.pool, &mut self.rng);
        for id in &spawned {
            if let Some(entity) = self.pool.get(*id) {
                self.channel.broadcast(&Packet::FoodSpawned {
                    id: entity.id,
                    kind: entity.kind,
                    position: entity.position,
                });
            }
        }
        spawned.len()
    }

    /// Full world state for a participant that is just joining.
    pub fn snapshot(&self) -> Packet {
        let players = self
            .sorted_ids()
            .into_iter()
            .filter_map(|id| self.players.get(&id))
            .map(PlayerEntity::snapshot)
            .collect();
        let food = self.pool.active().map(|entity| entity.state()).collect();
        Packet::Snapshot { players, food }
    }

    /// Creates the player for a freshly connected participant, tells it about
    /// the world and announces it to everyone else.
    pub fn join(&mut self, id: PlayerId) -> Result<(), CoreError> {
        if let Some(existing) = self.players.get(&id) {
            return Err(CoreError::InvalidTransition {
                id,
                from: existing.state().name(),
                to: "Joining",
            });
        }
        let previous = self.connected_count();

        let mut player = PlayerEntity::new(id, &self.config);
        player.set_transform(
            Node::Server,
            Transform {
                position: random_position(&self.config.arena, &mut self.rng),
                orientation: Vec2::UP,
            },
        )?;
        let state = player.snapshot();
        self.players.insert(id, player);

        let snapshot = self.snapshot();
        if let Err(e) = self.channel.send_to(&[id], &snapshot) {
            debug!("Snapshot not delivered: {}", e);
        }
        self.channel.broadcast(&Packet::ReplicatedTransform {
            id,
            revision: state.transform_revision,
            position: state.position,
            orientation: state.orientation,
        });
        self.channel.broadcast(&Packet::ReplicatedLength {
            id,
            revision: state.length_revision,
            length: state.length,
        });

        if let Some(player) = self.players.get_mut(&id) {
            player.activate()?;
        }
        if self
            .spawner
            .on_connectivity_changed(previous, self.connected_count())
        {
            info!("Food spawning resumed for player {}", id);
        }

        info!(
            "Player {} joined at ({:.2}, {:.2})",
            id, state.position.x, state.position.y
        );
        Ok(())
    }

    /// Destroys a player: its chain is torn down in the same step, everyone is
    /// told it is gone, and its session is terminated.
    pub fn leave(&mut self, id: PlayerId) -> Result<(), CoreError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(CoreError::UnknownPlayer { id })?;
        let removed = player.begin_teardown()?;
        player.finish_teardown()?;
        self.players.remove(&id);

        self.channel.broadcast(&Packet::PlayerDespawned { id });
        self.channel.terminate(id);
        info!("Player {} left ({} segments removed)", id, removed);
        Ok(())
    }

    /// Queues a movement target. Only the participant that owns the player (or
    /// the server itself) may steer it. Returns whether the intent was kept.
    pub fn submit_movement_intent(
        &mut self,
        sender: Node,
        id: PlayerId,
        intent: MovementIntent,
    ) -> Result<bool, CoreError> {
        if sender != Node::Server && sender != Node::Participant(id) {
            return Err(CoreError::AuthorityViolation {
                writer: sender,
                target: "movement intent",
            });
        }
        let player = self
            .players
            .get_mut(&id)
            .filter(|player| player.is_active())
            .ok_or(CoreError::UnknownPlayer { id })?;
        if !intent.target.is_finite() {
            warn!("Player {} sent a non-finite movement target", id);
            return Ok(false);
        }
        Ok(player.queue_intent(intent))
    }

    /// Teleports a player. Rejected for anyone but the server.
    pub fn place_player(
        &mut self,
        writer: Node,
        id: PlayerId,
        position: Vec2,
    ) -> Result<(), CoreError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(CoreError::UnknownPlayer { id })?;
        let orientation = player.orientation();
        if let Some(change) = player.set_transform(
            writer,
            Transform {
                position,
                orientation,
            },
        )? {
            self.channel.broadcast(&Packet::ReplicatedTransform {
                id,
                revision: change.revision,
                position: change.current.position,
                orientation: change.current.orientation,
            });
        }
        Ok(())
    }

    /// Adds one unit of length to `id` and replicates it. Returns the new length.
    pub fn apply_growth(&mut self, writer: Node, id: PlayerId) -> Result<u16, CoreError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(CoreError::UnknownPlayer { id })?;
        if let Some(change) = player.grow(writer)? {
            self.channel.broadcast(&Packet::ReplicatedLength {
                id,
                revision: change.revision,
                length: change.current,
            });
            info!("Player {} grew to length {}", id, change.current);
        }
        Ok(player.length())
    }

    fn canonical(&self, reported: PlayerData) -> Option<PlayerData> {
        let player = self.players.get(&reported.id).filter(|p| p.is_active())?;
        let canonical = player.length();
        if reported.length != canonical {
            debug!(
                "{}",
                CoreError::StaleCollisionData {
                    id: reported.id,
                    reported: reported.length,
                    canonical,
                }
            );
        }
        Some(PlayerData {
            id: reported.id,
            length: canonical,
        })
    }

    fn armed(&self, id: PlayerId) -> bool {
        self.players
            .get(&id)
            .map_or(false, |player| player.collision_armed(self.clock))
    }

    /// Handles a head-to-head report. Reported lengths only identify the
    /// participants; the decision uses canonical lengths.
    pub fn handle_collision_report(
        &mut self,
        sender: Node,
        a: PlayerData,
        b: PlayerData,
    ) -> Option<CollisionOutcome> {
        if sender != Node::Server
            && sender != Node::Participant(a.id)
            && sender != Node::Participant(b.id)
        {
            warn!(
                "{}",
                CoreError::AuthorityViolation {
                    writer: sender,
                    target: "collision report",
                }
            );
            return None;
        }
        if a.id == b.id {
            return None;
        }
        let (Some(a), Some(b)) = (self.canonical(a), self.canonical(b)) else {
            debug!("Collision report names a player that is no longer active");
            return None;
        };
        self.settle(CollisionEvent::HeadToHead { a, b })
    }

    /// Handles a head-to-tail report, which only the player whose head struck
    /// the tail (or the server) may send.
    pub fn handle_tail_collision_report(
        &mut self,
        sender: Node,
        tail_owner: PlayerId,
        collider_head: PlayerId,
    ) -> Option<CollisionOutcome> {
        if sender != Node::Server && sender != Node::Participant(collider_head) {
            warn!(
                "{}",
                CoreError::AuthorityViolation {
                    writer: sender,
                    target: "tail collision report",
                }
            );
            return None;
        }
        if tail_owner == collider_head {
            return None;
        }
        let both_active = [tail_owner, collider_head].iter().all(|id| {
            self.players
                .get(id)
                .map_or(false, |player| player.is_active())
        });
        if !both_active {
            debug!("Tail collision report names a player that is no longer active");
            return None;
        }
        self.settle(CollisionEvent::HeadToTail {
            tail_owner,
            collider_head,
        })
    }

    fn notify(&mut self, id: PlayerId, packet: Packet) {
        if let Err(e) = self.channel.send_to(&[id], &packet) {
            debug!("Notice dropped: {}", e);
        }
    }

    fn settle(&mut self, event: CollisionEvent) -> Option<CollisionOutcome> {
        let (first, second) = event.participants();
        if !self.armed(first) || !self.armed(second) {
            debug!(
                "Collision between {} and {} suppressed by cooldown",
                first, second
            );
            return None;
        }

        let outcome = CollisionResolver::resolve(&event);
        let window = self.config.collision_cooldown_secs;
        for id in [first, second] {
            if let Some(player) = self.players.get_mut(&id) {
                player.disarm_collisions(self.clock, window);
            }
        }

        self.notify(outcome.winner, Packet::AtePlayerNotice);
        self.notify(outcome.loser, Packet::GameOverNotice);
        if let Err(e) = self.apply_growth(Node::Server, outcome.winner) {
            warn!("Winner {} could not grow: {}", outcome.winner, e);
        }
        if let Err(e) = self.leave(outcome.loser) {
            warn!("Loser {} could not be removed: {}", outcome.loser, e);
        }
        info!(
            "Player {} eliminated player {}",
            outcome.winner, outcome.loser
        );
        Some(outcome)
    }

    /// Advances the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.clock += f64::from(dt);
        self.tick += 1;

        let ids = self.sorted_ids();
        for id in &ids {
            let Some(player) = self.players.get_mut(id) else {
                continue;
            };
            if !player.is_active() {
                continue;
            }
            match player.integrate(dt) {
                Ok(Some(change)) => self.channel.broadcast(&Packet::ReplicatedTransform {
                    id: *id,
                    revision: change.revision,
                    position: change.current.position,
                    orientation: change.current.orientation,
                }),
                Ok(None) => {}
                Err(e) => warn!("Player {} did not move: {}", id, e),
            }
            player.follow_chain(dt);
        }

        for id in &ids {
            self.eat_food(*id);
        }
    }

    fn eat_food(&mut self, id: PlayerId) {
        let Some(head) = self
            .players
            .get(&id)
            .filter(|player| player.is_active())
            .map(PlayerEntity::position)
        else {
            return;
        };
        let radius = self.config.eat_radius;
        let eaten: Vec<_> = self
            .pool
            .active()
            .filter(|entity| entity.position.distance(&head) <= radius)
            .map(|entity| entity.id)
            .collect();

        for food in eaten {
            match self.pool.consume(food) {
                Ok(_) => {
                    self.channel.broadcast(&Packet::FoodConsumed { id: food });
                    if let Err(e) = self.apply_growth(Node::Server, id) {
                        warn!("Player {} could not grow: {}", id, e);
                    }
                }
                Err(e) => debug!("Food {} already gone: {}", food, e),
            }
        }
    }

    /// Runs one spawn cycle. Called once per spawn interval while the spawner
    /// is running.
    pub fn run_spawn_cycle(&mut self) -> CycleOutcome {
        let connected = self.connected_count();
        let outcome = self
            .spawner
            .run_cycle(connected, &mut self.pool, &mut self.rng);
        if let CycleOutcome::Spawned(id) = outcome {
            if let Some(entity) = self.pool.get(id) {
                self.channel.broadcast(&Packet::FoodSpawned {
                    id,
                    kind: entity.kind,
                    position: entity.position,
                });
            }
        }
        outcome
    }
}
