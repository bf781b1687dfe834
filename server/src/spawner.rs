//! Keeps the arena stocked with food.
//!
//! The spawner pre-populates the pool when a session starts, then runs one
//! cycle per spawn interval. Each cycle first looks at connectivity: with no
//! participants it stops, otherwise it adds one entity if the pool has room.
//! A full pool just skips the cycle; nothing is queued for later.

use log::{debug, info};
use rand::Rng;
use shared::{ArenaBounds, ConsumableKind, EntityId, GameConfig, SpawnResumePolicy, Vec2};

use crate::pool::EntityPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnerState {
    /// Session not started yet.
    Idle,
    Running,
    /// Exited after seeing zero participants.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Spawned(EntityId),
    SkippedAtCapacity,
    Stopped,
    NotRunning,
}

#[derive(Debug)]
pub struct Spawner {
    kind: ConsumableKind,
    arena: ArenaBounds,
    initial_batch: usize,
    policy: SpawnResumePolicy,
    state: SpawnerState,
}

/// Uniform random point inside the arena.
pub fn random_position<R: Rng>(arena: &ArenaBounds, rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.gen_range(arena.min_x..=arena.max_x),
        rng.gen_range(arena.min_y..=arena.max_y),
    )
}

impl Spawner {
    pub fn new(kind: ConsumableKind, config: &GameConfig) -> Self {
        Self {
            kind,
            arena: config.arena,
            initial_batch: config.initial_spawn_batch,
            policy: config.spawn_resume,
            state: SpawnerState::Idle,
        }
    }

    pub fn state(&self) -> SpawnerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SpawnerState::Running
    }

    pub fn kind(&self) -> ConsumableKind {
        self.kind
    }

    /// Spawns the initial batch and starts cycling. Only does anything the
    /// first time it is called.
    pub fn start<R: Rng>(&mut self, pool: &mut EntityPool, rng: &mut R) -> Vec<EntityId> {
        if self.state != SpawnerState::Idle {
            return Vec::new();
        }
        let spawned: Vec<EntityId> = (0..self.initial_batch)
            .filter_map(|_| {
                pool.spawn(self.kind, random_position(&self.arena, rng))
                    .ok()
            })
            .collect();
        info!(
            "Spawner started with {} {:?} (capacity {})",
            spawned.len(),
            self.kind,
            pool.capacity(self.kind)
        );
        self.state = SpawnerState::Running;
        spawned
    }

    /// Runs one cycle, called when the spawn interval has elapsed.
    pub fn run_cycle<R: Rng>(
        &mut self,
        connected: usize,
        pool: &mut EntityPool,
        rng: &mut R,
    ) -> CycleOutcome {
        if self.state != SpawnerState::Running {
            return CycleOutcome::NotRunning;
        }
        if connected == 0 {
            info!("No participants connected, spawner stopping");
            self.state = SpawnerState::Stopped;
            return CycleOutcome::Stopped;
        }
        match pool.spawn(self.kind, random_position(&self.arena, rng)) {
            Ok(id) => CycleOutcome::Spawned(id),
            Err(e) => {
                debug!("Spawn cycle skipped: {}", e);
                CycleOutcome::SkippedAtCapacity
            }
        }
    }

    /// Tells the spawner connectivity changed. Returns true if this re-armed a
    /// stopped spawner.
    pub fn on_connectivity_changed(&mut self, previous: usize, current: usize) -> bool {
        let reconnected = previous == 0 && current > 0;
        if reconnected
            && self.state == SpawnerState::Stopped
            && self.policy == SpawnResumePolicy::RearmOnReconnect
        {
            info!("Participant connected, spawner re-armed");
            self.state = SpawnerState::Running;
            return true;
        }
        false
    }
}
