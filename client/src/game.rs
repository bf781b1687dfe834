//! Participant-side mirror of the replicated world.
//!
//! Nothing here is authoritative. The mirror applies revisioned updates from the
//! server, rebuilds each player's growth chain from the replicated length with
//! the same reaction the server runs, and notices overlaps locally so they can
//! be reported. Outcomes only ever arrive from the server.

use log::{debug, info, warn};
use shared::overlap::{head_hits_chain, heads_overlap};
use shared::{
    EntityId, FoodState, GameConfig, GrowthChain, Node, Packet, PlayerData, PlayerId,
    PlayerState, Replicated, Transform, Vec2, STARTING_LENGTH,
};
use std::collections::{HashMap, HashSet};

/// Something the session loop may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Connected(PlayerId),
    OwnLengthChanged(u16),
    PlayerRemoved(PlayerId),
    AtePlayer,
    GameOver,
    Disconnected(String),
}

/// Local copy of one player's replicated state.
#[derive(Debug, Clone)]
pub struct MirroredPlayer {
    id: PlayerId,
    transform: Replicated<Transform>,
    length: Replicated<u16>,
    chain: GrowthChain,
}

impl MirroredPlayer {
    fn new(id: PlayerId, spacing: f32) -> Self {
        Self {
            id,
            transform: Replicated::new(Node::Server, "transform", Transform::default()),
            length: Replicated::new(Node::Server, "length", STARTING_LENGTH),
            chain: GrowthChain::new(id, spacing),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn position(&self) -> Vec2 {
        self.transform.get().position
    }

    pub fn orientation(&self) -> Vec2 {
        self.transform.get().orientation
    }

    pub fn length(&self) -> u16 {
        self.length.get()
    }

    pub fn chain(&self) -> &GrowthChain {
        &self.chain
    }

    fn data(&self) -> PlayerData {
        PlayerData {
            id: self.id,
            length: self.length(),
        }
    }

    /// Returns the new length when the update was newer and changed it.
    fn observe_length(&mut self, revision: u32, length: u16) -> Option<u16> {
        let change = self.length.observe(revision, length)?;
        self.chain.sync_to_length(self.position(), change.current);
        Some(change.current)
    }
}

pub struct ClientWorld {
    config: GameConfig,
    local_id: Option<PlayerId>,
    players: HashMap<PlayerId, MirroredPlayer>,
    // Ids are never reused by the server, so a despawned id stays dead.
    despawned: HashSet<PlayerId>,
    food: HashMap<EntityId, FoodState>,
    clock: f64,
    report_cooldown_until: f64,
    game_over: bool,
}

impl ClientWorld {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            local_id: None,
            players: HashMap::new(),
            despawned: HashSet::new(),
            food: HashMap::new(),
            clock: 0.0,
            report_cooldown_until: 0.0,
            game_over: false,
        }
    }

    pub fn local_id(&self) -> Option<PlayerId> {
        self.local_id
    }

    pub fn local_player(&self) -> Option<&MirroredPlayer> {
        self.local_id.and_then(|id| self.players.get(&id))
    }

    pub fn player(&self, id: PlayerId) -> Option<&MirroredPlayer> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &MirroredPlayer> {
        self.players.values()
    }

    pub fn food(&self) -> impl Iterator<Item = &FoodState> {
        self.food.values()
    }

    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Mirror for `id`, created on first sight. Updates that arrive after the
    /// player was despawned get `None`.
    fn mirror(&mut self, id: PlayerId) -> Option<&mut MirroredPlayer> {
        if self.despawned.contains(&id) {
            debug!("Dropping late update for despawned player {}", id);
            return None;
        }
        let spacing = self.config.segment_spacing;
        Some(
            self.players
                .entry(id)
                .or_insert_with(|| MirroredPlayer::new(id, spacing)),
        )
    }

    fn apply_player_state(&mut self, state: &PlayerState) {
        let Some(mirror) = self.mirror(state.id) else {
            return;
        };
        mirror.transform.observe(
            state.transform_revision,
            Transform {
                position: state.position,
                orientation: state.orientation,
            },
        );
        mirror.length.observe(state.length_revision, state.length);
        mirror.chain.sync_to_length(state.position, mirror.length.get());
    }

    fn apply_length(&mut self, id: PlayerId, revision: u32, length: u16) -> Option<ClientEvent> {
        let grown = self.mirror(id)?.observe_length(revision, length)?;
        if Some(id) == self.local_id {
            info!("Length is now {}", grown);
            return Some(ClientEvent::OwnLengthChanged(grown));
        }
        debug!("Player {} length is now {}", id, grown);
        None
    }

    /// Applies one packet from the server.
    pub fn apply_packet(&mut self, packet: Packet) -> Option<ClientEvent> {
        match packet {
            Packet::Connected { client_id } => {
                self.local_id = Some(client_id);
                self.game_over = false;
                Some(ClientEvent::Connected(client_id))
            }

            Packet::Snapshot { players, food } => {
                for state in &players {
                    self.apply_player_state(state);
                }
                self.food = food.into_iter().map(|f| (f.id, f)).collect();
                None
            }

            Packet::ReplicatedTransform {
                id,
                revision,
                position,
                orientation,
            } => {
                if let Some(mirror) = self.mirror(id) {
                    mirror.transform.observe(
                        revision,
                        Transform {
                            position,
                            orientation,
                        },
                    );
                }
                None
            }

            Packet::ReplicatedLength {
                id,
                revision,
                length,
            } => self.apply_length(id, revision, length),

            Packet::PlayerDespawned { id } => {
                self.despawned.insert(id);
                let mut mirror = self.players.remove(&id)?;
                mirror.chain.teardown();
                Some(ClientEvent::PlayerRemoved(id))
            }

            Packet::FoodSpawned { id, kind, position } => {
                self.food.insert(id, FoodState { id, kind, position });
                None
            }

            Packet::FoodConsumed { id } => {
                self.food.remove(&id);
                None
            }

            Packet::AtePlayerNotice => {
                info!("You ate a player");
                Some(ClientEvent::AtePlayer)
            }

            Packet::GameOverNotice => {
                info!("Game over");
                self.game_over = true;
                Some(ClientEvent::GameOver)
            }

            Packet::Disconnected { reason } => Some(ClientEvent::Disconnected(reason)),

            other => {
                warn!("Unexpected packet from server: {:?}", other);
                None
            }
        }
    }

    /// Advances local time and lets chains trail their heads.
    pub fn update(&mut self, dt: f32) {
        self.clock += f64::from(dt);
        let max_step = self.config.segment_max_step(dt);
        for mirror in self.players.values_mut() {
            let head = mirror.position();
            mirror.chain.follow(head, max_step);
        }
    }

    /// Looks for contacts between the local head and other players. Returns
    /// the report to send, at most one per cooldown window.
    pub fn detect_collisions(&mut self) -> Option<Packet> {
        if self.game_over || self.clock < self.report_cooldown_until {
            return None;
        }
        let me = self.local_player()?;
        let head = me.position();

        let mut others: Vec<&MirroredPlayer> =
            self.players.values().filter(|p| p.id != me.id).collect();
        others.sort_by_key(|p| p.id);

        let report = others.iter().find_map(|other| {
            if heads_overlap(head, other.position()) {
                Some(Packet::CollisionReport {
                    player_a: me.data(),
                    player_b: other.data(),
                })
            } else if head_hits_chain(me.id, head, &other.chain) {
                Some(Packet::TailCollisionReport {
                    tail_owner_id: other.id,
                    collider_head_id: me.id,
                })
            } else {
                None
            }
        })?;

        self.report_cooldown_until = self.clock + f64::from(self.config.collision_cooldown_secs);
        Some(report)
    }
}
