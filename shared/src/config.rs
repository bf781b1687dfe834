use crate::math::Vec2;
use crate::{
    ARENA_MAX_X, ARENA_MAX_Y, ARENA_MIN_X, ARENA_MIN_Y, COLLISION_COOLDOWN_SECS, EAT_RADIUS,
    INITIAL_SPAWN_BATCH, MAX_POOL_CAPACITY, PLAYER_SPEED, SEGMENT_CATCH_UP_FACTOR, SEGMENT_SPACING,
    SPAWN_INTERVAL_SECS,
};

/// Axis-aligned playable area. Spawns are sampled uniformly inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            min_x: ARENA_MIN_X,
            max_x: ARENA_MAX_X,
            min_y: ARENA_MIN_Y,
            max_y: ARENA_MAX_Y,
        }
    }
}

impl ArenaBounds {
    pub fn contains(&self, point: Vec2) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }
}

/// What the periodic spawn task does once it has stopped for lack of players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnResumePolicy {
    /// Stay stopped for the rest of the session.
    StopWhenEmpty,
    /// Re-arm as soon as connectivity goes from zero to one.
    #[default]
    RearmOnReconnect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub arena: ArenaBounds,
    pub max_pool_capacity: usize,
    pub initial_spawn_batch: usize,
    pub spawn_interval_secs: f32,
    pub collision_cooldown_secs: f32,
    pub player_speed: f32,
    pub eat_radius: f32,
    pub segment_spacing: f32,
    pub spawn_resume: SpawnResumePolicy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            arena: ArenaBounds::default(),
            max_pool_capacity: MAX_POOL_CAPACITY,
            initial_spawn_batch: INITIAL_SPAWN_BATCH,
            spawn_interval_secs: SPAWN_INTERVAL_SECS,
            collision_cooldown_secs: COLLISION_COOLDOWN_SECS,
            player_speed: PLAYER_SPEED,
            eat_radius: EAT_RADIUS,
            segment_spacing: SEGMENT_SPACING,
            spawn_resume: SpawnResumePolicy::default(),
        }
    }
}

impl GameConfig {
    /// Furthest a trailing segment may move in `dt` seconds.
    pub fn segment_max_step(&self, dt: f32) -> f32 {
        self.player_speed * dt * SEGMENT_CATCH_UP_FACTOR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = GameConfig::default();
        assert_eq!(config.max_pool_capacity, 50);
        assert_eq!(config.initial_spawn_batch, 30);
        assert_eq!(config.spawn_interval_secs, 2.0);
        assert_eq!(config.collision_cooldown_secs, 0.5);
        assert_eq!(config.player_speed, 3.0);
        assert_eq!(config.spawn_resume, SpawnResumePolicy::RearmOnReconnect);
    }

    #[test]
    fn test_segment_step_outpaces_head() {
        let config = GameConfig::default();
        assert_eq!(config.segment_max_step(0.5), 3.0);
        assert!(config.segment_max_step(0.1) > config.player_speed * 0.1);
    }

    #[test]
    fn test_arena_bounds() {
        let arena = ArenaBounds::default();
        assert!(arena.contains(Vec2::new(-7.0, 5.0)));
        assert!(arena.contains(Vec2::ZERO));
        assert!(!arena.contains(Vec2::new(7.1, 0.0)));
        assert!(!arena.contains(Vec2::new(0.0, -5.1)));
    }
}
