//! Performance benchmarks for critical game systems

use assert_approx_eq::assert_approx_eq;
use server::authority::AuthorityServer;
use server::channel::RecordingChannel;
use server::collision::{CollisionEvent, CollisionResolver};
use server::pool::EntityPool;
use shared::{
    ConsumableKind, GameConfig, GrowthChain, MovementIntent, Node, Packet, PlayerData, Vec2,
};
use std::time::Instant;

/// Benchmarks collision resolution performance
#[test]
fn benchmark_collision_resolution() {
    let iterations = 100_000u32;
    let start = Instant::now();
    let mut second_wins = 0;

    for i in 0..iterations {
        let event = CollisionEvent::HeadToHead {
            a: PlayerData {
                id: 1,
                length: (i % 50) as u16,
            },
            b: PlayerData {
                id: 2,
                length: (i % 37) as u16,
            },
        };
        if CollisionResolver::resolve(&event).winner == 2 {
            second_wins += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "Collision resolution: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(second_wins > 0);
    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks growing and dragging a long chain
#[test]
fn benchmark_growth_chain() {
    let mut chain = GrowthChain::new(1, shared::SEGMENT_SPACING);
    let start = Instant::now();

    chain.sync_to_length(Vec2::ZERO, 1000);
    let mut head = Vec2::ZERO;
    for frame in 0..1000 {
        head = Vec2::new(frame as f32 * 0.01, 0.0);
        chain.follow(head, 0.2);
    }

    let duration = start.elapsed();
    println!(
        "Growth chain: {} segments × 1000 frames in {:?}",
        chain.len(),
        duration
    );

    assert_eq!(chain.len(), 999);
    assert_eq!(chain.steps_to_head(998), Some(999));
    // the first segment trails the head at the configured spacing
    assert_approx_eq!(
        chain.segments()[0].position.distance(&head),
        shared::SEGMENT_SPACING,
        1e-3
    );
    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Stress tests pool churn at capacity
#[test]
fn stress_test_pool_churn() {
    let mut pool = EntityPool::new();
    pool.register(ConsumableKind::Food, 50);
    let mut live = Vec::new();

    let iterations = 100_000u32;
    let start = Instant::now();

    for i in 0..iterations {
        if i % 2 == 0 {
            if let Ok(id) = pool.spawn(ConsumableKind::Food, Vec2::new(i as f32, 0.0)) {
                live.push(id);
            }
        } else if i % 5 == 0 {
            if let Some(id) = live.pop() {
                assert!(pool.consume(id).is_ok());
            }
        }
    }

    let duration = start.elapsed();
    println!("Pool churn: {} operations in {:?}", iterations, duration);

    assert!(pool.active_count(ConsumableKind::Food) <= 50);
    assert!(pool.allocated() <= 50);
    // Should complete in under 100ms
    assert!(duration.as_millis() < 100);
}

/// Benchmarks a full authority tick with a busy arena
#[test]
fn benchmark_authority_tick() {
    let mut server = AuthorityServer::with_seed(GameConfig::default(), RecordingChannel::new(), 5);
    server.start_session();
    for id in 1..=16 {
        server.channel_mut().connect(id);
        server.join(id).unwrap();
        server
            .submit_movement_intent(
                Node::Participant(id),
                id,
                MovementIntent {
                    sequence: 1,
                    target: Vec2::new(-6.0 + id as f32 * 0.7, 4.0),
                },
            )
            .unwrap();
    }

    let iterations = 1000;
    let start = Instant::now();

    for _ in 0..iterations {
        server.tick(1.0 / 30.0);
        for id in 1..=16 {
            server.channel_mut().drain_for(id);
        }
    }

    let duration = start.elapsed();
    println!(
        "Authority tick: {} players × {} ticks in {:?} ({:.2} μs/tick)",
        server.connected_count(),
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(server.tick_count(), iterations);
    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks network packet serialization performance
#[test]
fn benchmark_packet_serialization() {
    use bincode::{deserialize, serialize};

    let packet = Packet::ReplicatedTransform {
        id: 7,
        revision: 1234,
        position: Vec2::new(1.5, -2.5),
        orientation: Vec2::UP,
    };

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let serialized = serialize(&packet).unwrap();
        let _deserialized: Packet = deserialize(&serialized).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Packet serialization: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}
