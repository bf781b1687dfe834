//! # Arena Server Library
//!
//! The authoritative side of the snake arena. It owns every player's canonical
//! transform and length, decides collision outcomes, keeps the arena stocked
//! with food, and pushes every change to participants.
//!
//! ## Authority
//!
//! Only the server writes canonical state. Participants send movement intents
//! and collision reports; both are treated as requests. Intents are buffered
//! and applied at tick granularity. Collision reports only name the players
//! involved: the decision is made from the server's own lengths, so a report
//! built from out-of-date replicated values cannot change an outcome.
//!
//! ## Replication
//!
//! Every replicated value carries a revision. After each write the server
//! pushes the new value with its revision, and receivers drop anything older
//! than what they already applied. Growth chains are never sent: every node
//! rebuilds them from the replicated length with the same reaction code in
//! `shared`.
//!
//! ## Module Organization
//!
//! ### Authority Module (`authority`)
//! - Player join/leave and lifecycle transitions
//! - Movement integration and food pickup per tick
//! - Collision arbitration with a per-player cooldown
//! - Spawn cycles
//!
//! ### Collision Module (`collision`)
//! Pure winner/loser decision for head-to-head and head-to-tail contacts.
//!
//! ### Player Module (`player`)
//! Canonical per-player state and its growth chain.
//!
//! ### Pool and Spawner Modules (`pool`, `spawner`)
//! Capacity-bounded reusable food entities and the periodic task that refills
//! them while anyone is connected.
//!
//! ### Channel Module (`channel`)
//! The delivery seam: a UDP-backed implementation for the real server and a
//! recording implementation for tests.
//!
//! ### Client Manager and Network Modules (`client_manager`, `network`)
//! Connection registry, timeouts and the UDP event loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use shared::GameConfig;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(33), // 30Hz
//!         16,
//!         GameConfig::default(),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod authority;
pub mod channel;
pub mod client_manager;
pub mod collision;
pub mod network;
pub mod player;
pub mod pool;
pub mod spawner;
