//! # Arena Client Library
//!
//! A headless participant for the snake arena. It keeps a mirror of the
//! replicated world, steers its own player with movement intents, and reports
//! contacts it notices locally. It never decides an outcome: growth, food
//! pickup and eliminations only happen when the server says so.
//!
//! ## Mirroring
//!
//! Every replicated value arrives with a revision and is applied only if it is
//! newer than what the mirror holds. When a player's replicated length grows,
//! the mirror runs the same growth-chain reaction the server runs, so every
//! node ends up with `length - 1` segments without ever sending segments.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! - Mirrors of every player and the food in the arena
//! - Local overlap detection with a report cooldown
//!
//! ### Input Module (`input`)
//! Sequenced movement intents toward wandering targets.
//!
//! ### Network Module (`network`)
//! UDP session with the server: connect, send intents and reports, apply
//! replicated updates, leave.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("127.0.0.1:8080", 0).await?;
//!     let end = client.run(Some(Duration::from_secs(30))).await?;
//!     println!("{:?}", end);
//!     Ok(())
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
