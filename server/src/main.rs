use clap::Parser;
use log::info;
use server::network::Server;
use shared::{GameConfig, SpawnResumePolicy};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Maximum number of connected participants
    #[arg(short, long, default_value = "16")]
    max_clients: usize,

    /// Maximum live food entities
    #[arg(long, default_value_t = shared::MAX_POOL_CAPACITY)]
    capacity: usize,

    /// Food spawned when the session starts
    #[arg(long, default_value_t = shared::INITIAL_SPAWN_BATCH)]
    initial_food: usize,

    /// Seconds between spawn cycles
    #[arg(long, default_value_t = shared::SPAWN_INTERVAL_SECS)]
    spawn_interval: f32,

    /// Player speed in units per second
    #[arg(long, default_value_t = shared::PLAYER_SPEED)]
    speed: f32,

    /// Keep the spawner stopped once the arena has emptied
    #[arg(long)]
    stop_spawning_when_empty: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = GameConfig {
        max_pool_capacity: args.capacity,
        initial_spawn_batch: args.initial_food.min(args.capacity),
        spawn_interval_secs: args.spawn_interval.max(0.01),
        player_speed: args.speed,
        spawn_resume: if args.stop_spawning_when_empty {
            SpawnResumePolicy::StopWhenEmpty
        } else {
            SpawnResumePolicy::RearmOnReconnect
        },
        ..GameConfig::default()
    };

    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f64(1.0 / f64::from(args.tick_rate.max(1)));

    info!("Starting server on {}", address);
    info!(
        "Tick rate {} Hz, up to {} players, food capacity {}",
        args.tick_rate, args.max_clients, config.max_pool_capacity
    );

    let mut server = Server::new(&address, tick_duration, args.max_clients, config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
