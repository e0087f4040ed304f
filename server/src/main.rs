use clap::Parser;
use log::info;
use server::config::RelayConfig;
use server::network::Server;
use shared::{DEFAULT_TICKS_PER_SECOND, DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Clock ticks per second reported to clients
    #[arg(short, long, default_value_t = DEFAULT_TICKS_PER_SECOND)]
    tick_rate: u32,

    /// Beacon field width
    #[arg(short = 'W', long, default_value_t = DEFAULT_WORLD_WIDTH)]
    width: u32,

    /// Beacon field height (no short flag to avoid conflict with --help)
    #[arg(long, default_value_t = DEFAULT_WORLD_HEIGHT)]
    height: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = RelayConfig::new(args.tick_rate, args.width, args.height);
    let address = format!("{}:{}", args.host, args.port);

    info!("Starting relay...");
    let server = Server::bind(&address, config).await?;

    server
        .run_until(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, shutting down gracefully...");
            }
        })
        .await?;

    Ok(())
}
