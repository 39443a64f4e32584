use std::time::Duration;

use clap::Parser;
use log::info;

use sampquery::packet::DEFAULT_PING_WIDTH;
use sampquery::players::{QueryClient, QueryConfig};
use sampquery::server::{create_routes, AppState};

/// Serves SA-MP player lists over HTTP.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Address to serve HTTP on
    #[clap(short, long, default_value = "0.0.0.0:3000")]
    listen: String,
    /// Dial and receive deadline for each query, in milliseconds
    #[clap(short, long, default_value = "2000")]
    timeout_ms: u64,
    /// Width of the per-player ping field in replies
    #[clap(long, default_value_t = DEFAULT_PING_WIDTH)]
    ping_width: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let timeout = Duration::from_millis(args.timeout_ms);
    let config = QueryConfig {
        dial_timeout: timeout,
        read_timeout: timeout,
        ping_width: args.ping_width,
        ..QueryConfig::default()
    };
    let state = AppState {
        client: QueryClient::new(&config),
    };

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_routes(state)).await?;

    Ok(())
}
