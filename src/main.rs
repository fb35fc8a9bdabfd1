use clap::Parser;
use jwtgate::cli::{Args, build_config, init_logging, load_secrets, open_database};
use jwtgate::run_server;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let Some((access_secret, refresh_secret)) = load_secrets(&args) else {
        std::process::exit(1);
    };

    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    let config = build_config(&args, db, access_secret, refresh_secret);

    match listener.local_addr() {
        Ok(local_addr) => info!(
            address = %local_addr,
            access_ttl_secs = config.access_lifetime.as_secs(),
            refresh_ttl_secs = config.refresh_lifetime.as_secs(),
            "Listening"
        ),
        Err(e) => error!(error = %e, "Failed to get local address"),
    }

    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
