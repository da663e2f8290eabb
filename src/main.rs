use tracing::info;
use tracing_subscriber::EnvFilter;

use brief_filler::config::Config;
use brief_filler::server::{create_router, AppState};

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {info}");
        if let Some(loc) = info.location() {
            eprintln!("at: {}:{}", loc.file(), loc.line());
        }
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "brief_filler=info,tower_http=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();
    install_panic_hook();

    let config = Config::from_env()?;
    let addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(config)?;

    info!("Starting brief filler on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
