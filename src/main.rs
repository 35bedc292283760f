use std::net::SocketAddr;
use std::time::Duration;

use manhub_backend::{build_router, config::Config, database::pool::create_pool, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let pool = create_pool(&config).await?;
    let addr: SocketAddr = config.server_address.parse()?;
    let dispatch_interval = config.welcome_dispatch_interval_secs;

    let app_state = AppState::new(config, pool)?;

    if let Some(secs) = dispatch_interval {
        let state = app_state.clone();
        info!(interval_secs = secs, "Starting welcome dispatcher");
        tokio::spawn(async move {
            loop {
                match state.welcome_service.dispatch().await {
                    Ok(outcome) if outcome.sent > 0 => {
                        info!(sent = outcome.sent, "Welcome dispatch sent messages");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = ?e, "Welcome dispatcher error");
                    }
                }
                tokio::time::sleep(Duration::from_secs(secs.max(1))).await;
            }
        });
    }

    let app = build_router(app_state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
