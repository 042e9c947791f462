use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use jyutping_dict::JyutpingDict;
use jyutping_server::{AppState, Config, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load();
    info!("binding to {}:{}", config.host, config.port);
    info!(
        "using jyutping table at {} (mode: {:?})",
        config.table_path.display(),
        config.load_mode
    );
    if config.disable_cache {
        info!("cache headers disabled");
    }

    let dict = JyutpingDict::load_with_mode(&config.table_path, config.load_mode)
        .with_context(|| format!("loading {}", config.table_path.display()))?;

    let state = AppState {
        dict: Arc::new(dict),
        disable_cache: config.disable_cache,
    };

    let app = router(state).layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
