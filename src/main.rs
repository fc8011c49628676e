use mimalloc::MiMalloc;
use portfolio_site::config::Config;
use portfolio_site::db::SiteStorage;
use portfolio_site::router::{SiteState, site_router};
use portfolio_site::service::store_actor;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        listen_addr = %cfg.basic.listen_addr,
        database_url = %cfg.basic.database_url,
        loglevel = %cfg.basic.loglevel,
        cookie_name = %cfg.session.cookie_name,
        cookie_secure = cfg.session.cookie_secure,
        same_site = ?cfg.session.same_site,
        ttl_hours = cfg.session.ttl_hours,
        requests_per_minute = cfg.throttle.requests_per_minute,
    );
    if cfg.basic.expose_error_detail {
        warn!("expose_error_detail is on; internal errors will reach clients");
    }

    let storage = SiteStorage::connect(&cfg.basic.database_url).await?;
    let store = store_actor::spawn(
        storage,
        cfg.session.ttl(),
        cfg.session.purge_interval(),
    )
    .await?;

    let state = SiteState::new(store.clone(), &cfg)?;
    let app = site_router(state);

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.stop();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}
