//! Blog server entry-point: loads settings, picks a store and serves pages.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use blog::config::BlogSettings;
use blog::domain::ports::SessionSource;
use blog::inbound::http::health::HealthState;
use blog::inbound::http::session_config::{
    BuildMode, fingerprint::key_fingerprint, session_settings_from_env,
};
use blog::outbound::memory::InMemoryBlogStore;
use blog::outbound::persistence::{
    DbPool, DieselSessionSource, PoolConfig, apply_pending_migrations,
};
use server::{ServerConfig, create_server};

async fn session_source(settings: &BlogSettings) -> io::Result<Arc<dyn SessionSource>> {
    let Some(database_url) = settings.database_url() else {
        warn!("BLOG_DATABASE_URL not set; data is kept in memory and lost on restart");
        return Ok(Arc::new(InMemoryBlogStore::new()));
    };

    if settings.run_migrations() {
        let applied = apply_pending_migrations(database_url.to_owned())
            .await
            .map_err(|error| io::Error::other(format!("apply migrations: {error}")))?;
        info!(applied, "database migrations applied");
    }

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.pool_max_size()))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    Ok(Arc::new(DieselSessionSource::new(pool)))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = BlogSettings::load_from_iter(std::env::args_os())
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(io::Error::other)?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session key loaded"
    );

    let sessions = session_source(&settings).await?;
    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
        sessions,
    );
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "blog server listening");
    server.await
}
