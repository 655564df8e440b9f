//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;

use blog::Trace;
use blog::inbound::http::configure;
use blog::inbound::http::health::{HealthState, live, ready};
use blog::inbound::http::state::HttpState;

fn session_middleware(
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build()
}

/// Bind the HTTP server and mark the service ready.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        sessions,
    } = config;
    let http_state = web::Data::new(HttpState::new(sessions, Arc::new(DefaultClock)));
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_health_state.clone())
            .app_data(http_state.clone())
            .wrap(session_middleware(key.clone(), cookie_secure, same_site))
            .wrap(Trace)
            .service(ready)
            .service(live)
            .configure(configure)
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
