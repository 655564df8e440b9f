//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::inbound::http::configure;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::InMemoryBlogStore;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

pub fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock;

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        fixture_timestamp().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        fixture_timestamp()
    }
}

/// HTTP state over a fresh in-memory store and a frozen clock.
pub fn memory_state() -> (HttpState, Arc<InMemoryBlogStore>) {
    let store = Arc::new(InMemoryBlogStore::new());
    let state = HttpState::new(store.clone(), Arc::new(FixtureClock));
    (state, store)
}

/// The full page surface over `state`, behind a test session middleware.
pub fn blog_test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .configure(configure)
}

/// Owned copies of every cookie set by `res`.
pub fn response_cookies(res: &ServiceResponse) -> Vec<Cookie<'static>> {
    res.response().cookies().map(Cookie::into_owned).collect()
}
