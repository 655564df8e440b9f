//! HTTP inbound adapter serving the blog's HTML pages.
//!
//! [`configure`] registers every page handler; the caller supplies the
//! [`state::HttpState`] and the cookie-session middleware.

pub mod author;
pub mod entries;
pub mod error;
pub mod health;
pub mod identity;
pub mod session;
pub mod session_config;
pub mod state;
pub mod templates;
#[cfg(test)]
pub mod test_utils;
pub mod users;

use actix_web::web;

pub use error::PageResult;

/// Register the page handlers and form/query error rendering.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
///
/// use actix_web::{App, web};
/// use blog::inbound::http::{configure, state::HttpState};
/// use blog::outbound::memory::InMemoryBlogStore;
/// use mockable::DefaultClock;
///
/// let state = HttpState::new(Arc::new(InMemoryBlogStore::new()), Arc::new(DefaultClock));
/// let _app = App::new().app_data(web::Data::new(state)).configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(error::form_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .service(users::home)
        .service(users::register)
        .service(users::login)
        .service(users::logout)
        .service(author::author_index)
        .service(author::author_action)
        .service(entries::edit_entry)
        .service(entries::add_comment);
}
