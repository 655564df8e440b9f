//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{BlogRepository, SessionSource};
use crate::domain::{ContextBlogRepository, PersistenceContext};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub sessions: Arc<dyn SessionSource>,
    pub blog: Arc<dyn BlogRepository>,
    pub clock: Arc<dyn Clock + Send + Sync>,
}

impl HttpState {
    /// Construct state over a session source, using the default repository.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use blog::inbound::http::state::HttpState;
    /// use blog::outbound::memory::InMemoryBlogStore;
    /// use mockable::DefaultClock;
    ///
    /// let state = HttpState::new(Arc::new(InMemoryBlogStore::new()), Arc::new(DefaultClock));
    /// assert!(!state.context().is_bound());
    /// ```
    pub fn new(sessions: Arc<dyn SessionSource>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            sessions,
            blog: Arc::new(ContextBlogRepository),
            clock,
        }
    }

    /// Replace the repository implementation.
    #[must_use]
    pub fn with_repository(mut self, blog: Arc<dyn BlogRepository>) -> Self {
        self.blog = blog;
        self
    }

    /// A fresh, unbound persistence context for one request.
    pub fn context(&self) -> PersistenceContext {
        PersistenceContext::new(self.sessions.clone())
    }
}
