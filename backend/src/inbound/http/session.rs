//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix cookie session so handlers only deal with the login
//! status flag shown on the home page.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::Error;

pub(crate) const LOGIN_STATUS_KEY: &str = "login_status";
pub(crate) const LOGIN_MESSAGE_KEY: &str = "login_message";

/// Outcome of the most recent login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    Succeeded,
    Failed,
}

impl LoginStatus {
    fn as_flag(self) -> &'static str {
        match self {
            Self::Succeeded => "0",
            Self::Failed => "1",
        }
    }

    fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "0" => Some(Self::Succeeded),
            "1" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record the outcome of a login attempt.
    pub fn set_login_status(&self, status: LoginStatus) -> Result<(), Error> {
        self.0
            .insert(LOGIN_STATUS_KEY, status.as_flag())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Outcome of the last login attempt, if one was recorded.
    pub fn login_status(&self) -> Result<Option<LoginStatus>, Error> {
        let flag = self
            .0
            .get::<String>(LOGIN_STATUS_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(flag.as_deref().and_then(|raw| {
            let status = LoginStatus::from_flag(raw);
            if status.is_none() {
                tracing::warn!(value = raw, "unrecognised login status in session cookie");
            }
            status
        }))
    }

    /// Forget the login status and any login message.
    pub fn clear_login_status(&self) {
        self.0.remove(LOGIN_STATUS_KEY);
        self.0.remove(LOGIN_MESSAGE_KEY);
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
