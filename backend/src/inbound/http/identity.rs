//! Identity cookies naming the logged-in visitor.
//!
//! Login issues four plain cookies (`current.user.id`, `current.user.fn`,
//! `current.user.ln`, `current.user.nick`) valid for ten minutes on path `/`.
//! A visitor counts as logged in as a user when the first `current.user.id`
//! cookie carries that user's numeric id. The cookies are neither signed nor
//! backed by a server-side token.

use actix_web::HttpRequest;
use actix_web::cookie::Cookie;
use actix_web::cookie::time::Duration;

use crate::domain::{User, UserId};

pub const USER_ID_COOKIE: &str = "current.user.id";
pub const FIRST_NAME_COOKIE: &str = "current.user.fn";
pub const LAST_NAME_COOKIE: &str = "current.user.ln";
pub const NICK_COOKIE: &str = "current.user.nick";

const IDENTITY_COOKIES: [&str; 4] = [
    USER_ID_COOKIE,
    FIRST_NAME_COOKIE,
    LAST_NAME_COOKIE,
    NICK_COOKIE,
];
const IDENTITY_TTL: Duration = Duration::minutes(10);

fn identity_cookie(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build(name, value).path("/").max_age(max_age).finish()
}

/// Cookies announcing `user` as the current visitor.
pub fn login_cookies(user: &User) -> Vec<Cookie<'static>> {
    vec![
        identity_cookie(USER_ID_COOKIE, user.id().to_string(), IDENTITY_TTL),
        identity_cookie(FIRST_NAME_COOKIE, user.first_name().to_owned(), IDENTITY_TTL),
        identity_cookie(LAST_NAME_COOKIE, user.last_name().to_owned(), IDENTITY_TTL),
        identity_cookie(NICK_COOKIE, user.nick().to_owned(), IDENTITY_TTL),
    ]
}

/// Expired copies of every identity cookie present on `req`.
pub fn expired_cookies(req: &HttpRequest) -> Vec<Cookie<'static>> {
    IDENTITY_COOKIES
        .into_iter()
        .filter_map(|name| {
            req.cookie(name)
                .map(|cookie| identity_cookie(name, cookie.value().to_owned(), Duration::ZERO))
        })
        .collect()
}

/// Whether the request carries `id` in its identity cookie.
pub fn is_logged_in_as(req: &HttpRequest, id: UserId) -> bool {
    req.cookie(USER_ID_COOKIE)
        .is_some_and(|cookie| cookie.value() == id.to_string())
}

/// Visitor details read back from the identity cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Visitor {
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nick: Option<String>,
}

impl Visitor {
    pub fn from_request(req: &HttpRequest) -> Self {
        let read = |name: &str| req.cookie(name).map(|cookie| cookie.value().to_owned());
        Self {
            id: read(USER_ID_COOKIE),
            first_name: read(FIRST_NAME_COOKIE),
            last_name: read(LAST_NAME_COOKIE),
            nick: read(NICK_COOKIE),
        }
    }

    pub fn is_identified(&self) -> bool {
        self.id.is_some()
    }

    /// Name shown in the page header.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name, &self.nick) {
            (Some(first), Some(last), _) => format!("{first} {last}"),
            (_, _, Some(nick)) => nick.clone(),
            _ => self.id.clone().unwrap_or_default(),
        }
    }
}
