//! Home page, registration, login and logout.

use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::{LoginCredentials, NewUser, authenticate};
use crate::inbound::http::PageResult;
use crate::inbound::http::identity::{self, Visitor};
use crate::inbound::http::session::{LoginStatus, SessionContext};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::templates::{self, HomePage};

/// Redirect to the home page.
pub(crate) fn see_home() -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, "/"));
    builder
}

/// Registration form fields.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login form fields.
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// List every user with links to their blogs.
#[get("/")]
pub async fn home(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
) -> PageResult<HttpResponse> {
    let mut ctx = state.context();
    let users = state.blog.all_users(&mut ctx).await?;
    let visitor = Visitor::from_request(&req);
    let login_failed = matches!(session.login_status()?, Some(LoginStatus::Failed));
    let html = templates::home(&HomePage {
        users: &users,
        visitor: &visitor,
        login_failed,
    });
    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(html))
}

/// Create a user from the registration form.
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    form: web::Form<RegisterForm>,
) -> PageResult<HttpResponse> {
    let RegisterForm {
        firstname,
        lastname,
        username,
        email,
        password,
    } = form.into_inner();
    let new_user = NewUser::new(firstname, lastname, username, email, &password)?;

    let mut ctx = state.context();
    let user = ctx.session().await?.persist_user(&new_user).await?;
    ctx.close().await?;
    info!(user_id = %user.id(), nick = user.nick(), "user registered");
    Ok(see_home().finish())
}

/// Check the submitted credentials and issue identity cookies on success.
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<LoginForm>,
) -> PageResult<HttpResponse> {
    let user = match LoginCredentials::try_from_parts(&form.username, &form.password) {
        Ok(credentials) => {
            let mut ctx = state.context();
            authenticate(state.blog.as_ref(), &mut ctx, &credentials).await?
        }
        Err(error) => {
            warn!(%error, "rejected login form");
            None
        }
    };

    let Some(user) = user else {
        session.set_login_status(LoginStatus::Failed)?;
        return Ok(see_home().finish());
    };

    session.set_login_status(LoginStatus::Succeeded)?;
    info!(user_id = %user.id(), "login succeeded");
    let mut response = see_home();
    for cookie in identity::login_cookies(&user) {
        response.cookie(cookie);
    }
    Ok(response.finish())
}

/// Expire the identity cookies and forget the login status.
#[post("/logout")]
pub async fn logout(session: SessionContext, req: HttpRequest) -> HttpResponse {
    session.clear_login_status();
    let mut response = see_home();
    for cookie in identity::expired_cookies(&req) {
        response.cookie(cookie);
    }
    response.finish()
}
