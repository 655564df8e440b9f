//! Author pages under `/author/{username}`.
//!
//! The trailing segment selects the view:
//!
//! | segment   | view                                             |
//! |-----------|--------------------------------------------------|
//! | *(none)*  | all of the author's entries (with or without `/`) |
//! | `new`     | persist a blank entry and open its edit form     |
//! | `edit`    | edit form for the entry named by `?entry=`       |
//! | digits    | a single entry                                   |
//!
//! `new` and `edit` require the visitor's identity cookie to name the author.

use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, route, routes, web};
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{Comment, Entry, EntryId, Error, NewEntry, PersistenceContext, User};
use crate::inbound::http::PageResult;
use crate::inbound::http::identity::{Visitor, is_logged_in_as};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::templates::{self, EntriesPage};

/// Query string of the `edit` view.
#[derive(Debug, Deserialize)]
pub struct EditQuery {
    pub entry: i64,
}

/// What the trailing path segment asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorView {
    New,
    Edit,
    Entry(EntryId),
}

impl AuthorView {
    /// Parse a path segment; `None` for anything unrecognised.
    ///
    /// # Examples
    /// ```
    /// use blog::domain::EntryId;
    /// use blog::inbound::http::author::AuthorView;
    ///
    /// assert_eq!(AuthorView::parse("new"), Some(AuthorView::New));
    /// assert_eq!(AuthorView::parse("42"), Some(AuthorView::Entry(EntryId::new(42))));
    /// assert_eq!(AuthorView::parse("4x"), None);
    /// ```
    pub fn parse(segment: &str) -> Option<Self> {
        match segment {
            "new" => Some(Self::New),
            "edit" => Some(Self::Edit),
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                digits.parse().ok().map(|raw| Self::Entry(EntryId::new(raw)))
            }
            _ => None,
        }
    }
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(body)
}

async fn load_author(
    state: &HttpState,
    ctx: &mut PersistenceContext,
    username: &str,
) -> Result<User, Error> {
    state
        .blog
        .user_by_nick(ctx, username)
        .await?
        .ok_or_else(|| Error::not_found(format!("no user named {username}")))
}

async fn load_entry(
    state: &HttpState,
    ctx: &mut PersistenceContext,
    id: EntryId,
) -> Result<Entry, Error> {
    state
        .blog
        .entry_by_id(ctx, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("no entry with id {id}")))
}

async fn with_comments(
    state: &HttpState,
    ctx: &mut PersistenceContext,
    entries: Vec<Entry>,
) -> Result<Vec<(Entry, Vec<Comment>)>, Error> {
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let comments = state.blog.comments_for_entry(ctx, &entry).await?;
        items.push((entry, comments));
    }
    Ok(items)
}

fn require_identity(req: &HttpRequest, author: &User) -> Result<(), Error> {
    if is_logged_in_as(req, author.id()) {
        Ok(())
    } else {
        debug!(nick = author.nick(), "identity cookie does not match author");
        Err(Error::forbidden(format!(
            "log in as {} to manage this blog",
            author.nick()
        )))
    }
}

fn render_entries(
    req: &HttpRequest,
    author: &User,
    items: &[(Entry, Vec<Comment>)],
) -> HttpResponse {
    let visitor = Visitor::from_request(req);
    html(templates::entries(&EntriesPage {
        author,
        entries: items,
        visitor: &visitor,
        can_edit: is_logged_in_as(req, author.id()),
    }))
}

/// All entries of the named author.
#[routes]
#[get("/author/{username}")]
#[post("/author/{username}")]
#[get("/author/{username}/")]
#[post("/author/{username}/")]
pub async fn author_index(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    req: HttpRequest,
) -> PageResult<HttpResponse> {
    let username = path.into_inner();
    let mut ctx = state.context();
    let author = load_author(&state, &mut ctx, &username).await?;
    let entries = state.blog.entries_by_creator(&mut ctx, &author).await?;
    let items = with_comments(&state, &mut ctx, entries).await?;
    Ok(render_entries(&req, &author, &items))
}

/// New, edit and single-entry views.
#[route("/author/{username}/{segment}", method = "GET", method = "POST")]
pub async fn author_action(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> PageResult<HttpResponse> {
    let (username, segment) = path.into_inner();
    let view = AuthorView::parse(&segment)
        .ok_or_else(|| Error::not_found(format!("unknown page {segment}")))?;
    let mut ctx = state.context();

    match view {
        AuthorView::New => {
            let author = load_author(&state, &mut ctx, &username).await?;
            require_identity(&req, &author)?;
            let blank = NewEntry::blank(&author, state.clock.utc());
            let entry = ctx.session().await?.persist_entry(&blank).await?;
            ctx.close().await?;
            info!(entry_id = %entry.id(), user_id = %author.id(), "blank entry created");
            Ok(html(templates::edit_form(&author, &entry)))
        }
        AuthorView::Edit => {
            let author = load_author(&state, &mut ctx, &username).await?;
            require_identity(&req, &author)?;
            let query = web::Query::<EditQuery>::from_query(req.query_string())
                .map_err(|error| Error::invalid_request(format!("malformed query: {error}")))?;
            let entry = load_entry(&state, &mut ctx, EntryId::new(query.entry)).await?;
            Ok(html(templates::edit_form(&author, &entry)))
        }
        AuthorView::Entry(id) => {
            let entry = load_entry(&state, &mut ctx, id).await?;
            let creator = state
                .blog
                .user_by_id(&mut ctx, entry.creator_id())
                .await?
                .ok_or_else(|| Error::not_found(format!("no author for entry {id}")))?;
            let items = with_comments(&state, &mut ctx, vec![entry]).await?;
            Ok(render_entries(&req, &creator, &items))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;
    use crate::inbound::http::identity::USER_ID_COOKIE;
    use crate::inbound::http::test_utils::{blog_test_app, memory_state};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;

    async fn seeded_state() -> (HttpState, User) {
        let (state, _) = memory_state();
        let mut ctx = state.context();
        let new_user = NewUser::new("Bob", "Builder", "bob", "bob@example.com", "secret")
            .expect("valid user");
        let bob = ctx
            .session()
            .await
            .expect("session")
            .persist_user(&new_user)
            .await
            .expect("persist");
        ctx.close().await.expect("commit");
        (state, bob)
    }

    async fn entry_count(state: &HttpState, author: &User) -> usize {
        let mut ctx = state.context();
        state
            .blog
            .entries_by_creator(&mut ctx, author)
            .await
            .expect("entries")
            .len()
    }

    #[rstest]
    #[case(None, StatusCode::FORBIDDEN)]
    #[case(Some("999"), StatusCode::FORBIDDEN)]
    #[actix_web::test]
    async fn new_entry_requires_matching_identity(
        #[case] cookie: Option<&str>,
        #[case] expected: StatusCode,
    ) {
        let (state, bob) = seeded_state().await;
        let app = actix_test::init_service(blog_test_app(state.clone())).await;
        let mut req = actix_test::TestRequest::get().uri("/author/bob/new");
        if let Some(value) = cookie {
            req = req.cookie(Cookie::new(USER_ID_COOKIE, value.to_owned()));
        }
        let res = actix_test::call_service(&app, req.to_request()).await;
        assert_eq!(res.status(), expected);
        assert_eq!(entry_count(&state, &bob).await, 0);
    }

    #[actix_web::test]
    async fn new_entry_for_unknown_author_is_not_found() {
        let (state, _) = seeded_state().await;
        let app = actix_test::init_service(blog_test_app(state)).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/author/nobody/new")
                .cookie(Cookie::new(USER_ID_COOKIE, "1"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn new_entry_persists_blank_entry_and_renders_form() {
        let (state, bob) = seeded_state().await;
        let app = actix_test::init_service(blog_test_app(state.clone())).await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/author/bob/new")
                .cookie(Cookie::new(USER_ID_COOKIE, bob.id().to_string()))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        assert!(String::from_utf8_lossy(&body).contains("action=\"/edit\""));
        assert_eq!(entry_count(&state, &bob).await, 1);
    }

    #[rstest]
    #[case("/author/bob/bogus")]
    #[case("/author/bob/12x")]
    #[case("/author/bob/404")]
    #[case("/author/nobody")]
    #[case("/author/nobody/")]
    #[actix_web::test]
    async fn unknown_pages_are_not_found(#[case] uri: &str) {
        let (state, _) = seeded_state().await;
        let app = actix_test::init_service(blog_test_app(state)).await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[case::get_bare(actix_test::TestRequest::get(), "/author/bob")]
    #[case::get_trailing_slash(actix_test::TestRequest::get(), "/author/bob/")]
    #[case::post_trailing_slash(actix_test::TestRequest::post(), "/author/bob/")]
    #[actix_web::test]
    async fn list_view_serves_bare_and_trailing_slash_paths(
        #[case] req: actix_test::TestRequest,
        #[case] uri: &str,
    ) {
        let (state, bob) = seeded_state().await;
        let mut ctx = state.context();
        ctx.session()
            .await
            .expect("session")
            .persist_entry(
                &NewEntry::new(&bob, "Listed", "Body", state.clock.utc()).expect("valid entry"),
            )
            .await
            .expect("persist entry");
        ctx.close().await.expect("commit");
        let app = actix_test::init_service(blog_test_app(state)).await;

        let res = actix_test::call_service(&app, req.uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("Blog of bob"));
        assert!(html.contains("Listed"));
    }

    #[actix_web::test]
    async fn edit_view_loads_requested_entry() {
        let (state, bob) = seeded_state().await;
        let mut ctx = state.context();
        let entry = ctx
            .session()
            .await
            .expect("session")
            .persist_entry(
                &NewEntry::new(&bob, "Title", "Body", state.clock.utc()).expect("valid entry"),
            )
            .await
            .expect("persist entry");
        ctx.close().await.expect("commit");
        let app = actix_test::init_service(blog_test_app(state)).await;
        let cookie = Cookie::new(USER_ID_COOKIE, bob.id().to_string());

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/author/bob/edit?entry={}", entry.id()))
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        assert!(String::from_utf8_lossy(&body).contains("value=\"Title\""));

        let missing = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/author/bob/edit")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[case("new", Some(AuthorView::New))]
    #[case("edit", Some(AuthorView::Edit))]
    #[case("0", Some(AuthorView::Entry(EntryId::new(0))))]
    #[case("123", Some(AuthorView::Entry(EntryId::new(123))))]
    #[case("-1", None)]
    #[case("+1", None)]
    #[case("1a", None)]
    #[case("99999999999999999999", None)]
    #[case("NEW", None)]
    #[case("", None)]
    fn parses_segments(#[case] segment: &str, #[case] expected: Option<AuthorView>) {
        assert_eq!(AuthorView::parse(segment), expected);
    }
}
