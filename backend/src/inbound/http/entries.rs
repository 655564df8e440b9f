//! Entry edits and comment submissions.

use actix_web::{HttpResponse, post, web};
use serde::Deserialize;
use tracing::info;

use crate::domain::{EntryId, Error, NewComment, UserId};
use crate::inbound::http::PageResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::see_home;

/// Edit form fields.
#[derive(Debug, Deserialize)]
pub struct EditEntryForm {
    pub title: String,
    pub text: String,
    pub entry: i64,
}

/// Comment form fields. `user` names the commenter whose email is recorded.
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub comment: String,
    pub entry: i64,
    pub user: i64,
}

/// Overwrite an entry's title and text.
#[post("/edit")]
pub async fn edit_entry(
    state: web::Data<HttpState>,
    form: web::Form<EditEntryForm>,
) -> PageResult<HttpResponse> {
    let EditEntryForm { title, text, entry } = form.into_inner();
    let id = EntryId::new(entry);
    let mut ctx = state.context();
    let mut entry = state
        .blog
        .entry_by_id(&mut ctx, id)
        .await?
        .ok_or_else(|| Error::not_found(format!("no entry with id {id}")))?;
    entry.edit(title, text, state.clock.utc())?;

    ctx.session().await?.merge_entry(&entry).await?;
    ctx.close().await?;
    info!(entry_id = %id, "entry updated");
    Ok(see_home().finish())
}

/// Attach a comment to an entry, stamped with the commenter's email.
#[post("/addComment")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    form: web::Form<CommentForm>,
) -> PageResult<HttpResponse> {
    let CommentForm {
        comment,
        entry,
        user,
    } = form.into_inner();
    let entry_id = EntryId::new(entry);
    let user_id = UserId::new(user);
    let mut ctx = state.context();
    let entry = state
        .blog
        .entry_by_id(&mut ctx, entry_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("no entry with id {entry_id}")))?;
    let user = state
        .blog
        .user_by_id(&mut ctx, user_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("no user with id {user_id}")))?;
    let new_comment = NewComment::new(&entry, user.email(), comment, state.clock.utc())?;

    let stored = ctx.session().await?.persist_comment(&new_comment).await?;
    ctx.close().await?;
    info!(comment_id = %stored.id(), entry_id = %entry_id, "comment added");
    Ok(see_home().finish())
}
