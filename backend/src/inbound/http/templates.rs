//! Server-rendered HTML pages.
//!
//! Every dynamic value passes through [`escape`] before it reaches markup;
//! nicknames placed in link paths go through [`path_segment`] first.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::domain::{Comment, Entry, User};

use super::identity::Visitor;

/// Escape text for inclusion in element content or a quoted attribute.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Percent-encode `raw` for use as a single URL path segment.
pub fn path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

/// Href of an author's blog, optionally followed by a sub-path.
fn author_href(author: &User, rest: &str) -> String {
    escape(&format!("/author/{}{rest}", path_segment(author.nick())))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n",
            "<title>{title}</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
        ),
        title = escape(title),
        body = body,
    )
}

fn visitor_banner(visitor: &Visitor) -> String {
    if visitor.is_identified() {
        format!(
            concat!(
                "<p>Logged in as {name}</p>\n",
                "<form method=\"post\" action=\"/logout\">",
                "<button type=\"submit\">Logout</button></form>\n"
            ),
            name = escape(&visitor.display_name()),
        )
    } else {
        "<p>Not logged in</p>\n".to_owned()
    }
}

/// Home page data.
pub struct HomePage<'a> {
    pub users: &'a [User],
    pub visitor: &'a Visitor,
    pub login_failed: bool,
}

/// Render the user list with the login and registration forms.
pub fn home(page: &HomePage<'_>) -> String {
    let mut body = String::from("<h1>Blogs</h1>\n");
    body.push_str(&visitor_banner(page.visitor));
    if !page.visitor.is_identified() {
        if page.login_failed {
            body.push_str("<p class=\"error\">Invalid username or password.</p>\n");
        }
        body.push_str(concat!(
            "<form method=\"post\" action=\"/login\">\n",
            "<input name=\"username\" placeholder=\"Username\">\n",
            "<input name=\"password\" type=\"password\" placeholder=\"Password\">\n",
            "<button type=\"submit\">Login</button>\n</form>\n",
        ));
    }
    body.push_str("<ul>\n");
    for user in page.users {
        body.push_str(&format!(
            "<li><a href=\"{href}\">{nick}</a> ({first} {last})</li>\n",
            href = author_href(user, ""),
            nick = escape(user.nick()),
            first = escape(user.first_name()),
            last = escape(user.last_name()),
        ));
    }
    body.push_str("</ul>\n");
    body.push_str(concat!(
        "<h2>Register</h2>\n<form method=\"post\" action=\"/register\">\n",
        "<input name=\"firstname\" placeholder=\"First name\">\n",
        "<input name=\"lastname\" placeholder=\"Last name\">\n",
        "<input name=\"username\" placeholder=\"Username\">\n",
        "<input name=\"email\" placeholder=\"Email\">\n",
        "<input name=\"password\" type=\"password\" placeholder=\"Password\">\n",
        "<button type=\"submit\">Register</button>\n</form>\n",
    ));
    layout("Blogs", &body)
}

/// Entries page data; one item per entry with its comments.
pub struct EntriesPage<'a> {
    pub author: &'a User,
    pub entries: &'a [(Entry, Vec<Comment>)],
    pub visitor: &'a Visitor,
    pub can_edit: bool,
}

fn render_comment(out: &mut String, comment: &Comment) {
    out.push_str(&format!(
        "<li><em>{email}</em> ({posted}): {message}</li>\n",
        email = escape(comment.users_email()),
        posted = comment.posted_on().format("%Y-%m-%d %H:%M"),
        message = escape(comment.message()),
    ));
}

fn render_entry(out: &mut String, page: &EntriesPage<'_>, entry: &Entry, comments: &[Comment]) {
    out.push_str(&format!(
        concat!(
            "<article>\n<h2><a href=\"{href}\">{title}</a></h2>\n",
            "<p>{text}</p>\n<p><small>Created {created}, last modified {modified}</small></p>\n"
        ),
        href = author_href(page.author, &format!("/{}", entry.id())),
        title = escape(entry.title()),
        text = escape(entry.text()),
        created = entry.created_at().format("%Y-%m-%d %H:%M"),
        modified = entry.last_modified_at().format("%Y-%m-%d %H:%M"),
    ));
    if page.can_edit {
        out.push_str(&format!(
            "<p><a href=\"{href}\">Edit</a></p>\n",
            href = author_href(page.author, &format!("/edit?entry={}", entry.id())),
        ));
    }
    out.push_str("<ul class=\"comments\">\n");
    for comment in comments {
        render_comment(out, comment);
    }
    out.push_str("</ul>\n");
    if let Some(user_id) = &page.visitor.id {
        out.push_str(&format!(
            concat!(
                "<form method=\"post\" action=\"/addComment\">\n",
                "<textarea name=\"comment\"></textarea>\n",
                "<input type=\"hidden\" name=\"entry\" value=\"{entry}\">\n",
                "<input type=\"hidden\" name=\"user\" value=\"{user}\">\n",
                "<button type=\"submit\">Comment</button>\n</form>\n"
            ),
            entry = entry.id(),
            user = escape(user_id),
        ));
    }
    out.push_str("</article>\n");
}

/// Render an author's entries, each with its comments.
pub fn entries(page: &EntriesPage<'_>) -> String {
    let nick = escape(page.author.nick());
    let mut body = format!("<h1>Blog of {nick}</h1>\n");
    body.push_str(&visitor_banner(page.visitor));
    if page.can_edit {
        body.push_str(&format!(
            "<p><a href=\"{}\">New entry</a></p>\n",
            author_href(page.author, "/new")
        ));
    }
    if page.entries.is_empty() {
        body.push_str("<p>No entries yet.</p>\n");
    }
    for (entry, comments) in page.entries {
        render_entry(&mut body, page, entry, comments);
    }
    body.push_str("<p><a href=\"/\">Home</a></p>\n");
    layout(page.author.nick(), &body)
}

/// Render the edit form for `entry`.
pub fn edit_form(author: &User, entry: &Entry) -> String {
    let body = format!(
        concat!(
            "<h1>Edit entry</h1>\n",
            "<form method=\"post\" action=\"/edit\">\n",
            "<input name=\"title\" value=\"{title}\">\n",
            "<textarea name=\"text\">{text}</textarea>\n",
            "<input type=\"hidden\" name=\"entry\" value=\"{id}\">\n",
            "<button type=\"submit\">Save</button>\n</form>\n",
            "<p><a href=\"{back}\">Back</a></p>\n"
        ),
        title = escape(entry.title()),
        text = escape(entry.text()),
        id = entry.id(),
        back = author_href(author, ""),
    );
    layout("Edit entry", &body)
}

/// Render an error page.
pub fn error_page(status: u16, message: &str, trace_id: Option<&str>) -> String {
    let mut body = format!("<h1>Error {status}</h1>\n<p>{}</p>\n", escape(message));
    if let Some(id) = trace_id {
        body.push_str(&format!("<p><small>Trace id: {}</small></p>\n", escape(id)));
    }
    body.push_str("<p><a href=\"/\">Home</a></p>\n");
    layout("Error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommentId, EntryId, EntryParts, PasswordDigest, UserId};
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn author() -> User {
        User::restore(
            UserId::new(1),
            "Bob",
            "Builder",
            "bob",
            "bob@example.com",
            PasswordDigest::from_plaintext("secret"),
        )
        .expect("fixture user")
    }

    #[fixture]
    fn entry() -> Entry {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).single().expect("valid time");
        Entry::restore(EntryParts {
            id: EntryId::new(3),
            creator_id: UserId::new(1),
            title: "<b>Hi</b>".to_owned(),
            text: "body".to_owned(),
            created_at: at,
            last_modified_at: at,
        })
        .expect("fixture entry")
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("<script>", "&lt;script&gt;")]
    #[case("a & \"b\" 'c'", "a &amp; &quot;b&quot; &#39;c&#39;")]
    fn escapes_markup(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(escape(raw), expected);
    }

    #[rstest]
    #[case("bob", "bob")]
    #[case("a/b", "a%2Fb")]
    #[case("q?x#y", "q%3Fx%23y")]
    #[case("50% off", "50%25%20off")]
    #[case("čađ", "%C4%8Da%C4%91")]
    fn path_segments_are_percent_encoded(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(path_segment(raw), expected);
    }

    #[rstest]
    fn author_links_encode_nicknames(entry: Entry) {
        let author = User::restore(
            UserId::new(1),
            "Odd",
            "Nick",
            "a/b?c",
            "odd@example.com",
            PasswordDigest::from_plaintext("secret"),
        )
        .expect("fixture user");
        let visitor = Visitor::default();
        let home_html = home(&HomePage {
            users: std::slice::from_ref(&author),
            visitor: &visitor,
            login_failed: false,
        });
        assert!(home_html.contains("href=\"/author/a%2Fb%3Fc\""));

        let items = vec![(entry, Vec::new())];
        let html = entries(&EntriesPage {
            author: &author,
            entries: &items,
            visitor: &visitor,
            can_edit: true,
        });
        assert!(html.contains("href=\"/author/a%2Fb%3Fc/3\""));
        assert!(html.contains("href=\"/author/a%2Fb%3Fc/edit?entry=3\""));
        assert!(html.contains("href=\"/author/a%2Fb%3Fc/new\""));
    }

    #[rstest]
    fn home_shows_login_failure_notice(author: User) {
        let visitor = Visitor::default();
        let html = home(&HomePage {
            users: std::slice::from_ref(&author),
            visitor: &visitor,
            login_failed: true,
        });
        assert!(html.contains("Invalid username or password."));
        assert!(html.contains("href=\"/author/bob\""));
        assert!(html.contains("action=\"/register\""));
    }

    #[rstest]
    fn entries_escape_titles_and_offer_comment_form(author: User, entry: Entry) {
        let visitor = Visitor {
            id: Some("9".to_owned()),
            ..Visitor::default()
        };
        let comment = Comment::restore(
            CommentId::new(1),
            entry.id(),
            "x@y.com",
            "hi",
            entry.created_at(),
        )
        .expect("fixture comment");
        let items = vec![(entry, vec![comment])];
        let html = entries(&EntriesPage {
            author: &author,
            entries: &items,
            visitor: &visitor,
            can_edit: false,
        });
        assert!(html.contains("&lt;b&gt;Hi&lt;/b&gt;"));
        assert!(html.contains("x@y.com"));
        assert!(html.contains("name=\"user\" value=\"9\""));
        assert!(!html.contains("/new"));
    }

    #[rstest]
    fn edit_form_posts_entry_id(author: User, entry: Entry) {
        let html = edit_form(&author, &entry);
        assert!(html.contains("action=\"/edit\""));
        assert!(html.contains("name=\"entry\" value=\"3\""));
    }

    #[rstest]
    fn error_page_includes_trace_id() {
        let html = error_page(404, "entry not found", Some("abc"));
        assert!(html.contains("Error 404"));
        assert!(html.contains("Trace id: abc"));
    }
}
