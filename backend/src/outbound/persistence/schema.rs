//! Diesel table definitions for the blog schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Registered users. `nick` carries a unique constraint.
    blog_users (id) {
        id -> Int8,
        first_name -> Varchar,
        last_name -> Varchar,
        nick -> Varchar,
        email -> Varchar,
        /// Lowercase hex SHA-1 of the password.
        password_hash -> Varchar,
    }
}

diesel::table! {
    /// Blog entries; each row belongs to one user.
    blog_entries (id) {
        id -> Int8,
        creator_id -> Int8,
        title -> Varchar,
        body -> Varchar,
        created_at -> Timestamptz,
        last_modified_at -> Timestamptz,
    }
}

diesel::table! {
    /// Comments; each row belongs to one entry.
    blog_comments (id) {
        id -> Int8,
        entry_id -> Int8,
        users_email -> Varchar,
        message -> Varchar,
        posted_on -> Timestamptz,
    }
}

diesel::joinable!(blog_entries -> blog_users (creator_id));
diesel::joinable!(blog_comments -> blog_entries (entry_id));

diesel::allow_tables_to_appear_in_same_query!(blog_users, blog_entries, blog_comments);
