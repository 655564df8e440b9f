//! Process-local blog store.
//!
//! Committed state lives behind a mutex. Each session works on a private
//! snapshot taken when it opens and keeps a log of its writes; commit replays
//! the log against the latest committed state and swaps it in only when every
//! write still holds. Identifiers come from store-wide sequences, so ids
//! handed out by sessions that later roll back are never reused.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{PersistenceError, PersistenceSession, SessionSource};
use crate::domain::{
    Comment, CommentId, Entry, EntryId, NewComment, NewEntry, NewUser, User, UserId,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    entries: BTreeMap<EntryId, Entry>,
    comments: BTreeMap<CommentId, Comment>,
}

impl Tables {
    fn nick_taken(&self, nick: &str) -> bool {
        self.users.values().any(|user| user.nick() == nick)
    }

    fn remove_entry(&mut self, id: EntryId) -> bool {
        self.comments.retain(|_, comment| comment.entry_id() != id);
        self.entries.remove(&id).is_some()
    }

    fn apply(&mut self, write: &Write) -> Result<(), PersistenceError> {
        match write {
            Write::InsertUser(user) => {
                if self.nick_taken(user.nick()) {
                    return Err(nick_conflict(user.nick()));
                }
                self.users.insert(user.id(), user.clone());
            }
            Write::InsertEntry(entry) => {
                if !self.users.contains_key(&entry.creator_id()) {
                    return Err(missing_creator(entry.creator_id()));
                }
                self.entries.insert(entry.id(), entry.clone());
            }
            Write::UpdateEntry(entry) => {
                let Some(stored) = self.entries.get_mut(&entry.id()) else {
                    return Err(PersistenceError::conflict(format!(
                        "entry {} was removed concurrently",
                        entry.id()
                    )));
                };
                *stored = entry.clone();
            }
            Write::InsertComment(comment) => {
                if !self.entries.contains_key(&comment.entry_id()) {
                    return Err(missing_entry(comment.entry_id()));
                }
                self.comments.insert(comment.id(), comment.clone());
            }
            Write::RemoveEntry(id) => {
                self.remove_entry(*id);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Write {
    InsertUser(User),
    InsertEntry(Entry),
    UpdateEntry(Entry),
    InsertComment(Comment),
    RemoveEntry(EntryId),
}

#[derive(Debug)]
struct Shared {
    tables: Mutex<Tables>,
    next_user: AtomicI64,
    next_entry: AtomicI64,
    next_comment: AtomicI64,
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, PersistenceError> {
        self.tables
            .lock()
            .map_err(|_| PersistenceError::connection("in-memory store lock poisoned"))
    }
}

/// Shared handle to a process-local blog store.
///
/// Clones refer to the same data.
#[derive(Debug, Clone)]
pub struct InMemoryBlogStore {
    shared: Arc<Shared>,
}

impl Default for InMemoryBlogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBlogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: Mutex::new(Tables::default()),
                next_user: AtomicI64::new(1),
                next_entry: AtomicI64::new(1),
                next_comment: AtomicI64::new(1),
            }),
        }
    }
}

#[async_trait]
impl SessionSource for InMemoryBlogStore {
    async fn open(&self) -> Result<Box<dyn PersistenceSession>, PersistenceError> {
        let snapshot = self.shared.lock()?.clone();
        Ok(Box::new(MemorySession {
            shared: Arc::clone(&self.shared),
            working: snapshot,
            log: Vec::new(),
            released: false,
        }))
    }
}

struct MemorySession {
    shared: Arc<Shared>,
    working: Tables,
    log: Vec<Write>,
    released: bool,
}

impl MemorySession {
    fn ensure_open(&self) -> Result<(), PersistenceError> {
        if self.released {
            Err(PersistenceError::connection("session already released"))
        } else {
            Ok(())
        }
    }

    fn record(&mut self, write: Write) -> Result<(), PersistenceError> {
        self.working.apply(&write)?;
        self.log.push(write);
        Ok(())
    }
}

fn nick_conflict(nick: &str) -> PersistenceError {
    PersistenceError::conflict(format!("nickname {nick} is already registered"))
}

fn missing_creator(id: UserId) -> PersistenceError {
    PersistenceError::conflict(format!("creator {id} does not exist"))
}

fn missing_entry(id: EntryId) -> PersistenceError {
    PersistenceError::conflict(format!("entry {id} does not exist"))
}

fn sorted_entries<'a>(entries: impl Iterator<Item = &'a Entry>) -> Vec<Entry> {
    let mut entries: Vec<Entry> = entries.cloned().collect();
    entries.sort_by_key(|entry| (entry.created_at(), entry.id()));
    entries
}

#[async_trait]
impl PersistenceSession for MemorySession {
    async fn list_users(&mut self) -> Result<Vec<User>, PersistenceError> {
        self.ensure_open()?;
        Ok(self.working.users.values().cloned().collect())
    }

    async fn users_by_nick(&mut self, nick: &str) -> Result<Vec<User>, PersistenceError> {
        self.ensure_open()?;
        Ok(self
            .working
            .users
            .values()
            .filter(|user| user.nick() == nick)
            .cloned()
            .collect())
    }

    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, PersistenceError> {
        self.ensure_open()?;
        Ok(self.working.users.get(&id).cloned())
    }

    async fn list_entries(&mut self) -> Result<Vec<Entry>, PersistenceError> {
        self.ensure_open()?;
        Ok(sorted_entries(self.working.entries.values()))
    }

    async fn entries_by_creator(
        &mut self,
        creator: UserId,
    ) -> Result<Vec<Entry>, PersistenceError> {
        self.ensure_open()?;
        Ok(sorted_entries(
            self.working
                .entries
                .values()
                .filter(|entry| entry.creator_id() == creator),
        ))
    }

    async fn find_entry(&mut self, id: EntryId) -> Result<Option<Entry>, PersistenceError> {
        self.ensure_open()?;
        Ok(self.working.entries.get(&id).cloned())
    }

    async fn comments_for_entry(
        &mut self,
        entry: EntryId,
    ) -> Result<Vec<Comment>, PersistenceError> {
        self.ensure_open()?;
        let mut comments: Vec<Comment> = self
            .working
            .comments
            .values()
            .filter(|comment| comment.entry_id() == entry)
            .cloned()
            .collect();
        comments.sort_by_key(|comment| (comment.posted_on(), comment.id()));
        Ok(comments)
    }

    async fn persist_user(&mut self, user: &NewUser) -> Result<User, PersistenceError> {
        self.ensure_open()?;
        if self.working.nick_taken(user.nick()) {
            return Err(nick_conflict(user.nick()));
        }
        let id = UserId::new(self.shared.next_user.fetch_add(1, Ordering::Relaxed));
        let stored = user.clone().into_user(id);
        self.record(Write::InsertUser(stored.clone()))?;
        Ok(stored)
    }

    async fn persist_entry(&mut self, entry: &NewEntry) -> Result<Entry, PersistenceError> {
        self.ensure_open()?;
        if !self.working.users.contains_key(&entry.creator_id()) {
            return Err(missing_creator(entry.creator_id()));
        }
        let id = EntryId::new(self.shared.next_entry.fetch_add(1, Ordering::Relaxed));
        let stored = entry.clone().into_entry(id);
        self.record(Write::InsertEntry(stored.clone()))?;
        Ok(stored)
    }

    async fn merge_entry(&mut self, entry: &Entry) -> Result<Entry, PersistenceError> {
        self.ensure_open()?;
        if !self.working.entries.contains_key(&entry.id()) {
            return Err(PersistenceError::query(format!(
                "entry {} not found",
                entry.id()
            )));
        }
        self.record(Write::UpdateEntry(entry.clone()))?;
        Ok(entry.clone())
    }

    async fn persist_comment(
        &mut self,
        comment: &NewComment,
    ) -> Result<Comment, PersistenceError> {
        self.ensure_open()?;
        if !self.working.entries.contains_key(&comment.entry_id()) {
            return Err(missing_entry(comment.entry_id()));
        }
        let id = CommentId::new(self.shared.next_comment.fetch_add(1, Ordering::Relaxed));
        let stored = comment.clone().into_comment(id);
        self.record(Write::InsertComment(stored.clone()))?;
        Ok(stored)
    }

    async fn remove_entry(&mut self, id: EntryId) -> Result<bool, PersistenceError> {
        self.ensure_open()?;
        let existed = self.working.entries.contains_key(&id);
        self.record(Write::RemoveEntry(id))?;
        Ok(existed)
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        self.ensure_open()?;
        let mut committed = self.shared.lock()?;
        let mut staged = committed.clone();
        for write in &self.log {
            staged.apply(write)?;
        }
        *committed = staged;
        debug!(writes = self.log.len(), "in-memory transaction committed");
        self.log.clear();
        Ok(())
    }

    async fn release(&mut self) -> Result<(), PersistenceError> {
        self.ensure_open()?;
        if !self.log.is_empty() {
            debug!(writes = self.log.len(), "in-memory transaction rolled back");
        }
        self.log.clear();
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> InMemoryBlogStore {
        InMemoryBlogStore::new()
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    fn new_user(nick: &str) -> NewUser {
        NewUser::new("First", "Last", nick, format!("{nick}@example.com"), "pw")
            .expect("valid user")
    }

    async fn committed_user(store: &InMemoryBlogStore, nick: &str) -> User {
        let mut session = store.open().await.expect("open");
        let user = session.persist_user(&new_user(nick)).await.expect("persist");
        session.commit().await.expect("commit");
        session.release().await.expect("release");
        user
    }

    #[rstest]
    #[tokio::test]
    async fn writes_are_invisible_to_others_until_commit(store: InMemoryBlogStore) {
        let mut writer = store.open().await.expect("open writer");
        writer.persist_user(&new_user("alice")).await.expect("persist");
        assert_eq!(writer.list_users().await.expect("own read").len(), 1);

        let mut reader = store.open().await.expect("open reader");
        assert!(reader.list_users().await.expect("read").is_empty());

        writer.commit().await.expect("commit");
        let mut later = store.open().await.expect("open later");
        assert_eq!(later.users_by_nick("alice").await.expect("read").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn release_without_commit_discards_writes(store: InMemoryBlogStore) {
        let mut session = store.open().await.expect("open");
        session.persist_user(&new_user("ghost")).await.expect("persist");
        session.release().await.expect("release");

        let mut reader = store.open().await.expect("open reader");
        assert!(reader.list_users().await.expect("read").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn released_sessions_reject_further_use(store: InMemoryBlogStore) {
        let mut session = store.open().await.expect("open");
        session.release().await.expect("release");
        let err = session.list_users().await.expect_err("released");
        assert!(matches!(err, PersistenceError::Connection { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_nickname_conflicts_within_a_session(store: InMemoryBlogStore) {
        committed_user(&store, "bob").await;
        let mut session = store.open().await.expect("open");
        let err = session
            .persist_user(&new_user("bob"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, PersistenceError::Conflict { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_registrations_of_one_nickname_conflict_at_commit(
        store: InMemoryBlogStore,
    ) {
        let mut first = store.open().await.expect("open first");
        let mut second = store.open().await.expect("open second");
        first.persist_user(&new_user("carol")).await.expect("persist first");
        second.persist_user(&new_user("carol")).await.expect("persist second");

        first.commit().await.expect("first commit wins");
        let err = second.commit().await.expect_err("second commit conflicts");
        assert!(matches!(err, PersistenceError::Conflict { .. }));

        let mut reader = store.open().await.expect("open reader");
        assert_eq!(reader.users_by_nick("carol").await.expect("read").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn entries_and_comments_are_ordered_by_time(store: InMemoryBlogStore) {
        let bob = committed_user(&store, "bob").await;
        let mut session = store.open().await.expect("open");
        let late = session
            .persist_entry(&NewEntry::new(&bob, "late", "", at(30)).expect("entry"))
            .await
            .expect("persist late");
        let early = session
            .persist_entry(&NewEntry::new(&bob, "early", "", at(5)).expect("entry"))
            .await
            .expect("persist early");
        for (minute, text) in [(40, "second"), (35, "first")] {
            let comment = NewComment::new(&late, "x@y.com", text, at(minute)).expect("comment");
            session.persist_comment(&comment).await.expect("persist comment");
        }

        let titles: Vec<String> = session
            .entries_by_creator(bob.id())
            .await
            .expect("entries")
            .iter()
            .map(|entry| entry.title().to_owned())
            .collect();
        assert_eq!(titles, ["early", "late"]);
        assert_eq!(session.list_entries().await.expect("all").first(), Some(&early));

        let messages: Vec<String> = session
            .comments_for_entry(late.id())
            .await
            .expect("comments")
            .iter()
            .map(|comment| comment.message().to_owned())
            .collect();
        assert_eq!(messages, ["first", "second"]);
    }

    #[rstest]
    #[tokio::test]
    async fn merge_overwrites_committed_entry(store: InMemoryBlogStore) {
        let bob = committed_user(&store, "bob").await;
        let mut session = store.open().await.expect("open");
        let mut entry = session
            .persist_entry(&NewEntry::blank(&bob, at(0)))
            .await
            .expect("persist");
        session.commit().await.expect("commit");

        entry.edit("Edited", "Body", at(9)).expect("edit");
        let mut editor = store.open().await.expect("open editor");
        editor.merge_entry(&entry).await.expect("merge");
        editor.commit().await.expect("commit");

        let mut reader = store.open().await.expect("open reader");
        let stored = reader
            .find_entry(entry.id())
            .await
            .expect("read")
            .expect("entry exists");
        assert_eq!(stored.title(), "Edited");
        assert_eq!(stored.text(), "Body");
        assert_eq!(stored.last_modified_at(), at(9));
    }

    #[rstest]
    #[tokio::test]
    async fn removing_an_entry_removes_its_comments(store: InMemoryBlogStore) {
        let bob = committed_user(&store, "bob").await;
        let mut session = store.open().await.expect("open");
        let entry = session
            .persist_entry(&NewEntry::blank(&bob, at(0)))
            .await
            .expect("persist");
        let comment = NewComment::new(&entry, "x@y.com", "hi", at(1)).expect("comment");
        session.persist_comment(&comment).await.expect("comment");
        session.commit().await.expect("commit");

        let mut remover = store.open().await.expect("open remover");
        assert!(remover.remove_entry(entry.id()).await.expect("remove"));
        assert!(!remover.remove_entry(entry.id()).await.expect("remove again"));
        remover.commit().await.expect("commit");

        let mut reader = store.open().await.expect("open reader");
        assert!(reader.find_entry(entry.id()).await.expect("read").is_none());
        assert!(reader
            .comments_for_entry(entry.id())
            .await
            .expect("read")
            .is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn comments_require_an_existing_entry(store: InMemoryBlogStore) {
        let bob = committed_user(&store, "bob").await;
        let orphan = NewEntry::blank(&bob, at(0)).into_entry(EntryId::new(404));
        let comment = NewComment::new(&orphan, "x@y.com", "hi", at(1)).expect("comment");
        let mut session = store.open().await.expect("open");
        let err = session.persist_comment(&comment).await.expect_err("no entry");
        assert!(matches!(err, PersistenceError::Conflict { .. }));
    }
}
