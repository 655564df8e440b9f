//! Per-request unit of work.
//!
//! A [`PersistenceContext`] is created by a handler and passed explicitly to
//! every persistence call made on behalf of that request. It is either
//! unbound or bound to one open [`PersistenceSession`]:
//!
//! - [`PersistenceContext::session`] binds a fresh session (beginning its
//!   transaction) on first use and hands back the bound one afterwards.
//! - [`PersistenceContext::close`] commits, releases the session even when
//!   the commit failed, unbinds, and only then reports what went wrong.
//!   Closing an unbound context does nothing.
//!
//! Dropping a bound context drops its session, which discards uncommitted
//! work.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error};

use crate::domain::ports::{PersistenceError, PersistenceSession, SessionSource};

/// Lazily bound persistence session for one request.
pub struct PersistenceContext {
    source: Arc<dyn SessionSource>,
    bound: Option<Box<dyn PersistenceSession>>,
}

impl PersistenceContext {
    /// Create an unbound context drawing sessions from `source`.
    pub fn new(source: Arc<dyn SessionSource>) -> Self {
        Self {
            source,
            bound: None,
        }
    }

    /// Whether a session is currently bound.
    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    /// Return the bound session, opening one first when unbound.
    ///
    /// # Errors
    ///
    /// Propagates the source's error when a session cannot be opened; the
    /// context stays unbound in that case.
    pub async fn session(&mut self) -> Result<&mut dyn PersistenceSession, PersistenceError> {
        let session = match self.bound.take() {
            Some(session) => session,
            None => {
                let session = self.source.open().await?;
                debug!("persistence session opened");
                session
            }
        };
        Ok(&mut **self.bound.insert(session))
    }

    /// Commit and release the bound session, if any.
    ///
    /// The context is unbound when this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - [`PersistenceError::Commit`] when only the commit failed.
    /// - [`PersistenceError::Release`] when only the release failed.
    /// - [`PersistenceError::Teardown`] when both failed.
    pub async fn close(&mut self) -> Result<(), PersistenceError> {
        let Some(mut session) = self.bound.take() else {
            return Ok(());
        };

        let committed = session.commit().await;
        let released = session.release().await;
        drop(session);

        match (committed, released) {
            (Ok(()), Ok(())) => {
                debug!("persistence session closed");
                Ok(())
            }
            (Err(commit), Ok(())) => {
                error!(error = %commit, "transaction commit failed");
                Err(PersistenceError::commit(commit.to_string()))
            }
            (Ok(()), Err(release)) => {
                error!(error = %release, "session release failed");
                Err(PersistenceError::release(release.to_string()))
            }
            (Err(commit), Err(release)) => {
                error!(
                    commit_error = %commit,
                    release_error = %release,
                    "transaction commit and session release failed"
                );
                Err(PersistenceError::teardown(
                    commit.to_string(),
                    release.to_string(),
                ))
            }
        }
    }
}

impl fmt::Debug for PersistenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceContext")
            .field("bound", &self.is_bound())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{
        Comment, Entry, EntryId, NewComment, NewEntry, NewUser, User, UserId,
    };
    use async_trait::async_trait;
    use rstest::rstest;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        opened: AtomicUsize,
        committed: AtomicUsize,
        released: AtomicUsize,
    }

    struct StubSource {
        calls: Arc<Calls>,
        commit_error: Option<PersistenceError>,
        release_error: Option<PersistenceError>,
        open_error: Mutex<Option<PersistenceError>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                calls: Arc::new(Calls::default()),
                commit_error: None,
                release_error: None,
                open_error: Mutex::new(None),
            }
        }
    }

    struct StubSession {
        calls: Arc<Calls>,
        commit_error: Option<PersistenceError>,
        release_error: Option<PersistenceError>,
    }

    #[async_trait]
    impl SessionSource for StubSource {
        async fn open(&self) -> Result<Box<dyn PersistenceSession>, PersistenceError> {
            if let Some(err) = self.open_error.lock().expect("open error lock").take() {
                return Err(err);
            }
            self.calls.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubSession {
                calls: Arc::clone(&self.calls),
                commit_error: self.commit_error.clone(),
                release_error: self.release_error.clone(),
            }))
        }
    }

    fn unused<T>() -> Result<T, PersistenceError> {
        Err(PersistenceError::query("not used by these tests"))
    }

    #[async_trait]
    impl PersistenceSession for StubSession {
        async fn list_users(&mut self) -> Result<Vec<User>, PersistenceError> {
            Ok(Vec::new())
        }
        async fn users_by_nick(&mut self, _nick: &str) -> Result<Vec<User>, PersistenceError> {
            unused()
        }
        async fn find_user(&mut self, _id: UserId) -> Result<Option<User>, PersistenceError> {
            unused()
        }
        async fn list_entries(&mut self) -> Result<Vec<Entry>, PersistenceError> {
            unused()
        }
        async fn entries_by_creator(
            &mut self,
            _creator: UserId,
        ) -> Result<Vec<Entry>, PersistenceError> {
            unused()
        }
        async fn find_entry(&mut self, _id: EntryId) -> Result<Option<Entry>, PersistenceError> {
            unused()
        }
        async fn comments_for_entry(
            &mut self,
            _entry: EntryId,
        ) -> Result<Vec<Comment>, PersistenceError> {
            unused()
        }
        async fn persist_user(&mut self, _user: &NewUser) -> Result<User, PersistenceError> {
            unused()
        }
        async fn persist_entry(&mut self, _entry: &NewEntry) -> Result<Entry, PersistenceError> {
            unused()
        }
        async fn merge_entry(&mut self, _entry: &Entry) -> Result<Entry, PersistenceError> {
            unused()
        }
        async fn persist_comment(
            &mut self,
            _comment: &NewComment,
        ) -> Result<Comment, PersistenceError> {
            unused()
        }
        async fn remove_entry(&mut self, _id: EntryId) -> Result<bool, PersistenceError> {
            unused()
        }
        async fn commit(&mut self) -> Result<(), PersistenceError> {
            self.calls.committed.fetch_add(1, Ordering::SeqCst);
            self.commit_error.clone().map_or(Ok(()), Err)
        }
        async fn release(&mut self) -> Result<(), PersistenceError> {
            self.calls.released.fetch_add(1, Ordering::SeqCst);
            self.release_error.clone().map_or(Ok(()), Err)
        }
    }

    fn context_for(source: StubSource) -> (PersistenceContext, Arc<Calls>) {
        let calls = Arc::clone(&source.calls);
        (PersistenceContext::new(Arc::new(source)), calls)
    }

    #[rstest]
    #[tokio::test]
    async fn session_is_opened_lazily_and_reused() {
        let (mut ctx, calls) = context_for(StubSource::new());
        assert!(!ctx.is_bound());
        assert_eq!(calls.opened.load(Ordering::SeqCst), 0);

        ctx.session().await.expect("open").list_users().await.expect("query");
        ctx.session().await.expect("reuse").list_users().await.expect("query");

        assert!(ctx.is_bound());
        assert_eq!(calls.opened.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn close_commits_then_releases() {
        let (mut ctx, calls) = context_for(StubSource::new());
        ctx.session().await.expect("open");
        ctx.close().await.expect("close");

        assert!(!ctx.is_bound());
        assert_eq!(calls.committed.load(Ordering::SeqCst), 1);
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn closing_twice_is_a_no_op() {
        let (mut ctx, calls) = context_for(StubSource::new());
        ctx.session().await.expect("open");
        ctx.close().await.expect("first close");
        ctx.close().await.expect("second close");

        assert_eq!(calls.committed.load(Ordering::SeqCst), 1);
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn closing_an_unbound_context_touches_nothing() {
        let (mut ctx, calls) = context_for(StubSource::new());
        ctx.close().await.expect("close");
        assert_eq!(calls.opened.load(Ordering::SeqCst), 0);
        assert_eq!(calls.committed.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[tokio::test]
    async fn session_after_close_starts_a_new_cycle() {
        let (mut ctx, calls) = context_for(StubSource::new());
        ctx.session().await.expect("open");
        ctx.close().await.expect("close");
        ctx.session().await.expect("reopen");

        assert!(ctx.is_bound());
        assert_eq!(calls.opened.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn commit_failure_still_releases_and_unbinds() {
        let mut source = StubSource::new();
        source.commit_error = Some(PersistenceError::connection("lost"));
        let (mut ctx, calls) = context_for(source);
        ctx.session().await.expect("open");

        let err = ctx.close().await.expect_err("commit fails");

        assert!(matches!(err, PersistenceError::Commit { .. }));
        assert!(err.to_string().contains("lost"));
        assert_eq!(calls.released.load(Ordering::SeqCst), 1);
        assert!(!ctx.is_bound());
    }

    #[rstest]
    #[tokio::test]
    async fn release_failure_is_reported() {
        let mut source = StubSource::new();
        source.release_error = Some(PersistenceError::connection("socket closed"));
        let (mut ctx, _calls) = context_for(source);
        ctx.session().await.expect("open");

        let err = ctx.close().await.expect_err("release fails");
        assert!(matches!(err, PersistenceError::Release { .. }));
        assert!(!ctx.is_bound());
    }

    #[rstest]
    #[tokio::test]
    async fn double_fault_keeps_both_messages() {
        let mut source = StubSource::new();
        source.commit_error = Some(PersistenceError::query("deadlock"));
        source.release_error = Some(PersistenceError::connection("socket closed"));
        let (mut ctx, _calls) = context_for(source);
        ctx.session().await.expect("open");

        let err = ctx.close().await.expect_err("both fail");
        match err {
            PersistenceError::Teardown { commit, release } => {
                assert!(commit.contains("deadlock"));
                assert!(release.contains("socket closed"));
            }
            other => panic!("expected teardown error, got {other:?}"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn open_failure_leaves_context_unbound() {
        let source = StubSource::new();
        *source.open_error.lock().expect("open error lock") =
            Some(PersistenceError::connection("refused"));
        let (mut ctx, _calls) = context_for(source);

        let err = ctx.session().await.err().expect("open fails");
        assert_eq!(err, PersistenceError::connection("refused"));
        assert!(!ctx.is_bound());
    }
}
