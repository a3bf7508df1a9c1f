// 🔄 Follow Session - Orchestrates decode → normalize → reconcile → persist
//
// Owns the in-memory result and the injected store. The normalizer and
// reconciliation engine stay pure; every side effect happens here.

use crate::db::{compute_fingerprint, FollowStore, StoredData};
use crate::error::{AnalysisError, InputFile};
use crate::model::FollowData;
use crate::parser::{decode_payload, normalize, Role};
use crate::reconciliation::ReconciliationEngine;
use crate::remote::{RemoteFetcher, RemoteResponse, SessionCredential};
use tracing::{info, warn};

pub struct FollowSession<S: FollowStore> {
    store: S,
    engine: ReconciliationEngine,
    data: Option<FollowData>,
    fingerprint: Option<String>,
}

impl<S: FollowStore> FollowSession<S> {
    /// Start a session, restoring the last saved analysis if any
    ///
    /// A store that fails to load is logged and treated as empty.
    pub fn open(store: S) -> Self {
        let engine = ReconciliationEngine::new();

        let stored = match store.load() {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "failed to load stored analysis, starting empty");
                None
            }
        };

        let fingerprint = stored.as_ref().and_then(|s| s.fingerprint.clone());
        let data = stored.map(|s| restore(&engine, s));
        if let Some(d) = &data {
            info!(
                followers = d.followers.len(),
                following = d.following.len(),
                "restored stored analysis"
            );
        }

        FollowSession {
            store,
            engine,
            data,
            fingerprint,
        }
    }

    pub fn data(&self) -> Option<&FollowData> {
        self.data.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether these raw exports are the ones the current analysis came from
    pub fn is_unchanged(&self, followers_raw: &str, following_raw: &str) -> bool {
        self.data.is_some()
            && self.fingerprint.as_deref()
                == Some(compute_fingerprint(followers_raw, following_raw).as_str())
    }

    /// Analyze two raw export files and replace the current result
    pub fn process_files(
        &mut self,
        followers_raw: Option<&str>,
        following_raw: Option<&str>,
    ) -> Result<&FollowData, AnalysisError> {
        let (followers_raw, following_raw) = match (followers_raw, following_raw) {
            (Some(f), Some(g)) => (f, g),
            _ => return Err(AnalysisError::MissingInput),
        };

        let followers_json = decode_payload(followers_raw, InputFile::Followers)?;
        let following_json = decode_payload(following_raw, InputFile::Following)?;

        let followers = normalize(&followers_json, Role::Followers);
        let following = normalize(&following_json, Role::Following);

        let data = self.engine.analyze(following, followers)?;
        let fingerprint = compute_fingerprint(followers_raw, following_raw);

        let snapshot = StoredData::new(data.followers.clone(), data.following.clone())
            .with_fingerprint(fingerprint.clone());
        self.persist(&snapshot)?;

        let summary = data.summary();
        info!(
            followers = summary.followers,
            following = summary.following,
            not_mutual = summary.not_mutual,
            not_following = summary.not_following,
            mutuals = summary.mutuals,
            "analysis complete"
        );

        self.fingerprint = Some(fingerprint);
        Ok(&*self.data.insert(data))
    }

    /// Adopt a remote service's result without local reconciliation
    pub fn accept_remote(&mut self, response: RemoteResponse) -> Result<&FollowData, AnalysisError> {
        let data = response.into_follow_data()?;

        let snapshot = StoredData::new(data.followers.clone(), data.following.clone())
            .with_remote_lists(
                data.not_mutual.clone(),
                data.not_following.clone(),
                data.mutuals.clone(),
            )
            .with_username(data.username.clone());
        self.persist(&snapshot)?;

        info!(
            username = data.username.as_deref().unwrap_or("-"),
            followers = data.followers.len(),
            following = data.following.len(),
            "remote analysis accepted"
        );

        self.fingerprint = None;
        Ok(&*self.data.insert(data))
    }

    pub fn fetch_remote(
        &mut self,
        fetcher: &dyn RemoteFetcher,
        credential: &SessionCredential,
    ) -> Result<&FollowData, AnalysisError> {
        let response = fetcher.fetch(credential)?;
        self.accept_remote(response)
    }

    /// Drop the current analysis and its stored copy
    ///
    /// Memory is only cleared once the store has been cleared.
    pub fn reset(&mut self) -> Result<(), AnalysisError> {
        self.store
            .clear()
            .map_err(|e| AnalysisError::Storage(e.to_string()))?;
        self.data = None;
        self.fingerprint = None;
        info!("analysis reset");
        Ok(())
    }

    fn persist(&self, snapshot: &StoredData) -> Result<(), AnalysisError> {
        self.store
            .save(snapshot)
            .map_err(|e| AnalysisError::Storage(e.to_string()))
    }
}

/// Rebuild the full result from a stored snapshot
fn restore(engine: &ReconciliationEngine, stored: StoredData) -> FollowData {
    let partitions = engine.reconcile(&stored.following, &stored.followers);

    FollowData {
        username: stored.username,
        not_mutual: stored.not_mutual.unwrap_or(partitions.not_mutual),
        not_following: stored.not_following.unwrap_or(partitions.not_following),
        mutuals: stored.mutuals.unwrap_or(partitions.mutuals),
        followers: stored.followers,
        following: stored.following,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, SqliteStore};
    use crate::model::User;
    use crate::remote::RemoteUser;

    const FOLLOWERS: &str = r#"[
        {"string_list_data": [{"value": "bob", "href": "https://x/bob", "timestamp": 100}]},
        {"string_list_data": [{"value": "dave"}]}
    ]"#;

    const FOLLOWING: &str = r#"{"relationships_following": [
        {"string_list_data": [{"value": "alice"}]},
        {"string_list_data": [{"value": "Bob"}]},
        {"string_list_data": [{"value": "carol"}]}
    ]}"#;

    fn names(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.username.as_str()).collect()
    }

    struct FailingStore;

    impl FollowStore for FailingStore {
        fn load(&self) -> anyhow::Result<Option<StoredData>> {
            Err(anyhow::anyhow!("corrupt cache"))
        }
        fn save(&self, _data: &StoredData) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("read-only"))
        }
        fn clear(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Saves and loads normally, refuses to clear
    #[derive(Default)]
    struct StickyStore(MemoryStore);

    impl FollowStore for StickyStore {
        fn load(&self) -> anyhow::Result<Option<StoredData>> {
            self.0.load()
        }
        fn save(&self, data: &StoredData) -> anyhow::Result<()> {
            self.0.save(data)
        }
        fn clear(&self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("database is locked"))
        }
    }

    struct StubFetcher(RemoteResponse);

    impl RemoteFetcher for StubFetcher {
        fn fetch(&self, _credential: &SessionCredential) -> Result<RemoteResponse, AnalysisError> {
            Ok(self.0.clone())
        }
    }

    struct DownFetcher;

    impl RemoteFetcher for DownFetcher {
        fn fetch(&self, _credential: &SessionCredential) -> Result<RemoteResponse, AnalysisError> {
            Err(AnalysisError::RemoteFetchFailed("connection refused".to_string()))
        }
    }

    #[test]
    fn test_process_files_end_to_end() {
        let mut session = FollowSession::open(MemoryStore::new());
        assert!(session.data().is_none());

        let data = session.process_files(Some(FOLLOWERS), Some(FOLLOWING)).unwrap();

        assert_eq!(names(&data.not_mutual), vec!["alice", "carol"]);
        assert_eq!(names(&data.not_following), vec!["dave"]);
        assert_eq!(names(&data.mutuals), vec!["Bob"]);
        assert_eq!(data.followers[0].profile_url.as_deref(), Some("https://x/bob"));

        let stored = session.store().load().unwrap().unwrap();
        assert_eq!(stored.following.len(), 3);
        assert!(stored.not_following.is_none());
        assert!(stored.fingerprint.is_some());
    }

    #[test]
    fn test_missing_input() {
        let mut session = FollowSession::open(MemoryStore::new());

        let err = session.process_files(Some(FOLLOWERS), None).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput));

        let err = session.process_files(None, None).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput));
    }

    #[test]
    fn test_unparseable_content_names_file() {
        let mut session = FollowSession::open(MemoryStore::new());

        let err = session.process_files(Some(FOLLOWERS), Some("not json")).unwrap_err();

        assert!(matches!(
            err,
            AnalysisError::UnparseableContent { file: InputFile::Following, .. }
        ));
        assert!(session.data().is_none());
    }

    #[test]
    fn test_unrecognized_shapes_are_invalid_format() {
        let mut session = FollowSession::open(MemoryStore::new());

        let err = session.process_files(Some("{}"), Some("42")).unwrap_err();

        assert!(matches!(err, AnalysisError::InvalidFormat));
        assert!(session.store().load().unwrap().is_none());
    }

    #[test]
    fn test_failed_analysis_keeps_previous_result() {
        let mut session = FollowSession::open(MemoryStore::new());
        session.process_files(Some(FOLLOWERS), Some(FOLLOWING)).unwrap();

        assert!(session.process_files(Some("[]"), Some("[]")).is_err());

        assert_eq!(session.data().unwrap().following.len(), 3);
    }

    #[test]
    fn test_reopen_restores_partitions() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut session = FollowSession::open(store);
        let original = session
            .process_files(Some(FOLLOWERS), Some(FOLLOWING))
            .unwrap()
            .clone();

        let reopened = FollowSession::open(session.store);
        let restored = reopened.data().unwrap();

        assert_eq!(restored, &original);
    }

    #[test]
    fn test_is_unchanged() {
        let mut session = FollowSession::open(MemoryStore::new());
        assert!(!session.is_unchanged(FOLLOWERS, FOLLOWING));

        session.process_files(Some(FOLLOWERS), Some(FOLLOWING)).unwrap();

        assert!(session.is_unchanged(FOLLOWERS, FOLLOWING));
        assert!(!session.is_unchanged(FOLLOWING, FOLLOWERS));
    }

    #[test]
    fn test_reset_clears_memory_and_store() {
        let mut session = FollowSession::open(MemoryStore::new());
        session.process_files(Some(FOLLOWERS), Some(FOLLOWING)).unwrap();

        session.reset().unwrap();

        assert!(session.data().is_none());
        assert!(session.store().load().unwrap().is_none());
        assert!(!session.is_unchanged(FOLLOWERS, FOLLOWING));
    }

    #[test]
    fn test_failed_reset_keeps_analysis() {
        let mut session = FollowSession::open(StickyStore::default());
        session.process_files(Some(FOLLOWERS), Some(FOLLOWING)).unwrap();

        let err = session.reset().unwrap_err();
        assert!(matches!(err, AnalysisError::Storage(_)));

        // Memory still matches the store
        assert!(session.data().is_some());
        assert!(session.is_unchanged(FOLLOWERS, FOLLOWING));
        assert!(session.store().load().unwrap().is_some());

        let reopened = FollowSession::open(session.store);
        assert_eq!(reopened.data().unwrap().following.len(), 3);
    }

    #[test]
    fn test_failing_store() {
        // Load failure is tolerated
        let mut session = FollowSession::open(FailingStore);
        assert!(session.data().is_none());

        // Save failure is reported
        let err = session.process_files(Some(FOLLOWERS), Some(FOLLOWING)).unwrap_err();
        assert!(matches!(err, AnalysisError::Storage(_)));
        assert_eq!(err.code(), "storageError");
    }

    #[test]
    fn test_remote_path_persists_trusted_lists() {
        let response = RemoteResponse {
            status: "success".to_string(),
            username: Some("me".to_string()),
            followers: vec![RemoteUser { username: "x".into(), ..Default::default() }],
            following: vec![RemoteUser { username: "y".into(), ..Default::default() }],
            not_followed_back: vec![RemoteUser { username: "y".into(), ..Default::default() }],
            not_following: vec![RemoteUser { username: "x".into(), ..Default::default() }],
            // Remote says "y" is mutual even though local rules would disagree
            mutuals: vec![RemoteUser { username: "y".into(), ..Default::default() }],
            ..Default::default()
        };

        let mut session = FollowSession::open(MemoryStore::new());
        let credential = SessionCredential::new("token").unwrap();
        session.fetch_remote(&StubFetcher(response), &credential).unwrap();

        let stored = session.store().load().unwrap().unwrap();
        assert_eq!(stored.mutuals, Some(vec![User::new("y")]));
        assert_eq!(stored.username.as_deref(), Some("me"));

        // Restored session trusts every stored remote list
        let reopened = FollowSession::open(session.store);
        let data = reopened.data().unwrap();
        assert_eq!(data.mutuals, vec![User::new("y")]);
        assert_eq!(data.not_mutual, vec![User::new("y")]);
        assert_eq!(data.username.as_deref(), Some("me"));
    }

    #[test]
    fn test_remote_not_mutual_survives_reopen() {
        let user = |name: &str| RemoteUser { username: name.into(), ..Default::default() };
        // Local rules would put "y" in not_mutual; the remote says nobody is
        let response = RemoteResponse {
            status: "success".to_string(),
            followers: vec![user("x")],
            following: vec![user("x"), user("y")],
            not_followed_back: vec![],
            mutuals: vec![user("x")],
            ..Default::default()
        };

        let mut session = FollowSession::open(MemoryStore::new());
        let before = session.accept_remote(response).unwrap().clone();
        assert!(before.not_mutual.is_empty());

        let stored = session.store().load().unwrap().unwrap();
        assert_eq!(stored.not_mutual, Some(vec![]));

        let reopened = FollowSession::open(session.store);
        assert_eq!(reopened.data().unwrap(), &before);
    }

    #[test]
    fn test_local_snapshot_recomputes_not_mutual() {
        let mut session = FollowSession::open(MemoryStore::new());
        session.process_files(Some(FOLLOWERS), Some(FOLLOWING)).unwrap();

        let stored = session.store().load().unwrap().unwrap();
        assert!(stored.not_mutual.is_none());
    }

    #[test]
    fn test_remote_failure_surfaces_as_is() {
        let mut session = FollowSession::open(MemoryStore::new());
        let credential = SessionCredential::new("token").unwrap();

        let err = session.fetch_remote(&DownFetcher, &credential).unwrap_err();

        assert_eq!(err.to_string(), "remote fetch failed: connection refused");
        assert!(session.data().is_none());
    }
}
