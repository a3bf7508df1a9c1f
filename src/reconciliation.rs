// ⚖️ Reconciliation Engine - Split two follow lists into relationship sets
//
// Join key: lowercased username.
//   not_mutual    = following − followers   (following order)
//   not_following = followers − following   (followers order)
//   mutuals       = following ∩ followers   (following order)

use crate::error::AnalysisError;
use crate::model::{FollowData, User};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// PARTITIONS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partitions {
    /// Following but not followed back
    pub not_mutual: Vec<User>,

    /// Followers not followed back
    pub not_following: Vec<User>,

    /// In both lists, taken from the following side
    pub mutuals: Vec<User>,
}

impl Partitions {
    /// Combine with the two source lists into the full result
    pub fn into_follow_data(self, following: Vec<User>, followers: Vec<User>) -> FollowData {
        FollowData {
            username: None,
            followers,
            following,
            not_mutual: self.not_mutual,
            not_following: self.not_following,
            mutuals: self.mutuals,
        }
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine
    }

    /// Partition `following` and `followers` by case-insensitive username
    ///
    /// Duplicates are kept: a username listed twice in `following` shows up
    /// twice in whichever set it lands in.
    pub fn reconcile(&self, following: &[User], followers: &[User]) -> Partitions {
        let follower_keys = username_set(followers);
        let following_keys = username_set(following);

        let (mutuals, not_mutual): (Vec<User>, Vec<User>) = following
            .iter()
            .cloned()
            .partition(|u| follower_keys.contains(&u.normalized_username()));

        let not_following = followers
            .iter()
            .filter(|u| !following_keys.contains(&u.normalized_username()))
            .cloned()
            .collect();

        Partitions {
            not_mutual,
            not_following,
            mutuals,
        }
    }

    /// Reconcile two normalized sequences into a `FollowData`
    ///
    /// Both lists empty means neither export had a recognizable shape, which
    /// is reported as `InvalidFormat` instead of an empty account.
    pub fn analyze(
        &self,
        following: Vec<User>,
        followers: Vec<User>,
    ) -> Result<FollowData, AnalysisError> {
        if following.is_empty() && followers.is_empty() {
            return Err(AnalysisError::InvalidFormat);
        }

        let partitions = self.reconcile(&following, &followers);
        Ok(partitions.into_follow_data(following, followers))
    }

    /// Following entries with no counterpart among followers
    pub fn find_not_mutual(&self, following: &[User], followers: &[User]) -> Vec<User> {
        let follower_keys = username_set(followers);
        following
            .iter()
            .filter(|u| !follower_keys.contains(&u.normalized_username()))
            .cloned()
            .collect()
    }
}

fn username_set(users: &[User]) -> HashSet<String> {
    users.iter().map(User::normalized_username).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn users(names: &[&str]) -> Vec<User> {
        names.iter().map(|n| User::new(*n)).collect()
    }

    fn names(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.username.as_str()).collect()
    }

    #[test]
    fn test_end_to_end_partitions() {
        let engine = ReconciliationEngine::new();
        let following = users(&["alice", "bob", "carol"]);
        let followers = users(&["bob", "dave"]);

        let p = engine.reconcile(&following, &followers);

        assert_eq!(names(&p.not_mutual), vec!["alice", "carol"]);
        assert_eq!(names(&p.not_following), vec!["dave"]);
        assert_eq!(names(&p.mutuals), vec!["bob"]);
    }

    #[test]
    fn test_case_insensitive_join() {
        let engine = ReconciliationEngine::new();

        let p = engine.reconcile(&users(&["Alice"]), &users(&["alice"]));

        assert_eq!(names(&p.mutuals), vec!["Alice"]);
        assert!(p.not_mutual.is_empty());
        assert!(p.not_following.is_empty());
    }

    #[test]
    fn test_duplicates_preserved() {
        let engine = ReconciliationEngine::new();

        let p = engine.reconcile(&users(&["alice", "alice"]), &[]);
        assert_eq!(names(&p.not_mutual), vec!["alice", "alice"]);

        let p = engine.reconcile(&users(&["bob", "BOB"]), &users(&["bob", "bob"]));
        assert_eq!(names(&p.mutuals), vec!["bob", "BOB"]);
        assert!(p.not_following.is_empty());
    }

    #[test]
    fn test_partition_completeness() {
        let engine = ReconciliationEngine::new();
        let following = users(&["a", "B", "c", "a", "e"]);
        let followers = users(&["b", "d", "E", "f", "d"]);

        let p = engine.reconcile(&following, &followers);

        // Every following entry lands in exactly one of not_mutual / mutuals
        assert_eq!(p.not_mutual.len() + p.mutuals.len(), following.len());
        for u in &following {
            let in_nm = p.not_mutual.iter().any(|x| x.username == u.username);
            let in_mu = p.mutuals.iter().any(|x| x.username == u.username);
            assert!(in_nm ^ in_mu, "{} must be in exactly one set", u.username);
        }

        // Every followers entry is either not_following or matched in following
        let matched = followers
            .iter()
            .filter(|f| following.iter().any(|u| u.is_same_account(f)))
            .count();
        assert_eq!(p.not_following.len() + matched, followers.len());
        assert_eq!(names(&p.not_following), vec!["d", "f", "d"]);
    }

    #[test]
    fn test_analyze_rejects_both_empty() {
        let engine = ReconciliationEngine::new();

        let err = engine.analyze(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidFormat));
    }

    #[test]
    fn test_analyze_one_side_empty_is_valid() {
        let engine = ReconciliationEngine::new();

        let data = engine.analyze(Vec::new(), users(&["fan"])).unwrap();

        assert!(data.following.is_empty());
        assert_eq!(names(&data.not_following), vec!["fan"]);
        assert!(data.mutuals.is_empty());
        assert!(data.not_mutual.is_empty());
    }

    #[test]
    fn test_find_not_mutual_matches_reconcile() {
        let engine = ReconciliationEngine::new();
        let following = users(&["x", "Y", "z"]);
        let followers = users(&["y"]);

        assert_eq!(
            engine.find_not_mutual(&following, &followers),
            engine.reconcile(&following, &followers).not_mutual
        );
    }
}
