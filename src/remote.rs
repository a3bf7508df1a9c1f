// 🌐 Remote Fetch Path - Pre-computed partitions from an external service
//
// The service is not part of this crate. It is reached through the
// `RemoteFetcher` trait and its response is converted into the same
// `FollowData` the local path produces. Wire types stay in this module.

use crate::error::AnalysisError;
use crate::model::{FollowData, User};
use serde::{Deserialize, Serialize};

/// Opaque session token the remote service authenticates with
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential(String);

impl SessionCredential {
    /// Trims surrounding whitespace; a blank token is rejected
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(SessionCredential(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionCredential(***)")
    }
}

/// Account as the remote service describes it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteUser {
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

impl From<RemoteUser> for User {
    fn from(remote: RemoteUser) -> Self {
        User {
            username: remote.username,
            profile_url: remote.href,
            captured_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteCounts {
    #[serde(default)]
    pub followers: usize,
    #[serde(default)]
    pub following: usize,
    #[serde(default)]
    pub not_followed_back: usize,
    #[serde(default)]
    pub not_following: usize,
    #[serde(default)]
    pub mutuals: usize,
}

/// Response body of the remote analysis service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub followers: Vec<RemoteUser>,
    #[serde(default)]
    pub following: Vec<RemoteUser>,
    /// Accounts I follow that don't follow back
    #[serde(default)]
    pub not_followed_back: Vec<RemoteUser>,
    /// Followers I don't follow back
    #[serde(default)]
    pub not_following: Vec<RemoteUser>,
    #[serde(default)]
    pub mutuals: Vec<RemoteUser>,
    #[serde(default)]
    pub counts: RemoteCounts,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.status.to_lowercase().as_str(), "success" | "ok")
    }

    /// Trust the remote partitions as-is; no local reconciliation
    pub fn into_follow_data(self) -> Result<FollowData, AnalysisError> {
        if !self.is_success() {
            let reason = self
                .message
                .unwrap_or_else(|| format!("remote status '{}'", self.status));
            return Err(AnalysisError::RemoteFetchFailed(reason));
        }

        Ok(FollowData {
            username: self.username,
            followers: convert(self.followers),
            following: convert(self.following),
            not_mutual: convert(self.not_followed_back),
            not_following: convert(self.not_following),
            mutuals: convert(self.mutuals),
        })
    }
}

fn convert(users: Vec<RemoteUser>) -> Vec<User> {
    users.into_iter().map(User::from).collect()
}

/// External collaborator that performs the remote analysis
///
/// Implementations own transport, timeouts and retries. Unreachable
/// endpoints should surface as `AnalysisError::RemoteFetchFailed`.
pub trait RemoteFetcher {
    fn fetch(&self, credential: &SessionCredential) -> Result<RemoteResponse, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn remote(name: &str) -> RemoteUser {
        RemoteUser {
            username: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_credential_trims_and_rejects_blank() {
        assert_eq!(SessionCredential::new("  abc123 \n").unwrap().as_str(), "abc123");
        assert!(SessionCredential::new("   ").is_none());
        assert_eq!(
            format!("{:?}", SessionCredential::new("secret").unwrap()),
            "SessionCredential(***)"
        );
    }

    #[test]
    fn test_successful_response_maps_partitions() {
        let response = RemoteResponse {
            status: "success".to_string(),
            username: Some("me".to_string()),
            followers: vec![remote("bob"), remote("dave")],
            following: vec![remote("alice"), remote("bob")],
            not_followed_back: vec![remote("alice")],
            not_following: vec![remote("dave")],
            mutuals: vec![remote("bob")],
            ..Default::default()
        };

        let data = response.into_follow_data().unwrap();

        assert_eq!(data.username.as_deref(), Some("me"));
        assert_eq!(data.not_mutual, vec![User::new("alice")]);
        assert_eq!(data.not_following, vec![User::new("dave")]);
        assert_eq!(data.mutuals, vec![User::new("bob")]);
        assert_eq!(data.followers.len(), 2);
    }

    #[test]
    fn test_failed_status_is_remote_error() {
        let response = RemoteResponse {
            status: "error".to_string(),
            message: Some("session expired".to_string()),
            ..Default::default()
        };

        match response.into_follow_data() {
            Err(AnalysisError::RemoteFetchFailed(msg)) => assert_eq!(msg, "session expired"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_response_decodes_with_missing_lists() {
        let body = json!({
            "status": "OK",
            "username": "me",
            "followers": [{"username": "x", "full_name": "X", "is_verified": true}],
            "counts": {"followers": 1}
        });

        let response: RemoteResponse = serde_json::from_value(body).unwrap();
        assert!(response.is_success());
        assert_eq!(response.counts.followers, 1);

        let data = response.into_follow_data().unwrap();
        assert_eq!(data.followers, vec![User::new("x")]);
        assert!(data.following.is_empty());
    }
}
