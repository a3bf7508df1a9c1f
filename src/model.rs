// 👥 Follow Model - Canonical users and the analysis aggregate

use serde::{Deserialize, Serialize};

// ============================================================================
// USER
// ============================================================================

/// Canonical account record produced by the normalizer
///
/// Identity is the lowercased username only. `profile_url` and
/// `captured_at` are carried through for display and never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,

    /// Deep link from the export (`href` on the wire)
    #[serde(rename = "href", default, skip_serializing_if = "Option::is_none")]
    pub profile_url: Option<String>,

    /// Export timestamp (`timestamp` on the wire)
    #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<i64>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        User {
            username: username.into(),
            profile_url: None,
            captured_at: None,
        }
    }

    /// Builder pattern: add profile link
    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = Some(url.into());
        self
    }

    /// Builder pattern: add capture timestamp
    pub fn with_captured_at(mut self, timestamp: i64) -> Self {
        self.captured_at = Some(timestamp);
        self
    }

    /// Join key used by reconciliation
    pub fn normalized_username(&self) -> String {
        self.username.to_lowercase()
    }

    pub fn is_same_account(&self, other: &User) -> bool {
        self.normalized_username() == other.normalized_username()
    }
}

// ============================================================================
// LIST KIND
// ============================================================================

/// The five lists a result exposes, named as the presentation layer names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListKind {
    NotMutual,
    Following,
    Followers,
    NotFollowing,
    Mutuals,
}

impl ListKind {
    pub const ALL: [ListKind; 5] = [
        ListKind::NotMutual,
        ListKind::Following,
        ListKind::Followers,
        ListKind::NotFollowing,
        ListKind::Mutuals,
    ];

    /// Wire / CLI name
    pub fn key(&self) -> &'static str {
        match self {
            ListKind::NotMutual => "notMutual",
            ListKind::Following => "following",
            ListKind::Followers => "followers",
            ListKind::NotFollowing => "notFollowing",
            ListKind::Mutuals => "mutuals",
        }
    }

    /// Human-readable name for display
    pub fn title(&self) -> &'static str {
        match self {
            ListKind::NotMutual => "Not Mutual",
            ListKind::Following => "Following",
            ListKind::Followers => "Followers",
            ListKind::NotFollowing => "I Don't Follow",
            ListKind::Mutuals => "Mutuals",
        }
    }

    /// Accepts the camelCase key case-insensitively, plus snake/kebab spellings
    pub fn parse(name: &str) -> Option<ListKind> {
        let squashed: String = name
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        ListKind::ALL
            .into_iter()
            .find(|kind| kind.key().to_lowercase() == squashed)
    }

    pub fn next(&self) -> Self {
        let i = ListKind::ALL.iter().position(|k| k == self).unwrap_or(0);
        ListKind::ALL[(i + 1) % ListKind::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        let i = ListKind::ALL.iter().position(|k| k == self).unwrap_or(0);
        ListKind::ALL[(i + ListKind::ALL.len() - 1) % ListKind::ALL.len()]
    }
}

impl std::fmt::Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

// ============================================================================
// FOLLOW DATA
// ============================================================================

/// Result of one analysis run
///
/// Same shape whether it came from local reconciliation or from a remote
/// service's pre-computed partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub followers: Vec<User>,
    pub following: Vec<User>,
    /// Following but not followed back
    pub not_mutual: Vec<User>,
    /// Followers I don't follow back
    #[serde(default)]
    pub not_following: Vec<User>,
    #[serde(default)]
    pub mutuals: Vec<User>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowSummary {
    pub followers: usize,
    pub following: usize,
    pub not_mutual: usize,
    pub not_following: usize,
    pub mutuals: usize,
}

impl FollowData {
    pub fn list(&self, kind: ListKind) -> &[User] {
        match kind {
            ListKind::NotMutual => &self.not_mutual,
            ListKind::Following => &self.following,
            ListKind::Followers => &self.followers,
            ListKind::NotFollowing => &self.not_following,
            ListKind::Mutuals => &self.mutuals,
        }
    }

    pub fn summary(&self) -> FollowSummary {
        FollowSummary {
            followers: self.followers.len(),
            following: self.following.len(),
            not_mutual: self.not_mutual.len(),
            not_following: self.not_following.len(),
            mutuals: self.mutuals.len(),
        }
    }
}

impl FollowSummary {
    pub fn count(&self, kind: ListKind) -> usize {
        match kind {
            ListKind::NotMutual => self.not_mutual,
            ListKind::Following => self.following,
            ListKind::Followers => self.followers,
            ListKind::NotFollowing => self.not_following,
            ListKind::Mutuals => self.mutuals,
        }
    }
}

/// Case-insensitive substring search on username; empty query keeps everything
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return users.iter().collect();
    }

    users
        .iter()
        .filter(|u| u.normalized_username().contains(&needle))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
