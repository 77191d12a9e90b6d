//! Graph schema definitions for the interaction multigraph.
//!
//! This module defines the core types for the social graph:
//! - `ActorId`: Identity of a node (a login, or the unresolved placeholder)
//! - `Role`: Role flags accumulated on actors across analyses
//! - `NodeAttributes`: Fixed attribute record carried by every actor
//! - `EdgeKind`: Why two actors are connected
//! - `EdgeDraft`: An edge produced by a build policy, before it gets a key
//! - `InteractionEdge`: A stored, keyed edge in the graph

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of an actor in the graph.
///
/// Platforms regularly hand back events without a usable author. Those map
/// to `Unresolved` instead of a magic string, so a real account literally
/// named "None" or "unknown" stays a normal `Known` actor.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum ActorId {
    /// A login, username or email address.
    Known(String),
    /// Author missing from the platform payload.
    Unresolved,
}

impl ActorId {
    /// Create a known actor id. Blank names become `Unresolved`.
    pub fn known(name: impl Into<String>) -> Self {
        let name = name.into();
        if name.trim().is_empty() {
            ActorId::Unresolved
        } else {
            ActorId::Known(name)
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, ActorId::Unresolved)
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ActorId::Known(name) => Some(name),
            ActorId::Unresolved => None,
        }
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorId::Known(name) => f.write_str(name),
            ActorId::Unresolved => f.write_str("unknown"),
        }
    }
}

impl From<Option<String>> for ActorId {
    fn from(value: Option<String>) -> Self {
        value.map(ActorId::known).unwrap_or(ActorId::Unresolved)
    }
}

impl From<ActorId> for Option<String> {
    fn from(value: ActorId) -> Self {
        match value {
            ActorId::Known(name) => Some(name),
            ActorId::Unresolved => None,
        }
    }
}

/// Role categories an actor can hold in a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Committer,
    Forker,
    Stargazer,
    Contributor,
    Collaborator,
    Watcher,
    Subscriber,
    IssueCreator,
    IssueCommenter,
    IssueAssignee,
    PullRequestCreator,
    PullRequestCommenter,
    PullRequestAssignee,
}

impl Role {
    /// Every recognized role. Attribute completion walks this list.
    pub const ALL: [Role; 14] = [
        Role::Owner,
        Role::Committer,
        Role::Forker,
        Role::Stargazer,
        Role::Contributor,
        Role::Collaborator,
        Role::Watcher,
        Role::Subscriber,
        Role::IssueCreator,
        Role::IssueCommenter,
        Role::IssueAssignee,
        Role::PullRequestCreator,
        Role::PullRequestCommenter,
        Role::PullRequestAssignee,
    ];

    /// Attribute name used in exported node attribute maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Committer => "committer",
            Role::Forker => "forker",
            Role::Stargazer => "stargazer",
            Role::Contributor => "contributor",
            Role::Collaborator => "collaborator",
            Role::Watcher => "watcher",
            Role::Subscriber => "subscriber",
            Role::IssueCreator => "issue creator",
            Role::IssueCommenter => "issue commenter",
            Role::IssueAssignee => "issue assignee",
            Role::PullRequestCreator => "pull request creator",
            Role::PullRequestCommenter => "pull request commenter",
            Role::PullRequestAssignee => "pull request assignee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('_', " ");
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
    }
}

/// Attributes carried by every actor node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub label: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub roles: BTreeMap<Role, bool>,
}

impl NodeAttributes {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.get(&role).copied().unwrap_or(false)
    }

    /// Mark the actor as holding `role`. Roles are never revoked.
    pub fn grant(&mut self, role: Role) {
        self.roles.insert(role, true);
    }

    /// Fill gaps from `other`: optional fields keep the first value seen,
    /// roles are OR-ed together.
    pub fn merge_from(&mut self, other: &NodeAttributes) {
        if self.label.is_none() {
            self.label = other.label.clone();
        }
        if self.email.is_none() {
            self.email = other.email.clone();
        }
        if self.full_name.is_none() {
            self.full_name = other.full_name.clone();
        }
        if self.avatar_url.is_none() {
            self.avatar_url = other.avatar_url.clone();
        }
        for (role, held) in &other.roles {
            let entry = self.roles.entry(*role).or_insert(false);
            *entry |= *held;
        }
    }

    /// True once every recognized role has an explicit value and a label is set.
    pub fn is_complete(&self) -> bool {
        self.label.is_some() && Role::ALL.iter().all(|role| self.roles.contains_key(role))
    }
}

/// Types of interactions between actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    // Discussion policies
    /// Reply to a specific earlier post
    DirectReply,
    /// Posted after someone else in the same thread
    JoinedDiscussion,
    /// @username reference in a body
    Mention,

    // Version control
    /// Committed to a file after someone else did
    CoEdit,

    // Directed actions
    Fork,
    MergedPullRequest,
    CreatedPullRequest,
    IssueAssignment,
    PullRequestAssignment,
    Follow,
    Unfollow,
    Mail,
}

impl EdgeKind {
    pub const ALL: [EdgeKind; 12] = [
        EdgeKind::DirectReply,
        EdgeKind::JoinedDiscussion,
        EdgeKind::Mention,
        EdgeKind::CoEdit,
        EdgeKind::Fork,
        EdgeKind::MergedPullRequest,
        EdgeKind::CreatedPullRequest,
        EdgeKind::IssueAssignment,
        EdgeKind::PullRequestAssignment,
        EdgeKind::Follow,
        EdgeKind::Unfollow,
        EdgeKind::Mail,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::DirectReply => "direct reply",
            EdgeKind::JoinedDiscussion => "joined discussion",
            EdgeKind::Mention => "mention",
            EdgeKind::CoEdit => "commit",
            EdgeKind::Fork => "fork",
            EdgeKind::MergedPullRequest => "merged pull request",
            EdgeKind::CreatedPullRequest => "created a pull request",
            EdgeKind::IssueAssignment => "issue assignment",
            EdgeKind::PullRequestAssignment => "pull request assignment",
            EdgeKind::Follow => "follow",
            EdgeKind::Unfollow => "unfollow",
            EdgeKind::Mail => "mail",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        EdgeKind::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

/// An edge produced by a build policy, waiting for its graph key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDraft {
    pub source: ActorId,
    pub target: ActorId,
    pub kind: EdgeKind,
    pub start: Option<DateTime<Utc>>,
    pub source_event_id: Option<String>,
    pub event_kind: Option<String>,
    pub message: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl EdgeDraft {
    pub fn new(source: ActorId, target: ActorId, kind: EdgeKind, start: DateTime<Utc>) -> Self {
        Self {
            source,
            target,
            kind,
            start: Some(start),
            source_event_id: None,
            event_kind: None,
            message: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach the id and kind label of the event that caused this edge.
    pub fn with_event(mut self, id: impl Into<String>, kind: impl Into<String>) -> Self {
        self.source_event_id = Some(id.into());
        self.event_kind = Some(kind.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.is_empty() {
            self.message = Some(message);
        }
        self
    }

    pub fn with_metadata(mut self, metadata: &BTreeMap<String, String>) -> Self {
        self.metadata
            .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// A stored edge in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEdge {
    pub key: u64,
    pub source: ActorId,
    pub target: ActorId,
    pub kind: EdgeKind,
    pub start: Option<DateTime<Utc>>,
    pub source_event_id: Option<String>,
    pub event_kind: Option<String>,
    pub message: Option<String>,
    /// Year the analysis ran; open-ended end bound for duration views.
    pub observation_year: i32,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl InteractionEdge {
    pub fn from_draft(key: u64, observation_year: i32, draft: EdgeDraft) -> Self {
        Self {
            key,
            source: draft.source,
            target: draft.target,
            kind: draft.kind,
            start: draft.start,
            source_event_id: draft.source_event_id,
            event_kind: draft.event_kind,
            message: draft.message,
            observation_year,
            metadata: draft.metadata,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub fn touches(&self, actor: &ActorId) -> bool {
        &self.source == actor || &self.target == actor
    }
}

/// Serialize `BTreeMap<ActorId, V>` as a list of pairs.
///
/// JSON object keys must be strings, and `ActorId::Unresolved` has none.
pub mod actor_map {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::ActorId;

    pub fn serialize<S, V>(map: &BTreeMap<ActorId, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<ActorId, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        let pairs: Vec<(ActorId, V)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_blank_is_unresolved() {
        assert_eq!(ActorId::known(""), ActorId::Unresolved);
        assert_eq!(ActorId::known("   "), ActorId::Unresolved);
        assert_eq!(ActorId::known("None"), ActorId::Known("None".to_string()));
    }

    #[test]
    fn test_actor_id_serializes_as_nullable_string() {
        let json = serde_json::to_string(&vec![ActorId::known("alice"), ActorId::Unresolved]).unwrap();
        assert_eq!(json, r#"["alice",null]"#);

        let parsed: Vec<ActorId> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![ActorId::known("alice"), ActorId::Unresolved]);
    }

    #[test]
    fn test_role_parse_accepts_labels_and_snake_case() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("issue_creator"), Some(Role::IssueCreator));
        assert_eq!(Role::parse("Stargazer"), Some(Role::Stargazer));
        assert_eq!(Role::parse("maintainer"), None);
    }

    #[test]
    fn test_edge_kind_labels_are_unique() {
        for kind in EdgeKind::ALL {
            assert_eq!(EdgeKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_merge_from_keeps_first_values_and_ors_roles() {
        let mut a = NodeAttributes {
            email: Some("a@example.org".to_string()),
            ..Default::default()
        };
        a.roles.insert(Role::Owner, false);

        let mut b = NodeAttributes {
            email: Some("other@example.org".to_string()),
            avatar_url: Some("https://example.org/a.png".to_string()),
            ..Default::default()
        };
        b.grant(Role::Owner);
        b.grant(Role::Committer);

        a.merge_from(&b);
        assert_eq!(a.email.as_deref(), Some("a@example.org"));
        assert_eq!(a.avatar_url.as_deref(), Some("https://example.org/a.png"));
        assert!(a.has_role(Role::Owner));
        assert!(a.has_role(Role::Committer));
        assert!(!a.has_role(Role::Forker));
    }
}
