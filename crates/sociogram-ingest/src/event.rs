//! The uniform event record every platform payload is normalized into.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sociogram_graph::{ActorId, EdgeKind, Role};

/// Category of an authored action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Forum post
    Post,
    /// Version-control commit
    Commit,
    /// Opening post of an issue
    Issue,
    IssueComment,
    PullRequest,
    PullRequestComment,
    CommitComment,
    /// Pull request merged by someone
    Merge,
    Fork,
    IssueAssignment,
    PullRequestAssignment,
    Follow,
    Unfollow,
    /// Mailing-list message
    Mail,
    /// Membership records: the author holds a standing relation to a
    /// repository. They grant a role and emit no edges.
    Star,
    Watch,
    Subscription,
    Collaborator,
    Contributor,
    RepositoryOwner,
}

impl EventKind {
    pub const ALL: [EventKind; 20] = [
        EventKind::Post,
        EventKind::Commit,
        EventKind::Issue,
        EventKind::IssueComment,
        EventKind::PullRequest,
        EventKind::PullRequestComment,
        EventKind::CommitComment,
        EventKind::Merge,
        EventKind::Fork,
        EventKind::IssueAssignment,
        EventKind::PullRequestAssignment,
        EventKind::Follow,
        EventKind::Unfollow,
        EventKind::Mail,
        EventKind::Star,
        EventKind::Watch,
        EventKind::Subscription,
        EventKind::Collaborator,
        EventKind::Contributor,
        EventKind::RepositoryOwner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Post => "post",
            EventKind::Commit => "commit",
            EventKind::Issue => "issue",
            EventKind::IssueComment => "issue comment",
            EventKind::PullRequest => "pull request",
            EventKind::PullRequestComment => "pull request comment",
            EventKind::CommitComment => "commit comment",
            EventKind::Merge => "merge",
            EventKind::Fork => "fork",
            EventKind::IssueAssignment => "issue assignment",
            EventKind::PullRequestAssignment => "pull request assignment",
            EventKind::Follow => "follow",
            EventKind::Unfollow => "unfollow",
            EventKind::Mail => "mail",
            EventKind::Star => "star",
            EventKind::Watch => "watch",
            EventKind::Subscription => "subscription",
            EventKind::Collaborator => "collaborator",
            EventKind::Contributor => "contributor",
            EventKind::RepositoryOwner => "repository owner",
        }
    }

    /// Parse a kind label. Accepts `"issue comment"`, `"issue_comment"` and
    /// `"issue-comment"` alike.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-'], " ");
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
    }

    /// Kinds that take part in a conversation (replies, joined discussion, mentions).
    pub fn is_conversational(&self) -> bool {
        matches!(
            self,
            EventKind::Post
                | EventKind::Commit
                | EventKind::Issue
                | EventKind::IssueComment
                | EventKind::PullRequestComment
                | EventKind::CommitComment
        )
    }

    pub fn is_membership(&self) -> bool {
        matches!(
            self,
            EventKind::Star
                | EventKind::Watch
                | EventKind::Subscription
                | EventKind::Collaborator
                | EventKind::Contributor
                | EventKind::RepositoryOwner
        )
    }

    /// Edge emitted from the author to each of the event's targets, if any.
    pub fn directed_edge(&self) -> Option<EdgeKind> {
        match self {
            EventKind::PullRequest => Some(EdgeKind::CreatedPullRequest),
            EventKind::Merge => Some(EdgeKind::MergedPullRequest),
            EventKind::Fork => Some(EdgeKind::Fork),
            EventKind::IssueAssignment => Some(EdgeKind::IssueAssignment),
            EventKind::PullRequestAssignment => Some(EdgeKind::PullRequestAssignment),
            EventKind::Follow => Some(EdgeKind::Follow),
            EventKind::Unfollow => Some(EdgeKind::Unfollow),
            EventKind::Mail => Some(EdgeKind::Mail),
            _ => None,
        }
    }

    /// Role the author earns by performing this action.
    pub fn author_role(&self) -> Option<Role> {
        match self {
            EventKind::Commit => Some(Role::Committer),
            EventKind::Issue => Some(Role::IssueCreator),
            EventKind::IssueComment => Some(Role::IssueCommenter),
            EventKind::PullRequest => Some(Role::PullRequestCreator),
            EventKind::PullRequestComment => Some(Role::PullRequestCommenter),
            EventKind::Fork => Some(Role::Forker),
            EventKind::Star => Some(Role::Stargazer),
            EventKind::Watch => Some(Role::Watcher),
            EventKind::Subscription => Some(Role::Subscriber),
            EventKind::Collaborator => Some(Role::Collaborator),
            EventKind::Contributor => Some(Role::Contributor),
            EventKind::RepositoryOwner => Some(Role::Owner),
            _ => None,
        }
    }

    /// Role the targets earn from this action.
    pub fn target_role(&self) -> Option<Role> {
        match self {
            EventKind::IssueAssignment => Some(Role::IssueAssignee),
            EventKind::PullRequestAssignment => Some(Role::PullRequestAssignee),
            EventKind::Fork | EventKind::PullRequest => Some(Role::Owner),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Groups events into one ordered conversation or history.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationKey {
    /// Forum topic, issue, pull request, commit discussion, mailing list
    Thread(String),
    /// One file's commit history
    File(String),
    /// Repository-level actions (forks, pull requests)
    Repository(String),
}

impl CorrelationKey {
    pub fn is_file_history(&self) -> bool {
        matches!(self, CorrelationKey::File(_))
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationKey::Thread(id) => write!(f, "thread:{}", id),
            CorrelationKey::File(path) => write!(f, "file:{}", path),
            CorrelationKey::Repository(name) => write!(f, "repository:{}", name),
        }
    }
}

/// How mentions are encoded in an event body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFormat {
    /// Rendered forum HTML with mention anchors
    Markup,
    #[default]
    PlainText,
}

/// Optional profile data about an event's author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorProfile {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// An atomic authored action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub author: ActorId,
    #[serde(default)]
    pub profile: AuthorProfile,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub body_format: BodyFormat,
    pub correlation_key: CorrelationKey,
    #[serde(default)]
    pub reply_target: Option<String>,
    pub kind: EventKind,
    /// Addressees of directed actions (assignee, repository owner, recipients).
    #[serde(default)]
    pub targets: Vec<ActorId>,
    /// Metadata forwarded to edge attributes (title, slug, category, url).
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        timestamp: DateTime<Utc>,
        author: ActorId,
        kind: EventKind,
        correlation_key: CorrelationKey,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            author,
            profile: AuthorProfile::default(),
            body: String::new(),
            body_format: BodyFormat::default(),
            correlation_key,
            reply_target: None,
            kind,
            targets: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>, format: BodyFormat) -> Self {
        self.body = body.into();
        self.body_format = format;
        self
    }

    pub fn replying_to(mut self, target: impl Into<String>) -> Self {
        self.reply_target = Some(target.into());
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = ActorId>) -> Self {
        self.targets.extend(targets);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_parse_accepts_separators() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::parse("issue_comment"), Some(EventKind::IssueComment));
        assert_eq!(EventKind::parse("PR-comment"), None);
        assert_eq!(EventKind::parse("pull-request-comment"), Some(EventKind::PullRequestComment));
    }

    #[test]
    fn test_directed_and_conversational_kinds_are_disjoint() {
        for kind in EventKind::ALL {
            assert!(!(kind.is_conversational() && kind.directed_edge().is_some()), "{kind}");
        }
    }

    #[test]
    fn test_membership_kinds_only_grant_roles() {
        for kind in EventKind::ALL.into_iter().filter(EventKind::is_membership) {
            assert!(!kind.is_conversational(), "{kind}");
            assert!(kind.directed_edge().is_none(), "{kind}");
            assert!(kind.author_role().is_some(), "{kind}");
        }
        assert_eq!(EventKind::parse("repository_owner"), Some(EventKind::RepositoryOwner));
    }

    #[test]
    fn test_every_role_can_be_earned() {
        for role in Role::ALL {
            let earned = EventKind::ALL
                .into_iter()
                .any(|kind| kind.author_role() == Some(role) || kind.target_role() == Some(role));
            assert!(earned, "{} is never granted", role.as_str());
        }
    }

    #[test]
    fn test_correlation_key_display() {
        assert_eq!(CorrelationKey::Thread("42".into()).to_string(), "thread:42");
        assert_eq!(CorrelationKey::File("src/lib.rs".into()).to_string(), "file:src/lib.rs");
        assert!(CorrelationKey::File("a".into()).is_file_history());
    }
}
