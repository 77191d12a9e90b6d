//! Platform payload normalization.
//!
//! Collectors hand over one `serde_json::Value` per fetched item. Each
//! `Platform` knows where that platform keeps the id, timestamp, author and
//! threading information, and turns the item into exactly one [`Event`].
//! Normalization is side-effect free; a payload without a usable id,
//! timestamp or kind is rejected with [`IngestError::MalformedPayload`].

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sociogram_graph::export::START_FORMAT;
use sociogram_graph::ActorId;

use crate::error::IngestError;
use crate::event::{AuthorProfile, BodyFormat, CorrelationKey, Event, EventKind};

/// Naive layouts tried after RFC 3339 and RFC 2822. Naive times are taken as UTC.
const NAIVE_FORMATS: [&str; 3] = [START_FORMAT, "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Source platform of a raw payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Forum posts from the Discourse API
    Discourse,
    /// Issues, pull requests, comments, forks and merges
    Github,
    /// Per-file commit records
    Git,
    /// Mailing-list archives
    Mailman,
    /// Follower relationships
    Twitter,
    /// Items already in the event layout
    Generic,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Discourse,
        Platform::Github,
        Platform::Git,
        Platform::Mailman,
        Platform::Twitter,
        Platform::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Discourse => "discourse",
            Platform::Github => "github",
            Platform::Git => "git",
            Platform::Mailman => "mailman",
            Platform::Twitter => "twitter",
            Platform::Generic => "generic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase();
        Platform::ALL
            .into_iter()
            .find(|platform| platform.as_str() == normalized)
    }

    /// Normalize one raw item into an event.
    pub fn normalize(&self, item: &Value) -> Result<Event, IngestError> {
        match self {
            Platform::Discourse => discourse(item),
            Platform::Github => github(item),
            Platform::Git => git(item),
            Platform::Mailman => mailman(item),
            Platform::Twitter => twitter(item),
            Platform::Generic => generic(item),
        }
    }

    /// Best-effort correlation key of an item, available even when the item
    /// cannot be normalized. Lets callers drop the whole group a broken item
    /// belongs to.
    pub fn correlation_hint(&self, item: &Value) -> Option<CorrelationKey> {
        match self {
            Platform::Discourse => discourse_correlation(item),
            Platform::Github => github_correlation(item),
            Platform::Git => git_correlation(item),
            Platform::Mailman => mailman_correlation(item),
            Platform::Twitter => twitter_correlation(item),
            Platform::Generic => generic_correlation(item),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a JSON timestamp: a string in any supported layout, or unix seconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => parse_timestamp_str(s),
        _ => None,
    }
}

/// Parse RFC 3339, RFC 2822, the `START_FORMAT` export layout, naive ISO
/// timestamps or integer unix seconds.
pub fn parse_timestamp_str(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

// ---------------------------------------------------------------------------
// Discourse
// ---------------------------------------------------------------------------

fn discourse(item: &Value) -> Result<Event, IngestError> {
    let post_id = required_text(item, &["/id"], "id")?;
    let timestamp = required_timestamp(item, &["/created_at"])?;

    // Replies reference post numbers within the topic, so the event id is
    // the topic-scoped post number whenever both are present.
    let topic = text(item, "/topic_id");
    let id = match (&topic, text(item, "/post_number")) {
        (Some(topic), Some(number)) => format!("{}#{}", topic, number),
        _ => post_id.clone(),
    };
    let key = discourse_correlation(item).unwrap_or_else(|| CorrelationKey::Thread(post_id.clone()));

    let mut event = Event::new(id, timestamp, actor(item, &["/username"]), EventKind::Post, key)
        .with_body(raw_text(item, "/cooked"), BodyFormat::Markup)
        .with_extra("post_id", post_id);

    if let (Some(topic), Some(reply)) = (&topic, text(item, "/reply_to_post_number")) {
        event.reply_target = Some(format!("{}#{}", topic, reply));
    }

    event.profile = AuthorProfile {
        email: None,
        full_name: text(item, "/name"),
        avatar_url: text(item, "/avatar_template").map(|template| template.replace("{size}", "120")),
    };

    copy_extra(
        item,
        &mut event,
        &[("slug", "/topic_slug"), ("title", "/topic_title"), ("category", "/category_id")],
    );

    Ok(event)
}

fn discourse_correlation(item: &Value) -> Option<CorrelationKey> {
    text(item, "/topic_id").map(CorrelationKey::Thread)
}

// ---------------------------------------------------------------------------
// GitHub
// ---------------------------------------------------------------------------

fn github(item: &Value) -> Result<Event, IngestError> {
    let kind = github_kind(item)?;
    let id = required_text(item, &["/id", "/sha", "/node_id"], "id")?;
    let timestamp = required_timestamp(
        item,
        &["/created_at", "/merged_at", "/starred_at", "/commit/author/date", "/date"],
    )?;

    let author = match kind {
        EventKind::Merge => actor(item, &["/merged_by/login"]),
        // Member listings are bare user objects.
        _ if kind.is_membership() => actor(item, &["/user/login", "/login"]),
        _ => actor(item, &["/user/login", "/author/login", "/actor/login"]),
    };

    let mut targets = actor_list(item, "/targets");
    if targets.is_empty() {
        targets = match kind {
            EventKind::Merge => actor_list(item, "/user"),
            EventKind::PullRequest | EventKind::Fork => actor_list(item, "/repository_owner"),
            EventKind::IssueAssignment | EventKind::PullRequestAssignment => {
                let assignees = actor_list(item, "/assignees");
                if assignees.is_empty() {
                    actor_list(item, "/assignee")
                } else {
                    assignees
                }
            }
            _ => Vec::new(),
        };
    }

    let key = github_correlation(item).unwrap_or_else(|| CorrelationKey::Thread(id.clone()));
    let body = first_raw_text(item, &["/body", "/commit/message", "/message"]);

    let mut event = Event::new(id, timestamp, author, kind, key)
        .with_body(body, BodyFormat::PlainText)
        .with_targets(targets);

    // Merges describe the merger, not the pull request author under /user.
    if kind != EventKind::Merge {
        event.profile = AuthorProfile {
            email: first_text(item, &["/user/email", "/commit/author/email", "/author/email"]),
            full_name: first_text(item, &["/user/name", "/commit/author/name"]),
            avatar_url: first_text(item, &["/user/avatar_url", "/author/avatar_url"]),
        };
    }

    copy_extra(
        item,
        &mut event,
        &[("title", "/title"), ("url", "/html_url"), ("repository", "/repository")],
    );

    Ok(event)
}

/// Event kind, also accepting the names of the repository member listings
/// (`stargazer`, `watcher`, `subscriber`, `owner`).
fn github_kind(item: &Value) -> Result<EventKind, IngestError> {
    let label = required_text(item, &["/kind", "/type"], "kind")?;
    let kind = match label.trim().to_lowercase().as_str() {
        "stargazer" => Some(EventKind::Star),
        "watcher" => Some(EventKind::Watch),
        "subscriber" => Some(EventKind::Subscription),
        "owner" => Some(EventKind::RepositoryOwner),
        other => EventKind::parse(other),
    };
    kind.ok_or_else(|| IngestError::invalid("kind", format!("'{}' is not a known event kind", label)))
}

fn github_correlation(item: &Value) -> Option<CorrelationKey> {
    if let Some(thread) = text(item, "/thread") {
        return Some(CorrelationKey::Thread(thread));
    }

    let repository = text(item, "/repository");
    let scoped = |local: String| match &repository {
        Some(repository) => format!("{}{}", repository, local),
        None => local,
    };

    let kind = first_text(item, &["/kind", "/type"]).and_then(|label| EventKind::parse(&label));
    // A commit heads the discussion made of its own commit comments.
    let commit = text(item, "/commit_id").or_else(|| {
        (kind == Some(EventKind::Commit))
            .then(|| first_text(item, &["/sha", "/id"]))
            .flatten()
    });
    if let Some(sha) = commit {
        return Some(CorrelationKey::Thread(scoped(format!("@{}", sha))));
    }

    if let Some(number) = first_text(item, &["/issue_number", "/number"]) {
        return Some(CorrelationKey::Thread(scoped(format!("#{}", number))));
    }

    repository.map(CorrelationKey::Repository)
}

// ---------------------------------------------------------------------------
// Git
// ---------------------------------------------------------------------------

fn git(item: &Value) -> Result<Event, IngestError> {
    let id = required_text(item, &["/commit", "/sha", "/id"], "id")?;
    let timestamp = required_timestamp(item, &["/date", "/timestamp"])?;
    let key = git_correlation(item).ok_or_else(|| IngestError::missing("path"))?;

    // Subjects arrive in `%f` form, with dashes for spaces.
    let message = text(item, "/message")
        .map(|message| message.replace('-', " "))
        .unwrap_or_default();

    let author = actor(item, &["/author", "/author/name", "/email", "/author/email"]);
    let mut event = Event::new(id, timestamp, author, EventKind::Commit, key)
        .with_body(message, BodyFormat::PlainText);

    event.profile.email = first_text(item, &["/email", "/author/email"]).map(|email| email.to_lowercase());
    copy_extra(item, &mut event, &[("repository", "/repository")]);

    Ok(event)
}

fn git_correlation(item: &Value) -> Option<CorrelationKey> {
    first_text(item, &["/path", "/file"]).map(CorrelationKey::File)
}

// ---------------------------------------------------------------------------
// Mailman
// ---------------------------------------------------------------------------

fn mailman(item: &Value) -> Result<Event, IngestError> {
    let id = required_text(item, &["/message_id", "/id"], "id")?;
    let timestamp = required_timestamp(item, &["/date"])?;

    let from = text(item, "/from");
    let author = from
        .as_deref()
        .and_then(mail_address)
        .map(ActorId::known)
        .unwrap_or(ActorId::Unresolved);

    let mut recipients = Vec::new();
    for field in ["/to", "/cc"] {
        recipients.extend(addresses(item.pointer(field)).into_iter().map(ActorId::known));
    }

    let key = mailman_correlation(item).unwrap_or_else(|| CorrelationKey::Thread(id.clone()));
    let mut event = Event::new(id, timestamp, author, EventKind::Mail, key)
        .with_body(raw_text(item, "/body"), BodyFormat::PlainText)
        .with_targets(recipients);

    event.profile.email = from.as_deref().and_then(mail_address);
    event.profile.full_name = from.as_deref().and_then(display_name);
    copy_extra(
        item,
        &mut event,
        &[("title", "/subject"), ("in_reply_to", "/in_reply_to")],
    );

    Ok(event)
}

fn mailman_correlation(item: &Value) -> Option<CorrelationKey> {
    text(item, "/list").map(CorrelationKey::Thread)
}

/// Extract the address from `Name <addr>` or a bare address, lowercased.
fn mail_address(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let address = match (raw.rfind('<'), raw.rfind('>')) {
        (Some(open), Some(close)) if open < close => &raw[open + 1..close],
        _ => raw,
    };
    let address = address.trim().trim_matches('"').trim();
    (!address.is_empty()).then(|| address.to_lowercase())
}

fn display_name(raw: &str) -> Option<String> {
    let open = raw.find('<')?;
    let name = raw[..open].trim().trim_matches('"').trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn addresses(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(list)) => split_recipients(list)
            .into_iter()
            .filter_map(mail_address)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(mail_address)
            .collect(),
        _ => Vec::new(),
    }
}

/// Split a header on commas that are not inside a quoted display name.
fn split_recipients(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (index, c) in list.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&list[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&list[start..]);
    parts
}

// ---------------------------------------------------------------------------
// Twitter
// ---------------------------------------------------------------------------

fn twitter(item: &Value) -> Result<Event, IngestError> {
    let id = required_text(item, &["/id"], "id")?;
    let timestamp = required_timestamp(item, &["/at", "/created_at", "/timestamp"])?;
    let kind = match required_kind(item, &["/action", "/kind"])? {
        kind @ (EventKind::Follow | EventKind::Unfollow) => kind,
        other => {
            return Err(IngestError::invalid(
                "kind",
                format!("'{}' is not a follower action", other),
            ))
        }
    };

    let key = twitter_correlation(item).unwrap_or_else(|| CorrelationKey::Thread(id.clone()));
    Ok(Event::new(id, timestamp, actor(item, &["/follower"]), kind, key)
        .with_targets([actor(item, &["/followed"])]))
}

fn twitter_correlation(item: &Value) -> Option<CorrelationKey> {
    text(item, "/followed").map(|account| CorrelationKey::Thread(format!("followers:{}", account)))
}

// ---------------------------------------------------------------------------
// Generic
// ---------------------------------------------------------------------------

fn generic(item: &Value) -> Result<Event, IngestError> {
    let id = required_text(item, &["/id"], "id")?;
    let timestamp = required_timestamp(item, &["/timestamp"])?;
    let kind = required_kind(item, &["/kind"])?;

    let body_format = item
        .get("body_format")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default();

    let key = generic_correlation(item).unwrap_or_else(|| CorrelationKey::Thread(id.clone()));
    let mut event = Event::new(id, timestamp, actor(item, &["/author"]), kind, key)
        .with_body(raw_text(item, "/body"), body_format)
        .with_targets(actor_list(item, "/targets"));

    event.reply_target = first_text(item, &["/reply_target", "/reply_to"]);
    event.profile = AuthorProfile {
        email: first_text(item, &["/author_email", "/profile/email"]),
        full_name: first_text(item, &["/author_name", "/profile/full_name"]),
        avatar_url: first_text(item, &["/avatar_url", "/profile/avatar_url"]),
    };

    if let Some(Value::Object(extra)) = item.get("extra") {
        for (key, value) in extra {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Null => continue,
                other => other.to_string(),
            };
            event.extra.insert(key.clone(), value);
        }
    }

    Ok(event)
}

fn generic_correlation(item: &Value) -> Option<CorrelationKey> {
    if let Some(key) = item
        .get("correlation_key")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
    {
        return Some(key);
    }
    text(item, "/thread")
        .map(CorrelationKey::Thread)
        .or_else(|| text(item, "/file").map(CorrelationKey::File))
        .or_else(|| text(item, "/repository").map(CorrelationKey::Repository))
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// Non-blank string or number at `pointer`, trimmed.
fn text(item: &Value, pointer: &str) -> Option<String> {
    match item.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(item: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|pointer| text(item, pointer))
}

/// String at `pointer` as-is (bodies keep their whitespace), empty if absent.
fn raw_text(item: &Value, pointer: &str) -> String {
    item.pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn first_raw_text(item: &Value, pointers: &[&str]) -> String {
    pointers
        .iter()
        .find_map(|pointer| item.pointer(pointer).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn required_text(item: &Value, pointers: &[&str], field: &'static str) -> Result<String, IngestError> {
    first_text(item, pointers).ok_or_else(|| IngestError::missing(field))
}

fn required_timestamp(item: &Value, pointers: &[&str]) -> Result<DateTime<Utc>, IngestError> {
    let value = pointers
        .iter()
        .find_map(|pointer| item.pointer(pointer).filter(|value| !value.is_null()))
        .ok_or_else(|| IngestError::missing("timestamp"))?;
    parse_timestamp(value).ok_or_else(|| {
        IngestError::invalid("timestamp", format!("{} is not a recognized timestamp", value))
    })
}

fn required_kind(item: &Value, pointers: &[&str]) -> Result<EventKind, IngestError> {
    let label = required_text(item, pointers, "kind")?;
    EventKind::parse(&label)
        .ok_or_else(|| IngestError::invalid("kind", format!("'{}' is not a known event kind", label)))
}

fn actor(item: &Value, pointers: &[&str]) -> ActorId {
    first_text(item, pointers)
        .map(ActorId::known)
        .unwrap_or(ActorId::Unresolved)
}

/// Logins at `pointer`: a string, an object with `login`, or an array of either.
fn actor_list(item: &Value, pointer: &str) -> Vec<ActorId> {
    match item.pointer(pointer) {
        Some(Value::Array(values)) => values.iter().filter_map(login_of).map(ActorId::known).collect(),
        Some(value) => login_of(value).map(ActorId::known).into_iter().collect(),
        None => Vec::new(),
    }
}

fn login_of(value: &Value) -> Option<String> {
    let login = match value {
        Value::String(s) => s.as_str(),
        Value::Object(_) => value.get("login").and_then(Value::as_str)?,
        _ => return None,
    };
    let login = login.trim();
    (!login.is_empty()).then(|| login.to_string())
}

fn copy_extra(item: &Value, event: &mut Event, fields: &[(&str, &str)]) {
    for (key, pointer) in fields {
        if let Some(value) = text(item, pointer) {
            event.extra.insert((*key).to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_discourse_post_uses_topic_scoped_ids() {
        let item = json!({
            "id": 981,
            "post_number": 3,
            "reply_to_post_number": 1,
            "topic_id": 42,
            "topic_slug": "welcome",
            "topic_title": "Welcome!",
            "category_id": 7,
            "username": "bob",
            "name": "Bob B.",
            "avatar_template": "/user_avatar/bob/{size}/1.png",
            "created_at": "2021-03-01T10:00:00.000Z",
            "cooked": "<p>Agreed</p>"
        });

        let event = Platform::Discourse.normalize(&item).unwrap();
        assert_eq!(event.id, "42#3");
        assert_eq!(event.reply_target.as_deref(), Some("42#1"));
        assert_eq!(event.correlation_key, CorrelationKey::Thread("42".into()));
        assert_eq!(event.author, ActorId::known("bob"));
        assert_eq!(event.body_format, BodyFormat::Markup);
        assert_eq!(event.kind, EventKind::Post);
        assert_eq!(event.extra["post_id"], "981");
        assert_eq!(event.extra["slug"], "welcome");
        assert_eq!(event.extra["category"], "7");
        assert_eq!(event.profile.full_name.as_deref(), Some("Bob B."));
        assert_eq!(event.profile.avatar_url.as_deref(), Some("/user_avatar/bob/120/1.png"));
    }

    #[test]
    fn test_discourse_first_post_has_no_reply_target() {
        let item = json!({
            "id": 980, "post_number": 1, "reply_to_post_number": null, "topic_id": 42,
            "username": "alice", "created_at": "2021-03-01T09:00:00Z", "cooked": ""
        });
        let event = Platform::Discourse.normalize(&item).unwrap();
        assert_eq!(event.reply_target, None);
    }

    #[test]
    fn test_missing_id_and_timestamp_are_rejected() {
        let no_id = json!({ "topic_id": 1, "created_at": "2021-03-01T09:00:00Z" });
        assert_eq!(
            Platform::Discourse.normalize(&no_id),
            Err(IngestError::missing("id"))
        );

        let no_time = json!({ "id": 1, "topic_id": 1 });
        assert_eq!(
            Platform::Discourse.normalize(&no_time),
            Err(IngestError::missing("timestamp"))
        );

        let bad_time = json!({ "id": 1, "topic_id": 1, "created_at": "yesterday" });
        assert!(matches!(
            Platform::Discourse.normalize(&bad_time),
            Err(IngestError::MalformedPayload { field: "timestamp", .. })
        ));
    }

    #[test]
    fn test_absent_author_is_unresolved() {
        let item = json!({ "id": 5, "topic_id": 1, "created_at": "2021-03-01T09:00:00Z" });
        let event = Platform::Discourse.normalize(&item).unwrap();
        assert!(event.author.is_unresolved());
    }

    #[test]
    fn test_github_merge_points_from_merger_to_author() {
        let item = json!({
            "kind": "merge",
            "id": 77,
            "number": 12,
            "repository": "acme/widgets",
            "merged_at": "2020-06-01T12:00:00Z",
            "merged_by": { "login": "maintainer" },
            "user": { "login": "contributor" },
            "title": "Fix widget"
        });

        let event = Platform::Github.normalize(&item).unwrap();
        assert_eq!(event.kind, EventKind::Merge);
        assert_eq!(event.author, ActorId::known("maintainer"));
        assert_eq!(event.targets, vec![ActorId::known("contributor")]);
        assert_eq!(event.correlation_key, CorrelationKey::Thread("acme/widgets#12".into()));
        assert_eq!(event.extra["title"], "Fix widget");
    }

    #[test]
    fn test_github_assignment_targets_every_assignee() {
        let item = json!({
            "kind": "issue_assignment",
            "id": "a-1",
            "issue_number": 4,
            "created_at": "2020-06-01T12:00:00Z",
            "user": { "login": "owner" },
            "assignees": [{ "login": "dev1" }, { "login": "dev2" }]
        });

        let event = Platform::Github.normalize(&item).unwrap();
        assert_eq!(event.targets, vec![ActorId::known("dev1"), ActorId::known("dev2")]);
        assert_eq!(event.correlation_key, CorrelationKey::Thread("#4".into()));
    }

    #[test]
    fn test_github_commit_and_its_comments_share_a_thread() {
        let commit = json!({
            "kind": "commit", "sha": "abc123", "repository": "acme/widgets",
            "commit": { "author": { "date": "2020-06-01T12:00:00Z", "email": "a@example.com" }, "message": "Initial" },
            "author": { "login": "alice" }
        });
        let comment = json!({
            "kind": "commit_comment", "id": 9, "commit_id": "abc123", "repository": "acme/widgets",
            "created_at": "2020-06-02T12:00:00Z", "user": { "login": "bob" }, "body": "nice @alice"
        });

        let commit = Platform::Github.normalize(&commit).unwrap();
        let comment = Platform::Github.normalize(&comment).unwrap();
        assert_eq!(commit.id, "abc123");
        assert_eq!(commit.profile.email.as_deref(), Some("a@example.com"));
        assert_eq!(commit.correlation_key, comment.correlation_key);
        assert_eq!(comment.correlation_key, CorrelationKey::Thread("acme/widgets@abc123".into()));
    }

    #[test]
    fn test_github_member_listings() {
        let stargazer = json!({
            "kind": "stargazer", "id": 31, "login": "fan", "repository": "acme/widgets",
            "starred_at": "2020-06-01T12:00:00Z"
        });
        let event = Platform::Github.normalize(&stargazer).unwrap();
        assert_eq!(event.kind, EventKind::Star);
        assert_eq!(event.author, ActorId::known("fan"));
        assert_eq!(event.correlation_key, CorrelationKey::Repository("acme/widgets".into()));
        assert!(event.targets.is_empty());

        for (label, kind) in [
            ("watcher", EventKind::Watch),
            ("subscriber", EventKind::Subscription),
            ("collaborator", EventKind::Collaborator),
            ("contributor", EventKind::Contributor),
            ("owner", EventKind::RepositoryOwner),
        ] {
            let item = json!({
                "kind": label, "id": 7, "user": { "login": "member" }, "repository": "acme/widgets",
                "created_at": "2020-06-01T12:00:00Z"
            });
            let event = Platform::Github.normalize(&item).unwrap();
            assert_eq!(event.kind, kind, "{label}");
            assert_eq!(event.author, ActorId::known("member"));
        }
    }

    #[test]
    fn test_github_unknown_kind_is_rejected() {
        let item = json!({ "kind": "sponsor", "id": 1, "created_at": "2020-06-01T12:00:00Z" });
        assert!(matches!(
            Platform::Github.normalize(&item),
            Err(IngestError::MalformedPayload { field: "kind", .. })
        ));
    }

    #[test]
    fn test_git_record_keys_on_file_path() {
        let item = json!({
            "commit": "deadbeef",
            "date": "Thu, 4 Jul 2019 18:30:05 +0200",
            "author": "Jane Doe",
            "email": "Jane@Example.com",
            "message": "Fix-the-parser",
            "path": "src/parser.rs"
        });

        let event = Platform::Git.normalize(&item).unwrap();
        assert_eq!(event.correlation_key, CorrelationKey::File("src/parser.rs".into()));
        assert_eq!(event.kind, EventKind::Commit);
        assert_eq!(event.body, "Fix the parser");
        assert_eq!(event.profile.email.as_deref(), Some("jane@example.com"));
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2019, 7, 4, 16, 30, 5).unwrap()
        );
    }

    #[test]
    fn test_git_record_without_path_is_rejected() {
        let item = json!({ "commit": "deadbeef", "date": 1_600_000_000, "author": "jane" });
        assert_eq!(Platform::Git.normalize(&item), Err(IngestError::missing("path")));
    }

    #[test]
    fn test_mail_targets_to_and_cc_recipients() {
        let item = json!({
            "message_id": "<m1@lists.example.org>",
            "date": "Mon, 2 Jan 2017 08:00:00 +0000",
            "from": "\"Doe, Jane\" <Jane@Example.org>",
            "to": "dev@lists.example.org, \"Roe, Rick\" <rick@example.org>",
            "cc": ["ann@example.org"],
            "subject": "Release plan",
            "list": "dev"
        });

        let event = Platform::Mailman.normalize(&item).unwrap();
        assert_eq!(event.author, ActorId::known("jane@example.org"));
        assert_eq!(event.profile.full_name.as_deref(), Some("Doe, Jane"));
        assert_eq!(
            event.targets,
            vec![
                ActorId::known("dev@lists.example.org"),
                ActorId::known("rick@example.org"),
                ActorId::known("ann@example.org"),
            ]
        );
        assert_eq!(event.correlation_key, CorrelationKey::Thread("dev".into()));
        assert_eq!(event.extra["title"], "Release plan");
    }

    #[test]
    fn test_twitter_follow() {
        let item = json!({ "id": "f1", "follower": "ann", "followed": "bob", "action": "follow", "at": 1_500_000_000 });
        let event = Platform::Twitter.normalize(&item).unwrap();
        assert_eq!(event.kind, EventKind::Follow);
        assert_eq!(event.author, ActorId::known("ann"));
        assert_eq!(event.targets, vec![ActorId::known("bob")]);

        let retweet = json!({ "id": "f2", "follower": "ann", "followed": "bob", "action": "mail", "at": 1 });
        assert!(Platform::Twitter.normalize(&retweet).is_err());
    }

    #[test]
    fn test_generic_event_layout() {
        let item = json!({
            "id": "e2",
            "timestamp": "2022/05/01-09:00:00",
            "author": "bob",
            "kind": "issue_comment",
            "body": "ping @alice",
            "thread": "issue-7",
            "reply_to": "e1",
            "extra": { "title": "Crash", "number": 7, "skip": null }
        });

        let event = Platform::Generic.normalize(&item).unwrap();
        assert_eq!(event.kind, EventKind::IssueComment);
        assert_eq!(event.correlation_key, CorrelationKey::Thread("issue-7".into()));
        assert_eq!(event.reply_target.as_deref(), Some("e1"));
        assert_eq!(event.body_format, BodyFormat::PlainText);
        assert_eq!(event.extra["number"], "7");
        assert!(!event.extra.contains_key("skip"));
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2022, 5, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_serialized_events_normalize_back_unchanged() {
        let mut event = Event::new(
            "abc",
            Utc.with_ymd_and_hms(2020, 2, 1, 12, 0, 0).unwrap(),
            ActorId::known("X"),
            EventKind::Commit,
            CorrelationKey::File("src/main.rs".into()),
        )
        .with_body("Update file", BodyFormat::PlainText)
        .with_extra("repository", "acme/widgets");
        event.profile.email = Some("x@example.com".into());

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(Platform::Generic.normalize(&value).unwrap(), event);
    }

    #[test]
    fn test_generic_event_requires_kind() {
        let item = json!({ "id": "e2", "timestamp": 1_600_000_000, "thread": "t" });
        assert_eq!(Platform::Generic.normalize(&item), Err(IngestError::missing("kind")));
    }

    #[test]
    fn test_correlation_hint_survives_malformed_items() {
        let broken = json!({ "topic_id": 42, "username": "bob" });
        assert!(Platform::Discourse.normalize(&broken).is_err());
        assert_eq!(
            Platform::Discourse.correlation_hint(&broken),
            Some(CorrelationKey::Thread("42".into()))
        );
        assert_eq!(Platform::Git.correlation_hint(&json!({})), None);
    }

    #[test]
    fn test_timestamp_layouts() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        for raw in [
            "2020-01-02T03:04:05Z",
            "2020-01-02T05:04:05+02:00",
            "Thu, 2 Jan 2020 03:04:05 +0000",
            "2020/01/02-03:04:05",
            "2020-01-02T03:04:05",
            "2020-01-02 03:04:05",
            "1577934245",
        ] {
            assert_eq!(parse_timestamp_str(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_timestamp(&json!(1577934245)), Some(expected));
        assert_eq!(parse_timestamp(&json!(true)), None);
        assert_eq!(parse_timestamp_str("not a date"), None);
    }

    #[test]
    fn test_platform_parse() {
        assert_eq!(Platform::parse("GitHub"), Some(Platform::Github));
        assert_eq!(Platform::parse("slack"), None);
    }
}
