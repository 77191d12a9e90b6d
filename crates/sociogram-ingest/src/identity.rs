//! Identity linking between platform logins and version-control authors.
//!
//! Git records carry an author name and email; platform commits carry the
//! login of the same person. Linking rewrites git authors to logins so one
//! person is one node across file histories and platform discussions.

use std::collections::HashMap;

use tracing::{debug, info};

use sociogram_graph::ActorId;

use crate::event::{Event, EventKind};

/// How a link was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// The platform reported the login for this exact commit
    CommitSha,
    /// The commit email belongs to a known login
    ExactEmail,
}

/// One rewritten event author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityLink {
    pub event_id: String,
    pub vcs_author: ActorId,
    pub login: ActorId,
    pub match_type: MatchType,
}

/// Commit and email lookups learned from platform events.
#[derive(Debug, Clone, Default)]
pub struct IdentityLinker {
    by_commit: HashMap<String, ActorId>,
    by_email: HashMap<String, ActorId>,
}

impl IdentityLinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn logins from platform commit events (id = sha, author = login).
    ///
    /// Returns the number of commits learned. The first login seen for an
    /// email wins.
    pub fn learn<'a>(&mut self, events: impl IntoIterator<Item = &'a Event>) -> usize {
        let mut learned = 0;
        for event in events
            .into_iter()
            .filter(|event| event.kind == EventKind::Commit && !event.author.is_unresolved())
        {
            self.by_commit.insert(event.id.clone(), event.author.clone());
            if let Some(email) = &event.profile.email {
                self.by_email
                    .entry(email.to_lowercase())
                    .or_insert_with(|| event.author.clone());
            }
            learned += 1;
        }
        debug!("Learned {} commit logins, {} emails", learned, self.by_email.len());
        learned
    }

    /// Register an email manually.
    pub fn link_email(&mut self, email: &str, login: ActorId) {
        self.by_email.insert(email.to_lowercase(), login);
    }

    pub fn is_empty(&self) -> bool {
        self.by_commit.is_empty() && self.by_email.is_empty()
    }

    /// Login for an event's author, by commit sha first, then by email.
    pub fn resolve(&self, event: &Event) -> Option<(&ActorId, MatchType)> {
        if let Some(login) = self.by_commit.get(&event.id) {
            return Some((login, MatchType::CommitSha));
        }
        let email = event.profile.email.as_ref()?.to_lowercase();
        self.by_email
            .get(&email)
            .map(|login| (login, MatchType::ExactEmail))
    }

    /// Rewrite commit authors to platform logins.
    ///
    /// The replaced git name is kept as the author's full name when none is
    /// known. Returns every link made.
    pub fn apply<'a>(&self, events: impl IntoIterator<Item = &'a mut Event>) -> Vec<IdentityLink> {
        let mut links = Vec::new();

        for event in events.into_iter().filter(|event| event.kind == EventKind::Commit) {
            let Some((login, match_type)) = self.resolve(event) else {
                continue;
            };
            if &event.author == login {
                continue;
            }

            let vcs_author = std::mem::replace(&mut event.author, login.clone());
            if event.profile.full_name.is_none() {
                event.profile.full_name = vcs_author.name().map(str::to_string);
            }
            links.push(IdentityLink {
                event_id: event.id.clone(),
                vcs_author,
                login: login.clone(),
                match_type,
            });
        }

        if !links.is_empty() {
            info!("Linked {} commit authors to platform logins", links.len());
        }
        links
    }
}
