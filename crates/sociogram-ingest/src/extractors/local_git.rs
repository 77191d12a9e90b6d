//! Local Git repository extractor.
//!
//! Walks the commit history of a repository on disk and emits one commit
//! event per (commit, touched file). Each file's events form one
//! file-history group, keyed by `CorrelationKey::File(path)`.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, TimeZone, Utc};
use git2::{DiffOptions, Repository, Sort};
use tracing::{debug, info, warn};

use sociogram_graph::ActorId;

use crate::event::{BodyFormat, CorrelationKey, Event, EventKind};

/// Configuration for local git extraction.
#[derive(Debug, Clone)]
pub struct LocalGitConfig {
    /// Days of history to scan; `None` scans everything
    pub history_days: Option<i64>,
    /// Ignore files matching these patterns
    pub ignore_patterns: Vec<String>,
    /// Maximum distinct files to emit events for (default: 10000)
    pub max_files: usize,
}

impl Default for LocalGitConfig {
    fn default() -> Self {
        Self {
            history_days: None,
            ignore_patterns: vec![
                "*.lock".to_string(),
                "package-lock.json".to_string(),
                "yarn.lock".to_string(),
                "Cargo.lock".to_string(),
                "*.min.js".to_string(),
                "*.min.css".to_string(),
            ],
            max_files: 10000,
        }
    }
}

/// Summary of one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Name of the repository (origin remote or directory name)
    pub repository: String,
    pub commits_scanned: usize,
    /// Distinct files with at least one event
    pub files_processed: usize,
    pub events_extracted: usize,
    pub unique_authors: usize,
    pub duration_ms: u64,
}

/// Extractor for local git repositories.
pub struct LocalGitExtractor {
    config: LocalGitConfig,
}

impl LocalGitExtractor {
    pub fn new() -> Self {
        Self {
            config: LocalGitConfig::default(),
        }
    }

    pub fn with_config(config: LocalGitConfig) -> Self {
        Self { config }
    }

    /// Extract per-file commit events from the repository at `repo_path`.
    ///
    /// Events come out newest first; ordering within each file history is
    /// left to the chronology orderer.
    pub fn extract(&self, repo_path: &Path) -> Result<(Vec<Event>, ExtractionResult)> {
        let start_time = std::time::Instant::now();

        let repo = Repository::open(repo_path)
            .with_context(|| format!("Failed to open git repository at {:?}", repo_path))?;

        let repository = self.get_repo_name(&repo, repo_path);
        info!("Scanning git history for: {}", repository);

        let cutoff_ts = self
            .config
            .history_days
            .map(|days| (Utc::now() - Duration::days(days)).timestamp());

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head().context("Repository has no commits")?;

        let mut events = Vec::new();
        let mut files: HashSet<String> = HashSet::new();
        let mut authors: HashSet<ActorId> = HashSet::new();
        let mut commits_scanned = 0;
        let mut limit_logged = false;

        for oid in revwalk {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;

            let commit_time = commit.time().seconds();
            if cutoff_ts.is_some_and(|cutoff| commit_time < cutoff) {
                break;
            }
            let Some(timestamp) = Utc.timestamp_opt(commit_time, 0).single() else {
                warn!("Skipping commit {} with out-of-range time {}", oid, commit_time);
                continue;
            };

            commits_scanned += 1;

            let signature = commit.author();
            let email = signature.email().map(str::to_lowercase).filter(|e| !e.is_empty());
            let author = signature
                .name()
                .filter(|name| !name.trim().is_empty())
                .map(ActorId::known)
                .or_else(|| email.clone().map(ActorId::known))
                .unwrap_or(ActorId::Unresolved);
            authors.insert(author.clone());

            let sha = oid.to_string();
            let message = commit.summary().unwrap_or_default().to_string();

            let parent = commit.parent(0).ok();
            let parent_tree = parent.as_ref().and_then(|p| p.tree().ok());
            let commit_tree = commit.tree().ok();

            let mut diff_opts = DiffOptions::new();
            diff_opts.ignore_whitespace(true);

            let diff = repo
                .diff_tree_to_tree(parent_tree.as_ref(), commit_tree.as_ref(), Some(&mut diff_opts))
                .with_context(|| format!("Failed to diff commit {}", sha))?;

            for delta in diff.deltas() {
                let Some(path) = delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .and_then(|p| p.to_str())
                    .map(|s| s.to_string())
                else {
                    continue;
                };

                if self.should_ignore(&path) {
                    continue;
                }

                if !files.contains(&path) {
                    if files.len() >= self.config.max_files {
                        if !limit_logged {
                            warn!("Reached max files limit ({}), ignoring new files", self.config.max_files);
                            limit_logged = true;
                        }
                        continue;
                    }
                    files.insert(path.clone());
                }

                let mut event = Event::new(
                    sha.clone(),
                    timestamp,
                    author.clone(),
                    EventKind::Commit,
                    CorrelationKey::File(path),
                )
                .with_body(message.clone(), BodyFormat::PlainText)
                .with_extra("repository", repository.clone());
                event.profile.email = email.clone();
                events.push(event);
            }

            if commits_scanned % 100 == 0 {
                debug!("Scanned {} commits, {} file events", commits_scanned, events.len());
            }
        }

        let result = ExtractionResult {
            repository,
            commits_scanned,
            files_processed: files.len(),
            events_extracted: events.len(),
            unique_authors: authors.len(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Extraction complete: {} commits, {} files, {} events, {} authors in {}ms",
            result.commits_scanned,
            result.files_processed,
            result.events_extracted,
            result.unique_authors,
            result.duration_ms
        );

        Ok((events, result))
    }

    /// Get the repository name from its origin remote or path.
    fn get_repo_name(&self, repo: &Repository, path: &Path) -> String {
        if let Ok(remote) = repo.find_remote("origin") {
            if let Some(name) = remote.url().and_then(parse_repo_name_from_url) {
                return name;
            }
        }

        path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Check if a file path should be ignored.
    fn should_ignore(&self, path: &str) -> bool {
        self.config.ignore_patterns.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                path.ends_with(suffix)
            } else {
                path == pattern || path.ends_with(&format!("/{}", pattern))
            }
        })
    }
}

impl Default for LocalGitExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `org/repo` from an SSH or HTTPS remote URL.
fn parse_repo_name_from_url(url: &str) -> Option<String> {
    // git@github.com:org/repo.git
    if url.contains('@') && url.contains(':') && !url.contains("://") {
        let (_, path) = url.split_once(':')?;
        return Some(path.strip_suffix(".git").unwrap_or(path).to_string());
    }

    // https://github.com/org/repo.git
    let path = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"))?;
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() >= 3 {
        let name = parts[1..].join("/");
        return Some(name.strip_suffix(".git").unwrap_or(&name).to_string());
    }

    None
}
