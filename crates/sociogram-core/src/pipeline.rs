//! End-to-end analysis run.
//!
//! normalize → link identities → group → order → build → consolidate
//!
//! Correlation groups are scoped to the batch they came from: two forums
//! that both have a topic 9 are two groups. Batches that cover the same
//! source (issues and their comments fetched separately) share a scope by
//! setting the same `scope` label.
//!
//! A payload item that cannot be normalized poisons its whole correlation
//! group within its scope: the group is skipped and the run continues with
//! the others. Consolidation errors abort the run.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use sociogram_graph::{
    collapse, ConsolidationReport, Consolidator, Focus, GraphError, GraphExport, InteractionGraph,
    Projection, Structure, WeightedGraph,
};
use sociogram_ingest::{
    group_by_correlation, order, CorrelationKey, Event, IdentityLinker, Platform,
};

use crate::builder::{BuildStats, InteractionGraphBuilder};
use crate::config::AnalysisConfig;

/// Scope shared by all pre-normalized events of an `AnalysisInput`.
pub const COLLECTED_SCOPE: &str = "collected";

/// Raw items fetched from one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBatch {
    pub platform: Platform,
    pub items: Vec<Value>,
    /// Batches with the same scope group their events together; `None`
    /// keeps the batch to itself.
    #[serde(default)]
    pub scope: Option<String>,
}

impl RawBatch {
    pub fn new(platform: Platform, items: Vec<Value>) -> Self {
        Self {
            platform,
            items,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Read a JSON array of items, or an object with an `items` array.
    pub fn from_path(platform: Platform, path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload file: {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse payload file: {}", path.display()))?;

        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut object) => match object.remove("items") {
                Some(Value::Array(items)) => items,
                _ => anyhow::bail!("{} has no `items` array", path.display()),
            },
            _ => anyhow::bail!("{} is neither an array nor an object", path.display()),
        };

        Ok(Self::new(platform, items))
    }
}

/// Everything an analysis run consumes.
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub batches: Vec<RawBatch>,
    /// Already-normalized version-control events (e.g. from a local git scan)
    pub events: Vec<Event>,
}

impl AnalysisInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(mut self, batch: RawBatch) -> Self {
        self.batches.push(batch);
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        self.events.extend(events);
        self
    }
}

/// A group, or a lone item, left out of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedGroup {
    /// Scope the group belongs to
    pub scope: String,
    /// `None` when a broken item did not even reveal its group
    pub key: Option<CorrelationKey>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    /// Events that made it into a group
    pub events: usize,
    pub groups_built: usize,
    pub skipped: Vec<SkippedGroup>,
    pub identity_links: usize,
    pub build: BuildStats,
    pub consolidation: ConsolidationReport,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub graph: InteractionGraph,
    /// Present when `collapse_multi_edges` is set
    pub collapsed: Option<WeightedGraph>,
    pub report: RunReport,
}

impl AnalysisOutput {
    /// Export the collapsed graph if there is one, else the multigraph.
    pub fn export(&self) -> GraphExport {
        match &self.collapsed {
            Some(weighted) => GraphExport::from(weighted),
            None => GraphExport::from(&self.graph),
        }
    }

    pub fn project(&self, focus: Focus, structure: Structure) -> Result<Projection, GraphError> {
        sociogram_graph::project(&self.graph, focus, structure)
    }
}

pub struct Analysis {
    config: AnalysisConfig,
    builder: InteractionGraphBuilder,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Self {
        let builder = InteractionGraphBuilder::new(config.build_options());
        Self { config, builder }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[instrument(skip_all, fields(batches = input.batches.len(), collected = input.events.len()))]
    pub fn run(&self, input: AnalysisInput) -> Result<AnalysisOutput> {
        let mut report = RunReport::default();
        let mut poisoned: BTreeMap<(String, CorrelationKey), String> = BTreeMap::new();
        let mut normalized: Vec<ScopedEvent> = Vec::new();

        for (index, batch) in input.batches.iter().enumerate() {
            let scope = batch
                .scope
                .clone()
                .unwrap_or_else(|| format!("batch-{}", index));
            for item in &batch.items {
                match batch.platform.normalize(item) {
                    Ok(event) => normalized.push(ScopedEvent {
                        scope: scope.clone(),
                        platform: batch.platform,
                        event,
                    }),
                    Err(err) => match batch.platform.correlation_hint(item) {
                        Some(key) => {
                            warn!(platform = %batch.platform, %scope, group = %key, "Skipping group: {}", err);
                            poisoned
                                .entry((scope.clone(), key))
                                .or_insert_with(|| err.to_string());
                        }
                        None => {
                            warn!(platform = %batch.platform, %scope, "Dropping item without a group: {}", err);
                            report.skipped.push(SkippedGroup {
                                scope: scope.clone(),
                                key: None,
                                reason: err.to_string(),
                            });
                        }
                    },
                }
            }
        }
        normalized.extend(input.events.into_iter().map(|event| ScopedEvent {
            scope: COLLECTED_SCOPE.to_string(),
            platform: Platform::Git,
            event,
        }));

        if self.config.link_identities {
            let mut linker = IdentityLinker::new();
            let platform_commits = normalized
                .iter()
                .filter(|scoped| scoped.platform == Platform::Github)
                .map(|scoped| &scoped.event);
            if linker.learn(platform_commits) > 0 {
                let vcs_events = normalized
                    .iter_mut()
                    .filter(|scoped| scoped.platform == Platform::Git)
                    .map(|scoped| &mut scoped.event);
                report.identity_links = linker.apply(vcs_events).len();
            }
        }

        // Scopes in first-appearance order, each with its surviving events.
        let mut scopes: Vec<(String, Vec<Event>)> = Vec::new();
        for ScopedEvent { scope, event, .. } in normalized {
            if poisoned.contains_key(&(scope.clone(), event.correlation_key.clone())) {
                continue;
            }
            match scopes.iter_mut().find(|(name, _)| *name == scope) {
                Some((_, events)) => events.push(event),
                None => scopes.push((scope, vec![event])),
            }
        }
        report.events = scopes.iter().map(|(_, events)| events.len()).sum();
        report.skipped.extend(poisoned.into_iter().map(|((scope, key), reason)| SkippedGroup {
            scope,
            key: Some(key),
            reason,
        }));

        let year = self
            .config
            .observation_year
            .unwrap_or_else(|| Utc::now().year());
        let mut graph = InteractionGraph::new(year);

        for (scope, events) in scopes {
            for (key, group_events) in group_by_correlation(events) {
                let group = match order(key.clone(), group_events) {
                    Ok(group) => group,
                    Err(err) => {
                        warn!(%scope, group = %key, "Skipping group: {}", err);
                        report.skipped.push(SkippedGroup {
                            scope: scope.clone(),
                            key: Some(key),
                            reason: err.to_string(),
                        });
                        continue;
                    }
                };

                // Build in isolation, then merge with fresh keys.
                let mut local = InteractionGraph::new(year);
                report.build += self.builder.build_group(&mut local, &group);
                graph.absorb(local);
                report.groups_built += 1;
            }
        }

        info!(
            "Built {} groups into {} edges ({} unresolved reply targets, {} skipped)",
            report.groups_built,
            report.build.edges(),
            report.build.unresolved_reply_targets,
            report.skipped.len()
        );

        report.consolidation = Consolidator::new(self.config.consolidation_options())
            .consolidate(&mut graph)
            .context("Graph consolidation failed")?;

        let collapsed = self.config.collapse_multi_edges.then(|| collapse(&graph));

        Ok(AnalysisOutput {
            graph,
            collapsed,
            report,
        })
    }
}

/// A normalized event and where it came from.
struct ScopedEvent {
    scope: String,
    platform: Platform,
    event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_path_accepts_array_or_items_object() {
        let mut array = NamedTempFile::new().unwrap();
        write!(array, "{}", json!([{ "id": 1 }, { "id": 2 }])).unwrap();
        let batch = RawBatch::from_path(Platform::Discourse, array.path()).unwrap();
        assert_eq!(batch.items.len(), 2);

        let mut object = NamedTempFile::new().unwrap();
        write!(object, "{}", json!({ "items": [{ "id": 1 }] })).unwrap();
        let batch = RawBatch::from_path(Platform::Generic, object.path()).unwrap();
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.platform, Platform::Generic);
    }

    #[test]
    fn test_batch_scope_defaults_to_none() {
        let batch = RawBatch::new(Platform::Discourse, vec![]);
        assert_eq!(batch.scope, None);
        assert_eq!(batch.with_scope("forum").scope.as_deref(), Some("forum"));
    }

    #[test]
    fn test_from_path_rejects_scalars() {
        let mut scalar = NamedTempFile::new().unwrap();
        write!(scalar, "42").unwrap();
        assert!(RawBatch::from_path(Platform::Generic, scalar.path()).is_err());
    }

    #[test]
    fn test_observation_year_is_stamped_on_edges() {
        let config = AnalysisConfig {
            observation_year: Some(2016),
            ..AnalysisConfig::default()
        };
        let batch = RawBatch::new(
            Platform::Generic,
            vec![
                json!({ "id": "1", "timestamp": 1, "author": "a", "kind": "post", "thread": "t" }),
                json!({ "id": "2", "timestamp": 2, "author": "b", "kind": "post", "thread": "t" }),
            ],
        );

        let output = Analysis::new(config)
            .run(AnalysisInput::new().with_batch(batch))
            .unwrap();
        assert_eq!(output.graph.observation_year(), 2016);
        assert!(output.graph.edges().iter().all(|e| e.observation_year == 2016));
    }
}
