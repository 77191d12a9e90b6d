pub mod build;
#[cfg(feature = "local-git")]
pub mod git;
pub mod series;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use sociogram_core::{AnalysisConfig, AnalysisInput, RawBatch};
use sociogram_graph::Focus;
use sociogram_ingest::Platform;

/// One `--input PLATFORM[@SCOPE]:FILE` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub platform: Platform,
    /// Inputs naming the same scope group their events together
    pub scope: Option<String>,
    pub path: PathBuf,
}

pub fn parse_input(s: &str) -> Result<InputSpec, String> {
    let (platform, path) = s
        .split_once(':')
        .ok_or_else(|| format!("expected PLATFORM[@SCOPE]:FILE, got '{}'", s))?;
    let (platform, scope) = match platform.split_once('@') {
        Some((_, "")) => return Err("empty scope after '@'".to_string()),
        Some((platform, scope)) => (platform, Some(scope.to_string())),
        None => (platform, None),
    };
    let platform = Platform::parse(platform).ok_or_else(|| {
        let known: Vec<&str> = Platform::ALL.iter().map(|p| p.as_str()).collect();
        format!("unknown platform '{}' (one of: {})", platform, known.join(", "))
    })?;
    if path.is_empty() {
        return Err("missing file after platform".to_string());
    }
    Ok(InputSpec {
        platform,
        scope,
        path: PathBuf::from(path),
    })
}

pub fn parse_focus(s: &str) -> Result<Focus, String> {
    match s.trim().to_lowercase().as_str() {
        "global" => Ok(Focus::Global),
        "user" => Ok(Focus::User),
        other => Err(format!("unknown focus '{}' (global or user)", other)),
    }
}

#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Payload file as PLATFORM[@SCOPE]:FILE (discourse, github, git, mailman, twitter, generic).
    /// Each file is its own scope unless several name the same SCOPE.
    #[arg(short, long = "input", value_name = "PLATFORM[@SCOPE]:FILE", value_parser = parse_input)]
    pub inputs: Vec<InputSpec>,

    /// Also scan a local repository's per-file history
    #[cfg(feature = "local-git")]
    #[arg(long, value_name = "REPO")]
    pub git: Option<PathBuf>,
}

impl InputArgs {
    pub fn load(&self) -> Result<AnalysisInput> {
        let mut input = AnalysisInput::new();
        for spec in &self.inputs {
            let mut batch = RawBatch::from_path(spec.platform, &spec.path)?;
            batch.scope = spec.scope.clone();
            tracing::debug!(
                "Loaded {} {} items from {}",
                batch.items.len(),
                spec.platform,
                spec.path.display()
            );
            input = input.with_batch(batch);
        }

        #[cfg(feature = "local-git")]
        if let Some(repo) = &self.git {
            let extractor = sociogram_ingest::extractors::LocalGitExtractor::new();
            let (events, result) = extractor.extract(repo)?;
            crate::ui::info(&format!(
                "{}: {} commits, {} files, {} events",
                result.repository, result.commits_scanned, result.files_processed, result.events_extracted
            ));
            input = input.with_events(events);
        }

        if input.batches.is_empty() && input.events.is_empty() {
            anyhow::bail!("No input given. Pass at least one --input PLATFORM:FILE");
        }
        Ok(input)
    }
}

/// Command-line overrides for config file settings.
#[derive(Args, Debug, Clone, Default)]
pub struct AnalysisArgs {
    /// Remove self-loops during consolidation
    #[arg(long)]
    pub no_self_loops: bool,

    /// Collapse parallel edges into weighted ones
    #[arg(long)]
    pub collapse: bool,

    /// Year stamped on every edge
    #[arg(long)]
    pub year: Option<i32>,

    /// Max earlier participants a joined-discussion edge reaches back to
    #[arg(long)]
    pub window: Option<usize>,

    /// Keep git authors as they are instead of matching platform logins
    #[arg(long)]
    pub no_identity_linking: bool,
}

impl AnalysisArgs {
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if self.no_self_loops {
            config.self_loops = false;
        }
        if self.collapse {
            config.collapse_multi_edges = true;
        }
        if let Some(year) = self.year {
            config.observation_year = Some(year);
        }
        if let Some(window) = self.window {
            config.joined_discussion_window = Some(window);
        }
        if self.no_identity_linking {
            config.link_identities = false;
        }
    }
}

pub fn load_config(path: Option<&Path>, overrides: &AnalysisArgs) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            AnalysisConfig::load(path)?
        }
        None => AnalysisConfig::load_default()?,
    };
    overrides.apply(&mut config);
    Ok(config)
}

/// Write to a file, or stdout when no path is given.
pub fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            crate::ui::success(&format!("Wrote {}", path.display()));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", contents)?;
        }
    }
    Ok(())
}
