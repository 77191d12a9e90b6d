//! Analysis configuration schema and loading.
//!
//! Settings live in a TOML file, by default `config.toml` in the platform
//! config directory (e.g. `~/.config/sociogram/`). `SOCIOGRAM_CONFIG`
//! points at another file. Every key is optional.
//!
//! ```toml
//! self_loops = false
//! focus = "user"
//! structure = "combined"
//! collapse_multi_edges = true
//! joined_discussion_window = 50
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use sociogram_graph::{ConsolidationOptions, Focus, Structure};

use crate::builder::BuildOptions;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "SOCIOGRAM_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Keep self-loops; `false` removes them during consolidation.
    pub self_loops: bool,

    /// Global series or one series per actor.
    pub focus: Focus,

    /// `"combined"` for a single interaction count, anything else for one
    /// column per interaction type.
    pub structure: Structure,

    /// Also produce a weighted graph with one edge per ordered actor pair.
    pub collapse_multi_edges: bool,

    /// Year stamped on every edge; the current year when unset.
    pub observation_year: Option<i32>,

    /// Cap on earlier participants linked by joined-discussion edges.
    pub joined_discussion_window: Option<usize>,

    /// Rewrite git authors to platform logins when they can be matched.
    pub link_identities: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            self_loops: true,
            focus: Focus::default(),
            structure: Structure::default(),
            collapse_multi_edges: false,
            observation_year: None,
            joined_discussion_window: None,
            link_identities: true,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `default_path`, or defaults when no location is known.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// `SOCIOGRAM_CONFIG` if set, else `config.toml` in the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        Self::resolve_path(std::env::var_os(CONFIG_ENV))
    }

    fn resolve_path(from_env: Option<OsString>) -> Option<PathBuf> {
        if let Some(path) = from_env {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("org", "sociogram", "sociogram")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            joined_discussion_window: self.joined_discussion_window,
        }
    }

    pub fn consolidation_options(&self) -> ConsolidationOptions {
        ConsolidationOptions {
            self_loops: self.self_loops,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnalysisConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert!(config.self_loops);
        assert!(config.link_identities);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "self_loops = false\nfocus = \"user\"\nstructure = \"combined\"").unwrap();
        writeln!(file, "joined_discussion_window = 25").unwrap();

        let config = AnalysisConfig::load(file.path()).unwrap();
        assert!(!config.self_loops);
        assert_eq!(config.focus, Focus::User);
        assert_eq!(config.structure, Structure::Combined);
        assert_eq!(config.build_options().joined_discussion_window, Some(25));
        assert!(!config.collapse_multi_edges);
        assert!(!config.consolidation_options().self_loops);
    }

    #[test]
    fn test_unknown_structure_means_per_type() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "structure = \"by-kind\"").unwrap();
        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.structure, Structure::PerType);
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "self_loops = maybe").unwrap();
        let err = AnalysisConfig::load(file.path()).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides_default_path() {
        assert_eq!(
            AnalysisConfig::resolve_path(Some(OsString::from("/tmp/sociogram-test.toml"))),
            Some(PathBuf::from("/tmp/sociogram-test.toml"))
        );
    }

    #[test]
    fn test_default_path_is_a_config_toml() {
        if let Some(path) = AnalysisConfig::resolve_path(None) {
            assert!(path.ends_with("config.toml"));
        }
    }
}
