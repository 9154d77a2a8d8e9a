//! Application configuration.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. a TOML file (`--config`, else `config.toml` in the platform config dir)
//! 3. `OCRFIND_*` environment variables
//! 4. command-line flags ([`Config::with_overrides`])
//!
//! The merged result is checked once by [`Config::validate`]; nothing
//! downstream re-validates.

use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::Cli;
use crate::merge::{ConflictSafeNamer, MergeConfig, MergeLayout, OriginalPlacement, DEFAULT_UNRESOLVED_DIR};
use crate::search::{
    ArchiveLayout, PhaseKind, ScanOptions, SearchConfig, SearchPhase, StopPolicy,
    DEFAULT_POOL_CEILING,
};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "OCRFIND_";

/// Fatal configuration or setup problem. The run does not start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The working directory does not exist.
    #[error("working directory not found: {0}")]
    WorkingDirMissing(PathBuf),

    /// The working path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The working directory cannot be listed.
    #[error("cannot read working directory {path}: {source}")]
    WorkingDirUnreadable {
        /// Working directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    FileMissing(PathBuf),

    /// A phase name is not recognised.
    #[error("unknown phase '{name}'{}", .suggestion.as_ref().map(|s| format!(", did you mean '{s}'?")).unwrap_or_default())]
    UnknownPhase {
        /// Name as given.
        name: String,
        /// Closest known phase name, if any is close.
        suggestion: Option<String>,
    },

    /// Neither dated nor archive roots are configured.
    #[error("no archive roots configured (set dated_roots or archive_roots)")]
    NoArchiveRoots,

    /// Any other invalid setting.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The layered sources could not be merged or deserialized.
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Date-partitioned roots; `{year}` expands to the partition year.
    pub dated_roots: Vec<String>,
    /// Roots searched whole by the full-archive phase.
    pub archive_roots: Vec<PathBuf>,
    /// Override scans substituted before searching.
    pub override_dir: Option<PathBuf>,
    /// Extensions skipped everywhere (without dot, case-insensitive).
    pub ignored_extensions: Vec<String>,
    /// Phase order by name.
    pub phases: Vec<String>,
    /// Stop at the first phase with a match, or run all.
    pub stop_policy: StopPolicy,
    /// Days probed by the recent-days phase.
    pub recent_days: u32,
    /// Thread ceiling for each phase pool.
    pub pool_ceiling: usize,
    /// Base names searched concurrently.
    pub search_workers: usize,
    /// Folder or flat merge.
    pub layout: MergeLayout,
    /// Treatment of the working original.
    pub original: OriginalPlacement,
    /// Bucket for unresolved files, relative to the working directory.
    pub unresolved_dir: String,
    /// Descend into symlinked archive directories.
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dated_roots: Vec::new(),
            archive_roots: Vec::new(),
            override_dir: None,
            ignored_extensions: vec!["db".to_string()],
            phases: PhaseKind::DEFAULT_ORDER
                .iter()
                .map(|k| k.name().to_string())
                .collect(),
            stop_policy: StopPolicy::EarlyStop,
            recent_days: 365,
            pool_ceiling: DEFAULT_POOL_CEILING,
            search_workers: 8,
            layout: MergeLayout::Folders,
            original: OriginalPlacement::Rename,
            unresolved_dir: DEFAULT_UNRESOLVED_DIR.to_string(),
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Default config file location, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "ocrfind", "ocrfind")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load defaults, the config file and the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileMissing`] for a missing explicit file, or
    /// [`ConfigError::Figment`] for malformed TOML or values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(path)?
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Defaults plus config file, without the environment layer.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileMissing`] for a missing explicit file.
    pub fn figment(path: Option<&Path>) -> Result<Figment, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileMissing(path.to_path_buf()));
                }
                log::debug!("Loading configuration from {}", path.display());
                Ok(figment.merge(Toml::file(path)))
            }
            None => Ok(match Self::default_path() {
                Some(path) => {
                    log::debug!("Checking for configuration at {}", path.display());
                    figment.merge(Toml::file(path))
                }
                None => figment,
            }),
        }
    }

    /// Apply command-line overrides.
    #[must_use]
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if !cli.dated_roots.is_empty() {
            self.dated_roots.clone_from(&cli.dated_roots);
        }
        if !cli.archive_roots.is_empty() {
            self.archive_roots.clone_from(&cli.archive_roots);
        }
        if cli.no_override {
            self.override_dir = None;
        } else if let Some(dir) = &cli.override_dir {
            self.override_dir = Some(dir.clone());
        }
        if let Some(policy) = cli.policy {
            self.stop_policy = policy;
        }
        if let Some(layout) = cli.layout {
            self.layout = layout;
        }
        if let Some(original) = cli.original {
            self.original = original;
        }
        if let Some(days) = cli.recent_days {
            self.recent_days = days;
        }
        if let Some(workers) = cli.workers {
            self.search_workers = workers;
        }
        if let Some(ceiling) = cli.pool_ceiling {
            self.pool_ceiling = ceiling;
        }
        if let Some(phases) = &cli.phases {
            self.phases.clone_from(phases);
        }
        if cli.follow_symlinks {
            self.follow_symlinks = true;
        }
        self
    }

    /// Check the merged settings.
    ///
    /// # Errors
    ///
    /// The first problem found, as a [`ConfigError`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dated_roots.is_empty() && self.archive_roots.is_empty() {
            return Err(ConfigError::NoArchiveRoots);
        }
        if self.pool_ceiling == 0 {
            return Err(ConfigError::Invalid("pool_ceiling must be at least 1".into()));
        }
        if self.search_workers == 0 {
            return Err(ConfigError::Invalid("search_workers must be at least 1".into()));
        }
        if self.layout == MergeLayout::Flat && self.original == OriginalPlacement::Distribute {
            return Err(ConfigError::Invalid(
                "original = \"distribute\" requires layout = \"folders\"".into(),
            ));
        }
        let bucket = self.unresolved_dir.trim();
        if bucket.is_empty() || bucket.contains(['/', '\\', MAIN_SEPARATOR]) || bucket == ".." {
            return Err(ConfigError::Invalid(format!(
                "unresolved_dir must be a plain folder name, got '{}'",
                self.unresolved_dir
            )));
        }
        self.phase_kinds().map(|_| ())
    }

    /// Parse the phase names in order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownPhase`] with a suggestion, or
    /// [`ConfigError::Invalid`] for an empty or repeated list.
    pub fn phase_kinds(&self) -> Result<Vec<PhaseKind>, ConfigError> {
        if self.phases.is_empty() {
            return Err(ConfigError::Invalid("at least one phase is required".into()));
        }
        let mut kinds: Vec<PhaseKind> = Vec::with_capacity(self.phases.len());
        for name in &self.phases {
            let name = name.trim();
            let kind = name.parse::<PhaseKind>().map_err(|_| ConfigError::UnknownPhase {
                name: name.to_string(),
                suggestion: suggest_phase(name),
            })?;
            if kinds.contains(&kind) {
                return Err(ConfigError::Invalid(format!("phase '{kind}' listed twice")));
            }
            kinds.push(kind);
        }
        Ok(kinds)
    }

    /// Search settings derived from this configuration.
    ///
    /// # Errors
    ///
    /// Phase parsing errors, see [`Config::phase_kinds`].
    pub fn search_config(&self) -> Result<SearchConfig, ConfigError> {
        Ok(SearchConfig {
            phases: self
                .phase_kinds()?
                .into_iter()
                .map(SearchPhase::new)
                .collect(),
            policy: self.stop_policy,
            layout: ArchiveLayout {
                dated_roots: self.dated_roots.clone(),
                archive_roots: self.archive_roots.clone(),
                recent_days: self.recent_days,
            },
            pool_ceiling: self.pool_ceiling,
            scan: ScanOptions {
                follow_symlinks: self.follow_symlinks,
            },
        })
    }

    /// Merge settings derived from this configuration.
    #[must_use]
    pub fn merge_config(&self) -> MergeConfig {
        MergeConfig {
            layout: self.layout,
            original: self.original,
            ignored_extensions: self.ignored_extensions.clone(),
            unresolved_dir: self.unresolved_dir.trim().to_string(),
            namer: ConflictSafeNamer::default(),
        }
    }

    /// Render as TOML for `--show-config`.
    ///
    /// # Errors
    ///
    /// Serialization failure from `toml`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Check that `path` is a readable directory.
///
/// # Errors
///
/// The matching working-directory [`ConfigError`].
pub fn check_working_dir(path: &Path) -> Result<(), ConfigError> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::WorkingDirMissing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(ConfigError::WorkingDirUnreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if !meta.is_dir() {
        return Err(ConfigError::NotADirectory(path.to_path_buf()));
    }
    std::fs::read_dir(path).map_err(|source| ConfigError::WorkingDirUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn suggest_phase(name: &str) -> Option<String> {
    PhaseKind::DEFAULT_ORDER
        .iter()
        .map(|k| (k.name(), strsim::jaro_winkler(name, k.name())))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n.to_string())
}
