//! One complete pass over a working directory.
//!
//! 1. Override pass: substitute override scans into the working directory.
//! 2. Group the (possibly replaced) files by base name.
//! 3. Search the archive for up to `search_workers` base names at a time.
//! 4. As each search completes, merge its matches on this thread, or move
//!    the base name's files to the unresolved bucket when nothing matched.
//!
//! Searches only read. Every mutation of the working directory happens in
//! step 4 on the coordinating thread, so merges never race each other.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::{check_working_dir, Config, ConfigError};
use crate::error::ExitCode;
use crate::merge::{MergeEngine, MergeReport, OverrideReport, XrayOverridePass};
use crate::progress::{NoProgress, ProgressCallback};
use crate::search::{PhasedSearch, SearchOutcome, WorkerPool};
use crate::signal::CancelToken;
use crate::working::WorkingSet;

/// Totals for one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Distinct base names in the working directory.
    pub base_names: usize,
    /// Base names with at least one match, merged.
    pub resolved: usize,
    /// Base names moved to the unresolved bucket.
    pub unresolved: usize,
    /// Base names left untouched because the run was interrupted.
    pub skipped: usize,
    /// Override substitutions.
    pub overrides: OverrideReport,
    /// Combined merge counts and failures.
    pub merge: MergeReport,
    /// The run was cancelled before every base name was handled.
    pub interrupted: bool,
}

impl RunSummary {
    /// Failed operations across the override pass and all merges.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.overrides.failures.len() + self.merge.failures.len()
    }

    /// Process exit code for this outcome.
    ///
    /// Interruption wins, then failed operations, then unresolved names.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.interrupted {
            ExitCode::Interrupted
        } else if self.failure_count() > 0 {
            ExitCode::PartialSuccess
        } else if self.unresolved > 0 {
            ExitCode::Unresolved
        } else {
            ExitCode::Success
        }
    }
}

/// Runs searches and merges for one working directory at a time.
pub struct Runner {
    search: PhasedSearch,
    merge: crate::merge::MergeConfig,
    overrides: XrayOverridePass,
    ignored_extensions: Vec<String>,
    search_workers: usize,
    today: Option<NaiveDate>,
    progress: Arc<dyn ProgressCallback>,
    cancel: CancelToken,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("search", &self.search)
            .field("merge", &self.merge)
            .field("search_workers", &self.search_workers)
            .field("today", &self.today)
            .finish_non_exhaustive()
    }
}

impl Runner {
    /// Build a runner from a validated configuration.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from [`Config::validate`].
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            search: PhasedSearch::new(config.search_config()?),
            merge: config.merge_config(),
            overrides: XrayOverridePass::new(
                config.override_dir.clone(),
                config.ignored_extensions.clone(),
            ),
            ignored_extensions: config.ignored_extensions.clone(),
            search_workers: config.search_workers,
            today: None,
            progress: Arc::new(NoProgress),
            cancel: CancelToken::new(),
        })
    }

    /// Pin the reference date instead of using the local date.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Report per-base-name progress.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Observe an external cancellation token (Ctrl+C).
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process `working_dir`.
    ///
    /// # Errors
    ///
    /// A [`ConfigError`] if the working directory is missing or unreadable.
    /// Search and merge problems never fail the run; they are counted in
    /// the returned [`RunSummary`].
    pub fn run(&self, working_dir: &Path) -> Result<RunSummary, ConfigError> {
        check_working_dir(working_dir)?;
        let today = self.today.unwrap_or_else(|| chrono::Local::now().date_naive());
        let mut summary = RunSummary {
            overrides: self.overrides.run(working_dir),
            ..Default::default()
        };

        let working = WorkingSet::scan(working_dir, &self.ignored_extensions).map_err(|source| {
            ConfigError::WorkingDirUnreadable {
                path: working_dir.to_path_buf(),
                source,
            }
        })?;
        summary.base_names = working.len();
        log::info!(
            "Resolving {} base name(s) in {} (reference date {})",
            working.len(),
            working_dir.display(),
            today
        );
        self.progress.on_start(working.len());

        let jobs: Vec<_> = working
            .into_groups()
            .map(|(base, files)| {
                let search = self.search.clone();
                move |token: &CancelToken| {
                    let outcome = search.search(&base, today, token);
                    (base, files, outcome)
                }
            })
            .collect();

        let engine = MergeEngine::new(working_dir, self.merge.clone());
        let pool = WorkerPool::sized_for(jobs.len(), self.search_workers);
        let batch = pool.run(jobs, &self.cancel, |(base, files, outcome)| {
            self.handle_result(&engine, &base, &files, &outcome, &mut summary)
        });

        summary.skipped += batch.submitted - batch.delivered;
        summary.interrupted |= self.cancel.is_cancelled() || summary.skipped > 0;
        self.progress.on_finish(summary.interrupted);

        if summary.interrupted {
            log::warn!(
                "Interrupted: {} of {} base name(s) left untouched",
                summary.skipped,
                summary.base_names
            );
        }
        Ok(summary)
    }

    fn handle_result(
        &self,
        engine: &MergeEngine,
        base: &str,
        files: &[PathBuf],
        outcome: &SearchOutcome,
        summary: &mut RunSummary,
    ) -> ControlFlow<()> {
        // A partial search must not send a name to the unresolved bucket.
        if outcome.interrupted || self.cancel.is_cancelled() {
            summary.skipped += 1;
            summary.interrupted = true;
            self.progress.on_item(base, "interrupted");
            return ControlFlow::Break(());
        }

        let report = engine.merge(base, files, &outcome.matches);
        // matches that vanished before the merge count as no match
        if report.sources_merged == 0 {
            summary.unresolved += 1;
            self.progress.on_item(base, "unresolved");
        } else {
            summary.resolved += 1;
            let message = format!("merged {} folder(s)", report.sources_merged);
            self.progress.on_item(base, &message);
        }
        summary.merge.absorb(report);
        ControlFlow::Continue(())
    }
}
