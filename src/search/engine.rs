//! Phased search driver.
//!
//! Runs the configured phases in order. Each phase resolves its candidate
//! directories, scans them concurrently on a pool sized to the batch, and
//! adds every candidate to the exclusion set so later phases never scan the
//! same root twice.
//!
//! Under [`StopPolicy::EarlyStop`] the first scan that reports a match ends
//! the phase (stragglers are cancelled and ignored) and no later phase runs.
//! Under [`StopPolicy::Exhaustive`] every phase runs to completion and the
//! union of all matches is returned.

use std::collections::HashSet;
use std::fmt;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::phase::{ArchiveLayout, PhaseKind, ResolveContext, SearchPhase};
use super::pool::{WorkerPool, DEFAULT_POOL_CEILING};
use super::tree::{scan_tree, ScanOptions};
use crate::signal::CancelToken;

/// When the engine stops searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StopPolicy {
    /// Return as soon as any phase yields a match.
    #[default]
    EarlyStop,
    /// Run every phase and return all matches.
    Exhaustive,
}

impl fmt::Display for StopPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EarlyStop => f.write_str("early-stop"),
            Self::Exhaustive => f.write_str("exhaustive"),
        }
    }
}

/// Static search configuration, fixed for a run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Ordered phases.
    pub phases: Vec<SearchPhase>,
    /// Termination policy.
    pub policy: StopPolicy,
    /// Archive roots and recent-day window.
    pub layout: ArchiveLayout,
    /// Thread ceiling for each phase pool.
    pub pool_ceiling: usize,
    /// Tree-walk options.
    pub scan: ScanOptions,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            phases: SearchPhase::default_sequence(),
            policy: StopPolicy::EarlyStop,
            layout: ArchiveLayout {
                recent_days: 365,
                ..Default::default()
            },
            pool_ceiling: DEFAULT_POOL_CEILING,
            scan: ScanOptions::default(),
        }
    }
}

/// What one phase did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    /// Phase that ran.
    pub kind: PhaseKind,
    /// Candidate roots scanned.
    pub candidates: usize,
    /// Matches this phase contributed (before de-duplication).
    pub matches: usize,
    /// Unreadable entries treated as empty.
    pub errors: usize,
    /// Outstanding scans were abandoned.
    pub stopped_early: bool,
}

/// Result of searching for one base name.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Match folders in discovery order, exact duplicates removed.
    pub matches: Vec<PathBuf>,
    /// Every root scanned by any phase.
    pub searched: HashSet<PathBuf>,
    /// Per-phase reports in execution order.
    pub phases: Vec<PhaseReport>,
    /// The run was cancelled before the search completed.
    pub interrupted: bool,
}

/// Drives the phase sequence for one base name at a time.
///
/// Cheap to clone; the configuration is shared.
#[derive(Debug, Clone)]
pub struct PhasedSearch {
    config: Arc<SearchConfig>,
}

impl PhasedSearch {
    /// Create an engine over a fixed configuration.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search the archive for folders whose name contains `needle`.
    ///
    /// `today` anchors every date-derived phase. Never fails: unreadable
    /// paths degrade to "no match".
    #[must_use]
    pub fn search(&self, needle: &str, today: NaiveDate, cancel: &CancelToken) -> SearchOutcome {
        let config = &*self.config;
        let early_stop = config.policy == StopPolicy::EarlyStop;
        let needle: Arc<str> = Arc::from(needle);
        let mut outcome = SearchOutcome::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for phase in &config.phases {
            if cancel.is_cancelled() {
                break;
            }

            let ctx = ResolveContext {
                today,
                layout: &config.layout,
                pool_ceiling: config.pool_ceiling,
                cancel,
            };
            let candidates = phase.candidates(&ctx, &outcome.searched);
            let mut report = PhaseReport {
                kind: phase.kind,
                candidates: candidates.len(),
                matches: 0,
                errors: 0,
                stopped_early: false,
            };
            if candidates.is_empty() {
                log::trace!("{}: no candidates for '{}'", phase.name(), needle);
                outcome.phases.push(report);
                continue;
            }

            let pool = WorkerPool::sized_for(candidates.len(), config.pool_ceiling);
            log::debug!(
                "{}: scanning {} root(s) for '{}' on {} thread(s)",
                phase.name(),
                candidates.len(),
                needle,
                pool.threads()
            );

            let jobs: Vec<_> = candidates
                .iter()
                .cloned()
                .map(|root| {
                    let needle = Arc::clone(&needle);
                    let options = config.scan;
                    move |token: &CancelToken| scan_tree(&root, &needle, options, token)
                })
                .collect();

            let batch = pool.run(jobs, cancel, |scan| {
                report.errors += scan.errors;
                report.matches += scan.matches.len();
                for found in scan.matches {
                    if seen.insert(found.clone()) {
                        outcome.matches.push(found);
                    }
                }
                if early_stop && report.matches > 0 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            });
            report.stopped_early = batch.stopped_early;

            outcome.searched.extend(candidates);
            if report.matches > 0 {
                log::info!(
                    "Found {} match(es) for '{}' in {}",
                    report.matches,
                    needle,
                    phase.name()
                );
            }
            outcome.phases.push(report);

            if early_stop && !outcome.matches.is_empty() {
                break;
            }
        }

        outcome.interrupted = cancel.is_cancelled();
        outcome
    }
}
