//! Search phases and candidate-directory resolution.
//!
//! A phase is plain data: a [`PhaseKind`] naming the directory generator
//! and an exclusivity flag. Generators are pure functions of the reference
//! date, the archive layout and the set of directories already searched;
//! they never capture mutable state and never fail. Missing intermediate
//! directories are skipped silently.
//!
//! The archive is partitioned as `<dated root>/MM-YYYY/MM_DD/<folders>`,
//! where a dated root may contain a `{year}` placeholder
//! (`\\server\ocr_processed\{year}`).

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::pool::WorkerPool;
use super::probe::{probe_dir, ProbeResult};
use crate::signal::CancelToken;

/// Placeholder replaced by the partition year in dated roots.
pub const YEAR_PLACEHOLDER: &str = "{year}";

/// The directory generator a phase uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseKind {
    /// Probe `MM-YYYY/MM_DD` for each of the last N days.
    RecentDays,
    /// Day folders of the current month.
    CurrentMonth,
    /// Day folders of the previous month.
    PreviousMonth,
    /// Day folders of every month in the current year.
    EntireYear,
    /// Each archive root as a whole.
    FullArchive,
}

impl PhaseKind {
    /// All phases in their default order.
    pub const DEFAULT_ORDER: [PhaseKind; 5] = [
        PhaseKind::RecentDays,
        PhaseKind::CurrentMonth,
        PhaseKind::PreviousMonth,
        PhaseKind::EntireYear,
        PhaseKind::FullArchive,
    ];

    /// Stable configuration name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::RecentDays => "recent-days",
            Self::CurrentMonth => "current-month",
            Self::PreviousMonth => "previous-month",
            Self::EntireYear => "entire-year",
            Self::FullArchive => "full-archive",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PhaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::DEFAULT_ORDER
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown phase '{s}'"))
    }
}

/// One step of the search strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPhase {
    /// Which generator to run.
    pub kind: PhaseKind,
    /// Skip candidates already scanned by an earlier phase.
    pub exclusive: bool,
}

impl SearchPhase {
    /// An exclusive phase of the given kind.
    #[must_use]
    pub fn new(kind: PhaseKind) -> Self {
        Self {
            kind,
            exclusive: true,
        }
    }

    /// Phase name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// The default five-phase sequence.
    #[must_use]
    pub fn default_sequence() -> Vec<SearchPhase> {
        PhaseKind::DEFAULT_ORDER.into_iter().map(Self::new).collect()
    }

    /// Resolve this phase's candidate directories.
    ///
    /// The result is deduplicated, keeps generator order, and for an
    /// exclusive phase contains nothing from `searched`.
    #[must_use]
    pub fn candidates(&self, ctx: &ResolveContext<'_>, searched: &HashSet<PathBuf>) -> Vec<PathBuf> {
        let raw = match self.kind {
            PhaseKind::RecentDays => recent_day_dirs(ctx),
            PhaseKind::CurrentMonth => month_day_dirs(ctx.layout, ctx.today),
            PhaseKind::PreviousMonth => match previous_month(ctx.today) {
                Some(date) => month_day_dirs(ctx.layout, date),
                None => Vec::new(),
            },
            PhaseKind::EntireYear => year_day_dirs(ctx.layout, ctx.today.year()),
            PhaseKind::FullArchive => ctx
                .layout
                .archive_roots
                .iter()
                .filter(|root| probe_dir(root).is_found())
                .cloned()
                .collect(),
        };

        let mut seen = HashSet::new();
        raw.into_iter()
            .filter(|p| !(self.exclusive && searched.contains(p)))
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }
}

/// Where the archive lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveLayout {
    /// Date-partitioned roots, optionally containing `{year}`.
    pub dated_roots: Vec<String>,
    /// Roots scanned whole by the full-archive phase.
    pub archive_roots: Vec<PathBuf>,
    /// Days probed by the recent-days phase, starting yesterday.
    pub recent_days: u32,
}

impl ArchiveLayout {
    /// Dated roots expanded for `year`.
    #[must_use]
    pub fn roots_for_year(&self, year: i32) -> Vec<PathBuf> {
        self.dated_roots
            .iter()
            .map(|template| expand_root(template, year))
            .collect()
    }
}

/// Inputs shared by all generators for one search.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Reference date ("today").
    pub today: NaiveDate,
    /// Archive roots and window.
    pub layout: &'a ArchiveLayout,
    /// Ceiling for the probe pool.
    pub pool_ceiling: usize,
    /// Stops the probe batch early.
    pub cancel: &'a CancelToken,
}

/// Replace `{year}` in a dated root template.
#[must_use]
pub fn expand_root(template: &str, year: i32) -> PathBuf {
    PathBuf::from(template.replace(YEAR_PLACEHOLDER, &year.to_string()))
}

/// `MM-YYYY` month folder name.
#[must_use]
pub fn month_folder(date: NaiveDate) -> String {
    date.format("%m-%Y").to_string()
}

/// `MM_DD` day folder name.
#[must_use]
pub fn day_folder(date: NaiveDate) -> String {
    date.format("%m_%d").to_string()
}

/// Partition path of `date` under one dated root template.
#[must_use]
pub fn day_partition(template: &str, date: NaiveDate) -> PathBuf {
    expand_root(template, date.year())
        .join(month_folder(date))
        .join(day_folder(date))
}

/// Any day in the month before `date`.
#[must_use]
pub fn previous_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?.pred_opt()
}

fn recent_day_dirs(ctx: &ResolveContext<'_>) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for days_back in 1..=u64::from(ctx.layout.recent_days) {
        let Some(date) = ctx.today.checked_sub_days(Days::new(days_back)) else {
            break;
        };
        for template in &ctx.layout.dated_roots {
            paths.push(day_partition(template, date));
        }
    }
    if paths.is_empty() {
        return paths;
    }

    let pool = WorkerPool::sized_for(paths.len(), ctx.pool_ceiling);
    let jobs: Vec<_> = paths
        .iter()
        .cloned()
        .enumerate()
        .map(|(idx, path)| move |_: &CancelToken| (idx, probe_dir(&path)))
        .collect();

    let mut found = Vec::new();
    let mut degraded = 0usize;
    pool.run(jobs, ctx.cancel, |(idx, result)| {
        match result {
            ProbeResult::Found => found.push(idx),
            ProbeResult::Degraded(_) => degraded += 1,
            ProbeResult::NotFound => {}
        }
        ControlFlow::Continue(())
    });
    if degraded > 0 {
        log::warn!("{} day partition probe(s) failed and were treated as absent", degraded);
    }

    // probes complete in any order; report newest day first
    found.sort_unstable();
    log::debug!("recent-days: {}/{} partitions exist", found.len(), paths.len());
    found.into_iter().map(|idx| paths[idx].clone()).collect()
}

fn month_day_dirs(layout: &ArchiveLayout, date: NaiveDate) -> Vec<PathBuf> {
    let month = month_folder(date);
    layout
        .roots_for_year(date.year())
        .iter()
        .flat_map(|root| list_subdirs(&root.join(&month)))
        .collect()
}

fn year_day_dirs(layout: &ArchiveLayout, year: i32) -> Vec<PathBuf> {
    layout
        .roots_for_year(year)
        .iter()
        .flat_map(|root| list_subdirs(root))
        .flat_map(|month| list_subdirs(&month))
        .collect()
}

/// Direct subdirectories of `dir`, sorted. Unreadable or missing
/// directories yield nothing.
#[must_use]
pub fn list_subdirs(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::trace!("Skipping {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| match entry.file_type() {
            Ok(t) if t.is_dir() => true,
            Ok(t) if t.is_symlink() => probe_dir(&entry.path()).is_found(),
            _ => false,
        })
        .map(|entry| entry.path())
        .collect();
    dirs.sort();
    dirs
}
