//! Progress reporting using indicatif.
//!
//! The runner reports one item per base name: searched, merged or moved to
//! the unresolved bucket. [`Progress`] draws a single bar for that;
//! [`NoProgress`] discards everything.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Receives per-base-name progress from the runner.
pub trait ProgressCallback: Send + Sync {
    /// Called once before any base name is searched.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of base names in the working directory
    fn on_start(&self, total: usize);

    /// Called when a base name has been fully handled.
    ///
    /// # Arguments
    ///
    /// * `base` - The base name
    /// * `outcome` - Short description ("merged 2 folder(s)", "unresolved")
    fn on_item(&self, base: &str, outcome: &str);

    /// Called once after the last base name, or on interruption.
    fn on_finish(&self, interrupted: bool);
}

/// Silent reporter.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&self, _total: usize) {}
    fn on_item(&self, _base: &str, _outcome: &str) {}
    fn on_finish(&self, _interrupted: bool) {}
}

/// Terminal progress bar.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a reporter; `quiet` hides the bar.
    ///
    /// # Examples
    ///
    /// ```
    /// use ocrfind::progress::{Progress, ProgressCallback};
    ///
    /// let progress = Progress::new(true);
    /// progress.on_start(3);
    /// progress.on_finish(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_start(&self, total: usize) {
        let bar = if self.quiet {
            ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::hidden())
        } else {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(Self::style());
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        };
        bar.set_message("Searching archive");
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_item(&self, base: &str, outcome: &str) {
        self.with_bar(|bar| {
            bar.inc(1);
            bar.set_message(format!("{}: {}", truncate(base, 24), outcome));
        });
    }

    fn on_finish(&self, interrupted: bool) {
        let taken = self.bar.lock().ok().and_then(|mut guard| guard.take());
        if let Some(bar) = taken {
            if interrupted {
                bar.abandon_with_message("Interrupted");
            } else {
                bar.finish_with_message("Done");
            }
        }
    }
}

/// Shorten a base name for the bar message, keeping the tail.
fn truncate(name: &str, max_chars: usize) -> String {
    let count = name.chars().count();
    if count <= max_chars {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max_chars - 3)).collect();
    format!("...{tail}")
}
