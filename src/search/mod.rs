//! Archive search.
//!
//! The search is read-only and is the only parallel part of a run:
//!
//! - [`probe`]: directory existence checks that never fail
//! - [`tree`]: depth-first match-folder discovery under one root
//! - [`pool`]: bounded per-batch worker pool with early exit
//! - [`phase`]: phase descriptors and candidate-directory generators
//! - [`engine`]: the phased driver with early-stop / exhaustive policies
//!
//! # Example
//!
//! ```no_run
//! use ocrfind::search::{ArchiveLayout, PhasedSearch, SearchConfig};
//! use ocrfind::signal::CancelToken;
//!
//! let config = SearchConfig {
//!     layout: ArchiveLayout {
//!         dated_roots: vec![r"\\ronsin158\ocr_processed\{year}".to_string()],
//!         archive_roots: vec![r"\\ronsin158\ocr_processed".into()],
//!         recent_days: 365,
//!     },
//!     ..Default::default()
//! };
//!
//! let engine = PhasedSearch::new(config);
//! let today = chrono::Local::now().date_naive();
//! let outcome = engine.search("12345", today, &CancelToken::new());
//! for folder in &outcome.matches {
//!     println!("{}", folder.display());
//! }
//! ```

pub mod engine;
pub mod phase;
pub mod pool;
pub mod probe;
pub mod tree;

pub use engine::{PhaseReport, PhasedSearch, SearchConfig, SearchOutcome, StopPolicy};
pub use phase::{ArchiveLayout, PhaseKind, ResolveContext, SearchPhase};
pub use pool::{BatchOutcome, WorkerPool, DEFAULT_POOL_CEILING};
pub use probe::{probe_dir, ProbeResult};
pub use tree::{scan_tree, ScanOptions, ScanOutcome};
