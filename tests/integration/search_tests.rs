use super::common::{date, Archive};
use ocrfind::search::{PhaseKind, PhasedSearch, StopPolicy};
use ocrfind::signal::CancelToken;
use std::fs;

fn engine(archive: &Archive, policy: StopPolicy) -> PhasedSearch {
    let config = ocrfind::config::Config {
        stop_policy: policy,
        ..archive.config()
    };
    PhasedSearch::new(config.search_config().unwrap())
}

#[test]
fn test_recent_partition_found_and_search_stops() {
    let archive = Archive::new();
    let recent = archive.add_folder(date(2025, 6, 10), "12345_Smith");
    fs::create_dir_all(archive.root().join("legacy/12345_Old")).unwrap();

    let outcome = engine(&archive, StopPolicy::EarlyStop).search(
        "12345",
        date(2025, 6, 11),
        &CancelToken::new(),
    );

    assert_eq!(outcome.matches, vec![recent]);
    assert_eq!(outcome.phases.len(), 1);
    assert_eq!(outcome.phases[0].kind, PhaseKind::RecentDays);
    assert!(!outcome.interrupted);
}

#[test]
fn test_exhaustive_unions_without_duplicates() {
    let archive = Archive::new();
    let recent = archive.add_folder(date(2025, 6, 10), "12345_Smith");
    let legacy = archive.root().join("legacy/12345_Old");
    fs::create_dir_all(&legacy).unwrap();

    let outcome = engine(&archive, StopPolicy::Exhaustive).search(
        "12345",
        date(2025, 6, 11),
        &CancelToken::new(),
    );

    // the full-archive phase walks the recent partition again
    assert_eq!(outcome.matches.len(), 2);
    assert_eq!(outcome.matches[0], recent);
    assert!(outcome.matches.contains(&legacy));
    assert_eq!(outcome.phases.len(), 5);
}

#[test]
fn test_recent_window_crosses_new_year() {
    let archive = Archive::new();
    let december = archive.add_folder(date(2024, 12, 30), "12345_Smith");

    let outcome = engine(&archive, StopPolicy::EarlyStop).search(
        "12345",
        date(2025, 1, 3),
        &CancelToken::new(),
    );

    assert_eq!(outcome.matches, vec![december]);
    assert_eq!(outcome.phases[0].kind, PhaseKind::RecentDays);
}

#[test]
fn test_today_partition_found_by_current_month() {
    let archive = Archive::new();
    let today = archive.add_folder(date(2025, 6, 11), "12345_Smith");

    let outcome = engine(&archive, StopPolicy::EarlyStop).search(
        "12345",
        date(2025, 6, 11),
        &CancelToken::new(),
    );

    assert_eq!(outcome.matches, vec![today]);
    let kinds: Vec<_> = outcome.phases.iter().map(|p| p.kind).collect();
    assert_eq!(kinds, vec![PhaseKind::RecentDays, PhaseKind::CurrentMonth]);
    assert_eq!(outcome.phases[0].matches, 0);
}

#[test]
fn test_no_match_runs_every_phase() {
    let archive = Archive::new();
    archive.add_folder(date(2025, 6, 10), "99999_Jones");

    let outcome = engine(&archive, StopPolicy::EarlyStop).search(
        "12345",
        date(2025, 6, 11),
        &CancelToken::new(),
    );

    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.phases.len(), 5);
}

#[test]
fn test_missing_roots_degrade_to_no_match() {
    let config = ocrfind::config::Config {
        dated_roots: vec!["/definitely/not/here/{year}".into()],
        archive_roots: vec!["/definitely/not/here".into()],
        recent_days: 20,
        ..Default::default()
    };
    let engine = PhasedSearch::new(config.search_config().unwrap());

    let outcome = engine.search("12345", date(2025, 6, 11), &CancelToken::new());

    assert!(outcome.matches.is_empty());
    assert!(outcome.phases.iter().all(|p| p.candidates == 0));
}

#[test]
fn test_cancelled_search_is_interrupted() {
    let archive = Archive::new();
    archive.add_folder(date(2025, 6, 10), "12345_Smith");
    let cancel = CancelToken::new();
    cancel.cancel();

    let outcome = engine(&archive, StopPolicy::EarlyStop).search("12345", date(2025, 6, 11), &cancel);

    assert!(outcome.interrupted);
    assert!(outcome.matches.is_empty());
}
