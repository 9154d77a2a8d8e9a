use super::common::{date, names_in, Archive};
use ocrfind::error::ExitCode;
use ocrfind::merge::OriginalPlacement;
use ocrfind::runner::Runner;
use std::fs;

#[test]
fn test_full_run_resolves_and_buckets() {
    let archive = Archive::new();
    archive.add_folder(date(2025, 6, 10), "12345_Smith");
    archive.add_folder(date(2025, 3, 2), "55555_Brown");
    archive.add_working_file("12345.pdf");
    archive.add_working_file("12345 (1).pdf");
    archive.add_working_file("55555.tif");
    archive.add_working_file("99999.pdf");
    archive.add_working_file("Thumbs.db");

    let summary = Runner::from_config(&archive.config())
        .unwrap()
        .with_today(date(2025, 6, 11))
        .run(&archive.working())
        .unwrap();

    assert_eq!(summary.base_names, 3);
    assert_eq!(summary.resolved, 2);
    assert_eq!(summary.unresolved, 1);
    assert_eq!(summary.exit_code(), ExitCode::Unresolved);
    assert_eq!(
        names_in(&archive.working()),
        vec![
            "12345 (1) - Copy.pdf",
            "12345 - Copy.pdf",
            "12345_Smith",
            "55555 - Copy.tif",
            "55555_Brown",
            "NOT IN OCR",
            "Thumbs.db",
        ]
    );
    assert_eq!(names_in(&archive.working().join("NOT IN OCR")), vec!["99999.pdf"]);
}

#[test]
fn test_single_worker_matches_many_workers() {
    let build = |workers: usize| {
        let archive = Archive::new();
        for (i, day) in [10u32, 9, 8, 7].into_iter().enumerate() {
            archive.add_folder(date(2025, 6, day), &format!("1000{i}_X"));
            archive.add_working_file(&format!("1000{i}.pdf"));
        }
        let config = ocrfind::config::Config {
            search_workers: workers,
            ..archive.config()
        };
        Runner::from_config(&config)
            .unwrap()
            .with_today(date(2025, 6, 11))
            .run(&archive.working())
            .unwrap();
        names_in(&archive.working())
    };

    assert_eq!(build(1), build(8));
}

#[test]
fn test_distribute_run() {
    let archive = Archive::new();
    archive.add_folder(date(2025, 6, 10), "12345_Smith");
    archive.add_working_file("12345.pdf");

    let config = ocrfind::config::Config {
        original: OriginalPlacement::Distribute,
        ..archive.config()
    };
    let summary = Runner::from_config(&config)
        .unwrap()
        .with_today(date(2025, 6, 11))
        .run(&archive.working())
        .unwrap();

    assert_eq!(summary.exit_code(), ExitCode::Success);
    assert_eq!(names_in(&archive.working()), vec!["12345_Smith"]);
    assert_eq!(
        names_in(&archive.working().join("12345_Smith")),
        vec!["12345 - Copy.pdf", "ocr.pdf"]
    );
}

#[test]
fn test_rerun_keeps_existing_content() {
    let archive = Archive::new();
    archive.add_folder(date(2025, 6, 10), "12345_Smith");
    archive.add_working_file("12345.pdf");
    let runner = Runner::from_config(&archive.config())
        .unwrap()
        .with_today(date(2025, 6, 11));

    runner.run(&archive.working()).unwrap();
    fs::write(archive.working().join("12345_Smith/notes.txt"), b"mine").unwrap();
    let second = runner.run(&archive.working()).unwrap();

    // the marked copy still names 12345, so it is resolved again
    assert_eq!(second.resolved, 1);
    assert!(archive.working().join("12345_Smith/notes.txt").exists());
    assert!(archive.working().join("12345_Smith (1)/ocr.pdf").exists());
    assert!(archive.working().join("12345 - Copy.pdf").exists());
}
