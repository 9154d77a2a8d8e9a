use super::common::{date, Archive};
use ocrfind::runner::Runner;
use std::fs;

#[test]
fn test_override_applied_before_merge() {
    let archive = Archive::new();
    archive.add_folder(date(2025, 6, 10), "12345_Smith");
    archive.add_working_file("12345.pdf");
    let xray = archive.dir.path().join("xray");
    fs::create_dir(&xray).unwrap();
    fs::write(xray.join("XR 12345.pdf"), b"xray scan").unwrap();

    let config = ocrfind::config::Config {
        override_dir: Some(xray.clone()),
        ..archive.config()
    };
    let summary = Runner::from_config(&config)
        .unwrap()
        .with_today(date(2025, 6, 11))
        .run(&archive.working())
        .unwrap();

    assert_eq!(summary.overrides.count(), 1);
    assert_eq!(summary.resolved, 1);
    // the override took the original's place and was then marked
    assert_eq!(
        fs::read(archive.working().join("12345 - Copy.pdf")).unwrap(),
        b"xray scan"
    );
    assert!(!xray.join("XR 12345.pdf").exists());
}

#[test]
fn test_absent_override_dir_is_ignored() {
    let archive = Archive::new();
    archive.add_folder(date(2025, 6, 10), "12345_Smith");
    archive.add_working_file("12345.pdf");

    let config = ocrfind::config::Config {
        override_dir: Some(archive.dir.path().join("no-such-dir")),
        ..archive.config()
    };
    let summary = Runner::from_config(&config)
        .unwrap()
        .with_today(date(2025, 6, 11))
        .run(&archive.working())
        .unwrap();

    assert_eq!(summary.overrides.count(), 0);
    assert_eq!(summary.resolved, 1);
}
