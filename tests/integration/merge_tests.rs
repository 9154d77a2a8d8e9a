use super::common::{date, names_in, Archive};
use filetime::FileTime;
use ocrfind::merge::{MergeConfig, MergeEngine, MergeLayout, OriginalPlacement};
use std::fs;

#[test]
fn test_merge_preserves_archive_mtime() {
    let archive = Archive::new();
    let folder = archive.add_folder(date(2025, 6, 10), "12345_Smith");
    let stamp = FileTime::from_unix_time(1_600_000_000, 0);
    filetime::set_file_mtime(folder.join("ocr.pdf"), stamp).unwrap();
    let original = archive.add_working_file("12345.pdf");

    let engine = MergeEngine::new(&archive.working(), MergeConfig::default());
    let report = engine.merge("12345", &[original], &[folder]);

    assert!(report.all_succeeded());
    let copied = fs::metadata(archive.working().join("12345_Smith/ocr.pdf")).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&copied), stamp);
}

#[test]
fn test_second_merge_of_same_folder_never_overwrites() {
    let archive = Archive::new();
    let folder = archive.add_folder(date(2025, 6, 10), "12345_Smith");
    let original = archive.add_working_file("12345.pdf");
    let engine = MergeEngine::new(
        &archive.working(),
        MergeConfig {
            original: OriginalPlacement::Keep,
            ..Default::default()
        },
    );

    engine.merge("12345", &[original.clone()], &[folder.clone()]);
    fs::write(archive.working().join("12345_Smith/ocr.pdf"), b"edited").unwrap();
    engine.merge("12345", &[original], &[folder]);

    assert_eq!(
        fs::read(archive.working().join("12345_Smith/ocr.pdf")).unwrap(),
        b"edited"
    );
    assert!(archive.working().join("12345_Smith (1)/ocr.pdf").exists());
}

#[test]
fn test_flat_merge_increases_entry_count_by_files_copied() {
    let archive = Archive::new();
    let a = archive.add_folder(date(2025, 6, 10), "12345_A");
    let b = archive.add_folder(date(2025, 6, 9), "12345_B");
    let original = archive.add_working_file("12345.pdf");
    archive.add_working_file("ocr.pdf");
    let before = names_in(&archive.working()).len();

    let engine = MergeEngine::new(
        &archive.working(),
        MergeConfig {
            layout: MergeLayout::Flat,
            original: OriginalPlacement::Keep,
            ..Default::default()
        },
    );
    let report = engine.merge("12345", &[original], &[a, b]);

    assert_eq!(report.files_copied, 2);
    assert_eq!(names_in(&archive.working()).len(), before + 2);
    assert_eq!(
        names_in(&archive.working()),
        vec!["12345.pdf", "ocr (1).pdf", "ocr (2).pdf", "ocr.pdf"]
    );
}

#[test]
fn test_rename_then_unresolved_bucket_for_other_name() {
    let archive = Archive::new();
    let folder = archive.add_folder(date(2025, 6, 10), "12345_Smith");
    let resolved = archive.add_working_file("12345.pdf");
    let unresolved = archive.add_working_file("67890.tif");
    let engine = MergeEngine::new(&archive.working(), MergeConfig::default());

    engine.merge("12345", &[resolved], &[folder]);
    let report = engine.merge("67890", &[unresolved], &[]);

    assert_eq!(report.relocated, 1);
    assert_eq!(
        names_in(&archive.working()),
        vec!["12345 - Copy.pdf", "12345_Smith", "NOT IN OCR"]
    );
    assert_eq!(names_in(&archive.working().join("NOT IN OCR")), vec!["67890.tif"]);
}
