use dff::duplicates::{DuplicateFinder, FinderError};
use dff::scanner::{DigestError, FileRecord, ScanWarning, TraversalWarning};
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;
use tempfile::tempdir;

#[test]
fn test_missing_records_become_warnings() {
    let finder = DuplicateFinder::with_defaults();
    let file1 = FileRecord::new(PathBuf::from("nonexistent_1.txt"), 100, SystemTime::now());
    let file2 = FileRecord::new(PathBuf::from("nonexistent_2.txt"), 100, SystemTime::now());

    let report = finder.find_duplicates_from_records(vec![file1, file2]).unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.warnings.len(), 2);
    for warning in &report.summary.warnings {
        match warning {
            ScanWarning::Digest(DigestError::NotFound(_)) => {}
            other => panic!("Expected NotFound, got: {:?}", other),
        }
    }
}

#[test]
fn test_vanished_file_does_not_hide_other_duplicates() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"payload").unwrap();
    fs::write(&b, b"payload").unwrap();
    let now = SystemTime::now();

    let records = vec![
        FileRecord::new(a, 7, now),
        FileRecord::new(dir.path().join("gone"), 7, now),
        FileRecord::new(b, 7, now),
    ];
    let report = DuplicateFinder::with_defaults()
        .find_duplicates_from_records(records)
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    assert_eq!(report.summary.warnings.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_reported_with_other_duplicates() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"readable").unwrap();
    fs::write(dir.path().join("b.txt"), b"readable").unwrap();
    let locked = dir.path().join("locked.txt");
    fs::write(&locked, b"readable").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::File::open(&locked).is_ok() {
        eprintln!("Skipping: running with privileges that ignore file modes");
        return;
    }

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    let denied: Vec<_> = report
        .summary
        .warnings
        .iter()
        .filter(|w| w.is_access_denied())
        .collect();
    assert_eq!(denied.len(), 1);
    assert!(matches!(
        denied[0],
        ScanWarning::Traversal(TraversalWarning::AccessDenied(_))
    ));
}

#[cfg(unix)]
#[test]
fn test_unlistable_root_is_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("a.txt"), b"twin").unwrap();
    fs::write(locked.join("b.txt"), b"twin").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        eprintln!("Skipping: running with privileges that ignore file modes");
        return;
    }

    let result = DuplicateFinder::with_defaults().find_duplicates(&[locked.clone()]);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    match result {
        Err(FinderError::NoAccessibleRoots(paths)) => assert_eq!(paths, vec![locked]),
        other => panic!("Expected NoAccessibleRoots, got: {:?}", other.map(|r| r.groups.len())),
    }
}

#[test]
fn test_missing_root_among_valid_roots_warns() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"twin").unwrap();
    fs::write(dir.path().join("b"), b"twin").unwrap();

    let roots = vec![dir.path().to_path_buf(), dir.path().join("does-not-exist")];
    let report = DuplicateFinder::with_defaults().find_duplicates(&roots).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.summary.warnings.len(), 1);
}

#[test]
fn test_no_accessible_roots_is_fatal() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let result = DuplicateFinder::with_defaults().find_duplicates(&[missing.clone()]);

    match result {
        Err(FinderError::NoAccessibleRoots(paths)) => assert_eq!(paths, vec![missing]),
        other => panic!("Expected NoAccessibleRoots, got: {:?}", other.map(|r| r.groups.len())),
    }
}

#[test]
fn test_empty_root_list_is_not_an_error() {
    let report = DuplicateFinder::with_defaults().find_duplicates(&[]).unwrap();
    assert!(report.groups.is_empty());
    assert_eq!(report.summary.total_files, 0);
}
