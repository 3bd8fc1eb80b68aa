use dff::duplicates::{DuplicateFinder, FinderConfig};
use dff::scanner::{CollectorConfig, IdentityTracker, ScanWarning, TraversalWarning};
use std::fs;
use tempfile::tempdir;

fn following() -> DuplicateFinder {
    DuplicateFinder::new(
        FinderConfig::default()
            .with_collector_config(CollectorConfig::default().with_follow_symlinks(true)),
    )
}

#[test]
fn test_hardlinks_to_same_file_not_counted_as_duplicates() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    let hardlink = dir.path().join("hardlink.txt");
    fs::write(&original, b"identical content").unwrap();

    if let Err(e) = fs::hard_link(&original, &hardlink) {
        eprintln!("Skipping hardlink test: failed to create hardlink: {}", e);
        return;
    }

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    if IdentityTracker::detects_hardlinks() {
        assert!(report.groups.is_empty());
        assert_eq!(report.summary.total_files, 1);
        assert!(report.summary.warnings.is_empty());
    } else {
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.summary.total_files, 2);
    }
}

#[cfg(unix)]
#[test]
fn test_symlinks_not_followed_by_default() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    fs::write(&original, b"linked content").unwrap();
    std::os::unix::fs::symlink(&original, dir.path().join("link.txt")).unwrap();

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.total_files, 1);
}

#[cfg(unix)]
#[test]
fn test_followed_file_symlink_is_not_a_duplicate() {
    let dir = tempdir().unwrap();
    let original = dir.path().join("original.txt");
    fs::write(&original, b"linked content").unwrap();
    std::os::unix::fs::symlink(&original, dir.path().join("zlink.txt")).unwrap();

    let report = following()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.total_files, 1);
}

#[cfg(unix)]
#[test]
fn test_symlink_loop_terminates_with_warning() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("a.txt"), b"looped").unwrap();
    fs::write(dir.path().join("b.txt"), b"looped").unwrap();
    std::os::unix::fs::symlink(dir.path(), sub.join("back")).unwrap();

    let report = following()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
    let cycles = report
        .summary
        .warnings
        .iter()
        .filter(|w| matches!(w, ScanWarning::Traversal(TraversalWarning::SkippedCycle(_))))
        .count();
    assert_eq!(cycles, 1);
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_visited_once() {
    let dir = tempdir().unwrap();
    let real = dir.path().join("real");
    fs::create_dir(&real).unwrap();
    fs::write(real.join("one.txt"), b"only once").unwrap();
    fs::write(real.join("two.txt"), b"only once").unwrap();
    std::os::unix::fs::symlink(&real, dir.path().join("alias")).unwrap();

    let report = following()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.summary.total_files, 2);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
}
