use dff::duplicates::DuplicateFinder;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_duplicates_across_roots() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    fs::write(first.path().join("photo.jpg"), b"same picture").unwrap();
    fs::write(second.path().join("copy.jpg"), b"same picture").unwrap();
    fs::write(second.path().join("other.jpg"), b"another pic!").unwrap();

    let roots = vec![first.path().to_path_buf(), second.path().to_path_buf()];
    let report = DuplicateFinder::with_defaults().find_duplicates(&roots).unwrap();

    assert_eq!(report.summary.total_files, 3);
    assert_eq!(report.groups.len(), 1);
    let paths = report.groups[0].paths();
    assert!(paths[0].ends_with("photo.jpg"));
    assert!(paths[1].ends_with("copy.jpg"));
}

#[test]
fn test_overlapping_roots_collect_each_file_once() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("a"), b"only one copy").unwrap();

    let roots = vec![
        dir.path().to_path_buf(),
        sub.clone(),
        dir.path().to_path_buf(),
    ];
    let report = DuplicateFinder::with_defaults().find_duplicates(&roots).unwrap();

    assert_eq!(report.summary.total_files, 1);
    assert!(report.groups.is_empty());
}

#[test]
fn test_file_roots_are_compared() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.bin");
    let b = dir.path().join("b.bin");
    fs::write(&a, b"file root").unwrap();
    fs::write(&b, b"file root").unwrap();

    let report = DuplicateFinder::with_defaults().find_duplicates(&[a, b]).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_root_order_defines_discovery_order() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    fs::write(first.path().join("z"), b"ordering").unwrap();
    fs::write(second.path().join("a"), b"ordering").unwrap();

    let forward = DuplicateFinder::with_defaults()
        .find_duplicates(&[first.path().to_path_buf(), second.path().to_path_buf()])
        .unwrap();
    let backward = DuplicateFinder::with_defaults()
        .find_duplicates(&[second.path().to_path_buf(), first.path().to_path_buf()])
        .unwrap();

    assert!(forward.groups[0].paths()[0].ends_with("z"));
    assert!(backward.groups[0].paths()[0].ends_with("a"));
}
