use dff::duplicates::{DuplicateFinder, FinderConfig, ScanStatus};
use dff::scanner::DigestAlgorithm;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(path).unwrap().write_all(content).unwrap();
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let report = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.status, ScanStatus::Completed);
    assert_eq!(report.summary.total_files, 0);
    assert_eq!(report.summary.duplicate_groups, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"content a");
    write(dir.path(), "b.txt", b"content bb");
    write(dir.path(), "c.txt", b"content ccc");

    let finder = DuplicateFinder::with_defaults();
    let report = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.total_files, 3);
    assert_eq!(report.summary.eliminated_by_size, 3);
    assert_eq!(report.summary.prefix_digests, 0);
    assert_eq!(report.summary.full_digests, 0);
}

#[test]
fn test_scan_hello_world() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"hello");
    write(dir.path(), "b.txt", b"hello");
    write(dir.path(), "c.txt", b"world");

    let finder = DuplicateFinder::with_defaults();
    let report = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(names(&group.paths()), vec!["a.txt", "b.txt"]);
    assert_eq!(group.size, 5);
    assert_eq!(group.wasted_space, 5);
    assert_eq!(group.digest_hex(), "5d41402abc4b2a76b9719d911017c592");
    assert_eq!(report.summary.eliminated_by_prefix, 1);
    assert_eq!(report.summary.full_digests, 2);
}

#[test]
fn test_scan_nested_directories_keep_discovery_order() {
    let dir = tempdir().unwrap();
    write(dir.path(), "z.txt", b"nested dup");
    write(dir.path(), "sub/deeper/x.txt", b"nested dup");
    write(dir.path(), "a.txt", b"nested dup");

    let finder = DuplicateFinder::with_defaults();
    let report = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(names(&report.groups[0].paths()), vec!["a.txt", "x.txt", "z.txt"]);
    assert_eq!(report.groups[0].wasted_space, 20);
}

#[test]
fn test_scan_three_empty_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "e1", b"");
    write(dir.path(), "e2", b"");
    write(dir.path(), "e3", b"");

    let finder = DuplicateFinder::with_defaults();
    let report = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 3);
    assert_eq!(report.groups[0].wasted_space, 0);
    assert_eq!(report.groups[0].digest, DigestAlgorithm::Md5.empty_digest());
    assert_eq!(report.summary.prefix_digests, 0);
    assert_eq!(report.summary.full_digests, 0);
}

#[test]
fn test_prefix_mismatch_skips_full_digest() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", b"aaaaaaaaaa");
    write(dir.path(), "b.bin", b"bbbbbbbbbb");

    let finder = DuplicateFinder::with_defaults();
    let report = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(report.groups.is_empty());
    assert_eq!(report.summary.prefix_digests, 2);
    assert_eq!(report.summary.eliminated_by_prefix, 2);
    assert_eq!(report.summary.full_digests, 0);
}

#[test]
fn test_difference_after_prefix_is_detected() {
    let dir = tempdir().unwrap();
    let mut first = vec![7u8; 10_000];
    let second = first.clone();
    first[9_999] = 8;
    write(dir.path(), "first.bin", &first);
    write(dir.path(), "second.bin", &second);
    write(dir.path(), "third.bin", &second);

    let config = FinderConfig::default().with_prefix_bytes(4096);
    let report = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(report.summary.full_digests, 3);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(names(&report.groups[0].paths()), vec!["second.bin", "third.bin"]);
}

#[test]
fn test_groups_ordered_by_wasted_space() {
    let dir = tempdir().unwrap();
    // 3 x 4 bytes -> 8 wasted
    write(dir.path(), "small1", b"abcd");
    write(dir.path(), "small2", b"abcd");
    write(dir.path(), "small3", b"abcd");
    // 2 x 10 bytes -> 10 wasted
    write(dir.path(), "big1", b"0123456789");
    write(dir.path(), "big2", b"0123456789");
    // 2 x 5 bytes -> 5 wasted
    write(dir.path(), "mid1", b"fghij");
    write(dir.path(), "mid2", b"fghij");

    let report = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    let wasted: Vec<u64> = report.groups.iter().map(|g| g.wasted_space).collect();
    assert_eq!(wasted, vec![10, 8, 5]);
    assert_eq!(report.summary.wasted_space, 23);
    assert_eq!(report.summary.duplicate_files, 4);
}

#[test]
fn test_algorithms_agree_on_grouping() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"same bytes");
    write(dir.path(), "b", b"same bytes");
    write(dir.path(), "c", b"diff bytes");

    for algorithm in [
        DigestAlgorithm::Md5,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Blake3,
    ] {
        let config = FinderConfig::default().with_algorithm(algorithm);
        let report = DuplicateFinder::new(config)
            .find_duplicates(&[dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(report.groups.len(), 1, "algorithm {algorithm}");
        assert_eq!(names(&report.groups[0].paths()), vec!["a", "b"]);
        assert_eq!(report.groups[0].digest_hex().len(), algorithm.output_len() * 2);
    }
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        write(dir.path(), &format!("dup{i}.txt"), b"repeated");
        write(dir.path(), &format!("uniq{i}.txt"), format!("unique-{i}").as_bytes());
    }

    let finder = DuplicateFinder::with_defaults();
    let first = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();
    let second = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(first.groups, second.groups);
    assert_eq!(first.groups[0].len(), 5);
}

#[test]
fn test_single_threaded_matches_parallel() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        let content = format!("content-{}", i % 4);
        write(dir.path(), &format!("f{i:02}"), content.as_bytes());
    }

    let serial = DuplicateFinder::new(
        FinderConfig::default()
            .with_cpu_concurrency(1)
            .with_io_concurrency(1),
    )
    .find_duplicates(&[dir.path().to_path_buf()])
    .unwrap();
    let parallel = DuplicateFinder::new(
        FinderConfig::default()
            .with_cpu_concurrency(8)
            .with_io_concurrency(8),
    )
    .find_duplicates(&[dir.path().to_path_buf()])
    .unwrap();

    assert_eq!(serial.groups, parallel.groups);
    assert_eq!(serial.groups.len(), 4);
}
