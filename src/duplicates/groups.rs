//! Confirmed duplicate groups and their final ordering.
//!
//! # Overview
//!
//! After staged hashing every surviving sub-group shares both size and full
//! digest. This module wraps them as [`DuplicateGroup`]s, adds the zero-byte
//! group when there is one, and sorts the result so the groups wasting the
//! most space come first.
//!
//! # Example
//!
//! ```
//! use dff::duplicates::{group_duplicates, DuplicateGroup};
//! use dff::scanner::{DigestAlgorithm, FileRecord};
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let empties = vec![
//!     FileRecord::new(PathBuf::from("/a"), 0, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/b"), 0, SystemTime::now()),
//! ];
//! let empty_group = DuplicateGroup::from_empty_files(empties, DigestAlgorithm::Md5);
//!
//! let groups = group_duplicates(Vec::new(), empty_group);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].wasted_space, 0);
//! ```

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use super::staged::StagedBucket;
use crate::scanner::{Digest, DigestAlgorithm, FileRecord};

/// Files with identical size and full digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Full digest shared by every member
    pub digest: Digest,
    /// File size in bytes (shared by all members)
    pub size: u64,
    /// Members in discovery order
    pub files: Vec<FileRecord>,
    /// Bytes reclaimable by keeping a single copy: `(members - 1) * size`
    pub wasted_space: u64,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// # Arguments
    ///
    /// * `digest` - Full content digest
    /// * `size` - File size in bytes
    /// * `files` - Members in discovery order
    #[must_use]
    pub fn new(digest: Digest, size: u64, files: Vec<FileRecord>) -> Self {
        let wasted_space = size.saturating_mul(files.len().saturating_sub(1) as u64);
        Self {
            digest,
            size,
            files,
            wasted_space,
        }
    }

    /// The group of zero-byte files, if there are at least two.
    #[must_use]
    pub fn from_empty_files(files: Vec<FileRecord>, algorithm: DigestAlgorithm) -> Option<Self> {
        (files.len() >= 2).then(|| Self::new(algorithm.empty_digest(), 0, files))
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        self.digest.to_hex()
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    fn first_path(&self) -> Option<&Path> {
        self.files.first().map(|f| f.path.as_path())
    }
}

/// Report order: most wasted space first, then larger files, then path.
fn report_order(a: &DuplicateGroup, b: &DuplicateGroup) -> Ordering {
    b.wasted_space
        .cmp(&a.wasted_space)
        .then_with(|| b.size.cmp(&a.size))
        .then_with(|| a.first_path().cmp(&b.first_path()))
}

/// Build the final, ordered list of duplicate groups.
///
/// Interrupted buckets contribute nothing. An empty result is not an error.
#[must_use]
pub fn group_duplicates(
    staged: Vec<StagedBucket>,
    empty_group: Option<DuplicateGroup>,
) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = staged
        .into_iter()
        .filter(|bucket| !bucket.interrupted)
        .flat_map(|bucket| {
            let size = bucket.size;
            bucket
                .groups
                .into_iter()
                .map(move |(digest, files)| DuplicateGroup::new(digest, size, files))
        })
        .filter(|group| group.len() > 1)
        .collect();

    groups.extend(empty_group);
    groups.sort_by(report_order);

    for group in &groups {
        log::debug!(
            "Duplicate group {}: {} files, {} bytes each",
            group.digest,
            group.len(),
            group.size
        );
    }

    groups
}
