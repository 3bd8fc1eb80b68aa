//! Size bucketing, the first filter of duplicate detection.
//!
//! # Overview
//!
//! Files of different sizes cannot be duplicates, so records are grouped by
//! exact byte size before any content is read. Buckets with a single member
//! are dropped immediately; on typical trees this eliminates most files
//! without I/O.
//!
//! Zero-byte files never need hashing: every empty file has the same
//! content. They are set aside and reported as a single group when there
//! are at least two of them.
//!
//! # Example
//!
//! ```
//! use dff::scanner::FileRecord;
//! use dff::duplicates::bucket_by_size;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048, SystemTime::now()),
//! ];
//!
//! let set = bucket_by_size(files);
//!
//! assert_eq!(set.stats.total_files, 3);
//! assert_eq!(set.stats.potential_duplicates, 2);
//! assert_eq!(set.buckets.len(), 1);
//! ```

use std::collections::HashMap;

use crate::scanner::FileRecord;

/// Files sharing one exact byte size, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeBucket {
    /// File size in bytes (shared by all files in this bucket)
    pub size: u64,
    /// Files with this exact size
    pub files: Vec<FileRecord>,
}

impl SizeBucket {
    /// Create a bucket with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileRecord>) -> Self {
        Self { size, files }
    }

    /// Number of files in this bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Space that would be reclaimed if every member turned out identical.
    #[must_use]
    pub fn potential_savings(&self) -> u64 {
        self.size
            .saturating_mul(self.files.len().saturating_sub(1) as u64)
    }
}

/// Statistics from the bucketing phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct non-zero sizes
    pub unique_sizes: usize,
    /// Files dropped because no other file had their size
    pub eliminated_unique: usize,
    /// Files in buckets of 2+ (excluding empty files)
    pub potential_duplicates: usize,
    /// Number of zero-byte files seen
    pub empty_files: usize,
}

impl BucketStats {
    /// Percentage of files eliminated by size alone.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Output of the bucketing phase.
#[derive(Debug, Clone, Default)]
pub struct BucketSet {
    /// Non-empty buckets of 2+ files, highest potential savings first
    pub buckets: Vec<SizeBucket>,
    /// Zero-byte files, populated only when there are at least two
    pub empty_files: Vec<FileRecord>,
    /// Counters for the summary
    pub stats: BucketStats,
}

/// Streaming size bucketer.
///
/// Records are pushed as the collector discovers them; [`finish`](Self::finish)
/// drops singletons and orders the surviving buckets.
#[derive(Debug, Default)]
pub struct SizeBucketer {
    by_size: HashMap<u64, Vec<FileRecord>>,
    empty: Vec<FileRecord>,
    stats: BucketStats,
}

impl SizeBucketer {
    /// Create an empty bucketer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record.
    pub fn push(&mut self, record: FileRecord) {
        self.stats.total_files += 1;
        self.stats.total_size += record.size;

        if record.size == 0 {
            log::trace!("Empty file: {}", record.path.display());
            self.empty.push(record);
        } else {
            self.by_size.entry(record.size).or_default().push(record);
        }
    }

    /// Records pushed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.total_files
    }

    /// Whether nothing was pushed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.total_files == 0
    }

    /// Drop singletons and return the surviving buckets.
    ///
    /// Buckets are ordered by descending potential savings, then by
    /// ascending size, so the most valuable work runs first.
    #[must_use]
    pub fn finish(self) -> BucketSet {
        let Self {
            by_size,
            empty,
            mut stats,
        } = self;

        stats.unique_sizes = by_size.len();
        stats.empty_files = empty.len();

        let mut buckets = Vec::with_capacity(by_size.len());
        for (size, files) in by_size {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!("Eliminated unique size {}: {}", size, files[0].path.display());
            } else {
                stats.potential_duplicates += files.len();
                log::debug!("Size bucket {} bytes: {} candidates", size, files.len());
                buckets.push(SizeBucket::with_files(size, files));
            }
        }

        buckets.sort_by(|a, b| {
            b.potential_savings()
                .cmp(&a.potential_savings())
                .then_with(|| a.size.cmp(&b.size))
        });

        let empty_files = if empty.len() >= 2 {
            empty
        } else {
            stats.eliminated_unique += empty.len();
            Vec::new()
        };

        log::info!(
            "Size phase complete: {} files → {} candidates in {} buckets ({:.1}% eliminated)",
            stats.total_files,
            stats.potential_duplicates,
            buckets.len(),
            stats.elimination_rate()
        );

        BucketSet {
            buckets,
            empty_files,
            stats,
        }
    }
}

/// Bucket an entire collection of records at once.
///
/// # Example
///
/// ```
/// use dff::scanner::FileRecord;
/// use dff::duplicates::bucket_by_size;
/// use std::path::PathBuf;
/// use std::time::SystemTime;
///
/// let files = vec![
///     FileRecord::new(PathBuf::from("/a.txt"), 0, SystemTime::now()),
///     FileRecord::new(PathBuf::from("/b.txt"), 0, SystemTime::now()),
///     FileRecord::new(PathBuf::from("/c.txt"), 200, SystemTime::now()),
/// ];
///
/// let set = bucket_by_size(files);
///
/// assert!(set.buckets.is_empty());
/// assert_eq!(set.empty_files.len(), 2);
/// assert_eq!(set.stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn bucket_by_size(records: impl IntoIterator<Item = FileRecord>) -> BucketSet {
    let mut bucketer = SizeBucketer::new();
    for record in records {
        bucketer.push(record);
    }
    bucketer.finish()
}
