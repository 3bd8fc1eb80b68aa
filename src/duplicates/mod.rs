//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size bucketing (first filter, no I/O)
//! - Staged prefix and full digests per bucket
//! - Duplicate group ordering
//! - The [`DuplicateFinder`] pipeline orchestrator

pub mod bucket;
pub mod finder;
pub mod groups;
pub mod staged;

pub use bucket::{bucket_by_size, BucketSet, BucketStats, SizeBucket, SizeBucketer};
pub use finder::{
    default_cpu_concurrency, DuplicateFinder, FinderConfig, FinderError, ScanReport, ScanStatus,
    ScanSummary, DEFAULT_IO_CONCURRENCY,
};
pub use groups::{group_duplicates, DuplicateGroup};
pub use staged::{IoLimiter, IoPermit, StageStats, StagedBucket, StagedHasher};
