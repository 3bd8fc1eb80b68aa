//! Duplicate finder implementation with staged detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Collect** - Walk the roots (see [`crate::scanner::collector`]) on a
//!    producer thread while the calling thread buckets records by size
//! 2. **Bucket** - Drop sizes seen once, set zero-byte files aside
//! 3. **Hash** - Prefix then full digests per bucket (see [`super::staged`])
//! 4. **Group** - Build and order [`DuplicateGroup`]s
//!
//! # Example
//!
//! ```no_run
//! use dff::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default().with_io_concurrency(4);
//! let finder = DuplicateFinder::new(config);
//!
//! let report = finder.find_duplicates(&[PathBuf::from(".")])?;
//! println!("Found {} duplicate groups", report.summary.duplicate_groups);
//! println!("Reclaimable space: {}", report.summary.reclaimable_display());
//! # Ok::<(), dff::duplicates::FinderError>(())
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::bucket::{bucket_by_size, BucketSet, SizeBucketer};
use super::groups::{group_duplicates, DuplicateGroup};
use super::staged::{StageStats, StagedHasher};
use crate::progress::ProgressCallback;
use crate::scanner::{
    Collector, CollectorConfig, DigestAlgorithm, Digester, FileRecord, ScanWarning,
    DEFAULT_PREFIX_BYTES,
};

/// Records buffered between the collector thread and the bucketer.
const CHANNEL_CAPACITY: usize = 1024;

/// Default number of simultaneously open readers.
pub const DEFAULT_IO_CONCURRENCY: usize = 4;

/// Number of hashing threads when none is configured.
#[must_use]
pub fn default_cpu_concurrency() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Bytes hashed in the prefix stage (default 4096).
    pub prefix_bytes: u64,
    /// Digest algorithm for the whole run.
    pub algorithm: DigestAlgorithm,
    /// Maximum simultaneously open readers.
    /// Default is 4 to prevent disk thrashing.
    pub io_concurrency: usize,
    /// Hashing pool threads. Defaults to available parallelism.
    pub cpu_concurrency: usize,
    /// Collector configuration for directory traversal.
    pub collector_config: CollectorConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("prefix_bytes", &self.prefix_bytes)
            .field("algorithm", &self.algorithm)
            .field("io_concurrency", &self.io_concurrency)
            .field("cpu_concurrency", &self.cpu_concurrency)
            .field("collector_config", &self.collector_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            prefix_bytes: DEFAULT_PREFIX_BYTES,
            algorithm: DigestAlgorithm::default(),
            io_concurrency: DEFAULT_IO_CONCURRENCY,
            cpu_concurrency: default_cpu_concurrency(),
            collector_config: CollectorConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the prefix length (at least 1 byte).
    #[must_use]
    pub fn with_prefix_bytes(mut self, bytes: u64) -> Self {
        self.prefix_bytes = bytes.max(1);
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the number of concurrent readers.
    #[must_use]
    pub fn with_io_concurrency(mut self, readers: usize) -> Self {
        self.io_concurrency = readers.max(1);
        self
    }

    /// Set the number of hashing threads.
    #[must_use]
    pub fn with_cpu_concurrency(mut self, threads: usize) -> Self {
        self.cpu_concurrency = threads.max(1);
        self
    }

    /// Set the collector configuration.
    #[must_use]
    pub fn with_collector_config(mut self, config: CollectorConfig) -> Self {
        self.collector_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Every stage ran to the end.
    #[default]
    Completed,
    /// Shutdown was requested; only groups finished before that are reported.
    Cancelled,
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Total number of files collected
    pub total_files: usize,
    /// Total size of all collected files in bytes
    pub total_size: u64,
    /// Files eliminated by size bucketing (unique sizes)
    pub eliminated_by_size: usize,
    /// Files eliminated by prefix digest
    pub eliminated_by_prefix: usize,
    /// Successful prefix digests
    pub prefix_digests: usize,
    /// Successful full digests
    pub full_digests: usize,
    /// Bytes read by full digests
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one original per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub wasted_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Recoverable problems met during the scan
    pub warnings: Vec<ScanWarning>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.wasted_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.wasted_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize::b(self.total_size).to_string()
    }

    /// Whether any warning was recorded.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    fn absorb_stage_stats(&mut self, stats: &StageStats) {
        self.eliminated_by_prefix = stats.eliminated_by_prefix;
        self.prefix_digests = stats.prefix_digests;
        self.full_digests = stats.full_digests;
        self.bytes_hashed = stats.bytes_hashed;
    }

    fn absorb_groups(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.wasted_space = groups.iter().map(|g| g.wasted_space).sum();
    }
}

/// Everything a run produces.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Confirmed duplicate groups, most wasted space first
    pub groups: Vec<DuplicateGroup>,
    /// Counters and warnings
    pub summary: ScanSummary,
    /// Whether the run completed or was cancelled
    pub status: ScanStatus,
}

impl ScanReport {
    /// Whether the run was cut short by a shutdown request.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.status == ScanStatus::Cancelled
    }

    /// Whether at least one duplicate group was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.groups.is_empty()
    }
}

/// Fatal errors of a duplicate scan.
///
/// Everything else is recorded as a [`ScanWarning`] and the run continues.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// None of the given roots could be accessed.
    #[error("None of the given paths could be accessed: {}", display_paths(.0))]
    NoAccessibleRoots(Vec<PathBuf>),

    /// The hashing thread pool could not be created.
    #[error("Failed to create hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Duplicate finder that orchestrates the staged detection pipeline.
///
/// # Example
///
/// ```no_run
/// use dff::duplicates::DuplicateFinder;
/// use std::path::PathBuf;
///
/// let finder = DuplicateFinder::with_defaults();
/// match finder.find_duplicates(&[PathBuf::from(".")]) {
///     Ok(report) => {
///         println!("Found {} duplicate groups", report.groups.len());
///         println!("Can reclaim {} bytes", report.summary.wasted_space);
///     }
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    shutdown_flag: Arc<AtomicBool>,
    digester: Digester,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let shutdown_flag = config.shutdown_flag.clone().unwrap_or_default();
        let digester = Digester::new(config.algorithm).with_shutdown_flag(shutdown_flag.clone());
        Self {
            config,
            shutdown_flag,
            digester,
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// The digest engine, whose counters accumulate across runs.
    #[must_use]
    pub fn digester(&self) -> &Digester {
        &self.digester
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag.load(Ordering::SeqCst)
    }

    /// Find all duplicate files below the given roots.
    ///
    /// An empty `roots` slice yields an empty, completed report.
    ///
    /// # Errors
    ///
    /// - [`FinderError::NoAccessibleRoots`] if roots were given but none of
    ///   them can be accessed
    /// - [`FinderError::ThreadPool`] if the hashing pool cannot be built
    pub fn find_duplicates(&self, roots: &[PathBuf]) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();

        let collector = Collector::new(roots.to_vec(), self.config.collector_config.clone())
            .with_shutdown_flag(self.shutdown_flag.clone());
        if !roots.is_empty() && collector.accessible_roots().is_empty() {
            return Err(FinderError::NoAccessibleRoots(roots.to_vec()));
        }

        log::info!("Collecting files from {} root(s)", collector.accessible_roots().len());
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("collect", 0);
        }

        let mut bucketer = SizeBucketer::new();
        let mut warnings: Vec<ScanWarning> = Vec::new();
        let (tx, rx) = mpsc::sync_channel(CHANNEL_CAPACITY);

        std::thread::scope(|scope| {
            scope.spawn(move || {
                for item in collector.collect() {
                    if tx.send(item).is_err() {
                        break;
                    }
                }
            });

            for item in rx {
                match item {
                    Ok(record) => {
                        if let Some(ref callback) = self.config.progress_callback {
                            callback.on_progress(
                                bucketer.len() + 1,
                                record.path.to_string_lossy().as_ref(),
                            );
                        }
                        bucketer.push(record);
                    }
                    Err(warning) => warnings.push(warning.into()),
                }
            }
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("collect");
        }
        log::info!(
            "Collected {} file(s), {} warning(s)",
            bucketer.len(),
            warnings.len()
        );

        self.run_stages(bucketer.finish(), warnings, start_time)
    }

    /// Find duplicates among already collected records.
    ///
    /// Skips traversal; records are bucketed and hashed as usual.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the hashing pool cannot be built.
    pub fn find_duplicates_from_records(
        &self,
        records: impl IntoIterator<Item = FileRecord>,
    ) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        self.run_stages(bucket_by_size(records), Vec::new(), start_time)
    }

    fn run_stages(
        &self,
        set: BucketSet,
        mut warnings: Vec<ScanWarning>,
        start_time: Instant,
    ) -> Result<ScanReport, FinderError> {
        let BucketSet {
            buckets,
            empty_files,
            stats: bucket_stats,
        } = set;

        let mut summary = ScanSummary {
            total_files: bucket_stats.total_files,
            total_size: bucket_stats.total_size,
            eliminated_by_size: bucket_stats.eliminated_unique,
            ..Default::default()
        };

        // A group of empty files is only complete if collection finished
        let collection_cancelled = self.is_shutdown_requested();
        let empty_group = if collection_cancelled {
            None
        } else {
            DuplicateGroup::from_empty_files(empty_files, self.config.algorithm)
        };

        let mut hasher = StagedHasher::new(
            self.digester.clone(),
            self.config.prefix_bytes,
            self.config.io_concurrency,
        )
        .with_shutdown_flag(self.shutdown_flag.clone());
        if let Some(ref callback) = self.config.progress_callback {
            hasher = hasher.with_progress_callback(Arc::clone(callback));
            callback.on_phase_start("hash", bucket_stats.potential_duplicates);
        }

        let staged = hasher.stage_all(buckets, self.config.cpu_concurrency)?;

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("hash");
        }

        let mut stage_stats = StageStats::default();
        let mut interrupted = collection_cancelled;
        for bucket in &staged {
            stage_stats.merge(&bucket.stats);
            interrupted |= bucket.interrupted;
            warnings.extend(bucket.warnings.iter().cloned().map(ScanWarning::from));
        }
        summary.absorb_stage_stats(&stage_stats);

        let groups = group_duplicates(staged, empty_group);
        summary.absorb_groups(&groups);
        summary.warnings = warnings;
        summary.scan_duration = start_time.elapsed();

        let status = if interrupted {
            log::info!("Scan cancelled: reporting {} completed group(s)", groups.len());
            ScanStatus::Cancelled
        } else {
            ScanStatus::Completed
        };

        log::info!(
            "Scan complete: {} groups, {} duplicates, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok(ScanReport {
            groups,
            summary,
            status,
        })
    }
}
