//! Staged hashing of size buckets.
//!
//! # Overview
//!
//! Each size bucket goes through two content filters:
//!
//! 1. **Prefix**: hash the first `prefix_bytes` of every member, split by
//!    prefix digest, and drop sub-groups of one.
//! 2. **Full**: re-read every surviving member from the start, split by full
//!    digest. Sub-groups of two or more are duplicates.
//!
//! A file whose digest fails is dropped from its bucket and the error is
//! kept as a warning; the rest of the bucket is unaffected.
//!
//! # Concurrency
//!
//! [`StagedHasher::stage_all`] runs buckets in parallel on a dedicated rayon
//! pool. Each task owns its bucket outright, so no shared maps or locks are
//! involved in grouping. The number of files open at once is bounded
//! separately by an [`IoLimiter`] so that a wide CPU pool does not thrash
//! the disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use rayon::prelude::*;

use super::bucket::SizeBucket;
use crate::progress::ProgressCallback;
use crate::scanner::{Digest, DigestError, DigestMode, Digester, FileRecord};

/// Counting semaphore bounding concurrent file reads.
#[derive(Debug)]
pub struct IoLimiter {
    available: Mutex<usize>,
    released: Condvar,
    capacity: usize,
}

impl IoLimiter {
    /// Create a limiter allowing `capacity` concurrent readers (at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            available: Mutex::new(capacity),
            released: Condvar::new(),
            capacity,
        }
    }

    /// Maximum number of concurrent readers.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Block until a permit is free. The permit is returned on drop.
    pub fn acquire(&self) -> IoPermit<'_> {
        let mut available = self
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *available == 0 {
            available = self
                .released
                .wait(available)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *available -= 1;
        IoPermit { limiter: self }
    }

    fn release(&self) {
        let mut available = self
            .available
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *available += 1;
        self.released.notify_one();
    }
}

/// A held read slot of an [`IoLimiter`].
#[derive(Debug)]
pub struct IoPermit<'a> {
    limiter: &'a IoLimiter,
}

impl Drop for IoPermit<'_> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

/// Counters from staged hashing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageStats {
    /// Successful prefix digests
    pub prefix_digests: usize,
    /// Successful full digests
    pub full_digests: usize,
    /// Files dropped because their prefix digest was unique
    pub eliminated_by_prefix: usize,
    /// Bytes read by full digests
    pub bytes_hashed: u64,
    /// Files dropped because a digest failed
    pub failed_files: usize,
}

impl StageStats {
    /// Add another bucket's counters to these.
    pub fn merge(&mut self, other: &Self) {
        self.prefix_digests += other.prefix_digests;
        self.full_digests += other.full_digests;
        self.eliminated_by_prefix += other.eliminated_by_prefix;
        self.bytes_hashed += other.bytes_hashed;
        self.failed_files += other.failed_files;
    }
}

/// Result of staging one size bucket.
#[derive(Debug, Clone, Default)]
pub struct StagedBucket {
    /// Size shared by every file of the bucket
    pub size: u64,
    /// Full-digest matches of 2+ files, in discovery order of their first member
    pub groups: Vec<(Digest, Vec<FileRecord>)>,
    /// Digest failures (cancellations are not recorded)
    pub warnings: Vec<DigestError>,
    /// Counters for the summary
    pub stats: StageStats,
    /// Cancellation cut this bucket short; `groups` is empty
    pub interrupted: bool,
}

impl StagedBucket {
    fn new(size: u64) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    fn interrupt(mut self) -> Self {
        self.groups.clear();
        self.interrupted = true;
        self
    }
}

/// Split digest results into the successes, keeping failures as warnings.
fn absorb<T>(
    staged: &mut StagedBucket,
    results: Vec<(T, Result<Digest, DigestError>)>,
) -> Vec<(T, Digest)> {
    let mut ok = Vec::with_capacity(results.len());
    for (item, result) in results {
        match result {
            Ok(digest) => ok.push((item, digest)),
            Err(e) if e.is_cancelled() => staged.interrupted = true,
            Err(e) => {
                staged.stats.failed_files += 1;
                staged.warnings.push(e);
            }
        }
    }
    ok
}

/// Group items by key, keeping first-seen order of keys and of members.
fn split_ordered<K, T>(items: impl IntoIterator<Item = (K, T)>) -> Vec<(K, Vec<T>)>
where
    K: Copy + Eq + std::hash::Hash,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for (key, item) in items {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(item),
            None => {
                index.insert(key, groups.len());
                groups.push((key, vec![item]));
            }
        }
    }
    groups
}

/// Runs the prefix and full digest stages over size buckets.
#[derive(Clone)]
pub struct StagedHasher {
    digester: Digester,
    prefix_bytes: u64,
    io_limiter: Arc<IoLimiter>,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
    processed: Arc<AtomicUsize>,
}

impl std::fmt::Debug for StagedHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedHasher")
            .field("digester", &self.digester)
            .field("prefix_bytes", &self.prefix_bytes)
            .field("io_concurrency", &self.io_limiter.capacity())
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl StagedHasher {
    /// Create a staged hasher.
    ///
    /// # Arguments
    ///
    /// * `digester` - Digest engine (carries the algorithm)
    /// * `prefix_bytes` - Bytes hashed in the prefix stage
    /// * `io_concurrency` - Maximum simultaneously open readers
    #[must_use]
    pub fn new(digester: Digester, prefix_bytes: u64, io_concurrency: usize) -> Self {
        Self {
            digester,
            prefix_bytes,
            io_limiter: Arc::new(IoLimiter::new(io_concurrency)),
            shutdown_flag: None,
            progress_callback: None,
            processed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Skip remaining files and buckets once this flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report per-file progress to this callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn digest(&self, record: &FileRecord, mode: DigestMode) -> Result<Digest, DigestError> {
        if self.is_shutdown_requested() {
            return Err(DigestError::Cancelled(record.path.clone()));
        }
        let _permit = self.io_limiter.acquire();
        self.digester.compute(&record.path, mode)
    }

    /// Mark a file as leaving the pipeline.
    fn advance(&self, record: &FileRecord) {
        if let Some(ref callback) = self.progress_callback {
            let done = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
            callback.on_progress(done, record.path.to_string_lossy().as_ref());
        }
    }

    /// Run both stages over one bucket.
    ///
    /// Members are digested in parallel on the current rayon pool.
    #[must_use]
    pub fn stage(&self, bucket: SizeBucket) -> StagedBucket {
        let SizeBucket { size, files } = bucket;
        let mut staged = StagedBucket::new(size);

        if self.is_shutdown_requested() {
            log::trace!("Skipping bucket of {} bytes: shutdown requested", size);
            return staged.interrupt();
        }

        // Stage 1: prefix digests
        let prefix_results: Vec<_> = files
            .into_par_iter()
            .enumerate()
            .map(|(order, file)| {
                let result = self.digest(&file, DigestMode::Prefix(self.prefix_bytes));
                if let Err(ref e) = result {
                    if !e.is_cancelled() {
                        log::warn!("Failed to hash prefix of {}: {}", file.path.display(), e);
                        self.advance(&file);
                    }
                }
                ((order, file), result)
            })
            .collect();

        let prefixed = absorb(&mut staged, prefix_results);
        staged.stats.prefix_digests = prefixed.len();
        if staged.interrupted {
            log::debug!("Bucket of {} bytes interrupted during prefix stage", size);
            return staged.interrupt();
        }

        let mut survivors = Vec::new();
        for (prefix, members) in split_ordered(prefixed.into_iter().map(|(f, d)| (d, f))) {
            if members.len() < 2 {
                staged.stats.eliminated_by_prefix += members.len();
                for (_, file) in &members {
                    log::trace!("Unique prefix: {}", file.path.display());
                    self.advance(file);
                }
            } else {
                survivors.extend(members.into_iter().map(|(order, f)| (order, prefix, f)));
            }
        }
        // Restore discovery order across prefix sub-groups
        survivors.sort_by_key(|(order, _, _)| *order);

        if survivors.is_empty() {
            log::debug!("Bucket of {} bytes: all prefixes unique", size);
            return staged;
        }

        // Stage 2: full digests, re-read from the start
        let full_results: Vec<_> = survivors
            .into_par_iter()
            .map(|(_, prefix, file)| {
                let result = self.digest(&file, DigestMode::Full);
                match result {
                    Ok(_) => {
                        if let Some(ref callback) = self.progress_callback {
                            callback.on_item_completed(file.size);
                        }
                        self.advance(&file);
                    }
                    Err(ref e) if !e.is_cancelled() => {
                        log::warn!("Failed to hash {}: {}", file.path.display(), e);
                        self.advance(&file);
                    }
                    Err(_) => {}
                }
                ((prefix, file), result)
            })
            .collect();

        let hashed = absorb(&mut staged, full_results);
        staged.stats.full_digests = hashed.len();
        staged.stats.bytes_hashed = size.saturating_mul(hashed.len() as u64);
        if staged.interrupted {
            log::debug!("Bucket of {} bytes interrupted during full stage", size);
            return staged.interrupt();
        }

        staged.groups = split_ordered(
            hashed
                .into_iter()
                .map(|((prefix, file), full)| ((prefix, full), file)),
        )
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|((_, full), members)| (full, members))
        .collect();

        log::debug!(
            "Bucket of {} bytes: {} duplicate group(s)",
            size,
            staged.groups.len()
        );
        staged
    }

    /// Stage every bucket on a pool of `cpu_concurrency` threads.
    ///
    /// Results are returned in the order of `buckets`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread pool cannot be created.
    pub fn stage_all(
        &self,
        buckets: Vec<SizeBucket>,
        cpu_concurrency: usize,
    ) -> Result<Vec<StagedBucket>, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cpu_concurrency.max(1))
            .thread_name(|i| format!("dff-hash-{i}"))
            .build()?;

        log::info!(
            "Hashing {} bucket(s) on {} thread(s), {} concurrent reader(s)",
            buckets.len(),
            pool.current_num_threads(),
            self.io_limiter.capacity()
        );

        Ok(pool.install(|| buckets.into_par_iter().map(|b| self.stage(b)).collect()))
    }
}
