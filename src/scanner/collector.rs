//! File discovery using walkdir.
//!
//! # Overview
//!
//! The [`Collector`] enumerates every regular file below a set of roots and
//! yields a [`FileRecord`] for each one. Traversal is single-threaded and
//! sorted by file name within each directory, so two runs over an unchanged
//! tree produce records in the same order.
//!
//! # Features
//!
//! - Root canonicalization with duplicate and nested root removal
//! - Optional symlink following with physical-identity cycle detection
//! - Gitignore-style exclude patterns for files and directories
//! - Size filtering (min/max) and hidden entry filtering
//! - Hard links to an already collected file are skipped
//! - Graceful shutdown via atomic flag
//!
//! Problems that only affect one entry are yielded as
//! [`TraversalWarning`] values and the walk continues.

use std::collections::VecDeque;
use std::fs::{File, Metadata};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::identity::IdentityTracker;
use super::{CollectorConfig, FileRecord, TraversalWarning};

/// Enumerates regular files under one or more roots.
#[derive(Debug)]
pub struct Collector {
    /// Canonical, non-overlapping roots in input order
    roots: Vec<PathBuf>,
    /// Warnings for roots that could not be resolved
    root_warnings: Vec<TraversalWarning>,
    config: CollectorConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Collector {
    /// Create a collector for the given roots.
    ///
    /// Roots are canonicalized immediately. Roots that cannot be resolved
    /// are reported as the first items of [`collect`](Self::collect).
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: CollectorConfig) -> Self {
        let (roots, root_warnings) = resolve_roots(&roots);
        Self {
            roots,
            root_warnings,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// The flag is checked before every directory entry; once it is `true`
    /// the iterator ends.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Roots that will actually be walked.
    #[must_use]
    pub fn accessible_roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Walk all roots, yielding files and warnings as they are found.
    #[must_use]
    pub fn collect(self) -> Collect {
        Collect {
            pending: self.root_warnings.into(),
            roots: self.roots.into_iter(),
            current: None,
            tracker: IdentityTracker::new(),
            config: self.config,
            shutdown_flag: self.shutdown_flag,
        }
    }
}

/// Canonicalize roots, dropping duplicates and roots nested in another root.
fn resolve_roots(roots: &[PathBuf]) -> (Vec<PathBuf>, Vec<TraversalWarning>) {
    let mut resolved: Vec<PathBuf> = Vec::with_capacity(roots.len());
    let mut warnings = Vec::new();

    for root in roots {
        match std::fs::canonicalize(root).and_then(|path| probe_root(&path).map(|()| path)) {
            Ok(path) => {
                if !resolved.contains(&path) {
                    resolved.push(path);
                }
            }
            Err(e) => {
                log::warn!("Cannot access root {}: {}", root.display(), e);
                warnings.push(io_warning(root, e));
            }
        }
    }

    let mut kept: Vec<PathBuf> = Vec::with_capacity(resolved.len());
    for path in &resolved {
        let nested = resolved
            .iter()
            .any(|other| other != path && path.starts_with(other));
        if nested {
            log::debug!("Root {} is inside another root, skipping", path.display());
        } else {
            kept.push(path.clone());
        }
    }

    (kept, warnings)
}

/// Check that a root can be listed (directory) or opened (file).
fn probe_root(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::read_dir(path).map(|_| ())
    } else {
        File::open(path).map(|_| ())
    }
}

fn io_warning(path: &Path, error: std::io::Error) -> TraversalWarning {
    if error.kind() == ErrorKind::PermissionDenied {
        TraversalWarning::AccessDenied(path.to_path_buf())
    } else {
        TraversalWarning::Io {
            path: path.to_path_buf(),
            source: Arc::new(error),
        }
    }
}

/// Build the exclude matcher for one root.
fn build_excludes(root: &Path, patterns: &[String]) -> Option<Gitignore> {
    if patterns.is_empty() {
        return None;
    }

    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        if let Err(e) = builder.add_line(None, pattern) {
            log::warn!("Invalid exclude pattern '{}': {}", pattern, e);
        }
    }

    match builder.build() {
        Ok(gitignore) if gitignore.is_empty() => None,
        Ok(gitignore) => Some(gitignore),
        Err(e) => {
            log::warn!("Failed to build exclude patterns: {}", e);
            None
        }
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Walk state for a single root.
struct RootWalk {
    root: PathBuf,
    walk: walkdir::IntoIter,
    excludes: Option<Gitignore>,
}

impl RootWalk {
    fn new(root: PathBuf, config: &CollectorConfig) -> Self {
        log::debug!("Walking {}", root.display());
        let walk = WalkDir::new(&root)
            .follow_links(config.follow_symlinks)
            .sort_by_file_name()
            .into_iter();
        let excludes = build_excludes(&root, &config.exclude_patterns);
        Self {
            root,
            walk,
            excludes,
        }
    }

    /// Whether an entry below the root is filtered out by name.
    fn is_filtered(&self, entry: &DirEntry, config: &CollectorConfig) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        if config.skip_hidden && is_hidden(entry) {
            return true;
        }
        let Some(excludes) = &self.excludes else {
            return false;
        };

        let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
        let path_str = relative.to_string_lossy();
        let normalized = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };
        excludes
            .matched(normalized, entry.file_type().is_dir())
            .is_ignore()
    }

    fn visit(
        &mut self,
        entry: DirEntry,
        config: &CollectorConfig,
        tracker: &mut IdentityTracker,
    ) -> Option<Result<FileRecord, TraversalWarning>> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if self.is_filtered(&entry, config) {
                log::trace!("Excluding directory: {}", entry.path().display());
                self.walk.skip_current_dir();
                return None;
            }
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    self.walk.skip_current_dir();
                    return Some(Err(walk_error(e)));
                }
            };
            if !tracker.first_visit(entry.path(), &metadata) {
                log::warn!("Skipping already visited directory: {}", entry.path().display());
                self.walk.skip_current_dir();
                return Some(Err(TraversalWarning::SkippedCycle(entry.into_path())));
            }
            return None;
        }

        if !file_type.is_file() {
            // Sockets, devices, fifos and unfollowed symlinks
            log::trace!("Skipping non-regular entry: {}", entry.path().display());
            return None;
        }

        if self.is_filtered(&entry, config) {
            log::trace!("Excluding file: {}", entry.path().display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(walk_error(e))),
        };
        let size = metadata.len();
        if !passes_size_filter(config, size) {
            log::trace!("Skipping file due to size filter ({}): {}", size, entry.path().display());
            return None;
        }

        if !tracker.first_visit(entry.path(), &metadata) {
            if entry.path_is_symlink() {
                log::warn!("Skipping already visited file: {}", entry.path().display());
                return Some(Err(TraversalWarning::SkippedCycle(entry.into_path())));
            }
            log::debug!("Skipping hardlink: {}", entry.path().display());
            return None;
        }

        Some(probe(entry.into_path(), &metadata))
    }
}

/// Confirm the file can be opened, then build its record.
fn probe(path: PathBuf, metadata: &Metadata) -> Result<FileRecord, TraversalWarning> {
    if let Err(e) = File::open(&path) {
        log::warn!("Cannot open {}: {}", path.display(), e);
        return Err(io_warning(&path, e));
    }

    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    Ok(FileRecord::new(path, metadata.len(), modified))
}

fn passes_size_filter(config: &CollectorConfig, size: u64) -> bool {
    if let Some(min) = config.min_size {
        if size < min {
            return false;
        }
    }
    if let Some(max) = config.max_size {
        if size > max {
            return false;
        }
    }
    true
}

/// Convert a walkdir error into a warning.
fn walk_error(error: walkdir::Error) -> TraversalWarning {
    let path = error.path().map(Path::to_path_buf).unwrap_or_default();

    if error.loop_ancestor().is_some() {
        log::warn!("Symlink loop detected at {}", path.display());
        return TraversalWarning::SkippedCycle(path);
    }

    let message = error.to_string();
    let io = error
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    log::warn!("Walk error for {}: {}", path.display(), io);
    io_warning(&path, io)
}

/// Whether a walk error is a dangling symlink, which is skipped silently.
fn is_dangling_link(error: &walkdir::Error) -> bool {
    let not_found = error
        .io_error()
        .is_some_and(|e| e.kind() == ErrorKind::NotFound);
    not_found
        && error.path().is_some_and(|p| {
            std::fs::symlink_metadata(p).is_ok_and(|m| m.file_type().is_symlink())
        })
}

/// Streaming iterator returned by [`Collector::collect`].
pub struct Collect {
    pending: VecDeque<TraversalWarning>,
    roots: std::vec::IntoIter<PathBuf>,
    current: Option<RootWalk>,
    tracker: IdentityTracker,
    config: CollectorConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Collect {
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

impl Iterator for Collect {
    type Item = Result<FileRecord, TraversalWarning>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(warning) = self.pending.pop_front() {
                return Some(Err(warning));
            }

            if self.is_shutdown_requested() {
                log::debug!("Collector: Shutdown requested, stopping iteration");
                return None;
            }

            let Some(current) = self.current.as_mut() else {
                let root = self.roots.next()?;
                self.current = Some(RootWalk::new(root, &self.config));
                continue;
            };

            match current.walk.next() {
                None => self.current = None,
                Some(Ok(entry)) => {
                    if let Some(item) = current.visit(entry, &self.config, &mut self.tracker) {
                        return Some(item);
                    }
                }
                Some(Err(e)) if is_dangling_link(&e) => {
                    log::trace!("Skipping dangling symlink: {:?}", e.path());
                }
                Some(Err(e)) => return Some(Err(walk_error(e))),
            }
        }
    }
}
