//! Physical identity tracking for cycle and hardlink detection.
//!
//! # Overview
//!
//! The same bytes on disk can be reached through several paths: hard links,
//! symbolic links, or overlapping roots. The collector records the physical
//! identity of every directory and file it visits, so each target is
//! yielded at most once and symlink loops terminate.
//!
//! # Platform Support
//!
//! - **Unix**: identity is the (device_id, inode) pair from metadata
//! - **Other**: identity falls back to the canonicalized path, which catches
//!   symlink revisits but not hard links
//!
//! # Example
//!
//! ```no_run
//! use dff::scanner::IdentityTracker;
//! use std::path::Path;
//!
//! let mut tracker = IdentityTracker::new();
//! let path = Path::new("/some/dir");
//! let meta = std::fs::metadata(path)?;
//!
//! assert!(tracker.first_visit(path, &meta));
//! assert!(!tracker.first_visit(path, &meta));
//! # Ok::<(), std::io::Error>(())
//! ```

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Identity of a directory or file independent of the path used to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicalId {
    /// Device and inode number.
    #[cfg(unix)]
    Inode {
        /// Device the file lives on
        dev: u64,
        /// Inode number on that device
        ino: u64,
    },
    /// Canonical absolute path.
    Path(PathBuf),
}

impl PhysicalId {
    /// Derive the identity of `path` from its (followed) metadata.
    ///
    /// Returns `None` only when no inode is available and the path cannot be
    /// canonicalized.
    #[cfg(unix)]
    #[must_use]
    pub fn of(_path: &Path, metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self::Inode {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn of(path: &Path, _metadata: &Metadata) -> Option<Self> {
        std::fs::canonicalize(path).ok().map(Self::Path)
    }
}

/// Visited-set of physical identities.
///
/// Not thread-safe; the collector owns one per run.
#[derive(Debug, Default)]
pub struct IdentityTracker {
    seen: HashSet<PhysicalId>,
}

impl IdentityTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit and report whether it was the first one.
    ///
    /// Entries whose identity cannot be determined are always treated as
    /// first visits.
    pub fn first_visit(&mut self, path: &Path, metadata: &Metadata) -> bool {
        match PhysicalId::of(path, metadata) {
            Some(id) => self.seen.insert(id),
            None => true,
        }
    }

    /// Whether an entry was already visited, without recording it.
    #[must_use]
    pub fn contains(&self, path: &Path, metadata: &Metadata) -> bool {
        PhysicalId::of(path, metadata).is_some_and(|id| self.seen.contains(&id))
    }

    /// Number of distinct identities recorded.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether hard links can be told apart from distinct files here.
    #[must_use]
    pub const fn detects_hardlinks() -> bool {
        cfg!(unix)
    }
}
