//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Deterministic directory walking using walkdir
//! - Streaming content digests (MD5, SHA-256, BLAKE3)
//! - Cycle and hardlink detection by physical file identity
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`collector`]: Directory traversal and file discovery
//! - [`digest`]: Chunked prefix/full hashing behind a pluggable algorithm
//! - [`identity`]: Visited-set keyed by device and inode
//!
//! # Example
//!
//! ```no_run
//! use dff::scanner::{Collector, CollectorConfig};
//! use std::path::PathBuf;
//!
//! let config = CollectorConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let collector = Collector::new(vec![PathBuf::from(".")], config);
//! for entry in collector.collect() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(warning) => eprintln!("Warning: {}", warning),
//!     }
//! }
//! ```

pub mod collector;
pub mod digest;
pub mod identity;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

// Re-export main types
pub use collector::{Collect, Collector};
pub use digest::{
    Digest, DigestAlgorithm, DigestCounters, DigestMode, Digester, StreamHasher,
    DEFAULT_PREFIX_BYTES,
};
pub use identity::IdentityTracker;

/// Metadata for a discovered regular file.
///
/// Records are created by the collector and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileRecord {
    /// Create a new FileRecord.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }
}

/// Configuration for file collection.
///
/// Controls filtering and symlink handling during the walk.
#[derive(Debug, Clone, Default)]
pub struct CollectorConfig {
    /// Follow symbolic links during traversal.
    /// Each physical target is still visited at most once.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Gitignore-style patterns for files and directories to exclude.
    pub exclude_patterns: Vec<String>,
}

impl CollectorConfig {
    /// Set whether symbolic links are followed.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set whether hidden entries are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Set the size window. `None` leaves that side unbounded.
    #[must_use]
    pub fn with_size_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.min_size = min;
        self.max_size = max;
        self
    }

    /// Set the exclude patterns.
    #[must_use]
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }
}

/// Recoverable problems met while walking the roots.
///
/// None of these abort a scan; they are recorded in the run summary.
#[derive(thiserror::Error, Debug, Clone)]
pub enum TraversalWarning {
    /// A directory or file was reached again through a link or a loop.
    #[error("Skipped already visited target: {0}")]
    SkippedCycle(PathBuf),

    /// Permission was denied when accessing a file or directory.
    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),

    /// Any other I/O failure while reading a directory entry.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl TraversalWarning {
    /// Path the warning refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::SkippedCycle(path) | Self::AccessDenied(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}

/// Errors that can occur while digesting a file.
#[derive(thiserror::Error, Debug, Clone)]
pub enum DigestError {
    /// The file disappeared before it could be opened.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when opening the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Opening or reading the file failed for another reason.
    #[error("Read failure for {path}: {source}")]
    ReadFailure {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The read was abandoned because the run was cancelled.
    #[error("Digest cancelled: {0}")]
    Cancelled(PathBuf),
}

impl DigestError {
    /// Whether this error only reflects a cancellation request.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// A warning recorded in the run summary.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ScanWarning {
    /// Raised while walking the roots.
    #[error(transparent)]
    Traversal(#[from] TraversalWarning),

    /// Raised while hashing a candidate file.
    #[error(transparent)]
    Digest(#[from] DigestError),
}

impl ScanWarning {
    /// Whether this is an access-denied warning from either stage.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::Traversal(TraversalWarning::AccessDenied(_))
                | Self::Digest(DigestError::PermissionDenied(_))
        )
    }
}
