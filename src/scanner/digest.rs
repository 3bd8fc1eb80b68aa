//! Streaming content digests for duplicate detection.
//!
//! # Overview
//!
//! Files are fingerprinted in two modes:
//!
//! - **Prefix**: only the first `prefix_bytes` bytes (default 4 KiB). A cheap
//!   filter that separates most same-size files without reading them fully.
//! - **Full**: the whole content. Equality of full digests is what makes two
//!   files duplicates.
//!
//! Bytes are always streamed through a fixed 64 KiB buffer, so memory use is
//! independent of file size.
//!
//! # Algorithms
//!
//! The hash function is chosen per run with [`DigestAlgorithm`]. MD5 is the
//! default and matches the fingerprints produced by earlier dff releases;
//! SHA-256 and BLAKE3 are available when collision resistance matters.
//!
//! # Example
//!
//! ```no_run
//! use dff::scanner::{Digester, DigestAlgorithm, DigestMode};
//! use std::path::Path;
//!
//! let digester = Digester::new(DigestAlgorithm::Blake3);
//! let prefix = digester.compute(Path::new("file.bin"), DigestMode::Prefix(4096))?;
//! let full = digester.compute(Path::new("file.bin"), DigestMode::Full)?;
//! println!("{prefix} {full}");
//! # Ok::<(), dff::scanner::DigestError>(())
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use sha2::Digest as CryptoDigest;

use super::DigestError;

/// Default number of leading bytes hashed in prefix mode.
pub const DEFAULT_PREFIX_BYTES: u64 = 4096;

/// Read buffer size used for every digest.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Largest digest any supported algorithm produces.
const MAX_DIGEST_LEN: usize = 32;

/// A fixed-size fingerprint of file content.
///
/// Stores up to 32 bytes inline so it can be copied and used as a map key
/// without allocation. Two digests are equal only if they were produced by
/// the same algorithm over the same bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    bytes: [u8; MAX_DIGEST_LEN],
    len: u8,
}

impl Digest {
    /// Build a digest from raw hash output.
    ///
    /// Output longer than 32 bytes is truncated.
    #[must_use]
    pub fn from_slice(raw: &[u8]) -> Self {
        let len = raw.len().min(MAX_DIGEST_LEN);
        let mut bytes = [0u8; MAX_DIGEST_LEN];
        bytes[..len].copy_from_slice(&raw[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    /// The raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..usize::from(self.len)]
    }

    /// Lowercase hexadecimal rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Incremental hasher fed by the digest engine.
///
/// Implemented for every supported algorithm so the engine never needs to
/// know which one is in use.
pub trait StreamHasher: Send {
    /// Feed the next chunk of bytes.
    fn update(&mut self, data: &[u8]);

    /// Consume the hasher and return the fingerprint.
    fn finalize(self: Box<Self>) -> Digest;
}

/// Adapter for the RustCrypto hash family (MD5, SHA-2).
struct RustCryptoHasher<D>(D);

impl<D> StreamHasher for RustCryptoHasher<D>
where
    D: CryptoDigest + Send,
{
    fn update(&mut self, data: &[u8]) {
        CryptoDigest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Digest {
        let Self(inner) = *self;
        Digest::from_slice(inner.finalize().as_slice())
    }
}

struct Blake3Hasher(blake3::Hasher);

impl StreamHasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Digest {
        Digest::from_slice(self.0.finalize().as_bytes())
    }
}

/// Hash function used for a run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5 (128-bit). Fast and compatible with earlier dff output.
    #[default]
    Md5,
    /// SHA-256 (256-bit).
    Sha256,
    /// BLAKE3 (256-bit).
    Blake3,
}

impl DigestAlgorithm {
    /// Create a fresh streaming hasher for this algorithm.
    #[must_use]
    pub fn hasher(self) -> Box<dyn StreamHasher> {
        match self {
            Self::Md5 => Box::new(RustCryptoHasher(md5::Md5::new())),
            Self::Sha256 => Box::new(RustCryptoHasher(sha2::Sha256::new())),
            Self::Blake3 => Box::new(Blake3Hasher(blake3::Hasher::new())),
        }
    }

    /// Digest of the empty byte stream, computed without I/O.
    #[must_use]
    pub fn empty_digest(self) -> Digest {
        self.hasher().finalize()
    }

    /// Length in bytes of the digests this algorithm produces.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha256 | Self::Blake3 => 32,
        }
    }

    /// Lowercase name as used on the command line and in reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How much of a file to digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestMode {
    /// Stop after this many bytes or at EOF, whichever comes first.
    Prefix(u64),
    /// Read the entire stream.
    Full,
}

/// Number of digest invocations performed by a [`Digester`].
#[derive(Debug, Default)]
pub struct DigestCounters {
    prefix: AtomicUsize,
    full: AtomicUsize,
}

impl DigestCounters {
    /// Prefix digests started so far.
    #[must_use]
    pub fn prefix_count(&self) -> usize {
        self.prefix.load(Ordering::Relaxed)
    }

    /// Full digests started so far.
    #[must_use]
    pub fn full_count(&self) -> usize {
        self.full.load(Ordering::Relaxed)
    }

    fn record(&self, mode: DigestMode) {
        match mode {
            DigestMode::Prefix(_) => self.prefix.fetch_add(1, Ordering::Relaxed),
            DigestMode::Full => self.full.fetch_add(1, Ordering::Relaxed),
        };
    }
}

/// Computes prefix and full digests of files.
///
/// Cheap to share between threads: all state is atomic.
#[derive(Debug, Clone)]
pub struct Digester {
    algorithm: DigestAlgorithm,
    counters: Arc<DigestCounters>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Digester {
    /// Create a digester for the given algorithm.
    #[must_use]
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            counters: Arc::new(DigestCounters::default()),
            shutdown_flag: None,
        }
    }

    /// Abort reads between chunks once this flag becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Invocation counters shared by all clones of this digester.
    #[must_use]
    pub fn counters(&self) -> &Arc<DigestCounters> {
        &self.counters
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digest a file.
    ///
    /// # Errors
    ///
    /// - [`DigestError::NotFound`] / [`DigestError::PermissionDenied`] when
    ///   the file cannot be opened
    /// - [`DigestError::ReadFailure`] for any other open or read failure
    /// - [`DigestError::Cancelled`] when shutdown was requested mid-read
    pub fn compute(&self, path: &Path, mode: DigestMode) -> Result<Digest, DigestError> {
        self.counters.record(mode);

        let mut file = File::open(path).map_err(|e| open_error(path, e))?;
        let mut hasher = self.algorithm.hasher();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut remaining = match mode {
            DigestMode::Prefix(limit) => limit,
            DigestMode::Full => u64::MAX,
        };

        while remaining > 0 {
            if self.is_shutdown_requested() {
                return Err(DigestError::Cancelled(path.to_path_buf()));
            }

            let want = usize::try_from(remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE));
            let read = match file.read(&mut buffer[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(DigestError::ReadFailure {
                        path: path.to_path_buf(),
                        source: Arc::new(e),
                    })
                }
            };

            hasher.update(&buffer[..read]);
            remaining -= read as u64;
        }

        log::trace!("{:?} digest of {}", mode, path.display());
        Ok(hasher.finalize())
    }
}

fn open_error(path: &Path, error: std::io::Error) -> DigestError {
    match error.kind() {
        ErrorKind::NotFound => DigestError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => DigestError::PermissionDenied(path.to_path_buf()),
        _ => DigestError::ReadFailure {
            path: path.to_path_buf(),
            source: Arc::new(error),
        },
    }
}
