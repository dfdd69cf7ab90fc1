//! Content digests for change detection
//!
//! SHA-512 over the raw bytes of a document. Digests are only ever compared
//! with each other and are never stored.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha512};

/// Read size when hashing files.
pub const BUF_SIZE: usize = 65536;

/// SHA-512 digest of some content.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 64]);

impl ContentDigest {
    fn from_hasher(hasher: Sha512) -> Self {
        let mut bytes = [0u8; 64];
        bytes.copy_from_slice(&hasher.finalize());
        Self(bytes)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self)
    }
}

/// Digest an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> ContentDigest {
    let mut hasher = Sha512::new();
    hasher.update(data);
    ContentDigest::from_hasher(hasher)
}

/// Digest everything readable from `reader`, [`BUF_SIZE`] bytes at a time.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha512::new();
    let mut buf = vec![0u8; BUF_SIZE];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }

    Ok(ContentDigest::from_hasher(hasher))
}

/// Digest a file on disk.
///
/// A missing file yields `None`, which never compares equal to a real digest,
/// so a first run always publishes even if the new document is empty.
pub fn digest_file(path: &Path) -> io::Result<Option<ContentDigest>> {
    match File::open(path) {
        Ok(file) => digest_reader(file).map(Some),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
