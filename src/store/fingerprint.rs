use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Integer fingerprint naming every on-disk artifact of one ingested image.
///
/// Derived from the staging path of the upload, not from its bytes, and
/// truncated to 32 bits. Byte-identical uploads get distinct keys; distinct
/// uploads may collide, in which case the later one replaces every earlier
/// artifact (see [`StoredOriginal::replaced`](super::StoredOriginal)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentKey(u32);

impl ContentKey {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn from_path(path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.to_string_lossy().as_bytes());
        let digest = hasher.finalize();
        Self(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentKey {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self)
    }
}

impl From<ContentKey> for i64 {
    fn from(key: ContentKey) -> Self {
        key.0 as i64
    }
}
