use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::formats::SUPPORTED_EXTENSIONS;
use super::{ContentKey, StoreError};

/// The three artifacts kept per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// `<key>.in.<ext>`, the upload as received.
    Original,
    /// `<key>.out.<ext>`, the filtered result.
    Output,
    /// `<key>.thumb.jpg`, derived lazily from the output.
    Thumbnail,
}

impl Variant {
    fn tag(&self) -> &'static str {
        match self {
            Variant::Original => "in",
            Variant::Output => "out",
            Variant::Thumbnail => "thumb",
        }
    }
}

/// An upload written to the store directory but not yet named by its key.
pub struct StagedUpload {
    file: NamedTempFile,
    key: ContentKey,
}

impl StagedUpload {
    pub fn key(&self) -> ContentKey {
        self.key
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[derive(Debug, Clone)]
pub struct StoredOriginal {
    pub key: ContentKey,
    pub path: PathBuf,
    pub extension: String,
    /// Another upload already owned this key and its artifacts were removed.
    pub replaced: bool,
}

/// Flat directory of artifacts addressed by [`ContentKey`] plus a fixed
/// suffix convention. Writers of the same key race; the last rename wins.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn file_name(key: ContentKey, variant: Variant, extension: &str) -> String {
        match variant {
            Variant::Thumbnail => format!("{}.thumb.jpg", key),
            _ => format!("{}.{}.{}", key, variant.tag(), extension),
        }
    }

    pub fn path_for(&self, key: ContentKey, variant: Variant, extension: &str) -> PathBuf {
        self.root.join(Self::file_name(key, variant, extension))
    }

    /// Write raw upload bytes to a temp file inside the store and derive the
    /// key from that temp file's absolute path.
    pub fn stage(&self, bytes: &[u8]) -> Result<StagedUpload, StoreError> {
        self.ensure()?;
        let mut file = tempfile::Builder::new()
            .prefix(".upload_")
            .tempfile_in(&self.root)?;
        file.write_all(bytes)?;
        file.flush()?;

        let absolute = std::path::absolute(file.path())?;
        let key = ContentKey::from_path(&absolute);
        debug!("Staged {} bytes at {:?} as {}", bytes.len(), absolute, key);

        Ok(StagedUpload { file, key })
    }

    /// Move a staged upload to `<key>.in.<ext>`. Any artifacts already stored
    /// under the key are removed first, whatever their extension.
    pub fn commit(&self, staged: StagedUpload, extension: &str) -> Result<StoredOriginal, StoreError> {
        let key = staged.key;
        let path = self.path_for(key, Variant::Original, extension);
        let stale = self.remove(key)?;
        let replaced = stale > 0;
        if replaced {
            warn!(hash = %key, stale, "Content key collision, replacing existing artifacts");
        }

        staged.file.persist(&path).map_err(|e| e.error)?;

        Ok(StoredOriginal {
            key,
            path,
            extension: extension.to_string(),
            replaced,
        })
    }

    /// Stage and commit in one step.
    pub fn put(&self, bytes: &[u8], extension: &str) -> Result<StoredOriginal, StoreError> {
        let staged = self.stage(bytes)?;
        self.commit(staged, extension)
    }

    /// Find the artifact for a key, probing the supported extensions.
    pub fn locate(&self, key: ContentKey, variant: Variant) -> Option<PathBuf> {
        if variant == Variant::Thumbnail {
            let path = self.path_for(key, variant, "jpg");
            return path.is_file().then_some(path);
        }

        SUPPORTED_EXTENSIONS
            .iter()
            .map(|ext| self.path_for(key, variant, ext))
            .find(|path| path.is_file())
    }

    pub fn get(&self, key: ContentKey, variant: Variant) -> Result<Option<Vec<u8>>, StoreError> {
        match self.locate(key, variant) {
            Some(path) => Ok(Some(std::fs::read(path)?)),
            None => Ok(None),
        }
    }

    /// Delete every artifact of a key. Returns how many files were removed.
    pub fn remove(&self, key: ContentKey) -> Result<usize, StoreError> {
        let mut removed = 0;
        for variant in [Variant::Original, Variant::Output, Variant::Thumbnail] {
            while let Some(path) = self.locate(key, variant) {
                std::fs::remove_file(&path)?;
                debug!("Removed {:?}", path);
                removed += 1;
            }
        }
        Ok(removed)
    }
}
