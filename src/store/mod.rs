//! Content-addressable artifact store for rendered page variants.
//!
//! Every component derives file names from the same key function, so the
//! trainer can recover the label for any stored artifact purely by
//! recomputing the key from a corpus row. The key derivation (hash
//! algorithm, truncation length, input string) is therefore part of the
//! on-disk protocol: changing it orphans previously stored artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Length of a key in hex characters (128 bits of the SHA-256 digest).
pub const KEY_HEX_LEN: usize = 32;

/// Stable identifier for all stored variants of one canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the artifact key for a canonical URL string.
///
/// Pure function of the exact URL string: lowercase hex of the SHA-256
/// digest, truncated to [`KEY_HEX_LEN`] characters. No normalization is
/// applied beyond what the corpus already did — the same string always
/// yields the same key, in every component.
pub fn key_for(url: &str) -> ArtifactKey {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(KEY_HEX_LEN);
    ArtifactKey(hex)
}

/// What kind of bytes an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Html,
    Screenshot,
}

impl ArtifactKind {
    fn ext(self) -> &'static str {
        match self {
            ArtifactKind::Html => "html",
            ArtifactKind::Screenshot => "png",
        }
    }
}

/// Which rendering of the URL an artifact is.
///
/// The suffix strings are part of the on-disk protocol shared with the
/// trainer's variant scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Unmodified render, no suffix.
    #[default]
    Original,
    /// Technique-1 screenshot of the unmodified render.
    Technique1,
    /// Adversarially perturbed HTML.
    Perturbed,
    /// Technique-2 render.
    Technique2,
}

impl Variant {
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Original => "",
            Variant::Technique1 => "_t1",
            Variant::Perturbed => "_pert",
            Variant::Technique2 => "_t2",
        }
    }

    /// HTML variants the trainer scans for each corpus URL.
    pub const HTML_SCAN: [Variant; 3] =
        [Variant::Original, Variant::Perturbed, Variant::Technique2];
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("artifact not found: {key}{suffix}.{ext}")]
    NotFound {
        key: ArtifactKey,
        suffix: &'static str,
        ext: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory-backed store with separate keyspaces for HTML and screenshots.
pub struct ArtifactStore {
    html_dir: PathBuf,
    screenshot_dir: PathBuf,
}

impl ArtifactStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let html_dir = root.join("html");
        let screenshot_dir = root.join("screenshots");
        fs::create_dir_all(&html_dir)?;
        fs::create_dir_all(&screenshot_dir)?;
        Ok(Self {
            html_dir,
            screenshot_dir,
        })
    }

    /// On-disk path of an artifact: `{hash}{suffix}.{ext}` under the
    /// directory for its kind.
    pub fn path_for(&self, key: &ArtifactKey, kind: ArtifactKind, variant: Variant) -> PathBuf {
        let dir = match kind {
            ArtifactKind::Html => &self.html_dir,
            ArtifactKind::Screenshot => &self.screenshot_dir,
        };
        dir.join(format!("{}{}.{}", key, variant.suffix(), kind.ext()))
    }

    /// Write an artifact, overwriting any previous bytes for the same
    /// `(key, variant, kind)`. Returns the derived key.
    pub fn put(
        &self,
        url: &str,
        kind: ArtifactKind,
        variant: Variant,
        bytes: &[u8],
    ) -> Result<ArtifactKey, StoreError> {
        let key = key_for(url);
        fs::write(self.path_for(&key, kind, variant), bytes)?;
        Ok(key)
    }

    /// Read an artifact's bytes, or a typed absence signal.
    pub fn get(
        &self,
        key: &ArtifactKey,
        kind: ArtifactKind,
        variant: Variant,
    ) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key, kind, variant);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                key: key.clone(),
                suffix: variant.suffix(),
                ext: kind.ext(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_is_deterministic() {
        let a = key_for("https://example.com/login");
        let b = key_for("https://example.com/login");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), KEY_HEX_LEN);
    }

    #[test]
    fn distinct_urls_get_distinct_keys() {
        assert_ne!(
            key_for("https://example.com/login"),
            key_for("https://example.com/login/")
        );
    }

    #[test]
    fn no_collisions_over_sampled_corpus() {
        let mut seen = HashSet::new();
        for i in 0..10_000 {
            let key = key_for(&format!("https://site-{i}.example/account/verify?id={i}"));
            assert!(seen.insert(key.as_str().to_string()), "collision at {i}");
        }
    }

    #[test]
    fn put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        let key = store
            .put(
                "https://example.com",
                ArtifactKind::Html,
                Variant::Original,
                b"<html></html>",
            )
            .unwrap();
        assert_eq!(key, key_for("https://example.com"));

        let bytes = store
            .get(&key, ArtifactKind::Html, Variant::Original)
            .unwrap();
        assert_eq!(bytes, b"<html></html>");
    }

    #[test]
    fn put_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        store
            .put("https://a.example", ArtifactKind::Html, Variant::Perturbed, b"one")
            .unwrap();
        let key = store
            .put("https://a.example", ArtifactKind::Html, Variant::Perturbed, b"two")
            .unwrap();

        let bytes = store
            .get(&key, ArtifactKind::Html, Variant::Perturbed)
            .unwrap();
        assert_eq!(bytes, b"two");
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        let key = key_for("https://never-stored.example");
        let err = store
            .get(&key, ArtifactKind::Html, Variant::Technique2)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn variants_do_not_clobber_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();

        let key = store
            .put("https://b.example", ArtifactKind::Html, Variant::Original, b"base")
            .unwrap();
        store
            .put("https://b.example", ArtifactKind::Html, Variant::Perturbed, b"pert")
            .unwrap();

        assert_eq!(
            store.get(&key, ArtifactKind::Html, Variant::Original).unwrap(),
            b"base"
        );
        assert_eq!(
            store.get(&key, ArtifactKind::Html, Variant::Perturbed).unwrap(),
            b"pert"
        );
    }
}
