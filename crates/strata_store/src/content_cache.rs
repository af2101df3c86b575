//! The compiled-content cache.
//!
//! Stores the snapshot content of previously compiled representations so
//! that a representation found not-outdated can restore its snapshots
//! instead of recompiling. One validated binary artifact per
//! representation, named by the digest of the representation identity.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_common::{ContentHash, Interner};
use strata_model::{Content, RepCollection, RepId};

use crate::error::StoreError;

/// Subdirectory of the state directory holding cache artifacts.
const CACHE_SUBDIR: &str = "content";

/// File extension of cache artifacts.
const CACHE_EXT: &str = "snap";

/// Magic bytes identifying a Strata cache artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"STRA";

/// Artifact format version. Increment on breaking changes to the header or
/// payload encoding.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every cache artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactHeader {
    /// Magic bytes: must be `b"STRA"`.
    magic: [u8; 4],

    /// Artifact format version.
    format_version: u32,

    /// Content hash of the payload (for integrity checks).
    checksum: ContentHash,
}

/// Snapshot content of previously compiled representations.
///
/// Entries for the current run's representations are prefetched into memory
/// up front; [`persist`](Self::persist) writes entries changed during the
/// run back to disk. A missing artifact is a cache miss; an unreadable or
/// tampered one is a [`StoreError::Corrupted`].
pub struct CompiledContentCache {
    cache_dir: PathBuf,
    entries: HashMap<String, BTreeMap<String, Content>>,
    dirty: BTreeSet<String>,
}

impl CompiledContentCache {
    /// Store name used in error messages.
    const STORE_NAME: &'static str = "compiled content";

    /// Opens a cache rooted under `state_dir`. Performs no I/O.
    pub fn open(state_dir: &Path) -> Self {
        Self {
            cache_dir: state_dir.join(CACHE_SUBDIR),
            entries: HashMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    fn artifact_path(&self, key: &str) -> PathBuf {
        let digest = ContentHash::from_bytes(key.as_bytes());
        self.cache_dir.join(format!("{digest}.{CACHE_EXT}"))
    }

    /// Reads the artifacts of all known representations into memory.
    ///
    /// Missing artifacts are skipped; invalid ones abort with the cache
    /// identified.
    pub fn prefetch(
        &mut self,
        reps: &RepCollection,
        interner: &Interner,
    ) -> Result<(), StoreError> {
        for rep in reps.iter() {
            let key = rep.id.describe(interner);
            if let Some(snapshots) = self.read_artifact(&key)? {
                self.entries.insert(key, snapshots);
            }
        }
        Ok(())
    }

    fn read_artifact(&self, key: &str) -> Result<Option<BTreeMap<String, Content>>, StoreError> {
        let path = self.artifact_path(key);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io {
                    store: Self::STORE_NAME,
                    path,
                    source: e,
                })
            }
        };

        let corrupted = |reason: String| StoreError::Corrupted {
            store: Self::STORE_NAME,
            path: path.clone(),
            reason,
        };

        if raw.len() < 4 {
            return Err(corrupted("truncated artifact".to_string()));
        }
        let header_len =
            u32::from_le_bytes(raw[..4].try_into().expect("slice is four bytes")) as usize;
        if raw.len() < 4 + header_len {
            return Err(corrupted("truncated artifact header".to_string()));
        }

        let header: ArtifactHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .map_err(|e| corrupted(format!("unreadable header: {e}")))?
                .0;

        if header.magic != ARTIFACT_MAGIC {
            return Err(corrupted("wrong magic bytes".to_string()));
        }
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(corrupted(format!(
                "format version {} (expected {})",
                header.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return Err(corrupted("payload checksum mismatch".to_string()));
        }

        let snapshots =
            bincode::serde::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| corrupted(format!("unreadable payload: {e}")))?
                .0;
        Ok(Some(snapshots))
    }

    /// Returns `true` if a snapshot is cached for the representation.
    pub fn contains(&self, rep: RepId, interner: &Interner, snapshot: &str) -> bool {
        self.entries
            .get(&rep.describe(interner))
            .is_some_and(|snapshots| snapshots.contains_key(snapshot))
    }

    /// The cached snapshots of a representation, if any.
    pub fn snapshots_for(
        &self,
        rep: RepId,
        interner: &Interner,
    ) -> Option<&BTreeMap<String, Content>> {
        self.entries.get(&rep.describe(interner))
    }

    /// Replaces the cached snapshots of a representation.
    pub fn set(&mut self, rep: RepId, interner: &Interner, snapshots: BTreeMap<String, Content>) {
        let key = rep.describe(interner);
        self.dirty.insert(key.clone());
        self.entries.insert(key, snapshots);
    }

    /// Writes entries changed since the last persist to disk.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        if self.dirty.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.cache_dir).map_err(|e| StoreError::Io {
            store: Self::STORE_NAME,
            path: self.cache_dir.clone(),
            source: e,
        })?;

        for key in std::mem::take(&mut self.dirty) {
            let snapshots = self
                .entries
                .get(&key)
                .expect("dirty keys always have entries");
            let payload = bincode::serde::encode_to_vec(snapshots, bincode::config::standard())
                .map_err(|e| StoreError::Serialization {
                    store: Self::STORE_NAME,
                    reason: e.to_string(),
                })?;
            let header = ArtifactHeader {
                magic: ARTIFACT_MAGIC,
                format_version: ARTIFACT_FORMAT_VERSION,
                checksum: ContentHash::from_bytes(&payload),
            };
            let header_bytes =
                bincode::serde::encode_to_vec(&header, bincode::config::standard()).map_err(
                    |e| StoreError::Serialization {
                        store: Self::STORE_NAME,
                        reason: e.to_string(),
                    },
                )?;

            // Layout: 4-byte header length (little-endian) + header + payload
            let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
            output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
            output.extend_from_slice(&header_bytes);
            output.extend_from_slice(&payload);

            let path = self.artifact_path(&key);
            std::fs::write(&path, &output).map_err(|e| StoreError::Io {
                store: Self::STORE_NAME,
                path,
                source: e,
            })?;
        }
        Ok(())
    }
}
