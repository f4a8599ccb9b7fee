//! Content-addressed store of verified artifacts.
//!
//! Layout: `<root>/<fingerprint>/program.<ext>` plus `manifest.json`.
//! Entries are staged in a hidden sibling directory and renamed into place,
//! so readers never observe a half-written artifact and two concurrent
//! promotions of the same fingerprint cannot interleave.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use rulesmith_model::{ArtifactManifest, Fingerprint, VerifiedArtifact};

use crate::error::StoreError;

const MANIFEST_FILE: &str = "manifest.json";

type Result<T> = std::result::Result<T, StoreError>;

/// Result of [`ArtifactStore::promote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Promotion {
    /// No artifact existed; the new one was written.
    Created,
    /// An existing artifact was replaced on request.
    Replaced,
    /// An artifact already existed and was kept.
    AlreadyPresent(Box<VerifiedArtifact>),
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

fn io(operation: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Io {
        operation,
        path,
        source,
    }
}

impl ArtifactStore {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(io("create", root))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn entry_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root.join(fingerprint.as_str())
    }

    /// Load the artifact stored under `fingerprint`, if any.
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Result<Option<VerifiedArtifact>> {
        let dir = self.entry_dir(fingerprint);
        if !dir.is_dir() {
            return Ok(None);
        }
        let artifact = match read_entry(&dir) {
            Err(StoreError::Manifest { path, source }) => {
                return Err(StoreError::Corrupt {
                    path,
                    reason: source.to_string(),
                });
            }
            other => other?,
        };
        if !artifact.is_intact() {
            return Err(StoreError::Corrupt {
                path: dir.join(artifact.manifest.language.file_name()),
                reason: "program does not match its manifest digest".to_string(),
            });
        }
        debug!(fingerprint = %fingerprint.short(), "artifact found in store");
        Ok(Some(artifact))
    }

    /// Store `artifact` under its fingerprint.
    ///
    /// Write-once: an existing entry is kept and returned unless `replace`
    /// is set, which callers only do after a fresh successful validation.
    pub fn promote(&self, artifact: &VerifiedArtifact, replace: bool) -> Result<Promotion> {
        let target = self.entry_dir(artifact.fingerprint());
        if target.is_dir() && !replace {
            return self.keep_existing(&target);
        }

        let staging = self.sibling(artifact.fingerprint(), "staging");
        fs::create_dir_all(&staging).map_err(io("create", &staging))?;
        let staged = write_entry(&staging, artifact);
        if let Err(error) = staged {
            let _ = fs::remove_dir_all(&staging);
            return Err(error);
        }

        let mut replaced = false;
        if target.is_dir() {
            let retired = self.sibling(artifact.fingerprint(), "retired");
            fs::rename(&target, &retired).map_err(io("retire", &target))?;
            let _ = fs::remove_dir_all(&retired);
            replaced = true;
        }

        if let Err(source) = fs::rename(&staging, &target) {
            let _ = fs::remove_dir_all(&staging);
            if target.is_dir() {
                // Another promotion of the same fingerprint won the race.
                return self.keep_existing(&target);
            }
            return Err(StoreError::Io {
                operation: "rename",
                path: target,
                source,
            });
        }

        info!(
            fingerprint = %artifact.fingerprint().short(),
            path = %target.display(),
            replaced,
            "promoted verified artifact"
        );
        Ok(if replaced {
            Promotion::Replaced
        } else {
            Promotion::Created
        })
    }

    /// Manifests of every stored artifact, newest first.
    pub fn list(&self) -> Result<Vec<ArtifactManifest>> {
        let mut manifests = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(io("list", &self.root))? {
            let entry = entry.map_err(io("list", &self.root))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if Fingerprint::parse(name).is_none() || !entry.path().is_dir() {
                continue;
            }
            match read_manifest(&entry.path()) {
                Ok(manifest) => manifests.push(manifest),
                Err(error) => warn!(%error, "skipping unreadable store entry"),
            }
        }
        manifests.sort_by(|a, b| b.promoted_at.cmp(&a.promoted_at));
        Ok(manifests)
    }

    fn keep_existing(&self, target: &Path) -> Result<Promotion> {
        let existing = read_entry(target)?;
        debug!(path = %target.display(), "artifact already present; keeping it");
        Ok(Promotion::AlreadyPresent(Box::new(existing)))
    }

    fn sibling(&self, fingerprint: &Fingerprint, kind: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        self.root.join(format!(
            ".{kind}-{}-{}-{nanos}",
            fingerprint.short(),
            std::process::id()
        ))
    }
}

/// Reads the manifest of the entry in `dir`, which must name that entry.
fn read_manifest(dir: &Path) -> Result<ArtifactManifest> {
    let path = dir.join(MANIFEST_FILE);
    let text = fs::read_to_string(&path).map_err(io("read", &path))?;
    let manifest: ArtifactManifest =
        serde_json::from_str(&text).map_err(|source| StoreError::Manifest {
            path: path.clone(),
            source,
        })?;
    let entry = dir.file_name().and_then(|name| name.to_str());
    if entry != Some(manifest.fingerprint.as_str()) {
        return Err(StoreError::Corrupt {
            path,
            reason: format!("manifest names fingerprint {}", manifest.fingerprint),
        });
    }
    Ok(manifest)
}

fn read_entry(dir: &Path) -> Result<VerifiedArtifact> {
    let manifest = read_manifest(dir)?;
    let program = dir.join(manifest.language.file_name());
    let source_text = fs::read_to_string(&program).map_err(io("read", &program))?;
    Ok(VerifiedArtifact {
        manifest,
        source_text,
    })
}

fn write_entry(dir: &Path, artifact: &VerifiedArtifact) -> Result<()> {
    let program = dir.join(artifact.manifest.language.file_name());
    fs::write(&program, &artifact.source_text).map_err(io("write", &program))?;
    let manifest_path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&artifact.manifest).map_err(|source| {
        StoreError::Manifest {
            path: manifest_path.clone(),
            source,
        }
    })?;
    fs::write(&manifest_path, json).map_err(io("write", &manifest_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::Utc;
    use rulesmith_model::{ProgramLanguage, sha256_hex};
    use tempfile::TempDir;

    fn artifact(source: &str) -> VerifiedArtifact {
        let fingerprint = Fingerprint::parse(&sha256_hex(b"rules+schema")).unwrap();
        VerifiedArtifact {
            manifest: ArtifactManifest {
                fingerprint,
                language: ProgramLanguage::LabelPlan,
                attempt: 1,
                source_sha256: sha256_hex(source.as_bytes()),
                promoted_at: Utc::now(),
                rule_count: 2,
                observed_row_count: 10,
                label_distribution: BTreeMap::from([("Normal".to_string(), 10)]),
            },
            source_text: source.to_string(),
        }
    }

    #[test]
    fn promote_then_lookup() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let first = artifact("{\"v\":1}");

        assert_eq!(store.lookup(first.fingerprint()).unwrap(), None);
        assert_eq!(store.promote(&first, false).unwrap(), Promotion::Created);
        assert_eq!(store.lookup(first.fingerprint()).unwrap(), Some(first.clone()));
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn promotion_is_write_once_unless_replaced() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let first = artifact("{\"v\":1}");
        let second = artifact("{\"v\":2}");

        store.promote(&first, false).unwrap();
        match store.promote(&second, false).unwrap() {
            Promotion::AlreadyPresent(existing) => assert_eq!(*existing, first),
            other => panic!("expected existing artifact, got {other:?}"),
        }
        assert_eq!(store.lookup(first.fingerprint()).unwrap(), Some(first.clone()));

        assert_eq!(store.promote(&second, true).unwrap(), Promotion::Replaced);
        assert_eq!(store.lookup(first.fingerprint()).unwrap(), Some(second));
        // No staging or retired directories are left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn tampered_program_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let original = artifact("{\"v\":1}");
        store.promote(&original, false).unwrap();

        let program = store
            .entry_dir(original.fingerprint())
            .join(ProgramLanguage::LabelPlan.file_name());
        fs::write(&program, "{\"v\":666}").unwrap();

        assert!(matches!(
            store.lookup(original.fingerprint()),
            Err(StoreError::Corrupt { .. })
        ));
    }

    fn rewrite_manifest_fingerprint(
        store: &ArtifactStore,
        artifact: &VerifiedArtifact,
        value: &str,
    ) {
        let path = store.entry_dir(artifact.fingerprint()).join(MANIFEST_FILE);
        let mut manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        manifest["fingerprint"] = serde_json::Value::String(value.to_string());
        fs::write(&path, manifest.to_string()).unwrap();
    }

    #[test]
    fn tampered_manifest_is_skipped_and_reported() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        let stored = artifact("{\"v\":1}");
        store.promote(&stored, false).unwrap();

        rewrite_manifest_fingerprint(&store, &stored, "abc");
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(
            store.lookup(stored.fingerprint()),
            Err(StoreError::Corrupt { .. })
        ));

        let other = sha256_hex(b"some other key");
        rewrite_manifest_fingerprint(&store, &stored, &other);
        assert!(store.list().unwrap().is_empty());
        match store.lookup(stored.fingerprint()) {
            Err(StoreError::Corrupt { reason, .. }) => assert!(reason.contains(&other)),
            unexpected => panic!("expected a corrupt entry, got {unexpected:?}"),
        }

        assert_eq!(store.promote(&stored, true).unwrap(), Promotion::Replaced);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn list_ignores_foreign_entries() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::open(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("not-a-fingerprint")).unwrap();
        fs::write(dir.path().join("README"), "notes").unwrap();
        store.promote(&artifact("{}"), false).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
