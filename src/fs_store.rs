//! Filesystem [`TenantStore`]: one directory per tenant under `index.dir`.
//!
//! ```text
//! <dir>/<tenant>/chunks.json         { "chunks": [...], "metas": [...] }
//! <dir>/<tenant>/index.dense         binary, see DenseIndex::to_bytes
//! <dir>/<tenant>/index.sparse.json   fitted vocabulary, idf, sparse rows
//! ```
//!
//! Every write goes to a temporary file in the tenant directory, is
//! synced, and is then renamed over the destination, so readers observe
//! either the old file or the new one. File I/O runs on the blocking
//! pool. A commit encodes both files up front and then performs the
//! writes, the rollback and the stale-artifact removal in one blocking
//! task, which runs to completion even if the caller goes away.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use scholask_core::backend::{BackendKind, DenseIndex, IndexArtifact};
use scholask_core::models::{ChunkMeta, TenantCorpus};
use scholask_core::sparse::SparseIndex;
use scholask_core::store::{LoadOutcome, TenantStore};
use scholask_core::tenant::validate_tenant;
use scholask_core::RagError;

pub const CORPUS_FILE: &str = "chunks.json";
pub const TEMP_PREFIX: &str = ".scholask-";

pub fn artifact_file(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Dense => "index.dense",
        BackendKind::Sparse => "index.sparse.json",
    }
}

#[derive(Serialize, Deserialize)]
struct CorpusFile {
    chunks: Vec<String>,
    #[serde(default)]
    metas: Vec<ChunkMeta>,
}

pub struct FsTenantStore {
    root: PathBuf,
    preview_chars: usize,
}

impl FsTenantStore {
    pub fn new(root: impl Into<PathBuf>, preview_chars: usize) -> Self {
        Self {
            root: root.into(),
            preview_chars,
        }
    }

    /// Validated directory for `tenant`. Does not create it.
    pub fn tenant_dir(&self, tenant: &str) -> Result<PathBuf, RagError> {
        validate_tenant(tenant)?;
        Ok(self.root.join(tenant))
    }

    fn encode_corpus(&self, path: &Path, corpus: &TenantCorpus) -> Result<Vec<u8>, RagError> {
        let file = CorpusFile {
            chunks: corpus.texts(),
            metas: corpus.metas(self.preview_chars),
        };
        serde_json::to_vec_pretty(&file).map_err(|e| RagError::persistence(path, e))
    }
}

fn encode_artifact(path: &Path, artifact: &IndexArtifact) -> Result<Vec<u8>, RagError> {
    match artifact {
        IndexArtifact::Dense(index) => Ok(index.to_bytes()),
        IndexArtifact::Sparse(index) => {
            serde_json::to_vec(index).map_err(|e| RagError::persistence(path, e))
        }
    }
}

/// Run filesystem work on the blocking pool.
async fn blocking<T, F>(path: &Path, f: F) -> Result<T, RagError>
where
    F: FnOnce() -> Result<T, RagError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RagError::persistence(path, format!("blocking task failed: {}", e)))?
}

fn create_dir(dir: &Path) -> Result<(), RagError> {
    fs::create_dir_all(dir).map_err(|e| RagError::persistence(dir, e))
}

/// Read a file, mapping "does not exist" to `None`.
fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, RagError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RagError::persistence(path, e)),
    }
}

/// Remove a file; one that does not exist is fine.
fn remove_optional(path: &Path) -> Result<(), RagError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RagError::persistence(path, e)),
    }
}

/// Write `bytes` to `path` via a synced temp file in `dir` and a rename.
fn atomic_write(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), RagError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| RagError::persistence(path, e))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| RagError::persistence(path, e))?;
    tmp.persist(path)
        .map_err(|e| RagError::persistence(path, e.error))?;
    debug!(path = %path.display(), bytes = bytes.len(), "published file");
    Ok(())
}

#[async_trait]
impl TenantStore for FsTenantStore {
    async fn load_corpus(&self, tenant: &str) -> Result<LoadOutcome<TenantCorpus>, RagError> {
        let path = self.tenant_dir(tenant)?.join(CORPUS_FILE);
        let read_path = path.clone();
        let Some(bytes) = blocking(&path, move || read_optional(&read_path)).await? else {
            return Ok(LoadOutcome::NotFound);
        };
        let file: CorpusFile = match serde_json::from_slice(&bytes) {
            Ok(f) => f,
            Err(e) => {
                warn!(tenant, path = %path.display(), error = %e, "unreadable corpus file");
                return Ok(LoadOutcome::Corrupt(e.to_string()));
            }
        };
        let (corpus, _repaired) = TenantCorpus::from_parts(tenant, file.chunks, file.metas);
        Ok(LoadOutcome::Found(corpus))
    }

    async fn load_artifact(
        &self,
        tenant: &str,
        kind: BackendKind,
    ) -> Result<LoadOutcome<IndexArtifact>, RagError> {
        let path = self.tenant_dir(tenant)?.join(artifact_file(kind));
        let read_path = path.clone();
        let Some(bytes) = blocking(&path, move || read_optional(&read_path)).await? else {
            return Ok(LoadOutcome::NotFound);
        };
        let decoded = match kind {
            BackendKind::Dense => DenseIndex::from_bytes(&bytes)
                .map(IndexArtifact::Dense)
                .map_err(|e| e.to_string()),
            BackendKind::Sparse => serde_json::from_slice::<SparseIndex>(&bytes)
                .map(IndexArtifact::Sparse)
                .map_err(|e| e.to_string()),
        };
        Ok(match decoded {
            Ok(artifact) => LoadOutcome::Found(artifact),
            Err(reason) => {
                warn!(tenant, path = %path.display(), %reason, "unreadable index artifact");
                LoadOutcome::Corrupt(reason)
            }
        })
    }

    async fn write_artifact(
        &self,
        tenant: &str,
        artifact: &IndexArtifact,
    ) -> Result<(), RagError> {
        let dir = self.tenant_dir(tenant)?;
        let path = dir.join(artifact_file(artifact.kind()));
        let bytes = encode_artifact(&path, artifact)?;
        let task_dir = dir.clone();
        blocking(&dir, move || {
            create_dir(&task_dir)?;
            atomic_write(&task_dir, &path, &bytes)
        })
        .await
    }

    async fn write_corpus(&self, corpus: &TenantCorpus) -> Result<(), RagError> {
        let dir = self.tenant_dir(&corpus.tenant)?;
        let path = dir.join(CORPUS_FILE);
        let bytes = self.encode_corpus(&path, corpus)?;
        let task_dir = dir.clone();
        blocking(&dir, move || {
            create_dir(&task_dir)?;
            atomic_write(&task_dir, &path, &bytes)
        })
        .await
    }

    async fn remove_artifact(&self, tenant: &str, kind: BackendKind) -> Result<(), RagError> {
        let path = self.tenant_dir(tenant)?.join(artifact_file(kind));
        let task_path = path.clone();
        blocking(&path, move || remove_optional(&task_path)).await
    }

    async fn commit(
        &self,
        corpus: &TenantCorpus,
        artifact: &IndexArtifact,
    ) -> Result<(), RagError> {
        let tenant = corpus.tenant.clone();
        let dir = self.tenant_dir(&tenant)?;
        let artifact_path = dir.join(artifact_file(artifact.kind()));
        let corpus_path = dir.join(CORPUS_FILE);
        let stale_path = dir.join(artifact_file(artifact.kind().other()));
        let artifact_bytes = encode_artifact(&artifact_path, artifact)?;
        let corpus_bytes = self.encode_corpus(&corpus_path, corpus)?;

        let task_dir = dir.clone();
        blocking(&dir, move || {
            create_dir(&task_dir)?;
            atomic_write(&task_dir, &artifact_path, &artifact_bytes)?;

            if let Err(e) = atomic_write(&task_dir, &corpus_path, &corpus_bytes) {
                error!(
                    tenant = tenant.as_str(),
                    error = %e,
                    "corpus write failed, rolling back index artifact"
                );
                if let Err(rollback) = remove_optional(&artifact_path) {
                    error!(tenant = tenant.as_str(), error = %rollback, "artifact rollback failed");
                }
                return Err(e);
            }

            if let Err(e) = remove_optional(&stale_path) {
                warn!(
                    tenant = tenant.as_str(),
                    path = %stale_path.display(),
                    error = %e,
                    "could not remove stale artifact"
                );
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus() -> TenantCorpus {
        let mut corpus = TenantCorpus::new("t");
        corpus.append(["Paragraph one.", "Paragraph two."], Some("https://x.edu"));
        corpus
    }

    #[tokio::test]
    async fn test_missing_tenant_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = FsTenantStore::new(tmp.path(), 200);
        assert_eq!(store.load_corpus("t").await.unwrap(), LoadOutcome::NotFound);
        assert_eq!(
            store.load_artifact("t", BackendKind::Dense).await.unwrap(),
            LoadOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_corpus_roundtrip_and_file_shape() {
        let tmp = TempDir::new().unwrap();
        let store = FsTenantStore::new(tmp.path(), 9);
        store.write_corpus(&corpus()).await.unwrap();

        let loaded = store.load_corpus("t").await.unwrap().found().unwrap();
        assert_eq!(loaded, corpus());

        let raw = fs::read(tmp.path().join("t").join(CORPUS_FILE)).unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(raw["chunks"][1], "Paragraph two.");
        assert_eq!(raw["metas"][1]["id"], 1);
        assert_eq!(raw["metas"][1]["preview"], "Paragraph");
        assert_eq!(raw["metas"][1]["source_url"], "https://x.edu");
    }

    #[tokio::test]
    async fn test_dense_and_sparse_artifacts_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FsTenantStore::new(tmp.path(), 200);

        let dense = IndexArtifact::Dense(DenseIndex::from_vectors(2, vec![vec![3.0, 4.0]]));
        let sparse = IndexArtifact::Sparse(SparseIndex::fit(&corpus().texts(), 64));
        store.write_artifact("t", &dense).await.unwrap();
        store.write_artifact("t", &sparse).await.unwrap();

        assert_eq!(
            store.load_artifact("t", BackendKind::Dense).await.unwrap(),
            LoadOutcome::Found(dense)
        );
        assert_eq!(
            store.load_artifact("t", BackendKind::Sparse).await.unwrap(),
            LoadOutcome::Found(sparse)
        );

        store.remove_artifact("t", BackendKind::Dense).await.unwrap();
        store.remove_artifact("t", BackendKind::Dense).await.unwrap();
        assert!(!tmp.path().join("t").join("index.dense").exists());
    }

    #[tokio::test]
    async fn test_commit_publishes_and_drops_stale_kind() {
        let tmp = TempDir::new().unwrap();
        let store = FsTenantStore::new(tmp.path(), 200);
        let dense = IndexArtifact::Dense(DenseIndex::from_vectors(1, vec![vec![1.0], vec![2.0]]));
        store.commit(&corpus(), &dense).await.unwrap();
        assert!(tmp.path().join("t").join("index.dense").exists());

        let sparse = IndexArtifact::Sparse(SparseIndex::fit(&corpus().texts(), 64));
        store.commit(&corpus(), &sparse).await.unwrap();
        assert!(!tmp.path().join("t").join("index.dense").exists());
        assert_eq!(
            store.load_artifact("t", BackendKind::Sparse).await.unwrap(),
            LoadOutcome::Found(sparse)
        );
        assert_eq!(store.load_corpus("t").await.unwrap(), LoadOutcome::Found(corpus()));
    }

    #[tokio::test]
    async fn test_commit_rolls_back_artifact_when_corpus_write_fails() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("t");
        // A non-empty directory where the corpus file goes cannot be renamed over.
        fs::create_dir_all(dir.join(CORPUS_FILE).join("blocker")).unwrap();

        let store = FsTenantStore::new(tmp.path(), 200);
        let sparse = IndexArtifact::Sparse(SparseIndex::fit(&corpus().texts(), 64));
        let err = store.commit(&corpus(), &sparse).await.unwrap_err();
        assert!(matches!(err, RagError::Persistence { .. }), "{:?}", err);
        assert!(!dir.join("index.sparse.json").exists());
        assert!(dir.join(CORPUS_FILE).join("blocker").exists());
    }

    #[tokio::test]
    async fn test_garbage_files_are_corrupt() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("t");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CORPUS_FILE), "{not json").unwrap();
        fs::write(dir.join("index.dense"), b"XXXX").unwrap();

        let store = FsTenantStore::new(tmp.path(), 200);
        assert!(matches!(store.load_corpus("t").await.unwrap(), LoadOutcome::Corrupt(_)));
        assert!(matches!(
            store.load_artifact("t", BackendKind::Dense).await.unwrap(),
            LoadOutcome::Corrupt(_)
        ));
    }

    #[tokio::test]
    async fn test_rejects_invalid_tenant_before_io() {
        let tmp = TempDir::new().unwrap();
        let store = FsTenantStore::new(tmp.path(), 200);
        let err = store.load_corpus("../escape").await.unwrap_err();
        assert!(matches!(err, RagError::InvalidTenant(_)));
    }
}
