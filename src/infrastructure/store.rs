//! Persisted document boundary
//!
//! The editor only needs `load(id) -> blob` and `save(id, blob)` from its storage collaborator.
//! Documents are opaque JSON strings keyed by a file id within a project.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

/// Storage collaborator for tree documents.
pub trait DocumentStore: Send + Sync {
    /// Load the JSON blob stored under `id`.
    fn load(&self, id: &str) -> InfraResult<String>;

    /// Store `blob` under `id`, replacing any previous content.
    fn save(&self, id: &str, blob: &str) -> InfraResult<()>;

    /// Whether a document exists under `id`.
    fn exists(&self, id: &str) -> bool;
}

/// Fresh document id.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn check_id(id: &str) -> InfraResult<()> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\'])
        || id.chars().any(char::is_control);
    if invalid {
        return Err(InfraError::InvalidDocumentId(id.to_string()));
    }
    Ok(())
}

/// Documents stored as `<base_dir>/<project>/<id>.json`.
pub struct FsDocumentStore {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(fs: Arc<dyn FileSystem>, base_dir: &Path, project: &str) -> Self {
        Self {
            fs,
            dir: base_dir.join(project),
        }
    }

    /// Directory holding this project's documents.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> InfraResult<PathBuf> {
        check_id(id)?;
        Ok(self.dir.join(format!("{id}.json")))
    }
}

impl DocumentStore for FsDocumentStore {
    fn load(&self, id: &str) -> InfraResult<String> {
        let path = self.path_for(id)?;
        if !self.fs.is_file(&path) {
            return Err(InfraError::DocumentNotFound(id.to_string()));
        }
        debug!("load: {}", path.display());
        self.fs
            .read_to_string(&path)
            .map_err(|e| InfraError::io(format!("read document {}", path.display()), e))
    }

    fn save(&self, id: &str, blob: &str) -> InfraResult<()> {
        let path = self.path_for(id)?;
        self.fs
            .ensure_parent(&path)
            .map_err(|e| InfraError::io(format!("create {}", self.dir.display()), e))?;

        // write-then-rename so a failed write never truncates the previous version
        let tmp = path.with_extension("json.tmp");
        self.fs
            .write(&tmp, blob)
            .map_err(|e| InfraError::io(format!("write document {}", tmp.display()), e))?;
        if let Err(e) = self.fs.rename(&tmp, &path) {
            if self.fs.remove_file(&tmp).is_err() {
                warn!("Could not remove {}", tmp.display());
            }
            return Err(InfraError::io(format!("replace document {}", path.display()), e));
        }

        info!("Saved document {} to {}", id, path.display());
        Ok(())
    }

    fn exists(&self, id: &str) -> bool {
        self.path_for(id)
            .map(|path| self.fs.is_file(&path))
            .unwrap_or(false)
    }
}

/// In-memory store for tests and scratch sessions.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<HashMap<String, String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, id: &str) -> InfraResult<String> {
        self.documents()
            .get(id)
            .cloned()
            .ok_or_else(|| InfraError::DocumentNotFound(id.to_string()))
    }

    fn save(&self, id: &str, blob: &str) -> InfraResult<()> {
        check_id(id)?;
        self.documents().insert(id.to_string(), blob.to_string());
        Ok(())
    }

    fn exists(&self, id: &str) -> bool {
        self.documents().contains_key(id)
    }
}
