//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::FrameworkCatalog;
use crate::application::{ApplicationResult, EditingSession};
use crate::config::Settings;
use crate::domain::EaogTree;
use crate::infrastructure::store::{DocumentStore, FsDocumentStore};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Document storage for the configured project
    pub store: Arc<dyn DocumentStore>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = Arc::new(FsDocumentStore::new(
            fs.clone(),
            &settings.base_dir,
            &settings.project,
        ));
        Self::with_deps(settings, fs, store)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self {
            settings,
            fs,
            store,
        }
    }

    /// Load the framework catalog from the configured directory.
    pub fn framework_catalog(&self) -> ApplicationResult<FrameworkCatalog> {
        FrameworkCatalog::load_dir(
            &self.fs,
            &self.settings.frameworks_dir(),
            self.settings.accept_brief,
        )
    }

    /// Open a stored document.
    pub fn open_session(&self, file_id: &str) -> ApplicationResult<EditingSession> {
        let session =
            EditingSession::open(self.store.clone(), file_id, self.settings.accept_brief)?;
        Ok(session.with_confirm_timeout(self.settings.confirm_timeout()))
    }

    /// Start a session on a new document.
    pub fn new_session(&self, tree: EaogTree) -> EditingSession {
        EditingSession::new_document(self.store.clone(), tree)
            .with_confirm_timeout(self.settings.confirm_timeout())
    }
}
