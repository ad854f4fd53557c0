//! Framework catalog
//!
//! Framework definitions are loaded once at startup. Each definition is validated as a
//! framework before it becomes available for mounting; invalid definitions are reported and
//! skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{normalize_brief, Framework};
use crate::infrastructure::traits::FileSystem;

/// A definition that failed to load.
#[derive(Debug, Clone)]
pub struct RejectedFramework {
    pub source: String,
    pub reason: String,
}

/// Validated frameworks available for mounting.
#[derive(Debug, Default, Clone)]
pub struct FrameworkCatalog {
    frameworks: Vec<Framework>,
    rejected: Vec<RejectedFramework>,
}

impl FrameworkCatalog {
    /// Build a catalog from in-memory definitions, e.g. a bundled list.
    pub fn from_definitions(definitions: &[Value], accept_brief: bool) -> Self {
        let mut catalog = Self::default();
        for (i, definition) in definitions.iter().enumerate() {
            catalog.add(format!("definition #{i}"), definition.clone(), accept_brief);
        }
        catalog
    }

    /// Load every `*.json` file directly inside `dir`. A missing directory yields an empty
    /// catalog.
    pub fn load_dir(
        fs: &Arc<dyn FileSystem>,
        dir: &Path,
        accept_brief: bool,
    ) -> ApplicationResult<Self> {
        debug!("load_dir: dir={}", dir.display());
        let mut catalog = Self::default();
        if !fs.is_dir(dir) {
            debug!("load_dir: no framework directory");
            return Ok(catalog);
        }

        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let content = fs
                .read_to_string(&path)
                .with_path_context("read framework", &path)?;
            match serde_json::from_str::<Value>(&content) {
                Ok(value) => catalog.add(path.display().to_string(), value, accept_brief),
                Err(e) => catalog.reject(path.display().to_string(), e.to_string()),
            }
        }

        debug!(
            "load_dir: {} frameworks, {} rejected",
            catalog.frameworks.len(),
            catalog.rejected.len()
        );
        Ok(catalog)
    }

    fn add(&mut self, source: String, value: Value, accept_brief: bool) {
        let value = if accept_brief {
            normalize_brief(value)
        } else {
            value
        };
        match Framework::from_value(&value) {
            Ok(framework) if self.get(framework.name()).is_some() => {
                let reason = format!("duplicate framework name '{}'", framework.name());
                self.reject(source, reason);
            }
            Ok(framework) => self.frameworks.push(framework),
            Err(e) => self.reject(source, e.to_string()),
        }
    }

    fn reject(&mut self, source: String, reason: String) {
        warn!("Skipping framework {}: {}", source, reason);
        self.rejected.push(RejectedFramework { source, reason });
    }

    pub fn frameworks(&self) -> &[Framework] {
        &self.frameworks
    }

    pub fn rejected(&self) -> &[RejectedFramework] {
        &self.rejected
    }

    pub fn get(&self, name: &str) -> Option<&Framework> {
        self.frameworks.iter().find(|f| f.name() == name)
    }

    pub fn require(&self, name: &str) -> ApplicationResult<&Framework> {
        self.get(name)
            .ok_or_else(|| ApplicationError::FrameworkNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.frameworks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frameworks.is_empty()
    }
}
