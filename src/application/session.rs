//! Editing session: one open document with its history and UI state
//!
//! Every structural command runs to completion against the live tree and is then recorded in
//! the history. Undo and redo swap the live tree for a copy of a historical snapshot.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::application::confirm::{self, ConfirmationResponder, PendingConfirmation};
use crate::application::history::History;
use crate::application::ui_state::UiState;
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::DEFAULT_CONFIRM_TIMEOUT_SECS;
use crate::domain::{DomainResult, EaogTree, Framework, NodeId, Position};
use crate::infrastructure::{new_document_id, DocumentStore, InfraError};

/// Source node of a drag-and-drop gesture, addressed by path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragPayload {
    pub name: String,
    pub path: String,
}

fn store_err(context: String) -> impl FnOnce(InfraError) -> ApplicationError {
    move |e| ApplicationError::Store {
        context,
        source: Box::new(e),
    }
}

pub struct EditingSession {
    store: Arc<dyn DocumentStore>,
    file_id: String,
    tree: EaogTree,
    history: History,
    ui: UiState,
    confirm_timeout: Duration,
}

impl EditingSession {
    /// Load and validate the document stored under `file_id`.
    #[instrument(level = "debug", skip(store))]
    pub fn open(
        store: Arc<dyn DocumentStore>,
        file_id: &str,
        accept_brief: bool,
    ) -> ApplicationResult<Self> {
        let blob = store
            .load(file_id)
            .map_err(store_err(format!("load {file_id}")))?;
        let value: Value =
            serde_json::from_str(&blob).map_err(|e| ApplicationError::OperationFailed {
                context: format!("parse document {file_id}"),
                source: Box::new(e),
            })?;
        let tree = EaogTree::import(&value, accept_brief)?;
        info!("Opened document {} ({} nodes)", file_id, tree.len());
        Ok(Self::with_tree(store, file_id.to_string(), tree))
    }

    /// Start a new, not yet saved document with a fresh id.
    pub fn new_document(store: Arc<dyn DocumentStore>, tree: EaogTree) -> Self {
        let file_id = new_document_id();
        info!("New document {}", file_id);
        Self::with_tree(store, file_id, tree)
    }

    /// Start a session on `tree` under a caller-chosen id.
    pub fn with_tree(store: Arc<dyn DocumentStore>, file_id: String, tree: EaogTree) -> Self {
        let history = History::new(&tree);
        Self {
            store,
            file_id,
            tree,
            history,
            ui: UiState::new(),
            confirm_timeout: Duration::from_secs(DEFAULT_CONFIRM_TIMEOUT_SECS),
        }
    }

    /// How long [`EditingSession::request_confirmation`] waits before declining.
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    pub fn confirm_timeout(&self) -> Duration {
        self.confirm_timeout
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn tree(&self) -> &EaogTree {
        &self.tree
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiState {
        &mut self.ui
    }

    /// Resolve a path from the document root.
    pub fn resolve(&self, path: &str) -> ApplicationResult<NodeId> {
        self.tree
            .node_by_path(path)
            .ok_or_else(|| ApplicationError::PathNotFound(path.to_string()))
    }

    /// Run one structural command and record the result.
    ///
    /// A failed command leaves the document as it was before the command. Nodes a successful
    /// command leaves detached are freed afterwards, so ids of detached nodes do not outlive it.
    pub fn apply<T, F>(&mut self, command: F) -> ApplicationResult<T>
    where
        F: FnOnce(&mut EaogTree) -> DomainResult<T>,
    {
        match command(&mut self.tree) {
            Ok(result) => {
                self.tree.prune_detached();
                self.ui.retain_existing(&self.tree);
                if self.history.record(&self.tree) {
                    debug!("apply: recorded entry {}", self.history.cursor());
                }
                Ok(result)
            }
            Err(e) => {
                if let Some(snapshot) = self.history.current() {
                    if snapshot != self.tree {
                        self.tree = snapshot;
                        self.ui.clear();
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Returns whether the tree changed.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(tree) => {
                self.tree = tree;
                self.ui.clear();
                true
            }
            None => false,
        }
    }

    /// Returns whether the tree changed.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(tree) => {
                self.tree = tree;
                self.ui.clear();
                true
            }
            None => false,
        }
    }

    /// Persist the canonical document.
    pub fn save(&self) -> ApplicationResult<()> {
        let blob = serde_json::to_string_pretty(&self.tree.to_value()).map_err(|e| {
            ApplicationError::OperationFailed {
                context: format!("serialize document {}", self.file_id),
                source: Box::new(e),
            }
        })?;
        self.store
            .save(&self.file_id, &blob)
            .map_err(store_err(format!("save {}", self.file_id)))
    }

    /// Move the dragged node relative to `target`.
    pub fn drop_node(
        &mut self,
        payload: &DragPayload,
        target: NodeId,
        position: Position,
    ) -> ApplicationResult<()> {
        let source = self.resolve(&payload.path)?;
        let matches = self
            .tree
            .data(source)
            .is_some_and(|d| d.name == payload.name);
        if !matches {
            return Err(ApplicationError::PathNotFound(payload.path.clone()));
        }
        self.apply(|tree| tree.move_to(source, target, position))?;
        self.ui.mark_newly_modified(source);
        Ok(())
    }

    /// Decorate the node at `path` with `framework`; returns the framework root.
    pub fn apply_framework(&mut self, framework: &Framework, path: &str) -> ApplicationResult<NodeId> {
        let target = self.resolve(path)?;
        let root = self.apply(|tree| framework.apply_to_eaog(tree, target))?;
        self.ui.mark_newly_modified(root);
        info!("Applied framework '{}' at {}", framework.name(), path);
        Ok(root)
    }

    /// Ask the user to confirm something; unanswered requests are declined after the session's
    /// confirmation timeout.
    pub fn request_confirmation(&self) -> (PendingConfirmation, ConfirmationResponder) {
        confirm::request(self.confirm_timeout)
    }
}
