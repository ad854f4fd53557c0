//! eaog-editor: editable EAOG process-graph trees
//!
//! Layers:
//! - `domain`: node model, validation, structural editing, framework mounting
//! - `application`: editing session, history, framework catalog
//! - `infrastructure`: filesystem, document store, service container
//! - `cli`: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
