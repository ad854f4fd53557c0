//! Application layer: editing session and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod confirm;
pub mod error;
pub mod error_ext;
pub mod history;
pub mod services;
pub mod session;
pub mod ui_state;

pub use confirm::{ConfirmationResponder, Decision, PendingConfirmation};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use history::History;
pub use session::{DragPayload, EditingSession};
pub use ui_state::UiState;
