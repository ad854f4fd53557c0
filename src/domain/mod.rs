//! Domain layer: EAOG node model, structural editing and framework mounting
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod brief;
pub mod error;
pub mod framework;
pub mod kind;
pub mod naming;
pub mod schema;
pub mod tree;

pub use brief::{normalize_brief, to_brief};
pub use error::{DomainError, DomainResult};
pub use framework::Framework;
pub use kind::{ChildrenDirection, NodeType};
pub use schema::{
    validate, validate_framework, FieldError, ItemRef, Iteration, NodeData, NodeKind, NodeRecord,
    ValidationErrors,
};
pub use tree::{AnchorPosition, EaogTree, NodeId, Position, TreeNode};
