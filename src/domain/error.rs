//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::kind::NodeType;
use crate::domain::naming::NameViolation;
use crate::domain::schema::ValidationErrors;

/// Domain errors represent violated preconditions of tree and framework operations.
/// They are raised before any mutation happens, so a failed command leaves the tree unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("node not found in tree")]
    NodeNotFound,

    #[error("root node '{0}' cannot have siblings")]
    RootHasNoSiblings(String),

    #[error("node '{name}' of type '{node_type}' is not a composite node")]
    NotComposite { name: String, node_type: NodeType },

    #[error("node '{0}' is still attached to a parent")]
    NodeAttached(String),

    #[error("moving '{0}' there would create a cycle")]
    WouldCreateCycle(String),

    #[error("cannot drop node '{0}' onto itself")]
    SelfDrop(String),

    #[error("anchor '{anchor}' is not a child of '{parent}'")]
    AnchorNotFound { parent: String, anchor: String },

    #[error("cannot remove root node '{0}'")]
    CannotRemoveRoot(String),

    #[error("invalid node name '{name}': {violation}")]
    InvalidName {
        name: String,
        violation: NameViolation,
    },

    #[error("cannot change node type from '{from}' to '{to}'")]
    KindChange { from: NodeType, to: NodeType },

    #[error("mount point not found: {0}")]
    MountPointNotFound(String),

    #[error("mount points do not match: expected [{expected}], got [{actual}]")]
    MountPointMismatch { expected: String, actual: String },

    #[error("mount targets overlap at '{0}'")]
    OverlappingMountTargets(String),

    #[error("framework '{0}' is already mounted")]
    AlreadyMounted(String),

    #[error("expected exactly one node mounted by '{framework}', found {count}")]
    MountedNodeCount { framework: String, count: usize },

    #[error("invalid framework: {0}")]
    InvalidFramework(#[from] ValidationErrors),
}

pub type DomainResult<T> = Result<T, DomainError>;
