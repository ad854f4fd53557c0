//! Node type taxonomy.
//!
//! Every EAOG node has a [`NodeType`]. Types are classified along three independent axes:
//! leaf vs. composite, sequential vs. concurrent, and conditional.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of EAOG node types, serialized with their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Leaf that performs a concrete action
    Instruction,
    /// Leaf placeholder without behaviour
    Empty,
    /// Leaf that terminates the enclosing flow
    End,
    /// Leaf that re-enters the node named by `ref`
    Recursion,
    /// Leaf splice point inside a framework
    MountPoint,
    /// Sequential AND
    Sand,
    /// Parallel AND
    Pand,
    /// Conditional OR
    Cor,
    /// Sequential iterator
    Sitr,
    /// Parallel iterator
    Pitr,
    For,
    Pfor,
    /// Exploration
    Exp,
}

/// Layout direction of a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenDirection {
    None,
    Vertical,
    Horizontal,
}

impl NodeType {
    pub const ALL: [NodeType; 13] = [
        NodeType::Instruction,
        NodeType::Empty,
        NodeType::End,
        NodeType::Recursion,
        NodeType::MountPoint,
        NodeType::Sand,
        NodeType::Pand,
        NodeType::Cor,
        NodeType::Sitr,
        NodeType::Pitr,
        NodeType::For,
        NodeType::Pfor,
        NodeType::Exp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Instruction => "instruction",
            NodeType::Empty => "empty",
            NodeType::End => "end",
            NodeType::Recursion => "recursion",
            NodeType::MountPoint => "mount-point",
            NodeType::Sand => "sand",
            NodeType::Pand => "pand",
            NodeType::Cor => "cor",
            NodeType::Sitr => "sitr",
            NodeType::Pitr => "pitr",
            NodeType::For => "for",
            NodeType::Pfor => "pfor",
            NodeType::Exp => "exp",
        }
    }

    pub fn is_leaf(self) -> bool {
        matches!(
            self,
            NodeType::Instruction
                | NodeType::Empty
                | NodeType::End
                | NodeType::Recursion
                | NodeType::MountPoint
        )
    }

    pub fn is_composite(self) -> bool {
        !self.is_leaf()
    }

    pub fn is_sequential(self) -> bool {
        matches!(self, NodeType::Sand | NodeType::Sitr | NodeType::For)
    }

    pub fn is_concurrent(self) -> bool {
        matches!(self, NodeType::Pand | NodeType::Pitr | NodeType::Pfor)
    }

    pub fn is_conditional(self) -> bool {
        matches!(self, NodeType::Cor)
    }

    pub fn is_iterator(self) -> bool {
        matches!(
            self,
            NodeType::Sitr | NodeType::Pitr | NodeType::For | NodeType::Pfor
        )
    }

    pub fn children_direction(self) -> ChildrenDirection {
        if self.is_leaf() {
            ChildrenDirection::None
        } else if self.is_concurrent() || self.is_conditional() {
            ChildrenDirection::Horizontal
        } else {
            ChildrenDirection::Vertical
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unknown node type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNodeType(pub String);

impl fmt::Display for UnknownNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown node type '{}'", self.0)
    }
}

impl std::error::Error for UnknownNodeType {}

impl FromStr for NodeType {
    type Err = UnknownNodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownNodeType(s.to_string()))
    }
}
