//! Node schema: typed node payloads and validation of untrusted JSON.
//!
//! Untrusted input is validated with [`validate`] which never fails on malformed shape by
//! panicking; it returns every field-level problem it found. Only validated data becomes a
//! [`NodeRecord`], and building a tree from a record cannot fail.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::kind::NodeType;
use crate::domain::naming::{check_name, check_template_name};

/// Meta key marking a framework root.
pub const META_FRAMEWORK: &str = "framework";
/// Meta key carrying mount provenance.
pub const META_MOUNT_BY: &str = "mountBy";

/// Iterator item reference: a plain context name or `{ "contextName": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemRef {
    Name(String),
    Context {
        #[serde(rename = "contextName")]
        context_name: String,
    },
}

/// Iterator payload shared by `sitr`, `pitr`, `for` and `pfor`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Iteration {
    pub item: Option<ItemRef>,
    pub items: Option<ItemRef>,
}

/// Type-specific payload; the variant determines the node type.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Instruction {
        params: Option<Value>,
        results: Option<Value>,
        action: Option<Value>,
    },
    Empty,
    End,
    Recursion {
        target: String,
    },
    MountPoint,
    Sand,
    Pand,
    Cor {
        condition: Option<Value>,
    },
    Sitr(Iteration),
    Pitr(Iteration),
    For(Iteration),
    Pfor(Iteration),
    Exp,
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Instruction { .. } => NodeType::Instruction,
            NodeKind::Empty => NodeType::Empty,
            NodeKind::End => NodeType::End,
            NodeKind::Recursion { .. } => NodeType::Recursion,
            NodeKind::MountPoint => NodeType::MountPoint,
            NodeKind::Sand => NodeType::Sand,
            NodeKind::Pand => NodeType::Pand,
            NodeKind::Cor { .. } => NodeType::Cor,
            NodeKind::Sitr(_) => NodeType::Sitr,
            NodeKind::Pitr(_) => NodeType::Pitr,
            NodeKind::For(_) => NodeType::For,
            NodeKind::Pfor(_) => NodeType::Pfor,
            NodeKind::Exp => NodeType::Exp,
        }
    }

    /// Payload-free kind for a type, used when synthesizing nodes.
    pub fn bare(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Instruction => NodeKind::Instruction {
                params: None,
                results: None,
                action: None,
            },
            NodeType::Empty => NodeKind::Empty,
            NodeType::End => NodeKind::End,
            NodeType::Recursion => NodeKind::Recursion {
                target: String::new(),
            },
            NodeType::MountPoint => NodeKind::MountPoint,
            NodeType::Sand => NodeKind::Sand,
            NodeType::Pand => NodeKind::Pand,
            NodeType::Cor => NodeKind::Cor { condition: None },
            NodeType::Sitr => NodeKind::Sitr(Iteration::default()),
            NodeType::Pitr => NodeKind::Pitr(Iteration::default()),
            NodeType::For => NodeKind::For(Iteration::default()),
            NodeType::Pfor => NodeKind::Pfor(Iteration::default()),
            NodeType::Exp => NodeKind::Exp,
        }
    }

    fn iteration(&self) -> Option<&Iteration> {
        match self {
            NodeKind::Sitr(it) | NodeKind::Pitr(it) | NodeKind::For(it) | NodeKind::Pfor(it) => {
                Some(it)
            }
            _ => None,
        }
    }
}

/// Structural data of one node, without its children.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub name: String,
    pub description: Option<String>,
    /// Choice label, set on a child of a conditional node
    pub choice: Option<String>,
    pub meta: Map<String, Value>,
    pub kind: NodeKind,
}

impl NodeData {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            choice: None,
            meta: Map::new(),
            kind,
        }
    }

    /// Synthetic `empty` node holding a position during swaps.
    pub fn placeholder(name: &str) -> Self {
        Self {
            description: Some("This is a placeholder node".to_string()),
            ..Self::new(format!("{name}-placeholder"), NodeKind::Empty)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn is_framework(&self) -> bool {
        self.meta.get(META_FRAMEWORK) == Some(&Value::Bool(true))
    }

    /// Name of the framework that mounted this node, if any.
    pub fn mounted_by(&self) -> Option<&str> {
        self.meta
            .get(META_MOUNT_BY)?
            .get(META_FRAMEWORK)?
            .as_str()
    }
}

/// A validated node together with its children.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub data: NodeData,
    pub children: Vec<NodeRecord>,
}

impl NodeRecord {
    pub fn leaf(data: NodeData) -> Self {
        Self {
            data,
            children: Vec::new(),
        }
    }

    pub fn composite(data: NodeData, children: Vec<NodeRecord>) -> Self {
        Self { data, children }
    }

    /// Canonical JSON projection.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(WireNode::from(self)).unwrap_or(Value::Null)
    }
}

#[derive(Serialize)]
struct WireNode<'a> {
    #[serde(rename = "type")]
    node_type: NodeType,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    target: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    results: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    item: Option<&'a ItemRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    items: Option<&'a ItemRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    choice: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty_map")]
    meta: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<WireNode<'a>>>,
}

fn is_empty_map(meta: &&Map<String, Value>) -> bool {
    meta.is_empty()
}

impl<'a> From<&'a NodeRecord> for WireNode<'a> {
    fn from(record: &'a NodeRecord) -> Self {
        let data = &record.data;
        let node_type = data.node_type();
        let mut wire = WireNode {
            node_type,
            name: &data.name,
            description: data.description.as_deref(),
            target: None,
            condition: None,
            params: None,
            results: None,
            action: None,
            item: None,
            items: None,
            choice: data.choice.as_deref(),
            meta: &data.meta,
            children: node_type
                .is_composite()
                .then(|| record.children.iter().map(WireNode::from).collect()),
        };
        match &data.kind {
            NodeKind::Instruction {
                params,
                results,
                action,
            } => {
                wire.params = params.as_ref();
                wire.results = results.as_ref();
                wire.action = action.as_ref();
            }
            NodeKind::Recursion { target } => wire.target = Some(target.as_str()),
            NodeKind::Cor { condition } => wire.condition = condition.as_ref(),
            kind => {
                if let Some(it) = kind.iteration() {
                    wire.item = it.item.as_ref();
                    wire.items = it.items.as_ref();
                }
            }
        }
        wire
    }
}

// ============================================================
// Validation
// ============================================================

/// One field-level validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// JSON-pointer-like location, e.g. `/children/2/name`
    pub path: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{}: {}", path, self.message)
    }
}

/// All problems found while validating one document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid EAOG data ({} error(s)): {}", .0.len(), join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }
}

const COMMON_FIELDS: [&str; 6] = ["type", "name", "description", "choice", "meta", "children"];

fn type_fields(node_type: NodeType) -> &'static [&'static str] {
    match node_type {
        NodeType::Instruction => &["params", "results", "action"],
        NodeType::Recursion => &["ref"],
        NodeType::Cor => &["condition"],
        t if t.is_iterator() => &["item", "items"],
        _ => &[],
    }
}

/// Validate untrusted JSON against the canonical EAOG schema.
pub fn validate(value: &Value) -> Result<NodeRecord, ValidationErrors> {
    validate_with(value, false)
}

fn validate_with(value: &Value, template: bool) -> Result<NodeRecord, ValidationErrors> {
    let mut errors = Vec::new();
    let record = validate_node(value, "", template, &mut errors);
    match record {
        Some(record) if errors.is_empty() => Ok(record),
        _ => Err(ValidationErrors(errors)),
    }
}

/// Validate a framework definition: a valid EAOG whose root carries `meta.framework = true`,
/// with no nested framework marker and at least one mount point.
///
/// Framework node names may contain `${mount point}` tokens anywhere, including at the start,
/// since tokens are rendered before the framework becomes part of a document.
pub fn validate_framework(value: &Value) -> Result<NodeRecord, ValidationErrors> {
    let record = validate_with(value, true)?;
    let mut errors = Vec::new();

    if !record.data.is_framework() {
        errors.push(FieldError {
            path: "/meta/framework".to_string(),
            message: "framework root must set meta.framework to true".to_string(),
        });
    }

    let mut mount_points = 0usize;
    let mut stack: Vec<(&NodeRecord, String)> = record
        .children
        .iter()
        .enumerate()
        .map(|(i, c)| (c, format!("/children/{i}")))
        .collect();
    while let Some((node, path)) = stack.pop() {
        if node.data.is_framework() {
            errors.push(FieldError {
                path: format!("{path}/meta/framework"),
                message: "frameworks cannot be nested".to_string(),
            });
        }
        if node.data.node_type() == NodeType::MountPoint {
            mount_points += 1;
        }
        for (i, child) in node.children.iter().enumerate() {
            stack.push((child, format!("{path}/children/{i}")));
        }
    }
    if mount_points == 0 {
        errors.push(FieldError {
            path: String::new(),
            message: "framework must contain at least one mount-point".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(record)
    } else {
        Err(ValidationErrors(errors))
    }
}

fn push(errors: &mut Vec<FieldError>, path: String, message: impl Into<String>) {
    errors.push(FieldError {
        path,
        message: message.into(),
    });
}

fn validate_node(
    value: &Value,
    path: &str,
    template: bool,
    errors: &mut Vec<FieldError>,
) -> Option<NodeRecord> {
    let Some(obj) = value.as_object() else {
        push(errors, path.to_string(), "node must be an object");
        return None;
    };
    let before = errors.len();

    let node_type = match obj.get("type") {
        Some(Value::String(s)) => match s.parse::<NodeType>() {
            Ok(t) => Some(t),
            Err(e) => {
                push(errors, format!("{path}/type"), e.to_string());
                None
            }
        },
        Some(_) => {
            push(errors, format!("{path}/type"), "type must be a string");
            None
        }
        None => {
            push(errors, format!("{path}/type"), "type is required");
            None
        }
    };

    let name = match obj.get("name") {
        Some(Value::String(s)) => {
            let checked = if template {
                check_template_name(s)
            } else {
                check_name(s)
            };
            if let Err(violation) = checked {
                push(errors, format!("{path}/name"), violation.to_string());
            }
            s.clone()
        }
        Some(_) => {
            push(errors, format!("{path}/name"), "name must be a string");
            String::new()
        }
        None => {
            push(errors, format!("{path}/name"), "name is required");
            String::new()
        }
    };

    let description = optional_string(obj, "description", path, errors);
    let choice = optional_string(obj, "choice", path, errors);
    let meta = match obj.get("meta") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m.clone(),
        Some(_) => {
            push(errors, format!("{path}/meta"), "meta must be an object");
            Map::new()
        }
    };

    let Some(node_type) = node_type else {
        return None;
    };

    for key in obj.keys() {
        if !COMMON_FIELDS.contains(&key.as_str()) && !type_fields(node_type).contains(&key.as_str())
        {
            debug!("{path}: dropping field '{key}' not used by '{node_type}' nodes");
        }
    }

    let kind = match node_type {
        NodeType::Instruction => NodeKind::Instruction {
            params: optional_any(obj, "params"),
            results: optional_any(obj, "results"),
            action: optional_any(obj, "action"),
        },
        NodeType::Recursion => match obj.get("ref") {
            Some(Value::String(s)) if !s.is_empty() => NodeKind::Recursion { target: s.clone() },
            Some(Value::String(_)) => {
                push(errors, format!("{path}/ref"), "ref must not be empty");
                return None;
            }
            Some(_) => {
                push(errors, format!("{path}/ref"), "ref must be a string");
                return None;
            }
            None => {
                push(errors, format!("{path}/ref"), "ref is required on recursion nodes");
                return None;
            }
        },
        NodeType::Cor => NodeKind::Cor {
            condition: optional_any(obj, "condition"),
        },
        t if t.is_iterator() => {
            let it = Iteration {
                item: optional_item(obj, "item", path, errors),
                items: optional_item(obj, "items", path, errors),
            };
            match t {
                NodeType::Sitr => NodeKind::Sitr(it),
                NodeType::Pitr => NodeKind::Pitr(it),
                NodeType::For => NodeKind::For(it),
                _ => NodeKind::Pfor(it),
            }
        }
        t => NodeKind::bare(t),
    };

    let children = match obj.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) if node_type.is_leaf() => {
            if !items.is_empty() {
                push(
                    errors,
                    format!("{path}/children"),
                    format!("'{node_type}' is a leaf type and cannot have children"),
                );
            }
            Vec::new()
        }
        Some(Value::Array(items)) => {
            let mut children = Vec::with_capacity(items.len());
            let mut seen = HashSet::new();
            for (i, item) in items.iter().enumerate() {
                let child_path = format!("{path}/children/{i}");
                if let Some(child) = validate_node(item, &child_path, template, errors) {
                    if !seen.insert(child.data.name.clone()) {
                        push(
                            errors,
                            format!("{child_path}/name"),
                            format!("duplicate sibling name '{}'", child.data.name),
                        );
                    }
                    children.push(child);
                }
            }
            children
        }
        Some(_) => {
            push(errors, format!("{path}/children"), "children must be an array");
            Vec::new()
        }
    };

    if errors.len() != before {
        return None;
    }

    Some(NodeRecord {
        data: NodeData {
            name,
            description,
            choice,
            meta,
            kind,
        },
        children,
    })
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            push(errors, format!("{path}/{key}"), format!("{key} must be a string"));
            None
        }
    }
}

fn optional_any(obj: &Map<String, Value>, key: &str) -> Option<Value> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(v) => Some(v.clone()),
    }
}

fn optional_item(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<ItemRef> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(v) => match serde_json::from_value::<ItemRef>(v.clone()) {
            Ok(item) => Some(item),
            Err(_) => {
                push(
                    errors,
                    format!("{path}/{key}"),
                    format!("{key} must be a string or {{\"contextName\": string}}"),
                );
                None
            }
        },
    }
}
