//! Framework mounting.
//!
//! A framework is a validated EAOG template whose root carries `meta.framework = true` and that
//! contains one or more `mount-point` leaves. Mounting splices a caller subtree in place of a
//! mount point, renders `${<mount point>}` tokens in framework node names and tags the mounted
//! node with `meta.mountBy`.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::kind::NodeType;
use crate::domain::naming::substitute_token;
use crate::domain::schema::{validate_framework, NodeRecord, META_MOUNT_BY};
use crate::domain::tree::{EaogTree, NodeId};

/// A framework template held in its own tree.
#[derive(Debug, Clone)]
pub struct Framework {
    name: String,
    tree: EaogTree,
}

impl Framework {
    /// Validate a framework definition and load it.
    pub fn from_value(value: &Value) -> DomainResult<Self> {
        let record = validate_framework(value)?;
        Ok(Self::from_tree(EaogTree::from_record(record)))
    }

    /// Wrap an existing tree after checking the framework invariants.
    pub fn new(tree: EaogTree) -> DomainResult<Self> {
        validate_framework(&tree.to_value())?;
        Ok(Self::from_tree(tree))
    }

    fn from_tree(tree: EaogTree) -> Self {
        let name = tree
            .data(tree.root())
            .map(|d| d.name.clone())
            .unwrap_or_default();
        Self { name, tree }
    }

    /// Name of the framework as defined, before any token rendering.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.tree.data(self.tree.root())?.description.as_deref()
    }

    pub fn tree(&self) -> &EaogTree {
        &self.tree
    }

    /// Unresolved mount points in pre-order.
    pub fn mount_points(&self) -> Vec<NodeId> {
        mount_points_in(&self.tree, self.tree.root())
    }

    pub fn mount_point_names(&self) -> Vec<String> {
        names_of(&self.tree, &self.mount_points())
    }

    /// A framework is mounted once no mount point is left.
    pub fn is_mounted(&self) -> bool {
        self.mount_points().is_empty()
    }

    /// Move the subtree `target` of `source` into this framework.
    ///
    /// Without a mount point name the framework must have exactly one mount point. `target` is
    /// removed from `source` and freed there, unless it is the root of `source`, which cannot be
    /// removed and stays in place. Returns the id of the mounted node inside
    /// [`Framework::tree`].
    #[instrument(level = "debug", skip(self, source))]
    pub fn mount_eaog(
        &mut self,
        source: &mut EaogTree,
        target: NodeId,
        mount_point_name: Option<&str>,
    ) -> DomainResult<NodeId> {
        let record = source.to_record(target)?;
        let mounted = self.mount_record(&record, mount_point_name)?;
        take_from(source, target)?;
        Ok(mounted)
    }

    fn mount_record(
        &mut self,
        record: &NodeRecord,
        mount_point_name: Option<&str>,
    ) -> DomainResult<NodeId> {
        let fw_root = self.tree.root();
        resolve_mount_point(&self.tree, fw_root, &self.name, mount_point_name)?;

        let grafted = self.tree.build_detached(record);
        if let Err(e) = mount_into(&mut self.tree, fw_root, &self.name, grafted, mount_point_name) {
            self.tree.discard(grafted)?;
            return Err(e);
        }
        Ok(grafted)
    }

    /// Mount several subtrees at once. The mapping must name every mount point exactly and the
    /// targets must be disjoint subtrees of `source`.
    pub fn mount_eaogs(
        &mut self,
        source: &mut EaogTree,
        mapping: &BTreeMap<String, NodeId>,
    ) -> DomainResult<Vec<NodeId>> {
        let mut expected = self.mount_point_names();
        expected.sort();
        let actual: Vec<String> = mapping.keys().cloned().collect();
        if expected != actual {
            return Err(DomainError::MountPointMismatch {
                expected: expected.join(", "),
                actual: actual.join(", "),
            });
        }

        let targets: Vec<NodeId> = mapping.values().copied().collect();
        for (i, &a) in targets.iter().enumerate() {
            for &b in &targets[i + 1..] {
                if a == b || source.is_ancestor(a, b) || source.is_ancestor(b, a) {
                    let name = source.data(a).map(|d| d.name.clone()).unwrap_or_default();
                    return Err(DomainError::OverlappingMountTargets(name));
                }
            }
        }
        let records = targets
            .iter()
            .map(|&t| source.to_record(t))
            .collect::<DomainResult<Vec<_>>>()?;

        let mut mounted = Vec::with_capacity(records.len());
        for ((name, _), record) in mapping.iter().zip(&records) {
            mounted.push(self.mount_record(record, Some(name))?);
        }
        for target in targets {
            take_from(source, target)?;
        }
        Ok(mounted)
    }

    /// Decorate `target` in place: the framework takes `target`'s position in `doc` and
    /// `target` is nested inside it at the mount point. Returns the framework root in `doc`.
    #[instrument(level = "debug", skip(self, doc))]
    pub fn apply_to_eaog(&self, doc: &mut EaogTree, target: NodeId) -> DomainResult<NodeId> {
        if !doc.contains(target) {
            return Err(DomainError::NodeNotFound);
        }
        resolve_mount_point(&self.tree, self.tree.root(), &self.name, None)?;

        let fw_root = doc.graft(&self.tree);
        let placeholder = match doc.replace_with_placeholder(target) {
            Ok(placeholder) => placeholder,
            Err(e) => {
                doc.discard(fw_root)?;
                return Err(e);
            }
        };
        mount_into(doc, fw_root, &self.name, target, None)?;

        // the mount point may have been the framework root itself
        let top = doc.root_of(target);
        doc.replace_with(placeholder, top)?;
        doc.discard(placeholder)?;

        debug!(
            "Applied framework '{}' at '{}'",
            self.name,
            doc.path(top).unwrap_or_default()
        );
        Ok(top)
    }

    /// Nodes below `root` that were mounted by this framework.
    pub fn mounted_nodes(&self, doc: &EaogTree, root: NodeId) -> Vec<NodeId> {
        doc.traverse(root)
            .filter(|&id| {
                doc.data(id)
                    .is_some_and(|d| d.mounted_by() == Some(self.name.as_str()))
            })
            .collect()
    }

    /// The single node mounted by this framework below `root`.
    pub fn mounted_node(&self, doc: &EaogTree, root: NodeId) -> DomainResult<NodeId> {
        match self.mounted_nodes(doc, root).as_slice() {
            [single] => Ok(*single),
            nodes => Err(DomainError::MountedNodeCount {
                framework: self.name.clone(),
                count: nodes.len(),
            }),
        }
    }
}

/// Remove a mounted subtree from the tree it came from.
fn take_from(source: &mut EaogTree, target: NodeId) -> DomainResult<()> {
    if source.parent(target).is_none() {
        return Ok(());
    }
    let removed = source.remove(target, true)?;
    source.discard(removed)
}

fn mount_points_in(tree: &EaogTree, fw_root: NodeId) -> Vec<NodeId> {
    tree.traverse(fw_root)
        .filter(|&id| {
            tree.data(id)
                .is_some_and(|d| d.node_type() == NodeType::MountPoint)
        })
        .collect()
}

fn names_of(tree: &EaogTree, ids: &[NodeId]) -> Vec<String> {
    ids.iter()
        .filter_map(|&id| tree.data(id))
        .map(|d| d.name.clone())
        .collect()
}

fn resolve_mount_point(
    tree: &EaogTree,
    fw_root: NodeId,
    framework: &str,
    mount_point_name: Option<&str>,
) -> DomainResult<NodeId> {
    let points = mount_points_in(tree, fw_root);
    if points.is_empty() {
        return Err(DomainError::AlreadyMounted(framework.to_string()));
    }
    match mount_point_name {
        Some(wanted) => points
            .into_iter()
            .find(|&id| tree.data(id).is_some_and(|d| d.name == wanted))
            .ok_or_else(|| DomainError::MountPointNotFound(wanted.to_string())),
        None => match points.as_slice() {
            [single] => Ok(*single),
            _ => Err(DomainError::MountPointNotFound(format!(
                "a name is required to choose among {}",
                names_of(tree, &points).join(", ")
            ))),
        },
    }
}

/// Mount the detached-or-attached node `target` into the framework instance at `fw_root`, both
/// living in `tree`.
fn mount_into(
    tree: &mut EaogTree,
    fw_root: NodeId,
    framework: &str,
    target: NodeId,
    mount_point_name: Option<&str>,
) -> DomainResult<()> {
    let point = resolve_mount_point(tree, fw_root, framework, mount_point_name)?;
    let (point_name, choice) = match tree.data(point) {
        Some(data) => (data.name.clone(), data.choice.clone()),
        None => return Err(DomainError::NodeNotFound),
    };
    let target_name = tree
        .data(target)
        .map(|d| d.name.clone())
        .ok_or(DomainError::NodeNotFound)?;

    let framework_nodes: Vec<NodeId> = tree.traverse(fw_root).collect();
    for id in framework_nodes {
        let Some(current) = tree.data(id).map(|d| d.name.clone()) else {
            continue;
        };
        let rendered = substitute_token(&current, &point_name, &target_name);
        if rendered != current {
            tree.relabel(id, &rendered);
        }
    }

    if tree.parent(target).is_some() {
        tree.remove(target, true)?;
    }
    tree.replace_with(point, target)?;
    tree.discard(point)?;

    if let Some(data) = tree.data_mut(target) {
        if choice.is_some() {
            data.choice = choice;
        }
        data.meta.insert(
            META_MOUNT_BY.to_string(),
            json!({"framework": framework, "mountPointName": point_name}),
        );
    }
    debug!(
        "Mounted '{}' at mount point '{}' of framework '{}'",
        target_name, point_name, framework
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn guarded() -> Framework {
        Framework::from_value(&json!({
            "type": "sand",
            "name": "guarded",
            "meta": {"framework": true},
            "children": [
                {"type": "instruction", "name": "监督：${action}"},
                {"type": "mount-point", "name": "action", "choice": "ok"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn given_single_point_framework_when_mounting_then_renders_tokens_and_tags_node() {
        let mut framework = guarded();
        let mut source =
            EaogTree::from_value(&json!({"type": "instruction", "name": "下载"})).unwrap();
        let target = source.root();

        let mounted = framework.mount_eaog(&mut source, target, None).unwrap();

        let tree = framework.tree();
        let root = tree.root();
        let names: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|&c| tree.data(c).unwrap().name.as_str())
            .collect();
        assert_eq!(names, vec!["监督：下载", "下载"]);
        let data = tree.data(mounted).unwrap();
        assert_eq!(
            data.meta.get("mountBy"),
            Some(&json!({"framework": "guarded", "mountPointName": "action"}))
        );
        assert_eq!(data.choice.as_deref(), Some("ok"));
        assert!(framework.is_mounted());
    }

    #[test]
    fn given_nested_source_node_when_mounting_then_moves_out_of_source() {
        let mut framework = guarded();
        let mut source = EaogTree::from_value(&json!({
            "type": "sand",
            "name": "doc",
            "children": [
                {"type": "instruction", "name": "下载"},
                {"type": "end", "name": "done"}
            ]
        }))
        .unwrap();
        let target = source.node_by_path("doc/下载").unwrap();

        let mounted = framework.mount_eaog(&mut source, target, None).unwrap();

        assert!(source.node_by_path("doc/下载").is_none());
        assert!(!source.contains(target));
        assert_eq!(source.len(), 2);
        let data = framework.tree().data(mounted).unwrap();
        assert_eq!(data.name, "下载");
        assert_eq!(data.mounted_by(), Some("guarded"));
        assert_eq!(
            framework.tree().path(mounted).as_deref(),
            Some("guarded/下载")
        );
    }

    #[test]
    fn given_failed_mount_when_mounting_then_source_keeps_target() {
        let mut framework = guarded();
        let mut source = EaogTree::from_value(&json!({
            "type": "sand", "name": "doc", "children": [{"type": "end", "name": "x"}]
        }))
        .unwrap();
        let target = source.node_by_path("doc/x").unwrap();

        let err = framework
            .mount_eaog(&mut source, target, Some("nope"))
            .unwrap_err();

        assert_eq!(err, DomainError::MountPointNotFound("nope".to_string()));
        assert_eq!(source.node_by_path("doc/x"), Some(target));
    }

    #[test]
    fn given_mounted_framework_when_mounting_again_then_fails() {
        let mut framework = guarded();
        let mut source = EaogTree::from_value(&json!({"type": "end", "name": "x"})).unwrap();
        let target = source.root();
        framework.mount_eaog(&mut source, target, None).unwrap();

        let err = framework.mount_eaog(&mut source, target, None).unwrap_err();

        assert_eq!(err, DomainError::AlreadyMounted("guarded".to_string()));
    }

    #[test]
    fn given_unknown_mount_point_when_mounting_then_fails() {
        let mut framework = guarded();
        let mut source = EaogTree::from_value(&json!({"type": "end", "name": "x"})).unwrap();
        let target = source.root();

        let err = framework
            .mount_eaog(&mut source, target, Some("nope"))
            .unwrap_err();

        assert_eq!(err, DomainError::MountPointNotFound("nope".to_string()));
        assert!(!framework.is_mounted());
    }

    #[test]
    fn given_definition_without_marker_when_loading_then_invalid_framework() {
        let err = Framework::from_value(&json!({
            "type": "sand", "name": "fw", "children": [{"type": "mount-point", "name": "m"}]
        }))
        .unwrap_err();

        assert!(matches!(err, DomainError::InvalidFramework(_)));
    }
}
