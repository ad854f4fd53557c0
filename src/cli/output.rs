//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use termtree::Tree;

use crate::domain::{EaogTree, NodeId};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Render the document as a termtree, one `name [type]` label per node.
pub fn tree_view(tree: &EaogTree) -> Tree<String> {
    fn build(tree: &EaogTree, id: NodeId) -> Tree<String> {
        let label = match tree.data(id) {
            Some(data) => match data.mounted_by() {
                Some(framework) => format!("{} [{}] <{}>", data.name, data.node_type(), framework),
                None => format!("{} [{}]", data.name, data.node_type()),
            },
            None => "?".to_string(),
        };
        Tree::new(label).with_leaves(tree.children(id).iter().map(|&c| build(tree, c)))
    }
    build(tree, tree.root())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_tree_when_rendering_then_lists_nodes_with_types() {
        let tree = EaogTree::from_value(&json!({
            "type": "sand",
            "name": "root",
            "children": [{"type": "instruction", "name": "load"}]
        }))
        .unwrap();

        let rendered = tree_view(&tree).to_string();

        assert!(rendered.starts_with("root [sand]"));
        assert!(rendered.contains("load [instruction]"));
    }
}
