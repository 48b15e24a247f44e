use std::path::PathBuf;

use crate::fs::scan::DocNode;

/// Marker prefixes distinguishing entry kinds in display lines. The
/// document-index → display-line lookup keys off these, so they are part of
/// the line format, not just decoration.
pub const DIR_MARKER: &str = "[+]";
pub const DOC_MARKER: &str = "[-]";

/// Left margin applied to every display line.
const ROOT_INDENT: &str = "    ";

/// Flatten a tree into display lines with box-drawing prefixes.
///
/// The root itself produces no line; its children are rendered depth-first
/// with `├── `/`└── ` branch glyphs and `│   ` continuation columns. Pure
/// function of the tree, recomputed in full whenever the tree is replaced.
pub fn flatten_tree(root: &DocNode) -> Vec<String> {
    let mut lines = Vec::new();
    flatten_children(root, ROOT_INDENT, &mut lines);
    lines
}

fn flatten_children(node: &DocNode, prefix: &str, lines: &mut Vec<String>) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i == count - 1;
        let branch = if is_last { "└── " } else { "├── " };

        let mut line = String::with_capacity(prefix.len() + child.name.len() + 10);
        line.push_str(prefix);
        line.push_str(branch);
        if child.is_dir {
            line.push_str(DIR_MARKER);
            line.push(' ');
            line.push_str(&child.name);
            line.push('/');
        } else {
            line.push_str(DOC_MARKER);
            line.push(' ');
            line.push_str(&child.name);
        }
        lines.push(line);

        if !child.children.is_empty() {
            let continuation = if is_last { "    " } else { "│   " };
            let child_prefix = format!("{}{}", prefix, continuation);
            flatten_children(child, &child_prefix, lines);
        }
    }
}

/// Collect document paths in depth-first, sorted-child order.
///
/// Order is consistent with `flatten_tree`: the i-th path here corresponds
/// to the i-th document-marked display line.
pub fn collect_documents(root: &DocNode) -> Vec<PathBuf> {
    let mut docs = Vec::new();
    collect_into(root, &mut docs);
    docs
}

fn collect_into(node: &DocNode, docs: &mut Vec<PathBuf>) {
    if !node.is_dir {
        docs.push(node.path.clone());
    }
    for child in &node.children {
        collect_into(child, docs);
    }
}

/// Map a document index to its display-line index.
///
/// Finds the first document-marked line whose text contains the target's
/// base name. Same-named documents in different directories can mis-map to
/// the earlier line; that matches the observed selection behavior. Falls
/// back to line 0 when nothing matches.
pub fn find_line_for_document(index: usize, lines: &[String], docs: &[PathBuf]) -> usize {
    let Some(target) = docs.get(index) else {
        return 0;
    };
    let Some(filename) = target.file_name().map(|n| n.to_string_lossy()) else {
        return 0;
    };

    lines
        .iter()
        .position(|line| line.contains(DOC_MARKER) && line.contains(filename.as_ref()))
        .unwrap_or(0)
}
