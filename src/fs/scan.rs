use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::Result;

/// Scan depth meaning "no bound": walk the whole tree.
pub const UNBOUNDED_DEPTH: i32 = -1;

/// A filesystem entry retained in the document tree view.
///
/// Trees are built fresh on every scan pass and replaced wholesale; no node
/// is mutated in place after a scan returns.
#[derive(Debug, Clone)]
pub struct DocNode {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub children: Vec<DocNode>,
}

impl DocNode {
    /// A directory root with no children, used both as the pre-scan
    /// placeholder and as the best-effort result for an unreadable root.
    pub fn empty_root(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self {
            name,
            path: path.to_path_buf(),
            is_dir: true,
            children: Vec::new(),
        }
    }
}

/// Whether a file name matches the viewed document extension.
fn is_document(name: &str) -> bool {
    let ext = name.rsplit('.').next().unwrap_or("");
    ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown")
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Load the root `.gitignore` as a matcher, failing open.
///
/// A missing or unparseable ignore-file means "nothing ignored" — it must
/// never abort a scan.
fn load_ignore_matcher(root: &Path) -> Option<Gitignore> {
    let gitignore_path = root.join(".gitignore");
    if !gitignore_path.exists() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(root);
    builder.add(&gitignore_path);
    builder.build().ok()
}

fn is_ignored(matcher: Option<&Gitignore>, rel_path: &Path, is_dir: bool) -> bool {
    matcher
        .map(|m| m.matched(rel_path, is_dir).is_ignore())
        .unwrap_or(false)
}

/// Insert an entry into the tree along its relative path segments, creating
/// intermediate directory nodes on demand and merging with existing siblings
/// of the same name.
fn insert_path(root: &mut DocNode, base: &Path, full_path: &Path, is_dir: bool) {
    let rel = match full_path.strip_prefix(base) {
        Ok(r) => r,
        Err(_) => return,
    };
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();

    let mut current = root;
    let mut partial = base.to_path_buf();
    for (i, part) in parts.iter().enumerate() {
        partial.push(part);
        let pos = current.children.iter().position(|c| &c.name == part);
        let idx = match pos {
            Some(idx) => idx,
            None => {
                current.children.push(DocNode {
                    name: part.clone(),
                    path: partial.clone(),
                    // Intermediate segments are directories by construction.
                    is_dir: is_dir || i < parts.len() - 1,
                    children: Vec::new(),
                });
                current.children.len() - 1
            }
        };
        current = &mut current.children[idx];
    }
}

/// Sort every level of the tree: directories before documents, each group
/// ordered case-insensitively by name.
fn sort_tree(node: &mut DocNode) {
    node.children
        .sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| {
            a.name.to_lowercase().cmp(&b.name.to_lowercase())
        }));
    for child in &mut node.children {
        sort_tree(child);
    }
}

/// Depth-0 scan: read only the immediate children of the root, never
/// touching subdirectories. This is the first, instant paint of the tree.
pub fn scan_quick(root_path: &Path, include_ignored: bool) -> Result<DocNode> {
    let matcher = if include_ignored {
        None
    } else {
        load_ignore_matcher(root_path)
    };

    let mut root = DocNode::empty_root(root_path);

    let entries = match fs::read_dir(root_path) {
        Ok(e) => e,
        // Unreadable root still yields a valid empty tree.
        Err(_) => return Ok(root),
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&name) {
            continue;
        }
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_ignored(matcher.as_ref(), Path::new(&name), is_dir) {
            continue;
        }
        if is_dir || is_document(&name) {
            insert_path(&mut root, root_path, &entry.path(), is_dir);
        }
    }

    sort_tree(&mut root);
    Ok(root)
}

/// Depth-bounded scan. `max_depth = -1` walks without bound; `max_depth = n`
/// includes entries up to `n` directory levels below the root.
pub fn scan_with_depth(root_path: &Path, include_ignored: bool, max_depth: i32) -> Result<DocNode> {
    let matcher = if include_ignored {
        None
    } else {
        load_ignore_matcher(root_path)
    };

    let mut root = DocNode::empty_root(root_path);
    walk(&mut root, root_path, root_path, matcher.as_ref(), 0, max_depth);
    sort_tree(&mut root);
    Ok(root)
}

/// Recursive walk collecting directories and documents. Per-entry failures
/// (permission denied, races) are swallowed and the walk continues.
fn walk(
    root: &mut DocNode,
    base: &Path,
    dir: &Path,
    matcher: Option<&Gitignore>,
    level: i32,
    max_depth: i32,
) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden(&name) {
            continue;
        }
        let full_path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

        if let Ok(rel) = full_path.strip_prefix(base) {
            if is_ignored(matcher, rel, is_dir) {
                continue;
            }
        }

        if is_dir {
            insert_path(root, base, &full_path, true);
            if max_depth < 0 || level < max_depth {
                walk(root, base, &full_path, matcher, level + 1, max_depth);
            }
        } else if is_document(&name) {
            insert_path(root, base, &full_path, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("README.md")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        File::create(dir.path().join("docs").join("guide.md")).unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        File::create(dir.path().join(".git").join("config.md")).unwrap();
        dir
    }

    fn child_names(node: &DocNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn quick_scan_reads_immediate_children_only() {
        let dir = setup_test_dir();
        let tree = scan_quick(dir.path(), false).unwrap();

        assert_eq!(child_names(&tree), vec!["docs", "README.md"]);
        // docs is a directory node with no children loaded yet
        let docs = &tree.children[0];
        assert!(docs.is_dir);
        assert!(docs.children.is_empty());
    }

    #[test]
    fn deep_scan_finds_nested_documents() {
        let dir = setup_test_dir();
        let tree = scan_with_depth(dir.path(), false, 1).unwrap();

        let docs = &tree.children[0];
        assert_eq!(docs.name, "docs");
        assert_eq!(child_names(docs), vec!["guide.md"]);
    }

    #[test]
    fn hidden_directories_are_excluded() {
        let dir = setup_test_dir();
        let tree = scan_with_depth(dir.path(), false, UNBOUNDED_DEPTH).unwrap();
        assert!(!tree.children.iter().any(|c| c.name == ".git"));
    }

    #[test]
    fn non_document_files_are_skipped() {
        let dir = setup_test_dir();
        let tree = scan_with_depth(dir.path(), false, UNBOUNDED_DEPTH).unwrap();
        assert!(!tree.children.iter().any(|c| c.name == "notes.txt"));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("UPPER.MD")).unwrap();
        let tree = scan_quick(dir.path(), false).unwrap();
        assert_eq!(child_names(&tree), vec!["UPPER.MD"]);
    }

    #[test]
    fn gitignore_filters_unless_inclusive() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("visible.md")).unwrap();
        File::create(dir.path().join("secret.md")).unwrap();
        let mut gi = File::create(dir.path().join(".gitignore")).unwrap();
        writeln!(gi, "secret.md").unwrap();

        let filtered = scan_with_depth(dir.path(), false, UNBOUNDED_DEPTH).unwrap();
        assert_eq!(child_names(&filtered), vec!["visible.md"]);

        let inclusive = scan_with_depth(dir.path(), true, UNBOUNDED_DEPTH).unwrap();
        assert_eq!(child_names(&inclusive), vec!["secret.md", "visible.md"]);
    }

    #[test]
    fn unreadable_ignore_file_fails_open() {
        let dir = TempDir::new().unwrap();
        File::create(dir.path().join("a.md")).unwrap();
        // A .gitignore that is a directory cannot be read as patterns.
        fs::create_dir(dir.path().join(".gitignore")).unwrap();
        let tree = scan_quick(dir.path(), false).unwrap();
        assert_eq!(child_names(&tree), vec!["a.md"]);
    }

    #[test]
    fn missing_root_yields_empty_tree() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("nonexistent");
        let tree = scan_quick(&gone, false).unwrap();
        assert!(tree.is_dir);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn depth_bound_prunes_deeper_levels() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        File::create(dir.path().join("a").join("top.md")).unwrap();
        File::create(dir.path().join("a").join("b").join("deep.md")).unwrap();

        let shallow = scan_with_depth(dir.path(), false, 1).unwrap();
        let a = &shallow.children[0];
        // b appears as a directory but its document does not
        assert_eq!(child_names(a), vec!["b", "top.md"]);
        assert!(a.children[0].children.is_empty());

        let full = scan_with_depth(dir.path(), false, UNBOUNDED_DEPTH).unwrap();
        let b = &full.children[0].children[0];
        assert_eq!(child_names(b), vec!["deep.md"]);
    }

    #[test]
    fn children_sorted_dirs_first_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Zeta")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        File::create(dir.path().join("B.md")).unwrap();
        File::create(dir.path().join("a.md")).unwrap();

        let tree = scan_quick(dir.path(), false).unwrap();
        assert_eq!(child_names(&tree), vec!["alpha", "Zeta", "a.md", "B.md"]);
    }

    #[test]
    fn directory_merge_keeps_single_node() {
        let mut root = DocNode::empty_root(Path::new("/base"));
        insert_path(
            &mut root,
            Path::new("/base"),
            Path::new("/base/docs/one.md"),
            false,
        );
        insert_path(
            &mut root,
            Path::new("/base"),
            Path::new("/base/docs/two.md"),
            false,
        );
        assert_eq!(root.children.len(), 1);
        let docs = &root.children[0];
        assert!(docs.is_dir);
        assert_eq!(docs.children.len(), 2);
    }
}
