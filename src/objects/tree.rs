use std::collections::BTreeMap;

use crate::hash::Oid;
use crate::objects::{store::ObjectStore, Object};

/// The mode recorded for a tree child, serialised as ASCII octal with no
/// leading zero: `100644` (regular), `100755` (executable), `40000`
/// (directory).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Regular,
    Executable,
    Directory,
}

impl Mode {
    pub fn as_octal_str(&self) -> &'static str {
        match self {
            Mode::Regular => "100644",
            Mode::Executable => "100755",
            Mode::Directory => "40000",
        }
    }
}

/// One child of a tree object, already resolved to an oid: either a blob
/// leaf or a sub-tree whose own storage has already completed.
#[derive(Debug, Clone)]
pub struct TreeRecord {
    pub mode: Mode,
    pub name: String,
    pub oid: Oid,
}

/// A tree is an ordered list of `TreeRecord`s, ready to serialise. Ordering
/// is by child name, matching the order entries are encountered when a
/// path-sorted flat entry list is folded level by level (see
/// `treebuilder::build`).
#[derive(Debug, Clone, Default)]
pub struct Tree {
    pub records: Vec<TreeRecord>,
}

impl Tree {
    pub fn new(mut records: Vec<TreeRecord>) -> Self {
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Tree { records }
    }

    pub fn serialize_body(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for record in &self.records {
            body.extend_from_slice(record.mode.as_octal_str().as_bytes());
            body.push(b' ');
            body.extend_from_slice(record.name.as_bytes());
            body.push(0);
            body.extend_from_slice(record.oid.as_bytes());
        }
        body
    }
}

/// One blob destined for a tree leaf: its repo-relative path, basename,
/// stored oid, and whether the source file was executable.
#[derive(Debug, Clone)]
pub struct LeafDescriptor {
    pub path: String,
    pub oid: Oid,
    pub executable: bool,
}

enum BuildNode {
    Leaf(LeafDescriptor),
    Dir(BTreeMap<String, BuildNode>),
}

/// Folds a flat, path-sorted list of leaf descriptors into a nested
/// hierarchy, then stores every sub-tree bottom-up (post-order) so a
/// parent's serialisation never references an unstored child, and returns
/// the root tree's oid.
pub fn build_and_store(store: &ObjectStore, entries: &[LeafDescriptor]) -> crate::error::Result<Oid> {
    let mut root: BTreeMap<String, BuildNode> = BTreeMap::new();
    for entry in entries {
        let parts: Vec<&str> = entry.path.split('/').filter(|p| !p.is_empty()).collect();
        insert(&mut root, &parts, entry.clone());
    }
    store_dir(store, &root)
}

fn insert(map: &mut BTreeMap<String, BuildNode>, parts: &[&str], leaf: LeafDescriptor) {
    if parts.len() == 1 {
        map.insert(parts[0].to_string(), BuildNode::Leaf(leaf));
        return;
    }

    let node = map
        .entry(parts[0].to_string())
        .or_insert_with(|| BuildNode::Dir(BTreeMap::new()));
    if let BuildNode::Dir(sub) = node {
        insert(sub, &parts[1..], leaf);
    }
}

fn store_dir(store: &ObjectStore, dir: &BTreeMap<String, BuildNode>) -> crate::error::Result<Oid> {
    let mut records = Vec::with_capacity(dir.len());
    for (name, node) in dir {
        let record = match node {
            BuildNode::Leaf(leaf) => TreeRecord {
                mode: if leaf.executable {
                    Mode::Executable
                } else {
                    Mode::Regular
                },
                name: name.clone(),
                oid: leaf.oid,
            },
            BuildNode::Dir(sub) => {
                let oid = store_dir(store, sub)?;
                TreeRecord {
                    mode: Mode::Directory,
                    name: name.clone(),
                    oid,
                }
            }
        };
        records.push(record);
    }

    let tree = Tree::new(records);
    store.store(&Object::Tree(tree))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_backend::memory::MemoryBackend;
    use std::path::Path;

    fn leaf(path: &str, content: &[u8]) -> (LeafDescriptor, Oid) {
        let oid = crate::objects::blob_oid(content);
        (
            LeafDescriptor {
                path: path.to_string(),
                oid,
                executable: false,
            },
            oid,
        )
    }

    #[test]
    fn nested_entries_produce_parent_referencing_stored_children() {
        let fs = MemoryBackend::new();
        let store = ObjectStore::new(&fs, Path::new(".git/objects"));

        let (a, _) = leaf("a.txt", b"a");
        let (b, _) = leaf("dir/b.txt", b"b");

        let root_oid = build_and_store(&store, &[a, b]).unwrap();
        let raw = store.read_raw(root_oid).unwrap();
        assert!(raw.starts_with(b"tree "));

        // the dir/ sub-tree must already exist on disk by the time root was stored
        let root_tree = store.read_tree(root_oid).unwrap();
        let dir_record = root_tree
            .records
            .iter()
            .find(|r| r.name == "dir")
            .expect("dir entry present");
        assert_eq!(dir_record.mode, Mode::Directory);
        assert!(store.has(dir_record.oid));
    }
}
