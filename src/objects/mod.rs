pub mod commit;
pub mod store;
pub mod tree;

use crate::hash::Oid;

pub use commit::CommitFields;
pub use store::ObjectStore;
pub use tree::{Mode, Tree, TreeRecord};

/// The three content-addressable kinds this system stores. Each variant
/// knows only how to produce its own canonical byte serialisation; the
/// object store never inspects variant-specific structure beyond that.
pub enum Object {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(CommitFields),
}

impl Object {
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Blob(_) => "blob",
            Object::Tree(_) => "tree",
            Object::Commit(_) => "commit",
        }
    }

    /// Canonical on-disk form: `"<kind> <len>\0<body>"`.
    pub fn serialize(&self) -> Vec<u8> {
        let body = match self {
            Object::Blob(bytes) => bytes.clone(),
            Object::Tree(tree) => tree.serialize_body(),
            Object::Commit(fields) => fields.serialize_body(),
        };
        let mut out = Vec::with_capacity(body.len() + 16);
        out.extend_from_slice(self.kind().as_bytes());
        out.push(b' ');
        out.extend_from_slice(body.len().to_string().as_bytes());
        out.push(0);
        out.extend_from_slice(&body);
        out
    }
}

pub fn blob_oid(content: &[u8]) -> Oid {
    crate::hash::sha1(&Object::Blob(content.to_vec()).serialize())
}
