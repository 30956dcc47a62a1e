use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

use crate::error::{GitError, Result};
use crate::fs_backend::FsBackend;
use crate::hash::{sha1, Oid};
use crate::objects::tree::Tree;
use crate::objects::Object;

/// Content-addressable store rooted at `<gitdir>/objects`. Objects are
/// immutable once written; a present object is never rewritten.
pub struct ObjectStore<'a> {
    fs: &'a dyn FsBackend,
    objects_dir: PathBuf,
}

impl<'a> ObjectStore<'a> {
    pub fn new(fs: &'a dyn FsBackend, objects_dir: &Path) -> Self {
        ObjectStore {
            fs,
            objects_dir: objects_dir.to_path_buf(),
        }
    }

    fn path_for(&self, oid: Oid) -> PathBuf {
        self.objects_dir.join(oid.dir_prefix()).join(oid.file_suffix())
    }

    pub fn has(&self, oid: Oid) -> bool {
        self.fs.exists(&self.path_for(oid))
    }

    /// Serialises, hashes, zlib-compresses at best-speed, and writes the
    /// object under its two-level hash-prefix path. A pre-existing object at
    /// that path is left untouched and its oid returned (idempotent).
    pub fn store(&self, object: &Object) -> Result<Oid> {
        let bytes = object.serialize();
        let oid = sha1(&bytes);
        let final_path = self.path_for(oid);

        if self.fs.exists(&final_path) {
            debug!(oid = %oid, "object already present, skipping write");
            return Ok(oid);
        }

        let dir = final_path
            .parent()
            .expect("object path always has a parent directory")
            .to_path_buf();
        self.fs.mkdir_all(&dir)?;

        let compressed = compress(&bytes)?;
        let tmp_path = dir.join(format!("tmp_{}", oid.file_suffix()));
        self.fs.create_new_exclusive(&tmp_path, &compressed)?;
        self.fs.rename(&tmp_path, &final_path)?;

        debug!(oid = %oid, kind = object.kind(), bytes = bytes.len(), "object stored");
        Ok(oid)
    }

    /// Reads back the decompressed, serialised (header-prefixed) bytes of a
    /// stored object.
    pub fn read_raw(&self, oid: Oid) -> Result<Vec<u8>> {
        let path = self.path_for(oid);
        let compressed = self.fs.read_all(&path)?;
        decompress(&compressed).map_err(|e| GitError::Corrupt(format!("object {oid}: {e}")))
    }

    /// Reads back only the body (post header) of a stored blob.
    pub fn read_blob(&self, oid: Oid) -> Result<Vec<u8>> {
        let raw = self.read_raw(oid)?;
        split_header(&raw, "blob")
    }

    pub fn read_tree(&self, oid: Oid) -> Result<Tree> {
        let raw = self.read_raw(oid)?;
        let body = split_header(&raw, "tree")?;
        parse_tree_body(&body)
    }
}

fn compress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder
        .write_all(bytes)
        .map_err(|e| GitError::Corrupt(format!("zlib compress: {e}")))?;
    encoder
        .finish()
        .map_err(|e| GitError::Corrupt(format!("zlib compress: {e}")))
}

fn decompress(bytes: &[u8]) -> std::result::Result<Vec<u8>, std::io::Error> {
    let mut decoder = ZlibDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

fn split_header<'b>(raw: &'b [u8], expect_kind: &str) -> Result<Vec<u8>> {
    let nul = raw
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| GitError::Corrupt("object missing header terminator".into()))?;
    let header = std::str::from_utf8(&raw[..nul])
        .map_err(|_| GitError::Corrupt("object header is not valid utf-8".into()))?;
    let mut parts = header.splitn(2, ' ');
    let kind = parts.next().unwrap_or_default();
    if kind != expect_kind {
        return Err(GitError::Corrupt(format!(
            "expected {expect_kind} object, found {kind}"
        )));
    }
    Ok(raw[nul + 1..].to_vec())
}

fn parse_tree_body(body: &[u8]) -> Result<Tree> {
    use crate::objects::tree::{Mode, TreeRecord};

    let mut records = Vec::new();
    let mut pos = 0;
    while pos < body.len() {
        let sp = body[pos..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| GitError::Corrupt("tree entry missing mode separator".into()))?;
        let mode_str = std::str::from_utf8(&body[pos..pos + sp])
            .map_err(|_| GitError::Corrupt("tree mode is not valid utf-8".into()))?;
        let mode = match mode_str {
            "100644" => Mode::Regular,
            "100755" => Mode::Executable,
            "40000" => Mode::Directory,
            other => return Err(GitError::Corrupt(format!("unknown tree mode {other}"))),
        };
        pos += sp + 1;

        let nul = body[pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| GitError::Corrupt("tree entry missing name terminator".into()))?;
        let name = std::str::from_utf8(&body[pos..pos + nul])
            .map_err(|_| GitError::Corrupt("tree entry name is not valid utf-8".into()))?
            .to_string();
        pos += nul + 1;

        if pos + Oid::LEN > body.len() {
            return Err(GitError::Corrupt("tree entry truncated oid".into()));
        }
        let oid = Oid::from_slice(&body[pos..pos + Oid::LEN])?;
        pos += Oid::LEN;

        records.push(TreeRecord { mode, name, oid });
    }

    Ok(Tree { records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_backend::memory::MemoryBackend;

    #[test]
    fn store_then_read_round_trips_bytes() {
        let fs = MemoryBackend::new();
        let store = ObjectStore::new(&fs, Path::new(".git/objects"));

        let oid = store.store(&Object::Blob(b"hello".to_vec())).unwrap();
        assert_eq!(oid.to_hex(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert_eq!(store.read_blob(oid).unwrap(), b"hello");
    }

    #[test]
    fn path_is_keyed_by_hash_prefix() {
        let fs = MemoryBackend::new();
        let store = ObjectStore::new(&fs, Path::new(".git/objects"));
        let oid = store.store(&Object::Blob(b"hello".to_vec())).unwrap();

        let hex = oid.to_hex();
        let expected = Path::new(".git/objects").join(&hex[..2]).join(&hex[2..]);
        assert_eq!(store.path_for(oid), expected);
        assert!(fs.exists(&expected));
    }

    #[test]
    fn restoring_same_content_is_a_noop() {
        let fs = MemoryBackend::new();
        let store = ObjectStore::new(&fs, Path::new(".git/objects"));

        let oid1 = store.store(&Object::Blob(b"same".to_vec())).unwrap();
        let raw1 = fs.read_all(&store.path_for(oid1)).unwrap();

        let oid2 = store.store(&Object::Blob(b"same".to_vec())).unwrap();
        let raw2 = fs.read_all(&store.path_for(oid2)).unwrap();

        assert_eq!(oid1, oid2);
        assert_eq!(raw1, raw2);
    }
}
