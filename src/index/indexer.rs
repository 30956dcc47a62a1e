use std::path::{Path, PathBuf};

use tracing::info;

use crate::atomic::AtomicWriter;
use crate::error::Result;
use crate::fs_backend::FsBackend;
use crate::index::Index;
use crate::objects::{store::ObjectStore, Object};

use super::entry::Entry;

/// Loads the index, applies a batch of adds with file<->directory conflict
/// cleanup, re-encodes, and rewrites it atomically. Owns `<gitdir>/index`.
pub struct Indexer<'a> {
    fs: &'a dyn FsBackend,
    store: &'a ObjectStore<'a>,
    index_path: PathBuf,
    root_dir: PathBuf,
}

impl<'a> Indexer<'a> {
    pub fn new(
        fs: &'a dyn FsBackend,
        store: &'a ObjectStore<'a>,
        index_path: &Path,
        root_dir: &Path,
    ) -> Self {
        Indexer {
            fs,
            store,
            index_path: index_path.to_path_buf(),
            root_dir: root_dir.to_path_buf(),
        }
    }

    /// Reads and decodes the current index, or an empty one if the file
    /// does not exist yet.
    pub fn load(&self) -> Result<Index> {
        if !self.fs.exists(&self.index_path) {
            return Ok(Index::empty());
        }
        let bytes = self.fs.read_all(&self.index_path)?;
        Index::decode(&bytes)
    }

    /// Stages `repo_relative_paths`: blobs every file, merges the resulting
    /// entries into the loaded index with conflict cleanup, and atomically
    /// rewrites `index`. Returns the index as written.
    pub fn add(&self, repo_relative_paths: &[String]) -> Result<Index> {
        let mut index = self.load()?;

        for rel in repo_relative_paths {
            let entry = self.stage_one(rel)?;
            index.resolve_conflicts_for(rel);
            index.insert(entry);
        }

        let encoded = index.encode();
        AtomicWriter::new(self.fs).write(&self.index_path, &encoded)?;
        info!(entries = index.entries().count(), "index updated");

        Ok(index)
    }

    fn stage_one(&self, repo_relative_path: &str) -> Result<Entry> {
        let abs_path = self.root_dir.join(repo_relative_path);
        let bytes = self.fs.read_all(&abs_path)?;
        let oid = self.store.store(&Object::Blob(bytes))?;
        let stat = self.fs.stat(&abs_path)?;
        Ok(Entry::new(repo_relative_path.to_string(), stat, oid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_backend::memory::MemoryBackend;

    fn setup() -> (MemoryBackend, PathBuf, PathBuf) {
        let fs = MemoryBackend::new();
        fs.seed("/repo/hello.txt", b"hello".to_vec(), false);
        fs.seed("/repo/world.txt", b"world".to_vec(), false);
        (fs, PathBuf::from("/repo/.git/index"), PathBuf::from("/repo"))
    }

    #[test]
    fn add_two_files_produces_sorted_entries_with_blob_oids() {
        let (fs, index_path, root) = setup();
        let store = ObjectStore::new(&fs, Path::new("/repo/.git/objects"));
        let indexer = Indexer::new(&fs, &store, &index_path, &root);

        let index = indexer
            .add(&["hello.txt".to_string(), "world.txt".to_string()])
            .unwrap();

        let paths: Vec<&str> = index.entries().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["hello.txt", "world.txt"]);

        let hello = index.get("hello.txt").unwrap();
        assert_eq!(hello.oid, crate::objects::blob_oid(b"hello"));
        assert_eq!(hello.mode, 0o100644);

        let on_disk = fs.read_all(&index_path).unwrap();
        assert_eq!(&on_disk[0..4], b"DIRC");
        assert_eq!(&on_disk[4..8], &[0, 0, 0, 2]);
        assert_eq!(&on_disk[8..12], &[0, 0, 0, 2]);
    }

    #[test]
    fn staging_file_under_previously_tracked_file_replaces_it() {
        let (fs, index_path, root) = setup();
        fs.seed("/repo/hello.txt/nested.txt", b"nested".to_vec(), false);
        let store = ObjectStore::new(&fs, Path::new("/repo/.git/objects"));
        let indexer = Indexer::new(&fs, &store, &index_path, &root);

        indexer
            .add(&["hello.txt".to_string(), "world.txt".to_string()])
            .unwrap();
        let index = indexer
            .add(&["hello.txt/nested.txt".to_string()])
            .unwrap();

        let paths: Vec<&str> = index.entries().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["hello.txt/nested.txt", "world.txt"]);
    }

    #[test]
    fn staging_directory_path_as_file_replaces_its_children() {
        let fs = MemoryBackend::new();
        fs.seed("/repo/a/b.txt", b"b".to_vec(), false);
        fs.seed("/repo/a/c.txt", b"c".to_vec(), false);
        fs.seed("/repo/a", b"now a file".to_vec(), false);
        let index_path = PathBuf::from("/repo/.git/index");
        let root = PathBuf::from("/repo");
        let store = ObjectStore::new(&fs, Path::new("/repo/.git/objects"));
        let indexer = Indexer::new(&fs, &store, &index_path, &root);

        indexer
            .add(&["a/b.txt".to_string(), "a/c.txt".to_string()])
            .unwrap();
        let index = indexer.add(&["a".to_string()]).unwrap();

        let paths: Vec<&str> = index.entries().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a"]);
    }

    #[test]
    fn readding_same_path_is_a_noop_beyond_metadata() {
        let (fs, index_path, root) = setup();
        let store = ObjectStore::new(&fs, Path::new("/repo/.git/objects"));
        let indexer = Indexer::new(&fs, &store, &index_path, &root);

        indexer.add(&["hello.txt".to_string()]).unwrap();
        let index = indexer.add(&["hello.txt".to_string()]).unwrap();

        assert_eq!(index.entries().count(), 1);
    }
}
