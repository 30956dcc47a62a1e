pub mod entry;
pub mod indexer;

use std::collections::BTreeMap;

use crate::error::{GitError, Result};
use crate::hash::sha1;

pub use entry::Entry;
pub use indexer::Indexer;

const SIGNATURE: &[u8; 4] = b"DIRC";
const VERSION: u32 = 2;
const CHECKSUM_LEN: usize = 20;
const HEADER_LEN: usize = 12;

/// The staging index: a sorted, path-unique set of entries plus the
/// ancestor-directory map used to accelerate file/directory conflict
/// cleanup. The map is rebuilt on every load and discarded after every
/// write, so it never goes stale.
#[derive(Debug, Clone, Default)]
pub struct Index {
    entries: BTreeMap<String, Entry>,
    by_ancestor: BTreeMap<String, Vec<String>>,
}

impl Index {
    pub fn empty() -> Self {
        Index::default()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.by_ancestor.contains_key(prefix)
    }

    pub fn paths_under(&self, prefix: &str) -> &[String] {
        self.by_ancestor
            .get(prefix)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn remove(&mut self, path: &str) {
        self.entries.remove(path);
    }

    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.path.clone(), entry);
        self.rebuild_ancestor_map();
    }

    /// Conflict cleanup for a path about to be (re-)inserted, per the
    /// file<->directory replacement rule: every proper prefix of `path`
    /// that is itself a tracked file is removed (a file being replaced by
    /// a directory that contains it), and every prefix of `path`,
    /// including `path` itself, that is a tracked ancestor directory has
    /// its descendants removed (a directory being replaced by a file).
    pub fn resolve_conflicts_for(&mut self, path: &str) {
        let segments: Vec<&str> = path.split('/').collect();
        let mut acc = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if !acc.is_empty() {
                acc.push('/');
            }
            acc.push_str(segment);

            if let Some(children) = self.by_ancestor.get(&acc).cloned() {
                for child in children {
                    self.entries.remove(&child);
                }
            }

            let is_full_path = i == segments.len() - 1;
            if !is_full_path {
                self.entries.remove(&acc);
            }
        }
        self.rebuild_ancestor_map();
    }

    fn rebuild_ancestor_map(&mut self) {
        self.by_ancestor.clear();
        for path in self.entries.keys() {
            for prefix in ancestor_prefixes(path) {
                self.by_ancestor
                    .entry(prefix)
                    .or_default()
                    .push(path.clone());
            }
        }
    }

    /// Decodes a complete index file. An empty buffer decodes to an empty
    /// index (the "index file absent" case, normalised by the caller).
    pub fn decode(data: &[u8]) -> Result<Index> {
        if data.is_empty() {
            return Ok(Index::empty());
        }

        if data.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(GitError::Corrupt("index shorter than header + checksum".into()));
        }

        if &data[0..4] != SIGNATURE {
            return Err(GitError::Corrupt("index missing DIRC signature".into()));
        }

        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != VERSION {
            return Err(GitError::Corrupt(format!("unsupported index version {version}")));
        }

        let checksum_offset = data.len() - CHECKSUM_LEN;
        let expected = sha1(&data[..checksum_offset]);
        let trailing = &data[checksum_offset..];
        if expected.as_bytes().as_slice() != trailing {
            return Err(GitError::Corrupt("index checksum mismatch".into()));
        }

        let entry_count = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

        let mut index = Index::empty();
        let mut pos = HEADER_LEN;
        for _ in 0..entry_count {
            if pos >= checksum_offset {
                return Err(GitError::Corrupt("index truncated before declared entry count".into()));
            }
            let (entry, consumed) = Entry::decode(&data[pos..checksum_offset])?;
            index.entries.insert(entry.path.clone(), entry);
            pos += consumed;
        }

        if pos != checksum_offset {
            return Err(GitError::Corrupt("index has trailing bytes after last entry".into()));
        }

        index.rebuild_ancestor_map();
        Ok(index)
    }

    /// Encodes this index's entries (sorted by path, since `entries` is a
    /// `BTreeMap`) with header and trailing checksum.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(SIGNATURE);
        out.extend_from_slice(&VERSION.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        for entry in self.entries.values() {
            entry.encode(&mut out);
        }

        let checksum = sha1(&out);
        out.extend_from_slice(checksum.as_bytes());
        out
    }
}

/// `"a/b/c"` -> `["a", "a/b"]`: every proper, non-empty prefix directory.
fn ancestor_prefixes(path: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    let mut acc = String::new();
    let segments: Vec<&str> = path.split('/').collect();
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if !acc.is_empty() {
            acc.push('/');
        }
        acc.push_str(segment);
        prefixes.push(acc.clone());
    }
    prefixes
}
