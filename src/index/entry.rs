use crate::error::{GitError, Result};
use crate::fs_backend::FileStat;
use crate::hash::Oid;

pub const FIXED_PREFIX_LEN: usize = 62;
pub const MAX_PATH_SIZE: u16 = 0xfff;

const REGULAR_MODE: u32 = 0o100644;
const EXECUTABLE_MODE: u32 = 0o100755;

/// One tracked path: the fixed 62-byte stat-cache prefix plus a
/// NUL-terminated path, as described by the on-disk index layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub ctime_sec: u32,
    pub ctime_nsec: u32,
    pub mtime_sec: u32,
    pub mtime_nsec: u32,
    pub dev: u32,
    pub ino: u32,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub file_size: u32,
    pub oid: Oid,
    pub path: String,
}

impl Entry {
    pub fn new(path: String, stat: FileStat, oid: Oid) -> Self {
        let mode = if stat.executable {
            EXECUTABLE_MODE
        } else {
            REGULAR_MODE
        };

        Entry {
            ctime_sec: stat.ctime_sec,
            ctime_nsec: stat.ctime_nsec,
            mtime_sec: stat.mtime_sec,
            mtime_nsec: stat.mtime_nsec,
            dev: stat.dev,
            ino: stat.ino,
            mode,
            uid: stat.uid,
            gid: stat.gid,
            file_size: stat.size,
            oid,
            path,
        }
    }

    fn flags(&self) -> u16 {
        (self.path.len() as u16).min(MAX_PATH_SIZE)
    }

    /// Total on-disk record length including the NUL-terminator and padding
    /// to the next multiple of 8.
    fn padded_len(&self) -> usize {
        let natural = FIXED_PREFIX_LEN + self.path.len() + 1;
        let rem = natural % 8;
        if rem == 0 {
            natural
        } else {
            natural + (8 - rem)
        }
    }

    /// Encodes this entry's fixed prefix, path, NUL terminator, and padding.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ctime_sec.to_be_bytes());
        out.extend_from_slice(&self.ctime_nsec.to_be_bytes());
        out.extend_from_slice(&self.mtime_sec.to_be_bytes());
        out.extend_from_slice(&self.mtime_nsec.to_be_bytes());
        out.extend_from_slice(&self.dev.to_be_bytes());
        out.extend_from_slice(&self.ino.to_be_bytes());
        out.extend_from_slice(&self.mode.to_be_bytes());
        out.extend_from_slice(&self.uid.to_be_bytes());
        out.extend_from_slice(&self.gid.to_be_bytes());
        out.extend_from_slice(&self.file_size.to_be_bytes());
        out.extend_from_slice(self.oid.as_bytes());
        out.extend_from_slice(&self.flags().to_be_bytes());
        out.extend_from_slice(self.path.as_bytes());

        let natural = FIXED_PREFIX_LEN + self.path.len() + 1;
        let padded = self.padded_len();
        out.extend(std::iter::repeat(0u8).take(padded - natural + 1));
    }

    /// Decodes one entry starting at `data[0]`. Returns the entry and the
    /// number of bytes consumed (including padding), so the caller can
    /// advance to the next record.
    pub fn decode(data: &[u8]) -> Result<(Entry, usize)> {
        if data.len() < FIXED_PREFIX_LEN + 1 {
            return Err(GitError::Corrupt("truncated index entry prefix".into()));
        }

        let ctime_sec = be_u32(data, 0);
        let ctime_nsec = be_u32(data, 4);
        let mtime_sec = be_u32(data, 8);
        let mtime_nsec = be_u32(data, 12);
        let dev = be_u32(data, 16);
        let ino = be_u32(data, 20);
        let mode = be_u32(data, 24);
        let uid = be_u32(data, 28);
        let gid = be_u32(data, 32);
        let file_size = be_u32(data, 36);
        let oid = Oid::from_slice(&data[40..60])?;
        let flags = u16::from_be_bytes([data[60], data[61]]);

        let path_len_field = flags & MAX_PATH_SIZE;
        let path_start = FIXED_PREFIX_LEN;

        let path_len = if path_len_field < MAX_PATH_SIZE {
            path_len_field as usize
        } else {
            data[path_start..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| GitError::Corrupt("index entry path missing terminator".into()))?
        };

        if path_start + path_len > data.len() {
            return Err(GitError::Corrupt("index entry path out of bounds".into()));
        }

        let path = std::str::from_utf8(&data[path_start..path_start + path_len])
            .map_err(|_| GitError::Corrupt("index entry path is not valid utf-8".into()))?
            .to_string();

        let natural = FIXED_PREFIX_LEN + path_len + 1;
        let consumed = if natural % 8 == 0 {
            natural
        } else {
            natural + (8 - natural % 8)
        };

        if consumed > data.len() {
            return Err(GitError::Corrupt("index entry padding out of bounds".into()));
        }

        let entry = Entry {
            ctime_sec,
            ctime_nsec,
            mtime_sec,
            mtime_nsec,
            dev,
            ino,
            mode,
            uid,
            gid,
            file_size,
            oid,
            path,
        };

        Ok((entry, consumed))
    }
}

fn be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(path: &str) -> Entry {
        Entry {
            ctime_sec: 1,
            ctime_nsec: 2,
            mtime_sec: 3,
            mtime_nsec: 4,
            dev: 5,
            ino: 6,
            mode: REGULAR_MODE,
            uid: 7,
            gid: 8,
            file_size: 5,
            oid: crate::hash::sha1(b"blob 5\0hello"),
            path: path.to_string(),
        }
    }

    #[test]
    fn encoded_length_is_multiple_of_eight() {
        for path in ["a", "hello.txt", "a/b/c/d/e.rs", "x".repeat(17).as_str()] {
            let entry = sample_entry(path);
            let mut buf = Vec::new();
            entry.encode(&mut buf);
            assert_eq!(buf.len() % 8, 0, "path {path:?} produced unaligned record");
        }
    }

    #[test]
    fn decode_inverts_encode() {
        let entry = sample_entry("dir/file.txt");
        let mut buf = Vec::new();
        entry.encode(&mut buf);
        let (decoded, consumed) = Entry::decode(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, entry);
    }

    #[test]
    fn eight_aligned_natural_length_gets_minimal_padding() {
        // FIXED_PREFIX_LEN (62) + path_len + 1 == 64 when path_len == 1
        let entry = sample_entry("a");
        let mut buf = Vec::new();
        entry.encode(&mut buf);
        assert_eq!(buf.len(), 64);
    }
}
