use sha1::{Digest, Sha1};

/// A 20-byte SHA-1 object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid([u8; 20]);

impl Oid {
    pub const LEN: usize = 20;

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Oid(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> crate::error::Result<Self> {
        if bytes.len() != Self::LEN {
            return Err(crate::error::GitError::Invariant(format!(
                "invalid oid length: expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut buf = [0u8; 20];
        buf.copy_from_slice(bytes);
        Ok(Oid(buf))
    }

    pub fn from_hex(hex_str: &str) -> crate::error::Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| crate::error::GitError::Corrupt(format!("invalid hex oid: {e}")))?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First two hex characters: the object-directory prefix.
    pub fn dir_prefix(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// Remaining 38 hex characters: the filename within the prefix directory.
    pub fn file_suffix(&self) -> String {
        hex::encode(&self.0[1..])
    }

    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Produces the 20-byte SHA-1 of a complete byte buffer. Internal callers
/// always hash whole buffers (a serialised object, an index without its
/// trailing checksum) so no streaming API is exposed.
pub fn sha1(bytes: &[u8]) -> Oid {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut buf = [0u8; 20];
    buf.copy_from_slice(&digest);
    Oid(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_hash_matches_known_value() {
        let content = b"blob 5\0hello";
        let oid = sha1(content);
        assert_eq!(oid.to_hex(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    }

    #[test]
    fn hex_round_trip() {
        let oid = sha1(b"anything");
        let back = Oid::from_hex(&oid.to_hex()).unwrap();
        assert_eq!(oid, back);
    }

    #[test]
    fn dir_prefix_and_suffix_split_at_two_chars() {
        let oid = Oid::from_hex("b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0").unwrap();
        assert_eq!(oid.dir_prefix(), "b6");
        assert_eq!(oid.file_suffix(), "fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    }
}
