use crate::hash::Oid;

/// A single commit author/committer stamp: `<name> <email> <unix-seconds>
/// <±HHMM>`. This system uses the same stamp for both author and committer
/// lines, since it never distinguishes authored-vs-committed identity.
#[derive(Debug, Clone)]
pub struct Stamp {
    pub name: String,
    pub email: String,
    pub timestamp: i64,
    pub tz_offset_minutes: i32,
}

impl Stamp {
    fn format(&self) -> String {
        let sign = if self.tz_offset_minutes < 0 { '-' } else { '+' };
        let abs_minutes = self.tz_offset_minutes.unsigned_abs();
        let hh = abs_minutes / 60;
        let mm = abs_minutes % 60;
        format!(
            "{} <{}> {} {}{:02}{:02}",
            self.name, self.email, self.timestamp, sign, hh, mm
        )
    }
}

/// The structured field list that makes up a commit object body.
#[derive(Debug, Clone)]
pub struct CommitFields {
    pub tree: Oid,
    pub parent: Option<Oid>,
    pub stamp: Stamp,
    pub message: String,
}

impl CommitFields {
    pub fn serialize_body(&self) -> Vec<u8> {
        let mut lines = Vec::new();
        lines.push(format!("tree {}", self.tree.to_hex()));
        if let Some(parent) = self.parent {
            lines.push(format!("parent {}", parent.to_hex()));
        }
        lines.push(format!("author {}", self.stamp.format()));
        lines.push(format!("committer {}", self.stamp.format()));
        lines.push(String::new());

        let mut message = self.message.clone();
        if !message.ends_with('\n') {
            message.push('\n');
        }

        let mut body = lines.join("\n").into_bytes();
        body.push(b'\n');
        body.extend_from_slice(message.as_bytes());
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Object;

    fn stamp() -> Stamp {
        Stamp {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            timestamp: 1_700_000_000,
            tz_offset_minutes: -300,
        }
    }

    #[test]
    fn root_commit_has_no_parent_line() {
        let fields = CommitFields {
            tree: Oid::from_hex("b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0").unwrap(),
            parent: None,
            stamp: stamp(),
            message: "initial commit".into(),
        };
        let body = String::from_utf8(fields.serialize_body()).unwrap();
        assert!(body.starts_with("tree b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0\n"));
        assert!(!body.contains("parent "));
        assert!(body.contains("author Ada Lovelace <ada@example.com> 1700000000 -0500"));
        assert!(body.ends_with("initial commit\n"));
    }

    #[test]
    fn second_commit_references_parent_oid() {
        let parent_oid = Oid::from_hex("04fea06420ca60892f73becee3614f6d023a4b7f").unwrap();
        let fields = CommitFields {
            tree: Oid::from_hex("b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0").unwrap(),
            parent: Some(parent_oid),
            stamp: stamp(),
            message: "second commit".into(),
        };
        let body = String::from_utf8(fields.serialize_body()).unwrap();
        assert!(body.contains(&format!("parent {}\n", parent_oid.to_hex())));
    }

    #[test]
    fn serialized_object_has_commit_header() {
        let fields = CommitFields {
            tree: Oid::from_hex("b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0").unwrap(),
            parent: None,
            stamp: stamp(),
            message: "hello".into(),
        };
        let serialized = Object::Commit(fields).serialize();
        assert!(serialized.starts_with(b"commit "));
    }
}
