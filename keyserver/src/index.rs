//! Machine-readable index (`options=mr`) parsing.
//!
//! ```text
//! info:1:1
//! pub:<keyid>:<algo>:<keylen>:<created>:<expires>:<flags>
//! uid:<escaped uid>:<created>:<expires>:<flags>
//! ```
//!
//! Every field after the record type may be empty. User ids escape `:`,
//! `%` and non-ASCII bytes as `%XX`.

use serde::Serialize;

use crate::KeyserverError;

/// One `pub:` record and the `uid:` records that follow it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    /// Fingerprint or key id as returned by the server, upper-cased.
    pub key_id: String,
    pub algorithm: Option<u32>,
    pub key_len: Option<u32>,
    pub created: Option<u64>,
    pub expires: Option<u64>,
    pub flags: String,
    pub user_ids: Vec<String>,
}

impl IndexEntry {
    pub fn is_revoked(&self) -> bool {
        self.flags.contains('r')
    }

    pub fn is_expired(&self) -> bool {
        self.flags.contains('e')
    }

    /// The first listed user id, which keyservers report as primary.
    pub fn primary_user_id(&self) -> Option<&str> {
        self.user_ids.first().map(String::as_str)
    }
}

fn optional<T: std::str::FromStr>(field: Option<&str>) -> Option<T> {
    field.filter(|f| !f.is_empty()).and_then(|f| f.parse().ok())
}

fn unescape(field: &str) -> String {
    let raw = field.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' && i + 2 < raw.len() {
            let decoded = std::str::from_utf8(&raw[i + 1..i + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse an `op=index&options=mr` response body.
///
/// `uid:` records before any `pub:` record, or a `pub:` record without a key
/// id, make the response invalid. Unknown record types are skipped.
pub fn parse_index(body: &str) -> Result<Vec<IndexEntry>, KeyserverError> {
    let mut entries: Vec<IndexEntry> = Vec::new();
    for (line_no, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(':');
        match fields.next() {
            Some("pub") => {
                let key_id = fields.next().unwrap_or("").trim();
                if key_id.is_empty() {
                    return Err(KeyserverError::InvalidResponse(format!(
                        "line {}: pub record without key id",
                        line_no + 1
                    )));
                }
                entries.push(IndexEntry {
                    key_id: key_id.to_ascii_uppercase(),
                    algorithm: optional(fields.next()),
                    key_len: optional(fields.next()),
                    created: optional(fields.next()),
                    expires: optional(fields.next()),
                    flags: fields.next().unwrap_or("").to_string(),
                    user_ids: Vec::new(),
                });
            }
            Some("uid") => {
                let entry = entries.last_mut().ok_or_else(|| {
                    KeyserverError::InvalidResponse(format!(
                        "line {}: uid record before any pub record",
                        line_no + 1
                    ))
                })?;
                entry.user_ids.push(unescape(fields.next().unwrap_or("")));
            }
            _ => {}
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "info:1:2\n\
        pub:0123456789abcdef0123456789abcdef01234567:1:4096:1700000000::\n\
        uid:Alice Example <alice@example.org>:1700000000::\n\
        uid:Alice %3Cwork%3E %25 ops:1700000001::\n\
        pub:FEDCBA9876543210:22:256:1600000000:1650000000:er\n\
        uid:Bob:1600000000::r\n";

    #[test]
    fn parses_keys_and_user_ids() {
        let entries = parse_index(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);

        let alice = &entries[0];
        assert_eq!(alice.key_id, "0123456789ABCDEF0123456789ABCDEF01234567");
        assert_eq!(alice.algorithm, Some(1));
        assert_eq!(alice.key_len, Some(4096));
        assert_eq!(alice.created, Some(1_700_000_000));
        assert_eq!(alice.expires, None);
        assert_eq!(alice.primary_user_id(), Some("Alice Example <alice@example.org>"));
        assert_eq!(alice.user_ids[1], "Alice <work> % ops");
        assert!(!alice.is_revoked());

        let bob = &entries[1];
        assert_eq!(bob.expires, Some(1_650_000_000));
        assert!(bob.is_expired());
        assert!(bob.is_revoked());
    }

    #[test]
    fn empty_body_has_no_entries() {
        assert!(parse_index("").unwrap().is_empty());
        assert!(parse_index("info:1:0\n").unwrap().is_empty());
    }

    #[test]
    fn orphan_uid_is_invalid() {
        assert!(matches!(
            parse_index("uid:Nobody::\n"),
            Err(KeyserverError::InvalidResponse(_))
        ));
    }

    #[test]
    fn malformed_escapes_pass_through() {
        assert_eq!(unescape("100%"), "100%");
        assert_eq!(unescape("a%zzb"), "a%zzb");
        assert_eq!(unescape("caf%C3%A9"), "café");
    }
}
