//! Node file header codec
//!
//! A node file is a YAML header between two `---` lines followed by an opaque
//! body:
//!
//! ```text
//! ---
//! id: 0b9e1c2a-4f53-4d1e-9a65-2f0c8d1e7a10
//! title: Chapter One
//! created: 2024-05-01T09:30:00Z
//! updated: 2024-05-01T09:30:00Z
//! ---
//! body bytes, never interpreted
//! ```
//!
//! The body is carried as raw bytes so that whatever an editor wrote after the
//! header survives a parse/serialize cycle untouched.

use crate::core::ids::NodeId;
use crate::error::{QuireError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

const DELIMITER: &str = "---";

/// Header keys owned by [`Frontmatter`]'s own fields
pub const RESERVED_KEYS: [&str; 5] = ["id", "title", "synopsis", "created", "updated"];

/// Structured header of a node file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    pub id: NodeId,
    #[serde(
        default,
        skip_serializing_if = "is_blank",
        deserialize_with = "empty_as_none"
    )]
    pub title: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "is_blank",
        deserialize_with = "empty_as_none"
    )]
    pub synopsis: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Keys a user added by hand; kept so a refresh does not drop them
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

impl Frontmatter {
    /// Header for a node created at `now`; `created == updated`.
    pub fn new(
        id: NodeId,
        title: Option<String>,
        synopsis: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.filter(|s| !s.is_empty()),
            synopsis: synopsis.filter(|s| !s.is_empty()),
            created: now,
            updated: now,
            extra: BTreeMap::new(),
        }
    }

    /// The header as it reads back after a write: blank optional fields
    /// become `None` and `extra` entries that shadow a named field are
    /// dropped.
    ///
    /// Headers built with [`Frontmatter::new`] or parsed from disk are
    /// already normalized.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.filter(|s| !s.is_empty());
        self.synopsis = self.synopsis.filter(|s| !s.is_empty());
        self.extra.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));
        self
    }

    /// Stamp a new `updated` time. Never moves backwards and never precedes
    /// `created`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated = now.max(self.updated).max(self.created);
    }
}

/// A parsed node file
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFile {
    pub frontmatter: Frontmatter,
    pub body: Vec<u8>,
}

impl NodeFile {
    pub fn new(frontmatter: Frontmatter, body: impl Into<Vec<u8>>) -> Self {
        Self {
            frontmatter,
            body: body.into(),
        }
    }

    pub fn parse(content: &[u8]) -> Result<Self> {
        let (frontmatter, body) = parse(content)?;
        Ok(Self::new(frontmatter, body))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = serialize(&self.frontmatter)?;
        bytes.extend_from_slice(&self.body);
        Ok(bytes)
    }
}

/// Serialize a header block, delimiters included.
///
/// Empty optional fields are left out entirely, and the named fields win over
/// same-named `extra` entries, so `parse` always returns
/// `frontmatter.normalized()`.
pub fn serialize(frontmatter: &Frontmatter) -> Result<Vec<u8>> {
    let yaml = if frontmatter
        .extra
        .keys()
        .any(|key| RESERVED_KEYS.contains(&key.as_str()))
    {
        serde_yaml::to_string(&frontmatter.clone().normalized())?
    } else {
        serde_yaml::to_string(frontmatter)?
    };
    let yaml = yaml.strip_prefix("---\n").unwrap_or(&yaml);
    Ok(format!("{}\n{}{}\n", DELIMITER, yaml, DELIMITER).into_bytes())
}

/// Split a node file into its header and body.
///
/// The body is everything after the line that closes the header, byte for
/// byte.
pub fn parse(content: &[u8]) -> Result<(Frontmatter, &[u8])> {
    let (header, body) = split_header(content)?;

    let header = std::str::from_utf8(header)
        .map_err(|e| QuireError::parse("malformed header", format!("not valid UTF-8: {}", e)))?;

    let frontmatter = serde_yaml::from_str::<Frontmatter>(header)
        .map_err(|e| QuireError::parse("malformed header", e.to_string()))?;

    Ok((frontmatter, body))
}

fn split_header(content: &[u8]) -> Result<(&[u8], &[u8])> {
    let mut lines = content.split_inclusive(|b| *b == b'\n');

    let opening = lines
        .next()
        .filter(|line| is_delimiter(line))
        .ok_or_else(|| QuireError::parse("missing header", "no opening '---' line"))?;

    let header_start = opening.len();
    let mut offset = header_start;
    for line in lines {
        if is_delimiter(line) {
            return Ok((&content[header_start..offset], &content[offset + line.len()..]));
        }
        offset += line.len();
    }

    Err(QuireError::parse(
        "malformed header",
        "no closing '---' line",
    ))
}

fn is_delimiter(line: &[u8]) -> bool {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line == DELIMITER.as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    fn sample() -> Frontmatter {
        Frontmatter::new(
            NodeId::new_unchecked("node-1"),
            Some("Chapter One".to_string()),
            Some("Where it begins".to_string()),
            t0(),
        )
    }

    #[test]
    fn test_serialize_layout() {
        let text = String::from_utf8(serialize(&sample()).unwrap()).unwrap();
        assert_eq!(
            text,
            "---\n\
             id: node-1\n\
             title: Chapter One\n\
             synopsis: Where it begins\n\
             created: 2024-05-01T09:30:00Z\n\
             updated: 2024-05-01T09:30:00Z\n\
             ---\n"
        );
    }

    #[test]
    fn test_optional_fields_omitted_when_empty() {
        let mut fm = Frontmatter::new(NodeId::new_unchecked("n"), None, None, t0());
        let text = String::from_utf8(serialize(&fm).unwrap()).unwrap();
        assert!(!text.contains("title"));
        assert!(!text.contains("synopsis"));
        assert!(text.contains("id: n\n"));
        assert!(text.contains("created: "));
        assert!(text.contains("updated: "));

        fm.title = Some(String::new());
        let text = String::from_utf8(serialize(&fm).unwrap()).unwrap();
        assert!(!text.contains("title"));
    }

    #[test]
    fn test_round_trip_preserves_body_bytes() {
        let fm = sample();
        let body: &[u8] = b"\n# Heading\r\n\n---\nnot a header\n\xff\xfe trailing";
        let mut content = serialize(&fm).unwrap();
        content.extend_from_slice(body);

        let (parsed, parsed_body) = parse(&content).unwrap();
        assert_eq!(parsed, fm);
        assert_eq!(parsed_body, body);
    }

    #[test]
    fn test_parse_empty_body() {
        let content = serialize(&sample()).unwrap();
        let (_, body) = parse(&content).unwrap();
        assert!(body.is_empty());

        // closing delimiter without a trailing newline
        let trimmed = &content[..content.len() - 1];
        let (_, body) = parse(trimmed).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_parse_crlf_delimiters() {
        let content = b"---\r\nid: a\r\ncreated: 2024-05-01T09:30:00Z\r\nupdated: 2024-05-01T09:30:00Z\r\n---\r\nbody\r\n";
        let (fm, body) = parse(content).unwrap();
        assert_eq!(fm.id.as_str(), "a");
        assert_eq!(body, b"body\r\n");
    }

    #[test]
    fn test_parse_keeps_extra_keys() {
        let content = b"---\nid: a\ntitle: T\ncreated: 2024-05-01T09:30:00Z\nupdated: 2024-05-01T09:30:00Z\nstatus: draft\n---\n";
        let node = NodeFile::parse(content).unwrap();
        assert_eq!(
            node.frontmatter.extra.get("status"),
            Some(&serde_yaml::Value::String("draft".to_string()))
        );

        let again = NodeFile::parse(&node.to_bytes().unwrap()).unwrap();
        assert_eq!(again, node);
    }

    #[test]
    fn test_parse_missing_header() {
        let err = parse(b"just prose\n").unwrap_err();
        assert!(matches!(err, QuireError::Parse { ref context, .. } if context == "missing header"));

        assert!(parse(b"").is_err());
    }

    #[test]
    fn test_parse_malformed_header() {
        let cases: [&[u8]; 5] = [
            b"---\nid: a\ncreated: 2024-05-01T09:30:00Z\n",
            b"---\nid: [unclosed\n---\n",
            b"---\ntitle: no id\ncreated: 2024-05-01T09:30:00Z\nupdated: 2024-05-01T09:30:00Z\n---\n",
            b"---\nid: a\ncreated: yesterday\nupdated: 2024-05-01T09:30:00Z\n---\n",
            b"---\n\xff: a\n---\n",
        ];
        for bad in cases {
            let err = parse(bad).unwrap_err();
            assert!(
                matches!(err, QuireError::Parse { ref context, .. } if context == "malformed header"),
                "unexpected error {:?}",
                err
            );
        }
    }

    #[test]
    fn test_reserved_extra_keys_do_not_duplicate_fields() {
        let mut header = sample();
        header
            .extra
            .insert("id".to_string(), serde_yaml::Value::from("other"));
        header
            .extra
            .insert("status".to_string(), serde_yaml::Value::from("draft"));

        let content = serialize(&header).unwrap();
        let text = String::from_utf8(content.clone()).unwrap();
        assert_eq!(text.matches("\nid: ").count(), 1);

        let (parsed, _) = parse(&content).unwrap();
        assert_eq!(parsed.id.as_str(), "node-1");
        assert_eq!(parsed, header.normalized());
        assert_eq!(parsed.extra.len(), 1);
    }

    #[test]
    fn test_blank_optional_fields_read_back_as_none() {
        let mut header = sample();
        header.title = Some(String::new());
        header.synopsis = Some(String::new());

        let (parsed, _) = parse(&serialize(&header).unwrap()).unwrap();
        assert_eq!(parsed.title, None);
        assert_eq!(parsed.synopsis, None);
        assert_eq!(parsed, header.normalized());
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut fm = sample();
        let later = t0() + chrono::Duration::minutes(5);
        fm.touch(later);
        assert_eq!(fm.updated, later);
        assert_eq!(fm.created, t0());

        fm.touch(t0() - chrono::Duration::days(1));
        assert_eq!(fm.updated, later);
    }

    #[test]
    fn test_quoting_survives_round_trip() {
        let mut fm = sample();
        fm.title = Some("true".to_string());
        fm.synopsis = Some("--- a: b # not a comment".to_string());
        let content = serialize(&fm).unwrap();
        let (parsed, _) = parse(&content).unwrap();
        assert_eq!(parsed, fm);
    }
}
