//! Property-based tests for the node header codec and the outline engine

use chrono::{TimeZone, Utc};
use proptest::collection::{btree_set, vec};
use proptest::option;
use proptest::prelude::*;
use quire::core::frontmatter::{parse, serialize, RESERVED_KEYS};
use quire::core::{validate_target, validate_text_field};
use quire::{BinderMutator, Frontmatter, MutationParams, OutlineBinder, Position};

fn header_strategy() -> impl Strategy<Value = Frontmatter> {
    (
        "[a-z0-9][a-z0-9_-]{0,40}",
        option::of("[A-Za-z0-9 ,.:'\"#!?é✓-]{0,40}"),
        option::of("[A-Za-z0-9 ,.:'\"#!?é✓-]{0,120}"),
        0i64..4_000_000_000,
        0i64..1_000_000,
    )
        .prop_map(|(id, title, synopsis, created, delta)| {
            let created = Utc.timestamp_opt(created, 0).unwrap();
            let mut header =
                Frontmatter::new(validate_target(&id).unwrap(), title, synopsis, created);
            header.touch(created + chrono::Duration::seconds(delta));
            header
        })
}

/// Headers a caller could build by hand: blank optional fields and `extra`
/// entries that collide with the named fields
fn raw_header_strategy() -> impl Strategy<Value = Frontmatter> {
    (
        header_strategy(),
        any::<bool>(),
        any::<bool>(),
        btree_set(
            prop_oneof![
                prop::sample::select(RESERVED_KEYS.to_vec()).prop_map(str::to_string),
                "[a-z]{1,10}",
            ],
            0..6,
        ),
    )
        .prop_map(|(mut header, blank_title, blank_synopsis, keys)| {
            if blank_title {
                header.title = Some(String::new());
            }
            if blank_synopsis {
                header.synopsis = Some(String::new());
            }
            for key in keys {
                let value = serde_yaml::Value::from(format!("{}-value", key));
                header.extra.insert(key, value);
            }
            header
        })
}

proptest! {
    /// Serialize then parse gives back the same header and the exact body bytes.
    #[test]
    fn header_round_trip_preserves_body(
        header in header_strategy(),
        body in vec(any::<u8>(), 0..256)
    ) {
        let mut content = serialize(&header).unwrap();
        content.extend_from_slice(&body);

        let (parsed, parsed_body) = parse(&content).unwrap();
        prop_assert_eq!(&parsed, &header);
        prop_assert_eq!(parsed_body, &body[..]);
        prop_assert!(parsed.updated >= parsed.created);
    }

    /// Hand-built headers read back in their normalized form, never as a
    /// parse error.
    #[test]
    fn raw_header_round_trip_normalizes(
        header in raw_header_strategy(),
        body in vec(any::<u8>(), 0..64)
    ) {
        let mut content = serialize(&header).unwrap();
        content.extend_from_slice(&body);

        let (parsed, parsed_body) = parse(&content).unwrap();
        prop_assert_eq!(&parsed, &header.clone().normalized());
        prop_assert_eq!(parsed_body, &body[..]);
        prop_assert_eq!(&parsed.id, &header.id);
        prop_assert_eq!(parsed.clone().normalized(), parsed);
    }

    /// Empty optional fields never show up as keys.
    #[test]
    fn empty_optional_fields_are_omitted(header in header_strategy()) {
        let text = String::from_utf8(serialize(&header).unwrap()).unwrap();
        prop_assert_eq!(text.contains("\ntitle:"), header.title.is_some());
        prop_assert_eq!(text.contains("\nsynopsis:"), header.synopsis.is_some());
    }

    /// Any control character anywhere in a text field is rejected.
    #[test]
    fn control_characters_are_rejected(
        prefix in "[a-z ]{0,20}",
        control in prop::sample::select(vec!['\n', '\t', '\r', '\u{0}', '\u{1b}', '\u{7f}', '\u{85}']),
        suffix in "[a-z ]{0,20}"
    ) {
        let value = format!("{}{}{}", prefix, control, suffix);
        prop_assert!(validate_text_field("title", &value, 500).is_err());
    }

    /// Inserting a reference only adds one line; every other byte is kept.
    #[test]
    fn outline_insert_keeps_existing_lines(
        ids in btree_set("[a-z]{1,8}", 0..10),
        index in 0usize..12
    ) {
        let mut original = String::from("# Draft\n\n");
        for id in &ids {
            original.push_str(&format!("- [{}]({}.md)\n", id, id));
        }

        let params = MutationParams {
            parent: None,
            target: "fresh-node.md".to_string(),
            title: "Fresh".to_string(),
            position: Position::At(index),
            force: false,
        };
        let result = OutlineBinder::new().add_reference(original.as_bytes(), &params).unwrap();
        prop_assert!(result.changed);
        prop_assert!(!result.has_error());

        let updated = String::from_utf8(result.bytes).unwrap();
        let inserted = "- [Fresh](fresh-node.md)\n";
        prop_assert_eq!(updated.matches(inserted).count(), 1);
        prop_assert_eq!(updated.replacen(inserted, "", 1), original);

        let references = OutlineBinder::references(updated.as_bytes()).unwrap();
        let position = references.iter().position(|r| r == "fresh-node.md").unwrap();
        prop_assert_eq!(position, index.min(ids.len()));
    }
}
