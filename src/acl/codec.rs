//! Field-name codec.
//!
//! Document field names cannot contain every character an ACL identifier
//! may use (`.` in particular), so keys and values are percent-encoded
//! before they are written and decoded when read back.
//!
//! The escape set matches URI-component encoding: ASCII alphanumerics and
//! `- _ ! ~ * ' ( )` pass through, every other byte of the UTF-8 form
//! becomes `%XX`. Unlike URI-component encoding, `.` is escaped too, as
//! `%2E`, which plain percent-decoding already reverses.
//!
//! ```rust
//! use acl_docstore::acl::codec::{decode_text, encode_text};
//!
//! let encoded = encode_text("photos.read all");
//! assert_eq!(encoded, "photos%2Eread%20all");
//! assert_eq!(decode_text(&encoded).unwrap(), "photos.read all");
//! ```

use crate::acl::RESERVED_FIELDS;
use crate::acl::ValueSet;
use crate::document::Document;
use crate::error::{Error, Result};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::sync::LazyLock;

/// Bytes escaped by [`encode_text`]. `.` stays in the set.
const FIELD_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static SEPARATOR_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s/\\]+").unwrap());

/// Encode text so it is usable as a document field name
pub fn encode_text(text: &str) -> String {
    utf8_percent_encode(text, FIELD_NAME).to_string()
}

/// Reverse [`encode_text`]
pub fn decode_text(text: &str) -> Result<String> {
    percent_decode_str(text)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| Error::Codec(format!("cannot decode {:?}: {}", text, e)))
}

/// Encode every value
pub fn encode_all<'a, I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().map(encode_text).collect()
}

/// Turn a bucket name into a collection name.
///
/// Unless `raw` is set, the name is percent-decoded and every run of
/// whitespace, `/` or `\` collapses to a single `_`.
pub fn sanitize_collection_name(name: &str, raw: bool) -> Result<String> {
    if raw {
        return Ok(name.to_string());
    }

    let decoded = decode_text(name)?;
    Ok(SEPARATOR_RUNS.replace_all(&decoded, "_").into_owned())
}

/// Decode the member fields of a key document into a value set.
///
/// Reserved fields are skipped, as are members whose value is not truthy.
pub fn decode_members(doc: &Document) -> Result<ValueSet> {
    doc.iter()
        .filter(|(name, value)| !RESERVED_FIELDS.contains(&name.as_str()) && value.is_truthy())
        .map(|(name, _)| decode_text(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Datum;
    use proptest::prelude::*;

    #[test]
    fn test_encode_escapes_dots_and_reserved_chars() {
        assert_eq!(encode_text("plain"), "plain");
        assert_eq!(encode_text("a.b.c"), "a%2Eb%2Ec");
        assert_eq!(encode_text("a b/c?d"), "a%20b%2Fc%3Fd");
        assert_eq!(encode_text("-_!~*'()"), "-_!~*'()");
        assert_eq!(encode_text("$set"), "%24set");
        assert_eq!(encode_text("100%"), "100%25");
    }

    #[test]
    fn test_encode_utf8() {
        assert_eq!(encode_text("é"), "%C3%A9");
        assert_eq!(decode_text("%C3%A9").unwrap(), "é");
    }

    #[test]
    fn test_roundtrip() {
        for s in [
            "",
            "users",
            "users.admin",
            "..",
            "%2E",
            "a%b",
            "with space\tand\nnewlines",
            "/api/v1/blogs/:id",
            "ключ.значение",
            "emoji 🚀.rocket",
        ] {
            assert_eq!(decode_text(&encode_text(s)).unwrap(), s, "roundtrip of {:?}", s);
        }
    }

    proptest! {
        #[test]
        fn roundtrip_any_string(s in any::<String>()) {
            let encoded = encode_text(&s);
            prop_assert!(!encoded.contains('.'));
            prop_assert!(!encoded.contains('$'));
            prop_assert_eq!(decode_text(&encoded).unwrap(), s);
        }
    }

    #[test]
    fn test_encoded_has_no_dots_or_dollars() {
        let encoded = encode_text("$a.b$.c");
        assert!(!encoded.contains('.'));
        assert!(!encoded.contains('$'));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let err = decode_text("%FF%FE").unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_encode_all() {
        assert_eq!(encode_all(["a.b", "c"]), vec!["a%2Eb", "c"]);
    }

    #[test]
    fn test_sanitize_collection_name() {
        assert_eq!(sanitize_collection_name("users", false).unwrap(), "users");
        assert_eq!(
            sanitize_collection_name("meta data/roles", false).unwrap(),
            "meta_data_roles"
        );
        assert_eq!(sanitize_collection_name("a \t /\\ b", false).unwrap(), "a_b");
        assert_eq!(
            sanitize_collection_name("allows%20users", false).unwrap(),
            "allows_users"
        );
        assert_eq!(
            sanitize_collection_name("allows%20users", true).unwrap(),
            "allows%20users"
        );
    }

    #[test]
    fn test_decode_members() {
        let doc: Document = [
            ("_id", Datum::from("6f1c")),
            ("_bucketname", Datum::from("users")),
            ("key", Datum::from("joe")),
            ("a%2Eb", Datum::Boolean(true)),
            ("plain", Datum::Boolean(true)),
            ("gone", Datum::Boolean(false)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let members = decode_members(&doc).unwrap();
        assert_eq!(
            members.into_iter().collect::<Vec<_>>(),
            vec!["a.b".to_string(), "plain".to_string()]
        );
    }
}
