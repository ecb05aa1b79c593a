//! # Signature Engine
//!
//! Pure, deterministic computation of the master-key authorization token.
//!
//! ## Algorithm
//!
//! 1. Canonical message, one field per line, each terminated by `\n`:
//!    lowercased verb, lowercased resource type, resource id (case kept),
//!    lowercased date, and an empty line for the unused alternate date.
//! 2. HMAC-SHA256 of the UTF-8 message under the raw master key.
//! 3. Standard base64 of the digest (no line wrapping, no trailing newline).
//! 4. `type=master&ver=1.0&sig=<signature>`, percent-encoded with
//!    `-_.!~*'()` kept literal.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::Sha256;
use shared_types::MasterKey;

use crate::errors::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Characters that are percent-encoded in the final token: everything except
/// ASCII alphanumerics and `-_.!~*'()`.
pub const AUTH_TOKEN_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const TOKEN_TYPE: &str = "master";
const TOKEN_VERSION: &str = "1.0";

/// Inputs to one signature. Built per request and dropped right after.
#[derive(Debug, Clone, Copy)]
pub struct SignatureInput<'a> {
    /// HTTP verb (any case).
    pub verb: &'a str,
    /// Resource type such as `docs` or `colls` (any case).
    pub resource_type: &'a str,
    /// Resource id or full name; case is preserved.
    pub resource_id: &'a str,
    /// RFC 1123 timestamp, the value sent as `x-ms-date`.
    pub date: &'a str,
    /// Decoded master key.
    pub master_key: &'a MasterKey,
}

impl SignatureInput<'_> {
    /// The five-line message that gets signed.
    pub fn canonical_message(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n",
            self.verb.to_lowercase(),
            self.resource_type.to_lowercase(),
            self.resource_id,
            self.date.to_lowercase(),
            ""
        )
    }
}

/// Compute the URL-encoded authorization token for `input`.
pub fn generate_signature(input: &SignatureInput<'_>) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(input.master_key.as_bytes())
        .map_err(|e| AuthError::InvalidMasterKey(e.to_string()))?;
    mac.update(input.canonical_message().as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());

    let token = format!("type={TOKEN_TYPE}&ver={TOKEN_VERSION}&sig={signature}");
    Ok(utf8_percent_encode(&token, AUTH_TOKEN_ENCODE_SET).to_string())
}

/// Sign with a base64 master key, as it is stored at rest.
pub fn sign(
    verb: &str,
    resource_type: &str,
    resource_id: &str,
    date: &str,
    master_key_base64: &str,
) -> Result<String, AuthError> {
    let master_key = MasterKey::from_base64(master_key_base64)?;
    generate_signature(&SignatureInput {
        verb,
        resource_type,
        resource_id,
        date,
        master_key: &master_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_KEY: &str = "Y29zbW9zLXN0cmVhbS10ZXN0LW1hc3Rlci1rZXktMDEyMzQ1Njc4OQ==";

    // Published example from the service's REST documentation.
    const DOC_KEY: &str =
        "dsZQi3KtZmCv1ljt3VNWNm7sQUF1y5rJfC6kv5JiwvW0EndXdDku/dkKBp8/ufDToSxLzR4y+O/0H/t4bQtVNw==";

    #[test]
    fn test_canonical_message_layout() {
        let key = MasterKey::from_base64(TEST_KEY).unwrap();
        let input = SignatureInput {
            verb: "POST",
            resource_type: "Docs",
            resource_id: "dbs/MyDb/colls/MyColl",
            date: "Thu, 27 Apr 2017 00:51:12 GMT",
            master_key: &key,
        };
        assert_eq!(
            input.canonical_message(),
            "post\ndocs\ndbs/MyDb/colls/MyColl\nthu, 27 apr 2017 00:51:12 gmt\n\n"
        );
    }

    #[test]
    fn test_published_example() {
        let token = sign(
            "GET",
            "dbs",
            "dbs/ToDoList",
            "Thu, 27 Apr 2017 00:51:12 GMT",
            DOC_KEY,
        )
        .unwrap();
        assert_eq!(
            token,
            "type%3Dmaster%26ver%3D1.0%26sig%3Dc09PEVJrgp2uQRkr934kFbTqhByc7TVr3OHyqlu%2Bc%2Bc%3D"
        );
    }

    #[test]
    fn test_known_vectors() {
        let post = sign(
            "POST",
            "docs",
            "dbs/testdb/colls/testcoll",
            "Thu, 27 Apr 2017 00:51:12 GMT",
            TEST_KEY,
        )
        .unwrap();
        assert_eq!(
            post,
            "type%3Dmaster%26ver%3D1.0%26sig%3DSTGJC8KuOS5BP2Fj9Jwo0Qfv2RegjvRfZAVwvn23Gf0%3D"
        );

        let get = sign(
            "GET",
            "colls",
            "dbs/testdb/colls/testcoll",
            "thu, 27 apr 2017 00:51:12 gmt",
            TEST_KEY,
        )
        .unwrap();
        assert_eq!(
            get,
            "type%3Dmaster%26ver%3D1.0%26sig%3DUOlr5FtTzQzfiMe0%2FMkr%2Bg%2BJloboB1Cj6NjJv9iZT7Q%3D"
        );
    }

    #[test]
    fn test_resource_id_case_is_significant() {
        let date = "thu, 27 apr 2017 00:51:12 gmt";
        let lower = sign("get", "docs", "dbs/db/colls/c/docs/abc", date, TEST_KEY).unwrap();
        let upper = sign("get", "docs", "dbs/db/colls/c/docs/ABC", date, TEST_KEY).unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_verb_and_type_case_is_not_significant() {
        let date = "Thu, 27 Apr 2017 00:51:12 GMT";
        let a = sign("get", "docs", "dbs/db", date, TEST_KEY).unwrap();
        let b = sign("GET", "DOCS", "dbs/db", date, TEST_KEY).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_key_rejected() {
        let err = sign("get", "docs", "dbs/db", "now", "%%%").unwrap_err();
        assert!(matches!(err, AuthError::InvalidMasterKey(_)));
    }

    fn is_extended_safe(c: char) -> bool {
        c.is_ascii_alphanumeric() || "-_.!~*'()%".contains(c)
    }

    proptest! {
        #[test]
        fn prop_sign_is_deterministic_and_url_safe(
            verb in "(get|post|delete|put)",
            resource_type in "(docs|colls|dbs|pkranges)",
            resource_id in "[A-Za-z0-9/_ -]{0,40}",
            date in "[A-Za-z0-9 ,:]{0,40}",
            key in proptest::collection::vec(any::<u8>(), 1..64),
        ) {
            let key_b64 = STANDARD.encode(&key);
            let first = sign(&verb, &resource_type, &resource_id, &date, &key_b64).unwrap();
            let second = sign(&verb, &resource_type, &resource_id, &date, &key_b64).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(first.chars().all(is_extended_safe));
            prop_assert!(first.starts_with("type%3Dmaster%26ver%3D1.0%26sig%3D"));
        }
    }
}
