//! # Connection Context
//!
//! Parsing of the semicolon-delimited connection descriptor and the immutable
//! context every client is built from.
//!
//! ```text
//! AccountEndpoint=https://acct.documents.azure.com:443/;AccountKey=<base64>;
//! ```

use std::collections::HashMap;
use std::env;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::errors::ConfigError;

/// Environment variables consulted by [`ConnectionString::from_env`], in order.
pub const CONNECTION_STRING_ENV: [&str; 2] = ["COSMOS_CONNECTION_STRING", "cosmos"];

const ACCOUNT_ENDPOINT: &str = "AccountEndpoint";
const ACCOUNT_KEY: &str = "AccountKey";

/// Raw master key bytes, decoded once from their base64 form.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: Vec<u8>,
}

impl MasterKey {
    /// Decode a base64 master key.
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::InvalidMasterKey(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ConfigError::InvalidMasterKey("key is empty".to_string()));
        }
        Ok(Self { bytes })
    }

    /// Key bytes for HMAC.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// A parsed connection descriptor.
#[derive(Clone)]
pub struct ConnectionString {
    endpoint: String,
    account_key: String,
    extra: HashMap<String, String>,
}

impl ConnectionString {
    /// Parse `key=value` pairs separated by `;`.
    ///
    /// Values may themselves contain `=` (base64 padding); only the first `=`
    /// of each pair splits. Empty segments are ignored.
    pub fn parse(descriptor: &str) -> Result<Self, ConfigError> {
        let mut pairs: HashMap<String, String> = HashMap::new();
        for segment in descriptor.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedPair {
                    pair: segment.to_string(),
                })?;
            pairs.insert(key.trim().to_string(), value.trim().to_string());
        }

        let endpoint = pairs
            .remove(ACCOUNT_ENDPOINT)
            .ok_or(ConfigError::MissingKey {
                key: ACCOUNT_ENDPOINT,
            })?;
        let account_key = pairs
            .remove(ACCOUNT_KEY)
            .ok_or(ConfigError::MissingKey { key: ACCOUNT_KEY })?;

        Ok(Self {
            endpoint,
            account_key,
            extra: pairs,
        })
    }

    /// Read the descriptor from `COSMOS_CONNECTION_STRING`, falling back to `cosmos`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let descriptor = CONNECTION_STRING_ENV
            .iter()
            .find_map(|name| env::var(name).ok())
            .ok_or_else(|| ConfigError::NotInEnvironment {
                tried: CONNECTION_STRING_ENV.join(", "),
            })?;
        Self::parse(&descriptor)
    }

    /// Account endpoint as given.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Base64 account key as given.
    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    /// Any other pairs in the descriptor.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

impl fmt::Debug for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionString")
            .field("endpoint", &self.endpoint)
            .field("account_key", &"<redacted>")
            .finish()
    }
}

/// Characters escaped in a document id used as a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Immutable connection context: endpoint, database, container, master key.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    endpoint: String,
    database: String,
    container: String,
    master_key: MasterKey,
}

impl ConnectionContext {
    /// Build from explicit parts. Trailing slashes on the endpoint are stripped.
    pub fn new(
        endpoint: &str,
        database: impl Into<String>,
        container: impl Into<String>,
        master_key: MasterKey,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(Self {
            endpoint: endpoint.to_string(),
            database: database.into(),
            container: container.into(),
            master_key,
        })
    }

    /// Build from a parsed connection descriptor.
    pub fn from_connection_string(
        connection: &ConnectionString,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let master_key = MasterKey::from_base64(connection.account_key())?;
        Self::new(connection.endpoint(), database, container, master_key)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn master_key(&self) -> &MasterKey {
        &self.master_key
    }

    /// `dbs/{db}/colls/{container}`
    pub fn collection_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.container)
    }

    /// Container metadata URL.
    pub fn collection_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.collection_link())
    }

    /// Document feed URL, target of queries and creates.
    pub fn docs_url(&self) -> String {
        format!("{}/docs", self.collection_url())
    }

    /// URL of a single document. The id is percent-encoded as one path
    /// segment; signing decodes it again.
    pub fn document_url(&self, id: &str) -> String {
        format!(
            "{}/docs/{}",
            self.collection_url(),
            utf8_percent_encode(id, PATH_SEGMENT)
        )
    }

    /// Partition-key range feed URL.
    pub fn pk_ranges_url(&self) -> String {
        format!("{}/pkranges", self.collection_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "Y29zbW9zLXN0cmVhbS10ZXN0LW1hc3Rlci1rZXktMDEyMzQ1Njc4OQ==";

    fn descriptor() -> String {
        format!("AccountEndpoint=https://acct.documents.azure.com:443//;AccountKey={KEY};")
    }

    #[test]
    fn test_parse_keeps_base64_padding() {
        let conn = ConnectionString::parse(&descriptor()).unwrap();
        assert_eq!(conn.account_key(), KEY);
        assert_eq!(conn.endpoint(), "https://acct.documents.azure.com:443//");
    }

    #[test]
    fn test_parse_missing_key() {
        let err = ConnectionString::parse("AccountEndpoint=https://x/").unwrap_err();
        assert_eq!(err, ConfigError::MissingKey { key: "AccountKey" });

        let err = ConnectionString::parse(&format!("AccountKey={KEY}")).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingKey {
                key: "AccountEndpoint"
            }
        );
    }

    #[test]
    fn test_parse_malformed_pair() {
        let err = ConnectionString::parse("AccountEndpoint=https://x/;oops").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedPair { .. }));
    }

    #[test]
    fn test_parse_keeps_extra_pairs() {
        let conn = ConnectionString::parse(&format!("{};Database=main", descriptor())).unwrap();
        assert_eq!(conn.extra("Database"), Some("main"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let conn = ConnectionString::parse(&descriptor()).unwrap();
        assert!(!format!("{conn:?}").contains(KEY));
        let key = MasterKey::from_base64(KEY).unwrap();
        assert_eq!(format!("{key:?}"), "MasterKey(<redacted>)");
    }

    #[test]
    fn test_invalid_master_key() {
        assert!(matches!(
            MasterKey::from_base64("not base64 !!"),
            Err(ConfigError::InvalidMasterKey(_))
        ));
    }

    #[test]
    fn test_context_strips_trailing_slashes() {
        let conn = ConnectionString::parse(&descriptor()).unwrap();
        let ctx = ConnectionContext::from_connection_string(&conn, "db", "coll").unwrap();
        assert_eq!(ctx.endpoint(), "https://acct.documents.azure.com:443");
        assert_eq!(
            ctx.docs_url(),
            "https://acct.documents.azure.com:443/dbs/db/colls/coll/docs"
        );
        assert_eq!(
            ctx.document_url("a1"),
            "https://acct.documents.azure.com:443/dbs/db/colls/coll/docs/a1"
        );
        assert_eq!(
            ctx.pk_ranges_url(),
            "https://acct.documents.azure.com:443/dbs/db/colls/coll/pkranges"
        );
        assert_eq!(ctx.collection_link(), "dbs/db/colls/coll");
    }

    #[test]
    fn test_document_url_escapes_id() {
        let key = MasterKey::from_base64(KEY).unwrap();
        let ctx = ConnectionContext::new("https://acct", "db", "c", key).unwrap();
        assert_eq!(
            ctx.document_url("a b/c"),
            "https://acct/dbs/db/colls/c/docs/a%20b%2Fc"
        );
    }

    #[test]
    fn test_context_rejects_non_http_endpoint() {
        let key = MasterKey::from_base64(KEY).unwrap();
        let err = ConnectionContext::new("ftp://x", "db", "c", key).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint(_)));
    }
}
