//! # Resource Link Derivation
//!
//! The signature is computed against a resource id taken from the request
//! path. Requests that target a feed (`.../docs`, `.../pkranges`) are signed
//! against the owning collection, so that trailing segment is dropped.

use http::Uri;
use percent_encoding::percent_decode_str;

use crate::errors::AuthError;

/// Feed segments that are signed against their parent resource.
const FEED_SEGMENTS: [&str; 2] = ["docs", "pkranges"];

/// Derive the resource id from a URL path.
///
/// Leading slashes are removed and the path is percent-decoded. A final
/// `docs` or `pkranges` segment is dropped.
pub fn resource_link_from_path(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let trimmed = decoded.trim_start_matches('/');

    match trimmed.rsplit_once('/') {
        Some((parent, last)) if FEED_SEGMENTS.contains(&last) => parent.to_string(),
        None if FEED_SEGMENTS.contains(&trimmed) => String::new(),
        _ => trimmed.to_string(),
    }
}

/// Derive the resource id from a full target URL.
pub fn resource_link_from_url(url: &str) -> Result<String, AuthError> {
    let uri: Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| AuthError::InvalidUrl(format!("{url}: {e}")))?;
    Ok(resource_link_from_path(uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docs_feed_signs_collection() {
        assert_eq!(
            resource_link_from_path("/dbs/db/colls/c/docs"),
            "dbs/db/colls/c"
        );
    }

    #[test]
    fn test_pkranges_feed_signs_collection() {
        assert_eq!(
            resource_link_from_path("/dbs/db/colls/c/pkranges"),
            "dbs/db/colls/c"
        );
    }

    #[test]
    fn test_document_keeps_full_link() {
        assert_eq!(
            resource_link_from_path("/dbs/db/colls/c/docs/Item-42"),
            "dbs/db/colls/c/docs/Item-42"
        );
    }

    #[test]
    fn test_collection_keeps_full_link() {
        assert_eq!(resource_link_from_path("/dbs/db/colls/c"), "dbs/db/colls/c");
    }

    #[test]
    fn test_repeated_leading_slashes() {
        assert_eq!(
            resource_link_from_path("//dbs/db/colls/c/docs"),
            "dbs/db/colls/c"
        );
    }

    #[test]
    fn test_percent_decoded() {
        assert_eq!(
            resource_link_from_path("/dbs/db/colls/c/docs/a%20b"),
            "dbs/db/colls/c/docs/a b"
        );
    }

    #[test]
    fn test_from_url() {
        let link =
            resource_link_from_url("https://acct.documents.azure.com:443/dbs/db/colls/c/docs")
                .unwrap();
        assert_eq!(link, "dbs/db/colls/c");
    }

    #[test]
    fn test_from_bad_url() {
        assert!(matches!(
            resource_link_from_url("http://bad host/"),
            Err(AuthError::InvalidUrl(_))
        ));
    }
}
