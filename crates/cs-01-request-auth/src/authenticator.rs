//! # Request Authenticator
//!
//! Per-request hook run immediately before every outbound call. It derives
//! the resource id from the target URL, captures the current time, signs,
//! and attaches `x-ms-date` and `authorization`.
//!
//! The resource type travels on [`OutboundRequest`] as a separate field and
//! is consumed by signing; [`SignedRequest`] has no such field, so it can
//! never be transmitted.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use shared_types::headers::{AUTHORIZATION, X_MS_DATE};
use shared_types::{MasterKey, ResourceType};
use tracing::trace;

use crate::clock::{format_x_ms_date, Clock, SystemClock};
use crate::errors::AuthError;
use crate::resource_link::resource_link_from_url;
use crate::signature::{generate_signature, SignatureInput};

/// A request that still needs signing.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute target URL.
    pub url: String,
    /// Resource type the signature is computed for. Never sent.
    pub resource_type: ResourceType,
    /// Headers to send.
    pub headers: HeaderMap,
    /// Optional body.
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// New request without headers or body.
    pub fn new(method: Method, url: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            method,
            url: url.into(),
            resource_type,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Replace the header set.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A request ready for the transport.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute target URL.
    pub url: String,
    /// Headers including `x-ms-date` and `authorization`.
    pub headers: HeaderMap,
    /// Optional body.
    pub body: Option<Bytes>,
}

/// Signs outbound requests with the account master key.
#[derive(Clone)]
pub struct RequestAuthenticator {
    master_key: MasterKey,
    clock: Arc<dyn Clock>,
}

impl RequestAuthenticator {
    /// Authenticator using wall-clock time.
    pub fn new(master_key: MasterKey) -> Self {
        Self::with_clock(master_key, Arc::new(SystemClock))
    }

    /// Authenticator with an explicit time source.
    pub fn with_clock(master_key: MasterKey, clock: Arc<dyn Clock>) -> Self {
        Self { master_key, clock }
    }

    /// Sign `request`. A new timestamp is taken on every call.
    pub fn authenticate(&self, request: OutboundRequest) -> Result<SignedRequest, AuthError> {
        let OutboundRequest {
            method,
            url,
            resource_type,
            mut headers,
            body,
        } = request;

        let resource_id = resource_link_from_url(&url)?;
        let date = format_x_ms_date(self.clock.now());
        let token = generate_signature(&SignatureInput {
            verb: method.as_str(),
            resource_type: resource_type.as_str(),
            resource_id: &resource_id,
            date: &date,
            master_key: &self.master_key,
        })?;

        trace!(
            verb = %method,
            resource_type = %resource_type,
            resource_id = %resource_id,
            "[cs-01] signed request"
        );

        insert_header(&mut headers, X_MS_DATE, &date)?;
        insert_header(&mut headers, AUTHORIZATION, &token)?;

        Ok(SignedRequest {
            method,
            url,
            headers,
            body,
        })
    }
}

impl fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("master_key", &self.master_key)
            .finish_non_exhaustive()
    }
}

fn insert_header(
    headers: &mut HeaderMap,
    name: &'static str,
    value: &str,
) -> Result<(), AuthError> {
    let value = HeaderValue::from_str(value).map_err(|_| AuthError::InvalidHeaderValue { name })?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::signature::sign;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    const TEST_KEY: &str = "Y29zbW9zLXN0cmVhbS10ZXN0LW1hc3Rlci1rZXktMDEyMzQ1Njc4OQ==";
    const DOCS_URL: &str = "https://acct.documents.azure.com:443/dbs/testdb/colls/testcoll/docs";

    fn fixed_authenticator() -> RequestAuthenticator {
        let instant = Utc.with_ymd_and_hms(2017, 4, 27, 0, 51, 12).unwrap();
        RequestAuthenticator::with_clock(
            MasterKey::from_base64(TEST_KEY).unwrap(),
            Arc::new(FixedClock(instant)),
        )
    }

    /// Advances one second per call.
    struct TickingClock(AtomicI64);

    impl Clock for TickingClock {
        fn now(&self) -> chrono::DateTime<Utc> {
            let secs = self.0.fetch_add(1, Ordering::SeqCst);
            Utc.timestamp_opt(secs, 0).unwrap()
        }
    }

    #[test]
    fn test_attaches_date_and_authorization() {
        let request = OutboundRequest::new(Method::POST, DOCS_URL, ResourceType::Docs);
        let signed = fixed_authenticator().authenticate(request).unwrap();

        assert_eq!(
            signed.headers.get(X_MS_DATE).unwrap(),
            "thu, 27 apr 2017 00:51:12 gmt"
        );
        assert_eq!(
            signed.headers.get(AUTHORIZATION).unwrap(),
            "type%3Dmaster%26ver%3D1.0%26sig%3DSTGJC8KuOS5BP2Fj9Jwo0Qfv2RegjvRfZAVwvn23Gf0%3D"
        );
    }

    #[test]
    fn test_signature_matches_engine() {
        let url = "https://acct.documents.azure.com/dbs/testdb/colls/testcoll";
        let request = OutboundRequest::new(Method::GET, url, ResourceType::Colls);
        let signed = fixed_authenticator().authenticate(request).unwrap();
        let expected = sign(
            "GET",
            "colls",
            "dbs/testdb/colls/testcoll",
            "thu, 27 apr 2017 00:51:12 gmt",
            TEST_KEY,
        )
        .unwrap();
        assert_eq!(signed.headers.get(AUTHORIZATION).unwrap(), expected.as_str());
    }

    #[test]
    fn test_keeps_caller_headers_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ms-version", HeaderValue::from_static("2020-07-15"));
        let request = OutboundRequest::new(Method::POST, DOCS_URL, ResourceType::Docs)
            .with_headers(headers)
            .with_body(r#"{"query":"SELECT * FROM c"}"#);
        let signed = fixed_authenticator().authenticate(request).unwrap();

        assert_eq!(signed.headers.get("x-ms-version").unwrap(), "2020-07-15");
        assert_eq!(signed.headers.len(), 3);
        assert_eq!(
            signed.body.as_deref(),
            Some(br#"{"query":"SELECT * FROM c"}"#.as_slice())
        );
    }

    #[test]
    fn test_fresh_timestamp_per_request() {
        let authenticator = RequestAuthenticator::with_clock(
            MasterKey::from_base64(TEST_KEY).unwrap(),
            Arc::new(TickingClock(AtomicI64::new(1_700_000_000))),
        );
        let first = authenticator
            .authenticate(OutboundRequest::new(Method::POST, DOCS_URL, ResourceType::Docs))
            .unwrap();
        let second = authenticator
            .authenticate(OutboundRequest::new(Method::POST, DOCS_URL, ResourceType::Docs))
            .unwrap();

        assert_ne!(
            first.headers.get(X_MS_DATE),
            second.headers.get(X_MS_DATE)
        );
        assert_ne!(
            first.headers.get(AUTHORIZATION),
            second.headers.get(AUTHORIZATION)
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", fixed_authenticator());
        assert!(rendered.contains("<redacted>"));
    }
}
