//! Integrity headers for XML request bodies.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use http::HeaderMap;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use md5::{Digest, Md5};

use ecs_s3_auth::AuthError;

/// Content type of every document body sent by this client.
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// `Content-MD5` header name.
pub const CONTENT_MD5: &str = "content-md5";

/// Base64 of the raw MD5 digest of `body`, as carried in `Content-MD5`.
///
/// # Examples
///
/// ```
/// use ecs_s3_core::checksums::content_md5;
///
/// assert_eq!(content_md5(b"hello"), "XUFAKrxLKna5cZ2REBfFkg==");
/// ```
#[must_use]
pub fn content_md5(body: &[u8]) -> String {
    BASE64_STANDARD.encode(Md5::digest(body))
}

/// `Content-Type`, `Content-MD5` and `Content-Length` headers for an XML body.
pub(crate) fn xml_body_headers(body: &[u8]) -> Result<HeaderMap, AuthError> {
    let md5 = HeaderValue::from_str(&content_md5(body)).map_err(|e| {
        AuthError::InvalidHeaderValue {
            name: CONTENT_MD5.to_owned(),
            reason: e.to_string(),
        }
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));
    headers.insert(CONTENT_MD5, md5);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_compute_content_md5() {
        assert_eq!(content_md5(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
        assert_eq!(content_md5(b"hello"), "XUFAKrxLKna5cZ2REBfFkg==");
    }

    #[test]
    fn test_should_build_xml_body_headers() {
        let headers = xml_body_headers(b"hello").unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/xml");
        assert_eq!(headers[CONTENT_MD5], "XUFAKrxLKna5cZ2REBfFkg==");
        assert_eq!(headers[CONTENT_LENGTH], "5");
    }
}
