use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::work::function_key;

pub const FORMAT: &str = "sf-external-function-format";
pub const FORMAT_VERSION: &str = "sf-external-function-format-version";
pub const CURRENT_QUERY_ID: &str = "sf-external-function-current-query-id";
pub const QUERY_BATCH_ID: &str = "sf-external-function-query-batch-id";
pub const NAME: &str = "sf-external-function-name";
pub const NAME_BASE64: &str = "sf-external-function-name-base64";
pub const SIGNATURE: &str = "sf-external-function-signature";
pub const SIGNATURE_BASE64: &str = "sf-external-function-signature-base64";
pub const RETURN_TYPE: &str = "sf-external-function-return-type";
pub const RETURN_TYPE_BASE64: &str = "sf-external-function-return-type-base64";

pub const EXPECTED_FORMAT: &str = "json";
pub const EXPECTED_FORMAT_VERSION: &str = "1.0";

/// The `sf-external-function-*` headers of a single request.
///
/// See <https://docs.snowflake.com/en/sql-reference/external-functions-data-format#header-format>
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallHeader {
    #[serde(rename = "SfExternalFunctionFormat")]
    pub format: String,
    #[serde(rename = "SfExternalFunctionFormatVersion")]
    pub format_version: String,
    #[serde(rename = "SfExternalFunctionCurrentQueryId")]
    pub current_query_id: String,
    #[serde(rename = "SfExternalFunctionQueryBatchId")]
    pub query_batch_id: String,
    #[serde(rename = "SfExternalFunctionName")]
    pub name: String,
    #[serde(rename = "SfExternalFunctionNameBase64")]
    pub name_base64: String,
    #[serde(rename = "SfExternalFunctionSignature")]
    pub signature: String,
    #[serde(rename = "SfExternalFunctionSignatureBase64")]
    pub signature_base64: String,
    #[serde(rename = "SfExternalFunctionReturnType")]
    pub return_type: String,
    #[serde(rename = "SfExternalFunctionReturnTypeBase64")]
    pub return_type_base64: String,
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

impl CallHeader {
    /// Missing headers, and values that are not valid UTF-8, become empty strings.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            format: header_str(headers, FORMAT),
            format_version: header_str(headers, FORMAT_VERSION),
            current_query_id: header_str(headers, CURRENT_QUERY_ID),
            query_batch_id: header_str(headers, QUERY_BATCH_ID),
            name: header_str(headers, NAME),
            name_base64: header_str(headers, NAME_BASE64),
            signature: header_str(headers, SIGNATURE),
            signature_base64: header_str(headers, SIGNATURE_BASE64),
            return_type: header_str(headers, RETURN_TYPE),
            return_type_base64: header_str(headers, RETURN_TYPE_BASE64),
        }
    }

    pub fn function_key(&self) -> String {
        function_key(&self.name, &self.signature)
    }

    /// `false` only when format or version is present and not the expected value.
    pub fn check_format(&self) -> bool {
        let format_ok = self.format.is_empty() || self.format == EXPECTED_FORMAT;
        let version_ok =
            self.format_version.is_empty() || self.format_version == EXPECTED_FORMAT_VERSION;
        format_ok && version_ok
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallHeader
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn test_extracts_all_headers() {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            (FORMAT, "json"),
            (FORMAT_VERSION, "1.0"),
            (CURRENT_QUERY_ID, "q1"),
            (QUERY_BATCH_ID, "b1"),
            (NAME, "ECHO"),
            (NAME_BASE64, "RUNITw=="),
            (SIGNATURE, "(X VARCHAR)"),
            (SIGNATURE_BASE64, "KFggVkFSQ0hBUik="),
            (RETURN_TYPE, "VARIANT"),
            (RETURN_TYPE_BASE64, "VkFSSUFOVA=="),
        ] {
            headers.insert(name, HeaderValue::from_static(value));
        }

        let header = CallHeader::from_headers(&headers);
        assert_eq!(header.format, "json");
        assert_eq!(header.format_version, "1.0");
        assert_eq!(header.current_query_id, "q1");
        assert_eq!(header.query_batch_id, "b1");
        assert_eq!(header.name, "ECHO");
        assert_eq!(header.name_base64, "RUNITw==");
        assert_eq!(header.signature, "(X VARCHAR)");
        assert_eq!(header.signature_base64, "KFggVkFSQ0hBUik=");
        assert_eq!(header.return_type, "VARIANT");
        assert_eq!(header.return_type_base64, "VkFSSUFOVA==");
        assert_eq!(header.function_key(), "ECHO(X VARCHAR)");
        assert!(header.check_format());
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_bytes(b"SF-External-Function-Current-Query-Id").unwrap();
        headers.insert(name, HeaderValue::from_static("q2"));

        let header = CallHeader::from_headers(&headers);
        assert_eq!(header.current_query_id, "q2");
    }

    #[test]
    fn test_missing_headers_are_empty() {
        let header = CallHeader::from_headers(&HeaderMap::new());
        assert_eq!(header, CallHeader::default());
        assert_eq!(header.function_key(), "");
        assert!(header.check_format());
    }

    #[test]
    fn test_non_utf8_value_is_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(NAME, HeaderValue::from_bytes(b"\xffECHO").unwrap());
        assert_eq!(CallHeader::from_headers(&headers).name, "");
    }

    #[test]
    fn test_check_format_rejects_unknown_version() {
        let header = CallHeader {
            format: "json".into(),
            format_version: "2.0".into(),
            ..Default::default()
        };
        assert!(!header.check_format());
    }
}
