//! AWS Signature V4 query-string presigning for S3-compatible gateways

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Credentials and scope used for signing
#[derive(Debug, Clone)]
pub struct SigningKey {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// A request to presign
#[derive(Debug, Clone, Copy)]
pub struct PresignRequest<'a> {
    pub method: &'a str,
    /// Base URL of the gateway (scheme, host, optional port)
    pub base_url: &'a Url,
    /// Path inside the gateway, e.g. `/bucket/key`
    pub path: &'a str,
    pub expires_secs: u64,
    pub now: DateTime<Utc>,
}

fn hmac(key: &[u8], data: &str) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::internal_with_source("invalid HMAC key", e))?;
    mac.update(data.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// URI-encode each path segment, keeping the `/` separators
#[must_use]
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn host_header(base_url: &Url) -> Result<String> {
    let host = base_url
        .host_str()
        .ok_or_else(|| AppError::config(format!("storage url has no host: {base_url}")))?;
    Ok(match base_url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

impl SigningKey {
    fn derive(&self, date: &str) -> Result<Vec<u8>> {
        let k_date = hmac(format!("AWS4{}", self.secret_key).as_bytes(), date)?;
        let k_region = hmac(&k_date, &self.region)?;
        let k_service = hmac(&k_region, SERVICE)?;
        hmac(&k_service, "aws4_request")
    }

    /// Build a presigned URL; only the `host` header is signed
    pub fn presign(&self, request: PresignRequest<'_>) -> Result<String> {
        let host = host_header(request.base_url)?;
        let amz_date = request.now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = request.now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/{SERVICE}/aws4_request", self.region);
        let credential = format!("{}/{scope}", self.access_key);

        let mut query = [
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            ("X-Amz-Credential", credential),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", request.expires_secs.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ];
        query.sort_by(|a, b| a.0.cmp(b.0));
        let canonical_query = query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_uri = encode_path(request.path);
        let canonical_request = format!(
            "{}\n{canonical_uri}\n{canonical_query}\nhost:{host}\n\nhost\n{UNSIGNED_PAYLOAD}",
            request.method
        );
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(&canonical_request)
        );
        let signature = hex::encode(hmac(&self.derive(&date)?, &string_to_sign)?);

        Ok(format!(
            "{}://{host}{canonical_uri}?{canonical_query}&X-Amz-Signature={signature}",
            request.base_url.scheme()
        ))
    }
}
