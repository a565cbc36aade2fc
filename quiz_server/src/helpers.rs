//! Webhook signature helpers.
//!
//! The payment provider signs each notification with HMAC-SHA256. The signature arrives in the `x-signature` header as
//! `ts=<timestamp>,v1=<hex digest>`, and the signed data is a manifest built from the notification:
//!
//! ```text
//! id:<data.id>;request-id:<x-request-id header>;ts:<ts>;
//! ```
//!
//! Any part whose value is missing from the notification is left out of the manifest.
use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSignature {
    pub ts: String,
    pub v1: String,
}

/// Parses an `x-signature` header value. Returns `None` unless both `ts` and `v1` are present.
pub fn parse_signature_header(value: &str) -> Option<WebhookSignature> {
    let mut ts = None;
    let mut v1 = None;
    for part in value.split(',') {
        let Some((key, val)) = part.split_once('=') else {
            continue;
        };
        match key.trim() {
            "ts" => ts = Some(val.trim().to_string()),
            "v1" => v1 = Some(val.trim().to_string()),
            _ => {},
        }
    }
    match (ts, v1) {
        (Some(ts), Some(v1)) if !ts.is_empty() && !v1.is_empty() => Some(WebhookSignature { ts, v1 }),
        _ => None,
    }
}

pub fn signature_manifest(id: Option<&str>, request_id: Option<&str>, ts: &str) -> String {
    let mut manifest = String::new();
    if let Some(id) = id.filter(|s| !s.is_empty()) {
        // Alphanumeric ids are signed in lower case
        manifest.push_str(&format!("id:{};", id.to_lowercase()));
    }
    if let Some(request_id) = request_id.filter(|s| !s.is_empty()) {
        manifest.push_str(&format!("request-id:{request_id};"));
    }
    manifest.push_str(&format!("ts:{ts};"));
    manifest
}

/// The hex-encoded HMAC-SHA256 of `data`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    hmac_for(secret, data).map(|mac| hex::encode(mac.finalize().into_bytes())).unwrap_or_default()
}

/// Checks `signature` (hex) against the HMAC of `data` in constant time.
pub fn verify_hmac(secret: &str, data: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        trace!("🔐️ Signature is not valid hex");
        return false;
    };
    hmac_for(secret, data).is_some_and(|mac| mac.verify_slice(&expected).is_ok())
}

fn hmac_for(secret: &str, data: &[u8]) -> Option<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(data);
    Some(mac)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn signature_header() {
        let sig = parse_signature_header("ts=1704908010,v1=618c85345248dd820d5fd456117c2ab2ef8eda45a0282ff693eac24131a5e839");
        let sig = sig.unwrap();
        assert_eq!(sig.ts, "1704908010");
        assert_eq!(sig.v1, "618c85345248dd820d5fd456117c2ab2ef8eda45a0282ff693eac24131a5e839");
        let sig = parse_signature_header(" v1=abcd , ts=42 ").unwrap();
        assert_eq!(sig, WebhookSignature { ts: "42".into(), v1: "abcd".into() });
        assert!(parse_signature_header("ts=42").is_none());
        assert!(parse_signature_header("v1=abcd,ts=").is_none());
        assert!(parse_signature_header("garbage").is_none());
    }

    #[test]
    fn manifest_skips_missing_parts() {
        assert_eq!(signature_manifest(Some("123"), Some("req-1"), "42"), "id:123;request-id:req-1;ts:42;");
        assert_eq!(signature_manifest(Some("ABC"), None, "42"), "id:abc;ts:42;");
        assert_eq!(signature_manifest(None, Some(""), "42"), "ts:42;");
    }

    #[test]
    fn hmac_round_trip() {
        let data = b"id:123;request-id:req-1;ts:42;";
        let sig = calculate_hmac("secret", data);
        assert_eq!(sig.len(), 64);
        assert!(verify_hmac("secret", data, &sig));
        assert!(!verify_hmac("other secret", data, &sig));
        assert!(!verify_hmac("secret", b"id:124;request-id:req-1;ts:42;", &sig));
        assert!(!verify_hmac("secret", data, "not hex"));
    }
}
