//! Webhook authenticity verification.
//!
//! The provider signs each delivery with a `Stripe-Signature` header of the
//! form `t=<unix_ts>,v1=<hex hmac>`, where the MAC is HMAC-SHA256 over
//! `"{t}.{raw_body}"`. Verification uses constant-time comparison and
//! rejects timestamps outside a tolerance window to limit replay.

use crate::errors::{FraudError, FraudResult};
use crate::models::WebhookEvent;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age (or clock skew) for a delivery timestamp.
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Verify a delivery and parse it into a [`WebhookEvent`].
///
/// This is the whole authenticity contract of the webhook endpoint: any
/// failure here means a 400-class response and no further processing.
pub fn construct_event(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> FraudResult<WebhookEvent> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    verify_signature(payload, sig_header, secret, DEFAULT_TOLERANCE_SECS, now)?;

    serde_json::from_slice(payload)
        .map_err(|e| FraudError::Authenticity(format!("invalid event payload: {}", e)))
}

/// Check a signature header against the raw body. `now` is passed in so
/// the tolerance window is testable.
pub fn verify_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    tolerance_secs: u64,
    now: u64,
) -> FraudResult<()> {
    let (timestamp, candidates) = parse_header(sig_header)?;

    let ts: u64 = timestamp
        .parse()
        .map_err(|_| FraudError::Authenticity("malformed signature timestamp".to_string()))?;

    if now.abs_diff(ts) > tolerance_secs {
        return Err(FraudError::Authenticity(
            "signature timestamp outside tolerance".to_string(),
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| FraudError::Authenticity("invalid signing secret".to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    let expected = hex::encode(mac.finalize().into_bytes());

    // Constant-time comparison; check every candidate without early exit
    let mut matched = false;
    for candidate in &candidates {
        if candidate.len() == expected.len() {
            matched |= bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()));
        }
    }

    if matched {
        Ok(())
    } else {
        Err(FraudError::Authenticity(
            "signature mismatch".to_string(),
        ))
    }
}

/// Split the header into its timestamp and the `v1` signature candidates.
fn parse_header(header: &str) -> FraudResult<(&str, Vec<&str>)> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {} // unknown scheme entries are ignored
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| FraudError::Authenticity("missing signature timestamp".to_string()))?;

    if candidates.is_empty() {
        return Err(FraudError::Authenticity(
            "missing v1 signature".to_string(),
        ));
    }

    Ok((timestamp, candidates))
}

/// Produce a valid signature header for a body. Used by tests and local
/// tooling to forge deliveries against a known secret.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: u64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}
