use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header missing")]
    MissingHeader,
    #[error("signature header malformed")]
    Malformed,
    #[error("timestamp outside tolerance (age {0}s)")]
    OutsideTolerance(i64),
    #[error("no signature matched")]
    Mismatch,
    #[error("webhook secret unusable")]
    InvalidSecret,
}

/// Hex HMAC-SHA256 of `"<timestamp>.<payload>"`, the value Stripe sends as `v1`.
pub fn compute_signature(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a `t=<unix>,v1=<hex>[,v1=<hex>...]` header against the raw payload.
///
/// Any `v1` entry may match; other schemes (`v0`, ...) are ignored. The
/// signed timestamp may be at most `tolerance_secs` older than `now`.
pub fn verify_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::MissingHeader)?;

    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = Some(value),
            "v1" => candidates.push(value),
            _ => {}
        }
    }

    let timestamp: i64 = timestamp
        .ok_or(SignatureError::Malformed)?
        .parse()
        .map_err(|_| SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let age = now
        .checked_sub(timestamp)
        .ok_or(SignatureError::Malformed)?;
    if age > tolerance_secs {
        return Err(SignatureError::OutsideTolerance(age));
    }

    let expected = compute_signature(secret, timestamp, payload)?;
    let matched = candidates
        .iter()
        .any(|candidate| bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())));

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
