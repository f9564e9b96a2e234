use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,
    #[error("timestamp outside tolerance")]
    Expired,
    #[error("no matching v1 signature")]
    Mismatch,
}

struct ParsedHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(ParsedHeader {
            timestamp,
            signatures,
        }),
        _ => Err(SignatureError::Malformed),
    }
}

/// Verifies a `Stripe-Signature` header (`t=<unix>,v1=<hex>[,v1=<hex>...]`)
/// against the raw request body.
pub fn verify_stripe_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: u64,
    now_unix: i64,
) -> Result<(), SignatureError> {
    let parsed = parse_header(header)?;

    if (now_unix - parsed.timestamp).unsigned_abs() > tolerance_secs {
        return Err(SignatureError::Expired);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(parsed.timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    let matched = parsed.signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });

    if matched {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Produces a header value the verifier accepts. Used by tests and local tooling.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return format!("t={}", timestamp),
    };
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

    #[test]
    fn accepts_valid_signature() {
        let header = sign_payload(BODY, SECRET, 1_700_000_000);
        assert_eq!(
            verify_stripe_signature(BODY, &header, SECRET, 300, 1_700_000_100),
            Ok(())
        );
    }

    #[test]
    fn accepts_any_matching_v1_entry() {
        let valid = sign_payload(BODY, SECRET, 1_700_000_000);
        let v1 = valid.split_once(",v1=").unwrap().1;
        let header = format!("t=1700000000,v1={},v1={}", "00".repeat(32), v1);
        assert!(verify_stripe_signature(BODY, &header, SECRET, 300, 1_700_000_000).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign_payload(BODY, SECRET, 1_700_000_000);
        assert_eq!(
            verify_stripe_signature(b"{}", &header, SECRET, 300, 1_700_000_000),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = sign_payload(BODY, SECRET, 1_700_000_000);
        assert_eq!(
            verify_stripe_signature(BODY, &header, SECRET, 300, 1_700_000_301),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn rejects_malformed_header() {
        assert_eq!(
            verify_stripe_signature(BODY, "v1=abc", SECRET, 300, 0),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_stripe_signature(BODY, "t=123", SECRET, 300, 123),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_stripe_signature(BODY, "t=123,v1=zz", SECRET, 300, 123),
            Err(SignatureError::Mismatch)
        );
    }
}
