//! Shared signing-secret verification for chat-platform callbacks.
//!
//! The sender signs `v0:{timestamp}:{raw body}` with HMAC-SHA256 and sends
//! `v0=<hex digest>` in `x-slack-signature`, with the timestamp in
//! `x-slack-request-timestamp`. Requests older or newer than five minutes are
//! refused to limit replay.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use hookrelay_core::auth::{AuthOutcome, Authenticator, RejectReason};
use hookrelay_types::credential::CredentialData;
use hookrelay_types::inbound::InboundEvent;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SECRET_FIELD: &str = "signatureSecret";
pub const CREDENTIAL_TYPE: &str = "slackApi";

/// Maximum allowed distance between the request timestamp and now.
pub const MAX_SKEW_SECS: i64 = 300;

const VERSION: &str = "v0";

#[derive(Debug, Default, Clone)]
pub struct SigningSecretAuthenticator;

impl SigningSecretAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Authenticator for SigningSecretAuthenticator {
    fn credential_type(&self) -> &str {
        CREDENTIAL_TYPE
    }

    fn verify(
        &self,
        credentials: &CredentialData,
        event: &InboundEvent,
        now: DateTime<Utc>,
    ) -> AuthOutcome {
        let Some(secret) = credentials.string_field(SECRET_FIELD) else {
            return AuthOutcome::NotApplicable;
        };
        let Some(signature) = event.header(SIGNATURE_HEADER) else {
            return AuthOutcome::Rejected(RejectReason::MissingHeader(SIGNATURE_HEADER));
        };
        let Some(timestamp) = event.header(TIMESTAMP_HEADER) else {
            return AuthOutcome::Rejected(RejectReason::MissingHeader(TIMESTAMP_HEADER));
        };

        let Ok(sent_at) = timestamp.trim().parse::<i64>() else {
            return AuthOutcome::Rejected(RejectReason::InvalidTimestamp);
        };
        let skew_secs = (now.timestamp() - sent_at).abs();
        if skew_secs > MAX_SKEW_SECS {
            return AuthOutcome::Rejected(RejectReason::TimestampOutOfWindow { skew_secs });
        }

        let Some(expected) = compute_signature(secret.as_bytes(), timestamp, &event.raw_body) else {
            return AuthOutcome::Rejected(RejectReason::SignatureMismatch);
        };
        if signature.len() != expected.len()
            || !constant_time_eq(signature.as_bytes(), expected.as_bytes())
        {
            return AuthOutcome::Rejected(RejectReason::SignatureMismatch);
        }

        AuthOutcome::Allowed
    }
}

/// `v0=` followed by the hex HMAC-SHA256 of `v0:{timestamp}:{body}`.
pub fn compute_signature(secret: &[u8], timestamp: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(format!("{VERSION}:{timestamp}:").as_bytes());
    mac.update(body);
    Some(format!("{VERSION}={}", hex_encode(&mac.finalize().into_bytes())))
}

/// Encode bytes to a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Constant-time byte comparison (XOR-based).
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Map, Value};

    const SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";
    const BODY: &str = r#"{"type":"event_callback","event":{"type":"message","text":"hi"}}"#;

    fn credentials() -> CredentialData {
        let mut fields = Map::new();
        fields.insert(SECRET_FIELD.to_string(), Value::String(SECRET.to_string()));
        CredentialData::new(fields)
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn signed_event(timestamp: i64, body: &str) -> InboundEvent {
        let ts = timestamp.to_string();
        let signature = compute_signature(SECRET.as_bytes(), &ts, body.as_bytes()).unwrap();
        InboundEvent::new("slack/team", body.to_string())
            .with_header("X-Slack-Signature", signature)
            .with_header("X-Slack-Request-Timestamp", ts)
    }

    fn verify(event: &InboundEvent) -> AuthOutcome {
        SigningSecretAuthenticator::new().verify(&credentials(), event, now())
    }

    #[test]
    fn test_valid_signature_allowed() {
        let event = signed_event(now().timestamp(), BODY);
        assert_eq!(verify(&event), AuthOutcome::Allowed);
    }

    #[test]
    fn test_one_byte_tamper_rejected() {
        let signed = signed_event(now().timestamp(), BODY);
        let mut tampered = BODY.as_bytes().to_vec();
        tampered[BODY.len() - 4] ^= 0x01;

        let mut event = InboundEvent::new("slack/team", tampered);
        for (name, value) in signed.headers() {
            event = event.with_header(name, value.clone());
        }
        assert_eq!(
            verify(&event),
            AuthOutcome::Rejected(RejectReason::SignatureMismatch)
        );
    }

    #[test]
    fn test_skew_boundary() {
        let inside = signed_event(now().timestamp() - 299, BODY);
        assert_eq!(verify(&inside), AuthOutcome::Allowed);

        let edge = signed_event(now().timestamp() - 300, BODY);
        assert_eq!(verify(&edge), AuthOutcome::Allowed);

        let outside = signed_event(now().timestamp() - 301, BODY);
        assert_eq!(
            verify(&outside),
            AuthOutcome::Rejected(RejectReason::TimestampOutOfWindow { skew_secs: 301 })
        );

        let future = signed_event(now().timestamp() + 301, BODY);
        assert!(matches!(verify(&future), AuthOutcome::Rejected(_)));
    }

    #[test]
    fn test_missing_headers_rejected() {
        let event = InboundEvent::new("slack/team", BODY);
        assert_eq!(
            verify(&event),
            AuthOutcome::Rejected(RejectReason::MissingHeader(SIGNATURE_HEADER))
        );

        let event = InboundEvent::new("slack/team", BODY).with_header(SIGNATURE_HEADER, "v0=00");
        assert_eq!(
            verify(&event),
            AuthOutcome::Rejected(RejectReason::MissingHeader(TIMESTAMP_HEADER))
        );
    }

    #[test]
    fn test_non_numeric_timestamp_rejected() {
        let event = InboundEvent::new("slack/team", BODY)
            .with_header(SIGNATURE_HEADER, "v0=00")
            .with_header(TIMESTAMP_HEADER, "yesterday");
        assert_eq!(
            verify(&event),
            AuthOutcome::Rejected(RejectReason::InvalidTimestamp)
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let event = InboundEvent::new("slack/team", BODY)
            .with_header(SIGNATURE_HEADER, "v0=abc")
            .with_header(TIMESTAMP_HEADER, now().timestamp().to_string());
        assert_eq!(
            verify(&event),
            AuthOutcome::Rejected(RejectReason::SignatureMismatch)
        );
    }

    #[test]
    fn test_no_secret_is_not_applicable() {
        let event = InboundEvent::new("slack/team", BODY);
        let outcome = SigningSecretAuthenticator::new().verify(&CredentialData::default(), &event, now());
        assert_eq!(outcome, AuthOutcome::NotApplicable);
    }

    #[test]
    fn test_signature_format() {
        let signature = compute_signature(b"secret", "1531420618", b"body").unwrap();
        assert!(signature.starts_with("v0="));
        assert_eq!(signature.len(), 3 + 64);
    }

    #[test]
    fn test_hmac_sha256_rfc4231_vector2() {
        let mut mac = HmacSha256::new_from_slice(b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?");
        assert_eq!(
            hex_encode(&mac.finalize().into_bytes()),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
