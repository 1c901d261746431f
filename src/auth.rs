//! App-token gate: HS256 JSON Web Tokens carrying a `uid` claim.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No app token provided")]
    MissingToken,

    #[error("APP_SECRET is not configured")]
    MissingSecret,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is not valid yet")]
    NotYetValid,

    #[error("Token carries no uid")]
    MissingUid,
}

#[derive(Deserialize)]
struct Header {
    alg: String,
}

#[derive(Deserialize)]
struct Claims {
    uid: Option<Value>,
    exp: Option<Value>,
    nbf: Option<Value>,
}

/// Verifies app tokens against the shared application secret
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Vec<u8>,
}

impl TokenVerifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AuthError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    /// Build from an optional configured secret
    pub fn from_secret(secret: Option<&str>) -> Result<Self, AuthError> {
        Self::new(secret.ok_or(AuthError::MissingSecret)?)
    }

    /// Check `token` and return the user id it was issued for
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<String, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let parts: Vec<&str> = token.split('.').collect();
        let [header_segment, payload_segment, signature_segment] = parts.as_slice() else {
            return Err(AuthError::Malformed(format!(
                "expected 3 segments, found {}",
                parts.len()
            )));
        };

        let header: Header = decode_json(header_segment, "header")?;
        if header.alg != "HS256" {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let signature = decode_segment(signature_segment, "signature")?;
        let mut mac = self.mac()?;
        mac.update(format!("{}.{}", header_segment, payload_segment).as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidSignature)?;

        let claims: Claims = decode_json(payload_segment, "payload")?;
        if let Some(exp) = claims.exp.as_ref().and_then(Value::as_f64) {
            if exp <= now as f64 {
                return Err(AuthError::Expired);
            }
        }
        if let Some(nbf) = claims.nbf.as_ref().and_then(Value::as_f64) {
            if nbf > now as f64 {
                return Err(AuthError::NotYetValid);
            }
        }

        match claims.uid {
            Some(Value::String(uid)) if !uid.is_empty() => Ok(uid),
            Some(Value::Number(uid)) if uid.as_f64() != Some(0.0) => Ok(uid.to_string()),
            _ => Err(AuthError::MissingUid),
        }
    }

    /// Issue a token for `claims`, signed with this secret
    pub fn sign(&self, claims: &Value) -> Result<String, AuthError> {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        let signing_input = format!("{}.{}", header, payload);

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::Malformed(format!("unusable secret: {}", e)))
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn decode_segment(segment: &str, part: &str) -> Result<Vec<u8>, AuthError> {
    URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| AuthError::Malformed(format!("{} is not base64url: {}", part, e)))
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str, part: &str) -> Result<T, AuthError> {
    let bytes = decode_segment(segment, part)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::Malformed(format!("{} is not valid JSON: {}", part, e)))
}

#[cfg(test)]
mod auth_tests {
    use super::*;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new("top-secret").unwrap()
    }

    #[test]
    fn test_valid_token_returns_uid() {
        let token = verifier().sign(&json!({"uid": "user-42", "exp": NOW + 60})).unwrap();
        assert_eq!(verifier().verify_at(&token, NOW).unwrap(), "user-42");
    }

    #[test]
    fn test_numeric_uid() {
        let token = verifier().sign(&json!({"uid": 7})).unwrap();
        assert_eq!(verifier().verify_at(&token, NOW).unwrap(), "7");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenVerifier::new("other").unwrap().sign(&json!({"uid": "u"})).unwrap();
        assert_eq!(
            verifier().verify_at(&token, NOW),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let token = verifier().sign(&json!({"uid": "alice"})).unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(br#"{"uid":"mallory"}"#);
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);
        assert_eq!(
            verifier().verify_at(&forged, NOW),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token() {
        let token = verifier().sign(&json!({"uid": "u", "exp": NOW})).unwrap();
        assert_eq!(verifier().verify_at(&token, NOW), Err(AuthError::Expired));
    }

    #[test]
    fn test_not_before_in_future_rejected() {
        let early = verifier().sign(&json!({"uid": "u", "nbf": NOW + 60})).unwrap();
        assert_eq!(verifier().verify_at(&early, NOW), Err(AuthError::NotYetValid));

        let ready = verifier().sign(&json!({"uid": "u", "nbf": NOW})).unwrap();
        assert_eq!(verifier().verify_at(&ready, NOW).unwrap(), "u");
    }

    #[test]
    fn test_missing_or_empty_uid() {
        for claims in [json!({"sub": "u"}), json!({"uid": ""}), json!({"uid": null})] {
            let token = verifier().sign(&claims).unwrap();
            assert_eq!(verifier().verify_at(&token, NOW), Err(AuthError::MissingUid));
        }
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"uid":"u"}"#);
        let token = format!("{}.{}.", header, payload);
        assert_eq!(
            verifier().verify_at(&token, NOW),
            Err(AuthError::UnsupportedAlgorithm("none".to_string()))
        );
    }

    #[test]
    fn test_malformed_tokens() {
        assert_eq!(verifier().verify_at("  ", NOW), Err(AuthError::MissingToken));
        assert!(matches!(
            verifier().verify_at("only.two", NOW),
            Err(AuthError::Malformed(_))
        ));
        assert!(matches!(
            verifier().verify_at("###.###.###", NOW),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_secret() {
        assert_eq!(TokenVerifier::from_secret(None).unwrap_err(), AuthError::MissingSecret);
        assert_eq!(TokenVerifier::new("").unwrap_err(), AuthError::MissingSecret);
    }

    #[test]
    fn test_debug_hides_secret() {
        assert!(!format!("{:?}", verifier()).contains("top-secret"));
    }
}
