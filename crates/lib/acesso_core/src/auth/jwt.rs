//! HS512 JWT signing and state decoding.
//!
//! The same symmetric key (the application secret) verifies the inbound
//! `state` and signs the outbound assertion.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::AuthError;

/// Signature algorithm for state and assertions.
pub const ALGORITHM: Algorithm = Algorithm::HS512;

/// Sign `claims` with `secret` (HS512). No registered claims are added.
pub fn sign<T: Serialize>(claims: &T, secret: &[u8]) -> Result<String, AuthError> {
    encode(
        &Header::new(ALGORITHM),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
}

/// Validation rules for tokens issued by a client.
///
/// No registered claim is required; `exp`, when present, is still enforced.
fn client_validation() -> Validation {
    let mut validation = Validation::new(ALGORITHM);
    validation.required_spec_claims.clear();
    validation.validate_aud = false;
    validation
}

/// Decode a client-signed token into its raw claim map.
///
/// Any signature or decoding failure is reported as [`AuthError::InvalidState`].
pub fn decode_claims(token: &str, secret: &[u8]) -> Result<Map<String, Value>, AuthError> {
    decode::<Map<String, Value>>(token, &DecodingKey::from_secret(secret), &client_validation())
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "state rejected");
            AuthError::InvalidState
        })
}

/// Verify and decode a token this service signed, e.g. an assertion.
pub fn verify<T: serde::de::DeserializeOwned>(token: &str, secret: &[u8]) -> Option<T> {
    decode::<T>(token, &DecodingKey::from_secret(secret), &client_validation())
        .ok()
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signed_claims_decode_with_same_secret() {
        let token = sign(&json!({"client_id": "abc", "uuid": "x"}), b"secret-a").unwrap();
        let claims = decode_claims(&token, b"secret-a").unwrap();
        assert_eq!(claims["client_id"], "abc");
        assert_eq!(claims["uuid"], "x");
    }

    #[test]
    fn other_secret_is_invalid_state() {
        let token = sign(&json!({"client_id": "abc"}), b"secret-a").unwrap();
        assert!(matches!(
            decode_claims(&token, b"secret-b"),
            Err(AuthError::InvalidState)
        ));
    }

    #[test]
    fn garbage_is_invalid_state() {
        assert!(matches!(
            decode_claims("not-a-jwt", b"secret-a"),
            Err(AuthError::InvalidState)
        ));
    }

    #[test]
    fn other_algorithm_is_rejected() {
        let token = encode(
            &Header::new(Algorithm::HS256),
            &json!({"client_id": "abc", "uuid": "x"}),
            &EncodingKey::from_secret(b"secret-a"),
        )
        .unwrap();
        assert!(decode_claims(&token, b"secret-a").is_err());
    }

    #[test]
    fn expired_state_is_rejected() {
        let token = sign(
            &json!({"client_id": "abc", "uuid": "x", "exp": 1_000}),
            b"secret-a",
        )
        .unwrap();
        assert!(decode_claims(&token, b"secret-a").is_err());
    }

    #[test]
    fn header_names_hs512() {
        let token = sign(&json!({"a": 1}), b"k").unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::HS512);
    }
}
