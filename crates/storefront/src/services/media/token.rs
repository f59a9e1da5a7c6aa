//! HS256 JSON Web Tokens for the image API.
//!
//! The API expects a short-lived token whose issuer is the access key,
//! signed with the secret key.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::MediaError;

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 1800;

/// Clock skew allowance applied to `nbf`.
pub const NOT_BEFORE_SKEW_SECS: i64 = 5;

#[derive(Debug, Serialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
}

/// Registered claims carried by the token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub iss: String,
    pub exp: i64,
    pub nbf: i64,
}

impl Claims {
    /// Claims for a token issued at `now` (Unix seconds).
    #[must_use]
    pub fn issued_at(access_key: &str, now: i64) -> Self {
        Self {
            iss: access_key.to_string(),
            exp: now + TOKEN_TTL_SECS,
            nbf: now - NOT_BEFORE_SKEW_SECS,
        }
    }
}

/// Sign `claims` into a compact `header.payload.signature` token.
///
/// # Errors
///
/// Returns [`MediaError::Token`] if the claims cannot be serialized or the
/// key is rejected.
pub fn sign(claims: &Claims, secret: &[u8]) -> Result<String, MediaError> {
    let header = Header {
        alg: "HS256",
        typ: "JWT",
    };
    let header = serde_json::to_vec(&header).map_err(|e| MediaError::Token(e.to_string()))?;
    let payload = serde_json::to_vec(claims).map_err(|e| MediaError::Token(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(payload)
    );

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).map_err(|e| MediaError::Token(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_window() {
        let claims = Claims::issued_at("ak", 1_700_000_000);
        assert_eq!(claims.iss, "ak");
        assert_eq!(claims.exp, 1_700_001_800);
        assert_eq!(claims.nbf, 1_699_999_995);
    }

    #[test]
    fn test_token_structure_and_signature() {
        let claims = Claims::issued_at("access-key", 1_700_000_000);
        let token = sign(&claims, b"secret-key").unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        assert!(!token.contains('='));

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header, serde_json::json!({ "alg": "HS256", "typ": "JWT" }));

        let decoded: Claims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(decoded, claims);

        let mut mac = Hmac::<Sha256>::new_from_slice(b"secret-key").unwrap();
        mac.update(format!("{}.{}", parts[0], parts[1]).as_bytes());
        let signature = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        assert!(mac.verify_slice(&signature).is_ok());
    }

    #[test]
    fn test_different_secret_different_signature() {
        let claims = Claims::issued_at("ak", 0);
        let a = sign(&claims, b"one").unwrap();
        let b = sign(&claims, b"two").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.rsplit_once('.').unwrap().0, b.rsplit_once('.').unwrap().0);
    }
}
