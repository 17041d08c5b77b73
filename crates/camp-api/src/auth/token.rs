use bson::oid::ObjectId;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// How long a password reset token stays valid.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Sign a session token for `user`.
pub fn issue(user: &ObjectId, secret: &str, expire_days: i64) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.to_hex(),
        iat: now.timestamp(),
        exp: (now + Duration::days(expire_days)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Upstream(format!("jwt encode: {e}")))
}

/// The user id of a valid, unexpired token.
pub fn verify(token: &str, secret: &str) -> Option<ObjectId> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| tracing::debug!(error = %e, "rejected token"))
    .ok()?;
    ObjectId::parse_str(&data.claims.sub).ok()
}

/// A fresh reset token: the plain value to mail and the digest to store.
pub fn reset_token() -> (String, String) {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    let plain = hex::encode(bytes);
    let digest = hash_reset_token(&plain);
    (plain, digest)
}

pub fn hash_reset_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify() {
        let id = ObjectId::new();
        let token = issue(&id, "s3cret", 30).unwrap();
        assert_eq!(verify(&token, "s3cret"), Some(id));
        assert_eq!(verify(&token, "other"), None);
        assert_eq!(verify("not.a.token", "s3cret"), None);
    }

    #[test]
    fn expired_token_rejected() {
        let id = ObjectId::new();
        let token = issue(&id, "s3cret", -1).unwrap();
        assert_eq!(verify(&token, "s3cret"), None);
    }

    #[test]
    fn reset_digest_matches() {
        let (plain, digest) = reset_token();
        assert_eq!(plain.len(), 40);
        assert_eq!(hash_reset_token(&plain), digest);
        assert_ne!(plain, digest);
    }
}
