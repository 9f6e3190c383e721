//! Signed session tokens.
//!
//! HS256 only, one configured key. Oversized tokens and anything that is not
//! three dot-separated segments are rejected before any cryptographic work.
//! Verification failures are typed so the middleware can surface distinct
//! machine codes.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use atlas_core::config::JwtConfig;

/// Hard cap applied before parsing; anything larger is rejected outright.
const MAX_TOKEN_BYTES: usize = 8192;
const MAX_ROLE_LEN: usize = 50;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token not valid yet")]
    NotYetValid,
    #[error("token malformed")]
    Malformed,
    #[error("bad signature")]
    BadSignature,
    #[error("wrong signing algorithm")]
    WrongAlgorithm,
    #[error("wrong issuer")]
    BadIssuer,
    #[error("wrong audience")]
    BadAudience,
    #[error("invalid user id in claims")]
    InvalidUserId,
    #[error("invalid org id in claims")]
    InvalidOrgId,
    #[error("no roles in claims")]
    NoRoles,
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: i64,
    #[serde(default)]
    pub org_id: i64,
    #[serde(default)]
    pub roles: Vec<String>,
    pub iss: String,
    pub aud: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    /// True when the token expires within `window` of now.
    pub fn expires_within(&self, window: Duration) -> bool {
        let remaining = self.exp - Utc::now().timestamp();
        remaining > 0 && remaining <= window.as_secs() as i64
    }

    pub fn has_any_role(&self, required: &[&str]) -> bool {
        required
            .iter()
            .any(|required| self.roles.iter().any(|role| role == required))
    }
}

#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiry: Duration,
}

impl JwtManager {
    pub fn new(config: &JwtConfig) -> Self {
        JwtManager {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiry: config.expiry,
        }
    }

    /// Issue a token for `(user_id, org_id, roles)`.
    pub fn issue(&self, user_id: i64, org_id: i64, roles: &[String]) -> Result<String, TokenError> {
        if user_id <= 0 {
            return Err(TokenError::InvalidInput(
                "user id must be positive".to_string(),
            ));
        }
        if org_id <= 0 {
            return Err(TokenError::InvalidInput(
                "organization id must be positive".to_string(),
            ));
        }
        let roles = sanitize_roles(roles);
        if roles.is_empty() {
            return Err(TokenError::InvalidInput(
                "at least one valid role is required".to_string(),
            ));
        }

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            org_id,
            roles,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            nbf: now,
            exp: now + self.expiry.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::InvalidInput(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        if token.len() > MAX_TOKEN_BYTES {
            return Err(TokenError::Malformed);
        }
        if token.split('.').count() != 3 {
            return Err(TokenError::Malformed);
        }

        let header = jsonwebtoken::decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != Algorithm::HS256 {
            return Err(TokenError::WrongAlgorithm);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::InvalidAlgorithm => TokenError::WrongAlgorithm,
                ErrorKind::InvalidIssuer => TokenError::BadIssuer,
                ErrorKind::InvalidAudience => TokenError::BadAudience,
                ErrorKind::MissingRequiredClaim(claim) if claim == "iss" => TokenError::BadIssuer,
                ErrorKind::MissingRequiredClaim(claim) if claim == "aud" => TokenError::BadAudience,
                _ => TokenError::Malformed,
            }
        })?;

        let claims = data.claims;
        if claims.sub <= 0 {
            return Err(TokenError::InvalidUserId);
        }
        if claims.org_id <= 0 {
            return Err(TokenError::InvalidOrgId);
        }
        if claims.roles.is_empty() {
            return Err(TokenError::NoRoles);
        }
        Ok(claims)
    }
}

/// Trim roles, drop empties and anything over the length cap.
pub fn sanitize_roles(roles: &[String]) -> Vec<String> {
    roles
        .iter()
        .map(|role| role.trim())
        .filter(|role| !role.is_empty() && role.len() <= MAX_ROLE_LEN)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> JwtManager {
        manager_with(Duration::from_secs(3600))
    }

    fn manager_with(expiry: Duration) -> JwtManager {
        JwtManager::new(&JwtConfig {
            secret: "0123456789abcdef0123456789abcdef".to_string(),
            issuer: "atlas-inventory".to_string(),
            audience: "atlas-inventory".to_string(),
            expiry,
        })
    }

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let jwt = manager();
        let token = jwt.issue(42, 7, &roles(&["org_admin", "viewer"])).unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.org_id, 7);
        assert_eq!(claims.roles, vec!["org_admin", "viewer"]);
        assert_eq!(claims.iss, "atlas-inventory");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn issue_rejects_bad_input() {
        let jwt = manager();
        assert!(matches!(
            jwt.issue(0, 1, &roles(&["viewer"])),
            Err(TokenError::InvalidInput(_))
        ));
        assert!(matches!(
            jwt.issue(1, -5, &roles(&["viewer"])),
            Err(TokenError::InvalidInput(_))
        ));
        assert!(matches!(
            jwt.issue(1, 1, &[]),
            Err(TokenError::InvalidInput(_))
        ));
        // All-invalid role sets sanitize down to empty.
        let long = "x".repeat(60);
        assert!(matches!(
            jwt.issue(1, 1, &roles(&["", "  ", &long])),
            Err(TokenError::InvalidInput(_))
        ));
    }

    #[test]
    fn roles_are_sanitized_on_issue() {
        let jwt = manager();
        let token = jwt
            .issue(1, 1, &roles(&["  org_admin  ", "", "viewer"]))
            .unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert_eq!(claims.roles, vec!["org_admin", "viewer"]);
    }

    #[test]
    fn garbage_tokens_are_malformed() {
        let jwt = manager();
        assert_eq!(jwt.verify("not-a-jwt"), Err(TokenError::Malformed));
        assert_eq!(jwt.verify("a.b"), Err(TokenError::Malformed));
        assert_eq!(jwt.verify("a.b.c.d"), Err(TokenError::Malformed));
        let huge = "x".repeat(9000);
        assert_eq!(jwt.verify(&huge), Err(TokenError::Malformed));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let jwt = manager();
        let token = jwt.issue(1, 1, &roles(&["viewer"])).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let tampered = "AAAAAAAAAAAAAAAAAAAAAA";
        parts[2] = tampered;
        let token = parts.join(".");
        assert_eq!(jwt.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let jwt = manager();
        let other = JwtManager::new(&JwtConfig {
            secret: "ffffffffffffffffffffffffffffffff".to_string(),
            issuer: "atlas-inventory".to_string(),
            audience: "atlas-inventory".to_string(),
            expiry: Duration::from_secs(3600),
        });
        let token = other.issue(1, 1, &roles(&["viewer"])).unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn wrong_algorithm_is_rejected() {
        // Token signed with HS384 must fail before signature checking.
        let jwt = manager();
        let claims = Claims {
            sub: 1,
            org_id: 1,
            roles: vec!["viewer".to_string()],
            iss: "atlas-inventory".to_string(),
            aud: "atlas-inventory".to_string(),
            iat: Utc::now().timestamp(),
            nbf: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::WrongAlgorithm));
    }

    #[test]
    fn wrong_issuer_and_audience_are_distinct() {
        let jwt = manager();
        let base = Claims {
            sub: 1,
            org_id: 1,
            roles: vec!["viewer".to_string()],
            iss: "someone-else".to_string(),
            aud: "atlas-inventory".to_string(),
            iat: Utc::now().timestamp(),
            nbf: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 600,
        };
        let key = EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef");

        let token = encode(&Header::new(Algorithm::HS256), &base, &key).unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::BadIssuer));

        let mut claims = base.clone();
        claims.iss = "atlas-inventory".to_string();
        claims.aud = "someone-else".to_string();
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::BadAudience));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = manager();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            org_id: 1,
            roles: vec!["viewer".to_string()],
            iss: "atlas-inventory".to_string(),
            aud: "atlas-inventory".to_string(),
            iat: now - 7200,
            nbf: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let jwt = manager();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            org_id: 1,
            roles: vec!["viewer".to_string()],
            iss: "atlas-inventory".to_string(),
            aud: "atlas-inventory".to_string(),
            iat: now,
            nbf: now + 3600,
            exp: now + 7200,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef"),
        )
        .unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::NotYetValid));
    }

    #[test]
    fn non_positive_claim_ids_are_distinct_errors() {
        let jwt = manager();
        let now = Utc::now().timestamp();
        let key = EncodingKey::from_secret(b"0123456789abcdef0123456789abcdef");
        let base = Claims {
            sub: 1,
            org_id: 1,
            roles: vec!["viewer".to_string()],
            iss: "atlas-inventory".to_string(),
            aud: "atlas-inventory".to_string(),
            iat: now,
            nbf: now,
            exp: now + 600,
        };

        let mut claims = base.clone();
        claims.sub = 0;
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::InvalidUserId));

        let mut claims = base.clone();
        claims.org_id = -1;
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::InvalidOrgId));

        let mut claims = base.clone();
        claims.roles = vec![];
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key).unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::NoRoles));
    }

    #[test]
    fn expiring_soon_detection() {
        let jwt = manager_with(Duration::from_secs(30 * 60));
        let token = jwt.issue(1, 1, &roles(&["viewer"])).unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert!(claims.expires_within(Duration::from_secs(3600)));
        assert!(!claims.expires_within(Duration::from_secs(60)));

        let jwt = manager_with(Duration::from_secs(24 * 3600));
        let token = jwt.issue(1, 1, &roles(&["viewer"])).unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert!(!claims.expires_within(Duration::from_secs(3600)));
    }

    #[test]
    fn role_intersection() {
        let jwt = manager();
        let token = jwt.issue(1, 1, &roles(&["viewer"])).unwrap();
        let claims = jwt.verify(&token).unwrap();
        assert!(claims.has_any_role(&["viewer", "org_admin"]));
        assert!(!claims.has_any_role(&["org_admin"]));
        assert!(!claims.has_any_role(&[]));
    }
}
