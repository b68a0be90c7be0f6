//! Authentication: session tokens, credentials and identity resolution

use crate::ApiError;
use crate::config::{GatewayConfig, UserCredential};
use chrono::{DateTime, Duration, Utc};
use filegate_engine::Identity;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Identity attached to every request when authentication is disabled
pub const DEV_IDENTITY: &str = "dev-user";

/// Key derivation context for login password digests
const PASSWORD_CONTEXT: &str = "filegate 2024-06-01 login password";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (the identity, usually an email)
    pub sub: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// A freshly signed session token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 session tokens
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
    audience: Option<String>,
    ttl: Duration,
}

impl TokenAuthority {
    pub fn new(
        secret: &str,
        issuer: Option<String>,
        audience: Option<String>,
        ttl_secs: u64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = &issuer {
            validation.set_issuer(&[iss]);
        }
        match &audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::days(365));

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            issuer,
            audience,
            ttl,
        }
    }

    /// Build from gateway settings; `None` without a usable secret
    pub fn from_config(config: &GatewayConfig) -> Option<Self> {
        let secret = config.jwt_secret.as_deref().filter(|s| !s.is_empty())?;
        Some(Self::new(
            secret,
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
            config.token_ttl_secs,
        ))
    }

    /// Sign a session token for an authenticated identity
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken, ApiError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: identity.as_str().to_string(),
            exp: expires_at.timestamp(),
            iat: Some(now.timestamp()),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Validate a JWT token and extract claims
    pub fn validate(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                ApiError::unauthenticated("Invalid or expired token")
            })
    }
}

/// Turn verified claims into the caller's identity
pub fn identity_from_claims(claims: Claims) -> Result<Identity, ApiError> {
    Identity::new(claims.sub).ok_or_else(|| ApiError::unauthenticated("Token has no subject"))
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let (scheme, token) = auth_header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Digest stored in `users[].password_blake3`
pub fn password_digest(password: &str) -> blake3::Hash {
    blake3::Hash::from(blake3::derive_key(PASSWORD_CONTEXT, password.as_bytes()))
}

/// Check login credentials against the configured accounts
pub fn authenticate(
    users: &[UserCredential],
    email: &str,
    password: &str,
) -> Result<Identity, ApiError> {
    // Always derive, so unknown accounts cost the same as wrong passwords
    let presented = password_digest(password);

    users
        .iter()
        .find(|user| user.email.eq_ignore_ascii_case(email))
        .filter(|user| {
            // blake3::Hash equality is constant-time
            blake3::Hash::from_hex(&user.password_blake3)
                .is_ok_and(|stored| stored == presented)
        })
        .and_then(|user| Identity::new(user.email.clone()))
        .ok_or_else(|| ApiError::unauthenticated("Invalid email or password"))
}

/// Short, stable pseudonym for an identity, safe to put in logs
pub fn hash_identity(identity: &Identity) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"filegate:identity:"); // Domain separation
    hasher.update(identity.as_str().as_bytes());
    hex::encode(&hasher.finalize().as_bytes()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authority() -> TokenAuthority {
        TokenAuthority::new("test-secret", None, None, 3600)
    }

    fn alice() -> Identity {
        Identity::new("alice@example.com").unwrap()
    }

    fn create_test_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let authority = authority();
        let issued = authority.issue(&alice()).unwrap();
        let claims = authority.validate(&issued.token).unwrap();

        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(identity_from_claims(claims).unwrap(), alice());
    }

    #[test]
    fn test_expired_token() {
        let claims = Claims {
            sub: "alice@example.com".to_string(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
            iat: None,
            iss: None,
            aud: None,
        };

        let token = create_test_token(&claims, "test-secret");
        assert!(matches!(
            authority().validate(&token),
            Err(ApiError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let issued = TokenAuthority::new("other-secret", None, None, 3600)
            .issue(&alice())
            .unwrap();
        assert!(authority().validate(&issued.token).is_err());
    }

    #[test]
    fn test_issuer_and_audience_enforced() {
        let strict = TokenAuthority::new(
            "test-secret",
            Some("filegate".to_string()),
            Some("file-api".to_string()),
            3600,
        );

        let good = strict.issue(&alice()).unwrap();
        assert!(strict.validate(&good.token).is_ok());

        // Same secret, no iss/aud
        let bare = authority().issue(&alice()).unwrap();
        assert!(strict.validate(&bare.token).is_err());
    }

    #[test]
    fn test_blank_subject_rejected() {
        let claims = Claims {
            sub: "  ".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: None,
            iss: None,
            aud: None,
        };
        assert!(identity_from_claims(claims).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("BEARER  abc123 "), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic xyz"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }

    #[test]
    fn test_authenticate() {
        let users = vec![UserCredential {
            email: "alice@example.com".to_string(),
            password_blake3: password_digest("correct horse").to_hex().to_string(),
        }];

        assert_eq!(
            authenticate(&users, "alice@example.com", "correct horse").unwrap(),
            alice()
        );
        assert!(authenticate(&users, "alice@example.com", "battery staple").is_err());
        assert!(authenticate(&users, "bob@example.com", "correct horse").is_err());
    }

    #[test]
    fn test_hash_identity() {
        let hash1 = hash_identity(&alice());
        let hash2 = hash_identity(&alice());
        let hash3 = hash_identity(&Identity::new("bob@example.com").unwrap());

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 16);
    }
}
