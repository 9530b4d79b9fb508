use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use types::errors::AuthError;
use types::ids::UserId;

/// JWT claims issued by the external identity system
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The stable user identifier
    pub sub: UserId,
    pub email: String,
    pub exp: usize,
}

/// Verifies bearer tokens for both the REST surface and the socket
/// handshake. Tokens are never minted here; credential issuance belongs
/// to the external identity system.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Verify a bearer token and resolve the user it belongs to
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            AuthError::InvalidToken {
                reason: e.to_string(),
            }
        })?;
        Ok(data.claims.sub)
    }
}

/// Extract a bearer token from an Authorization header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ")
}

/// The verified identity attached to a request
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .ok_or(AuthError::MissingCredentials)?;
        let header_str = header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid header string".into()))?;
        let token = bearer_token(header_str).ok_or(AuthError::MissingCredentials)?;

        let user_id = state.verifier.verify(token)?;
        Ok(AuthenticatedUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn issue(secret: &str, user_id: UserId) -> String {
        let claims = Claims {
            sub: user_id,
            email: "test@example.com".to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_round_trip() {
        let verifier = TokenVerifier::new("test-secret");
        let user_id = UserId::new();
        let token = issue("test-secret", user_id);

        assert_eq!(verifier.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let verifier = TokenVerifier::new("right-secret");
        let token = issue("wrong-secret", UserId::new());

        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let verifier = TokenVerifier::new("test-secret");
        let claims = Claims {
            sub: UserId::new(),
            email: "test@example.com".to_string(),
            exp: (chrono::Utc::now().timestamp() - 3600) as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Basic abc123"), None);
        assert_eq!(bearer_token(""), None);
    }
}
