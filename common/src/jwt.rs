use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    env_config::JwtConfig,
    error::{AppError, Res},
};

/// Caller identity issued by the host application.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    pub user_id: Uuid,
    pub exp: usize,
}

/// Generates a JWT token for the given user and JWT configuration options
pub fn generate_jwt(user_id: Uuid, config: &JwtConfig) -> Res<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.expiration_hours))
        .ok_or_else(|| AppError::Internal("JWT expiration overflow".to_string()))?
        .timestamp();

    let claims = JwtClaims {
        user_id,
        exp: expiration as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Extracts claims object from JWT token.
/// Requires JWT secret.
pub fn validate_jwt(token: &str, secret: &str) -> Res<JwtClaims> {
    let token_data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
        }
    }

    #[test]
    fn issued_token_validates() {
        let user_id = Uuid::new_v4();
        let token = generate_jwt(user_id, &config()).unwrap();
        let claims = validate_jwt(&token, "test-secret").unwrap();
        assert_eq!(claims.user_id, user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt(Uuid::new_v4(), &config()).unwrap();
        assert!(matches!(
            validate_jwt(&token, "other-secret"),
            Err(AppError::JWT(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let expired = JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: -2,
        };
        let token = generate_jwt(Uuid::new_v4(), &expired).unwrap();
        assert!(validate_jwt(&token, "test-secret").is_err());
    }
}
