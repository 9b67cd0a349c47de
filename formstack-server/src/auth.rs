use crate::config::AuthConfig;
use crate::database::{Database, RefreshTokenRecord};
use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::Engine;
use chrono::Utc;
use formstack_models::{AuthResponse, Role, User};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hash a password using Argon2id with OWASP recommended parameters
pub fn hash_password(password: &str) -> AppResult<String> {
    use argon2::password_hash::rand_core::OsRng;
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against an Argon2id hash
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,      // Subject (user ID)
    pub username: String, // Username for convenience
    pub role: Role,
    pub exp: i64, // Expiration time (Unix timestamp)
    pub iat: i64, // Issued at (Unix timestamp)
}

impl Claims {
    pub fn new(user_id: i64, username: String, role: Role, duration_seconds: i64) -> Self {
        let now = Utc::now().timestamp();

        Self {
            sub: user_id.to_string(),
            username,
            role,
            exp: now + duration_seconds,
            iat: now,
        }
    }

    pub fn user_id(&self) -> AppResult<i64> {
        self.sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Malformed token subject".to_string()))
    }
}

/// Generate a JWT token from claims
pub fn generate_token(claims: &Claims, secret: &str) -> AppResult<String> {
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate JWT token: {}", e)))?;

    Ok(token)
}

/// Validate and decode a JWT token
pub fn validate_token(token: &str, secret: &str) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Opaque 256-bit refresh token, URL-safe base64
pub fn generate_refresh_token() -> String {
    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&random_bytes)
}

/// Refresh tokens are stored only as their SHA-256 hex digest
pub fn hash_refresh_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Issues a fresh access/refresh pair for `user`.
///
/// When `rotated_from` is set, that refresh token is revoked and linked to
/// the new one in the same transaction.
pub fn issue_session(
    database: &Database,
    auth: &AuthConfig,
    user: &User,
    rotated_from: Option<&RefreshTokenRecord>,
) -> AppResult<AuthResponse> {
    let claims = Claims::new(
        user.id,
        user.name.clone(),
        user.role,
        auth.access_token_ttl_secs,
    );
    let access_token = generate_token(&claims, &auth.jwt_secret)?;

    let refresh_token = generate_refresh_token();
    let expires_at = Utc::now().timestamp() + auth.refresh_token_ttl_secs;
    let token_hash = hash_refresh_token(&refresh_token);

    match rotated_from {
        Some(previous) => {
            database.rotate_refresh_token(previous.id, user.id, &token_hash, expires_at)?;
        }
        None => {
            database.create_refresh_token(user.id, &token_hash, expires_at)?;
        }
    }

    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: auth.access_token_ttl_secs,
        user: user.info(),
    })
}

/// Resolves a presented refresh token to its live record.
///
/// A token that was already revoked is treated as stolen: every live token
/// of its owner is revoked before the request is rejected.
pub fn check_refresh_token(database: &Database, token: &str) -> AppResult<RefreshTokenRecord> {
    let record = database
        .get_refresh_token_by_hash(&hash_refresh_token(token))?
        .ok_or_else(|| AppError::Unauthorized("Unknown refresh token".to_string()))?;

    if record.revoked_at.is_some() {
        let revoked = database.revoke_all_refresh_tokens(record.user_id)?;
        tracing::warn!(
            "Refresh token reuse detected for user {}; revoked {} live tokens",
            record.user_id,
            revoked
        );
        return Err(AppError::Unauthorized(
            "Refresh token has already been used".to_string(),
        ));
    }

    if record.expires_at <= Utc::now().timestamp() {
        return Err(AppError::Unauthorized("Refresh token expired".to_string()));
    }

    Ok(record)
}
