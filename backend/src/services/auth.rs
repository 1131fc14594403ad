//! Authentication service for login and token management

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::{AgentGroup, Principal};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // User ID
    pub username: String,
    pub is_admin: bool,
    pub groups: Vec<AgentGroup>,
    pub supplier_id: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Authentication tokens
#[derive(Debug, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub principal: Principal,
}

/// User credentials row
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    username: String,
    password_hash: String,
    is_admin: bool,
    is_active: bool,
}

/// Account state re-read on every authenticated request
#[derive(Debug, Clone, sqlx::FromRow)]
struct AccountRow {
    username: String,
    is_admin: bool,
    is_active: bool,
}

fn account_disabled() -> AppError {
    AppError::Unauthorized {
        message: "Account is disabled".to_string(),
        message_fr: "Ce compte est désactivé".to_string(),
    }
}

/// Tokens of removed or deactivated accounts stop working immediately
fn ensure_active(account: Option<AccountRow>) -> AppResult<AccountRow> {
    match account {
        Some(account) if account.is_active => Ok(account),
        Some(_) => Err(account_disabled()),
        None => Err(AppError::InvalidToken),
    }
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
            refresh_token_expiry: config.jwt.refresh_token_expiry,
        }
    }

    /// Authenticate user with username and password
    pub async fn login(&self, username: &str, password: &str) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, username, password_hash, is_admin, is_active
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(account_disabled());
        }

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            tracing::warn!(username = %username, "Failed login attempt");
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let principal = self.load_principal(user.id, user.is_admin).await?;
        let tokens = self.generate_tokens(&user.username, principal)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        tracing::info!(username = %user.username, role = ?tokens.principal.role(), "User logged in");

        Ok(tokens)
    }

    /// Rotate a refresh token and issue a new access token
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthTokens> {
        let token_hash = hash_token(refresh_token);

        let mut tx = self.db.begin().await?;

        let (user_id, username, is_admin) = sqlx::query_as::<_, (Uuid, String, bool)>(
            r#"
            UPDATE refresh_tokens rt
            SET revoked_at = NOW()
            FROM users u
            WHERE u.id = rt.user_id
              AND rt.token_hash = $1
              AND rt.expires_at > NOW()
              AND rt.revoked_at IS NULL
              AND u.is_active = true
            RETURNING u.id, u.username, u.is_admin
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Unauthorized {
            message: "Invalid or expired refresh token".to_string(),
            message_fr: "Jeton de rafraîchissement invalide ou expiré".to_string(),
        })?;

        tx.commit().await?;

        let principal = self.load_principal(user_id, is_admin).await?;
        let tokens = self.generate_tokens(&username, principal)?;
        self.store_refresh_token(user_id, &tokens.refresh_token).await?;

        Ok(tokens)
    }

    /// Validate access token and return claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        decode_claims(token, &self.jwt_secret)
    }

    /// Resolve a bearer token to the account's current username and principal.
    ///
    /// The token only proves identity. Admin flag, groups and supplier link
    /// are read from the database so role changes apply on the next request.
    pub async fn authenticate(&self, token: &str) -> AppResult<(String, Principal)> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        let account = sqlx::query_as::<_, AccountRow>(
            "SELECT username, is_admin, is_active FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        let account = ensure_active(account)?;

        let principal = self.load_principal(user_id, account.is_admin).await?;
        Ok((account.username, principal))
    }

    /// Group memberships and supplier link that make up a principal
    async fn load_principal(&self, user_id: Uuid, is_admin: bool) -> AppResult<Principal> {
        let groups = sqlx::query_scalar::<_, AgentGroup>(
            "SELECT agent_group FROM user_groups WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let supplier_id = sqlx::query_scalar::<_, String>(
            "SELECT id FROM suppliers WHERE user_id = $1 AND is_active = true",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(Principal {
            user_id,
            is_admin,
            groups,
            supplier_id,
        })
    }

    /// Generate access and refresh tokens
    fn generate_tokens(&self, username: &str, principal: Principal) -> AppResult<AuthTokens> {
        let now = Utc::now();
        let access_exp = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: principal.user_id.to_string(),
            username: username.to_string(),
            is_admin: principal.is_admin,
            groups: principal.groups.clone(),
            supplier_id: principal.supplier_id.clone(),
            exp: access_exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode_claims(&claims, &self.jwt_secret)?;

        // Refresh token (opaque random value)
        let refresh_token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
            principal,
        })
    }

    /// Store refresh token in database
    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let token_hash = hash_token(token);
        let expires_at = Utc::now() + Duration::seconds(self.refresh_token_expiry);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

fn encode_claims(claims: &Claims, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

fn decode_claims(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

/// Hash a refresh token for storage (SHA-256, URL-safe base64)
fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}
