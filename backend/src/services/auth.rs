//! Authentication service for user registration, login, and token management

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use shared::models::User;
use shared::validation::{validate_email, validate_login, validate_password};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

/// Input for registering a new user
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub login: String,
    pub password: String,
    pub email: String,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub login: String,
    pub password: String,
}

/// Input for refreshing a token pair
#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub token_type: String,
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
}

/// User row from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    login: String,
    first_name: Option<String>,
    middle_name: Option<String>,
    last_name: Option<String>,
    email: String,
    password_hash: String,
    deleted: bool,
}

impl UserRow {
    fn into_model(self) -> User {
        User {
            id: self.id,
            login: self.login,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            email: self.email,
            deleted: self.deleted,
        }
    }
}

const USER_COLUMNS: &str =
    "id, login, first_name, middle_name, last_name, email, password_hash, deleted";

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

    /// Register a new user
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        validate_login(&input.login).map_err(|msg| AppError::Validation {
            field: "login".to_string(),
            message: msg.to_string(),
        })?;
        validate_email(&input.email).map_err(|msg| AppError::Validation {
            field: "email".to_string(),
            message: msg.to_string(),
        })?;
        validate_password(&input.password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
        })?;

        // Check login/email uniqueness up front for a friendly error; the
        // unique constraints stay authoritative.
        let taken = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE login = $1 OR email = $2",
        )
        .bind(&input.login)
        .bind(&input.email)
        .fetch_one(&self.db)
        .await?;

        if taken > 0 {
            return Err(AppError::DuplicateEntry("login or email".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (login, first_name, middle_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&input.login)
        .bind(&input.first_name)
        .bind(&input.middle_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(login = %input.login, "user registered");

        Ok(row.into_model())
    }

    /// Log a user in, returning an access/refresh token pair
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE login = $1 AND deleted = FALSE"
        ))
        .bind(&input.login)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &row.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        self.generate_tokens(row.id)
    }

    /// Exchange a refresh token for a fresh token pair
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let claims = self.decode_token(&input.refresh_token)?;

        if claims.token_type != "refresh" {
            return Err(AppError::InvalidToken);
        }

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        // The account must still exist and be active
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND deleted = FALSE)",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        if !active {
            return Err(AppError::InvalidToken);
        }

        self.generate_tokens(user_id)
    }

    /// Get the current user's profile
    pub async fn me(&self, user_id: Uuid) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted = FALSE"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(row.into_model())
    }

    fn generate_tokens(&self, user_id: Uuid) -> AppResult<AuthTokens> {
        let access_token = self.encode_token(user_id, "access", self.access_token_expiry)?;
        let refresh_token = self.encode_token(user_id, "refresh", self.refresh_token_expiry)?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    fn encode_token(&self, user_id: Uuid, token_type: &str, expiry: i64) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            token_type: token_type.to_string(),
            exp: (now + Duration::seconds(expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    fn decode_token(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })
    }
}
