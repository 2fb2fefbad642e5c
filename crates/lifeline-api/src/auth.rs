use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{error, info};
use uuid::Uuid;

use lifeline_db::Database;
use lifeline_db::models::NewUser;
use lifeline_types::api::{Claims, LoginRequest, SignupRequest, TokenResponse};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub token_days: i64,
}

/// Handles are 3-32 chars of ASCII letters, digits or underscore.
pub fn valid_username(username: &str) -> bool {
    (3..=32).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let username = req.username.trim().to_lowercase();

    // Validate input
    if !valid_username(&username) {
        return Err(StatusCode::BAD_REQUEST);
    }
    if req.password.len() < 8 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user_id = Uuid::new_v4();
    let db_state = state.clone();
    let new_user = NewUser {
        id: user_id.to_string(),
        username: username.clone(),
        password_hash: String::new(),
        first_name: req.first_name.trim().to_lowercase(),
        last_name: req.last_name.trim().to_lowercase(),
        email: req.email,
        phone_no: req.phone_no,
        address: req.address,
        pincode: req.pincode,
        organization_name: req.organization_name,
        organization_address: req.organization_address,
        profession: req.profession.trim().to_lowercase(),
        location: req.location,
        latitude: req.latitude,
        longitude: req.longitude,
        org_pincode: req.org_pincode,
    };
    let password = req.password;

    // Hashing and the insert both block, keep them off the runtime
    tokio::task::spawn_blocking(move || {
        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .to_string();

        db_state
            .db
            .create_user(&NewUser {
                password_hash,
                ..new_user
            })
            .map_err(|e| {
                // The UNIQUE index is the only username check, so racing
                // signups for one name still get a clean 409
                if lifeline_db::is_unique_violation(&e) {
                    return StatusCode::CONFLICT;
                }
                error!("create_user failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    let token = create_token(&state.jwt_secret, state.token_days, user_id, &username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("Signed up {} ({})", username, user_id);
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            user_id,
            username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let username = req.username.trim().to_lowercase();
    let db_state = state.clone();

    let user = tokio::task::spawn_blocking(move || {
        let user = db_state
            .db
            .get_user_by_username(&username)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        // Verify password
        let parsed_hash =
            PasswordHash::new(&user.password).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        Ok::<_, StatusCode>(user)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    let user_id: Uuid = user.id.parse().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let token = create_token(&state.jwt_secret, state.token_days, user_id, &user.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(TokenResponse {
        user_id,
        username: user.username,
        token,
    }))
}

pub fn create_token(
    secret: &str,
    days: i64,
    user_id: Uuid,
    username: &str,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(days)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
