use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::{error, info};

use lifeline_db::models::ProfileChanges;
use lifeline_types::api::{Claims, ProfileUpdate};
use lifeline_types::models::UserProfile;

use crate::auth::AppState;

/// `GET /me`: the caller's own profile.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserProfile>, StatusCode> {
    let db_state = state.clone();
    let user_id = claims.sub.to_string();

    let user = tokio::task::spawn_blocking(move || db_state.db.get_user_by_id(&user_id))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(lifeline_gateway::views::profile(&user)))
}

/// Normalize an update the same way signup normalizes a new profile.
fn changes_from(req: ProfileUpdate) -> ProfileChanges {
    let folded = |v: Option<String>| v.map(|s| s.trim().to_lowercase());
    ProfileChanges {
        first_name: folded(req.first_name),
        last_name: folded(req.last_name),
        email: req.email,
        phone_no: req.phone_no,
        address: req.address,
        pincode: req.pincode,
        organization_name: req.organization_name,
        organization_address: req.organization_address,
        profession: folded(req.profession),
        location: req.location,
        latitude: req.latitude,
        longitude: req.longitude,
        org_pincode: req.org_pincode,
    }
}

/// `PUT /me`: edit the caller's own profile. The target is always the
/// token's subject, so nobody can edit another user.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, StatusCode> {
    if [req.latitude, req.longitude]
        .iter()
        .flatten()
        .any(|v| !v.is_finite())
    {
        return Err(StatusCode::BAD_REQUEST);
    }

    let db_state = state.clone();
    let user_id = claims.sub.to_string();
    let changes = changes_from(req);

    let user = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        if !db_state.db.update_profile(&user_id, &changes)? {
            return Ok(None);
        }
        db_state.db.get_user_by_id(&user_id)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("update_profile failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .ok_or(StatusCode::NOT_FOUND)?;

    info!("{} updated their profile", user.username);
    Ok(Json(lifeline_gateway::views::profile(&user)))
}
