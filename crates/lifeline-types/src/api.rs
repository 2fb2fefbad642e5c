use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// JWT claims shared by the HTTP middleware and the gateway upgrade check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_no: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub organization_address: String,
    #[serde(default)]
    pub profession: String,
    #[serde(default)]
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub org_pincode: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Profile --

/// Body of `PUT /me`. Omitted fields are left alone. Unknown fields,
/// `username` included, are ignored: handles cannot be changed.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub organization_name: Option<String>,
    pub organization_address: Option<String>,
    pub profession: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub org_pincode: Option<String>,
}
