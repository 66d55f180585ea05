use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// A new bank account. The backend keeps it inactive until an operator
/// has reviewed the registration document.
#[derive(Debug, Clone)]
pub struct Registration {
    pub id: String,
    pub name: String,
    pub password: String,
    pub document: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationAck {
    pub message: String,
    #[serde(default)]
    pub name: Option<String>,
}
