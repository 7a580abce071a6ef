use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub type UserId = i64;

/// The authenticated user, as cached in the session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    pub user_id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub hobbies: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

/// Only the fields that are set are sent; the server leaves the rest alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &ProfileUpdate::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QrCode {
    /// `data:image/png;base64,...`
    pub qr_code: String,
    pub username: String,
    pub user_id: UserId,
}

impl QrCode {
    pub fn png_bytes(&self) -> Result<Vec<u8>, AppError> {
        let encoded = self
            .qr_code
            .split_once("base64,")
            .map(|(_, data)| data)
            .ok_or_else(|| AppError::Decode("QR code is not a base64 data URL".to_string()))?;

        STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::Decode(format!("QR code image: {}", e)))
    }

    pub async fn save_png(&self, path: &Path) -> Result<(), AppError> {
        let png = self.png_bytes()?;
        tokio::fs::write(path, png).await.map_err(|source| AppError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
