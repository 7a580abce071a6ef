use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::User;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    /// Checks done before anything is sent.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.username.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation("すべてのフィールドを入力してください".to_string()));
        }
        if self.password != self.confirm_password {
            return Err(AppError::Validation("パスワードが一致しません".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "パスワードは{}文字以上で入力してください",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

pub struct Auth {
    api: Arc<dyn ApiClient>,
}

impl Auth {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self { api }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation("ユーザー名とパスワードを入力してください".to_string()));
        }
        let user = self.api.login(username.trim(), password).await?;
        info!("Logged in as {}", user.username);
        Ok(user)
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<User, AppError> {
        form.validate()?;
        let user = self
            .api
            .register(form.username.trim(), form.email.trim(), &form.password)
            .await?;
        info!("Registered {}", user.username);
        Ok(user)
    }

    /// The server-side logout is best effort; the caller clears the session regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!("Logout request failed: {}", e);
        }
    }
}
