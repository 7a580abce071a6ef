use std::sync::Arc;

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{Profile, ProfileUpdate};

pub struct ProfileView {
    api: Arc<dyn ApiClient>,
    profile: Option<Profile>,
}

impl ProfileView {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self { api, profile: None }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub async fn load(&mut self) -> Result<&Profile, AppError> {
        let profile = self.api.fetch_profile().await?;
        Ok(self.profile.insert(profile))
    }

    pub async fn update(&mut self, update: &ProfileUpdate) -> Result<&Profile, AppError> {
        if update.is_empty() {
            return Err(AppError::Validation("変更する項目がありません".to_string()));
        }
        let profile = self.api.update_profile(update).await?;
        Ok(self.profile.insert(profile))
    }
}
