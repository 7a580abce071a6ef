use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{QrCode, UserId};

static SHARE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"add-friend/(\d+)").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("QRコードの内容を入力してください")]
    Empty,
    #[error("無効なQRコードです")]
    InvalidCode,
}

pub fn build_share_url(base: &str, user_id: UserId) -> String {
    format!("{}/add-friend/{}", base.trim_end_matches('/'), user_id)
}

/// Takes the digits after the first `add-friend/` anywhere in the text.
pub fn parse_share_url(text: &str) -> Result<UserId, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    SHARE_ID
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<UserId>().ok())
        .ok_or(ParseError::InvalidCode)
}

pub struct QrInvite {
    api: Arc<dyn ApiClient>,
    share_base_url: String,
}

impl QrInvite {
    pub fn new(api: Arc<dyn ApiClient>, share_base_url: impl Into<String>) -> Self {
        Self {
            api,
            share_base_url: share_base_url.into(),
        }
    }

    pub async fn fetch_code(&self) -> Result<QrCode, AppError> {
        self.api.fetch_qr_code().await
    }

    pub fn share_url(&self, user_id: UserId) -> String {
        build_share_url(&self.share_base_url, user_id)
    }

    /// Returns the server's confirmation text.
    pub async fn send_request_from_code(&self, text: &str) -> Result<String, AppError> {
        let user_id = parse_share_url(text)?;
        let message = self.api.add_friend(user_id).await?;
        info!("Friend request sent to user {} via share code", user_id);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_url_round_trips_through_parser() {
        let url = build_share_url("https://x/", 42);
        assert_eq!(url, "https://x/add-friend/42");
        assert_eq!(parse_share_url(&url), Ok(42));
    }

    #[test]
    fn parses_any_text_containing_the_segment() {
        assert_eq!(parse_share_url("https://x/add-friend/42"), Ok(42));
        assert_eq!(parse_share_url("timetable-share://add-friend/7"), Ok(7));
        assert_eq!(parse_share_url("  see add-friend/15?ref=qr "), Ok(15));
    }

    #[test]
    fn other_shapes_are_invalid() {
        assert_eq!(parse_share_url("https://x/nope"), Err(ParseError::InvalidCode));
        assert_eq!(parse_share_url("https://x/add-friend/abc"), Err(ParseError::InvalidCode));
        assert_eq!(
            parse_share_url("https://x/add-friend/99999999999999999999999"),
            Err(ParseError::InvalidCode)
        );
        assert_eq!(parse_share_url("   "), Err(ParseError::Empty));
    }
}
