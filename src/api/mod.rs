pub mod dto;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::AppError;
use crate::models::{
    Conversation, ConversationId, Friend, FriendRequests, Message, Profile, ProfileUpdate, QrCode,
    TimetableRecord, User, UserId, UserResult,
};

pub const DEFAULT_API_URL: &str = "https://bluelink-app-lx59.onrender.com";
pub const DEFAULT_SESSION_PATH: &str = ".timetable-session.json";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub share_base_url: String,
    pub session_path: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            share_base_url: base_url.clone(),
            base_url,
            session_path: DEFAULT_SESSION_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("TIMETABLE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Url::parse(&base_url)
            .map_err(|e| AppError::Config(format!("TIMETABLE_API_URL is invalid: {}", e)))?;

        let mut config = Self::new(base_url);

        if let Ok(share) = env::var("TIMETABLE_SHARE_URL") {
            config.share_base_url = share.trim_end_matches('/').to_string();
        }
        if let Ok(path) = env::var("TIMETABLE_SESSION_PATH") {
            config.session_path = path;
        }
        if let Ok(secs) = env::var("TIMETABLE_HTTP_TIMEOUT_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| {
                AppError::Config("TIMETABLE_HTTP_TIMEOUT_SECS must be a number".to_string())
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// The remote timetable-sharing API. Every call is one request; nothing is retried.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<User, AppError>;
    async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, AppError>;
    async fn logout(&self) -> Result<(), AppError>;
    async fn current_user(&self) -> Result<User, AppError>;

    async fn fetch_timetable(&self) -> Result<Vec<TimetableRecord>, AppError>;
    async fn fetch_user_timetable(&self, user_id: UserId) -> Result<Vec<TimetableRecord>, AppError>;
    async fn upsert_cell(&self, req: &dto::UpsertCellRequest) -> Result<(), AppError>;

    async fn fetch_friends(&self) -> Result<Vec<Friend>, AppError>;
    async fn search_users(&self, query: &str) -> Result<Vec<UserResult>, AppError>;
    async fn fetch_friend_requests(&self) -> Result<FriendRequests, AppError>;
    async fn send_friend_request(&self, user_id: UserId) -> Result<(), AppError>;
    async fn accept_friend_request(&self, request_id: &str) -> Result<(), AppError>;
    async fn reject_friend_request(&self, request_id: &str) -> Result<(), AppError>;

    async fn fetch_qr_code(&self) -> Result<QrCode, AppError>;
    async fn add_friend(&self, user_id: UserId) -> Result<String, AppError>;

    async fn fetch_conversations(&self) -> Result<Vec<Conversation>, AppError>;
    async fn fetch_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>, AppError>;
    async fn start_conversation(&self, user_id: UserId) -> Result<Conversation, AppError>;
    async fn send_message(&self, conversation_id: ConversationId, content: &str) -> Result<Message, AppError>;
    async fn unread_count(&self) -> Result<u64, AppError>;

    async fn fetch_profile(&self) -> Result<Profile, AppError>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, AppError>;
}

pub struct HttpApiClient {
    client: Client,
    config: ApiConfig,
    jar: Arc<Jar>,
}

impl HttpApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config, jar })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Cookie header for the API host, as saved in the session record.
    pub fn cookie_header(&self) -> Option<String> {
        let url = Url::parse(&self.config.base_url).ok()?;
        self.jar
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    pub fn restore_cookies(&self, header: &str) {
        let Ok(url) = Url::parse(&self.config.base_url) else {
            return;
        };
        for cookie in header.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            self.jar.add_cookie_str(cookie, &url);
        }
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        Url::parse(&format!("{}{}", self.config.base_url, path))
            .map_err(|e| AppError::Config(format!("Invalid request url {}: {}", path, e)))
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Response, AppError> {
        debug!("{} {}", method, url.path());
        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = self.url(path)?;
        let response = self.request::<()>(Method::GET, url, None).await?;
        decode(response).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, AppError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path)?;
        let response = self.request(method, url, body).await?;
        decode(response).await
    }
}

async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<dto::ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("リクエストに失敗しました ({})", status));

    Err(AppError::Server {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let path = response.url().path().to_string();
    let body_text = response.text().await?;
    serde_json::from_str::<T>(&body_text).map_err(|e| {
        error!("Failed to parse {}: {}", path, e);
        AppError::Decode(format!("{}: {}", path, e))
    })
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        let body = dto::LoginRequest { username, password };
        let envelope: dto::UserEnvelope = self.send_json(Method::POST, "/api/auth/login", Some(&body)).await?;
        Ok(envelope.user)
    }

    async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, AppError> {
        let body = dto::RegisterRequest { username, email, password };
        let envelope: dto::UserEnvelope =
            self.send_json(Method::POST, "/api/auth/register", Some(&body)).await?;
        Ok(envelope.user)
    }

    async fn logout(&self) -> Result<(), AppError> {
        let url = self.url("/api/auth/logout")?;
        self.request::<()>(Method::POST, url, None).await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User, AppError> {
        let envelope: dto::UserEnvelope = self.get_json("/api/auth/me").await?;
        Ok(envelope.user)
    }

    async fn fetch_timetable(&self) -> Result<Vec<TimetableRecord>, AppError> {
        let envelope: dto::TimetableEnvelope = self.get_json("/api/timetable").await?;
        Ok(envelope.timetables)
    }

    async fn fetch_user_timetable(&self, user_id: UserId) -> Result<Vec<TimetableRecord>, AppError> {
        let envelope: dto::TimetableEnvelope =
            self.get_json(&format!("/api/timetable/user/{}", user_id)).await?;
        Ok(envelope.timetables)
    }

    async fn upsert_cell(&self, req: &dto::UpsertCellRequest) -> Result<(), AppError> {
        let url = self.url("/api/timetable")?;
        self.request(Method::POST, url, Some(req)).await?;
        Ok(())
    }

    async fn fetch_friends(&self) -> Result<Vec<Friend>, AppError> {
        let envelope: dto::FriendsEnvelope = self.get_json("/api/friends").await?;
        Ok(envelope.friends)
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserResult>, AppError> {
        let url = Url::parse_with_params(self.url("/api/users/search")?.as_str(), &[("q", query)])
            .map_err(|e| AppError::Config(format!("Invalid search url: {}", e)))?;
        let response = self.request::<()>(Method::GET, url, None).await?;
        let envelope: dto::UsersEnvelope = decode(response).await?;
        Ok(envelope.users)
    }

    async fn fetch_friend_requests(&self) -> Result<FriendRequests, AppError> {
        self.get_json("/api/friend-requests").await
    }

    async fn send_friend_request(&self, user_id: UserId) -> Result<(), AppError> {
        let url = self.url("/api/friend-request")?;
        self.request(Method::POST, url, Some(&dto::SendFriendRequest { user_id })).await?;
        Ok(())
    }

    async fn accept_friend_request(&self, request_id: &str) -> Result<(), AppError> {
        let url = self.url(&format!("/api/friend-request/{}/accept", request_id))?;
        self.request::<()>(Method::POST, url, None).await?;
        Ok(())
    }

    async fn reject_friend_request(&self, request_id: &str) -> Result<(), AppError> {
        let url = self.url(&format!("/api/friend-request/{}/reject", request_id))?;
        self.request::<()>(Method::POST, url, None).await?;
        Ok(())
    }

    async fn fetch_qr_code(&self) -> Result<QrCode, AppError> {
        self.get_json("/api/qr-code").await
    }

    async fn add_friend(&self, user_id: UserId) -> Result<String, AppError> {
        let body: dto::MessageBody = self
            .send_json::<(), _>(Method::POST, &format!("/api/add-friend/{}", user_id), None)
            .await?;
        Ok(body.message.unwrap_or_default())
    }

    async fn fetch_conversations(&self) -> Result<Vec<Conversation>, AppError> {
        let envelope: dto::ConversationsEnvelope = self.get_json("/api/conversations").await?;
        Ok(envelope.conversations)
    }

    async fn fetch_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>, AppError> {
        let envelope: dto::MessagesEnvelope = self
            .get_json(&format!("/api/conversations/{}/messages", conversation_id))
            .await?;
        Ok(envelope.messages)
    }

    async fn start_conversation(&self, user_id: UserId) -> Result<Conversation, AppError> {
        let envelope: dto::ConversationEnvelope =
            self.get_json(&format!("/api/conversations/{}", user_id)).await?;
        Ok(envelope.conversation)
    }

    async fn send_message(&self, conversation_id: ConversationId, content: &str) -> Result<Message, AppError> {
        let body = dto::SendMessageRequest { content };
        let envelope: dto::SentMessageEnvelope = self
            .send_json(
                Method::POST,
                &format!("/api/conversations/{}/messages", conversation_id),
                Some(&body),
            )
            .await?;
        Ok(envelope.message)
    }

    async fn unread_count(&self) -> Result<u64, AppError> {
        let envelope: dto::UnreadCountEnvelope = self.get_json("/api/unread-count").await?;
        Ok(envelope.unread_count)
    }

    async fn fetch_profile(&self) -> Result<Profile, AppError> {
        let envelope: dto::ProfileEnvelope = self.get_json("/api/profile").await?;
        Ok(envelope.profile)
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<Profile, AppError> {
        let envelope: dto::ProfileEnvelope =
            self.send_json(Method::PUT, "/api/profile", Some(update)).await?;
        Ok(envelope.profile)
    }
}
