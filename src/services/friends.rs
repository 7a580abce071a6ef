use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{Friend, FriendRequest, FriendshipState, Timetable, UserId, UserResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub total: usize,
    pub in_class: usize,
    pub free: usize,
}

/// Search results, pending requests in both directions, and the friend list.
pub struct FriendDirectory {
    api: Arc<dyn ApiClient>,
    results: Vec<UserResult>,
    received: Vec<FriendRequest>,
    sent: Vec<FriendRequest>,
    friends: Vec<Friend>,
}

impl FriendDirectory {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self {
            api,
            results: Vec::new(),
            received: Vec::new(),
            sent: Vec::new(),
            friends: Vec::new(),
        }
    }

    pub fn results(&self) -> &[UserResult] {
        &self.results
    }

    pub fn received(&self) -> &[FriendRequest] {
        &self.received
    }

    pub fn sent(&self) -> &[FriendRequest] {
        &self.sent
    }

    pub fn friends(&self) -> &[Friend] {
        &self.friends
    }

    /// A blank query clears the results without asking the server.
    pub async fn search(&mut self, query: &str) -> &[UserResult] {
        if query.trim().is_empty() {
            self.results.clear();
            return &self.results;
        }

        self.results = self.api.search_users(query).await.unwrap_or_else(|e| {
            warn!("User search failed: {}", e);
            Vec::new()
        });
        &self.results
    }

    /// Both lists are fetched together; on failure the current lists are kept.
    pub async fn load_requests(&mut self) {
        match self.api.fetch_friend_requests().await {
            Ok(requests) => {
                self.received = requests.received_requests;
                self.sent = requests.sent_requests;
            }
            Err(e) => warn!("Failed to load friend requests: {}", e),
        }
    }

    pub async fn load_friends(&mut self) -> &[Friend] {
        self.friends = self.api.fetch_friends().await.unwrap_or_else(|e| {
            warn!("Failed to load friends: {}", e);
            Vec::new()
        });
        &self.friends
    }

    pub fn status_summary(&self) -> StatusSummary {
        let in_class = self
            .friends
            .iter()
            .filter(|f| f.class_status.as_ref().is_some_and(|s| s.is_in_class()))
            .count();
        StatusSummary {
            total: self.friends.len(),
            in_class,
            free: self.friends.len() - in_class,
        }
    }

    /// A friend's timetable; failures yield an empty one.
    pub async fn friend_timetable(&self, user_id: UserId) -> Timetable {
        match self.api.fetch_user_timetable(user_id).await {
            Ok(records) => Timetable::from_records(records),
            Err(e) => {
                warn!("Failed to load timetable of user {}: {}", user_id, e);
                Timetable::new()
            }
        }
    }

    pub async fn send_request(&mut self, target_id: UserId) -> Result<(), AppError> {
        if let Some(result) = self.results.iter().find(|r| r.id == target_id) {
            if !result.friendship_state.allows_send_request() {
                return Err(AppError::Validation(format!(
                    "{} には申請できません ({})",
                    result.username,
                    result.friendship_state.label()
                )));
            }
        }

        self.api.send_friend_request(target_id).await?;
        info!("Friend request sent to user {}", target_id);

        if let Some(result) = self.results.iter_mut().find(|r| r.id == target_id) {
            result.friendship_state = FriendshipState::Sent;
        }
        self.load_requests().await;
        Ok(())
    }

    pub async fn accept_request(&mut self, request_id: &str) -> Result<(), AppError> {
        self.ensure_incoming(request_id)?;
        self.api.accept_friend_request(request_id).await?;
        info!("Friend request {} accepted", request_id);
        self.load_requests().await;
        Ok(())
    }

    pub async fn reject_request(&mut self, request_id: &str) -> Result<(), AppError> {
        self.ensure_incoming(request_id)?;
        self.api.reject_friend_request(request_id).await?;
        info!("Friend request {} rejected", request_id);
        self.load_requests().await;
        Ok(())
    }

    fn ensure_incoming(&self, request_id: &str) -> Result<(), AppError> {
        if self.received.iter().any(|r| r.id == request_id) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "受信した友達申請が見つかりません: {}",
                request_id
            )))
        }
    }
}
