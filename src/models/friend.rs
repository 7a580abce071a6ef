use serde::{Deserialize, Serialize};

use super::timetable::deserialize_id;
use super::user::{UserId, UserSummary};

/// Friend requests are keyed by UUID strings on the server.
pub type RequestId = String;

/// Relationship between the viewer and another user, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipState {
    #[default]
    None,
    Sent,
    Received,
    Friends,
}

impl FriendshipState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipState::None => "none",
            FriendshipState::Sent => "sent",
            FriendshipState::Received => "received",
            FriendshipState::Friends => "friends",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FriendshipState::None => "未申請",
            FriendshipState::Sent => "申請済み",
            FriendshipState::Received => "申請を受信",
            FriendshipState::Friends => "友達",
        }
    }

    pub fn allows_send_request(&self) -> bool {
        matches!(self, FriendshipState::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResult {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "friendship_status")]
    pub friendship_state: FriendshipState,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FriendRequest {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: RequestId,
    pub user: UserSummary,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FriendRequests {
    #[serde(default)]
    pub received_requests: Vec<FriendRequest>,
    #[serde(default)]
    pub sent_requests: Vec<FriendRequest>,
}

/// Status the server computed for a friend at request time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteClassStatus {
    Free,
    InClass {
        #[serde(default)]
        subject: Option<String>,
        #[serde(default)]
        location: Option<String>,
        #[serde(default)]
        end_time: Option<String>,
    },
}

impl RemoteClassStatus {
    pub fn is_in_class(&self) -> bool {
        matches!(self, RemoteClassStatus::InClass { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Friend {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub class_status: Option<RemoteClassStatus>,
}
