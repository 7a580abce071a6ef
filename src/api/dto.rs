use serde::{Deserialize, Serialize};

use crate::models::{Conversation, Friend, Message, Profile, TimetableRecord, User, UserId, UserResult};

/// Body of every non-2xx response.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvelope {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct TimetableEnvelope {
    #[serde(default)]
    pub timetables: Vec<TimetableRecord>,
}

/// `POST /api/timetable`. An empty `subject_name` and `room` clears the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertCellRequest {
    pub day_of_week: String,
    pub period: u8,
    pub subject_name: String,
    pub room: String,
}

#[derive(Debug, Deserialize)]
pub struct FriendsEnvelope {
    #[serde(default)]
    pub friends: Vec<Friend>,
}

#[derive(Debug, Deserialize)]
pub struct UsersEnvelope {
    #[serde(default)]
    pub users: Vec<UserResult>,
}

#[derive(Debug, Serialize)]
pub struct SendFriendRequest {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct ConversationsEnvelope {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

#[derive(Debug, Deserialize)]
pub struct ConversationEnvelope {
    pub conversation: Conversation,
}

#[derive(Debug, Deserialize)]
pub struct MessagesEnvelope {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SentMessageEnvelope {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct UnreadCountEnvelope {
    #[serde(default)]
    pub unread_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ProfileEnvelope {
    pub profile: Profile,
}
