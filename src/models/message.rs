use serde::{Deserialize, Serialize};

use super::user::{UserId, UserSummary};

pub type ConversationId = i64;
pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    #[serde(default)]
    pub receiver_id: Option<UserId>,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

impl Message {
    pub fn created_at_naive(&self) -> Option<chrono::NaiveDateTime> {
        self.created_at
            .as_deref()
            .and_then(|ts| ts.parse::<chrono::NaiveDateTime>().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub other_user: UserSummary,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
