use std::sync::Arc;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::error::AppError;
use crate::models::{Conversation, ConversationId, Message, UserId, UserResult};

/// Conversation list plus the message log of the selected conversation.
/// Nothing survives the value; it is rebuilt from the server each time.
pub struct Inbox {
    api: Arc<dyn ApiClient>,
    conversations: Vec<Conversation>,
    selected: Option<ConversationId>,
    messages: Vec<Message>,
    unread: u64,
}

impl Inbox {
    pub fn new(api: Arc<dyn ApiClient>) -> Self {
        Self {
            api,
            conversations: Vec::new(),
            selected: None,
            messages: Vec::new(),
            unread: 0,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn selected(&self) -> Option<ConversationId> {
        self.selected
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn unread(&self) -> u64 {
        self.unread
    }

    pub async fn load_conversations(&mut self) -> &[Conversation] {
        self.conversations = self.api.fetch_conversations().await.unwrap_or_else(|e| {
            warn!("Failed to load conversations: {}", e);
            Vec::new()
        });
        &self.conversations
    }

    pub async fn load_unread_count(&mut self) -> u64 {
        self.unread = self.api.unread_count().await.unwrap_or_else(|e| {
            warn!("Failed to load unread count: {}", e);
            0
        });
        self.unread
    }

    /// Selects a conversation and loads its log, oldest first.
    pub async fn select(&mut self, conversation_id: ConversationId) -> &[Message] {
        self.selected = Some(conversation_id);
        self.messages = self
            .api
            .fetch_messages(conversation_id)
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to load messages of {}: {}", conversation_id, e);
                Vec::new()
            });
        &self.messages
    }

    /// The server returns the existing conversation with this user or opens one.
    pub async fn start_conversation(&mut self, other_user_id: UserId) -> Result<Conversation, AppError> {
        let conversation = self.api.start_conversation(other_user_id).await?;
        self.select(conversation.id).await;
        self.load_conversations().await;
        Ok(conversation)
    }

    /// Whitespace-only content is rejected before any request is made.
    pub async fn send_message(&mut self, content: &str) -> Result<Message, AppError> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("メッセージを入力してください".to_string()));
        }
        let Some(conversation_id) = self.selected else {
            return Err(AppError::Validation("会話が選択されていません".to_string()));
        };

        let message = self.api.send_message(conversation_id, content).await?;
        info!("Message {} sent to conversation {}", message.id, conversation_id);
        self.messages.push(message.clone());
        self.load_conversations().await;
        Ok(message)
    }

    /// Recipient picker for a new conversation.
    pub async fn search_users(&self, query: &str) -> Vec<UserResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        self.api.search_users(query).await.unwrap_or_else(|e| {
            warn!("User search failed: {}", e);
            Vec::new()
        })
    }
}
