#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use timetable_share::api::ApiClient;
use timetable_share::api::dto::UpsertCellRequest;
use timetable_share::error::AppError;
use timetable_share::models::*;

#[derive(Debug, Clone)]
pub struct StoredCell {
    pub id: String,
    pub subject: String,
    pub room: String,
}

#[derive(Default)]
pub struct FakeState {
    pub cells: BTreeMap<(String, u8), StoredCell>,
    pub failing_cells: HashSet<(String, u8)>,
    pub timetable_down: bool,
    pub users: Vec<UserResult>,
    pub requests: FriendRequests,
    pub friends: Vec<Friend>,
    pub conversations: Vec<Conversation>,
    pub messages: BTreeMap<ConversationId, Vec<Message>>,
    pub next_id: i64,
}

/// In-memory stand-in for the remote API that records every call.
pub struct FakeApi {
    pub me: User,
    pub state: Mutex<FakeState>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            me: User {
                id: 1,
                username: "me".to_string(),
                email: "me@example.com".to_string(),
            },
            state: Mutex::new(FakeState {
                next_id: 100,
                ..Default::default()
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_state(self, f: impl FnOnce(&mut FakeState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.as_str() == name).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn next_id(state: &mut FakeState) -> i64 {
        state.next_id += 1;
        state.next_id
    }
}

pub fn server_error(status: u16, message: &str) -> AppError {
    AppError::Server {
        status,
        message: message.to_string(),
    }
}

pub fn summary(id: UserId, username: &str) -> UserSummary {
    UserSummary {
        id,
        username: username.to_string(),
        email: None,
    }
}

pub fn user_result(id: UserId, username: &str, state: FriendshipState) -> UserResult {
    UserResult {
        id,
        username: username.to_string(),
        email: Some(format!("{}@example.com", username)),
        friendship_state: state,
    }
}

pub fn request(id: &str, from: UserId, username: &str) -> FriendRequest {
    FriendRequest {
        id: id.to_string(),
        user: summary(from, username),
        created_at: None,
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn login(&self, username: &str, _password: &str) -> Result<User, AppError> {
        self.record("login");
        if username == self.me.username {
            Ok(self.me.clone())
        } else {
            Err(server_error(401, "ユーザー名またはパスワードが間違っています"))
        }
    }

    async fn register(&self, username: &str, email: &str, _password: &str) -> Result<User, AppError> {
        self.record("register");
        Ok(User {
            id: 2,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    async fn logout(&self) -> Result<(), AppError> {
        self.record("logout");
        Ok(())
    }

    async fn current_user(&self) -> Result<User, AppError> {
        self.record("current_user");
        Ok(self.me.clone())
    }

    async fn fetch_timetable(&self) -> Result<Vec<TimetableRecord>, AppError> {
        self.record("fetch_timetable");
        let state = self.state.lock().unwrap();
        if state.timetable_down {
            return Err(server_error(500, "down"));
        }
        let records = state
            .cells
            .iter()
            .map(|((day, period), cell)| {
                serde_json::from_value(serde_json::json!({
                    "id": cell.id,
                    "day_of_week": day,
                    "period": period,
                    "subject_name": cell.subject,
                    "room": cell.room,
                }))
                .expect("record")
            })
            .collect();
        Ok(records)
    }

    async fn fetch_user_timetable(&self, _user_id: UserId) -> Result<Vec<TimetableRecord>, AppError> {
        self.record("fetch_user_timetable");
        Ok(vec![
            serde_json::from_value(serde_json::json!({
                "id": "f1", "day_of_week": 0, "period": 2, "subject_name": "化学", "room": "305"
            }))
            .expect("record"),
        ])
    }

    async fn upsert_cell(&self, req: &UpsertCellRequest) -> Result<(), AppError> {
        self.record("upsert_cell");
        let mut state = self.state.lock().unwrap();
        let key = (req.day_of_week.clone(), req.period);
        if state.failing_cells.contains(&key) {
            return Err(server_error(500, "保存に失敗しました"));
        }
        if req.subject_name.is_empty() && req.room.is_empty() {
            state.cells.remove(&key);
        } else {
            let id = state
                .cells
                .get(&key)
                .map(|c| c.id.clone())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            state.cells.insert(
                key,
                StoredCell {
                    id,
                    subject: req.subject_name.clone(),
                    room: req.room.clone(),
                },
            );
        }
        Ok(())
    }

    async fn fetch_friends(&self) -> Result<Vec<Friend>, AppError> {
        self.record("fetch_friends");
        Ok(self.state.lock().unwrap().friends.clone())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserResult>, AppError> {
        self.record("search_users");
        let state = self.state.lock().unwrap();
        Ok(state
            .users
            .iter()
            .filter(|u| u.username.contains(query))
            .cloned()
            .collect())
    }

    async fn fetch_friend_requests(&self) -> Result<FriendRequests, AppError> {
        self.record("fetch_friend_requests");
        Ok(self.state.lock().unwrap().requests.clone())
    }

    async fn send_friend_request(&self, user_id: UserId) -> Result<(), AppError> {
        self.record("send_friend_request");
        let mut state = self.state.lock().unwrap();
        let Some(target) = state.users.iter().find(|u| u.id == user_id).cloned() else {
            return Err(server_error(404, "ユーザーが見つかりません"));
        };
        if target.friendship_state != FriendshipState::None {
            return Err(server_error(400, "既に友達申請が送信されています"));
        }
        let id = uuid::Uuid::new_v4().to_string();
        state.requests.sent_requests.push(request(&id, target.id, &target.username));
        if let Some(u) = state.users.iter_mut().find(|u| u.id == user_id) {
            u.friendship_state = FriendshipState::Sent;
        }
        Ok(())
    }

    async fn accept_friend_request(&self, request_id: &str) -> Result<(), AppError> {
        self.record("accept_friend_request");
        let mut state = self.state.lock().unwrap();
        let Some(pos) = state.requests.received_requests.iter().position(|r| r.id == request_id) else {
            return Err(server_error(404, "友達申請が見つかりません"));
        };
        let req = state.requests.received_requests.remove(pos);
        state.requests.sent_requests.retain(|r| r.user.id != req.user.id);
        state.friends.push(Friend {
            id: req.user.id,
            username: req.user.username,
            email: None,
            class_status: Some(RemoteClassStatus::Free),
        });
        Ok(())
    }

    async fn reject_friend_request(&self, request_id: &str) -> Result<(), AppError> {
        self.record("reject_friend_request");
        let mut state = self.state.lock().unwrap();
        let before = state.requests.received_requests.len();
        state.requests.received_requests.retain(|r| r.id != request_id);
        if state.requests.received_requests.len() == before {
            return Err(server_error(404, "友達申請が見つかりません"));
        }
        Ok(())
    }

    async fn fetch_qr_code(&self) -> Result<QrCode, AppError> {
        self.record("fetch_qr_code");
        Ok(QrCode {
            qr_code: "data:image/png;base64,iVBORw==".to_string(),
            username: self.me.username.clone(),
            user_id: self.me.id,
        })
    }

    async fn add_friend(&self, user_id: UserId) -> Result<String, AppError> {
        self.record("add_friend");
        if user_id == self.me.id {
            return Err(server_error(400, "自分自身を友達に追加することはできません"));
        }
        Ok("友達申請を送信しました".to_string())
    }

    async fn fetch_conversations(&self) -> Result<Vec<Conversation>, AppError> {
        self.record("fetch_conversations");
        Ok(self.state.lock().unwrap().conversations.clone())
    }

    async fn fetch_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>, AppError> {
        self.record("fetch_messages");
        let state = self.state.lock().unwrap();
        state
            .messages
            .get(&conversation_id)
            .cloned()
            .ok_or_else(|| server_error(404, "会話が見つかりません"))
    }

    async fn start_conversation(&self, user_id: UserId) -> Result<Conversation, AppError> {
        self.record("start_conversation");
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.conversations.iter().find(|c| c.other_user.id == user_id) {
            return Ok(existing.clone());
        }
        let id = Self::next_id(&mut state);
        let conversation = Conversation {
            id,
            other_user: summary(user_id, "peer"),
            last_message: None,
            updated_at: None,
        };
        state.conversations.push(conversation.clone());
        state.messages.insert(id, Vec::new());
        Ok(conversation)
    }

    async fn send_message(&self, conversation_id: ConversationId, content: &str) -> Result<Message, AppError> {
        self.record("send_message");
        let mut state = self.state.lock().unwrap();
        if !state.messages.contains_key(&conversation_id) {
            return Err(server_error(404, "会話が見つかりません"));
        }
        let id = Self::next_id(&mut state);
        let message = Message {
            id,
            sender_id: self.me.id,
            receiver_id: None,
            content: content.trim().to_string(),
            created_at: Some("2024-05-01T09:30:00".to_string()),
            is_read: false,
        };
        if let Some(log) = state.messages.get_mut(&conversation_id) {
            log.push(message.clone());
        }
        if let Some(conv) = state.conversations.iter_mut().find(|c| c.id == conversation_id) {
            conv.last_message = Some(message.clone());
        }
        Ok(message)
    }

    async fn unread_count(&self) -> Result<u64, AppError> {
        self.record("unread_count");
        Ok(3)
    }

    async fn fetch_profile(&self) -> Result<Profile, AppError> {
        self.record("fetch_profile");
        Err(server_error(404, "プロフィールが見つかりません"))
    }

    async fn update_profile(&self, _update: &ProfileUpdate) -> Result<Profile, AppError> {
        self.record("update_profile");
        Err(server_error(500, "not supported"))
    }
}
