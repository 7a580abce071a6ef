mod common;

use std::sync::Arc;

use common::FakeApi;
use timetable_share::error::AppError;
use timetable_share::services::Inbox;

#[tokio::test]
async fn test_whitespace_message_is_not_sent() {
    let api = Arc::new(FakeApi::new());
    let mut inbox = Inbox::new(api.clone());
    let conv = inbox.start_conversation(2).await.expect("conversation");
    assert_eq!(inbox.selected(), Some(conv.id));

    let result = inbox.send_message(" \n\t ").await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(inbox.messages().is_empty());
    assert_eq!(api.call_count("send_message"), 0);
}

#[tokio::test]
async fn test_send_requires_selected_conversation() {
    let api = Arc::new(FakeApi::new());
    let mut inbox = Inbox::new(api.clone());

    let result = inbox.send_message("こんにちは").await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(api.call_count("send_message"), 0);
}

#[tokio::test]
async fn test_send_appends_and_refreshes_conversations() {
    let api = Arc::new(FakeApi::new());
    let mut inbox = Inbox::new(api.clone());
    let conv = inbox.start_conversation(2).await.expect("conversation");
    api.clear_calls();

    let message = inbox.send_message("  お昼どう？ ").await.expect("sent");

    assert_eq!(message.content, "お昼どう？");
    assert_eq!(inbox.messages(), std::slice::from_ref(&message));
    assert_eq!(api.calls(), vec!["send_message".to_string(), "fetch_conversations".to_string()]);

    let listed = inbox
        .conversations()
        .iter()
        .find(|c| c.id == conv.id)
        .expect("conversation listed");
    assert_eq!(listed.last_message.as_ref(), Some(&message));
}

#[tokio::test]
async fn test_start_conversation_reuses_existing() {
    let api = Arc::new(FakeApi::new());
    let mut inbox = Inbox::new(api.clone());

    let first = inbox.start_conversation(5).await.expect("conversation");
    inbox.send_message("hi").await.expect("sent");
    let second = inbox.start_conversation(5).await.expect("conversation");

    assert_eq!(first.id, second.id);
    assert_eq!(inbox.conversations().len(), 1);
    // 選択し直すとログはサーバーから読み込まれる
    assert_eq!(inbox.messages().len(), 1);
}

#[tokio::test]
async fn test_selecting_unknown_conversation_yields_empty_log() {
    let api = Arc::new(FakeApi::new());
    let mut inbox = Inbox::new(api);

    assert!(inbox.select(404).await.is_empty());
    assert_eq!(inbox.selected(), Some(404));
}

#[tokio::test]
async fn test_unread_count_and_recipient_search() {
    let api = Arc::new(FakeApi::new());
    let mut inbox = Inbox::new(api.clone());

    assert_eq!(inbox.load_unread_count().await, 3);
    assert_eq!(inbox.unread(), 3);

    assert!(inbox.search_users("  ").await.is_empty());
    assert_eq!(api.call_count("search_users"), 0);
}
