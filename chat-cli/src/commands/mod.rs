//! CLI command implementations.

pub mod chat;
pub mod history;

use palaver_chat_client::MockChatApi;
use palaver_chat_types::{ConversationId, Message, MessageId, UserId};

/// One line per message.
pub fn format_message(message: &Message) -> String {
    format!("[{}] {}", message.sender, message.content)
}

/// REST backend for `--mock` runs, with a short scripted history.
pub fn demo_api(conversation: &ConversationId) -> MockChatApi {
    let api = MockChatApi::new();
    let lines = [
        ("demo-1", "palaver-bot", "Welcome to the demo conversation."),
        ("demo-2", "palaver-bot", "Nothing you send here leaves this process."),
    ];
    let history = lines
        .iter()
        .enumerate()
        .map(|(i, (id, sender, content))| Message {
            id: MessageId::new(*id),
            conversation_id: conversation.clone(),
            sender: UserId::new(*sender),
            content: (*content).to_string(),
            created_at: i as u64,
        })
        .collect();
    api.set_history(conversation.clone(), history);
    api
}
