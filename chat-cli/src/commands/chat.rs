//! Interactive chat in one conversation.
//!
//! Lines read from stdin are sent on Enter. The view is redrawn
//! incrementally: new messages, failed sends and peer typing.

use anyhow::{Context, Result};
use palaver_chat_client::{
    ChatApi, ChatEngine, ChatView, ClientConfig, Failure, HttpChatApi, MockTransport, Notifier,
    Transport, WebSocketTransport,
};
use palaver_chat_core::Delivery;
use palaver_chat_types::{ConversationId, Message, MessageId, ServerEvent, UserId};
use std::collections::HashSet;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{demo_api, format_message};

/// How often the view is checked for changes.
const REDRAW_INTERVAL: Duration = Duration::from_millis(200);

/// Run the chat command.
pub async fn run(
    config: ClientConfig,
    identity: &str,
    conversation: &str,
    use_mock: bool,
) -> Result<()> {
    let identity = UserId::new(identity);
    let conversation = ConversationId::new(conversation);

    if use_mock {
        let transport = MockTransport::new();
        transport.queue_event(ServerEvent::Connected);
        let api = demo_api(&conversation).with_sender(identity.clone());
        chat(config, transport, api, identity, conversation).await
    } else {
        let api = HttpChatApi::new(&config).context("Failed to create REST client")?;
        chat(config, WebSocketTransport::new(), api, identity, conversation).await
    }
}

/// Common chat loop for any transport.
async fn chat<T, A>(
    config: ClientConfig,
    transport: T,
    api: A,
    identity: UserId,
    conversation: ConversationId,
) -> Result<()>
where
    T: Transport + 'static,
    A: ChatApi + 'static,
{
    let engine = ChatEngine::new(config, transport, api, ConsoleNotifier);
    engine
        .start(identity)
        .await
        .context("Failed to open the push channel")?;

    let pump = tokio::spawn({
        let engine = engine.clone();
        async move {
            if let Err(e) = engine.pump().await {
                tracing::warn!(error = %e, "push channel failed");
            }
        }
    });

    engine.select(Some(conversation.clone())).await;
    println!("Joined {}. Press Enter to send, Ctrl-D to leave.", conversation);
    println!();

    let mut printer = Printer::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);

    loop {
        for line in printer.render(&engine.view()) {
            println!("{}", line);
        }

        tokio::select! {
            line = lines.next_line() => match line.context("Failed to read stdin")? {
                Some(line) => {
                    engine.set_compose(line).await;
                    engine.submit().await;
                }
                None => break,
            },
            _ = redraw.tick() => {}
        }
    }

    for line in printer.render(&engine.view()) {
        println!("{}", line);
    }
    engine.shutdown().await;
    pump.abort();
    Ok(())
}

/// Prints engine notices as they happen.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn failure(&self, failure: Failure) {
        println!("! {}", failure);
    }

    fn forward(&self, message: Message) {
        println!("* new message in {}", message.conversation_id);
    }
}

/// Turns successive view snapshots into lines not printed before.
#[derive(Debug, Default)]
struct Printer {
    shown: HashSet<MessageId>,
    peer_typing: bool,
}

impl Printer {
    fn render(&mut self, view: &ChatView) -> Vec<String> {
        let mut lines = Vec::new();

        for entry in &view.entries {
            let line = match entry.delivery {
                // Printed once the backend has it
                Delivery::Pending { .. } => continue,
                Delivery::Confirmed => format_message(&entry.message),
                Delivery::Failed { .. } => {
                    format!("{} (not sent)", format_message(&entry.message))
                }
            };
            if self.shown.insert(entry.message.id.clone()) {
                lines.push(line);
            }
        }

        if view.peer_typing && !self.peer_typing {
            lines.push("(typing...)".to_string());
        }
        self.peer_typing = view.peer_typing;

        lines
    }
}
