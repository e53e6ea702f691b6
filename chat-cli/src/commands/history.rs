//! Print a conversation's history.

use anyhow::{Context, Result};
use palaver_chat_client::{ChatApi, ClientConfig, HttpChatApi};
use palaver_chat_types::ConversationId;

use super::{demo_api, format_message};

/// Run the history command.
pub async fn run(config: &ClientConfig, conversation: &str, use_mock: bool) -> Result<()> {
    let conversation = ConversationId::new(conversation);

    let lines = if use_mock {
        fetch(&demo_api(&conversation), &conversation).await?
    } else {
        let api = HttpChatApi::new(config).context("Failed to create REST client")?;
        fetch(&api, &conversation).await?
    };

    if lines.is_empty() {
        println!("No messages in {}.", conversation);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Fetch and format a conversation's history.
async fn fetch<A: ChatApi>(api: &A, conversation: &ConversationId) -> Result<Vec<String>> {
    let history = api
        .history(conversation)
        .await
        .context("Failed to Load the Messages")?;
    Ok(history.iter().map(format_message).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_chat_client::MockChatApi;

    #[tokio::test]
    async fn fetch_formats_in_backend_order() {
        let conversation = ConversationId::new("demo");
        let lines = fetch(&demo_api(&conversation), &conversation)
            .await
            .unwrap();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[palaver-bot] Welcome"));
    }

    #[tokio::test]
    async fn fetch_failure_has_context() {
        let api = MockChatApi::new();
        api.fail_next_history("503");

        let err = fetch(&api, &ConversationId::new("c")).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to Load the Messages"));
    }

    #[tokio::test]
    async fn mock_run_succeeds() {
        run(&ClientConfig::default(), "demo", true).await.unwrap();
    }
}
