//! `/start`: subscribe a chat to broadcasts.

use std::sync::Arc;

use tracing::{info, warn};

use tinkerscout_core::RecipientId;
use tinkerscout_infra::directory::RecipientDirectory;
use tinkerscout_infra::notify::Notifier;

pub const WELCOME_TEXT: &str =
    "👋🏽 Welcome to TinkerScout!\nYou’ll now receive hourly tinker updates.";
pub const REGISTRATION_FAILED_TEXT: &str = "❌ Error occurred. Try again later.";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Registered { already_exists: bool },
    Failed,
    /// Not a command this bot handles.
    Ignored,
}

#[derive(Clone)]
pub struct RegistrationHandler {
    directory: Arc<dyn RecipientDirectory>,
    replies: Notifier,
}

impl RegistrationHandler {
    pub fn new(directory: Arc<dyn RecipientDirectory>, replies: Notifier) -> Self {
        Self { directory, replies }
    }

    /// Handle one incoming chat message.
    ///
    /// Reply delivery is best effort; the outcome reflects the directory only.
    pub async fn handle(&self, chat: &RecipientId, text: &str) -> CommandOutcome {
        if !is_start_command(text) {
            return CommandOutcome::Ignored;
        }

        match self.directory.register(chat).await {
            Ok(registration) => {
                info!(
                    recipient = %chat,
                    already_exists = registration.already_exists,
                    "recipient registered"
                );
                self.replies.notify(chat, WELCOME_TEXT).await;
                CommandOutcome::Registered {
                    already_exists: registration.already_exists,
                }
            }
            Err(e) => {
                warn!(recipient = %chat, error = %e, "recipient registration failed");
                self.replies.notify(chat, REGISTRATION_FAILED_TEXT).await;
                CommandOutcome::Failed
            }
        }
    }
}

/// `/start`, `/start@SomeBot` and `/start <payload>` all count.
fn is_start_command(text: &str) -> bool {
    let Some(command) = text.split_whitespace().next() else {
        return false;
    };
    let command = command.split('@').next().unwrap_or(command);
    command == "/start"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinkerscout_core::Recipient;
    use tinkerscout_infra::directory::{DirectoryError, InMemoryRecipientDirectory, Registration};
    use tinkerscout_infra::notify::RecordingChannel;

    struct BrokenDirectory;

    #[async_trait::async_trait]
    impl RecipientDirectory for BrokenDirectory {
        async fn register(&self, _identifier: &RecipientId) -> Result<Registration, DirectoryError> {
            Err(DirectoryError::Storage("connection refused".to_string()))
        }

        async fn list(&self) -> Result<Vec<Recipient>, DirectoryError> {
            Err(DirectoryError::Storage("connection refused".to_string()))
        }
    }

    fn chat(id: &str) -> RecipientId {
        RecipientId::new(id).unwrap()
    }

    #[tokio::test]
    async fn start_registers_and_welcomes() {
        let directory = Arc::new(InMemoryRecipientDirectory::new());
        let channel = Arc::new(RecordingChannel::new());
        let handler = RegistrationHandler::new(directory.clone(), Notifier::new(channel.clone()));

        let first = handler.handle(&chat("42"), "/start").await;
        let second = handler.handle(&chat("42"), "/start@TinkerScoutBot").await;

        assert_eq!(first, CommandOutcome::Registered { already_exists: false });
        assert_eq!(second, CommandOutcome::Registered { already_exists: true });
        assert_eq!(directory.list().await.unwrap().len(), 1);
        assert_eq!(channel.sent_to("42"), [WELCOME_TEXT, WELCOME_TEXT]);
    }

    #[tokio::test]
    async fn directory_failure_replies_with_error_text() {
        let channel = Arc::new(RecordingChannel::new());
        let handler = RegistrationHandler::new(Arc::new(BrokenDirectory), Notifier::new(channel.clone()));

        let outcome = handler.handle(&chat("7"), "/start").await;

        assert_eq!(outcome, CommandOutcome::Failed);
        assert_eq!(channel.sent_to("7"), [REGISTRATION_FAILED_TEXT]);
    }

    #[tokio::test]
    async fn other_messages_are_ignored() {
        let directory = Arc::new(InMemoryRecipientDirectory::new());
        let channel = Arc::new(RecordingChannel::new());
        let handler = RegistrationHandler::new(directory.clone(), Notifier::new(channel.clone()));

        for text in ["hello", "/stop", "/starting", ""] {
            assert_eq!(handler.handle(&chat("1"), text).await, CommandOutcome::Ignored);
        }
        assert!(directory.list().await.unwrap().is_empty());
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn start_with_payload_counts() {
        assert!(is_start_command("/start ref-123"));
        assert!(!is_start_command("start"));
    }
}
