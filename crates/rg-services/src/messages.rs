use std::sync::Arc;

use rg_core::access::EVERYONE;
use rg_core::{AppError, Message, MessageRepo, NewMessage, Principal, Result, UserRepo};

pub const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageRepo>,
    users: Arc<dyn UserRepo>,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageRepo>, users: Arc<dyn UserRepo>) -> Self {
        Self { messages, users }
    }

    /// Sends `body` to the account registered under `receiver_email`.
    pub async fn send(&self, principal: &Principal, receiver_email: &str, body: &str) -> Result<Message> {
        EVERYONE.check(principal.role)?;
        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::validation("message is empty"));
        }
        if body.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::validation(format!(
                "message is longer than {MAX_MESSAGE_LEN} characters"
            )));
        }
        let receiver_email = receiver_email.trim().to_lowercase();
        let receiver = self
            .users
            .get_user_by_email(&receiver_email)
            .await?
            .ok_or_else(|| AppError::not_found("User", &receiver_email))?;

        self.messages
            .create_message(NewMessage {
                body: body.to_string(),
                sender_id: principal.id,
                receiver_id: receiver.id,
            })
            .await
    }

    pub async fn inbox(&self, principal: &Principal) -> Result<Vec<Message>> {
        EVERYONE.check(principal.role)?;
        self.messages.list_for_user(principal.id).await
    }

    /// Only the receiver may delete a message.
    pub async fn delete(&self, principal: &Principal, message_id: i64) -> Result<Message> {
        EVERYONE.check(principal.role)?;
        let message = self
            .messages
            .get_message(message_id)
            .await?
            .ok_or_else(|| AppError::not_found("Message", message_id))?;
        if message.receiver_id != principal.id {
            return Err(AppError::forbidden("only the receiver may delete a message"));
        }
        self.messages.delete_message(message_id).await?;
        Ok(message)
    }
}
