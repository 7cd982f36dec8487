use thiserror::Error;
use tracing::{info, warn};

use crate::{
    api::{ApiResponse, ApiResult, SendMessage, SharedBackend},
    schema::{self, ValidationError},
};

use super::Notice;

pub const SENT: &str = "Message Sent Successfully";
pub const SEND_FALLBACK: &str = "Failed to send message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a message is already being sent")]
    Busy,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Anonymous message form on a recipient's public page.
#[derive(Debug)]
pub struct MessageComposer {
    recipient: String,
    content: String,
    sending: bool,
}

#[derive(Debug)]
pub struct Submission {
    request: SendMessage,
}

impl Submission {
    pub async fn run(self, backend: SharedBackend) -> ApiResult<ApiResponse> {
        backend.send_message(&self.request).await
    }
}

impl MessageComposer {
    pub fn new(recipient: impl Into<String>) -> Self {
        MessageComposer {
            recipient: recipient.into(),
            content: String::new(),
            sending: false,
        }
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sending(&self) -> bool {
        self.sending
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.sending && schema::message_content(&self.content).is_ok()
    }

    pub fn submit(&mut self) -> Result<Submission, SubmitError> {
        if self.sending {
            return Err(SubmitError::Busy);
        }
        schema::message_content(&self.content)?;

        self.sending = true;
        Ok(Submission {
            request: SendMessage {
                content: self.content.clone(),
                user_name: self.recipient.clone(),
            },
        })
    }

    pub fn settle(&mut self, outcome: ApiResult<ApiResponse>) -> Notice {
        self.sending = false;
        match outcome {
            Ok(_) => {
                info!(recipient = %self.recipient, "anonymous message delivered");
                self.content.clear();
                Notice::success(SENT)
            }
            Err(e) => {
                warn!(recipient = %self.recipient, "sending message failed: {e}");
                Notice::error(e.user_message(SEND_FALLBACK))
            }
        }
    }
}
