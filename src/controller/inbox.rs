use tracing::warn;

use crate::{
    api::{ApiResponse, ApiResult, Message, SharedBackend},
    session::Viewer,
};

use super::Notice;

pub const FETCH_FALLBACK: &str = "Failed to fetch messages";
pub const DELETE_FALLBACK: &str = "Failed to delete message";

/// Received messages as listed on the dashboard.
#[derive(Debug, Default)]
pub struct Inbox {
    messages: Vec<Message>,
    loading: bool,
}

#[derive(Debug)]
pub struct Fetch {
    refresh: bool,
}

#[derive(Debug)]
pub struct FetchResult {
    refresh: bool,
    outcome: ApiResult<Vec<Message>>,
}

impl Fetch {
    pub async fn run(self, backend: SharedBackend, viewer: Viewer) -> FetchResult {
        FetchResult {
            refresh: self.refresh,
            outcome: backend.messages(&viewer).await,
        }
    }
}

impl Inbox {
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// `refresh` marks a fetch the user asked for, which is acknowledged
    /// with a notice. Refused while another fetch is running.
    pub fn begin_fetch(&mut self, refresh: bool) -> Option<Fetch> {
        if self.loading {
            return None;
        }
        self.loading = true;
        Some(Fetch { refresh })
    }

    pub fn finish_fetch(&mut self, result: FetchResult) -> Option<Notice> {
        self.loading = false;
        match result.outcome {
            Ok(messages) => {
                self.messages = messages;
                result
                    .refresh
                    .then(|| Notice::success("Refreshed Messages").describe("Showing Latest Messages"))
            }
            Err(e) => {
                warn!("fetching messages failed: {e}");
                Some(Notice::error(e.user_message(FETCH_FALLBACK)))
            }
        }
    }

    /// Drop a message locally once the collaborator confirmed its deletion.
    pub fn finish_delete(&mut self, message_id: &str, outcome: ApiResult<ApiResponse>) -> Notice {
        match outcome {
            Ok(response) => {
                self.messages.retain(|message| message.id != message_id);
                Notice::success(response.message.unwrap_or_else(|| "Message deleted".to_owned()))
            }
            Err(e) => {
                warn!(message_id, "deleting message failed: {e}");
                Notice::error(e.user_message(DELETE_FALLBACK))
            }
        }
    }
}
