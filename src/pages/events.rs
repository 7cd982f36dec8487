use serde::{Deserialize, Serialize};
use time::{format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    api::Message,
    controller::{Availability, Notice, Phase, Tone},
};

const CREATED_AT: &[BorrowedFormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:none], [year] [hour repr:12 padding:none]:[minute] [period]"
);

/// Frames a page script sends over its socket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    UserName { value: String },
    ToggleAccept,
    Refresh,
    Delete { id: String },
    Content { value: String },
    Send,
    Suggest,
    Pick { generation: u64, index: usize },
}

/// Frames pushed to the page script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    UserName {
        checking: bool,
        message: String,
        tone: Tone,
    },
    Notice(Notice),
    Accepting {
        value: bool,
        phase: Phase,
        disabled: bool,
    },
    Messages {
        items: Vec<MessageView>,
        loading: bool,
    },
    Composer {
        #[serde(skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        can_submit: bool,
        sending: bool,
    },
    Suggestions {
        generation: u64,
        items: Vec<String>,
        loading: bool,
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub html: String,
    pub created_at: String,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        MessageView {
            id: message.id.clone(),
            html: super::markdown(&message.content),
            created_at: message.created_at.format(CREATED_AT).unwrap_or_default(),
        }
    }
}

impl From<&Availability> for ServerEvent {
    fn from(state: &Availability) -> Self {
        ServerEvent::UserName {
            checking: state.checking,
            message: state.message.clone(),
            tone: state.tone(),
        }
    }
}
