//! The backend collaborator: account, inbox and suggestion endpoints served
//! under `/api`. Everything here is opaque to this server; it only shapes
//! requests and reads the few response fields the pages rely on.

mod client;
mod error;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::session::Viewer;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};

pub type SharedBackend = Arc<dyn Backend>;

/// Incremental pieces of a generated suggestion blob, in arrival order.
pub type SuggestionStream = BoxStream<'static, ApiResult<String>>;

/// Common envelope returned by every JSON endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: Option<bool>,
    pub message: Option<String>,
    pub is_accepting_messages: Option<bool>,
    pub messages: Option<Vec<Message>>,
}

impl ApiResponse {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            success: Some(true),
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    pub user_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignIn {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedIn {
    pub message: Option<String>,
    pub token: String,
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub content: String,
    pub user_name: String,
}

#[async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn check_username(&self, user_name: &str) -> ApiResult<ApiResponse>;

    async fn sign_up(&self, form: &SignUp) -> ApiResult<ApiResponse>;

    async fn sign_in(&self, form: &SignIn) -> ApiResult<SignedIn>;

    async fn accepting_messages(&self, viewer: &Viewer) -> ApiResult<bool>;

    async fn set_accepting_messages(&self, viewer: &Viewer, accept: bool) -> ApiResult<ApiResponse>;

    async fn messages(&self, viewer: &Viewer) -> ApiResult<Vec<Message>>;

    async fn delete_message(&self, viewer: &Viewer, message_id: &str) -> ApiResult<ApiResponse>;

    async fn send_message(&self, message: &SendMessage) -> ApiResult<ApiResponse>;

    async fn suggest_messages(&self) -> ApiResult<SuggestionStream>;
}
