use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service answered {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Service {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("no response for {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    pub fn service(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Service {
            status,
            message: Some(message.into()),
        }
    }

    pub(crate) fn from_body(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }

    /// The message the collaborator attached to a failed response, if any.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            ApiError::Service { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }

    /// Text fit for a notice: the collaborator's own words, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.service_message().unwrap_or(fallback).to_owned()
    }
}
