pub mod api;
pub mod config;
pub mod controller;
pub mod pages;
pub mod res;
pub mod schema;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use axum::{extract::FromRef, http::StatusCode, response::{IntoResponse, Response}, Router};
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use api::{Backend, SharedBackend};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub backend: SharedBackend,
    pub site: Site,
}

/// Public facts about the deployment that pages need to print links.
#[derive(Clone, Debug)]
pub struct Site {
    pub public_url: String,
}

impl Site {
    pub fn profile_url(&self, user_name: &str) -> String {
        format!("{}/u/{user_name}", self.public_url.trim_end_matches('/'))
    }
}

pub fn app(state: AppState, session_minutes: i64) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(session_minutes)));

    pages::router()
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}\n\n{}", self.0, self.0.backtrace()),
        )
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
