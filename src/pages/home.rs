use axum::{debug_handler, response::Html};
use tower_sessions::Session;

use crate::{include_res, session, AppResult};

use super::layout;

#[debug_handler]
pub(crate) async fn home(session: Session) -> AppResult<Html<String>> {
    let viewer = session::viewer(&session).await?;
    let notice = session::take_flash(&session).await?;

    let call_to_action = match viewer {
        Some(_) => r#"<a class="button" href="/dashboard">Open your dashboard</a>"#,
        None => r#"<a class="button" href="/sign-up">Get your link</a>"#,
    };

    Ok(layout(
        "Speak your mind",
        viewer.as_ref(),
        notice.as_ref(),
        &include_res!(str, "/pages/home.html").replace("{call_to_action}", call_to_action),
    ))
}
