use axum::{
    debug_handler,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::{
    api::{SharedBackend, SignIn},
    controller::Notice,
    include_res,
    session::{self, Viewer, RETURN_URL, VIEWER},
    AppResult, AppState,
};

use super::{escape, layout};

#[derive(Deserialize)]
pub(crate) struct ReturnUrlQuery {
    pub(crate) return_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SignInForm {
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    password: String,
}

/// Only same-site paths are followed after signing in or out. Browsers read
/// `\` as `/` and drop tabs and newlines, so backslashes and control
/// characters are refused along with `//host`.
fn local_path(url: Option<String>, default: &str) -> String {
    url.filter(|u| {
        u.starts_with('/')
            && !u.starts_with("//")
            && !u.contains('\\')
            && !u.chars().any(char::is_control)
    })
    .unwrap_or_else(|| default.to_owned())
}

fn render(identifier: &str, notice: Option<&Notice>) -> Html<String> {
    let body = include_res!(str, "/pages/sign_in.html").replace("{identifier}", &escape(identifier));
    layout("Sign in", None, notice, &body)
}

#[debug_handler]
pub(crate) async fn sign_in_page(
    Query(ReturnUrlQuery { return_url }): Query<ReturnUrlQuery>,
    session: Session,
) -> AppResult<Response> {
    if session::viewer(&session).await?.is_some() {
        return Ok(Redirect::to(&local_path(return_url, "/dashboard")).into_response());
    }
    if let Some(return_url) = return_url {
        session.insert(RETURN_URL, return_url).await?;
    }

    let notice = session::take_flash(&session).await?;
    Ok(render("", notice.as_ref()).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn sign_in(
    State(backend): State<SharedBackend>,
    session: Session,
    Form(SignInForm { identifier, password }): Form<SignInForm>,
) -> AppResult<Response> {
    let identifier = identifier.trim().to_owned();
    if identifier.is_empty() || password.is_empty() {
        let notice = Notice::failure("Sign In Failed", "Enter your username or email and password");
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, render(&identifier, Some(&notice))).into_response());
    }

    let signed_in = match backend.sign_in(&SignIn { identifier: identifier.clone(), password }).await {
        Ok(signed_in) => signed_in,
        Err(e) => {
            warn!(%identifier, "sign-in failed: {e}");
            let notice = Notice::failure("Sign In Failed", e.user_message("Incorrect username or password"));
            return Ok((StatusCode::UNAUTHORIZED, render(&identifier, Some(&notice))).into_response());
        }
    };

    let return_url = session.remove::<String>(RETURN_URL).await?;
    session.cycle_id().await?;
    session
        .insert(
            VIEWER,
            Viewer {
                user_name: signed_in.user_name.clone(),
                token: signed_in.token,
            },
        )
        .await?;
    if let Some(message) = signed_in.message {
        session::flash(&session, Notice::success(message)).await?;
    }

    info!(user_name = %signed_in.user_name, "welcome back");
    Ok(Redirect::to(&local_path(return_url, "/dashboard")).into_response())
}

#[debug_handler]
pub(crate) async fn sign_out(
    Query(ReturnUrlQuery { return_url }): Query<ReturnUrlQuery>,
    session: Session,
) -> AppResult<Redirect> {
    if let Some(viewer) = session::viewer(&session).await? {
        info!(user_name = %viewer.user_name, "signed out");
    }
    session.flush().await?;
    Ok(Redirect::to(&local_path(return_url, "/")))
}
