use axum::{
    debug_handler,
    extract::{ws::Message, State, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use futures_util::{Sink, Stream, StreamExt};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    api::{SharedBackend, SignUp},
    controller::{Debouncer, Notice, UsernameValidator, USERNAME_DEBOUNCE},
    include_res,
    schema::{self, FieldErrors},
    session, AppResult, AppState,
};

use super::{
    escape,
    events::{ClientEvent, ServerEvent},
    layout,
    socket::{self, Incoming, Inflight},
};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SignUpForm {
    #[serde(rename = "userName", default)]
    user_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|e| format!(r#"<p class="field-error">{}</p>"#, escape(&e.to_string())))
        .unwrap_or_default()
}

fn render(form: &SignUpForm, errors: &FieldErrors, notice: Option<&Notice>) -> String {
    let body = include_res!(str, "/pages/sign_up.html")
        .replace("{user_name}", &escape(&form.user_name))
        .replace("{email}", &escape(&form.email))
        .replace("{user_name_error}", &field_error(errors, "userName"))
        .replace("{email_error}", &field_error(errors, "email"))
        .replace("{password_error}", &field_error(errors, "password"));

    layout("Sign up", None, notice, &body).0
}

#[debug_handler]
pub(crate) async fn sign_up_page(session: Session) -> AppResult<Response> {
    if session::viewer(&session).await?.is_some() {
        return Ok(Redirect::to("/dashboard").into_response());
    }

    let notice = session::take_flash(&session).await?;
    Ok(Html(render(&SignUpForm::default(), &FieldErrors::new(), notice.as_ref())).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn sign_up(
    State(backend): State<SharedBackend>,
    session: Session,
    Form(form): Form<SignUpForm>,
) -> AppResult<Response> {
    let request = SignUp {
        user_name: form.user_name.trim().to_owned(),
        email: form.email.trim().to_owned(),
        password: form.password.clone(),
    };

    if let Err(errors) = schema::sign_up(&request) {
        debug!(?errors, "sign-up form rejected locally");
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(render(&form, &errors, None)),
        )
            .into_response());
    }

    match backend.sign_up(&request).await {
        Ok(response) => {
            info!(user_name = %request.user_name, "account created");
            let notice = Notice::success("Success")
                .describe(response.message.unwrap_or_else(|| "Account created, please sign in".to_owned()));
            session::flash(&session, notice).await?;
            Ok(Redirect::to("/sign-in").into_response())
        }
        Err(e) => {
            warn!(user_name = %request.user_name, "sign-up failed: {e}");
            let notice = Notice::failure("Signup Failed", e.user_message("Could not create the account"));
            Ok((
                StatusCode::BAD_REQUEST,
                Html(render(&form, &FieldErrors::new(), Some(&notice))),
            )
                .into_response())
        }
    }
}

#[debug_handler(state = AppState)]
pub(crate) async fn username_ws(
    State(backend): State<SharedBackend>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |stream| {
        let span = info_span!("username_ws", id = %Uuid::now_v7());
        let (sender, receiver) = stream.split();
        username_socket(sender, receiver, backend).instrument(span)
    })
}

/// Live availability for the username field: keystrokes are debounced, each
/// settled value is looked up, and only the newest answer reaches the page.
async fn username_socket<W, R>(mut sender: W, mut receiver: R, backend: SharedBackend)
where
    W: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut gate = Debouncer::new(USERNAME_DEBOUNCE);
    let mut validator = UsernameValidator::default();
    let mut inflight = Inflight::new();
    let mut outbox = Vec::new();

    loop {
        tokio::select! {
            frame = receiver.next() => match socket::decode(frame) {
                Incoming::Closed => break,
                Incoming::Ignored => continue,
                Incoming::Event(ClientEvent::UserName { value }) => gate.push(value.trim().to_owned()),
                Incoming::Event(other) => debug!(?other, "not a sign-up event"),
            },
            candidate = gate.settled() => {
                if let Some(lookup) = validator.begin(&candidate) {
                    debug!(candidate = lookup.candidate(), "checking username");
                    inflight.spawn(lookup.run(backend.clone()));
                }
                outbox.push(ServerEvent::from(validator.state()));
            },
            Some(result) = inflight.next() => {
                if validator.settle(result) {
                    outbox.push(ServerEvent::from(validator.state()));
                }
            },
        }

        if !socket::flush(&mut sender, &mut outbox).await {
            break;
        }
    }
    debug!("username socket closed");
}
