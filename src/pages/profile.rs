use std::time::Duration;

use axum::{
    debug_handler,
    extract::{ws::Message, Path, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{Sink, Stream, StreamExt};
use tokio::{sync::mpsc::UnboundedSender, time::timeout};
use tower_sessions::Session;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::{
    api::{ApiError, ApiResponse, ApiResult, SharedBackend},
    controller::{
        parse_suggestions, MessageComposer, Notice, SubmitError, SuggestionBox, INITIAL_SUGGESTIONS,
        SUGGESTION_IDLE,
    },
    include_res,
    schema::{self, CONTENT_MAX, CONTENT_MIN},
    session, AppResult, AppState,
};

use super::{
    escape,
    events::{ClientEvent, ServerEvent},
    layout, sorry,
    socket::{self, Incoming, Inflight},
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/{user_name}", get(profile))
        .route("/{user_name}/ws", get(profile_ws))
}

fn suggestion_buttons(generation: u64, items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, text)| {
            format!(
                r#"<button type="button" class="suggestion" data-generation="{generation}" data-index="{index}">{}</button>"#,
                escape(text)
            )
        })
        .collect()
}

#[debug_handler]
pub(crate) async fn profile(Path(user_name): Path<String>, session: Session) -> AppResult<Response> {
    if schema::user_name(&user_name).is_err() {
        return Ok(sorry("profile"));
    }
    let viewer = session::viewer(&session).await?;
    let notice = session::take_flash(&session).await?;

    let body = include_res!(str, "/pages/profile.html")
        .replace("{user_name}", &escape(&user_name))
        .replace("{content_min}", &CONTENT_MIN.to_string())
        .replace("{content_max}", &CONTENT_MAX.to_string())
        .replace(
            "{suggestions}",
            &suggestion_buttons(SuggestionBox::default().generation(), &parse_suggestions(INITIAL_SUGGESTIONS)),
        );

    Ok(layout(&format!("Message @{user_name}"), viewer.as_ref(), notice.as_ref(), &body).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn profile_ws(
    Path(user_name): Path<String>,
    State(backend): State<SharedBackend>,
    ws: WebSocketUpgrade,
) -> Response {
    if schema::user_name(&user_name).is_err() {
        return sorry("profile");
    }

    ws.on_upgrade(move |stream| {
        let span = info_span!("profile_ws", id = %Uuid::now_v7(), recipient = %user_name);
        let (sender, receiver) = stream.split();
        profile_socket(sender, receiver, backend, user_name).instrument(span)
    })
}

enum Done {
    Sent(ApiResult<ApiResponse>),
    Chunk(u64, String),
    Streamed(u64, Result<(), ApiError>),
}

fn composer(composer: &MessageComposer, content: Option<String>) -> ServerEvent {
    ServerEvent::Composer {
        content,
        can_submit: composer.can_submit(),
        sending: composer.sending(),
    }
}

fn suggestions(suggestions: &SuggestionBox) -> ServerEvent {
    ServerEvent::Suggestions {
        generation: suggestions.generation(),
        items: suggestions.items(),
        loading: suggestions.loading(),
        error: suggestions.error().map(str::to_owned),
    }
}

/// Run one completion, reporting each chunk through `progress`. The stream
/// fails once the collaborator stays silent for longer than `idle`.
async fn stream_suggestions(
    backend: SharedBackend,
    generation: u64,
    idle: Duration,
    progress: UnboundedSender<Done>,
) -> Done {
    Done::Streamed(generation, relay_chunks(backend, generation, idle, progress).await)
}

async fn relay_chunks(
    backend: SharedBackend,
    generation: u64,
    idle: Duration,
    progress: UnboundedSender<Done>,
) -> Result<(), ApiError> {
    let mut chunks = timeout(idle, backend.suggest_messages())
        .await
        .map_err(|_| ApiError::Timeout(idle))??;

    while let Some(chunk) = timeout(idle, chunks.next())
        .await
        .map_err(|_| ApiError::Timeout(idle))?
    {
        if progress.send(Done::Chunk(generation, chunk?)).is_err() {
            break;
        }
    }
    Ok(())
}

async fn profile_socket<W, R>(mut sender: W, mut receiver: R, backend: SharedBackend, user_name: String)
where
    W: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut form = MessageComposer::new(user_name);
    let mut suggested = SuggestionBox::default();
    let mut inflight = Inflight::new();
    let mut outbox = vec![composer(&form, None), suggestions(&suggested)];

    loop {
        if !socket::flush(&mut sender, &mut outbox).await {
            break;
        }

        tokio::select! {
            frame = receiver.next() => match socket::decode(frame) {
                Incoming::Closed => break,
                Incoming::Ignored => {}
                Incoming::Event(ClientEvent::Content { value }) => {
                    form.set_content(value);
                    outbox.push(composer(&form, None));
                }
                Incoming::Event(ClientEvent::Send) => match form.submit() {
                    Ok(submission) => {
                        let job = submission.run(backend.clone());
                        inflight.spawn(async move { Done::Sent(job.await) });
                        outbox.push(composer(&form, None));
                    }
                    Err(SubmitError::Invalid(e)) => outbox.push(ServerEvent::Notice(Notice::error(e.to_string()))),
                    Err(SubmitError::Busy) => debug!("send ignored, one is already in flight"),
                },
                Incoming::Event(ClientEvent::Suggest) => {
                    if let Some(generation) = suggested.begin() {
                        let job =
                            stream_suggestions(backend.clone(), generation, SUGGESTION_IDLE, inflight.sender());
                        inflight.spawn(job);
                    }
                    outbox.push(suggestions(&suggested));
                }
                Incoming::Event(ClientEvent::Pick { generation, index }) => {
                    if let Some(text) = suggested.pick(generation, index) {
                        form.set_content(text.clone());
                        outbox.push(composer(&form, Some(text)));
                    }
                }
                Incoming::Event(other) => debug!(?other, "not a profile event"),
            },
            Some(done) = inflight.next() => match done {
                Done::Sent(outcome) => {
                    let notice = form.settle(outcome);
                    outbox.push(ServerEvent::Notice(notice));
                    outbox.push(composer(&form, Some(form.content().to_owned())));
                }
                Done::Chunk(generation, text) => {
                    if suggested.push_chunk(generation, &text) {
                        outbox.push(suggestions(&suggested));
                    }
                }
                Done::Streamed(generation, outcome) => {
                    if let Some(notice) = suggested.finish(generation, outcome) {
                        outbox.push(ServerEvent::Notice(notice));
                    }
                    outbox.push(suggestions(&suggested));
                }
            },
        }
    }
    debug!(recipient = form.recipient(), "profile socket closed");
}
