use axum::{
    debug_handler,
    extract::{ws::Message, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use futures_util::{Sink, Stream, StreamExt};
use tower_sessions::Session;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::{
    api::{ApiResponse, ApiResult, SharedBackend},
    controller::{AcceptToggle, FetchResult, Inbox, UpdateResult},
    include_res,
    session::{self, Viewer},
    AppResult, AppState, Site,
};

use super::{
    escape,
    events::{ClientEvent, MessageView, ServerEvent},
    layout,
    socket::{self, Incoming, Inflight},
};

#[debug_handler(state = AppState)]
pub(crate) async fn dashboard(State(site): State<Site>, session: Session) -> AppResult<Response> {
    let Some(viewer) = session::viewer(&session).await? else {
        return Ok(Redirect::to("/sign-in?return_url=/dashboard").into_response());
    };
    let notice = session::take_flash(&session).await?;

    let body = include_res!(str, "/pages/dashboard.html")
        .replace("{profile_url}", &escape(&site.profile_url(&viewer.user_name)));

    Ok(layout("Dashboard", Some(&viewer), notice.as_ref(), &body).into_response())
}

#[debug_handler(state = AppState)]
pub(crate) async fn dashboard_ws(
    State(backend): State<SharedBackend>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(viewer) = session::viewer(&session).await? else {
        return Ok(StatusCode::UNAUTHORIZED.into_response());
    };

    Ok(ws
        .on_upgrade(move |stream| {
            let span = info_span!("dashboard_ws", id = %Uuid::now_v7(), user_name = %viewer.user_name);
            let (sender, receiver) = stream.split();
            dashboard_socket(sender, receiver, backend, viewer).instrument(span)
        })
        .into_response())
}

enum Done {
    Loaded(ApiResult<bool>),
    Updated(UpdateResult),
    Fetched(FetchResult),
    Deleted(String, ApiResult<ApiResponse>),
}

fn accepting(toggle: &AcceptToggle) -> ServerEvent {
    ServerEvent::Accepting {
        value: toggle.value(),
        phase: toggle.phase(),
        disabled: toggle.disabled(),
    }
}

fn messages(inbox: &Inbox) -> ServerEvent {
    ServerEvent::Messages {
        items: inbox.messages().iter().map(MessageView::from).collect(),
        loading: inbox.loading(),
    }
}

async fn dashboard_socket<W, R>(mut sender: W, mut receiver: R, backend: SharedBackend, viewer: Viewer)
where
    W: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let mut toggle = AcceptToggle::default();
    let mut inbox = Inbox::default();
    let mut inflight = Inflight::new();
    let mut outbox = Vec::new();

    if toggle.begin_load() {
        let (backend, viewer) = (backend.clone(), viewer.clone());
        inflight.spawn(async move { Done::Loaded(backend.accepting_messages(&viewer).await) });
    }
    if let Some(fetch) = inbox.begin_fetch(false) {
        let job = fetch.run(backend.clone(), viewer.clone());
        inflight.spawn(async move { Done::Fetched(job.await) });
    }
    outbox.push(accepting(&toggle));
    outbox.push(messages(&inbox));

    loop {
        if !socket::flush(&mut sender, &mut outbox).await {
            break;
        }

        tokio::select! {
            frame = receiver.next() => match socket::decode(frame) {
                Incoming::Closed => break,
                Incoming::Ignored => {}
                Incoming::Event(ClientEvent::ToggleAccept) => {
                    if let Some(update) = toggle.toggle() {
                        let job = update.run(backend.clone(), viewer.clone());
                        inflight.spawn(async move { Done::Updated(job.await) });
                    }
                    outbox.push(accepting(&toggle));
                }
                Incoming::Event(ClientEvent::Refresh) => {
                    if let Some(fetch) = inbox.begin_fetch(true) {
                        let job = fetch.run(backend.clone(), viewer.clone());
                        inflight.spawn(async move { Done::Fetched(job.await) });
                    }
                    outbox.push(messages(&inbox));
                }
                Incoming::Event(ClientEvent::Delete { id }) => {
                    let (backend, viewer) = (backend.clone(), viewer.clone());
                    inflight.spawn(async move {
                        let outcome = backend.delete_message(&viewer, &id).await;
                        Done::Deleted(id, outcome)
                    });
                }
                Incoming::Event(other) => debug!(?other, "not a dashboard event"),
            },
            Some(done) = inflight.next() => match done {
                Done::Loaded(outcome) => {
                    if let Some(notice) = toggle.finish_load(outcome) {
                        outbox.push(ServerEvent::Notice(notice));
                    }
                    outbox.push(accepting(&toggle));
                }
                Done::Updated(result) => {
                    outbox.push(ServerEvent::Notice(toggle.settle(result)));
                    outbox.push(accepting(&toggle));
                }
                Done::Fetched(result) => {
                    if let Some(notice) = inbox.finish_fetch(result) {
                        outbox.push(ServerEvent::Notice(notice));
                    }
                    outbox.push(messages(&inbox));
                }
                Done::Deleted(id, outcome) => {
                    outbox.push(ServerEvent::Notice(inbox.finish_delete(&id, outcome)));
                    outbox.push(messages(&inbox));
                }
            },
        }
    }
    debug!("dashboard socket closed");
}
