//! Scripted stand-in for the collaborator, plus an in-memory page that
//! drives a socket loop without a real WebSocket.

use std::{
    collections::VecDeque,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::extract::ws::Message as Frame;
use futures_util::{sink, stream, stream::BoxStream, Sink, StreamExt};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{
    api::{
        ApiError, ApiResponse, ApiResult, Backend, Message, SendMessage, SignIn, SignUp, SignedIn,
        SuggestionStream,
    },
    session::Viewer,
};

pub(crate) struct Script<T> {
    replies: Mutex<VecDeque<(Duration, ApiResult<T>)>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Script { replies: Mutex::new(VecDeque::new()) }
    }
}

impl<T> Script<T> {
    pub(crate) fn push(&self, reply: ApiResult<T>) {
        self.push_after(Duration::ZERO, reply);
    }

    /// Queue a reply that only arrives after `delay`.
    pub(crate) fn push_after(&self, delay: Duration, reply: ApiResult<T>) {
        self.replies.lock().unwrap().push_back((delay, reply));
    }

    async fn next(&self) -> ApiResult<T> {
        let next = self.replies.lock().unwrap().pop_front();
        let Some((delay, reply)) = next else {
            return Err(ApiError::service(StatusCode::INTERNAL_SERVER_ERROR, "unscripted call"));
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub(crate) calls: Mutex<Vec<String>>,
    pub(crate) usernames: Script<ApiResponse>,
    pub(crate) sign_ups: Script<ApiResponse>,
    pub(crate) sign_ins: Script<SignedIn>,
    pub(crate) accept_reads: Script<bool>,
    pub(crate) accept_writes: Script<ApiResponse>,
    pub(crate) inbox: Script<Vec<Message>>,
    pub(crate) deletes: Script<ApiResponse>,
    pub(crate) sends: Script<ApiResponse>,
    pub(crate) suggestions: Script<Vec<ApiResult<String>>>,
    /// Leave suggestion streams open after their scripted chunks.
    pub(crate) hold_streams_open: AtomicBool,
}

impl FakeBackend {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub(crate) fn refused(message: &str) -> ApiError {
    ApiError::service(StatusCode::BAD_REQUEST, message)
}

pub(crate) fn viewer() -> Viewer {
    Viewer { user_name: "alice".into(), token: "tok".into() }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn check_username(&self, user_name: &str) -> ApiResult<ApiResponse> {
        self.record(format!("check-unique-username {user_name}"));
        self.usernames.next().await
    }

    async fn sign_up(&self, form: &SignUp) -> ApiResult<ApiResponse> {
        self.record(format!("sign-up {}", form.user_name));
        self.sign_ups.next().await
    }

    async fn sign_in(&self, form: &SignIn) -> ApiResult<SignedIn> {
        self.record(format!("sign-in {}", form.identifier));
        self.sign_ins.next().await
    }

    async fn accepting_messages(&self, viewer: &Viewer) -> ApiResult<bool> {
        self.record(format!("accept-message get {}", viewer.user_name));
        self.accept_reads.next().await
    }

    async fn set_accepting_messages(&self, viewer: &Viewer, accept: bool) -> ApiResult<ApiResponse> {
        self.record(format!("accept-message post {} {accept}", viewer.user_name));
        self.accept_writes.next().await
    }

    async fn messages(&self, viewer: &Viewer) -> ApiResult<Vec<Message>> {
        self.record(format!("get-message {}", viewer.user_name));
        self.inbox.next().await
    }

    async fn delete_message(&self, viewer: &Viewer, message_id: &str) -> ApiResult<ApiResponse> {
        self.record(format!("delete-message {} {message_id}", viewer.user_name));
        self.deletes.next().await
    }

    async fn send_message(&self, message: &SendMessage) -> ApiResult<ApiResponse> {
        self.record(format!("send-message {} {}", message.user_name, message.content));
        self.sends.next().await
    }

    async fn suggest_messages(&self) -> ApiResult<SuggestionStream> {
        self.record("suggest-messages".to_owned());
        let chunks = stream::iter(self.suggestions.next().await?);
        if self.hold_streams_open.load(Ordering::SeqCst) {
            Ok(chunks.chain(stream::pending()).boxed())
        } else {
            Ok(chunks.boxed())
        }
    }
}

pub(crate) type PageSink = Pin<Box<dyn Sink<Frame, Error = ()> + Send>>;
pub(crate) type PageStream = BoxStream<'static, Result<Frame, axum::Error>>;

/// The browser side of a page socket.
pub(crate) struct Page {
    to_server: Option<UnboundedSender<Frame>>,
    from_server: UnboundedReceiver<Frame>,
}

/// A connected page plus the two socket halves to hand to a socket loop.
pub(crate) fn page() -> (Page, PageSink, PageStream) {
    let (to_server, inbound) = unbounded_channel::<Frame>();
    let (outbound, from_server) = unbounded_channel::<Frame>();

    let sender = sink::unfold(outbound, |outbound, frame: Frame| async move {
        match outbound.send(frame) {
            Ok(()) => Ok(outbound),
            Err(_) => Err(()),
        }
    });
    let receiver = stream::unfold(inbound, |mut inbound| async move {
        inbound.recv().await.map(|frame| (Ok(frame), inbound))
    });

    let page = Page {
        to_server: Some(to_server),
        from_server,
    };
    (page, Box::pin(sender), receiver.boxed())
}

impl Page {
    pub(crate) fn send(&self, event: Value) {
        if let Some(to_server) = &self.to_server {
            to_server.send(Frame::Text(event.to_string().into())).unwrap();
        }
    }

    /// Next event pushed by the server, or `None` once the loop has ended.
    pub(crate) async fn recv(&mut self) -> Option<Value> {
        loop {
            if let Frame::Text(text) = self.from_server.recv().await? {
                return Some(serde_json::from_str(text.as_str()).unwrap());
            }
        }
    }

    /// Next event, which must be of type `kind`.
    pub(crate) async fn expect(&mut self, kind: &str) -> Value {
        let event = self.recv().await.expect("socket loop ended");
        assert_eq!(event["type"], kind, "unexpected event {event}");
        event
    }

    /// Navigate away: the server sees the socket close.
    pub(crate) fn close(&mut self) {
        self.to_server = None;
    }
}
