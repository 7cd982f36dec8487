use std::future::Future;

use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::JoinSet,
};
use tracing::{debug, warn};

use super::events::{ClientEvent, ServerEvent};

pub(crate) enum Incoming {
    Event(ClientEvent),
    Ignored,
    Closed,
}

pub(crate) fn decode(frame: Option<Result<Message, axum::Error>>) -> Incoming {
    match frame {
        Some(Ok(Message::Text(text))) => match serde_json::from_str(text.as_str()) {
            Ok(event) => Incoming::Event(event),
            Err(e) => {
                debug!("ignoring malformed frame: {e}");
                Incoming::Ignored
            }
        },
        Some(Ok(Message::Close(_))) | None => Incoming::Closed,
        Some(Err(e)) => {
            debug!("socket read failed: {e}");
            Incoming::Closed
        }
        Some(Ok(_)) => Incoming::Ignored,
    }
}

/// Push queued events in order. Returns false once the page has gone away.
pub(crate) async fn flush<S>(sender: &mut S, outbox: &mut Vec<ServerEvent>) -> bool
where
    S: Sink<Message> + Unpin,
{
    for event in outbox.drain(..) {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                warn!("could not encode {event:?}: {e}");
                continue;
            }
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            return false;
        }
    }
    true
}

/// Remote calls started by one socket. Their results come back through
/// [`Inflight::next`]; dropping this aborts whatever is still running.
pub(crate) struct Inflight<E> {
    tasks: JoinSet<()>,
    tx: UnboundedSender<E>,
    rx: UnboundedReceiver<E>,
}

impl<E: Send + 'static> Inflight<E> {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        Inflight {
            tasks: JoinSet::new(),
            tx,
            rx,
        }
    }

    pub(crate) fn spawn<F>(&mut self, job: F)
    where
        F: Future<Output = E> + Send + 'static,
    {
        while self.tasks.try_join_next().is_some() {}

        let tx = self.tx.clone();
        self.tasks.spawn(async move {
            let _ = tx.send(job.await);
        });
    }

    /// For jobs that report progress before their final result.
    pub(crate) fn sender(&self) -> UnboundedSender<E> {
        self.tx.clone()
    }

    pub(crate) async fn next(&mut self) -> Option<E> {
        self.rx.recv().await
    }
}
