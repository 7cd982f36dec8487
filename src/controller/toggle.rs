use serde::Serialize;
use tracing::warn;

use crate::{
    api::{ApiResponse, ApiResult, SharedBackend},
    session::Viewer,
};

use super::Notice;

pub const UPDATE_FALLBACK: &str = "Failed to update message settings";
pub const FETCH_FALLBACK: &str = "Failed to fetch message settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Pending,
    Settled,
}

/// The dashboard's "accept messages" switch.
///
/// Flips are optimistic: the shown value changes at once and the update is
/// sent afterwards. A failed update rolls the switch back to the last value
/// the collaborator confirmed, and once nothing is in flight the shown value
/// always equals the confirmed one.
#[derive(Debug)]
pub struct AcceptToggle {
    shown: bool,
    confirmed: bool,
    confirmed_seq: u64,
    issued: u64,
    in_flight: usize,
    phase: Phase,
    loading: bool,
}

impl Default for AcceptToggle {
    fn default() -> Self {
        AcceptToggle {
            shown: true,
            confirmed: true,
            confirmed_seq: 0,
            issued: 0,
            in_flight: 0,
            phase: Phase::Idle,
            loading: false,
        }
    }
}

#[derive(Debug)]
pub struct Update {
    seq: u64,
    accept: bool,
}

#[derive(Debug)]
pub struct UpdateResult {
    seq: u64,
    accept: bool,
    outcome: ApiResult<ApiResponse>,
}

impl Update {
    pub fn accept(&self) -> bool {
        self.accept
    }

    pub async fn run(self, backend: SharedBackend, viewer: Viewer) -> UpdateResult {
        let outcome = backend.set_accepting_messages(&viewer, self.accept).await;
        UpdateResult {
            seq: self.seq,
            accept: self.accept,
            outcome,
        }
    }
}

impl AcceptToggle {
    pub fn value(&self) -> bool {
        self.shown
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The switch is unusable only while the initial value is being fetched.
    pub fn disabled(&self) -> bool {
        self.loading
    }

    pub fn begin_load(&mut self) -> bool {
        if self.loading {
            return false;
        }
        self.loading = true;
        true
    }

    pub fn finish_load(&mut self, outcome: ApiResult<bool>) -> Option<Notice> {
        self.loading = false;
        match outcome {
            Ok(accepting) => {
                // a flip made meanwhile is newer than what was fetched
                if self.in_flight == 0 && self.confirmed_seq == 0 {
                    self.shown = accepting;
                    self.confirmed = accepting;
                }
                None
            }
            Err(e) => {
                warn!("fetching accept-message setting failed: {e}");
                Some(Notice::error(e.user_message(FETCH_FALLBACK)))
            }
        }
    }

    pub fn toggle(&mut self) -> Option<Update> {
        if self.loading {
            return None;
        }

        self.shown = !self.shown;
        self.issued += 1;
        self.in_flight += 1;
        self.phase = Phase::Pending;

        Some(Update {
            seq: self.issued,
            accept: self.shown,
        })
    }

    pub fn settle(&mut self, result: UpdateResult) -> Notice {
        self.in_flight = self.in_flight.saturating_sub(1);

        let notice = match result.outcome {
            Ok(response) => {
                if result.seq > self.confirmed_seq {
                    self.confirmed = result.accept;
                    self.confirmed_seq = result.seq;
                }
                Notice::success(
                    response
                        .message
                        .unwrap_or_else(|| "Message settings updated".to_owned()),
                )
            }
            Err(e) => {
                warn!(accept = result.accept, "updating accept-message setting failed: {e}");
                if result.seq == self.issued {
                    self.shown = self.confirmed;
                }
                Notice::error(e.user_message(UPDATE_FALLBACK))
            }
        };

        if self.in_flight == 0 {
            self.shown = self.confirmed;
            self.phase = Phase::Settled;
        }
        notice
    }
}
