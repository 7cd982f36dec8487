use serde::Serialize;
use tracing::{debug, warn};

use crate::api::SharedBackend;

pub const LOOKUP_FALLBACK: &str = "Error finding username";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Tone {
    None,
    Success,
    Error,
}

/// What the sign-up form shows under the username field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    pub message: String,
    pub checking: bool,
}

impl Availability {
    /// Success whenever the collaborator's wording says the name is unique,
    /// whatever its case or punctuation.
    pub fn tone(&self) -> Tone {
        let message = self.message.to_lowercase();
        if message.is_empty() {
            Tone::None
        } else if message.contains("unique") && !message.contains("not unique") {
            Tone::Success
        } else {
            Tone::Error
        }
    }
}

/// One issued availability lookup.
#[derive(Debug)]
pub struct Lookup {
    seq: u64,
    candidate: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupResult {
    seq: u64,
    message: String,
}

impl Lookup {
    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    pub async fn run(self, backend: SharedBackend) -> LookupResult {
        let message = match backend.check_username(&self.candidate).await {
            Ok(response) => response
                .message
                .unwrap_or_else(|| LOOKUP_FALLBACK.to_owned()),
            Err(e) => {
                warn!(candidate = %self.candidate, "username lookup failed: {e}");
                e.user_message(LOOKUP_FALLBACK)
            }
        };

        LookupResult { seq: self.seq, message }
    }
}

/// Username availability with a sequence guard: only the newest lookup may
/// change what is displayed, however the responses interleave.
#[derive(Debug, Default)]
pub struct UsernameValidator {
    issued: u64,
    state: Availability,
}

impl UsernameValidator {
    pub fn state(&self) -> &Availability {
        &self.state
    }

    /// Start a lookup for `candidate`. An empty candidate issues nothing but
    /// still invalidates lookups already in flight.
    pub fn begin(&mut self, candidate: &str) -> Option<Lookup> {
        self.issued += 1;
        self.state.message.clear();

        if candidate.is_empty() {
            self.state.checking = false;
            return None;
        }

        self.state.checking = true;
        Some(Lookup {
            seq: self.issued,
            candidate: candidate.to_owned(),
        })
    }

    /// Apply a finished lookup. Returns false when it was superseded.
    pub fn settle(&mut self, result: LookupResult) -> bool {
        if result.seq != self.issued {
            debug!(seq = result.seq, latest = self.issued, "discarding stale username lookup");
            return false;
        }

        self.state.checking = false;
        self.state.message = result.message;
        true
    }
}
