use std::time::Duration;

use tracing::{debug, warn};

use crate::api::ApiError;

use super::Notice;

pub const DELIMITER: &str = "||";
pub const FALLBACK_SUGGESTION: &str = "Oops! No suggested messages available.";
pub const INITIAL_SUGGESTIONS: &str =
    "What's your favorite movie?||Do you have any pets?||What's your dream job?";
pub const STREAM_FALLBACK: &str = "Unable to fetch suggested messages. Please try again.";

/// Longest silence tolerated from a suggestion stream, before its first
/// chunk or between two chunks.
pub const SUGGESTION_IDLE: Duration = Duration::from_secs(30);

/// Split a generated blob into selectable suggestions.
///
/// Entries are trimmed and empty ones dropped. The result is never empty: a
/// blob without the delimiter, or with nothing between delimiters, yields the
/// single fallback suggestion.
pub fn parse_suggestions(blob: &str) -> Vec<String> {
    if !blob.contains(DELIMITER) {
        debug!("no separator found in suggestion text");
        return vec![FALLBACK_SUGGESTION.to_owned()];
    }

    let suggestions: Vec<String> = blob
        .split(DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();

    if suggestions.is_empty() {
        return vec![FALLBACK_SUGGESTION.to_owned()];
    }
    suggestions
}

/// Streamed suggestion text for one open profile page.
#[derive(Debug)]
pub struct SuggestionBox {
    blob: String,
    generation: u64,
    loading: bool,
    error: Option<String>,
}

impl Default for SuggestionBox {
    fn default() -> Self {
        SuggestionBox {
            blob: INITIAL_SUGGESTIONS.to_owned(),
            generation: 0,
            loading: false,
            error: None,
        }
    }
}

impl SuggestionBox {
    pub fn items(&self) -> Vec<String> {
        parse_suggestions(&self.blob)
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start a new completion, returning its generation. Refused while one runs.
    pub fn begin(&mut self) -> Option<u64> {
        if self.loading {
            return None;
        }
        self.generation += 1;
        self.loading = true;
        self.error = None;
        self.blob.clear();
        Some(self.generation)
    }

    /// Append streamed text. Returns false for chunks of an older generation.
    pub fn push_chunk(&mut self, generation: u64, chunk: &str) -> bool {
        if generation != self.generation {
            return false;
        }
        self.blob.push_str(chunk);
        true
    }

    pub fn finish(&mut self, generation: u64, outcome: Result<(), ApiError>) -> Option<Notice> {
        if generation != self.generation {
            return None;
        }
        self.loading = false;

        let Err(e) = outcome else {
            return None;
        };
        warn!("suggestion stream failed: {e}");
        self.error = Some(STREAM_FALLBACK.to_owned());
        Some(Notice::error(STREAM_FALLBACK))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The suggestion at `index` of the batch the page rendered for
    /// `generation`. Clicks on an outdated batch pick nothing.
    pub fn pick(&self, generation: u64, index: usize) -> Option<String> {
        if self.error.is_some() || generation != self.generation {
            return None;
        }
        self.items().into_iter().nth(index)
    }
}
