//! Per-page interaction state. Each controller is owned by the socket task of
//! one open page and is driven by that task's event loop; remote calls are
//! handed out as self-contained jobs whose results are fed back in.

mod debounce;
mod inbox;
mod notice;
mod submit;
mod suggest;
mod toggle;
mod validator;

pub use debounce::{Debouncer, USERNAME_DEBOUNCE};
pub use inbox::{Fetch, FetchResult, Inbox};
pub use notice::{Notice, Variant};
pub use submit::{MessageComposer, SubmitError, Submission};
pub use suggest::{
    parse_suggestions, SuggestionBox, FALLBACK_SUGGESTION, INITIAL_SUGGESTIONS, STREAM_FALLBACK,
    SUGGESTION_IDLE,
};
pub use toggle::{AcceptToggle, Phase, Update, UpdateResult};
pub use validator::{Availability, Lookup, LookupResult, Tone, UsernameValidator};
