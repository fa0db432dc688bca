//! The interactive assistant.
//!
//! This module ties configuration, input, the API session and history
//! together:
//!
//! - [`config`]: the key/value configuration, environment and CLI flags
//! - [`session`]: the transcript and the calls to the API
//! - [`prompter`]: interactive input
//! - [`controller`]: the run loop driving everything else

mod config;
mod controller;
mod prompter;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use config::{
    API_KEY_VAR, BASE_URL_VAR, ChatArgs, ChatArgsError, Config, HISTORY_DIR_VAR, MODEL_TYPE_VAR,
    SYSTEM_MESSAGE_VAR, TEXT_MODEL_VAR, history_root, keys,
};
pub use controller::{Assistant, IMAGE_PROMPT, SessionSummary, TEXT_PROMPT, TITLE};
pub use prompter::{Prompter, RustylinePrompter, SelectOption, pick_option};
pub use session::{ChatBackend, ChatSession};
