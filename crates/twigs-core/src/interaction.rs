//! Interaction port for prompts and user-facing output
//!
//! Core operations never talk to the terminal directly. They ask an
//! `InteractionAdapter` to pick, confirm or print, so the same logic runs under
//! a real terminal, a non-interactive pipe, or a scripted test double.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by interaction adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InteractionError {
    /// stdin is not a terminal, so nothing can be asked
    #[error("no interactive terminal available")]
    NonTty,

    /// The user pressed Ctrl+C or escaped out of a prompt
    #[error("cancelled by user")]
    Cancelled,

    /// A bounded prompt ran out of time
    #[error("timed out waiting for an answer")]
    Timeout,

    /// The prompt was called with unusable arguments
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Terminal IO failed
    #[error("terminal error: {0}")]
    Io(String),
}

/// Result alias for interaction calls
pub type InteractionResult<T> = Result<T, InteractionError>;

/// Handle for a running progress indicator
#[derive(Debug)]
pub struct ProgressHandle {
    id: u64,
    message: String,
}

impl ProgressHandle {
    pub fn new(id: u64, message: &str) -> Self {
        Self {
            id,
            message: message.to_string(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Everything the core needs from a user interface
pub trait InteractionAdapter {
    /// Whether prompts can be shown at all
    fn is_interactive(&self) -> bool;

    /// Fuzzy single selection; returns the chosen index
    fn ask_select(&self, prompt: &str, options: &[String]) -> InteractionResult<usize>;

    /// Yes/no question without a deadline
    fn ask_confirm(&self, prompt: &str, default: bool) -> InteractionResult<bool>;

    /// Yes/no question that gives up with `InteractionError::Timeout`
    fn ask_confirm_timeout(&self, prompt: &str, timeout: Duration) -> InteractionResult<bool>;

    /// Free text
    fn ask_text(&self, prompt: &str, default: Option<&str>) -> InteractionResult<String>;

    fn start_progress(&self, message: &str) -> ProgressHandle;

    fn end_progress(&self, handle: ProgressHandle, success: bool);

    fn print_info(&self, message: &str);

    fn print_warning(&self, message: &str);

    fn print_error(&self, message: &str);

    fn print_success(&self, message: &str);

    fn print_header(&self, message: &str);
}
