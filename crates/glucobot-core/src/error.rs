use thiserror::Error;

/// Errors surfaced outside a single message exchange.
///
/// Input validation never lands here: the conversation layer recovers from
/// bad user input locally by re-prompting. What remains is startup-fatal.
#[derive(Debug, Error)]
pub enum GlucobotError {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, GlucobotError>;
