use crate::structs::StatementResult;
use thiserror::Error;

/// The only error kinds that cross the engine's API boundary.
///
/// Everything recoverable is surfaced through `StatementResult.warnings`
/// instead. `StreamInvalid` and `Cancelled` carry the partial result built
/// up to the point of failure so the caller never loses emitted
/// transactions.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The bank profile failed validation before parsing started.
    #[error("invalid bank profile '{key}': {reason}")]
    ProfileInvalid { key: String, reason: String },

    /// The token stream produced coordinate ordering that could not be
    /// normalized.
    #[error("invalid token stream: {reason}")]
    StreamInvalid {
        reason: String,
        partial: Box<StatementResult>,
    },

    /// The caller cancelled the parse between lines.
    #[error("parse cancelled after {} transaction(s)", .partial.transactions.len())]
    Cancelled { partial: Box<StatementResult> },
}

impl ParseError {
    /// The partial result carried by this error, if any.
    pub fn partial_result(&self) -> Option<&StatementResult> {
        match self {
            ParseError::ProfileInvalid { .. } => None,
            ParseError::StreamInvalid { partial, .. } => Some(partial),
            ParseError::Cancelled { partial } => Some(partial),
        }
    }
}
