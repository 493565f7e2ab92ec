use sable_diagnostic::{Diagnostic, ErrorCode};
use thiserror::Error;

/// Build-time lexicon errors. All of these fail fast at registration.
#[derive(Debug, Error)]
pub enum LexiconError {
    /// The matching pattern failed to compile.
    #[error("invalid pattern for token type `{name}`: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// A token type with this name is already registered.
    #[error("token type `{name}` is already registered")]
    DuplicateType { name: String },

    /// The pattern can match the empty string, which would produce
    /// zero-length tokens and break scanner progress.
    #[error("pattern for token type `{name}` matches the empty string")]
    MatchesEmpty { name: String },
}

impl LexiconError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LexiconError::InvalidPattern { .. } => ErrorCode::E0001,
            LexiconError::DuplicateType { .. } => ErrorCode::E0002,
            LexiconError::MatchesEmpty { .. } => ErrorCode::E0003,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code()).with_message(self.to_string())
    }
}
