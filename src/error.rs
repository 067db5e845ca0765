use thiserror::Error;

/// Errors arising from response grammar parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("response does not match the {context} grammar:\n{raw}")]
    GrammarMismatch {
        /// Which part of the grammar failed to match.
        context: &'static str,
        /// Full raw response text for diagnostics.
        raw: String,
    },

    #[error("data row has {got} fields but the attribute header names {expected} columns")]
    RowArityMismatch { expected: usize, got: usize },
}

impl ParseError {
    /// Create a `GrammarMismatch` carrying the full response text.
    pub(crate) fn mismatch(context: &'static str, raw: &str) -> Self {
        Self::GrammarMismatch {
            context,
            raw: raw.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
