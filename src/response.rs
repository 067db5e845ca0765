//! Parsed response records.
//!
//! Both response shapes share a [`Header`]; an [`OperationResult`] adds the
//! error-code/description pair, a [`QueryResult`] adds pagination and the
//! tabular body. All of these are immutable value objects built by a single
//! parse call in [`crate::grammar`].

use std::collections::HashMap;
use std::fmt;

use crate::dict;

/// Remote-reported outcome category of a command.
///
/// `DENY` and `PRTLRTRV` still parse successfully — the parser judges shape,
/// not outcome. Callers check [`is_denied`](Self::is_denied) themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CompletionCode {
    /// Command completed.
    Compld,
    /// Command accepted, execution delayed.
    Delay,
    /// Command refused.
    Deny,
    /// Partial retrieval — more data exists than was returned.
    Prtlrtrv,
}

impl CompletionCode {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "COMPLD" => Some(Self::Compld),
            "DELAY" => Some(Self::Delay),
            "DENY" => Some(Self::Deny),
            "PRTLRTRV" => Some(Self::Prtlrtrv),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compld => "COMPLD",
            Self::Delay => "DELAY",
            Self::Deny => "DENY",
            Self::Prtlrtrv => "PRTLRTRV",
        }
    }

    /// Whether the remote refused or truncated the command.
    pub fn is_denied(self) -> bool {
        matches!(self, Self::Deny | Self::Prtlrtrv)
    }
}

impl fmt::Display for CompletionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response terminator: `;` ends the exchange, `>` announces further blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Terminator {
    /// `;` — final block, no more data follows.
    Final,
    /// `>` — more blocks follow.
    More,
}

impl Terminator {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ';' => Some(Self::Final),
            '>' => Some(Self::More),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Final => ';',
            Self::More => '>',
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Fields shared by both response shapes.
///
/// Timestamp fields are kept as the fixed-width numeric strings extracted
/// from the wire; nothing is coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Header {
    /// System identifier (free text, may contain spaces).
    pub sid: String,
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
    pub second: String,
    /// Correlation tag echoed back by the remote.
    pub ctag: String,
    pub completion_code: CompletionCode,
    pub terminator: Terminator,
}

impl Header {
    /// Timestamp re-assembled as `YYYY-MM-DD HH:MM:SS`.
    pub fn timestamp(&self) -> String {
        format!(
            "{}-{}-{} {}:{}:{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second,
        )
    }
}

/// Acknowledgement of a state-changing command (login, add/delete ONU,
/// configure WAN/LAN).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OperationResult {
    pub header: Header,
    /// Short error code, empty on success.
    pub error_code: String,
    /// Free-text description, empty on success.
    pub error_description: String,
}

impl OperationResult {
    /// Human-readable error text: the remote's description when present,
    /// otherwise the static dictionary entry for [`error_code`](Self::error_code).
    pub fn error_text(&self) -> Option<&str> {
        let desc = self.error_description.trim();
        if !desc.is_empty() {
            return Some(desc);
        }
        dict::describe(&self.error_code)
    }
}

/// One data row: attribute name → field value.
pub type Row = HashMap<String, String>;

/// Paginated tabular result of a query command.
///
/// `block_records` is surfaced as reported by the remote and is NOT checked
/// against `values.len()`. What the parser does enforce is that every row has
/// exactly `attribs.len()` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QueryResult {
    pub header: Header,
    pub total_blocks: String,
    pub block_number: String,
    pub block_records: String,
    /// Free-text description of the result set.
    pub title: String,
    /// Column names in table order, normalized (trimmed, first internal
    /// whitespace run replaced with `_`).
    pub attribs: Vec<String>,
    pub values: Vec<Row>,
}
