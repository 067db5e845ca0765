//! Response grammar parsers.
//!
//! Inbound responses are CRLF-separated ASCII text in one of two shapes:
//!
//! ```text
//!    <sid> YYYY-MM-DD HH:MM:SS          header line (3-space indent)
//! M  <ctag> <completion-code>           response-id line
//!    EN=<code>   ENDESC=<description>   operation block
//! ;                                     terminator (";" final, ">" more)
//! ```
//!
//! for operation acknowledgements, and for queries the same header/ctag
//! lines followed by a pagination block, a title, and a body bracketed by
//! two rule lines (whole lines of three-or-more dashes):
//!
//! ```text
//!    total_blocks=1
//!    block_number=1
//!    block_records=2
//!
//! <title>
//! ---------------------------
//! ATTR1\tATTR2
//! val1\tval2
//! ---------------------------
//! ;
//! ```
//!
//! Both entry points are pure functions over the complete raw text; each
//! line is matched explicitly and any deviation fails with
//! [`ParseError::GrammarMismatch`] carrying the full text. The rule lines
//! are located by two independent whole-line scans rather than one greedy
//! match, so titles or field values containing dash runs cannot be mistaken
//! for the body delimiter.

use crate::error::{ParseError, Result};
use crate::response::{CompletionCode, Header, OperationResult, QueryResult, Row, Terminator};

/// Parse an operation acknowledgement (login, add/delete, configure).
pub fn parse_operation(text: &str) -> Result<OperationResult> {
    let lines: Vec<&str> = text.split("\r\n").collect();
    let (pre, mut idx) = parse_preamble(&lines, text)?;

    // Operation block: "   EN=<code>   ENDESC=<description>"
    let block = line_at(&lines, idx, "operation block", text)?;
    let rest = block
        .strip_prefix("   EN=")
        .ok_or_else(|| ParseError::mismatch("operation block", text))?;
    let (error_code, error_description) = rest
        .split_once("   ENDESC=")
        .ok_or_else(|| ParseError::mismatch("operation block", text))?;
    idx += 1;

    // Terminator on its own line, possibly after blank lines.
    while idx < lines.len() && lines[idx].is_empty() {
        idx += 1;
    }
    let term_line = line_at(&lines, idx, "terminator", text)?;
    let terminator = term_line
        .chars()
        .next()
        .and_then(Terminator::from_char)
        .ok_or_else(|| ParseError::mismatch("terminator", text))?;

    Ok(OperationResult {
        header: pre.into_header(terminator),
        error_code: error_code.to_string(),
        error_description: error_description.to_string(),
    })
}

/// Parse a paginated query result.
pub fn parse_query(text: &str) -> Result<QueryResult> {
    // The terminator is located independently of the body: match the final
    // non-whitespace character of the whole response, since trailing blank
    // lines may follow the second rule line.
    let terminator = text
        .trim_end()
        .chars()
        .next_back()
        .and_then(Terminator::from_char)
        .ok_or_else(|| ParseError::mismatch("terminator", text))?;

    let lines: Vec<&str> = text.split("\r\n").collect();
    let (pre, mut idx) = parse_preamble(&lines, text)?;

    // Pagination block, one 3-space-indented field per line.
    let total_blocks = pagination_field(&lines, idx, "total_blocks", text)?;
    let block_number = pagination_field(&lines, idx + 1, "block_number", text)?;
    let block_records = pagination_field(&lines, idx + 2, "block_records", text)?;
    idx += 3;

    // Blank line, then the title.
    if !line_at(&lines, idx, "blank line before title", text)?.is_empty() {
        return Err(ParseError::mismatch("blank line before title", text));
    }
    idx += 1;
    let title = line_at(&lines, idx, "title line", text)?;
    if title.is_empty() {
        return Err(ParseError::mismatch("title line", text));
    }

    // Body: two independent scans for whole-line dash runs.
    let first_rule = lines
        .iter()
        .position(|l| is_rule_line(l))
        .ok_or_else(|| ParseError::mismatch("first rule line", text))?;
    let second_rule = (first_rule + 1..lines.len())
        .find(|&i| is_rule_line(lines[i]))
        .ok_or_else(|| ParseError::mismatch("second rule line", text))?;

    // Everything strictly between the rules, stripped of surrounding blank
    // lines: first line is the attribute header, the rest are data rows.
    let mut region: &[&str] = &lines[first_rule + 1..second_rule];
    while let [head, rest @ ..] = region {
        if !head.trim().is_empty() {
            break;
        }
        region = rest;
    }
    while let [rest @ .., tail] = region {
        if !tail.trim().is_empty() {
            break;
        }
        region = rest;
    }
    let (attrib_line, data_lines) = region
        .split_first()
        .ok_or_else(|| ParseError::mismatch("attribute header line", text))?;

    let attribs: Vec<String> = attrib_line.split('\t').map(normalize_attrib).collect();

    let mut values = Vec::with_capacity(data_lines.len());
    for line in data_lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != attribs.len() {
            return Err(ParseError::RowArityMismatch {
                expected: attribs.len(),
                got: fields.len(),
            });
        }
        let row: Row = attribs
            .iter()
            .cloned()
            .zip(fields.iter().map(|f| f.to_string()))
            .collect();
        values.push(row);
    }

    Ok(QueryResult {
        header: pre.into_header(terminator),
        total_blocks,
        block_number,
        block_records,
        title: title.to_string(),
        attribs,
        values,
    })
}

// ---------------------------------------------------------------------------
// Shared line matchers
// ---------------------------------------------------------------------------

/// Header and response-id fields, before the terminator is known.
struct Preamble {
    sid: String,
    year: String,
    month: String,
    day: String,
    hour: String,
    minute: String,
    second: String,
    ctag: String,
    completion_code: CompletionCode,
}

impl Preamble {
    fn into_header(self, terminator: Terminator) -> Header {
        Header {
            sid: self.sid,
            year: self.year,
            month: self.month,
            day: self.day,
            hour: self.hour,
            minute: self.minute,
            second: self.second,
            ctag: self.ctag,
            completion_code: self.completion_code,
            terminator,
        }
    }
}

/// Match the header and response-id lines, skipping leading blank lines.
/// Returns the parsed fields and the index of the next unconsumed line.
fn parse_preamble(lines: &[&str], text: &str) -> Result<(Preamble, usize)> {
    let mut idx = 0;
    while idx < lines.len() && lines[idx].is_empty() {
        idx += 1;
    }

    // "   <sid> YYYY-MM-DD HH:MM:SS" — the sid is free text and may contain
    // spaces, so the date and time are peeled off from the right.
    let header = line_at(lines, idx, "header line", text)?;
    let rest = header
        .strip_prefix("   ")
        .ok_or_else(|| ParseError::mismatch("header line", text))?;
    let (head, time) = rest
        .rsplit_once(' ')
        .ok_or_else(|| ParseError::mismatch("header line", text))?;
    let (sid, date) = head
        .rsplit_once(' ')
        .ok_or_else(|| ParseError::mismatch("header line", text))?;
    if sid.is_empty() {
        return Err(ParseError::mismatch("header line", text));
    }
    let [year, month, day] = split_numeric(date, '-', [4, 2, 2])
        .ok_or_else(|| ParseError::mismatch("header timestamp", text))?;
    let [hour, minute, second] = split_numeric(time, ':', [2, 2, 2])
        .ok_or_else(|| ParseError::mismatch("header timestamp", text))?;
    idx += 1;

    // "M  <ctag> <completion-code>"
    let id_line = line_at(lines, idx, "response-id line", text)?;
    let rest = id_line
        .strip_prefix("M  ")
        .ok_or_else(|| ParseError::mismatch("response-id line", text))?;
    let (ctag, code) = rest
        .split_once(' ')
        .ok_or_else(|| ParseError::mismatch("response-id line", text))?;
    if ctag.is_empty() || !ctag.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ParseError::mismatch("correlation tag", text));
    }
    let completion_code = CompletionCode::from_token(code)
        .ok_or_else(|| ParseError::mismatch("completion code", text))?;
    idx += 1;

    Ok((
        Preamble {
            sid: sid.to_string(),
            year,
            month,
            day,
            hour,
            minute,
            second,
            ctag: ctag.to_string(),
            completion_code,
        },
        idx,
    ))
}

/// Match one `   <key>=<digits>` pagination line.
fn pagination_field(lines: &[&str], idx: usize, key: &'static str, text: &str) -> Result<String> {
    let line = line_at(lines, idx, key, text)?;
    let value = line
        .strip_prefix("   ")
        .and_then(|r| r.strip_prefix(key))
        .and_then(|r| r.strip_prefix('='))
        .ok_or_else(|| ParseError::mismatch(key, text))?;
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::mismatch(key, text));
    }
    Ok(value.to_string())
}

fn line_at<'a>(lines: &[&'a str], idx: usize, context: &'static str, text: &str) -> Result<&'a str> {
    lines
        .get(idx)
        .copied()
        .ok_or_else(|| ParseError::mismatch(context, text))
}

/// A body delimiter: a whole line of three-or-more dashes.
fn is_rule_line(line: &str) -> bool {
    line.len() >= 3 && line.bytes().all(|b| b == b'-')
}

/// Split a fixed-width numeric compound like `2024-01-02` into its parts,
/// checking separator, field count, width, and digits.
fn split_numeric<const N: usize>(s: &str, sep: char, widths: [usize; N]) -> Option<[String; N]> {
    let mut parts = s.split(sep);
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, width) in out.iter_mut().zip(widths) {
        let part = parts.next()?;
        if part.len() != width || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.to_string();
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

/// Normalize a column name: trim, then collapse the first internal
/// whitespace run to an underscore (`"Rx Power"` → `"Rx_Power"`).
fn normalize_attrib(name: &str) -> String {
    let name = name.trim();
    match name.find(char::is_whitespace) {
        None => name.to_string(),
        Some(start) => {
            let tail = name[start..].trim_start();
            format!("{}_{}", &name[..start], tail)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
