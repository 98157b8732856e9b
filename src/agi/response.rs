//! AGI reply parsing.
//!
//! Every gateway command is answered with a status line of the form
//! `<code> <message>`. Code 200 carries a `result=` token, optionally a
//! parenthesized data section and an `endpos=` offset:
//!
//! ```text
//! 200 result=53 endpos=12345
//! 200 result=1 (hangup)
//! 200 result= (timeout)
//! ```
//!
//! Code 510 marks an invalid command and 520 opens a multi-line usage
//! block closed by another 520 line; both are raised as errors by the
//! engine, never returned as values.

use crate::error::{AgiError, AgiResult};
use serde::{Deserialize, Serialize};

/// Parsed reply to an AGI command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgiResponse {
    /// The return code from the AGI command (200, 510, 520)
    pub code: u16,
    /// All the data after the return code
    pub message: String,
    /// The `result=` value if it was an integer, 0 otherwise
    pub result: i64,
    /// The `result=` value as a string
    pub result_string: String,
    /// Any data between `(` and `)`
    pub data: String,
    /// The value of `endpos=` if any
    pub endpos: i64,
}

/// Split a status line into its leading integer code and the remainder
/// (with at most one separating space consumed)
pub(crate) fn parse_status_line(line: &str) -> AgiResult<(u16, String)> {
    let digits_end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    let code: u16 = line[..digits_end]
        .parse()
        .map_err(|_| AgiError::parse(format!("missing status code in reply: {line:?}")))?;

    let mut message = &line[digits_end..];
    if let Some(stripped) = message.strip_prefix(' ') {
        message = stripped;
    }
    Ok((code, message.to_string()))
}

/// First whitespace-delimited token of a line, parsed as an integer
pub(crate) fn leading_int(line: &str) -> Option<i64> {
    line.split_whitespace().next()?.parse().ok()
}

/// Parse the message portion of a 200 reply into an [`AgiResponse`].
///
/// The text through the first `=` belongs to the `result=` token. A bare
/// `result=` (next character is a space or the end of the line) yields an
/// empty `result_string` and a zero `result`. Data is the text between the
/// first `(` and the *last* `)` after it; `endpos=` is scanned from
/// whatever trails the data section (or the result token when no
/// parenthesized data is present).
pub(crate) fn parse_ok_reply(message: &str) -> AgiResponse {
    let mut response = AgiResponse {
        code: 200,
        message: message.to_string(),
        ..AgiResponse::default()
    };

    let after_eq = match message.find('=') {
        Some(i) => &message[i + 1..],
        None => "",
    };

    let mut rest = after_eq;
    if !after_eq.is_empty() && !after_eq.starts_with(' ') {
        let token_end = after_eq
            .find(char::is_whitespace)
            .unwrap_or(after_eq.len());
        response.result_string = after_eq[..token_end].to_string();
        response.result = response.result_string.parse().unwrap_or(0);
        rest = &after_eq[token_end..];
    }

    let tail = match rest.find('(') {
        Some(open) => {
            let inner = &rest[open + 1..];
            match inner.rfind(')') {
                Some(close) => {
                    response.data = inner[..close].to_string();
                    &inner[close + 1..]
                }
                // unterminated group, treat the remainder as data
                None => {
                    response.data = inner.to_string();
                    ""
                }
            }
        }
        None => rest,
    };

    if let Some(pos) = tail.find("endpos=") {
        let digits = &tail[pos + "endpos=".len()..];
        let end = digits
            .find(|c: char| !(c.is_ascii_digit() || c == '-'))
            .unwrap_or(digits.len());
        response.endpos = digits[..end].parse().unwrap_or(0);
    }

    response
}
