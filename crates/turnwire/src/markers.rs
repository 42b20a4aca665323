//! Role headers and end-of-segment markers.
//!
//! Every segment of an encoded transcript is a header line, a payload and a
//! terminator:
//!
//! ```text
//! assistant to=get_car_price:
//! {"car_name": "Song"}
//! <|END_OF_FUNCTION_CALL|>
//! ```
//!
//! Headers and terminators are matched by exact text. Terminators are meant to
//! be registered as special tokens on the tokenizer so they never collide with
//! ordinary content.

use std::fmt;

use serde::{Deserialize, Serialize};
use turnwire_common::MessageRole;

/// Header line prefix of system segments.
pub const SYSTEM_HEADER: &str = "system:";
/// Header line prefix of user segments.
pub const USER_HEADER: &str = "user:";
/// Header line of plain assistant segments.
pub const ASSISTANT_HEADER: &str = "assistant:";
/// Start of the header line of assistant function-call segments.
pub const FUNCTION_CALL_HEADER_PREFIX: &str = "assistant to=";
/// Start of the header line of function-result segments.
pub const FUNCTION_RESULT_HEADER_PREFIX: &str = "function name=";

/// Text every terminator starts with, preceded by its newline.
const TERMINATOR_LEAD: &str = "\n<|END_OF_";

/// End-of-segment marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndToken {
    /// Closes a system segment.
    System,
    /// Closes a user segment.
    User,
    /// Closes a plain assistant segment.
    Assistant,
    /// Closes an assistant function-call segment.
    FunctionCall,
    /// Closes a function-result segment.
    FunctionResult,
}

impl EndToken {
    /// All terminators, in a fixed order.
    pub const ALL: [Self; 5] = [
        Self::System,
        Self::User,
        Self::Assistant,
        Self::FunctionCall,
        Self::FunctionResult,
    ];

    /// The literal marker text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "<|END_OF_SYSTEM|>",
            Self::User => "<|END_OF_USER|>",
            Self::Assistant => "<|END_OF_ASSISTANT|>",
            Self::FunctionCall => "<|END_OF_FUNCTION_CALL|>",
            Self::FunctionResult => "<|END_OF_FUNCTION_RESULT|>",
        }
    }

    /// The terminator that closes a segment of the given shape.
    #[must_use]
    pub const fn for_segment(role: MessageRole, is_function_call: bool) -> Self {
        match role {
            MessageRole::System => Self::System,
            MessageRole::User => Self::User,
            MessageRole::Assistant if is_function_call => Self::FunctionCall,
            MessageRole::Assistant => Self::Assistant,
            MessageRole::Function => Self::FunctionResult,
        }
    }
}

impl fmt::Display for EndToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminator markers, to be added to a tokenizer as additional special
/// tokens before fine-tuning.
#[must_use]
pub fn special_tokens() -> Vec<&'static str> {
    EndToken::ALL.iter().map(|t| t.as_str()).collect()
}

/// A parsed header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Header {
    /// `system:`
    System,
    /// `user:`
    User,
    /// `assistant:`
    Assistant,
    /// `assistant to=<name>:`
    FunctionCall(String),
    /// `function name=<name>:`
    FunctionResult(String),
}

impl Header {
    /// Parses a complete header line (without its trailing newline).
    ///
    /// Returns `None` for anything that is not exactly one of the header forms.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            SYSTEM_HEADER => Some(Self::System),
            USER_HEADER => Some(Self::User),
            ASSISTANT_HEADER => Some(Self::Assistant),
            _ => {
                if let Some(rest) = line.strip_prefix(FUNCTION_CALL_HEADER_PREFIX) {
                    named(rest).map(Self::FunctionCall)
                } else if let Some(rest) = line.strip_prefix(FUNCTION_RESULT_HEADER_PREFIX) {
                    named(rest).map(Self::FunctionResult)
                } else {
                    None
                }
            }
        }
    }

    /// Renders the header line (without its trailing newline).
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::System => SYSTEM_HEADER.to_string(),
            Self::User => USER_HEADER.to_string(),
            Self::Assistant => ASSISTANT_HEADER.to_string(),
            Self::FunctionCall(name) => format!("{FUNCTION_CALL_HEADER_PREFIX}{name}:"),
            Self::FunctionResult(name) => format!("{FUNCTION_RESULT_HEADER_PREFIX}{name}:"),
        }
    }

    /// The role of the segment this header opens.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        match self {
            Self::System => MessageRole::System,
            Self::User => MessageRole::User,
            Self::Assistant | Self::FunctionCall(_) => MessageRole::Assistant,
            Self::FunctionResult(_) => MessageRole::Function,
        }
    }

    /// The terminator expected to close this segment.
    #[must_use]
    pub const fn end_token(&self) -> EndToken {
        EndToken::for_segment(self.role(), matches!(self, Self::FunctionCall(_)))
    }
}

/// Extracts `<name>` from `<name>:` if the name is valid.
fn named(rest: &str) -> Option<String> {
    let name = rest.strip_suffix(':')?;
    is_valid_function_name(name).then(|| name.to_string())
}

/// Returns `true` if `name` can appear in a header line.
///
/// Names must be non-empty and contain no whitespace, colons or marker
/// delimiters.
#[must_use]
pub fn is_valid_function_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_name_char)
}

fn is_name_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, ':' | '<' | '>' | '|'))
}

/// Byte offset of the earliest header that ends `line` (a line without its
/// trailing newline), or `None`.
///
/// Unlike [`Header::parse`], the header may be preceded by other text on the
/// same line, as when stray output is glued to the next segment.
#[must_use]
pub fn find_header_in_line(line: &str) -> Option<usize> {
    let body = line.strip_suffix(':')?;

    // Named headers: the name runs from the prefix to the colon, so it
    // must start after the last character a name cannot contain.
    let name_start = body
        .char_indices()
        .rev()
        .find(|(_, c)| !is_name_char(*c))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let named = [FUNCTION_CALL_HEADER_PREFIX, FUNCTION_RESULT_HEADER_PREFIX]
        .iter()
        .flat_map(|prefix| {
            body.match_indices(prefix)
                .map(move |(at, _)| (at, at + prefix.len()))
        })
        .filter(|&(_, name_at)| name_at >= name_start && name_at < body.len())
        .map(|(at, _)| at);

    let fixed = [SYSTEM_HEADER, USER_HEADER, ASSISTANT_HEADER]
        .iter()
        .filter(|header| line.ends_with(*header))
        .map(|header| line.len() - header.len());

    named.chain(fixed).min()
}

/// Returns `true` if `fragment` (an unterminated last line) could still grow
/// into a valid header line.
#[must_use]
pub fn is_header_prefix(fragment: &str) -> bool {
    if fragment.is_empty() {
        return true;
    }
    let fixed = [SYSTEM_HEADER, USER_HEADER, ASSISTANT_HEADER];
    if fixed.iter().any(|h| h.starts_with(fragment)) {
        return true;
    }
    [FUNCTION_CALL_HEADER_PREFIX, FUNCTION_RESULT_HEADER_PREFIX]
        .iter()
        .any(|prefix| {
            if prefix.starts_with(fragment) {
                return true;
            }
            // A name, possibly followed by the closing ':' of a header still
            // waiting for its newline.
            fragment
                .strip_prefix(prefix)
                .is_some_and(|rest| is_valid_function_name(rest.strip_suffix(':').unwrap_or(rest)))
        })
}

/// Returns the first terminator found at or after `from`, as
/// `(position of the preceding newline, token)`.
///
/// Terminators only count when they follow a newline, which the encoder
/// always writes between payload and terminator.
///
/// The text is scanned once for the common `\n<|END_OF_` lead; each hit is
/// then matched against the five markers.
#[must_use]
pub fn find_terminator(text: &str, from: usize) -> Option<(usize, EndToken)> {
    let haystack = text.get(from..)?;
    haystack
        .match_indices(TERMINATOR_LEAD)
        .find_map(|(pos, _)| {
            let marker = &haystack[pos + 1..];
            EndToken::ALL
                .iter()
                .find(|token| marker.starts_with(token.as_str()))
                .map(|token| (from + pos, *token))
        })
}

/// Length of the longest suffix of `text` that is a proper prefix of some
/// `\n<terminator>` sequence.
///
/// Used to withhold the start of a terminator from streamed partial content.
#[must_use]
pub fn pending_terminator_len(text: &str) -> usize {
    EndToken::ALL
        .iter()
        .map(|token| {
            let needle = format!("\n{}", token.as_str());
            (1..needle.len())
                .rev()
                .find(|&len| text.ends_with(&needle[..len]))
                .unwrap_or(0)
        })
        .max()
        .unwrap_or(0)
}
