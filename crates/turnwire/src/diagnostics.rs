//! Non-fatal findings about a transcript.

use std::fmt;

use serde::Serialize;

use crate::markers::EndToken;

/// A structural problem found while decoding or validating a transcript.
///
/// Warnings never stop decoding; they let the caller decide how strict to be
/// with model output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Text between segments that does not start with a known header.
    ///
    /// `after` is the index of the message the text follows, if any; the text
    /// is a continuation of that message's output.
    UnrecognizedText {
        offset: usize,
        text: String,
        after: Option<usize>,
    },
    /// A segment was closed by a terminator of another kind.
    MismatchedTerminator {
        index: usize,
        expected: EndToken,
        found: EndToken,
    },
    /// A function result named a function that no pending call targets.
    MismatchedFunctionName {
        index: usize,
        expected: String,
        found: String,
    },
    /// A function result arrived while no call was pending.
    UnpairedFunctionResult { index: usize, name: String },
    /// A system message after the conversation proper started.
    MisplacedSystemMessage { index: usize },
    /// A function call that never received a result.
    UnansweredFunctionCall { index: usize, name: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedText { offset, text, .. } => {
                write!(f, "unrecognized text at byte {offset}: {text:?}")
            }
            Self::MismatchedTerminator {
                index,
                expected,
                found,
            } => write!(
                f,
                "message {index}: expected {expected} but segment ended with {found}"
            ),
            Self::MismatchedFunctionName {
                index,
                expected,
                found,
            } => write!(
                f,
                "message {index}: result for {found} while {expected} was pending"
            ),
            Self::UnpairedFunctionResult { index, name } => {
                write!(f, "message {index}: result for {name} without a pending call")
            }
            Self::MisplacedSystemMessage { index } => {
                write!(f, "message {index}: system message after the first turn")
            }
            Self::UnansweredFunctionCall { index, name } => {
                write!(f, "message {index}: call to {name} never answered")
            }
        }
    }
}
