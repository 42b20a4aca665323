use thiserror::Error;
use turnwire_common::MessageRole;

use crate::markers::EndToken;

/// A message the encoder cannot represent without losing information.
///
/// These are programmer errors in how a conversation was assembled; the
/// decoder never produces them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("message {index}: function call on a {role} message")]
    FunctionCallOnNonAssistant { index: usize, role: MessageRole },

    #[error("message {index}: function call turns cannot also carry content")]
    ContentWithFunctionCall { index: usize },

    #[error("message {index}: function messages must name the function they answer")]
    MissingFunctionName { index: usize },

    #[error("message {index}: only function messages carry a name, found one on a {role} message")]
    UnexpectedName { index: usize, role: MessageRole },

    #[error("message {index}: invalid function name {name:?}")]
    InvalidFunctionName { index: usize, name: String },

    #[error("message {index}: payload contains the reserved marker {marker}")]
    MarkerInPayload { index: usize, marker: EndToken },

    #[error("invalid namespace {0:?}")]
    InvalidNamespace(String),
}
