//! Conversation to text.
//!
//! Each message becomes one segment: a header line, the payload, and the
//! role's terminator, each followed by a newline.
//!
//! ```
//! use turnwire::encode;
//! use turnwire_common::Message;
//!
//! let text = encode(&[
//!     Message::user("How much is the Song?"),
//!     Message::function_call("get_car_price", r#"{"car_name": "Song"}"#),
//! ])
//! .unwrap();
//!
//! assert_eq!(
//!     text,
//!     "user:\nHow much is the Song?\n<|END_OF_USER|>\n\
//!      assistant to=get_car_price:\n{\"car_name\": \"Song\"}\n<|END_OF_FUNCTION_CALL|>\n"
//! );
//! ```

use std::ops::Range;

use log::debug;
use serde::Serialize;
use turnwire_common::{Conversation, Message, MessageRole};

use crate::error::EncodeError;
use crate::markers::{EndToken, Header, is_valid_function_name};

/// Where one message landed in the encoded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedSegment {
    /// Index of the message in the input.
    pub index: usize,
    /// Role of the message.
    pub role: MessageRole,
    /// Function named in the header, for calls and results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Byte range of the whole segment, header through the newline after the terminator.
    pub span: Range<usize>,
    /// Byte range of the payload.
    pub payload: Range<usize>,
    /// Whether a fine-tuning loss should be computed on this segment.
    ///
    /// Only assistant turns are trained on; everything else is context.
    pub trainable: bool,
}

/// Encoded text together with per-message segment ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encoded {
    /// The full encoded transcript.
    pub text: String,
    /// One entry per input message, in order.
    pub segments: Vec<EncodedSegment>,
}

impl Encoded {
    /// Byte ranges of the trainable payloads, terminators included.
    ///
    /// The terminator is part of what the assistant must learn to emit, so
    /// each range runs from the start of the payload to the end of the
    /// terminator.
    #[must_use]
    pub fn trainable_ranges(&self) -> Vec<Range<usize>> {
        self.segments
            .iter()
            .filter(|s| s.trainable)
            .map(|s| s.payload.start..s.span.end.saturating_sub(1))
            .collect()
    }
}

/// Encodes messages into a single transcript string.
///
/// # Errors
///
/// Returns an [`EncodeError`] if any message cannot be represented; see
/// [`check_message`].
pub fn encode(messages: &[Message]) -> Result<String, EncodeError> {
    encode_segments(messages).map(|encoded| encoded.text)
}

/// Encodes a conversation into a single transcript string.
///
/// # Errors
///
/// Returns an [`EncodeError`] if any message cannot be represented.
pub fn encode_conversation(conversation: &Conversation) -> Result<String, EncodeError> {
    encode(&conversation.messages)
}

/// Encodes messages and records where each one landed.
///
/// # Errors
///
/// Returns an [`EncodeError`] if any message cannot be represented.
pub fn encode_segments(messages: &[Message]) -> Result<Encoded, EncodeError> {
    let mut text = String::new();
    let mut segments = Vec::with_capacity(messages.len());

    for (index, message) in messages.iter().enumerate() {
        let (header, payload) = check_message(index, message)?;
        let start = text.len();

        text.push_str(&header.render());
        text.push('\n');
        let payload_start = text.len();
        text.push_str(payload);
        let payload_end = text.len();
        text.push('\n');
        text.push_str(header.end_token().as_str());
        text.push('\n');

        segments.push(EncodedSegment {
            index,
            role: message.role,
            function: message.function_name().map(String::from),
            span: start..text.len(),
            payload: payload_start..payload_end,
            trainable: message.role == MessageRole::Assistant,
        });
    }

    debug!(
        "Encoded {} message(s) into {} byte(s)",
        segments.len(),
        text.len()
    );
    Ok(Encoded { text, segments })
}

/// Checks that a message can be encoded and returns its header and payload.
///
/// # Errors
///
/// - a function call on anything but an assistant message
/// - content next to a function call
/// - a function message without a name, or a name on any other message
/// - a function name that cannot appear in a header line
/// - a payload containing one of the terminator markers
pub fn check_message(index: usize, message: &Message) -> Result<(Header, &str), EncodeError> {
    if message.function_call.is_some() && message.role != MessageRole::Assistant {
        return Err(EncodeError::FunctionCallOnNonAssistant {
            index,
            role: message.role,
        });
    }
    if message.name.is_some() && message.role != MessageRole::Function {
        return Err(EncodeError::UnexpectedName {
            index,
            role: message.role,
        });
    }

    let (header, payload) = match message.role {
        MessageRole::System => (Header::System, message.content_str()),
        MessageRole::User => (Header::User, message.content_str()),
        MessageRole::Assistant => match &message.function_call {
            Some(call) => {
                if message.content.as_deref().is_some_and(|c| !c.is_empty()) {
                    return Err(EncodeError::ContentWithFunctionCall { index });
                }
                let name = checked_name(index, &call.name)?;
                (Header::FunctionCall(name), call.arguments.as_str())
            }
            None => (Header::Assistant, message.content_str()),
        },
        MessageRole::Function => {
            let name = message
                .name
                .as_deref()
                .ok_or(EncodeError::MissingFunctionName { index })?;
            let name = checked_name(index, name)?;
            (Header::FunctionResult(name), message.content_str())
        }
    };

    if let Some(marker) = EndToken::ALL
        .iter()
        .find(|token| payload.contains(token.as_str()))
    {
        return Err(EncodeError::MarkerInPayload {
            index,
            marker: *marker,
        });
    }

    Ok((header, payload))
}

fn checked_name(index: usize, name: &str) -> Result<String, EncodeError> {
    if is_valid_function_name(name) {
        Ok(name.to_string())
    } else {
        Err(EncodeError::InvalidFunctionName {
            index,
            name: name.to_string(),
        })
    }
}
