//! Text to conversation, tolerant of truncated and malformed input.
//!
//! Decoding never fails. It returns every segment it could close, the
//! segment still open when the text ran out (if any), a [`Tail`] status and
//! the [`Warning`]s it collected along the way.
//!
//! ```
//! use turnwire::{Tail, decode};
//!
//! let decoded = decode("user:\nHi\n<|END_OF_USER|>\nassistant:\nHel");
//!
//! assert_eq!(decoded.messages.len(), 1);
//! assert_eq!(decoded.partial.as_ref().unwrap().content.as_deref(), Some("Hel"));
//! assert_eq!(decoded.tail, Tail::Truncated);
//! ```

use log::debug;
use serde::Serialize;
use turnwire_common::{Conversation, Message};

use crate::diagnostics::Warning;
use crate::markers::{
    Header, find_header_in_line, find_terminator, is_header_prefix, pending_terminator_len,
};
use crate::pairing::PairingTracker;

/// How the end of the decoded text looked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tail {
    /// Every segment was closed.
    Complete,
    /// The text ended inside a segment or inside a header line.
    Truncated,
    /// The text ended with content that is not part of any segment.
    Unparsed,
}

/// Result of decoding a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    /// Messages whose segments were closed by a terminator.
    pub messages: Vec<Message>,
    /// The message whose segment was still open, with its payload so far.
    pub partial: Option<Message>,
    /// Status of the end of the text.
    pub tail: Tail,
    /// Structural findings, in the order they were encountered.
    pub warnings: Vec<Warning>,
}

impl Decoded {
    /// Returns `true` if the end of the text was not a closed segment.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.tail != Tail::Complete
    }

    /// Closed messages followed by the open one, if any.
    pub fn all_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().chain(self.partial.as_ref())
    }

    /// The closed messages as a conversation; the open message is dropped.
    #[must_use]
    pub fn into_conversation(self) -> Conversation {
        Conversation::from_messages(self.messages)
    }
}

/// Decodes a transcript, or a prefix of one.
///
/// Decoding the same text always gives the same result, and decoding a
/// prefix of a transcript gives a prefix of its messages plus at most one
/// open message.
#[must_use]
pub fn decode(text: &str) -> Decoded {
    let mut messages: Vec<Message> = Vec::new();
    let mut warnings = Vec::new();
    let mut partial = None;
    let mut tail = Tail::Complete;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        match rest.find('\n') {
            Some(newline) => {
                if let Some(header) = Header::parse(&rest[..newline]) {
                    let payload_start = pos + newline + 1;
                    if let Some((end, token)) = find_terminator(text, payload_start) {
                        let index = messages.len();
                        if token != header.end_token() {
                            warnings.push(Warning::MismatchedTerminator {
                                index,
                                expected: header.end_token(),
                                found: token,
                            });
                        }
                        messages.push(build_message(header, &text[payload_start..end]));
                        pos = end + 1 + token.as_str().len();
                        if text[pos..].starts_with('\n') {
                            pos += 1;
                        }
                    } else {
                        let body = &text[payload_start..];
                        let visible = body.len() - pending_terminator_len(body);
                        partial = Some(build_message(header, &body[..visible]));
                        tail = Tail::Truncated;
                        pos = text.len();
                    }
                    continue;
                }
            }
            None => {
                if is_header_prefix(rest) {
                    tail = Tail::Truncated;
                    break;
                }
            }
        }

        // Not a header: skip ahead to the next one.
        let next = next_header(text, pos);
        let end = next.unwrap_or(text.len());
        let skipped = &text[pos..end];
        let blank = skipped.trim().is_empty();
        if !blank {
            warnings.push(Warning::UnrecognizedText {
                offset: pos,
                text: skipped.to_string(),
                after: messages.len().checked_sub(1),
            });
        }
        if next.is_none() && (!blank || messages.is_empty()) {
            tail = Tail::Unparsed;
        }
        pos = end;
    }

    let mut tracker = PairingTracker::new();
    for (index, message) in messages.iter().enumerate() {
        tracker.observe(index, message);
    }
    warnings.extend(tracker.into_warnings());

    debug!(
        "Decoded {} message(s), partial: {}, tail: {tail:?}, warnings: {}",
        messages.len(),
        partial.is_some(),
        warnings.len()
    );

    Decoded {
        messages,
        partial,
        tail,
        warnings,
    }
}

/// Start of the next header after `from`.
///
/// A header is found at the end of any complete line, so one glued to stray
/// text on the same line is still recovered. A trailing unterminated line
/// counts when it may still grow into a header.
fn next_header(text: &str, from: usize) -> Option<usize> {
    let mut line_start = from;
    loop {
        let rest = &text[line_start..];
        let Some(newline) = rest.find('\n') else {
            return (line_start > from && !rest.is_empty() && is_header_prefix(rest))
                .then_some(line_start);
        };
        if let Some(at) = find_header_in_line(&rest[..newline])
            && line_start + at > from
        {
            return Some(line_start + at);
        }
        line_start += newline + 1;
    }
}

fn build_message(header: Header, payload: &str) -> Message {
    match header {
        Header::System => Message::system(payload),
        Header::User => Message::user(payload),
        Header::Assistant => Message::assistant(payload),
        Header::FunctionCall(name) => Message::function_call(name, payload),
        Header::FunctionResult(name) => Message::function_result(name, payload),
    }
}

/// Buffers streamed model output and re-decodes it on every chunk.
///
/// ```
/// use turnwire::StreamDecoder;
///
/// let mut stream = StreamDecoder::new();
/// stream.push("assistant to=get_car_price:\n{\"car_");
/// let decoded = stream.push("name\": \"Song\"}\n<|END_OF_FUNCTION_CALL|>\n");
///
/// assert_eq!(decoded.messages.len(), 1);
/// assert!(!decoded.is_incomplete());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StreamDecoder {
    buffer: String,
}

impl StreamDecoder {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk of generated text and decodes everything so far.
    pub fn push(&mut self, chunk: &str) -> Decoded {
        self.buffer.push_str(chunk);
        decode(&self.buffer)
    }

    /// Decodes the text buffered so far.
    #[must_use]
    pub fn decoded(&self) -> Decoded {
        decode(&self.buffer)
    }

    /// The text buffered so far.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Discards the buffered text.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}


#[cfg(test)]
mod proptests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::encode::encode;
    use proptest::prelude::*;

    fn text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 .,:'{}\"\\n-]{1,40}"
    }

    fn function_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}"
    }

    fn message() -> impl Strategy<Value = Message> {
        prop_oneof![
            text().prop_map(Message::system),
            text().prop_map(Message::user),
            text().prop_map(Message::assistant),
            (function_name(), text()).prop_map(|(n, a)| Message::function_call(n, a)),
            (function_name(), text()).prop_map(|(n, r)| Message::function_result(n, r)),
        ]
    }

    proptest! {
        #[test]
        fn roundtrip(messages in prop::collection::vec(message(), 0..12)) {
            let text = encode(&messages).unwrap();
            let decoded = decode(&text);

            prop_assert_eq!(&decoded.messages, &messages);
            prop_assert!(decoded.partial.is_none());
            prop_assert_eq!(decoded.tail, Tail::Complete);
        }

        #[test]
        fn prefix_decodes_to_prefix(
            messages in prop::collection::vec(message(), 1..8),
            cut in any::<prop::sample::Index>(),
        ) {
            let text = encode(&messages).unwrap();
            let full = decode(&text);
            let cut = cut.index(text.len() + 1);
            prop_assume!(text.is_char_boundary(cut));

            let prefix = decode(&text[..cut]);
            prop_assert!(prefix.messages.len() <= full.messages.len());
            prop_assert_eq!(&prefix.messages[..], &full.messages[..prefix.messages.len()]);

            if let Some(partial) = &prefix.partial {
                let next = &full.messages[prefix.messages.len()];
                prop_assert_eq!(partial.role, next.role);
                prop_assert!(next.content_str().starts_with(partial.content_str()));
                if let (Some(open), Some(done)) = (&partial.function_call, &next.function_call) {
                    prop_assert_eq!(&open.name, &done.name);
                    prop_assert!(done.arguments.starts_with(&open.arguments));
                }
            }
        }

        #[test]
        fn unrecognized_text_between_segments_is_isolated(
            messages in prop::collection::vec(message(), 2..8),
            at in any::<prop::sample::Index>(),
            noise in "[a-z ]{1,20}",
        ) {
            let boundary = at.index(messages.len() - 1) + 1;
            let mut text = encode(&messages[..boundary]).unwrap();
            text.push_str(&noise);
            text.push_str(&encode(&messages[boundary..]).unwrap());

            let decoded = decode(&text);
            prop_assert_eq!(&decoded.messages, &messages);
            prop_assert_eq!(decoded.tail, Tail::Complete);
        }

        #[test]
        fn decode_never_panics(data in ".{0,300}") {
            let decoded = decode(&data);
            if !data.is_empty() && decoded.messages.is_empty() && decoded.partial.is_none() {
                prop_assert!(decoded.is_incomplete() || !decoded.warnings.is_empty());
            }
        }
    }
}
