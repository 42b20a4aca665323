//! # turnwire
//!
//! A text codec for function-calling chat transcripts.
//!
//! Conversations are flattened into a single string of role-tagged segments,
//! each closed by a role-specific end marker, and parsed back into messages.
//! Parsing is best-effort: a transcript still being generated decodes into
//! its finished messages plus an in-progress one, and malformed input is
//! reported as warnings rather than failing.
//!
//! ## Quick Start
//!
//! ```rust
//! use turnwire::{FunctionSpec, Message, Parameters, PromptConfig, Property, decode, encode};
//!
//! let get_car_price = FunctionSpec::builder()
//!     .name("get_car_price")
//!     .description("Get the price of a particular car model")
//!     .parameters(Parameters::new().required(
//!         "car_name",
//!         Property::string("The name of the car model"),
//!     ))
//!     .build();
//!
//! let conversation = PromptConfig::default().assemble(
//!     &[get_car_price],
//!     vec![
//!         Message::user("How much is the Song?"),
//!         Message::function_call("get_car_price", r#"{"car_name": "Song"}"#),
//!     ],
//! );
//!
//! let text = encode(&conversation.messages).expect("encodable");
//! let decoded = decode(&text);
//! assert_eq!(decoded.messages, conversation.messages);
//! ```
//!
//! ## Modules
//!
//! - [`markers`]: role headers and end markers
//! - [`schema`]: function definitions rendered for the system prompt
//! - [`encode`] / [`decode`]: the codec itself
//! - [`pairing`]: call/result matching and structural validation
//! - [`prompt`]: assembly of the leading system messages

pub mod decode;
pub mod diagnostics;
pub mod encode;
pub mod error;
pub mod markers;
pub mod pairing;
pub mod prompt;
pub mod schema;

pub use turnwire_common::*;

pub use decode::{Decoded, StreamDecoder, Tail, decode};
pub use diagnostics::Warning;
pub use encode::{Encoded, EncodedSegment, encode, encode_conversation, encode_segments};
pub use error::EncodeError;
pub use markers::{EndToken, Header, special_tokens};
pub use pairing::{PairingTracker, validate};
pub use prompt::{DEFAULT_SYSTEM_INSTRUCTION, PromptConfig};
pub use schema::{DEFAULT_NAMESPACE, render_functions};
