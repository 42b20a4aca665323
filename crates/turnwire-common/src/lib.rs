//! # turnwire-common
//!
//! Common types for function-calling chat transcripts.
//!
//! This crate provides the data model shared by the transcript codec and its
//! callers:
//! - Conversation and message types
//! - Function schema and function call types
//! - Serde support matching OpenAI-style chat records
//!
//! ## Example
//!
//! ```
//! use turnwire_common::{Conversation, FunctionSpec, Message, Parameters, Property};
//!
//! // Describe a function the assistant may call
//! let spec = FunctionSpec::builder()
//!     .name("get_car_price")
//!     .description("Get the price of a particular car model")
//!     .parameters(
//!         Parameters::new().required("car_name", Property::string("The name of the car model.")),
//!     )
//!     .build();
//!
//! // Build a conversation
//! let mut conv = Conversation::new();
//! conv.add_message(Message::user("How much is the Song?"));
//! conv.add_message(Message::function_call(&spec.name, r#"{"car_name": "Song"}"#));
//! ```

/// Chat conversation and message types.
///
/// Provides types for conversations, messages, and message roles.
pub mod chat;
/// Function schema and function call types.
///
/// Provides types for describing functions the assistant may call.
pub mod tools;

pub use chat::{Conversation, Message, MessageRole};
pub use tools::{FunctionCall, FunctionSpec, Parameters, Property};
