//! Conversation and message types for function-calling chat transcripts.
//!
//! # Overview
//!
//! - [`Message`]: a single turn with a role, optional text content, an optional
//!   function call (assistant turns) and a function name (function turns)
//! - [`Conversation`]: an ordered sequence of messages, optionally opened by
//!   one or more system messages
//!
//! # Message Roles
//!
//! - **System**: the function-schema listing or a behavioural instruction
//! - **User**: input from the end user
//! - **Assistant**: a plain reply, or a request to call a function
//! - **Function**: the result of a previously requested call
//!
//! # Example
//!
//! ```
//! use turnwire_common::chat::{Conversation, Message, MessageRole};
//!
//! let mut conversation = Conversation::new();
//! conversation.add_message(Message::user("What is the price of the car named 'Song'?"));
//! conversation.add_message(Message::function_call(
//!     "get_car_price",
//!     r#"{"car_name": "Song"}"#,
//! ));
//! conversation.add_message(Message::function_result(
//!     "get_car_price",
//!     "{'price': {'price': '$25000'}}",
//! ));
//! conversation.add_message(Message::assistant("The Song costs $25000."));
//!
//! assert_eq!(conversation.len(), 4);
//! assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
//! ```
//!
//! Records use the OpenAI chat message shape, so training data stored as JSON
//! deserializes directly:
//!
//! ```
//! use turnwire_common::chat::{Message, MessageRole};
//!
//! let msg: Message = serde_json::from_str(
//!     r#"{"role": "function", "name": "get_car_price", "content": "{}"}"#,
//! ).unwrap();
//! assert_eq!(msg.role, MessageRole::Function);
//! assert_eq!(msg.name.as_deref(), Some("get_car_price"));
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::tools::FunctionCall;

/// Represents the role of a message sender in a conversation.
///
/// Roles are serialized to lowercase strings matching the OpenAI message format.
///
/// ```
/// use turnwire_common::chat::MessageRole;
///
/// let json = serde_json::to_string(&MessageRole::Function).unwrap();
/// assert_eq!(json, "\"function\"");
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageRole {
    /// System-level instructions or the function-schema listing.
    #[serde(rename = "system")]
    System,

    /// Messages from the end user.
    #[serde(rename = "user")]
    User,

    /// Messages from the assistant, either a reply or a function call.
    #[serde(rename = "assistant")]
    Assistant,

    /// The result of a function call.
    #[serde(rename = "function")]
    Function,
}

impl MessageRole {
    /// Returns the lowercase role name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Function => "function",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn in a conversation.
///
/// The shape follows OpenAI chat records:
///
/// - plain turns carry `content`
/// - assistant function-call turns carry `function_call` and no `content`
/// - function turns carry the called function's `name` and its result as `content`
///
/// Messages carry no ids and no timestamps, so two messages built from the
/// same data compare equal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    /// The role of the message sender.
    pub role: MessageRole,

    /// The text content of the message.
    ///
    /// For function messages this is the function result. Empty content is
    /// stored as `None`, including when deserialized.
    #[serde(
        default,
        deserialize_with = "non_empty_content",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<String>,

    /// The function call requested by an assistant message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    /// Name of the function whose result a function message carries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn non_empty_content<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|content| !content.is_empty()))
}

impl Message {
    /// Creates a new message with the specified role and content.
    ///
    /// Empty content is stored as `None`.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            role,
            content: (!content.is_empty()).then_some(content),
            function_call: None,
            name: None,
        }
    }

    /// Creates a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates a new assistant reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Creates an assistant message that calls `name` with JSON `arguments`.
    pub fn function_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: None,
            function_call: Some(FunctionCall::new(name, arguments)),
            name: None,
        }
    }

    /// Creates a function message carrying the result of calling `name`.
    pub fn function_result(name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(MessageRole::Function, result)
        }
    }

    /// Returns `true` if this is an assistant message requesting a function call.
    #[must_use]
    pub const fn is_function_call(&self) -> bool {
        matches!(self.role, MessageRole::Assistant) && self.function_call.is_some()
    }

    /// Returns the text content, or an empty string.
    #[must_use]
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Returns the function result text of a function message.
    #[must_use]
    pub fn function_result_text(&self) -> Option<&str> {
        match self.role {
            MessageRole::Function => Some(self.content_str()),
            _ => None,
        }
    }

    /// Returns the function this message is tied to: the target of a call,
    /// or the producer of a result.
    #[must_use]
    pub fn function_name(&self) -> Option<&str> {
        match self.role {
            MessageRole::Assistant => self.function_call.as_ref().map(|c| c.name.as_str()),
            MessageRole::Function => self.name.as_deref(),
            _ => None,
        }
    }
}

/// An ordered sequence of messages.
///
/// System messages, when present, open the conversation: typically the
/// rendered function-schema listing followed by a behavioural instruction.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    /// Messages in this conversation, in order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Creates a conversation from existing messages.
    #[must_use]
    pub const fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Appends a message.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns a reference to the messages in this conversation.
    #[must_use]
    pub fn get_messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the conversation has no messages.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns `true` if the first message is a system message.
    #[must_use]
    pub fn starts_with_system(&self) -> bool {
        self.messages
            .first()
            .is_some_and(|m| m.role == MessageRole::System)
    }

    /// Prepends system messages ahead of every existing message.
    pub fn prepend_system(&mut self, system: impl IntoIterator<Item = Message>) {
        let mut messages: Vec<Message> = system.into_iter().collect();
        messages.append(&mut self.messages);
        self.messages = messages;
    }
}

impl From<Vec<Message>> for Conversation {
    fn from(messages: Vec<Message>) -> Self {
        Self::from_messages(messages)
    }
}
