//! Prompt assembly: the system messages that open a training example.
//!
//! A conversation offered functions starts with two system messages, each
//! terminated on its own: the function-schema listing, then the behavioural
//! instruction.
//!
//! ```toml
//! [prompt]
//! namespace = "functions"
//! system_instruction = "A chat between a curious user and an artificial intelligence assistant."
//! ```

use serde::{Deserialize, Serialize};
use turnwire_common::{Conversation, FunctionSpec, Message};

use crate::error::EncodeError;
use crate::schema::{DEFAULT_NAMESPACE, render_functions};

/// Instruction used when none is configured.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "A chat between a curious user and an artificial \
     intelligence assistant. The assistant gives helpful, detailed, and accurate answers to the \
     user's questions. The assistant calls functions with appropriate input when necessary";

/// How the leading system messages are built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptConfig {
    /// Namespace wrapping the function-schema listing.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Behavioural instruction sent as its own system message; `None` to omit it.
    #[serde(default = "default_system_instruction")]
    pub system_instruction: Option<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            system_instruction: default_system_instruction(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_system_instruction() -> Option<String> {
    Some(DEFAULT_SYSTEM_INSTRUCTION.to_string())
}

impl PromptConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::InvalidNamespace`] if the namespace is empty or
    /// contains whitespace or braces, which would break the listing's block
    /// structure.
    pub fn validate(&self) -> Result<(), EncodeError> {
        let invalid = self.namespace.is_empty()
            || self
                .namespace
                .chars()
                .any(|c| c.is_whitespace() || c == '{' || c == '}');
        if invalid {
            return Err(EncodeError::InvalidNamespace(self.namespace.clone()));
        }
        Ok(())
    }

    /// The system messages that open a conversation offered `functions`.
    ///
    /// The schema listing is emitted only when there are functions; the
    /// instruction only when configured.
    #[must_use]
    pub fn system_messages(&self, functions: &[FunctionSpec]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if !functions.is_empty() {
            messages.push(Message::system(render_functions(functions, &self.namespace)));
        }
        if let Some(instruction) = self.system_instruction.as_deref()
            && !instruction.is_empty()
        {
            messages.push(Message::system(instruction));
        }
        messages
    }

    /// Builds a conversation: system messages first, then `turns`.
    #[must_use]
    pub fn assemble(&self, functions: &[FunctionSpec], turns: Vec<Message>) -> Conversation {
        let mut conversation = Conversation::from_messages(turns);
        conversation.prepend_system(self.system_messages(functions));
        conversation
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use turnwire_common::MessageRole;

    fn ping() -> FunctionSpec {
        FunctionSpec::builder().name("ping").build()
    }

    #[test]
    fn test_default_config() {
        let config = PromptConfig::default();
        assert_eq!(config.namespace, "functions");
        assert_eq!(
            config.system_instruction.as_deref(),
            Some(DEFAULT_SYSTEM_INSTRUCTION)
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: PromptConfig = serde_json::from_str(r#"{"namespace": "tools"}"#).unwrap();
        assert_eq!(config.namespace, "tools");
        assert!(config.system_instruction.is_some());

        let config: PromptConfig =
            serde_json::from_str(r#"{"system_instruction": null}"#).unwrap();
        assert_eq!(config.namespace, "functions");
        assert!(config.system_instruction.is_none());
    }

    #[test]
    fn test_validate_namespace() {
        for namespace in ["", "my tools", "a{b", "x}"] {
            let config = PromptConfig {
                namespace: namespace.to_string(),
                ..PromptConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(EncodeError::InvalidNamespace(namespace.to_string()))
            );
        }
    }

    #[test]
    fn test_assemble_with_functions() {
        let conversation =
            PromptConfig::default().assemble(&[ping()], vec![Message::user("hi")]);

        assert_eq!(conversation.len(), 3);
        assert!(conversation.messages[0].content_str().starts_with("// Supported"));
        assert!(conversation.messages[0].content_str().contains("type ping = () => any;"));
        assert_eq!(
            conversation.messages[1].content.as_deref(),
            Some(DEFAULT_SYSTEM_INSTRUCTION)
        );
        assert_eq!(conversation.messages[2].role, MessageRole::User);
    }

    #[test]
    fn test_assemble_without_functions_or_instruction() {
        let config = PromptConfig {
            system_instruction: None,
            ..PromptConfig::default()
        };
        let conversation = config.assemble(&[], vec![Message::user("hi")]);
        assert_eq!(conversation.messages, vec![Message::user("hi")]);

        let conversation = PromptConfig::default().assemble(&[], vec![]);
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages[0].role, MessageRole::System);
    }

    #[test]
    fn test_custom_namespace_in_listing() {
        let config = PromptConfig {
            namespace: "weather".to_string(),
            ..PromptConfig::default()
        };
        let messages = config.system_messages(&[ping()]);
        assert!(messages[0].content_str().ends_with("} // namespace weather"));
    }
}
