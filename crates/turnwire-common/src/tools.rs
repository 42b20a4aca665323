//! Function schema and function call types for function-calling transcripts.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;

/// Describes a single field in a function parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Property {
    /// The JSON type (e.g., "string", "number", "object").
    #[serde(rename = "type")]
    pub prop_type: String,
    /// Human-readable description of this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed enum values for this field.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Schema for array items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Self>>,
    /// Nested object fields, in declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// Required fields for nested objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl Property {
    fn typed(prop_type: &str, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            prop_type: prop_type.to_string(),
            description: (!description.is_empty()).then_some(description),
            enum_values: None,
            items: None,
            properties: None,
            required: None,
        }
    }

    /// Creates a string property.
    #[must_use]
    pub fn string(description: impl Into<String>) -> Self {
        Self::typed("string", description)
    }

    /// Creates a number property.
    #[must_use]
    pub fn number(description: impl Into<String>) -> Self {
        Self::typed("number", description)
    }

    /// Creates an integer property.
    #[must_use]
    pub fn integer(description: impl Into<String>) -> Self {
        Self::typed("integer", description)
    }

    /// Creates a boolean property.
    #[must_use]
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::typed("boolean", description)
    }

    /// Creates a string property with allowed enum values.
    #[must_use]
    pub fn string_enum(description: impl Into<String>, values: Vec<&str>) -> Self {
        Self {
            enum_values: Some(values.into_iter().map(String::from).collect()),
            ..Self::typed("string", description)
        }
    }

    /// Creates an array property with the given item schema.
    #[must_use]
    pub fn array(description: impl Into<String>, items: Self) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed("array", description)
        }
    }

    /// Creates an object property with nested fields.
    #[must_use]
    pub fn object(description: impl Into<String>, fields: Parameters) -> Self {
        Self {
            properties: Some(fields.properties),
            required: Some(fields.required),
            ..Self::typed("object", description)
        }
    }
}

/// Defines the parameter object of a function using JSON Schema conventions.
///
/// Fields keep the order they are added in, which is the order they are
/// rendered in the function-schema listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameters {
    /// The JSON type, always "object".
    #[serde(rename = "type")]
    pub param_type: String,
    /// Map of field names to their schema.
    pub properties: Map<String, Value>,
    /// List of required field names.
    pub required: Vec<String>,
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

impl Parameters {
    /// Creates an empty parameter object.
    #[must_use]
    pub fn new() -> Self {
        Self {
            param_type: "object".to_string(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }

    /// Adds a required field.
    #[must_use]
    pub fn required(mut self, name: impl Into<String>, property: Property) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.insert(name, property);
        self
    }

    /// Adds an optional field.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, property: Property) -> Self {
        self.insert(name.into(), property);
        self
    }

    fn insert(&mut self, name: String, property: Property) {
        // Property holds only strings, vectors and maps, so this cannot fail in
        // practice; log rather than silently dropping the field.
        match serde_json::to_value(property) {
            Ok(value) => {
                self.properties.insert(name, value);
            }
            Err(e) => warn!("Property '{name}' serialization unexpectedly failed: {e}"),
        }
    }
}

impl From<Parameters> for Value {
    fn from(params: Parameters) -> Self {
        let mut object = Map::new();
        object.insert("type".to_string(), Self::String(params.param_type));
        object.insert("properties".to_string(), Self::Object(params.properties));
        object.insert(
            "required".to_string(),
            Self::Array(params.required.into_iter().map(Self::String).collect()),
        );
        Self::Object(object)
    }
}

/// A named callable signature offered to the assistant.
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder, PartialEq, Eq)]
pub struct FunctionSpec {
    /// The name of the function.
    #[builder(setter(into))]
    pub name: String,
    /// Human-readable description of what the function does.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub description: Option<String>,
    /// JSON Schema object describing the function's input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub parameters: Option<Value>,
}

/// An invocation of a function requested by the assistant.
///
/// `arguments` is carried as opaque text. Whether it is well-formed JSON is
/// the caller's concern.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    /// The name of the function being called.
    pub name: String,
    /// The arguments as a single JSON string.
    pub arguments: String,
}

impl FunctionCall {
    /// Creates a function call.
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Returns the arguments as a JSON string slice.
    ///
    /// Returns `"{}"` if the arguments string is empty.
    #[must_use]
    pub fn arguments_json(&self) -> &str {
        if self.arguments.is_empty() {
            "{}"
        } else {
            &self.arguments
        }
    }

    /// Parses the arguments into a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json::Error` if the arguments are not valid JSON.
    pub fn parse_arguments(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(self.arguments_json())
    }
}
