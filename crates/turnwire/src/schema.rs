//! Renders function specs as a typed-signature listing.
//!
//! The listing is the content of the leading system message whenever
//! functions are offered to the assistant:
//!
//! ```text
//! // Supported function definitions that should be called when necessary.
//! namespace functions {
//!
//! // Get the price of a particular car model
//! type get_car_price = (_: {
//! // The name of the car model.
//! car_name: string,
//! }) => any;
//!
//! } // namespace functions
//! ```
//!
//! Optional fields carry a `?` after their name. Descriptions become `//`
//! comment lines above the function or field they describe.

use std::fmt::Write as _;

use serde_json::{Map, Value};
use turnwire_common::FunctionSpec;

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "functions";

const LISTING_PREAMBLE: &str =
    "// Supported function definitions that should be called when necessary.";

/// Renders every function into one namespace block.
///
/// Output depends only on the input, with fields in declaration order.
#[must_use]
pub fn render_functions(functions: &[FunctionSpec], namespace: &str) -> String {
    let mut out = String::new();
    out.push_str(LISTING_PREAMBLE);
    out.push('\n');
    let _ = writeln!(out, "namespace {namespace} {{");
    out.push('\n');
    for function in functions {
        out.push_str(&render_function(function));
        out.push('\n');
    }
    let _ = write!(out, "}} // namespace {namespace}");
    out
}

/// Renders a single function signature, followed by a newline.
#[must_use]
pub fn render_function(function: &FunctionSpec) -> String {
    let mut out = String::new();
    if let Some(description) = function.description.as_deref() {
        push_comment(&mut out, description);
    }

    let properties = function
        .parameters
        .as_ref()
        .and_then(|p| p.get("properties"))
        .and_then(Value::as_object)
        .filter(|p| !p.is_empty());

    let Some(properties) = properties else {
        let _ = writeln!(out, "type {} = () => any;", function.name);
        return out;
    };

    let required = required_fields(function.parameters.as_ref());
    let _ = writeln!(out, "type {} = (_: {{", function.name);
    for (field, schema) in properties {
        if let Some(description) = schema.get("description").and_then(Value::as_str) {
            push_comment(&mut out, description);
        }
        let marker = if required.contains(&field.as_str()) {
            ""
        } else {
            "?"
        };
        let _ = writeln!(out, "{field}{marker}: {},", render_type(schema));
    }
    out.push_str("}) => any;\n");
    out
}

/// Renders the type of one field schema.
#[must_use]
pub fn render_type(schema: &Value) -> String {
    if let Some(values) = schema.get("enum").and_then(Value::as_array)
        && !values.is_empty()
    {
        return values
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
    }

    for key in ["oneOf", "anyOf"] {
        if let Some(variants) = schema.get(key).and_then(Value::as_array) {
            return variants
                .iter()
                .map(render_type)
                .collect::<Vec<_>>()
                .join(" | ");
        }
    }

    match schema.get("type") {
        Some(Value::String(name)) => render_named_type(name, schema),
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(|name| render_named_type(name, schema))
            .collect::<Vec<_>>()
            .join(" | "),
        _ => "any".to_string(),
    }
}

fn render_named_type(name: &str, schema: &Value) -> String {
    match name {
        "integer" | "float" => "number".to_string(),
        "array" => {
            let item = schema.get("items").map_or_else(|| "any".to_string(), render_type);
            if item.contains(" | ") {
                format!("({item})[]")
            } else {
                format!("{item}[]")
            }
        }
        "object" => schema
            .get("properties")
            .and_then(Value::as_object)
            .filter(|p| !p.is_empty())
            .map_or_else(
                || "object".to_string(),
                |properties| render_inline_object(properties, schema),
            ),
        other => other.to_string(),
    }
}

fn render_inline_object(properties: &Map<String, Value>, schema: &Value) -> String {
    let required = required_fields(Some(schema));
    let fields = properties
        .iter()
        .map(|(field, field_schema)| {
            let marker = if required.contains(&field.as_str()) {
                ""
            } else {
                "?"
            };
            format!("{field}{marker}: {}", render_type(field_schema))
        })
        .collect::<Vec<_>>();
    format!("{{ {} }}", fields.join(", "))
}

fn required_fields(schema: Option<&Value>) -> Vec<&str> {
    schema
        .and_then(|s| s.get("required"))
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn push_comment(out: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    for line in text.lines() {
        let _ = writeln!(out, "// {}", line.trim_end());
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use serde_json::json;
    use turnwire_common::{Parameters, Property};

    fn car_price() -> FunctionSpec {
        FunctionSpec::builder()
            .name("get_car_price")
            .description("Get the price of a particular car model")
            .parameters(
                Parameters::new()
                    .required("car_name", Property::string("The name of the car model.")),
            )
            .build()
    }

    #[test]
    fn test_render_car_price_listing() {
        let listing = render_functions(&[car_price()], DEFAULT_NAMESPACE);
        assert_eq!(
            listing,
            "// Supported function definitions that should be called when necessary.\n\
             namespace functions {\n\
             \n\
             // Get the price of a particular car model\n\
             type get_car_price = (_: {\n\
             // The name of the car model.\n\
             car_name: string,\n\
             }) => any;\n\
             \n\
             } // namespace functions"
        );
    }

    #[test]
    fn test_render_optional_and_enum_fields() {
        let spec = FunctionSpec::builder()
            .name("get_current_weather")
            .description("Get the current weather")
            .parameters(
                Parameters::new()
                    .required(
                        "location",
                        Property::string("The city and state, e.g. San Francisco, CA"),
                    )
                    .optional(
                        "format",
                        Property::string_enum("The temperature unit to use.", vec![
                            "celsius",
                            "fahrenheit",
                        ]),
                    ),
            )
            .build();

        let rendered = render_function(&spec);
        assert_eq!(
            rendered,
            "// Get the current weather\n\
             type get_current_weather = (_: {\n\
             // The city and state, e.g. San Francisco, CA\n\
             location: string,\n\
             // The temperature unit to use.\n\
             format?: \"celsius\" | \"fahrenheit\",\n\
             }) => any;\n"
        );
    }

    #[test]
    fn test_render_function_without_parameters() {
        let spec = FunctionSpec::builder().name("get_current_time").build();
        assert_eq!(render_function(&spec), "type get_current_time = () => any;\n");

        let spec = FunctionSpec::builder()
            .name("noop")
            .parameters(Parameters::new())
            .build();
        assert_eq!(render_function(&spec), "type noop = () => any;\n");
    }

    #[test]
    fn test_render_types() {
        assert_eq!(render_type(&json!({"type": "integer"})), "number");
        assert_eq!(render_type(&json!({"type": "float"})), "number");
        assert_eq!(render_type(&json!({"type": "boolean"})), "boolean");
        assert_eq!(render_type(&json!({})), "any");
        assert_eq!(render_type(&json!({"type": ["string", "null"]})), "string | null");
        assert_eq!(
            render_type(&json!({"type": "array", "items": {"type": "string"}})),
            "string[]"
        );
        assert_eq!(render_type(&json!({"type": "array"})), "any[]");
        assert_eq!(
            render_type(&json!({"type": "array", "items": {"enum": ["a", "b"]}})),
            "(\"a\" | \"b\")[]"
        );
        assert_eq!(
            render_type(&json!({"oneOf": [{"type": "string"}, {"type": "integer"}]})),
            "string | number"
        );
        assert_eq!(render_type(&json!({"enum": [1, 2]})), "1 | 2");
    }

    #[test]
    fn test_render_nested_object() {
        let schema = json!({
            "type": "object",
            "properties": {
                "city": {"type": "string"},
                "zip": {"type": "integer"}
            },
            "required": ["city"]
        });
        assert_eq!(render_type(&schema), "{ city: string, zip?: number }");
        assert_eq!(render_type(&json!({"type": "object"})), "object");
    }

    #[test]
    fn test_render_multiline_description() {
        let spec = FunctionSpec::builder()
            .name("f")
            .description("First line.\nSecond line.  ")
            .build();
        assert_eq!(
            render_function(&spec),
            "// First line.\n// Second line.\ntype f = () => any;\n"
        );
    }

    #[test]
    fn test_render_empty_listing_and_namespace() {
        assert_eq!(
            render_functions(&[], "tools"),
            "// Supported function definitions that should be called when necessary.\n\
             namespace tools {\n\
             \n\
             } // namespace tools"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let functions = vec![car_price(), FunctionSpec::builder().name("other").build()];
        assert_eq!(
            render_functions(&functions, DEFAULT_NAMESPACE),
            render_functions(&functions, DEFAULT_NAMESPACE)
        );
    }
}
