//! Structured Output
//!
//! Declares the JSON shape we expect back from a model, renders it into the
//! prompt, and shape-checks whatever comes back. Range or cardinality hints
//! (`min_items`, descriptions) are instructions to the model only; [`OutputSchema::check`]
//! enforces presence and type, nothing more.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::{CoreError, Result};

/// JSON type of a declared field
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Nested object with its own fields
    Object(Vec<FieldSchema>),
    /// Homogeneous array
    Array {
        items: Box<FieldType>,
        min_items: Option<u32>,
        max_items: Option<u32>,
    },
}

impl FieldType {
    /// Array of `items` with no cardinality hints
    pub fn array_of(items: Self) -> Self {
        Self::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        }
    }

    const fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object(_) => "object",
            Self::Array { .. } => "array",
        }
    }

    fn to_json_schema(&self) -> Value {
        match self {
            Self::Object(fields) => object_schema(fields),
            Self::Array {
                items,
                min_items,
                max_items,
            } => {
                let mut schema = json!({ "type": "array", "items": items.to_json_schema() });
                if let Some(min) = min_items {
                    schema["minItems"] = json!(min);
                }
                if let Some(max) = max_items {
                    schema["maxItems"] = json!(max);
                }
                schema
            }
            scalar => json!({ "type": scalar.type_name() }),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object(_) => value.is_object(),
            Self::Array { .. } => value.is_array(),
        }
    }
}

/// A single named field in the expected output
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    /// Field name as it appears on the wire
    pub name: String,

    /// JSON type
    pub field_type: FieldType,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Whether the field must be present
    pub required: bool,
}

impl FieldSchema {
    pub fn required(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, field_type, description)
        }
    }
}

fn object_schema(fields: &[FieldSchema]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let mut schema = field.field_type.to_json_schema();
        schema["description"] = json!(field.description);
        properties.insert(field.name.clone(), schema);
        if field.required {
            required.push(json!(field.name));
        }
    }
    json!({ "type": "object", "properties": properties, "required": required })
}

/// The top-level object a model is asked to produce
#[derive(Clone, Debug, PartialEq)]
pub struct OutputSchema {
    /// Schema name (used in logs and prompts)
    pub name: String,

    /// Top-level fields
    pub fields: Vec<FieldSchema>,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// JSON Schema document for this output
    pub fn to_json_schema(&self) -> Value {
        let mut schema = object_schema(&self.fields);
        schema["title"] = json!(self.name);
        schema
    }

    /// Generate the prompt section describing the expected output
    pub fn prompt_section(&self) -> String {
        let mut prompt = String::from("## Output Format\n\n");
        prompt.push_str("Respond with a single JSON object and nothing else. ");
        prompt.push_str("It must conform to this JSON Schema:\n\n```json\n");
        let schema = serde_json::to_string_pretty(&self.to_json_schema()).unwrap_or_default();
        prompt.push_str(&schema);
        prompt.push_str("\n```\n");
        prompt
    }

    /// Check that a parsed value has every required field with the right type
    pub fn check(&self, value: &Value) -> Result<()> {
        check_fields(&self.fields, value, "")
    }

    /// Extract, shape-check and deserialize a model response
    pub fn parse<T: DeserializeOwned>(&self, content: &str) -> Result<T> {
        let json_str = extract_json(content)
            .ok_or_else(|| CoreError::Parse("no JSON object found in model output".into()))?;

        let value: Value = serde_json::from_str(json_str)
            .map_err(|e| CoreError::Parse(format!("invalid JSON in model output: {e}")))?;

        self.check(&value)?;

        serde_json::from_value(value).map_err(|e| CoreError::SchemaMismatch(e.to_string()))
    }
}

fn check_fields(fields: &[FieldSchema], value: &Value, path: &str) -> Result<()> {
    let Some(object) = value.as_object() else {
        let at = if path.is_empty() { "response" } else { path };
        return Err(CoreError::SchemaMismatch(format!("`{at}` should be an object")));
    };

    for field in fields {
        let field_path = if path.is_empty() {
            field.name.clone()
        } else {
            format!("{path}.{}", field.name)
        };

        match object.get(&field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(CoreError::SchemaMismatch(format!(
                    "missing required field `{field_path}`"
                )));
            }
            None | Some(Value::Null) => {}
            Some(v) => check_value(&field.field_type, v, &field_path)?,
        }
    }

    Ok(())
}

fn check_value(field_type: &FieldType, value: &Value, path: &str) -> Result<()> {
    if !field_type.matches(value) {
        return Err(CoreError::SchemaMismatch(format!(
            "`{path}` should be {}",
            field_type.type_name()
        )));
    }

    match (field_type, value) {
        (FieldType::Object(fields), _) => check_fields(fields, value, path),
        (FieldType::Array { items, .. }, Value::Array(elements)) => {
            for (i, element) in elements.iter().enumerate() {
                check_value(items, element, &format!("{path}[{i}]"))?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Locate the JSON object inside a model response
///
/// Accepts a fenced ```` ```json ```` block, a bare fenced block, or the
/// outermost `{ ... }` span of free text.
pub fn extract_json(content: &str) -> Option<&str> {
    for marker in ["```json", "```"] {
        if let Some(start_idx) = content.find(marker) {
            let after_marker = &content[start_idx + marker.len()..];
            if let Some(end_idx) = after_marker.find("```") {
                let body = after_marker[..end_idx].trim();
                if body.starts_with('{') {
                    return Some(body);
                }
            }
        }
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        tracing::debug!("Model output has no balanced braces");
        return None;
    }
    Some(&content[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Answer {
        title: String,
        score: f64,
        tags: Vec<Tag>,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Tag {
        label: String,
        hot: bool,
    }

    fn schema() -> OutputSchema {
        OutputSchema::new(
            "answer",
            vec![
                FieldSchema::required("title", FieldType::String, "A title"),
                FieldSchema::required("score", FieldType::Number, "A score"),
                FieldSchema::required(
                    "tags",
                    FieldType::array_of(FieldType::Object(vec![
                        FieldSchema::required("label", FieldType::String, "Label"),
                        FieldSchema::required("hot", FieldType::Boolean, "Hot?"),
                    ])),
                    "Tags",
                ),
                FieldSchema::optional("note", FieldType::String, "Optional note"),
            ],
        )
    }

    #[test]
    fn test_extract_fenced_json() {
        let content = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json(content), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_inline_json() {
        let content = "Sure! {\"a\": {\"b\": 2}} hope that helps";
        assert_eq!(extract_json(content), Some("{\"a\": {\"b\": 2}}"));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn test_parse_valid_response() {
        let content = r#"{"title": "t", "score": 3, "tags": [{"label": "x", "hot": true}]}"#;
        let answer: Answer = schema().parse(content).unwrap();
        assert_eq!(answer.title, "t");
        assert_eq!(answer.tags.len(), 1);
        assert!(answer.tags[0].hot);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let content = r#"{"title": "t", "tags": []}"#;
        let err = schema().parse::<Answer>(content).unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch(ref m) if m.contains("`score`")));
    }

    #[test]
    fn test_wrong_nested_type_names_the_path() {
        let content = r#"{"title": "t", "score": 1, "tags": [{"label": "x", "hot": "yes"}]}"#;
        let err = schema().parse::<Answer>(content).unwrap_err();
        assert!(matches!(err, CoreError::SchemaMismatch(ref m) if m.contains("tags[0].hot")));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let err = schema().parse::<Answer>("{ not json }").unwrap_err();
        assert!(matches!(err, CoreError::Parse(_)));
    }

    #[test]
    fn test_json_schema_rendering() {
        let rendered = schema().to_json_schema();
        assert_eq!(rendered["title"], "answer");
        assert_eq!(rendered["properties"]["score"]["type"], "number");
        assert_eq!(rendered["properties"]["tags"]["items"]["properties"]["hot"]["type"], "boolean");
        let required = rendered["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert!(schema().prompt_section().contains("```json"));
    }
}
