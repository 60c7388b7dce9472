//! Parameter schema validation
//!
//! Schemas are the JSON-schema-like objects tools declare: an `object`
//! with typed `properties` and a `required` list. Validation produces
//! field-level errors and runs before any handler is invoked; a failure
//! here is `bad_arguments`, never a handler call.

use serde_json::Value;

/// Validate `args` against `schema`. Returns field-level error strings.
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let Some(args_obj) = args.as_object() else {
        return Err(vec!["arguments must be a JSON object".to_string()]);
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            match args_obj.get(field) {
                None | Some(Value::Null) => {
                    errors.push(format!("{}: missing required field", field))
                }
                _ => {}
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(|p| p.as_object()) {
        for (field, spec) in properties {
            let Some(value) = args_obj.get(field) else { continue };
            if value.is_null() {
                continue;
            }
            let Some(expected) = spec.get("type").and_then(|t| t.as_str()) else { continue };
            if !type_matches(expected, value) {
                errors.push(format!(
                    "{}: expected {}, got {}",
                    field,
                    expected,
                    type_name(value)
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "contract_id": { "type": "string" },
                "limit": { "type": "integer" },
                "parties": { "type": "array" }
            },
            "required": ["contract_id"]
        })
    }

    #[test]
    fn accepts_valid_args() {
        assert!(validate_args(&schema(), &json!({"contract_id": "C1", "limit": 5})).is_ok());
    }

    #[test]
    fn missing_required_field() {
        let errors = validate_args(&schema(), &json!({"limit": 5})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("contract_id"));
    }

    #[test]
    fn wrong_types_reported_per_field() {
        let errors =
            validate_args(&schema(), &json!({"contract_id": 7, "limit": "many"})).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn non_object_args_rejected() {
        assert!(validate_args(&schema(), &json!("just a string")).is_err());
        assert!(validate_args(&schema(), &json!([1, 2])).is_err());
    }

    #[test]
    fn null_optional_fields_ignored() {
        assert!(validate_args(&schema(), &json!({"contract_id": "C1", "limit": null})).is_ok());
    }
}
