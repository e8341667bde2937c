//! `{field}` placeholder rendering against a record.
//!
//! Used for URL templates in REST query chains and by the template variable
//! transformer. `{{` and `}}` render literal braces.

use serde_json::Value;

use crate::error::TemplateError;
use crate::types::Record;

/// Render `template`, replacing each `{name}` with the record's `name` field.
pub fn render_template(template: &str, record: &Record) -> Result<String, TemplateError> {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(['{', '}']) {
        result.push_str(&rest[..start]);
        let tail = &rest[start..];

        if tail.starts_with("{{") {
            result.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            result.push('}');
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            result.push('}');
            rest = &tail[1..];
        } else {
            let end = tail.find('}').ok_or_else(|| TemplateError::Unclosed {
                template: template.to_string(),
            })?;
            let field = tail[1..end].trim();
            let value = record
                .get(field)
                .ok_or_else(|| TemplateError::MissingField {
                    field: field.to_string(),
                    template: template.to_string(),
                })?;
            result.push_str(&value_to_string(value));
            rest = &tail[end + 1..];
        }
    }
    result.push_str(rest);

    Ok(result)
}

/// Text form of a value: strings unquoted, null empty, everything else as JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        json!({"workspace": "acme", "space_id": 7, "flag": true, "none": null})
            .as_object()
            .unwrap()
            .clone()
    }

    #[test]
    fn test_render_fields() {
        let rendered =
            render_template("https://api/{workspace}/spaces/{space_id}?f={flag}", &record())
                .unwrap();
        assert_eq!(rendered, "https://api/acme/spaces/7?f=true");
        assert_eq!(render_template("{none}x", &record()).unwrap(), "x");
        assert_eq!(render_template("plain", &record()).unwrap(), "plain");
    }

    #[test]
    fn test_escaped_braces() {
        let rendered = render_template("{{\"q\": \"{workspace}\"}}", &record()).unwrap();
        assert_eq!(rendered, "{\"q\": \"acme\"}");
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            render_template("/{missing}/", &record()),
            Err(TemplateError::MissingField {
                field: "missing".into(),
                template: "/{missing}/".into()
            })
        );
        assert!(matches!(
            render_template("/{workspace", &record()),
            Err(TemplateError::Unclosed { .. })
        ));
    }
}
