//! JSONPath evaluation over response bodies.
//!
//! Expressions use RFC 9535 syntax; a leading `$.` may be omitted. A top-level
//! `|` joins several expressions into a union whose results are concatenated
//! in order, e.g. `(items[*].token) | (items[*].url)`.

use serde_json::Value;
use serde_json_path::JsonPath;

use crate::error::RestApiError;

#[derive(Debug, Clone)]
pub struct JsonPathExpr {
    source: String,
    parts: Vec<JsonPath>,
}

impl JsonPathExpr {
    pub fn parse(expression: &str) -> Result<Self, RestApiError> {
        let parts = split_union(expression)
            .into_iter()
            .map(|part| {
                let normalized = normalize(part);
                JsonPath::parse(&normalized).map_err(|e| RestApiError::InvalidJsonPath {
                    json_path: expression.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source: expression.to_string(),
            parts,
        })
    }

    /// Every matched value, union members in order.
    pub fn find(&self, value: &Value) -> Vec<Value> {
        self.parts
            .iter()
            .flat_map(|path| path.query(value).all())
            .cloned()
            .collect()
    }

    /// Whether the expression is a `|` union of several paths.
    pub fn is_union(&self) -> bool {
        self.parts.len() > 1
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Display for JsonPathExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split on `|` outside brackets, parentheses and string literals.
fn split_union(expression: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (idx, c) in expression.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(&expression[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&expression[start..]);
    parts
}

fn normalize(part: &str) -> String {
    let part = strip_parens(part.trim());
    if part.starts_with('$') {
        part.to_string()
    } else if part.starts_with('[') {
        format!("${part}")
    } else {
        format!("$.{part}")
    }
}

/// `(expr)` -> `expr`, only when the outer pair encloses everything.
fn strip_parens(part: &str) -> &str {
    let mut current = part;
    while current.starts_with('(') && current.ends_with(')') && encloses(current) {
        current = current[1..current.len() - 1].trim();
    }
    current
}

fn encloses(part: &str) -> bool {
    let mut depth = 0usize;
    for (idx, c) in part.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return idx == part.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Value {
        json!({
            "_embedded": {
                "reports": [
                    {"token": "r1", "_links": {"last_run": {"href": "/runs/1"}}},
                    {"token": "r2", "_links": {"last_run": {"href": "/runs/2"}}}
                ]
            },
            "state": "succeeded",
            "completed_at": "2020-01-01T00:00:00Z"
        })
    }

    #[test]
    fn test_implicit_root() {
        let path = JsonPathExpr::parse("_embedded.reports[*].token").unwrap();
        assert_eq!(path.find(&body()), vec![json!("r1"), json!("r2")]);
        assert!(!path.is_union());

        let explicit = JsonPathExpr::parse("$._embedded.reports[*].token").unwrap();
        assert_eq!(explicit.find(&body()), path.find(&body()));
    }

    #[test]
    fn test_multiple_selectors_keep_order() {
        let path = JsonPathExpr::parse("['state','completed_at']").unwrap();
        assert_eq!(
            path.find(&body()),
            vec![json!("succeeded"), json!("2020-01-01T00:00:00Z")]
        );
    }

    #[test]
    fn test_union_concatenates() {
        let path = JsonPathExpr::parse(
            "(_embedded.reports[*].token) | (_embedded.reports[*]._links.last_run.href)",
        )
        .unwrap();
        assert!(path.is_union());
        assert_eq!(
            path.find(&body()),
            vec![json!("r1"), json!("r2"), json!("/runs/1"), json!("/runs/2")]
        );
    }

    #[test]
    fn test_pipe_inside_filter_is_not_a_union() {
        let parts = split_union("$.items[?@.a == 'x|y' || @.b == 1]");
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_no_match_and_invalid() {
        let path = JsonPathExpr::parse("missing[*]").unwrap();
        assert!(path.find(&body()).is_empty());

        assert!(matches!(
            JsonPathExpr::parse("$.[[["),
            Err(RestApiError::InvalidJsonPath { .. })
        ));
    }

    #[test]
    fn test_strip_parens() {
        assert_eq!(strip_parens("(a.b)"), "a.b");
        assert_eq!(strip_parens("((a.b))"), "a.b");
        assert_eq!(strip_parens("(a) | (b)"), "(a) | (b)");
    }
}
