//! Best-effort recovery of structured data from model replies
//!
//! Models asked for JSON still wrap it in prose, emit stray tokens, or return
//! lists where a string was expected. Everything here degrades to an empty
//! value instead of failing.

use std::collections::HashSet;

use serde_json::{Map, Value};

/// Parse a reply into a JSON object, salvaging the outermost `{...}` span
///
/// Returns an empty object when nothing parseable is found.
pub fn parse_json(text: &str) -> Map<String, Value> {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
        return object;
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && end > start
        && let Ok(Value::Object(object)) = serde_json::from_str::<Value>(&text[start..=end])
    {
        return object;
    }

    Map::new()
}

/// Text of a reply from either `/api/chat` or `/api/generate`
///
/// `/api/chat` nests the text under `message.content`, `/api/generate` puts it
/// under a top-level `response` string.
pub fn extract_message_content(reply: &Value) -> String {
    if let Some(message) = reply.get("message").and_then(Value::as_object)
        && let Some(content) = message.get("content")
    {
        return match content {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
    }

    reply
        .get("response")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// String items of a list-ish value; a lone string becomes a one-item list
pub fn to_str_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Interpret a model's verdict field as a boolean
///
/// Textual booleans are read by meaning; any other non-empty text counts as true.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => {
            let s = s.trim().to_lowercase();
            !matches!(s.as_str(), "" | "false" | "no" | "0" | "none" | "null")
        }
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(object)) => !object.is_empty(),
    }
}

/// Trim, drop empties, and deduplicate case-insensitively keeping first-seen casing
pub fn dedup<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let trimmed = item.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_clean() {
        let object = parse_json(r#"{"noisy": false}"#);
        assert_eq!(object.get("noisy"), Some(&json!(false)));
    }

    #[test]
    fn test_parse_json_salvages_embedded_object() {
        let object = parse_json(r#"junk {"concepts": ["Loops"]} trailing"#);
        assert_eq!(Value::Object(object), json!({"concepts": ["Loops"]}));
    }

    #[test]
    fn test_parse_json_gives_up_quietly() {
        assert!(parse_json("no json here").is_empty());
        assert!(parse_json("} backwards {").is_empty());
        assert!(parse_json("{ broken").is_empty());
        assert!(parse_json("[1, 2]").is_empty());
    }

    #[test]
    fn test_extract_message_content_chat_and_generate() {
        let chat = json!({"message": {"role": "assistant", "content": "{\"a\":1}"}});
        assert_eq!(extract_message_content(&chat), "{\"a\":1}");

        let generate = json!({"response": "hello"});
        assert_eq!(extract_message_content(&generate), "hello");

        assert_eq!(extract_message_content(&json!({"other": 1})), "");
        assert_eq!(extract_message_content(&json!({"message": {"content": null}})), "");
    }

    #[test]
    fn test_to_str_list() {
        assert_eq!(to_str_list(Some(&json!(["a", 1, "b", null]))), vec!["a", "b"]);
        assert_eq!(to_str_list(Some(&json!("solo"))), vec!["solo"]);
        assert!(to_str_list(Some(&json!({"a": 1}))).is_empty());
        assert!(to_str_list(None).is_empty());
    }

    #[test]
    fn test_truthy() {
        assert!(truthy(Some(&json!(true))));
        assert!(truthy(Some(&json!("yes"))));
        assert!(truthy(Some(&json!(1))));
        assert!(!truthy(Some(&json!("false"))));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(None));
    }

    #[test]
    fn test_dedup_preserves_first_seen_casing() {
        assert_eq!(dedup(["A", "a", "B", "A"]), vec!["A", "B"]);
        assert_eq!(dedup(["  Graphs ", "graphs", "", "  "]), vec!["Graphs"]);
    }
}
