use super::{ExtractError, Extracted, Extractor};
use chrono::DateTime;
use serde_json::Value;

fn parse(bytes: &[u8], format: &'static str) -> Result<Value, ExtractError> {
    serde_json::from_slice(bytes).map_err(|e| ExtractError::malformed(format, e))
}

/// Strings are taken verbatim; anything else is serialized back to JSON
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Chat transcripts shaped like `{"messages": [{"content": ...}, ...]}`
pub struct MessagesJsonExtractor;

impl Extractor for MessagesJsonExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let root = parse(bytes, "json")?;
        let messages = root
            .get("messages")
            .and_then(Value::as_array)
            .ok_or_else(|| ExtractError::malformed("json", "expected a `messages` array"))?;

        let contents: Vec<String> = messages
            .iter()
            .filter_map(|message| message.get("content"))
            .filter(|content| !content.is_null())
            .map(value_text)
            .collect();

        let count = contents.len();
        Ok(Extracted::new(contents.join("\n\n")).with("messages", count))
    }

    fn name(&self) -> &'static str {
        "messages-json"
    }
}

/// A top-level JSON array of strings
pub struct TextArrayExtractor;

impl Extractor for TextArrayExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let root = parse(bytes, "json")?;
        let items = root
            .as_array()
            .ok_or_else(|| ExtractError::malformed("json", "expected a top-level array"))?;

        let texts = items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ExtractError::malformed("json", "array items must be strings"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = texts.len();
        Ok(Extracted::new(texts.join("\n\n")).with("items", count))
    }

    fn name(&self) -> &'static str {
        "text-array-json"
    }
}

/// ChatGPT conversation exports: a list of conversations, each with a
/// `mapping` of message nodes
pub struct ChatGptExtractor;

impl Extractor for ChatGptExtractor {
    fn extract(&self, _name: &str, bytes: &[u8]) -> Result<Extracted, ExtractError> {
        let root = parse(bytes, "chatgpt")?;
        let conversations = root
            .as_array()
            .ok_or_else(|| ExtractError::malformed("chatgpt", "expected a list of conversations"))?;

        let mut text = String::new();
        for conversation in conversations {
            let title = conversation
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let Some(mapping) = conversation.get("mapping").and_then(Value::as_object) else {
                continue;
            };

            let mut messages: Vec<&Value> = mapping
                .values()
                .filter_map(|node| node.get("message"))
                .filter(|message| !message.is_null())
                .collect();
            messages.sort_by(|a, b| create_time(a).total_cmp(&create_time(b)));

            for message in messages {
                if let Some(line) = message_line(title, message) {
                    text.push_str(&line);
                }
            }
        }

        Ok(Extracted::new(text.trim_end().to_string()).with("conversations", conversations.len()))
    }

    fn name(&self) -> &'static str {
        "chatgpt-json"
    }
}

fn create_time(message: &Value) -> f64 {
    message
        .get("create_time")
        .and_then(Value::as_f64)
        .unwrap_or_default()
}

/// `"{title} - {role} on {date}: {text}\n\n"`, or `None` for messages
/// without text
fn message_line(title: &str, message: &Value) -> Option<String> {
    let parts = message.pointer("/content/parts")?.as_array()?;
    let body: String = parts.iter().filter_map(Value::as_str).collect();
    if body.is_empty() {
        return None;
    }

    let role = message
        .pointer("/author/role")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let date = DateTime::from_timestamp(create_time(message) as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    Some(format!("{} - {} on {}: {}\n\n", title, role, date, body))
}

#[cfg(test)]
mod json_tests {
    use super::*;

    #[test]
    fn test_messages_content() {
        let json = br#"{"messages": [{"content": "hi"}, {"content": {"k": 1}}, {"role": "x"}]}"#;
        let extracted = MessagesJsonExtractor.extract("chat.json", json).unwrap();
        assert_eq!(extracted.text, "hi\n\n{\"k\":1}");
        assert_eq!(extracted.metadata.get("messages").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_messages_missing() {
        let err = MessagesJsonExtractor.extract("data.json", b"[1, 2]").unwrap_err();
        assert!(err.to_string().contains("messages"));
    }

    #[test]
    fn test_text_array() {
        let extracted = TextArrayExtractor
            .extract("x_text_array.json", br#"["first", "second"]"#)
            .unwrap();
        assert_eq!(extracted.text, "first\n\nsecond");
    }

    #[test]
    fn test_text_array_rejects_non_strings() {
        assert!(TextArrayExtractor.extract("text_array.json", b"[1]").is_err());
    }

    #[test]
    fn test_chatgpt_orders_by_create_time() {
        let json = br#"[{
            "title": "Trip",
            "mapping": {
                "b": {"message": {"author": {"role": "assistant"}, "create_time": 1700000060,
                      "content": {"parts": ["Sure."]}}},
                "root": {"message": null},
                "a": {"message": {"author": {"role": "user"}, "create_time": 1700000000,
                      "content": {"parts": ["Plan a trip"]}}}
            }
        }]"#;
        let extracted = ChatGptExtractor
            .extract("fake_conversations.json", json)
            .unwrap();
        assert_eq!(
            extracted.text,
            "Trip - user on 2023-11-14 22:13:20: Plan a trip\n\n\
             Trip - assistant on 2023-11-14 22:14:20: Sure."
        );
    }
}
