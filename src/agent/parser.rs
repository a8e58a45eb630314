//! Action parsing
//!
//! Turns one raw model response into exactly one `Action`. Two spellings are
//! accepted for both shapes the model is prompted with:
//!
//! ```text
//! {"action": "<tool>", "action_input": {...}}
//! {"tool_to_use": "<tool>", "tool_input": {...}}
//! {"action": "Final Answer", "action_input": "<text>"}
//! {"final_answer": "<text>"}
//! ```
//!
//! Anything that is not a JSON object carrying one of these is treated as
//! prose and becomes the final answer.

use super::prompt::FINAL_ANSWER_ACTION;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_+-]*[ \t]*\r?\n?(.*?)\s*```$").expect("valid fence regex")
});

const NAME_KEYS: [&str; 2] = ["action", "tool_to_use"];
const INPUT_KEYS: [&str; 2] = ["action_input", "tool_input"];

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Call a tool; `input` is either an object or a string the tool decodes
    ToolInvocation { tool: String, input: Value },
    FinalAnswer(String),
    /// Model output with no recognizable action, taken verbatim
    Unparseable(String),
}

impl Action {
    /// Canonical structured form, as echoed back to the model
    pub fn to_json(&self) -> Value {
        match self {
            Action::ToolInvocation { tool, input } => json!({
                "action": tool,
                "action_input": input,
            }),
            Action::FinalAnswer(text) => json!({
                "action": FINAL_ANSWER_ACTION,
                "action_input": text,
            }),
            Action::Unparseable(text) => Value::String(text.clone()),
        }
    }
}

/// Remove a surrounding code fence, with or without a language tag
pub fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match FENCE_RE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Render a value as answer text: strings as-is, null as empty, rest as JSON
fn coerce_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn first_of<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

pub fn parse_action(output: &str) -> Action {
    parse_response(output).0
}

/// Parse a response, also returning the JSON object the model wrote (if
/// any) so it can be echoed back as written, `thought` included
pub fn parse_response(output: &str) -> (Action, Option<Value>) {
    let text = strip_fence(output);
    let object = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => object,
        _ => return (Action::Unparseable(text.to_string()), None),
    };
    match action_from_object(&object) {
        Some(action) => (action, Some(Value::Object(object))),
        None => (Action::Unparseable(text.to_string()), None),
    }
}

fn action_from_object(object: &Map<String, Value>) -> Option<Action> {
    if let Some(answer) = object.get("final_answer") {
        return Some(Action::FinalAnswer(coerce_to_text(answer)));
    }

    let name = first_of(object, &NAME_KEYS)
        .map(coerce_to_text)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())?;

    let input = first_of(object, &INPUT_KEYS).cloned();
    if name.eq_ignore_ascii_case(FINAL_ANSWER_ACTION) {
        let text = input.as_ref().map(coerce_to_text).unwrap_or_default();
        return Some(Action::FinalAnswer(text));
    }

    Some(Action::ToolInvocation {
        tool: name,
        input: input.unwrap_or_else(|| Value::Object(Map::new())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_invocation_with_object_input() {
        let action = parse_action(r#"{"action": "read_file", "action_input": {"file_path": "a.txt"}}"#);
        assert_eq!(
            action,
            Action::ToolInvocation {
                tool: "read_file".to_string(),
                input: json!({"file_path": "a.txt"}),
            }
        );
    }

    #[test]
    fn test_tool_invocation_with_string_input() {
        let action = parse_action(r#"{"action": "read_file", "action_input": "{\"file_path\": \"a.txt\"}"}"#);
        match action {
            Action::ToolInvocation { input, .. } => {
                assert_eq!(input, Value::String(r#"{"file_path": "a.txt"}"#.to_string()))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alternate_spelling_and_missing_input() {
        let action = parse_action(r#"{"thought": "look", "tool_to_use": "pdf_info"}"#);
        assert_eq!(
            action,
            Action::ToolInvocation {
                tool: "pdf_info".to_string(),
                input: json!({}),
            }
        );
    }

    #[test]
    fn test_final_answer_spellings() {
        assert_eq!(
            parse_action(r#"{"action": "Final Answer", "action_input": "done"}"#),
            Action::FinalAnswer("done".to_string())
        );
        assert_eq!(
            parse_action(r#"{"action": "final answer", "action_input": "done"}"#),
            Action::FinalAnswer("done".to_string())
        );
        assert_eq!(
            parse_action(r#"{"thought": "ok", "final_answer": "all good"}"#),
            Action::FinalAnswer("all good".to_string())
        );
        // Non-string answers are coerced
        assert_eq!(
            parse_action(r#"{"final_answer": 42}"#),
            Action::FinalAnswer("42".to_string())
        );
    }

    #[test]
    fn test_final_answer_field_wins_over_action() {
        let action = parse_action(r#"{"action": "read_file", "final_answer": "stop"}"#);
        assert_eq!(action, Action::FinalAnswer("stop".to_string()));
    }

    #[test]
    fn test_fenced_block() {
        let text = "```json\n{\"action\": \"read_file\", \"action_input\": {}}\n```";
        assert!(matches!(parse_action(text), Action::ToolInvocation { ref tool, .. } if tool == "read_file"));

        let bare = "  ```\n{\"final_answer\": \"x\"}\n```  ";
        assert_eq!(parse_action(bare), Action::FinalAnswer("x".to_string()));
    }

    #[test]
    fn test_prose_is_unparseable() {
        let action = parse_action("  The file contains three lines.  ");
        assert_eq!(action, Action::Unparseable("The file contains three lines.".to_string()));
    }

    #[test]
    fn test_fenced_prose_keeps_only_inner_text() {
        let action = parse_action("```\nNo tool needed, the answer is 4.\n```");
        assert_eq!(action, Action::Unparseable("No tool needed, the answer is 4.".to_string()));

        let action = parse_action("```json\n{\"thought\": \"hmm\"}\n```");
        assert_eq!(action, Action::Unparseable(r#"{"thought": "hmm"}"#.to_string()));
    }

    #[test]
    fn test_response_keeps_model_object() {
        let text = r#"{"thought": "need the file", "action": "read_file", "action_input": {"file_path": "a.txt"}}"#;
        let (action, raw) = parse_response(text);
        assert!(matches!(action, Action::ToolInvocation { ref tool, .. } if tool == "read_file"));
        assert_eq!(raw.unwrap()["thought"], json!("need the file"));

        let (action, raw) = parse_response("plain words");
        assert_eq!(action, Action::Unparseable("plain words".to_string()));
        assert!(raw.is_none());
    }

    #[test]
    fn test_empty_action_name_is_unparseable() {
        let action = parse_action(r#"{"action": "", "action_input": {}}"#);
        assert!(matches!(action, Action::Unparseable(_)));
    }

    #[test]
    fn test_object_without_known_fields_is_unparseable() {
        let action = parse_action(r#"{"thought": "hmm"}"#);
        assert!(matches!(action, Action::Unparseable(_)));
        assert!(matches!(parse_action("[1, 2, 3]"), Action::Unparseable(_)));
    }

    #[test]
    fn test_render_then_parse_recovers_action() {
        let actions = [
            Action::ToolInvocation {
                tool: "create_file".to_string(),
                input: json!({"file_path": "x.txt", "content": "multi\nline"}),
            },
            Action::ToolInvocation {
                tool: "run_command".to_string(),
                input: Value::String("{'command': 'ls'}".to_string()),
            },
            Action::FinalAnswer("All done.".to_string()),
        ];

        for action in actions {
            let compact = action.to_json().to_string();
            let pretty = serde_json::to_string_pretty(&action.to_json()).unwrap();
            let fenced = format!("```json\n{}\n```", pretty);
            for text in [compact, pretty, fenced] {
                assert_eq!(parse_action(&text), action, "{}", text);
            }
        }
    }
}
