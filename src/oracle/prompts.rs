//! Prompt construction and response decoding for the content oracle.

use serde_json::Value;

use super::types::ContentRequest;
use crate::core::errors::{DocsmithError, Result};
use crate::docstring::SemanticContent;

/// Fixed instructions sent ahead of the routine description.
const PROMPT_CONTRACT: &str = r#"Return ONLY valid JSON in this exact format:

{
  "summary": "1–2 line description of what the function does",
  "args": {
    "arg_name": "description"
  },
  "returns": "description of the return value",
  "raises": {
    "ExceptionName": "reason"
  }
}

Rules:
- The summary MUST be written in imperative mood
- Start with the base verb (e.g., Add, Calculate, Normalize, Convert, Fetch, Validate)
- Must and should End with a period.
- Do NOT use third-person verbs (no Adds, Calculates, Returns)
- If the summary violates this rule, rewrite it internally before responding
- Include "raises" ONLY if exceptions actually occur
- If no exceptions occur, return "raises": {}
- Do NOT invent exceptions
- Do NOT include markdown
- Do NOT include triple quotes
- JSON must be strictly valid
- Be concise and professional
"#;

/// Build the prompt for one routine.
pub fn build_prompt(request: &ContentRequest) -> String {
    format!(
        "{PROMPT_CONTRACT}\n\nFunction name: {}\nArguments: {}\nReturn type: {}\nKnown raises: {}\n",
        request.name,
        py_list(&request.args),
        request.returns.as_deref().unwrap_or("None"),
        py_list(&request.raises),
    )
}

/// Render names the way a Python list literal of strings prints.
fn py_list(items: &[String]) -> String {
    let rendered: Vec<String> = items.iter().map(|item| py_str(item)).collect();
    format!("[{}]", rendered.join(", "))
}

fn py_str(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Decode a completion into semantic content.
///
/// `null` members are treated as absent. Anything that is not a JSON
/// object of the expected shape is a generation error carrying the raw text.
pub fn parse_content(raw: &str) -> Result<SemanticContent> {
    let invalid = |reason: String| DocsmithError::generation_with_response(reason, raw);

    let mut value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| invalid(format!("Completion is not valid JSON: {e}")))?;
    let Value::Object(members) = &mut value else {
        return Err(invalid("Completion is not a JSON object".to_string()));
    };
    members.retain(|_, member| !member.is_null());

    serde_json::from_value(value)
        .map_err(|e| invalid(format!("Completion has an unexpected shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContentRequest {
        ContentRequest {
            name: "add".to_string(),
            args: vec!["a".to_string(), "b".to_string()],
            returns: Some("int".to_string()),
            raises: vec![],
        }
    }

    #[test]
    fn prompt_ends_with_routine_description() {
        let prompt = build_prompt(&request());
        assert!(prompt.starts_with("Return ONLY valid JSON in this exact format:"));
        assert!(prompt.ends_with(
            "Function name: add\nArguments: ['a', 'b']\nReturn type: int\nKnown raises: []\n"
        ));
    }

    #[test]
    fn missing_return_prints_none() {
        let mut request = request();
        request.returns = None;
        request.raises = vec!["ValueError(\"it's bad\")".to_string()];
        let prompt = build_prompt(&request);
        assert!(prompt.contains("Return type: None\n"));
        assert!(prompt.contains("Known raises: ['ValueError(\"it\\'s bad\")']"));
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn content_parses_with_nulls_and_fence() {
        let content = parse_content(
            "```json\n{\"summary\": \"Add two integers.\", \"args\": {\"a\": \"First.\"}, \"returns\": null}\n```",
        )
        .unwrap();
        assert_eq!(content.summary, "Add two integers.");
        assert_eq!(content.args.get("a").map(String::as_str), Some("First."));
        assert!(content.returns.is_empty());
    }

    #[test]
    fn malformed_completion_keeps_raw_text() {
        let err = parse_content("Sure! Here is the JSON you asked for").unwrap_err();
        match err {
            DocsmithError::Generation { raw_response, .. } => {
                assert_eq!(raw_response.as_deref(), Some("Sure! Here is the JSON you asked for"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(parse_content("[1, 2]").is_err());
        assert!(parse_content("{\"args\": [\"a\"]}").is_err());
    }
}
