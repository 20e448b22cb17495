//! Interpreter reply cleanup and parsing

use serde_json::Value;

use crate::error::{ExtractError, ExtractResult};

/// Unwrap a reply wrapped in a Markdown code fence (```` ```json ```` or ```` ``` ````)
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```JSON") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };

    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a reply into a JSON object
///
/// Anything that is not an object after fence removal is unparseable.
pub fn parse_reply(reply: &str) -> ExtractResult<Value> {
    let cleaned = strip_code_fences(reply);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(ExtractError::UnparseableReply(
            "reply is JSON but not an object".to_string(),
        )),
        Err(e) => Err(ExtractError::UnparseableReply(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fence() {
        let reply = "```json\n{\"stage\": [\"IV\"]}\n```";
        assert_eq!(strip_code_fences(reply), "{\"stage\": [\"IV\"]}");
    }

    #[test]
    fn test_strip_bare_fence() {
        let reply = "  ```\n{}\n```  ";
        assert_eq!(strip_code_fences(reply), "{}");
    }

    #[test]
    fn test_unfenced_reply_trimmed() {
        assert_eq!(strip_code_fences("\n {\"a\": 1} \n"), "{\"a\": 1}");
    }

    #[test]
    fn test_unterminated_fence() {
        assert_eq!(strip_code_fences("```json\n{}"), "{}");
    }

    #[test]
    fn test_parse_reply() {
        assert!(parse_reply("```json\n{\"performance_status_max\": 1}\n```").is_ok());
        assert!(parse_reply("Here are the criteria you asked for").unwrap_err().is_reply_error());
        assert!(parse_reply("[\"III\", \"IV\"]").unwrap_err().is_reply_error());
    }
}
