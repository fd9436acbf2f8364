//! Helpers shared by the records API clients.

/// Maximum characters of a response body kept in error messages.
pub const MAX_ERROR_BODY: usize = 200;

/// Pull a human-readable message out of an error response body.
///
/// Understands `{"message": "..."}`, `{"error": "..."}` and
/// `{"error": {"message": "..."}}`; anything else is returned as truncated text.
#[must_use]
pub fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .or_else(|| value.get("error").and_then(serde_json::Value::as_str))
            .or_else(|| {
                value
                    .get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(serde_json::Value::as_str)
            });
        if let Some(message) = message {
            return message.to_string();
        }
    }

    body.trim().chars().take(MAX_ERROR_BODY).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_field() {
        assert_eq!(
            extract_error_message(r#"{"message":"Product 4 is out of stock"}"#),
            "Product 4 is out of stock"
        );
    }

    #[test]
    fn test_extract_error_field() {
        assert_eq!(extract_error_message(r#"{"error":"invalid email"}"#), "invalid email");
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"total mismatch","code":42}}"#),
            "total mismatch"
        );
    }

    #[test]
    fn test_extract_plain_text_is_truncated() {
        let body = "x".repeat(500);
        assert_eq!(extract_error_message(&body).len(), MAX_ERROR_BODY);
        assert_eq!(extract_error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(extract_error_message(r#"{"status":500}"#), r#"{"status":500}"#);
    }
}
