// Unit tests for conversation naming and prompt/image splitting

use super::*;

#[test]
fn test_conversation_name_short_question() {
    assert_eq!(conversation_name("Summary"), "Summary");
}

#[test]
fn test_conversation_name_collapses_whitespace() {
    assert_eq!(
        conversation_name("What  is\nthe\tcapital of France?"),
        "What is the capital of France?"
    );
}

#[test]
fn test_conversation_name_truncates_with_ellipsis() {
    let question = "a".repeat(80);
    let name = conversation_name(&question);
    assert_eq!(name.chars().count(), NAME_MAX_CHARS + 1);
    assert!(name.ends_with('…'));
}

#[test]
fn test_conversation_name_strips_control_chars() {
    assert_eq!(conversation_name("hello\u{07} world"), "hello world");
    // Non-whitespace controls vanish without becoming separators
    assert_eq!(conversation_name("he\u{00}llo world"), "hello world");
}

#[test]
fn test_conversation_name_empty_question() {
    assert_eq!(conversation_name("   "), "New conversation");
}

#[test]
fn test_split_without_marker() {
    let (text, image) = split_image_marker("plain prompt");
    assert_eq!(text, "plain prompt");
    assert!(image.is_none());
}

#[test]
fn test_split_extracts_image_payload() {
    let prompt = format!("Question here\n\n{}aGVsbG8={}", IMAGE_MARKER_OPEN, IMAGE_MARKER_CLOSE);
    let (text, image) = split_image_marker(&prompt);
    assert_eq!(text, "Question here");
    assert_eq!(image.as_deref(), Some("aGVsbG8="));
}

#[test]
fn test_split_keeps_text_around_marker() {
    let prompt = format!(
        "before {}QUFB{} after",
        IMAGE_MARKER_OPEN, IMAGE_MARKER_CLOSE
    );
    let (text, image) = split_image_marker(&prompt);
    assert_eq!(text, "before  after".trim());
    assert_eq!(image.as_deref(), Some("QUFB"));
}

#[test]
fn test_unterminated_marker_left_alone() {
    let prompt = format!("{}dangling", IMAGE_MARKER_OPEN);
    let (text, image) = split_image_marker(&prompt);
    assert_eq!(text, prompt);
    assert!(image.is_none());
}

#[test]
fn test_backend_error_carries_status() {
    let err = BackendError::Status { status: 500 };
    assert!(err.to_string().contains("500"));
}

#[test]
fn test_conversation_url() {
    let client = BackendClient::new("https://chat.example.com/", None).unwrap();
    // Trailing slash on the configured base is stripped
    assert_eq!(client.base_url(), "https://chat.example.com");
    assert_eq!(
        client.conversation_url("abc-123"),
        "https://chat.example.com/chat/abc-123"
    );
}
