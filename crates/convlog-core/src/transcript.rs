use crate::message::ChatMessage;

/// Strip characters the downstream tool cannot be trusted with: anything
/// non-ASCII, and ASCII control characters other than tab and newline.
pub fn sanitize(content: &str) -> String {
    content
        .chars()
        .filter(|c| c.is_ascii() && (!c.is_ascii_control() || *c == '\n' || *c == '\t'))
        .collect()
}

/// Render buffered messages as a plain-text transcript: one
/// `"<Speaker>: <content>"` block per message, blank-line separated,
/// trailing whitespace trimmed from the whole transcript.
pub fn render(messages: &[ChatMessage]) -> String {
    let mut transcript = String::new();

    for msg in messages {
        transcript.push_str(msg.role.speaker_label());
        transcript.push_str(": ");
        transcript.push_str(&sanitize(&msg.content));
        transcript.push_str("\n\n");
    }

    transcript.trim_end().to_string()
}
