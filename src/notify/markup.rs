/// Characters Telegram reserves in MarkdownV2 message text.
const RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes user-supplied text so it cannot corrupt MarkdownV2 message
/// structure.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(
            escape_markdown("C++ (and Rust!) _rock_."),
            "C\\+\\+ \\(and Rust\\!\\) \\_rock\\_\\."
        );
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(escape_markdown("plain words only"), "plain words only");
    }

    #[test]
    fn links_survive_escaping() {
        assert_eq!(
            escape_markdown("https://example.com/a-b_c"),
            "https://example\\.com/a\\-b\\_c"
        );
    }
}
