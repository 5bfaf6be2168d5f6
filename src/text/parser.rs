//! Model response cleanup

const FENCE: &str = "```";

/// Pull the answer out of a code-fenced reply.
///
/// With two or more fence markers the text between the first and second
/// is returned. With a single marker the text before it is returned.
/// Without any marker the whole reply is kept. Always trimmed.
pub fn extract_fenced_block(response: &str) -> String {
    let mut parts = response.split(FENCE);
    let before = parts.next().unwrap_or_default();

    let selected = match (parts.next(), parts.next()) {
        (Some(inside), Some(_)) => inside,
        _ => before,
    };
    selected.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block_content() {
        assert_eq!(extract_fenced_block("```Change the car color to red```"), "Change the car color to red");
        assert_eq!(
            extract_fenced_block("Here you go:\n```\nChange the background\n```\nDone"),
            "Change the background"
        );
    }

    #[test]
    fn test_unclosed_fence_keeps_prefix() {
        assert_eq!(extract_fenced_block("```Some text"), "");
        assert_eq!(extract_fenced_block("Prompt:  ```Some text"), "Prompt:");
    }

    #[test]
    fn test_plain_reply_is_trimmed() {
        assert_eq!(extract_fenced_block("  Place the car in a studio.\n"), "Place the car in a studio.");
    }

    #[test]
    fn test_only_first_block_is_used() {
        assert_eq!(extract_fenced_block("```one``` and ```two```"), "one");
    }
}
