//! Comment spam heuristics.

/// Maximum comments accepted from one email address per trailing hour.
pub const MAX_COMMENTS_PER_HOUR: i64 = 5;

/// Phrases that get a comment rejected outright.
const SPAM_PHRASES: &[&str] = &["buy now", "click here", "cheap", "discount", "viagra"];

/// Case-insensitive denylist check on the comment body.
pub fn contains_spam(body: &str) -> bool {
    let lowered = body.to_lowercase();
    SPAM_PHRASES.iter().any(|phrase| lowered.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_comments_pass() {
        assert!(!contains_spam("Great tutorial, the section on lifetimes finally clicked."));
        assert!(!contains_spam(""));
    }

    #[test]
    fn denylisted_phrases_are_caught_case_insensitively() {
        assert!(contains_spam("BUY NOW while stocks last"));
        assert!(contains_spam("just Click Here for a surprise"));
        assert!(contains_spam("get a 50% discount today"));
    }

    #[test]
    fn phrases_match_inside_longer_words_of_the_body() {
        // Substring matching is intentional: obfuscation like "cheapest"
        // still trips the filter.
        assert!(contains_spam("the cheapest option around"));
    }
}
