use serde::Serialize;
use std::borrow::Borrow;
use std::fmt;

// A counted name, already cut down to the configured maximum length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Builds a token from raw line content, keeping at most `max_len` characters.
    ///
    /// Truncation works on characters rather than bytes so multi-byte input
    /// is never split, and the same input always yields the same key.
    pub fn new(raw: &str, max_len: usize) -> Self {
        match raw.char_indices().nth(max_len) {
            Some((cut, _)) => Token(raw[..cut].to_string()),
            None => Token(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_is_kept_whole() {
        assert_eq!(Token::new("alice", 30).as_str(), "alice");
        assert_eq!(Token::new("alice", 5).as_str(), "alice");
    }

    #[test]
    fn long_input_keeps_first_characters() {
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        let first = Token::new(long, 30);
        assert_eq!(first.as_str(), "abcdefghijklmnopqrstuvwxyz0123");
        assert_eq!(first, Token::new(long, 30));
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        let token = Token::new("ééééé", 3);
        assert_eq!(token.as_str(), "ééé");
    }
}
