//! Relative semantic-token encoding.

use serde::{Deserialize, Serialize};

/// Token type id and modifier bitmask for one capture category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenType {
    /// Index into the client's token type list.
    pub token_type: u32,
    /// Bitmask over the client's token modifier list.
    pub modifiers: u32,
}

impl TokenType {
    /// Create a token type.
    pub const fn new(token_type: u32, modifiers: u32) -> Self {
        Self {
            token_type,
            modifiers,
        }
    }
}

/// Maps a capture category index to its [`TokenType`].
pub type Legend = Vec<TokenType>;

/// A token at an absolute position, before delta encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Start line.
    pub line: u32,
    /// Start character (scalar values).
    pub character: u32,
    /// Length in scalar values.
    pub length: u32,
    /// Type and modifiers.
    pub token_type: TokenType,
}

/// Build a modifier bitmask from modifier indexes. Indexes of 32 or more are ignored.
pub fn bit_mask(modifiers: &[u32]) -> u32 {
    modifiers
        .iter()
        .fold(0, |mask, &i| mask | 1u32.checked_shl(i).unwrap_or(0))
}

/// Encode tokens (in document order) into the flat relative stream, five `u32`s per token:
/// line delta, start delta, length, type, modifiers.
///
/// The line is relative to the previous token's line; the start is relative to the previous
/// token's start only when both are on the same line.
pub fn encode_tokens(tokens: impl IntoIterator<Item = Token>) -> Vec<u32> {
    let tokens = tokens.into_iter();
    let mut out = Vec::with_capacity(tokens.size_hint().0 * 5);
    let mut prev: Option<(u32, u32)> = None;

    for token in tokens {
        let (line, character) = match prev {
            Some((line, character)) if line == token.line => {
                (0, token.character.saturating_sub(character))
            }
            Some((line, _)) => (token.line.saturating_sub(line), token.character),
            None => (token.line, token.character),
        };

        out.extend_from_slice(&[
            line,
            character,
            token.length,
            token.token_type.token_type,
            token.token_type.modifiers,
        ]);
        prev = Some((token.line, token.character));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(line: u32, character: u32, length: u32, token_type: u32) -> Token {
        Token {
            line,
            character,
            length,
            token_type: TokenType::new(token_type, 0),
        }
    }

    #[test]
    fn test_relative_encoding() {
        let encoded = encode_tokens([token(0, 4, 1, 0), token(0, 6, 2, 1), token(1, 4, 3, 2)]);
        assert_eq!(encoded, vec![0, 4, 1, 0, 0, 0, 2, 2, 1, 0, 1, 4, 3, 2, 0]);
    }

    #[test]
    fn test_line_gap_keeps_absolute_column() {
        let encoded = encode_tokens([token(2, 8, 1, 0), token(5, 1, 1, 0)]);
        assert_eq!(encoded, vec![2, 8, 1, 0, 0, 3, 1, 1, 0, 0]);
    }

    #[test]
    fn test_empty() {
        assert!(encode_tokens(Vec::new()).is_empty());
    }

    #[test]
    fn test_modifiers_pass_through() {
        let encoded = encode_tokens([Token {
            line: 0,
            character: 0,
            length: 2,
            token_type: TokenType::new(3, bit_mask(&[0, 2])),
        }]);
        assert_eq!(encoded, vec![0, 0, 2, 3, 0b101]);
    }

    #[test]
    fn test_bit_mask() {
        assert_eq!(bit_mask(&[]), 0);
        assert_eq!(bit_mask(&[1, 1, 4]), 0b10010);
        assert_eq!(bit_mask(&[31]), 1 << 31);
        assert_eq!(bit_mask(&[32, 40]), 0);
    }
}
