//! Tokenizer for transform expressions.

use crate::error::TransformCompileError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Question,
    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
}

pub(crate) fn tokenize(expression: &str) -> Result<Vec<Token>, TransformCompileError> {
    let bytes = expression.as_bytes();
    let mut idx = 0usize;
    let mut tokens = Vec::new();

    while idx < bytes.len() {
        let b = bytes[idx];
        if b.is_ascii_whitespace() {
            idx += 1;
            continue;
        }
        let next = bytes.get(idx + 1).copied();
        let (token, width) = match b {
            b'+' => (Token::Plus, 1),
            b'-' => (Token::Minus, 1),
            b'*' => (Token::Star, 1),
            b'/' => (Token::Slash, 1),
            b'%' => (Token::Percent, 1),
            b'?' => (Token::Question, 1),
            b':' => (Token::Colon, 1),
            b',' => (Token::Comma, 1),
            b'(' => (Token::LParen, 1),
            b')' => (Token::RParen, 1),
            b'{' => (Token::LBrace, 1),
            b'}' => (Token::RBrace, 1),
            b'=' if next == Some(b'=') => (Token::EqEq, 2),
            b'!' if next == Some(b'=') => (Token::NotEq, 2),
            b'!' => (Token::Bang, 1),
            b'<' if next == Some(b'=') => (Token::Le, 2),
            b'<' => (Token::Lt, 1),
            b'>' if next == Some(b'=') => (Token::Ge, 2),
            b'>' => (Token::Gt, 1),
            b'&' if next == Some(b'&') => (Token::AndAnd, 2),
            b'|' if next == Some(b'|') => (Token::OrOr, 2),
            b'"' | b'\'' => {
                let (literal, end) = read_string(expression, idx)?;
                tokens.push(Token::Str(literal));
                idx = end;
                continue;
            }
            _ if b.is_ascii_digit() || (b == b'.' && next.is_some_and(|n| n.is_ascii_digit())) => {
                let start = idx;
                idx += 1;
                while idx < bytes.len()
                    && (bytes[idx].is_ascii_digit()
                        || bytes[idx] == b'.'
                        || matches!(bytes[idx], b'e' | b'E' | b'+' | b'-'))
                {
                    if matches!(bytes[idx], b'+' | b'-') {
                        let prev = bytes[idx.saturating_sub(1)];
                        if !matches!(prev, b'e' | b'E') {
                            break;
                        }
                    }
                    idx += 1;
                }
                let raw = &expression[start..idx];
                let value = raw
                    .parse::<f64>()
                    .map_err(|_| TransformCompileError::InvalidNumber {
                        literal: raw.to_string(),
                    })?;
                tokens.push(Token::Number(value));
                continue;
            }
            _ if b.is_ascii_alphabetic() || b == b'_' => {
                let start = idx;
                idx += 1;
                while idx < bytes.len() && (bytes[idx].is_ascii_alphanumeric() || bytes[idx] == b'_')
                {
                    idx += 1;
                }
                tokens.push(Token::Ident(expression[start..idx].to_string()));
                continue;
            }
            _ => {
                let ch = expression[idx..].chars().next().unwrap_or('\u{fffd}');
                return Err(TransformCompileError::UnexpectedChar { ch, offset: idx });
            }
        };
        tokens.push(token);
        idx += width;
    }

    if tokens.is_empty() {
        return Err(TransformCompileError::Empty);
    }
    Ok(tokens)
}

/// Reads a quoted literal starting at `start`; returns the text and the offset past the closing quote.
fn read_string(expression: &str, start: usize) -> Result<(String, usize), TransformCompileError> {
    let mut chars = expression[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(TransformCompileError::UnterminatedString { offset: start });
    };
    let mut literal = String::new();
    while let Some((pos, ch)) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some((_, 'n')) => literal.push('\n'),
                Some((_, 't')) => literal.push('\t'),
                Some((_, escaped)) => literal.push(escaped),
                None => break,
            },
            c if c == quote => return Ok((literal, start + pos + c.len_utf8())),
            c => literal.push(c),
        }
    }
    Err(TransformCompileError::UnterminatedString { offset: start })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operators_and_literals() {
        let tokens = tokenize("value >= 1.5e2 && 'a\\'b' != \"x\"").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("value".to_string()),
                Token::Ge,
                Token::Number(150.0),
                Token::AndAnd,
                Token::Str("a'b".to_string()),
                Token::NotEq,
                Token::Str("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_minus_after_number_is_operator() {
        let tokens = tokenize("2-1").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Number(2.0), Token::Minus, Token::Number(1.0)]
        );
    }

    #[test]
    fn test_rejects_assignment_and_unknown_chars() {
        assert!(matches!(
            tokenize("value = 1"),
            Err(TransformCompileError::UnexpectedChar { ch: '=', offset: 6 })
        ));
        assert!(matches!(
            tokenize("value; 1"),
            Err(TransformCompileError::UnexpectedChar { ch: ';', .. })
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("concat(value, 'abc"),
            Err(TransformCompileError::UnterminatedString { offset: 14 })
        ));
    }

    #[test]
    fn test_empty() {
        assert!(matches!(tokenize("   "), Err(TransformCompileError::Empty)));
    }
}
