use crate::lexer::cursor::Cursor;
use crate::span::{Idx, Span};

pub mod cursor;

/// A 'light' token that only carries basic and easily derivable info
#[derive(Debug)]
pub struct LToken {
    pub kind: TokenKind,
    pub len: u32,
}

impl LToken {
    pub fn new(kind: TokenKind, len: u32) -> Self {
        LToken { kind, len }
    }
}

/// Token positioned within the source.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Mnemonic or label name
    Ident,
    /// Decimal integer, possibly negative
    Int,
    /// Ends a label definition
    Colon,
    /// `--` or `;` until the end of the line
    Comment,
    Whitespace,
    /// Ends a statement
    Newline,
    Unknown,
    Eof,
}

/// Positioned tokens of `input`, not including the final `Eof`.
pub fn tokenize(input: &str) -> impl Iterator<Item = Token> + '_ {
    let mut cursor = Cursor::new(input);
    let mut offs = 0;
    std::iter::from_fn(move || {
        let token = cursor.advance_token();
        if token.kind == TokenKind::Eof {
            return None;
        }
        let span = Span::new(Idx(offs), token.len as u16);
        offs += token.len;
        Some(Token {
            kind: token.kind,
            span,
        })
    })
}

/// Test if a character is considered to be whitespace, not including newlines.
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | ',')
}

/// Test if a character can be part of a mnemonic or label.
pub(crate) fn is_id(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

impl Cursor<'_> {
    pub fn advance_token(&mut self) -> LToken {
        let first_char = match self.bump() {
            Some(c) => c,
            None => return LToken::new(TokenKind::Eof, 0),
        };
        let token_kind = match first_char {
            ';' => {
                self.take_while(|c| c != '\n');
                TokenKind::Comment
            }
            '-' if self.first() == '-' => {
                self.take_while(|c| c != '\n');
                TokenKind::Comment
            }
            '-' if self.first().is_ascii_digit() => {
                self.take_while(|c| c.is_ascii_digit());
                TokenKind::Int
            }
            '\n' => TokenKind::Newline,
            c if is_whitespace(c) => {
                self.take_while(is_whitespace);
                TokenKind::Whitespace
            }
            c if c.is_ascii_digit() => {
                self.take_while(|c| c.is_ascii_digit());
                // `12abc` is a single malformed token, not an int followed by an ident
                if is_id(self.first()) {
                    self.take_while(is_id);
                    TokenKind::Unknown
                } else {
                    TokenKind::Int
                }
            }
            // Identifiers should be checked after everything else that overlaps.
            c if is_id(c) => {
                self.take_while(is_id);
                TokenKind::Ident
            }
            ':' => TokenKind::Colon,
            _ => TokenKind::Unknown,
        };
        let res = LToken::new(token_kind, self.pos_in_token());
        self.reset_pos();
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).map(|token| token.kind).collect()
    }

    #[test]
    fn label_and_instruction() {
        use TokenKind::*;
        assert_eq!(
            kinds("a:\n  COPYTO 12 -- store\n"),
            vec![
                Ident, Colon, Newline, Whitespace, Ident, Whitespace, Int, Whitespace, Comment,
                Newline
            ]
        );
    }

    #[test]
    fn spans_are_absolute() {
        let src = "inbox ; x\njump loop";
        let tokens: Vec<_> = tokenize(src).collect();
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Ident);
        assert_eq!(&src[last.span.as_range()], "loop");
    }

    #[test]
    fn numbers() {
        use TokenKind::*;
        assert_eq!(kinds("-3"), vec![Int]);
        assert_eq!(kinds("42"), vec![Int]);
        assert_eq!(kinds("4x"), vec![Unknown]);
        assert_eq!(kinds("-x"), vec![Unknown, Ident]);
    }

    #[test]
    fn unicode_is_unknown() {
        let tokens: Vec<_> = tokenize("é").collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Unknown);
        assert_eq!(tokens[0].span.len(), 2);
    }
}
