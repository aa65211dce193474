//! Tokenizer state machine.

use prune_common::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Colon,
    Question,
    Dot,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    AmpAmp,
    Pipe,
    PipePipe,
    Caret,
    Bang,
    Tilde,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    BangEq,
    Shl,
    Shr,
    UShr,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
    PlusPlus,
    MinusMinus,

    KwIf,
    KwElse,
    KwWhile,
    KwDo,
    KwFor,
    KwSwitch,
    KwCase,
    KwDefault,
    KwBreak,
    KwContinue,
    KwReturn,
    KwThrow,
    KwAssert,
    KwNew,
    KwInstanceof,
    KwTrue,
    KwFalse,
    KwNull,
    KwFinal,
    KwStatic,

    Eof,
}

#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Error raised for source the scanner or parser cannot handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub message: String,
    pub span: Span,
}

pub struct ScannerState<'a> {
    source: &'a [u8],
    pos: usize,
}

impl<'a> ScannerState<'a> {
    pub fn new(source: &'a str) -> ScannerState<'a> {
        ScannerState {
            source: source.as_bytes(),
            pos: 0,
        }
    }

    /// Tokenize the whole input. The final token is always `Eof`.
    pub fn scan_all(mut self) -> Result<Vec<Token>, ScanError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> u8 {
        self.source.get(self.pos).copied().unwrap_or(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.source.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'/' if self.peek_at(1) == b'/' => {
                    while self.pos < self.source.len() && self.peek() != b'\n' {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek_at(1) == b'*' => {
                    self.pos += 2;
                    while self.pos < self.source.len()
                        && !(self.peek() == b'*' && self.peek_at(1) == b'/')
                    {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.source.len());
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ScanError> {
        self.skip_trivia();
        let start = self.pos as u32;
        let token = |kind: TokenKind, end: usize| Token {
            kind,
            span: Span::new(start, end as u32),
        };

        let c = self.peek();
        if c == 0 {
            return Ok(token(TokenKind::Eof, self.pos));
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
                self.pos += 1;
            }
            let text = &self.source[start as usize..self.pos];
            let kind = keyword_kind(text).unwrap_or(TokenKind::Ident);
            return Ok(token(kind, self.pos));
        }

        if c.is_ascii_digit() {
            let mut is_float = false;
            while self.peek().is_ascii_digit() {
                self.pos += 1;
            }
            if self.peek() == b'.' && self.peek_at(1).is_ascii_digit() {
                is_float = true;
                self.pos += 1;
                while self.peek().is_ascii_digit() {
                    self.pos += 1;
                }
            }
            match self.peek() {
                b'f' | b'F' | b'd' | b'D' => {
                    is_float = true;
                    self.pos += 1;
                }
                b'l' | b'L' => {
                    self.pos += 1;
                }
                _ => {}
            }
            let kind = if is_float {
                TokenKind::FloatLiteral
            } else {
                TokenKind::IntLiteral
            };
            return Ok(token(kind, self.pos));
        }

        if c == b'"' {
            self.pos += 1;
            while self.pos < self.source.len() && self.peek() != b'"' {
                if self.peek() == b'\\' {
                    self.pos += 1;
                }
                self.pos += 1;
            }
            if self.pos >= self.source.len() {
                return Err(ScanError {
                    message: "unterminated string literal".into(),
                    span: Span::new(start, self.pos as u32),
                });
            }
            self.pos += 1;
            return Ok(token(TokenKind::StringLiteral, self.pos));
        }

        // Punctuation and operators, longest match first.
        let three: &[u8] = self
            .source
            .get(self.pos..(self.pos + 3).min(self.source.len()))
            .unwrap_or(&[]);
        if three == b">>>" {
            if self.peek_at(3) == b'=' {
                // >>>= is not modeled; fall through to the error below.
            } else {
                self.pos += 3;
                return Ok(token(TokenKind::UShr, self.pos));
            }
        }

        let two: &[u8] = self
            .source
            .get(self.pos..(self.pos + 2).min(self.source.len()))
            .unwrap_or(&[]);
        let two_kind = match two {
            b"&&" => Some(TokenKind::AmpAmp),
            b"||" => Some(TokenKind::PipePipe),
            b"==" => Some(TokenKind::EqEq),
            b"!=" => Some(TokenKind::BangEq),
            b"<=" => Some(TokenKind::Le),
            b">=" => Some(TokenKind::Ge),
            b"<<" => {
                if self.peek_at(2) == b'=' {
                    self.pos += 3;
                    return Ok(token(TokenKind::ShlAssign, self.pos));
                }
                Some(TokenKind::Shl)
            }
            b">>" => {
                if self.peek_at(2) == b'=' {
                    self.pos += 3;
                    return Ok(token(TokenKind::ShrAssign, self.pos));
                }
                Some(TokenKind::Shr)
            }
            b"+=" => Some(TokenKind::PlusAssign),
            b"-=" => Some(TokenKind::MinusAssign),
            b"*=" => Some(TokenKind::StarAssign),
            b"/=" => Some(TokenKind::SlashAssign),
            b"%=" => Some(TokenKind::PercentAssign),
            b"&=" => Some(TokenKind::AmpAssign),
            b"|=" => Some(TokenKind::PipeAssign),
            b"^=" => Some(TokenKind::CaretAssign),
            b"++" => Some(TokenKind::PlusPlus),
            b"--" => Some(TokenKind::MinusMinus),
            _ => None,
        };
        if let Some(kind) = two_kind {
            self.pos += 2;
            return Ok(token(kind, self.pos));
        }

        let one_kind = match c {
            b'(' => Some(TokenKind::LParen),
            b')' => Some(TokenKind::RParen),
            b'{' => Some(TokenKind::LBrace),
            b'}' => Some(TokenKind::RBrace),
            b',' => Some(TokenKind::Comma),
            b';' => Some(TokenKind::Semicolon),
            b':' => Some(TokenKind::Colon),
            b'?' => Some(TokenKind::Question),
            b'.' => Some(TokenKind::Dot),
            b'+' => Some(TokenKind::Plus),
            b'-' => Some(TokenKind::Minus),
            b'*' => Some(TokenKind::Star),
            b'/' => Some(TokenKind::Slash),
            b'%' => Some(TokenKind::Percent),
            b'&' => Some(TokenKind::Amp),
            b'|' => Some(TokenKind::Pipe),
            b'^' => Some(TokenKind::Caret),
            b'!' => Some(TokenKind::Bang),
            b'~' => Some(TokenKind::Tilde),
            b'<' => Some(TokenKind::Lt),
            b'>' => Some(TokenKind::Gt),
            b'=' => Some(TokenKind::Assign),
            _ => None,
        };
        if let Some(kind) = one_kind {
            self.pos += 1;
            return Ok(token(kind, self.pos));
        }

        Err(ScanError {
            message: format!("unexpected character `{}`", c as char),
            span: Span::new(start, start + 1),
        })
    }
}

fn keyword_kind(text: &[u8]) -> Option<TokenKind> {
    match text {
        b"if" => Some(TokenKind::KwIf),
        b"else" => Some(TokenKind::KwElse),
        b"while" => Some(TokenKind::KwWhile),
        b"do" => Some(TokenKind::KwDo),
        b"for" => Some(TokenKind::KwFor),
        b"switch" => Some(TokenKind::KwSwitch),
        b"case" => Some(TokenKind::KwCase),
        b"default" => Some(TokenKind::KwDefault),
        b"break" => Some(TokenKind::KwBreak),
        b"continue" => Some(TokenKind::KwContinue),
        b"return" => Some(TokenKind::KwReturn),
        b"throw" => Some(TokenKind::KwThrow),
        b"assert" => Some(TokenKind::KwAssert),
        b"new" => Some(TokenKind::KwNew),
        b"instanceof" => Some(TokenKind::KwInstanceof),
        b"true" => Some(TokenKind::KwTrue),
        b"false" => Some(TokenKind::KwFalse),
        b"null" => Some(TokenKind::KwNull),
        b"final" => Some(TokenKind::KwFinal),
        b"static" => Some(TokenKind::KwStatic),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        ScannerState::new(source)
            .scan_all()
            .expect("scan")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn scans_operators_longest_first() {
        assert_eq!(
            kinds("a >>> b >> c > d"),
            vec![
                TokenKind::Ident,
                TokenKind::UShr,
                TokenKind::Ident,
                TokenKind::Shr,
                TokenKind::Ident,
                TokenKind::Gt,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_keywords_and_literals() {
        assert_eq!(
            kinds("if (x == 1.5) return true;"),
            vec![
                TokenKind::KwIf,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::EqEq,
                TokenKind::FloatLiteral,
                TokenKind::RParen,
                TokenKind::KwReturn,
                TokenKind::KwTrue,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments() {
        assert_eq!(
            kinds("x // trailing\n/* block */ y"),
            vec![TokenKind::Ident, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(ScannerState::new("\"oops").scan_all().is_err());
    }
}
