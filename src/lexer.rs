use std::{iter::Peekable, str::CharIndices};

use crate::diagnostics::{Diagnostic, DiagnosticKind, SourceSpan};

/// Longest token kept by default; longer runs are truncated.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    /// Body of a `"`-delimited string, delimiters stripped.
    Quoted,
    /// Any other run of non-space, non-parenthesis characters.
    Atom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: SourceSpan,
}

impl Token {
    /// True for an unquoted token whose text is exactly `text`.
    pub fn is(&self, text: &str) -> bool {
        self.kind != TokenKind::Quoted && self.lexeme == text
    }
}

/// Scanner over a single line of source. Tokens are produced on demand.
#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current: usize,
    max_token_len: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_max_token_len(source, DEFAULT_MAX_TOKEN_LEN)
    }

    pub fn with_max_token_len(source: &'a str, max_token_len: usize) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            current: 0,
            max_token_len: max_token_len.max(1),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.current
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((idx, ch)) = next {
            self.current = idx + ch.len_utf8();
        }
        next
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        self.chars.peek().copied()
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some((_, ch)) = self.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == ';' {
                while let Some((_, ch)) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    /// Next significant character without consuming anything.
    pub fn peek_char(&self) -> Option<char> {
        let mut probe = self.clone();
        probe.skip_whitespace_and_comments();
        probe.peek().map(|(_, ch)| ch)
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, Diagnostic> {
        self.skip_whitespace_and_comments();
        let Some((start, ch)) = self.bump() else {
            return Ok(None);
        };
        let token = match ch {
            '(' => self.simple_token(start, TokenKind::LParen),
            ')' => self.simple_token(start, TokenKind::RParen),
            '"' => self.quoted(start)?,
            _ => self.atom(start, ch),
        };
        Ok(Some(token))
    }

    /// Scans every remaining token on the line.
    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn simple_token(&self, start: usize, kind: TokenKind) -> Token {
        Token {
            kind,
            lexeme: self.source[start..self.current].to_string(),
            span: SourceSpan::new(start, self.current),
        }
    }

    fn quoted(&mut self, start: usize) -> Result<Token, Diagnostic> {
        let mut body = String::new();
        let mut kept = 0;
        let mut truncated = false;
        loop {
            match self.bump() {
                Some((_, '"')) => break,
                Some((_, ch)) => {
                    if kept < self.max_token_len {
                        body.push(ch);
                        kept += 1;
                    } else {
                        truncated = true;
                    }
                }
                None => {
                    return Err(Diagnostic::new(
                        DiagnosticKind::Lexer,
                        "unterminated string literal",
                    )
                    .with_span(SourceSpan::new(start, self.current)));
                }
            }
        }
        if truncated {
            self.warn_truncated(&body, start);
        }
        Ok(Token {
            kind: TokenKind::Quoted,
            lexeme: body,
            span: SourceSpan::new(start, self.current),
        })
    }

    fn atom(&mut self, start: usize, first: char) -> Token {
        let mut lexeme = String::from(first);
        let mut kept = 1;
        let mut truncated = false;
        while let Some((_, ch)) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' {
                break;
            }
            self.bump();
            if kept < self.max_token_len {
                lexeme.push(ch);
                kept += 1;
            } else {
                truncated = true;
            }
        }
        if truncated {
            self.warn_truncated(&lexeme, start);
        }
        Token {
            kind: TokenKind::Atom,
            lexeme,
            span: SourceSpan::new(start, self.current),
        }
    }

    fn warn_truncated(&self, kept: &str, start: usize) {
        tracing::warn!(
            column = start + 1,
            limit = self.max_token_len,
            "token truncated to `{kept}`"
        );
    }
}
