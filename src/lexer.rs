use crate::token::{Token, TokenKind, closing_quote, lookup_keyword};

/// Punctuation and operator characters that end a word. Whitespace is a
/// separator as well.
const SYMBOLS: &[u8] = b"()+*/-=<>'`\"[],";

fn is_separator(b: u8) -> bool {
    b.is_ascii_whitespace() || SYMBOLS.contains(&b)
}

struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    fn single(&mut self, kind: TokenKind) -> Token<'a> {
        let start = self.pos;
        self.pos += 1;
        Token::new(kind, self.slice(start, self.pos), start)
    }

    fn next_token(&mut self) -> Option<Token<'a>> {
        let b = self.peek()?;

        let token = match b {
            b if b.is_ascii_whitespace() => self.lex_whitespace(),
            b'\'' => self.lex_quoted(TokenKind::StringLiteral),
            b'"' | b'`' | b'[' => self.lex_quoted(TokenKind::QuotedIdentifier),
            b'(' => self.single(TokenKind::OpenParen),
            b')' => self.single(TokenKind::CloseParen),
            b',' => self.single(TokenKind::Comma),
            b if SYMBOLS.contains(&b) => self.single(TokenKind::Operator),
            _ => self.lex_word(),
        };
        Some(token)
    }

    fn lex_whitespace(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
        Token::new(TokenKind::Whitespace, self.slice(start, self.pos), start)
    }

    /// Consumes up to and including the matching close quote, or to the end
    /// of input when there is none. Embedded (doubled) quotes are not
    /// recognised: `'it''s'` lexes as two adjacent literals.
    fn lex_quoted(&mut self, kind: TokenKind) -> Token<'a> {
        let start = self.pos;
        let close = closing_quote(char::from(self.bytes[start])) as u8;
        self.pos += 1;
        match self.bytes[self.pos..].iter().position(|&b| b == close) {
            Some(offset) => self.pos += offset + 1,
            None => self.pos = self.bytes.len(),
        }
        Token::new(kind, self.slice(start, self.pos), start)
    }

    fn lex_word(&mut self) -> Token<'a> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_separator(b) {
                break;
            }
            self.pos += 1;
        }
        let word = self.slice(start, self.pos);

        let kind = match lookup_keyword(word) {
            Some(kw) => TokenKind::Keyword(kw),
            None if word.as_bytes()[0].is_ascii_digit() => TokenKind::Number,
            None => TokenKind::Identifier,
        };
        Token::new(kind, word, start)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenizes `input`, keeping whitespace runs as single tokens.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}

/// Tokenizes `input` and drops whitespace.
pub fn significant_tokens(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).filter(|t| !t.is_whitespace()).collect()
}

/// Splits `input` the way a delimiter-returning string tokenizer does: each
/// delimiter character is its own piece and runs of other characters are
/// kept together.
pub fn split_keeping_delimiters<F>(input: &str, is_delimiter: F) -> Vec<&str>
where
    F: Fn(char) -> bool,
{
    let mut pieces = Vec::new();
    let mut word_start: Option<usize> = None;

    for (idx, ch) in input.char_indices() {
        if is_delimiter(ch) {
            if let Some(start) = word_start.take() {
                pieces.push(&input[start..idx]);
            }
            pieces.push(&input[idx..idx + ch.len_utf8()]);
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }
    if let Some(start) = word_start {
        pieces.push(&input[start..]);
    }
    pieces
}
