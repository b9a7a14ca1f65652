use crate::token::{Kind, Token};

/// Read position over a filtered token stream.
pub struct TokenCursor {
    tokens: Vec<Token>,
    index: usize,
    eof: Token,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof = tokens
            .iter()
            .rev()
            .find(|token| token.is_eof())
            .cloned()
            .unwrap_or_else(|| Token::end_of_input(0, 0));

        Self {
            tokens,
            index: 0,
            eof,
        }
    }

    /// Token under the cursor, or the end-of-input sentinel past the end.
    pub fn current(&self) -> &Token {
        self.tokens.get(self.index).unwrap_or(&self.eof)
    }

    pub fn advance(&mut self) {
        if self.index < self.tokens.len() && !self.current().is_eof() {
            self.index += 1;
        }
    }

    pub fn back(&mut self) {
        if self.index > 0 {
            self.index -= 1;
        }
    }

    /// `peek(0)` is the token right after the current one.
    pub fn peek(&self, n: usize) -> &Token {
        self.tokens.get(self.index + n + 1).unwrap_or(&self.eof)
    }

    /// Advances past the next NewLine, or up to end of input.
    pub fn skip_to_next_line(&mut self) {
        while !matches!(self.current().kind, Kind::NewLine | Kind::EndOfInput) {
            self.advance();
        }
        if self.current().kind == Kind::NewLine {
            self.advance();
        }
    }

    pub fn remaining(&self) -> &[Token] {
        let start = (self.index + 1).min(self.tokens.len());
        &self.tokens[start..]
    }

    pub fn position(&self) -> usize {
        self.index
    }

    /// Moves back to a position previously returned by `position`.
    pub fn rollback(&mut self, position: usize) {
        if position <= self.index {
            self.index = position;
        }
    }

    pub fn is_eof(&self) -> bool {
        self.current().is_eof()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
