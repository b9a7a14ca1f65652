use crate::error::LexingError;
use crate::token::{is_keyword, Kind, Token, COMPOUND_OPERATORS};
use regex::Regex;

/// Fixed character classes the lexer dispatches on.
struct Classifier {
    ident_start: Regex,
    ident_continue: Regex,
    operator: Regex,
    digit: Regex,
    punctuation: Regex,
    whitespace: Regex,
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum CharClass {
    IdentStart,
    Operator,
    Digit,
    Punctuation,
    Quote,
    Whitespace,
    Other,
}

fn class_regex(pattern: &str) -> Result<Regex, LexingError> {
    Regex::new(pattern).map_err(|source| LexingError {
        pattern: pattern.to_string(),
        source,
    })
}

impl Classifier {
    fn new() -> Result<Self, LexingError> {
        Ok(Self {
            ident_start: class_regex(r"^[A-Za-z_@]$")?,
            ident_continue: class_regex(r"^[A-Za-z_@0-9]$")?,
            operator: class_regex(r"^[+*/%=<>&|!?^-]$")?,
            digit: class_regex(r"^[0-9]$")?,
            punctuation: class_regex(r"^[(){}\[\]:;,.]$")?,
            whitespace: class_regex(r"^\s$")?,
        })
    }

    fn matches(re: &Regex, c: char) -> bool {
        let mut buf = [0u8; 4];
        re.is_match(c.encode_utf8(&mut buf))
    }

    fn classify(&self, c: char) -> CharClass {
        if c == '\'' || c == '"' {
            CharClass::Quote
        } else if Self::matches(&self.ident_start, c) {
            CharClass::IdentStart
        } else if Self::matches(&self.digit, c) {
            CharClass::Digit
        } else if Self::matches(&self.operator, c) {
            CharClass::Operator
        } else if Self::matches(&self.punctuation, c) {
            CharClass::Punctuation
        } else if Self::matches(&self.whitespace, c) {
            CharClass::Whitespace
        } else {
            CharClass::Other
        }
    }

    fn continues_ident(&self, c: char) -> bool {
        Self::matches(&self.ident_continue, c)
    }

    fn is_digit(&self, c: char) -> bool {
        Self::matches(&self.digit, c)
    }
}

pub struct Lexer {
    chars: Vec<char>,
    current: usize,
    classifier: Classifier,
}

impl Lexer {
    pub fn new(input: &str) -> Result<Self, LexingError> {
        Ok(Self {
            chars: input.chars().collect(),
            current: 0,
            classifier: Classifier::new()?,
        })
    }

    fn at(&self) -> char {
        self.peek_char(0)
    }

    fn peek_char(&self, offset: usize) -> char {
        self.chars.get(self.current + offset).copied().unwrap_or('\0')
    }

    fn is_eof(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    /// Emits a token spanning `start..self.current` whose value is its raw text.
    fn spanned(&self, kind: Kind, start: usize) -> Token {
        let raw = self.text(start, self.current);
        Token::new(kind, raw.clone(), raw)
    }

    /// The filtered stream the parser consumes: no whitespace, no comments,
    /// always ending in a single `EndOfInput`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        self.tokenize_raw()
            .into_iter()
            .filter(|token| !matches!(token.kind, Kind::Whitespace | Kind::Comment))
            .collect()
    }

    /// Every token including whitespace and comments; the raw spellings
    /// concatenate back to the input.
    pub fn tokenize_raw(&mut self) -> Vec<Token> {
        self.current = 0;
        let mut tokens = Vec::new();

        while !self.is_eof() {
            let token = self.next_token();
            tokens.push(token);
        }

        tokens.push(Token::end_of_input(0, 0));
        assign_positions(&mut tokens);
        tokens
    }

    fn next_token(&mut self) -> Token {
        let start = self.current;
        let ch = self.at();

        match ch {
            '\n' => {
                self.current += 1;
                return self.spanned(Kind::NewLine, start);
            }
            '\r' if self.peek_char(1) == '\n' => {
                self.current += 2;
                return self.spanned(Kind::NewLine, start);
            }
            '/' if self.peek_char(1) == '/' => return self.line_comment(),
            '/' if self.peek_char(1) == '*' => return self.block_comment(),
            _ => {}
        }

        match self.classifier.classify(ch) {
            CharClass::Quote => self.string_literal(ch),
            CharClass::IdentStart => {
                self.current += 1;
                while !self.is_eof() && self.classifier.continues_ident(self.at()) {
                    self.current += 1;
                }
                let kind = if is_keyword(&self.text(start, self.current)) {
                    Kind::Keyword
                } else {
                    Kind::Identifier
                };
                self.spanned(kind, start)
            }
            CharClass::Digit => {
                self.consume_digits();
                // A `.` belongs to the number only when a digit follows it,
                // so `12.` is `12` then `.`.
                if self.at() == '.' && self.classifier.is_digit(self.peek_char(1)) {
                    self.current += 1;
                    self.consume_digits();
                }
                self.spanned(Kind::NumericLiteral, start)
            }
            CharClass::Operator => {
                let pair: String = [ch, self.peek_char(1)].iter().collect();
                self.current += if COMPOUND_OPERATORS.contains(&pair.as_str()) { 2 } else { 1 };
                self.spanned(Kind::Operator, start)
            }
            CharClass::Punctuation => {
                self.current += 1;
                self.spanned(Kind::Punctuation, start)
            }
            CharClass::Whitespace => {
                self.current += 1;
                while !self.is_eof()
                    && self.at() != '\n'
                    && !(self.at() == '\r' && self.peek_char(1) == '\n')
                    && self.classifier.classify(self.at()) == CharClass::Whitespace
                {
                    self.current += 1;
                }
                self.spanned(Kind::Whitespace, start)
            }
            CharClass::Other => {
                self.current += 1;
                self.spanned(Kind::Unknown, start)
            }
        }
    }

    fn consume_digits(&mut self) {
        while !self.is_eof() && self.classifier.is_digit(self.at()) {
            self.current += 1;
        }
    }

    fn line_comment(&mut self) -> Token {
        let start = self.current;
        while !self.is_eof()
            && self.at() != '\n'
            && !(self.at() == '\r' && self.peek_char(1) == '\n')
        {
            self.current += 1;
        }
        self.spanned(Kind::Comment, start)
    }

    fn block_comment(&mut self) -> Token {
        let start = self.current;
        self.current += 2;
        while !self.is_eof() {
            if self.at() == '*' && self.peek_char(1) == '/' {
                self.current += 2;
                return self.spanned(Kind::Comment, start);
            }
            self.current += 1;
        }
        // Unterminated: hand the remainder to the parser as a bad token.
        self.spanned(Kind::Unknown, start)
    }

    fn string_literal(&mut self, quote: char) -> Token {
        let start = self.current;
        self.current += 1;
        while !self.is_eof() {
            let ch = self.at();
            if ch == '\\' {
                self.current = (self.current + 2).min(self.chars.len());
                continue;
            }
            self.current += 1;
            if ch == quote {
                let raw = self.text(start, self.current);
                let value = self.text(start + 1, self.current - 1);
                return Token::new(Kind::StringLiteral, value, raw);
            }
        }
        self.spanned(Kind::Unknown, start)
    }
}

/// Replays the raw stream assigning 1-based line/col, stepping over newlines
/// embedded in comments and strings.
fn assign_positions(tokens: &mut [Token]) {
    let (mut line, mut col) = (1, 1);

    for token in tokens.iter_mut() {
        token.line = line;
        token.col = col;

        if token.kind == Kind::NewLine {
            line += 1;
            col = 1;
        } else if let Some(last_break) = token.raw.rfind('\n') {
            line += token.raw.matches('\n').count();
            col = token.raw[last_break + 1..].chars().count() + 1;
        } else {
            col += token.raw.chars().count();
        }
    }
}
