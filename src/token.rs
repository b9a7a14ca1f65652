use serde::Serialize;

#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Token {
    pub kind: Kind,
    pub value: String,
    /// Exact source spelling, quotes and comment markers included.
    #[serde(skip)]
    pub raw: String,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum Kind {
    Identifier,
    Keyword,
    Operator,      // + - == += ...
    NumericLiteral,
    StringLiteral, // value has the quotes stripped
    Punctuation,   // ( ) { } [ ] : ; , .
    NewLine,

    // Only seen by the lexer, filtered out before parsing
    Whitespace,
    Comment,

    Unknown,
    EndOfInput,
}

pub const KEYWORDS: &[&str] = &[
    "l", "def", "f", "defer", "for", "if", "else", "while", "continue", "return", "break", "do",
    "imp@", "exp@", "from", "false", "true", "class", "const", "debugger", "delete", "extends",
    "finally", "in", "instanceof", "new", "null", "super", "switch", "this", "throw", "try",
    "typeof", "void", "with", "yield",
];

/// Two-character operators, matched before their one-character prefixes.
pub const COMPOUND_OPERATORS: &[&str] = &[
    "++", "--", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "<<", ">>",
];

pub const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", "<", ">", "<=", ">=", "&&", "||", "=", "+=", "-=",
    "*=", "/=", "%=",
];

pub fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident)
}

pub fn is_binary_operator(op: &str) -> bool {
    BINARY_OPERATORS.contains(&op)
}

impl Token {
    pub fn new(kind: Kind, value: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            raw: raw.into(),
            line: 0,
            col: 0,
        }
    }

    pub fn end_of_input(line: usize, col: usize) -> Self {
        Self {
            kind: Kind::EndOfInput,
            value: String::new(),
            raw: String::new(),
            line,
            col,
        }
    }

    pub fn is(&self, kind: Kind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }

    pub fn is_punct(&self, value: &str) -> bool {
        self.is(Kind::Punctuation, value)
    }

    pub fn is_operator(&self, value: &str) -> bool {
        self.is(Kind::Operator, value)
    }

    pub fn is_keyword(&self, value: &str) -> bool {
        self.is(Kind::Keyword, value)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == Kind::EndOfInput
    }

    /// NewLine, `;`, `}` or end of input.
    pub fn ends_statement(&self) -> bool {
        matches!(self.kind, Kind::NewLine | Kind::EndOfInput)
            || self.is_punct(";")
            || self.is_punct("}")
    }
}
