use crate::token::Token;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompilerError {
    #[error("FileNotFoundError: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("IOError: {0}")]
    IO(#[from] std::io::Error),
    #[error("JsonError: {0}")]
    Json(#[from] serde_json::Error),
    #[error("LexingError: {0}")]
    Lexing(#[from] LexingError),
    #[error("{} syntax error(s) found", .0.len())]
    Syntax(Vec<Diagnostic>),
}

/// Raised only when the lexer's own character classes are misconfigured.
#[derive(Debug, Error)]
#[error("invalid character class `{pattern}`: {source}")]
pub struct LexingError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub col: usize,
    pub source_line: String,
    pub caret: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, line: usize, col: usize, source_line: &str) -> Self {
        Self {
            message: message.into(),
            line,
            col,
            source_line: source_line.to_string(),
            caret: caret_for(source_line, col),
        }
    }

    pub fn from_token(token: &Token, message: impl Into<String>, source_line: &str) -> Self {
        Self::new(message, token.line, token.col, source_line)
    }
}

/// Pads up to `col` keeping tabs so the `^` lines up under tab-indented code.
fn caret_for(source_line: &str, col: usize) -> String {
    let mut caret: String = source_line
        .chars()
        .take(col.saturating_sub(1))
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    let missing = col.saturating_sub(1).saturating_sub(caret.chars().count());
    caret.extend(std::iter::repeat(' ').take(missing));
    caret.push('^');
    caret
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "SyntaxError: {}", self.message)?;
        writeln!(f, "  --> {}:{}", self.line, self.col)?;
        writeln!(f, "{}", self.source_line)?;
        write!(f, "{}", self.caret)
    }
}

impl std::error::Error for Diagnostic {}
