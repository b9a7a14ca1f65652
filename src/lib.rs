//! # ay-compiler
//!
//! Translates Ay scripts into JavaScript source.
//!
//! ```text
//! Source → Lexer → TokenCursor → Parser → AST → Compiler → JavaScript
//! ```
//!
//! 1. [`lexer`] — one pass over the text producing a [`token::Token`] list
//!    ending in a single `EndOfInput`.
//! 2. [`cursor`] — peek/advance/rollback over that list.
//! 3. [`parser`] — recursive descent into [`parser::AstKind`] nodes, recording
//!    [`error::Diagnostic`]s instead of stopping at the first bad statement.
//!    `def name -> literal` aliases live in [`symbols::AliasTable`].
//! 4. [`compiler`] — renders the AST. Only run it on a diagnostic-free parse;
//!    [`compile`] does that gating for you.

pub mod compiler;
pub mod config;
pub mod cursor;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod symbols;
pub mod token;
pub mod types;

use crate::compiler::Compiler;
use crate::error::{CompilerError, Diagnostic, LexingError};
use crate::lexer::Lexer;
use crate::parser::{AstKind, Parser};
use crate::symbols::Variable;
use crate::token::Token;

/// Everything one parse produces.
#[derive(Debug)]
pub struct ParsedProgram {
    pub body: Vec<AstKind>,
    pub diagnostics: Vec<Diagnostic>,
    pub variables: Vec<Variable>,
}

impl ParsedProgram {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn program(&self) -> AstKind {
        AstKind::Program {
            body: self.body.clone(),
        }
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexingError> {
    Ok(Lexer::new(source)?.tokenize())
}

pub fn parse(source: &str) -> Result<ParsedProgram, LexingError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(tokens, source);
    let body = parser.parse_program();
    let variables = parser.variables().iter().cloned().collect();

    Ok(ParsedProgram {
        body,
        diagnostics: parser.into_diagnostics(),
        variables,
    })
}

pub fn generate(program: &[AstKind]) -> String {
    Compiler::new().compile_program(program)
}

/// Source text to JavaScript, or every syntax error found in one pass.
pub fn compile(source: &str) -> Result<String, CompilerError> {
    let parsed = parse(source)?;
    if !parsed.is_ok() {
        return Err(CompilerError::Syntax(parsed.diagnostics));
    }
    Ok(generate(&parsed.body))
}
