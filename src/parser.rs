use crate::cursor::TokenCursor;
use crate::error::Diagnostic;
use crate::symbols::{AliasTable, VariableTable};
use crate::token::{is_binary_operator, Kind, Token};
use crate::types::ValueKind;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum AstKind {
    Program {
        body: Vec<AstKind>,
    },
    VariableDecl {
        name: String,
        initializer: Option<Box<AstKind>>,
    },
    FunctionDecl {
        name: Option<String>,
        params: Vec<String>,
        body: Box<AstKind>,
    },
    Return {
        value: Option<Box<AstKind>>,
    },
    Break,
    Continue,
    IfElse {
        test: Box<AstKind>,
        consequent: Box<AstKind>,
        alternate: Option<Box<AstKind>>,
    },
    /// `while` loops leave `init` and `update` empty.
    Loop {
        init: Option<Box<AstKind>>,
        test: Option<Box<AstKind>>,
        update: Option<Box<AstKind>>,
        body: Box<AstKind>,
    },
    CallExpression {
        name: String,
        args: Vec<AstKind>,
    },
    ArrayLiteral {
        elements: Vec<AstKind>,
    },
    ArrayIndex {
        name: String,
        index: Vec<AstKind>,
    },
    BinaryExpression {
        left: Box<AstKind>,
        operator: String,
        right: Box<AstKind>,
    },
    UnaryExpression {
        operator: String,
        operand: Box<AstKind>,
    },
    IncDec {
        operator: String,
        operand: Box<AstKind>,
        prefix: bool,
    },
    Literal {
        value: String,
        raw: String,
    },
    Identifier {
        name: String,
    },
    DefineAlias {
        name: String,
        value: String,
    },
    Block {
        body: Vec<AstKind>,
    },
    ParenWrapper {
        inner: Box<AstKind>,
    },
    NewExpression {
        callee: Box<AstKind>,
    },
}

type ParseResult = Result<AstKind, Diagnostic>;
type ForHeader = (Option<Box<AstKind>>, Option<Box<AstKind>>, Option<Box<AstKind>>);

pub struct Parser {
    cursor: TokenCursor,
    lines: Vec<String>,
    aliases: AliasTable,
    variables: VariableTable,
    diagnostics: Vec<Diagnostic>,
    block_depth: usize,
    /// Open `(`/`[` groups; newlines inside them are insignificant.
    group_depth: usize,
    statement_index: usize,
}

fn describe(token: &Token) -> String {
    match token.kind {
        Kind::EndOfInput => "end of input".to_string(),
        Kind::NewLine => "end of line".to_string(),
        Kind::Unknown if token.raw.starts_with('\'') || token.raw.starts_with('"') => {
            "unterminated string literal".to_string()
        }
        Kind::Unknown if token.raw.starts_with("/*") => "unterminated block comment".to_string(),
        _ => format!("token '{}'", token.value),
    }
}

fn starts_expression(token: &Token) -> bool {
    match token.kind {
        Kind::Identifier | Kind::NumericLiteral | Kind::StringLiteral => true,
        Kind::Keyword => matches!(
            token.value.as_str(),
            "true" | "false" | "null" | "f" | "new" | "this"
        ),
        Kind::Punctuation => token.value == "(" || token.value == "[",
        Kind::Operator => matches!(token.value.as_str(), "!" | "-" | "++" | "--"),
        _ => false,
    }
}

impl Parser {
    pub fn new(tokens: Vec<Token>, source: &str) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            lines: source.lines().map(str::to_string).collect(),
            aliases: AliasTable::new(),
            variables: VariableTable::new(),
            diagnostics: Vec::new(),
            block_depth: 0,
            group_depth: 0,
            statement_index: 0,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    /// Current token with alias substitution applied.
    fn at(&self) -> Token {
        self.aliases.resolve(self.cursor.current())
    }

    fn next_token(&mut self) -> Token {
        let token = self.at();
        self.cursor.advance();
        token
    }

    fn skip_newlines(&mut self) {
        while self.cursor.current().kind == Kind::NewLine {
            self.cursor.advance();
        }
    }

    fn grouped<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, Diagnostic>,
    ) -> Result<T, Diagnostic> {
        self.group_depth += 1;
        let result = parse(self);
        self.group_depth -= 1;
        result
    }

    fn eat_terminator(&mut self) {
        let token = self.cursor.current();
        if token.kind == Kind::NewLine || token.is_punct(";") {
            self.cursor.advance();
        }
    }

    fn line_text(&self, line: usize) -> &str {
        line.checked_sub(1)
            .and_then(|index| self.lines.get(index))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn error(&self, token: &Token, message: impl Into<String>) -> Diagnostic {
        Diagnostic::from_token(token, message, self.line_text(token.line))
    }

    fn unexpected(&self, token: &Token) -> Diagnostic {
        self.error(token, format!("Unexpected {}", describe(token)))
    }

    pub fn parse_program(&mut self) -> Vec<AstKind> {
        let mut body = Vec::new();

        while !self.cursor.is_eof() {
            if self.cursor.current().kind == Kind::NewLine {
                self.cursor.advance();
                continue;
            }

            let start = self.cursor.position();
            self.statement_index = body.len();
            self.parse_statement_into(&mut body, start);

            if self.cursor.position() == start {
                self.cursor.advance();
            }
        }

        body
    }

    fn parse_statement_into(&mut self, body: &mut Vec<AstKind>, start: usize) {
        match self.parse_statement() {
            Ok(Some(node)) => body.push(node),
            Ok(None) => {}
            Err(diagnostic) => {
                self.diagnostics.push(diagnostic);
                self.recover(start);
            }
        }
    }

    /// Skips a malformed statement. A failure on its first token skips just
    /// that token; otherwise skips to the end of the line, stepping over any
    /// braces opened on the way and stopping before a closer that belongs to
    /// the enclosing block.
    fn recover(&mut self, start: usize) {
        if self.cursor.position() == start {
            self.cursor.advance();
            return;
        }

        let mut depth = 0usize;
        for _ in 0..self.cursor.len() {
            let token = self.cursor.current();
            if token.is_eof() {
                break;
            }
            if token.is_punct("{") {
                depth += 1;
            } else if token.is_punct("}") {
                if depth == 0 && self.block_depth > 0 {
                    break;
                }
                depth = depth.saturating_sub(1);
            } else if token.kind == Kind::NewLine && depth == 0 {
                self.cursor.skip_to_next_line();
                break;
            }
            self.cursor.advance();
        }
    }

    fn parse_statement(&mut self) -> Result<Option<AstKind>, Diagnostic> {
        let token = self.at();

        let node = match token.kind {
            Kind::Keyword => match token.value.as_str() {
                "l" => self.parse_variable_declaration()?,
                "def" => self.parse_define()?,
                "f" => self.parse_function()?,
                "return" => self.parse_return()?,
                "break" | "continue" => self.parse_jump()?,
                "if" => self.parse_if()?,
                "while" => self.parse_while()?,
                "for" => self.parse_for()?,
                _ => self.parse_expression()?,
            },
            Kind::Punctuation if token.value == ";" => {
                self.cursor.advance();
                return Ok(None);
            }
            _ => self.parse_expression()?,
        };

        self.eat_terminator();
        Ok(Some(node))
    }

    fn parse_variable_declaration(&mut self) -> ParseResult {
        let keyword = self.next_token();
        let name = self.at();
        if name.kind != Kind::Identifier {
            return Err(self.error(
                &name,
                format!("Expected identifier after '{}', found {}", keyword.value, describe(&name)),
            ));
        }
        self.cursor.advance();

        let initializer = if self.at().is_operator("=") {
            let assign = self.next_token();
            self.skip_newlines();
            self.expect_operand(&assign)?;
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        let kind = initializer
            .as_deref()
            .map(|node| self.infer_kind(node))
            .unwrap_or(ValueKind::Unknown);
        self.variables
            .declare(name.value.clone(), kind, self.statement_index);

        Ok(AstKind::VariableDecl {
            name: name.value,
            initializer,
        })
    }

    /// `def <name> -> <literal>`. The alias name itself is read unresolved.
    fn parse_define(&mut self) -> ParseResult {
        self.cursor.advance();
        let name = self.cursor.current().clone();
        if name.kind != Kind::Identifier {
            return Err(self.error(
                &name,
                format!("Expected identifier after 'def', found {}", describe(&name)),
            ));
        }
        self.cursor.advance();

        let arrow = self.cursor.current().clone();
        if !(arrow.is_operator("-") && self.cursor.peek(0).is_operator(">")) {
            return Err(self.error(
                &arrow,
                format!("Expected '->' after alias name, found {}", describe(&arrow)),
            ));
        }
        self.cursor.advance();
        self.cursor.advance();

        let target = self.at();
        if matches!(target.kind, Kind::NewLine | Kind::EndOfInput) || target.is_punct(";") {
            return Err(self.error(
                &target,
                format!("Expected literal after '->', found {}", describe(&target)),
            ));
        }
        self.cursor.advance();

        self.aliases.define(name.value.clone(), &target);
        Ok(AstKind::DefineAlias {
            name: name.value,
            value: target.raw,
        })
    }

    /// `f [name](params) { body }`, in statement or expression position.
    fn parse_function(&mut self) -> ParseResult {
        self.cursor.advance();
        let name = if self.at().kind == Kind::Identifier {
            Some(self.next_token().value)
        } else {
            None
        };

        let open = self.at();
        if !open.is_punct("(") {
            return Err(self.error(
                &open,
                format!("Expected '(' to open parameter list, found {}", describe(&open)),
            ));
        }
        self.cursor.advance();

        let mut params = Vec::new();
        let mut expecting_name = true;
        loop {
            self.skip_newlines();
            let token = self.at();
            if token.is_eof() {
                return Err(self.error(&open, "Unmatched '(' in parameter list, expected ')'"));
            }
            if token.is_punct(")") {
                self.cursor.advance();
                break;
            }
            if expecting_name {
                if token.kind != Kind::Identifier {
                    return Err(self.error(
                        &token,
                        format!("Expected parameter name, found {}", describe(&token)),
                    ));
                }
                params.push(token.value);
                expecting_name = false;
            } else if !token.is_punct(",") {
                return Err(self.error(
                    &token,
                    format!("Expected ',' or ')' in parameter list, found {}", describe(&token)),
                ));
            } else {
                expecting_name = true;
            }
            self.cursor.advance();
        }

        let body = self.parse_block()?;

        if let Some(name) = &name {
            self.variables
                .declare(name.clone(), ValueKind::Function, self.statement_index);
        }

        Ok(AstKind::FunctionDecl {
            name,
            params,
            body: Box::new(body),
        })
    }

    fn parse_return(&mut self) -> ParseResult {
        let keyword = self.next_token();
        let token = self.at();

        if token.ends_statement() {
            return Ok(AstKind::Return { value: None });
        }
        if !starts_expression(&token) {
            return Err(self.error(
                &token,
                format!("Unexpected {} after '{}'", describe(&token), keyword.value),
            ));
        }

        Ok(AstKind::Return {
            value: Some(Box::new(self.parse_expression()?)),
        })
    }

    fn parse_jump(&mut self) -> ParseResult {
        let keyword = self.next_token();
        let token = self.at();
        if !token.ends_statement() {
            return Err(self.error(
                &token,
                format!("Unexpected {} after '{}'", describe(&token), keyword.value),
            ));
        }

        Ok(if keyword.value == "break" {
            AstKind::Break
        } else {
            AstKind::Continue
        })
    }

    fn parse_if(&mut self) -> ParseResult {
        let keyword = self.next_token();
        let test = self.parse_condition(&keyword)?;
        let consequent = self.parse_block()?;

        let mark = self.cursor.position();
        self.skip_newlines();
        let alternate = if self.at().is_keyword("else") {
            self.cursor.advance();
            self.skip_newlines();
            if self.at().is_keyword("if") {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(self.parse_block()?))
            }
        } else {
            self.cursor.rollback(mark);
            None
        };

        Ok(AstKind::IfElse {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        })
    }

    fn parse_while(&mut self) -> ParseResult {
        let keyword = self.next_token();
        let test = self.parse_condition(&keyword)?;
        let body = self.parse_block()?;

        Ok(AstKind::Loop {
            init: None,
            test: Some(Box::new(test)),
            update: None,
            body: Box::new(body),
        })
    }

    fn parse_for(&mut self) -> ParseResult {
        let keyword = self.next_token();
        let open = self.at();
        if !open.is_punct("(") {
            return Err(self.error(
                &open,
                format!("Expected '(' after '{}', found {}", keyword.value, describe(&open)),
            ));
        }
        self.cursor.advance();

        let (init, test, update) = self.grouped(|parser| parser.parse_for_header(&open))?;
        let body = self.parse_block()?;

        Ok(AstKind::Loop {
            init,
            test,
            update,
            body: Box::new(body),
        })
    }

    fn parse_for_header(&mut self, open: &Token) -> Result<ForHeader, Diagnostic> {
        self.skip_newlines();
        let init = if self.at().is_punct(";") {
            None
        } else if self.at().is_keyword("l") {
            Some(Box::new(self.parse_variable_declaration()?))
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_for_separator(open, "initializer")?;

        let test = if self.at().is_punct(";") {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_for_separator(open, "condition")?;

        let update = if self.at().is_punct(")") {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect_close(open, ")")?;

        Ok((init, test, update))
    }

    fn expect_for_separator(&mut self, open: &Token, after: &str) -> Result<(), Diagnostic> {
        self.skip_newlines();
        let token = self.at();
        if token.is_punct(";") {
            self.cursor.advance();
            self.skip_newlines();
            return Ok(());
        }
        if token.is_eof() {
            return Err(self.error(open, "Unmatched '(' in for-loop header, expected ')'"));
        }
        Err(self.error(
            &token,
            format!("Expected ';' after for-loop {}, found {}", after, describe(&token)),
        ))
    }

    fn expect_close(&mut self, open: &Token, close: &str) -> Result<(), Diagnostic> {
        self.skip_newlines();
        let token = self.at();
        if token.is_punct(close) {
            self.cursor.advance();
            return Ok(());
        }
        if token.is_eof() {
            return Err(self.error(
                open,
                format!("Unmatched '{}', expected '{}'", open.value, close),
            ));
        }
        Err(self.error(
            &token,
            format!("Expected '{}' but found {}", close, describe(&token)),
        ))
    }

    /// The parenthesised test of `if`/`while`, kept as a `ParenWrapper`.
    fn parse_condition(&mut self, keyword: &Token) -> ParseResult {
        let open = self.at();
        if !open.is_punct("(") {
            return Err(self.error(
                &open,
                format!("Expected '(' after '{}', found {}", keyword.value, describe(&open)),
            ));
        }
        self.parse_paren()
    }

    fn parse_block(&mut self) -> ParseResult {
        self.skip_newlines();
        let open = self.at();
        if !open.is_punct("{") {
            return Err(self.error(
                &open,
                format!("Expected '{{' to open block, found {}", describe(&open)),
            ));
        }
        self.cursor.advance();

        let group_depth = std::mem::take(&mut self.group_depth);
        self.block_depth += 1;
        let body = self.parse_block_body(&open);
        self.block_depth -= 1;
        self.group_depth = group_depth;

        Ok(AstKind::Block { body: body? })
    }

    fn parse_block_body(&mut self, open: &Token) -> Result<Vec<AstKind>, Diagnostic> {
        let mut body = Vec::new();

        loop {
            let token = self.at();
            match token.kind {
                Kind::NewLine => self.cursor.advance(),
                Kind::EndOfInput => {
                    return Err(self.error(open, "Unmatched '{', expected '}'"));
                }
                _ if token.is_punct("}") => {
                    self.cursor.advance();
                    return Ok(body);
                }
                _ => {
                    let start = self.cursor.position();
                    self.parse_statement_into(&mut body, start);
                }
            }
        }
    }

    fn expect_operand(&self, operator: &Token) -> Result<(), Diagnostic> {
        let token = self.at();
        if starts_expression(&token) {
            Ok(())
        } else {
            Err(self.error(
                &token,
                format!(
                    "Expected expression after '{}', found {}",
                    operator.value,
                    describe(&token)
                ),
            ))
        }
    }

    /// Operators are folded left to right with no precedence tiers:
    /// `a + b * c` is `(a + b) * c`.
    fn parse_expression(&mut self) -> ParseResult {
        let mut left = self.parse_unary()?;

        loop {
            if self.group_depth > 0 {
                self.skip_newlines();
            }
            let token = self.at();
            if token.kind != Kind::Operator || !is_binary_operator(&token.value) {
                break;
            }
            self.cursor.advance();
            self.skip_newlines();
            self.expect_operand(&token)?;
            let right = self.parse_unary()?;

            left = AstKind::BinaryExpression {
                left: Box::new(left),
                operator: token.value,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult {
        let token = self.at();
        if token.kind != Kind::Operator {
            return self.parse_primary();
        }

        match token.value.as_str() {
            "!" | "-" => {
                self.cursor.advance();
                self.expect_operand(&token)?;
                Ok(AstKind::UnaryExpression {
                    operator: token.value,
                    operand: Box::new(self.parse_unary()?),
                })
            }
            "++" | "--" => {
                self.cursor.advance();
                self.expect_operand(&token)?;
                Ok(AstKind::IncDec {
                    operator: token.value,
                    operand: Box::new(self.parse_unary()?),
                    prefix: true,
                })
            }
            _ => Err(self.unexpected(&token)),
        }
    }

    fn parse_primary(&mut self) -> ParseResult {
        let token = self.at();

        match token.kind {
            Kind::NumericLiteral | Kind::StringLiteral => {
                self.cursor.advance();
                Ok(AstKind::Literal {
                    value: token.value,
                    raw: token.raw,
                })
            }
            Kind::Keyword => match token.value.as_str() {
                "true" | "false" | "null" => {
                    self.cursor.advance();
                    Ok(AstKind::Literal {
                        value: token.value,
                        raw: token.raw,
                    })
                }
                "f" => self.parse_function(),
                "this" => self.parse_identifier_expression(),
                "new" => self.parse_new(&token),
                _ => Err(self.unexpected(&token)),
            },
            Kind::Identifier => self.parse_identifier_expression(),
            Kind::Punctuation if token.value == "(" => self.parse_paren(),
            Kind::Punctuation if token.value == "[" => {
                self.cursor.advance();
                let elements = self.parse_list(&token, "]", "array literal")?;
                Ok(AstKind::ArrayLiteral { elements })
            }
            _ => Err(self.unexpected(&token)),
        }
    }

    /// `new <constructor>`, where the constructor is an identifier, member
    /// path or call.
    fn parse_new(&mut self, keyword: &Token) -> ParseResult {
        self.cursor.advance();
        let token = self.at();
        if token.kind != Kind::Identifier && !token.is_keyword("this") {
            return Err(self.error(
                &token,
                format!(
                    "Expected constructor name after '{}', found {}",
                    keyword.value,
                    describe(&token)
                ),
            ));
        }

        Ok(AstKind::NewExpression {
            callee: Box::new(self.parse_identifier_expression()?),
        })
    }

    /// Identifier, `a.b.c` member path, call, indexed access, postfix `++`/`--`.
    fn parse_identifier_expression(&mut self) -> ParseResult {
        let mut name = self.next_token().value;

        while self.cursor.current().is_punct(".")
            && matches!(self.cursor.peek(0).kind, Kind::Identifier | Kind::Keyword)
        {
            self.cursor.advance();
            name.push('.');
            name.push_str(&self.cursor.current().value);
            self.cursor.advance();
        }

        let next = self.at();
        if next.is_punct("(") {
            self.cursor.advance();
            let args = self.parse_list(&next, ")", "argument list")?;
            return Ok(AstKind::CallExpression { name, args });
        }

        let node = if next.is_punct("[") {
            self.parse_index(name)?
        } else {
            AstKind::Identifier { name }
        };

        let next = self.at();
        if next.is_operator("++") || next.is_operator("--") {
            self.cursor.advance();
            return Ok(AstKind::IncDec {
                operator: next.value,
                operand: Box::new(node),
                prefix: false,
            });
        }

        Ok(node)
    }

    fn parse_index(&mut self, name: String) -> ParseResult {
        let mut index = Vec::new();

        while self.at().is_punct("[") {
            let open = self.next_token();
            self.skip_newlines();
            let token = self.at();
            if token.is_punct("]") {
                return Err(self.error(&open, "Empty index expression"));
            }
            if token.is_eof() {
                return Err(self.error(&open, "Unmatched '[', expected ']'"));
            }
            if !starts_expression(&token) {
                return Err(self.unexpected(&token));
            }
            index.push(self.grouped(|parser| {
                let expression = parser.parse_expression()?;
                parser.expect_close(&open, "]")?;
                Ok(expression)
            })?);
        }

        Ok(AstKind::ArrayIndex { name, index })
    }

    fn parse_paren(&mut self) -> ParseResult {
        let open = self.next_token();
        self.skip_newlines();

        let token = self.at();
        if token.is_punct(")") {
            return Err(self.error(&open, "Empty parenthesized expression"));
        }
        if token.is_eof() {
            return Err(self.error(&open, "Unmatched '(', expected ')'"));
        }
        if !starts_expression(&token) {
            return Err(self.unexpected(&token));
        }

        let inner = self.grouped(|parser| {
            let inner = parser.parse_expression()?;
            parser.expect_close(&open, ")")?;
            Ok(inner)
        })?;

        Ok(AstKind::ParenWrapper {
            inner: Box::new(inner),
        })
    }

    /// Comma-separated expressions after `open`, through `close`. A trailing
    /// comma is accepted.
    fn parse_list(&mut self, open: &Token, close: &str, what: &str) -> Result<Vec<AstKind>, Diagnostic> {
        self.grouped(|parser| parser.parse_list_items(open, close, what))
    }

    fn parse_list_items(
        &mut self,
        open: &Token,
        close: &str,
        what: &str,
    ) -> Result<Vec<AstKind>, Diagnostic> {
        let mut items = Vec::new();

        loop {
            self.skip_newlines();
            let mut token = self.at();

            if !items.is_empty() && !token.is_punct(close) && !token.is_eof() {
                if !token.is_punct(",") {
                    return Err(self.error(
                        &token,
                        format!("Expected ',' or '{}' in {}, found {}", close, what, describe(&token)),
                    ));
                }
                self.cursor.advance();
                self.skip_newlines();
                token = self.at();
            }

            if token.is_eof() {
                return Err(self.error(
                    open,
                    format!("Unmatched '{}' in {}, expected '{}'", open.value, what, close),
                ));
            }
            if token.is_punct(close) {
                self.cursor.advance();
                return Ok(items);
            }
            if !starts_expression(&token) {
                return Err(self.error(
                    &token,
                    format!("Unexpected {} in {}", describe(&token), what),
                ));
            }

            items.push(self.parse_expression()?);
        }
    }

    fn infer_kind(&self, node: &AstKind) -> ValueKind {
        match node {
            AstKind::Literal { value, raw } => {
                ValueKind::from_literal(value, raw.starts_with('\'') || raw.starts_with('"'))
            }
            AstKind::Identifier { name } => self
                .variables
                .lookup(name)
                .map(|variable| variable.kind)
                .unwrap_or(ValueKind::Unknown),
            AstKind::ArrayLiteral { .. } => ValueKind::Array,
            AstKind::FunctionDecl { .. } => ValueKind::Function,
            AstKind::ParenWrapper { inner } => self.infer_kind(inner),
            AstKind::IncDec { .. } => ValueKind::Number,
            AstKind::UnaryExpression { operator, .. } if operator == "!" => ValueKind::Boolean,
            AstKind::UnaryExpression { operator, .. } if operator == "-" => ValueKind::Number,
            AstKind::BinaryExpression { left, operator, right } => match operator.as_str() {
                "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" => ValueKind::Boolean,
                _ => {
                    let (lhs, rhs) = (self.infer_kind(left), self.infer_kind(right));
                    if operator == "+" && (lhs == ValueKind::String || rhs == ValueKind::String) {
                        ValueKind::String
                    } else if lhs == ValueKind::Number && rhs == ValueKind::Number {
                        ValueKind::Number
                    } else {
                        ValueKind::Unknown
                    }
                }
            },
            _ => ValueKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(source: &str) -> (Vec<AstKind>, Parser) {
        let tokens = Lexer::new(source).unwrap().tokenize();
        let mut parser = Parser::new(tokens, source);
        let program = parser.parse_program();
        (program, parser)
    }

    fn parse_ok(source: &str) -> Vec<AstKind> {
        let (program, parser) = parse(source);
        assert!(
            parser.diagnostics().is_empty(),
            "unexpected diagnostics: {:?}",
            parser.diagnostics()
        );
        program
    }

    fn literal(value: &str) -> Box<AstKind> {
        Box::new(AstKind::Literal {
            value: value.to_string(),
            raw: value.to_string(),
        })
    }

    fn ident(name: &str) -> Box<AstKind> {
        Box::new(AstKind::Identifier {
            name: name.to_string(),
        })
    }

    #[test]
    fn test_variable_declaration() {
        let program = parse_ok("l b = 12");
        assert_eq!(
            program,
            vec![AstKind::VariableDecl {
                name: "b".to_string(),
                initializer: Some(literal("12")),
            }]
        );
    }

    #[test]
    fn test_declaration_without_initializer() {
        let program = parse_ok("l b;");
        assert_eq!(
            program,
            vec![AstKind::VariableDecl {
                name: "b".to_string(),
                initializer: None,
            }]
        );
    }

    #[test]
    fn test_binary_subtraction() {
        let program = parse_ok("l b = 12-2");
        assert_eq!(
            program,
            vec![AstKind::VariableDecl {
                name: "b".to_string(),
                initializer: Some(Box::new(AstKind::BinaryExpression {
                    left: literal("12"),
                    operator: "-".to_string(),
                    right: literal("2"),
                })),
            }]
        );
    }

    #[test]
    fn test_operators_fold_left_without_precedence() {
        let program = parse_ok("a + b * c");
        assert_eq!(
            program,
            vec![AstKind::BinaryExpression {
                left: Box::new(AstKind::BinaryExpression {
                    left: ident("a"),
                    operator: "+".to_string(),
                    right: ident("b"),
                }),
                operator: "*".to_string(),
                right: ident("c"),
            }]
        );
    }

    #[test]
    fn test_if_else_shape() {
        let program = parse_ok("if (a > 1) { return a } else { return 1 }");
        match &program[0] {
            AstKind::IfElse {
                test,
                consequent,
                alternate,
            } => {
                assert!(matches!(**test, AstKind::ParenWrapper { .. }));
                assert!(matches!(**consequent, AstKind::Block { ref body } if body.len() == 1));
                assert!(matches!(alternate.as_deref(), Some(AstKind::Block { .. })));
            }
            other => panic!("Expected IfElse, got {:?}", other),
        }
    }

    #[test]
    fn test_else_if_chain_across_lines() {
        let program = parse_ok("if (a) {\n  b()\n}\nelse if (c) {\n}\nelse {\n}\nd");
        assert_eq!(program.len(), 2);
        match &program[0] {
            AstKind::IfElse { alternate, .. } => match alternate.as_deref() {
                Some(AstKind::IfElse { alternate, .. }) => {
                    assert!(matches!(alternate.as_deref(), Some(AstKind::Block { .. })));
                }
                other => panic!("Expected else-if, got {:?}", other),
            },
            other => panic!("Expected IfElse, got {:?}", other),
        }
        assert_eq!(program[1], *ident("d"));
    }

    #[test]
    fn test_function_declaration() {
        let program = parse_ok("f add(a, b) {\n  return a + b\n}");
        match &program[0] {
            AstKind::FunctionDecl { name, params, body } => {
                assert_eq!(name.as_deref(), Some("add"));
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
                assert!(matches!(**body, AstKind::Block { ref body } if body.len() == 1));
            }
            other => panic!("Expected FunctionDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_anonymous_function_expression() {
        let program = parse_ok("l add = f(a) { return a }");
        match &program[0] {
            AstKind::VariableDecl {
                initializer: Some(init),
                ..
            } => assert!(matches!(**init, AstKind::FunctionDecl { name: None, .. })),
            other => panic!("Expected VariableDecl, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_parameter_list_reports_once() {
        let (_, parser) = parse("f foo(");
        assert_eq!(parser.diagnostics().len(), 1);
        assert!(parser.diagnostics()[0].message.contains("')'"));
    }

    #[test]
    fn test_for_loop() {
        let program = parse_ok("for (l i = 0; i < 10; i++) { continue }");
        match &program[0] {
            AstKind::Loop {
                init,
                test,
                update,
                ..
            } => {
                assert!(matches!(init.as_deref(), Some(AstKind::VariableDecl { .. })));
                assert!(matches!(test.as_deref(), Some(AstKind::BinaryExpression { .. })));
                assert!(matches!(
                    update.as_deref(),
                    Some(AstKind::IncDec { prefix: false, .. })
                ));
            }
            other => panic!("Expected Loop, got {:?}", other),
        }
    }

    #[test]
    fn test_while_loop() {
        let program = parse_ok("while (x) {\n  x--\n  break\n}");
        assert!(matches!(
            &program[0],
            AstKind::Loop { init: None, update: None, test: Some(_), .. }
        ));
    }

    #[test]
    fn test_call_index_and_array() {
        let program = parse_ok("print(grid[1][j], [1, 'two',\n 3], console.log)");
        match &program[0] {
            AstKind::CallExpression { name, args } => {
                assert_eq!(name, "print");
                assert_eq!(args.len(), 3);
                assert!(matches!(&args[0], AstKind::ArrayIndex { index, .. } if index.len() == 2));
                assert!(matches!(&args[1], AstKind::ArrayLiteral { elements } if elements.len() == 3));
                assert_eq!(args[2], *ident("console.log"));
            }
            other => panic!("Expected CallExpression, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_and_prefix() {
        let program = parse_ok("!done\n-x\n++count");
        assert!(matches!(&program[0], AstKind::UnaryExpression { operator, .. } if operator == "!"));
        assert!(matches!(&program[1], AstKind::UnaryExpression { operator, .. } if operator == "-"));
        assert!(matches!(&program[2], AstKind::IncDec { prefix: true, .. }));
    }

    #[test]
    fn test_alias_applies_after_definition_only() {
        let program = parse_ok("myvar\ndef myvar -> x\nmyvar");
        assert_eq!(program[0], *ident("myvar"));
        assert!(matches!(&program[1], AstKind::DefineAlias { name, value } if name == "myvar" && value == "x"));
        assert_eq!(program[2], *ident("x"));
        assert_eq!(parse_ok("def myvar -> x\nl y = myvar")[1], parse_ok("l y = x")[0]);
    }

    #[test]
    fn test_alias_to_keyword_dispatches_as_keyword() {
        let program = parse_ok("def let -> l\nlet a = 1");
        assert!(matches!(&program[1], AstKind::VariableDecl { name, .. } if name == "a"));
    }

    #[test]
    fn test_break_followed_by_token_is_diagnosed() {
        let (_, parser) = parse("while (a) { break 1 }");
        assert_eq!(parser.diagnostics().len(), 1);
        assert!(parser.diagnostics()[0].message.contains("after 'break'"));
    }

    #[test]
    fn test_missing_identifier_after_l() {
        let (_, parser) = parse("l = 5\nl ok = 1");
        assert_eq!(parser.diagnostics().len(), 1);
        let diagnostic = &parser.diagnostics()[0];
        assert_eq!((diagnostic.line, diagnostic.col), (1, 3));
        assert_eq!(diagnostic.source_line, "l = 5");
        assert_eq!(parser.variables().lookup("ok").map(|v| v.kind), Some(ValueKind::Number));
    }

    #[test]
    fn test_errors_on_separate_lines_all_reported() {
        let (program, parser) = parse("l a = \n)\nl b = 2\nx = ()");
        assert_eq!(parser.diagnostics().len(), 3);
        assert!(program.iter().any(|node| matches!(node, AstKind::VariableDecl { name, .. } if name == "b")));
    }

    #[test]
    fn test_bad_statement_inside_block_recovers_to_closer() {
        let (program, parser) = parse("if (a) { l = 1 }\nl b = 2");
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_unmatched_brace() {
        let (_, parser) = parse("while (a) {\n b()\n");
        assert_eq!(parser.diagnostics().len(), 1);
        assert!(parser.diagnostics()[0].message.contains("Unmatched '{'"));
        assert_eq!(parser.diagnostics()[0].line, 1);
    }

    #[test]
    fn test_empty_parens() {
        let (_, parser) = parse("if () { }");
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(parser.diagnostics()[0].message, "Empty parenthesized expression");
    }

    #[test]
    fn test_unterminated_string_is_unexpected() {
        let (_, parser) = parse("l a = 'oops");
        assert_eq!(parser.diagnostics().len(), 1);
        assert!(parser.diagnostics()[0].message.contains("unterminated string literal"));
    }

    #[test]
    fn test_kind_propagates_from_declared_identifier() {
        let (_, parser) = parse_checked("l a = 'hi'\nl b = a\nl c = [1]\nl d = b + 1");
        let variables = parser.variables();
        assert_eq!(variables.lookup("b").map(|v| v.kind), Some(ValueKind::String));
        assert_eq!(variables.lookup("b").map(|v| v.declaration_index), Some(1));
        assert_eq!(variables.lookup("c").map(|v| v.kind), Some(ValueKind::Array));
        assert_eq!(variables.lookup("d").map(|v| v.kind), Some(ValueKind::String));
    }

    fn parse_checked(source: &str) -> (Vec<AstKind>, Parser) {
        let (program, parser) = parse(source);
        assert!(parser.diagnostics().is_empty());
        (program, parser)
    }

    #[test]
    fn test_pathological_input_terminates() {
        for source in ["((((((", "]]]]", "{{{{", "f f f f", "l l l", "def def", "for (;;", "a[", "'"] {
            let (_, parser) = parse(source);
            assert!(!parser.diagnostics().is_empty(), "{} should be rejected", source);
        }
    }

    #[test]
    fn test_operator_on_next_line_inside_parens() {
        let program = parse_ok("l a = (1\n+ 2)");
        assert_eq!(
            program,
            vec![AstKind::VariableDecl {
                name: "a".to_string(),
                initializer: Some(Box::new(AstKind::ParenWrapper {
                    inner: Box::new(AstKind::BinaryExpression {
                        left: literal("1"),
                        operator: "+".to_string(),
                        right: literal("2"),
                    }),
                })),
            }]
        );
    }

    #[test]
    fn test_operator_on_next_line_inside_arguments_and_index() {
        let program = parse_ok("foo(a\n+ b)\nxs[i\n+ 1]");
        assert_eq!(program.len(), 2);
        match &program[0] {
            AstKind::CallExpression { name, args } => {
                assert_eq!(name, "foo");
                assert!(matches!(args.as_slice(), [AstKind::BinaryExpression { .. }]));
            }
            other => panic!("expected call, got {:?}", other),
        }
        match &program[1] {
            AstKind::ArrayIndex { name, index } => {
                assert_eq!(name, "xs");
                assert!(matches!(index.as_slice(), [AstKind::BinaryExpression { .. }]));
            }
            other => panic!("expected index, got {:?}", other),
        }
    }

    #[test]
    fn test_for_header_split_across_lines() {
        let program = parse_ok("for (\nl i = 0;\ni < 3;\ni++\n) { }");
        match &program[0] {
            AstKind::Loop { init, test, update, .. } => {
                assert!(init.is_some());
                assert!(matches!(test.as_deref(), Some(AstKind::BinaryExpression { .. })));
                assert!(matches!(update.as_deref(), Some(AstKind::IncDec { prefix: false, .. })));
            }
            other => panic!("expected loop, got {:?}", other),
        }
    }

    #[test]
    fn test_block_inside_arguments_keeps_line_terminators() {
        let program = parse_ok("foo(f() {\nl a = 1\nl b = 2\n})\nl c = 3");
        assert_eq!(program.len(), 2);
        match &program[0] {
            AstKind::CallExpression { args, .. } => match args.as_slice() {
                [AstKind::FunctionDecl { body, .. }] => {
                    assert!(matches!(&**body, AstKind::Block { body } if body.len() == 2));
                }
                other => panic!("expected one function argument, got {:?}", other),
            },
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_new_expression() {
        let program = parse_ok("l a = new Foo(1)\nl b = new ns.Bar");
        assert_eq!(
            program[0],
            AstKind::VariableDecl {
                name: "a".to_string(),
                initializer: Some(Box::new(AstKind::NewExpression {
                    callee: Box::new(AstKind::CallExpression {
                        name: "Foo".to_string(),
                        args: vec![*literal("1")],
                    }),
                })),
            }
        );
        assert_eq!(
            program[1],
            AstKind::VariableDecl {
                name: "b".to_string(),
                initializer: Some(Box::new(AstKind::NewExpression {
                    callee: ident("ns.Bar"),
                })),
            }
        );
    }

    #[test]
    fn test_new_without_constructor() {
        let (_, parser) = parse("l a = new 5");
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(
            parser.diagnostics()[0].message,
            "Expected constructor name after 'new', found token '5'"
        );
    }

    #[test]
    fn test_this_member_path() {
        let program = parse_ok("l a = this.x\nthis.y = a");
        assert_eq!(
            program[0],
            AstKind::VariableDecl {
                name: "a".to_string(),
                initializer: Some(ident("this.x")),
            }
        );
        assert_eq!(
            program[1],
            AstKind::BinaryExpression {
                left: ident("this.y"),
                operator: "=".to_string(),
                right: ident("a"),
            }
        );
    }
}
