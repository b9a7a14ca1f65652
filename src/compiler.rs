use crate::parser::AstKind;

/// Renders a parsed program as JavaScript. Generation trusts the parser:
/// shapes it cannot render come out as empty text.
#[derive(Debug, Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    /// One rendered statement per line, in declaration order.
    pub fn compile_program(&self, program: &[AstKind]) -> String {
        self.compile_statements(program).join("\n")
    }

    pub fn compile_node(&self, node: &AstKind) -> String {
        match node {
            AstKind::Program { body } => self.compile_program(body),
            AstKind::VariableDecl { name, initializer } => match initializer {
                Some(init) => format!("let {} = {};", name, self.compile_node(init)),
                None => format!("let {};", name),
            },
            AstKind::FunctionDecl { name, params, body } => format!(
                "function {}({}) {}",
                name.as_deref().unwrap_or(""),
                params.join(", "),
                self.compile_function_body(body)
            ),
            AstKind::Return { value } => match value {
                Some(value) => format!("return {};", self.compile_node(value)),
                None => "return;".to_string(),
            },
            AstKind::Break => "break;".to_string(),
            AstKind::Continue => "continue;".to_string(),
            AstKind::IfElse {
                test,
                consequent,
                alternate,
            } => {
                let mut output = format!(
                    "if ({}) {}",
                    self.compile_node(test),
                    self.compile_inline_block(consequent)
                );
                match alternate.as_deref() {
                    Some(chained @ AstKind::IfElse { .. }) => {
                        output.push_str(" else ");
                        output.push_str(&self.compile_node(chained));
                    }
                    Some(block) => {
                        output.push_str(" else ");
                        output.push_str(&self.compile_inline_block(block));
                    }
                    None => {}
                }
                output
            }
            AstKind::Loop {
                init,
                test,
                update,
                body,
            } => self.compile_loop(init.as_deref(), test.as_deref(), update.as_deref(), body),
            AstKind::CallExpression { name, args } => {
                format!("{}({})", name, self.compile_list(args))
            }
            AstKind::ArrayLiteral { elements } => format!("[{}]", self.compile_list(elements)),
            AstKind::ArrayIndex { name, index } => {
                let mut output = name.clone();
                for expr in index {
                    output.push('[');
                    output.push_str(&self.compile_node(expr));
                    output.push(']');
                }
                output
            }
            AstKind::BinaryExpression {
                left,
                operator,
                right,
            } => format!(
                "{} {} {}",
                self.compile_node(left),
                operator,
                self.compile_node(right)
            ),
            AstKind::UnaryExpression { operator, operand } => {
                format!("{}{}", operator, self.compile_node(operand))
            }
            AstKind::IncDec {
                operator,
                operand,
                prefix,
            } => {
                if *prefix {
                    format!("{}{}", operator, self.compile_node(operand))
                } else {
                    format!("{}{}", self.compile_node(operand), operator)
                }
            }
            AstKind::Literal { raw, .. } => raw.clone(),
            AstKind::Identifier { name } => name.clone(),
            AstKind::DefineAlias { .. } => String::new(),
            AstKind::Block { .. } => self.compile_inline_block(node),
            AstKind::ParenWrapper { inner } => format!("({})", self.compile_node(inner)),
            AstKind::NewExpression { callee } => format!("new {}", self.compile_node(callee)),
        }
    }

    /// Like `compile_node`, but expressions used as statements get a `;`.
    fn compile_statement(&self, node: &AstKind) -> String {
        let output = self.compile_node(node);
        let is_expression = matches!(
            node,
            AstKind::CallExpression { .. }
                | AstKind::ArrayLiteral { .. }
                | AstKind::ArrayIndex { .. }
                | AstKind::BinaryExpression { .. }
                | AstKind::UnaryExpression { .. }
                | AstKind::IncDec { .. }
                | AstKind::Literal { .. }
                | AstKind::Identifier { .. }
                | AstKind::ParenWrapper { .. }
                | AstKind::NewExpression { .. }
        );

        if is_expression && !output.is_empty() {
            output + ";"
        } else {
            output
        }
    }

    fn compile_statements(&self, statements: &[AstKind]) -> Vec<String> {
        statements
            .iter()
            .map(|statement| self.compile_statement(statement))
            .filter(|output| !output.is_empty())
            .collect()
    }

    fn compile_list(&self, items: &[AstKind]) -> String {
        items
            .iter()
            .map(|item| self.compile_node(item))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `{ a; b; }` on one line, used for `if` and loop bodies.
    fn compile_inline_block(&self, node: &AstKind) -> String {
        let statements = match node {
            AstKind::Block { body } => self.compile_statements(body),
            other => vec![self.compile_statement(other)],
        };

        if statements.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", statements.join(" "))
        }
    }

    fn compile_function_body(&self, node: &AstKind) -> String {
        let statements = match node {
            AstKind::Block { body } => self.compile_statements(body),
            other => vec![self.compile_statement(other)],
        };

        if statements.is_empty() {
            "{}".to_string()
        } else {
            format!("{{\n{}\n}}", statements.join("\n"))
        }
    }

    fn compile_loop(
        &self,
        init: Option<&AstKind>,
        test: Option<&AstKind>,
        update: Option<&AstKind>,
        body: &AstKind,
    ) -> String {
        let body = self.compile_inline_block(body);

        if init.is_none() && update.is_none() {
            let test = test
                .map(|test| self.compile_node(test))
                .unwrap_or_else(|| "true".to_string());
            return format!("while ({}) {}", test, body);
        }

        let mut header = init.map(|init| self.compile_node(init)).unwrap_or_default();
        if !header.ends_with(';') {
            header.push(';');
        }
        if let Some(test) = test {
            header.push(' ');
            header.push_str(&self.compile_node(test));
        }
        header.push(';');
        if let Some(update) = update {
            header.push(' ');
            header.push_str(&self.compile_node(update));
        }

        format!("for ({}) {}", header, body)
    }
}
