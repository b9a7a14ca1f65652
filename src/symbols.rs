use crate::token::{Kind, Token};
use crate::types::ValueKind;
use serde::Serialize;

/// Replacement registered by `def <name> -> <literal>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub kind: Kind,
    pub value: String,
    pub raw: String,
}

/// Aliases in declaration order; a later `def` of the same name wins.
#[derive(Debug, Default)]
pub struct AliasTable {
    aliases: Vec<Alias>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: String, target: &Token) {
        let alias = Alias {
            name,
            kind: target.kind,
            value: target.value.clone(),
            raw: target.raw.clone(),
        };
        match self.aliases.iter_mut().find(|a| a.name == alias.name) {
            Some(existing) => *existing = alias,
            None => self.aliases.push(alias),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|alias| alias.name == name)
    }

    /// Substitutes an aliased identifier, keeping the original position.
    pub fn resolve(&self, token: &Token) -> Token {
        if token.kind != Kind::Identifier {
            return token.clone();
        }
        match self.lookup(&token.value) {
            Some(alias) => Token {
                kind: alias.kind,
                value: alias.value.clone(),
                raw: alias.raw.clone(),
                line: token.line,
                col: token.col,
            },
            None => token.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub kind: ValueKind,
    /// Index of the top-level statement holding the declaration.
    pub declaration_index: usize,
}

#[derive(Debug, Default)]
pub struct VariableTable {
    variables: Vec<Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: String, kind: ValueKind, declaration_index: usize) {
        self.variables.push(Variable {
            name,
            kind,
            declaration_index,
        });
    }

    /// Most recent declaration of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().rev().find(|variable| variable.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: Kind, value: &str) -> Token {
        let mut token = Token::new(kind, value, value);
        token.line = 4;
        token.col = 9;
        token
    }

    #[test]
    fn test_resolve_keeps_position() {
        let mut aliases = AliasTable::new();
        aliases.define("myvar".to_string(), &token(Kind::Identifier, "x"));

        let resolved = aliases.resolve(&token(Kind::Identifier, "myvar"));
        assert_eq!(resolved.value, "x");
        assert_eq!(resolved.kind, Kind::Identifier);
        assert_eq!((resolved.line, resolved.col), (4, 9));
    }

    #[test]
    fn test_alias_to_keyword_keeps_keyword_kind() {
        let mut aliases = AliasTable::new();
        aliases.define("let".to_string(), &token(Kind::Keyword, "l"));
        assert_eq!(aliases.resolve(&token(Kind::Identifier, "let")).kind, Kind::Keyword);
    }

    #[test]
    fn test_redefinition_replaces() {
        let mut aliases = AliasTable::new();
        aliases.define("n".to_string(), &token(Kind::NumericLiteral, "1"));
        aliases.define("n".to_string(), &token(Kind::NumericLiteral, "2"));
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.lookup("n").unwrap().value, "2");
    }

    #[test]
    fn test_non_identifiers_pass_through() {
        let mut aliases = AliasTable::new();
        aliases.define("x".to_string(), &token(Kind::NumericLiteral, "1"));
        let string = token(Kind::StringLiteral, "x");
        assert_eq!(aliases.resolve(&string), string);
    }

    #[test]
    fn test_variable_lookup_prefers_latest() {
        let mut variables = VariableTable::new();
        variables.declare("a".to_string(), ValueKind::Number, 0);
        variables.declare("a".to_string(), ValueKind::String, 3);
        let found = variables.lookup("a").unwrap();
        assert_eq!(found.kind, ValueKind::String);
        assert_eq!(found.declaration_index, 3);
    }
}
