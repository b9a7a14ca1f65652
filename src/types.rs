use serde::Serialize;

/// Best-effort kind of a declared variable. Not a type system: anything the
/// parser cannot tell at a glance is `Unknown`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum ValueKind {
    Number,
    String,
    Boolean,
    Null,
    Array,
    Function,
    Unknown,
}

impl ValueKind {
    pub fn from_literal(value: &str, is_string: bool) -> Self {
        if is_string {
            return ValueKind::String;
        }
        match value {
            "true" | "false" => ValueKind::Boolean,
            "null" => ValueKind::Null,
            _ if value.parse::<f64>().is_ok() => ValueKind::Number,
            _ => ValueKind::Unknown,
        }
    }
}
