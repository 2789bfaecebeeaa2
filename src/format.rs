use std::rc::Rc;

use crate::ast::DeclaredType;
use crate::value::Value;

/// Renders a value the way `DISPLAY` shows it. Booleans print as the literal
/// words `TRUE`/`FALSE`; an absent value renders as nothing.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Int(numeric_value) => numeric_value.to_string(),
        Value::Float(numeric_value) => render_float(*numeric_value),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Char(character) => character.to_string(),
        Value::Str(text) => text.to_string(),
        Value::Absent => String::new(),
    }
}

/// Floats always show a decimal point and never scientific notation:
/// `3.0`, not `3` and not `3e0`.
pub fn render_float(value: f32) -> String {
    let formatted = value.to_string();
    if formatted.contains('.') {
        formatted
    } else {
        format!("{}.0", formatted)
    }
}

/// Converts one raw input line to a value of the target declared type.
/// Conversion is strict parse-or-fail; `None` means the line does not
/// represent a value of that type.
pub fn parse_input(raw: &str, target: DeclaredType) -> Option<Value> {
    match target {
        DeclaredType::Int => raw.parse::<i32>().ok().map(Value::Int),
        DeclaredType::Float => raw
            .parse::<f32>()
            .ok()
            .filter(|parsed| parsed.is_finite())
            .map(Value::Float),
        DeclaredType::Bool => {
            if raw.eq_ignore_ascii_case("TRUE") {
                Some(Value::Bool(true))
            } else if raw.eq_ignore_ascii_case("FALSE") {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        DeclaredType::Char => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(single), None) => Some(Value::Char(single)),
                _ => None,
            }
        }
        DeclaredType::Str => Some(Value::Str(Rc::from(raw))),
    }
}
