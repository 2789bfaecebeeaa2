use indexmap::IndexMap;

use super::error::RuntimeError;
use crate::ast::DeclaredType;
use crate::format;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Binding {
    pub declared: DeclaredType,
    pub value: Value,
}

/// The variable table for one program run: a flat, single global scope,
/// kept in declaration order.
#[derive(Debug, Default)]
pub struct Environment {
    bindings: IndexMap<String, Binding>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            bindings: IndexMap::new(),
        }
    }

    /// Declares a fresh variable. With an initializer the value is coerced to
    /// the declared type; a failed coercion leaves the name undeclared rather
    /// than half-initialized.
    pub fn declare(
        &mut self,
        name: &str,
        declared: DeclaredType,
        initial: Option<Value>,
    ) -> Result<(), RuntimeError> {
        if self.bindings.contains_key(name) {
            return Err(RuntimeError::already_declared(name));
        }
        let value = match initial {
            Some(initial_value) => coerce(initial_value, declared)?,
            None => Value::Absent,
        };
        self.bindings
            .insert(name.to_string(), Binding { declared, value });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        self.bindings
            .get(name)
            .map(|binding| binding.value.clone())
            .ok_or_else(|| RuntimeError::undeclared_variable(name))
    }

    pub fn declared_type(&self, name: &str) -> Result<DeclaredType, RuntimeError> {
        self.bindings
            .get(name)
            .map(|binding| binding.declared)
            .ok_or_else(|| RuntimeError::undeclared_variable(name))
    }

    /// Replaces a variable's value. The incoming variant must structurally
    /// match the declared type; no widening happens here.
    pub fn assign(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let binding = self
            .bindings
            .get_mut(name)
            .ok_or_else(|| RuntimeError::undeclared_variable(name))?;
        if !value.matches_declared(binding.declared) {
            return Err(RuntimeError::type_mismatch(format!(
                "cannot assign a {} value to '{}' declared {}",
                value.type_name(),
                name,
                binding.declared
            )));
        }
        binding.value = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Declaration-time conversion of a value to its declared type. Widening
/// (`FLOAT <- INT`) and strict parses from string sources are the only
/// conversions; everything else fails.
pub fn coerce(value: Value, target: DeclaredType) -> Result<Value, RuntimeError> {
    if value.matches_declared(target) {
        return Ok(value);
    }
    let converted = match (&value, target) {
        (Value::Int(numeric_value), DeclaredType::Float) => {
            Some(Value::Float(*numeric_value as f32))
        }
        (Value::Str(text), _) => format::parse_input(text, target),
        _ => None,
    };
    converted.ok_or_else(|| RuntimeError::invalid_conversion(format::render_value(&value), target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_declare_and_get() {
        let mut env = Environment::new();
        env.declare("x", DeclaredType::Int, Some(Value::Int(42)))
            .unwrap();
        assert_eq!(env.get("x").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_declare_without_initializer_holds_absent() {
        let mut env = Environment::new();
        env.declare("x", DeclaredType::Int, None).unwrap();
        assert_eq!(env.get("x").unwrap(), Value::Absent);
    }

    #[test]
    fn test_redeclaration_fails_and_later_names_still_work() {
        let mut env = Environment::new();
        env.declare("x", DeclaredType::Int, Some(Value::Int(1)))
            .unwrap();
        let err = env
            .declare("x", DeclaredType::Int, Some(Value::Int(2)))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::AlreadyDeclared { .. }));
        assert_eq!(env.get("x").unwrap(), Value::Int(1));
        env.declare("y", DeclaredType::Int, Some(Value::Int(3)))
            .unwrap();
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn test_failed_coercion_leaves_name_undeclared() {
        let mut env = Environment::new();
        let err = env
            .declare("x", DeclaredType::Int, Some(Value::Float(3.5)))
            .unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidConversion { .. }));
        assert!(env.get("x").is_err());
    }

    #[test]
    fn test_assign_requires_matching_variant() {
        let mut env = Environment::new();
        env.declare("f", DeclaredType::Float, Some(Value::Float(1.0)))
            .unwrap();
        let err = env.assign("f", Value::Int(2)).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
        assert_eq!(env.get("f").unwrap(), Value::Float(1.0));
    }

    #[test]
    fn test_assign_to_undeclared_fails() {
        let mut env = Environment::new();
        let err = env.assign("ghost", Value::Int(1)).unwrap_err();
        assert!(matches!(err, RuntimeError::UndeclaredVariable { .. }));
    }

    #[test]
    fn test_coerce_widens_int_to_float() {
        assert_eq!(
            coerce(Value::Int(3), DeclaredType::Float).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn test_coerce_parses_string_sources_strictly() {
        assert_eq!(
            coerce(Value::Str(Rc::from("12")), DeclaredType::Int).unwrap(),
            Value::Int(12)
        );
        assert_eq!(
            coerce(Value::Str(Rc::from("x")), DeclaredType::Char).unwrap(),
            Value::Char('x')
        );
        assert!(coerce(Value::Str(Rc::from("12.5")), DeclaredType::Int).is_err());
    }

    #[test]
    fn test_coerce_rejects_float_to_int_narrowing() {
        assert!(coerce(Value::Float(3.0), DeclaredType::Int).is_err());
    }
}
