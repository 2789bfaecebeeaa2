use crate::ast::DeclaredType;
use crate::diagnostic::{Diagnostic, Label, Span};

/// A runtime fault raised while executing one statement. Most kinds abort
/// only the offending statement; `is_fatal` kinds abort the whole run.
#[derive(Debug, Clone)]
pub enum RuntimeError {
    AlreadyDeclared { name: String, span: Span },
    UndeclaredVariable { name: String, span: Span },
    TypeMismatch { message: String, span: Span },
    InvalidConversion { value: String, target: DeclaredType, span: Span },
    DivisionByZero { span: Span },
    InvalidCaseType { subject: &'static str, found: &'static str, span: Span },
    MissingBreakOnDefault { span: Span },
    /// A valueless operand reached an operator that requires a value.
    AbsentOperand { operator: String, span: Span },
    /// Defensive: a grammar/evaluator mismatch that a conforming program
    /// can never produce.
    UnknownOperator { message: String, span: Span },
}

impl RuntimeError {
    pub fn already_declared(name: impl Into<String>) -> Self {
        Self::AlreadyDeclared { name: name.into(), span: Span::dummy() }
    }

    pub fn undeclared_variable(name: impl Into<String>) -> Self {
        Self::UndeclaredVariable { name: name.into(), span: Span::dummy() }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch { message: message.into(), span: Span::dummy() }
    }

    pub fn type_mismatch_at(message: impl Into<String>, span: Span) -> Self {
        Self::TypeMismatch { message: message.into(), span }
    }

    pub fn invalid_conversion(value: impl Into<String>, target: DeclaredType) -> Self {
        Self::InvalidConversion { value: value.into(), target, span: Span::dummy() }
    }

    pub fn invalid_conversion_at(value: impl Into<String>, target: DeclaredType, span: Span) -> Self {
        Self::InvalidConversion { value: value.into(), target, span }
    }

    pub fn division_by_zero() -> Self {
        Self::DivisionByZero { span: Span::dummy() }
    }

    pub fn division_by_zero_at(span: Span) -> Self {
        Self::DivisionByZero { span }
    }

    pub fn invalid_case_type_at(subject: &'static str, found: &'static str, span: Span) -> Self {
        Self::InvalidCaseType { subject, found, span }
    }

    pub fn missing_break_on_default_at(span: Span) -> Self {
        Self::MissingBreakOnDefault { span }
    }

    pub fn absent_operand_at(operator: impl Into<String>, span: Span) -> Self {
        Self::AbsentOperand { operator: operator.into(), span }
    }

    pub fn unknown_operator(message: impl Into<String>) -> Self {
        Self::UnknownOperator { message: message.into(), span: Span::dummy() }
    }

    /// Attach a span to an error built without one.
    pub fn at(mut self, span: Span) -> Self {
        let slot = match &mut self {
            Self::AlreadyDeclared { span, .. } => span,
            Self::UndeclaredVariable { span, .. } => span,
            Self::TypeMismatch { span, .. } => span,
            Self::InvalidConversion { span, .. } => span,
            Self::DivisionByZero { span } => span,
            Self::InvalidCaseType { span, .. } => span,
            Self::MissingBreakOnDefault { span } => span,
            Self::AbsentOperand { span, .. } => span,
            Self::UnknownOperator { span, .. } => span,
        };
        if slot.is_dummy() {
            *slot = span;
        }
        self
    }

    pub fn span(&self) -> Span {
        match self {
            Self::AlreadyDeclared { span, .. } => *span,
            Self::UndeclaredVariable { span, .. } => *span,
            Self::TypeMismatch { span, .. } => *span,
            Self::InvalidConversion { span, .. } => *span,
            Self::DivisionByZero { span } => *span,
            Self::InvalidCaseType { span, .. } => *span,
            Self::MissingBreakOnDefault { span } => *span,
            Self::AbsentOperand { span, .. } => *span,
            Self::UnknownOperator { span, .. } => *span,
        }
    }

    /// Whether this error aborts the run rather than just its statement.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AbsentOperand { .. } | Self::UnknownOperator { .. }
        )
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            Self::AlreadyDeclared { .. } => "E0201",
            Self::UndeclaredVariable { .. } => "E0202",
            Self::TypeMismatch { .. } => "E0203",
            Self::InvalidConversion { .. } => "E0204",
            Self::DivisionByZero { .. } => "E0205",
            Self::InvalidCaseType { .. } => "E0206",
            Self::MissingBreakOnDefault { .. } => "E0207",
            Self::AbsentOperand { .. } => "E0208",
            Self::UnknownOperator { .. } => "E0209",
        };
        let mut diagnostic = Diagnostic::error(self.to_string()).with_code(code);
        if !self.span().is_dummy() {
            diagnostic = diagnostic.with_label(Label::primary(self.span(), ""));
        }
        if let Self::MissingBreakOnDefault { .. } = self {
            diagnostic = diagnostic.with_help("end the DEFAULT block with BREAK");
        }
        diagnostic
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyDeclared { name, .. } => {
                write!(f, "Variable '{}' is already declared", name)
            }
            Self::UndeclaredVariable { name, .. } => {
                write!(f, "Variable '{}' is not declared", name)
            }
            Self::TypeMismatch { message, .. } => write!(f, "Type mismatch: {}", message),
            Self::InvalidConversion { value, target, .. } => {
                write!(f, "Cannot convert '{}' to {}", value, target)
            }
            Self::DivisionByZero { .. } => write!(f, "Division by zero"),
            Self::InvalidCaseType { subject, found, .. } => write!(
                f,
                "CASE value of type {} does not match SWITCH value of type {}",
                found, subject
            ),
            Self::MissingBreakOnDefault { .. } => {
                write!(f, "DEFAULT block does not end with BREAK")
            }
            Self::AbsentOperand { operator, .. } => write!(
                f,
                "Operator '{}' applied to a variable that has no value yet",
                operator
            ),
            Self::UnknownOperator { message, .. } => write!(f, "Unknown operator: {}", message),
        }
    }
}

impl std::error::Error for RuntimeError {}
