use std::io::{self, BufRead, Write};
use std::rc::Rc;

use chumsky::Parser as _;

use super::control_flow::ControlFlow;
use super::environment::Environment;
use super::error::RuntimeError;
use super::parser::TokenParser;
use crate::ast::{
    BinaryOp, DisplayItem, Expr, ExprKind, Program, Stmt, SwitchCase, UnaryOp,
};
use crate::diagnostic::{Diagnostic, Span};
use crate::format;
use crate::value::Value;

/// Tree-walking executor for one parsed program. Owns the environment for
/// the run's lifetime; the expression evaluator only reads it.
pub struct Interpreter<'io> {
    env: Environment,
    input: Box<dyn BufRead + 'io>,
    output: Box<dyn Write + 'io>,
    errors: Vec<RuntimeError>,
}

impl Interpreter<'static> {
    pub fn new() -> Self {
        Self::with_io(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl Default for Interpreter<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'io> Interpreter<'io> {
    pub fn with_io(input: impl BufRead + 'io, output: impl Write + 'io) -> Self {
        Self {
            env: Environment::new(),
            input: Box::new(input),
            output: Box::new(output),
            errors: Vec::new(),
        }
    }

    /// Executes the program top to bottom exactly once. A recoverable error
    /// aborts only its statement and is recorded; fatal errors abort the run.
    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for statement in &program.statements {
            match self.execute_statement(statement) {
                Ok(ControlFlow::Normal) => {}
                Ok(ControlFlow::BreakSwitch) => {
                    return Err(RuntimeError::unknown_operator(
                        "BREAK signal escaped every SWITCH block",
                    ));
                }
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => self.errors.push(error),
            }
        }
        Ok(())
    }

    /// Errors recorded by statements that failed but did not end the run.
    pub fn errors(&self) -> &[RuntimeError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<RuntimeError> {
        std::mem::take(&mut self.errors)
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    fn execute_statement(&mut self, statement: &Stmt) -> Result<ControlFlow, RuntimeError> {
        match statement {
            Stmt::Declare {
                declared,
                names,
                initializer,
            } => {
                let initial = match initializer {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None,
                };
                // Each name declares independently; a failure on one is
                // recorded and the remaining names still declare.
                for name in names {
                    if let Err(error) = self.env.declare(name, *declared, initial.clone()) {
                        self.errors.push(error);
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::Assign { targets, value } => {
                let assigned = self.evaluate(value)?;
                for target in targets {
                    self.env
                        .assign(target, assigned.clone())
                        .map_err(|error| error.at(value.span))?;
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::If {
                branches,
                else_body,
            } => {
                for branch in branches {
                    if self.evaluate_condition(&branch.condition)? {
                        return self.execute_block(&branch.body);
                    }
                }
                match else_body {
                    Some(body) => self.execute_block(body),
                    None => Ok(ControlFlow::Normal),
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate_condition(condition)? {
                    match self.execute_block(body)? {
                        ControlFlow::BreakSwitch => return Ok(ControlFlow::BreakSwitch),
                        ControlFlow::Normal => {}
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::Switch {
                subject,
                cases,
                default,
            } => self.execute_switch(subject, cases, default.as_deref()),
            Stmt::Break => Ok(ControlFlow::BreakSwitch),
            Stmt::Display { items } => {
                self.execute_display(items)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Scan { targets } => {
                self.execute_scan(targets)?;
                Ok(ControlFlow::Normal)
            }
        }
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<ControlFlow, RuntimeError> {
        for statement in statements {
            match self.execute_statement(statement)? {
                ControlFlow::BreakSwitch => return Ok(ControlFlow::BreakSwitch),
                ControlFlow::Normal => {}
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn execute_switch(
        &mut self,
        subject: &Expr,
        cases: &[SwitchCase],
        default: Option<&[Stmt]>,
    ) -> Result<ControlFlow, RuntimeError> {
        let subject_value = self.evaluate(subject)?;

        // A DEFAULT block must end in BREAK. Definition errors do not depend
        // on which case matches, so this is checked up front.
        if let Some(default_body) = default {
            if !matches!(default_body.last(), Some(Stmt::Break)) {
                return Err(RuntimeError::missing_break_on_default_at(subject.span));
            }
        }

        'cases: for case in cases {
            let case_value = self.evaluate(&case.value)?;
            if std::mem::discriminant(&case_value) != std::mem::discriminant(&subject_value) {
                return Err(RuntimeError::invalid_case_type_at(
                    subject_value.type_name(),
                    case_value.type_name(),
                    case.value.span,
                ));
            }
            if case_value == subject_value {
                match self.execute_block(&case.body)? {
                    ControlFlow::BreakSwitch => return Ok(ControlFlow::Normal),
                    // A matching case without BREAK falls through to the
                    // default block, not to the next case.
                    ControlFlow::Normal => break 'cases,
                }
            }
        }

        if let Some(default_body) = default {
            self.execute_block(default_body)?;
        }
        Ok(ControlFlow::Normal)
    }

    fn execute_display(&mut self, items: &[DisplayItem]) -> Result<(), RuntimeError> {
        let mut rendered = String::new();
        for item in items {
            match item {
                DisplayItem::Literal(text) => rendered.push_str(text),
                DisplayItem::LineBreak => rendered.push('\n'),
                DisplayItem::Expr(expr) => {
                    let value = self.evaluate(expr)?;
                    rendered.push_str(&format::render_value(&value));
                }
            }
        }
        rendered.push('\n');
        let _ = self.output.write_all(rendered.as_bytes());
        let _ = self.output.flush();
        Ok(())
    }

    fn execute_scan(&mut self, targets: &[Rc<str>]) -> Result<(), RuntimeError> {
        for target in targets {
            let declared = self.env.declared_type(target)?;
            let _ = self.output.flush();
            let mut line = String::new();
            let bytes_read = self.input.read_line(&mut line).unwrap_or(0);
            if bytes_read == 0 {
                return Err(RuntimeError::invalid_conversion("end of input", declared));
            }
            let raw = line.trim_end_matches('\n').trim_end_matches('\r');
            match format::parse_input(raw, declared) {
                Some(value) => self.env.assign(target, value)?,
                None => return Err(RuntimeError::invalid_conversion(raw, declared)),
            }
        }
        Ok(())
    }

    fn evaluate_condition(&mut self, condition: &Expr) -> Result<bool, RuntimeError> {
        let value = self.evaluate(condition)?;
        value.as_bool().ok_or_else(|| {
            RuntimeError::type_mismatch_at(
                format!("condition must be BOOL, found {}", value.type_name()),
                condition.span,
            )
        })
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Identifier(name) => self
                .env
                .get(name)
                .map_err(|error| error.at(expr.span)),
            ExprKind::Grouped(inner) => self.evaluate(inner),
            ExprKind::Unary { op, expr: operand } => {
                let value = self.evaluate(operand)?;
                eval_unary_op(*op, &value, expr.span)
            }
            ExprKind::Binary { left, op, right } => {
                let left_value = self.evaluate(left)?;
                let right_value = self.evaluate(right)?;
                eval_binary_op(&left_value, *op, &right_value, expr.span)
            }
        }
    }
}

fn eval_binary_op(
    left: &Value,
    op: BinaryOp,
    right: &Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            eval_arithmetic(left, op, right, span)
        }
        BinaryOp::Concat => eval_concat(left, right, span),
        BinaryOp::ConcatLine => eval_concat_line(left, right, span),
        BinaryOp::Eq
        | BinaryOp::NotEq
        | BinaryOp::Greater
        | BinaryOp::Less
        | BinaryOp::GreaterEq
        | BinaryOp::LessEq => eval_comparison(left, op, right, span),
        BinaryOp::And | BinaryOp::Or => eval_logical(left, op, right, span),
    }
}

fn eval_arithmetic(
    left: &Value,
    op: BinaryOp,
    right: &Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(left_int), Value::Int(right_int)) => match op {
            BinaryOp::Add => Ok(Value::Int(left_int.wrapping_add(*right_int))),
            BinaryOp::Sub => Ok(Value::Int(left_int.wrapping_sub(*right_int))),
            BinaryOp::Mul => Ok(Value::Int(left_int.wrapping_mul(*right_int))),
            BinaryOp::Div => {
                if *right_int == 0 {
                    Err(RuntimeError::division_by_zero_at(span))
                } else {
                    Ok(Value::Int(left_int.wrapping_div(*right_int)))
                }
            }
            BinaryOp::Mod => {
                if *right_int == 0 {
                    Err(RuntimeError::division_by_zero_at(span))
                } else {
                    Ok(Value::Int(left_int.wrapping_rem(*right_int)))
                }
            }
            _ => Err(unexpected_op(op, span)),
        },
        (Value::Float(left_float), Value::Float(right_float)) => {
            eval_float_arithmetic(*left_float, op, *right_float, span)
        }
        (Value::Int(left_int), Value::Float(right_float)) => {
            eval_float_arithmetic(*left_int as f32, op, *right_float, span)
        }
        (Value::Float(left_float), Value::Int(right_int)) => {
            eval_float_arithmetic(*left_float, op, *right_int as f32, span)
        }
        (Value::Str(text), Value::Int(number)) => {
            eval_text_arithmetic(text, op, *number, true, span)
        }
        (Value::Int(number), Value::Str(text)) => {
            eval_text_arithmetic(text, op, *number, false, span)
        }
        (Value::Absent, _) | (_, Value::Absent) => {
            Err(RuntimeError::absent_operand_at(op.symbol(), span))
        }
        _ => Err(operand_mismatch(left, op, right, span)),
    }
}

fn eval_float_arithmetic(
    left: f32,
    op: BinaryOp,
    right: f32,
    span: Span,
) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => Ok(Value::Float(left + right)),
        BinaryOp::Sub => Ok(Value::Float(left - right)),
        BinaryOp::Mul => Ok(Value::Float(left * right)),
        BinaryOp::Div => {
            if right == 0.0 {
                Err(RuntimeError::division_by_zero_at(span))
            } else {
                Ok(Value::Float(left / right))
            }
        }
        BinaryOp::Mod => Err(RuntimeError::type_mismatch_at(
            "'%' is not defined for FLOAT operands",
            span,
        )),
        _ => Err(unexpected_op(op, span)),
    }
}

/// Lenient numeric-prefix arithmetic for a STRING paired with an INT: the
/// text's leading digit run takes part in the arithmetic in its source
/// position and the non-digit remainder is concatenated with the result.
fn eval_text_arithmetic(
    text: &str,
    op: BinaryOp,
    number: i32,
    text_on_left: bool,
    span: Span,
) -> Result<Value, RuntimeError> {
    if op == BinaryOp::Mod {
        return Err(RuntimeError::type_mismatch_at(
            "'%' is not defined for STRING operands",
            span,
        ));
    }
    // A zero divisor fails before any string-prefix reinterpretation.
    if op == BinaryOp::Div && text_on_left && number == 0 {
        return Err(RuntimeError::division_by_zero_at(span));
    }

    let digit_len = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digit_len == 0 {
        return match op {
            BinaryOp::Add => {
                let joined = if text_on_left {
                    format!("{}{}", text, number)
                } else {
                    format!("{}{}", number, text)
                };
                Ok(Value::Str(Rc::from(joined)))
            }
            _ => Err(RuntimeError::type_mismatch_at(
                format!("cannot apply '{}' to STRING and INT", op.symbol()),
                span,
            )),
        };
    }

    let (digits, remainder) = text.split_at(digit_len);
    let prefix: i32 = digits.parse().map_err(|_| {
        RuntimeError::invalid_conversion_at(digits, crate::ast::DeclaredType::Int, span)
    })?;

    let (left_num, right_num) = if text_on_left {
        (prefix, number)
    } else {
        (number, prefix)
    };
    if op == BinaryOp::Div && right_num == 0 {
        return Err(RuntimeError::division_by_zero_at(span));
    }
    let combined = match op {
        BinaryOp::Add => left_num.wrapping_add(right_num),
        BinaryOp::Sub => left_num.wrapping_sub(right_num),
        BinaryOp::Mul => left_num.wrapping_mul(right_num),
        BinaryOp::Div => left_num.wrapping_div(right_num),
        _ => return Err(unexpected_op(op, span)),
    };
    Ok(Value::Str(Rc::from(format!("{}{}", remainder, combined))))
}

fn eval_concat(left: &Value, right: &Value, span: Span) -> Result<Value, RuntimeError> {
    if left.is_absent() || right.is_absent() {
        return Err(RuntimeError::absent_operand_at("&", span));
    }
    if !concat_pair_is_legal(left, right) {
        return Err(operand_mismatch(left, BinaryOp::Concat, right, span));
    }
    Ok(Value::Str(Rc::from(format!(
        "{}{}",
        format::render_value(left),
        format::render_value(right)
    ))))
}

fn eval_concat_line(left: &Value, right: &Value, span: Span) -> Result<Value, RuntimeError> {
    // `$` is the one operator a valueless operand may reach: the absent side
    // renders as nothing around the line break.
    let legal = left.is_absent() || right.is_absent() || concat_pair_is_legal(left, right);
    if !legal {
        return Err(operand_mismatch(left, BinaryOp::ConcatLine, right, span));
    }
    Ok(Value::Str(Rc::from(format!(
        "{}\n{}",
        format::render_value(left),
        format::render_value(right)
    ))))
}

fn concat_pair_is_legal(left: &Value, right: &Value) -> bool {
    matches!(
        (left, right),
        (Value::Str(_), _)
            | (_, Value::Str(_))
            | (
                Value::Int(_) | Value::Float(_),
                Value::Int(_) | Value::Float(_)
            )
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Char(_), Value::Char(_))
    )
}

fn eval_comparison(
    left: &Value,
    op: BinaryOp,
    right: &Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    if left.is_absent() || right.is_absent() {
        return Err(RuntimeError::absent_operand_at(op.symbol(), span));
    }
    let outcome = match (left, right) {
        (Value::Int(left_int), Value::Int(right_int)) => ordered(left_int, op, right_int),
        (Value::Float(left_float), Value::Float(right_float)) => {
            ordered(left_float, op, right_float)
        }
        // Mixed numeric pairs compare as float.
        (Value::Int(left_int), Value::Float(right_float)) => {
            ordered(&(*left_int as f32), op, right_float)
        }
        (Value::Float(left_float), Value::Int(right_int)) => {
            ordered(left_float, op, &(*right_int as f32))
        }
        (Value::Bool(left_bool), Value::Bool(right_bool)) => {
            if op.is_ordering() {
                return Err(RuntimeError::type_mismatch_at(
                    format!("'{}' is not defined for BOOL operands", op.symbol()),
                    span,
                ));
            }
            ordered(left_bool, op, right_bool)
        }
        (Value::Char(left_char), Value::Char(right_char)) => {
            if op.is_ordering() {
                return Err(RuntimeError::type_mismatch_at(
                    format!("'{}' is not defined for CHAR operands", op.symbol()),
                    span,
                ));
            }
            ordered(left_char, op, right_char)
        }
        _ => return Err(operand_mismatch(left, op, right, span)),
    };
    match outcome {
        Some(result) => Ok(Value::Bool(result)),
        None => Err(unexpected_op(op, span)),
    }
}

fn ordered<T: PartialOrd>(left: &T, op: BinaryOp, right: &T) -> Option<bool> {
    match op {
        BinaryOp::Eq => Some(left == right),
        BinaryOp::NotEq => Some(left != right),
        BinaryOp::Greater => Some(left > right),
        BinaryOp::Less => Some(left < right),
        BinaryOp::GreaterEq => Some(left >= right),
        BinaryOp::LessEq => Some(left <= right),
        _ => None,
    }
}

fn eval_logical(
    left: &Value,
    op: BinaryOp,
    right: &Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    if left.is_absent() || right.is_absent() {
        return Err(RuntimeError::absent_operand_at(op.symbol(), span));
    }
    match (left.as_bool(), right.as_bool()) {
        (Some(left_bool), Some(right_bool)) => Ok(Value::Bool(match op {
            BinaryOp::And => left_bool && right_bool,
            _ => left_bool || right_bool,
        })),
        _ => Err(operand_mismatch(left, op, right, span)),
    }
}

fn eval_unary_op(op: UnaryOp, value: &Value, span: Span) -> Result<Value, RuntimeError> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(bool_value)) => Ok(Value::Bool(!bool_value)),
        (UnaryOp::Neg, Value::Int(numeric_value)) => Ok(Value::Int(numeric_value.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(numeric_value)) => Ok(Value::Float(-numeric_value)),
        (UnaryOp::Plus, Value::Int(_) | Value::Float(_)) => Ok(value.clone()),
        (_, Value::Absent) => Err(RuntimeError::absent_operand_at(op.symbol(), span)),
        _ => Err(RuntimeError::type_mismatch_at(
            format!("cannot apply '{}' to {}", op.symbol(), value.type_name()),
            span,
        )),
    }
}

fn operand_mismatch(left: &Value, op: BinaryOp, right: &Value, span: Span) -> RuntimeError {
    RuntimeError::type_mismatch_at(
        format!(
            "cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
        span,
    )
}

fn unexpected_op(op: BinaryOp, span: Span) -> RuntimeError {
    RuntimeError::unknown_operator(format!("'{}' dispatched to the wrong handler", op.symbol()))
        .at(span)
}

/// Lexes and parses a source text into a program, reporting the first
/// problem as a plain string.
pub fn parse_program(source: &str) -> Result<Program, String> {
    let tokens = crate::lexer::lexer()
        .parse(source)
        .into_output()
        .ok_or_else(|| "failed to tokenize input".to_string())?;
    TokenParser::from_lexer_output(tokens, source.len()).parse()
}

/// Like [`parse_program`] but keeps structured diagnostics for rendering.
pub fn parse_with_diagnostics(source: &str) -> Result<Program, Vec<Diagnostic>> {
    let tokens = match crate::lexer::lexer().parse(source).into_output() {
        Some(tokens) => tokens,
        None => {
            return Err(vec![Diagnostic::error("failed to tokenize input")
                .with_code("E0001")]);
        }
    };

    let mut parser = TokenParser::from_lexer_output(tokens, source.len());
    let result = parser.parse_with_errors();
    if !result.errors.is_empty() {
        return Err(result
            .errors
            .iter()
            .map(|error| error.to_diagnostic())
            .collect());
    }
    match result.program {
        Some(program) => Ok(program),
        None => Err(vec![Diagnostic::error("no program found").with_code("E0001")]),
    }
}

/// The observable outcome of a run: everything the program displayed plus
/// the recoverable errors recorded along the way.
#[derive(Debug)]
pub struct RunOutcome {
    pub output: String,
    pub errors: Vec<RuntimeError>,
}

/// Parses and executes a program against a captured input, returning the
/// captured output. A parse failure or fatal runtime error is the `Err` case.
pub fn parse_and_run(source: &str, input: &str) -> Result<RunOutcome, String> {
    let program = parse_program(source)?;

    let mut captured = Vec::new();
    let run_result;
    let errors;
    {
        let mut interpreter = Interpreter::with_io(input.as_bytes(), &mut captured);
        run_result = interpreter.run(&program);
        errors = interpreter.take_errors();
    }
    let output = String::from_utf8_lossy(&captured).into_owned();

    match run_result {
        Ok(()) => Ok(RunOutcome { output, errors }),
        Err(fatal) => Err(format!("Runtime error: {}", fatal)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(value: i32) -> Value {
        Value::Int(value)
    }

    fn float(value: f32) -> Value {
        Value::Float(value)
    }

    fn text(value: &str) -> Value {
        Value::Str(Rc::from(value))
    }

    fn binary(left: Value, op: BinaryOp, right: Value) -> Result<Value, RuntimeError> {
        eval_binary_op(&left, op, &right, Span::dummy())
    }

    #[test]
    fn test_integer_division_truncates_toward_zero() {
        assert_eq!(binary(int(-7), BinaryOp::Div, int(2)).unwrap(), int(-3));
        assert_eq!(binary(int(7), BinaryOp::Div, int(2)).unwrap(), int(3));
        assert_eq!(binary(int(-7), BinaryOp::Mod, int(2)).unwrap(), int(-1));
    }

    #[test]
    fn test_mixed_numeric_promotes_to_float() {
        assert_eq!(
            binary(int(1), BinaryOp::Add, float(0.5)).unwrap(),
            float(1.5)
        );
        assert_eq!(
            binary(float(3.0), BinaryOp::Mul, int(2)).unwrap(),
            float(6.0)
        );
    }

    #[test]
    fn test_modulo_rejects_floats() {
        let err = binary(float(3.0), BinaryOp::Mod, int(2)).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
        let err = binary(int(3), BinaryOp::Mod, float(2.0)).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_division_by_zero_for_int_and_float() {
        assert!(matches!(
            binary(int(1), BinaryOp::Div, int(0)).unwrap_err(),
            RuntimeError::DivisionByZero { .. }
        ));
        assert!(matches!(
            binary(float(1.0), BinaryOp::Div, float(0.0)).unwrap_err(),
            RuntimeError::DivisionByZero { .. }
        ));
        assert!(matches!(
            binary(int(5), BinaryOp::Mod, int(0)).unwrap_err(),
            RuntimeError::DivisionByZero { .. }
        ));
    }

    #[test]
    fn test_concat_renders_display_forms() {
        assert_eq!(
            binary(int(1), BinaryOp::Concat, int(2)).unwrap(),
            text("12")
        );
        assert_eq!(
            binary(Value::Bool(true), BinaryOp::Concat, Value::Bool(false)).unwrap(),
            text("TRUEFALSE")
        );
        assert_eq!(
            binary(text("pi="), BinaryOp::Concat, float(3.0)).unwrap(),
            text("pi=3.0")
        );
    }

    #[test]
    fn test_concat_rejects_unlisted_pairs() {
        let err = binary(int(1), BinaryOp::Concat, Value::Bool(true)).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
        let err = binary(Value::Char('a'), BinaryOp::Concat, int(1)).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_concat_line_embeds_newline() {
        assert_eq!(
            binary(int(1), BinaryOp::ConcatLine, int(2)).unwrap(),
            text("1\n2")
        );
    }

    #[test]
    fn test_concat_line_accepts_absent_operand() {
        assert_eq!(
            binary(int(7), BinaryOp::ConcatLine, Value::Absent).unwrap(),
            text("7\n")
        );
        assert_eq!(
            binary(Value::Absent, BinaryOp::ConcatLine, text("x")).unwrap(),
            text("\nx")
        );
    }

    #[test]
    fn test_absent_operand_is_fatal_outside_concat_line() {
        let err = binary(Value::Absent, BinaryOp::Add, int(1)).unwrap_err();
        assert!(matches!(err, RuntimeError::AbsentOperand { .. }));
        assert!(err.is_fatal());
        let err = binary(int(1), BinaryOp::Concat, Value::Absent).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_text_arithmetic_with_digit_prefix() {
        assert_eq!(
            binary(text("12ab"), BinaryOp::Add, int(3)).unwrap(),
            text("ab15")
        );
        assert_eq!(
            binary(text("12ab"), BinaryOp::Sub, int(2)).unwrap(),
            text("ab10")
        );
        // The integer operand keeps its source position.
        assert_eq!(
            binary(int(20), BinaryOp::Sub, text("12ab")).unwrap(),
            text("ab8")
        );
    }

    #[test]
    fn test_text_arithmetic_without_digits_falls_back_for_add_only() {
        assert_eq!(
            binary(text("ab"), BinaryOp::Add, int(3)).unwrap(),
            text("ab3")
        );
        assert_eq!(
            binary(int(3), BinaryOp::Add, text("ab")).unwrap(),
            text("3ab")
        );
        assert!(binary(text("ab"), BinaryOp::Sub, int(3)).is_err());
        assert!(binary(text("ab"), BinaryOp::Mul, int(3)).is_err());
        assert!(binary(text("ab"), BinaryOp::Div, int(3)).is_err());
    }

    #[test]
    fn test_text_division_by_zero() {
        assert!(matches!(
            binary(text("12ab"), BinaryOp::Div, int(0)).unwrap_err(),
            RuntimeError::DivisionByZero { .. }
        ));
        assert!(matches!(
            binary(int(5), BinaryOp::Div, text("0ab")).unwrap_err(),
            RuntimeError::DivisionByZero { .. }
        ));
    }

    #[test]
    fn test_comparison_numeric_mixed() {
        assert_eq!(
            binary(int(1), BinaryOp::Less, float(1.5)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            binary(float(2.0), BinaryOp::Eq, int(2)).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_comparison_bool_and_char_equality_only() {
        assert_eq!(
            binary(Value::Bool(true), BinaryOp::Eq, Value::Bool(true)).unwrap(),
            Value::Bool(true)
        );
        assert!(binary(Value::Bool(true), BinaryOp::Less, Value::Bool(false)).is_err());
        assert_eq!(
            binary(Value::Char('a'), BinaryOp::NotEq, Value::Char('b')).unwrap(),
            Value::Bool(true)
        );
        assert!(binary(Value::Char('a'), BinaryOp::Greater, Value::Char('b')).is_err());
    }

    #[test]
    fn test_comparison_rejects_text() {
        assert!(binary(text("a"), BinaryOp::Eq, text("a")).is_err());
        assert!(binary(text("1"), BinaryOp::Less, int(2)).is_err());
    }

    #[test]
    fn test_logical_requires_bools() {
        assert_eq!(
            binary(Value::Bool(true), BinaryOp::And, Value::Bool(false)).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            binary(Value::Bool(false), BinaryOp::Or, Value::Bool(true)).unwrap(),
            Value::Bool(true)
        );
        assert!(binary(int(1), BinaryOp::And, Value::Bool(true)).is_err());
    }

    #[test]
    fn test_unary_ops() {
        assert_eq!(
            eval_unary_op(UnaryOp::Neg, &int(5), Span::dummy()).unwrap(),
            int(-5)
        );
        assert_eq!(
            eval_unary_op(UnaryOp::Plus, &float(2.5), Span::dummy()).unwrap(),
            float(2.5)
        );
        assert_eq!(
            eval_unary_op(UnaryOp::Not, &Value::Bool(true), Span::dummy()).unwrap(),
            Value::Bool(false)
        );
        assert!(eval_unary_op(UnaryOp::Neg, &text("x"), Span::dummy()).is_err());
        assert!(eval_unary_op(UnaryOp::Not, &int(1), Span::dummy()).is_err());
    }

    #[test]
    fn test_run_while_summation() {
        let source = "BEGIN CODE\nINT x = 5\nINT y = 0\nWHILE (x > 0)\nBEGIN WHILE\ny = y + x\nx = x - 1\nEND WHILE\nDISPLAY: y\nEND CODE\n";
        let outcome = parse_and_run(source, "").unwrap();
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.output, "15\n");
    }

    #[test]
    fn test_run_records_error_and_continues() {
        let source = "BEGIN CODE\nINT x = 5\nINT x = 6\nDISPLAY: x\nEND CODE\n";
        let outcome = parse_and_run(source, "").unwrap();
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(
            outcome.errors[0],
            RuntimeError::AlreadyDeclared { .. }
        ));
        assert_eq!(outcome.output, "5\n");
    }
}
