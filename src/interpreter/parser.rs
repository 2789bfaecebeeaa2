use std::rc::Rc;

use crate::ast::{
    BinaryOp, DeclaredType, DisplayItem, Expr, ExprKind, IfBranch, Program, Stmt, SwitchCase,
    UnaryOp,
};
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub expected: Vec<String>,
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: Vec::new(),
            found: None,
        }
    }

    pub fn with_expected(mut self, expected: Vec<String>) -> Self {
        self.expected = expected;
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut message = self.message.clone();
        if !self.expected.is_empty() {
            message = format!("expected {}", self.expected.join(" or "));
            if let Some(found) = &self.found {
                message.push_str(&format!(", found {}", found));
            }
        }

        let mut diagnostic = Diagnostic::error(message)
            .with_code("E0101")
            .with_label(Label::primary(self.span, ""));

        if self.expected.len() == 1 {
            diagnostic = diagnostic.with_help(format!("expected {} here", self.expected[0]));
        }

        diagnostic
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.expected.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "expected {}", self.expected.join(" or "))?;
            if let Some(found) = &self.found {
                write!(f, ", found {}", found)?;
            }
            Ok(())
        }
    }
}

pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.program.is_some()
    }
}

/// Recursive-descent parser over the lexer's token stream. Owns the
/// `BEGIN CODE` / `END CODE` boundary check.
pub struct TokenParser {
    tokens: Vec<SpannedToken>,
    current: usize,
    errors: Vec<ParseError>,
    source_len: usize,
}

impl TokenParser {
    pub fn new(tokens: Vec<SpannedToken>, source_len: usize) -> Self {
        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
            source_len,
        }
    }

    pub fn from_lexer_output(
        tokens: Vec<(Token, chumsky::span::SimpleSpan)>,
        source_len: usize,
    ) -> Self {
        let spanned_tokens: Vec<SpannedToken> = tokens
            .into_iter()
            .map(|(token, span)| SpannedToken {
                token,
                span: Span::new(span.start, span.end),
            })
            .collect();
        Self::new(spanned_tokens, source_len)
    }

    pub fn parse(&mut self) -> Result<Program, String> {
        let result = self.parse_with_errors();
        match result.program {
            Some(program) if result.errors.is_empty() => Ok(program),
            _ => Err(result
                .errors
                .iter()
                .map(|error| error.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    pub fn parse_with_errors(&mut self) -> ParseResult {
        let program = self.parse_program();
        ParseResult {
            program,
            errors: std::mem::take(&mut self.errors),
        }
    }

    fn parse_program(&mut self) -> Option<Program> {
        self.skip_newlines();

        if !self.check(&Token::Begin) {
            self.add_error(ParseError::new("Missing BEGIN CODE", self.current_span()));
            return None;
        }
        self.advance();
        if let Err(error) = self.expect(Token::Code) {
            self.add_error(error);
            return None;
        }

        let statements = self.parse_statement_list(false, |token| matches!(token, Token::End));

        if !self.check(&Token::End) {
            self.add_error(ParseError::new("Missing END CODE", self.current_span()));
            return Some(Program { statements });
        }
        self.advance();
        if let Err(error) = self.expect(Token::Code) {
            self.add_error(error);
            return Some(Program { statements });
        }

        self.skip_newlines();
        if self.current_token().is_some() {
            self.add_error(ParseError::new(
                "END CODE must only be at the end of the program",
                self.current_span(),
            ));
        }

        Some(Program { statements })
    }

    /// Parses statements until the terminator predicate matches or the token
    /// stream runs out. Recovers from a bad statement by skipping to the
    /// next line.
    fn parse_statement_list(
        &mut self,
        allow_break: bool,
        is_end: fn(&Token) -> bool,
    ) -> Vec<Stmt> {
        let mut statements = Vec::new();
        loop {
            self.skip_newlines();
            match self.current_token() {
                None => break,
                Some(token) if is_end(token) => break,
                _ => {}
            }
            match self.parse_statement(allow_break) {
                Ok(statement) => {
                    statements.push(statement);
                    match self.current_token() {
                        None | Some(Token::Newline) => {}
                        Some(token) if is_end(token) => {}
                        Some(token) => {
                            let error = ParseError::new("unexpected token", self.current_span())
                                .with_expected(vec!["end of line".to_string()])
                                .with_found(token.to_string());
                            self.add_error(error);
                            self.synchronize();
                        }
                    }
                }
                Err(error) => {
                    self.add_error(error);
                    self.synchronize();
                }
            }
        }
        statements
    }

    fn parse_statement(&mut self, allow_break: bool) -> Result<Stmt, ParseError> {
        match self.current_token() {
            Some(
                Token::IntType
                | Token::FloatType
                | Token::BoolType
                | Token::CharType
                | Token::StringType,
            ) => self.parse_declaration(),
            Some(Token::Ident(_)) => self.parse_assignment(),
            Some(Token::If) => self.parse_if(allow_break),
            Some(Token::While) => self.parse_while(allow_break),
            Some(Token::Switch) => self.parse_switch(),
            Some(Token::Display) => self.parse_display(),
            Some(Token::Scan) => self.parse_scan(),
            Some(Token::Break) if allow_break => {
                self.advance();
                Ok(Stmt::Break)
            }
            Some(Token::Break) => Err(ParseError::new(
                "BREAK is only allowed inside a CASE or DEFAULT block",
                self.current_span(),
            )),
            Some(token) => Err(ParseError::new("unexpected token", self.current_span())
                .with_expected(vec!["a statement".to_string()])
                .with_found(token.to_string())),
            None => Err(ParseError::new(
                "unexpected end of input",
                self.current_span(),
            )
            .with_expected(vec!["a statement".to_string()])),
        }
    }

    fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        let declared = match self.current_token() {
            Some(Token::IntType) => DeclaredType::Int,
            Some(Token::FloatType) => DeclaredType::Float,
            Some(Token::BoolType) => DeclaredType::Bool,
            Some(Token::CharType) => DeclaredType::Char,
            Some(Token::StringType) => DeclaredType::Str,
            _ => unreachable!("caller checked for a type keyword"),
        };
        self.advance();

        let mut names = vec![self.expect_ident()?];
        while self.check(&Token::Comma) {
            self.advance();
            names.push(self.expect_ident()?);
        }

        let initializer = if self.check(&Token::Assign) {
            self.advance();
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Stmt::Declare {
            declared,
            names,
            initializer,
        })
    }

    fn parse_assignment(&mut self) -> Result<Stmt, ParseError> {
        let mut targets = vec![self.expect_ident()?];
        while self.check(&Token::Comma) {
            self.advance();
            targets.push(self.expect_ident()?);
        }
        self.expect(Token::Assign)?;
        let value = self.parse_expression()?;
        Ok(Stmt::Assign { targets, value })
    }

    fn parse_if(&mut self, allow_break: bool) -> Result<Stmt, ParseError> {
        self.expect(Token::If)?;
        let condition = self.parse_parenthesized_condition()?;
        let body = self.parse_marked_block(Token::If, allow_break)?;

        let mut branches = vec![IfBranch { condition, body }];
        let mut else_body = None;

        loop {
            let checkpoint = self.current;
            self.skip_newlines();
            if !self.check(&Token::Else) {
                self.current = checkpoint;
                break;
            }
            self.advance();
            if self.check(&Token::If) {
                self.advance();
                let condition = self.parse_parenthesized_condition()?;
                let body = self.parse_marked_block(Token::If, allow_break)?;
                branches.push(IfBranch { condition, body });
            } else {
                // A plain ELSE reuses the BEGIN IF / END IF markers.
                else_body = Some(self.parse_marked_block(Token::If, allow_break)?);
                break;
            }
        }

        Ok(Stmt::If {
            branches,
            else_body,
        })
    }

    fn parse_while(&mut self, allow_break: bool) -> Result<Stmt, ParseError> {
        self.expect(Token::While)?;
        let condition = self.parse_parenthesized_condition()?;
        let body = self.parse_marked_block(Token::While, allow_break)?;
        Ok(Stmt::While { condition, body })
    }

    fn parse_switch(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::Switch)?;
        let subject = self.parse_parenthesized_condition()?;

        self.skip_newlines();
        self.expect(Token::Begin)?;
        self.expect(Token::Switch)?;

        let mut cases = Vec::new();
        let mut default: Option<Vec<Stmt>> = None;

        loop {
            self.skip_newlines();
            match self.current_token() {
                Some(Token::Case) => {
                    self.advance();
                    let value = self.parse_expression()?;
                    self.expect(Token::Colon)?;
                    let body = self.parse_statement_list(true, |token| {
                        matches!(token, Token::Case | Token::Default | Token::End)
                    });
                    cases.push(SwitchCase { value, body });
                }
                Some(Token::Default) => {
                    if default.is_some() {
                        return Err(ParseError::new(
                            "SWITCH may have at most one DEFAULT block",
                            self.current_span(),
                        ));
                    }
                    self.advance();
                    self.expect(Token::Colon)?;
                    let body = self.parse_statement_list(true, |token| {
                        matches!(token, Token::Case | Token::Default | Token::End)
                    });
                    default = Some(body);
                }
                Some(Token::End) => break,
                Some(token) => {
                    return Err(ParseError::new("unexpected token", self.current_span())
                        .with_expected(vec![
                            "CASE".to_string(),
                            "DEFAULT".to_string(),
                            "END SWITCH".to_string(),
                        ])
                        .with_found(token.to_string()));
                }
                None => {
                    return Err(ParseError::new(
                        "unexpected end of input",
                        self.current_span(),
                    )
                    .with_expected(vec!["END SWITCH".to_string()]));
                }
            }
        }

        self.expect(Token::End)?;
        self.expect(Token::Switch)?;

        Ok(Stmt::Switch {
            subject,
            cases,
            default,
        })
    }

    fn parse_display(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::Display)?;
        self.expect(Token::Colon)?;

        let mut items = Vec::new();
        loop {
            match self.current_token() {
                None | Some(Token::Newline) => break,
                Some(token) if matches!(token, Token::End) => break,
                Some(Token::Bracketed(text)) => {
                    items.push(DisplayItem::Literal(text.clone()));
                    self.advance();
                }
                Some(Token::Dollar) => {
                    items.push(DisplayItem::LineBreak);
                    self.advance();
                }
                Some(Token::Ampersand) => {
                    // Item separator; adjacency does the concatenation.
                    self.advance();
                }
                _ => {
                    let expr = self.parse_display_expression()?;
                    items.push(DisplayItem::Expr(expr));
                }
            }
        }

        Ok(Stmt::Display { items })
    }

    fn parse_scan(&mut self) -> Result<Stmt, ParseError> {
        self.expect(Token::Scan)?;
        self.expect(Token::Colon)?;
        let mut targets = vec![self.expect_ident()?];
        while self.check(&Token::Comma) {
            self.advance();
            targets.push(self.expect_ident()?);
        }
        Ok(Stmt::Scan { targets })
    }

    fn parse_parenthesized_condition(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen)?;
        Ok(condition)
    }

    /// Parses `BEGIN <marker>` … `END <marker>` with the enclosed statement
    /// list, e.g. `BEGIN WHILE` … `END WHILE`.
    fn parse_marked_block(
        &mut self,
        marker: Token,
        allow_break: bool,
    ) -> Result<Vec<Stmt>, ParseError> {
        self.skip_newlines();
        self.expect(Token::Begin)?;
        self.expect(marker.clone())?;
        let statements = self.parse_statement_list(allow_break, |token| matches!(token, Token::End));
        self.expect(Token::End)?;
        self.expect(marker)?;
        Ok(statements)
    }

    // === Expressions ===
    //
    // Five tiers, lowest to highest: logical -> comparison -> additive and
    // concatenation -> multiplicative -> unary -> atoms. Display items parse
    // with `allow_concat` off so a top-level `&`/`$` stays list structure.

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical(true)
    }

    fn parse_display_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical(false)
    }

    fn parse_logical(&mut self, allow_concat: bool) -> Result<Expr, ParseError> {
        let mut left = self.parse_logical_unary(allow_concat)?;
        loop {
            let op = match self.current_token() {
                Some(Token::And) => BinaryOp::And,
                Some(Token::Or) => BinaryOp::Or,
                _ => break,
            };
            self.advance();
            let right = self.parse_logical_unary(allow_concat)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_logical_unary(&mut self, allow_concat: bool) -> Result<Expr, ParseError> {
        if self.check(&Token::Not) {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_logical_unary(allow_concat)?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    expr: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison(allow_concat)
    }

    fn parse_comparison(&mut self, allow_concat: bool) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive(allow_concat)?;
        loop {
            let op = match self.current_token() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::NotEq,
                Some(Token::Greater) => BinaryOp::Greater,
                Some(Token::Less) => BinaryOp::Less,
                Some(Token::GreaterEq) => BinaryOp::GreaterEq,
                Some(Token::LessEq) => BinaryOp::LessEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive(allow_concat)?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_additive(&mut self, allow_concat: bool) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.current_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                Some(Token::Ampersand) if allow_concat => BinaryOp::Concat,
                Some(Token::Dollar) if allow_concat => BinaryOp::ConcatLine,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.current_token() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let span = left.span.merge(right.span);
            left = Expr::new(
                ExprKind::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current_token() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.current_span();
            self.advance();
            let operand = self.parse_unary()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    expr: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let span = self.current_span();
        match self.current_token().cloned() {
            Some(Token::Int(value)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Value::Int(value)), span))
            }
            Some(Token::Float(value)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Value::Float(value)), span))
            }
            Some(Token::Bool(value)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Value::Bool(value)), span))
            }
            Some(Token::Char(value)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Value::Char(value)), span))
            }
            Some(Token::Str(value)) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Value::Str(Rc::from(value.as_str()))),
                    span,
                ))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Identifier(Rc::from(name.as_str())),
                    span,
                ))
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                let close = self.expect(Token::RParen)?;
                Ok(Expr::new(
                    ExprKind::Grouped(Box::new(inner)),
                    span.merge(close),
                ))
            }
            Some(token) => Err(ParseError::new("unexpected token", span)
                .with_expected(vec!["an expression".to_string()])
                .with_found(token.to_string())),
            None => Err(ParseError::new("unexpected end of input", span)
                .with_expected(vec!["an expression".to_string()])),
        }
    }

    // === Token plumbing ===

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current).map(|spanned| &spanned.token)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.current)
            .map(|spanned| spanned.span)
            .unwrap_or_else(|| Span::new(self.source_len, self.source_len))
    }

    fn advance(&mut self) -> Option<SpannedToken> {
        if self.current < self.tokens.len() {
            let spanned = self.tokens[self.current].clone();
            self.current += 1;
            Some(spanned)
        } else {
            None
        }
    }

    fn check(&self, expected: &Token) -> bool {
        self.current_token()
            .is_some_and(|token| std::mem::discriminant(token) == std::mem::discriminant(expected))
    }

    fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        match self.current_token() {
            Some(token)
                if std::mem::discriminant(token) == std::mem::discriminant(&expected) =>
            {
                let span = self.current_span();
                self.advance();
                Ok(span)
            }
            Some(token) => Err(ParseError::new("unexpected token", self.current_span())
                .with_expected(vec![expected.to_string()])
                .with_found(token.to_string())),
            None => Err(
                ParseError::new("unexpected end of input", self.current_span())
                    .with_expected(vec![expected.to_string()]),
            ),
        }
    }

    fn expect_ident(&mut self) -> Result<Rc<str>, ParseError> {
        match self.current_token() {
            Some(Token::Ident(name)) => {
                let name = Rc::from(name.as_str());
                self.advance();
                Ok(name)
            }
            Some(token) => Err(ParseError::new("unexpected token", self.current_span())
                .with_expected(vec!["an identifier".to_string()])
                .with_found(token.to_string())),
            None => Err(
                ParseError::new("unexpected end of input", self.current_span())
                    .with_expected(vec!["an identifier".to_string()]),
            ),
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&Token::Newline) {
            self.advance();
        }
    }

    fn add_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Skips to the start of the next line, stopping early at block structure
    /// so enclosing parsers can resynchronize.
    fn synchronize(&mut self) {
        while let Some(token) = self.current_token() {
            match token {
                Token::Newline => {
                    self.advance();
                    return;
                }
                Token::End | Token::Else | Token::Case | Token::Default => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chumsky::Parser as _;

    fn parse_source(source: &str) -> Result<Program, String> {
        let tokens = crate::lexer::lexer()
            .parse(source)
            .into_output()
            .ok_or_else(|| "lexer failed".to_string())?;
        TokenParser::from_lexer_output(tokens, source.len()).parse()
    }

    #[test]
    fn test_empty_program_parses() {
        let program = parse_source("BEGIN CODE\nEND CODE\n").unwrap();
        assert!(program.statements.is_empty());
    }

    #[test]
    fn test_missing_begin_code() {
        let err = parse_source("INT x = 5\nEND CODE\n").unwrap_err();
        assert!(err.contains("Missing BEGIN CODE"));
    }

    #[test]
    fn test_missing_end_code() {
        let err = parse_source("BEGIN CODE\nINT x = 5\n").unwrap_err();
        assert!(err.contains("Missing END CODE"));
    }

    #[test]
    fn test_content_after_end_code_is_rejected() {
        let err = parse_source("BEGIN CODE\nEND CODE\nINT x = 5\n").unwrap_err();
        assert!(err.contains("END CODE must only be at the end"));
    }

    #[test]
    fn test_declaration_with_multiple_names() {
        let program = parse_source("BEGIN CODE\nINT x, y, z = 5\nEND CODE\n").unwrap();
        match &program.statements[0] {
            Stmt::Declare {
                declared,
                names,
                initializer,
            } => {
                assert_eq!(*declared, DeclaredType::Int);
                assert_eq!(names.len(), 3);
                assert!(initializer.is_some());
            }
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_target_assignment() {
        let program = parse_source("BEGIN CODE\nINT x, y\nx, y = 4\nEND CODE\n").unwrap();
        match &program.statements[1] {
            Stmt::Assign { targets, .. } => assert_eq!(targets.len(), 2),
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_if_else_chain() {
        let source = "BEGIN CODE\nINT x = 1\nIF (x > 0)\nBEGIN IF\nDISPLAY: x\nEND IF\nELSE IF (x < 0)\nBEGIN IF\nDISPLAY: [neg]\nEND IF\nELSE\nBEGIN IF\nDISPLAY: [zero]\nEND IF\nEND CODE\n";
        let program = parse_source(source).unwrap();
        match &program.statements[1] {
            Stmt::If {
                branches,
                else_body,
            } => {
                assert_eq!(branches.len(), 2);
                assert!(else_body.is_some());
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_switch_with_cases_and_default() {
        let source = "BEGIN CODE\nINT x = 2\nSWITCH (x)\nBEGIN SWITCH\nCASE 1:\nDISPLAY: [one]\nBREAK\nCASE 2:\nDISPLAY: [two]\nBREAK\nDEFAULT:\nDISPLAY: [other]\nBREAK\nEND SWITCH\nEND CODE\n";
        let program = parse_source(source).unwrap();
        match &program.statements[1] {
            Stmt::Switch { cases, default, .. } => {
                assert_eq!(cases.len(), 2);
                assert!(default.is_some());
                assert!(matches!(cases[0].body.last(), Some(Stmt::Break)));
            }
            other => panic!("expected switch, got {:?}", other),
        }
    }

    #[test]
    fn test_break_outside_switch_is_rejected() {
        let err = parse_source("BEGIN CODE\nBREAK\nEND CODE\n").unwrap_err();
        assert!(err.contains("BREAK is only allowed"));
    }

    #[test]
    fn test_display_items() {
        let program =
            parse_source("BEGIN CODE\nINT x = 1\nDISPLAY: [x is ] & x & $ & x + 1\nEND CODE\n")
                .unwrap();
        match &program.statements[1] {
            Stmt::Display { items } => {
                assert_eq!(items.len(), 4);
                assert!(matches!(&items[0], DisplayItem::Literal(s) if s == "x is "));
                assert!(matches!(items[1], DisplayItem::Expr(_)));
                assert!(matches!(items[2], DisplayItem::LineBreak));
                assert!(matches!(items[3], DisplayItem::Expr(_)));
            }
            other => panic!("expected display, got {:?}", other),
        }
    }

    #[test]
    fn test_display_parenthesized_concat_operator() {
        let program = parse_source("BEGIN CODE\nDISPLAY: (1 $ 2)\nEND CODE\n").unwrap();
        match &program.statements[0] {
            Stmt::Display { items } => {
                assert_eq!(items.len(), 1);
                match &items[0] {
                    DisplayItem::Expr(expr) => match &expr.kind {
                        ExprKind::Grouped(inner) => assert!(matches!(
                            inner.kind,
                            ExprKind::Binary {
                                op: BinaryOp::ConcatLine,
                                ..
                            }
                        )),
                        other => panic!("expected grouped expression, got {:?}", other),
                    },
                    other => panic!("expected expression item, got {:?}", other),
                }
            }
            other => panic!("expected display, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_logical_lowest() {
        // NOT binds over comparison, AND joins the comparisons.
        let program =
            parse_source("BEGIN CODE\nBOOL b = 1 < 2 AND NOT 2 < 1\nEND CODE\n").unwrap();
        match &program.statements[0] {
            Stmt::Declare {
                initializer: Some(expr),
                ..
            } => {
                assert!(matches!(
                    expr.kind,
                    ExprKind::Binary {
                        op: BinaryOp::And,
                        ..
                    }
                ));
            }
            other => panic!("expected declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_scan_targets() {
        let program = parse_source("BEGIN CODE\nINT x, y\nSCAN: x, y\nEND CODE\n").unwrap();
        match &program.statements[1] {
            Stmt::Scan { targets } => assert_eq!(targets.len(), 2),
            other => panic!("expected scan, got {:?}", other),
        }
    }

    #[test]
    fn test_error_recovery_continues_past_bad_line() {
        let source = "BEGIN CODE\nINT x = \nINT y = 2\nEND CODE\n";
        let tokens = crate::lexer::lexer().parse(source).into_output().unwrap();
        let mut parser = TokenParser::from_lexer_output(tokens, source.len());
        let result = parser.parse_with_errors();
        assert!(!result.errors.is_empty());
        let program = result.program.unwrap();
        assert_eq!(program.statements.len(), 1);
    }
}
