use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Begin,
    End,
    Code,
    If,
    Else,
    While,
    Switch,
    Case,
    Default,
    Break,
    Display,
    Scan,
    And,
    Or,
    Not,

    IntType,
    FloatType,
    BoolType,
    CharType,
    StringType,

    Ident(String),
    Int(i32),
    Float(f32),
    Bool(bool),
    Char(char),
    Str(String),
    /// A `[...]` run from a display list, content kept verbatim.
    Bracketed(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Ampersand,
    Dollar,
    Eq,
    NotEq,
    Greater,
    Less,
    GreaterEq,
    LessEq,
    Assign,
    Comma,
    Colon,
    LParen,
    RParen,
    Newline,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Begin => write!(f, "BEGIN"),
            Token::End => write!(f, "END"),
            Token::Code => write!(f, "CODE"),
            Token::If => write!(f, "IF"),
            Token::Else => write!(f, "ELSE"),
            Token::While => write!(f, "WHILE"),
            Token::Switch => write!(f, "SWITCH"),
            Token::Case => write!(f, "CASE"),
            Token::Default => write!(f, "DEFAULT"),
            Token::Break => write!(f, "BREAK"),
            Token::Display => write!(f, "DISPLAY"),
            Token::Scan => write!(f, "SCAN"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Not => write!(f, "NOT"),
            Token::IntType => write!(f, "INT"),
            Token::FloatType => write!(f, "FLOAT"),
            Token::BoolType => write!(f, "BOOL"),
            Token::CharType => write!(f, "CHAR"),
            Token::StringType => write!(f, "STRING"),
            Token::Ident(name) => write!(f, "identifier `{}`", name),
            Token::Int(n) => write!(f, "{}", n),
            Token::Float(v) => write!(f, "{}", v),
            Token::Bool(true) => write!(f, "\"TRUE\""),
            Token::Bool(false) => write!(f, "\"FALSE\""),
            Token::Char(c) => write!(f, "'{}'", c),
            Token::Str(s) => write!(f, "\"{}\"", s),
            Token::Bracketed(s) => write!(f, "[{}]", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Ampersand => write!(f, "&"),
            Token::Dollar => write!(f, "$"),
            Token::Eq => write!(f, "=="),
            Token::NotEq => write!(f, "<>"),
            Token::Greater => write!(f, ">"),
            Token::Less => write!(f, "<"),
            Token::GreaterEq => write!(f, ">="),
            Token::LessEq => write!(f, "<="),
            Token::Assign => write!(f, "="),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Newline => write!(f, "end of line"),
        }
    }
}
