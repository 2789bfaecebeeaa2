use chumsky::prelude::*;

use crate::token::Token;

/// Tokenizes CODE source. The language is line-oriented, so `\n` is a real
/// token while the rest of the whitespace (and `#` comments) is padding.
pub fn lexer<'a>()
-> impl Parser<'a, &'a str, Vec<(Token, SimpleSpan)>, extra::Err<Simple<'a, char>>> {
    let number = text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| {
            if s.contains('.') {
                Token::Float(s.parse().unwrap_or(f32::MAX))
            } else {
                Token::Int(s.parse().unwrap_or(i32::MAX))
            }
        });

    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('n').to('\n'),
        just('r').to('\r'),
        just('t').to('\t'),
    )));

    // "TRUE"/"FALSE" are the boolean literals of the language; the keyword is
    // case-insensitive, every other quoted run is a plain string.
    let string = just('"')
        .ignore_then(none_of("\\\"").or(escape).repeated().collect::<String>())
        .then_ignore(just('"'))
        .map(|s: String| {
            if s.eq_ignore_ascii_case("TRUE") {
                Token::Bool(true)
            } else if s.eq_ignore_ascii_case("FALSE") {
                Token::Bool(false)
            } else {
                Token::Str(s)
            }
        });

    let character = just('\'')
        .ignore_then(none_of("'"))
        .then_ignore(just('\''))
        .map(Token::Char);

    // `[...]` emits its content verbatim in a display list. `[]]` and `[[]`
    // are the escape spellings for a lone bracket.
    let bracketed = just('[')
        .ignore_then(choice((
            just("]]").to("]".to_string()),
            none_of("]")
                .repeated()
                .collect::<String>()
                .then_ignore(just(']')),
        )))
        .map(Token::Bracketed);

    let ident = text::ident().map(|s: &str| match s {
        "BEGIN" => Token::Begin,
        "END" => Token::End,
        "CODE" => Token::Code,
        "IF" => Token::If,
        "ELSE" => Token::Else,
        "WHILE" => Token::While,
        "SWITCH" => Token::Switch,
        "CASE" => Token::Case,
        "DEFAULT" => Token::Default,
        "BREAK" => Token::Break,
        "DISPLAY" => Token::Display,
        "SCAN" => Token::Scan,
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        "INT" => Token::IntType,
        "FLOAT" => Token::FloatType,
        "BOOL" => Token::BoolType,
        "CHAR" => Token::CharType,
        "STRING" => Token::StringType,
        _ => Token::Ident(s.to_string()),
    });

    let op_double = choice((
        just("==").to(Token::Eq),
        just("<>").to(Token::NotEq),
        just(">=").to(Token::GreaterEq),
        just("<=").to(Token::LessEq),
    ));

    let op_single = choice((
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('&').to(Token::Ampersand),
        just('$').to(Token::Dollar),
        just('>').to(Token::Greater),
        just('<').to(Token::Less),
        just('=').to(Token::Assign),
        just(',').to(Token::Comma),
        just(':').to(Token::Colon),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
    ));

    let op = op_double.or(op_single);

    let newline = just('\n').to(Token::Newline);

    let comment = just('#').then(none_of("\n").repeated()).ignored();
    let inline_ws = one_of(" \t\r").ignored();
    let padding = choice((inline_ws, comment)).repeated();

    let token = choice((newline, number, string, character, bracketed, ident, op))
        .map_with(|tok, e| (tok, e.span()))
        .padded_by(padding);

    token.repeated().collect().then_ignore(end())
}
