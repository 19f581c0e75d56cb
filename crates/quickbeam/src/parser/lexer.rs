//! Tokenizer for one line of script text, built on logos

use std::fmt;

use logos::Logos;

use crate::error::ParseError;

/// Raw token from logos, before literals are decoded.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    // === Comments (skip) ===
    #[regex(r"//[^\n]*")]
    LineComment,

    // === Literals ===
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    Str,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // === Operators, longest first ===
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Eq,
    #[token("!")]
    Bang,

    // === Punctuation ===
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or keyword
    Ident(String),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal, escapes already decoded
    Str(String),
    /// Operator symbol
    Op(&'static str),
    /// Punctuation character
    Punct(char),
}

impl Token {
    /// Whether this is the given punctuation character.
    pub fn is_punct(&self, c: char) -> bool {
        matches!(self, Token::Punct(p) if *p == c)
    }

    /// Whether this is the given identifier or keyword.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(self, Token::Ident(ident) if ident == name)
    }

    /// Whether this is the given operator.
    pub fn is_op(&self, op: &str) -> bool {
        matches!(self, Token::Op(o) if *o == op)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => f.write_str(name),
            Token::Int(i) => write!(f, "{i}"),
            Token::Float(x) => write!(f, "{x}"),
            Token::Str(s) => write!(f, "\"{s}\""),
            Token::Op(op) => f.write_str(op),
            Token::Punct(c) => write!(f, "{c}"),
        }
    }
}

/// Split one line of text into tokens.
///
/// # Errors
///
/// Fails on characters outside the language, numbers that do not fit, and
/// string literals left open at the end of the line.
pub fn tokenize(line: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = RawToken::lexer(line);

    while let Some(raw) = lexer.next() {
        let slice = lexer.slice();
        match raw {
            Ok(raw) => tokens.extend(convert_token(raw, slice)),
            Err(()) => return Err(lex_error(slice)),
        }
    }

    Ok(tokens)
}

fn lex_error(slice: &str) -> ParseError {
    match slice.chars().next() {
        Some('"') => ParseError::UnterminatedString,
        Some(c) if c.is_ascii_digit() => ParseError::InvalidNumber(slice.to_string()),
        Some(c) => ParseError::UnexpectedCharacter(c),
        None => ParseError::UnexpectedEnd,
    }
}

fn convert_token(raw: RawToken, slice: &str) -> Option<Token> {
    let token = match raw {
        RawToken::LineComment => return None,
        RawToken::Int(i) => Token::Int(i),
        RawToken::Float(x) => Token::Float(x),
        RawToken::Str => Token::Str(unescape_string(&slice[1..slice.len() - 1])),
        RawToken::Ident => Token::Ident(slice.to_string()),

        RawToken::EqEq => Token::Op("=="),
        RawToken::NotEq => Token::Op("!="),
        RawToken::LtEq => Token::Op("<="),
        RawToken::GtEq => Token::Op(">="),
        RawToken::AmpAmp => Token::Op("&&"),
        RawToken::PipePipe => Token::Op("||"),
        RawToken::PlusPlus => Token::Op("++"),
        RawToken::MinusMinus => Token::Op("--"),
        RawToken::PlusEq => Token::Op("+="),
        RawToken::MinusEq => Token::Op("-="),
        RawToken::StarEq => Token::Op("*="),
        RawToken::SlashEq => Token::Op("/="),
        RawToken::Plus => Token::Op("+"),
        RawToken::Minus => Token::Op("-"),
        RawToken::Star => Token::Op("*"),
        RawToken::Slash => Token::Op("/"),
        RawToken::Percent => Token::Op("%"),
        RawToken::Lt => Token::Op("<"),
        RawToken::Gt => Token::Op(">"),
        RawToken::Eq => Token::Op("="),
        RawToken::Bang => Token::Op("!"),

        RawToken::LParen => Token::Punct('('),
        RawToken::RParen => Token::Punct(')'),
        RawToken::LBrace => Token::Punct('{'),
        RawToken::RBrace => Token::Punct('}'),
        RawToken::LBracket => Token::Punct('['),
        RawToken::RBracket => Token::Punct(']'),
        RawToken::Comma => Token::Punct(','),
        RawToken::Semicolon => Token::Punct(';'),
        RawToken::Dot => Token::Punct('.'),
        RawToken::Colon => Token::Punct(':'),
    };
    Some(token)
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('0') => result.push('\0'),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}
