//! Tokenizer for bitlang source text.
//!
//! No token spans more than one line, so source is tokenized line by line.
//! Comments start with `//` and extend to end of line.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use bitlang_common::ast::{AssignOp, BinOp};
use bitlang_common::Position;

use crate::error::LexError;

/// A single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identifier: letters, digits, underscore, not starting with a digit.
    Ident(String),
    /// Decimal or hexadecimal integer literal.
    Number(u64),
    /// Type name `u<N>`. `N` is validated by the parser.
    Uint(u32),

    // Keywords
    Fn,
    Static,
    Const,
    Let,
    If,
    Else,
    For,
    In,
    Return,
    Loop,
    Break,
    Continue,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Semicolon,
    /// `..`
    DotDot,

    /// Binary operator.
    Op(BinOp),
    /// `=`, `+=`, `-=`
    Assign(AssignOp),
    /// `!!`
    Panic,

    /// End of input. Always the last token.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Ident(name) => return write!(f, "identifier '{name}'"),
            Token::Number(n) => return write!(f, "number {n}"),
            Token::Uint(bits) => return write!(f, "type 'u{bits}'"),
            Token::Op(op) => return write!(f, "'{}'", op.symbol()),
            Token::Assign(op) => return write!(f, "'{}'", op.symbol()),
            Token::Eof => return write!(f, "end of input"),
            Token::Fn => "fn",
            Token::Static => "static",
            Token::Const => "const",
            Token::Let => "let",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::In => "in",
            Token::Return => "return",
            Token::Loop => "loop",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Colon => ":",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::DotDot => "..",
            Token::Panic => "!!",
        };
        write!(f, "'{text}'")
    }
}

/// A token and the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub at: Position,
}

fn keyword(word: &str) -> Option<Token> {
    Some(match word {
        "fn" => Token::Fn,
        "static" => Token::Static,
        "const" => Token::Const,
        "let" => Token::Let,
        "if" => Token::If,
        "else" => Token::Else,
        "for" => Token::For,
        "in" => Token::In,
        "return" => Token::Return,
        "loop" => Token::Loop,
        "break" => Token::Break,
        "continue" => Token::Continue,
        _ => return None,
    })
}

/// Tokenize a whole source text. The result always ends with [`Token::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, LexError> {
    let mut tokens = Vec::new();
    let mut line_count = 0;

    for (idx, line) in source.lines().enumerate() {
        let line_num = idx as u32 + 1;
        tokens.extend(tokenize_line(line, line_num)?);
        line_count = line_num;
    }

    tokens.push(Spanned {
        token: Token::Eof,
        at: Position::new(line_count + 1, 1),
    });
    Ok(tokens)
}

/// Tokenize a single line.
///
/// Returns an empty Vec for blank lines and comment-only lines.
pub fn tokenize_line(line: &str, line_num: u32) -> Result<Vec<Spanned>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = line.char_indices().peekable();
    let column_of = |byte: usize| line[..byte].chars().count() as u32 + 1;

    while let Some(&(start, ch)) = chars.peek() {
        let at = Position::new(line_num, column_of(start));

        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let token = if ch.is_ascii_digit() {
            lex_number(line, &mut chars, at)?
        } else if ch.is_alphabetic() || ch == '_' {
            lex_word(line, &mut chars)
        } else {
            chars.next();
            match ch {
                '/' if next_is(&mut chars, '/') => break,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                ':' => Token::Colon,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                '.' if next_is(&mut chars, '.') => Token::DotDot,
                '+' if next_is(&mut chars, '=') => Token::Assign(AssignOp::Add),
                '-' if next_is(&mut chars, '=') => Token::Assign(AssignOp::Sub),
                '=' if next_is(&mut chars, '=') => Token::Op(BinOp::Eq),
                '!' if next_is(&mut chars, '=') => Token::Op(BinOp::Ne),
                '!' if next_is(&mut chars, '!') => Token::Panic,
                '<' if next_is(&mut chars, '=') => Token::Op(BinOp::Le),
                '<' if next_is(&mut chars, '<') => Token::Op(BinOp::Shl),
                '>' if next_is(&mut chars, '=') => Token::Op(BinOp::Ge),
                '>' if next_is(&mut chars, '>') => Token::Op(BinOp::Shr),
                '=' => Token::Assign(AssignOp::Set),
                '+' => Token::Op(BinOp::Add),
                '-' => Token::Op(BinOp::Sub),
                '*' => Token::Op(BinOp::Mul),
                '/' => Token::Op(BinOp::Div),
                '%' => Token::Op(BinOp::Rem),
                '^' => Token::Op(BinOp::Xor),
                '|' => Token::Op(BinOp::Or),
                '&' => Token::Op(BinOp::And),
                '<' => Token::Op(BinOp::Lt),
                '>' => Token::Op(BinOp::Gt),
                other => return Err(LexError::UnrecognizedChar { at, ch: other }),
            }
        };

        tokens.push(Spanned { token, at });
    }

    Ok(tokens)
}

/// Consume the next char if it equals `expected`.
fn next_is(chars: &mut Peekable<CharIndices<'_>>, expected: char) -> bool {
    chars.next_if(|&(_, c)| c == expected).is_some()
}

/// Consume a run of identifier characters and return the matching slice.
fn take_word<'a>(line: &'a str, chars: &mut Peekable<CharIndices<'_>>) -> &'a str {
    let start = chars.peek().map(|&(i, _)| i).unwrap_or(line.len());
    let mut end = start;
    while let Some((i, c)) = chars.next_if(|&(_, c)| c.is_alphanumeric() || c == '_') {
        end = i + c.len_utf8();
    }
    &line[start..end]
}

fn lex_word(line: &str, chars: &mut Peekable<CharIndices<'_>>) -> Token {
    let word = take_word(line, chars);

    if let Some(tok) = keyword(word) {
        return tok;
    }

    // `u` followed only by digits names an unsigned type.
    if let Some(digits) = word.strip_prefix('u') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            // Absurd widths still lex; the parser rejects them by name.
            return Token::Uint(digits.parse().unwrap_or(u32::MAX));
        }
    }

    Token::Ident(word.to_string())
}

fn lex_number(
    line: &str,
    chars: &mut Peekable<CharIndices<'_>>,
    at: Position,
) -> Result<Token, LexError> {
    let word = take_word(line, chars);
    let invalid = || LexError::InvalidNumber {
        at,
        text: word.to_string(),
    };

    let value = if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        if hex.is_empty() {
            return Err(invalid());
        }
        u64::from_str_radix(hex, 16).map_err(|_| invalid())?
    } else {
        word.parse::<u64>().map_err(|_| invalid())?
    };

    Ok(Token::Number(value))
}
