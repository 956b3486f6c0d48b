//! Hand-written tokenizer for one statement's worth of text (the caller has
//! already split on `;`, see `executor::split_statements`). This replaces
//! the source's line-at-a-time regex matching with an explicit token stream,
//! so a malformed statement produces a precise `ParseError` naming the
//! offending token instead of an opaque "no regex match" failure.
//!
//! Bare words are split on whitespace everywhere *except* the two grammar
//! positions that carry unquoted values with no separator of their own: a
//! `VALUES (...)` list (items separated only by `,`, as the source's
//! `parseInsertInto` reads them via `getline(..., ',')`) and a `WHERE`
//! clause's value (always the last token in a statement). In both spots an
//! embedded space — e.g. a `STRING` like `john doe` — belongs to a single
//! value, not a run of separate words.

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    LParen,
    RParen,
    Comma,
    Eq,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Word(w) => write!(f, "{w}"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Eq => write!(f, "="),
        }
    }
}

const SPECIAL: &str = "(),=";

pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut chars = input.chars().peekable();
    let mut seen_where = false;
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        match c {
            '(' => {
                let preceded_by_values = matches!(tokens.last(), Some(Token::Word(w)) if w == "VALUES");
                chars.next();
                tokens.push(Token::LParen);
                if preceded_by_values {
                    scan_raw_list(&mut chars, &mut tokens);
                }
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            ',' => {
                tokens.push(Token::Comma);
                chars.next();
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
                if seen_where {
                    let value = scan_to_end(&mut chars);
                    if !value.is_empty() {
                        tokens.push(Token::Word(value));
                    }
                }
            }
            _ => {
                let word = scan_word(&mut chars);
                if word == "WHERE" {
                    seen_where = true;
                }
                tokens.push(Token::Word(word));
            }
        }
    }
    tokens
}

/// A plain identifier/keyword word: stops at whitespace or any special
/// punctuation character.
fn scan_word(chars: &mut Peekable<Chars>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || SPECIAL.contains(c) {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

/// Consumes the comma-separated contents of a `VALUES (...)` list, stopping
/// at the matching `)`. Each item is read raw up to the next `,`/`)` so an
/// embedded space survives, and only its surrounding whitespace is trimmed.
fn scan_raw_list(chars: &mut Peekable<Chars>, tokens: &mut Vec<Token>) {
    loop {
        let item = scan_raw_item(chars);
        tokens.push(Token::Word(item));
        match chars.peek() {
            Some(',') => {
                tokens.push(Token::Comma);
                chars.next();
            }
            Some(')') => {
                tokens.push(Token::RParen);
                chars.next();
                return;
            }
            // Unterminated list; let the parser report the error.
            _ => return,
        }
    }
}

fn scan_raw_item(chars: &mut Peekable<Chars>) -> String {
    let mut raw = String::new();
    while let Some(&c) = chars.peek() {
        if c == ',' || c == ')' {
            break;
        }
        raw.push(c);
        chars.next();
    }
    raw.trim().to_string()
}

/// Consumes everything remaining in the statement, trimmed. Used for a
/// `WHERE`/`SET` value's right-hand side, which always runs to the end of
/// the statement (there is no trailing clause after it in the grammar).
fn scan_to_end(chars: &mut Peekable<Chars>) -> String {
    let mut raw = String::new();
    for c in chars.by_ref() {
        raw.push(c);
    }
    raw.trim().to_string()
}
