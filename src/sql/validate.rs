//! Statement-level validity for SQL editor highlighting.

use super::lexer::{Spanned, Token};
use super::parser::{Cursor, Script};
use crate::validity::{ValidityRange, partition};

/// Partition `text` into valid and invalid byte ranges.
///
/// A statement is valid when it has one of the recognised shapes:
/// `CREATE TABLE name (...)`, `CREATE [OR REPLACE] VIEW name ... SELECT ...
/// FROM`, or `ALTER TABLE name <action>`. Bare `;` and the text between
/// statements are valid.
pub fn identify_valid_blocks(text: &str) -> Vec<ValidityRange> {
    let script = Script::new(text);

    let blocks = script.statement_tokens().filter_map(|tokens| {
        if tokens.iter().all(|t| t.token == Token::Semicolon) {
            return None;
        }
        let first = tokens.first()?;
        let last = tokens.last()?;
        Some(ValidityRange::new(
            first.start,
            last.end,
            is_valid_statement(&script.src, tokens),
        ))
    });

    partition(text.len(), blocks)
}

fn is_valid_statement(src: &str, tokens: &[Spanned]) -> bool {
    let mut c = Cursor::new(src, tokens);
    match c.current() {
        Token::Create => {
            c.advance();
            if c.eat(&Token::Or) && !c.eat(&Token::Replace) {
                return false;
            }
            c.skip_create_modifiers();
            match c.current() {
                Token::Table => {
                    c.advance();
                    c.skip_if_not_exists();
                    c.qualified_name().is_some() && c.at_balanced_group()
                }
                Token::View => {
                    c.advance();
                    c.skip_if_not_exists();
                    if c.qualified_name().is_none() {
                        return false;
                    }
                    if *c.current() == Token::LParen {
                        c.skip_parens();
                    }
                    c.eat(&Token::As);
                    if !c.eat(&Token::Select) {
                        return false;
                    }
                    c.take_until(|t| *t == Token::From);
                    c.eat(&Token::From)
                }
                _ => false,
            }
        }
        Token::Alter => {
            c.advance();
            if !c.eat(&Token::Table) {
                return false;
            }
            c.eat(&Token::Only);
            if c.eat(&Token::If) {
                c.eat(&Token::Exists);
            }
            c.eat(&Token::Only);
            c.qualified_name().is_some() && !c.at_end() && *c.current() != Token::Semicolon
        }
        _ => false,
    }
}
