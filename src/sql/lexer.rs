//! SQL lexer for tokenizing DDL scripts.

use std::iter::Peekable;
use std::str::CharIndices;

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Create,
    Alter,
    Add,
    Table,
    View,
    Or,
    Replace,
    As,
    Select,
    From,
    Join,
    Column,
    Only,
    Primary,
    Key,
    Foreign,
    References,
    Not,
    Null,
    Unique,
    Default,
    On,
    Constraint,
    Index,
    If,
    Exists,
    Identity,
    Check,
    Distinct,
    Where,
    Group,
    Order,
    Having,
    Limit,
    Union,

    // Identifiers and literals
    Ident(String),
    /// `"x"`, `` `x` `` or `[x]`; never a keyword.
    QuotedIdent(String),
    Str(String),
    Num(String),

    // Symbols
    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Star,
    Other(char),

    // End of input
    Eof,
}

/// A token with its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub start: usize,
    pub end: usize,
}

/// Map a bare word to its keyword token, if it is one.
pub fn keyword(word: &str) -> Option<Token> {
    let tok = match word.to_uppercase().as_str() {
        "CREATE" => Token::Create,
        "ALTER" => Token::Alter,
        "ADD" => Token::Add,
        "TABLE" => Token::Table,
        "VIEW" => Token::View,
        "OR" => Token::Or,
        "REPLACE" => Token::Replace,
        "AS" => Token::As,
        "SELECT" => Token::Select,
        "FROM" => Token::From,
        "JOIN" => Token::Join,
        "COLUMN" => Token::Column,
        "ONLY" => Token::Only,
        "PRIMARY" => Token::Primary,
        "KEY" => Token::Key,
        "FOREIGN" => Token::Foreign,
        "REFERENCES" => Token::References,
        "NOT" => Token::Not,
        "NULL" => Token::Null,
        "UNIQUE" => Token::Unique,
        "DEFAULT" => Token::Default,
        "ON" => Token::On,
        "CONSTRAINT" => Token::Constraint,
        "INDEX" => Token::Index,
        "IF" => Token::If,
        "EXISTS" => Token::Exists,
        "IDENTITY" => Token::Identity,
        "CHECK" => Token::Check,
        "DISTINCT" => Token::Distinct,
        "WHERE" => Token::Where,
        "GROUP" => Token::Group,
        "ORDER" => Token::Order,
        "HAVING" => Token::Having,
        "LIMIT" => Token::Limit,
        "UNION" => Token::Union,
        _ => return None,
    };
    Some(tok)
}

/// SQL lexer.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current: Option<(usize, char)>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.char_indices().peekable();
        let current = chars.next();
        Self {
            input,
            chars,
            current,
        }
    }

    fn advance(&mut self) {
        self.current = self.chars.next();
    }

    fn current_char(&self) -> Option<char> {
        self.current.map(|(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.current.map(|(i, _)| i).unwrap_or(self.input.len())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // skip /
        self.advance(); // skip *
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '*' && self.current_char() == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }
        ident
    }

    fn read_quoted(&mut self, close: char) -> String {
        self.advance(); // skip opening quote
        let mut s = String::new();
        while let Some(c) = self.current_char() {
            if c == close {
                // Doubled quote is an escaped quote
                if self.peek() == Some(close) && close != ']' {
                    s.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance();
                    break;
                }
            } else if c == '\\' && close == '\'' {
                self.advance();
                if let Some(escaped) = self.current_char() {
                    s.push(escaped);
                    self.advance();
                }
            } else {
                s.push(c);
                self.advance();
            }
        }
        s
    }

    fn read_number(&mut self) -> String {
        let mut num = String::new();
        let mut has_dot = false;

        while let Some(c) = self.current_char() {
            if c.is_ascii_digit() {
                num.push(c);
                self.advance();
            } else if c == '.' && !has_dot && self.peek().is_some_and(|n| n.is_ascii_digit()) {
                has_dot = true;
                num.push(c);
                self.advance();
            } else {
                break;
            }
        }
        num
    }

    pub fn next_token(&mut self) -> Spanned {
        loop {
            self.skip_whitespace();
            let start = self.offset();

            let token = match self.current_char() {
                None => Token::Eof,

                Some('-') if self.peek() == Some('-') => {
                    self.skip_line_comment();
                    continue;
                }
                Some('#') => {
                    self.skip_line_comment();
                    continue;
                }
                Some('/') if self.peek() == Some('*') => {
                    self.skip_block_comment();
                    continue;
                }

                Some('(') => self.single(Token::LParen),
                Some(')') => self.single(Token::RParen),
                Some(',') => self.single(Token::Comma),
                Some(';') => self.single(Token::Semicolon),
                Some('.') => self.single(Token::Dot),
                Some('*') => self.single(Token::Star),

                Some('"') => Token::QuotedIdent(self.read_quoted('"')),
                Some('`') => Token::QuotedIdent(self.read_quoted('`')),
                // SQL Server style [identifier]
                Some('[') => Token::QuotedIdent(self.read_quoted(']')),
                Some('\'') => Token::Str(self.read_quoted('\'')),

                Some(c) if c.is_ascii_digit() => Token::Num(self.read_number()),

                Some(c) if c.is_alphabetic() || c == '_' => {
                    let ident = self.read_identifier();
                    keyword(&ident).unwrap_or(Token::Ident(ident))
                }

                Some(c) => self.single(Token::Other(c)),
            };

            return Spanned {
                token,
                start,
                end: self.offset(),
            };
        }
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Collect all tokens, ending with `Eof`.
    pub fn tokenize(mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token();
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }
        tokens
    }
}

/// Replace T-SQL `GO` batch separator lines with a same-length `;` so byte
/// offsets into the cleaned script still match the original text.
pub fn strip_batch_separators(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for line in input.split_inclusive('\n') {
        let body = line.trim_end_matches(['\n', '\r']);
        let trimmed = body.trim();
        if trimmed.eq_ignore_ascii_case("go") {
            let lead = body.len() - body.trim_start().len();
            out.push_str(&body[..lead]);
            out.push(';');
            out.push(' ');
            out.push_str(&body[lead + 2..]);
            out.push_str(&line[body.len()..]);
        } else {
            out.push_str(line);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<Token> {
        Lexer::new(sql).tokenize().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn test_simple_create_table() {
        let tokens = kinds("CREATE TABLE users (id INT);");

        assert_eq!(tokens[0], Token::Create);
        assert_eq!(tokens[1], Token::Table);
        assert_eq!(tokens[2], Token::Ident("users".to_string()));
        assert_eq!(tokens[3], Token::LParen);
        assert_eq!(tokens[4], Token::Ident("id".to_string()));
        assert_eq!(tokens[5], Token::Ident("INT".to_string()));
        assert_eq!(tokens[6], Token::RParen);
        assert_eq!(tokens[7], Token::Semicolon);
        assert_eq!(tokens[8], Token::Eof);
    }

    #[test]
    fn test_quoted_identifiers() {
        let tokens = kinds(r#"CREATE TABLE "User Table" (`column name` INT, [order] INT);"#);

        assert_eq!(tokens[2], Token::QuotedIdent("User Table".to_string()));
        assert_eq!(tokens[4], Token::QuotedIdent("column name".to_string()));
        assert_eq!(tokens[7], Token::QuotedIdent("order".to_string()));
    }

    #[test]
    fn test_comments() {
        let tokens = kinds("-- comment\nCREATE /* block */ TABLE t (id INT);");

        assert_eq!(tokens[0], Token::Create);
        assert_eq!(tokens[1], Token::Table);
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let sql = "-- ユーザー\nCREATE TABLE t";
        let tokens = Lexer::new(sql).tokenize();

        let create = &tokens[0];
        assert_eq!(&sql[create.start..create.end], "CREATE");
        let eof = tokens.last().unwrap();
        assert_eq!(eof.start, sql.len());
    }

    #[test]
    fn test_unknown_chars_become_tokens() {
        let tokens = kinds("a = b");
        assert_eq!(tokens[1], Token::Other('='));
    }

    #[test]
    fn test_strip_go_preserves_length() {
        let sql = "CREATE TABLE a (id INT)\nGO\n  go  \nSELECT 1";
        let cleaned = strip_batch_separators(sql);

        assert_eq!(cleaned.len(), sql.len());
        assert_eq!(cleaned, "CREATE TABLE a (id INT)\n; \n  ;   \nSELECT 1");
    }
}
