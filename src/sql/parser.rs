//! Statement parser for CREATE TABLE, CREATE VIEW and ALTER TABLE.
//!
//! The script is tokenized once, split into statements, and each statement
//! is parsed on its own into a definition. Applying those definitions to a
//! schema is left to the phases in `build` and `view`, so a malformed
//! statement only ever loses itself.

use std::ops::Range;

use thiserror::Error;
use tracing::trace;

use super::lexer::{Lexer, Spanned, Token, strip_batch_separators};
use super::types;
use crate::model::{Column, Nullability};

#[derive(Debug, Error)]
pub enum SqlParseError {
    #[error("Expected {expected}, found {found:?}")]
    Expected { expected: &'static str, found: Token },
    #[error("Unbalanced parentheses")]
    UnbalancedParens,
}

/// `column -> target(target_column)`; a missing target column means the
/// target's primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    pub column: String,
    pub target: String,
    pub target_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<Column>,
    pub foreign_keys: Vec<ForeignKeyDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn {
        column: Column,
        foreign_key: Option<ForeignKeyDef>,
    },
    AddUnique(Vec<String>),
    AddPrimaryKey(Vec<String>),
    AddForeignKey(Vec<ForeignKeyDef>),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub table: String,
    pub actions: Vec<AlterAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub table: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectExpr {
    Wildcard,
    QualifiedWildcard(String),
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// Anything else, kept as source text.
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: SelectExpr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewDef {
    pub name: String,
    pub items: Vec<SelectItem>,
    pub from: Vec<TableRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(TableDef),
    CreateView(ViewDef),
    AlterTable(AlterTable),
    /// `CREATE SCHEMA name`, `CREATE DATABASE name` or `USE name`.
    SchemaName(String),
}

/// A cleaned, tokenized script split into statements.
pub struct Script {
    pub src: String,
    pub tokens: Vec<Spanned>,
    pub statements: Vec<Range<usize>>,
}

impl Script {
    pub fn new(input: &str) -> Self {
        let src = strip_batch_separators(input);
        let tokens = Lexer::new(&src).tokenize();
        let statements = split_statements(&tokens);
        Self {
            src,
            tokens,
            statements,
        }
    }

    pub fn statement_tokens(&self) -> impl Iterator<Item = &[Spanned]> {
        self.statements.iter().map(|r| &self.tokens[r.clone()])
    }

    /// Parse every statement, skipping the ones that are malformed or of an
    /// unsupported kind.
    pub fn parse(&self) -> Vec<Statement> {
        self.statement_tokens()
            .filter_map(|tokens| {
                match Cursor::new(&self.src, tokens).parse_statement() {
                    Ok(stmt) => stmt,
                    Err(e) => {
                        trace!(error = %e, "skipping malformed statement");
                        None
                    }
                }
            })
            .collect()
    }
}

/// Split a token stream into statements (token index ranges, `Eof`
/// excluded). A top-level `;` ends a statement and belongs to it; `CREATE`
/// and `ALTER` always start a new one, so unterminated statements in a
/// half-typed script do not swallow their successors.
pub fn split_statements(tokens: &[Spanned]) -> Vec<Range<usize>> {
    let mut statements = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth = 0usize;

    for (i, spanned) in tokens.iter().enumerate() {
        match spanned.token {
            Token::Eof => break,
            Token::Create | Token::Alter => {
                if let Some(s) = start {
                    statements.push(s..i);
                }
                start = Some(i);
                depth = 0;
            }
            Token::Semicolon if depth == 0 => {
                statements.push(start.unwrap_or(i)..i + 1);
                start = None;
            }
            _ => {
                if start.is_none() {
                    start = Some(i);
                }
                match spanned.token {
                    Token::LParen => depth += 1,
                    Token::RParen => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
        }
    }

    if let Some(s) = start {
        let end = tokens
            .iter()
            .position(|t| t.token == Token::Eof)
            .unwrap_or(tokens.len());
        statements.push(s..end);
    }
    statements
}

/// Split at top-level occurrences of `sep`, dropping empty pieces.
pub fn split_top_level<'a>(tokens: &'a [Spanned], sep: &Token) -> Vec<&'a [Spanned]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, spanned) in tokens.iter().enumerate() {
        match &spanned.token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            t if depth == 0 && t == sep => {
                if i > start {
                    parts.push(&tokens[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() {
        parts.push(&tokens[start..]);
    }
    parts
}

/// Index of the `)` matching the `(` at `open`.
pub fn matching_paren(tokens: &[Spanned], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, spanned) in tokens.iter().enumerate().skip(open) {
        match spanned.token {
            Token::LParen => depth += 1,
            Token::RParen => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Words that may qualify CREATE before TABLE/VIEW.
const CREATE_MODIFIERS: &[&str] = &[
    "TEMP",
    "TEMPORARY",
    "GLOBAL",
    "LOCAL",
    "UNLOGGED",
    "MATERIALIZED",
    "RECURSIVE",
];

/// Words that end a table reference's alias position in a FROM clause.
const JOIN_WORDS: &[&str] = &[
    "LEFT", "RIGHT", "INNER", "OUTER", "FULL", "CROSS", "NATURAL", "USING", "LATERAL", "WITH",
];

/// Words that end a FROM clause.
const FROM_TERMINATORS: &[&str] = &["OFFSET", "FETCH", "WINDOW", "QUALIFY", "EXCEPT", "INTERSECT"];

/// Cursor over one statement's tokens.
pub struct Cursor<'a> {
    src: &'a str,
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(src: &'a str, tokens: &'a [Spanned]) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
        }
    }

    pub fn current(&self) -> &'a Token {
        self.tokens
            .get(self.pos)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    pub fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len() || *self.current() == Token::Eof
    }

    pub fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.current(), Token::Ident(w) if w.eq_ignore_ascii_case(word)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<(), SqlParseError> {
        if self.eat(&token) {
            Ok(())
        } else {
            Err(SqlParseError::Expected {
                expected,
                found: self.current().clone(),
            })
        }
    }

    fn text(&self, spanned: &Spanned) -> &'a str {
        &self.src[spanned.start..spanned.end]
    }

    /// Identifier at the cursor, without consuming it.
    pub fn peek_name(&self) -> Option<String> {
        let spanned = self.tokens.get(self.pos)?;
        name_of(self.src, spanned)
    }

    /// Consume an identifier (bare, quoted, or a soft keyword).
    pub fn name(&mut self) -> Option<String> {
        let name = self.peek_name()?;
        self.advance();
        Some(name)
    }

    /// `[schema.]name`, keeping only the last part.
    pub fn qualified_name(&mut self) -> Option<String> {
        let mut name = self.name()?;
        while *self.current() == Token::Dot {
            self.advance();
            match self.name() {
                Some(part) => name = part,
                None => break,
            }
        }
        Some(name)
    }

    pub fn skip_parens(&mut self) {
        if *self.current() != Token::LParen {
            self.advance();
            return;
        }
        match matching_paren(self.tokens, self.pos) {
            Some(close) => self.pos = close + 1,
            None => self.pos = self.tokens.len(),
        }
    }

    /// At a `(` whose matching `)` exists.
    pub fn at_balanced_group(&self) -> bool {
        *self.current() == Token::LParen && matching_paren(self.tokens, self.pos).is_some()
    }

    /// `(a, b, c)` as names; empty when not at `(`.
    fn paren_list(&mut self) -> Vec<String> {
        if *self.current() != Token::LParen {
            return Vec::new();
        }
        let inner = self.group().unwrap_or(&[]);
        split_top_level(inner, &Token::Comma)
            .into_iter()
            .filter_map(|part| part.first().and_then(|s| name_of(self.src, s)))
            .collect()
    }

    /// Consume a parenthesized group and return the tokens inside it.
    fn group(&mut self) -> Option<&'a [Spanned]> {
        let close = matching_paren(self.tokens, self.pos)?;
        let inner = &self.tokens[self.pos + 1..close];
        self.pos = close + 1;
        Some(inner)
    }

    /// Consume tokens up to the first top-level token matching `stop`.
    pub fn take_until(&mut self, stop: impl Fn(&Token) -> bool) -> &'a [Spanned] {
        let start = self.pos;
        let mut depth = 0usize;
        while !self.at_end() {
            let token = self.current();
            if depth == 0 && stop(token) {
                break;
            }
            match token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
        &self.tokens[start..self.pos]
    }

    fn rest(&self) -> &'a [Spanned] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    pub fn skip_create_modifiers(&mut self) {
        while let Token::Ident(w) = self.current() {
            if CREATE_MODIFIERS.iter().any(|m| w.eq_ignore_ascii_case(m)) {
                self.advance();
            } else {
                break;
            }
        }
    }

    pub fn parse_statement(&mut self) -> Result<Option<Statement>, SqlParseError> {
        match self.current() {
            Token::Create => self.parse_create(),
            Token::Alter => self.parse_alter().map(|a| a.map(Statement::AlterTable)),
            Token::Ident(w) if w.eq_ignore_ascii_case("USE") => {
                self.advance();
                Ok(self.qualified_name().map(Statement::SchemaName))
            }
            _ => Ok(None),
        }
    }

    fn parse_create(&mut self) -> Result<Option<Statement>, SqlParseError> {
        self.advance(); // CREATE
        if self.eat(&Token::Or) {
            self.expect(Token::Replace, "REPLACE")?;
        }
        self.skip_create_modifiers();

        match self.current() {
            Token::Table => {
                self.advance();
                Ok(self.parse_create_table()?.map(Statement::CreateTable))
            }
            Token::View => {
                self.advance();
                Ok(Some(Statement::CreateView(self.parse_create_view()?)))
            }
            Token::Ident(w) if w.eq_ignore_ascii_case("SCHEMA") || w.eq_ignore_ascii_case("DATABASE") => {
                self.advance();
                self.skip_if_not_exists();
                Ok(self.qualified_name().map(Statement::SchemaName))
            }
            // INDEX, TRIGGER, ...
            _ => Ok(None),
        }
    }

    pub fn skip_if_not_exists(&mut self) {
        if self.eat(&Token::If) {
            self.eat(&Token::Not);
            self.eat(&Token::Exists);
        }
    }

    fn parse_create_table(&mut self) -> Result<Option<TableDef>, SqlParseError> {
        self.skip_if_not_exists();

        let name = self.qualified_name().ok_or_else(|| SqlParseError::Expected {
            expected: "table name",
            found: self.current().clone(),
        })?;

        // CREATE TABLE x AS SELECT ...
        if *self.current() != Token::LParen {
            return Ok(None);
        }
        let body = self.group().ok_or(SqlParseError::UnbalancedParens)?;

        let mut columns: Vec<Column> = Vec::new();
        let mut foreign_keys = Vec::new();
        let mut primary_keys: Vec<String> = Vec::new();
        let mut unique_keys: Vec<String> = Vec::new();

        for element in split_top_level(body, &Token::Comma) {
            let parsed = Cursor::new(self.src, element).parse_table_element();
            match parsed {
                Ok(TableElement::Column(column, fk)) => {
                    upsert(&mut columns, column);
                    foreign_keys.extend(fk);
                }
                Ok(TableElement::PrimaryKey(cols)) => primary_keys.extend(cols),
                Ok(TableElement::Unique(cols)) => {
                    // Composite uniqueness says nothing about a single column
                    if cols.len() == 1 {
                        unique_keys.extend(cols);
                    }
                }
                Ok(TableElement::ForeignKeys(fks)) => foreign_keys.extend(fks),
                Ok(TableElement::Skip) => {}
                Err(e) => trace!(table = %name, error = %e, "skipping table element"),
            }
        }

        for column in &mut columns {
            if primary_keys.iter().any(|k| k.eq_ignore_ascii_case(&column.name)) {
                column.is_primary_key = true;
                column.nullability = Nullability::NotNull;
            }
            if unique_keys.iter().any(|k| k.eq_ignore_ascii_case(&column.name)) {
                column.is_unique = true;
            }
        }

        Ok(Some(TableDef {
            name,
            columns,
            foreign_keys,
        }))
    }

    fn parse_table_element(&mut self) -> Result<TableElement, SqlParseError> {
        let named_constraint = self.eat(&Token::Constraint);
        if named_constraint {
            self.name();
        }

        match self.current() {
            Token::Primary => {
                self.advance();
                self.expect(Token::Key, "KEY")?;
                self.skip_clustering();
                Ok(TableElement::PrimaryKey(self.paren_list()))
            }
            Token::Unique => {
                self.advance();
                if !self.eat(&Token::Key) {
                    self.eat(&Token::Index);
                }
                self.skip_clustering();
                if *self.current() != Token::LParen {
                    self.name();
                }
                Ok(TableElement::Unique(self.paren_list()))
            }
            Token::Foreign => Ok(TableElement::ForeignKeys(self.parse_foreign_key()?)),
            Token::Check | Token::Index | Token::Key => Ok(TableElement::Skip),
            Token::Ident(w)
                if ["FULLTEXT", "SPATIAL", "EXCLUDE"]
                    .iter()
                    .any(|k| w.eq_ignore_ascii_case(k)) =>
            {
                Ok(TableElement::Skip)
            }
            _ if named_constraint => Ok(TableElement::Skip),
            _ => match self.parse_column_def()? {
                Some((column, fk)) => Ok(TableElement::Column(column, fk)),
                None => Ok(TableElement::Skip),
            },
        }
    }

    /// `FOREIGN KEY (cols) REFERENCES target [(cols)]`, one definition per
    /// column pair.
    fn parse_foreign_key(&mut self) -> Result<Vec<ForeignKeyDef>, SqlParseError> {
        self.advance(); // FOREIGN
        self.expect(Token::Key, "KEY")?;
        let columns = self.paren_list();
        self.expect(Token::References, "REFERENCES")?;
        let target = self.qualified_name().ok_or_else(|| SqlParseError::Expected {
            expected: "referenced table",
            found: self.current().clone(),
        })?;
        let target_columns = self.paren_list();
        self.skip_referential_actions();

        Ok(columns
            .into_iter()
            .enumerate()
            .map(|(i, column)| ForeignKeyDef {
                column,
                target: target.clone(),
                target_column: target_columns.get(i).cloned(),
            })
            .collect())
    }

    /// SQL Server `CLUSTERED` / `NONCLUSTERED` ahead of a key's column list.
    fn skip_clustering(&mut self) {
        if !self.eat_word("CLUSTERED") {
            self.eat_word("NONCLUSTERED");
        }
    }

    /// `ON DELETE|UPDATE <action>` after a reference. The `NULL` of
    /// `SET NULL` is an action, not a nullability.
    fn skip_referential_actions(&mut self) {
        while *self.current() == Token::On {
            self.advance();
            if !self.eat_word("DELETE") {
                self.eat_word("UPDATE");
            }
            // SET NULL | SET DEFAULT | NO ACTION | CASCADE | RESTRICT
            if !self.eat_word("SET") {
                self.eat_word("NO");
            }
            self.advance();
        }
    }

    /// `name TYPE [constraints...]`.
    fn parse_column_def(&mut self) -> Result<Option<(Column, Option<ForeignKeyDef>)>, SqlParseError> {
        let Some(name) = self.name() else {
            return Ok(None);
        };
        let Some(typ) = self.parse_type() else {
            return Ok(None);
        };

        let mut column = Column::new(name, typ);
        let mut foreign_key = None;

        while !self.at_end() {
            match self.current() {
                Token::Primary => {
                    self.advance();
                    self.eat(&Token::Key);
                    column.is_primary_key = true;
                }
                Token::Identity => {
                    self.advance();
                    if *self.current() == Token::LParen {
                        self.skip_parens();
                    }
                    column.is_primary_key = true;
                }
                Token::Unique => {
                    self.advance();
                    self.eat(&Token::Key);
                    column.is_unique = true;
                }
                Token::Not => {
                    self.advance();
                    if self.eat(&Token::Null) {
                        column.nullability = Nullability::NotNull;
                    }
                }
                Token::Null => {
                    self.advance();
                    column.nullability = Nullability::Nullable;
                }
                Token::References => {
                    self.advance();
                    let target = self.qualified_name().ok_or_else(|| SqlParseError::Expected {
                        expected: "referenced table",
                        found: self.current().clone(),
                    })?;
                    let target_column = self.paren_list().into_iter().next();
                    self.skip_referential_actions();
                    foreign_key = Some(ForeignKeyDef {
                        column: column.name.clone(),
                        target,
                        target_column,
                    });
                }
                Token::Default => {
                    self.advance();
                    self.skip_value();
                }
                Token::Constraint => {
                    self.advance();
                    self.name();
                }
                Token::LParen => self.skip_parens(),
                _ => self.advance(),
            }
        }

        if column.is_primary_key {
            column.nullability = Nullability::NotNull;
        }

        Ok(Some((column, foreign_key)))
    }

    /// Base type words plus precision, e.g. `DOUBLE PRECISION`, `VARCHAR(50)`.
    fn parse_type(&mut self) -> Option<String> {
        let first = match self.current() {
            Token::Ident(t) | Token::QuotedIdent(t) if !t.is_empty() => t.clone(),
            _ => return None,
        };
        self.advance();

        let mut words = vec![first];
        let mut has_precision = false;

        loop {
            match self.current() {
                Token::LParen if !has_precision => {
                    let inner = self.group()?;
                    let raw: String = inner.iter().map(|s| self.text(s)).collect();
                    has_precision = true;
                    // Precision binds to the word before it
                    let last = words.len() - 1;
                    words[last] = format!("{}({raw})", words[last]);
                }
                Token::Ident(w) if types::is_type_continuation(w) => {
                    words.push(w.clone());
                    self.advance();
                }
                // Postgres arrays lex as an empty `[]` identifier
                Token::QuotedIdent(w) if w.is_empty() => {
                    let last = words.len() - 1;
                    words[last].push_str("[]");
                    self.advance();
                }
                _ => break,
            }
        }

        Some(types::normalize_type(&words))
    }

    /// Skip a DEFAULT value: a literal, a name, or a call.
    fn skip_value(&mut self) {
        match self.current() {
            Token::LParen => self.skip_parens(),
            Token::Other('-') | Token::Other('+') => {
                self.advance();
                self.advance();
            }
            _ => {
                self.advance();
                if *self.current() == Token::LParen {
                    self.skip_parens();
                }
            }
        }
    }

    fn parse_alter(&mut self) -> Result<Option<AlterTable>, SqlParseError> {
        self.advance(); // ALTER
        if !self.eat(&Token::Table) {
            return Ok(None);
        }
        self.eat(&Token::Only);
        if self.eat(&Token::If) {
            self.eat(&Token::Exists);
        }
        self.eat(&Token::Only);

        let table = self.qualified_name().ok_or_else(|| SqlParseError::Expected {
            expected: "table name",
            found: self.current().clone(),
        })?;

        let rest = self.rest();
        let rest = match rest.last() {
            Some(s) if s.token == Token::Semicolon => &rest[..rest.len() - 1],
            _ => rest,
        };
        if rest.is_empty() {
            return Err(SqlParseError::Expected {
                expected: "ALTER TABLE action",
                found: Token::Eof,
            });
        }

        let actions = split_top_level(rest, &Token::Comma)
            .into_iter()
            .filter_map(|action| match Cursor::new(self.src, action).parse_alter_action() {
                Ok(action) => Some(action),
                Err(e) => {
                    trace!(table = %table, error = %e, "skipping alter action");
                    None
                }
            })
            .collect();

        Ok(Some(AlterTable { table, actions }))
    }

    fn parse_alter_action(&mut self) -> Result<AlterAction, SqlParseError> {
        if !self.eat(&Token::Add) {
            return Ok(AlterAction::Other);
        }

        let named_constraint = self.eat(&Token::Constraint);
        if named_constraint {
            self.name();
        }

        match self.current() {
            Token::Primary => {
                self.advance();
                self.expect(Token::Key, "KEY")?;
                self.skip_clustering();
                Ok(AlterAction::AddPrimaryKey(self.paren_list()))
            }
            Token::Unique => {
                self.advance();
                if !self.eat(&Token::Key) {
                    self.eat(&Token::Index);
                }
                self.skip_clustering();
                if *self.current() != Token::LParen {
                    self.name();
                }
                Ok(AlterAction::AddUnique(self.paren_list()))
            }
            Token::Foreign => Ok(AlterAction::AddForeignKey(self.parse_foreign_key()?)),
            Token::Check | Token::Index | Token::Key => Ok(AlterAction::Other),
            _ if named_constraint => Ok(AlterAction::Other),
            _ => {
                self.eat(&Token::Column);
                self.skip_if_not_exists();
                match self.parse_column_def()? {
                    Some((column, foreign_key)) => Ok(AlterAction::AddColumn {
                        column,
                        foreign_key,
                    }),
                    None => Ok(AlterAction::Other),
                }
            }
        }
    }

    fn parse_create_view(&mut self) -> Result<ViewDef, SqlParseError> {
        self.skip_if_not_exists();

        let name = self.qualified_name().ok_or_else(|| SqlParseError::Expected {
            expected: "view name",
            found: self.current().clone(),
        })?;

        // Explicit column list
        if *self.current() == Token::LParen {
            self.skip_parens();
        }
        self.eat(&Token::As);
        self.expect(Token::Select, "SELECT")?;
        if !self.eat(&Token::Distinct) {
            self.eat_word("ALL");
        }

        let select_list = self.take_until(|t| *t == Token::From);
        self.expect(Token::From, "FROM")?;
        let from_clause = self.take_until(|t| match t {
            Token::Where
            | Token::Group
            | Token::Order
            | Token::Having
            | Token::Limit
            | Token::Union
            | Token::Semicolon => true,
            Token::Ident(w) => FROM_TERMINATORS.iter().any(|k| w.eq_ignore_ascii_case(k)),
            _ => false,
        });

        let items = split_top_level(select_list, &Token::Comma)
            .into_iter()
            .map(|item| self.select_item(item))
            .collect();
        let from = Cursor::new(self.src, from_clause).parse_from_clause();

        Ok(ViewDef { name, items, from })
    }

    fn select_item(&self, tokens: &'a [Spanned]) -> SelectItem {
        let (expr_tokens, alias) = split_alias(self.src, tokens);
        let names: Vec<Option<String>> = expr_tokens.iter().map(|s| name_of(self.src, s)).collect();
        let kinds: Vec<&Token> = expr_tokens.iter().map(|s| &s.token).collect();

        let expr = match kinds.as_slice() {
            [Token::Star] => SelectExpr::Wildcard,
            [_, Token::Dot, Token::Star] if names[0].is_some() => {
                SelectExpr::QualifiedWildcard(names[0].clone().unwrap_or_default())
            }
            [_] if names[0].is_some() => SelectExpr::Column {
                qualifier: None,
                name: names[0].clone().unwrap_or_default(),
            },
            [_, Token::Dot, _] if names[0].is_some() && names[2].is_some() => SelectExpr::Column {
                qualifier: names[0].clone(),
                name: names[2].clone().unwrap_or_default(),
            },
            [_, Token::Dot, _, Token::Dot, _]
                if names[2].is_some() && names[4].is_some() =>
            {
                SelectExpr::Column {
                    qualifier: names[2].clone(),
                    name: names[4].clone().unwrap_or_default(),
                }
            }
            _ => {
                let text = match (expr_tokens.first(), expr_tokens.last()) {
                    (Some(first), Some(last)) => self.src[first.start..last.end].to_string(),
                    _ => String::new(),
                };
                SelectExpr::Expression(text)
            }
        };

        SelectItem { expr, alias }
    }

    fn parse_from_clause(&mut self) -> Vec<TableRef> {
        let mut refs = Vec::new();
        let mut expect_table = true;

        while !self.at_end() {
            if expect_table {
                expect_table = false;
                if *self.current() == Token::LParen {
                    // Derived table; nothing to resolve against
                    self.skip_parens();
                    continue;
                }
                if let Some(table) = self.qualified_name() {
                    let alias = if self.eat(&Token::As) {
                        self.name()
                    } else {
                        match self.current() {
                            Token::Ident(w) if !JOIN_WORDS.iter().any(|k| w.eq_ignore_ascii_case(k)) => {
                                self.name()
                            }
                            Token::QuotedIdent(_) => self.name(),
                            _ => None,
                        }
                    };
                    refs.push(TableRef { table, alias });
                }
                continue;
            }

            match self.current() {
                Token::Comma | Token::Join => {
                    self.advance();
                    expect_table = true;
                }
                Token::LParen => self.skip_parens(),
                _ => self.advance(),
            }
        }
        refs
    }
}

enum TableElement {
    Column(Column, Option<ForeignKeyDef>),
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    ForeignKeys(Vec<ForeignKeyDef>),
    Skip,
}

/// Keywords that can still be used as plain names.
fn is_soft_keyword(token: &Token) -> bool {
    matches!(
        token,
        Token::Column
            | Token::View
            | Token::Replace
            | Token::Only
            | Token::Order
            | Token::Group
            | Token::Limit
            | Token::Key
            | Token::Index
            | Token::Identity
    )
}

fn name_of(src: &str, spanned: &Spanned) -> Option<String> {
    match &spanned.token {
        Token::Ident(s) => Some(s.clone()),
        Token::QuotedIdent(s) if !s.is_empty() => Some(s.clone()),
        t if is_soft_keyword(t) => Some(src[spanned.start..spanned.end].to_string()),
        _ => None,
    }
}

/// Split `expr [AS] alias` into the expression and its alias.
fn split_alias<'t>(src: &str, tokens: &'t [Spanned]) -> (&'t [Spanned], Option<String>) {
    let n = tokens.len();
    if n >= 3 && tokens[n - 2].token == Token::As {
        if let Some(alias) = name_of(src, &tokens[n - 1]) {
            return (&tokens[..n - 2], Some(alias));
        }
    }
    if n >= 2 {
        let last = &tokens[n - 1];
        let before = &tokens[n - 2].token;
        let alias_like = match &last.token {
            Token::Ident(w) => !w.eq_ignore_ascii_case("END"),
            Token::QuotedIdent(_) => true,
            _ => false,
        };
        let ends_value = matches!(
            before,
            Token::Ident(_) | Token::QuotedIdent(_) | Token::RParen | Token::Num(_) | Token::Str(_)
        );
        if alias_like && ends_value {
            return (&tokens[..n - 1], name_of(src, last));
        }
    }
    (tokens, None)
}

fn upsert(columns: &mut Vec<Column>, column: Column) {
    match columns
        .iter_mut()
        .find(|c| c.name.eq_ignore_ascii_case(&column.name))
    {
        Some(existing) => *existing = column,
        None => columns.push(column),
    }
}
