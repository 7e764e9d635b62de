//! Format detection and dispatch between the SQL and Mermaid front ends.

use tracing::debug;

use crate::category::CategoryConfig;
use crate::model::{DatabaseSchema, Format};
use crate::validity::ValidityRange;
use crate::{mermaid, sql};

/// Guess the format of `text` without parsing it.
pub fn detect_format(text: &str) -> Option<Format> {
    let trimmed = text.trim_start();
    let starts_mermaid = trimmed
        .get(..9)
        .is_some_and(|head| head.eq_ignore_ascii_case("erdiagram"));
    if starts_mermaid {
        return Some(Format::Mermaid);
    }

    let upper = text.to_uppercase();
    let collapsed = upper.split_whitespace().collect::<Vec<_>>().join(" ");
    ["CREATE TABLE", "CREATE VIEW", "ALTER TABLE"]
        .iter()
        .any(|k| collapsed.contains(k))
        .then_some(Format::Sql)
}

pub fn parse_schema(text: &str, format: Option<Format>) -> Option<DatabaseSchema> {
    parse_schema_with(text, format, &CategoryConfig::default())
}

/// Parse with an explicit format, or try SQL and then Mermaid.
///
/// Without a hint the first result with at least one table wins, SQL
/// first; failing that, whichever parser produced a schema at all.
pub fn parse_schema_with(
    text: &str,
    format: Option<Format>,
    config: &CategoryConfig,
) -> Option<DatabaseSchema> {
    match format {
        Some(Format::Sql) => sql::parse_sql_schema_with(text, config),
        Some(Format::Mermaid) => mermaid::parse_mermaid_schema_with(text, config),
        None => {
            let sql = sql::parse_sql_schema_with(text, config);
            if sql.as_ref().is_some_and(|s| !s.tables.is_empty()) {
                return sql;
            }
            let mermaid = mermaid::parse_mermaid_schema_with(text, config);
            if mermaid.as_ref().is_some_and(|s| !s.tables.is_empty()) {
                return mermaid;
            }
            debug!("no parser produced tables");
            sql.or(mermaid)
        }
    }
}

/// Regenerate text for `schema` in `format`, defaulting to the format it
/// was parsed from.
pub fn schema_to_format(schema: &DatabaseSchema, format: Option<Format>) -> String {
    match format.unwrap_or(schema.format) {
        Format::Sql => sql::schema_to_sql(schema),
        Format::Mermaid => mermaid::schema_to_mermaid(schema),
    }
}

/// Validity partition of `text`, using the detected format when none is
/// given and SQL when detection fails.
pub fn identify_valid_blocks(text: &str, format: Option<Format>) -> Vec<ValidityRange> {
    match format.or_else(|| detect_format(text)).unwrap_or(Format::Sql) {
        Format::Sql => sql::identify_valid_blocks(text),
        Format::Mermaid => mermaid::identify_valid_blocks(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("  ERDIAGRAM\n A ||--o{ B : x"), Some(Format::Mermaid));
        assert_eq!(detect_format("create   table t (id int)"), Some(Format::Sql));
        assert_eq!(detect_format("alter table t add x int"), Some(Format::Sql));
        assert_eq!(detect_format("SELECT 1"), None);
        assert_eq!(detect_format(""), None);
    }

    #[test]
    fn test_sql_first() {
        let schema = parse_schema("CREATE TABLE t (id INT PRIMARY KEY);", None).unwrap();
        assert_eq!(schema.format, Format::Sql);
    }

    #[test]
    fn test_falls_through_to_mermaid() {
        let schema = parse_schema("erDiagram\nA ||--o{ B : has", None).unwrap();
        assert_eq!(schema.format, Format::Mermaid);
        assert_eq!(schema.tables.len(), 2);
    }

    #[test]
    fn test_explicit_format_is_not_second_guessed() {
        assert!(parse_schema("erDiagram\nA ||--o{ B : has", Some(Format::Sql)).is_none());
    }

    #[test]
    fn test_empty_mermaid_is_returned_when_nothing_else_parses() {
        let schema = parse_schema("erDiagram\n", None).unwrap();
        assert_eq!(schema.format, Format::Mermaid);
        assert!(schema.tables.is_empty());
        assert!(parse_schema("hello", None).is_none());
    }

    #[test]
    fn test_schema_to_format_defaults_to_source() {
        let schema = parse_schema("erDiagram\nA { int id PK }", None).unwrap();
        assert!(schema_to_format(&schema, None).starts_with("erDiagram"));
        assert!(schema_to_format(&schema, Some(Format::Sql)).starts_with("CREATE TABLE A"));
    }

    #[test]
    fn test_identify_valid_blocks_dispatch() {
        let ranges = identify_valid_blocks("erDiagram\nnot a line", None);
        assert!(ranges.iter().any(|r| !r.is_valid));
        assert_eq!(ranges.last().unwrap().end, 20);
    }
}
