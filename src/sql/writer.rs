//! Schema to SQL DDL.

use super::lexer::keyword;
use crate::measure::{max_width, pad_to};
use crate::model::{Column, DatabaseSchema, Nullability, Table};

/// Regenerate `CREATE TABLE` statements, then one `CREATE VIEW` per view.
///
/// View bodies are not kept by the parser. Each view is rebuilt as a
/// select of its lineage columns (`source.column`), with `NULL` standing in
/// for computed ones, from every table it was linked to. Reading that back
/// yields the same columns and view relationships; expressions, filters and
/// join conditions are lost.
pub fn schema_to_sql(schema: &DatabaseSchema) -> String {
    let mut output = String::new();

    for table in schema.tables.iter().filter(|t| !t.is_view) {
        if !output.is_empty() {
            output.push('\n');
        }
        write_table(&mut output, table);
    }

    let views: Vec<&Table> = schema.tables.iter().filter(|t| t.is_view).collect();
    if !views.is_empty() && !output.is_empty() {
        output.push('\n');
    }
    for view in views {
        write_view(&mut output, view);
    }

    output
}

fn write_table(output: &mut String, table: &Table) {
    let columns: Vec<&Column> = table.columns.iter().filter(|c| !c.is_virtual()).collect();
    let names: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
    let width = max_width(names.iter().map(String::as_str));

    output.push_str(&format!("CREATE TABLE {} (\n", quote_ident(&table.name)));
    let mut lines: Vec<String> = columns
        .iter()
        .zip(&names)
        .map(|(column, name)| format!("    {} {}", pad_to(name, width), column_clause(column)))
        .collect();
    // A column-less table would be dropped when read back
    if lines.is_empty() {
        lines.push(String::from("    id INT"));
    }
    output.push_str(&lines.join(",\n"));
    output.push_str("\n);\n");
}

fn column_clause(column: &Column) -> String {
    let mut clause = if column.typ.trim().is_empty() {
        String::from("TEXT")
    } else {
        column.typ.clone()
    };

    if column.is_primary_key {
        clause.push_str(" PRIMARY KEY");
    } else {
        if column.is_unique {
            clause.push_str(" UNIQUE");
        }
        match column.nullability {
            Nullability::NotNull => clause.push_str(" NOT NULL"),
            Nullability::Nullable => clause.push_str(" NULL"),
            Nullability::Unknown => {}
        }
    }

    if let Some(r) = &column.references {
        clause.push_str(&format!(
            " REFERENCES {}({})",
            quote_ident(&r.table),
            quote_ident(&r.column)
        ));
    }
    clause
}

fn select_item(column: &Column) -> String {
    let name = quote_ident(&column.name);
    match (&column.source_table, &column.source_column) {
        (Some(table), Some(source)) if source == &column.name => {
            format!("{}.{}", quote_ident(table), name)
        }
        (Some(table), Some(source)) => {
            format!("{}.{} AS {}", quote_ident(table), quote_ident(source), name)
        }
        _ => format!("NULL AS {name}"),
    }
}

/// Lineage sources, then `_ref_` targets, without repeats.
fn view_sources(view: &Table) -> Vec<&str> {
    let lineage = view.columns.iter().filter_map(|c| c.source_table.as_deref());
    let linked = view
        .columns
        .iter()
        .filter(|c| c.is_virtual())
        .filter_map(|c| c.references.as_ref().map(|r| r.table.as_str()));

    lineage.chain(linked).fold(Vec::new(), |mut acc, name| {
        if !acc.iter().any(|seen: &&str| seen.eq_ignore_ascii_case(name)) {
            acc.push(name);
        }
        acc
    })
}

fn write_view(output: &mut String, view: &Table) {
    let items: Vec<String> = view
        .columns
        .iter()
        .filter(|c| !c.is_virtual())
        .map(select_item)
        .collect();
    let items = if items.is_empty() {
        String::from("NULL AS id")
    } else {
        items.join(", ")
    };

    let mut sources = view_sources(view);
    // FROM is mandatory; the view's own name resolves to nothing
    if sources.is_empty() {
        sources.push(view.name.as_str());
    }
    let sources: Vec<String> = sources.into_iter().map(quote_ident).collect();

    output.push_str(&format!(
        "CREATE VIEW {} AS SELECT {} FROM {};\n",
        quote_ident(&view.name),
        items,
        sources.join(", ")
    ));
}

fn is_plain_word(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Bare when it lexes back as the same identifier, double-quoted otherwise.
pub fn quote_ident(name: &str) -> String {
    if is_plain_word(name) && keyword(name).is_none() {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
