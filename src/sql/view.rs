//! View column resolution and view-to-table relationships.

use std::collections::HashMap;

use tracing::debug;

use super::parser::{SelectExpr, SelectItem, Statement, TableRef, ViewDef};
use super::types::infer_expression_type;
use crate::model::{Column, Table};

/// A view table plus the tables its FROM clause named.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedView {
    pub table: Table,
    pub referenced: Vec<String>,
}

/// Lower-cased table name and alias, each mapped to a known table's
/// canonical name.
fn alias_map(from: &[TableRef], known: &[Table]) -> HashMap<String, String> {
    from.iter().fold(HashMap::new(), |mut map, r| {
        if let Some(table) = find(known, &r.table) {
            map.insert(r.table.to_lowercase(), table.name.clone());
            if let Some(alias) = &r.alias {
                map.insert(alias.to_lowercase(), table.name.clone());
            }
        }
        map
    })
}

fn find<'a>(tables: &'a [Table], name: &str) -> Option<&'a Table> {
    tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

/// A view column carrying lineage back to `source.column`.
fn derived(source: &Table, column: &Column, name: Option<&str>) -> Column {
    let references = column.references.clone().map(|mut r| {
        r.cardinality = None;
        r
    });
    Column {
        name: name.unwrap_or(&column.name).to_string(),
        typ: column.typ.clone(),
        nullability: column.nullability,
        is_foreign_key: references.is_some(),
        references,
        source_table: Some(source.name.clone()),
        source_column: Some(column.name.clone()),
        ..Column::new("", "")
    }
}

fn resolve_item(
    item: &SelectItem,
    index: usize,
    aliases: &HashMap<String, String>,
    from_tables: &[&Table],
    known: &[Table],
) -> Vec<Column> {
    let alias = item.alias.as_deref();
    let by_alias = |q: &str| {
        aliases
            .get(&q.to_lowercase())
            .and_then(|name| find(known, name))
    };

    match &item.expr {
        SelectExpr::Wildcard => from_tables
            .first()
            .map(|t| t.columns.iter().map(|c| derived(t, c, None)).collect())
            .unwrap_or_default(),
        SelectExpr::QualifiedWildcard(q) => by_alias(q)
            .map(|t| t.columns.iter().map(|c| derived(t, c, None)).collect())
            .unwrap_or_default(),
        SelectExpr::Column {
            qualifier: Some(q),
            name,
        } => {
            let resolved = by_alias(q).and_then(|t| t.column(name).map(|c| derived(t, c, alias)));
            vec![resolved.unwrap_or_else(|| {
                Column::new(alias.unwrap_or(name), infer_expression_type(name))
            })]
        }
        SelectExpr::Column {
            qualifier: None,
            name,
        } => {
            let resolved = from_tables
                .iter()
                .find_map(|t| t.column(name).map(|c| derived(t, c, alias)));
            vec![resolved.unwrap_or_else(|| {
                Column::new(alias.unwrap_or(name), infer_expression_type(name))
            })]
        }
        SelectExpr::Expression(text) => {
            let name = alias.map(str::to_string).unwrap_or_else(|| format!("column_{}", index + 1));
            vec![Column::new(name, infer_expression_type(text))]
        }
    }
}

fn resolve_view(def: &ViewDef, known: &[Table]) -> ResolvedView {
    let aliases = alias_map(&def.from, known);
    let from_tables: Vec<&Table> = def.from.iter().filter_map(|r| find(known, &r.table)).collect();

    let mut table = Table::view(def.name.clone());
    for (i, item) in def.items.iter().enumerate() {
        for column in resolve_item(item, i, &aliases, &from_tables, known) {
            table.upsert_column(column);
        }
    }

    if table.columns.is_empty() {
        debug!(view = %def.name, "no view columns resolved, using placeholders");
        table.columns = vec![
            Column::new("id", "INTEGER"),
            Column::new("name", "TEXT"),
            Column::new("value", "TEXT"),
        ];
    }

    let referenced = from_tables.iter().fold(Vec::new(), |mut acc: Vec<String>, t| {
        if !acc.contains(&t.name) {
            acc.push(t.name.clone());
        }
        acc
    });

    ResolvedView { table, referenced }
}

/// CREATE VIEW statements, resolved against `tables` and earlier views.
/// A view named like a table is skipped; a redefined view replaces the
/// earlier one.
pub fn extract_views(statements: &[Statement], tables: &[Table]) -> Vec<ResolvedView> {
    let mut views: Vec<ResolvedView> = Vec::new();

    for statement in statements {
        let Statement::CreateView(def) = statement else {
            continue;
        };
        if find(tables, &def.name).is_some() {
            debug!(view = %def.name, "view name collides with a table");
            continue;
        }

        let known: Vec<Table> = tables
            .iter()
            .cloned()
            .chain(views.iter().map(|v| v.table.clone()))
            .collect();
        let resolved = resolve_view(def, &known);

        match views
            .iter_mut()
            .find(|v| v.table.name.eq_ignore_ascii_case(&def.name))
        {
            Some(existing) => *existing = resolved,
            None => views.push(resolved),
        }
    }
    views
}

fn link_view(view: ResolvedView, known: &[Table]) -> Table {
    let ResolvedView {
        mut table,
        referenced,
    } = view;

    for target in &referenced {
        let already_linked = table.columns.iter().any(|c| {
            c.references
                .as_ref()
                .is_some_and(|r| r.table.eq_ignore_ascii_case(target))
        });
        if already_linked {
            continue;
        }
        let Some(target_table) = find(known, target) else {
            continue;
        };
        let Some(key) = target_table
            .primary_key()
            .or_else(|| target_table.columns.first())
        else {
            continue;
        };

        let name = format!("_ref_{}", target_table.name);
        if table.column(&name).is_some() {
            continue;
        }
        let mut column = Column::new(name, "INTEGER");
        column.set_reference(target_table.name.clone(), key.name.clone());
        table.columns.push(column);
    }

    for column in table.columns.iter_mut().filter(|c| c.references.is_none()) {
        let lower = column.name.to_lowercase();
        let Some(word) = lower.strip_suffix("_name").filter(|w| !w.is_empty()) else {
            continue;
        };
        let plural = format!("{word}s");
        let target = known.iter().filter(|t| !t.is_view).find(|t| {
            t.name.eq_ignore_ascii_case(word) || t.name.eq_ignore_ascii_case(&plural)
        });
        if let Some((target, key)) = target.and_then(|t| t.primary_key().map(|k| (t, k))) {
            column.set_reference(target.name.clone(), key.name.clone());
        }
    }

    table
}

/// Add `_ref_<table>` columns for FROM/JOIN tables the view has no link to,
/// and link `<word>_name` columns to a table named `word` or `words`.
pub fn synthesize_relationships(views: Vec<ResolvedView>, tables: &[Table]) -> Vec<Table> {
    let known: Vec<Table> = tables
        .iter()
        .cloned()
        .chain(views.iter().map(|v| v.table.clone()))
        .collect();
    views.into_iter().map(|v| link_view(v, &known)).collect()
}
