//! Table categorisation and colour assignment.

use std::collections::HashMap;

use crate::model::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub name: String,
    /// Lower-case substrings matched against the lower-cased table name.
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn matches(&self, table_name: &str) -> bool {
        self.keywords.iter().any(|k| table_name.contains(k.as_str()))
    }
}

/// Palette and keyword table used to categorise parsed tables.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryConfig {
    pub palette: Vec<String>,
    pub rules: Vec<CategoryRule>,
    pub view_category: String,
    pub fallback_category: String,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        let palette = [
            "#4F86F7", "#F76C5E", "#50C878", "#FFB347", "#9B59B6", "#1ABC9C", "#E67E22",
            "#3498DB", "#E84393", "#95A5A6", "#2ECC71", "#F1C40F", "#00B8D4", "#C0392B",
            "#7F8C8D",
        ];

        Self {
            palette: palette.iter().map(|c| c.to_string()).collect(),
            rules: vec![
                CategoryRule::new(
                    "Users & Auth",
                    &["user", "account", "auth", "role", "permission", "session", "profile", "member", "login"],
                ),
                CategoryRule::new(
                    "Commerce",
                    &["order", "product", "cart", "payment", "invoice", "price", "customer", "shipping", "discount", "coupon"],
                ),
                CategoryRule::new(
                    "Inventory",
                    &["inventory", "stock", "warehouse", "supplier", "vendor", "item"],
                ),
                CategoryRule::new(
                    "Content",
                    &["post", "comment", "article", "page", "media", "tag", "blog", "review", "category"],
                ),
                CategoryRule::new(
                    "Messaging",
                    &["message", "notification", "email", "chat", "thread"],
                ),
                CategoryRule::new(
                    "Analytics",
                    &["log", "event", "metric", "audit", "stat", "report", "history"],
                ),
                CategoryRule::new(
                    "Organization",
                    &["company", "department", "employee", "team", "organization", "project", "task"],
                ),
                CategoryRule::new(
                    "Location",
                    &["address", "country", "city", "region", "location"],
                ),
            ],
            view_category: "Views".to_string(),
            fallback_category: "General".to_string(),
        }
    }
}

impl CategoryConfig {
    pub fn category_for(&self, table: &Table) -> String {
        if table.is_view {
            return self.view_category.clone();
        }
        let lower = table.name.to_lowercase();
        self.rules
            .iter()
            .find(|r| r.matches(&lower))
            .map(|r| r.name.clone())
            .unwrap_or_else(|| self.fallback_category.clone())
    }

    /// Colour per category, in order of first appearance.
    pub fn color_map<'a, I>(&self, categories: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        categories.into_iter().fold(HashMap::new(), |mut map, category| {
            if !map.contains_key(category) {
                let color = if self.palette.is_empty() {
                    String::from("#888888")
                } else {
                    self.palette[map.len() % self.palette.len()].clone()
                };
                map.insert(category.to_string(), color);
            }
            map
        })
    }
}

/// Return `tables` with `category` and `color` filled in from `config`.
pub fn assign_categories(tables: Vec<Table>, config: &CategoryConfig) -> Vec<Table> {
    let categories: Vec<String> = tables.iter().map(|t| config.category_for(t)).collect();
    let colors = config.color_map(categories.iter().map(String::as_str));

    tables
        .into_iter()
        .zip(categories)
        .map(|(table, category)| Table {
            color: colors.get(&category).cloned().unwrap_or_default(),
            category,
            ..table
        })
        .collect()
}
