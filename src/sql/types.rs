//! Column type normalisation and view expression type inference.

/// Words that continue a multi-word type name (`DOUBLE PRECISION`,
/// `TIMESTAMP WITH TIME ZONE`, `INT UNSIGNED`).
pub fn is_type_continuation(word: &str) -> bool {
    matches!(
        word.to_uppercase().as_str(),
        "PRECISION" | "VARYING" | "UNSIGNED" | "SIGNED" | "ZEROFILL" | "WITH" | "WITHOUT" | "TIME" | "ZONE"
    )
}

/// Join type words into the canonical upper-case spelling.
pub fn normalize_type(words: &[String]) -> String {
    words
        .iter()
        .map(|w| w.split_whitespace().collect::<String>().to_uppercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best-effort type for a view column computed from an expression.
pub fn infer_expression_type(expr: &str) -> &'static str {
    let upper = expr.to_uppercase();
    let words: Vec<&str> = upper
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect();

    let has_word = |candidates: &[&str]| words.iter().any(|w| candidates.contains(w));
    let has_part = |candidates: &[&str]| words.iter().any(|w| candidates.iter().any(|c| w.contains(c)));

    if has_word(&["COUNT", "SUM", "AVG", "MIN", "MAX"]) {
        "INTEGER"
    } else if has_word(&["NOW", "CURRENT_DATE", "CURRENT_TIMESTAMP", "DATE_TRUNC", "EXTRACT"])
        || has_part(&["DATE", "TIME", "_AT"])
    {
        "TIMESTAMP"
    } else if has_part(&["PRICE", "AMOUNT", "TOTAL", "COST", "BALANCE", "REVENUE", "RATE", "ROUND"]) {
        "DECIMAL"
    } else {
        "TEXT"
    }
}
