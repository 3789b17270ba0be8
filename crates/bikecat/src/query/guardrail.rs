use std::fmt::{Display, Formatter};
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlGuardrailViolation {
    pub reason: &'static str,
    pub message: String,
}

impl Display for SqlGuardrailViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SqlGuardrailViolation {}

/// Accepts exactly one SELECT, WITH ... SELECT, or EXPLAIN ... SELECT statement.
pub fn validate_read_only_sql(raw_sql: &str) -> Result<(), SqlGuardrailViolation> {
    let candidate = strip_trailing_semicolons(raw_sql);
    if is_blank_sql(candidate) {
        return Err(violation(
            "empty_statement",
            "SQL query is empty; provide a SELECT/CTE/EXPLAIN-SELECT statement",
        ));
    }

    let without_literals = quoted_text_regex().replace_all(candidate, "''");
    if without_literals.contains(';') {
        return Err(violation(
            "multi_statement",
            "Multi-statement SQL is not allowed; submit exactly one read-only statement",
        ));
    }

    if let Some(keyword) = mutating_keyword_regex()
        .captures(&without_literals)
        .and_then(|captures| captures.get(1))
    {
        return Err(violation(
            "mutating_statement",
            format!(
                "Mutating SQL keyword `{}` is not allowed in read-only mode",
                keyword.as_str().to_ascii_lowercase()
            ),
        ));
    }

    let normalized = without_literals
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();
    let allowed = normalized.starts_with("select")
        || normalized.starts_with("with")
        || normalized.starts_with("explain select")
        || normalized.starts_with("explain query plan select");
    if !allowed {
        return Err(violation(
            "unsupported_statement",
            "Only SELECT, WITH ... SELECT, and EXPLAIN ... SELECT statements are allowed",
        ));
    }

    Ok(())
}

/// True when `sql` holds nothing but whitespace, comments and semicolons.
pub fn is_blank_sql(sql: &str) -> bool {
    comment_regex()
        .replace_all(sql, " ")
        .chars()
        .all(|ch| ch.is_whitespace() || ch == ';')
}

fn strip_trailing_semicolons(raw_sql: &str) -> &str {
    let mut candidate = raw_sql.trim();
    while let Some(stripped) = candidate.strip_suffix(';') {
        candidate = stripped.trim_end();
    }
    candidate
}

fn violation(reason: &'static str, message: impl Into<String>) -> SqlGuardrailViolation {
    SqlGuardrailViolation {
        reason,
        message: message.into(),
    }
}

fn comment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?s)--[^\n]*|/\*.*?(?:\*/|\z)").expect("comment regex should compile")
    })
}

/// String literals and double-quoted identifiers.
fn quoted_text_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"'(?:[^']|'')*'|"(?:[^"]|"")*""#).expect("quoted text regex should compile")
    })
}

fn mutating_keyword_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(
            r"(?i)\b(insert|update|delete|create|alter|drop|truncate|attach|detach|pragma|vacuum|reindex|analyze|begin|commit|rollback|savepoint|release)\b",
        )
        .expect("mutating keyword regex should compile")
    })
}
