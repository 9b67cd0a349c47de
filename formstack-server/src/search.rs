//! Free-text search expressions for template search.
//!
//! Each whitespace-separated word becomes a prefix match and the words are
//! OR-ed together. Operator characters inside words are passed through
//! untouched, so `build_search_query("a:b")` is handed to the engine as-is.

/// Text-search syntax to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDialect {
    /// PostgreSQL `to_tsquery` syntax: `hello:* | world:*`
    Postgres,
    /// SQLite FTS5 `MATCH` syntax: `hello* OR world*`
    Sqlite,
}

impl SearchDialect {
    fn prefix_suffix(&self) -> &'static str {
        match self {
            SearchDialect::Postgres => ":*",
            SearchDialect::Sqlite => "*",
        }
    }

    fn or_operator(&self) -> &'static str {
        match self {
            SearchDialect::Postgres => " | ",
            SearchDialect::Sqlite => " OR ",
        }
    }
}

/// Builds a prefix-match OR query from raw user input.
/// Returns an empty string when `raw` has no words.
pub fn build_search_query(raw: &str, dialect: SearchDialect) -> String {
    raw.split_whitespace()
        .map(|token| format!("{token}{}", dialect.prefix_suffix()))
        .collect::<Vec<_>>()
        .join(dialect.or_operator())
}
