//! Incremental SQL builder for filtered list queries.
//!
//! # Invariants
//! - User input only ever reaches SQL through bind values.
//! - LIKE patterns escape `%`, `_` and `\` so user text matches literally.
//! - Patterns are lowercased with Unicode rules; searched columns must be
//!   wrapped in the `unicode_lower` SQL function registered by
//!   [`crate::db::open_db`], since SQLite `LIKE` only folds ASCII.

use rusqlite::types::Value;

/// SQL text plus positional bind values, built clause by clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    sql: String,
    bind_values: Vec<Value>,
}

impl SqlQuery {
    /// Starts from a `SELECT ... WHERE <condition>` statement.
    pub fn new(select_where: &str) -> Self {
        Self {
            sql: select_where.to_string(),
            bind_values: Vec::new(),
        }
    }

    /// Appends `AND <clause>` with its bind values.
    pub fn and_where(&mut self, clause: &str, values: impl IntoIterator<Item = Value>) {
        self.sql.push_str(" AND ");
        self.sql.push_str(clause);
        self.bind_values.extend(values);
    }

    /// Appends `AND (p1 OR p2 ...)`, binding the same LIKE pattern to each
    /// predicate. Each predicate must hold exactly one `?` placeholder.
    pub fn and_any_like(&mut self, predicates: &[&str], text: &str) {
        if predicates.is_empty() {
            return;
        }
        let pattern = like_pattern(text);
        self.sql.push_str(" AND (");
        self.sql.push_str(&predicates.join(" OR "));
        self.sql.push(')');
        self.bind_values
            .extend(predicates.iter().map(|_| Value::Text(pattern.clone())));
    }

    pub fn order_by(&mut self, clause: &str) {
        self.sql.push_str(" ORDER BY ");
        self.sql.push_str(clause);
    }

    pub fn paginate(&mut self, limit: u32, offset: u32) {
        self.sql.push_str(" LIMIT ?");
        self.bind_values.push(Value::Integer(i64::from(limit)));
        if offset > 0 {
            self.sql.push_str(" OFFSET ?");
            self.bind_values.push(Value::Integer(i64::from(offset)));
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn bind_values(&self) -> &[Value] {
        &self.bind_values
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.bind_values)
    }
}

/// Wraps lowercased user text into a `%...%` pattern for
/// `unicode_lower(col) LIKE ? ESCAPE '\'`.
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::{like_pattern, SqlQuery};
    use rusqlite::types::Value;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn like_pattern_lowercases_non_ascii() {
        assert_eq!(like_pattern("ÑAPA Éxito"), "%ñapa éxito%");
    }

    #[test]
    fn builder_appends_clauses_in_order() {
        let mut query = SqlQuery::new("SELECT id FROM lessons l WHERE l.status = 'active'");
        query.and_where("l.country = ?", [Value::Text("CO".to_string())]);
        query.and_any_like(
            &["l.title LIKE ? ESCAPE '\\'", "l.description LIKE ? ESCAPE '\\'"],
            "parce",
        );
        query.order_by("l.created_at DESC");
        query.paginate(10, 20);

        assert_eq!(
            query.sql(),
            "SELECT id FROM lessons l WHERE l.status = 'active' AND l.country = ? \
             AND (l.title LIKE ? ESCAPE '\\' OR l.description LIKE ? ESCAPE '\\') \
             ORDER BY l.created_at DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(query.bind_values().len(), 5);
    }

    #[test]
    fn zero_offset_is_omitted() {
        let mut query = SqlQuery::new("SELECT 1 WHERE 1");
        query.paginate(5, 0);
        assert!(!query.sql().contains("OFFSET"));
    }
}
