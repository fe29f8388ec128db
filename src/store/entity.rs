//! The [`Entity`] trait: how one record kind maps onto its table and its cache.
//!
//! The facade in [`Store`](super::Store) is generic over this trait, so cache
//! discipline (read-through, invalidate after commit) lives in one place and
//! each kind only supplies its SQL.

use std::fmt::Debug;
use std::hash::Hash;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, Transaction};

use super::cache::{Caches, EntityCache};
use super::types::EntityKind;

pub trait Entity: Clone + Send + Sync + Sized + 'static {
    /// Cache and lookup key.
    type Id: Clone + Debug + Eq + Hash + Send + Sync + 'static;
    /// Criteria accepted by [`Store::list`](super::Store::list).
    type Filter: Default;

    const KIND: EntityKind;

    fn cache(caches: &Caches) -> &EntityCache<Self::Id, Self>;

    fn fetch(conn: &Connection, id: &Self::Id) -> rusqlite::Result<Option<Self>>;

    fn query(conn: &Connection, filter: &Self::Filter) -> rusqlite::Result<Vec<Self>>;

    /// Insert or update `record`, returning the key it was stored under.
    fn write(tx: &Transaction<'_>, record: &Self) -> rusqlite::Result<Self::Id>;

    /// Delete by key, returning the number of rows removed.
    fn remove(tx: &Transaction<'_>, id: &Self::Id) -> rusqlite::Result<usize>;
}

/// Accumulates `WHERE` clauses and their positional parameters.
#[derive(Default)]
pub(crate) struct Conditions {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Conditions {
    pub fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.clauses.push(format!("{column} = ?"));
        self.params.push(value.into());
        self
    }

    pub fn any_of(&mut self, column: &str, values: impl IntoIterator<Item = Value>) -> &mut Self {
        let values: Vec<Value> = values.into_iter().collect();
        if values.is_empty() {
            return self;
        }
        let marks = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{column} IN ({marks})"));
        self.params.extend(values);
        self
    }

    /// Arbitrary predicate whose `?` placeholders take `values` in order.
    pub fn clause(&mut self, sql: &str, values: impl IntoIterator<Item = Value>) -> &mut Self {
        self.clauses.push(format!("({sql})"));
        self.params.extend(values);
        self
    }

    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Run `sql` (which must embed [`where_sql`](Self::where_sql)) and map every row.
    pub fn collect<T>(
        &self,
        conn: &Connection,
        sql: &str,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<Vec<T>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(self.params.iter()), map)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

/// `LIMIT`/`OFFSET` suffix. SQLite needs a `LIMIT` whenever `OFFSET` is present.
pub(crate) fn page_sql(limit: Option<usize>, offset: Option<usize>) -> String {
    match (limit, offset) {
        (Some(l), Some(o)) => format!("LIMIT {l} OFFSET {o}"),
        (Some(l), None) => format!("LIMIT {l}"),
        (None, Some(o)) => format!("LIMIT -1 OFFSET {o}"),
        (None, None) => String::new(),
    }
}

pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditions_render_where_clause() {
        let mut c = Conditions::default();
        assert_eq!(c.where_sql(), "");

        c.eq("creator_id", 7i64)
            .any_of("visibility", ["PUBLIC".to_string(), "PROTECTED".to_string()].map(Value::from));
        assert_eq!(c.where_sql(), "WHERE creator_id = ? AND visibility IN (?, ?)");
        assert_eq!(c.params.len(), 3);
    }

    #[test]
    fn clause_is_parenthesized_and_keeps_param_order() {
        let mut c = Conditions::default();
        c.eq("creator_id", 1i64)
            .clause("a = ? OR b = ?", [Value::from(2i64), Value::from(3i64)]);
        assert_eq!(c.where_sql(), "WHERE creator_id = ? AND (a = ? OR b = ?)");
        assert_eq!(
            c.params,
            [Value::Integer(1), Value::Integer(2), Value::Integer(3)]
        );
    }

    #[test]
    fn empty_any_of_adds_nothing() {
        let mut c = Conditions::default();
        c.any_of("visibility", Vec::new());
        assert_eq!(c.where_sql(), "");
    }

    #[test]
    fn page_sql_forms() {
        assert_eq!(page_sql(None, None), "");
        assert_eq!(page_sql(Some(10), None), "LIMIT 10");
        assert_eq!(page_sql(Some(10), Some(5)), "LIMIT 10 OFFSET 5");
        assert_eq!(page_sql(None, Some(5)), "LIMIT -1 OFFSET 5");
    }
}
