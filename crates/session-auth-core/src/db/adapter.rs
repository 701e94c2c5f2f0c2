// Database adapter trait — the persistence seam every backend implements.
//
// Records are exchanged as `serde_json::Value` so the trait stays
// schema-agnostic; typed models live in `db::models`.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Result type for adapter operations.
pub type AdapterResult<T> = std::result::Result<T, AuthError>;

// ─── Where Clause ────────────────────────────────────────────────

/// Comparison operators for WHERE clauses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Equal (default).
    #[default]
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Value is in the given list.
    In,
}

/// A single WHERE condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhereClause {
    pub field: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub operator: Operator,
    /// Connector to the next clause. None means this is the last/only clause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<Connector>,
}

/// Logical connector between WHERE clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    And,
    Or,
}

impl WhereClause {
    /// Simple equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self::with_operator(field, Operator::Eq, value)
    }

    pub fn with_operator(
        field: impl Into<String>,
        operator: Operator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            operator,
            connector: None,
        }
    }

    /// Add an AND connector.
    pub fn and(mut self) -> Self {
        self.connector = Some(Connector::And);
        self
    }

    /// Add an OR connector.
    pub fn or(mut self) -> Self {
        self.connector = Some(Connector::Or);
        self
    }
}

// ─── Sort / Pagination ───────────────────────────────────────────

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort specification (field + direction).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortBy {
    pub field: String,
    pub direction: SortDirection,
}

impl SortBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Query parameters for `find_many`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyQuery {
    pub where_clauses: Vec<WhereClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
}

// ─── Adapter Trait ───────────────────────────────────────────────

/// The database adapter trait.
///
/// Backends implement the CRUD primitives; `find_first` and
/// `find_first_or_throw` are built on `find_many`.
#[async_trait]
pub trait Adapter: Send + Sync + fmt::Debug {
    /// Create a new record in the given model/table.
    /// Returns the created record (with a generated `id` if none was given).
    async fn create(&self, model: &str, data: serde_json::Value) -> AdapterResult<serde_json::Value>;

    /// Find a single record matching the WHERE clauses.
    /// Returns `None` if no match found.
    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<Option<serde_json::Value>>;

    /// Find multiple records matching the query parameters.
    async fn find_many(
        &self,
        model: &str,
        query: FindManyQuery,
    ) -> AdapterResult<Vec<serde_json::Value>>;

    /// Count records matching the WHERE clauses.
    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64>;

    /// Update a single record matching the WHERE clauses. Fields in `data`
    /// replace the record's fields. Returns `None` if nothing matched.
    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> AdapterResult<Option<serde_json::Value>>;

    /// Delete a single record matching the WHERE clauses.
    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()>;

    /// Delete multiple records matching the WHERE clauses.
    /// Returns the number of deleted rows.
    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64>;

    /// First record matching the clauses under the given ordering.
    async fn find_first(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        sort_by: Option<SortBy>,
    ) -> AdapterResult<Option<serde_json::Value>> {
        let query = FindManyQuery {
            where_clauses: where_clauses.to_vec(),
            limit: Some(1),
            offset: None,
            sort_by,
        };
        Ok(self.find_many(model, query).await?.into_iter().next())
    }

    /// Like [`Adapter::find_first`], but a missing record is an
    /// [`AuthError::NotFound`] error.
    async fn find_first_or_throw(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        sort_by: Option<SortBy>,
    ) -> AdapterResult<serde_json::Value> {
        self.find_first(model, where_clauses, sort_by)
            .await?
            .ok_or_else(|| AuthError::not_found(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_builders() {
        let clause = WhereClause::eq("userId", "u1").or();
        assert_eq!(clause.field, "userId");
        assert_eq!(clause.value, serde_json::json!("u1"));
        assert_eq!(clause.operator, Operator::Eq);
        assert_eq!(clause.connector, Some(Connector::Or));
    }

    #[test]
    fn test_sort_by_serialization() {
        let sort = SortBy::desc("expires");
        let value = serde_json::to_value(&sort).unwrap();
        assert_eq!(value, serde_json::json!({"field": "expires", "direction": "desc"}));
    }

    /// Adapter stub whose `find_many` returns a fixed set, to exercise the
    /// provided `find_first*` methods.
    #[derive(Debug)]
    struct FixedRows(Vec<serde_json::Value>);

    #[async_trait]
    impl Adapter for FixedRows {
        async fn create(&self, _: &str, data: serde_json::Value) -> AdapterResult<serde_json::Value> {
            Ok(data)
        }
        async fn find_one(&self, _: &str, _: &[WhereClause]) -> AdapterResult<Option<serde_json::Value>> {
            Ok(self.0.first().cloned())
        }
        async fn find_many(&self, _: &str, query: FindManyQuery) -> AdapterResult<Vec<serde_json::Value>> {
            assert_eq!(query.limit, Some(1));
            Ok(self.0.clone())
        }
        async fn count(&self, _: &str, _: &[WhereClause]) -> AdapterResult<i64> {
            Ok(self.0.len() as i64)
        }
        async fn update(&self, _: &str, _: &[WhereClause], _: serde_json::Value) -> AdapterResult<Option<serde_json::Value>> {
            Ok(None)
        }
        async fn delete(&self, _: &str, _: &[WhereClause]) -> AdapterResult<()> {
            Ok(())
        }
        async fn delete_many(&self, _: &str, _: &[WhereClause]) -> AdapterResult<i64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_find_first_or_throw_missing() {
        let adapter = FixedRows(Vec::new());
        let err = adapter
            .find_first_or_throw("session", &[], Some(SortBy::desc("expires")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound { ref model } if model == "session"));
    }

    #[tokio::test]
    async fn test_find_first_takes_head() {
        let adapter = FixedRows(vec![serde_json::json!({"id": "a"}), serde_json::json!({"id": "b"})]);
        let found = adapter.find_first("session", &[], None).await.unwrap();
        assert_eq!(found.unwrap()["id"], "a");
    }
}
