// In-memory database adapter — HashMap-based store implementing the core Adapter trait.
//
// Stores data in `HashMap<String, Vec<serde_json::Value>>` keyed by model name.
// Thread-safe via `tokio::sync::RwLock`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use tokio::sync::RwLock;

use session_auth_core::db::adapter::{
    Adapter, AdapterResult, Connector, FindManyQuery, Operator, SortDirection, WhereClause,
};
use session_auth_core::error::AuthError;

/// Type alias for the in-memory store.
type Store = HashMap<String, Vec<serde_json::Value>>;

/// Value compared against when a record lacks the filtered field.
static MISSING: serde_json::Value = serde_json::Value::Null;

/// In-memory database adapter.
///
/// Clones share the same store. Data is lost when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct MemoryAdapter {
    store: Arc<RwLock<Store>>,
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAdapter {
    /// Create a new empty in-memory adapter.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get a snapshot of all data (for debugging/testing).
    pub async fn snapshot(&self) -> Store {
        self.store.read().await.clone()
    }

    /// Clear all data.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    /// Get record count for a specific model.
    pub async fn model_count(&self, model: &str) -> usize {
        self.store
            .read()
            .await
            .get(model)
            .map(|v| v.len())
            .unwrap_or(0)
    }
}

/// Check if a record matches a set of WHERE clauses.
fn matches_where(record: &serde_json::Value, clauses: &[WhereClause]) -> bool {
    let mut result = true;
    let mut pending_or = false;

    for clause in clauses {
        let field_val = record.get(&clause.field).unwrap_or(&MISSING);
        let clause_match = match_operator(field_val, &clause.value, &clause.operator);

        if pending_or {
            result = result || clause_match;
        } else {
            result = result && clause_match;
        }

        pending_or = matches!(clause.connector, Some(Connector::Or));
    }

    result
}

/// Match a single operator condition.
fn match_operator(field_val: &serde_json::Value, target: &serde_json::Value, op: &Operator) -> bool {
    match op {
        Operator::Eq => field_val == target,
        Operator::Ne => field_val != target,
        Operator::Lt => compare_json(field_val, target) == Some(Ordering::Less),
        Operator::Lte => matches!(compare_json(field_val, target), Some(Ordering::Less | Ordering::Equal)),
        Operator::Gt => compare_json(field_val, target) == Some(Ordering::Greater),
        Operator::Gte => matches!(compare_json(field_val, target), Some(Ordering::Greater | Ordering::Equal)),
        Operator::In => match target {
            serde_json::Value::Array(arr) => arr.contains(field_val),
            _ => false,
        },
    }
}

/// Compare two JSON values. Numbers compare numerically; strings that are
/// both RFC 3339 timestamps compare as instants, other strings
/// lexicographically.
fn compare_json(a: &serde_json::Value, b: &serde_json::Value) -> Option<Ordering> {
    match (a, b) {
        (serde_json::Value::Number(an), serde_json::Value::Number(bn)) => {
            an.as_f64()?.partial_cmp(&bn.as_f64()?)
        }
        (serde_json::Value::String(a_s), serde_json::Value::String(b_s)) => {
            match (DateTime::parse_from_rfc3339(a_s), DateTime::parse_from_rfc3339(b_s)) {
                (Ok(a_t), Ok(b_t)) => Some(a_t.cmp(&b_t)),
                _ => Some(a_s.cmp(b_s)),
            }
        }
        _ => None,
    }
}

/// Merge update data into an existing record.
fn merge_update(record: &mut serde_json::Value, data: &serde_json::Value) {
    if let (Some(rec_obj), Some(data_obj)) = (record.as_object_mut(), data.as_object()) {
        for (k, v) in data_obj {
            rec_obj.insert(k.clone(), v.clone());
        }
    }
}

/// Apply sorting to records. Records missing the field sort first.
fn sort_records(records: &mut [serde_json::Value], query: &FindManyQuery) {
    if let Some(ref sort) = query.sort_by {
        records.sort_by(|a, b| {
            let cmp = match (a.get(&sort.field), b.get(&sort.field)) {
                (Some(av), Some(bv)) => compare_json(av, bv).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            match sort.direction {
                SortDirection::Asc => cmp,
                SortDirection::Desc => cmp.reverse(),
            }
        });
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn create(&self, model: &str, data: serde_json::Value) -> AdapterResult<serde_json::Value> {
        let serde_json::Value::Object(mut record) = data else {
            return Err(AuthError::Database(format!("{model} record must be a JSON object")));
        };

        // Auto-generate ID if not present
        if record.get("id").map_or(true, serde_json::Value::is_null) {
            record.insert(
                "id".to_string(),
                serde_json::Value::String(uuid::Uuid::new_v4().to_string()),
            );
        }

        let record = serde_json::Value::Object(record);
        let mut store = self.store.write().await;
        store
            .entry(model.to_string())
            .or_default()
            .push(record.clone());

        Ok(record)
    }

    async fn find_one(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
    ) -> AdapterResult<Option<serde_json::Value>> {
        let store = self.store.read().await;
        Ok(store
            .get(model)
            .and_then(|recs| recs.iter().find(|r| matches_where(r, where_clauses)).cloned()))
    }

    async fn find_many(
        &self,
        model: &str,
        query: FindManyQuery,
    ) -> AdapterResult<Vec<serde_json::Value>> {
        let store = self.store.read().await;
        let empty = Vec::new();
        let records = store.get(model).unwrap_or(&empty);

        let mut result: Vec<serde_json::Value> = records
            .iter()
            .filter(|r| matches_where(r, &query.where_clauses))
            .cloned()
            .collect();

        sort_records(&mut result, &query);

        // Negative offsets and limits count as zero.
        if let Some(offset) = query.offset {
            let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
            if offset < result.len() {
                result = result.split_off(offset);
            } else {
                result.clear();
            }
        }

        if let Some(limit) = query.limit {
            result.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        }

        Ok(result)
    }

    async fn count(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        let store = self.store.read().await;
        let count = store
            .get(model)
            .map(|recs| recs.iter().filter(|r| matches_where(r, where_clauses)).count())
            .unwrap_or(0);
        Ok(count as i64)
    }

    async fn update(
        &self,
        model: &str,
        where_clauses: &[WhereClause],
        data: serde_json::Value,
    ) -> AdapterResult<Option<serde_json::Value>> {
        let mut store = self.store.write().await;
        let found = store
            .get_mut(model)
            .and_then(|recs| recs.iter_mut().find(|r| matches_where(r, where_clauses)));

        Ok(found.map(|record| {
            merge_update(record, &data);
            record.clone()
        }))
    }

    async fn delete(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<()> {
        let mut store = self.store.write().await;
        if let Some(recs) = store.get_mut(model) {
            if let Some(pos) = recs.iter().position(|r| matches_where(r, where_clauses)) {
                recs.remove(pos);
            }
        }
        Ok(())
    }

    async fn delete_many(&self, model: &str, where_clauses: &[WhereClause]) -> AdapterResult<i64> {
        let mut store = self.store.write().await;
        if let Some(recs) = store.get_mut(model) {
            let before = recs.len();
            recs.retain(|r| !matches_where(r, where_clauses));
            Ok((before - recs.len()) as i64)
        } else {
            Ok(0)
        }
    }
}
