use super::predicate::{EntitySchema, Query, SortKey};
use super::types::FilterSet;
use async_trait::async_trait;
use thiserror::Error;

/// Failure of the underlying store while running a search query.
///
/// Surfaced unchanged to the caller; the builder does no recovery.
#[derive(Debug, Error)]
pub enum QueryExecutionError {
    #[error("store failed to execute query: {0}")]
    Store(#[from] sqlx::Error),
    #[error("failed to decode document from '{collection}': {source}")]
    Decode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
}

/// Query-execution capability of a store: runs a built query and returns
/// the full matching set, or an error. Never a partial result.
#[async_trait]
pub trait QueryExecutor<T>: Send + Sync {
    async fn execute(&self, query: &Query) -> Result<Vec<T>, QueryExecutionError>;
}

/// Build the query for `filters` against `schema` and run it once.
pub async fn search<T, E>(
    executor: &E,
    schema: &EntitySchema,
    filters: FilterSet,
    order: Option<&[SortKey]>,
) -> Result<Vec<T>, QueryExecutionError>
where
    E: QueryExecutor<T> + ?Sized,
{
    let names = filters.names();
    let mut query = Query::build(schema, filters);
    if let Some(order) = order {
        query = query.order_by(order);
    }
    tracing::debug!(table = schema.table, filters = ?names, "running search");
    executor.execute(&query).await
}
