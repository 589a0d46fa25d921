use super::types::Database;
use crate::search::{build_sql, Query, QueryExecutionError, QueryExecutor, Value};
use async_trait::async_trait;
use sqlx::query::QueryAs;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};

#[async_trait]
impl<T> QueryExecutor<T> for Database
where
    T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin + 'static,
{
    async fn execute(&self, query: &Query) -> Result<Vec<T>, QueryExecutionError> {
        let (sql, values) = build_sql(query);
        tracing::debug!(
            table = query.table,
            predicates = query.predicates.len(),
            sql = %sql,
            "executing search query"
        );

        let mut prepared = sqlx::query_as::<_, T>(&sql);
        for value in values {
            prepared = bind_value(prepared, value);
        }

        prepared.fetch_all(&self.pool).await.map_err(|e| {
            tracing::warn!(table = query.table, error = %e, "search query failed");
            QueryExecutionError::Store(e)
        })
    }
}

fn bind_value<'q, T>(
    query: QueryAs<'q, Sqlite, T, SqliteArguments<'q>>,
    value: Value,
) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>> {
    match value {
        Value::Text(s) => query.bind(s),
        Value::Integer(i) => query.bind(i),
        Value::Bool(b) => query.bind(b),
    }
}
