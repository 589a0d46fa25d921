//! In-process document store holding JSON collections.
//!
//! Queries run through the same `Query` model as the relational store and are
//! evaluated by `search::eval`. Documents are decoded into typed records only
//! after matching.

pub mod accounts;
pub mod customers;

pub use accounts::{Account, AccountSearch};
pub use customers::{Customer, CustomerSearch};

use crate::search::{evaluate, Collections, Document, Query, QueryExecutionError, QueryExecutor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const CUSTOMERS: &str = "customers";
pub const ACCOUNTS: &str = "accounts";

#[derive(Clone, Default)]
pub struct DocumentStore {
    collections: Arc<RwLock<Collections>>,
}

impl DocumentStore {
    /// Empty store with the customer and account collections registered
    pub fn storefront() -> Self {
        let mut collections = Collections::new();
        collections.insert(CUSTOMERS.to_string(), Vec::new());
        collections.insert(ACCOUNTS.to_string(), Vec::new());
        Self::with_collections(collections)
    }

    pub fn with_collections(collections: Collections) -> Self {
        Self {
            collections: Arc::new(RwLock::new(collections)),
        }
    }

    /// Load `{ "<collection>": [ {...}, ... ], ... }` from a JSON file.
    ///
    /// The customer and account collections always exist afterwards, even if
    /// the file omits them.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs_err::read_to_string(path)?;
        let mut collections: Collections = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid document seed file {}", path.display()))?;
        for name in [CUSTOMERS, ACCOUNTS] {
            collections.entry(name.to_string()).or_default();
        }

        let counts: Vec<(String, usize)> = collections
            .iter()
            .map(|(name, docs)| (name.clone(), docs.len()))
            .collect();
        tracing::info!(path = %path.display(), collections = ?counts, "loaded document store");

        Ok(Self::with_collections(collections))
    }

    /// Append a record to `collection`, creating the collection if needed
    pub async fn insert<T: Serialize>(&self, collection: &str, record: &T) -> Result<()> {
        self.insert_checked(collection, record, |_| Ok(())).await
    }

    /// Append a record once `check` accepts the current collections.
    /// The check and the append happen under one write lock.
    pub(crate) async fn insert_checked<T, F>(
        &self,
        collection: &str,
        record: &T,
        check: F,
    ) -> Result<()>
    where
        T: Serialize,
        F: FnOnce(&Collections) -> Result<()>,
    {
        let document = to_document(record)?;
        let mut collections = self.collections.write().await;
        check(&collections)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Delete a customer and its accounts, accounts first, under one write lock.
    /// Returns `false` if no such customer exists.
    pub async fn delete_customer(&self, id: &str) -> bool {
        let mut collections = self.collections.write().await;
        let accounts = remove_where(&mut collections, ACCOUNTS, "customer_id", id);
        let customers = remove_where(&mut collections, CUSTOMERS, "id", id);
        drop(collections);

        if customers > 0 {
            tracing::info!(customer_id = id, accounts, "deleted customer and accounts");
        }
        customers > 0
    }
}

/// Remove documents of `collection` whose `field` equals `value`.
/// Returns how many were removed.
fn remove_where(
    collections: &mut Collections,
    collection: &str,
    field: &str,
    value: &str,
) -> usize {
    let Some(docs) = collections.get_mut(collection) else {
        return 0;
    };
    let before = docs.len();
    docs.retain(|doc| doc.get(field).and_then(|v| v.as_str()) != Some(value));
    before - docs.len()
}

fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record)? {
        serde_json::Value::Object(document) => Ok(document),
        other => Err(anyhow::anyhow!(
            "documents must serialize to JSON objects, got {}",
            other
        )),
    }
}

#[async_trait]
impl<T> QueryExecutor<T> for DocumentStore
where
    T: DeserializeOwned + Send + 'static,
{
    async fn execute(&self, query: &Query) -> Result<Vec<T>, QueryExecutionError> {
        let matched = {
            let collections = self.collections.read().await;
            evaluate(query, &collections)?
        };
        tracing::debug!(
            collection = query.table,
            predicates = query.predicates.len(),
            matched = matched.len(),
            "evaluated document query"
        );

        matched
            .into_iter()
            .map(|doc| {
                serde_json::from_value(serde_json::Value::Object(doc)).map_err(|source| {
                    QueryExecutionError::Decode {
                        collection: query.table.to_string(),
                        source,
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
