use super::{DocumentStore, ACCOUNTS, CUSTOMERS};
use crate::search::{
    search, Column, CompareOp, EntitySchema, FilterDef, FilterKind, FilterSet, Membership,
    QueryExecutionError, SortKey,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub cif_id: String,
    #[serde(default)]
    pub ref_key: Option<String>,
    pub customer_type_id: i64,
    pub created_at_ns: i64,
    pub created_by: String,
    #[serde(default)]
    pub updated_at_ns: Option<i64>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

pub const CUSTOMER_SCHEMA: EntitySchema = EntitySchema {
    table: CUSTOMERS,
    default_order: &[SortKey::desc("created_at_ns"), SortKey::desc("id")],
};

const ACCOUNT_IN_STATUS: Membership = Membership {
    table: ACCOUNTS,
    alias: "account",
    correlated_key: "customer_id",
    root_key: "id",
    column: "status_id",
    op: CompareOp::Eq,
};

pub const CUSTOMER_CIF_ID: FilterDef =
    FilterDef::new("cif_id", FilterKind::Substring(Column::root("cif_id")));
pub const CUSTOMER_TYPE_ID: FilterDef = FilterDef::new(
    "customer_type_id",
    FilterKind::Equality(Column::root("customer_type_id")),
);
pub const CUSTOMER_CREATED_BY: FilterDef =
    FilterDef::new("created_by", FilterKind::Equality(Column::root("created_by")));
pub const CUSTOMER_HAS_REF_KEY: FilterDef =
    FilterDef::new("has_ref_key", FilterKind::Existence(Column::root("ref_key")));
pub const CUSTOMER_HAS_ACCOUNT_IN_STATUS: FilterDef = FilterDef::new(
    "has_account_in_status",
    FilterKind::Membership(&ACCOUNT_IN_STATUS),
);

#[derive(Debug, Clone, Default)]
pub struct CustomerSearch {
    pub cif_id: Option<String>,
    pub customer_type_id: Option<i64>,
    pub created_by: Option<String>,
    pub has_ref_key: Option<bool>,
    pub has_account_in_status: Option<i64>,
}

impl CustomerSearch {
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new()
            .with(&CUSTOMER_CIF_ID, self.cif_id.clone())
            .with(&CUSTOMER_TYPE_ID, self.customer_type_id)
            .with(&CUSTOMER_CREATED_BY, self.created_by.clone())
            .with(&CUSTOMER_HAS_REF_KEY, self.has_ref_key)
            .with(&CUSTOMER_HAS_ACCOUNT_IN_STATUS, self.has_account_in_status)
    }
}

impl DocumentStore {
    pub async fn search_customers(
        &self,
        params: &CustomerSearch,
    ) -> Result<Vec<Customer>, QueryExecutionError> {
        search(self, &CUSTOMER_SCHEMA, params.filter_set(), None).await
    }

    pub async fn search_customers_ordered(
        &self,
        params: &CustomerSearch,
        order: &[SortKey],
    ) -> Result<Vec<Customer>, QueryExecutionError> {
        search(self, &CUSTOMER_SCHEMA, params.filter_set(), Some(order)).await
    }

    /// Insert a customer; `id` and `(cif_id, customer_type_id)` must be unique
    pub async fn insert_customer(&self, customer: &Customer) -> Result<()> {
        self.insert_checked(CUSTOMERS, customer, |collections| {
            let existing = collections.get(CUSTOMERS).map(Vec::as_slice).unwrap_or_default();
            for doc in existing {
                if doc.get("id").and_then(JsonValue::as_str) == Some(customer.id.as_str()) {
                    return Err(anyhow::anyhow!("Customer id '{}' already exists", customer.id));
                }
                let same_cif = doc.get("cif_id").and_then(JsonValue::as_str)
                    == Some(customer.cif_id.as_str());
                let same_type = doc.get("customer_type_id").and_then(JsonValue::as_i64)
                    == Some(customer.customer_type_id);
                if same_cif && same_type {
                    return Err(anyhow::anyhow!(
                        "Customer with CIF '{}' and type {} already exists",
                        customer.cif_id,
                        customer.customer_type_id
                    ));
                }
            }
            Ok(())
        })
        .await
    }
}
