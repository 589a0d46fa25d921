use super::{DocumentStore, ACCOUNTS, CUSTOMERS};
use crate::search::{
    search, Column, EntitySchema, FilterDef, FilterKind, FilterSet, QueryExecutionError, SortKey,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub customer_id: String,
    pub product_id: String,
    pub product_code: String,
    pub product_category: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub parent_account_id: Option<String>,
    pub account_category_id: i64,
    pub status_id: i64,
    pub interest_type: String,
    pub created_at_ns: i64,
    pub created_by: String,
    #[serde(default)]
    pub updated_at_ns: Option<i64>,
    #[serde(default)]
    pub updated_by: Option<String>,
}

pub const ACCOUNT_SCHEMA: EntitySchema = EntitySchema {
    table: ACCOUNTS,
    default_order: &[SortKey::desc("created_at_ns"), SortKey::desc("id")],
};

pub const ACCOUNT_CUSTOMER_ID: FilterDef = FilterDef::new(
    "customer_id",
    FilterKind::Equality(Column::root("customer_id")),
);
pub const ACCOUNT_STATUS_ID: FilterDef =
    FilterDef::new("status_id", FilterKind::Equality(Column::root("status_id")));
pub const ACCOUNT_CATEGORY_ID: FilterDef = FilterDef::new(
    "account_category_id",
    FilterKind::Equality(Column::root("account_category_id")),
);
pub const ACCOUNT_PRODUCT_CODE: FilterDef = FilterDef::new(
    "product_code",
    FilterKind::Equality(Column::root("product_code")),
);
pub const ACCOUNT_PARENT_ID: FilterDef = FilterDef::new(
    "parent_account_id",
    FilterKind::Equality(Column::root("parent_account_id")),
);
pub const ACCOUNT_NUMBER: FilterDef = FilterDef::new(
    "account_number",
    FilterKind::Substring(Column::root("account_number")),
);

#[derive(Debug, Clone, Default)]
pub struct AccountSearch {
    pub customer_id: Option<String>,
    pub status_id: Option<i64>,
    pub account_category_id: Option<i64>,
    pub product_code: Option<String>,
    pub parent_account_id: Option<String>,
    pub account_number: Option<String>,
}

impl AccountSearch {
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new()
            .with(&ACCOUNT_CUSTOMER_ID, self.customer_id.clone())
            .with(&ACCOUNT_STATUS_ID, self.status_id)
            .with(&ACCOUNT_CATEGORY_ID, self.account_category_id)
            .with(&ACCOUNT_PRODUCT_CODE, self.product_code.clone())
            .with(&ACCOUNT_PARENT_ID, self.parent_account_id.clone())
            .with(&ACCOUNT_NUMBER, self.account_number.clone())
    }
}

impl DocumentStore {
    pub async fn search_accounts(
        &self,
        params: &AccountSearch,
    ) -> Result<Vec<Account>, QueryExecutionError> {
        search(self, &ACCOUNT_SCHEMA, params.filter_set(), None).await
    }

    pub async fn search_accounts_ordered(
        &self,
        params: &AccountSearch,
        order: &[SortKey],
    ) -> Result<Vec<Account>, QueryExecutionError> {
        search(self, &ACCOUNT_SCHEMA, params.filter_set(), Some(order)).await
    }

    /// Child accounts of `parent_id`
    pub async fn sub_accounts(&self, parent_id: &str) -> Result<Vec<Account>, QueryExecutionError> {
        self.search_accounts(&AccountSearch {
            parent_account_id: Some(parent_id.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Insert an account; the owning customer must already exist
    pub async fn insert_account(&self, account: &Account) -> Result<()> {
        self.insert_checked(ACCOUNTS, account, |collections| {
            let owner = collections
                .get(CUSTOMERS)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .any(|doc| {
                    doc.get("id").and_then(JsonValue::as_str) == Some(account.customer_id.as_str())
                });
            if !owner {
                return Err(anyhow::anyhow!(
                    "Customer '{}' not found for account '{}'",
                    account.customer_id,
                    account.id
                ));
            }
            Ok(())
        })
        .await
    }
}
