use super::types::Database;
use crate::search::{
    search, Column, CompareOp, EntitySchema, FilterDef, FilterKind, FilterSet, Join, JoinKind,
    Membership, QueryExecutionError, SortKey,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use storefront_common::{Money, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub total_amount_cents: i64,
    pub status: String,
    pub created_at_ns: i64,
    pub user_id: i64,
}

impl Order {
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    pub fn order_status(&self) -> Result<OrderStatus, String> {
        self.status.parse()
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a str,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at_ns: i64,
    pub user_id: i64,
    pub product_ids: &'a [i64],
}

pub const ORDER_SCHEMA: EntitySchema = EntitySchema {
    table: "orders",
    default_order: &[SortKey::desc("created_at_ns"), SortKey::desc("id")],
};

const OWNER_JOIN: Join = Join {
    table: "users",
    alias: "owner",
    kind: JoinKind::Inner,
    joined_key: "id",
    root_key: "user_id",
};

const CONTAINS_PRODUCT: Membership = Membership {
    table: "order_products",
    alias: "line",
    correlated_key: "order_id",
    root_key: "id",
    column: "product_id",
    op: CompareOp::Eq,
};

pub const ORDER_USER_ID: FilterDef =
    FilterDef::new("user_id", FilterKind::Equality(Column::root("user_id")));
pub const ORDER_STATUS: FilterDef =
    FilterDef::new("status", FilterKind::Equality(Column::root("status")));
pub const ORDER_MIN_AMOUNT: FilterDef = FilterDef::new(
    "min_amount",
    FilterKind::RangeMin(Column::root("total_amount_cents")),
);
pub const ORDER_MAX_AMOUNT: FilterDef = FilterDef::new(
    "max_amount",
    FilterKind::RangeMax(Column::root("total_amount_cents")),
);
pub const ORDER_START_DATE: FilterDef = FilterDef::new(
    "start_date",
    FilterKind::RangeMin(Column::root("created_at_ns")),
);
pub const ORDER_END_DATE: FilterDef = FilterDef::new(
    "end_date",
    FilterKind::RangeMax(Column::root("created_at_ns")),
);
pub const ORDER_USER_EMAIL: FilterDef = FilterDef::new(
    "user_email",
    FilterKind::Equality(Column::joined(&OWNER_JOIN, "email")),
);
pub const ORDER_PRODUCT_ID: FilterDef =
    FilterDef::new("product_id", FilterKind::Membership(&CONTAINS_PRODUCT));

#[derive(Debug, Clone, Default)]
pub struct OrderSearch {
    pub user_id: Option<i64>,
    pub status: Option<OrderStatus>,
    /// Inclusive bounds on the order total
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    /// Inclusive bounds on `created_at_ns`
    pub start_date_ns: Option<i64>,
    pub end_date_ns: Option<i64>,
    /// Exact email of the ordering user
    pub user_email: Option<String>,
    /// Order contains this product
    pub product_id: Option<i64>,
}

impl OrderSearch {
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new()
            .with(&ORDER_USER_ID, self.user_id)
            .with(&ORDER_STATUS, self.status)
            .with(&ORDER_MIN_AMOUNT, self.min_amount)
            .with(&ORDER_MAX_AMOUNT, self.max_amount)
            .with(&ORDER_START_DATE, self.start_date_ns)
            .with(&ORDER_END_DATE, self.end_date_ns)
            .with(&ORDER_USER_EMAIL, self.user_email.clone())
            .with(&ORDER_PRODUCT_ID, self.product_id)
    }
}

impl Database {
    /// Search orders; newest first
    pub async fn search_orders(
        &self,
        params: &OrderSearch,
    ) -> Result<Vec<Order>, QueryExecutionError> {
        search(self, &ORDER_SCHEMA, params.filter_set(), None).await
    }

    pub async fn search_orders_ordered(
        &self,
        params: &OrderSearch,
        order: &[SortKey],
    ) -> Result<Vec<Order>, QueryExecutionError> {
        search(self, &ORDER_SCHEMA, params.filter_set(), Some(order)).await
    }

    /// Orders that include `product_id` among their products
    pub async fn orders_containing_product(
        &self,
        product_id: i64,
    ) -> Result<Vec<Order>, QueryExecutionError> {
        let params = OrderSearch {
            product_id: Some(product_id),
            ..Default::default()
        };
        self.search_orders(&params).await
    }

    pub async fn get_order_product_ids(&self, order_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT product_id FROM order_products WHERE order_id = ? ORDER BY product_id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    /// Insert an order and its product links in one transaction
    pub async fn insert_order(&self, order: &NewOrder<'_>) -> Result<i64> {
        if order.total_amount.cents() < 0 {
            return Err(anyhow::anyhow!(
                "order total must not be negative, got {}",
                order.total_amount
            ));
        }

        let mut tx = self.pool.begin().await?;

        let order_id = sqlx::query(
            "INSERT INTO orders (order_number, total_amount_cents, status, created_at_ns, user_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order.order_number)
        .bind(order.total_amount.cents())
        .bind(order.status.as_str())
        .bind(order.created_at_ns)
        .bind(order.user_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to insert order {}", order.order_number))?
        .last_insert_rowid();

        for &product_id in order.product_ids {
            sqlx::query("INSERT INTO order_products (order_id, product_id) VALUES (?, ?)")
                .bind(order_id)
                .bind(product_id)
                .execute(&mut *tx)
                .await
                .with_context(|| {
                    format!("Failed to link product {} to order {}", product_id, order_id)
                })?;
        }

        tx.commit().await?;

        tracing::debug!(
            order_id,
            order_number = order.order_number,
            products = order.product_ids.len(),
            "inserted order"
        );
        Ok(order_id)
    }
}
