use super::types::Database;
use crate::search::{
    search, Column, EntitySchema, FilterDef, FilterKind, FilterSet, QueryExecutionError, SortKey,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use storefront_common::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub created_at_ns: i64,
}

impl Product {
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: Money,
    pub stock_quantity: i64,
    pub created_at_ns: i64,
}

pub const PRODUCT_SCHEMA: EntitySchema = EntitySchema {
    table: "products",
    default_order: &[SortKey::asc("name"), SortKey::asc("id")],
};

pub const PRODUCT_NAME: FilterDef =
    FilterDef::new("name", FilterKind::Substring(Column::root("name_folded")));
pub const PRODUCT_MIN_PRICE: FilterDef =
    FilterDef::new("min_price", FilterKind::RangeMin(Column::root("price_cents")));
pub const PRODUCT_MAX_PRICE: FilterDef =
    FilterDef::new("max_price", FilterKind::RangeMax(Column::root("price_cents")));
pub const PRODUCT_MIN_STOCK: FilterDef = FilterDef::new(
    "min_stock",
    FilterKind::RangeMin(Column::root("stock_quantity")),
);
pub const PRODUCT_MAX_STOCK: FilterDef = FilterDef::new(
    "max_stock",
    FilterKind::RangeMax(Column::root("stock_quantity")),
);

/// Lowest stock first
const RESTOCK_ORDER: &[SortKey] = &[SortKey::asc("stock_quantity"), SortKey::asc("id")];

/// Threshold used when a restock request does not name one
pub const DEFAULT_RESTOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, Default)]
pub struct ProductSearch {
    pub name: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub min_stock: Option<i64>,
    pub max_stock: Option<i64>,
}

impl ProductSearch {
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new()
            .with(&PRODUCT_NAME, self.name.clone())
            .with(&PRODUCT_MIN_PRICE, self.min_price)
            .with(&PRODUCT_MAX_PRICE, self.max_price)
            .with(&PRODUCT_MIN_STOCK, self.min_stock)
            .with(&PRODUCT_MAX_STOCK, self.max_stock)
    }
}

impl Database {
    /// Search products; alphabetical by name
    pub async fn search_products(
        &self,
        params: &ProductSearch,
    ) -> Result<Vec<Product>, QueryExecutionError> {
        search(self, &PRODUCT_SCHEMA, params.filter_set(), None).await
    }

    pub async fn search_products_ordered(
        &self,
        params: &ProductSearch,
        order: &[SortKey],
    ) -> Result<Vec<Product>, QueryExecutionError> {
        search(self, &PRODUCT_SCHEMA, params.filter_set(), Some(order)).await
    }

    /// Products with at most `threshold` units left, lowest stock first
    pub async fn products_needing_restock(
        &self,
        threshold: i64,
    ) -> Result<Vec<Product>, QueryExecutionError> {
        let params = ProductSearch {
            max_stock: Some(threshold),
            ..Default::default()
        };
        self.search_products_ordered(&params, RESTOCK_ORDER).await
    }

    pub async fn out_of_stock_products(&self) -> Result<Vec<Product>, QueryExecutionError> {
        self.products_needing_restock(0).await
    }

    /// Distinct products appearing in any order placed by `user_id`
    pub async fn products_ordered_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Product>, QueryExecutionError> {
        let products = sqlx::query_as::<_, Product>(
            r#"SELECT DISTINCT p.id, p.name, p.description, p.price_cents, p.stock_quantity, p.created_at_ns
               FROM products p
               INNER JOIN order_products op ON op.product_id = p.id
               INNER JOIN orders o ON o.id = op.order_id
               WHERE o.user_id = ?
               ORDER BY p.name ASC, p.id ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price_cents, stock_quantity, created_at_ns FROM products WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn insert_product(&self, product: &NewProduct<'_>) -> Result<i64> {
        if product.price.cents() < 0 {
            return Err(anyhow::anyhow!("price must not be negative"));
        }
        if product.stock_quantity < 0 {
            return Err(anyhow::anyhow!("stock quantity must not be negative"));
        }

        let id = sqlx::query(
            "INSERT INTO products (name, name_folded, description, price_cents, stock_quantity, created_at_ns) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(product.name)
        .bind(product.name.to_lowercase())
        .bind(product.description)
        .bind(product.price.cents())
        .bind(product.stock_quantity)
        .bind(product.created_at_ns)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(id)
    }
}
