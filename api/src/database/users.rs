use super::types::Database;
use crate::search::{
    search, Column, CompareOp, EntitySchema, FilterDef, FilterKind, FilterSet, Join, JoinKind,
    Membership, QueryExecutionError, SortKey,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use storefront_common::{Money, OrderStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub created_at_ns: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub phone_number: Option<String>,
    pub birth_date: Option<String>,
    pub bio: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub created_at_ns: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewUserProfile<'a> {
    pub phone_number: Option<&'a str>,
    pub birth_date: Option<&'a str>,
    pub bio: Option<&'a str>,
    pub profile_picture_url: Option<&'a str>,
}

pub const USER_SCHEMA: EntitySchema = EntitySchema {
    table: "users",
    default_order: &[SortKey::desc("created_at_ns"), SortKey::desc("id")],
};

const PROFILE_JOIN: Join = Join {
    table: "user_profiles",
    alias: "profile",
    kind: JoinKind::Left,
    joined_key: "user_id",
    root_key: "id",
};

const ORDERS_ABOVE: Membership = Membership {
    table: "orders",
    alias: "big_order",
    correlated_key: "user_id",
    root_key: "id",
    column: "total_amount_cents",
    op: CompareOp::Gt,
};

const ORDERS_IN_STATUS: Membership = Membership {
    table: "orders",
    alias: "status_order",
    correlated_key: "user_id",
    root_key: "id",
    column: "status",
    op: CompareOp::Eq,
};

pub const USER_NAME: FilterDef =
    FilterDef::new("name", FilterKind::Substring(Column::root("name_folded")));
pub const USER_EMAIL: FilterDef =
    FilterDef::new("email", FilterKind::Equality(Column::root("email")));
pub const USER_HAS_PROFILE: FilterDef = FilterDef::new(
    "has_profile",
    FilterKind::Existence(Column::joined(&PROFILE_JOIN, "id")),
);
pub const USER_CREATED_AFTER: FilterDef = FilterDef::new(
    "created_after",
    FilterKind::RangeMin(Column::root("created_at_ns")),
);
pub const USER_HAS_ORDERS_ABOVE: FilterDef =
    FilterDef::new("has_orders_above", FilterKind::Membership(&ORDERS_ABOVE));
pub const USER_HAS_ORDER_IN_STATUS: FilterDef = FilterDef::new(
    "has_order_in_status",
    FilterKind::Membership(&ORDERS_IN_STATUS),
);

/// Optional user search filters; `None` means "do not filter on this".
#[derive(Debug, Clone, Default)]
pub struct UserSearch {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    pub email: Option<String>,
    pub has_profile: Option<bool>,
    /// Inclusive lower bound on `created_at_ns`
    pub created_after_ns: Option<i64>,
    /// Has at least one order strictly above this amount
    pub has_orders_above: Option<Money>,
    pub has_order_in_status: Option<OrderStatus>,
}

impl UserSearch {
    pub fn filter_set(&self) -> FilterSet {
        FilterSet::new()
            .with(&USER_NAME, self.name.clone())
            .with(&USER_EMAIL, self.email.clone())
            .with(&USER_HAS_PROFILE, self.has_profile)
            .with(&USER_CREATED_AFTER, self.created_after_ns)
            .with(&USER_HAS_ORDERS_ABOVE, self.has_orders_above)
            .with(&USER_HAS_ORDER_IN_STATUS, self.has_order_in_status)
    }
}

impl Database {
    /// Search users; newest first
    pub async fn search_users(&self, params: &UserSearch) -> Result<Vec<User>, QueryExecutionError> {
        search(self, &USER_SCHEMA, params.filter_set(), None).await
    }

    pub async fn search_users_ordered(
        &self,
        params: &UserSearch,
        order: &[SortKey],
    ) -> Result<Vec<User>, QueryExecutionError> {
        search(self, &USER_SCHEMA, params.filter_set(), Some(order)).await
    }

    /// Users owning at least one order in `status`
    pub async fn users_with_orders_in_status(
        &self,
        status: OrderStatus,
    ) -> Result<Vec<User>, QueryExecutionError> {
        let params = UserSearch {
            has_order_in_status: Some(status),
            ..Default::default()
        };
        self.search_users(&params).await
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at_ns FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT id, user_id, phone_number, birth_date, bio, profile_picture_url FROM user_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn insert_user(&self, user: &NewUser<'_>) -> Result<i64> {
        if user.email.trim().is_empty() {
            return Err(anyhow::anyhow!("email is required"));
        }
        let id = sqlx::query(
            "INSERT INTO users (email, name, name_folded, created_at_ns) VALUES (?, ?, ?, ?)",
        )
        .bind(user.email)
        .bind(user.name)
        .bind(user.name.to_lowercase())
        .bind(user.created_at_ns)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn insert_user_profile(
        &self,
        user_id: i64,
        profile: &NewUserProfile<'_>,
    ) -> Result<i64> {
        let id = sqlx::query(
            "INSERT INTO user_profiles (user_id, phone_number, birth_date, bio, profile_picture_url) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(profile.phone_number)
        .bind(profile.birth_date)
        .bind(profile.bio)
        .bind(profile.profile_picture_url)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    /// Delete a user together with everything that references it.
    ///
    /// Runs in one transaction, children first: order/product links, orders,
    /// profile, then the user row. Returns `false` if the user did not exist.
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let links = sqlx::query(
            "DELETE FROM order_products WHERE order_id IN (SELECT id FROM orders WHERE user_id = ?)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        let orders = sqlx::query("DELETE FROM orders WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM user_profiles WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let users = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if users > 0 {
            tracing::info!(user_id = id, orders, links, "deleted user and dependent rows");
        }
        Ok(users > 0)
    }
}
