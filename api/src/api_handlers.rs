use crate::database::{
    Database, Order, OrderSearch, Product, ProductSearch, User, UserSearch,
    DEFAULT_RESTOCK_THRESHOLD,
};
use crate::documents::{Account, AccountSearch, Customer, CustomerSearch, DocumentStore};
use crate::pagination::{Page, DEFAULT_LIMIT};
use crate::search::QueryExecutionError;
use poem::{
    handler,
    web::{Data, Json, Path, Query},
    Result as PoemResult,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_common::{parse_filter, parse_filter_with, parse_timestamp_ns, InvalidFilterValue};

// Common response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg),
        }
    }
}

/// Static facts about the running service, reported by the health check
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub environment: String,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

// Query parameters arrive as raw strings and are parsed into typed searches
// before any query is built.

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub has_profile: Option<String>,
    pub created_after: Option<String>,
    pub has_orders_above: Option<String>,
    pub has_order_in_status: Option<String>,
}

impl UserSearchQuery {
    pub fn to_search(&self) -> Result<UserSearch, InvalidFilterValue> {
        Ok(UserSearch {
            name: self.name.clone(),
            email: self.email.clone(),
            has_profile: parse_filter("has_profile", self.has_profile.as_deref())?,
            created_after_ns: parse_filter_with(
                "created_after",
                self.created_after.as_deref(),
                parse_timestamp_ns,
            )?,
            has_orders_above: parse_filter("has_orders_above", self.has_orders_above.as_deref())?,
            has_order_in_status: parse_filter(
                "has_order_in_status",
                self.has_order_in_status.as_deref(),
            )?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderSearchQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_email: Option<String>,
    pub product_id: Option<String>,
}

impl OrderSearchQuery {
    pub fn to_search(&self) -> Result<OrderSearch, InvalidFilterValue> {
        Ok(OrderSearch {
            user_id: parse_filter("user_id", self.user_id.as_deref())?,
            status: parse_filter("status", self.status.as_deref())?,
            min_amount: parse_filter("min_amount", self.min_amount.as_deref())?,
            max_amount: parse_filter("max_amount", self.max_amount.as_deref())?,
            start_date_ns: parse_filter_with(
                "start_date",
                self.start_date.as_deref(),
                parse_timestamp_ns,
            )?,
            end_date_ns: parse_filter_with(
                "end_date",
                self.end_date.as_deref(),
                parse_timestamp_ns,
            )?,
            user_email: self.user_email.clone(),
            product_id: parse_filter("product_id", self.product_id.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductSearchQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub name: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_stock: Option<String>,
    pub max_stock: Option<String>,
}

impl ProductSearchQuery {
    pub fn to_search(&self) -> Result<ProductSearch, InvalidFilterValue> {
        Ok(ProductSearch {
            name: self.name.clone(),
            min_price: parse_filter("min_price", self.min_price.as_deref())?,
            max_price: parse_filter("max_price", self.max_price.as_deref())?,
            min_stock: parse_filter("min_stock", self.min_stock.as_deref())?,
            max_stock: parse_filter("max_stock", self.max_stock.as_deref())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RestockQuery {
    pub threshold: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerSearchQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub cif_id: Option<String>,
    pub customer_type_id: Option<String>,
    pub created_by: Option<String>,
    pub has_ref_key: Option<String>,
    pub has_account_in_status: Option<String>,
}

impl CustomerSearchQuery {
    pub fn to_search(&self) -> Result<CustomerSearch, InvalidFilterValue> {
        Ok(CustomerSearch {
            cif_id: self.cif_id.clone(),
            customer_type_id: parse_filter("customer_type_id", self.customer_type_id.as_deref())?,
            created_by: self.created_by.clone(),
            has_ref_key: parse_filter("has_ref_key", self.has_ref_key.as_deref())?,
            has_account_in_status: parse_filter(
                "has_account_in_status",
                self.has_account_in_status.as_deref(),
            )?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountSearchQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub customer_id: Option<String>,
    pub status_id: Option<String>,
    pub account_category_id: Option<String>,
    pub product_code: Option<String>,
    pub parent_account_id: Option<String>,
    pub account_number: Option<String>,
}

impl AccountSearchQuery {
    pub fn to_search(&self) -> Result<AccountSearch, InvalidFilterValue> {
        Ok(AccountSearch {
            customer_id: self.customer_id.clone(),
            status_id: parse_filter("status_id", self.status_id.as_deref())?,
            account_category_id: parse_filter(
                "account_category_id",
                self.account_category_id.as_deref(),
            )?,
            product_code: self.product_code.clone(),
            parent_account_id: self.parent_account_id.clone(),
            account_number: self.account_number.clone(),
        })
    }
}

fn paged<T>(
    result: Result<Vec<T>, QueryExecutionError>,
    limit: i64,
    offset: i64,
) -> Json<ApiResponse<Page<T>>> {
    match result {
        Ok(items) => Json(ApiResponse::success(Page::paginate(items, limit, offset))),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

fn invalid<T>(e: InvalidFilterValue) -> PoemResult<Json<ApiResponse<T>>> {
    tracing::debug!(filter = %e.filter, value = %e.value, "rejected search parameter");
    Ok(Json(ApiResponse::error(e.to_string())))
}

#[handler]
pub async fn health(info: Data<&ServiceInfo>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Storefront API is running".to_string(),
        environment: info.environment.clone(),
    })
}

// ============ Relational search endpoints ============

#[handler]
pub async fn search_users(
    db: Data<&Arc<Database>>,
    Query(params): Query<UserSearchQuery>,
) -> PoemResult<Json<ApiResponse<Page<User>>>> {
    let search = match params.to_search() {
        Ok(search) => search,
        Err(e) => return invalid(e),
    };
    Ok(paged(
        db.search_users(&search).await,
        params.limit,
        params.offset,
    ))
}

#[handler]
pub async fn search_orders(
    db: Data<&Arc<Database>>,
    Query(params): Query<OrderSearchQuery>,
) -> PoemResult<Json<ApiResponse<Page<Order>>>> {
    let search = match params.to_search() {
        Ok(search) => search,
        Err(e) => return invalid(e),
    };
    Ok(paged(
        db.search_orders(&search).await,
        params.limit,
        params.offset,
    ))
}

#[handler]
pub async fn search_products(
    db: Data<&Arc<Database>>,
    Query(params): Query<ProductSearchQuery>,
) -> PoemResult<Json<ApiResponse<Page<Product>>>> {
    let search = match params.to_search() {
        Ok(search) => search,
        Err(e) => return invalid(e),
    };
    Ok(paged(
        db.search_products(&search).await,
        params.limit,
        params.offset,
    ))
}

#[handler]
pub async fn get_products_needing_restock(
    db: Data<&Arc<Database>>,
    Query(params): Query<RestockQuery>,
) -> PoemResult<Json<ApiResponse<Vec<Product>>>> {
    let threshold = match parse_filter("threshold", params.threshold.as_deref()) {
        Ok(threshold) => threshold.unwrap_or(DEFAULT_RESTOCK_THRESHOLD),
        Err(e) => return invalid(e),
    };
    match db.products_needing_restock(threshold).await {
        Ok(products) => Ok(Json(ApiResponse::success(products))),
        Err(e) => Ok(Json(ApiResponse::error(e.to_string()))),
    }
}

#[handler]
pub async fn get_out_of_stock_products(
    db: Data<&Arc<Database>>,
) -> PoemResult<Json<ApiResponse<Vec<Product>>>> {
    match db.out_of_stock_products().await {
        Ok(products) => Ok(Json(ApiResponse::success(products))),
        Err(e) => Ok(Json(ApiResponse::error(e.to_string()))),
    }
}

#[handler]
pub async fn get_user_products(
    db: Data<&Arc<Database>>,
    Path(user_id): Path<i64>,
) -> PoemResult<Json<ApiResponse<Vec<Product>>>> {
    match db.products_ordered_by_user(user_id).await {
        Ok(products) => Ok(Json(ApiResponse::success(products))),
        Err(e) => Ok(Json(ApiResponse::error(e.to_string()))),
    }
}

#[handler]
pub async fn get_product_orders(
    db: Data<&Arc<Database>>,
    Path(product_id): Path<i64>,
) -> PoemResult<Json<ApiResponse<Vec<Order>>>> {
    match db.orders_containing_product(product_id).await {
        Ok(orders) => Ok(Json(ApiResponse::success(orders))),
        Err(e) => Ok(Json(ApiResponse::error(e.to_string()))),
    }
}

#[handler]
pub async fn delete_user(
    db: Data<&Arc<Database>>,
    Path(user_id): Path<i64>,
) -> PoemResult<Json<ApiResponse<String>>> {
    match db.delete_user(user_id).await {
        Ok(true) => Ok(Json(ApiResponse::success(format!(
            "User {} deleted",
            user_id
        )))),
        Ok(false) => Ok(Json(ApiResponse::error("User not found".to_string()))),
        Err(e) => Ok(Json(ApiResponse::error(e.to_string()))),
    }
}

// ============ Document search endpoints ============

#[handler]
pub async fn search_customers(
    docs: Data<&DocumentStore>,
    Query(params): Query<CustomerSearchQuery>,
) -> PoemResult<Json<ApiResponse<Page<Customer>>>> {
    let search = match params.to_search() {
        Ok(search) => search,
        Err(e) => return invalid(e),
    };
    Ok(paged(
        docs.search_customers(&search).await,
        params.limit,
        params.offset,
    ))
}

#[handler]
pub async fn search_accounts(
    docs: Data<&DocumentStore>,
    Query(params): Query<AccountSearchQuery>,
) -> PoemResult<Json<ApiResponse<Page<Account>>>> {
    let search = match params.to_search() {
        Ok(search) => search,
        Err(e) => return invalid(e),
    };
    Ok(paged(
        docs.search_accounts(&search).await,
        params.limit,
        params.offset,
    ))
}

#[handler]
pub async fn delete_customer(
    docs: Data<&DocumentStore>,
    Path(customer_id): Path<String>,
) -> PoemResult<Json<ApiResponse<String>>> {
    if docs.delete_customer(&customer_id).await {
        Ok(Json(ApiResponse::success(format!(
            "Customer {} deleted",
            customer_id
        ))))
    } else {
        Ok(Json(ApiResponse::error("Customer not found".to_string())))
    }
}
