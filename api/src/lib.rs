pub mod api_handlers;
pub mod config;
pub mod database;
pub mod documents;
pub mod pagination;
pub mod request_logging;
pub mod search;

use api_handlers::ServiceInfo;
use database::Database;
use documents::DocumentStore;
use poem::{
    delete, endpoint::BoxEndpoint, get, middleware::Cors, EndpointExt, Response, Route,
};
use request_logging::RequestLogging;
use std::sync::Arc;

/// All HTTP routes with their shared state attached
pub fn routes(
    database: Arc<Database>,
    documents: DocumentStore,
    info: ServiceInfo,
) -> BoxEndpoint<'static, Response> {
    Route::new()
        .at("/api/v1/health", get(api_handlers::health))
        // Relational store
        .at("/api/v1/users/search", get(api_handlers::search_users))
        .at("/api/v1/users/:id", delete(api_handlers::delete_user))
        .at(
            "/api/v1/users/:id/products",
            get(api_handlers::get_user_products),
        )
        .at("/api/v1/orders/search", get(api_handlers::search_orders))
        .at("/api/v1/products/search", get(api_handlers::search_products))
        .at(
            "/api/v1/products/needing-restock",
            get(api_handlers::get_products_needing_restock),
        )
        .at(
            "/api/v1/products/out-of-stock",
            get(api_handlers::get_out_of_stock_products),
        )
        .at(
            "/api/v1/products/:id/orders",
            get(api_handlers::get_product_orders),
        )
        // Document store
        .at(
            "/api/v1/customers/search",
            get(api_handlers::search_customers),
        )
        .at(
            "/api/v1/customers/:id",
            delete(api_handlers::delete_customer),
        )
        .at("/api/v1/accounts/search", get(api_handlers::search_accounts))
        .data(database)
        .data(documents)
        .data(info)
        .with(Cors::new())
        .with(RequestLogging)
        .boxed()
}
