pub mod core;
pub mod orders;
pub mod products;
pub mod search;
pub mod types;
pub mod users;

// Re-export main types
pub use orders::{NewOrder, Order, OrderSearch};
pub use products::{NewProduct, Product, ProductSearch, DEFAULT_RESTOCK_THRESHOLD};
pub use types::Database;
pub use users::{NewUser, NewUserProfile, User, UserProfile, UserSearch};

#[cfg(test)]
pub mod test_helpers;
