/// Shared test helpers for database tests
use super::{Database, NewOrder, NewProduct, NewUser, NewUserProfile};
use sqlx::sqlite::SqlitePoolOptions;
use storefront_common::{Money, OrderStatus};

/// Set up an in-memory database with the schema applied.
///
/// The pool holds exactly one connection that never expires, since every
/// new in-memory SQLite connection would open an empty database.
pub async fn setup_test_db() -> Database {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::raw_sql(include_str!("../../migrations/001_schema.sql"))
        .execute(&pool)
        .await
        .expect("Migration failed");

    Database { pool }
}

pub async fn create_user(db: &Database, email: &str, name: &str, created_at_ns: i64) -> i64 {
    db.insert_user(&NewUser {
        email,
        name,
        created_at_ns,
    })
    .await
    .expect("Failed to insert user")
}

pub async fn create_profile(db: &Database, user_id: i64) -> i64 {
    db.insert_user_profile(
        user_id,
        &NewUserProfile {
            phone_number: Some("+41 44 000 00 00"),
            bio: Some("test profile"),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to insert profile")
}

pub async fn create_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> i64 {
    db.insert_product(&NewProduct {
        name,
        description: None,
        price: Money::from_cents(price_cents),
        stock_quantity: stock,
        created_at_ns: 1_000,
    })
    .await
    .expect("Failed to insert product")
}

pub async fn create_order(
    db: &Database,
    order_number: &str,
    user_id: i64,
    total_cents: i64,
    status: OrderStatus,
    created_at_ns: i64,
    product_ids: &[i64],
) -> i64 {
    db.insert_order(&NewOrder {
        order_number,
        total_amount: Money::from_cents(total_cents),
        status,
        created_at_ns,
        user_id,
        product_ids,
    })
    .await
    .expect("Failed to insert order")
}

/// Ids of the standard fixture rows
pub struct Seeded {
    pub alice: i64,
    pub bob: i64,
    pub carol: i64,
    pub laptop: i64,
    pub mouse: i64,
    pub keyboard: i64,
    pub savings_jar: i64,
    pub order_alice_pending: i64,
    pub order_alice_delivered: i64,
    pub order_bob_shipped: i64,
}

/// Three users, four products and three orders.
///
/// - alice: profile, orders 50.00 PENDING (laptop, mouse) and 250.00 DELIVERED (laptop)
/// - bob: no profile, order 120.00 SHIPPED (keyboard)
/// - carol: profile, no orders
pub async fn seed(db: &Database) -> Seeded {
    let alice = create_user(db, "alice@example.com", "Alice Smith", 1_000).await;
    let bob = create_user(db, "bob@example.com", "Bob Jones", 2_000).await;
    let carol = create_user(db, "carol@example.com", "Carol Savage", 3_000).await;
    create_profile(db, alice).await;
    create_profile(db, carol).await;

    let laptop = create_product(db, "Laptop", 99_999, 5).await;
    let mouse = create_product(db, "Wireless Mouse", 2_500, 100).await;
    let keyboard = create_product(db, "Mechanical Keyboard", 12_000, 0).await;
    let savings_jar = create_product(db, "Savings Jar", 1_000, 20).await;

    let order_alice_pending = create_order(
        db,
        "ORD-001",
        alice,
        5_000,
        OrderStatus::Pending,
        10_000,
        &[laptop, mouse],
    )
    .await;
    let order_alice_delivered = create_order(
        db,
        "ORD-002",
        alice,
        25_000,
        OrderStatus::Delivered,
        20_000,
        &[laptop],
    )
    .await;
    let order_bob_shipped = create_order(
        db,
        "ORD-003",
        bob,
        12_000,
        OrderStatus::Shipped,
        30_000,
        &[keyboard],
    )
    .await;

    Seeded {
        alice,
        bob,
        carol,
        laptop,
        mouse,
        keyboard,
        savings_jar,
        order_alice_pending,
        order_alice_delivered,
        order_bob_shipped,
    }
}
