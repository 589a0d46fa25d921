use super::*;
use crate::search::SortKey;
use serde_json::json;
use std::io::Write;

fn customer(id: &str, cif_id: &str, type_id: i64, ref_key: Option<&str>, at: i64, by: &str) -> Customer {
    Customer {
        id: id.to_string(),
        cif_id: cif_id.to_string(),
        ref_key: ref_key.map(str::to_string),
        customer_type_id: type_id,
        created_at_ns: at,
        created_by: by.to_string(),
        updated_at_ns: None,
        updated_by: None,
    }
}

fn account(id: &str, customer_id: &str, status_id: i64, number: Option<&str>, at: i64) -> Account {
    Account {
        id: id.to_string(),
        customer_id: customer_id.to_string(),
        product_id: format!("prod-{id}"),
        product_code: "SAV01".to_string(),
        product_category: "DEPOSIT".to_string(),
        account_number: number.map(str::to_string),
        parent_account_id: None,
        account_category_id: 10,
        status_id,
        interest_type: "FIXED".to_string(),
        created_at_ns: at,
        created_by: "admin".to_string(),
        updated_at_ns: None,
        updated_by: None,
    }
}

/// c1: ref key, accounts a1 (status 1) and a2 (status 2, child of a1)
/// c2: no ref key, account a3 (status 1)
/// c3: no ref key, no accounts
async fn seeded_store() -> DocumentStore {
    let store = DocumentStore::storefront();
    store
        .insert_customer(&customer("c1", "CIF-0001", 1, Some("REF-1"), 100, "admin"))
        .await
        .unwrap();
    store
        .insert_customer(&customer("c2", "CIF-0002", 2, None, 200, "ops"))
        .await
        .unwrap();
    store
        .insert_customer(&customer("c3", "SAV-0003", 1, None, 300, "admin"))
        .await
        .unwrap();

    store
        .insert_account(&account("a1", "c1", 1, Some("001-SAVINGS"), 150))
        .await
        .unwrap();
    let mut child = account("a2", "c1", 2, None, 160);
    child.parent_account_id = Some("a1".to_string());
    store.insert_account(&child).await.unwrap();
    let mut current = account("a3", "c2", 1, Some("002-CURRENT"), 250);
    current.product_code = "CUR01".to_string();
    current.account_category_id = 20;
    store.insert_account(&current).await.unwrap();
    store
}

fn customer_ids(customers: &[Customer]) -> Vec<&str> {
    customers.iter().map(|c| c.id.as_str()).collect()
}

fn account_ids(accounts: &[Account]) -> Vec<&str> {
    accounts.iter().map(|a| a.id.as_str()).collect()
}

#[tokio::test]
async fn test_no_filters_returns_all_customers_newest_first() {
    let store = seeded_store().await;

    let customers = store
        .search_customers(&CustomerSearch::default())
        .await
        .unwrap();
    assert_eq!(customer_ids(&customers), vec!["c3", "c2", "c1"]);
}

#[tokio::test]
async fn test_cif_substring_is_case_insensitive() {
    let store = seeded_store().await;

    let customers = store
        .search_customers(&CustomerSearch {
            cif_id: Some("sav".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(customer_ids(&customers), vec!["c3"]);
}

#[tokio::test]
async fn test_has_ref_key_branches_on_flag() {
    let store = seeded_store().await;

    let with_key = store
        .search_customers(&CustomerSearch {
            has_ref_key: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(customer_ids(&with_key), vec!["c1"]);

    let without_key = store
        .search_customers(&CustomerSearch {
            has_ref_key: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(customer_ids(&without_key), vec!["c3", "c2"]);
}

#[tokio::test]
async fn test_has_account_in_status_uses_related_collection() {
    let store = seeded_store().await;

    let suspended = store
        .search_customers(&CustomerSearch {
            has_account_in_status: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(customer_ids(&suspended), vec!["c1"]);

    let active = store
        .search_customers(&CustomerSearch {
            has_account_in_status: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(customer_ids(&active), vec!["c2", "c1"]);
}

#[tokio::test]
async fn test_customer_filters_are_anded() {
    let store = seeded_store().await;

    let customers = store
        .search_customers(&CustomerSearch {
            customer_type_id: Some(1),
            created_by: Some("admin".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(customer_ids(&customers), vec!["c3", "c1"]);

    let none = store
        .search_customers(&CustomerSearch {
            customer_type_id: Some(2),
            created_by: Some("admin".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_account_filters() {
    let store = seeded_store().await;

    let active = store
        .search_accounts(&AccountSearch {
            status_id: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(account_ids(&active), vec!["a3", "a1"]);

    let by_customer = store
        .search_accounts(&AccountSearch {
            customer_id: Some("c1".to_string()),
            product_code: Some("SAV01".to_string()),
            account_category_id: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(account_ids(&by_customer), vec!["a2", "a1"]);
}

#[tokio::test]
async fn test_account_number_substring_skips_missing_numbers() {
    let store = seeded_store().await;

    let accounts = store
        .search_accounts(&AccountSearch {
            account_number: Some("0".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(account_ids(&accounts), vec!["a3", "a1"]);
}

#[tokio::test]
async fn test_sub_accounts() {
    let store = seeded_store().await;

    let children = store.sub_accounts("a1").await.unwrap();
    assert_eq!(account_ids(&children), vec!["a2"]);
    assert!(store.sub_accounts("a3").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ordering_override_sorts_missing_values_first() {
    let store = seeded_store().await;

    let accounts = store
        .search_accounts_ordered(&AccountSearch::default(), &[SortKey::asc("account_number")])
        .await
        .unwrap();
    assert_eq!(account_ids(&accounts), vec!["a2", "a1", "a3"]);
}

#[tokio::test]
async fn test_delete_customer_removes_accounts_first() {
    let store = seeded_store().await;

    assert!(store.delete_customer("c1").await);
    assert_eq!(store.count(ACCOUNTS).await, 1);
    assert_eq!(store.count(CUSTOMERS).await, 2);
    assert!(store
        .search_accounts(&AccountSearch {
            customer_id: Some("c1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
        .is_empty());

    assert!(!store.delete_customer("missing").await);
    assert_eq!(store.count(CUSTOMERS).await, 2);
}

#[tokio::test]
async fn test_insert_customer_rejects_duplicates() {
    let store = seeded_store().await;

    let same_cif = customer("c9", "CIF-0001", 1, None, 900, "admin");
    assert!(store.insert_customer(&same_cif).await.is_err());

    let same_id = customer("c1", "CIF-9999", 1, None, 900, "admin");
    assert!(store.insert_customer(&same_id).await.is_err());

    // Same CIF under another customer type is allowed
    let other_type = customer("c9", "CIF-0001", 3, None, 900, "admin");
    store.insert_customer(&other_type).await.unwrap();
    assert_eq!(store.count(CUSTOMERS).await, 4);
}

#[tokio::test]
async fn test_insert_account_requires_customer() {
    let store = seeded_store().await;

    let orphan = account("a9", "nobody", 1, None, 1);
    assert!(store.insert_account(&orphan).await.is_err());
    assert_eq!(store.count(ACCOUNTS).await, 3);
}

#[tokio::test]
async fn test_undecodable_document_is_execution_error() {
    let store = DocumentStore::storefront();
    store
        .insert(CUSTOMERS, &json!({ "id": "broken", "created_at_ns": 1 }))
        .await
        .unwrap();

    let err = store
        .search_customers(&CustomerSearch::default())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, QueryExecutionError::Decode { collection, .. } if collection == CUSTOMERS),
        "got {err:?}"
    );
}

#[tokio::test]
async fn test_missing_collection_is_execution_error() {
    let store = DocumentStore::with_collections(Collections::new());

    let err = store
        .search_customers(&CustomerSearch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryExecutionError::UnknownCollection(ref name) if name == CUSTOMERS));

    // Membership filters need the related collection too
    let mut only_customers = Collections::new();
    only_customers.insert(CUSTOMERS.to_string(), Vec::new());
    let store = DocumentStore::with_collections(only_customers);
    let err = store
        .search_customers(&CustomerSearch {
            has_account_in_status: Some(1),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, QueryExecutionError::UnknownCollection(ref name) if name == ACCOUNTS));
}

#[tokio::test]
async fn test_insert_rejects_non_object_documents() {
    let store = DocumentStore::storefront();
    assert!(store.insert(CUSTOMERS, &"just a string").await.is_err());
    assert_eq!(store.count(CUSTOMERS).await, 0);
}

#[tokio::test]
async fn test_load_json_seed_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let seed = json!({
        "customers": [
            {
                "id": "c1",
                "cif_id": "CIF-0001",
                "customer_type_id": 1,
                "created_at_ns": 10,
                "created_by": "loader"
            }
        ]
    });
    file.write_all(seed.to_string().as_bytes()).unwrap();

    let store = DocumentStore::load_json(file.path()).unwrap();
    let customers = store
        .search_customers(&CustomerSearch {
            has_ref_key: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(customer_ids(&customers), vec!["c1"]);
    assert_eq!(customers[0].ref_key, None);

    // Collections missing from the file are created empty
    assert!(store
        .search_accounts(&AccountSearch::default())
        .await
        .unwrap()
        .is_empty());
}

#[test]
fn test_load_json_reports_bad_files() {
    assert!(DocumentStore::load_json("/nonexistent/documents.json").is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[1, 2, 3]").unwrap();
    let err = DocumentStore::load_json(file.path()).err().unwrap();
    assert!(err.to_string().contains("Invalid document seed file"));
}

#[tokio::test]
async fn test_customers_order_by_exact_nanoseconds() {
    let store = DocumentStore::storefront();
    store
        .insert_customer(&customer("b", "CIF-B", 1, None, 1_700_000_000_000_000_001, "admin"))
        .await
        .unwrap();
    store
        .insert_customer(&customer("a", "CIF-A", 1, None, 1_700_000_000_000_000_002, "admin"))
        .await
        .unwrap();

    let customers = store.search_customers(&CustomerSearch::default()).await.unwrap();
    assert_eq!(customer_ids(&customers), vec!["a", "b"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_keep_cif_unique() {
    let store = seeded_store().await;

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert_customer(&customer(&format!("dup-{i}"), "CIF-7777", 4, None, 1_000 + i, "admin"))
                    .await
            })
        })
        .collect();

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);
    assert_eq!(store.count(CUSTOMERS).await, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_account_insert_leaves_no_orphans() {
    for round in 0..20 {
        let store = seeded_store().await;

        let deleter = {
            let store = store.clone();
            tokio::spawn(async move { store.delete_customer("c1").await })
        };
        let inserter = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .insert_account(&account(&format!("late-{round}"), "c1", 1, None, 500))
                    .await
            })
        };
        assert!(deleter.await.unwrap());
        let _ = inserter.await.unwrap();

        let orphans = store
            .search_accounts(&AccountSearch {
                customer_id: Some("c1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(orphans.is_empty(), "round {round}: {orphans:?}");
    }
}
