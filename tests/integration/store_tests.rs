//! PostgreSQL store integration tests
//!
//! These need a scratch database: `DATABASE_URL=postgres://... cargo test -- --ignored`.
//! Every test works on its own freshly inserted users and books.

use std::collections::BTreeSet;

use bookswap_server::{
    error::Resource,
    models::{BookId, PartyChanges, TransferPlan, UserId},
    repository::{CatalogStore, Repository},
    AppError,
};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn repository() -> Repository {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Repository::new(pool)
}

/// Per-test id namespace
fn prefix() -> String {
    format!("t{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn bid(prefix: &str, n: u32) -> BookId {
    BookId::parse(format!("{}-b{}", prefix, n)).unwrap()
}

fn uid(prefix: &str, name: &str) -> UserId {
    UserId::parse(format!("{}-{}", prefix, name)).unwrap()
}

fn books(prefix: &str, ns: &[u32]) -> BTreeSet<BookId> {
    ns.iter().map(|n| bid(prefix, *n)).collect()
}

/// Insert books 1..=6 and the given users with their inventories
async fn seed(repo: &Repository, prefix: &str, users: &[(&str, &[u32])]) {
    for n in 1..=6 {
        sqlx::query("INSERT INTO books (id, title) VALUES ($1, $2)")
            .bind(bid(prefix, n).as_str())
            .bind(format!("Book {}", n))
            .execute(&repo.pool)
            .await
            .unwrap();
    }
    for (name, inventory) in users {
        let id = uid(prefix, name);
        sqlx::query("INSERT INTO users (id, name) VALUES ($1, $2)")
            .bind(id.as_str())
            .bind(*name)
            .execute(&repo.pool)
            .await
            .unwrap();
        repo.append_to_inventory(&id, &books(prefix, inventory))
            .await
            .unwrap();
    }
}

async fn inventory(repo: &Repository, user: &UserId) -> BTreeSet<BookId> {
    repo.get_user(user).await.unwrap().inventory
}

#[tokio::test]
#[ignore]
async fn test_transfer_with_missing_user_rolls_back() {
    let repo = repository().await;
    let p = prefix();
    seed(&repo, &p, &[("alice", &[1])]).await;

    let mut alice = PartyChanges::for_user(uid(&p, "alice"));
    alice.add_to_inventory = books(&p, &[2]);
    alice.remove_from_inventory = books(&p, &[1]);
    let ghost = PartyChanges::for_user(uid(&p, "ghost"));

    let err = repo
        .apply_transfer(&TransferPlan { parties: [alice, ghost] })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound { resource: Resource::User, .. }));
    assert_eq!(inventory(&repo, &uid(&p, "alice")).await, books(&p, &[1]));
}

#[tokio::test]
#[ignore]
async fn test_repeated_transfer_is_unchanged() {
    let repo = repository().await;
    let p = prefix();
    seed(&repo, &p, &[("alice", &[1]), ("bob", &[3])]).await;

    let mut alice = PartyChanges::for_user(uid(&p, "alice"));
    alice.add_to_inventory = books(&p, &[3, 4]);
    let mut bob = PartyChanges::for_user(uid(&p, "bob"));
    bob.add_to_inventory = books(&p, &[1]);
    let plan = TransferPlan { parties: [alice, bob] };

    repo.apply_transfer(&plan).await.unwrap();
    repo.apply_transfer(&plan).await.unwrap();

    assert_eq!(inventory(&repo, &uid(&p, "alice")).await, books(&p, &[1, 3, 4]));
    assert_eq!(inventory(&repo, &uid(&p, "bob")).await, books(&p, &[1, 3]));
}

#[tokio::test]
#[ignore]
async fn test_transfer_of_unknown_book_rolls_back() {
    let repo = repository().await;
    let p = prefix();
    seed(&repo, &p, &[("alice", &[1]), ("bob", &[3])]).await;

    let mut alice = PartyChanges::for_user(uid(&p, "alice"));
    alice.remove_from_inventory = books(&p, &[1]);
    let mut bob = PartyChanges::for_user(uid(&p, "bob"));
    bob.add_to_inventory = [bid(&p, 1), bid(&p, 99)].into_iter().collect();

    let err = repo
        .apply_transfer(&TransferPlan { parties: [alice, bob] })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound { resource: Resource::Book, .. }));
    assert_eq!(inventory(&repo, &uid(&p, "alice")).await, books(&p, &[1]));
    assert_eq!(inventory(&repo, &uid(&p, "bob")).await, books(&p, &[3]));
}

#[tokio::test]
#[ignore]
async fn test_transfer_of_unowned_book_conflicts() {
    let repo = repository().await;
    let p = prefix();
    seed(&repo, &p, &[("alice", &[1]), ("bob", &[3])]).await;

    let mut alice = PartyChanges::for_user(uid(&p, "alice"));
    alice.remove_from_inventory = books(&p, &[1, 2]);
    let mut bob = PartyChanges::for_user(uid(&p, "bob"));
    bob.add_to_inventory = books(&p, &[1, 2]);

    let err = repo
        .apply_transfer(&TransferPlan { parties: [alice, bob] })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(inventory(&repo, &uid(&p, "alice")).await, books(&p, &[1]));
    assert_eq!(inventory(&repo, &uid(&p, "bob")).await, books(&p, &[3]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_opposing_transfers_complete() {
    let repo = repository().await;
    let p = prefix();
    seed(&repo, &p, &[("alice", &[1]), ("bob", &[3])]).await;

    let mut handles = Vec::new();
    for n in 0..8u32 {
        let repo = repo.clone();
        let p = p.clone();
        handles.push(tokio::spawn(async move {
            // Alternate which party comes first so lock order is exercised
            let mut alice = PartyChanges::for_user(uid(&p, "alice"));
            alice.add_to_inventory = books(&p, &[4 + n % 2]);
            let mut bob = PartyChanges::for_user(uid(&p, "bob"));
            bob.add_to_inventory = books(&p, &[2]);
            let parties = if n % 2 == 0 { [alice, bob] } else { [bob, alice] };
            repo.apply_transfer(&TransferPlan { parties }).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(inventory(&repo, &uid(&p, "alice")).await, books(&p, &[1, 4, 5]));
    assert_eq!(inventory(&repo, &uid(&p, "bob")).await, books(&p, &[2, 3]));
}
