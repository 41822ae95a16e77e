//! Users repository for database operations

use std::collections::BTreeSet;

use sqlx::{Pool, Postgres, Transaction};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};

use super::{map_book_reference, UserStream};
use crate::{
    error::{AppError, AppResult},
    models::{user::UserRow, BookId, PartyChanges, TransferPlan, User, UserId},
};

/// Rows buffered ahead of the consumer while streaming users
const STREAM_BUFFER: usize = 64;

const SELECT_USER: &str = r#"
    SELECT u.id, u.name, u.email,
           ARRAY(SELECT i.book_id FROM user_inventory i WHERE i.user_id = u.id ORDER BY i.book_id) AS inventory,
           ARRAY(SELECT w.book_id FROM user_wishlist w WHERE w.user_id = u.id ORDER BY w.book_id) AS wishlist
    FROM users u
"#;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: &UserId) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE u.id = $1", SELECT_USER))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::user_not_found(id))?;

        User::try_from(row)
    }

    /// Stream all users but one, ordered by id.
    ///
    /// Rows are fetched by a background task and handed over through a
    /// bounded channel, so the consumer pulls them as it goes.
    pub fn stream_except(&self, exclude: &UserId) -> UserStream {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        let pool = self.pool.clone();
        let exclude = exclude.as_str().to_string();

        tokio::spawn(async move {
            let sql = format!("{} WHERE u.id <> $1 ORDER BY u.id", SELECT_USER);
            let mut rows = sqlx::query_as::<_, UserRow>(&sql).bind(exclude).fetch(&pool);

            while let Some(row) = rows.next().await {
                let user = row.map_err(AppError::from).and_then(User::try_from);
                let failed = user.is_err();
                if tx.send(user).await.is_err() || failed {
                    break;
                }
            }
        });

        Box::pin(ReceiverStream::new(rx))
    }

    /// Union book ids into a user's inventory
    pub async fn append_to_inventory(&self, user_id: &UserId, book_ids: &BTreeSet<BookId>) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;
        insert_inventory(&mut tx, user_id, book_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn add_to_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        sqlx::query(
            r#"
            INSERT INTO user_wishlist (user_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id.as_str())
        .bind(book_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(map_book_reference)?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_from_wishlist(&self, user_id: &UserId, book_id: &BookId) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_id).await?;

        sqlx::query("DELETE FROM user_wishlist WHERE user_id = $1 AND book_id = $2")
            .bind(user_id.as_str())
            .bind(book_id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Apply a trade in a single transaction.
    ///
    /// Both user rows are locked in id order before anything is written, so
    /// two trades sharing a user run one after the other and cannot deadlock.
    pub async fn apply_transfer(&self, plan: &TransferPlan) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let parties = plan.lock_order();
        for party in parties {
            lock_user(&mut tx, &party.user_id).await?;
        }

        // Books given away must still be owned once both rows are locked
        for party in parties {
            check_owned(&mut tx, party).await?;
        }

        for party in parties {
            apply_party(&mut tx, party).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Take a row lock on the user, failing with `NotFound` when absent
async fn lock_user(tx: &mut Transaction<'_, Postgres>, user_id: &UserId) -> AppResult<()> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id.as_str())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::user_not_found(user_id))?;
    Ok(())
}

async fn check_owned(tx: &mut Transaction<'_, Postgres>, party: &PartyChanges) -> AppResult<()> {
    if party.remove_from_inventory.is_empty() {
        return Ok(());
    }

    let ids: Vec<&str> = party.remove_from_inventory.iter().map(BookId::as_str).collect();
    let owned: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM user_inventory WHERE user_id = $1 AND book_id = ANY($2)",
    )
    .bind(party.user_id.as_str())
    .bind(&ids)
    .fetch_one(&mut **tx)
    .await?;

    if owned as usize != ids.len() {
        return Err(AppError::inventory_conflict(&party.user_id));
    }
    Ok(())
}

async fn insert_inventory(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &UserId,
    book_ids: &BTreeSet<BookId>,
) -> AppResult<()> {
    if book_ids.is_empty() {
        return Ok(());
    }

    let ids: Vec<&str> = book_ids.iter().map(BookId::as_str).collect();
    sqlx::query(
        r#"
        INSERT INTO user_inventory (user_id, book_id)
        SELECT $1, UNNEST($2::text[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id.as_str())
    .bind(&ids)
    .execute(&mut **tx)
    .await
    .map_err(map_book_reference)?;

    Ok(())
}

async fn apply_party(tx: &mut Transaction<'_, Postgres>, party: &PartyChanges) -> AppResult<()> {
    if !party.remove_from_inventory.is_empty() {
        let ids: Vec<&str> = party.remove_from_inventory.iter().map(BookId::as_str).collect();
        sqlx::query("DELETE FROM user_inventory WHERE user_id = $1 AND book_id = ANY($2)")
            .bind(party.user_id.as_str())
            .bind(&ids)
            .execute(&mut **tx)
            .await?;
    }

    if !party.remove_from_wishlist.is_empty() {
        let ids: Vec<&str> = party.remove_from_wishlist.iter().map(BookId::as_str).collect();
        sqlx::query("DELETE FROM user_wishlist WHERE user_id = $1 AND book_id = ANY($2)")
            .bind(party.user_id.as_str())
            .bind(&ids)
            .execute(&mut **tx)
            .await?;
    }

    insert_inventory(tx, &party.user_id, &party.add_to_inventory).await
}
