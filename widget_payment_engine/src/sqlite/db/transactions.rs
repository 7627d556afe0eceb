use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, Transaction},
    traits::PersistenceError,
};

pub async fn insert_transaction(txn: NewTransaction, conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO transactions (
            amount, currency, last_four, expiry_month, expiry_year, bank_return_code, payment_intent,
            payment_method, transaction_status_id, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) RETURNING id"#,
    )
    .bind(txn.amount)
    .bind(txn.currency)
    .bind(txn.last_four)
    .bind(txn.expiry_month)
    .bind(txn.expiry_year)
    .bind(txn.bank_return_code)
    .bind(txn.payment_intent)
    .bind(txn.payment_method)
    .bind(txn.status)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_transaction(id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, PersistenceError> {
    let txn = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(txn)
}
