use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{db_types::NewCustomer, traits::PersistenceError};

pub async fn insert_customer(customer: NewCustomer, conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO customers (first_name, last_name, email, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4) RETURNING id"#,
    )
    .bind(customer.first_name)
    .bind(customer.last_name)
    .bind(customer.email)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}
