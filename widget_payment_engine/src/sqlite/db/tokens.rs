use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewAuthToken, TokenOwner},
    traits::PersistenceError,
};

pub async fn delete_tokens_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, PersistenceError> {
    let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn insert_token(token: &NewAuthToken, conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO tokens (user_id, email, token_hash, scope, expiry, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6) RETURNING id"#,
    )
    .bind(token.user_id)
    .bind(&token.email)
    .bind(&token.token_hash)
    .bind(token.scope)
    .bind(token.expiry)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_token_owner(
    token_hash: &[u8],
    conn: &mut SqliteConnection,
) -> Result<Option<TokenOwner>, PersistenceError> {
    let owner = sqlx::query_as::<_, TokenOwner>(
        r#"SELECT u.id, u.first_name, u.last_name, u.email, u.password, u.created_at, u.updated_at, t.expiry
        FROM tokens t JOIN users u ON t.user_id = u.id
        WHERE t.token_hash = $1"#,
    )
    .bind(token_hash)
    .fetch_optional(conn)
    .await?;
    Ok(owner)
}
