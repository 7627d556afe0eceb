use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User, UserUpdate},
    traits::PersistenceError,
};

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, PersistenceError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, PersistenceError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_users(conn: &mut SqliteConnection) -> Result<Vec<User>, PersistenceError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY last_name, first_name").fetch_all(conn).await?;
    Ok(users)
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO users (first_name, last_name, email, password, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $5) RETURNING id"#,
    )
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn update_user(id: i64, update: UserUpdate, conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let result = sqlx::query(
        r#"UPDATE users SET
            first_name = $1,
            last_name = $2,
            email = $3,
            password = coalesce($4, password),
            updated_at = $5
        WHERE id = $6"#,
    )
    .bind(update.first_name)
    .bind(update.last_name)
    .bind(update.email)
    .bind(update.password_hash)
    .bind(Utc::now())
    .bind(id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(PersistenceError::NotFound(format!("User {id}")));
    }
    Ok(())
}

pub async fn update_password(id: i64, password_hash: &str, conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let result = sqlx::query("UPDATE users SET password = $1, updated_at = $2 WHERE id = $3")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PersistenceError::NotFound(format!("User {id}")));
    }
    Ok(())
}

pub async fn delete_user(id: i64, conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(PersistenceError::NotFound(format!("User {id}")));
    }
    Ok(())
}
