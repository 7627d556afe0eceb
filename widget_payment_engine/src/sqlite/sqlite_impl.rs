//! `SqliteDatabase` is the concrete storefront backend. It implements every persistence trait in [`crate::traits`].
//!
//! Every operation runs under its own deadline. When the deadline passes the operation is abandoned and
//! [`PersistenceError::Timeout`] is returned. Nothing is retried.
use std::{fmt::Debug, future::Future, time::Duration};

use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{customers, new_pool, orders, tokens, transactions, users, widgets};
use crate::{
    db_types::{
        NewAuthToken,
        NewCustomer,
        NewOrder,
        NewTransaction,
        NewUser,
        OrderDetail,
        OrderStatus,
        TokenOwner,
        User,
        UserUpdate,
        Widget,
    },
    traits::{
        AuthManagement,
        CheckoutManagement,
        Page,
        PersistenceError,
        SalesFilter,
        SalesManagement,
        UserManagement,
    },
};

/// Deadline for reads and for user and token writes.
pub const READ_TIMEOUT: Duration = Duration::from_secs(3);
/// Deadline for transaction and order inserts, and order status updates.
pub const SALE_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
/// Deadline for customer inserts.
pub const CUSTOMER_WRITE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url`. Use `?mode=rwc` in the URL to create the file if it is missing.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, PersistenceError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn with_timeout<T, F>(operation: &'static str, limit: Duration, fut: F) -> Result<T, PersistenceError>
where F: Future<Output = Result<T, PersistenceError>> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("🗃️ {operation} was abandoned after {}s", limit.as_secs());
            Err(PersistenceError::Timeout { operation, seconds: limit.as_secs() })
        },
    }
}

impl CheckoutManagement for SqliteDatabase {
    async fn insert_customer(&self, customer: NewCustomer) -> Result<i64, PersistenceError> {
        with_timeout("insert_customer", CUSTOMER_WRITE_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            let id = customers::insert_customer(customer, &mut conn).await?;
            debug!("🗃️ Customer #{id} saved");
            Ok(id)
        })
        .await
    }

    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<i64, PersistenceError> {
        with_timeout("insert_transaction", SALE_WRITE_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            let id = transactions::insert_transaction(transaction, &mut conn).await?;
            debug!("🗃️ Transaction #{id} saved");
            Ok(id)
        })
        .await
    }

    async fn insert_order(&self, order: NewOrder) -> Result<i64, PersistenceError> {
        with_timeout("insert_order", SALE_WRITE_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            let id = orders::insert_order(order, &mut conn).await?;
            debug!("🗃️ Order #{id} saved");
            Ok(id)
        })
        .await
    }

    async fn fetch_widget(&self, widget_id: i64) -> Result<Option<Widget>, PersistenceError> {
        with_timeout("fetch_widget", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            widgets::fetch_widget(widget_id, &mut conn).await
        })
        .await
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<(), PersistenceError> {
        with_timeout("update_order_status", SALE_WRITE_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            orders::update_order_status(order_id, status, &mut conn).await?;
            debug!("🗃️ Order #{order_id} is now {status}");
            Ok(())
        })
        .await
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, PersistenceError> {
        with_timeout("fetch_user_by_email", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            users::fetch_user_by_email(email, &mut conn).await
        })
        .await
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), PersistenceError> {
        with_timeout("update_password", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            users::update_password(user_id, password_hash, &mut conn).await?;
            info!("🗃️ Password for user #{user_id} has been changed");
            Ok(())
        })
        .await
    }

    async fn insert_token(&self, token: &NewAuthToken) -> Result<(), PersistenceError> {
        with_timeout("insert_token", READ_TIMEOUT, async {
            let mut tx = self.pool.begin().await?;
            let revoked = tokens::delete_tokens_for_user(token.user_id, &mut tx).await?;
            tokens::insert_token(token, &mut tx).await?;
            tx.commit().await?;
            debug!("🗃️ New token stored for user #{}. {revoked} older tokens revoked", token.user_id);
            Ok(())
        })
        .await
    }

    async fn fetch_token_owner(&self, token_hash: &[u8]) -> Result<Option<TokenOwner>, PersistenceError> {
        with_timeout("fetch_token_owner", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            tokens::fetch_token_owner(token_hash, &mut conn).await
        })
        .await
    }
}

impl UserManagement for SqliteDatabase {
    async fn fetch_users(&self) -> Result<Vec<User>, PersistenceError> {
        with_timeout("fetch_users", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            users::fetch_users(&mut conn).await
        })
        .await
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, PersistenceError> {
        with_timeout("fetch_user", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            users::fetch_user(user_id, &mut conn).await
        })
        .await
    }

    async fn insert_user(&self, user: NewUser) -> Result<i64, PersistenceError> {
        with_timeout("insert_user", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            let id = users::insert_user(user, &mut conn).await?;
            info!("🗃️ User #{id} created");
            Ok(id)
        })
        .await
    }

    async fn update_user(&self, user_id: i64, update: UserUpdate) -> Result<(), PersistenceError> {
        with_timeout("update_user", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            users::update_user(user_id, update, &mut conn).await?;
            debug!("🗃️ User #{user_id} updated");
            Ok(())
        })
        .await
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), PersistenceError> {
        with_timeout("delete_user", READ_TIMEOUT, async {
            let mut tx = self.pool.begin().await?;
            tokens::delete_tokens_for_user(user_id, &mut tx).await?;
            users::delete_user(user_id, &mut tx).await?;
            tx.commit().await?;
            info!("🗃️ User #{user_id} and their tokens have been deleted");
            Ok(())
        })
        .await
    }
}

impl SalesManagement for SqliteDatabase {
    async fn fetch_orders_page(&self, filter: &SalesFilter) -> Result<Page<OrderDetail>, PersistenceError> {
        with_timeout("fetch_orders_page", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            orders::fetch_orders_page(filter, &mut conn).await
        })
        .await
    }

    async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, PersistenceError> {
        with_timeout("fetch_order_detail", READ_TIMEOUT, async {
            let mut conn = self.pool.acquire().await?;
            orders::fetch_order_detail(order_id, &mut conn).await
        })
        .await
    }
}
