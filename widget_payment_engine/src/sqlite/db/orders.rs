use chrono::Utc;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, OrderDetail, OrderStatus},
    traits::{Page, PersistenceError, SalesFilter},
};

const ORDER_DETAIL_SELECT: &str = r#"
    SELECT
        o.id, o.widget_id, w.name AS widget_name, w.is_recurring, o.transaction_id, o.customer_id,
        o.status_id AS status, o.quantity, o.amount, t.currency, t.last_four, t.expiry_month, t.expiry_year,
        t.payment_intent, t.payment_method, t.bank_return_code, c.first_name, c.last_name, c.email,
        o.created_at, o.updated_at
    FROM orders o
        JOIN widgets w ON o.widget_id = w.id
        JOIN transactions t ON o.transaction_id = t.id
        JOIN customers c ON o.customer_id = c.id"#;

pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    let now = Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO orders (widget_id, transaction_id, customer_id, status_id, quantity, amount, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING id"#,
    )
    .bind(order.widget_id)
    .bind(order.transaction_id)
    .bind(order.customer_id)
    .bind(order.status)
    .bind(order.quantity)
    .bind(order.amount)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Returns `NotFound` if no order has the given id.
pub async fn update_order_status(
    id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<(), PersistenceError> {
    let result = sqlx::query("UPDATE orders SET status_id = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PersistenceError::NotFound(format!("Order {id}")));
    }
    Ok(())
}

pub async fn fetch_order_detail(id: i64, conn: &mut SqliteConnection) -> Result<Option<OrderDetail>, PersistenceError> {
    let q = format!("{ORDER_DETAIL_SELECT} WHERE o.id = $1");
    let detail = sqlx::query_as::<_, OrderDetail>(&q).bind(id).fetch_optional(conn).await?;
    Ok(detail)
}

pub async fn fetch_orders_page(
    filter: &SalesFilter,
    conn: &mut SqliteConnection,
) -> Result<Page<OrderDetail>, PersistenceError> {
    let total = sqlx::query_scalar::<_, i64>(
        "SELECT count(o.id) FROM orders o JOIN widgets w ON o.widget_id = w.id WHERE w.is_recurring = $1",
    )
    .bind(filter.recurring)
    .fetch_one(&mut *conn)
    .await?;
    let q = format!("{ORDER_DETAIL_SELECT} WHERE w.is_recurring = $1 ORDER BY o.created_at DESC, o.id DESC LIMIT $2 OFFSET $3");
    let items = sqlx::query_as::<_, OrderDetail>(&q)
        .bind(filter.recurring)
        .bind(filter.page_size)
        .bind(filter.offset())
        .fetch_all(conn)
        .await?;
    Ok(Page::new(items, filter, total))
}
