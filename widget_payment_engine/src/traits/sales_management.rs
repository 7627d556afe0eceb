use crate::{
    db_types::OrderDetail,
    traits::{Page, PersistenceError, SalesFilter},
};

/// Read-only queries behind the admin sales and subscription views.
#[allow(async_fn_in_trait)]
pub trait SalesManagement {
    /// One page of orders, newest first. One-off sales and subscriptions are selected by `filter.recurring`.
    async fn fetch_orders_page(&self, filter: &SalesFilter) -> Result<Page<OrderDetail>, PersistenceError>;
    async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, PersistenceError>;
}
