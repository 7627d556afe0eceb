use std::fmt::Debug;

use crate::{
    db_types::OrderDetail,
    traits::{Page, SalesFilter, SalesManagement},
    wpe_api::errors::SalesApiError,
};

/// Read-only views of completed sales for the admin dashboard.
pub struct SalesApi<B> {
    db: B,
}

impl<B> Debug for SalesApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SalesApi")
    }
}

impl<B> SalesApi<B>
where B: SalesManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// One-off sales, newest first.
    pub async fn all_sales(&self, page_size: i64, page: i64) -> Result<Page<OrderDetail>, SalesApiError> {
        Ok(self.db.fetch_orders_page(&SalesFilter::new(false, page_size, page)).await?)
    }

    /// Subscription sign-ups, newest first.
    pub async fn all_subscriptions(&self, page_size: i64, page: i64) -> Result<Page<OrderDetail>, SalesApiError> {
        Ok(self.db.fetch_orders_page(&SalesFilter::new(true, page_size, page)).await?)
    }

    pub async fn sale(&self, order_id: i64) -> Result<OrderDetail, SalesApiError> {
        self.db.fetch_order_detail(order_id).await?.ok_or(SalesApiError::NotFound(order_id))
    }
}
