use crate::{
    db_types::{NewCustomer, NewOrder, NewTransaction, OrderStatus, Widget},
    traits::PersistenceError,
};

/// Persistence operations used by the checkout settlement pipeline.
///
/// The three insert methods are called strictly in the order customer, transaction, order by a single caller. Each
/// one commits on its own: there is no enclosing database transaction, so a later failure leaves earlier rows in
/// place.
#[allow(async_fn_in_trait)]
pub trait CheckoutManagement {
    /// Stores a new customer record and returns its id. Customers are never de-duplicated by e-mail.
    async fn insert_customer(&self, customer: NewCustomer) -> Result<i64, PersistenceError>;
    /// Stores the card transaction for a charge and returns its id.
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<i64, PersistenceError>;
    /// Stores an order. The referenced customer and transaction must already exist.
    async fn insert_order(&self, order: NewOrder) -> Result<i64, PersistenceError>;
    /// Fetches a widget by id. Returns `Ok(None)` if it does not exist.
    async fn fetch_widget(&self, widget_id: i64) -> Result<Option<Widget>, PersistenceError>;
    /// Sets the status of an order. Fails with [`PersistenceError::NotFound`] if there is no such order.
    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<(), PersistenceError>;
}
