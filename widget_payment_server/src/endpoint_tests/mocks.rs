use mockall::mock;
use widget_payment_engine::{
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
        EmailError,
        EmailSender,
        GatewayCustomer,
        GatewayError,
        GatewaySubscription,
        OutgoingEmail,
        Page,
        PaymentGateway,
        PaymentIntent,
        PaymentMethodDetails,
        PersistenceError,
        SalesFilter,
        SalesManagement,
        UserManagement,
    },
};
use wpg_common::MinorUnits;

mock! {
    pub CheckoutBackend {}
    impl CheckoutManagement for CheckoutBackend {
        async fn insert_customer(&self, customer: NewCustomer) -> Result<i64, PersistenceError>;
        async fn insert_transaction(&self, transaction: NewTransaction) -> Result<i64, PersistenceError>;
        async fn insert_order(&self, order: NewOrder) -> Result<i64, PersistenceError>;
        async fn fetch_widget(&self, widget_id: i64) -> Result<Option<Widget>, PersistenceError>;
        async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<(), PersistenceError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_payment_intent(&self, currency: &str, amount: MinorUnits) -> Result<PaymentIntent, GatewayError>;
        async fn retrieve_payment_intent(&self, payment_intent_id: &str) -> Result<PaymentIntent, GatewayError>;
        async fn fetch_payment_method(&self, payment_method_id: &str) -> Result<PaymentMethodDetails, GatewayError>;
        async fn create_customer(&self, payment_method_id: &str, email: &str) -> Result<GatewayCustomer, GatewayError>;
        async fn subscribe(&self, customer: &GatewayCustomer, plan_id: &str, email: &str, last_four: &str) -> Result<GatewaySubscription, GatewayError>;
        async fn refund(&self, payment_intent_id: &str, amount: MinorUnits) -> Result<(), GatewayError>;
        async fn cancel_subscription(&self, subscription_id: &str) -> Result<(), GatewayError>;
    }
}

mock! {
    pub AuthBackend {}
    impl AuthManagement for AuthBackend {
        async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, PersistenceError>;
        async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), PersistenceError>;
        async fn insert_token(&self, token: &NewAuthToken) -> Result<(), PersistenceError>;
        async fn fetch_token_owner(&self, token_hash: &[u8]) -> Result<Option<TokenOwner>, PersistenceError>;
    }
}

mock! {
    pub UserBackend {}
    impl UserManagement for UserBackend {
        async fn fetch_users(&self) -> Result<Vec<User>, PersistenceError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, PersistenceError>;
        async fn insert_user(&self, user: NewUser) -> Result<i64, PersistenceError>;
        async fn update_user(&self, user_id: i64, update: UserUpdate) -> Result<(), PersistenceError>;
        async fn delete_user(&self, user_id: i64) -> Result<(), PersistenceError>;
    }
}

mock! {
    pub SalesBackend {}
    impl SalesManagement for SalesBackend {
        async fn fetch_orders_page(&self, filter: &SalesFilter) -> Result<Page<OrderDetail>, PersistenceError>;
        async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, PersistenceError>;
    }
}

mock! {
    pub Mailer {}
    impl EmailSender for Mailer {
        async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
    }
}
