use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::Duration;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use widget_payment_engine::{
    events::{AdminEvent, EventProducer, EventProducers},
    traits::{Page, PersistenceError},
    AuthApi,
    CheckoutApi,
    SalesApi,
    UserApi,
};

use super::{helpers::*, mocks::*};
use crate::{
    middleware::BearerAuthMiddlewareFactory,
    routes::{
        AddUserRoute,
        AllSalesRoute,
        AllSubscriptionsRoute,
        DeleteUserRoute,
        RefundRoute,
        SaleRoute,
        UsersRoute,
        VirtualTerminalRoute,
    },
    server::json_config,
};

#[derive(Default)]
struct Backends {
    auth: MockAuthBackend,
    users: MockUserBackend,
    sales: MockSalesBackend,
    checkout: MockCheckoutBackend,
    gateway: MockGateway,
    notifier: Option<EventProducer<AdminEvent>>,
}

impl Backends {
    /// Every request is authenticated as `user_id`.
    fn signed_in_as(user_id: i64) -> Self {
        Self { auth: token_backend(user_id, Duration::hours(1)), ..Default::default() }
    }
}

fn admin_config(b: Backends) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let mut users = UserApi::new(b.users).with_password_cost(4);
        if let Some(notifier) = b.notifier {
            users = users.with_notifier(notifier);
        }
        let checkout = CheckoutApi::new(b.checkout, b.gateway, EventProducers::default());
        let scope = web::scope("/admin")
            .wrap(BearerAuthMiddlewareFactory::<MockAuthBackend>::new())
            .service(VirtualTerminalRoute::<MockCheckoutBackend, MockGateway>::new())
            .service(RefundRoute::<MockCheckoutBackend, MockGateway>::new())
            .service(AllSalesRoute::<MockSalesBackend>::new())
            .service(AllSubscriptionsRoute::<MockSalesBackend>::new())
            .service(SaleRoute::<MockSalesBackend>::new())
            .service(UsersRoute::<MockUserBackend>::new())
            .service(AddUserRoute::<MockUserBackend>::new())
            .service(DeleteUserRoute::<MockUserBackend>::new());
        cfg.app_data(json_config())
            .app_data(web::Data::new(AuthApi::new(b.auth, Duration::hours(1))))
            .app_data(web::Data::new(users))
            .app_data(web::Data::new(SalesApi::new(b.sales)))
            .app_data(web::Data::new(checkout))
            .service(scope);
    }
}

async fn send(backends: Backends, req: TestRequest) -> (StatusCode, String) {
    let app = test::init_service(App::new().configure(admin_config(backends))).await;
    status_and_body(test::call_service(&app, req.insert_header(("Authorization", bearer())).to_request()).await).await
}

#[actix_web::test]
async fn admin_routes_require_a_token() {
    let _ = env_logger::try_init();
    let app = test::init_service(App::new().configure(admin_config(Backends::default()))).await;
    let requests = [
        TestRequest::get().uri("/admin/users"),
        TestRequest::post().uri("/admin/users").set_json(json!({})),
        TestRequest::delete().uri("/admin/users/2"),
        TestRequest::post().uri("/admin/all-sales").set_json(json!({})),
        TestRequest::get().uri("/admin/sale/1"),
        TestRequest::post().uri("/admin/refund").set_json(json!({})),
        TestRequest::post().uri("/admin/virtual-terminal").set_json(json!({})),
    ];
    for req in requests {
        let (status, body) = status_and_body(test::call_service(&app, req.to_request()).await).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, r#"{"error":"Invalid credentials"}"#);
    }
}

#[actix_web::test]
async fn unknown_and_expired_tokens_are_refused() {
    let _ = env_logger::try_init();
    let unknown = Backends { auth: empty_backend(), ..Default::default() };
    let (status, _) = send(unknown, TestRequest::get().uri("/admin/users")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = Backends { auth: token_backend(1, Duration::minutes(-1)), ..Default::default() };
    let (status, body) = send(expired, TestRequest::get().uri("/admin/users")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Invalid credentials"}"#);
}

#[actix_web::test]
async fn list_users() {
    let _ = env_logger::try_init();
    let mut backends = Backends::signed_in_as(1);
    backends.users.expect_fetch_users().returning(|| Ok(vec![user(1), user(2)]));
    let (status, body) = send(backends, TestRequest::get().uri("/admin/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("password"), "the hash leaked: {body}");
    let users: Vec<Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1]["email"], "admin2@example.com");
}

#[actix_web::test]
async fn add_user() {
    let _ = env_logger::try_init();
    let new_user = json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": "grace@example.com",
        "password": "compilers",
    });
    let mut backends = Backends::signed_in_as(1);
    backends.users.expect_insert_user().times(1).returning(|_| Ok(5));
    let (status, body) = send(backends, TestRequest::post().uri("/admin/users").set_json(new_user.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, r#"{"id":5}"#);

    let mut backends = Backends::signed_in_as(1);
    backends
        .users
        .expect_insert_user()
        .returning(|_| Err(PersistenceError::ConstraintViolation("UNIQUE constraint failed: users.email".into())));
    let (status, body) = send(backends, TestRequest::post().uri("/admin/users").set_json(new_user)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already in use"), "was: {body}");
}

#[actix_web::test]
async fn deleting_a_user_notifies_admin_clients() {
    let _ = env_logger::try_init();
    let (sender, mut receiver) = mpsc::channel(1);
    let mut backends = Backends::signed_in_as(1);
    backends.notifier = Some(EventProducer::new(sender));
    backends.users.expect_delete_user().times(1).returning(|_| Ok(()));
    let (status, _) = send(backends, TestRequest::delete().uri("/admin/users/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receiver.try_recv().unwrap(), AdminEvent::user_deleted(2));
}

#[actix_web::test]
async fn users_cannot_delete_themselves() {
    let _ = env_logger::try_init();
    let mut backends = Backends::signed_in_as(1);
    backends.users.expect_delete_user().never();
    let (status, body) = send(backends, TestRequest::delete().uri("/admin/users/1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("your own account"), "was: {body}");
}

#[actix_web::test]
async fn sales_are_paged() {
    let _ = env_logger::try_init();
    let mut backends = Backends::signed_in_as(1);
    backends.sales.expect_fetch_orders_page().times(1).returning(|filter| {
        assert!(!filter.recurring);
        assert_eq!(filter.page, 2);
        Ok(Page::new(vec![], filter, 0))
    });
    let (status, body) =
        send(backends, TestRequest::post().uri("/admin/all-sales").set_json(json!({"page_size": 5, "page": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    let page: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(page["total_records"], 0);
    assert_eq!(page["page_size"], 5);
}

#[actix_web::test]
async fn missing_sale() {
    let _ = env_logger::try_init();
    let mut backends = Backends::signed_in_as(1);
    backends.sales.expect_fetch_order_detail().returning(|_| Ok(None));
    let (status, _) = send(backends, TestRequest::get().uri("/admin/sale/44")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn virtual_terminal_returns_the_receipt() {
    let _ = env_logger::try_init();
    let mut backends = Backends::signed_in_as(1);
    backends.gateway.expect_retrieve_payment_intent().returning(|id| Ok(intent(id, 5000, "succeeded")));
    backends.gateway.expect_fetch_payment_method().returning(|_| Ok(card()));
    backends.checkout.expect_insert_customer().times(1).returning(|_| Ok(10));
    backends.checkout.expect_insert_transaction().times(1).returning(|_| Ok(11));
    backends.checkout.expect_insert_order().times(1).returning(|_| Ok(12));
    let payment = json!({
        "widget_id": 1,
        "amount": 5000,
        "currency": "cad",
        "first_name": "Walk",
        "last_name": "In",
        "email": "walkin@example.com",
        "payment_intent": "pi_vt",
        "payment_method": "pm_1",
    });
    let (status, body) = send(backends, TestRequest::post().uri("/admin/virtual-terminal").set_json(payment)).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let receipt: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(receipt["order_id"], 12);
    assert_eq!(receipt["last_four"], "4242");
}

#[actix_web::test]
async fn refund_that_cannot_be_recorded_names_the_order() {
    let _ = env_logger::try_init();
    let mut backends = Backends::signed_in_as(1);
    backends.gateway.expect_refund().times(1).returning(|_, _| Ok(()));
    backends
        .checkout
        .expect_update_order_status()
        .returning(|_, _| Err(PersistenceError::Timeout { operation: "update_order_status", seconds: 10 }));
    let refund = json!({"order_id": 7, "payment_intent": "pi_7", "amount": 1000});
    let (status, body) = send(backends, TestRequest::post().uri("/admin/refund").set_json(refund)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("order #7"), "was: {body}");
    assert!(!body.contains("update_order_status"), "was: {body}");
}
