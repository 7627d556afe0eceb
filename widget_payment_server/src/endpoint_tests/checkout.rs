use actix_web::{
    http::{header::ContentType, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::*;
use serde_json::{json, Value};
use widget_payment_engine::{
    events::EventProducers,
    traits::{GatewayCustomer, GatewayError, GatewaySubscription},
    CheckoutApi,
};
use wpg_common::MinorUnits;

use super::{helpers::*, mocks::*};
use crate::{
    data_objects::CheckoutResponse,
    routes::{health, receipt as receipt_route, CheckoutRoute, PaymentIntentRoute, SubscribeRoute, WidgetRoute},
    server::json_config,
};

fn configure(db: MockCheckoutBackend, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = CheckoutApi::new(db, gateway, EventProducers::default());
        cfg.app_data(json_config())
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(receipt_issuer()))
            .service(PaymentIntentRoute::<MockCheckoutBackend, MockGateway>::new())
            .service(WidgetRoute::<MockCheckoutBackend, MockGateway>::new())
            .service(CheckoutRoute::<MockCheckoutBackend, MockGateway>::new())
            .service(SubscribeRoute::<MockCheckoutBackend, MockGateway>::new())
            .service(receipt_route);
    }
}

fn purchase(quantity: i64, amount: i64) -> Value {
    json!({
        "widget_id": 1,
        "quantity": quantity,
        "amount": amount,
        "currency": "cad",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "payment_intent": "pi_1",
        "payment_method": "pm_1",
    })
}

/// A backend that expects exactly one complete settlement.
fn settling_backend(widget_price: i64, recurring: bool) -> MockCheckoutBackend {
    let mut db = MockCheckoutBackend::new();
    db.expect_fetch_widget().returning(move |id| Ok(Some(widget(id, widget_price, recurring))));
    db.expect_insert_customer().times(1).returning(|_| Ok(1));
    db.expect_insert_transaction().times(1).returning(|_| Ok(2));
    db.expect_insert_order().times(1).returning(|_| Ok(3));
    db
}

async fn post(db: MockCheckoutBackend, gateway: MockGateway, uri: &str, body: Value) -> (StatusCode, String) {
    let app = test::init_service(App::new().configure(configure(db, gateway))).await;
    let req = TestRequest::post().uri(uri).set_json(body).to_request();
    status_and_body(test::call_service(&app, req).await).await
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init();
    let app = test::init_service(App::new().service(health)).await;
    let req = TestRequest::get().uri("/health").to_request();
    let (status, body) = status_and_body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn payment_intent_carries_the_client_secret() {
    let _ = env_logger::try_init();
    let mut gateway = MockGateway::new();
    gateway.expect_create_payment_intent().times(1).returning(|_, amount| Ok(intent("pi_9", amount.value(), "new")));
    let (status, body) =
        post(MockCheckoutBackend::new(), gateway, "/payment-intent", json!({"currency": "cad", "amount": 1250})).await;
    assert_eq!(status, StatusCode::OK);
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["client_secret"], "pi_9_secret_xyz");
    assert_eq!(v["amount"], 1250);
}

#[actix_web::test]
async fn payment_intent_for_nothing_is_rejected() {
    let _ = env_logger::try_init();
    let (status, body) =
        post(MockCheckoutBackend::new(), MockGateway::new(), "/payment-intent", json!({"currency": "cad", "amount": 0}))
            .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"#), "was: {body}");
}

#[actix_web::test]
async fn unknown_widget() {
    let _ = env_logger::try_init();
    let mut db = MockCheckoutBackend::new();
    db.expect_fetch_widget().returning(|_| Ok(None));
    let app = test::init_service(App::new().configure(configure(db, MockGateway::new()))).await;
    let req = TestRequest::get().uri("/widget/9").to_request();
    let (status, body) = status_and_body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Widget 9 does not exist"), "was: {body}");
}

#[actix_web::test]
async fn checkout_records_the_order_and_links_the_receipt() {
    let _ = env_logger::try_init();
    let mut gateway = MockGateway::new();
    gateway.expect_retrieve_payment_intent().times(1).returning(|id| Ok(intent(id, 2000, "succeeded")));
    gateway.expect_fetch_payment_method().times(1).returning(|_| Ok(card()));
    let (status, body) = post(settling_backend(1000, false), gateway, "/checkout", purchase(2, 2000)).await;
    info!("Response body: {body}");
    assert_eq!(status, StatusCode::OK);
    let response: CheckoutResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.order_id, 3);
    let link = response.receipt_url.expect("a receipt link");
    assert!(link.starts_with("http://localhost:4000/receipt?"));
    let receipt = receipt_issuer().open(&link).unwrap();
    assert_eq!(receipt.order_id, 3);
    assert_eq!(receipt.amount, MinorUnits::from(2000));
    assert_eq!(receipt.last_four, "4242");
    assert_eq!(receipt.bank_return_code, "ch_1");
}

#[actix_web::test]
async fn checkout_price_mismatch() {
    let _ = env_logger::try_init();
    let mut db = MockCheckoutBackend::new();
    db.expect_fetch_widget().returning(|id| Ok(Some(widget(id, 1000, false))));
    db.expect_insert_customer().never();
    let (status, body) = post(db, MockGateway::new(), "/checkout", purchase(2, 1500)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("(20.00)"), "was: {body}");
}

#[actix_web::test]
async fn declined_cards_pass_the_gateway_message_through() {
    let _ = env_logger::try_init();
    let mut db = MockCheckoutBackend::new();
    db.expect_fetch_widget().returning(|id| Ok(Some(widget(id, 1000, false))));
    db.expect_insert_customer().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_retrieve_payment_intent()
        .returning(|_| Err(GatewayError::Declined("Your card was declined.".into())));
    let (status, body) = post(db, gateway, "/checkout", purchase(1, 1000)).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body, r#"{"error":"Your card was declined."}"#);
}

#[actix_web::test]
async fn unconfirmed_payments_are_not_recorded() {
    let _ = env_logger::try_init();
    let mut db = MockCheckoutBackend::new();
    db.expect_fetch_widget().returning(|id| Ok(Some(widget(id, 1000, false))));
    db.expect_insert_customer().never();
    let mut gateway = MockGateway::new();
    gateway.expect_retrieve_payment_intent().returning(|id| Ok(intent(id, 1000, "requires_payment_method")));
    let (status, _) = post(db, gateway, "/checkout", purchase(1, 1000)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn subscribing_creates_a_gateway_subscription() {
    let _ = env_logger::try_init();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment_method().times(1).returning(|_| Ok(card()));
    gateway.expect_create_customer().times(1).returning(|_, _| Ok(GatewayCustomer { id: "cus_1".into() }));
    gateway
        .expect_subscribe()
        .times(1)
        .returning(|_, _, _, _| Ok(GatewaySubscription { id: "sub_1".into(), status: "active".into() }));
    let request = json!({
        "widget_id": 2,
        "amount": 1500,
        "currency": "cad",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email": "ada@example.com",
        "payment_method": "pm_1",
    });
    let (status, body) = post(settling_backend(1500, true), gateway, "/subscribe", request).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    let response: CheckoutResponse = serde_json::from_str(&body).unwrap();
    let receipt = receipt_issuer().open(&response.receipt_url.unwrap()).unwrap();
    assert_eq!(receipt.payment_intent, "sub_1");
}

#[actix_web::test]
async fn malformed_bodies_get_a_json_error() {
    let _ = env_logger::try_init();
    let app = test::init_service(App::new().configure(configure(MockCheckoutBackend::new(), MockGateway::new()))).await;
    let req = TestRequest::post().uri("/checkout").insert_header(ContentType::json()).set_payload("{nope").to_request();
    let (status, body) = status_and_body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#), "was: {body}");
}

#[actix_web::test]
async fn forged_receipt_links_are_refused() {
    let _ = env_logger::try_init();
    let app = test::init_service(App::new().configure(configure(MockCheckoutBackend::new(), MockGateway::new()))).await;
    let req = TestRequest::get().uri("/receipt?link=nonsense").to_request();
    let (status, body) = status_and_body(test::call_service(&app, req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("invalid or has expired"), "was: {body}");
}
