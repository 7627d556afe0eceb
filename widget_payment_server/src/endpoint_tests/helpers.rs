use actix_web::{body::MessageBody, dev::ServiceResponse, http::StatusCode, test};
use chrono::{Duration, Utc};
use widget_payment_engine::{
    db_types::{TokenOwner, User, Widget},
    helpers::{hash_password_with_cost, Encryption, ReceiptSealer, UrlSigner},
    traits::{PaymentIntent, PaymentMethodDetails},
};
use wpg_common::MinorUnits;

use super::mocks::MockAuthBackend;
use crate::helpers::ReceiptIssuer;

/// Test-only key. Never use it anywhere else.
pub const TEST_KEY: &[u8] = b"0123456789abcdef0123456789abcdef";
/// A well-formed bearer token. Whether it is accepted depends on the backend.
pub const TOKEN: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const PASSWORD: &str = "correct horse";

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

pub fn user(id: i64) -> User {
    User {
        id,
        first_name: "Admin".into(),
        last_name: "User".into(),
        email: format!("admin{id}@example.com"),
        password_hash: hash_password_with_cost(PASSWORD, 4).unwrap(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// An auth backend that accepts [`TOKEN`] as belonging to `user_id`, with the token expiring after `ttl`.
pub fn token_backend(user_id: i64, ttl: Duration) -> MockAuthBackend {
    let mut db = MockAuthBackend::new();
    db.expect_fetch_token_owner()
        .returning(move |_| Ok(Some(TokenOwner { user: user(user_id), expiry: Utc::now() + ttl })));
    db
}

/// An auth backend that knows of no tokens at all.
pub fn empty_backend() -> MockAuthBackend {
    let mut db = MockAuthBackend::new();
    db.expect_fetch_token_owner().returning(|_| Ok(None));
    db
}

pub fn widget(id: i64, price: i64, recurring: bool) -> Widget {
    Widget {
        id,
        name: format!("Widget {id}"),
        description: "A very fine widget".into(),
        inventory_level: 10,
        price: MinorUnits::from(price),
        image: String::new(),
        is_recurring: recurring,
        plan_id: if recurring { "plan_bronze".into() } else { String::new() },
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn intent(id: &str, amount: i64, status: &str) -> PaymentIntent {
    PaymentIntent {
        id: id.into(),
        client_secret: Some(format!("{id}_secret_xyz")),
        amount: MinorUnits::from(amount),
        currency: "cad".into(),
        status: status.into(),
        latest_charge: Some("ch_1".into()),
    }
}

pub fn card() -> PaymentMethodDetails {
    PaymentMethodDetails { id: "pm_1".into(), last_four: "4242".into(), expiry_month: 12, expiry_year: 2030 }
}

pub fn signer() -> UrlSigner {
    UrlSigner::new(TEST_KEY).unwrap()
}

pub fn encryption() -> Encryption {
    Encryption::new(TEST_KEY).unwrap()
}

pub fn receipt_issuer() -> ReceiptIssuer {
    ReceiptIssuer::new(ReceiptSealer::new("http://localhost:4000/receipt", signer(), encryption()), 10)
}

pub async fn status_and_body<B: MessageBody>(res: ServiceResponse<B>) -> (StatusCode, String) {
    let status = res.status();
    let body = test::read_body(res).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}
