use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::Duration;
use serde_json::{json, Value};
use widget_payment_engine::{traits::PersistenceError, AccountRecoveryApi, AuthApi, RecoverySettings};

use super::{helpers::*, mocks::*};
use crate::{
    errors::INVALID_CREDENTIALS,
    routes::{
        AuthenticateRoute,
        ForgotPasswordRoute,
        IsAuthenticatedRoute,
        ResetPasswordRoute,
        VerifyResetLinkRoute,
        RESET_REQUESTED_MESSAGE,
    },
    server::json_config,
};

const INVALID_CREDENTIALS_BODY: &str = r#"{"error":"Invalid credentials"}"#;

fn auth_config(db: MockAuthBackend) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config())
            .app_data(web::Data::new(AuthApi::new(db, Duration::hours(1))))
            .service(AuthenticateRoute::<MockAuthBackend>::new())
            .service(IsAuthenticatedRoute::<MockAuthBackend>::new());
    }
}

fn recovery_api(db: MockAuthBackend, mailer: MockMailer) -> AccountRecoveryApi<MockAuthBackend, MockMailer> {
    let mut settings = RecoverySettings::new("http://localhost:4000", "info@widgets.com");
    settings.password_cost = 4;
    AccountRecoveryApi::new(db, mailer, signer(), encryption(), settings)
}

fn recovery_config(api: AccountRecoveryApi<MockAuthBackend, MockMailer>) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(json_config())
            .app_data(web::Data::new(api))
            .service(ForgotPasswordRoute::<MockAuthBackend, MockMailer>::new())
            .service(VerifyResetLinkRoute::<MockAuthBackend, MockMailer>::new())
            .service(ResetPasswordRoute::<MockAuthBackend, MockMailer>::new());
    }
}

async fn login(db: MockAuthBackend, email: &str, password: &str) -> (StatusCode, String) {
    let app = test::init_service(App::new().configure(auth_config(db))).await;
    let req =
        TestRequest::post().uri("/authenticate").set_json(json!({"email": email, "password": password})).to_request();
    status_and_body(test::call_service(&app, req).await).await
}

async fn check_token(db: MockAuthBackend, header: Option<String>) -> (StatusCode, String) {
    let app = test::init_service(App::new().configure(auth_config(db))).await;
    let mut req = TestRequest::post().uri("/is-authenticated");
    if let Some(header) = header {
        req = req.insert_header(("Authorization", header));
    }
    status_and_body(test::call_service(&app, req.to_request()).await).await
}

async fn post_recovery(api: AccountRecoveryApi<MockAuthBackend, MockMailer>, uri: &str, body: Value) -> (StatusCode, String) {
    let app = test::init_service(App::new().configure(recovery_config(api))).await;
    let req = TestRequest::post().uri(uri).set_json(body).to_request();
    status_and_body(test::call_service(&app, req).await).await
}

#[actix_web::test]
async fn login_issues_a_token() {
    let _ = env_logger::try_init();
    let mut db = MockAuthBackend::new();
    db.expect_fetch_user_by_email().returning(|email| Ok((email == "admin1@example.com").then(|| user(1))));
    db.expect_insert_token().times(1).returning(|_| Ok(()));
    let (status, body) = login(db, "admin1@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("password"), "the hash leaked: {body}");
    let v: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["user"]["email"], "admin1@example.com");
    assert_eq!(v["authentication_token"]["token"].as_str().unwrap().len(), 26);
}

#[actix_web::test]
async fn login_failures_look_the_same() {
    let _ = env_logger::try_init();
    let mut db = MockAuthBackend::new();
    db.expect_fetch_user_by_email().returning(|_| Ok(Some(user(1))));
    db.expect_insert_token().never();
    let (status, wrong_password) = login(db, "admin1@example.com", "not the password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut db = MockAuthBackend::new();
    db.expect_fetch_user_by_email().returning(|_| Ok(None));
    db.expect_insert_token().never();
    let (status, unknown_user) = login(db, "nobody@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password, INVALID_CREDENTIALS_BODY);
}

#[actix_web::test]
async fn login_database_failure_is_a_server_error() {
    let _ = env_logger::try_init();
    let mut db = MockAuthBackend::new();
    db.expect_fetch_user_by_email().returning(|_| Err(PersistenceError::DatabaseError("disk on fire".into())));
    let (status, body) = login(db, "admin1@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("disk on fire"), "was: {body}");
}

#[actix_web::test]
async fn valid_token_is_authenticated() {
    let _ = env_logger::try_init();
    let (status, body) = check_token(token_backend(1, Duration::hours(1)), Some(bearer())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("authenticated admin1@example.com"), "was: {body}");
}

#[actix_web::test]
async fn bad_tokens_are_rejected() {
    let _ = env_logger::try_init();
    let cases = [
        (MockAuthBackend::new(), None),
        (MockAuthBackend::new(), Some("Basic YWRtaW46YWRtaW4=".to_string())),
        (MockAuthBackend::new(), Some("Bearer short".to_string())),
        (empty_backend(), Some(bearer())),
        (token_backend(1, Duration::minutes(-5)), Some(bearer())),
    ];
    for (db, header) in cases {
        let (status, body) = check_token(db, header).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, INVALID_CREDENTIALS_BODY);
    }
    assert!(INVALID_CREDENTIALS_BODY.contains(INVALID_CREDENTIALS));
}

#[actix_web::test]
async fn forgot_password_does_not_reveal_accounts() {
    let _ = env_logger::try_init();
    let mut db = MockAuthBackend::new();
    db.expect_fetch_user_by_email().returning(|_| Ok(Some(user(1))));
    let mut mailer = MockMailer::new();
    mailer.expect_send().times(1).returning(|email| {
        assert_eq!(email.to, "admin1@example.com");
        assert!(email.data["link"].starts_with("http://localhost:4000/reset-password?"));
        Ok(())
    });
    let (known_status, known) =
        post_recovery(recovery_api(db, mailer), "/forgot-password", json!({"email": "admin1@example.com"})).await;

    let mut db = MockAuthBackend::new();
    db.expect_fetch_user_by_email().returning(|_| Ok(None));
    let mut mailer = MockMailer::new();
    mailer.expect_send().never();
    let (unknown_status, unknown) =
        post_recovery(recovery_api(db, mailer), "/forgot-password", json!({"email": "nobody@example.com"})).await;

    assert_eq!(known_status, StatusCode::ACCEPTED);
    assert_eq!(unknown_status, StatusCode::ACCEPTED);
    assert_eq!(known, unknown);
    assert!(known.contains(RESET_REQUESTED_MESSAGE));
}

#[actix_web::test]
async fn reset_links_are_verified() {
    let _ = env_logger::try_init();
    let link = recovery_api(MockAuthBackend::new(), MockMailer::new()).reset_link("admin1@example.com").unwrap();
    let api = recovery_api(MockAuthBackend::new(), MockMailer::new());
    let (status, _) = post_recovery(api, "/verify-reset-link", json!({ "link": link })).await;
    assert_eq!(status, StatusCode::OK);

    let tampered = link.replace("reset-password", "reset-passwort");
    let api = recovery_api(MockAuthBackend::new(), MockMailer::new());
    let (status, body) = post_recovery(api, "/verify-reset-link", json!({ "link": tampered })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("invalid or has expired"), "was: {body}");
}

#[actix_web::test]
async fn reset_password_updates_the_account() {
    let _ = env_logger::try_init();
    let mut db = MockAuthBackend::new();
    db.expect_fetch_user_by_email().returning(|email| Ok((email == "admin1@example.com").then(|| user(1))));
    db.expect_update_password().times(1).returning(|_, _| Ok(()));
    let api = recovery_api(db, MockMailer::new());
    let link = api.reset_link("admin1@example.com").unwrap();
    let (status, body) =
        post_recovery(api, "/reset-password", json!({ "link": link, "password": "a much better password" })).await;
    assert_eq!(status, StatusCode::OK, "was: {body}");
    assert!(body.contains("Password changed"));
}

#[actix_web::test]
async fn reset_password_rejects_short_passwords() {
    let _ = env_logger::try_init();
    let mut db = MockAuthBackend::new();
    db.expect_update_password().never();
    let api = recovery_api(db, MockMailer::new());
    let link = api.reset_link("admin1@example.com").unwrap();
    let (status, _) = post_recovery(api, "/reset-password", json!({ "link": link, "password": "abc" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
