use std::time::Duration;

use actix_web::{dev::Server, error::JsonPayloadError, http::KeepAlive, middleware::Logger, rt, web, App, HttpRequest, HttpServer};
use log::*;
use widget_payment_engine::{
    events::EventProducers,
    helpers::ReceiptSealer,
    user_objects::UserRequest,
    AccountRecoveryApi,
    AuthApi,
    CheckoutApi,
    RecoverySettings,
    SalesApi,
    SqliteDatabase,
    UserApi,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    helpers::ReceiptIssuer,
    integrations::{invoice::create_invoice_event_handlers, mailer::SmtpMailer, stripe::StripeGateway},
    middleware::BearerAuthMiddlewareFactory,
    routes::{
        health,
        receipt,
        AddUserRoute,
        AllSalesRoute,
        AllSubscriptionsRoute,
        AuthenticateRoute,
        CancelSubscriptionRoute,
        CheckoutRoute,
        DeleteUserRoute,
        EditUserRoute,
        ForgotPasswordRoute,
        IsAuthenticatedRoute,
        PaymentIntentRoute,
        RefundRoute,
        ResetPasswordRoute,
        SaleRoute,
        SubscribeRoute,
        UserByIdRoute,
        UsersRoute,
        VerifyResetLinkRoute,
        VirtualTerminalRoute,
        WidgetRoute,
    },
    ws::{admin_socket, AdminHub},
};

/// Bounds the number of admin events waiting to be broadcast.
pub const ADMIN_EVENT_BUFFER_SIZE: usize = 50;
const DB_MAX_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_MAX_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate the database. {e}")))?;
    let mailer = SmtpMailer::new(&config.mail)?;
    let handlers = create_invoice_event_handlers(mailer.clone(), &config.mail.from);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let (hub, dispatcher) = AdminHub::new(ADMIN_EVENT_BUFFER_SIZE);
    rt::spawn(dispatcher.run());
    bootstrap_admin(&config, &db).await?;
    let srv = create_server_instance(config, db, mailer, producers, hub)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Creates the first staff account from the configuration, if there isn't one already.
async fn bootstrap_admin(config: &ServerConfig, db: &SqliteDatabase) -> Result<(), ServerError> {
    let Some(admin) = &config.initial_admin else {
        return Ok(());
    };
    let request = UserRequest {
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        email: admin.email.clone(),
        password: Some(admin.password.reveal().clone()),
    };
    match UserApi::new(db.clone()).ensure_admin(request).await? {
        Some(id) => info!("🚀️ Created the initial administrator account (#{id})"),
        None => debug!("🚀️ Staff accounts exist already. Skipping the initial administrator"),
    }
    Ok(())
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    mailer: SmtpMailer,
    producers: EventProducers,
    hub: AdminHub,
) -> Result<Server, ServerError> {
    let gateway = StripeGateway::new(config.stripe.clone())?;
    let signer = config.url_signer()?;
    let encryption = config.encryption()?;
    let receipts = ReceiptIssuer::new(
        ReceiptSealer::new(&config.receipt_url(), signer.clone(), encryption.clone()),
        config.receipt_expiry_minutes,
    );
    let recovery_settings = RecoverySettings::new(&config.frontend_url, &config.mail.from)
        .with_link_expiry(config.reset_link_expiry_minutes);
    if config.stripe.publishable_key.is_empty() {
        warn!("🚀️ WPG_STRIPE_KEY is not set. The storefront will not be able to take card payments.");
    }
    let srv = HttpServer::new(move || {
        let checkout_api = CheckoutApi::new(db.clone(), gateway.clone(), producers.clone());
        let auth_api = AuthApi::new(db.clone(), config.token_ttl);
        let recovery_api = AccountRecoveryApi::new(
            db.clone(),
            mailer.clone(),
            signer.clone(),
            encryption.clone(),
            recovery_settings.clone(),
        );
        let user_api = UserApi::new(db.clone()).with_notifier(hub.publisher());
        let sales_api = SalesApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("wpg::access_log"))
            .app_data(json_config())
            .app_data(web::Data::new(checkout_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(recovery_api))
            .app_data(web::Data::new(user_api))
            .app_data(web::Data::new(sales_api))
            .app_data(web::Data::new(receipts.clone()))
            .app_data(web::Data::new(hub.clone()));
        // Routes that require a bearer token
        let admin_scope = web::scope("/admin")
            .wrap(BearerAuthMiddlewareFactory::<SqliteDatabase>::new())
            .service(VirtualTerminalRoute::<SqliteDatabase, StripeGateway>::new())
            .service(RefundRoute::<SqliteDatabase, StripeGateway>::new())
            .service(CancelSubscriptionRoute::<SqliteDatabase, StripeGateway>::new())
            .service(AllSalesRoute::<SqliteDatabase>::new())
            .service(AllSubscriptionsRoute::<SqliteDatabase>::new())
            .service(SaleRoute::<SqliteDatabase>::new())
            .service(UsersRoute::<SqliteDatabase>::new())
            .service(UserByIdRoute::<SqliteDatabase>::new())
            .service(AddUserRoute::<SqliteDatabase>::new())
            .service(EditUserRoute::<SqliteDatabase>::new())
            .service(DeleteUserRoute::<SqliteDatabase>::new());
        let api_scope = web::scope("/api")
            .service(admin_scope)
            .service(PaymentIntentRoute::<SqliteDatabase, StripeGateway>::new())
            .service(WidgetRoute::<SqliteDatabase, StripeGateway>::new())
            .service(CheckoutRoute::<SqliteDatabase, StripeGateway>::new())
            .service(SubscribeRoute::<SqliteDatabase, StripeGateway>::new())
            .service(receipt)
            .service(AuthenticateRoute::<SqliteDatabase>::new())
            .service(IsAuthenticatedRoute::<SqliteDatabase>::new())
            .service(ForgotPasswordRoute::<SqliteDatabase, SmtpMailer>::new())
            .service(VerifyResetLinkRoute::<SqliteDatabase, SmtpMailer>::new())
            .service(ResetPasswordRoute::<SqliteDatabase, SmtpMailer>::new());
        app.service(health).service(admin_socket).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies get the same `{"error": ...}` shape as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        debug!("💻️ Rejected request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
