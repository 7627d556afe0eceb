//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they unpack the request, call into the engine APIs
//! and map the result onto a response. Anything longer belongs in the engine.
//!
//! Every handler is async, and all I/O (database, payment gateway, mail) is awaited, so a slow call never blocks a
//! worker thread.
use actix_web::{get, http::header::AUTHORIZATION, web, HttpRequest, HttpResponse, Responder};
use log::*;
use widget_payment_engine::{
    checkout_objects::{
        CancelSubscriptionRequest,
        RefundRequest,
        StorefrontPayment,
        SubscriptionRequest,
        TerminalPayment,
    },
    traits::{AuthManagement, CheckoutManagement, EmailSender, PaymentGateway, SalesManagement, UserManagement},
    user_objects::UserRequest,
    AccountRecoveryApi,
    AuthApi,
    CheckoutApi,
    RecoveryError,
    SalesApi,
    UserApi,
};

use crate::{
    data_objects::{
        CheckoutResponse,
        EmailRequest,
        JsonResponse,
        LinkRequest,
        LoginRequest,
        LoginResponse,
        NewUserResponse,
        PageRequest,
        PaymentIntentRequest,
        PaymentIntentResponse,
        ReceiptQuery,
        ReceiptResponse,
        ResetPasswordRequest,
    },
    errors::ServerError,
    helpers::ReceiptIssuer,
    middleware::AuthenticatedUser,
};

pub const RESET_REQUESTED_MESSAGE: &str = "If that address belongs to an account, a reset link is on its way";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(payment_intent => Post "/payment-intent" impl CheckoutManagement, PaymentGateway);
/// Starts a storefront charge. The response carries the client secret the browser uses to confirm the card payment.
pub async fn payment_intent<B, G>(
    body: web::Json<PaymentIntentRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let PaymentIntentRequest { currency, amount } = body.into_inner();
    debug!("💻️ POST payment intent for {amount} {currency}");
    let intent = api.create_payment_intent(&currency, amount).await?;
    Ok(HttpResponse::Ok().json(PaymentIntentResponse::from(intent)))
}

route!(widget => Get "/widget/{id}" impl CheckoutManagement, PaymentGateway);
pub async fn widget<B, G>(path: web::Path<i64>, api: web::Data<CheckoutApi<B, G>>) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let widget_id = path.into_inner();
    trace!("💻️ GET widget {widget_id}");
    let widget = api.fetch_widget(widget_id).await?;
    Ok(HttpResponse::Ok().json(widget))
}

route!(checkout => Post "/checkout" impl CheckoutManagement, PaymentGateway);
/// Records a storefront purchase after the browser has confirmed the payment intent.
pub async fn checkout<B, G>(
    body: web::Json<StorefrontPayment>,
    api: web::Data<CheckoutApi<B, G>>,
    receipts: web::Data<ReceiptIssuer>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let payment = body.into_inner();
    debug!("💻️ POST checkout for widget {} ({})", payment.widget_id, payment.payment_intent);
    let issued = api.storefront_checkout(payment).await?;
    let receipt_url = receipts.issue(&issued);
    Ok(HttpResponse::Ok().json(CheckoutResponse { order_id: issued.order_id, receipt_url }))
}

route!(subscribe => Post "/subscribe" impl CheckoutManagement, PaymentGateway);
pub async fn subscribe<B, G>(
    body: web::Json<SubscriptionRequest>,
    api: web::Data<CheckoutApi<B, G>>,
    receipts: web::Data<ReceiptIssuer>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let request = body.into_inner();
    debug!("💻️ POST subscribe to widget {}", request.widget_id);
    let issued = api.subscribe_to_plan(request).await?;
    let receipt_url = receipts.issue(&issued);
    Ok(HttpResponse::Ok().json(CheckoutResponse { order_id: issued.order_id, receipt_url }))
}

#[get("/receipt")]
pub async fn receipt(query: web::Query<ReceiptQuery>, receipts: web::Data<ReceiptIssuer>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET receipt");
    let opened = receipts.open(&query.link)?;
    Ok(HttpResponse::Ok().json(ReceiptResponse { receipt: opened }))
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(authenticate => Post "/authenticate" impl AuthManagement);
/// Exchanges an e-mail address and password for a bearer token.
///
/// Every kind of credential failure, including an unknown e-mail address, gets the same 401 response.
pub async fn authenticate<A>(body: web::Json<LoginRequest>, api: web::Data<AuthApi<A>>) -> Result<HttpResponse, ServerError>
where A: AuthManagement {
    let LoginRequest { email, password } = body.into_inner();
    trace!("💻️ Received login request");
    let (user, token) = api.login(&email, &password).await?;
    Ok(HttpResponse::Ok().json(LoginResponse { user, authentication_token: token }))
}

route!(is_authenticated => Post "/is-authenticated" impl AuthManagement);
pub async fn is_authenticated<A>(req: HttpRequest, api: web::Data<AuthApi<A>>) -> Result<HttpResponse, ServerError>
where A: AuthManagement {
    let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let user = api.authenticate_bearer(header).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("authenticated {}", user.email))))
}

route!(forgot_password => Post "/forgot-password" impl AuthManagement, EmailSender);
/// E-mails a password reset link. The response is the same whether or not the address belongs to an account.
pub async fn forgot_password<A, M>(
    body: web::Json<EmailRequest>,
    api: web::Data<AccountRecoveryApi<A, M>>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
    M: EmailSender,
{
    match api.request_reset(&body.email).await {
        Ok(()) | Err(RecoveryError::UnknownEmail) => {
            Ok(HttpResponse::Accepted().json(JsonResponse::success(RESET_REQUESTED_MESSAGE)))
        },
        Err(e) => Err(e.into()),
    }
}

route!(verify_reset_link => Post "/verify-reset-link" impl AuthManagement, EmailSender);
pub async fn verify_reset_link<A, M>(
    body: web::Json<LinkRequest>,
    api: web::Data<AccountRecoveryApi<A, M>>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
    M: EmailSender,
{
    api.verify_reset_link(&body.link)?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("The reset link is valid")))
}

route!(reset_password => Post "/reset-password" impl AuthManagement, EmailSender);
pub async fn reset_password<A, M>(
    body: web::Json<ResetPasswordRequest>,
    api: web::Data<AccountRecoveryApi<A, M>>,
) -> Result<HttpResponse, ServerError>
where
    A: AuthManagement,
    M: EmailSender,
{
    let ResetPasswordRequest { link, password } = body.into_inner();
    api.reset_password(&link, &password).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Password changed")))
}

//----------------------------------------------   Admin: payments  ----------------------------------------------
route!(virtual_terminal => Post "/virtual-terminal" impl CheckoutManagement, PaymentGateway);
/// Records a charge keyed in by staff. Returns the full receipt, since staff are already signed in.
pub async fn virtual_terminal<B, G>(
    user: AuthenticatedUser,
    body: web::Json<TerminalPayment>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let payment = body.into_inner();
    info!("💻️ Virtual terminal charge {} entered by user #{}", payment.payment_intent, user.0.id);
    let issued = api.virtual_terminal_checkout(payment).await?;
    Ok(HttpResponse::Ok().json(issued))
}

route!(refund => Post "/refund" impl CheckoutManagement, PaymentGateway);
pub async fn refund<B, G>(
    user: AuthenticatedUser,
    body: web::Json<RefundRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let request = body.into_inner();
    let order_id = request.order_id;
    info!("💻️ Refund of order #{order_id} requested by user #{}", user.0.id);
    api.refund(request).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order #{order_id} refunded"))))
}

route!(cancel_subscription => Post "/cancel-subscription" impl CheckoutManagement, PaymentGateway);
pub async fn cancel_subscription<B, G>(
    user: AuthenticatedUser,
    body: web::Json<CancelSubscriptionRequest>,
    api: web::Data<CheckoutApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let request = body.into_inner();
    let order_id = request.order_id;
    info!("💻️ Cancellation of subscription order #{order_id} requested by user #{}", user.0.id);
    api.cancel_subscription(request).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Subscription for order #{order_id} cancelled"))))
}

//----------------------------------------------   Admin: sales  ----------------------------------------------
route!(all_sales => Post "/all-sales" impl SalesManagement);
pub async fn all_sales<B>(body: web::Json<PageRequest>, api: web::Data<SalesApi<B>>) -> Result<HttpResponse, ServerError>
where B: SalesManagement {
    let page = api.all_sales(body.page_size, body.page).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(all_subscriptions => Post "/all-subscriptions" impl SalesManagement);
pub async fn all_subscriptions<B>(
    body: web::Json<PageRequest>,
    api: web::Data<SalesApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: SalesManagement,
{
    let page = api.all_subscriptions(body.page_size, body.page).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(sale => Get "/sale/{id}" impl SalesManagement);
pub async fn sale<B>(path: web::Path<i64>, api: web::Data<SalesApi<B>>) -> Result<HttpResponse, ServerError>
where B: SalesManagement {
    let order = api.sale(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Admin: users  ----------------------------------------------
route!(users => Get "/users" impl UserManagement);
pub async fn users<B>(api: web::Data<UserApi<B>>) -> Result<HttpResponse, ServerError>
where B: UserManagement {
    let users = api.users().await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(user_by_id => Get "/users/{id}" impl UserManagement);
pub async fn user_by_id<B>(path: web::Path<i64>, api: web::Data<UserApi<B>>) -> Result<HttpResponse, ServerError>
where B: UserManagement {
    let user = api.user(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(add_user => Post "/users" impl UserManagement);
pub async fn add_user<B>(
    user: AuthenticatedUser,
    body: web::Json<UserRequest>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: UserManagement,
{
    let id = api.add_user(body.into_inner()).await?;
    info!("💻️ User #{} created staff account #{id}", user.0.id);
    Ok(HttpResponse::Created().json(NewUserResponse { id }))
}

route!(edit_user => Put "/users/{id}" impl UserManagement);
pub async fn edit_user<B>(
    path: web::Path<i64>,
    body: web::Json<UserRequest>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: UserManagement,
{
    let user_id = path.into_inner();
    api.edit_user(user_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("User #{user_id} updated"))))
}

route!(delete_user => Delete "/users/{id}" impl UserManagement);
/// Deletes a staff account. Connected admin clients are told to log the deleted user out.
pub async fn delete_user<B>(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    api: web::Data<UserApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: UserManagement,
{
    let user_id = path.into_inner();
    api.delete_user(user_id, user.0.id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("User #{user_id} deleted"))))
}
