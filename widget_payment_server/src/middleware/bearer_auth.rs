//! Bearer-token authentication for the admin routes.
//!
//! The middleware reads the `Authorization` header, resolves it to a staff account through [`AuthApi`], and stores
//! the account in the request extensions, where handlers pick it up with the [`AuthenticatedUser`] extractor.
//! Requests that fail authentication are answered with a 401 and never reach the wrapped service. The reason for the
//! failure is logged, but the client only ever sees "Invalid credentials".
use std::{future::Future, marker::PhantomData, pin::Pin, rc::Rc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web,
    Error,
    FromRequest,
    HttpMessage,
    HttpRequest,
};
use futures::future::{ok, ready, Ready};
use log::*;
use widget_payment_engine::{db_types::User, traits::AuthManagement, AuthApi};

use crate::errors::ServerError;

/// The staff account behind the current request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        ready(user.ok_or_else(|| {
            warn!("💻️ No authenticated user found in request extensions. Is the route behind the bearer middleware?");
            ServerError::InvalidCredentials
        }))
    }
}

pub struct BearerAuthMiddlewareFactory<B> {
    _backend: PhantomData<fn() -> B>,
}

impl<B> BearerAuthMiddlewareFactory<B> {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self { _backend: PhantomData }
    }
}

impl<S, Body, B> Transform<S, ServiceRequest> for BearerAuthMiddlewareFactory<B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    B: AuthManagement + 'static,
{
    type Response = ServiceResponse<EitherBody<Body>>;
    type Error = Error;
    type Transform = BearerAuthMiddlewareService<S, B>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(BearerAuthMiddlewareService { service: Rc::new(service), _backend: PhantomData })
    }
}

pub struct BearerAuthMiddlewareService<S, B> {
    service: Rc<S>,
    _backend: PhantomData<fn() -> B>,
}

impl<S, Body, B> Service<ServiceRequest> for BearerAuthMiddlewareService<S, B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<Body>, Error = Error> + 'static,
    S::Future: 'static,
    Body: 'static,
    B: AuthManagement + 'static,
{
    type Response = ServiceResponse<EitherBody<Body>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let Some(api) = req.app_data::<web::Data<AuthApi<B>>>().cloned() else {
                error!("💻️ The bearer middleware is installed, but no AuthApi has been registered with the app");
                return Ok(req.error_response(ServerError::BackendError).map_into_right_body());
            };
            let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
            match api.authenticate_bearer(&header).await {
                Ok(user) => {
                    trace!("💻️ Request to {} authenticated as user #{}", req.path(), user.id);
                    req.extensions_mut().insert(AuthenticatedUser(user));
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                Err(e) => Ok(req.error_response(ServerError::from(e)).map_into_right_body()),
            }
        })
    }
}
