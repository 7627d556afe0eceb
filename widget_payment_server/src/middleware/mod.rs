mod bearer_auth;

pub use bearer_auth::{AuthenticatedUser, BearerAuthMiddlewareFactory, BearerAuthMiddlewareService};
