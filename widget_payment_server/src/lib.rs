//! # Widget payment gateway server
//! This crate hosts the HTTP front of the widget storefront. It is responsible for:
//! * Taking card payments from the storefront and from staff using the virtual terminal, and recording them through
//!   the [`widget_payment_engine`].
//! * Logging staff in and out, and letting them recover a forgotten password by e-mail.
//! * Serving the admin views of sales, subscriptions and staff accounts.
//! * Pushing admin notifications to connected browsers over a websocket.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/ws`: The admin notification websocket.
//! * `/api/...`: The storefront and login routes. See [routes](routes/index.html).
//! * `/api/admin/...`: Staff-only routes. These require an `Authorization: Bearer <token>` header.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod ws;

#[cfg(test)]
mod endpoint_tests;
