mod admin;
mod auth;
mod checkout;
mod helpers;
mod mocks;
