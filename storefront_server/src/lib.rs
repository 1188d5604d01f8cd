//! # Storefront server
//! This crate hosts the HTTP front end of the storefront. It is responsible for:
//! * Authenticating shoppers with bearer tokens.
//! * Quoting carts and placing orders through the storefront engine.
//! * Receiving Paystack payment notifications and handing them to the settlement reconciler.
//! * Serving the affiliate self-service endpoints.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/paystack`: Paystack's notification webhook. Authenticated by the `x-paystack-signature` header.
//! * `/affiliate/validate/{code}`: Public affiliate code lookup.
//! * `/api/...`: Everything else. These routes require a bearer token.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
