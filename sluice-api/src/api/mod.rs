//! HTTP surface: routes, wire models and server setup.

pub mod models;
pub mod routes;
pub mod server;
