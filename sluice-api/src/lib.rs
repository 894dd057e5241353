//! # sluice-api
//!
//! The HTTP surface of sluice. `POST /` resolves a submitted link into a
//! delivery decision (redirect, tunnel, picker, error); `GET /tunnel?id=…`
//! redeems a one-shot handle and streams the bytes through the executor.

pub mod api;
pub mod config;
pub mod resolver;
pub mod tunnel_store;

pub use api::server::{AppState, router, serve};
pub use config::AppConfig;
pub use resolver::{MediaResolver, UnconfiguredResolver, validate_link};
pub use tunnel_store::TunnelStore;
