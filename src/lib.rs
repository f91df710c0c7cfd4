//! # processos-api
//!
//! HTTP API over the `processos` MongoDB collection of billing workflow
//! records: filtered listing, status and collaborator updates, and a
//! per responsible party dashboard.
//!
//! ## Modules
//!
//! - `api` - axum router, handlers and shared state
//! - `config` - Server configuration from the environment
//! - `dashboard` - Amount parsing and per responsible party aggregation
//! - `error` - Error kinds reported to API clients
//! - `models` - Process records and mutation payloads
//! - `pagination` - Page arithmetic and response envelope
//! - `query` - Filter construction from request parameters
//! - `service` - Request-level operations over a store
//! - `store` - MongoDB and in-memory process stores
pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod pagination;
pub mod query;
pub mod service;
pub mod store;

pub use error::ApiError;
