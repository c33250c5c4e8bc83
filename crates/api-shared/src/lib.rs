//! # API Shared
//!
//! Shared utilities and definitions for the prescription firewall adapters.
//!
//! Contains:
//! - Request/response types (`dto` module) with OpenAPI schemas
//! - Shared services like `HealthService` and bulk analysis
//! - API-key authentication for administrative endpoints
//!
//! Used by `api-rest` and `rxfw-cli`.

pub mod auth;
pub mod bulk;
pub mod dto;
pub mod health;

pub use bulk::analyze_bulk;
pub use dto::*;
pub use health::HealthService;
