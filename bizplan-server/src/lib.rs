//! HTTP boundary for the business plan generator.
//!
//! Exposes the generation service over axum and provides a client for
//! posting intake answers to a running server.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod client;
pub mod error;
pub mod routes;

pub use client::{ClientError, PlanClient};
pub use error::{ApiError, ErrorBody};
pub use routes::{router, AppState};
