//! services/api/src/lib.rs
//!
//! The book catalog HTTP service: configuration, error mapping, storage
//! adapters and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
