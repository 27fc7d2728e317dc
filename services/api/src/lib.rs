//! services/api/src/lib.rs
//!
//! The HTTP service for the language-learning backend: configuration, store and
//! model adapters, and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
