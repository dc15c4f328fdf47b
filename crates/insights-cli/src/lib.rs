//! Client library for the Spending Insights customer API: session
//! management over a pluggable key-value store, a pure transaction query
//! pipeline, and typed access to the dashboard endpoints.

pub mod auth;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod query;
pub mod services;
pub mod storage;
