//! Task and project tracking built from interchangeable parts: repositories
//! (in memory or a JSON file), filters, exporters and notifiers.

pub mod config;
pub mod export;
pub mod filters;
pub mod models;
pub mod notifications;
pub mod services;
pub mod storage;
