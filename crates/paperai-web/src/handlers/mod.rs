//! HTTP handlers for all web routes.

pub mod auth;
pub mod chat;
pub mod dashboard;
