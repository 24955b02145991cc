//! HTTP route handlers

pub mod analytics;
pub mod interactions;
pub mod learning;
