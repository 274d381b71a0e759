//! Request middleware.

pub mod metrics;
