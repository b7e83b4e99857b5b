//! HTTP service exposing dojo competition brackets.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
