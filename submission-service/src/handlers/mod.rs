//! HTTP handlers for the submission service.

pub mod activity;
pub mod admin;
pub mod auth;
pub mod metrics;
pub mod submission;
pub mod user;
