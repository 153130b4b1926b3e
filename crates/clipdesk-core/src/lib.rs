//! Core types and workflows for the clipdesk submission dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage,
//! mail delivery, and artifact persistence are reached through the
//! [`store::DashboardStore`], [`mail::MailTransport`] and
//! [`signature::ArtifactStore`] traits; everything else depends on this crate.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attribution;
pub mod dispatch;
pub mod error;
pub mod mail;
pub mod notification;
pub mod referrer;
pub mod reports;
pub mod signature;
pub mod store;
pub mod submission;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use error::{Error, Result};
