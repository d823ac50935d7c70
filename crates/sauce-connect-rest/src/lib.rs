//! Sauce Labs REST v1 client
//!
//! Thin client for the two tunnel endpoints the supervisor needs: listing
//! the tunnels that are live for an account, and deleting one of them.
//! Every call is a fresh snapshot; there is no caching and no retrying —
//! callers decide how to react to a failed call.

pub mod client;

pub use client::{RestError, SauceRestClient, TunnelId, DEFAULT_BASE_URL};
