//! Client-side model of the channel digest backend: wire types, the HTTP
//! client, and the state owned by each user-facing flow.

pub mod client;
pub mod config;
pub mod flow;
pub mod platform;
pub mod protocol;
pub mod query;
pub mod schedule;
pub mod scrape;
pub mod session;
pub mod summaries;

pub use client::{BackendClient, ClientError, MessageLimit};
