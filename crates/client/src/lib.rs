//! Management API client for the Hemmer Config Generator
//!
//! Implements [`ManagementApi`](hemmer_config_generator_common::ManagementApi)
//! over HTTP with `reqwest`'s blocking client. The discovery engine only sees
//! records and the NotFound/Other split; authentication, retries, paging and
//! rate limiting all stay in here.

mod client;
mod config;

pub use client::ApiClient;
pub use config::{
    parse_duration, Auth, ClientConfig, DEFAULT_REQUEST_MIN_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_RETRIES, DEFAULT_RETRY_MAX_INTERVAL, DEFAULT_RETRY_MIN_INTERVAL,
};
