//! Configuration module for stationdesk
//!
//! This module contains the client configuration and path management.

mod client_config;
mod paths;

pub use client_config::{ClientConfig, BASE_URL_ENV};
pub use paths::Paths;
