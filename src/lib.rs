//! stationdesk - admin console client for a music-streaming station catalog
//!
//! The crate keeps local collections of users, tags, stations and songs in
//! step with the catalog service. Views mount a store, read its
//! `{items, loading, error}` snapshot and call its mutations; the
//! `AuthSession` supplies the credential every request carries.

pub mod api;
pub mod config;
pub mod models;
pub mod routes;
pub mod session;
pub mod stores;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError, HttpTransport, RequestContext};
pub use routes::{guard, Guard, Route};
pub use session::{AuthSession, SessionState};
pub use stores::{SongScope, SongStore, StationStore, TagStore, UserStore};
