//! Client side of the catalog service API

pub mod auth;
mod client;
mod context;
mod error;
pub mod resources;
pub mod transport;

pub use client::ApiClient;
pub use context::RequestContext;
pub use error::ApiError;
pub use resources::{Creatable, Deletable, Mutable, Resource, Updatable};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
