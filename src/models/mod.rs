//! Data models for the station catalog
//!
//! Every entity carries an opaque positive id assigned by the catalog service.

mod song;
mod station;
mod tag;
mod user;

pub use song::{Song, SongDraft};
pub use station::{Station, StationDraft};
pub use tag::{Tag, TagDraft};
pub use user::{User, UserRole};

/// A record with a server-assigned id
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;
}
