//! Client-side stores for users, tags, stations, and songs
//!
//! Each store is mounted by the view that needs it and dropped with it; no
//! collection is shared between stores.

mod entity_store;
mod song_store;
mod station_store;
mod tag_store;
mod user_store;

pub use entity_store::{EntityStore, LoadPhase, StoreSnapshot};
pub use song_store::{SongScope, SongStore};
pub use station_store::StationStore;
pub use tag_store::TagStore;
pub use user_store::UserStore;
