//! User store - read-only listing of `/users`
//!
//! `Users` has no mutation capabilities, so create/update/remove do not exist
//! on this store.

use crate::api::resources::Users;

use super::EntityStore;

pub type UserStore = EntityStore<Users>;
