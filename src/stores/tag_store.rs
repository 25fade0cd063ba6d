//! Tag store - full CRUD over `/admin/tags`, no companion collections

use crate::api::resources::Tags;

use super::EntityStore;

pub type TagStore = EntityStore<Tags>;
