//! Endpoint sets for each catalog entity
//!
//! A `Resource` names the list endpoint of an entity kind. Mutations are
//! opt-in capabilities: a resource that does not implement `Creatable`,
//! `Updatable` or `Deletable` simply has no such operation on its store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{Entity, Song, SongDraft, Station, StationDraft, Tag, TagDraft, User};

/// Read side of an entity kind
pub trait Resource: Send + Sync + 'static {
    type Entity: Entity + DeserializeOwned + std::fmt::Debug;

    /// Plural name used in log lines
    const NAME: &'static str;
    /// `GET` path returning the whole collection
    const LIST_PATH: &'static str;
    const FETCH_FAILED: &'static str;
}

/// Write side shared by every mutation capability
pub trait Mutable: Resource {
    type Draft: Serialize + Clone + Send + Sync + std::fmt::Debug + 'static;

    /// Collection path for admin writes; items live at `{ADMIN_PATH}/{id}`
    const ADMIN_PATH: &'static str;

    fn item_path(id: i64) -> String {
        format!("{}/{}", Self::ADMIN_PATH, id)
    }
}

pub trait Creatable: Mutable {
    const CREATE_FAILED: &'static str;
}

pub trait Updatable: Mutable {
    const UPDATE_FAILED: &'static str;

    /// Apply a draft locally when the server acknowledges an update without
    /// echoing the entity back
    fn merge_draft(existing: &Self::Entity, draft: &Self::Draft) -> Self::Entity;
}

pub trait Deletable: Mutable {
    const DELETE_FAILED: &'static str;
}

/// `/admin/tags`
pub struct Tags;

impl Resource for Tags {
    type Entity = Tag;
    const NAME: &'static str = "tags";
    const LIST_PATH: &'static str = "/admin/tags";
    const FETCH_FAILED: &'static str = "Failed to fetch tags";
}

impl Mutable for Tags {
    type Draft = TagDraft;
    const ADMIN_PATH: &'static str = "/admin/tags";
}

impl Creatable for Tags {
    const CREATE_FAILED: &'static str = "Failed to add tag";
}

impl Updatable for Tags {
    const UPDATE_FAILED: &'static str = "Failed to update tag";

    fn merge_draft(existing: &Tag, draft: &TagDraft) -> Tag {
        Tag {
            id: existing.id,
            name: draft.name.clone(),
        }
    }
}

impl Deletable for Tags {
    const DELETE_FAILED: &'static str = "Failed to delete tag";
}

/// `/stations`, written through `/admin/stations`
pub struct Stations;

impl Resource for Stations {
    type Entity = Station;
    const NAME: &'static str = "stations";
    const LIST_PATH: &'static str = "/stations";
    const FETCH_FAILED: &'static str = "Failed to fetch stations";
}

impl Mutable for Stations {
    type Draft = StationDraft;
    const ADMIN_PATH: &'static str = "/admin/stations";
}

impl Creatable for Stations {
    const CREATE_FAILED: &'static str = "Failed to add station";
}

impl Updatable for Stations {
    const UPDATE_FAILED: &'static str = "Failed to update station";

    fn merge_draft(existing: &Station, draft: &StationDraft) -> Station {
        Station {
            id: existing.id,
            name: draft.name.clone(),
            tags: draft.tags.clone(),
        }
    }
}

impl Deletable for Stations {
    const DELETE_FAILED: &'static str = "Failed to delete station";
}

/// `/songs`, written through `/admin/songs`
pub struct Songs;

impl Songs {
    /// Songs visible on one station for one listener
    pub fn station_path(station_id: i64) -> String {
        format!("/stations/{}/songs", station_id)
    }

    /// Apply a draft locally. Tag names resolve against the song's own tags
    /// first, then `known`; names found in neither are left for the next fetch.
    pub fn merge_with_known(existing: &Song, draft: &SongDraft, known: &[Tag]) -> Song {
        let tags = draft
            .tags
            .iter()
            .filter_map(|name| {
                existing
                    .tags
                    .iter()
                    .chain(known)
                    .find(|t| &t.name == name)
                    .cloned()
            })
            .collect();

        Song {
            title: draft.title.clone(),
            artist: draft.artist.clone(),
            genre: draft.genre.clone(),
            suno_id: draft.suno_id.clone(),
            tags,
            ..existing.clone()
        }
    }
}

impl Resource for Songs {
    type Entity = Song;
    const NAME: &'static str = "songs";
    const LIST_PATH: &'static str = "/songs";
    const FETCH_FAILED: &'static str = "Failed to fetch songs";
}

impl Mutable for Songs {
    type Draft = SongDraft;
    const ADMIN_PATH: &'static str = "/admin/songs";
}

impl Creatable for Songs {
    const CREATE_FAILED: &'static str = "Failed to add song";
}

impl Updatable for Songs {
    const UPDATE_FAILED: &'static str = "Failed to update song";

    fn merge_draft(existing: &Song, draft: &SongDraft) -> Song {
        Self::merge_with_known(existing, draft, &[])
    }
}

impl Deletable for Songs {
    const DELETE_FAILED: &'static str = "Failed to delete song";
}

/// `/users`, read-only
pub struct Users;

impl Resource for Users {
    type Entity = User;
    const NAME: &'static str = "users";
    const LIST_PATH: &'static str = "/users";
    const FETCH_FAILED: &'static str = "Failed to fetch users";
}
