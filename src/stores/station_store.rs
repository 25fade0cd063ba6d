//! Station store - stations plus the tag list offered when editing them

use tracing::warn;

use crate::api::resources::{Stations, Tags};
use crate::api::{ApiClient, RequestContext};
use crate::models::{Station, StationDraft, Tag};

use super::{EntityStore, StoreSnapshot};

const FETCH_FAILED: &str = "Failed to fetch stations or tags";

#[derive(Clone)]
pub struct StationStore {
    stations: EntityStore<Stations>,
    tags: EntityStore<Tags>,
}

impl StationStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            stations: EntityStore::new(api.clone()),
            tags: EntityStore::new(api),
        }
    }

    /// Fetch stations and tags together; both settle at once
    pub async fn load(&self, ctx: &RequestContext) {
        let stations_token = self.stations.begin_fetch();
        let tags_token = self.tags.begin_fetch();

        let (stations, tags) = futures::join!(
            self.stations.request_all(ctx),
            self.tags.request_all(ctx)
        );

        match (stations, tags) {
            (Ok(stations), Ok(tags)) => {
                self.stations.settle_fetch(stations_token, Ok(stations));
                self.tags.settle_fetch(tags_token, Ok(tags));
            }
            (stations, tags) => {
                if let Err(e) = stations {
                    warn!("Failed to fetch stations: {}", e);
                }
                if let Err(e) = tags {
                    warn!("Failed to fetch tags: {}", e);
                }
                self.stations.settle_fetch(stations_token, Err(FETCH_FAILED));
                self.tags.settle_fetch(tags_token, Err(FETCH_FAILED));
            }
        }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        name: &str,
        tags: Vec<String>,
    ) -> Option<Station> {
        self.stations
            .create(ctx, &StationDraft::new(name, tags))
            .await
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        name: &str,
        tags: Vec<String>,
    ) -> Option<Station> {
        self.stations
            .update(ctx, id, &StationDraft::new(name, tags))
            .await
    }

    pub async fn remove(&self, ctx: &RequestContext, id: i64) -> bool {
        self.stations.remove(ctx, id).await
    }

    pub fn stations(&self) -> Vec<Station> {
        self.stations.items()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.items()
    }

    pub fn snapshot(&self) -> StoreSnapshot<Station> {
        self.stations.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.stations.is_loading() || self.tags.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.stations.error()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<StoreSnapshot<Station>> {
        self.stations.subscribe()
    }
}
