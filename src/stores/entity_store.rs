//! Generic entity store - an in-memory collection kept in step with the catalog service

use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, Creatable, Deletable, RequestContext, Resource, Updatable};
use crate::models::Entity;

/// Lifecycle of a store's collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Nothing to load (e.g. scope needs a user and none is signed in)
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What views render: `{items, loading, error}`
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot<T> {
    pub items: Vec<T>,
    pub phase: LoadPhase,
    /// Message of the most recent failed operation
    pub error: Option<String>,
}

impl<T> StoreSnapshot<T> {
    pub fn loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }
}

struct Inner<R: Resource> {
    api: ApiClient,
    state: watch::Sender<StoreSnapshot<R::Entity>>,
    /// Token of the latest issued fetch
    latest_fetch: AtomicU64,
    next_token: AtomicU64,
    /// Latest update/remove token per entity id
    pending: Mutex<HashMap<i64, u64>>,
    _resource: PhantomData<fn() -> R>,
}

/// Store for one entity kind.
///
/// Clones share the same collection. Operations never fail outward: errors
/// land in the `error` slot and the collection is left as it was.
pub struct EntityStore<R: Resource> {
    inner: Arc<Inner<R>>,
}

impl<R: Resource> Clone for EntityStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> EntityStore<R> {
    /// A freshly mounted store is `Loading` until its first fetch settles
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(StoreSnapshot {
            items: Vec::new(),
            phase: LoadPhase::Loading,
            error: None,
        });

        Self {
            inner: Arc::new(Inner {
                api,
                state,
                latest_fetch: AtomicU64::new(0),
                next_token: AtomicU64::new(1),
                pending: Mutex::new(HashMap::new()),
                _resource: PhantomData,
            }),
        }
    }

    pub fn snapshot(&self) -> StoreSnapshot<R::Entity> {
        self.inner.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<R::Entity> {
        self.inner.state.borrow().items.clone()
    }

    pub fn get(&self, id: i64) -> Option<R::Entity> {
        self.inner
            .state
            .borrow()
            .items
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    pub fn phase(&self) -> LoadPhase {
        self.inner.state.borrow().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == LoadPhase::Loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn clear_error(&self) {
        self.inner.state.send_modify(|s| s.error = None);
    }

    /// Receive a fresh snapshot after every change
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot<R::Entity>> {
        self.inner.state.subscribe()
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    fn issue_token(&self) -> u64 {
        self.inner.next_token.fetch_add(1, Ordering::SeqCst)
    }

    /// Load the whole collection, replacing whatever was held before
    pub async fn fetch_all(&self, ctx: &RequestContext) {
        let token = self.begin_fetch();
        let result = self.request_all(ctx).await;
        if let Err(e) = &result {
            warn!("Failed to fetch {}: {}", R::NAME, e);
        }
        self.settle_fetch(token, result.map_err(|_| R::FETCH_FAILED));
    }

    pub(crate) async fn request_all(&self, ctx: &RequestContext) -> Result<Vec<R::Entity>, ApiError> {
        self.inner.api.get(ctx, R::LIST_PATH).await
    }

    /// Enter `Loading` and claim the latest fetch token
    pub(crate) fn begin_fetch(&self) -> u64 {
        let token = self.issue_token();
        self.inner.latest_fetch.store(token, Ordering::SeqCst);
        self.inner.state.send_if_modified(|s| {
            let changed = s.phase != LoadPhase::Loading;
            s.phase = LoadPhase::Loading;
            changed
        });
        token
    }

    /// Apply a fetch outcome unless a newer fetch was issued meanwhile.
    /// Returns whether the outcome was applied.
    pub(crate) fn settle_fetch(
        &self,
        token: u64,
        result: Result<Vec<R::Entity>, &'static str>,
    ) -> bool {
        if self.inner.latest_fetch.load(Ordering::SeqCst) != token {
            debug!("Dropping stale {} fetch #{}", R::NAME, token);
            return false;
        }

        self.inner.state.send_modify(|s| match result {
            Ok(items) => {
                s.items = dedup_by_id(items);
                s.phase = LoadPhase::Ready;
            }
            Err(message) => {
                s.error = Some(message.to_string());
                s.phase = LoadPhase::Failed;
            }
        });
        true
    }

    /// Park the store: no fetch is pending and none will be issued
    pub(crate) fn set_idle(&self) {
        // supersede any fetch still in flight
        let token = self.issue_token();
        self.inner.latest_fetch.store(token, Ordering::SeqCst);
        self.inner.state.send_modify(|s| s.phase = LoadPhase::Idle);
    }

    fn record_error(&self, message: &'static str) {
        self.inner
            .state
            .send_modify(|s| s.error = Some(message.to_string()));
    }

    /// Claim the latest mutation slot for `id`
    fn begin_mutation(&self, id: i64) -> u64 {
        let token = self.issue_token();
        self.inner.pending.lock().insert(id, token);
        token
    }

    /// True if no newer mutation of `id` was issued; releases the slot
    fn finish_mutation(&self, id: i64, token: u64) -> bool {
        let mut pending = self.inner.pending.lock();
        if pending.get(&id) == Some(&token) {
            pending.remove(&id);
            true
        } else {
            false
        }
    }
}

impl<R: Creatable> EntityStore<R> {
    /// Post a draft and append the entity the server returns
    pub async fn create(&self, ctx: &RequestContext, draft: &R::Draft) -> Option<R::Entity> {
        match self
            .inner
            .api
            .post::<_, R::Entity>(ctx, R::ADMIN_PATH, draft)
            .await
        {
            Ok(entity) => {
                self.inner
                    .state
                    .send_modify(|s| upsert(&mut s.items, entity.clone()));
                Some(entity)
            }
            Err(e) => {
                warn!("Failed to create in {}: {}", R::NAME, e);
                self.record_error(R::CREATE_FAILED);
                None
            }
        }
    }
}

impl<R: Updatable> EntityStore<R> {
    /// Put a draft and replace the matching element in place.
    ///
    /// Returns the updated entity, or `None` on failure or when a newer
    /// mutation of the same id superseded this one. If the id is not held
    /// locally the collection is left alone and the server's echo, if any,
    /// is returned as is.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        draft: &R::Draft,
    ) -> Option<R::Entity> {
        self.update_with(ctx, id, draft, R::merge_draft).await
    }

    /// `update` with a custom merge for servers that answer without a body
    pub(crate) async fn update_with<F>(
        &self,
        ctx: &RequestContext,
        id: i64,
        draft: &R::Draft,
        merge: F,
    ) -> Option<R::Entity>
    where
        F: FnOnce(&R::Entity, &R::Draft) -> R::Entity,
    {
        let token = self.begin_mutation(id);
        let result = self
            .inner
            .api
            .put::<_, R::Entity>(ctx, &R::item_path(id), draft)
            .await;

        if !self.finish_mutation(id, token) {
            debug!("Dropping superseded update of {} #{}", R::NAME, id);
            return None;
        }

        match result {
            Ok(echoed) => {
                let mut applied = None;
                self.inner.state.send_if_modified(|s| {
                    match s.items.iter_mut().find(|e| e.id() == id) {
                        Some(slot) => {
                            let updated = match &echoed {
                                Some(entity) => entity.clone(),
                                None => merge(slot, draft),
                            };
                            *slot = updated.clone();
                            applied = Some(updated);
                            true
                        }
                        None => false,
                    }
                });
                if applied.is_none() {
                    debug!("Updated {} #{} is not held locally", R::NAME, id);
                }
                applied.or(echoed)
            }
            Err(e) => {
                warn!("Failed to update {} #{}: {}", R::NAME, id, e);
                self.record_error(R::UPDATE_FAILED);
                None
            }
        }
    }
}

impl<R: Deletable> EntityStore<R> {
    /// Delete by id and drop it from the collection
    pub async fn remove(&self, ctx: &RequestContext, id: i64) -> bool {
        let token = self.begin_mutation(id);
        let result = self.inner.api.delete(ctx, &R::item_path(id)).await;

        if !self.finish_mutation(id, token) {
            debug!("Dropping superseded delete of {} #{}", R::NAME, id);
            return false;
        }

        match result {
            Ok(()) => {
                self.inner
                    .state
                    .send_modify(|s| s.items.retain(|e| e.id() != id));
                true
            }
            Err(e) => {
                warn!("Failed to delete {} #{}: {}", R::NAME, id, e);
                self.record_error(R::DELETE_FAILED);
                false
            }
        }
    }
}

/// Replace the element with the same id, or append
fn upsert<T: Entity>(items: &mut Vec<T>, entity: T) {
    match items.iter_mut().find(|e| e.id() == entity.id()) {
        Some(slot) => *slot = entity,
        None => items.push(entity),
    }
}

fn dedup_by_id<T: Entity>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items.into_iter().filter(|e| seen.insert(e.id())).collect()
}
