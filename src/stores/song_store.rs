//! Song store - songs (global or per station) plus the tag choice list
//!
//! Station-scoped listings depend on the signed-in user, so they are gated on
//! the session: nothing is requested while the session is resolving, nor while
//! nobody is signed in.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::api::resources::{Songs, Tags};
use crate::api::{ApiClient, ApiError, ApiRequest, Method, RequestContext};
use crate::models::{Song, SongDraft, Tag};
use crate::session::{AuthSession, SessionState};

use super::{EntityStore, StoreSnapshot};

const FETCH_FAILED: &str = "Failed to fetch songs or tags";

/// Which songs a view lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongScope {
    All,
    Station(i64),
}

/// Inputs a listing depends on; a change triggers a re-fetch
#[derive(Debug, Clone, PartialEq, Eq)]
enum DependencyKey {
    All,
    Station {
        id: i64,
        resolving: bool,
        user_id: Option<i64>,
    },
}

impl DependencyKey {
    fn new(scope: SongScope, session: &SessionState) -> Self {
        match scope {
            SongScope::All => DependencyKey::All,
            SongScope::Station(id) => DependencyKey::Station {
                id,
                resolving: session.is_loading(),
                user_id: session.user().map(|u| u.id),
            },
        }
    }
}

#[derive(Clone)]
pub struct SongStore {
    songs: EntityStore<Songs>,
    tags: EntityStore<Tags>,
    last_key: Arc<Mutex<Option<DependencyKey>>>,
}

impl SongStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            songs: EntityStore::new(api.clone()),
            tags: EntityStore::new(api),
            last_key: Arc::new(Mutex::new(None)),
        }
    }

    /// Bring the listing in line with `scope` and the session. Does nothing
    /// if neither changed since the previous call.
    pub async fn sync(&self, scope: SongScope, session: &SessionState, ctx: &RequestContext) {
        let key = DependencyKey::new(scope, session);
        {
            let mut last = self.last_key.lock();
            if last.as_ref() == Some(&key) {
                return;
            }
            *last = Some(key);
        }

        match (scope, session) {
            (SongScope::All, _) => self.load(None, ctx).await,
            (SongScope::Station(id), SessionState::Resolving) => {
                debug!("Station {} songs wait for the session to resolve", id);
                // supersede anything in flight and stay loading
                self.songs.begin_fetch();
                self.tags.begin_fetch();
            }
            (SongScope::Station(id), SessionState::Anonymous) => {
                debug!("Station {} songs need a signed-in user", id);
                self.songs.set_idle();
                self.tags.set_idle();
            }
            (SongScope::Station(id), SessionState::Authenticated(user)) => {
                self.load(Some((id, user.id)), ctx).await
            }
        }
    }

    /// Fetch again even if nothing changed
    pub async fn reload(&self, scope: SongScope, session: &SessionState, ctx: &RequestContext) {
        *self.last_key.lock() = None;
        self.sync(scope, session, ctx).await;
    }

    /// Keep the listing in sync with every session transition. Runs until
    /// the session goes away.
    pub async fn follow_session(&self, scope: SongScope, session: Arc<AuthSession>) {
        let mut rx = session.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            self.sync(scope, &state, &session.request_context()).await;
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    async fn load(&self, station: Option<(i64, i64)>, ctx: &RequestContext) {
        let songs_token = self.songs.begin_fetch();
        let tags_token = self.tags.begin_fetch();

        let (songs, tags) = futures::join!(
            self.request_songs(station, ctx),
            self.tags.request_all(ctx)
        );

        match (songs, tags) {
            (Ok(songs), Ok(tags)) => {
                self.songs.settle_fetch(songs_token, Ok(songs));
                self.tags.settle_fetch(tags_token, Ok(tags));
            }
            (songs, tags) => {
                if let Err(e) = songs {
                    warn!("Failed to fetch songs: {}", e);
                }
                if let Err(e) = tags {
                    warn!("Failed to fetch tags: {}", e);
                }
                self.songs.settle_fetch(songs_token, Err(FETCH_FAILED));
                self.tags.settle_fetch(tags_token, Err(FETCH_FAILED));
            }
        }
    }

    async fn request_songs(
        &self,
        station: Option<(i64, i64)>,
        ctx: &RequestContext,
    ) -> Result<Vec<Song>, ApiError> {
        match station {
            None => self.songs.request_all(ctx).await,
            Some((station_id, user_id)) => {
                // user_id lets the server apply its visibility rules
                let request = ApiRequest::new(Method::Get, Songs::station_path(station_id), ctx)
                    .query("user_id", user_id);
                self.songs.api().fetch(request).await
            }
        }
    }

    pub async fn create(&self, ctx: &RequestContext, draft: &SongDraft) -> Option<Song> {
        self.songs.create(ctx, draft).await
    }

    /// Update a song. If the server answers without a body, tag names are
    /// resolved against the companion tag list.
    pub async fn update(&self, ctx: &RequestContext, id: i64, draft: &SongDraft) -> Option<Song> {
        self.songs
            .update_with(ctx, id, draft, |song, draft| {
                Songs::merge_with_known(song, draft, &self.tags.items())
            })
            .await
    }

    pub async fn remove(&self, ctx: &RequestContext, id: i64) -> bool {
        self.songs.remove(ctx, id).await
    }

    pub fn songs(&self) -> Vec<Song> {
        self.songs.items()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.tags.items()
    }

    pub fn snapshot(&self) -> StoreSnapshot<Song> {
        self.songs.snapshot()
    }

    pub fn is_loading(&self) -> bool {
        self.songs.is_loading() || self.tags.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.songs.error()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<StoreSnapshot<Song>> {
        self.songs.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, UserRole};
    use crate::session::MemoryTokenStore;
    use crate::stores::LoadPhase;
    use crate::test_support::MockTransport;
    use serde_json::json;

    fn admin() -> User {
        User {
            id: 11,
            username: "admin".into(),
            email: "admin@example.com".into(),
            role: UserRole::Admin,
            created_at: None,
        }
    }

    fn song_json(id: i64, title: &str) -> serde_json::Value {
        json!({"id": id, "title": title, "artist": "a", "genre": "g", "suno_id": "s",
               "tags": [{"id": 1, "name": "lofi"}]})
    }

    #[tokio::test]
    async fn test_global_scope_ignores_session() {
        let mock = MockTransport::new();
        mock.reply_json(Method::Get, "/songs", json!([song_json(1, "one")]));
        mock.reply_json(Method::Get, "/admin/tags", json!([{"id": 1, "name": "lofi"}]));
        let store = SongStore::new(mock.client());

        store
            .sync(SongScope::All, &SessionState::Resolving, &RequestContext::anonymous())
            .await;

        assert_eq!(store.songs().len(), 1);
        assert_eq!(store.tags().len(), 1);
        assert!(!store.is_loading());

        // session resolving does not refetch a global listing
        store
            .sync(
                SongScope::All,
                &SessionState::Authenticated(admin()),
                &RequestContext::with_bearer("t"),
            )
            .await;
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn test_station_scope_waits_for_session() {
        let mock = MockTransport::new();
        let store = SongStore::new(mock.client());

        store
            .sync(SongScope::Station(3), &SessionState::Resolving, &RequestContext::anonymous())
            .await;
        assert_eq!(mock.request_count(), 0);
        assert!(store.is_loading());

        store
            .sync(SongScope::Station(3), &SessionState::Anonymous, &RequestContext::anonymous())
            .await;
        assert_eq!(mock.request_count(), 0);
        assert_eq!(store.snapshot().phase, LoadPhase::Idle);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_station_scope_passes_user_id() {
        let mock = MockTransport::new();
        mock.reply_json(Method::Get, "/stations/3/songs", json!([song_json(4, "four")]));
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        let store = SongStore::new(mock.client());

        store
            .sync(
                SongScope::Station(3),
                &SessionState::Authenticated(admin()),
                &RequestContext::with_bearer("t"),
            )
            .await;

        let sent = mock.requests_to(Method::Get, "/stations/3/songs");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].query, vec![("user_id".to_string(), "11".to_string())]);
        assert_eq!(sent[0].context.bearer(), Some("t"));
        assert_eq!(store.songs()[0].id, 4);
    }

    #[tokio::test]
    async fn test_follow_session_fetches_after_resolution() {
        let mock = MockTransport::new();
        mock.reply_json(
            Method::Get,
            "/me",
            json!({"id": 11, "username": "admin", "email": "", "role": "admin"}),
        );
        mock.reply_json(Method::Get, "/stations/5/songs", json!([song_json(1, "one")]));
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        let session = Arc::new(AuthSession::new(
            mock.client(),
            Arc::new(MemoryTokenStore::with_token("stored")),
        ));
        let store = SongStore::new(mock.client());

        let follower = {
            let store = store.clone();
            let session = session.clone();
            tokio::spawn(async move { store.follow_session(SongScope::Station(5), session).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(mock.request_count(), 0);

        session.initialize().await;
        while store.is_loading() {
            tokio::task::yield_now().await;
        }

        let sent = mock.requests_to(Method::Get, "/stations/5/songs");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].context.bearer(), Some("stored"));
        assert_eq!(store.songs().len(), 1);
        follower.abort();
    }

    #[tokio::test]
    async fn test_scope_change_drops_stale_listing() {
        let mock = MockTransport::new();
        let slow = mock.hold(Method::Get, "/stations/1/songs");
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        mock.reply_json(Method::Get, "/stations/2/songs", json!([song_json(2, "two")]));
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        let store = SongStore::new(mock.client());
        let session = SessionState::Authenticated(admin());

        let first = {
            let store = store.clone();
            let session = session.clone();
            tokio::spawn(async move {
                store
                    .sync(SongScope::Station(1), &session, &RequestContext::with_bearer("t"))
                    .await
            })
        };
        while mock.requests_to(Method::Get, "/stations/1/songs").is_empty() {
            tokio::task::yield_now().await;
        }

        store
            .sync(SongScope::Station(2), &session, &RequestContext::with_bearer("t"))
            .await;
        slow.json(json!([song_json(1, "one")]));
        first.await.unwrap();

        let ids: Vec<_> = store.songs().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_failure_in_either_request_sets_combined_error() {
        let mock = MockTransport::new();
        mock.reply_status(Method::Get, "/songs", 500, "x");
        mock.reply_json(Method::Get, "/admin/tags", json!([{"id": 1, "name": "lofi"}]));
        let store = SongStore::new(mock.client());

        store
            .sync(SongScope::All, &SessionState::Anonymous, &RequestContext::anonymous())
            .await;

        assert!(!store.is_loading());
        assert!(store.tags().is_empty());
        assert_eq!(store.error().as_deref(), Some("Failed to fetch songs or tags"));
    }

    #[tokio::test]
    async fn test_create_and_update_send_tag_names() {
        let mock = MockTransport::new();
        mock.reply_json(Method::Get, "/songs", json!([song_json(1, "one")]));
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        mock.reply_json(Method::Post, "/admin/songs", song_json(2, "two"));
        mock.reply_json(Method::Put, "/admin/songs/1", song_json(1, "uno"));
        let store = SongStore::new(mock.client());
        let ctx = RequestContext::with_bearer("t");
        store.sync(SongScope::All, &SessionState::Anonymous, &ctx).await;

        let draft = SongDraft {
            title: "two".into(),
            artist: "a".into(),
            genre: "g".into(),
            suno_id: "s".into(),
            tags: vec!["lofi".into()],
        };
        store.create(&ctx, &draft).await;
        store
            .update(&ctx, 1, &SongDraft { title: "uno".into(), ..draft.clone() })
            .await;

        let titles: Vec<_> = store.songs().into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["uno", "two"]);
        let post = mock.requests_to(Method::Post, "/admin/songs");
        assert_eq!(post[0].body.as_ref().unwrap()["tags"], json!(["lofi"]));
        assert_eq!(store.songs()[0].tags[0], Tag::new(1, "lofi"));
    }

    fn listener(id: i64) -> SessionState {
        SessionState::Authenticated(User { id, ..admin() })
    }

    #[tokio::test]
    async fn test_user_change_refetches_station_listing() {
        let mock = MockTransport::new();
        mock.reply_json(Method::Get, "/stations/3/songs", json!([song_json(1, "one")]));
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        mock.reply_json(Method::Get, "/stations/3/songs", json!([song_json(2, "two")]));
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        mock.reply_json(Method::Get, "/stations/3/songs", json!([song_json(3, "three")]));
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        let store = SongStore::new(mock.client());
        let ctx = RequestContext::with_bearer("t");

        store.sync(SongScope::Station(3), &listener(11), &ctx).await;
        store.sync(SongScope::Station(3), &listener(12), &ctx).await;

        let sent = mock.requests_to(Method::Get, "/stations/3/songs");
        let user_ids: Vec<_> = sent.iter().map(|r| r.query[0].1.as_str()).collect();
        assert_eq!(user_ids, vec!["11", "12"]);
        assert_eq!(store.songs()[0].id, 2);

        // same scope, same user
        store.sync(SongScope::Station(3), &listener(12), &ctx).await;
        assert_eq!(mock.requests_to(Method::Get, "/stations/3/songs").len(), 2);

        store.reload(SongScope::Station(3), &listener(12), &ctx).await;
        assert_eq!(mock.requests_to(Method::Get, "/stations/3/songs").len(), 3);
        assert_eq!(store.songs()[0].id, 3);
    }

    #[tokio::test]
    async fn test_bodyless_update_resolves_tags_from_companion_list() {
        let mock = MockTransport::new();
        mock.reply_json(Method::Get, "/songs", json!([song_json(1, "one")]));
        mock.reply_json(
            Method::Get,
            "/admin/tags",
            json!([{"id": 1, "name": "lofi"}, {"id": 2, "name": "jazz"}]),
        );
        mock.reply_empty(Method::Put, "/admin/songs/1", 204);
        let store = SongStore::new(mock.client());
        let ctx = RequestContext::with_bearer("t");
        store.sync(SongScope::All, &SessionState::Anonymous, &ctx).await;

        let draft = SongDraft {
            title: "uno".into(),
            artist: "a".into(),
            genre: "g".into(),
            suno_id: "s".into(),
            tags: vec!["jazz".into(), "lofi".into(), "unknown".into()],
        };
        let updated = store.update(&ctx, 1, &draft).await.unwrap();

        assert_eq!(updated.title, "uno");
        assert_eq!(updated.tags, vec![Tag::new(2, "jazz"), Tag::new(1, "lofi")]);
        assert_eq!(store.songs()[0], updated);
    }
}
