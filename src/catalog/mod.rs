//! Spotify Web API client.
//!
//! Uses the user's token from the authorization-code flow. Every call is a
//! single authenticated GET; failures are reported once and never retried.

mod models;

pub use models::*;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::Auth;
use crate::kind::ItemKind;

/// Shown when the category listing cannot be fetched.
pub const FALLBACK_GENRES: [&str; 18] = [
    "pop",
    "rock",
    "hip-hop",
    "jazz",
    "electronic",
    "classical",
    "country",
    "reggae",
    "blues",
    "metal",
    "indie",
    "folk",
    "r&b",
    "latin",
    "alternative",
    "dance",
    "ambient",
    "punk",
];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("not authenticated with the catalog")]
    NotAuthenticated,
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog API error {status}: {body}")]
    Status { status: u16, body: String },
    #[error("catalog response could not be parsed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0} items have no children")]
    NoChildren(ItemKind),
}

/// Catalog API client sharing the process-wide [`Auth`].
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    api_base: String,
    auth: Auth,
}

impl CatalogClient {
    pub fn new(auth: Auth, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            auth,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let token = self
            .auth
            .ensure_valid()
            .await
            .ok_or(CatalogError::NotAuthenticated)?;

        let url = format!("{}{}", self.api_base, path);
        debug!("GET {} {:?}", url, params);

        let res = self
            .client
            .get(&url)
            .query(params)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            warn!("Catalog API error {} on {}: {}", status, path, body);
            return Err(CatalogError::Status { status, body });
        }

        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Searches the catalog for the given kinds in one request.
    pub async fn search(
        &self,
        query: &str,
        kinds: &[ItemKind],
        limit: u32,
        offset: u32,
    ) -> Result<SearchResults, CatalogError> {
        let kinds = kinds
            .iter()
            .map(ItemKind::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let params = [
            ("q", query.to_string()),
            ("type", kinds),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ];
        self.get_json("/search", &params).await
    }

    pub async fn get_by_id<T: CatalogEntity>(&self, id: &str) -> Result<T, CatalogError> {
        let path = format!("/{}/{}", T::KIND.collection_path(), urlencoding::encode(id));
        self.get_json(&path, &[]).await
    }

    pub async fn get_item(&self, kind: ItemKind, id: &str) -> Result<CatalogItem, CatalogError> {
        Ok(match kind {
            ItemKind::Artist => CatalogItem::Artist(self.get_by_id(id).await?),
            ItemKind::Album => CatalogItem::Album(self.get_by_id(id).await?),
            ItemKind::Track => CatalogItem::Track(self.get_by_id(id).await?),
        })
    }

    /// Items nested under a parent: an artist's albums or an album's tracks.
    pub async fn get_child_items<T: CatalogEntity>(
        &self,
        parent_kind: ItemKind,
        id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Page<T>, CatalogError> {
        let child = parent_kind
            .child_kind()
            .ok_or(CatalogError::NoChildren(parent_kind))?;
        let path = format!(
            "/{}/{}/{}",
            parent_kind.collection_path(),
            urlencoding::encode(id),
            child.collection_path()
        );
        let params = [("limit", limit.to_string()), ("offset", offset.to_string())];
        self.get_json(&path, &params).await
    }

    /// Names of the browsable categories, or [`FALLBACK_GENRES`] when the
    /// listing is unavailable.
    pub async fn list_genres(&self) -> Result<Vec<String>, CatalogError> {
        #[derive(Deserialize)]
        struct CategoriesResponse {
            categories: Page<Category>,
        }
        #[derive(Deserialize)]
        struct Category {
            name: String,
        }

        let params = [("limit", "50".to_string())];
        match self
            .get_json::<CategoriesResponse>("/browse/categories", &params)
            .await
        {
            Ok(body) => Ok(body.categories.items.into_iter().map(|c| c.name).collect()),
            Err(CatalogError::Decode(e)) => Err(CatalogError::Decode(e)),
            Err(e) => {
                warn!("Falling back to built-in genres: {}", e);
                Ok(FALLBACK_GENRES.iter().map(|g| g.to_string()).collect())
            }
        }
    }

    /// Builds a list of recent tracks: the first track of each new release
    /// until `limit` tracks are collected. Albums whose tracks cannot be
    /// fetched are skipped.
    pub async fn get_recommendations(&self, limit: u32) -> Result<Vec<Track>, CatalogError> {
        #[derive(Deserialize)]
        struct NewReleases {
            albums: Page<Album>,
        }

        let params = [("limit", limit.to_string())];
        let releases: NewReleases = self.get_json("/browse/new-releases", &params).await?;

        let wanted = limit as usize;
        let mut tracks = Vec::with_capacity(wanted);
        for album in releases.albums.items {
            if tracks.len() >= wanted {
                break;
            }
            let page = match self
                .get_child_items::<Track>(ItemKind::Album, &album.id, 1, 0)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!("Skipping tracks of album {}: {}", album.id, e);
                    continue;
                }
            };
            for mut track in page.items.into_iter().take(wanted - tracks.len()) {
                track.album = album.clone();
                tracks.push(track);
            }
        }
        Ok(tracks)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::auth::tests::{fresh_token, test_config};

    fn require_bearer(headers: &HeaderMap) -> Result<(), StatusCode> {
        match headers.get("authorization").and_then(|v| v.to_str().ok()) {
            Some("Bearer access") => Ok(()),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }

    async fn search(
        headers: HeaderMap,
        Query(q): Query<HashMap<String, String>>,
    ) -> impl IntoResponse {
        if let Err(status) = require_bearer(&headers) {
            return (status, "no token").into_response();
        }
        let mut body = serde_json::Map::new();
        for kind in q["type"].split(',') {
            let item = match kind {
                "artist" => json!({"id": "ar1", "name": q["q"]}),
                "album" => json!({"id": "al1", "name": q["q"]}),
                _ => json!({"id": format!("tr-{}-{}", q["limit"], q["offset"]), "name": q["q"]}),
            };
            body.insert(
                format!("{}s", kind),
                json!({"items": [item], "total": 41}),
            );
        }
        Json(serde_json::Value::Object(body)).into_response()
    }

    async fn artist(Path(id): Path<String>) -> impl IntoResponse {
        if id == "missing" {
            return (StatusCode::NOT_FOUND, "{\"error\":\"not found\"}").into_response();
        }
        Json(json!({"id": id, "name": "The Band", "followers": {"total": 1500}})).into_response()
    }

    async fn artist_albums(Path(id): Path<String>) -> Json<serde_json::Value> {
        Json(json!({"items": [{"id": format!("{}-al", id), "name": "Debut"}], "total": 1}))
    }

    async fn new_releases() -> Json<serde_json::Value> {
        Json(json!({"albums": {"items": [
            {"id": "r1", "name": "Release 1"},
            {"id": "broken", "name": "Broken"},
            {"id": "r2", "name": "Release 2"},
            {"id": "r3", "name": "Release 3"},
        ], "total": 4}}))
    }

    async fn album_tracks(Path(id): Path<String>) -> impl IntoResponse {
        if id == "broken" {
            return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
        }
        Json(json!({"items": [{"id": format!("{}-t1", id), "name": "Opener", "duration_ms": 1000}], "total": 9}))
            .into_response()
    }

    async fn categories() -> impl IntoResponse {
        (StatusCode::SERVICE_UNAVAILABLE, "down")
    }

    async fn fake_api() -> String {
        let app = Router::new()
            .route("/search", get(search))
            .route("/artists/:id", get(artist))
            .route("/artists/:id/albums", get(artist_albums))
            .route("/albums/:id/tracks", get(album_tracks))
            .route("/browse/new-releases", get(new_releases))
            .route("/browse/categories", get(categories));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{}", addr)
    }

    async fn client() -> CatalogClient {
        let auth = Auth::new(test_config("http://127.0.0.1:9"));
        auth.set_token(fresh_token()).await;
        CatalogClient::new(auth, fake_api().await)
    }

    #[tokio::test]
    async fn search_sends_kinds_and_paging() {
        let client = client().await;
        let results = client
            .search("blue", &[ItemKind::Artist, ItemKind::Track], 10, 30)
            .await
            .unwrap();

        assert_eq!(results.artists.as_ref().unwrap().items[0].name, "blue");
        assert_eq!(results.tracks.as_ref().unwrap().items[0].id, "tr-10-30");
        assert!(results.albums.is_none());
        assert_eq!(results.total(ItemKind::Artist), 41);
    }

    #[tokio::test]
    async fn lookups_by_kind() {
        let client = client().await;
        let artist: Artist = client.get_by_id("a1").await.unwrap();
        assert_eq!(artist.followers_formatted(), "1.5K");

        let item = client.get_item(ItemKind::Artist, "a1").await.unwrap();
        assert_eq!(item.kind(), ItemKind::Artist);
        assert_eq!(item.name(), "The Band");

        let albums: Page<Album> = client
            .get_child_items(ItemKind::Artist, "a1", 20, 0)
            .await
            .unwrap();
        assert_eq!(albums.items[0].id, "a1-al");
    }

    #[tokio::test]
    async fn upstream_status_is_reported() {
        let client = client().await;
        match client.get_by_id::<Artist>("missing").await {
            Err(CatalogError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("not found"));
            }
            other => panic!("unexpected {:?}", other.map(|a| a.id)),
        }
    }

    #[tokio::test]
    async fn tracks_have_no_children() {
        let client = client().await;
        let result = client
            .get_child_items::<Track>(ItemKind::Track, "t", 1, 0)
            .await;
        assert!(matches!(result, Err(CatalogError::NoChildren(ItemKind::Track))));
    }

    #[tokio::test]
    async fn recommendations_skip_failed_albums() {
        let client = client().await;
        let tracks = client.get_recommendations(2).await.unwrap();
        let ids: Vec<_> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["r1-t1", "r2-t1"]);
        assert_eq!(tracks[1].album.name, "Release 2");

        let all = client.get_recommendations(10).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn genres_fall_back_when_listing_fails() {
        let client = client().await;
        let genres = client.list_genres().await.unwrap();
        assert_eq!(genres.len(), FALLBACK_GENRES.len());
        assert_eq!(genres[0], "pop");
    }

    #[tokio::test]
    async fn requests_need_a_token() {
        let auth = Auth::new(test_config("http://127.0.0.1:9"));
        let client = CatalogClient::new(auth, fake_api().await);
        assert!(matches!(
            client.search("x", &ItemKind::ALL, 1, 0).await,
            Err(CatalogError::NotAuthenticated)
        ));
    }
}
