//! Handlers rendering HTML pages.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::AppState;
use crate::catalog::{Album, CatalogItem, Page, SearchResults, Track, FALLBACK_GENRES};
use crate::error::AppError;
use crate::kind::ItemKind;
use crate::pagination::{PageParams, PageQuery, Pagination};
use crate::views::{render, CollectionFilters, PageContent, PageData, APP_NAME};

const RECOMMENDATION_COUNT: u32 = 10;
const ARTIST_ALBUM_LIMIT: u32 = 20;
const ALBUM_TRACK_LIMIT: u32 = 50;

/// Category listings never claim more items than this.
const CATEGORY_MAX_ITEMS: u32 = 1000;
const CATEGORY_MIN_PAGES: u32 = 20;

fn title(prefix: &str) -> String {
    format!("{} - {}", prefix, APP_NAME)
}

/// Renders the error page with the given status.
fn error_page(status: StatusCode, logged_in: bool, message: &str) -> Response {
    let data = PageData::new(title("Error"), logged_in, PageContent::Error).with_error(message);
    (status, render(&data)).into_response()
}

/// GET /
pub async fn home(State(state): State<AppState>) -> Response {
    let logged_in = state.auth.is_valid().await;

    let mut tracks = Vec::new();
    if logged_in {
        match state.catalog.get_recommendations(RECOMMENDATION_COUNT).await {
            Ok(t) => tracks = t,
            Err(e) => warn!("Failed to load recommendations: {}", e),
        }
    }

    let content = PageContent::Home {
        tracks,
        genres: FALLBACK_GENRES.iter().map(|g| g.to_string()).collect(),
    };
    render(&PageData::new(title("Discover Music"), logged_in, content)).into_response()
}

/// GET /search?q&type&limit&page
///
/// `type` may repeat, so the query is taken as raw pairs.
pub async fn search(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let mut query = String::new();
    let mut kinds = Vec::new();
    let mut paging = PageQuery::default();
    for (key, value) in pairs {
        match key.as_str() {
            "q" => query = value,
            "type" => match value.parse::<ItemKind>() {
                Ok(kind) if !kinds.contains(&kind) => kinds.push(kind),
                Ok(_) => {}
                Err(e) => debug!("Ignoring search type: {}", e),
            },
            "limit" => paging.limit = Some(value),
            "page" => paging.page = Some(value),
            _ => {}
        }
    }
    if kinds.is_empty() {
        kinds = ItemKind::ALL.to_vec();
    }
    let query = query.trim().to_string();
    let params = PageParams::resolve(&paging, &state.pagination);

    let empty = |kinds: Vec<ItemKind>| PageContent::Search {
        results: None,
        kinds,
        favorites: Default::default(),
        pagination: BTreeMap::new(),
    };

    if query.is_empty() {
        return render(&PageData::new(title("Search"), true, empty(kinds))).into_response();
    }

    info!(
        "Searching for {:?} ({:?}), limit={}, page={}",
        query, kinds, params.limit, params.page
    );
    let results = match state
        .catalog
        .search(&query, &kinds, params.limit, params.offset())
        .await
    {
        Ok(results) => results,
        Err(e) => {
            warn!("Search failed: {}", e);
            let data = PageData::new(title("Search"), true, empty(kinds))
                .with_query(query)
                .with_error(format!("Search failed: {}", e));
            return render(&data).into_response();
        }
    };

    let pagination = ItemKind::ALL
        .into_iter()
        .filter(|kind| results.count(*kind) > 0)
        .map(|kind| (kind, Pagination::new(params, results.total(kind))))
        .collect();

    let content = PageContent::Search {
        results: Some(results),
        kinds,
        favorites: state.favorites.keys(),
        pagination,
    };
    render(&PageData::new(title("Search Results"), true, content).with_query(query)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct CollectionQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub popularity: String,
    #[serde(default)]
    pub year: String,
    #[serde(flatten)]
    pub paging: PageQuery,
}

/// Search query used to fill the collection for one kind. Artists only
/// honour the genre filter.
fn collection_query(kind: ItemKind, filters: &CollectionFilters) -> String {
    let mut query = String::new();
    if !filters.genre.is_empty() {
        query.push_str(&format!("genre:{} ", filters.genre));
    }
    if kind == ItemKind::Artist {
        return if query.is_empty() {
            "pop rock".to_string()
        } else {
            query.trim_end().to_string()
        };
    }
    if !filters.year.is_empty() {
        query.push_str(&format!("year:{} ", filters.year));
    }
    if query.is_empty() {
        "year:2020-2024".to_string()
    } else {
        query.trim_end().to_string()
    }
}

/// GET /collection?type&genre&popularity&year&limit&page
pub async fn collection(
    State(state): State<AppState>,
    Query(params): Query<CollectionQuery>,
) -> Response {
    let page = PageParams::resolve(&params.paging, &state.pagination);
    let filters = CollectionFilters {
        kind: params.kind.as_deref().and_then(|k| k.parse().ok()),
        genre: params.genre.trim().to_string(),
        popularity: params.popularity.trim().to_string(),
        year: params.year.trim().to_string(),
    };

    let genres = state.catalog.list_genres().await.unwrap_or_else(|e| {
        warn!("Failed to list genres: {}", e);
        Vec::new()
    });

    let catalog = &state.catalog;
    let filters_ref = &filters;
    let fetch = |kind: ItemKind| async move {
        if filters_ref.kind.is_some_and(|k| k != kind) {
            return None;
        }
        let query = collection_query(kind, filters_ref);
        debug!("Collection search for {}: {}", kind, query);
        Some(
            catalog
                .search(&query, &[kind], page.limit, page.offset())
                .await,
        )
    };
    let (artists, albums, tracks) = tokio::join!(
        fetch(ItemKind::Artist),
        fetch(ItemKind::Album),
        fetch(ItemKind::Track)
    );

    let mut results = SearchResults::default();
    let mut found = false;
    for (kind, outcome) in [
        (ItemKind::Artist, artists),
        (ItemKind::Album, albums),
        (ItemKind::Track, tracks),
    ] {
        let mut partial = match outcome {
            None => continue,
            Some(Ok(partial)) => partial,
            Some(Err(e)) => {
                warn!("Collection search for {} failed: {}", kind, e);
                continue;
            }
        };
        let present = match kind {
            ItemKind::Artist => {
                results.artists = partial.artists.take();
                results.artists.is_some()
            }
            ItemKind::Album => {
                results.albums = partial.albums.take();
                results.albums.is_some()
            }
            ItemKind::Track => {
                results.tracks = partial.tracks.take();
                results.tracks.is_some()
            }
        };
        if present {
            debug!("Collection has {} {}s", results.count(kind), kind);
        }
        found |= present;
    }

    if !found {
        let content = PageContent::Collection {
            results,
            genres,
            favorites: Default::default(),
            filters,
            pagination: None,
        };
        let data = PageData::new(title("Collection"), true, content)
            .with_error("No results match your filters");
        return render(&data).into_response();
    }

    let highest = ItemKind::ALL
        .into_iter()
        .map(|kind| results.total(kind))
        .max()
        .unwrap_or(0);
    let pagination = Pagination::capped(page, highest, state.pagination.max_pages);

    let content = PageContent::Collection {
        results,
        genres,
        favorites: state.favorites.keys(),
        filters,
        pagination: Some(pagination),
    };
    render(&PageData::new(title("Collection"), true, content)).into_response()
}

/// Shared body of the artist, album and track pages.
async fn detail(state: &AppState, kind: ItemKind, id: &str) -> Response {
    let item = match state.catalog.get_item(kind, id).await {
        Ok(item) => item,
        Err(e) => {
            warn!("Failed to load {} {}: {}", kind, id, e);
            let err = AppError::from(e);
            return error_page(
                err.status(),
                true,
                &format!("Could not load {}: {}", kind, err.message()),
            );
        }
    };
    debug!("Loaded {} {:?}", item.kind(), item.name());
    let page_title = title(item.name());
    let is_favorite = state.favorites.contains(id, kind);

    let content = match item {
        CatalogItem::Artist(artist) => {
            let albums = state
                .catalog
                .get_child_items::<Album>(kind, id, ARTIST_ALBUM_LIMIT, 0)
                .await
                .unwrap_or_else(|e| {
                    warn!("Failed to load albums of artist {}: {}", id, e);
                    Page::default()
                });
            PageContent::Artist {
                artist,
                albums,
                is_favorite,
            }
        }
        CatalogItem::Album(album) => {
            let tracks = state
                .catalog
                .get_child_items::<Track>(kind, id, ALBUM_TRACK_LIMIT, 0)
                .await
                .unwrap_or_else(|e| {
                    warn!("Failed to load tracks of album {}: {}", id, e);
                    Page::default()
                });
            PageContent::Album {
                album,
                tracks,
                is_favorite,
            }
        }
        CatalogItem::Track(track) => PageContent::Track { track, is_favorite },
    };
    render(&PageData::new(page_title, true, content)).into_response()
}

/// GET /artist/:id
pub async fn artist(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    detail(&state, ItemKind::Artist, &id).await
}

/// GET /album/:id
pub async fn album(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    detail(&state, ItemKind::Album, &id).await
}

/// GET /track/:id
pub async fn track(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    detail(&state, ItemKind::Track, &id).await
}

/// GET /favorites
pub async fn favorites(State(state): State<AppState>) -> Response {
    let content = PageContent::Favorites {
        all: state.favorites.get_all(),
        artists: state.favorites.get_by_kind(ItemKind::Artist),
        albums: state.favorites.get_by_kind(ItemKind::Album),
        tracks: state.favorites.get_by_kind(ItemKind::Track),
    };
    render(&PageData::new(title("My Favorites"), true, content)).into_response()
}

/// Search query for a category page. Later pages narrow to a decade so
/// that deep offsets still return results.
fn category_query(genre: &str, page: u32) -> String {
    let mut query = format!("genre:{}", genre);
    if page > 5 {
        let start = (2020 - i64::from(page / 5) * 10).max(1950);
        query.push_str(&format!(" year:{}-{}", start, start + 9));
    }
    query
}

/// Page count of a category listing: the reported total capped at
/// [`CATEGORY_MAX_ITEMS`], and at least [`CATEGORY_MIN_PAGES`] pages
/// whenever anything was found.
fn category_pages(reported_total: u32, has_items: bool, limit: u32) -> (u32, u32) {
    let total = if reported_total > 0 && reported_total < CATEGORY_MAX_ITEMS {
        reported_total
    } else {
        CATEGORY_MAX_ITEMS
    };
    let mut pages = total.div_ceil(limit);
    if has_items {
        pages = pages.max(CATEGORY_MIN_PAGES);
    }
    (total, pages)
}

/// GET /category/:genre?limit&page
pub async fn category(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(paging): Query<PageQuery>,
) -> Result<Response, AppError> {
    let params = PageParams::resolve(&paging, &state.pagination);
    let query = category_query(&genre, params.page);
    info!(
        "Category search {:?}, page={}, offset={}",
        query,
        params.page,
        params.offset()
    );

    let results = state
        .catalog
        .search(
            &query,
            &[ItemKind::Track],
            params.limit.saturating_mul(2),
            params.offset(),
        )
        .await
        .map_err(|e| AppError::Upstream(format!("Catalog search failed: {}", e)))?;

    let page = results.tracks.unwrap_or_default();
    let (total, pages) = category_pages(page.total, !page.items.is_empty(), params.limit);

    let content = PageContent::Category {
        genre: genre.clone(),
        tracks: page.items,
        favorites: state.favorites.keys(),
        pagination: Pagination::with_total_pages(params, total, pages),
    };
    let page_title = title(&format!("{} Music", genre));
    Ok(render(&PageData::new(page_title, true, content)).into_response())
}

/// GET /about
pub async fn about() -> Response {
    render(&PageData::new(title("About"), true, PageContent::About)).into_response()
}

/// Fallback for unknown routes.
pub async fn not_found(State(state): State<AppState>) -> Response {
    let logged_in = state.auth.is_valid().await;
    error_page(StatusCode::NOT_FOUND, logged_in, "Page not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters(kind: Option<ItemKind>, genre: &str, year: &str) -> CollectionFilters {
        CollectionFilters {
            kind,
            genre: genre.into(),
            popularity: String::new(),
            year: year.into(),
        }
    }

    #[test]
    fn collection_defaults() {
        let none = filters(None, "", "");
        assert_eq!(collection_query(ItemKind::Artist, &none), "pop rock");
        assert_eq!(collection_query(ItemKind::Album, &none), "year:2020-2024");
        assert_eq!(collection_query(ItemKind::Track, &none), "year:2020-2024");
    }

    #[test]
    fn collection_filters_build_query() {
        let f = filters(None, "jazz", "1990");
        assert_eq!(collection_query(ItemKind::Artist, &f), "genre:jazz");
        assert_eq!(collection_query(ItemKind::Track, &f), "genre:jazz year:1990");

        let year_only = filters(None, "", "1999");
        assert_eq!(collection_query(ItemKind::Artist, &year_only), "pop rock");
        assert_eq!(collection_query(ItemKind::Album, &year_only), "year:1999");
    }

    #[test]
    fn category_year_windows() {
        assert_eq!(category_query("rock", 1), "genre:rock");
        assert_eq!(category_query("rock", 5), "genre:rock");
        assert_eq!(category_query("rock", 6), "genre:rock year:2010-2019");
        assert_eq!(category_query("rock", 10), "genre:rock year:2000-2009");
        assert_eq!(category_query("rock", 50), "genre:rock year:1950-1959");
    }

    #[test]
    fn category_page_counts() {
        assert_eq!(category_pages(5000, true, 20), (1000, 50));
        assert_eq!(category_pages(0, false, 20), (1000, 50));
        assert_eq!(category_pages(100, true, 20), (100, 20));
        assert_eq!(category_pages(100, false, 20), (100, 5));
    }
}
