//! Server-side HTML for each named page.
//!
//! Handlers assemble a [`PageData`] and hand it to [`render`]; the page
//! content enum selects the template. Every interpolated string goes
//! through [`escape`].

mod pages;

use std::collections::{BTreeMap, HashSet};

use axum::response::Html;
use chrono::{DateTime, Utc};

use crate::catalog::{Album, Artist, Page, SearchResults, Track};
use crate::favorites::FavoriteEntry;
use crate::kind::ItemKind;
use crate::pagination::Pagination;

pub const APP_NAME: &str = "MelodyExplorer";

/// Keys of favorited items, used to mark results.
pub type FavoriteKeys = HashSet<(ItemKind, String)>;

/// Everything a page template needs.
#[derive(Debug)]
pub struct PageData {
    pub title: String,
    pub logged_in: bool,
    pub query: String,
    pub error: Option<String>,
    pub content: PageContent,
}

impl PageData {
    pub fn new(title: impl Into<String>, logged_in: bool, content: PageContent) -> Self {
        Self {
            title: title.into(),
            logged_in,
            query: String::new(),
            error: None,
            content,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Filters of the collection page, echoed back into its links.
#[derive(Debug, Default, Clone)]
pub struct CollectionFilters {
    pub kind: Option<ItemKind>,
    pub genre: String,
    pub popularity: String,
    pub year: String,
}

impl CollectionFilters {
    pub fn as_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(kind) = self.kind {
            params.push(("type", kind.as_str().to_string()));
        }
        for (key, value) in [
            ("genre", &self.genre),
            ("popularity", &self.popularity),
            ("year", &self.year),
        ] {
            if !value.is_empty() {
                params.push((key, value.clone()));
            }
        }
        params
    }
}

#[derive(Debug)]
pub enum PageContent {
    Home {
        tracks: Vec<Track>,
        genres: Vec<String>,
    },
    Search {
        results: Option<SearchResults>,
        kinds: Vec<ItemKind>,
        favorites: FavoriteKeys,
        pagination: BTreeMap<ItemKind, Pagination>,
    },
    Collection {
        results: SearchResults,
        genres: Vec<String>,
        favorites: FavoriteKeys,
        filters: CollectionFilters,
        pagination: Option<Pagination>,
    },
    Artist {
        artist: Artist,
        albums: Page<Album>,
        is_favorite: bool,
    },
    Album {
        album: Album,
        tracks: Page<Track>,
        is_favorite: bool,
    },
    Track {
        track: Track,
        is_favorite: bool,
    },
    Favorites {
        all: Vec<FavoriteEntry>,
        artists: Vec<FavoriteEntry>,
        albums: Vec<FavoriteEntry>,
        tracks: Vec<FavoriteEntry>,
    },
    Category {
        genre: String,
        tracks: Vec<Track>,
        favorites: FavoriteKeys,
        pagination: Pagination,
    },
    About,
    Error,
}

impl PageContent {
    /// Name of the template that renders this content.
    pub fn template_name(&self) -> &'static str {
        match self {
            PageContent::Home { .. } => "home",
            PageContent::Search { .. } => "search",
            PageContent::Collection { .. } => "collection",
            PageContent::Artist { .. } | PageContent::Album { .. } | PageContent::Track { .. } => {
                "details"
            }
            PageContent::Favorites { .. } => "favorites",
            PageContent::Category { .. } => "category",
            PageContent::About => "about",
            PageContent::Error => "error",
        }
    }

    /// Navigation entry highlighted for this page.
    fn nav_key(&self) -> &'static str {
        match self {
            PageContent::Artist { .. } => "artist",
            PageContent::Album { .. } => "album",
            PageContent::Track { .. } => "track",
            other => other.template_name(),
        }
    }
}

pub fn render(data: &PageData) -> Html<String> {
    let body = match &data.content {
        PageContent::Home { tracks, genres } => pages::home(data.logged_in, tracks, genres),
        PageContent::Search {
            results,
            kinds,
            favorites,
            pagination,
        } => pages::search(&data.query, results.as_ref(), kinds, favorites, pagination),
        PageContent::Collection {
            results,
            genres,
            favorites,
            filters,
            pagination,
        } => pages::collection(results, genres, favorites, filters, pagination.as_ref()),
        PageContent::Artist {
            artist,
            albums,
            is_favorite,
        } => pages::artist(artist, albums, *is_favorite),
        PageContent::Album {
            album,
            tracks,
            is_favorite,
        } => pages::album(album, tracks, *is_favorite),
        PageContent::Track { track, is_favorite } => pages::track(track, *is_favorite),
        PageContent::Favorites {
            all,
            artists,
            albums,
            tracks,
        } => pages::favorites(all.len(), artists, albums, tracks),
        PageContent::Category {
            genre,
            tracks,
            favorites,
            pagination,
        } => pages::category(genre, tracks, favorites, pagination),
        PageContent::About => pages::about(),
        PageContent::Error => String::new(),
    };
    Html(layout(data, &body))
}

fn layout(data: &PageData, body: &str) -> String {
    let nav = [
        ("home", "/", "Home"),
        ("search", "/search", "Search"),
        ("collection", "/collection", "Collection"),
        ("favorites", "/favorites", "Favorites"),
        ("about", "/about", "About"),
    ];
    let current = data.content.nav_key();

    let mut html = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<link rel=\"stylesheet\" href=\"/static/css/style.css\">\n\
         </head>\n<body class=\"page-{}\">\n<header><a class=\"brand\" href=\"/\">{}</a><nav>",
        escape(&data.title),
        data.content.template_name(),
        APP_NAME,
    );
    for (key, href, label) in nav {
        let class = if key == current { " class=\"active\"" } else { "" };
        html += &format!("<a href=\"{}\"{}>{}</a>", href, class, label);
    }
    if data.logged_in {
        html.push_str("<a href=\"/logout\">Log out</a>");
    } else {
        html.push_str("<a href=\"/login\">Log in with Spotify</a>");
    }
    html.push_str("</nav></header>\n<main>\n");
    if let Some(error) = &data.error {
        html += &format!("<p class=\"error\">{}</p>\n", escape(error));
    }
    html.push_str(body);
    html.push_str(
        "\n</main>\n<footer>Data provided by Spotify</footer>\n\
         <script src=\"/static/js/favorites.js\"></script>\n</body>\n</html>\n",
    );
    html
}

/// Escapes text for use in HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Long-form date, e.g. `January 2, 2006`.
pub fn format_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

/// Link to another page of a listing, keeping the query and filters.
pub fn pagination_url(base: &str, query: &str, page: u32, extra: &[(&str, String)]) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();
    if !query.is_empty() {
        params.push(("q", query.to_string()));
    }
    params.push(("page", page.to_string()));
    params.extend(
        extra
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (*k, v.clone())),
    );

    let encoded = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", base, encoded)
}

pub fn format_page_count(current: u32, total: u32) -> String {
    if total > 100 {
        format!("Page {} of many", current)
    } else {
        format!("Page {} of {}", current, total)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::pagination::PageParams;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape("<a href=\"x\">R&B's</a>"),
            "&lt;a href=&quot;x&quot;&gt;R&amp;B&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn dates_render_long_form() {
        let at = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(format_date(&at), "January 2, 2006");
    }

    #[test]
    fn pagination_urls_keep_query_and_filters() {
        let url = pagination_url(
            "/search",
            "rock & roll",
            3,
            &[("type", "album".into()), ("year", String::new())],
        );
        assert_eq!(url, "/search?q=rock%20%26%20roll&page=3&type=album");
        assert_eq!(pagination_url("/category/jazz", "", 2, &[]), "/category/jazz?page=2");
    }

    #[test]
    fn page_count_label() {
        assert_eq!(format_page_count(2, 10), "Page 2 of 10");
        assert_eq!(format_page_count(2, 101), "Page 2 of many");
    }

    #[test]
    fn layout_escapes_title_and_shows_error() {
        let data = PageData::new("<Error>", false, PageContent::Error).with_error("it <broke>");
        let Html(html) = render(&data);
        assert!(html.contains("<title>&lt;Error&gt;</title>"));
        assert!(html.contains("<p class=\"error\">it &lt;broke&gt;</p>"));
        assert!(html.contains("href=\"/login\""));
    }

    #[test]
    fn search_marks_favorites() {
        let results: SearchResults = serde_json::from_str(
            r#"{"tracks":{"items":[{"id":"t1","name":"Fav"},{"id":"t2","name":"Other"}],"total":2,"limit":20,"offset":0}}"#,
        )
        .unwrap();
        let favorites: FavoriteKeys = [(ItemKind::Track, "t1".to_string())].into_iter().collect();
        let mut pagination = BTreeMap::new();
        pagination.insert(
            ItemKind::Track,
            Pagination::new(PageParams { limit: 20, page: 1 }, 2),
        );
        let data = PageData::new(
            "Search",
            true,
            PageContent::Search {
                results: Some(results),
                kinds: vec![ItemKind::Track],
                favorites,
                pagination,
            },
        )
        .with_query("fav");

        let Html(html) = render(&data);
        assert!(html.contains("data-id=\"t1\" data-type=\"track\" data-name=\"Fav\" data-image=\"\" data-favorite=\"true\""));
        assert!(html.contains("data-id=\"t2\" data-type=\"track\" data-name=\"Other\" data-image=\"\" data-favorite=\"false\""));
        assert!(html.contains("class=\"active\">Search"));
    }

    #[test]
    fn album_page_numbers_tracks() {
        let album: Album = serde_json::from_str(
            r#"{"id":"al","name":"Blue","album_type":"single","release_date":"1971-06-22","release_date_precision":"day","total_tracks":2}"#,
        )
        .unwrap();
        let tracks: Page<Track> = serde_json::from_str(
            r#"{"items":[{"id":"t1","name":"Intro","track_number":1},{"id":"t2","name":"River","track_number":2}],"total":2}"#,
        )
        .unwrap();
        let data = PageData::new(
            "Blue",
            true,
            PageContent::Album {
                album,
                tracks,
                is_favorite: false,
            },
        );

        let Html(html) = render(&data);
        assert!(html.contains("<span class=\"album-type\">single</span> &middot; 1971"));
        assert!(html.contains("<li value=\"2\"><a href=\"/track/t2\">River</a>"));
    }
}
