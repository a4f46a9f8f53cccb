//! Catalog API payloads and the display helpers the views use on them.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use crate::kind::ItemKind;

/// A catalog type that can be fetched by id.
pub trait CatalogEntity: for<'de> Deserialize<'de> {
    const KIND: ItemKind;
}

/// Any single catalog item, for callers holding only a runtime kind.
#[derive(Clone, Debug)]
pub enum CatalogItem {
    Artist(Artist),
    Album(Album),
    Track(Track),
}

impl CatalogItem {
    pub fn name(&self) -> &str {
        match self {
            CatalogItem::Artist(a) => &a.name,
            CatalogItem::Album(a) => &a.name,
            CatalogItem::Track(t) => &t.name,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            CatalogItem::Artist(_) => ItemKind::Artist,
            CatalogItem::Album(_) => ItemKind::Album,
            CatalogItem::Track(_) => ItemKind::Track,
        }
    }
}

/// One page of a paged listing.
#[derive(Clone, Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(deserialize_with = "skip_nulls")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}

/// The upstream sprinkles `null` into item arrays now and then.
fn skip_nulls<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchResults {
    pub artists: Option<Page<Artist>>,
    pub albums: Option<Page<Album>>,
    pub tracks: Option<Page<Track>>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.artists.as_ref().map_or(true, |p| p.items.is_empty())
            && self.albums.as_ref().map_or(true, |p| p.items.is_empty())
            && self.tracks.as_ref().map_or(true, |p| p.items.is_empty())
    }

    pub fn total(&self, kind: ItemKind) -> u32 {
        match kind {
            ItemKind::Artist => self.artists.as_ref().map_or(0, |p| p.total),
            ItemKind::Album => self.albums.as_ref().map_or(0, |p| p.total),
            ItemKind::Track => self.tracks.as_ref().map_or(0, |p| p.total),
        }
    }

    pub fn count(&self, kind: ItemKind) -> usize {
        match kind {
            ItemKind::Artist => self.artists.as_ref().map_or(0, |p| p.items.len()),
            ItemKind::Album => self.albums.as_ref().map_or(0, |p| p.items.len()),
            ItemKind::Track => self.tracks.as_ref().map_or(0, |p| p.items.len()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub followers: Followers,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_type: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub release_date_precision: String,
    #[serde(default)]
    pub total_tracks: u32,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub duration_ms: u32,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Image {
    pub url: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Followers {
    #[serde(default)]
    pub total: u64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

impl CatalogEntity for Artist {
    const KIND: ItemKind = ItemKind::Artist;
}

impl CatalogEntity for Album {
    const KIND: ItemKind = ItemKind::Album;
}

impl CatalogEntity for Track {
    const KIND: ItemKind = ItemKind::Track;
}

fn first_image(images: &[Image]) -> &str {
    images
        .first()
        .and_then(|i| i.url.as_deref())
        .unwrap_or_default()
}

fn or_unknown<'a>(name: &'a str, fallback: &'a str) -> &'a str {
    if name.is_empty() {
        fallback
    } else {
        name
    }
}

/// CSS class for a 0-100 popularity score.
pub fn popularity_class(popularity: u32) -> &'static str {
    match popularity {
        80.. => "popularity-high",
        50.. => "popularity-medium",
        _ => "popularity-low",
    }
}

/// `m:ss` rendering of a duration in milliseconds.
pub fn format_duration(ms: u32) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Abbreviates follower counts: `2.5M`, `12.3K`, `999`.
pub fn format_followers(count: u64) -> String {
    if count > 1_000_000 {
        abbreviate(count, 1_000_000, "M")
    } else if count > 1_000 {
        abbreviate(count, 1_000, "K")
    } else {
        group_thousands(count)
    }
}

fn abbreviate(count: u64, unit: u64, suffix: &str) -> String {
    let tenths = count * 10 / unit;
    match tenths % 10 {
        0 => format!("{}{}", group_thousands(tenths / 10), suffix),
        d => format!("{}.{}{}", group_thousands(tenths / 10), d, suffix),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl Artist {
    pub fn display_name(&self) -> &str {
        or_unknown(&self.name, "Unknown Artist")
    }

    pub fn primary_image(&self) -> &str {
        first_image(&self.images)
    }

    pub fn spotify_url(&self) -> &str {
        self.external_urls.spotify.as_deref().unwrap_or_default()
    }

    pub fn genre_list(&self) -> String {
        if self.genres.is_empty() {
            "Unknown".to_string()
        } else {
            self.genres.join(", ")
        }
    }

    pub fn popularity_class(&self) -> &'static str {
        popularity_class(self.popularity)
    }

    pub fn followers_formatted(&self) -> String {
        format_followers(self.followers.total)
    }
}

impl Album {
    pub fn primary_image(&self) -> &str {
        first_image(&self.images)
    }

    pub fn primary_artist(&self) -> Option<&Artist> {
        self.artists.first()
    }

    /// `album`, `single` or `compilation`; plain "album" when the API omits it.
    pub fn type_label(&self) -> &str {
        if self.album_type.is_empty() {
            "album"
        } else {
            &self.album_type
        }
    }

    pub fn spotify_url(&self) -> &str {
        self.external_urls.spotify.as_deref().unwrap_or_default()
    }

    /// Year component of the release date, whatever its precision.
    pub fn release_year(&self) -> String {
        let parsed = match self.release_date_precision.as_str() {
            "year" => self.release_date.parse::<i32>().ok(),
            "month" => NaiveDate::parse_from_str(&format!("{}-01", self.release_date), "%Y-%m-%d")
                .ok()
                .map(|d| chrono::Datelike::year(&d)),
            _ => NaiveDate::parse_from_str(&self.release_date, "%Y-%m-%d")
                .ok()
                .map(|d| chrono::Datelike::year(&d)),
        };
        match parsed {
            Some(year) => year.to_string(),
            None => self.release_date.chars().take(4).collect(),
        }
    }
}

impl Track {
    pub fn display_name(&self) -> &str {
        or_unknown(&self.name, "Unknown Track")
    }

    /// Tracks carry no artwork of their own; the album's is used.
    pub fn primary_image(&self) -> &str {
        self.album.primary_image()
    }

    pub fn spotify_url(&self) -> &str {
        self.external_urls.spotify.as_deref().unwrap_or_default()
    }

    pub fn artist_names(&self) -> String {
        if self.artists.is_empty() {
            return "Unknown Artist".to_string();
        }
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration_ms)
    }

    pub fn popularity_class(&self) -> &'static str {
        popularity_class(self.popularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(61_000), "1:01");
        assert_eq!(format_duration(215_999), "3:35");
    }

    #[test]
    fn popularity_buckets() {
        assert_eq!(popularity_class(100), "popularity-high");
        assert_eq!(popularity_class(80), "popularity-high");
        assert_eq!(popularity_class(79), "popularity-medium");
        assert_eq!(popularity_class(50), "popularity-medium");
        assert_eq!(popularity_class(0), "popularity-low");
    }

    #[test]
    fn follower_abbreviations() {
        assert_eq!(format_followers(0), "0");
        assert_eq!(format_followers(999), "999");
        assert_eq!(format_followers(1_000), "1,000");
        assert_eq!(format_followers(1_234), "1.2K");
        assert_eq!(format_followers(15_000), "15K");
        assert_eq!(format_followers(1_000_000), "1,000K");
        assert_eq!(format_followers(2_560_000), "2.5M");
        assert_eq!(format_followers(1_234_000_000), "1,234M");
    }

    #[test]
    fn release_year_for_each_precision() {
        let album = |date: &str, precision: &str| Album {
            release_date: date.into(),
            release_date_precision: precision.into(),
            ..Default::default()
        };
        assert_eq!(album("1999-04-12", "day").release_year(), "1999");
        assert_eq!(album("1987-06", "month").release_year(), "1987");
        assert_eq!(album("1969", "year").release_year(), "1969");
        assert_eq!(album("2003-xx", "day").release_year(), "2003");
    }

    #[test]
    fn null_items_are_dropped() {
        let page: Page<Album> = serde_json::from_str(
            r#"{"items":[null,{"id":"1","name":"One"}],"total":2,"limit":20,"offset":0}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn track_helpers() {
        let track: Track = serde_json::from_str(
            r#"{
                "id": "t", "name": "", "duration_ms": 125000, "popularity": 55,
                "artists": [{"id": "a", "name": "A"}, {"id": "b", "name": "B"}],
                "album": {"id": "al", "name": "Al", "images": [{"url": "http://img", "width": 64, "height": 64}]},
                "external_urls": {"spotify": "https://open.spotify.com/track/t"}
            }"#,
        )
        .unwrap();
        assert_eq!(track.display_name(), "Unknown Track");
        assert_eq!(track.artist_names(), "A, B");
        assert_eq!(track.formatted_duration(), "2:05");
        assert_eq!(track.primary_image(), "http://img");
        assert_eq!(track.popularity_class(), "popularity-medium");
        assert_eq!(track.spotify_url(), "https://open.spotify.com/track/t");
    }
}
