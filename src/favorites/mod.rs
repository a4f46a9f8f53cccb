//! Bookmarked catalog items, kept in memory and mirrored to a JSON file.

mod collection;
mod store;

pub use collection::FavoritesCollection;
pub use store::{FavoritesStore, StoreError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kind::ItemKind;

/// A favorite as persisted in `favorites.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    fn matches(&self, id: &str, kind: ItemKind) -> bool {
        self.kind == kind && self.id == id
    }
}

/// Input to [`FavoritesCollection::add`]. A missing `added_at` is stamped
/// with the current time.
#[derive(Clone, Debug)]
pub struct NewFavorite {
    pub id: String,
    pub kind: ItemKind,
    pub name: String,
    pub image_url: String,
    pub added_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
impl NewFavorite {
    pub fn new(id: impl Into<String>, kind: ItemKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            image_url: String::new(),
            added_at: None,
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }
}

impl NewFavorite {
    fn into_entry(self, now: DateTime<Utc>) -> FavoriteEntry {
        FavoriteEntry {
            id: self.id,
            kind: self.kind,
            name: self.name,
            image_url: self.image_url,
            added_at: self.added_at.unwrap_or(now),
        }
    }
}
