use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::{FavoriteEntry, NewFavorite};
use crate::kind::ItemKind;

/// Ordered list of favorites, unique by `(id, kind)`.
///
/// Every method takes the internal lock for its whole duration and returns
/// owned copies, so callers never hold a reference into the list.
#[derive(Debug, Default)]
pub struct FavoritesCollection {
    items: Mutex<Vec<FavoriteEntry>>,
}

impl FavoritesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FavoriteEntry>> {
        // A panic while holding the lock cannot leave a half-applied edit
        // behind: every mutation is a single Vec operation.
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts the entry, or overwrites the fields of the existing entry with
    /// the same key in place.
    pub fn add(&self, favorite: NewFavorite) {
        let entry = favorite.into_entry(Utc::now());
        let mut items = self.lock();
        match items.iter_mut().find(|e| e.matches(&entry.id, entry.kind)) {
            Some(existing) => *existing = entry,
            None => items.push(entry),
        }
    }

    pub fn remove(&self, id: &str, kind: ItemKind) {
        self.lock().retain(|e| !e.matches(id, kind));
    }

    pub fn get_all(&self) -> Vec<FavoriteEntry> {
        self.lock().clone()
    }

    pub fn get_by_kind(&self, kind: ItemKind) -> Vec<FavoriteEntry> {
        self.lock()
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: &str, kind: ItemKind) -> bool {
        self.lock().iter().any(|e| e.matches(id, kind))
    }

    /// `(kind, id)` pairs of every favorite, for marking search results.
    pub fn keys(&self) -> HashSet<(ItemKind, String)> {
        self.lock()
            .iter()
            .map(|e| (e.kind, e.id.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Swaps the whole list. Later duplicates of a key are dropped so the
    /// uniqueness invariant holds for hand-edited files too.
    pub fn replace_all(&self, entries: Vec<FavoriteEntry>) {
        let mut seen = HashSet::new();
        let deduped = entries
            .into_iter()
            .filter(|e| seen.insert((e.kind, e.id.clone())))
            .collect();
        *self.lock() = deduped;
    }
}
