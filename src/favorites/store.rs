use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use super::{FavoriteEntry, FavoritesCollection, NewFavorite};
use crate::kind::ItemKind;

const FAVORITES_FILE: &str = "favorites.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("favorites file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("favorites file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Durable mirror of a [`FavoritesCollection`] in a single JSON file.
///
/// Mutations are applied to memory and then written out while holding the
/// store lock. A failed write restores the previous in-memory list, so the
/// collection never runs ahead of the file.
#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    favorites: FavoritesCollection,
    write_lock: Mutex<()>,
}

impl FavoritesStore {
    /// Opens `<data_dir>/favorites.json`, creating the directory and an empty
    /// file when missing. An unreadable file is logged and the store starts
    /// empty.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let path = data_dir.join(FAVORITES_FILE);
        if !path.exists() {
            info!("Creating empty favorites file at {}", path.display());
            fs::write(&path, "[]")?;
        }

        let store = Self {
            path,
            favorites: FavoritesCollection::new(),
            write_lock: Mutex::new(()),
        };

        match store.load() {
            Ok(()) => info!(
                "Loaded {} favorites from {}",
                store.favorites.count(),
                store.path.display()
            ),
            Err(e) => warn!(
                "Failed to load favorites from {}, starting empty: {}",
                store.path.display(),
                e
            ),
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the in-memory list with the file contents. On error the
    /// current list is left as it was.
    pub fn load(&self) -> Result<(), StoreError> {
        debug!("Reading favorites from {}", self.path.display());
        let content = fs::read_to_string(&self.path)?;
        let content = content.trim();

        if content.is_empty() || content == "[]" {
            self.favorites.replace_all(Vec::new());
            return Ok(());
        }

        let entries: Vec<FavoriteEntry> = serde_json::from_str(content)?;
        self.favorites.replace_all(entries);
        Ok(())
    }

    /// Overwrites the file with the current list.
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.favorites.get_all())?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn add(&self, favorite: NewFavorite) -> Result<(), StoreError> {
        let label = format!("{} ({}:{})", favorite.name, favorite.kind, favorite.id);
        self.mutate(|favorites| favorites.add(favorite))
            .inspect(|_| info!("Saved favorite {}", label))
            .inspect_err(|e| warn!("Failed to save favorite {}: {}", label, e))
    }

    pub fn remove(&self, id: &str, kind: ItemKind) -> Result<(), StoreError> {
        self.mutate(|favorites| favorites.remove(id, kind))
            .inspect(|_| info!("Removed favorite {}:{}", kind, id))
            .inspect_err(|e| warn!("Failed to save after removing {}:{}: {}", kind, id, e))
    }

    fn mutate(&self, apply: impl FnOnce(&FavoritesCollection)) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let snapshot = self.favorites.get_all();
        apply(&self.favorites);
        if let Err(e) = self.save() {
            self.favorites.replace_all(snapshot);
            return Err(e);
        }
        Ok(())
    }

    pub fn get_all(&self) -> Vec<FavoriteEntry> {
        self.favorites.get_all()
    }

    pub fn get_by_kind(&self, kind: ItemKind) -> Vec<FavoriteEntry> {
        self.favorites.get_by_kind(kind)
    }

    pub fn contains(&self, id: &str, kind: ItemKind) -> bool {
        self.favorites.contains(id, kind)
    }

    pub fn keys(&self) -> HashSet<(ItemKind, String)> {
        self.favorites.keys()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn read_file(store: &FavoritesStore) -> String {
        fs::read_to_string(store.path()).unwrap()
    }

    #[test]
    fn open_creates_directory_and_empty_file() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested").join("data");
        let store = FavoritesStore::open(&data_dir).unwrap();

        assert!(store.get_all().is_empty());
        assert_eq!(read_file(&store), "[]");
    }

    #[test]
    fn empty_file_loads_as_no_favorites() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FAVORITES_FILE), "").unwrap();
        let store = FavoritesStore::open(dir.path()).unwrap();
        assert!(store.get_all().is_empty());

        fs::write(store.path(), "  []\n").unwrap();
        store.load().unwrap();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty_and_reports_on_reload() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(FAVORITES_FILE), "{not json").unwrap();
        let store = FavoritesStore::open(dir.path()).unwrap();
        assert!(store.get_all().is_empty());

        store.add(NewFavorite::new("a", ItemKind::Track, "A")).unwrap();
        fs::write(store.path(), "[{\"id\": 1}]").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Serde(_))));
        assert!(store.contains("a", ItemKind::Track));
    }

    #[test]
    fn unknown_kind_in_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(FAVORITES_FILE),
            r#"[{"id":"p","type":"podcast","name":"P","image_url":"","added_at":"2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        let store = FavoritesStore::open(dir.path()).unwrap();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FavoritesStore::open(dir.path()).unwrap();
        store
            .add(NewFavorite::new("1", ItemKind::Album, "Blue").with_image("http://img/1"))
            .unwrap();
        store.add(NewFavorite::new("2", ItemKind::Artist, "Band")).unwrap();
        store.add(NewFavorite::new("3", ItemKind::Track, "Tune")).unwrap();
        let before = store.get_all();

        let reopened = FavoritesStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get_all(), before);
    }

    #[test]
    fn persisted_format_uses_wire_field_names() {
        let dir = TempDir::new().unwrap();
        let store = FavoritesStore::open(dir.path()).unwrap();
        store
            .add(NewFavorite::new("abc", ItemKind::Track, "Song A").with_image("http://img"))
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&read_file(&store)).unwrap();
        let entry = &value[0];
        assert_eq!(entry["id"], "abc");
        assert_eq!(entry["type"], "track");
        assert_eq!(entry["name"], "Song A");
        assert_eq!(entry["image_url"], "http://img");
        assert!(entry["added_at"].is_string());
    }

    #[test]
    fn add_rename_remove_leaves_empty_array() {
        let dir = TempDir::new().unwrap();
        let store = FavoritesStore::open(dir.path()).unwrap();

        store.add(NewFavorite::new("abc", ItemKind::Track, "Song A")).unwrap();
        assert_eq!(store.get_all().len(), 1);

        store
            .add(NewFavorite::new("abc", ItemKind::Track, "Song A (renamed)"))
            .unwrap();
        let all = store.get_all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Song A (renamed)");

        store.remove("abc", ItemKind::Track).unwrap();
        assert!(store.get_all().is_empty());
        assert_eq!(read_file(&store), "[]");
    }

    #[test]
    fn failed_save_rolls_back_memory() {
        let dir = TempDir::new().unwrap();
        let store = FavoritesStore::open(dir.path()).unwrap();
        store.add(NewFavorite::new("keep", ItemKind::Artist, "Keep")).unwrap();

        // A directory in place of the file makes every write fail.
        fs::remove_file(store.path()).unwrap();
        fs::create_dir(store.path()).unwrap();

        let result = store.add(NewFavorite::new("lost", ItemKind::Artist, "Lost"));
        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(!store.contains("lost", ItemKind::Artist));

        assert!(store.remove("keep", ItemKind::Artist).is_err());
        assert!(store.contains("keep", ItemKind::Artist));
    }

    #[test]
    fn concurrent_adds_are_all_persisted() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(FavoritesStore::open(dir.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .add(NewFavorite::new(i.to_string(), ItemKind::Track, "t"))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let reopened = FavoritesStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get_all().len(), 8);
    }
}
