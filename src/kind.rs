//! The three kinds of catalog entries the app deals with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of a catalog item. Serialized as `artist`, `album` or `track`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Artist,
    Album,
    Track,
}

impl ItemKind {
    pub const ALL: [ItemKind; 3] = [ItemKind::Artist, ItemKind::Album, ItemKind::Track];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Artist => "artist",
            ItemKind::Album => "album",
            ItemKind::Track => "track",
        }
    }

    /// Path segment of the catalog API collection for this kind.
    pub fn collection_path(&self) -> &'static str {
        match self {
            ItemKind::Artist => "artists",
            ItemKind::Album => "albums",
            ItemKind::Track => "tracks",
        }
    }

    /// Kind of the items nested under an item of this kind, if any.
    pub fn child_kind(&self) -> Option<ItemKind> {
        match self {
            ItemKind::Artist => Some(ItemKind::Album),
            ItemKind::Album => Some(ItemKind::Track),
            ItemKind::Track => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown item kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for ItemKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "artist" => Ok(ItemKind::Artist),
            "album" => Ok(ItemKind::Album),
            "track" => Ok(ItemKind::Track),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_kinds_only() {
        for kind in ItemKind::ALL {
            assert_eq!(kind.as_str().parse::<ItemKind>().unwrap(), kind);
        }
        assert!("playlist".parse::<ItemKind>().is_err());
        assert!("Artist".parse::<ItemKind>().is_err());
    }

    #[test]
    fn serde_rejects_unknown_kind() {
        let kind: ItemKind = serde_json::from_str("\"album\"").unwrap();
        assert_eq!(kind, ItemKind::Album);
        assert!(serde_json::from_str::<ItemKind>("\"podcast\"").is_err());
    }

    #[test]
    fn only_tracks_have_no_children() {
        assert_eq!(ItemKind::Artist.child_kind(), Some(ItemKind::Album));
        assert_eq!(ItemKind::Album.child_kind(), Some(ItemKind::Track));
        assert_eq!(ItemKind::Track.child_kind(), None);
    }
}
