use std::collections::BTreeMap;

use super::{
    escape, format_date, format_page_count, pagination_url, CollectionFilters, FavoriteKeys,
    APP_NAME,
};
use crate::catalog::{Album, Artist, Page, SearchResults, Track};
use crate::favorites::FavoriteEntry;
use crate::kind::ItemKind;
use crate::pagination::Pagination;

fn favorite_button(kind: ItemKind, id: &str, name: &str, image: &str, is_favorite: bool) -> String {
    format!(
        "<button class=\"favorite-toggle\" data-id=\"{}\" data-type=\"{}\" data-name=\"{}\" \
         data-image=\"{}\" data-favorite=\"{}\">{}</button>",
        escape(id),
        kind,
        escape(name),
        escape(image),
        is_favorite,
        if is_favorite { "&#9829;" } else { "&#9825;" },
    )
}

fn is_favorite(favorites: &FavoriteKeys, kind: ItemKind, id: &str) -> bool {
    favorites.contains(&(kind, id.to_string()))
}

fn cover(url: &str, alt: &str) -> String {
    if url.is_empty() {
        "<div class=\"cover placeholder\"></div>".to_string()
    } else {
        format!(
            "<img class=\"cover\" src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            escape(url),
            escape(alt)
        )
    }
}

fn artist_card(artist: &Artist, favorite: bool) -> String {
    format!(
        "<li class=\"card artist {}\">{}<a href=\"/artist/{}\">{}</a>\
         <span class=\"followers\">{} followers</span>{}</li>",
        artist.popularity_class(),
        cover(artist.primary_image(), &artist.name),
        escape(&artist.id),
        escape(artist.display_name()),
        artist.followers_formatted(),
        favorite_button(
            ItemKind::Artist,
            &artist.id,
            &artist.name,
            artist.primary_image(),
            favorite
        ),
    )
}

fn album_card(album: &Album, favorite: bool) -> String {
    let artist = album.primary_artist().map(|a| a.name.as_str()).unwrap_or_default();
    format!(
        "<li class=\"card album\">{}<a href=\"/album/{}\">{}</a>\
         <span class=\"meta\">{} &middot; {}</span>{}</li>",
        cover(album.primary_image(), &album.name),
        escape(&album.id),
        escape(&album.name),
        escape(artist),
        escape(&album.release_year()),
        favorite_button(
            ItemKind::Album,
            &album.id,
            &album.name,
            album.primary_image(),
            favorite
        ),
    )
}

fn track_row(track: &Track, favorite: bool) -> String {
    let explicit = if track.explicit {
        " <span class=\"explicit\">Explicit</span>"
    } else {
        ""
    };
    format!(
        "<li class=\"track {}\"><a href=\"/track/{}\">{}</a>{}\
         <span class=\"artists\">{}</span><span class=\"duration\">{}</span>{}</li>",
        track.popularity_class(),
        escape(&track.id),
        escape(track.display_name()),
        explicit,
        escape(&track.artist_names()),
        track.formatted_duration(),
        favorite_button(
            ItemKind::Track,
            &track.id,
            &track.name,
            track.primary_image(),
            favorite
        ),
    )
}

fn pager(pagination: &Pagination, base: &str, query: &str, extra: &[(&str, String)]) -> String {
    let mut html = String::from("<nav class=\"pagination\">");
    if pagination.has_prev {
        html += &format!(
            "<a rel=\"prev\" href=\"{}\">Previous</a>",
            escape(&pagination_url(base, query, pagination.prev_page(), extra))
        );
    }
    html += &format!(
        "<span>{}</span>",
        format_page_count(pagination.current_page, pagination.total_pages)
    );
    if pagination.has_next {
        html += &format!(
            "<a rel=\"next\" href=\"{}\">Next</a>",
            escape(&pagination_url(base, query, pagination.next_page(), extra))
        );
    }
    html.push_str("</nav>");
    html
}

fn genre_links(genres: &[String]) -> String {
    let links: String = genres
        .iter()
        .map(|g| {
            format!(
                "<li><a href=\"/category/{}\">{}</a></li>",
                urlencoding::encode(g),
                escape(g)
            )
        })
        .collect();
    format!("<ul class=\"genres\">{}</ul>", links)
}

fn search_results(results: &SearchResults, favorites: &FavoriteKeys) -> (String, String, String) {
    let artists = results
        .artists
        .iter()
        .flat_map(|p| &p.items)
        .map(|a| artist_card(a, is_favorite(favorites, ItemKind::Artist, &a.id)))
        .collect();
    let albums = results
        .albums
        .iter()
        .flat_map(|p| &p.items)
        .map(|a| album_card(a, is_favorite(favorites, ItemKind::Album, &a.id)))
        .collect();
    let tracks = results
        .tracks
        .iter()
        .flat_map(|p| &p.items)
        .map(|t| track_row(t, is_favorite(favorites, ItemKind::Track, &t.id)))
        .collect();
    (artists, albums, tracks)
}

pub(super) fn home(logged_in: bool, tracks: &[Track], genres: &[String]) -> String {
    let mut html = format!(
        "<section class=\"hero\"><h1>{}</h1><p>Discover artists, albums and tracks.</p>",
        APP_NAME
    );
    if !logged_in {
        html.push_str("<a class=\"button\" href=\"/login\">Log in with Spotify</a>");
    }
    html.push_str("</section>");

    if !tracks.is_empty() {
        html.push_str("<section><h2>New releases</h2><ul class=\"tracks\">");
        for track in tracks {
            html.push_str(&track_row(track, false));
        }
        html.push_str("</ul></section>");
    }
    html += &format!("<section><h2>Genres</h2>{}</section>", genre_links(genres));
    html
}

pub(super) fn search(
    query: &str,
    results: Option<&SearchResults>,
    kinds: &[ItemKind],
    favorites: &FavoriteKeys,
    pagination: &BTreeMap<ItemKind, Pagination>,
) -> String {
    let mut html = format!(
        "<form class=\"search\" action=\"/search\" method=\"get\">\
         <input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"Search\">",
        escape(query)
    );
    for kind in ItemKind::ALL {
        let checked = if kinds.contains(&kind) { " checked" } else { "" };
        html += &format!(
            "<label><input type=\"checkbox\" name=\"type\" value=\"{0}\"{1}> {0}</label>",
            kind, checked
        );
    }
    html.push_str("<button type=\"submit\">Search</button></form>");

    let Some(results) = results else {
        return html;
    };
    if results.is_empty() {
        html += &format!("<p class=\"empty\">No results for \"{}\".</p>", escape(query));
        return html;
    }

    let extra: Vec<(&str, String)> = kinds.iter().map(|k| ("type", k.to_string())).collect();
    let (artists, albums, tracks) = search_results(results, favorites);
    for (kind, title, items, list_class) in [
        (ItemKind::Artist, "Artists", artists, "cards"),
        (ItemKind::Album, "Albums", albums, "cards"),
        (ItemKind::Track, "Tracks", tracks, "tracks"),
    ] {
        if items.is_empty() {
            continue;
        }
        html += &format!(
            "<section class=\"results-{}\"><h2>{}</h2><ul class=\"{}\">{}</ul>",
            kind, title, list_class, items
        );
        if let Some(p) = pagination.get(&kind) {
            html.push_str(&pager(p, "/search", query, &extra));
        }
        html.push_str("</section>");
    }
    html
}

pub(super) fn collection(
    results: &SearchResults,
    genres: &[String],
    favorites: &FavoriteKeys,
    filters: &CollectionFilters,
    pagination: Option<&Pagination>,
) -> String {
    let mut html = String::from(
        "<form class=\"filters\" action=\"/collection\" method=\"get\"><select name=\"type\">\
         <option value=\"\">All</option>",
    );
    for kind in ItemKind::ALL {
        let selected = if filters.kind == Some(kind) { " selected" } else { "" };
        html += &format!("<option value=\"{0}\"{1}>{0}</option>", kind, selected);
    }
    html.push_str("</select><select name=\"genre\"><option value=\"\">Any genre</option>");
    for genre in genres {
        let selected = if *genre == filters.genre { " selected" } else { "" };
        html += &format!(
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(genre),
            selected
        );
    }
    html += &format!(
        "</select><input name=\"year\" value=\"{}\" placeholder=\"Year\">\
         <input name=\"popularity\" value=\"{}\" placeholder=\"Popularity\">\
         <button type=\"submit\">Filter</button></form>",
        escape(&filters.year),
        escape(&filters.popularity),
    );

    let (artists, albums, tracks) = search_results(results, favorites);
    for (title, items, list_class) in [
        ("Artists", artists, "cards"),
        ("Albums", albums, "cards"),
        ("Tracks", tracks, "tracks"),
    ] {
        if !items.is_empty() {
            html += &format!(
                "<section><h2>{}</h2><ul class=\"{}\">{}</ul></section>",
                title, list_class, items
            );
        }
    }
    if let Some(p) = pagination {
        html.push_str(&pager(p, "/collection", "", &filters.as_params()));
    }
    html
}

pub(super) fn artist(artist: &Artist, albums: &Page<Album>, is_favorite: bool) -> String {
    let mut html = format!(
        "<article class=\"details artist\">{}<h1>{}</h1>\
         <p class=\"genres\">{}</p><p>{} followers &middot; <span class=\"{}\">popularity {}</span></p>{}",
        cover(artist.primary_image(), &artist.name),
        escape(artist.display_name()),
        escape(&artist.genre_list()),
        artist.followers_formatted(),
        artist.popularity_class(),
        artist.popularity,
        favorite_button(
            ItemKind::Artist,
            &artist.id,
            &artist.name,
            artist.primary_image(),
            is_favorite
        ),
    );
    if !artist.spotify_url().is_empty() {
        html += &format!(
            "<a class=\"external\" href=\"{}\">Open in Spotify</a>",
            escape(artist.spotify_url())
        );
    }
    html.push_str("<h2>Albums</h2><ul class=\"cards\">");
    for album in &albums.items {
        html.push_str(&album_card(album, false));
    }
    html.push_str("</ul></article>");
    html
}

pub(super) fn album(album: &Album, tracks: &Page<Track>, is_favorite: bool) -> String {
    let artists = album
        .artists
        .iter()
        .map(|a| {
            format!(
                "<a href=\"/artist/{}\">{}</a>",
                escape(&a.id),
                escape(a.display_name())
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let mut html = format!(
        "<article class=\"details album\">{}<h1>{}</h1><p>{}</p>\
         <p><span class=\"album-type\">{}</span> &middot; {} &middot; {} tracks{}</p>{}",
        cover(album.primary_image(), &album.name),
        escape(&album.name),
        artists,
        escape(album.type_label()),
        escape(&album.release_year()),
        album.total_tracks,
        album
            .label
            .as_deref()
            .map(|l| format!(" &middot; {}", escape(l)))
            .unwrap_or_default(),
        favorite_button(
            ItemKind::Album,
            &album.id,
            &album.name,
            album.primary_image(),
            is_favorite
        ),
    );
    if !album.spotify_url().is_empty() {
        html += &format!(
            "<a class=\"external\" href=\"{}\">Open in Spotify</a>",
            escape(album.spotify_url())
        );
    }
    html.push_str("<ol class=\"tracks\">");
    for track in &tracks.items {
        html += &format!(
            "<li value=\"{}\"><a href=\"/track/{}\">{}</a><span class=\"duration\">{}</span></li>",
            track.track_number,
            escape(&track.id),
            escape(track.display_name()),
            track.formatted_duration()
        );
    }
    html.push_str("</ol></article>");
    html
}

pub(super) fn track(track: &Track, is_favorite: bool) -> String {
    let mut html = format!(
        "<article class=\"details track\">{}<h1>{}</h1><p>{}</p>\
         <p>From <a href=\"/album/{}\">{}</a> &middot; {} &middot; <span class=\"{}\">popularity {}</span></p>{}",
        cover(track.primary_image(), &track.name),
        escape(track.display_name()),
        escape(&track.artist_names()),
        escape(&track.album.id),
        escape(&track.album.name),
        track.formatted_duration(),
        track.popularity_class(),
        track.popularity,
        favorite_button(
            ItemKind::Track,
            &track.id,
            &track.name,
            track.primary_image(),
            is_favorite
        ),
    );
    if let Some(preview) = track.preview_url.as_deref() {
        html += &format!(
            "<audio controls src=\"{}\"></audio>",
            escape(preview)
        );
    }
    if !track.spotify_url().is_empty() {
        html += &format!(
            "<a class=\"external\" href=\"{}\">Open in Spotify</a>",
            escape(track.spotify_url())
        );
    }
    html.push_str("</article>");
    html
}

fn favorite_items(entries: &[FavoriteEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "<li class=\"card {kind}\">{}<a href=\"/{kind}/{}\">{}</a>\
                 <span class=\"meta\">Added {}</span>{}</li>",
                cover(&e.image_url, &e.name),
                escape(&e.id),
                escape(&e.name),
                format_date(&e.added_at),
                favorite_button(e.kind, &e.id, &e.name, &e.image_url, true),
                kind = e.kind,
            )
        })
        .collect()
}

pub(super) fn favorites(
    total: usize,
    artists: &[FavoriteEntry],
    albums: &[FavoriteEntry],
    tracks: &[FavoriteEntry],
) -> String {
    if total == 0 {
        return "<h1>Favorites</h1><p class=\"empty\">Nothing bookmarked yet.</p>".to_string();
    }
    let mut html = format!("<h1>Favorites</h1><p>{} items</p>", total);
    for (title, entries) in [("Artists", artists), ("Albums", albums), ("Tracks", tracks)] {
        if !entries.is_empty() {
            html += &format!(
                "<section><h2>{}</h2><ul class=\"cards\">{}</ul></section>",
                title,
                favorite_items(entries)
            );
        }
    }
    html
}

pub(super) fn category(
    genre: &str,
    tracks: &[Track],
    favorites: &FavoriteKeys,
    pagination: &Pagination,
) -> String {
    let mut html = format!("<h1>{}</h1><ul class=\"tracks\">", escape(genre));
    for track in tracks {
        html.push_str(&track_row(
            track,
            is_favorite(favorites, ItemKind::Track, &track.id),
        ));
    }
    html.push_str("</ul>");
    let base = format!("/category/{}", urlencoding::encode(genre));
    html.push_str(&pager(pagination, &base, "", &[]));
    html
}

pub(super) fn about() -> String {
    format!(
        "<h1>About {}</h1><p>Search the Spotify catalog, browse artists, albums and tracks, \
         and keep a list of favorites on this server.</p>",
        APP_NAME
    )
}
