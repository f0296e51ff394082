//! Pistes d'une playlist (`GET /playlists/{id}/tracks`)

use super::SpotifyApi;
use crate::error::{Result, SpotifyError};
use crate::models::{Page, TrackRef};
use crate::paging::PagingClient;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Seuls `total` et l'identité des pistes sont demandés
const PLAYLIST_FIELDS: &str = "total,items(track(id,uri))";

#[derive(Debug, Deserialize)]
struct PlaylistTracksResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    /// `null` pour une piste supprimée du catalogue
    track: Option<PlaylistTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrack {
    /// `null` pour un fichier local
    id: Option<String>,
    #[serde(default)]
    uri: String,
}

impl PlaylistTracksResponse {
    fn into_page(self) -> Page {
        let items = self
            .items
            .into_iter()
            .filter_map(|item| item.track)
            .filter_map(|track| track.id.map(|id| TrackRef::new(id, track.uri)))
            .collect();

        Page {
            items,
            total: self.total,
        }
    }
}

#[async_trait]
impl PagingClient for SpotifyApi {
    async fn fetch_page(&self, collection_id: &str, offset: usize, limit: usize) -> Result<Page> {
        let offset_param = offset.to_string();
        let limit_param = limit.to_string();
        let params = [
            ("offset", offset_param.as_str()),
            ("limit", limit_param.as_str()),
            ("fields", PLAYLIST_FIELDS),
        ];

        let segments = ["playlists", collection_id, "tracks"];
        let response: PlaylistTracksResponse = match self.get(&segments, &params).await {
            Ok(response) => response,
            Err(e @ SpotifyError::AuthFailed(_)) => return Err(e),
            Err(e) => return Err(SpotifyError::fetch_failed(collection_id, offset, limit, e)),
        };

        let page = response.into_page();
        debug!(
            playlist = collection_id,
            offset,
            limit,
            received = page.items.len(),
            total = page.total,
            "Playlist page fetched"
        );
        Ok(page)
    }
}
