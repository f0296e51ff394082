//! Métadonnées d'une piste : `GET /tracks/{id}`, `GET /albums/{id}`, `GET /artists?ids=`

use super::SpotifyApi;
use crate::error::{Result, SpotifyError};
use crate::metadata::MetadataSource;
use crate::models::TrackMetadata;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Nombre maximal d'identifiants acceptés par `/artists`
const ARTISTS_PER_REQUEST: usize = 50;

#[derive(Debug, Deserialize)]
struct TrackResponse {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    uri: String,
    album: Option<IdOnly>,
    #[serde(default)]
    artists: Vec<IdOnly>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Genres {
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistsResponse {
    #[serde(default)]
    artists: Vec<Option<Genres>>,
}

impl SpotifyApi {
    async fn album_genres(&self, album_id: &str) -> Result<Vec<String>> {
        let album: Genres = self.get(&["albums", album_id], &[]).await?;
        Ok(album.genres)
    }

    async fn artists_genres(&self, artist_ids: &[String]) -> Result<Vec<String>> {
        let mut genres = Vec::new();
        for chunk in artist_ids.chunks(ARTISTS_PER_REQUEST) {
            let ids = chunk.join(",");
            let response: ArtistsResponse =
                self.get(&["artists"], &[("ids", ids.as_str())]).await?;
            genres.extend(response.artists.into_iter().flatten().flat_map(|a| a.genres));
        }
        Ok(genres)
    }
}

#[async_trait]
impl MetadataSource for SpotifyApi {
    async fn track_metadata(&self, track_id: &str) -> Result<TrackMetadata> {
        if track_id.trim().is_empty() {
            return Err(SpotifyError::TrackNotFound(track_id.to_string()));
        }

        let track: TrackResponse = match self.get(&["tracks", track_id], &[]).await {
            Ok(track) => track,
            // Spotify répond 400 "invalid id" pour un identifiant mal formé
            Err(SpotifyError::ApiError { code: 404 | 400, .. }) => {
                return Err(SpotifyError::TrackNotFound(track_id.to_string()));
            }
            Err(e) => return Err(e),
        };

        let album_id = track.album.and_then(|a| a.id);
        let artist_ids: Vec<String> = track.artists.into_iter().filter_map(|a| a.id).collect();

        let mut genres = match &album_id {
            Some(id) => self.album_genres(id).await?,
            None => Vec::new(),
        };
        for genre in self.artists_genres(&artist_ids).await? {
            if !genres.contains(&genre) {
                genres.push(genre);
            }
        }

        debug!(track = %track.id, ?genres, "Track metadata fetched");

        Ok(TrackMetadata {
            id: track.id,
            name: track.name,
            uri: track.uri,
            album_id,
            artist_ids,
            genres,
        })
    }
}
