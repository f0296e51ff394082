//! Modèles de données Spotify

use serde::{Deserialize, Serialize};

/// Référence à une piste d'une playlist
///
/// L'identité d'une piste est son `id` ; l'`uri` est conservée telle que
/// renvoyée par le catalogue (`spotify:track:<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackRef {
    pub id: String,
    pub uri: String,
}

impl TrackRef {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
        }
    }
}

/// Une fenêtre d'une collection paginée
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<TrackRef>,
    /// Taille totale de la collection, toutes pages confondues
    pub total: usize,
}

/// Métadonnées d'une piste utilisées pour la classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TrackMetadata {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub album_id: Option<String>,
    pub artist_ids: Vec<String>,
    /// Union des genres de l'album et de ceux des artistes
    pub genres: Vec<String>,
}

/// État du cache des playlists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaylistStats {
    pub playlists: usize,
    pub tracks: usize,
    pub stale_playlists: usize,
}

/// Statistiques des caches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CacheStats {
    /// Nombre de playlists en cache
    pub playlists: usize,
    /// Nombre total de pistes en cache
    pub tracks: usize,
    /// Playlists périmées, invalidées ou dont le dernier rafraîchissement a échoué
    pub stale_playlists: usize,
    /// Nombre de fiches de métadonnées en cache
    pub metadata_entries: u64,
}

impl CacheStats {
    pub fn new(playlists: PlaylistStats, metadata_entries: u64) -> Self {
        Self {
            playlists: playlists.playlists,
            tracks: playlists.tracks,
            stale_playlists: playlists.stale_playlists,
            metadata_entries,
        }
    }
}
