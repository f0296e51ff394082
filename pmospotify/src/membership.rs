//! Appartenance d'une piste à une playlist

use crate::cache::PlaylistTrackCache;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct MembershipChecker {
    cache: Arc<PlaylistTrackCache>,
}

impl MembershipChecker {
    pub fn new(cache: Arc<PlaylistTrackCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<PlaylistTrackCache> {
        &self.cache
    }

    /// Indique si `track_id` figure dans la playlist
    ///
    /// Les erreurs du cache sont remontées telles quelles.
    pub async fn is_member(&self, track_id: &str, playlist_id: &str) -> Result<bool> {
        let tracks = self.cache.get_tracks(playlist_id).await?;
        let present = tracks.iter().any(|track| track.id == track_id);
        debug!(track = track_id, playlist = playlist_id, present, "Membership checked");
        Ok(present)
    }
}
