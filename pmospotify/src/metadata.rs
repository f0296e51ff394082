//! Métadonnées des pistes et leur cache en mémoire

use crate::error::Result;
use crate::models::TrackMetadata;
use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fournit les métadonnées (dont les genres) d'une piste
///
/// Une piste inconnue du catalogue est rendue sous la forme de
/// [`SpotifyError::TrackNotFound`](crate::SpotifyError::TrackNotFound).
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn track_metadata(&self, track_id: &str) -> Result<TrackMetadata>;
}

/// Cache TTL devant une `MetadataSource`
///
/// Les erreurs ne sont jamais mises en cache.
#[derive(Clone)]
pub struct CachedMetadata {
    source: Arc<dyn MetadataSource>,
    tracks: MokaCache<String, TrackMetadata>,
}

impl CachedMetadata {
    pub fn new(source: Arc<dyn MetadataSource>, ttl: Duration) -> Self {
        Self::with_capacity(source, ttl, 10_000)
    }

    pub fn with_capacity(source: Arc<dyn MetadataSource>, ttl: Duration, max_capacity: u64) -> Self {
        Self {
            source,
            tracks: MokaCache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Nombre de fiches en cache
    pub async fn entry_count(&self) -> u64 {
        self.tracks.run_pending_tasks().await;
        self.tracks.entry_count()
    }
}

#[async_trait]
impl MetadataSource for CachedMetadata {
    async fn track_metadata(&self, track_id: &str) -> Result<TrackMetadata> {
        if let Some(metadata) = self.tracks.get(track_id).await {
            debug!("Track {} metadata found in cache", track_id);
            return Ok(metadata);
        }

        let metadata = self.source.track_metadata(track_id).await?;
        self.tracks
            .insert(track_id.to_string(), metadata.clone())
            .await;
        Ok(metadata)
    }
}
